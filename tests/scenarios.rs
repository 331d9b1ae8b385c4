use eldest::{
    amplitude::{ AmplitudeEngine, Channel, Couplings },
    config::{ RunConfig, Sources },
    dressing::FourierParams,
    driver::Setup,
    pulse::{ Envelope, IrPulse, XuvField, XuvPulse },
    quad::{ Integrator, Method, QuadParams },
    regime::TemporalRegime,
    units::{ ev_to_hartree, second_to_atu },
};

// IR pulse switched off and parked after the XUV pulse
fn ir_off() -> IrPulse {
    IrPulse::new(ev_to_hartree(1.6), 10.0, 0.0, Envelope::SinSq, 0.0, 2000.0, None)
}

fn engine(omega_ev: f64, inner: Method) -> AmplitudeEngine {
    let xuv = XuvPulse::new(
        ev_to_hartree(omega_ev), 3.0, 1e-4, Envelope::SinSq, XuvField::Convoluted,
        None);
    let params = QuadParams { limit: 200, ..QuadParams::default() };
    let integ = Integrator::new(inner, Method::Quadrature, params).unwrap();
    AmplitudeEngine::new(xuv, ir_off(), integ, FourierParams::default()).unwrap()
}

#[test]
fn closed_form_and_quadrature_agree_long_after_the_pulses() {
    let gamma = 1.0 / second_to_atu(2e-15);
    let couplings = Couplings::new(1.0, 5.0, gamma);
    let e_fin = 10.0;
    let channel = Channel::single(ev_to_hartree(44.0), ev_to_hartree(e_fin), &couplings);
    let channels = [channel];
    for omega in [20.0, 44.0, 60.0] {
        let analytic = engine(omega, Method::Analytic);
        let numeric = engine(omega, Method::Quadrature);
        let timing = *analytic.get_timing();
        let t = timing.end() + 10.0 / gamma;
        assert_eq!(timing.classify(t), TemporalRegime::AfterIr);
        let f_a = analytic.formula(TemporalRegime::AfterIr);
        let f_n = numeric.formula(TemporalRegime::AfterIr);
        // sample around the center of the direct line
        for e_kin in [omega - e_fin - 1.0, omega - e_fin, omega - e_fin + 1.0] {
            let e = ev_to_hartree(e_kin);
            let sa = analytic.sample(e).unwrap();
            let sn = numeric.sample(e).unwrap();
            let ia = analytic.intensity(&sa, &channels, t, &f_a).unwrap();
            let i_n = numeric.intensity(&sn, &channels, t, &f_n).unwrap();
            assert!(ia > 0.0);
            assert!(
                (ia - i_n).abs() <= 1e-5 * ia,
                "Ω = {omega} eV, E = {e_kin} eV: {ia:e} vs {i_n:e}",
            );
        }
    }
}

#[test]
fn coupled_run_reduces_to_one_channel() {
    let text = r#"
        [xuv]
        energy = 44.0
        cycles = 3.0
        intensity = 1e13
        shape = "sinsq"

        [ir]
        energy = 1.6
        cycles = 10.0
        intensity = 0.0
        shape = "sinsq"
        delay = 3e-14

        [resonance]
        energy = 44.0
        lifetime = 2e-15
        q = 5.0
        final_energy = 20.0

        [coupled]
        energy = 44.3
        lifetime = 5e-15
        coupling = 0.05

        [grid]
        t_max = 1e-15
        t_step = 2e-16
        e_min = 22.0
        e_max = 26.0
        e_step = 0.5
    "#;
    let run = RunConfig::from_str(text).unwrap().to_atomic(Sources::default()).unwrap();
    assert!(run.model.is_coupled());
    let setup = Setup::new(&run).unwrap();
    assert_eq!(setup.get_channels().len(), 1);
    assert_eq!(setup.get_channels()[0].poles.len(), 2);
    assert!(setup.get_channels()[0].poles.iter().all(|p| p.energy.im < 0.0));
    assert!(setup.get_coupled().is_some());
    assert!(setup.get_levels().is_empty());
}

// ground λ ≈ 1.20, resonance λ ≈ 3.24, final λ ≈ 2.81
const VIBRONIC: &str = r#"
    [xuv]
    energy = 44.0
    cycles = 3.0
    intensity = 1e13
    shape = "sinsq"

    [ir]
    energy = 1.6
    cycles = 10.0
    intensity = 0.0
    shape = "sinsq"
    delay = 3e-14

    [resonance]
    energy = 44.0
    lifetime = 2e-15
    q = 5.0
    final_energy = 20.0

    [vibronic]
    mass1 = 1.1
    mass2 = 1.1
    r_min = 0.5
    r_max = 6.5
    ground = { de = 0.0219, alpha = 2.0, req = 1.6 }
    resonance = { de = 0.16, alpha = 2.0, req = 1.7 }
    final = { type = "morse", de = 0.12, alpha = 2.0, req = 1.8 }

    [grid]
    t_max = 1e-15
    t_step = 5e-16
    e_min = 22.0
    e_max = 26.0
    e_step = 1.0
"#;

#[test]
fn single_ground_level_gives_one_overlap_row() {
    let run = RunConfig::from_str(VIBRONIC).unwrap().to_atomic(Sources::default()).unwrap();
    let setup = Setup::new(&run).unwrap();
    let vib = setup.get_vibronic().unwrap();
    assert_eq!(vib.n_gs(), 1);
    assert_eq!(vib.n_res(), 3);
    assert_eq!(vib.get_gs_res().nrows(), 1);
    assert_eq!(vib.get_gs_fin().nrows(), 1);
    assert_eq!(vib.get_final().len(), 3);

    let channels = setup.get_channels();
    assert_eq!(channels.len(), 3);
    assert!(channels.iter().all(|ch| ch.poles.len() == 3));
    assert!(channels.iter().all(|ch| ch.dos == 1.0));
    assert_eq!(setup.get_levels().len(), 3);
}

#[test]
fn precomputed_tables_reproduce_the_structure() {
    let run = RunConfig::from_str(VIBRONIC).unwrap().to_atomic(Sources::default()).unwrap();
    let setup = Setup::new(&run).unwrap();
    let file = setup.get_vibronic().unwrap().to_file();

    let mut cfg = RunConfig::from_str(VIBRONIC).unwrap();
    if let Some(v) = cfg.vibronic.as_mut() { v.fc_precalc = true; }
    let sources = Sources { fc: Some(file), gamma: None };
    let reread = Setup::new(&cfg.to_atomic(sources).unwrap()).unwrap();
    assert_eq!(reread.get_channels(), setup.get_channels());
}
