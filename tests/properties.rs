use eldest::{
    coupled::{ CoupledParams, CoupledResonances },
    pulse::{ Envelope, IrPulse, XuvField, XuvPulse },
    regime::{ TemporalRegime, Timing },
    units::{ ev_to_hartree, second_to_atu },
    vibronic::{ eigenvalue, lambda_param, Morse },
};
use proptest::prelude::*;

proptest! {
    #[test]
    fn morse_levels_increase_up_to_n_max(
        de in 1e-4f64..0.5,
        alpha in 0.3f64..3.0,
        mu in 100.0f64..5e4,
    ) {
        let lambda = lambda_param(de, alpha, mu);
        prop_assume!(lambda > 0.5 && (lambda - 0.5).fract() != 0.0);
        let pot = Morse::new(de, alpha, 3.0, mu).unwrap();
        let n_max = (lambda - 0.5).floor() as usize;
        prop_assert_eq!(pot.n_max(), n_max);
        prop_assert_eq!(pot.levels().len(), n_max + 1);
        for n in 0..n_max {
            prop_assert!(eigenvalue(n + 1, de, alpha, mu) > eigenvalue(n, de, alpha, mu));
        }
    }

    #[test]
    fn regimes_never_go_back(
        n_ir in 2.0f64..20.0,
        extra_delay in 0.0f64..2000.0,
        mut times in prop::collection::vec(-3000.0f64..6000.0, 1..60),
    ) {
        let xuv = XuvPulse::new(
            ev_to_hartree(44.0), 3.0, 1e-4, Envelope::SinSq, XuvField::Convoluted,
            None);
        let probe = IrPulse::new(0.057, n_ir, 1e-6, Envelope::SinSq, 0.0, 0.0, None);
        let delay = probe.duration() / 2.0 + extra_delay;
        let ir = probe.with_delay(delay);
        let timing = Timing::new(&xuv, &ir).unwrap();

        times.sort_by(|a, b| a.total_cmp(b));
        let regimes: Vec<TemporalRegime>
            = times.iter().map(|t| timing.classify(*t)).collect();
        prop_assert!(regimes.windows(2).all(|w| w[0] <= w[1]));
        prop_assert_eq!(timing.classify(-1e12), TemporalRegime::BeforeXuv);
        prop_assert_eq!(timing.classify(1e12), TemporalRegime::AfterIr);
    }

    #[test]
    fn exactly_two_poles_decay(
        e_a in 40.0f64..50.0,
        e_b in 40.0f64..50.0,
        tau_a in 0.5f64..20.0,
        tau_b in 0.5f64..20.0,
        w in 1e-3f64..1.0,
    ) {
        let params = CoupledParams {
            e_a: ev_to_hartree(e_a),
            e_b: ev_to_hartree(e_b),
            gamma_a: 1.0 / second_to_atu(tau_a * 1e-15),
            gamma_b: 1.0 / second_to_atu(tau_b * 1e-15),
            interact: ev_to_hartree(w).powi(2),
            rdg: 1.0,
            q: 5.0,
        };
        let coupled = CoupledResonances::new(&params).unwrap();
        let decaying = coupled.get_roots().iter().filter(|e| e.im < 0.0).count();
        prop_assert_eq!(decaying, 2);
        for sel in coupled.get_selected().iter() {
            prop_assert!(!sel.degenerate);
            prop_assert!(sel.pole.energy.im < 0.0);
        }
        let [s0, s1] = coupled.get_selected();
        prop_assert_ne!(s0.index, s1.index);
    }
}
