use std::fs;
use eldest::{
    config::{ RunConfig, Sources },
    driver::{ self, Setup, WAVEPACKET_FILE },
    spectrum::{ step_file_name, Spectrum, SpectrumWriter },
    units::atu_to_second,
};

fn run_text(dir: &std::path::Path, ir_intensity: f64, output: &str) -> String {
    format!(r#"
        [xuv]
        energy = 44.0
        cycles = 3.0
        intensity = 1e13
        shape = "sinsq"

        [ir]
        energy = 1.6
        cycles = 10.0
        intensity = {ir_intensity:e}
        shape = "sinsq"
        delay = 3e-14

        [resonance]
        energy = 44.0
        lifetime = 2e-15
        q = 5.0
        final_energy = 20.0

        [grid]
        t_max = 1e-15
        t_step = 2e-16
        e_min = 23.0
        e_max = 25.0
        e_step = 0.5
        delay_step = 5e-16

        [output]
        dir = "{}"
        {output}
    "#, dir.display())
}

#[test]
fn writer_appends_blocks_and_step_files() {
    let dir = tempfile::tempdir().unwrap();
    let mut writer = SpectrumWriter::new(dir.path(), "full.dat", true).unwrap();
    for t in [-10.0, 10.0] {
        let mut spec = Spectrum::new(t);
        for k in 0..4 {
            spec.push(0.5 + 0.1 * k as f64, k as f64);
        }
        writer.write(&spec).unwrap();
        assert!(dir.path().join(step_file_name(t)).exists());
    }
    assert_eq!(writer.steps(), 2);

    let text = fs::read_to_string(writer.get_path()).unwrap();
    let blocks: Vec<&str> = text.split("\n\n").filter(|b| !b.trim().is_empty()).collect();
    assert_eq!(blocks.len(), 2);
    let cols: Vec<f64>
        = blocks[1].lines().next().unwrap()
        .split_whitespace()
        .map(|c| c.parse().unwrap())
        .collect();
    assert_eq!(cols.len(), 3);
    assert!((cols[1] - atu_to_second(10.0)).abs() < 1e-25);
    assert_eq!(cols[2], 0.0);
    assert!(step_file_name(-10.0).starts_with('m'));
}

#[test]
fn time_scan_writes_every_step() {
    let dir = tempfile::tempdir().unwrap();
    let text = run_text(dir.path(), 0.0, "per_step = true\nwavepacket = true");
    let run = RunConfig::from_str(&text).unwrap().to_atomic(Sources::default()).unwrap();
    let setup = Setup::new(&run).unwrap();
    let times = driver::time_grid(&run);
    let energies = driver::energy_grid(&run);

    let spectra = driver::time_scan(&run, &setup).unwrap();
    assert_eq!(spectra.len(), times.len());
    assert!(spectra.iter().all(|s| s.len() == energies.len()));
    assert!(spectra.windows(2).all(|w| w[0].get_t() < w[1].get_t()));
    // the first step sits on the leading edge of the XUV pulse
    assert!(spectra[0].get_intensity().iter().all(|y| *y == 0.0));
    assert!(spectra.last().unwrap().get_intensity().iter().all(|y| *y > 0.0));

    let full = fs::read_to_string(dir.path().join("full.dat")).unwrap();
    let records = full.lines().filter(|l| !l.trim().is_empty()).count();
    assert_eq!(records, times.len() * energies.len());
    for t in times.iter() {
        assert!(dir.path().join(step_file_name(*t)).exists());
    }

    let wp = fs::read_to_string(dir.path().join(WAVEPACKET_FILE)).unwrap();
    assert_eq!(wp.lines().count(), times.len() * setup.get_levels().len());
}

#[test]
fn wavepacket_only_skips_spectra() {
    let dir = tempfile::tempdir().unwrap();
    let text = run_text(dir.path(), 0.0, "wavepacket_only = true");
    let run = RunConfig::from_str(&text).unwrap().to_atomic(Sources::default()).unwrap();
    let setup = Setup::new(&run).unwrap();
    let spectra = driver::time_scan(&run, &setup).unwrap();
    assert!(spectra.is_empty());
    assert!(!dir.path().join("full.dat").exists());
    assert!(dir.path().join(WAVEPACKET_FILE).exists());
}

#[test]
fn delay_scan_without_ir_is_flat() {
    let dir = tempfile::tempdir().unwrap();
    let text = run_text(dir.path(), 0.0, "");
    let run = RunConfig::from_str(&text).unwrap().to_atomic(Sources::default()).unwrap();
    let setup = Setup::new(&run).unwrap();
    let (d_min, d_max) = driver::delay_range(&run.ir);
    assert!((d_min + d_max).abs() < 1e-12);
    assert!((d_max - run.ir.duration() / 20.0).abs() < 1e-9);

    let spectra = driver::delay_scan(&run, &setup).unwrap();
    assert!(spectra.len() > 2);
    assert_eq!(spectra[0].get_t(), d_min);
    let first = spectra[0].get_intensity();
    let peak = first.iter().cloned().fold(0.0, f64::max);
    assert!(peak > 0.0);
    for spec in spectra.iter() {
        for (a, b) in spec.get_intensity().iter().zip(first) {
            assert!((a - b).abs() <= 1e-2 * peak);
        }
    }
}

#[test]
fn delay_scan_needs_a_step() {
    let dir = tempfile::tempdir().unwrap();
    let text = run_text(dir.path(), 1e12, "").replace("delay_step = 5e-16", "");
    let run = RunConfig::from_str(&text).unwrap().to_atomic(Sources::default()).unwrap();
    let setup = Setup::new(&run).unwrap();
    assert!(driver::delay_scan(&run, &setup).is_err());
}
