//! End-to-end runs from raw columns to per-window flux tables.

use mf_core::{MfError, Tolerances, Unit, nan_mean, nearly_equal};
use mf_data::{AnalysisConfig, Dataset, FluxOptions, PreprocessOptions, SiteConfig, SoluteDef, UnitMap};
use mf_flux::{Analysis, FluxError, FluxTable};

const PERIOD: usize = 200;

fn wave(i: usize) -> f64 {
    (2.0 * std::f64::consts::PI * (i % PERIOD) as f64 / PERIOD as f64).sin()
}

/// Raw sonic and gas-analyzer columns; window `k` has amplitude `amplitude(k)`.
fn raw(rows: usize, amplitude: impl Fn(usize) -> f64) -> (Dataset, UnitMap) {
    let s: Vec<f64> = (0..rows).map(|i| amplitude(i / PERIOD) * wave(i)).collect();
    let ds = Dataset::from_columns(vec![
        ("u", s.iter().map(|x| 3.0 - 0.5 * x).collect()),
        ("v", vec![0.3; rows]),
        ("w", s.clone()),
        ("theta", s.iter().map(|x| 295.0 + 0.2 * x).collect()),
        ("p", vec![101_300.0; rows]),
        ("mrho_h2o", s.iter().map(|x| 600.0 + 5.0 * x).collect()),
        ("mrho_co2", s.iter().map(|x| 16.0 - 0.01 * x).collect()),
    ])
    .unwrap();
    let units = UnitMap::parse_pairs([
        ("u", "m/s"),
        ("v", "m/s"),
        ("w", "m/s"),
        ("theta", "K"),
        ("p", "Pa"),
        ("mrho_h2o", "mmol/m^3"),
        ("mrho_co2", "mmol/m^3"),
    ])
    .unwrap();
    (ds, units)
}

fn sample_variance(x: &[f64]) -> f64 {
    let mean = x.iter().sum::<f64>() / x.len() as f64;
    x.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (x.len() as f64 - 1.0)
}

fn column(table: &FluxTable, name: &str) -> Vec<f64> {
    let j = table.names().iter().position(|n| n == name).unwrap();
    table.rows().iter().map(|r| r[j]).collect()
}

/// Air density from θ: the raw columns carry no virtual temperature.
fn theta_config() -> AnalysisConfig {
    AnalysisConfig {
        preprocess: PreprocessOptions {
            rho_air_from_theta_v: false,
            ..PreprocessOptions::default()
        },
        ..AnalysisConfig::default()
    }
}

fn dry_config() -> AnalysisConfig {
    AnalysisConfig {
        fluxes: FluxOptions {
            apply_wpl: false,
            ..FluxOptions::default()
        },
        ..theta_config()
    }
}

#[test]
fn sinusoid_sensible_heat_matches_closed_form() {
    let (ds, units) = raw(PERIOD, |_| 1.0);
    let analysis = Analysis::new(dry_config()).unwrap();

    let (pre, _) = analysis.preprocess_only(&ds, &units).unwrap();
    let rho_air = nan_mean(pre.column("rho_air").unwrap()).unwrap();
    let var_w = sample_variance(ds.column("w").unwrap());

    let table = analysis.run(&ds, &units).unwrap();
    assert_eq!(table.len(), 1);
    let h = column(&table, "H")[0];
    let expected = rho_air * 1003.5 * 0.2 * var_w;
    assert!(nearly_equal(h, expected, Tolerances { abs: 0.0, rel: 1e-9 }), "{h} vs {expected}");
    assert_eq!(table.units().unit("H").unwrap(), &Unit::watt_per_m2());

    let tau = column(&table, "tau")[0];
    assert!(tau > 0.0);
}

#[test]
fn windows_preserve_order() {
    let (ds, units) = raw(4 * PERIOD, |k| (k + 1) as f64);
    let config = AnalysisConfig {
        window_rows: Some(PERIOD),
        ..dry_config()
    };
    let table = Analysis::new(config).unwrap().run(&ds, &units).unwrap();
    assert_eq!(table.len(), 4);
    let h = column(&table, "H");
    assert!(h.windows(2).all(|pair| pair[0] < pair[1]), "{h:?}");
}

#[test]
fn windows_match_single_window_runs() {
    let (ds, units) = raw(3 * PERIOD, |k| 1.0 + 0.5 * k as f64);
    let config = AnalysisConfig {
        window_rows: Some(PERIOD),
        ..dry_config()
    };
    let batched = Analysis::new(config).unwrap().run(&ds, &units).unwrap();

    let single = Analysis::new(dry_config()).unwrap();
    for k in 0..3 {
        let window = ds.slice(k * PERIOD..(k + 1) * PERIOD).unwrap();
        let one = single.run(&window, &units).unwrap();
        assert_eq!(one.names(), batched.names());
        for (a, b) in one.rows()[0].iter().zip(&batched.rows()[k]) {
            assert!(nearly_equal(*a, *b, Tolerances::default()));
        }
    }
}

#[test]
fn failing_window_is_reported_by_index() {
    let (mut ds, units) = raw(3 * PERIOD, |_| 1.0);
    let mut w = ds.column("w").unwrap().to_vec();
    for v in &mut w[PERIOD..] {
        *v = f64::NAN;
    }
    ds.insert("w", w).unwrap();
    let config = AnalysisConfig {
        window_rows: Some(PERIOD),
        ..dry_config()
    };
    let err = Analysis::new(config).unwrap().run(&ds, &units).unwrap_err();
    assert!(matches!(err, FluxError::Window { index: 1, .. }), "{err:?}");
}

#[test]
fn wpl_raises_water_vapour_flux_under_upward_heat_flux() {
    let (ds, units) = raw(PERIOD, |_| 1.0);
    let solutes = vec![SoluteDef::Code("co2".into())];
    let raw_run = Analysis::new(AnalysisConfig {
        solutes: solutes.clone(),
        ..dry_config()
    })
    .unwrap()
    .run(&ds, &units)
    .unwrap();
    let corrected = Analysis::new(AnalysisConfig {
        solutes,
        ..theta_config()
    })
    .unwrap()
    .run(&ds, &units)
    .unwrap();

    let e_raw = column(&raw_run, "E")[0];
    let e = column(&corrected, "E")[0];
    assert!(e > e_raw);
    assert_eq!(corrected.units().unit("E").unwrap(), &Unit::mol_per_m2_s());

    let le = column(&corrected, "LE")[0];
    assert!(le > 0.0);
    let f_raw = column(&raw_run, "F_co2")[0];
    let f = column(&corrected, "F_co2")[0];
    assert!(f_raw < 0.0);
    assert!(f > f_raw);
}

#[test]
fn invalid_config_is_rejected_before_running() {
    let config = AnalysisConfig {
        window_rows: Some(1),
        ..AnalysisConfig::default()
    };
    let err = Analysis::new(config).unwrap_err();
    assert!(matches!(err, FluxError::Core(MfError::Config { .. })));
}

#[test]
fn supplied_air_density_is_kept() {
    let (mut ds, mut units) = raw(PERIOD, |_| 1.0);
    ds.insert("rho_air", vec![1.2; PERIOD]).unwrap();
    units.insert("rho_air", Unit::kg_per_m3());
    // the θv density path would fail here, so the supplied column must be used
    let config = AnalysisConfig {
        fluxes: FluxOptions {
            apply_wpl: false,
            ..FluxOptions::default()
        },
        ..AnalysisConfig::default()
    };
    let analysis = Analysis::new(config).unwrap();

    let (pre, _) = analysis.preprocess_only(&ds, &units).unwrap();
    assert!(pre.column("rho_air").unwrap().iter().all(|r| *r == 1.2));

    let table = analysis.run(&ds, &units).unwrap();
    let var_w = sample_variance(ds.column("w").unwrap());
    let h = column(&table, "H")[0];
    let expected = 1.2 * 1003.5 * 0.2 * var_w;
    assert!(nearly_equal(h, expected, Tolerances { abs: 0.0, rel: 1e-9 }), "{h} vs {expected}");
    let tau = column(&table, "tau")[0];
    assert!(nearly_equal(tau, 1.2 * 0.5 * var_w, Tolerances { abs: 0.0, rel: 1e-9 }));
}

#[test]
fn fewer_than_two_rows_is_rejected() {
    let analysis = Analysis::new(dry_config()).unwrap();
    for rows in [0, 1] {
        let (ds, units) = raw(rows, |_| 1.0);
        let err = analysis.run(&ds, &units).unwrap_err();
        assert!(
            matches!(&err, FluxError::Core(MfError::InvalidArg { what }) if what.contains("at least 2 rows")),
            "{rows} rows: {err:?}"
        );
    }
}

#[test]
fn calm_window_fails_turbulent_scales() {
    let (mut ds, units) = raw(2 * PERIOD, |_| 1.0);
    // second window: constant u, so cov(u', w') and u* vanish
    let mut u = ds.column("u").unwrap().to_vec();
    for v in &mut u[PERIOD..] {
        *v = 3.0;
    }
    ds.insert("u", u).unwrap();
    let config = AnalysisConfig {
        window_rows: Some(PERIOD),
        site: Some(SiteConfig::new(10.0, 3.0)),
        fluxes: FluxOptions {
            apply_wpl: false,
            compute_turbulent_scales: true,
            ..FluxOptions::default()
        },
        ..theta_config()
    };
    let err = Analysis::new(config).unwrap().run(&ds, &units).unwrap_err();
    match err {
        FluxError::Window {
            index: 1,
            source: MfError::NonFinite { what, value },
        } => {
            assert_eq!(what, "theta_star");
            assert!(value.is_infinite());
        }
        other => panic!("unexpected error {other:?}"),
    }
}
