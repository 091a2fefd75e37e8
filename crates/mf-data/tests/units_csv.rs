use mf_core::Unit;
use mf_data::{CsvConfig, DataError, UnitMap, read_units_csv, write_units_csv};

const QUOTED: &str = "\
station,\"wind, u\",w
,\"m s-1\",m/s
1,2.0,0.5
2,\"3.0\",0.25
";

#[test]
fn quoted_cells_may_hold_the_delimiter() {
    let config = CsvConfig::default().with_skip_columns(["station"]);
    let (ds, units) = read_units_csv(QUOTED.as_bytes(), &config).unwrap();

    assert_eq!(ds.names().collect::<Vec<_>>(), ["wind, u", "w"]);
    assert_eq!(ds.column("wind, u").unwrap(), &[2.0, 3.0]);
    assert_eq!(units.get("wind, u"), Some(&Unit::meter_per_second()));

    let mut buf = Vec::new();
    write_units_csv(&mut buf, &ds, &units).unwrap();
    let text = String::from_utf8(buf).unwrap();
    assert!(text.starts_with("\"wind, u\",w\n"), "{text}");

    let (back, back_units) = read_units_csv(text.as_bytes(), &CsvConfig::default()).unwrap();
    assert_eq!(back, ds);
    assert_eq!(back_units, units);
}

#[test]
fn semicolon_files_with_quoted_semicolons() {
    let text = "# exported\n\"T; sonic\";p\nK;kPa\n\n300.1;101.3\n300.2;101.2\n";
    let config = CsvConfig {
        delimiter: ';',
        ..CsvConfig::default()
    };
    let (ds, units) = read_units_csv(text.as_bytes(), &config).unwrap();
    assert_eq!(ds.len(), 2);
    assert_eq!(ds.column("T; sonic").unwrap(), &[300.1, 300.2]);
    let expected = UnitMap::parse_pairs([("T; sonic", "K"), ("p", "kPa")]).unwrap();
    assert_eq!(units, expected);
}

#[test]
fn multibyte_delimiter_is_rejected() {
    let config = CsvConfig {
        delimiter: '§',
        ..CsvConfig::default()
    };
    let err = read_units_csv("u\nm/s\n1\n".as_bytes(), &config).unwrap_err();
    assert!(matches!(err, DataError::Csv { .. }), "{err:?}");
}
