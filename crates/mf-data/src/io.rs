// mf-data/src/io.rs

//! Units CSV: first line column names, second line unit expressions,
//! numeric rows after that.
//!
//! ```text
//! u,v,w,theta_v,mrho_h2o,p
//! m/s,m/s,m/s,degC,mmol/m^3,kPa
//! 1.02,-0.31,0.05,21.4,612.0,101.2
//! ```
//!
//! An empty unit cell leaves that column without a unit entry. Empty data
//! cells and `NA`/`NaN` read as NaN. Dates are not interpreted; drop such
//! columns with [`CsvConfig::skip_columns`].

use std::io::{BufReader, Read, Write};
use std::path::Path;

use csv::{ReaderBuilder, StringRecord, Trim, WriterBuilder};
use mf_core::Unit;
use tracing::debug;

use crate::dataset::{Dataset, UnitMap};
use crate::error::{DataError, DataResult};

#[derive(Debug, Clone)]
pub struct CsvConfig {
    /// Single-byte field delimiter; quoted cells may contain it.
    pub delimiter: char,
    /// Lines starting with this prefix are ignored.
    pub comment_prefix: Option<char>,
    /// Columns to drop while reading (timestamps, record numbers).
    pub skip_columns: Vec<String>,
}

impl Default for CsvConfig {
    fn default() -> Self {
        Self {
            delimiter: ',',
            comment_prefix: Some('#'),
            skip_columns: Vec::new(),
        }
    }
}

impl CsvConfig {
    pub fn with_skip_columns<S: Into<String>>(mut self, columns: impl IntoIterator<Item = S>) -> Self {
        self.skip_columns = columns.into_iter().map(Into::into).collect();
        self
    }
}

fn ascii_byte(c: char, what: &str) -> DataResult<u8> {
    u8::try_from(c)
        .ok()
        .filter(u8::is_ascii)
        .ok_or_else(|| DataError::Csv {
            line: 0,
            what: format!("{what} '{c}' is not a single ASCII character"),
        })
}

fn record_line(record: &StringRecord, fallback: u64) -> u64 {
    record.position().map_or(fallback, |p| p.line())
}

fn parse_cell(cell: &str) -> Option<f64> {
    match cell {
        "" | "NA" | "NaN" | "nan" | "NAN" => Some(f64::NAN),
        other => other.parse().ok(),
    }
}

pub fn read_units_csv<R: Read>(reader: R, config: &CsvConfig) -> DataResult<(Dataset, UnitMap)> {
    let comment = config
        .comment_prefix
        .map(|c| ascii_byte(c, "comment prefix"))
        .transpose()?;
    let mut csv_reader = ReaderBuilder::new()
        .has_headers(false)
        .delimiter(ascii_byte(config.delimiter, "delimiter")?)
        .comment(comment)
        .trim(Trim::All)
        .flexible(true)
        .from_reader(reader);
    let mut records = csv_reader.records();

    let header = records.next().transpose()?.ok_or_else(|| DataError::Csv {
        line: 1,
        what: "missing header line".into(),
    })?;
    let names: Vec<String> = header.iter().map(str::to_string).collect();
    let unit_row = records.next().transpose()?.ok_or_else(|| DataError::Csv {
        line: 2,
        what: "missing units line".into(),
    })?;
    if unit_row.len() != names.len() {
        return Err(DataError::Csv {
            line: record_line(&unit_row, 2),
            what: format!("{} unit cells for {} columns", unit_row.len(), names.len()),
        });
    }

    let keep: Vec<bool> = names
        .iter()
        .map(|n| !config.skip_columns.iter().any(|s| s == n))
        .collect();

    let mut units = UnitMap::new();
    for ((name, cell), kept) in names.iter().zip(unit_row.iter()).zip(&keep) {
        if *kept && !cell.is_empty() {
            units.insert(name.clone(), Unit::parse(cell)?);
        }
    }

    let mut columns: Vec<Vec<f64>> = vec![Vec::new(); names.len()];
    for (row, item) in records.enumerate() {
        let record = item?;
        let line = record_line(&record, row as u64 + 3);
        if record.len() != names.len() {
            return Err(DataError::Csv {
                line,
                what: format!("{} cells, expected {}", record.len(), names.len()),
            });
        }
        for (idx, cell) in record.iter().enumerate() {
            if !keep[idx] {
                continue;
            }
            let value = parse_cell(cell).ok_or_else(|| DataError::Csv {
                line,
                what: format!("column '{}': '{}' is not a number", names[idx], cell),
            })?;
            columns[idx].push(value);
        }
    }

    let mut dataset = Dataset::new();
    for ((name, values), kept) in names.into_iter().zip(columns).zip(keep) {
        if kept {
            dataset.insert(name, values)?;
        }
    }
    debug!(
        rows = dataset.len(),
        columns = dataset.n_columns(),
        "read units csv"
    );
    Ok((dataset, units))
}

pub fn load_units_csv(path: &Path, config: &CsvConfig) -> DataResult<(Dataset, UnitMap)> {
    let file = std::fs::File::open(path)?;
    read_units_csv(BufReader::new(file), config)
}

/// Comma-separated output; cells holding the delimiter or quotes are quoted.
pub fn write_units_csv<W: Write>(writer: W, dataset: &Dataset, units: &UnitMap) -> DataResult<()> {
    let mut csv_writer = WriterBuilder::new().delimiter(b',').from_writer(writer);
    let names: Vec<&str> = dataset.names().collect();
    csv_writer.write_record(&names)?;
    csv_writer.write_record(names.iter().map(|n| units.get(n).map_or("", |u| u.symbol())))?;

    let columns: Vec<&[f64]> = dataset.iter().map(|(_, v)| v).collect();
    for row in 0..dataset.len() {
        csv_writer.write_record(columns.iter().map(|c| c[row].to_string()))?;
    }
    csv_writer.flush()?;
    Ok(())
}

pub fn save_units_csv(path: &Path, dataset: &Dataset, units: &UnitMap) -> DataResult<()> {
    let file = std::fs::File::create(path)?;
    write_units_csv(std::io::BufWriter::new(file), dataset, units)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
# logger export
time,u,w,theta_v,flag
\"s\",m/s,m/s,degC,
0,1.0,0.1,20.0,1
1,1.5,NA,20.5,0
";

    #[test]
    fn reads_names_units_and_values() {
        let config = CsvConfig::default().with_skip_columns(["time"]);
        let (ds, units) = read_units_csv(SAMPLE.as_bytes(), &config).unwrap();
        assert_eq!(ds.names().collect::<Vec<_>>(), ["u", "w", "theta_v", "flag"]);
        assert_eq!(ds.len(), 2);
        assert!(ds.column("w").unwrap()[1].is_nan());
        assert_eq!(units.get("theta_v"), Some(&Unit::celsius()));
        assert!(units.get("flag").is_none());
        assert!(units.get("time").is_none());
    }

    #[test]
    fn ragged_rows_report_line() {
        let text = "u,w\nm/s,m/s\n1.0,2.0\n3.0\n";
        let err = read_units_csv(text.as_bytes(), &CsvConfig::default()).unwrap_err();
        assert!(matches!(err, DataError::Csv { line: 4, .. }));
    }

    #[test]
    fn bad_unit_is_a_parse_error() {
        let text = "u\nfurlongs/fortnight\n1\n";
        let err = read_units_csv(text.as_bytes(), &CsvConfig::default()).unwrap_err();
        assert!(matches!(err, DataError::Core(mf_core::MfError::UnitParse { .. })));
    }

    #[test]
    fn write_then_read_keeps_columns() {
        let ds = Dataset::from_columns(vec![("H", vec![120.5, f64::NAN]), ("tau", vec![0.2, 0.3])]).unwrap();
        let units = UnitMap::parse_pairs([("H", "W/m^2"), ("tau", "N/m^2")]).unwrap();
        let mut buf = Vec::new();
        write_units_csv(&mut buf, &ds, &units).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("H,tau\nW/m^2,N/m^2\n120.5,0.2\n"));

        let (back, back_units) = read_units_csv(text.as_bytes(), &CsvConfig::default()).unwrap();
        assert_eq!(back.column("tau"), ds.column("tau"));
        assert!(back.column("H").unwrap()[1].is_nan());
        assert_eq!(back_units, units);
    }
}
