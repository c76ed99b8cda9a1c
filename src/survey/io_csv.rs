// Primitives for reading CSV files.

use log::{debug, warn};
use snafu::prelude::*;
use std::fs;

use crate::survey::{io_common::assemble_table, *};

// Candidates for delimiter detection, by order of preference.
const DELIMITERS: [u8; 4] = [b',', b';', b'\t', b'|'];

pub fn read_csv_table(path: &str, cfs: &FileSource) -> SurveyResult<RawTable> {
    let bytes = fs::read(path).context(OpeningInputSnafu { path })?;
    let delimiter = match cfs.delimiter_byte()? {
        Some(d) => d,
        None => sniff_delimiter(&bytes),
    };
    debug!(
        "read_csv_table: path: {:?} delimiter: {:?}",
        path, delimiter as char
    );

    let rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(bytes.as_slice());
    let mut records = rdr.into_byte_records();

    let header_rec = records
        .next()
        .context(EmptyInputSnafu { path })?
        .context(CsvLineParseSnafu { lineno: 1_usize })?;
    let header: Vec<String> = header_rec
        .iter()
        .enumerate()
        .map(|(idx, field)| {
            let s = decode_field(field);
            // A byte order mark may precede the first column name.
            if idx == 0 {
                s.trim_start_matches('\u{feff}').to_string()
            } else {
                s
            }
        })
        .collect();
    debug!("read_csv_table: header: {:?}", header);
    let width = header.len();

    let mut rows: Vec<(usize, Vec<Option<String>>)> = Vec::new();
    for (idx, line_r) in records.enumerate() {
        let lineno = idx + 2;
        let line = match line_r {
            Ok(line) => line,
            Err(e) => {
                warn!("{}: skipping line {}: {}", path, lineno, e);
                continue;
            }
        };
        if line.len() > width {
            warn!(
                "{}: skipping line {}: {} fields for {} columns",
                path,
                lineno,
                line.len(),
                width
            );
            continue;
        }
        let cells: Vec<Option<String>> = line
            .iter()
            .map(|field| {
                let s = decode_field(field);
                if s.trim().is_empty() {
                    None
                } else {
                    Some(s)
                }
            })
            .collect();
        debug!("read_csv_table: lineno: {:?} row: {:?}", lineno, &cells);
        rows.push((lineno, cells));
    }
    assemble_table(path, cfs, &header, rows.into_iter())
}

/// Picks the candidate delimiter that appears the most on the first line.
/// Defaults to a comma.
fn sniff_delimiter(bytes: &[u8]) -> u8 {
    let first_line = bytes.split(|b| *b == b'\n').next().unwrap_or(&[]);
    let mut best = (b',', 0);
    for d in DELIMITERS {
        let count = first_line.iter().filter(|b| **b == d).count();
        if count > best.1 {
            best = (d, count);
        }
    }
    best.0
}

// Exports from spreadsheet programs are often in Latin-1.
fn decode_field(field: &[u8]) -> String {
    match std::str::from_utf8(field) {
        Ok(s) => s.to_string(),
        Err(_) => field.iter().map(|b| *b as char).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn testdata(name: &str) -> String {
        format!("{}/testdata/{}", env!("CARGO_MANIFEST_DIR"), name)
    }

    #[test]
    fn sniffing() {
        assert_eq!(sniff_delimiter(b"Nama;q1;q2\nAni;SS;S"), b';');
        assert_eq!(sniff_delimiter(b"Nama\tq1\tq2"), b'\t');
        assert_eq!(sniff_delimiter(b"Nama,q1,q2"), b',');
        assert_eq!(sniff_delimiter(b"Nama"), b',');
        assert_eq!(sniff_delimiter(b""), b',');
    }

    #[test]
    fn latin1_fields() {
        assert_eq!(decode_field(b"Andr\xe9"), "André");
        assert_eq!(decode_field("André".as_bytes()), "André");
    }

    #[test]
    fn semicolon_file() {
        let path = testdata("kuesioner_five/kuesioner.csv");
        let table = read_csv_table(&path, &FileSource::default()).unwrap();
        assert_eq!(table.id_header, "Nama");
        assert_eq!(table.questions, vec!["P1", "P2", "P3", "P4"]);
        assert_eq!(table.num_rows(), 5);
        assert_eq!(table.rows[1].id, "Budi");
        assert_eq!(table.rows[1].cells[2].as_deref(), Some(" setuju "));
        assert_eq!(table.rows[1].cells[3], None);
    }

    #[test]
    fn latin1_file_with_bad_lines() {
        let path = testdata("latin1/kuesioner_latin1.csv");
        let table = read_csv_table(&path, &FileSource::default()).unwrap();
        assert_eq!(table.questions, vec!["q1", "q2"]);
        // The line with too many fields is skipped.
        assert_eq!(table.num_rows(), 3);
        assert_eq!(table.rows[0].id, "André");
        // Missing id: named after the file and the line number.
        assert_eq!(table.rows[2].id, "kuesioner_latin1.csv-00000005");
        assert_eq!(table.rows[2].cells, vec![Some("S".to_string()), None]);
    }

    #[test]
    fn missing_file() {
        let res = read_csv_table(&testdata("nope.csv"), &FileSource::default());
        assert!(matches!(res, Err(SurveyError::OpeningInput { .. })));
    }
}
