// Primitives for reading Excel workbooks.

use calamine::{open_workbook, DataType, Reader, Xlsx};
use log::debug;
use snafu::prelude::*;

use crate::survey::{io_common::assemble_table, *};

pub fn read_xlsx_table(path: &str, cfs: &FileSource) -> SurveyResult<RawTable> {
    let wrange = get_range(path, cfs)?;

    let mut iter = wrange.rows();
    let header_row = iter.next().context(EmptyInputSnafu { path })?;
    let header: Vec<String> = header_row
        .iter()
        .map(|c| cell_text(c).unwrap_or_default())
        .collect();
    debug!("read_xlsx_table: header: {:?}", header);

    let rows = iter.enumerate().map(|(idx, row)| {
        let cells: Vec<Option<String>> = row.iter().map(cell_text).collect();
        debug!("read_xlsx_table: idx: {:?} row: {:?}", idx, &cells);
        // The header is on line 1.
        (idx + 2, cells)
    });
    assemble_table(path, cfs, &header, rows)
}

/// The text of a cell, as the questionnaire tool wrote it.
/// Numbers are rendered without a fractional part when they are integral.
fn cell_text(cell: &DataType) -> Option<String> {
    let s = match cell {
        DataType::String(s) => s.clone(),
        DataType::Int(i) => i.to_string(),
        DataType::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        DataType::Float(f) => f.to_string(),
        DataType::Bool(b) => b.to_string(),
        DataType::Empty => return None,
        _ => {
            debug!("cell_text: ignoring cell {:?}", cell);
            return None;
        }
    };
    if s.trim().is_empty() {
        None
    } else {
        Some(s)
    }
}

fn get_range(path: &str, cfs: &FileSource) -> SurveyResult<calamine::Range<DataType>> {
    let worksheet_name_o = cfs.excel_worksheet_name.clone();
    debug!(
        "get_range: path: {:?} worksheet: {:?}",
        &path, &worksheet_name_o
    );
    let mut workbook: Xlsx<_> = open_workbook(path).context(OpeningExcelSnafu { path })?;

    // A worksheet name was provided, use it.
    if let Some(worksheet_name) = worksheet_name_o {
        let wrange = workbook
            .worksheet_range(&worksheet_name)
            .context(MissingWorksheetSnafu {
                name: worksheet_name.clone(),
                path,
            })?
            .context(OpeningExcelSnafu { path })?;
        Ok(wrange)
    } else {
        let all_worksheets = workbook.worksheets();
        match all_worksheets.as_slice() {
            [] => EmptyInputSnafu { path }.fail(),
            [(worksheet_name, wrange)] => {
                debug!(
                    "get_range: path: {:?} worksheet: {:?}",
                    &path, &worksheet_name
                );
                Ok(wrange.clone())
            }
            _ => AmbiguousWorksheetSnafu {
                path,
                count: all_worksheets.len(),
            }
            .fail(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cell_texts() {
        assert_eq!(cell_text(&DataType::String("SS".to_string())), Some("SS".to_string()));
        assert_eq!(cell_text(&DataType::String("  ".to_string())), None);
        assert_eq!(cell_text(&DataType::Float(4.0)), Some("4".to_string()));
        assert_eq!(cell_text(&DataType::Float(4.5)), Some("4.5".to_string()));
        assert_eq!(cell_text(&DataType::Int(3)), Some("3".to_string()));
        assert_eq!(cell_text(&DataType::Empty), None);
    }

    fn testdata(name: &str) -> String {
        format!("{}/testdata/{}", env!("CARGO_MANIFEST_DIR"), name)
    }

    fn source_with_worksheet(name: &str) -> FileSource {
        let mut cfs = FileSource::default();
        cfs.excel_worksheet_name = Some(name.to_string());
        cfs
    }

    #[test]
    fn single_worksheet() {
        let path = testdata("skor_enam/data_kuesioner.xlsx");
        let table = read_xlsx_table(&path, &FileSource::default()).unwrap();
        assert_eq!(table.id_header, "Responden");
        assert_eq!(table.questions, vec!["q1", "q2", "q3"]);
        assert_eq!(table.num_rows(), 4);
        assert_eq!(table.rows[0].id, "R1");
        assert_eq!(
            table.rows[0].cells,
            vec![
                Some("SS".to_string()),
                Some("CTS".to_string()),
                Some("S".to_string())
            ]
        );
        assert_eq!(table.rows[3].cells[2], None);
    }

    #[test]
    fn worksheet_by_name() {
        let path = testdata("dua_lembar/kuesioner_dua_lembar.xlsx");
        let table = read_xlsx_table(&path, &source_with_worksheet("Jawaban")).unwrap();
        assert_eq!(table.id_header, "Nama");
        assert_eq!(table.questions, vec!["P1", "P2"]);
        assert_eq!(table.num_rows(), 2);
        assert_eq!(table.rows[0].cells[1].as_deref(), Some("4"));
        // Missing id: named after the file and the line number.
        assert_eq!(table.rows[1].id, "kuesioner_dua_lembar.xlsx-00000003");
        assert_eq!(
            table.rows[1].cells,
            vec![Some("S".to_string()), Some("TS".to_string())]
        );
    }

    #[test]
    fn several_worksheets_need_a_name() {
        let path = testdata("dua_lembar/kuesioner_dua_lembar.xlsx");
        let res = read_xlsx_table(&path, &FileSource::default());
        assert!(matches!(
            res,
            Err(SurveyError::AmbiguousWorksheet { count: 2, .. })
        ));
    }

    #[test]
    fn unknown_worksheet() {
        let path = testdata("dua_lembar/kuesioner_dua_lembar.xlsx");
        let res = read_xlsx_table(&path, &source_with_worksheet("Tidak Ada"));
        assert!(matches!(res, Err(SurveyError::MissingWorksheet { .. })));
    }

    #[test]
    fn missing_workbook() {
        let res = read_xlsx_table("/nonexistent/kuesioner.xlsx", &FileSource::default());
        assert!(matches!(res, Err(SurveyError::OpeningExcel { .. })));
    }
}
