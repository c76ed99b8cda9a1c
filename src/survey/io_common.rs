use likert_aggregate::builder::Builder;
use log::{debug, info};
use snafu::prelude::*;
use std::path::Path;

use crate::survey::*;

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(path)
        .to_string()
}

/// Ids given to respondents whose id cell is empty.
pub fn make_default_id(path: &str) -> impl Fn(usize) -> String {
    let simplified_file_name = simplify_file_name(path);
    move |lineno| format!("{}-{:08}", simplified_file_name, lineno)
}

/// Assembles the table read by one of the providers.
///
/// `header` is the first line of the file. Each row comes with its line number
/// (starting at 1, the header being line 1). Every column from the first
/// question column onwards is a question, except the id column.
pub fn assemble_table(
    path: &str,
    cfs: &FileSource,
    header: &[String],
    rows: impl Iterator<Item = (usize, Vec<Option<String>>)>,
) -> SurveyResult<RawTable> {
    let id_idx = cfs.id_column_index()?;
    let first_question_idx = cfs.first_question_column_index()?;
    ensure!(
        id_idx < header.len(),
        ColumnOutOfRangeSnafu {
            column: id_idx + 1,
            width: header.len()
        }
    );
    ensure!(
        first_question_idx < header.len(),
        ColumnOutOfRangeSnafu {
            column: first_question_idx + 1,
            width: header.len()
        }
    );
    let question_cols: Vec<usize> = (first_question_idx..header.len())
        .filter(|idx| *idx != id_idx)
        .collect();
    let questions: Vec<String> = question_cols
        .iter()
        .map(|idx| header[*idx].trim().to_string())
        .collect();
    debug!("assemble_table: {}: questions {:?}", path, questions);

    let default_id = make_default_id(path);
    let mut builder =
        Builder::new(header[id_idx].trim(), &questions).context(AggregateSnafu {})?;
    for (lineno, cells) in rows {
        let id = match cells.get(id_idx).cloned().flatten() {
            Some(s) if !s.trim().is_empty() => s.trim().to_string(),
            _ => default_id(lineno),
        };
        let answers: Vec<Option<String>> = question_cols
            .iter()
            .map(|idx| cells.get(*idx).cloned().flatten())
            .collect();
        builder.add_row(&id, answers);
    }
    info!("Read {} respondents from {}", builder.num_rows(), path);
    builder.build().context(AggregateSnafu {})
}
