pub use crate::config::*;

/// A builder for assembling a questionnaire table one respondent at a time.
///
/// ```
/// pub use likert_aggregate::builder::Builder;
/// # use likert_aggregate::AggregateErrors;
///
/// let mut builder = Builder::new("Nama", &["q1".to_string(), "q2".to_string()])?;
///
/// builder.add_row_simple("Ani", &["SS", "setuju"]);
/// builder.add_row_simple("Budi", &["ts", ""]);
///
/// let table = builder.build()?;
/// assert_eq!(table.num_rows(), 2);
/// # Ok::<(), AggregateErrors>(())
/// ```
pub struct Builder {
    pub(crate) _id_header: String,
    pub(crate) _questions: Vec<String>,
    pub(crate) _rows: Vec<RawRow>,
}

impl Builder {
    pub fn new(id_header: &str, questions: &[String]) -> Result<Builder, AggregateErrors> {
        if questions.is_empty() {
            return Err(AggregateErrors::InvalidTable(
                "at least one question column is required".to_string(),
            ));
        }
        Ok(Builder {
            _id_header: id_header.to_string(),
            _questions: questions.to_vec(),
            _rows: Vec::new(),
        })
    }

    /// Adds a respondent from plain strings. Empty strings are missing cells.
    pub fn add_row_simple(&mut self, id: &str, cells: &[&str]) {
        let cells: Vec<Option<String>> = cells
            .iter()
            .map(|s| {
                if s.is_empty() {
                    None
                } else {
                    Some(s.to_string())
                }
            })
            .collect();
        self.add_row(id, cells)
    }

    /// Adds a respondent.
    ///
    /// cells: the raw answers in question order. Extra cells are dropped and
    /// missing trailing cells are treated as unanswered.
    pub fn add_row(&mut self, id: &str, cells: Vec<Option<String>>) {
        let row = fit_row(
            RawRow {
                id: id.to_string(),
                cells,
            },
            self._questions.len(),
        );
        self._rows.push(row);
    }

    pub fn num_rows(&self) -> usize {
        self._rows.len()
    }

    pub fn build(self) -> Result<RawTable, AggregateErrors> {
        let mut header = vec![self._id_header];
        header.extend(self._questions);
        RawTable::new(&header, self._rows)
    }
}
