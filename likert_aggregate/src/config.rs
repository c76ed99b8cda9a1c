// ********* Input data structures ***********

use std::collections::HashMap;
use std::error::Error;
use std::fmt::Display;

use log::warn;

/// One respondent, as read from the questionnaire export.
///
/// Cells are kept as the raw text. `None` is a missing cell.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RawRow {
    pub id: String,
    pub cells: Vec<Option<String>>,
}

/// The questionnaire: one row per respondent, one column per question.
///
/// The first column of the export (the respondent id) is stored separately
/// in `id_header` and in each row's `id`.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RawTable {
    pub id_header: String,
    pub questions: Vec<String>,
    pub rows: Vec<RawRow>,
}

impl RawTable {
    /// Builds a table from a header (id column first) and the rows.
    ///
    /// Rows shorter than the header are padded with missing cells, longer rows
    /// are truncated.
    pub fn new(header: &[String], rows: Vec<RawRow>) -> Result<RawTable, AggregateErrors> {
        if header.len() < 2 {
            return Err(AggregateErrors::InvalidTable(format!(
                "at least 2 columns are required (id + questions), got {}",
                header.len()
            )));
        }
        let id_header = header[0].clone();
        let questions = header[1..].to_vec();
        // Questions are looked up by name.
        for (idx, q) in questions.iter().enumerate() {
            if questions[..idx].contains(q) {
                return Err(AggregateErrors::InvalidTable(format!(
                    "duplicate question column {:?}",
                    q
                )));
            }
        }
        let width = questions.len();
        let rows = rows
            .into_iter()
            .map(|row| fit_row(row, width))
            .collect();
        Ok(RawTable {
            id_header,
            questions,
            rows,
        })
    }

    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn question_index(&self, question: &str) -> Option<usize> {
        self.questions.iter().position(|q| q == question)
    }

    /// Keeps only the given questions, in the column order of the table.
    pub fn select_questions(&self, selected: &[String]) -> Result<RawTable, AggregateErrors> {
        if selected.is_empty() {
            return Err(AggregateErrors::InvalidTable(
                "the question selection is empty".to_string(),
            ));
        }
        for q in selected {
            if self.question_index(q).is_none() {
                return Err(AggregateErrors::UnknownQuestion(q.clone()));
            }
        }
        let kept: Vec<usize> = (0..self.questions.len())
            .filter(|idx| selected.contains(&self.questions[*idx]))
            .collect();
        let rows = self
            .rows
            .iter()
            .map(|row| RawRow {
                id: row.id.clone(),
                cells: kept.iter().map(|idx| row.cells[*idx].clone()).collect(),
            })
            .collect();
        Ok(RawTable {
            id_header: self.id_header.clone(),
            questions: kept.iter().map(|idx| self.questions[*idx].clone()).collect(),
            rows,
        })
    }
}

pub(crate) fn fit_row(mut row: RawRow, width: usize) -> RawRow {
    if row.cells.len() > width {
        warn!(
            "respondent {}: {} cells for {} questions, dropping the extra cells",
            row.id,
            row.cells.len(),
            width
        );
        row.cells.truncate(width);
    }
    while row.cells.len() < width {
        row.cells.push(None);
    }
    row
}

/// The three-way bucket a label falls into.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, Ord, PartialOrd)]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

impl Sentiment {
    pub fn parse(s: &str) -> Option<Sentiment> {
        match s.trim().to_lowercase().as_str() {
            "positive" | "positif" => Some(Sentiment::Positive),
            "neutral" | "netral" => Some(Sentiment::Neutral),
            "negative" | "negatif" => Some(Sentiment::Negative),
            _ => None,
        }
    }
}

/// A canonical answer of a scale, with everything that maps to it.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ScaleLabel {
    /// The short code (SS, S, ...). It is also accepted as input.
    pub code: String,
    pub ordinal: u32,
    pub sentiment: Sentiment,
    /// Other spellings accepted for this label. Matched trimmed and case-insensitively.
    pub synonyms: Vec<String>,
}

impl ScaleLabel {
    pub fn new(code: &str, ordinal: u32, sentiment: Sentiment, synonyms: &[&str]) -> ScaleLabel {
        ScaleLabel {
            code: code.to_string(),
            ordinal,
            sentiment,
            synonyms: synonyms.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// A Likert scale: the ordered set of labels and the lookup table used to
/// normalize raw answers.
///
/// The declaration order of the labels is the stable order used for
/// reporting and for breaking ties between labels.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ScaleConfig {
    name: String,
    labels: Vec<ScaleLabel>,
    lookup: HashMap<String, usize>,
}

impl ScaleConfig {
    pub fn new(name: &str, labels: Vec<ScaleLabel>) -> Result<ScaleConfig, AggregateErrors> {
        if labels.is_empty() {
            return Err(AggregateErrors::InvalidScale(format!(
                "scale {} has no labels",
                name
            )));
        }
        let mut lookup: HashMap<String, usize> = HashMap::new();
        for (idx, label) in labels.iter().enumerate() {
            if labels[..idx].iter().any(|l| l.code == label.code) {
                return Err(AggregateErrors::InvalidScale(format!(
                    "scale {}: duplicate label {}",
                    name, label.code
                )));
            }
            let keys = std::iter::once(&label.code).chain(label.synonyms.iter());
            for key in keys {
                let key = lookup_key(key);
                if key.is_empty() {
                    return Err(AggregateErrors::InvalidScale(format!(
                        "scale {}: label {} has an empty synonym",
                        name, label.code
                    )));
                }
                match lookup.get(&key) {
                    Some(other) if *other != idx => {
                        return Err(AggregateErrors::InvalidScale(format!(
                            "scale {}: {:?} maps to both {} and {}",
                            name, key, labels[*other].code, label.code
                        )));
                    }
                    _ => {
                        lookup.insert(key, idx);
                    }
                }
            }
        }
        Ok(ScaleConfig {
            name: name.to_string(),
            labels,
            lookup,
        })
    }

    /// The five-point scale of the dashboards: STS=1 .. SS=5.
    pub fn five_point() -> ScaleConfig {
        let labels = vec![
            ScaleLabel::new("STS", 1, Sentiment::Negative, &["sangat tidak setuju"]),
            ScaleLabel::new("TS", 2, Sentiment::Negative, &["tidak setuju"]),
            ScaleLabel::new("CS", 3, Sentiment::Neutral, &["cukup setuju"]),
            ScaleLabel::new("S", 4, Sentiment::Positive, &["setuju"]),
            ScaleLabel::new("SS", 5, Sentiment::Positive, &["sangat setuju"]),
        ];
        ScaleConfig::from_preset("five_point", labels)
    }

    /// The six-point scale of the scoring script: STS=1 .. SS=6, with CTS=3.
    pub fn six_point() -> ScaleConfig {
        let labels = vec![
            ScaleLabel::new("STS", 1, Sentiment::Negative, &["sangat tidak setuju"]),
            ScaleLabel::new("TS", 2, Sentiment::Negative, &["tidak setuju"]),
            ScaleLabel::new("CTS", 3, Sentiment::Negative, &["cukup tidak setuju"]),
            ScaleLabel::new("CS", 4, Sentiment::Neutral, &["cukup setuju"]),
            ScaleLabel::new("S", 5, Sentiment::Positive, &["setuju"]),
            ScaleLabel::new("SS", 6, Sentiment::Positive, &["sangat setuju"]),
        ];
        ScaleConfig::from_preset("six_point", labels)
    }

    /// Looks up one of the built-in scales by name.
    pub fn preset(name: &str) -> Option<ScaleConfig> {
        match name.trim().to_lowercase().replace('-', "_").as_str() {
            "five_point" | "5" => Some(ScaleConfig::five_point()),
            "six_point" | "6" => Some(ScaleConfig::six_point()),
            _ => None,
        }
    }

    fn from_preset(name: &str, labels: Vec<ScaleLabel>) -> ScaleConfig {
        match ScaleConfig::new(name, labels) {
            Ok(scale) => scale,
            Err(e) => panic!("built-in scale {} is invalid: {}", name, e),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn labels(&self) -> &[ScaleLabel] {
        &self.labels
    }

    pub fn label(&self, code: &str) -> Option<&ScaleLabel> {
        self.labels.iter().find(|l| l.code == code)
    }

    pub(crate) fn label_index(&self, code: &str) -> Option<usize> {
        self.labels.iter().position(|l| l.code == code)
    }

    pub(crate) fn lookup(&self, raw: &str) -> Option<usize> {
        self.lookup.get(&lookup_key(raw)).cloned()
    }

    pub fn min_ordinal(&self) -> u32 {
        self.labels.iter().map(|l| l.ordinal).min().unwrap_or(0)
    }

    pub fn max_ordinal(&self) -> u32 {
        self.labels.iter().map(|l| l.ordinal).max().unwrap_or(0)
    }
}

fn lookup_key(s: &str) -> String {
    s.trim().to_lowercase()
}

/// One answer that survived normalization.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Observation {
    pub question: String,
    pub label: String,
    pub ordinal: u32,
    pub sentiment: Sentiment,
}

// ******** Output data structures *********

/// Occurrences of a label, with its share in percent.
#[derive(PartialEq, Debug, Clone)]
pub struct LabelCount {
    pub label: String,
    pub count: u64,
    pub percent: f64,
}

/// Occurrences of a label inside a single question.
/// The percentage uses the number of respondents as denominator.
#[derive(PartialEq, Debug, Clone)]
pub struct QuestionCount {
    pub question: String,
    pub label: String,
    pub count: u64,
    pub percent: f64,
}

#[derive(PartialEq, Debug, Clone)]
pub struct QuestionRate {
    pub question: String,
    pub percent: f64,
}

/// Mean ordinal score of a question. `mean` is `None` when the question
/// has no valid answer.
#[derive(PartialEq, Debug, Clone)]
pub struct QuestionMean {
    pub question: String,
    pub count: u64,
    pub mean: Option<f64>,
}

#[derive(PartialEq, Debug, Clone)]
pub struct CategoryShare {
    pub count: u64,
    pub percent: f64,
}

/// Positive / neutral / negative split.
///
/// The percentages are rounded independently and may not add up to exactly 100.
#[derive(PartialEq, Debug, Clone)]
pub struct SentimentSplit {
    pub positive: CategoryShare,
    pub neutral: CategoryShare,
    pub negative: CategoryShare,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct SurveySummary {
    pub respondents: u64,
    pub questions: u64,
    pub observations: u64,
    /// Cells that were missing, blank or not recognized by the scale.
    pub dropped_cells: u64,
    pub scale_min: u32,
    pub scale_max: u32,
}

/// Errors that prevent a statistic from being computed.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum AggregateErrors {
    /// The table does not have the expected shape.
    InvalidTable(String),
    InvalidScale(String),
    /// No answer could be normalized: every rate and mean is undefined.
    NoValidData,
    UnknownLabel(String),
    UnknownQuestion(String),
}

impl Error for AggregateErrors {}

impl Display for AggregateErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AggregateErrors::InvalidTable(msg) => write!(f, "invalid input table: {}", msg),
            AggregateErrors::InvalidScale(msg) => write!(f, "invalid scale: {}", msg),
            AggregateErrors::NoValidData => write!(f, "no valid data"),
            AggregateErrors::UnknownLabel(l) => write!(f, "label {} is not part of the scale", l),
            AggregateErrors::UnknownQuestion(q) => write!(f, "unknown question {}", q),
        }
    }
}
