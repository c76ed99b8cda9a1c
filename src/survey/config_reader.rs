use crate::survey::*;

use log::debug;
use std::fs;

use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "surveyName")]
    pub survey_name: Option<String>,
    #[serde(rename = "outputDirectory")]
    pub output_directory: Option<String>,
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileSource {
    /// csv or xlsx
    pub provider: Option<String>,
    #[serde(rename = "filePath")]
    pub file_path: Option<String>,
    // Both indexes start at 1, and accept Excel-style letters.
    #[serde(rename = "idColumnIndex")]
    _id_column_index: Option<JSValue>,
    #[serde(rename = "firstQuestionColumnIndex")]
    _first_question_column_index: Option<JSValue>,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
    pub delimiter: Option<String>,
}

impl FileSource {
    /// The position of the respondent id column, starting at 0.
    pub fn id_column_index(&self) -> SurveyResult<usize> {
        match &self._id_column_index {
            None => Ok(0),
            x => Ok(read_js_int(x)? - 1),
        }
    }

    /// The position of the first question column, starting at 0.
    pub fn first_question_column_index(&self) -> SurveyResult<usize> {
        match &self._first_question_column_index {
            None => Ok(1),
            x => Ok(read_js_int(x)? - 1),
        }
    }

    pub fn delimiter_byte(&self) -> SurveyResult<Option<u8>> {
        match self.delimiter.as_deref() {
            None => Ok(None),
            Some("\\t") | Some("tab") => Ok(Some(b'\t')),
            Some(s) if s.len() == 1 => Ok(Some(s.as_bytes()[0])),
            Some(s) => whatever!("the delimiter must be a single character: {:?}", s),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ScaleLabelSpec {
    pub code: String,
    pub ordinal: u32,
    pub sentiment: String,
    #[serde(default)]
    pub synonyms: Vec<String>,
}

/// Either a built-in scale (`preset`) or a full definition (`name` + `labels`).
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct ScaleSpec {
    pub preset: Option<String>,
    pub name: Option<String>,
    pub labels: Option<Vec<ScaleLabelSpec>>,
}

impl ScaleSpec {
    pub fn to_scale(&self) -> SurveyResult<ScaleConfig> {
        match (&self.preset, &self.labels) {
            (Some(preset), None) => {
                ScaleConfig::preset(preset).context(UnknownScaleSnafu { name: preset })
            }
            (None, Some(label_specs)) => {
                let mut labels: Vec<ScaleLabel> = Vec::new();
                for spec in label_specs {
                    let sentiment = match Sentiment::parse(&spec.sentiment) {
                        Some(s) => s,
                        None => whatever!(
                            "label {}: unknown sentiment {:?}",
                            spec.code,
                            spec.sentiment
                        ),
                    };
                    labels.push(ScaleLabel {
                        code: spec.code.clone(),
                        ordinal: spec.ordinal,
                        sentiment,
                        synonyms: spec.synonyms.clone(),
                    });
                }
                let name = self.name.clone().unwrap_or_else(|| "custom".to_string());
                ScaleConfig::new(&name, labels).context(AggregateSnafu {})
            }
            _ => whatever!("a scale needs either a preset or a list of labels, not both"),
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Default, Serialize, Deserialize)]
pub struct SurveyConfig {
    #[serde(rename = "outputSettings", default)]
    pub output_settings: OutputSettings,
    #[serde(rename = "fileSource", default)]
    pub file_source: FileSource,
    pub scale: Option<ScaleSpec>,
    pub questions: Option<Vec<String>>,
    #[serde(rename = "rateReportLabels")]
    pub rate_report_labels: Option<Vec<String>>,
}

pub fn read_config(path: &str) -> SurveyResult<SurveyConfig> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let config: SurveyConfig =
        serde_json::from_str(&contents).context(ParsingJsonSnafu {})?;
    debug!("read_config: {:?}", config);
    Ok(config)
}

/// Reads a reference summary. Going through a JSON value normalizes the
/// formatting and the key order, so that it can be compared as text.
pub fn read_summary(path: &str) -> SurveyResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningJsonSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(js)
}

fn read_js_int(x: &Option<JSValue>) -> SurveyResult<usize> {
    let value = format!("{:?}", x);
    let res = match x {
        Some(JSValue::Number(n)) => n.as_u64().map(|x| x as usize),
        // Excel-style columns: A, B, ..., Z, AA, AB, ...
        Some(JSValue::String(s)) if !s.is_empty() && s.chars().all(|c| c.is_ascii_alphabetic()) => {
            Some(
                s.to_ascii_uppercase()
                    .bytes()
                    .fold(0, |acc, b| acc * 26 + (b - b'A' + 1) as usize),
            )
        }
        Some(JSValue::String(s)) => s.parse::<usize>().ok(),
        _ => None,
    };
    match res {
        Some(idx) if idx >= 1 => Ok(idx),
        _ => ParsingColumnIndexSnafu { value }.fail(),
    }
}
