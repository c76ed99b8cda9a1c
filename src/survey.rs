use log::{debug, info, warn};

pub use likert_aggregate::*;
use snafu::{prelude::*, Snafu};

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::json;
use serde_json::Map as JSMap;
use serde_json::Value as JSValue;
use text_diff::print_diff;

pub mod config_reader;
pub mod io_common;
pub mod io_csv;
pub mod io_xlsx;
pub mod scoring;

pub use crate::survey::config_reader::*;
use crate::survey::scoring::ScoringQuery;

#[derive(Debug, Snafu)]
pub enum SurveyError {
    #[snafu(display("Error opening file {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("Worksheet {name} not found in {path}"))]
    MissingWorksheet { name: String, path: String },
    #[snafu(display(
        "{path} has {count} worksheets, the worksheet name must be provided"
    ))]
    AmbiguousWorksheet { path: String, count: usize },
    #[snafu(display("Error opening file {path}"))]
    OpeningInput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("{path} is empty"))]
    EmptyInput { path: String },
    #[snafu(display("Error parsing line {lineno}"))]
    CsvLineParse { source: csv::Error, lineno: usize },
    #[snafu(display("Column {column} does not exist, the file has {width} columns"))]
    ColumnOutOfRange { column: usize, width: usize },
    #[snafu(display("Error reading file {path}"))]
    OpeningJson {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("Cannot understand column index {value}"))]
    ParsingColumnIndex { value: String },
    #[snafu(display("Error writing file {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Unknown input type {provider} (expected csv or xlsx)"))]
    UnknownProvider { provider: String },
    #[snafu(display("Unknown scale {name} (expected five_point or six_point)"))]
    UnknownScale { name: String },
    #[snafu(display("Unknown query {code} (expected q1 to q13)"))]
    UnknownQuery { code: String },
    #[snafu(display("Invalid input: {source}"))]
    Aggregate { source: AggregateErrors },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type SurveyResult<T> = Result<T, SurveyError>;

/// What to analyze and where to write it. Every field overrides the
/// corresponding setting of the configuration file.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct AnalysisOptions {
    pub config_path: Option<String>,
    pub input: Option<String>,
    pub input_type: Option<String>,
    pub scale: Option<String>,
    pub questions: Option<Vec<String>>,
    pub excel_worksheet_name: Option<String>,
    pub query: Option<String>,
    pub out: Option<String>,
    pub reference: Option<String>,
}

// A statistic without data is reported as null in the summary.
fn optional<T>(res: Result<T, AggregateErrors>) -> SurveyResult<Option<T>> {
    match res {
        Ok(x) => Ok(Some(x)),
        Err(AggregateErrors::NoValidData) => Ok(None),
        Err(e) => Err(e).context(AggregateSnafu {}),
    }
}

fn label_count_js(lc: &LabelCount) -> JSValue {
    json!({"label": lc.label, "count": lc.count, "percent": lc.percent})
}

fn question_mean_js(qm: &QuestionMean) -> JSValue {
    json!({"question": qm.question, "count": qm.count, "mean": qm.mean})
}

fn category_js(c: &CategoryShare) -> JSValue {
    json!({"count": c.count, "percent": c.percent})
}

fn build_summary_js(
    survey_name: &str,
    source_name: &str,
    agg: &ResponseAggregator,
    rate_report_labels: &[String],
) -> SurveyResult<JSValue> {
    let s = agg.summary();

    let label_counts: Vec<JSValue> = agg
        .label_counts()
        .context(AggregateSnafu {})?
        .iter()
        .map(label_count_js)
        .collect();

    let question_means: Vec<JSValue> = agg
        .question_means()
        .context(AggregateSnafu {})?
        .iter()
        .map(question_mean_js)
        .collect();

    let mut top_questions: Vec<JSValue> = Vec::new();
    for label in agg.scale().labels() {
        let qc = agg
            .question_with_most(&label.code)
            .context(AggregateSnafu {})?;
        top_questions.push(json!({
            "label": qc.label,
            "question": qc.question,
            "count": qc.count,
            "percent": qc.percent
        }));
    }

    let mut rate_reports: JSMap<String, JSValue> = JSMap::new();
    for label in rate_report_labels {
        let report: Vec<JSValue> = agg
            .label_rate_report(label)
            .context(AggregateSnafu {})?
            .iter()
            .map(|qr| json!({"question": qr.question, "percent": qr.percent}))
            .collect();
        rate_reports.insert(label.clone(), JSValue::Array(report));
    }

    let sentiment = optional(agg.sentiment_split())?.map(|split| {
        json!({
            "positive": category_js(&split.positive),
            "neutral": category_js(&split.neutral),
            "negative": category_js(&split.negative)
        })
    });

    Ok(json!({
        "config": {
            "survey": survey_name,
            "scale": agg.scale().name(),
            "source": source_name
        },
        "summary": {
            "respondents": s.respondents,
            "questions": s.questions,
            "observations": s.observations,
            "droppedCells": s.dropped_cells,
            "scaleMin": s.scale_min,
            "scaleMax": s.scale_max
        },
        "labelCounts": label_counts,
        "meanScore": optional(agg.mean_score())?,
        "questionMeans": question_means,
        "bestQuestion": optional(agg.best_question())?.as_ref().map(question_mean_js),
        "worstQuestion": optional(agg.worst_question())?.as_ref().map(question_mean_js),
        "mostCommon": optional(agg.most_common_label())?.as_ref().map(label_count_js),
        "leastCommon": optional(agg.least_common_label())?.as_ref().map(label_count_js),
        "sentiment": sentiment,
        "topQuestionByLabel": top_questions,
        "rateReports": rate_reports
    }))
}

fn resolve_provider(opts: &AnalysisOptions, cfs: &FileSource, path: &str) -> SurveyResult<String> {
    let provider = opts
        .input_type
        .clone()
        .or_else(|| cfs.provider.clone())
        .unwrap_or_else(|| {
            let ext = Path::new(path)
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e.to_lowercase());
            match ext.as_deref() {
                Some("xlsx") | Some("xlsm") => "xlsx".to_string(),
                _ => "csv".to_string(),
            }
        });
    match provider.to_lowercase().as_str() {
        "csv" => Ok("csv".to_string()),
        "xlsx" | "excel" => Ok("xlsx".to_string()),
        _ => UnknownProviderSnafu { provider }.fail(),
    }
}

fn resolve_scale(opts: &AnalysisOptions, config: &SurveyConfig) -> SurveyResult<ScaleConfig> {
    match (&opts.scale, &config.scale) {
        (Some(name), _) => ScaleConfig::preset(name).context(UnknownScaleSnafu { name }),
        (None, Some(spec)) => spec.to_scale(),
        (None, None) => Ok(ScaleConfig::five_point()),
    }
}

fn read_table(path: &str, provider: &str, cfs: &FileSource) -> SurveyResult<RawTable> {
    info!("Attempting to read {} file {:?}", provider, path);
    match provider {
        "xlsx" => io_xlsx::read_xlsx_table(path, cfs),
        _ => io_csv::read_csv_table(path, cfs),
    }
}

/// Reads the data, runs the aggregator and renders the result: either the
/// line of a scoring query or the pretty-printed JSON summary.
pub fn compute_analysis(opts: &AnalysisOptions) -> SurveyResult<String> {
    let (config, root_p) = load_config(opts)?;
    analyze(opts, &config, &root_p)
}

fn analyze(opts: &AnalysisOptions, config: &SurveyConfig, root_p: &Path) -> SurveyResult<String> {
    info!("config: {:?}", config);

    let mut cfs = config.file_source.clone();
    if opts.excel_worksheet_name.is_some() {
        cfs.excel_worksheet_name = opts.excel_worksheet_name.clone();
    }

    // Paths in the configuration are relative to the configuration file.
    let data_path: String = match (&opts.input, &cfs.file_path) {
        (Some(p), _) => p.clone(),
        (None, Some(p)) => root_p.join(p).display().to_string(),
        (None, None) => whatever!("No input file: use --input or set fileSource.filePath"),
    };
    let provider = resolve_provider(opts, &cfs, &data_path)?;
    let scale = resolve_scale(opts, config)?;

    let mut table = read_table(&data_path, &provider, &cfs)?;
    if let Some(questions) = opts.questions.as_ref().or(config.questions.as_ref()) {
        debug!("analyze: selecting questions {:?}", questions);
        table = table.select_questions(questions).context(AggregateSnafu {})?;
    }

    let agg = ResponseAggregator::new(&table, &scale);
    agg.validate().context(AggregateSnafu {})?;

    if let Some(code) = &opts.query {
        let query = ScoringQuery::parse(code).context(UnknownQuerySnafu { code })?;
        return scoring::answer(&agg, query).context(AggregateSnafu {});
    }

    let rate_report_labels: Vec<String> = match &config.rate_report_labels {
        Some(labels) => labels.clone(),
        // The lowest label of the scale.
        None => scale
            .labels()
            .iter()
            .min_by_key(|l| l.ordinal)
            .map(|l| vec![l.code.clone()])
            .unwrap_or_default(),
    };

    let survey_name = config
        .output_settings
        .survey_name
        .clone()
        .unwrap_or_else(|| io_common::simplify_file_name(&data_path));
    let summary_js = build_summary_js(
        &survey_name,
        &io_common::simplify_file_name(&data_path),
        &agg,
        &rate_report_labels,
    )?;
    serde_json::to_string_pretty(&summary_js).context(ParsingJsonSnafu {})
}

// The configuration and the directory its relative paths start from.
fn load_config(opts: &AnalysisOptions) -> SurveyResult<(SurveyConfig, PathBuf)> {
    match &opts.config_path {
        Some(config_path) => {
            let config = read_config(config_path)?;
            let root_p = Path::new(config_path)
                .parent()
                .map(|p| p.to_path_buf())
                .unwrap_or_default();
            Ok((config, root_p))
        }
        None => Ok((SurveyConfig::default(), PathBuf::new())),
    }
}

fn output_path(
    opts: &AnalysisOptions,
    config: &SurveyConfig,
    root_p: &Path,
) -> Option<String> {
    if let Some(out) = &opts.out {
        return match out.as_str() {
            "stdout" | "" => None,
            p => Some(p.to_string()),
        };
    }
    match &config.output_settings.output_directory {
        Some(dir) => {
            let name = config
                .output_settings
                .survey_name
                .clone()
                .unwrap_or_else(|| "survey".to_string());
            let p = root_p.join(dir).join(format!("{}_summary.json", name));
            Some(p.display().to_string())
        }
        None => None,
    }
}

/// Compares the summary with a reference file and prints the differences.
pub fn check_summary(summary_path: &str, pretty_js_stats: &str) -> SurveyResult<()> {
    let summary_ref = read_summary(summary_path)?;
    debug!("summary: {:?}", summary_ref);
    let pretty_js_summary_ref =
        serde_json::to_string_pretty(&summary_ref).context(ParsingJsonSnafu {})?;
    if pretty_js_summary_ref != pretty_js_stats {
        warn!("Found differences with the reference string");
        print_diff(pretty_js_summary_ref.as_str(), pretty_js_stats, "\n");
        whatever!("Difference detected between calculated summary and reference summary")
    }
    Ok(())
}

pub fn run_analysis(opts: &AnalysisOptions) -> SurveyResult<()> {
    if opts.query.is_some() && opts.reference.is_some() {
        whatever!("A reference summary cannot be checked when a scoring query is requested")
    }
    let (config, root_p) = load_config(opts)?;
    let output = analyze(opts, &config, &root_p)?;

    // A scoring query only prints its line.
    if opts.query.is_some() {
        println!("{}", output);
        return Ok(());
    }

    match output_path(opts, &config, &root_p) {
        Some(p) => {
            info!("Writing summary to {:?}", p);
            fs::write(&p, &output).context(WritingOutputSnafu { path: p.clone() })?;
        }
        None => println!("{}", output),
    }

    if let Some(summary_p) = &opts.reference {
        check_summary(summary_p, &output)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn testdata(name: &str) -> String {
        format!("{}/testdata/{}", env!("CARGO_MANIFEST_DIR"), name)
    }

    fn run_survey_test(test_name: &str) -> SurveyResult<()> {
        let opts = AnalysisOptions {
            config_path: Some(testdata(&format!("{}/{}_config.json", test_name, test_name))),
            out: Some("stdout".to_string()),
            reference: Some(testdata(&format!(
                "{}/{}_expected_summary.json",
                test_name, test_name
            ))),
            ..Default::default()
        };
        run_analysis(&opts)
    }

    #[test]
    fn kuesioner_five() {
        let res = run_survey_test("kuesioner_five");
        assert!(res.is_ok(), "{:?}", res);
    }

    #[test]
    fn reference_mismatch_is_an_error() {
        let opts = AnalysisOptions {
            config_path: Some(testdata("kuesioner_five/kuesioner_five_config.json")),
            scale: Some("six-point".to_string()),
            reference: Some(testdata("kuesioner_five/kuesioner_five_expected_summary.json")),
            ..Default::default()
        };
        let output = compute_analysis(&opts).unwrap();
        assert!(check_summary(opts.reference.as_ref().unwrap(), &output).is_err());
    }

    #[test]
    fn scoring_query_from_csv() {
        let opts = AnalysisOptions {
            input: Some(testdata("skor_enam/data_kuesioner.csv")),
            scale: Some("six_point".to_string()),
            query: Some("q13".to_string()),
            ..Default::default()
        };
        assert_eq!(
            compute_analysis(&opts).unwrap(),
            "positif=6:54.5|netral=1:9.1|negatif=4:36.4"
        );

        let opts = AnalysisOptions {
            query: Some("q10".to_string()),
            ..opts
        };
        assert_eq!(compute_analysis(&opts).unwrap(), "4.27");
    }

    #[test]
    fn question_filter() {
        let opts = AnalysisOptions {
            input: Some(testdata("skor_enam/data_kuesioner.csv")),
            scale: Some("six_point".to_string()),
            questions: Some(vec!["q2".to_string()]),
            query: Some("q10".to_string()),
            ..Default::default()
        };
        // (3 + 2 + 1 + 4) / 4
        assert_eq!(compute_analysis(&opts).unwrap(), "2.50");
    }

    #[test]
    fn query_from_xlsx() {
        let opts = AnalysisOptions {
            input: Some(testdata("skor_enam/data_kuesioner.xlsx")),
            scale: Some("six_point".to_string()),
            query: Some("q13".to_string()),
            ..Default::default()
        };
        assert_eq!(
            compute_analysis(&opts).unwrap(),
            "positif=6:54.5|netral=1:9.1|negatif=4:36.4"
        );
    }

    #[test]
    fn query_with_reference_is_refused() {
        let opts = AnalysisOptions {
            input: Some(testdata("skor_enam/data_kuesioner.csv")),
            query: Some("q1".to_string()),
            reference: Some(testdata("kuesioner_five/kuesioner_five_expected_summary.json")),
            ..Default::default()
        };
        assert!(matches!(
            run_analysis(&opts),
            Err(SurveyError::Whatever { .. })
        ));
    }

    #[test]
    fn output_paths() {
        let config: SurveyConfig = serde_json::from_str(
            r#"{"outputSettings": {"surveyName": "Kepuasan", "outputDirectory": "hasil"}}"#,
        )
        .unwrap();
        let root_p = Path::new("/data/survei");
        let opts = AnalysisOptions::default();
        assert_eq!(
            output_path(&opts, &config, root_p).as_deref(),
            Some("/data/survei/hasil/Kepuasan_summary.json")
        );
        let opts = AnalysisOptions {
            out: Some("stdout".to_string()),
            ..Default::default()
        };
        assert_eq!(output_path(&opts, &config, root_p), None);
        assert_eq!(
            output_path(&AnalysisOptions::default(), &SurveyConfig::default(), root_p),
            None
        );
    }

    #[test]
    fn unknown_query() {
        let opts = AnalysisOptions {
            input: Some(testdata("skor_enam/data_kuesioner.csv")),
            query: Some("q99".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            compute_analysis(&opts),
            Err(SurveyError::UnknownQuery { .. })
        ));
    }

    #[test]
    fn no_valid_answers() {
        let opts = AnalysisOptions {
            input: Some(testdata("invalid/semua_kosong.csv")),
            ..Default::default()
        };
        assert!(matches!(
            compute_analysis(&opts),
            Err(SurveyError::Aggregate {
                source: AggregateErrors::NoValidData
            })
        ));
    }

    #[test]
    fn single_column_file() {
        let opts = AnalysisOptions {
            input: Some(testdata("invalid/satu_kolom.csv")),
            ..Default::default()
        };
        assert!(compute_analysis(&opts).is_err());
    }

    #[test]
    fn providers() {
        let opts = AnalysisOptions::default();
        let cfs = FileSource::default();
        assert_eq!(resolve_provider(&opts, &cfs, "a/b.XLSX").unwrap(), "xlsx");
        assert_eq!(resolve_provider(&opts, &cfs, "a/b.csv").unwrap(), "csv");
        assert_eq!(resolve_provider(&opts, &cfs, "a/b").unwrap(), "csv");
        let opts = AnalysisOptions {
            input_type: Some("ods".to_string()),
            ..Default::default()
        };
        assert!(resolve_provider(&opts, &cfs, "a/b.csv").is_err());
    }
}
