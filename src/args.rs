use clap::Parser;

/// Descriptive statistics for Likert-scale questionnaires.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) The JSON file describing the analysis: data source, scale and question filter.
    /// All the other options override what this file specifies.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (file path) A reference summary in JSON format. If provided, likertstat will
    /// check that the computed summary matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the summary will be written in JSON format to the given
    /// location. By default it is printed on the standard output.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path) The questionnaire export. Setting this option overrides the file path of the --config option.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (csv or xlsx) The type of the input. By default, it is guessed from the file extension.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// (five-point or six-point, default five-point) The answer scale.
    #[clap(long, value_parser)]
    pub scale: Option<String>,

    /// (list of comma-separated values or not specified) If specified, only these questions are analyzed.
    #[clap(long, value_parser, value_delimiter = ',')]
    pub questions: Option<Vec<String>>,

    /// When using an Excel file, indicates the name of the worksheet to use.
    #[clap(long, value_parser)]
    pub excel_worksheet_name: Option<String>,

    /// (q1 to q13) Prints the answer to a single scoring query instead of the summary.
    /// Cannot be combined with --reference.
    #[clap(short, long, value_parser, conflicts_with = "reference")]
    pub query: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard error.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
