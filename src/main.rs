mod args;
mod survey;

use clap::Parser;
use log::{debug, warn};
use snafu::ErrorCompat;

use crate::args::Args;
use crate::survey::AnalysisOptions;

fn main() {
    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();
    debug!("args: {:?}", args);

    let opts = AnalysisOptions {
        config_path: args.config,
        input: args.input,
        input_type: args.input_type,
        scale: args.scale,
        questions: args.questions,
        excel_worksheet_name: args.excel_worksheet_name,
        query: args.query,
        out: args.out,
        reference: args.reference,
    };

    if let Err(e) = survey::run_analysis(&opts) {
        warn!("Error occured {:?}", e);
        eprintln!("An error occured: {}", e);
        if let Some(bt) = ErrorCompat::backtrace(&e) {
            eprintln!("trace: {}", bt);
        }
        std::process::exit(1);
    }
}
