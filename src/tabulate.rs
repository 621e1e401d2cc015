use log::{debug, info, warn};

use poll_tally::*;
use snafu::{prelude::*, ErrorCompat, Snafu};

use std::fs;
use std::path::Path;

use serde_json::json;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::tabulate::config_reader::*;

pub mod config_reader;
mod io_common;
mod io_json;
mod io_text;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum TabulateError {
    #[snafu(display("Error opening file {path}"))]
    OpeningFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing JSON file {path}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Error writing {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error serializing the summary"))]
    SerializingSummary { source: serde_json::Error },
    #[snafu(display("The configuration file {path} has no parent directory"))]
    MissingParentDir { path: String },
    #[snafu(display("Unknown ballot type {name:?}"))]
    UnknownBallotType { name: String },
    #[snafu(display("Unknown tally type {name:?}"))]
    UnknownTallyType { name: String },
    #[snafu(display("Invalid election definition"))]
    InvalidElection { source: ConfigError },
    #[snafu(display("Tally failed"))]
    Tally { source: TallyError },
    #[snafu(display("Difference detected between calculated summary and reference summary {path}"))]
    ReferenceMismatch { path: String },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type TabulateResult<T> = Result<T, TabulateError>;

/// What the command line can change for a run.
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Replaces the record sources of the configuration.
    pub input: Option<String>,
    pub input_type: Option<String>,
    /// A file path or `stdout`.
    pub out: Option<String>,
    pub reference: Option<String>,
    pub text: bool,
}

fn read_records(path: &str, provider: &str) -> TabulateResult<Vec<String>> {
    info!("Attempting to read record file {:?}", path);
    match provider {
        "text" => io_text::read_text_records(path),
        "json" => io_json::read_json_records(path),
        x => whatever!("Provider not implemented {:?}", x),
    }
}

fn build_summary_js(config: &TabulateConfig, result: &ElectionResult) -> TabulateResult<JSValue> {
    let c = OutputConfig {
        contest: config.output_settings.contest_name.clone(),
        date: config.output_settings.contest_date.clone(),
        election: result.election_id,
        ballot_type: result.ballot_type.to_string(),
        tally_type: result.tally_type.to_string(),
    };
    let digest = result.digest().context(SerializingSummarySnafu)?;
    let results = serde_json::to_value(result).context(SerializingSummarySnafu)?;
    Ok(json!({
        "config": c,
        "digest": digest,
        "results": results
    }))
}

fn write_output(destination: &str, contents: &str) -> TabulateResult<()> {
    if destination == "stdout" {
        println!("{}", contents);
    } else {
        info!("Writing summary to {}", destination);
        fs::write(destination, contents).context(WritingOutputSnafu { path: destination })?;
    }
    Ok(())
}

/// Tallies the election described by a configuration file and returns its summary.
pub fn run_election(config_path: &str, options: &RunOptions) -> TabulateResult<JSValue> {
    let config_p = Path::new(config_path);
    let config = read_config(config_path)?;
    info!("config: {:?}", config);
    let root_p = config_p
        .parent()
        .context(MissingParentDirSnafu { path: config_path })?;

    let election = config.election.to_election()?;
    let mut tallier = ElectionTallier::new(&election).context(InvalidElectionSnafu)?;

    let sources: Vec<(String, String)> = match &options.input {
        Some(input) => vec![(
            input.clone(),
            options
                .input_type
                .clone()
                .unwrap_or_else(|| "text".to_string()),
        )],
        None => config
            .record_sources
            .iter()
            .map(|cfs| (io_common::resolve_path(root_p, &cfs.file_path), cfs.provider.clone()))
            .collect(),
    };
    if sources.is_empty() {
        whatever!("No record source in {} and no --input", config_path);
    }

    for (path, provider) in sources.iter() {
        let records = read_records(path, provider)?;
        info!(
            "{}: {} records",
            io_common::simplify_file_name(path),
            records.len()
        );
        for record in records.iter() {
            tallier.add_record(record).context(TallySnafu)?;
        }
    }
    let result = tallier.finish_tally().context(TallySnafu)?;
    debug!("result: {:?}", result);

    if options.text {
        println!("{}", result.render_text(&election));
    }

    let result_js = build_summary_js(&config, &result)?;
    let pretty_js_stats =
        serde_json::to_string_pretty(&result_js).context(SerializingSummarySnafu)?;

    let destination = match &options.out {
        Some(out) => Some(out.clone()),
        None => config
            .output_settings
            .output_file
            .as_ref()
            .map(|f| io_common::resolve_path(root_p, f)),
    };
    if let Some(dest) = destination {
        write_output(&dest, &pretty_js_stats)?;
    }

    // The reference summary, if provided for comparison
    if let Some(summary_p) = &options.reference {
        let summary_ref = read_summary(summary_p)?;
        let pretty_js_summary_ref =
            serde_json::to_string_pretty(&summary_ref).context(SerializingSummarySnafu)?;
        if pretty_js_summary_ref != pretty_js_stats {
            warn!("Found differences with the reference string");
            print_diff(
                pretty_js_summary_ref.as_str(),
                pretty_js_stats.as_ref(),
                "\n",
            );
            return ReferenceMismatchSnafu { path: summary_p }.fail();
        }
    }

    Ok(result_js)
}

/// Prints an error and its chain of causes.
pub fn report_error(e: &TabulateError) {
    eprintln!("An error occured: {}", e);
    let mut cause = std::error::Error::source(e);
    while let Some(c) = cause {
        eprintln!("  caused by: {}", c);
        cause = std::error::Error::source(c);
    }
    if let Some(bt) = ErrorCompat::backtrace(e) {
        eprintln!("trace: {}", bt);
    }
}

#[cfg(test)]
fn run_election_test(test_name: &str, config_lpath: &str, summary_lpath: &str) {
    let test_dir = option_env!("POLLTALLY_TEST_DIR")
        .unwrap_or(concat!(env!("CARGO_MANIFEST_DIR"), "/testdata"));
    info!("Running test {}", test_name);
    let options = RunOptions {
        reference: Some(format!("{}/{}/{}", test_dir, test_name, summary_lpath)),
        ..RunOptions::default()
    };
    let res = run_election(
        &format!("{}/{}/{}", test_dir, test_name, config_lpath),
        &options,
    );
    if let Err(e) = &res {
        warn!("Error occured {:?}", e);
        report_error(e);
    }
    assert!(res.is_ok(), "test {} failed", test_name);
}

#[cfg(test)]
pub fn test_wrapper(test_name: &str) {
    run_election_test(
        test_name,
        format!("{}_config.json", test_name).as_str(),
        format!("{}_expected_summary.json", test_name).as_str(),
    )
}
