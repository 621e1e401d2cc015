use clap::Parser;

/// This is a tabulation program for poll records.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path) The file containing the election and the record sources, in JSON.
    /// For more information about the file format, read the documentation of the `poll_tally` crate.
    #[clap(short, long, value_parser)]
    pub config: String,

    /// (file path) A reference file containing the summary of an election in JSON format. If provided, polltally will
    /// check that the tabulated summary matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the summary of the election will be written in JSON format to the given
    /// location. Setting this option overrides the output file that may be specified in the configuration.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path or empty) If specified, the records are read from this file instead of the record
    /// sources of the configuration.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (default text) The type of the input: 'text' (one record per line) or 'json' (array of strings).
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// If passed as an argument, prints a plain-text report of the results.
    #[clap(long, takes_value = false)]
    pub text: bool,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
