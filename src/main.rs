mod args;
mod tabulate;

use clap::Parser;
use log::{debug, LevelFilter};

use crate::args::Args;
use crate::tabulate::RunOptions;

fn main() {
    let args = Args::parse();
    let mut builder = env_logger::Builder::from_default_env();
    if args.verbose {
        builder.filter_level(LevelFilter::Debug);
    }
    builder.init();
    debug!("args: {:?}", args);

    let options = RunOptions {
        input: args.input.clone(),
        input_type: args.input_type.clone(),
        out: args.out.clone(),
        reference: args.reference.clone(),
        text: args.text,
    };
    if let Err(e) = tabulate::run_election(&args.config, &options) {
        tabulate::report_error(&e);
        std::process::exit(1);
    }
}
