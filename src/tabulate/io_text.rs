// Records stored one per line.

use crate::tabulate::io_common::simplify_file_name;
use crate::tabulate::*;

pub fn read_text_records(path: &str) -> TabulateResult<Vec<String>> {
    let contents = fs::read_to_string(path).context(OpeningFileSnafu { path })?;
    Ok(parse_text_records(&contents, &simplify_file_name(path)))
}

fn parse_text_records(contents: &str, name: &str) -> Vec<String> {
    let records: Vec<String> = contents
        .lines()
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.is_empty())
        .map(|line| line.to_string())
        .collect();
    debug!("parse_text_records: {}: {} records", name, records.len());
    records
}
