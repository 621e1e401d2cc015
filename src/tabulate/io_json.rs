// Records stored as a JSON array of strings. Comments may then contain line breaks.

use crate::tabulate::io_common::simplify_file_name;
use crate::tabulate::*;

pub fn read_json_records(path: &str) -> TabulateResult<Vec<String>> {
    let contents = fs::read_to_string(path).context(OpeningFileSnafu { path })?;
    let records: Vec<String> =
        serde_json::from_str(&contents).context(ParsingJsonSnafu { path })?;
    debug!(
        "read_json_records: {}: {} records",
        simplify_file_name(path),
        records.len()
    );
    Ok(records)
}
