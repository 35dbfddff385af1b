// src/ci/output.rs

//! `GITHUB_OUTPUT` and `GITHUB_STEP_SUMMARY` writers

use crate::error::{Error, Result};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

/// Heredoc delimiter for multi-line output values
const DELIMITER: &str = "-EOF";

/// Append a step output `name` to the outputs file at `path`
///
/// Uses the heredoc form, so `value` may span lines (pretty-printed JSON).
pub fn set_output(path: &Path, name: &str, value: &str) -> Result<()> {
    if value.lines().any(|l| l == DELIMITER) {
        return Err(Error::Ci(format!(
            "Output '{name}' contains the delimiter line '{DELIMITER}'"
        )));
    }
    append(path, &format!("{name}<<{DELIMITER}\n{value}\n{DELIMITER}\n"))
}

/// Append Markdown to the job summary file at `path`
pub fn append_step_summary(path: &Path, markdown: &str) -> Result<()> {
    append(path, markdown)
}

fn append(path: &Path, content: &str) -> Result<()> {
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| Error::io(path, e))?;
    file.write_all(content.as_bytes())
        .map_err(|e| Error::io(path, e))
}
