//! Argument validation and the options that select which optional pipeline
//! steps are enabled.

use crate::error::{Error, Result};

pub mod constants {
    include!(concat!(env!("OUT_DIR"), "/constants.rs"));
}
pub use constants::{MAX_SPLITS, PROGRESS_INTERVAL};

/// Parse a shard count. Must be an integer in `1..=MAX_SPLITS`.
pub fn parse_split_count(arg: &str) -> Result<usize> {
    let n: i64 = arg
        .trim()
        .parse()
        .map_err(|e| Error::Argument(format!("Problem parsing num_splits '{arg}': {e}")))?;
    if n < 1 {
        return Err(Error::Argument("Need at least 1 split.".into()));
    }
    if n > MAX_SPLITS as i64 {
        return Err(Error::Argument(format!(
            "Too many splits!  Use at most {MAX_SPLITS}"
        )));
    }
    Ok(n as usize)
}

/// Parse the minimum sequence length. Zero or negative disables filtering.
pub fn parse_min_len(arg: &str) -> Result<i64> {
    arg.trim()
        .parse()
        .map_err(|e| Error::Argument(format!("Problem parsing min_len '{arg}': {e}")))
}

/// The annotation becomes the first word of every synthetic header, so it
/// can be neither empty nor contain whitespace.
pub fn parse_annotation(arg: &str) -> Result<String> {
    if arg.is_empty() {
        return Err(Error::Argument("annotation must not be empty".into()));
    }
    if arg.chars().any(char::is_whitespace) {
        return Err(Error::Argument(format!(
            "annotation '{arg}' must not contain whitespace"
        )));
    }
    Ok(arg.to_string())
}

/// A named shard set and its size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardSpec {
    pub name: String,
    pub count: usize,
}

impl ShardSpec {
    pub fn new(name: impl Into<String>, count: usize) -> Self {
        Self {
            name: name.into(),
            count,
        }
    }
}

/// Which optional steps one pipeline run performs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Keep records of at least this length. `None` keeps everything.
    pub min_len: Option<i64>,
    /// Rename kept records to `<annotation>___seq_<N>`. `None` keeps the
    /// original header.
    pub annotation: Option<String>,
    /// Shard sets in declaration order.
    pub shard_sets: Vec<ShardSpec>,
    /// Fail if the output directory already exists.
    pub require_fresh_outdir: bool,
    /// Write records in their input format (quality lines included) instead
    /// of plain FASTA.
    pub preserve_native_format: bool,
    /// Remove shard files that received no record once the run is over.
    pub prune_unused_shards: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_count_bounds() {
        assert_eq!(parse_split_count("1").unwrap(), 1);
        assert_eq!(parse_split_count(" 42 ").unwrap(), 42);
        assert_eq!(parse_split_count(&MAX_SPLITS.to_string()).unwrap(), MAX_SPLITS);

        for bad in ["0", "-3", "abc", "", "1.5"] {
            let err = parse_split_count(bad).unwrap_err();
            assert_eq!(err.exit_code(), 2, "{bad}");
        }
        let too_many = (MAX_SPLITS + 1).to_string();
        assert!(parse_split_count(&too_many)
            .unwrap_err()
            .to_string()
            .contains("Too many splits"));
    }

    #[test]
    fn min_len_accepts_negatives() {
        assert_eq!(parse_min_len("-5").unwrap(), -5);
        assert_eq!(parse_min_len("0").unwrap(), 0);
        assert_eq!(parse_min_len("150").unwrap(), 150);
        assert!(parse_min_len("ten").is_err());
    }

    #[test]
    fn annotation_rules() {
        assert_eq!(parse_annotation("sample_A").unwrap(), "sample_A");
        assert!(parse_annotation("").is_err());
        assert!(parse_annotation("two words").is_err());
    }
}
