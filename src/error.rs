//! Error taxonomy. Every error is fatal; the binary maps each class to its
//! own exit status so a wrapping pipeline can tell failures apart.

use std::io;
use std::path::{Path, PathBuf};

use miette::Diagnostic;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    /// Bad argument value (unparseable or out of range).
    #[error("{0}")]
    #[diagnostic(code(intein_prep::argument))]
    Argument(String),

    #[error("'{}' already exists.  Pick a new directory.", .0.display())]
    #[diagnostic(code(intein_prep::file_system))]
    OutdirExists(PathBuf),

    #[error("'{}' does not exist or isn't a regular file", .0.display())]
    #[diagnostic(code(intein_prep::file_system))]
    NotAFile(PathBuf),

    #[error("{context}: {source}")]
    #[diagnostic(code(intein_prep::file_system))]
    FileSystem {
        context: String,
        #[source]
        source: io::Error,
    },

    #[error("could not parse records from '{}': {message}", .path.display())]
    #[diagnostic(code(intein_prep::record_format))]
    RecordFormat { path: PathBuf, message: String },

    #[error("memory error while allocating {0}")]
    #[diagnostic(code(intein_prep::allocation))]
    Allocation(String),
}

impl Error {
    pub fn io(context: impl Into<String>, source: io::Error) -> Self {
        Error::FileSystem {
            context: context.into(),
            source,
        }
    }

    pub fn record_format(path: &Path, message: impl ToString) -> Self {
        Error::RecordFormat {
            path: path.to_path_buf(),
            message: message.to_string(),
        }
    }

    /// Process exit status for this error class.
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::Argument(_) => 2,
            Error::OutdirExists(_) | Error::NotAFile(_) | Error::FileSystem { .. } => 3,
            Error::RecordFormat { .. } => 5,
            Error::Allocation(_) => 6,
        }
    }
}

/// Attach a path-aware message to an `io::Result`, in the spirit of
/// `anyhow::Context`.
pub trait IoContext<T> {
    fn with_path(self, op: &str, path: &Path) -> Result<T>;
}

impl<T> IoContext<T> for io::Result<T> {
    fn with_path(self, op: &str, path: &Path) -> Result<T> {
        self.map_err(|source| Error::io(format!("{op} '{}'", path.display()), source))
    }
}

impl From<csv::Error> for Error {
    fn from(err: csv::Error) -> Self {
        match err.into_kind() {
            csv::ErrorKind::Io(source) => Error::io("name map write failed", source),
            other => Error::io(
                "name map write failed",
                io::Error::new(io::ErrorKind::Other, format!("{other:?}")),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_are_distinct_per_class() {
        let arg = Error::Argument("bad".into());
        let fs = Error::io("open 'x'", io::Error::from(io::ErrorKind::NotFound));
        let exists = Error::OutdirExists(PathBuf::from("out"));
        let fmt = Error::record_format(Path::new("in.fa"), "truncated");
        let mem = Error::Allocation("split handles".into());

        assert_eq!(arg.exit_code(), 2);
        assert_eq!(fs.exit_code(), 3);
        assert_eq!(exists.exit_code(), 3);
        assert_eq!(fmt.exit_code(), 5);
        assert_eq!(mem.exit_code(), 6);
    }

    #[test]
    fn io_context_names_operation_and_path() {
        let res: io::Result<()> = Err(io::Error::from(io::ErrorKind::PermissionDenied));
        let err = res.with_path("could not open for writing", Path::new("a/b.fa")).unwrap_err();
        let msg = err.to_string();
        assert!(msg.starts_with("could not open for writing 'a/b.fa'"), "{msg}");
    }

    #[test]
    fn diagnostic_code_matches_class() {
        let err = Error::record_format(Path::new("in.fa"), "bad");
        let code = err.code().map(|c| c.to_string());
        assert_eq!(code.as_deref(), Some("intein_prep::record_format"));
    }
}
