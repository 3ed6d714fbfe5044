use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// The last path component, extension included.
pub fn extract_filename(path: &Path) -> Result<OsString> {
    path.file_name()
        .map(OsString::from)
        .ok_or_else(|| Error::Argument(format!("'{}' has no file name", path.display())))
}

/// Split a file name into its stem and its last extension (with the dot).
/// `seqs.fa.gz` gives `("seqs.fa", ".gz")`, `seqs` gives `("seqs", "")`.
pub fn split_extension(path: &Path) -> Result<(OsString, OsString)> {
    let stem = path
        .file_stem()
        .map(OsString::from)
        .ok_or_else(|| Error::Argument(format!("'{}' has no file name", path.display())))?;
    let mut ext = OsString::new();
    if let Some(e) = path.extension() {
        ext.push(".");
        ext.push(e);
    }
    Ok((stem, ext))
}

/// Directory part of `path`, `.` when there is none.
pub fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// `path` with `suffix` appended to its last component.
pub fn append_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut s = path.as_os_str().to_os_string();
    s.push(suffix);
    PathBuf::from(s)
}

/// `<stem>.split_<idx>`
pub fn shard_path(stem: &Path, idx: usize) -> PathBuf {
    append_suffix(stem, &format!(".split_{idx}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filename_keeps_extension() {
        assert_eq!(extract_filename(Path::new("a/b/seqs.fa.gz")).unwrap(), "seqs.fa.gz");
        assert!(extract_filename(Path::new("/")).is_err());
    }

    #[test]
    fn extension_split() {
        let (stem, ext) = split_extension(Path::new("dir/seqs.fa.gz")).unwrap();
        assert_eq!(stem, "seqs.fa");
        assert_eq!(ext, ".gz");
        let (stem, ext) = split_extension(Path::new("seqs")).unwrap();
        assert_eq!(stem, "seqs");
        assert_eq!(ext, "");
    }

    #[test]
    fn parent_defaults_to_current_dir() {
        assert_eq!(parent_dir(Path::new("seqs.fa")), PathBuf::from("."));
        assert_eq!(parent_dir(Path::new("x/seqs.fa")), PathBuf::from("x"));
    }

    #[test]
    fn shard_names() {
        assert_eq!(
            shard_path(Path::new("out/splits/in.fa.intein_finder"), 3),
            PathBuf::from("out/splits/in.fa.intein_finder.split_3")
        );
        assert_eq!(shard_path(Path::new("in.fq"), 0), PathBuf::from("in.fq.split_0"));
    }
}
