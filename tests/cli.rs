use std::fs;
use std::path::Path;
use std::process::{Command, Output};

use tempfile::TempDir;

fn intein_prep(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_intein-prep"))
        .args(args)
        .env("RUST_LOG", "error")
        .output()
        .unwrap()
}

fn path_arg(path: &Path) -> &str {
    path.to_str().unwrap()
}

fn stderr(out: &Output) -> String {
    String::from_utf8_lossy(&out.stderr).into_owned()
}

#[test]
fn existing_outdir_exits_with_file_system_code() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("in.fa");
    fs::write(&input, ">r1\nMKV\n").unwrap();
    let outdir = tmp.path().join("out");
    fs::create_dir(&outdir).unwrap();

    let out = intein_prep(&[
        "process-input-seqs",
        path_arg(&input),
        path_arg(&outdir),
        "X",
        "2",
        "0",
    ]);

    assert_eq!(out.status.code(), Some(3));
    let err = stderr(&out);
    assert!(
        err.contains("FATAL -- intein_prep::file_system -- "),
        "{err}"
    );
}

#[test]
fn malformed_fastq_exits_with_record_format_code() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("bad.fq");
    fs::write(&input, "@r1\nACGT\n+\nIIII\n@r2\nACGT\nIIII\n").unwrap();

    let out = intein_prep(&["split-seqs", "2", path_arg(&input)]);

    assert_eq!(out.status.code(), Some(5));
    assert!(
        stderr(&out).contains("FATAL -- intein_prep::record_format -- "),
        "{}",
        stderr(&out)
    );
}

#[test]
fn zero_splits_is_a_usage_error() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("x");

    let out = intein_prep(&["split-seqs", "0", path_arg(&input)]);

    assert_eq!(out.status.code(), Some(2));
    assert!(stderr(&out).contains("Need at least 1 split."), "{}", stderr(&out));
    assert!(!tmp.path().join("x.split_0").exists());
}

#[test]
fn successful_run_exits_zero() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("in.fa");
    fs::write(&input, ">a\nACGT\n>b\nGG\n").unwrap();

    let out = intein_prep(&["simple-headers", "S", path_arg(&input)]);

    assert!(out.status.success(), "{}", stderr(&out));
    assert_eq!(
        fs::read_to_string(tmp.path().join("in.simple_headers.fa")).unwrap(),
        ">S___seq_1\nACGT\n>S___seq_2\nGG\n"
    );
}
