fn build_constants() -> miette::Result<()> {
    let out_dir: std::path::PathBuf = std::env::var("OUT_DIR")
        .map_err(|e| miette::miette!("OUT_DIR not set: {e}"))?
        .into();
    let mut code = Vec::new();
    println!("cargo:rerun-if-env-changed=MAX_SPLITS");
    let max_splits: usize = std::env::var("MAX_SPLITS")
        .unwrap_or_else(|_| "10000".into())
        .parse()
        .map_err(|e| miette::miette!("Failed to parse MAX_SPLITS: {e}"))?;
    if !(1..=100_000).contains(&max_splits) {
        miette::bail!("MAX_SPLITS must be in 1..=100000, got {max_splits}");
    }
    code.push("/// Upper bound on the number of shard files in one shard set.".to_string());
    code.push(format!("pub const MAX_SPLITS: usize = {max_splits};"));
    code.push("/// Records between two progress lines.".to_string());
    code.push("pub const PROGRESS_INTERVAL: u64 = 10_000;".to_string());

    std::fs::write(out_dir.join("constants.rs"), code.join("\n"))
        .map_err(|e| miette::miette!("Failed to write const file: {e}"))?;
    Ok(())
}

fn main() -> miette::Result<()> {
    println!("cargo:rerun-if-changed=build.rs");
    build_constants()
}
