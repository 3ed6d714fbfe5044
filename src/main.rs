use clap::Parser;
use miette::Diagnostic;

use intein_prep::cli::Cli;
use intein_prep::pipeline::{run_variant, Variant};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Cli::parse();
    let variant = Variant::from(args.command);

    if let Err(err) = run_variant(&variant) {
        let code = err
            .code()
            .map(|c| c.to_string())
            .unwrap_or_else(|| String::from("intein_prep"));
        eprintln!("FATAL -- {code} -- {err}");
        std::process::exit(err.exit_code());
    }
}
