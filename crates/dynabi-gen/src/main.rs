use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

/// Generate fixed foreign-call thunks from annotated Rust source.
#[derive(Parser)]
#[command(name = "dynabi-gen", version)]
struct Cli {
    /// Input source files containing //dynabi:sym annotations.
    #[arg(required = true)]
    inputs: Vec<PathBuf>,

    /// Output file for the generated module.
    #[arg(short, long, default_value = "dynabi_gen.rs")]
    output: PathBuf,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let mut source = String::new();
    for input in &cli.inputs {
        let text = std::fs::read_to_string(input)
            .with_context(|| format!("failed to read '{}'", input.display()))?;
        source.push_str(&text);
        source.push('\n');
    }

    let generated = dynabi_gen::generate(&source);
    std::fs::write(&cli.output, generated)
        .with_context(|| format!("failed to write '{}'", cli.output.display()))?;
    log::info!("wrote {}", cli.output.display());
    Ok(())
}
