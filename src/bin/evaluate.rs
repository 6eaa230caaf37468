//! Batch evaluation binary: answers every question of a JSONL file.

use std::path::PathBuf;

use clap::Parser;
use khoji::{KhojiConfig, Services};

/// Run the answer pipeline over a JSONL question set.
#[derive(Parser)]
#[command(name = "khoji-eval", version, about)]
struct Args {
    /// JSONL file of `{question, ground_truth, contexts, question_type}` records.
    #[arg(short, long, value_name = "FILE")]
    input: PathBuf,

    /// Where to write the JSONL results.
    #[arg(short, long, value_name = "FILE", default_value = "evaluation_results.jsonl")]
    output: PathBuf,

    /// Path to TOML configuration file.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    khoji::init_tracing();

    let args = Args::parse();
    let config = KhojiConfig::load(args.config.as_deref())?;
    let services = Services::from_config(&config)?;

    let count = khoji::evaluation::run(&args.input, &args.output, &services.pipeline)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "evaluation failed");
            anyhow::anyhow!("khoji-eval failed: {e}")
        })?;

    println!("Evaluated {count} questions, results saved to {}", args.output.display());
    Ok(())
}
