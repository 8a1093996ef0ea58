// src/main.rs — review-eval entry point

use clap::Parser;

use review_eval::cli::evaluate::run_evaluate;
use review_eval::cli::score::run_score;
use review_eval::cli::serve::run_serve;
use review_eval::cli::{Cli, Commands};
use review_eval::infra::logger;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Respects RUST_LOG; --verbose raises the fallback level
    logger::init_logging(if cli.verbose { "debug" } else { "warn" });

    match run(cli).await {
        Ok(0) => {}
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("error: {e:#}");
            std::process::exit(1);
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<i32> {
    match cli.command {
        Commands::Score(args) => run_score(&args).await,
        Commands::Evaluate(args) => run_evaluate(&args).await,
        Commands::Serve { port } => run_serve(port).await,
    }
}
