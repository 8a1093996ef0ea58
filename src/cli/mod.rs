// src/cli/mod.rs — CLI definition (clap derive)

pub mod evaluate;
pub mod score;
pub mod serve;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "review-eval",
    about = "Multi-model code review evaluation and PR quality scoring",
    version
)]
pub struct Cli {
    /// Debug-level logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Calculate a PR quality score from collected artifacts
    Score(ScoreArgs),
    /// Run a golden test suite through the multi-model evaluator
    Evaluate(EvaluateArgs),
    /// Serve the health-check endpoint
    Serve {
        #[arg(short, long, default_value = "8080")]
        port: u16,
    },
}

#[derive(Args, Debug, Clone, Default)]
pub struct ScoreArgs {
    /// reviewer.yaml configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// JUnit XML file (e.g. junit.xml from pytest)
    #[arg(long)]
    pub junit: Option<PathBuf>,

    /// Cobertura XML file (e.g. coverage.xml)
    #[arg(long)]
    pub coverage: Option<PathBuf>,

    /// Baseline coverage percentage for the delta
    #[arg(long)]
    pub baseline_coverage: Option<f64>,

    /// Comma-separated lint,type-check JSON results; missing files run the tools
    #[arg(long, value_delimiter = ',')]
    pub static_analysis: Option<Vec<PathBuf>>,

    /// Directory the lint and type-check tools run in
    #[arg(long)]
    pub repo_root: Option<PathBuf>,

    /// JSON file with AI review results (MultiModelResult[])
    #[arg(long)]
    pub ai_review: Option<PathBuf>,

    /// Minimum passing score; overrides the config file
    #[arg(long)]
    pub threshold: Option<f64>,

    /// Write the PRScore JSON here
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Exit with code 1 when the status is FAIL
    #[arg(long)]
    pub fail_on_error: bool,
}

#[derive(Args, Debug, Clone)]
pub struct EvaluateArgs {
    /// Golden test suite YAML
    #[arg(long)]
    pub suite: PathBuf,

    /// File holding the reviewer system prompt
    #[arg(long)]
    pub prompt: PathBuf,

    /// Use the extended benchmark roster
    #[arg(long)]
    pub benchmark: bool,

    /// reviewer.yaml configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Write MultiModelResult[] JSON here
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_score() {
        let cli = Cli::try_parse_from([
            "review-eval",
            "score",
            "--junit",
            "junit.xml",
            "--static-analysis",
            "ruff.json,pyright.json",
            "--threshold",
            "75",
            "--fail-on-error",
        ])
        .unwrap();
        let Commands::Score(args) = cli.command else {
            panic!("expected score");
        };
        assert_eq!(args.junit, Some(PathBuf::from("junit.xml")));
        assert_eq!(
            args.static_analysis,
            Some(vec![PathBuf::from("ruff.json"), PathBuf::from("pyright.json")])
        );
        assert_eq!(args.threshold, Some(75.0));
        assert!(args.fail_on_error);
    }

    #[test]
    fn test_parse_evaluate_with_global_verbose() {
        let cli = Cli::try_parse_from([
            "review-eval",
            "evaluate",
            "--suite",
            "suite.yaml",
            "--prompt",
            "prompt.md",
            "--benchmark",
            "-v",
        ])
        .unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Commands::Evaluate(ref a) if a.benchmark));
    }

    #[test]
    fn test_serve_default_port() {
        let cli = Cli::try_parse_from(["review-eval", "serve"]).unwrap();
        assert!(matches!(cli.command, Commands::Serve { port: 8080 }));
    }
}
