// src/collectors/static_analysis.rs — Lint + type-check error counts
//
// Two independent sources, each read from a pre-generated JSON artifact or
// produced by running the tool in the repository root:
//   lint:       JSON array, one entry per finding (ruff --output-format=json)
//   type check: {"summary": {"errorCount": N}}    (pyright --outputjson)
// A tool that cannot be run or whose output cannot be parsed counts as 0.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::process::Command;

use super::MetricCollector;
use crate::scoring::{details, MetricCategory, ScoringResult};

const DEFAULT_WEIGHT: f64 = 0.20;
const TOOL_TIMEOUT: Duration = Duration::from_secs(300);

/// A subprocess invocation: program plus arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl ToolCommand {
    pub fn new(program: &str, args: &[&str]) -> Self {
        Self {
            program: program.to_string(),
            args: args.iter().map(|a| a.to_string()).collect(),
        }
    }

    pub fn default_lint() -> Self {
        Self::new("uv", &["run", "ruff", "check", ".", "--output-format=json"])
    }

    pub fn default_typecheck() -> Self {
        Self::new("uv", &["run", "pyright", "--outputjson"])
    }
}

/// Number of lint findings in a lint JSON document. Non-arrays count as 0.
pub fn count_lint_errors(data: &Value) -> u64 {
    data.as_array().map(|a| a.len() as u64).unwrap_or(0)
}

/// `summary.errorCount` of a type-checker JSON document, 0 when absent.
pub fn count_typecheck_errors(data: &Value) -> u64 {
    data.get("summary")
        .and_then(|s| s.get("errorCount"))
        .and_then(Value::as_u64)
        .unwrap_or(0)
}

/// Map a total error count to 0–100.
///
/// 0 → 100, 1–5 → 80, then exponential decay that stays above 0.
pub fn normalize_errors(errors: u64) -> f64 {
    match errors {
        0 => 100.0,
        1..=5 => 80.0,
        n => (80.0 * (-0.05 * (n - 5) as f64).exp()).clamp(0.0, 100.0),
    }
}

#[derive(Debug, Clone, Copy)]
enum Source {
    Lint,
    TypeCheck,
}

impl Source {
    fn name(self) -> &'static str {
        match self {
            Source::Lint => "lint",
            Source::TypeCheck => "type check",
        }
    }

    fn count(self, data: &Value) -> u64 {
        match self {
            Source::Lint => count_lint_errors(data),
            Source::TypeCheck => count_typecheck_errors(data),
        }
    }
}

pub struct StaticAnalysisCollector {
    repo_root: PathBuf,
    lint_results: Option<PathBuf>,
    typecheck_results: Option<PathBuf>,
    lint_command: ToolCommand,
    typecheck_command: ToolCommand,
    weight: f64,
}

impl StaticAnalysisCollector {
    pub fn new(repo_root: impl Into<PathBuf>) -> Self {
        Self {
            repo_root: repo_root.into(),
            lint_results: None,
            typecheck_results: None,
            lint_command: ToolCommand::default_lint(),
            typecheck_command: ToolCommand::default_typecheck(),
            weight: DEFAULT_WEIGHT,
        }
    }

    pub fn with_lint_results(mut self, path: Option<PathBuf>) -> Self {
        self.lint_results = path;
        self
    }

    pub fn with_typecheck_results(mut self, path: Option<PathBuf>) -> Self {
        self.typecheck_results = path;
        self
    }

    pub fn with_lint_command(mut self, command: ToolCommand) -> Self {
        self.lint_command = command;
        self
    }

    pub fn with_typecheck_command(mut self, command: ToolCommand) -> Self {
        self.typecheck_command = command;
        self
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = weight;
        self
    }

    async fn collect_source(
        &self,
        source: Source,
        artifact: Option<&Path>,
        command: &ToolCommand,
    ) -> u64 {
        if let Some(path) = artifact.filter(|p| p.exists()) {
            return match read_json(path).await {
                Ok(data) => source.count(&data),
                Err(e) => {
                    tracing::warn!("Unreadable {} results {}: {}", source.name(), path.display(), e);
                    0
                }
            };
        }

        match run_tool(command, &self.repo_root).await {
            Ok(output) => output.map(|data| source.count(&data)).unwrap_or(0),
            Err(e) => {
                tracing::debug!("{} tool `{}` unavailable: {}", source.name(), command.program, e);
                0
            }
        }
    }
}

async fn read_json(path: &Path) -> anyhow::Result<Value> {
    let content = tokio::fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&content)?)
}

/// Run a tool and parse its stdout as JSON. `Ok(None)` means a clean exit
/// with nothing to count.
async fn run_tool(command: &ToolCommand, cwd: &Path) -> anyhow::Result<Option<Value>> {
    tracing::debug!("Running: {} {:?} in {:?}", command.program, command.args, cwd);

    let output = tokio::time::timeout(
        TOOL_TIMEOUT,
        Command::new(&command.program)
            .args(&command.args)
            .current_dir(cwd)
            .kill_on_drop(true)
            .output(),
    )
    .await
    .map_err(|_| anyhow::anyhow!("timed out after {}s", TOOL_TIMEOUT.as_secs()))??;

    let stdout = String::from_utf8_lossy(&output.stdout);
    if stdout.trim().is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(&stdout)?))
}

#[async_trait]
impl MetricCollector for StaticAnalysisCollector {
    fn category(&self) -> MetricCategory {
        MetricCategory::StaticAnalysis
    }

    fn weight(&self) -> f64 {
        self.weight
    }

    async fn collect(&self) -> ScoringResult {
        let (lint_errors, typecheck_errors) = futures::join!(
            self.collect_source(
                Source::Lint,
                self.lint_results.as_deref(),
                &self.lint_command
            ),
            self.collect_source(
                Source::TypeCheck,
                self.typecheck_results.as_deref(),
                &self.typecheck_command
            ),
        );

        let total_errors = lint_errors + typecheck_errors;

        ScoringResult::new(
            MetricCategory::StaticAnalysis,
            self.weight,
            total_errors as f64,
            normalize_errors(total_errors),
            details(json!({
                "lint_errors": lint_errors,
                "typecheck_errors": typecheck_errors,
                "total_errors": total_errors,
            })),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn json_file(content: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f
    }

    fn unavailable() -> ToolCommand {
        ToolCommand::new("review-eval-no-such-tool", &[])
    }

    #[test]
    fn test_normalize_errors_policy() {
        assert_eq!(normalize_errors(0), 100.0);
        assert_eq!(normalize_errors(1), 80.0);
        assert_eq!(normalize_errors(5), 80.0);
        assert!(normalize_errors(6) < 80.0);

        let mut previous = normalize_errors(5);
        for n in 6..500 {
            let score = normalize_errors(n);
            assert!(score < previous);
            assert!(score > 0.0);
            previous = score;
        }
    }

    #[test]
    fn test_counting_helpers() {
        assert_eq!(count_lint_errors(&json!([{}, {}, {}])), 3);
        assert_eq!(count_lint_errors(&json!({"not": "a list"})), 0);
        assert_eq!(count_typecheck_errors(&json!({"summary": {"errorCount": 4}})), 4);
        assert_eq!(count_typecheck_errors(&json!({})), 0);
    }

    #[tokio::test]
    async fn test_collect_from_artifacts() {
        let lint = json_file(r#"[{"code": "F401"}, {"code": "E501"}]"#);
        let types = json_file(r#"{"summary": {"errorCount": 5, "warningCount": 2}}"#);
        let result = StaticAnalysisCollector::new(".")
            .with_lint_results(Some(lint.path().to_path_buf()))
            .with_typecheck_results(Some(types.path().to_path_buf()))
            .collect()
            .await;

        assert!(result.error_message.is_none());
        assert_eq!(result.raw_value, 7.0);
        assert_eq!(result.detail_f64("lint_errors"), Some(2.0));
        assert_eq!(result.detail_f64("typecheck_errors"), Some(5.0));
        assert!((result.normalized_score - 80.0 * (-0.1f64).exp()).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_unavailable_tools_degrade_to_zero() {
        let dir = tempfile::tempdir().unwrap();
        let result = StaticAnalysisCollector::new(dir.path())
            .with_lint_command(unavailable())
            .with_typecheck_command(unavailable())
            .collect()
            .await;
        assert_eq!(result.normalized_score, 100.0);
        assert_eq!(result.detail_f64("total_errors"), Some(0.0));
        assert!(result.error_message.is_none());
    }

    #[tokio::test]
    async fn test_unparseable_artifact_counts_zero() {
        let lint = json_file("not json");
        let types = json_file(r#"{"summary": {"errorCount": 1}}"#);
        let result = StaticAnalysisCollector::new(".")
            .with_lint_results(Some(lint.path().to_path_buf()))
            .with_typecheck_results(Some(types.path().to_path_buf()))
            .collect()
            .await;
        assert_eq!(result.detail_f64("lint_errors"), Some(0.0));
        assert_eq!(result.normalized_score, 80.0);
    }

    #[tokio::test]
    async fn test_missing_artifact_falls_back_to_tool() {
        let dir = tempfile::tempdir().unwrap();
        let result = StaticAnalysisCollector::new(dir.path())
            .with_lint_results(Some(dir.path().join("missing.json")))
            .with_lint_command(unavailable())
            .with_typecheck_command(unavailable())
            .collect()
            .await;
        assert_eq!(result.raw_value, 0.0);
    }
}
