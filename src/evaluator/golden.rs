// src/evaluator/golden.rs — Golden test suite loading
//
// A suite is a YAML list of cases. A case without inline `code` reads it from
// `file_path`, resolved against the suite file's directory.

use serde::Deserialize;
use std::path::Path;

use super::{default_severity, GoldenTestCase};
use crate::infra::errors::ReviewEvalError;

#[derive(Debug, Deserialize)]
struct SuiteEntry {
    id: String,
    file_path: String,
    #[serde(default)]
    code: Option<String>,
    expected_issues: Vec<String>,
    #[serde(default = "default_severity")]
    severity: String,
    category: String,
}

pub fn load_suite(path: &Path) -> Result<Vec<GoldenTestCase>, ReviewEvalError> {
    let content = std::fs::read_to_string(path).map_err(|e| ReviewEvalError::Artifact {
        path: path.display().to_string(),
        message: e.to_string(),
    })?;
    let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
    parse_suite(&content, base_dir)
}

/// Parse suite YAML; relative fixture paths resolve against `base_dir`.
pub fn parse_suite(content: &str, base_dir: &Path) -> Result<Vec<GoldenTestCase>, ReviewEvalError> {
    let entries: Vec<SuiteEntry> = serde_yml::from_str(content)?;

    entries
        .into_iter()
        .map(|entry| {
            let code = match entry.code {
                Some(code) => code,
                None => {
                    let fixture = base_dir.join(&entry.file_path);
                    std::fs::read_to_string(&fixture).map_err(|e| ReviewEvalError::Artifact {
                        path: fixture.display().to_string(),
                        message: format!("fixture for case '{}': {e}", entry.id),
                    })?
                }
            };
            Ok(GoldenTestCase {
                id: entry.id,
                file_path: entry.file_path,
                code,
                expected_issues: entry.expected_issues,
                severity: entry.severity,
                category: entry.category,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inline_and_file_backed_cases() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir(dir.path().join("security")).unwrap();
        std::fs::write(
            dir.path().join("security/hardcoded_secret.py"),
            "API_KEY = \"sk-live-123\"\n",
        )
        .unwrap();
        let suite = dir.path().join("suite.yaml");
        std::fs::write(
            &suite,
            r#"
- id: sec-secret-001
  file_path: security/hardcoded_secret.py
  expected_issues: [hardcoded, environment variable]
  category: security
- id: py-yaml-001
  file_path: python/yaml_unsafe_load.py
  code: "yaml.load(f)"
  expected_issues: [safe_load]
  severity: medium
  category: python
"#,
        )
        .unwrap();

        let cases = load_suite(&suite).unwrap();
        assert_eq!(cases.len(), 2);
        assert_eq!(cases[0].code, "API_KEY = \"sk-live-123\"\n");
        assert_eq!(cases[0].severity, "high");
        assert_eq!(cases[1].code, "yaml.load(f)");
        assert_eq!(cases[1].severity, "medium");
    }

    #[test]
    fn test_missing_fixture_is_artifact_error() {
        let dir = tempfile::tempdir().unwrap();
        let result = parse_suite(
            "- id: x\n  file_path: nope.py\n  expected_issues: [a]\n  category: python\n",
            dir.path(),
        );
        assert!(matches!(result, Err(ReviewEvalError::Artifact { .. })));
    }

    #[test]
    fn test_malformed_suite() {
        let result = parse_suite("id: not-a-list", Path::new("."));
        assert!(matches!(result, Err(ReviewEvalError::Yaml(_))));
    }
}
