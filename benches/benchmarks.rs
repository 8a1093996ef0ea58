// benches/benchmarks.rs — Performance benchmarks (criterion)
//
// Hot paths that run once per fixture or per scoring run:
//   1. Consensus aggregation over a wide roster
//   2. Issue classification and keyword matching
//   3. Artifact parsing (JUnit, Cobertura)
//   4. Score folding

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::json;
use std::collections::BTreeMap;

use review_eval::collectors::ai_review::{classify_issue, SeverityCounts};
use review_eval::collectors::coverage::parse_cobertura;
use review_eval::collectors::test_results::parse_junit;
use review_eval::evaluator::multi_model::aggregate;
use review_eval::evaluator::{match_expected_issues, GoldenTestCase, ModelReviewResult};
use review_eval::scoring::{details, MetricCategory, ScoringConfig, ScoringEngine, ScoringResult};

// ─── Helpers ────────────────────────────────────────────────────────────────

fn golden_case(n_issues: usize) -> GoldenTestCase {
    GoldenTestCase {
        id: "bench".into(),
        file_path: "bench.py".into(),
        code: "pass".into(),
        expected_issues: (0..n_issues).map(|i| format!("issue-{i}")).collect(),
        severity: "high".into(),
        category: "python".into(),
    }
}

/// Model `m` mentions every issue whose index is not a multiple of `m + 2`.
fn roster_results(case: &GoldenTestCase, n_models: usize) -> Vec<ModelReviewResult> {
    (0..n_models)
        .map(|m| {
            let review = case
                .expected_issues
                .iter()
                .enumerate()
                .filter(|(i, _)| i % (m + 2) != 0)
                .map(|(_, issue)| issue.as_str())
                .collect::<Vec<_>>()
                .join("; ");
            let (matched, missed) = match_expected_issues(&case.expected_issues, &review);
            ModelReviewResult {
                model_name: format!("model-{m}"),
                model_id: format!("bench/model-{m}"),
                review_text: review,
                passed: missed.is_empty(),
                matched_issues: matched,
                missed_issues: missed,
                latency_ms: 100.0,
            }
        })
        .collect()
}

fn junit_xml(suites: usize) -> String {
    let mut xml = String::from("<testsuites>");
    for i in 0..suites {
        xml.push_str(&format!(
            r#"<testsuite name="s{i}" tests="40" failures="1" errors="0" skipped="2">"#
        ));
        for t in 0..40 {
            xml.push_str(&format!(r#"<testcase name="t{t}" time="0.01"/>"#));
        }
        xml.push_str("</testsuite>");
    }
    xml.push_str("</testsuites>");
    xml
}

// ─── Benchmarks ─────────────────────────────────────────────────────────────

fn bench_aggregation(c: &mut Criterion) {
    let mut group = c.benchmark_group("aggregation");

    let case = golden_case(20);
    let three = roster_results(&case, 3);
    let thirteen = roster_results(&case, 13);

    group.bench_function("aggregate_3_models", |b| {
        b.iter(|| aggregate(black_box(&case), three.clone(), 3))
    });

    group.bench_function("aggregate_13_models", |b| {
        b.iter(|| aggregate(black_box(&case), thirteen.clone(), 13))
    });

    group.finish();
}

fn bench_matching(c: &mut Criterion) {
    let mut group = c.benchmark_group("matching");

    let case = golden_case(10);
    let review = "issue-1 issue-3 ".repeat(200) + "Consider ISSUE-7 as well.";

    group.bench_function("match_expected_issues_4kb", |b| {
        b.iter(|| match_expected_issues(black_box(&case.expected_issues), black_box(&review)))
    });

    let issues: Vec<String> = (0..100)
        .map(|i| match i % 4 {
            0 => format!("SQL injection in handler {i}"),
            1 => format!("unsafe deserialization {i}"),
            2 => format!("consider caching {i}"),
            _ => format!("naming nit {i}"),
        })
        .collect();

    group.bench_function("classify_issue", |b| {
        b.iter(|| classify_issue(black_box("Possible command injection via subprocess")))
    });

    group.bench_function("tally_100_issues", |b| {
        b.iter(|| SeverityCounts::tally(black_box(&issues).iter().map(String::as_str)).score())
    });

    group.finish();
}

fn bench_artifacts(c: &mut Criterion) {
    let mut group = c.benchmark_group("artifacts");

    let small = junit_xml(1);
    let large = junit_xml(50);
    let cobertura = r#"<?xml version="1.0" ?><coverage line-rate="0.8731" branch-rate="0.71"><packages/></coverage>"#;

    group.bench_function("parse_junit_40_cases", |b| {
        b.iter(|| parse_junit(black_box(&small)))
    });

    group.bench_function("parse_junit_2000_cases", |b| {
        b.iter(|| parse_junit(black_box(&large)))
    });

    group.bench_function("parse_cobertura_root", |b| {
        b.iter(|| parse_cobertura(black_box(cobertura)))
    });

    group.finish();
}

fn bench_scoring(c: &mut Criterion) {
    let engine = ScoringEngine::new(ScoringConfig::default(), vec![]).expect("default weights");
    let breakdown: BTreeMap<MetricCategory, ScoringResult> = MetricCategory::ALL
        .iter()
        .map(|c| {
            (
                *c,
                ScoringResult::new(
                    *c,
                    0.25,
                    90.0,
                    90.0,
                    details(json!({"total": 10, "failed": 1, "security_issues": 0})),
                ),
            )
        })
        .collect();

    c.bench_function("score_breakdown", |b| {
        b.iter(|| engine.score_breakdown(black_box(breakdown.clone())))
    });
}

// ─── Main ───────────────────────────────────────────────────────────────────

criterion_group!(
    benches,
    bench_aggregation,
    bench_matching,
    bench_artifacts,
    bench_scoring,
);
criterion_main!(benches);
