// src/scoring/report.rs — Human-readable PR score summary

use std::fmt::Write;

use super::PRScore;

pub fn format_summary(score: &PRScore) -> String {
    let rule = "=".repeat(60);
    let mut out = String::new();

    let _ = writeln!(out, "\n{rule}");
    let _ = writeln!(out, "PR Quality Score: {:.1}/100", score.total_score);
    let _ = writeln!(out, "Status: {}", score.status);
    let _ = writeln!(out, "Threshold: {}", score.threshold);
    let _ = writeln!(out, "{rule}\n");

    let _ = writeln!(out, "Breakdown:");
    for (category, result) in &score.breakdown {
        let icon = if result.is_error() { "✗" } else { "✓" };
        let _ = writeln!(
            out,
            "  {icon} {:<20}: {:5.1}/100 (weight: {:.0}%)",
            category.as_str(),
            result.normalized_score,
            result.weight * 100.0
        );
        if let Some(err) = &result.error_message {
            let _ = writeln!(out, "      error: {err}");
        }
    }

    if !score.blocking_factors.is_empty() {
        let _ = writeln!(out, "\n⚠ Blocking Factors:");
        for factor in &score.blocking_factors {
            let _ = writeln!(out, "  - {factor}");
        }
    }

    out
}
