use std::fmt::Write;

use chrono::{DateTime, Utc};

use crate::models::PredictionResult;
use crate::presenter::{self, RiskCategory};

#[derive(Debug, Clone)]
pub struct RowOutcome {
    /// 1-based data row number.
    pub row: usize,
    pub student_id: Option<String>,
    pub result: Result<PredictionResult, String>,
}

impl RowOutcome {
    fn label(&self) -> String {
        match &self.student_id {
            Some(id) => format!("{id} (row {})", self.row),
            None => format!("row {}", self.row),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub high_risk: usize,
    pub low_risk: usize,
    pub failed: usize,
}

pub fn summarize(outcomes: &[RowOutcome]) -> BatchSummary {
    let mut summary = BatchSummary::default();
    for outcome in outcomes {
        match &outcome.result {
            Ok(prediction) => match presenter::panel(prediction).category {
                RiskCategory::High => summary.high_risk += 1,
                RiskCategory::Low => summary.low_risk += 1,
            },
            Err(_) => summary.failed += 1,
        }
    }
    summary
}

pub fn build_report(source: &str, generated_at: DateTime<Utc>, outcomes: &[RowOutcome]) -> String {
    let summary = summarize(outcomes);
    let mut output = String::new();

    let _ = writeln!(output, "# Student Dropout Risk Report");
    let _ = writeln!(
        output,
        "Generated from {} at {}",
        source,
        generated_at.format("%Y-%m-%d %H:%M UTC")
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Summary");
    let _ = writeln!(output, "- Submissions: {}", outcomes.len());
    let _ = writeln!(output, "- At risk of dropout: {}", summary.high_risk);
    let _ = writeln!(output, "- Not at risk: {}", summary.low_risk);
    let _ = writeln!(output, "- Failed: {}", summary.failed);

    let mut scored: Vec<(&RowOutcome, &PredictionResult)> = outcomes
        .iter()
        .filter_map(|outcome| outcome.result.as_ref().ok().map(|p| (outcome, p)))
        .collect();
    scored.sort_by(|a, b| {
        b.1.probability
            .partial_cmp(&a.1.probability)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let _ = writeln!(output);
    let _ = writeln!(output, "## Highest Dropout Risk");

    if scored.is_empty() {
        let _ = writeln!(output, "No submissions were scored.");
    } else {
        for (outcome, prediction) in scored.iter().take(10) {
            let panel = presenter::panel(prediction);
            let _ = writeln!(
                output,
                "- {}: {} (dropout risk {:.2}%)",
                outcome.label(),
                panel.headline,
                prediction.probability * 100.0
            );
        }
    }

    let failures: Vec<(&RowOutcome, &String)> = outcomes
        .iter()
        .filter_map(|outcome| outcome.result.as_ref().err().map(|e| (outcome, e)))
        .collect();

    if !failures.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "## Failed Submissions");
        for (outcome, error) in failures {
            let _ = writeln!(output, "- {}: {}", outcome.label(), error);
        }
    }

    output
}
