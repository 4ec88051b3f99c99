use std::fmt::Write;

use serde::Serialize;
use tracing::{info, info_span, warn};
use uuid::Uuid;

use crate::artifacts::ArtifactCache;
use crate::collector::{self, RawSubmission};
use crate::error::PipelineError;
use crate::inference;
use crate::models::PredictionResult;

pub const GAUGE_THRESHOLD: f64 = 70.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskCategory {
    High,
    Low,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GaugeBand {
    pub from: f64,
    pub to: f64,
    pub color: &'static str,
}

pub const GAUGE_BANDS: [GaugeBand; 3] = [
    GaugeBand {
        from: 0.0,
        to: 30.0,
        color: "green",
    },
    GaugeBand {
        from: 30.0,
        to: 70.0,
        color: "yellow",
    },
    GaugeBand {
        from: 70.0,
        to: 100.0,
        color: "red",
    },
];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RiskPanel {
    pub category: RiskCategory,
    pub headline: &'static str,
    pub probability_caption: &'static str,
    /// Probability shown in the panel: dropout for high risk, staying enrolled for low risk.
    pub displayed_probability: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Gauge {
    pub value: f64,
    pub bar_color: &'static str,
    pub threshold: f64,
    pub bands: [GaugeBand; 3],
}

impl Gauge {
    pub fn band(&self) -> &GaugeBand {
        self.bands
            .iter()
            .find(|band| self.value < band.to)
            .unwrap_or(&self.bands[self.bands.len() - 1])
    }

    pub fn render_ascii(&self, width: usize) -> String {
        let width = width.max(10);
        let filled = ((self.value / 100.0) * width as f64).round() as usize;
        let marker = ((self.threshold / 100.0) * width as f64).round() as usize;

        let mut bar = String::with_capacity(width + 2);
        for cell in 0..width {
            if cell == marker {
                bar.push('|');
            } else if cell < filled {
                bar.push('#');
            } else {
                bar.push('.');
            }
        }
        format!(
            "[{bar}] {:.1}% ({} band, threshold {:.0})",
            self.value,
            self.band().color,
            self.threshold
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Presentation {
    pub submission_id: Uuid,
    pub prediction: PredictionResult,
    pub panel: RiskPanel,
    pub gauge: Gauge,
}

impl Presentation {
    pub fn new(submission_id: Uuid, prediction: PredictionResult) -> Self {
        Self {
            submission_id,
            prediction,
            panel: panel(&prediction),
            gauge: gauge(&prediction),
        }
    }

    pub fn render_text(&self) -> String {
        let mut output = String::new();
        let _ = writeln!(output, "Status: {}", self.panel.headline);
        let _ = writeln!(
            output,
            "{}: {:.2}%",
            self.panel.probability_caption,
            self.panel.displayed_probability * 100.0
        );
        let _ = writeln!(output, "Dropout risk: {}", self.gauge.render_ascii(40));
        output
    }
}

pub fn panel(prediction: &PredictionResult) -> RiskPanel {
    if prediction.is_at_risk() {
        RiskPanel {
            category: RiskCategory::High,
            headline: "AT RISK OF DROPOUT",
            probability_caption: "Dropout probability",
            displayed_probability: prediction.probability,
        }
    } else {
        RiskPanel {
            category: RiskCategory::Low,
            headline: "NOT AT RISK",
            probability_caption: "Probability of staying enrolled",
            displayed_probability: 1.0 - prediction.probability,
        }
    }
}

pub fn gauge(prediction: &PredictionResult) -> Gauge {
    Gauge {
        value: prediction.probability * 100.0,
        bar_color: if prediction.is_at_risk() {
            "darkred"
        } else {
            "green"
        },
        threshold: GAUGE_THRESHOLD,
        bands: GAUGE_BANDS,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ViewState {
    AwaitingSubmission,
    ResultDisplayed(Presentation),
    ErrorDisplayed { message: String, detail: String },
}

pub struct Session<'a> {
    cache: &'a ArtifactCache,
    state: ViewState,
}

impl<'a> Session<'a> {
    pub fn new(cache: &'a ArtifactCache) -> Self {
        Self {
            cache,
            state: ViewState::AwaitingSubmission,
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> &ViewState {
        &self.state
    }

    /// Runs one submission.
    ///
    /// Returns [`PipelineError::ArtifactUnavailable`] and leaves the view
    /// untouched when prediction is disabled; every other failure is shown
    /// in place of the result.
    pub fn submit(&mut self, raw: &RawSubmission) -> Result<&ViewState, PipelineError> {
        let submission_id = Uuid::new_v4();
        let span = info_span!("submission", id = %submission_id);
        let _guard = span.enter();

        if let Err(e) = self.cache.artifacts() {
            warn!("Submission ignored, prediction is disabled");
            return Err(e);
        }

        self.state = match collector::collect(raw) {
            Err(e) => ViewState::ErrorDisplayed {
                message: "The submission is not valid".to_string(),
                detail: e.to_string(),
            },
            Ok(record) => match inference::predict_record(self.cache, &record) {
                Ok(prediction) => {
                    info!(
                        label = prediction.label,
                        probability = prediction.probability,
                        "Prediction displayed"
                    );
                    ViewState::ResultDisplayed(Presentation::new(submission_id, prediction))
                }
                Err(e) => {
                    warn!(error = %e, "Prediction failed");
                    ViewState::ErrorDisplayed {
                        message: "An error occurred during processing".to_string(),
                        detail: e.to_string(),
                    }
                }
            },
        };
        Ok(&self.state)
    }

    /// Like [`Session::submit`], for a JSON document that has not been parsed yet.
    pub fn submit_json(&mut self, text: &str) -> Result<&ViewState, PipelineError> {
        if let Err(e) = self.cache.artifacts() {
            warn!("Submission ignored, prediction is disabled");
            return Err(e);
        }

        match collector::parse_json(text) {
            Ok(raw) => self.submit(&raw),
            Err(e) => {
                self.state = ViewState::ErrorDisplayed {
                    message: "The submission is not valid".to_string(),
                    detail: e.to_string(),
                };
                Ok(&self.state)
            }
        }
    }
}
