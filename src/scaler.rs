use std::collections::HashSet;

use serde::Deserialize;

use crate::error::PipelineError;
use crate::models::FeatureVector;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StandardScaler {
    pub feature_names_in: Vec<String>,
    pub mean: Vec<f64>,
    pub scale: Vec<f64>,
}

impl StandardScaler {
    pub fn feature_names(&self) -> &[String] {
        &self.feature_names_in
    }

    pub fn width(&self) -> usize {
        self.feature_names_in.len()
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.feature_names_in.is_empty() {
            return Err("no feature names recorded".to_string());
        }
        if self.mean.len() != self.width() || self.scale.len() != self.width() {
            return Err(format!(
                "{} feature names but {} means and {} scales",
                self.width(),
                self.mean.len(),
                self.scale.len()
            ));
        }

        let mut seen = HashSet::new();
        if let Some(duplicate) = self
            .feature_names_in
            .iter()
            .find(|name| !seen.insert(name.as_str()))
        {
            return Err(format!("feature {duplicate:?} is listed twice"));
        }

        if self
            .mean
            .iter()
            .chain(&self.scale)
            .any(|value| !value.is_finite())
        {
            return Err("mean and scale must be finite".to_string());
        }
        Ok(())
    }

    /// `(x - mean) / scale` per column. Zero scales act as 1, as for constant training columns.
    pub fn transform(&self, features: &FeatureVector) -> Result<Vec<f64>, PipelineError> {
        if features.names() != self.feature_names_in.as_slice() {
            return Err(PipelineError::processing(format!(
                "feature vector columns do not follow the scaler order ({} given, {} expected)",
                features.len(),
                self.width()
            )));
        }

        features
            .values()
            .iter()
            .zip(self.mean.iter().zip(&self.scale))
            .zip(&self.feature_names_in)
            .map(|((value, (mean, scale)), name)| {
                let scale = if *scale == 0.0 { 1.0 } else { *scale };
                let scaled = (value - mean) / scale;
                if scaled.is_finite() {
                    Ok(scaled)
                } else {
                    Err(PipelineError::processing(format!(
                        "scaling {name} produced a non-finite value"
                    )))
                }
            })
            .collect()
    }
}
