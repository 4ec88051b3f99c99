use tracing::debug;

use crate::artifacts::{ArtifactCache, ArtifactSet};
use crate::error::PipelineError;
use crate::features;
use crate::models::{FeatureVector, PredictionResult, StudentRecord};

pub struct InferenceEngine<'a> {
    artifacts: &'a ArtifactSet,
}

impl<'a> InferenceEngine<'a> {
    pub fn new(artifacts: &'a ArtifactSet) -> Self {
        Self { artifacts }
    }

    pub fn expected_columns(&self) -> &'a [String] {
        self.artifacts.scaler.feature_names()
    }

    pub fn predict(&self, features: &FeatureVector) -> Result<PredictionResult, PipelineError> {
        let scaled = self.artifacts.scaler.transform(features)?;
        let model = &self.artifacts.model;

        let probability = model.predict_proba(&scaled)?;
        if !probability.is_finite() {
            return Err(PipelineError::processing(format!(
                "{} returned a non-finite probability",
                model.kind()
            )));
        }
        let probability = probability.clamp(0.0, 1.0);
        let label = model.label(probability);

        debug!(model = model.kind(), label, probability, "Inference complete");
        Ok(PredictionResult { label, probability })
    }
}

pub fn predict_record(
    cache: &ArtifactCache,
    record: &StudentRecord,
) -> Result<PredictionResult, PipelineError> {
    let artifacts = cache.artifacts()?;
    let engine = InferenceEngine::new(artifacts);
    let features = features::build(record, engine.expected_columns())?;
    engine.predict(&features)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::fixtures;
    use crate::artifacts::ArtifactState;
    use crate::classifier::{Classifier, TreeEnsemble};
    use crate::features::tests::sample_record;
    use crate::models::SemesterUnits;
    use crate::scaler::StandardScaler;

    #[test]
    fn strong_record_is_low_risk() {
        let cache = fixtures::ready_cache();
        let result = predict_record(&cache, &sample_record()).unwrap();
        // approval 11/12 and fees paid: margin -1.5 - 0.5
        assert_eq!(result.label, 0);
        assert!((result.probability - crate::classifier::sigmoid(-2.0)).abs() < 1e-12);
    }

    #[test]
    fn zero_progress_record_yields_bounded_probability() {
        let cache = fixtures::ready_cache();
        let mut record = sample_record();
        record.first_semester = SemesterUnits::default();
        record.second_semester = SemesterUnits::default();
        record.tuition_fees_up_to_date = 0;

        let artifacts = cache.artifacts().unwrap();
        let engine = InferenceEngine::new(artifacts);
        let features = features::build(&record, engine.expected_columns()).unwrap();
        let rate = features.get("approval_rate").unwrap();
        assert!(rate.abs() < 1e-9);

        let result = engine.predict(&features).unwrap();
        assert!((0.0..=1.0).contains(&result.probability));
        assert!(result.label == 0 || result.label == 1);
        assert_eq!(result.label, 1);
    }

    #[test]
    fn prediction_is_deterministic() {
        let cache = fixtures::ready_cache();
        let record = sample_record();
        let first = predict_record(&cache, &record).unwrap();
        for _ in 0..10 {
            assert_eq!(predict_record(&cache, &record).unwrap(), first);
        }
    }

    #[test]
    fn scaler_from_a_different_schema_is_schema_mismatch() {
        let mut scaler = fixtures::identity_scaler();
        scaler.feature_names_in[0] = "Marital_status_encoded".to_string();
        let set = ArtifactSet::new(
            Box::new(fixtures::risk_model()),
            scaler,
            fixtures::encoders(),
        )
        .unwrap();
        let cache = ArtifactCache::preloaded(ArtifactState::Ready(set));

        assert_eq!(
            predict_record(&cache, &sample_record()),
            Err(PipelineError::SchemaMismatch {
                missing: vec!["Marital_status_encoded".to_string()],
            })
        );
    }

    #[test]
    fn unavailable_artifacts_short_circuit() {
        let cache = ArtifactCache::preloaded(ArtifactState::Unavailable {
            reason: "scaler.json: artifact file not found".to_string(),
        });
        assert_eq!(
            predict_record(&cache, &sample_record()),
            Err(PipelineError::ArtifactUnavailable)
        );
    }

    struct Overconfident;

    impl Classifier for Overconfident {
        fn kind(&self) -> &'static str {
            "overconfident"
        }

        fn predict_proba(&self, _row: &[f64]) -> Result<f64, PipelineError> {
            Ok(1.25)
        }

        fn check_width(&self, _width: usize) -> Result<(), String> {
            Ok(())
        }
    }

    #[test]
    fn probability_is_clamped_into_unit_interval() {
        let set = ArtifactSet::new(
            Box::new(Overconfident),
            fixtures::identity_scaler(),
            fixtures::encoders(),
        )
        .unwrap();
        let cache = ArtifactCache::preloaded(ArtifactState::Ready(set));
        let result = predict_record(&cache, &sample_record()).unwrap();
        assert_eq!(result.probability, 1.0);
        assert_eq!(result.label, 1);
    }

    #[test]
    fn non_finite_scaling_is_a_processing_error() {
        let mut scaler: StandardScaler = fixtures::identity_scaler();
        scaler.scale[6] = 1e-320;
        let model: TreeEnsemble = fixtures::risk_model();
        let set = ArtifactSet::new(Box::new(model), scaler, fixtures::encoders()).unwrap();
        let cache = ArtifactCache::preloaded(ArtifactState::Ready(set));

        assert!(matches!(
            predict_record(&cache, &sample_record()),
            Err(PipelineError::Processing(_))
        ));
    }

    #[test]
    fn demo_artifacts_score_the_demo_record() {
        let dir = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("demo");
        let cache = ArtifactCache::new(crate::config::ArtifactPaths::in_dir(&dir));
        let text = std::fs::read_to_string(dir.join("record.json")).unwrap();
        let raw = crate::collector::parse_json(&text).unwrap();
        let record = crate::collector::collect(&raw).unwrap();

        let result = predict_record(&cache, &record).unwrap();
        assert_eq!(result.label, 0);
        assert!((0.0..=1.0).contains(&result.probability));
    }
}
