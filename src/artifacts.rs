use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;
use tracing::{error, info};

use crate::classifier::{Classifier, ModelArtifact};
use crate::config::ArtifactPaths;
use crate::error::PipelineError;
use crate::scaler::StandardScaler;

#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("{}: artifact file not found", path.display())]
    Missing { path: PathBuf },
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{artifact}: {reason}")]
    Invalid {
        artifact: &'static str,
        reason: String,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct LabelEncoders(BTreeMap<String, Vec<String>>);

impl LabelEncoders {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, usize)> {
        self.0
            .iter()
            .map(|(column, classes)| (column.as_str(), classes.len()))
    }
}

pub struct ArtifactSet {
    pub model: Box<dyn Classifier>,
    pub scaler: StandardScaler,
    pub encoders: LabelEncoders,
}

impl ArtifactSet {
    pub fn new(
        model: Box<dyn Classifier>,
        scaler: StandardScaler,
        encoders: LabelEncoders,
    ) -> Result<Self, ArtifactError> {
        scaler.validate().map_err(|reason| ArtifactError::Invalid {
            artifact: "scaler",
            reason,
        })?;
        model
            .check_width(scaler.width())
            .map_err(|reason| ArtifactError::Invalid {
                artifact: "model",
                reason,
            })?;
        if encoders.is_empty() {
            return Err(ArtifactError::Invalid {
                artifact: "label encoders",
                reason: "no encoders recorded".to_string(),
            });
        }
        Ok(Self {
            model,
            scaler,
            encoders,
        })
    }

    pub fn load(paths: &ArtifactPaths) -> Result<Self, ArtifactError> {
        for path in [&paths.model, &paths.scaler, &paths.encoders] {
            if !path.exists() {
                return Err(ArtifactError::Missing { path: path.clone() });
            }
        }

        let model: ModelArtifact = read_json(&paths.model)?;
        let scaler: StandardScaler = read_json(&paths.scaler)?;
        let encoders: LabelEncoders = read_json(&paths.encoders)?;
        Self::new(Box::new(model), scaler, encoders)
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    info!(path = %path.display(), "Loading artifact");
    let text = std::fs::read_to_string(path).map_err(|source| match source.kind() {
        std::io::ErrorKind::NotFound => ArtifactError::Missing {
            path: path.to_path_buf(),
        },
        _ => ArtifactError::Io {
            path: path.to_path_buf(),
            source,
        },
    })?;
    serde_json::from_str(&text).map_err(|source| ArtifactError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

pub enum ArtifactState {
    Ready(ArtifactSet),
    Unavailable { reason: String },
}

impl ArtifactState {
    pub fn load(paths: &ArtifactPaths) -> Self {
        match ArtifactSet::load(paths) {
            Ok(set) => {
                info!(
                    model = set.model.kind(),
                    features = set.scaler.width(),
                    "Artifacts loaded"
                );
                ArtifactState::Ready(set)
            }
            Err(e) => {
                error!(error = %e, "Artifacts unavailable, prediction is disabled");
                ArtifactState::Unavailable {
                    reason: e.to_string(),
                }
            }
        }
    }
}

pub struct ArtifactCache {
    paths: Option<ArtifactPaths>,
    state: OnceLock<ArtifactState>,
}

impl ArtifactCache {
    pub fn new(paths: ArtifactPaths) -> Self {
        Self {
            paths: Some(paths),
            state: OnceLock::new(),
        }
    }

    #[cfg(test)]
    pub fn preloaded(state: ArtifactState) -> Self {
        Self {
            paths: None,
            state: OnceLock::from(state),
        }
    }

    #[cfg(test)]
    pub fn is_loaded(&self) -> bool {
        self.state.get().is_some()
    }

    pub fn state(&self) -> &ArtifactState {
        self.state.get_or_init(|| match &self.paths {
            Some(paths) => ArtifactState::load(paths),
            None => ArtifactState::Unavailable {
                reason: "no artifact location configured".to_string(),
            },
        })
    }

    pub fn artifacts(&self) -> Result<&ArtifactSet, PipelineError> {
        match self.state() {
            ArtifactState::Ready(set) => Ok(set),
            ArtifactState::Unavailable { .. } => Err(PipelineError::ArtifactUnavailable),
        }
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const MODEL_JSON: &str = r#"{
        "kind": "logistic_regression",
        "coefficients": [0.5, -0.25],
        "intercept": 0.1
    }"#;
    const SCALER_JSON: &str = r#"{
        "feature_names_in": ["approval_rate", "avg_grade"],
        "mean": [0.7, 11.0],
        "scale": [0.3, 4.0]
    }"#;
    const ENCODERS_JSON: &str = r#"{"Target": ["Dropout", "Enrolled", "Graduate"]}"#;

    fn write_all(dir: &Path) -> ArtifactPaths {
        let paths = ArtifactPaths::in_dir(dir);
        fs::write(&paths.model, MODEL_JSON).unwrap();
        fs::write(&paths.scaler, SCALER_JSON).unwrap();
        fs::write(&paths.encoders, ENCODERS_JSON).unwrap();
        paths
    }

    #[test]
    fn loads_complete_artifact_set() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_all(dir.path());

        let set = ArtifactSet::load(&paths).unwrap();
        assert_eq!(set.model.kind(), "logistic_regression");
        assert_eq!(set.scaler.feature_names(), ["approval_rate", "avg_grade"]);
        assert_eq!(set.encoders.columns().collect::<Vec<_>>(), vec![("Target", 3)]);
    }

    #[test]
    fn one_missing_file_makes_the_whole_set_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_all(dir.path());
        fs::remove_file(&paths.encoders).unwrap();

        assert!(matches!(
            ArtifactSet::load(&paths),
            Err(ArtifactError::Missing { .. })
        ));
        let cache = ArtifactCache::new(paths);
        assert_eq!(
            cache.artifacts().err(),
            Some(PipelineError::ArtifactUnavailable)
        );
    }

    #[test]
    fn corrupt_file_is_a_parse_failure() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_all(dir.path());
        fs::write(&paths.scaler, "{not json").unwrap();

        assert!(matches!(
            ArtifactSet::load(&paths),
            Err(ArtifactError::Parse { .. })
        ));
    }

    #[test]
    fn empty_encoders_count_as_a_failed_load() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_all(dir.path());
        fs::write(&paths.encoders, "{}").unwrap();

        assert!(matches!(
            ArtifactSet::load(&paths),
            Err(ArtifactError::Invalid {
                artifact: "label encoders",
                ..
            })
        ));
    }

    #[test]
    fn model_wider_than_scaler_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_all(dir.path());
        fs::write(
            &paths.model,
            r#"{"kind": "logistic_regression", "coefficients": [1.0, 2.0, 3.0], "intercept": 0.0}"#,
        )
        .unwrap();

        assert!(matches!(
            ArtifactSet::load(&paths),
            Err(ArtifactError::Invalid {
                artifact: "model",
                ..
            })
        ));
    }

    #[test]
    fn cache_loads_lazily_once() {
        let dir = tempfile::tempdir().unwrap();
        let paths = write_all(dir.path());
        let cache = ArtifactCache::new(paths.clone());
        assert!(!cache.is_loaded());

        assert!(cache.artifacts().is_ok());
        assert!(cache.is_loaded());

        // Later changes on disk are not observed.
        fs::remove_file(&paths.model).unwrap();
        assert!(cache.artifacts().is_ok());
    }

    #[test]
    fn unavailable_state_is_sticky() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ArtifactPaths::in_dir(dir.path());
        let cache = ArtifactCache::new(paths);

        assert_eq!(
            cache.artifacts().err(),
            Some(PipelineError::ArtifactUnavailable)
        );

        write_all(dir.path());
        for _ in 0..3 {
            assert_eq!(
                cache.artifacts().err(),
                Some(PipelineError::ArtifactUnavailable)
            );
        }
    }

    #[test]
    fn preloaded_cache_never_reads_disk() {
        let cache = fixtures::ready_cache();
        assert!(cache.is_loaded());
        assert_eq!(cache.artifacts().unwrap().scaler.width(), 38);
    }
}
