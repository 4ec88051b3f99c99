use std::ffi::OsString;
use std::path::{Path, PathBuf};

pub const ARTIFACTS_DIR_ENV: &str = "DROPOUT_ARTIFACTS_DIR";

pub const MODEL_FILE: &str = "model_dropout_xgboost.json";
pub const SCALER_FILE: &str = "scaler.json";
pub const ENCODERS_FILE: &str = "label_encoders.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    pub model: PathBuf,
    pub scaler: PathBuf,
    pub encoders: PathBuf,
}

impl ArtifactPaths {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            model: dir.join(MODEL_FILE),
            scaler: dir.join(SCALER_FILE),
            encoders: dir.join(ENCODERS_FILE),
        }
    }

    /// Reads the directory from the flag, then `DROPOUT_ARTIFACTS_DIR`, then the working directory.
    pub fn from_flag_or_env(flag: Option<PathBuf>) -> Self {
        let dir = resolve_dir(flag, std::env::var_os(ARTIFACTS_DIR_ENV));
        Self::in_dir(&dir)
    }
}

fn resolve_dir(flag: Option<PathBuf>, env: Option<OsString>) -> PathBuf {
    flag.or_else(|| env.filter(|value| !value.is_empty()).map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_wins_over_environment() {
        let dir = resolve_dir(Some(PathBuf::from("/opt/models")), Some("/srv/models".into()));
        assert_eq!(dir, PathBuf::from("/opt/models"));
    }

    #[test]
    fn environment_then_working_directory() {
        assert_eq!(
            resolve_dir(None, Some("/srv/models".into())),
            PathBuf::from("/srv/models")
        );
        assert_eq!(resolve_dir(None, Some("".into())), PathBuf::from("."));
        assert_eq!(resolve_dir(None, None), PathBuf::from("."));
    }

    #[test]
    fn paths_use_fixed_file_names() {
        let paths = ArtifactPaths::in_dir(Path::new("artifacts"));
        assert_eq!(paths.model, Path::new("artifacts/model_dropout_xgboost.json"));
        assert_eq!(paths.scaler, Path::new("artifacts/scaler.json"));
        assert_eq!(paths.encoders, Path::new("artifacts/label_encoders.json"));
    }
}
