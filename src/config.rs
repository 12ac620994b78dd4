use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::constants::pipeline::{
    DEFAULT_ID_ORIGIN, DEFAULT_THRESHOLD, SETTINGS_SUFFIX, TRAINING_SUFFIX,
};
use crate::types::{Confidence, InternalKey};

/// Top-level settings for one deduplication run.
#[derive(Clone, Debug, PartialEq)]
pub struct PipelineConfig {
    /// First key handed out by the identity mapper.
    pub id_origin: InternalKey,
    /// Partition threshold handed to the resolution engine.
    pub threshold: Confidence,
    /// Persisted model settings; loaded when present to skip training.
    pub settings_path: Option<PathBuf>,
    /// Persisted labeled pairs; loaded when present before training.
    pub training_path: Option<PathBuf>,
    /// Whether freshly trained settings and labeled pairs are written back.
    pub persist_artifacts: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            id_origin: DEFAULT_ID_ORIGIN,
            threshold: DEFAULT_THRESHOLD,
            settings_path: None,
            training_path: None,
            persist_artifacts: true,
        }
    }
}

impl PipelineConfig {
    /// Default config with artifact paths placed next to `input`
    /// (`<input>.learn` and `<input>.train`).
    pub fn for_input(input: &Path) -> Self {
        Self {
            settings_path: Some(with_suffix(input, SETTINGS_SUFFIX)),
            training_path: Some(with_suffix(input, TRAINING_SUFFIX)),
            ..Self::default()
        }
    }

    /// Override the identity mapper origin.
    pub fn with_id_origin(mut self, id_origin: InternalKey) -> Self {
        self.id_origin = id_origin;
        self
    }

    /// Override the partition threshold.
    pub fn with_threshold(mut self, threshold: Confidence) -> Self {
        self.threshold = threshold;
        self
    }

    /// Enable or disable writing engine artifacts after training.
    pub fn with_persist_artifacts(mut self, persist_artifacts: bool) -> Self {
        self.persist_artifacts = persist_artifacts;
        self
    }
}

fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut raw: OsString = path.as_os_str().to_owned();
    raw.push(suffix);
    PathBuf::from(raw)
}
