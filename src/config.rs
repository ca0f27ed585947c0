use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::core::label::EntityLabel;
use crate::error::{PseudoError, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    /// Realistic fake values
    #[default]
    Synthetic,
    /// `<tag>_<n>` per label
    Counter,
}

/// External NER process settings for the model bridge detector.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModelBridgeConfig {
    pub program: PathBuf,
    #[serde(default)]
    pub args: Vec<String>,
    /// Model-native label -> canonical label name. Empty means the built-in map.
    #[serde(default)]
    pub label_map: BTreeMap<String, EntityLabel>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DetectorConfig {
    pub patterns: bool,
    pub gazetteer: Option<PathBuf>,
    pub model: Option<ModelBridgeConfig>,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            patterns: true,
            gazetteer: None,
            model: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RedactConfig {
    pub confidence_threshold: f32,
    pub min_length: usize,
    pub similarity_threshold: f32,
    pub link_similar: bool,
    pub strategy: StrategyKind,
    pub redact_labels: Vec<EntityLabel>,
    pub tracked_labels: Vec<EntityLabel>,
    pub exclusions: Vec<String>,
    pub seed: Option<u64>,
    pub output_dir: Option<PathBuf>,
    /// Entity CSV rewritten after every detected document.
    pub checkpoint: Option<PathBuf>,
    pub chunk_max_len: usize,
    pub detectors: DetectorConfig,
}

impl Default for RedactConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.5,
            min_length: 4,
            similarity_threshold: 75.0,
            link_similar: false,
            strategy: StrategyKind::Synthetic,
            redact_labels: EntityLabel::REDACTED_BY_DEFAULT.to_vec(),
            tracked_labels: EntityLabel::ALL.to_vec(),
            exclusions: Vec::new(),
            seed: None,
            output_dir: None,
            checkpoint: None,
            chunk_max_len: 5000,
            detectors: DetectorConfig::default(),
        }
    }
}

impl RedactConfig {
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)?;
        let config: RedactConfig = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(PseudoError::InvalidConfig(format!(
                "confidence_threshold must be within 0..=1, got {}",
                self.confidence_threshold
            )));
        }
        if !(0.0..=100.0).contains(&self.similarity_threshold) {
            return Err(PseudoError::InvalidConfig(format!(
                "similarity_threshold must be within 0..=100, got {}",
                self.similarity_threshold
            )));
        }
        if self.chunk_max_len == 0 {
            return Err(PseudoError::InvalidConfig(
                "chunk_max_len must be positive".to_string(),
            ));
        }
        if let Some(label) = self
            .redact_labels
            .iter()
            .find(|label| !self.tracked_labels.contains(label))
        {
            return Err(PseudoError::InvalidConfig(format!(
                "redacted label {label} is not in the tracked label set"
            )));
        }
        Ok(())
    }

    /// Existing output directory, or the fatal error describing why there is none.
    pub fn require_output_dir(&self) -> Result<&Path> {
        let dir = self
            .output_dir
            .as_deref()
            .ok_or(PseudoError::MissingOutputDir)?;
        if !dir.is_dir() {
            return Err(PseudoError::OutputDirNotFound(dir.to_path_buf()));
        }
        Ok(dir)
    }
}
