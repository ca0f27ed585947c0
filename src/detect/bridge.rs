use std::collections::BTreeMap;
use std::io::Write;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::config::ModelBridgeConfig;
use crate::core::label::EntityLabel;
use crate::core::model::DetectedSpan;
use crate::detect::{char_slice, Detector};

/// One record printed by the external NER process.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelRecord {
    #[serde(alias = "entity_group", alias = "entity", alias = "entity_type")]
    pub label: String,
    pub start: usize,
    pub end: usize,
    #[serde(default)]
    pub score: Option<f32>,
}

/// Labels emitted by common Finnish NER models.
pub fn default_label_map() -> BTreeMap<String, EntityLabel> {
    let mut map: BTreeMap<String, EntityLabel> = EntityLabel::ALL
        .into_iter()
        .map(|label| (label.as_str().to_string(), label))
        .collect();
    map.insert("PER".to_string(), EntityLabel::Person);
    map.insert("ORG".to_string(), EntityLabel::Organization);
    map.insert("LOC".to_string(), EntityLabel::Location);
    map.insert("GPE".to_string(), EntityLabel::Location);
    map.insert("NORP".to_string(), EntityLabel::Nrp);
    map
}

/// Runs an external token-classification model.
///
/// The chunk is written to the process' stdin; the process prints a JSON
/// array of [`ModelRecord`] with character offsets into the chunk.
#[derive(Debug, Clone)]
pub struct ModelBridge {
    program: PathBuf,
    args: Vec<String>,
    label_map: BTreeMap<String, EntityLabel>,
    name: String,
}

impl ModelBridge {
    pub fn new(program: PathBuf) -> Self {
        let name = format!(
            "model:{}",
            program
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default()
        );
        Self {
            program,
            args: Vec::new(),
            label_map: default_label_map(),
            name,
        }
    }

    pub fn from_config(config: &ModelBridgeConfig) -> Self {
        let bridge = Self::new(config.program.clone()).with_args(config.args.clone());
        if config.label_map.is_empty() {
            bridge
        } else {
            bridge.with_label_map(config.label_map.clone())
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }

    pub fn with_label_map(mut self, label_map: BTreeMap<String, EntityLabel>) -> Self {
        self.label_map = label_map;
        self
    }

    pub fn run(&self, chunk: &str) -> Result<Vec<ModelRecord>> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("failed to invoke NER model {}", self.program.display()))?;

        if let Some(mut stdin) = child.stdin.take() {
            if let Err(err) = stdin.write_all(chunk.as_bytes()) {
                // Reap the child before bailing out.
                let _ = child.kill();
                let _ = child.wait();
                return Err(err).with_context(|| "failed to send chunk to NER model");
            }
        }

        let output = child
            .wait_with_output()
            .with_context(|| "failed to collect NER model output")?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            anyhow::bail!("NER model failed: {stderr}");
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let records: Vec<ModelRecord> =
            serde_json::from_str(&stdout).with_context(|| "failed to parse NER JSON response")?;
        Ok(records)
    }

    /// Maps raw records onto spans, dropping unmapped labels and bad offsets.
    pub fn to_spans(
        &self,
        chunk: &str,
        records: Vec<ModelRecord>,
        labels: &[EntityLabel],
    ) -> Vec<DetectedSpan> {
        let mut spans: Vec<DetectedSpan> = records
            .into_iter()
            .filter_map(|record| {
                let label = *self.label_map.get(record.label.trim())?;
                if !labels.contains(&label) {
                    return None;
                }
                let text = char_slice(chunk, record.start, record.end)?;
                Some(DetectedSpan {
                    text: text.to_string(),
                    label,
                    start: record.start,
                    end: record.end,
                    confidence: record.score,
                    origin: self.name.clone(),
                })
            })
            .collect();
        spans.sort_by_key(|s| (s.start, s.end));
        spans
    }
}

impl Detector for ModelBridge {
    fn name(&self) -> &str {
        &self.name
    }

    fn detect(&self, chunk: &str, labels: &[EntityLabel]) -> Vec<DetectedSpan> {
        match self.run(chunk) {
            Ok(records) => self.to_spans(chunk, records, labels),
            Err(err) => {
                warn!(detector = %self.name, error = %err, "detector failed, skipping chunk");
                Vec::new()
            }
        }
    }
}
