use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::reconstruct::AppliedReplacement;

pub const KEYS_FILE: &str = "anonymization_keys.csv";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyRow {
    pub file_name: String,
    pub original_value: String,
    pub replaced_value: String,
}

impl KeyRow {
    pub fn from_applied(file_name: &str, applied: &[AppliedReplacement]) -> Vec<KeyRow> {
        applied
            .iter()
            .map(|a| KeyRow {
                file_name: file_name.to_string(),
                original_value: a.original.clone(),
                replaced_value: a.replacement.clone(),
            })
            .collect()
    }
}

/// Writes the (file, original, replacement) pairs applied during a run.
#[derive(Debug, Clone)]
pub struct KeysExporter {
    out_dir: PathBuf,
}

impl KeysExporter {
    pub fn new(out_dir: PathBuf) -> Self {
        Self { out_dir }
    }

    pub fn export(&self, rows: &[KeyRow]) -> Result<PathBuf> {
        fs::create_dir_all(&self.out_dir)?;
        let path = self.out_dir.join(KEYS_FILE);
        let mut writer = csv::Writer::from_path(&path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;
        Ok(path)
    }
}
