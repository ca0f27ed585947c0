use std::collections::HashSet;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::assign::ReplacementAssigner;
use crate::core::label::EntityLabel;
use crate::core::model::{CanonicalEntity, EntityKey};
use crate::error::Result;
use crate::session::Session;

const ORIGIN_SEPARATOR: &str = ";";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CsvForm {
    /// `word,entity_type,replacement`
    Compact,
    /// Compact columns plus uid, detector origins, scores and link target.
    #[default]
    Full,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ImportMode {
    #[default]
    Merge,
    /// Reset the session before reading.
    Replace,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImportReport {
    pub rows: usize,
    pub imported: usize,
    pub already_known: usize,
    pub invalid: usize,
    /// Rows without a replacement that received a fresh one.
    pub assigned: usize,
}

#[derive(Debug, Serialize)]
struct CompactRow<'a> {
    word: &'a str,
    entity_type: EntityLabel,
    replacement: &'a str,
}

#[derive(Debug, Serialize)]
struct FullRow<'a> {
    word: &'a str,
    entity_type: EntityLabel,
    replacement: &'a str,
    uid: String,
    ner_method: String,
    score: Option<f32>,
    similarity_score: Option<f32>,
    similarity_score_with: &'a str,
}

#[derive(Debug, Deserialize)]
struct ImportRow {
    word: String,
    entity_type: String,
    #[serde(default)]
    replacement: String,
    #[serde(default)]
    ner_method: String,
    #[serde(default)]
    score: Option<f32>,
    #[serde(default)]
    similarity_score: Option<f32>,
    #[serde(default)]
    similarity_score_with: String,
}

pub fn export_csv<W: io::Write>(session: &Session, writer: W, form: CsvForm) -> Result<()> {
    let mut writer = csv::Writer::from_writer(writer);
    for entity in session.entities() {
        let replacement = entity.replacement.as_deref().unwrap_or_default();
        match form {
            CsvForm::Compact => writer.serialize(CompactRow {
                word: &entity.text,
                entity_type: entity.label,
                replacement,
            })?,
            CsvForm::Full => writer.serialize(FullRow {
                word: &entity.text,
                entity_type: entity.label,
                replacement,
                uid: entity.uid(),
                ner_method: entity.origins.join(ORIGIN_SEPARATOR),
                score: entity.confidence,
                similarity_score: entity.similarity_score,
                similarity_score_with: entity.similarity_with.as_deref().unwrap_or_default(),
            })?,
        }
    }
    writer.flush()?;
    Ok(())
}

pub fn export_csv_file(session: &Session, path: &Path, form: CsvForm) -> Result<()> {
    let file = std::fs::File::create(path)?;
    export_csv(session, file, form)
}

/// Merges CSV rows into the session, replaying registry and counters.
///
/// Rows carrying a replacement are registered before any blank row is
/// assigned, so a fresh value never takes one a later row already holds.
/// Entities are committed in row order.
pub fn import_csv<R: io::Read>(
    session: &mut Session,
    assigner: &mut ReplacementAssigner,
    reader: R,
    mode: ImportMode,
) -> Result<ImportReport> {
    if mode == ImportMode::Replace {
        session.reset();
    }

    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::Fields).from_reader(reader);
    let mut report = ImportReport::default();
    let mut pending: Vec<CanonicalEntity> = Vec::new();
    let mut seen: HashSet<EntityKey> = HashSet::new();

    for row in reader.deserialize() {
        let row: ImportRow = row?;
        report.rows += 1;

        let label: EntityLabel = match row.entity_type.parse() {
            Ok(label) => label,
            Err(err) => {
                warn!(word = %row.word, error = %err, "skipping row with unknown label");
                report.invalid += 1;
                continue;
            }
        };
        if row.word.is_empty() {
            report.invalid += 1;
            continue;
        }

        let mut entity = CanonicalEntity {
            text: row.word,
            label,
            confidence: row.score,
            origins: row
                .ner_method
                .split(ORIGIN_SEPARATOR)
                .filter(|o| !o.is_empty())
                .map(str::to_string)
                .collect(),
            replacement: None,
            similarity_score: row.similarity_score,
            similarity_with: (!row.similarity_score_with.is_empty())
                .then_some(row.similarity_score_with),
        };
        let key = entity.key();
        if session.contains(&key) || seen.contains(&key) {
            report.already_known += 1;
            continue;
        }

        let registry = session.registry_mut();
        if registry.is_issued(&entity.text) {
            warn!(word = %entity.text, "word is already a replacement value, skipping row");
            report.invalid += 1;
            continue;
        }
        if !row.replacement.is_empty() {
            let value = row.replacement;
            let original = registry.is_original(&value);
            let shared = registry.is_issued(&value) && !entity.is_linked();
            if value == entity.text || original || shared {
                warn!(word = %entity.text, replacement = %value, "replacement already in use, skipping row");
                report.invalid += 1;
                continue;
            }
            registry.register(&value);
            registry.bump_counter(label);
            entity.replacement = Some(value);
        }
        registry.reserve_original(&entity.text);
        seen.insert(key);
        pending.push(entity);
    }

    for mut entity in pending {
        if entity.replacement.is_none() {
            match assigner.assign(&entity, session.registry_mut()) {
                Ok(value) => {
                    entity.replacement = Some(value);
                    report.assigned += 1;
                }
                Err(err) => {
                    warn!(word = %entity.text, error = %err, "skipping row without replacement");
                    report.invalid += 1;
                    continue;
                }
            }
        }
        session.commit(entity);
        report.imported += 1;
    }
    debug!(?report, "csv import finished");
    Ok(report)
}

pub fn import_csv_file(
    session: &mut Session,
    assigner: &mut ReplacementAssigner,
    path: &Path,
    mode: ImportMode,
) -> Result<ImportReport> {
    let file = std::fs::File::open(path)?;
    import_csv(session, assigner, file, mode)
}
