use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::Serialize;
use tracing::{info, warn};

use crate::assign::ReplacementAssigner;
use crate::config::RedactConfig;
use crate::consolidate::{Consolidator, ExclusionUpdate, FoldReport, LinkReport};
use crate::core::label::EntityLabel;
use crate::core::model::{ContentItem, Document};
use crate::detect::DetectorSet;
use crate::error::PseudoError;
use crate::export::{Exporter, JsonExporter, KeyRow, KeysExporter, TextExporter};
use crate::persist::{self, CsvForm, ImportMode, ImportReport};
use crate::reader::{document_chunks, read_document, LoadedDocument};
use crate::reconstruct::{ReconstructionReport, Reconstructor, Substitution};
use crate::session::Session;

/// Extra renditions written next to the redacted PDF.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rendition {
    Json,
    Text,
}

#[derive(Debug, Clone, Default)]
pub struct RedactOptions {
    /// Run the detectors over the inputs before rewriting them.
    pub detect: bool,
    pub renditions: Vec<Rendition>,
    pub write_keys: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DocumentStatus {
    Detected { fold: FoldReport },
    Redacted { report: ReconstructionReport, renditions: Vec<PathBuf> },
    NeedsOcr,
    Failed { error: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentOutcome {
    pub path: PathBuf,
    #[serde(flatten)]
    pub status: DocumentStatus,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    pub documents: Vec<DocumentOutcome>,
    pub link: Option<LinkReport>,
    pub keys: Option<PathBuf>,
}

impl RunReport {
    pub fn needs_ocr(&self) -> Vec<&Path> {
        self.documents
            .iter()
            .filter(|d| matches!(d.status, DocumentStatus::NeedsOcr))
            .map(|d| d.path.as_path())
            .collect()
    }

    pub fn failed(&self) -> Vec<(&Path, &str)> {
        self.documents
            .iter()
            .filter_map(|d| match &d.status {
                DocumentStatus::Failed { error } => Some((d.path.as_path(), error.as_str())),
                _ => None,
            })
            .collect()
    }

    pub fn redacted(&self) -> impl Iterator<Item = &ReconstructionReport> {
        self.documents.iter().filter_map(|d| match &d.status {
            DocumentStatus::Redacted { report, .. } => Some(report),
            _ => None,
        })
    }

    fn record(&mut self, path: &Path, status: DocumentStatus) {
        self.documents.push(DocumentOutcome {
            path: path.to_path_buf(),
            status,
        });
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DocumentInfo {
    pub pages: usize,
    pub text_runs: usize,
    pub images: usize,
    pub text_chars: usize,
    pub needs_ocr: bool,
}

pub fn document_info(path: &Path) -> Result<DocumentInfo> {
    let loaded = read_document(path)
        .with_context(|| format!("failed to read document {}", path.display()))?;
    let images = loaded
        .document
        .pages
        .iter()
        .flat_map(|p| p.content.iter())
        .filter(|item| matches!(item, ContentItem::Image(_)))
        .count();
    Ok(DocumentInfo {
        pages: loaded.document.pages.len(),
        text_runs: loaded.document.text_runs().count(),
        images,
        text_chars: loaded.document.text_len(),
        needs_ocr: loaded.needs_ocr,
    })
}

/// Detection, consolidation and reconstruction over one session.
pub struct Pipeline {
    config: RedactConfig,
    detectors: DetectorSet,
    consolidator: Consolidator,
    assigner: ReplacementAssigner,
    session: Session,
}

impl Pipeline {
    pub fn new(config: RedactConfig) -> Result<Self> {
        config.validate()?;
        let detectors =
            DetectorSet::from_config(&config.detectors).context("failed to set up detectors")?;
        Ok(Self::with_detectors(config, detectors))
    }

    pub fn with_detectors(config: RedactConfig, detectors: DetectorSet) -> Self {
        Self {
            consolidator: Consolidator::from_config(&config),
            assigner: ReplacementAssigner::new(config.strategy, config.seed),
            detectors,
            session: Session::new(),
            config,
        }
    }

    pub fn config(&self) -> &RedactConfig {
        &self.config
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn reset(&mut self) {
        self.session.reset();
    }

    pub fn load_entities(&mut self, path: &Path, mode: ImportMode) -> Result<ImportReport> {
        let report = persist::import_csv_file(&mut self.session, &mut self.assigner, path, mode)
            .with_context(|| format!("failed to import entities from {}", path.display()))?;
        info!(
            path = %path.display(),
            imported = report.imported,
            skipped = report.already_known + report.invalid,
            "entities imported"
        );
        Ok(report)
    }

    pub fn save_entities(&self, path: &Path, form: CsvForm) -> Result<()> {
        persist::export_csv_file(&self.session, path, form)
            .with_context(|| format!("failed to export entities to {}", path.display()))
    }

    pub fn update_exclusions<S: AsRef<str>>(
        &mut self,
        words: &[S],
        mode: ExclusionUpdate,
    ) -> usize {
        self.consolidator
            .update_exclusions(&mut self.session, words, mode)
    }

    /// Runs every detector over the document's chunks and folds the result.
    pub fn detect_document(&mut self, document: &Document) -> FoldReport {
        let labels: &[EntityLabel] = &self.config.tracked_labels;
        let spans: Vec<_> = document_chunks(document, self.config.chunk_max_len)
            .iter()
            .flat_map(|chunk| self.detectors.detect_all(chunk, labels))
            .collect();
        self.consolidator
            .fold(&mut self.session, &mut self.assigner, spans)
    }

    pub fn link(&mut self) -> LinkReport {
        let report = self.consolidator.link(&mut self.session);
        info!(clusters = report.clusters, relinked = report.relinked, "similar entities linked");
        report
    }

    /// Reads and detects each input; unreadable or image-only inputs are
    /// recorded and skipped.
    pub fn detect_files(&mut self, inputs: &[PathBuf]) -> RunReport {
        let mut report = RunReport::default();
        for loaded in self.load_all(inputs, &mut report) {
            let fold = self.detect_document(&loaded.document);
            info!(
                path = %loaded.path.display(),
                added = fold.added,
                known = fold.already_known,
                "entities detected"
            );
            report.record(&loaded.path, DocumentStatus::Detected { fold });
            self.write_checkpoint();
        }
        if self.config.link_similar {
            report.link = Some(self.link());
        }
        report
    }

    fn write_checkpoint(&self) {
        let Some(path) = &self.config.checkpoint else {
            return;
        };
        if let Err(err) = self.save_entities(path, CsvForm::Full) {
            warn!(path = %path.display(), error = %format!("{err:#}"), "checkpoint not written");
        }
    }

    /// Rewrites each input into the output directory.
    ///
    /// Fails before touching any document when the output directory is
    /// unusable or there is nothing to redact.
    pub fn redact_files(
        &mut self,
        inputs: &[PathBuf],
        options: &RedactOptions,
    ) -> Result<RunReport> {
        let output_dir = self.config.require_output_dir()?.to_path_buf();

        let mut report = RunReport::default();
        let documents = self.load_all(inputs, &mut report);
        if options.detect {
            for loaded in &documents {
                self.detect_document(&loaded.document);
            }
        }
        if self.session.is_empty() {
            return Err(PseudoError::NoEntities.into());
        }
        if self.config.link_similar {
            report.link = Some(self.link());
        }

        let substitution = Substitution::from_session(&self.session)?;
        let reconstructor = Reconstructor::new(output_dir.clone());
        let mut keys = Vec::new();

        for loaded in &documents {
            match self.redact_one(&reconstructor, &substitution, loaded, options) {
                Ok((redacted, renditions)) => {
                    let file_name = loaded
                        .path
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_default();
                    keys.extend(KeyRow::from_applied(&file_name, &redacted.applied));
                    info!(
                        output = %redacted.output.display(),
                        replaced = redacted.applied.len(),
                        warnings = redacted.warnings.len(),
                        "document redacted"
                    );
                    report.record(
                        &loaded.path,
                        DocumentStatus::Redacted {
                            report: redacted,
                            renditions,
                        },
                    );
                }
                Err(err) => {
                    warn!(path = %loaded.path.display(), error = %err, "document failed");
                    report.record(
                        &loaded.path,
                        DocumentStatus::Failed {
                            error: format!("{err:#}"),
                        },
                    );
                }
            }
        }

        if options.write_keys {
            report.keys = Some(KeysExporter::new(output_dir).export(&keys)?);
        }
        Ok(report)
    }

    fn redact_one(
        &self,
        reconstructor: &Reconstructor,
        substitution: &Substitution,
        loaded: &LoadedDocument,
        options: &RedactOptions,
    ) -> Result<(ReconstructionReport, Vec<PathBuf>)> {
        let stem = loaded.stem();
        let redacted = reconstructor
            .reconstruct(&loaded.document, &stem, substitution)
            .with_context(|| format!("failed to rebuild {}", loaded.path.display()))?;

        let out_dir = reconstructor.output_dir().to_path_buf();
        let mut renditions = Vec::new();
        for rendition in &options.renditions {
            let exporter: Box<dyn Exporter> = match rendition {
                Rendition::Json => Box::new(JsonExporter::new(out_dir.clone())),
                Rendition::Text => Box::new(TextExporter::new(out_dir.clone())),
            };
            renditions.push(exporter.export(&stem, &redacted.document)?);
        }
        Ok((redacted.report, renditions))
    }

    fn load_all(&self, inputs: &[PathBuf], report: &mut RunReport) -> Vec<LoadedDocument> {
        let mut documents = Vec::with_capacity(inputs.len());
        for path in inputs {
            match read_document(path) {
                Ok(loaded) if loaded.needs_ocr => {
                    warn!(path = %path.display(), "no extractable text, document needs OCR");
                    report.record(path, DocumentStatus::NeedsOcr);
                }
                Ok(loaded) => documents.push(loaded),
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "document could not be read");
                    report.record(
                        path,
                        DocumentStatus::Failed {
                            error: err.to_string(),
                        },
                    );
                }
            }
        }
        documents
    }
}
