use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pseudoredact::config::{ModelBridgeConfig, RedactConfig, StrategyKind};
use pseudoredact::core::label::EntityLabel;
use pseudoredact::persist::{CsvForm, ImportMode};
use pseudoredact::pipeline::{document_info, Pipeline, RedactOptions, Rendition, RunReport};

#[derive(Parser, Debug)]
#[command(name = "pseudoredact")]
#[command(version, about = "Consistent pseudonymization of names, places and contact details in documents", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Find entities in documents and write them to a CSV
    Detect {
        /// Input documents (.json layout or .txt)
        inputs: Vec<PathBuf>,

        /// Entity CSV to write
        #[arg(short, long, default_value = "entities.csv")]
        entities: PathBuf,

        /// Existing entity CSV to extend instead of starting empty
        #[arg(long)]
        merge: Option<PathBuf>,

        /// Write only word, entity_type and replacement columns
        #[arg(long)]
        compact: bool,

        /// Rewrite this CSV after every document so an interrupted run keeps its entities
        #[arg(long)]
        checkpoint: Option<PathBuf>,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Rewrite documents with entity replacements
    Redact {
        /// Input documents (.json layout or .txt)
        inputs: Vec<PathBuf>,

        /// Output directory (must exist)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Entity CSV to apply
        #[arg(short, long)]
        entities: Option<PathBuf>,

        /// Also run detection over the inputs
        #[arg(long)]
        detect: bool,

        /// Additional renditions to write next to the PDF
        #[arg(short, long, value_enum, value_delimiter = ',')]
        format: Vec<Rendition>,

        /// Write a keys CSV of applied replacements
        #[arg(long)]
        keys: bool,

        /// Save the final entity set to this CSV
        #[arg(long)]
        save_entities: Option<PathBuf>,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Give similar entities in a CSV one shared replacement
    Link {
        /// Entity CSV to read
        entities: PathBuf,

        /// Where to write the linked CSV (default: overwrite input)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        common: CommonArgs,
    },

    /// Show information about input documents
    Info {
        /// Input documents
        inputs: Vec<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// JSON configuration file; flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Replacement strategy
    #[arg(long, value_enum)]
    strategy: Option<StrategyKind>,

    /// Seed for reproducible synthetic values
    #[arg(long)]
    seed: Option<u64>,

    /// Minimum detector confidence (exclusive)
    #[arg(long)]
    confidence: Option<f32>,

    /// Minimum entity length in characters
    #[arg(long)]
    min_length: Option<usize>,

    /// Similarity threshold for linking (0-100)
    #[arg(long)]
    similarity: Option<f32>,

    /// Link similar entities to one replacement
    #[arg(long)]
    link: bool,

    /// Labels to redact, e.g. PERSON,LOCATION
    #[arg(long, value_delimiter = ',')]
    labels: Vec<String>,

    /// Words never to redact
    #[arg(long, value_delimiter = ',')]
    exclude: Vec<String>,

    /// Gazetteer CSV (word,entity_type)
    #[arg(long)]
    gazetteer: Option<PathBuf>,

    /// External NER program reading text on stdin
    #[arg(long)]
    model: Option<PathBuf>,

    /// Disable the built-in email/phone/URL patterns
    #[arg(long)]
    no_patterns: bool,

    /// Suppress progress output
    #[arg(short, long)]
    quiet: bool,
}

impl CommonArgs {
    fn to_config(&self, output: Option<PathBuf>) -> Result<RedactConfig> {
        let mut config = match &self.config {
            Some(path) => RedactConfig::from_json_file(path)
                .with_context(|| format!("Failed to load config: {}", path.display()))?,
            None => RedactConfig::default(),
        };

        if let Some(strategy) = self.strategy {
            config.strategy = strategy;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if let Some(confidence) = self.confidence {
            config.confidence_threshold = confidence;
        }
        if let Some(min_length) = self.min_length {
            config.min_length = min_length;
        }
        if let Some(similarity) = self.similarity {
            config.similarity_threshold = similarity;
        }
        config.link_similar |= self.link;
        if !self.labels.is_empty() {
            config.redact_labels = self
                .labels
                .iter()
                .map(|l| l.parse::<EntityLabel>())
                .collect::<Result<_, _>>()?;
        }
        config.exclusions.extend(self.exclude.iter().cloned());
        if self.gazetteer.is_some() {
            config.detectors.gazetteer = self.gazetteer.clone();
        }
        if let Some(program) = &self.model {
            config.detectors.model = Some(ModelBridgeConfig {
                program: program.clone(),
                args: Vec::new(),
                label_map: Default::default(),
            });
        }
        if self.no_patterns {
            config.detectors.patterns = false;
        }
        if output.is_some() {
            config.output_dir = output;
        }

        config.validate()?;
        Ok(config)
    }
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Detect {
            inputs,
            entities,
            merge,
            compact,
            checkpoint,
            common,
        } => run_detect(inputs, entities, merge, compact, checkpoint, common),
        Commands::Redact {
            inputs,
            output,
            entities,
            detect,
            format,
            keys,
            save_entities,
            common,
        } => {
            let options = RedactOptions {
                detect,
                renditions: format,
                write_keys: keys,
            };
            run_redact(inputs, output, entities, save_entities, options, common)
        }
        Commands::Link {
            entities,
            output,
            common,
        } => run_link(entities, output, common),
        Commands::Info { inputs } => show_info(inputs),
    }
}

fn check_inputs(inputs: &[PathBuf]) -> Result<()> {
    if inputs.is_empty() {
        anyhow::bail!("No input files specified");
    }
    for input in inputs {
        if !input.is_file() {
            anyhow::bail!("Input is not a file: {}", input.display());
        }
    }
    Ok(())
}

fn csv_form(compact: bool) -> CsvForm {
    if compact {
        CsvForm::Compact
    } else {
        CsvForm::Full
    }
}

fn run_detect(
    inputs: Vec<PathBuf>,
    entities: PathBuf,
    merge: Option<PathBuf>,
    compact: bool,
    checkpoint: Option<PathBuf>,
    common: CommonArgs,
) -> Result<()> {
    check_inputs(&inputs)?;
    let quiet = common.quiet;
    let mut config = common.to_config(None)?;
    if checkpoint.is_some() {
        config.checkpoint = checkpoint;
    }
    let mut pipeline = Pipeline::new(config)?;

    if let Some(path) = &merge {
        pipeline.load_entities(path, ImportMode::Merge)?;
    }
    if !quiet {
        println!("[*] Detecting entities in {} file(s)", inputs.len());
    }

    let report = pipeline.detect_files(&inputs);
    pipeline.save_entities(&entities, csv_form(compact))?;

    if !quiet {
        print_summary(&report);
        println!(
            "\n[✓] {} entities saved to: {}",
            pipeline.session().len(),
            entities.display()
        );
    }
    Ok(())
}

fn run_redact(
    inputs: Vec<PathBuf>,
    output: Option<PathBuf>,
    entities: Option<PathBuf>,
    save_entities: Option<PathBuf>,
    options: RedactOptions,
    common: CommonArgs,
) -> Result<()> {
    check_inputs(&inputs)?;
    if entities.is_none() && !options.detect {
        anyhow::bail!("Nothing to apply: pass --entities <csv> and/or --detect");
    }
    let quiet = common.quiet;
    let mut pipeline = Pipeline::new(common.to_config(output)?)?;

    if let Some(path) = &entities {
        pipeline.load_entities(path, ImportMode::Merge)?;
    }
    if !quiet {
        println!("[*] Redacting {} file(s)", inputs.len());
    }

    let report = pipeline.redact_files(&inputs, &options)?;

    if let Some(path) = &save_entities {
        pipeline.save_entities(path, CsvForm::Full)?;
    }
    if !quiet {
        print_summary(&report);
        for redacted in report.redacted() {
            println!("  [✓] {}", redacted.output.display());
        }
        if let Some(keys) = &report.keys {
            println!("  [*] Keys: {}", keys.display());
        }
    }

    let failed = report.failed().len();
    if failed > 0 {
        anyhow::bail!("{} file(s) failed to process", failed);
    }
    Ok(())
}

fn run_link(entities: PathBuf, output: Option<PathBuf>, common: CommonArgs) -> Result<()> {
    let quiet = common.quiet;
    let mut pipeline = Pipeline::new(common.to_config(None)?)?;
    pipeline.load_entities(&entities, ImportMode::Replace)?;
    let report = pipeline.link();

    let target = output.unwrap_or_else(|| entities.clone());
    pipeline.save_entities(&target, CsvForm::Full)?;

    if !quiet {
        println!(
            "[✓] {} cluster(s), {} entit(ies) relinked -> {}",
            report.clusters,
            report.relinked,
            target.display()
        );
    }
    Ok(())
}

fn print_summary(report: &RunReport) {
    let needs_ocr = report.needs_ocr();
    if !needs_ocr.is_empty() {
        println!("\n[!] Needs OCR (skipped):");
        for path in needs_ocr {
            println!("  - {}", path.display());
        }
    }
    for (path, error) in report.failed() {
        eprintln!("  [✗] {}: {}", path.display(), error);
    }
    if let Some(link) = &report.link {
        println!(
            "[*] Linked {} cluster(s), {} entit(ies) relinked",
            link.clusters, link.relinked
        );
    }
}

fn show_info(inputs: Vec<PathBuf>) -> Result<()> {
    check_inputs(&inputs)?;
    for input in &inputs {
        print_info(input)?;
    }
    Ok(())
}

fn print_info(input: &Path) -> Result<()> {
    let info = document_info(input)?;

    println!("Document Information");
    println!("====================");
    println!("File: {}", input.display());
    println!("Pages: {}", info.pages);
    println!("Text runs: {}", info.text_runs);
    println!("Images: {}", info.images);
    println!("Characters: {}", info.text_chars);
    if info.needs_ocr {
        println!("Status: needs OCR (no extractable text)");
    }
    println!();
    Ok(())
}
