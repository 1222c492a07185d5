//! Batch command - extract bill data from multiple files.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tracing::{debug, error};

use szamla_core::decode::{DocumentDecoder, PlainTextDecoder};
use szamla_core::models::{BillSource, SourceKind};
use szamla_core::{ExtractionContext, ExtractionResult, Language, Orchestrator};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Input files or glob pattern
    #[arg(required = true)]
    input: String,

    /// Output directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Output format for each file
    #[arg(short, long, value_enum, default_value = "json")]
    format: super::extract::OutputFormat,

    /// Language hint applied to every file
    #[arg(short, long)]
    language: Option<String>,

    /// Extra pattern files to load on top of the built-in presets
    #[arg(short, long)]
    patterns: Vec<PathBuf>,

    /// Also write a summary JSON next to the per-file outputs
    #[arg(long)]
    summary: bool,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,
}

/// Outcome of one file, for the summary report.
#[derive(Serialize)]
struct FileOutcome {
    path: String,
    success: bool,
    bills: usize,
    confidence: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    processing_time_ms: u64,
}

#[derive(Serialize)]
struct BatchSummary {
    generated_at: chrono::DateTime<chrono::Utc>,
    total: usize,
    succeeded: usize,
    failed: usize,
    files: Vec<FileOutcome>,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let config = super::load_config(config_path)?;
    let orchestrator = super::build_orchestrator(&config, &args.patterns)?;

    let language = args
        .language
        .as_deref()
        .map(Language::from_code)
        .transpose()?;

    let files: Vec<PathBuf> = glob(&args.input)?.filter_map(|r| r.ok()).collect();
    if files.is_empty() {
        anyhow::bail!("No matching files found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} files to process",
        style("ℹ").blue(),
        files.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let pb = ProgressBar::new(files.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files")?
            .progress_chars("=>-"),
    );

    let mut outcomes = Vec::with_capacity(files.len());
    for path in &files {
        let file_start = Instant::now();
        let result = process_file(path, &orchestrator, language);
        let processing_time_ms = file_start.elapsed().as_millis() as u64;

        match result {
            Ok(result) => {
                debug!(path = %path.display(), confidence = result.confidence, "file processed");
                if let Some(ref output_dir) = args.output_dir {
                    let output = super::extract::format_result(&result, args.format)?;
                    let name = path
                        .file_stem()
                        .map(|s| s.to_string_lossy().to_string())
                        .unwrap_or_else(|| "output".to_string());
                    fs::write(output_dir.join(format!("{name}.json")), output)?;
                }
                outcomes.push(FileOutcome {
                    path: path.display().to_string(),
                    success: result.success,
                    bills: result.bills.len(),
                    confidence: result.confidence,
                    error: None,
                    processing_time_ms,
                });
            }
            Err(err) => {
                error!(path = %path.display(), %err, "file failed");
                if !args.continue_on_error {
                    pb.abandon();
                    return Err(err);
                }
                outcomes.push(FileOutcome {
                    path: path.display().to_string(),
                    success: false,
                    bills: 0,
                    confidence: 0.0,
                    error: Some(err.to_string()),
                    processing_time_ms,
                });
            }
        }
        pb.inc(1);
    }
    pb.finish_with_message("Done");

    let succeeded = outcomes.iter().filter(|o| o.success).count();
    let summary = BatchSummary {
        generated_at: chrono::Utc::now(),
        total: outcomes.len(),
        succeeded,
        failed: outcomes.len() - succeeded,
        files: outcomes,
    };

    if args.summary {
        let json = serde_json::to_string_pretty(&summary)?;
        match args.output_dir {
            Some(ref output_dir) => fs::write(output_dir.join("summary.json"), json)?,
            None => println!("{json}"),
        }
    }

    println!(
        "{} {}/{} files extracted in {:.1}s",
        style("✓").green(),
        summary.succeeded,
        summary.total,
        start.elapsed().as_secs_f32()
    );
    Ok(())
}

fn process_file(
    path: &PathBuf,
    orchestrator: &Orchestrator,
    language: Option<Language>,
) -> anyhow::Result<ExtractionResult> {
    let data = fs::read(path)?;
    let decoded = PlainTextDecoder.decode(&data)?;

    let ctx = ExtractionContext {
        text: decoded.clean.then_some(decoded.text),
        language,
        raw_data: Some(data),
        source: BillSource {
            kind: SourceKind::Pdf,
            locator: path.display().to_string(),
        },
        ..Default::default()
    };
    Ok(orchestrator.extract(&ctx)?)
}
