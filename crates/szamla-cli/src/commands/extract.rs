//! Extract command - pull bill data from a single file.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use tracing::info;

use szamla_core::decode::{DocumentDecoder, PlainTextDecoder};
use szamla_core::models::{BillSource, SourceKind};
use szamla_core::{ExtractionContext, ExtractionResult, Language};

/// Arguments for the extract command.
#[derive(Args)]
pub struct ExtractArgs {
    /// Input file (PDF or text)
    #[arg(required = true)]
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,

    /// Language hint (hu, en); auto-detected when omitted
    #[arg(short, long)]
    language: Option<String>,

    /// Message subject, for subject-gated patterns
    #[arg(short, long)]
    subject: Option<String>,

    /// Extra pattern files to load on top of the built-in presets
    #[arg(short, long)]
    patterns: Vec<PathBuf>,

    /// Show extraction confidence
    #[arg(long)]
    show_confidence: bool,

    /// Record and print the strategy trace
    #[arg(long)]
    trace: bool,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output
    Json,
    /// Plain text summary
    Text,
}

pub async fn run(args: ExtractArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();

    let mut config = super::load_config(config_path)?;
    if args.trace {
        config.extraction.debug_trace = true;
    }

    if !args.input.exists() {
        anyhow::bail!("Input file not found: {}", args.input.display());
    }

    info!("Processing file: {}", args.input.display());

    let orchestrator = super::build_orchestrator(&config, &args.patterns)?;
    let ctx = build_context(&args)?;
    let result = orchestrator.extract(&ctx)?;

    if args.trace {
        if let Some(trace) = &result.debug {
            eprintln!("{}", style("Strategy trace:").cyan());
            for attempt in &trace.attempts {
                eprintln!(
                    "  {} confidence {:.2} {}",
                    attempt.strategy,
                    attempt.confidence,
                    if attempt.accepted { "(accepted)" } else { "" }
                );
            }
        }
    }

    let output = format_result(&result, args.format)?;

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{output}");
    }

    if args.show_confidence {
        println!();
        println!(
            "{} Extraction confidence: {:.1}%",
            style("ℹ").blue(),
            result.confidence * 100.0
        );
        println!(
            "{} Processing time: {}ms",
            style("ℹ").blue(),
            start.elapsed().as_millis()
        );
    }

    if !result.success {
        anyhow::bail!("No bill data could be extracted");
    }
    Ok(())
}

fn build_context(args: &ExtractArgs) -> anyhow::Result<ExtractionContext> {
    let data = fs::read(&args.input)?;
    let decoded = PlainTextDecoder.decode(&data)?;

    let language = args
        .language
        .as_deref()
        .map(Language::from_code)
        .transpose()?;

    let mut ctx = ExtractionContext {
        text: decoded.clean.then_some(decoded.text),
        language,
        raw_data: Some(data),
        source: BillSource {
            kind: SourceKind::Pdf,
            locator: args.input.display().to_string(),
        },
        ..Default::default()
    };
    if let Some(subject) = &args.subject {
        ctx = ctx.with_subject(subject.clone());
    }
    Ok(ctx)
}

pub fn format_result(result: &ExtractionResult, format: OutputFormat) -> anyhow::Result<String> {
    match format {
        OutputFormat::Json => Ok(serde_json::to_string_pretty(result)?),
        OutputFormat::Text => {
            let mut out = String::new();
            for (i, bill) in result.bills.iter().enumerate() {
                out.push_str(&format!("Bill {}:\n", i + 1));
                for (field, value) in &bill.fields {
                    out.push_str(&format!("  {field}: {value}\n"));
                }
                if let Some(confidence) = bill.confidence {
                    out.push_str(&format!("  confidence: {confidence:.2}\n"));
                }
            }
            if result.bills.is_empty() {
                out.push_str("No bills extracted.\n");
            }
            Ok(out)
        }
    }
}
