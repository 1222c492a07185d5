//! CLI application for multilingual bill data extraction.

mod commands;

use clap::{Parser, Subcommand};
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use commands::{batch, extract, patterns, serve};

/// Bill data extraction - pull amounts, due dates, and vendors out of bills
#[derive(Parser)]
#[command(name = "szamla")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Path to config file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract bill data from a single file
    Extract(extract::ExtractArgs),

    /// Extract bill data from multiple files
    Batch(batch::BatchArgs),

    /// Inspect and validate extraction patterns
    Patterns(patterns::PatternsArgs),

    /// Serve the chunked-transfer protocol over stdin/stdout
    Serve(serve::ServeArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    // Execute command
    match cli.command {
        Commands::Extract(args) => extract::run(args, cli.config.as_deref()).await,
        Commands::Batch(args) => batch::run(args, cli.config.as_deref()).await,
        Commands::Patterns(args) => patterns::run(args).await,
        Commands::Serve(args) => serve::run(args, cli.config.as_deref()).await,
    }
}
