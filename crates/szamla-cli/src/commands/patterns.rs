//! Patterns command - inspect and validate extraction patterns.

use std::path::PathBuf;

use clap::{Args, Subcommand};
use console::style;

use szamla_core::patterns::PatternRegistry;

/// Arguments for the patterns command.
#[derive(Args)]
pub struct PatternsArgs {
    #[command(subcommand)]
    command: PatternsCommand,
}

#[derive(Subcommand)]
enum PatternsCommand {
    /// List the built-in pattern presets
    List,

    /// Validate a pattern file against the registry rules
    Validate {
        /// Pattern file (JSON)
        file: PathBuf,
    },
}

pub async fn run(args: PatternsArgs) -> anyhow::Result<()> {
    match args.command {
        PatternsCommand::List => list_patterns(),
        PatternsCommand::Validate { file } => validate_file(&file),
    }
}

fn list_patterns() -> anyhow::Result<()> {
    let registry = PatternRegistry::with_builtin()?;

    println!("{} built-in patterns:", registry.len());
    for pattern in registry.get_all() {
        let fields: Vec<&str> = pattern.fields().map(|f| f.name()).collect();
        println!(
            "  {} [{}] {} ({})",
            style(&pattern.id).cyan(),
            pattern.language,
            pattern.name,
            fields.join(", ")
        );
    }
    Ok(())
}

fn validate_file(file: &PathBuf) -> anyhow::Result<()> {
    // Validating on top of the presets also catches id collisions with them.
    let mut registry = PatternRegistry::with_builtin()?;
    match registry.load_file(file) {
        Ok(count) => {
            println!(
                "{} {} valid pattern(s) in {}",
                style("✓").green(),
                count,
                file.display()
            );
            Ok(())
        }
        Err(err) => {
            eprintln!("{} {}", style("✗").red(), err);
            anyhow::bail!("pattern file is invalid")
        }
    }
}
