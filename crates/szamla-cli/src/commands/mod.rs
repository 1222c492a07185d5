//! CLI subcommand implementations.

pub mod batch;
pub mod extract;
pub mod patterns;
pub mod serve;

use std::path::Path;
use std::sync::Arc;

use szamla_core::models::SzamlaConfig;
use szamla_core::patterns::PatternRegistry;
use szamla_core::Orchestrator;

/// Load configuration from an explicit path, or defaults.
pub fn load_config(config_path: Option<&str>) -> anyhow::Result<SzamlaConfig> {
    match config_path {
        Some(path) => Ok(SzamlaConfig::from_file(Path::new(path))?),
        None => Ok(SzamlaConfig::default()),
    }
}

/// Build a registry from the built-in presets plus any extra pattern files.
pub fn load_registry(extra_patterns: &[std::path::PathBuf]) -> anyhow::Result<PatternRegistry> {
    let mut registry = PatternRegistry::with_builtin()?;
    for path in extra_patterns {
        let count = registry.load_file(path)?;
        tracing::info!(path = %path.display(), count, "loaded extra patterns");
    }
    Ok(registry)
}

/// Build the extraction orchestrator used by every command.
pub fn build_orchestrator(
    config: &SzamlaConfig,
    extra_patterns: &[std::path::PathBuf],
) -> anyhow::Result<Arc<Orchestrator>> {
    let registry = Arc::new(load_registry(extra_patterns)?);
    Ok(Arc::new(Orchestrator::new(registry, config)))
}
