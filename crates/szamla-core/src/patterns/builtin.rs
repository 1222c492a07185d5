//! Built-in pattern presets embedded at compile time.

use crate::error::{PatternError, Result};

use super::schema::{BillPatternDef, PatternFile};

const HU_PATTERNS_JSON: &str = include_str!("../../patterns/hu.json");
const EN_PATTERNS_JSON: &str = include_str!("../../patterns/en.json");

/// All built-in pattern records, Hungarian presets first.
pub fn builtin_patterns() -> Result<Vec<BillPatternDef>> {
    let mut defs = Vec::new();
    for json in [HU_PATTERNS_JSON, EN_PATTERNS_JSON] {
        let file: PatternFile = serde_json::from_str(json).map_err(PatternError::Parse)?;
        defs.extend(file.patterns);
    }
    Ok(defs)
}
