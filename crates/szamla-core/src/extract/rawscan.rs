//! Degraded byte-scan text recovery.
//!
//! When the primary decoder fails to produce clean text, uncompressed PDF
//! content streams still carry show-text operands as parenthesis-delimited
//! literal strings. This scanner recovers those literals as a best-effort
//! text source. It assumes the sampled format's encoding (8-bit literals,
//! backslash escapes) and is not expected to generalize beyond it.

/// Scan raw bytes for parenthesis-delimited literal strings.
///
/// Literals separated by a newline in the surrounding bytes start a new
/// output line; literals on the same stream line are joined with a space,
/// which keeps label/value adjacency for line-anchored rules.
pub fn scan_literal_strings(data: &[u8]) -> String {
    let mut out = String::new();
    let mut i = 0;
    let mut gap_had_newline = false;

    while i < data.len() {
        match data[i] {
            b'(' => {
                let (literal, next) = read_literal(data, i + 1);
                if let Some(text) = printable_literal(&literal) {
                    if !out.is_empty() {
                        out.push(if gap_had_newline { '\n' } else { ' ' });
                    }
                    out.push_str(&text);
                    gap_had_newline = false;
                }
                i = next;
            }
            b'\n' | b'\r' => {
                gap_had_newline = true;
                i += 1;
            }
            _ => i += 1,
        }
    }

    out
}

/// Read one literal starting after `(`, honoring nesting and backslash
/// escapes. Returns the raw bytes and the index after the closing `)`.
fn read_literal(data: &[u8], mut i: usize) -> (Vec<u8>, usize) {
    let mut bytes = Vec::new();
    let mut depth = 1usize;

    while i < data.len() {
        match data[i] {
            b'\\' if i + 1 < data.len() => {
                let escaped = data[i + 1];
                match escaped {
                    b'n' => bytes.push(b'\n'),
                    b'r' => bytes.push(b'\r'),
                    b't' => bytes.push(b'\t'),
                    b'(' | b')' | b'\\' => bytes.push(escaped),
                    other => bytes.push(other),
                }
                i += 2;
            }
            b'(' => {
                depth += 1;
                bytes.push(b'(');
                i += 1;
            }
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return (bytes, i + 1);
                }
                bytes.push(b')');
                i += 1;
            }
            other => {
                bytes.push(other);
                i += 1;
            }
        }
    }

    (bytes, i)
}

/// Decode a literal's bytes when they look like text: valid UTF-8 (or Latin
/// fallback) with a high printable ratio and some minimum length.
fn printable_literal(bytes: &[u8]) -> Option<String> {
    if bytes.len() < 2 {
        return None;
    }

    let text = match std::str::from_utf8(bytes) {
        Ok(s) => s.to_string(),
        // Sampled streams fall back to 8-bit Latin text.
        Err(_) => bytes.iter().map(|&b| b as char).collect(),
    };

    let total = text.chars().count();
    let printable = text
        .chars()
        .filter(|c| !c.is_control() || *c == '\t')
        .count();
    if total == 0 || (printable as f32 / total as f32) < 0.8 {
        return None;
    }

    let trimmed = text.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
