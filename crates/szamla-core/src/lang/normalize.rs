//! Text normalization applied before pattern matching.

use super::Language;

/// Hungarian abbreviations expanded so one rule matches both forms.
const HUNGARIAN_ABBREVIATIONS: &[(&str, &str)] = &[
    ("jan.", "január"),
    ("febr.", "február"),
    ("márc.", "március"),
    ("ápr.", "április"),
    ("máj.", "május"),
    ("jún.", "június"),
    ("júl.", "július"),
    ("aug.", "augusztus"),
    ("szept.", "szeptember"),
    ("okt.", "október"),
    ("nov.", "november"),
    ("dec.", "december"),
    ("szla.", "számla"),
    ("szla ", "számla "),
    ("ssz.", "sorszám"),
    ("hat.idő", "határidő"),
];

const ENGLISH_ABBREVIATIONS: &[(&str, &str)] = &[
    ("jan.", "january"),
    ("feb.", "february"),
    ("mar.", "march"),
    ("apr.", "april"),
    ("jun.", "june"),
    ("jul.", "july"),
    ("aug.", "august"),
    ("sep.", "september"),
    ("sept.", "september"),
    ("oct.", "october"),
    ("nov.", "november"),
    ("dec.", "december"),
    ("inv.", "invoice"),
    ("acct.", "account"),
    ("no.", "number"),
];

/// Normalize raw document text for matching.
///
/// Collapses horizontal whitespace within lines, maps typographic punctuation
/// to ASCII equivalents, and expands known month/billing abbreviations for
/// the given language. Newlines are preserved since several rules are
/// line-anchored.
pub fn normalize_text(text: &str, language: Language) -> String {
    let mut out = String::with_capacity(text.len());

    for line in text.lines() {
        let mut cleaned = String::with_capacity(line.len());
        let mut last_was_space = true;
        for ch in line.chars() {
            let mapped = match ch {
                '\u{00a0}' | '\u{2007}' | '\u{202f}' | '\t' => ' ',
                '\u{2013}' | '\u{2014}' => '-',
                '\u{2018}' | '\u{2019}' => '\'',
                '\u{201c}' | '\u{201d}' | '\u{201e}' => '"',
                other => other,
            };
            if mapped == ' ' {
                if !last_was_space {
                    cleaned.push(' ');
                }
                last_was_space = true;
            } else {
                cleaned.push(mapped);
                last_was_space = false;
            }
        }
        out.push_str(cleaned.trim_end());
        out.push('\n');
    }

    let abbreviations = match language {
        Language::Hungarian => HUNGARIAN_ABBREVIATIONS,
        Language::English => ENGLISH_ABBREVIATIONS,
    };

    let lower = out.to_lowercase();
    for (abbrev, expansion) in abbreviations {
        if lower.contains(abbrev) {
            out = replace_case_insensitive(&out, abbrev, expansion);
        }
    }

    out.trim_end().to_string()
}

/// Case-insensitive literal replacement. Abbreviation tables are small and
/// most texts contain none of them, so a scan per hit is fine.
///
/// Lowercasing can change byte lengths (İ, ẞ), so matches found in the
/// lowered copy are mapped back through a per-byte offset table instead of
/// reusing the lowered offsets directly.
fn replace_case_insensitive(text: &str, needle: &str, replacement: &str) -> String {
    let needle_lower = needle.to_lowercase();

    // Lowered copy plus, per lowered byte, the originating byte offset.
    let mut lower = String::with_capacity(text.len());
    let mut origin = Vec::with_capacity(text.len() + 1);
    for (offset, ch) in text.char_indices() {
        for lc in ch.to_lowercase() {
            for _ in 0..lc.len_utf8() {
                origin.push(offset);
            }
            lower.push(lc);
        }
    }
    origin.push(text.len());

    let mut result = String::with_capacity(text.len());
    let mut pos = 0;
    let mut copied = 0;

    while let Some(found) = lower[pos..].find(&needle_lower) {
        let start = pos + found;
        let end = start + needle_lower.len();
        let orig_start = origin[start];
        let orig_end = origin[end];
        // A match ending inside one char's multi-char expansion has no clean
        // original boundary; leave that occurrence alone.
        if end < lower.len() && origin[end] == origin[end - 1] {
            pos = end;
            continue;
        }
        result.push_str(&text[copied..orig_start]);
        result.push_str(replacement);
        copied = orig_end;
        pos = end;
    }
    result.push_str(&text[copied..]);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_whitespace_preserving_lines() {
        let text = "Fizetendő   összeg:\t6.364 Ft\nHatáridő:  2025.05.05";
        let normalized = normalize_text(text, Language::Hungarian);
        assert_eq!(normalized, "Fizetendő összeg: 6.364 Ft\nHatáridő: 2025.05.05");
    }

    #[test]
    fn expands_hungarian_month_abbreviation() {
        let normalized = normalize_text("Határidő: 2025. máj. 5.", Language::Hungarian);
        assert!(normalized.contains("május"));
    }

    #[test]
    fn expands_english_abbreviations() {
        let normalized = normalize_text("Inv. no. 12345 due Oct. 1, 2025", Language::English);
        assert!(normalized.contains("invoice"));
        assert!(normalized.contains("october"));
    }

    #[test]
    fn length_changing_lowercase_does_not_corrupt_replacement() {
        // 'İ' lowercases to two chars (3 bytes from 2), shifting every later
        // offset in the lowered copy.
        let normalized = normalize_text("İstanbul office inv. no. 7 due Oct. 1", Language::English);
        assert!(normalized.starts_with("İstanbul"));
        assert!(normalized.contains("invoice"));
        assert!(normalized.contains("number"));
        assert!(normalized.contains("october"));
    }

    #[test]
    fn maps_nbsp_and_dashes() {
        let normalized = normalize_text("175\u{00a0}945 Ft \u{2013} fizetve", Language::Hungarian);
        assert_eq!(normalized, "175 945 Ft - fizetve");
    }
}
