//! Folding and similarity scoring for Turkish registry text.

use similar::TextDiff;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Fold text for comparison: uppercase, strip diacritics, collapse spaces.
///
/// `ı`, `i` and `İ` all fold to `I`; `Ş`, `Ç`, `Ğ`, `Ö` and `Ü` lose their
/// marks.
pub fn fold(text: &str) -> String {
    let upper: String = text.chars().flat_map(char::to_uppercase).collect();
    let stripped: String = upper.nfd().filter(|c| !is_combining_mark(*c)).collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Character-level similarity ratio in `[0, 1]`.
///
/// `2 * matches / (len(a) + len(b))`; two empty strings are identical.
pub fn ratio(a: &str, b: &str) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    f64::from(TextDiff::from_chars(a, b).ratio())
}

/// Similarity of two texts after folding both.
pub fn folded_ratio(a: &str, b: &str) -> f64 {
    ratio(&fold(a), &fold(b))
}

/// Turkish-aware uppercase (`i` → `İ`, `ı` → `I`).
pub fn upper_tr(text: &str) -> String {
    text.chars()
        .flat_map(|c| match c {
            'i' => vec!['İ'],
            'ı' => vec!['I'],
            other => other.to_uppercase().collect(),
        })
        .collect()
}

/// Turkish-aware lowercase (`İ` → `i`, `I` → `ı`).
pub fn lower_tr(text: &str) -> String {
    text.chars()
        .flat_map(|c| match c {
            'İ' => vec!['i'],
            'I' => vec!['ı'],
            other => other.to_lowercase().collect(),
        })
        .collect()
}

/// Capitalize a word: first letter upper, the rest lower.
pub fn capitalize_tr(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => {
            let mut out = upper_tr(&first.to_string());
            out.push_str(&lower_tr(chars.as_str()));
            out
        }
        None => String::new(),
    }
}

/// Whether the text has cased letters and none of them are lowercase.
pub fn is_all_uppercase(text: &str) -> bool {
    let mut cased = false;
    for c in text.chars() {
        if c.is_lowercase() {
            return false;
        }
        if c.is_uppercase() {
            cased = true;
        }
    }
    cased
}
