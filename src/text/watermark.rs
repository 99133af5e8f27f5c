//! Watermark removal.
//!
//! Certificates printed for information only carry a diagonal
//! "BİLGİ AMAÇLIDIR" watermark. Text extraction interleaves its glyphs with
//! real content, so stray capitals such as `B`, `İ` or `L` show up inside
//! dates, journal numbers and names.

use lazy_static::lazy_static;
use regex::Regex;

/// The watermark phrase.
pub const WATERMARK_PHRASE: &str = "BİLGİ AMAÇLIDIR";

lazy_static! {
    static ref PHRASE_RE: Regex = Regex::new(r"(?i)B[İI]LG[İI]\s*AMA[ÇC]LIDIR").unwrap();
    static ref WORD_RE: Regex = Regex::new(r"(?i)\b(?:B[İI]LG[İI]|AMA[ÇC]LIDIR)\b").unwrap();
    static ref SPACES_RE: Regex = Regex::new(r"\s+").unwrap();
}

/// Whether a character belongs to the watermark alphabet.
pub fn is_watermark_char(c: char) -> bool {
    let upper: String = super::similarity::upper_tr(&c.to_string());
    let mut chars = upper.chars();
    match (chars.next(), chars.next()) {
        (Some(u), None) => {
            matches!(u, 'B' | 'İ' | 'L' | 'G' | 'A' | 'M' | 'Ç' | 'I' | 'D' | 'R')
        }
        _ => false,
    }
}

fn is_separator(c: char) -> bool {
    c.is_ascii_digit() || matches!(c, ':' | '.' | '/' | '-')
}

/// Collapse whitespace runs to single spaces and trim.
pub fn collapse_whitespace(text: &str) -> String {
    SPACES_RE.replace_all(text.trim(), " ").into_owned()
}

/// Remove the watermark phrase, however it was spaced.
pub fn strip_phrase(text: &str) -> String {
    collapse_whitespace(&PHRASE_RE.replace_all(text, " "))
}

/// Remove watermark glyphs wedged between digits or separators.
///
/// A watermark character is dropped only when both neighbours (ignoring
/// spaces) are digits or one of `:./-`, so `12B.03.2020` becomes
/// `12.03.2020` while `A Blok` is left alone.
pub fn strip_embedded(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    let mut out = String::with_capacity(text.len());
    for (i, &c) in chars.iter().enumerate() {
        if is_watermark_char(c) {
            let prev = chars[..i].iter().rev().find(|c| !c.is_whitespace());
            let next = chars[i + 1..].iter().find(|c| !c.is_whitespace());
            if let (Some(&p), Some(&n)) = (prev, next) {
                if is_separator(p) && is_separator(n) {
                    continue;
                }
            }
        }
        out.push(c);
    }
    out
}

/// Drop standalone single-letter watermark tokens.
///
/// More aggressive than [`strip_embedded`]: used where the text is known
/// to be an institution name rather than free content.
pub fn drop_watermark_letters(text: &str) -> String {
    text.split_whitespace()
        .filter(|w| {
            let mut chars = w.chars();
            !matches!((chars.next(), chars.next()), (Some(c), None) if is_watermark_char(c))
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Drop single-letter watermark tokens sitting between numeric tokens.
///
/// Token-level counterpart of [`strip_embedded`]: `12-03-2020 B 10:15`
/// loses the `B`, while `3/B/12` and `A Blok` are untouched.
pub fn strip_flanked_tokens(text: &str) -> String {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    let mut kept = Vec::with_capacity(tokens.len());
    for (i, token) in tokens.iter().enumerate() {
        let mut chars = token.chars();
        if let (Some(c), None) = (chars.next(), chars.next()) {
            let prev = i.checked_sub(1).and_then(|p| tokens[p].chars().last());
            let next = tokens.get(i + 1).and_then(|n| n.chars().next());
            if is_watermark_char(c)
                && prev.is_some_and(is_separator)
                && next.is_some_and(is_separator)
            {
                continue;
            }
        }
        kept.push(*token);
    }
    kept.join(" ")
}

/// Full watermark cleanup for cell text.
pub fn strip_watermark(text: &str) -> String {
    strip_flanked_tokens(&strip_phrase(text))
}

/// Cleanup for journal cells: embedded glyphs, then the phrase and its words.
pub fn strip_for_journal(text: &str) -> String {
    let text = strip_embedded(text);
    let text = PHRASE_RE.replace_all(&text, " ");
    collapse_whitespace(&WORD_RE.replace_all(&text, " "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_watermark_alphabet() {
        for c in ['B', 'i', 'İ', 'l', 'G', 'a', 'M', 'ç', 'I', 'ı', 'D', 'r'] {
            assert!(is_watermark_char(c), "{}", c);
        }
        for c in ['K', 'x', '1', 'Ş'] {
            assert!(!is_watermark_char(c), "{}", c);
        }
    }

    #[test]
    fn test_strip_embedded_keeps_legit_letters() {
        assert_eq!(strip_embedded("12B.03.2020"), "12.03.2020");
        assert_eq!(strip_embedded("14:3L5 - 1234"), "14:35 - 1234");
        assert_eq!(strip_embedded("05-İ-06"), "05--06");
        assert_eq!(strip_embedded("A Blok"), "A Blok");
        assert_eq!(strip_embedded("Daire 3 / B"), "Daire 3 / B");
    }

    #[test]
    fn test_strip_phrase_variants() {
        assert_eq!(strip_phrase("Mesken BİLGİ AMAÇLIDIR"), "Mesken");
        assert_eq!(strip_phrase("BİLGİAMAÇLIDIR Arsa"), "Arsa");
    }

    #[test]
    fn test_drop_watermark_letters() {
        assert_eq!(
            drop_watermark_letters("Türkiye İ İş L Bankası A.Ş."),
            "Türkiye İş Bankası A.Ş."
        );
    }

    #[test]
    fn test_strip_watermark_cell() {
        assert_eq!(
            strip_watermark("Ankara  Tapu   12-03-2020 B 10:15 BİLGİ AMAÇLIDIR"),
            "Ankara Tapu 12-03-2020 10:15"
        );
        assert_eq!(strip_watermark("12-03-2020-B-1234"), "12-03-2020-B-1234");
        assert_eq!(strip_watermark("B/1/A/5"), "B/1/A/5");
    }

    #[test]
    fn test_strip_for_journal() {
        assert_eq!(
            strip_for_journal("Bakırköy - 12-0İ3-2020 10:15 - 4567 BİLGİ"),
            "Bakırköy - 12-03-2020 10:15 - 4567"
        );
    }
}
