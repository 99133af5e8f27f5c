//! Free-text normalization with institution resolution.

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::Result;

use super::bank::BankDirectory;
use super::similarity::capitalize_tr;
use super::watermark::{collapse_whitespace, drop_watermark_letters, strip_flanked_tokens, strip_phrase};

/// Default similarity a name must exceed to snap to a directory entry.
pub const DEFAULT_BANK_THRESHOLD: f64 = 0.95;

lazy_static! {
    static ref VKN_RE: Regex = Regex::new(r"VKN\s*:\s*(\d+)").unwrap();
    static ref VKN_LABEL_RE: Regex = Regex::new(r"(?i)VKN\s*:\s*\d+\s*").unwrap();
    static ref SERIAL_RE: Regex = Regex::new(r"\(SN:\d+\)\s*").unwrap();
    /// Column captions that leak into zone text, as whole words.
    static ref COLUMN_LABEL_RE: Regex = Regex::new(
        r"\b(?:Tesis Tarih - Yev|Alacaklı|Müşterek|Borç|Faiz|Derece|Sıra|Süre)\b|\bMi\?"
    )
    .unwrap();
    static ref SHARE_TAIL_RE: Regex = Regex::new(r"(?i)İpoteğin Konulduğu.*$").unwrap();

    /// Company-suffix repairs, applied in order, case-insensitively.
    static ref ABBREVIATION_FIXES: Vec<(Regex, &'static str)> = vec![
        (Regex::new(r"(?i)(^|\s)t\.a\.[şs]\.?(\s|$)").unwrap(), "${1}T.A.Ş.${2}"),
        (Regex::new(r"(?i)(^|\s)\.?t\.a\.o\.?(\s|$)").unwrap(), "${1}T.A.O.${2}"),
        (Regex::new(r"(?i)(^|\s)\.?a\.[şs]\.?(\s|$)").unwrap(), "${1}A.Ş.${2}"),
        (Regex::new(r"(?i)(^|\s)\.[şs]\.(\s|$)").unwrap(), "${1}A.Ş.${2}"),
        (Regex::new(r"(?i)(^|\s)ltd\.\s?[şs](?:t[iİı])?\.?(\s|$)").unwrap(), "${1}Ltd.Şti.${2}"),
    ];
}

/// Apply the company-suffix repairs.
pub fn fix_abbreviations(text: &str) -> String {
    let mut out = text.to_string();
    for (pattern, replacement) in ABBREVIATION_FIXES.iter() {
        // Adjacent matches share a space, so run each rule to a fixpoint.
        loop {
            let next = pattern.replace_all(&out, *replacement).into_owned();
            if next == out {
                break;
            }
            out = next;
        }
    }
    out
}

/// Extract the tax id from a `VKN:` marker.
pub fn extract_vkn(text: &str) -> Option<&str> {
    VKN_RE
        .captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Count `VKN:` markers.
pub fn count_vkn(text: &str) -> usize {
    VKN_RE.find_iter(text).count()
}

/// Text normalizer owning the bank directory.
#[derive(Debug, Clone)]
pub struct TextNormalizer {
    directory: BankDirectory,
    threshold: f64,
}

impl TextNormalizer {
    /// Create a normalizer over a directory.
    pub fn new(directory: BankDirectory) -> Self {
        Self {
            directory,
            threshold: DEFAULT_BANK_THRESHOLD,
        }
    }

    /// Set the fuzzy resolution threshold.
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn directory(&self) -> &BankDirectory {
        &self.directory
    }

    pub fn into_directory(self) -> BankDirectory {
        self.directory
    }

    /// Normalize a free-text fragment.
    ///
    /// With a `VKN:` marker the tax id decides: a known id returns the
    /// directory name; an unknown one has its name extracted from context
    /// and recorded. Without a marker the text is cleaned and snapped to
    /// the closest directory name when it is similar enough.
    pub fn normalize(&mut self, text: &str) -> Result<String> {
        if let Some(vkn) = extract_vkn(text) {
            if let Some(name) = self.directory.get(vkn) {
                return Ok(name.to_string());
            }
            let name = self.institution_name(text);
            if !name.is_empty() {
                let vkn = vkn.to_string();
                self.directory.add(&vkn, &name)?;
                return Ok(name);
            }
        }

        let cleaned = self.general_cleanup(text);
        if cleaned.is_empty() {
            return Ok(cleaned);
        }
        Ok(self
            .directory
            .resolve_similar(&cleaned, self.threshold)
            .map(str::to_string)
            .unwrap_or(cleaned))
    }

    /// Normalize without growing the directory.
    pub fn normalize_readonly(&self, text: &str) -> String {
        if let Some(name) = extract_vkn(text).and_then(|v| self.directory.get(v)) {
            return name.to_string();
        }
        let cleaned = self.general_cleanup(text);
        self.directory
            .resolve_similar(&cleaned, self.threshold)
            .map(str::to_string)
            .unwrap_or(cleaned)
    }

    /// Remove captions and watermark noise, then repair abbreviations.
    pub fn general_cleanup(&self, text: &str) -> String {
        let stripped = strip_phrase(text);
        let text = COLUMN_LABEL_RE.replace_all(&stripped, " ");
        let text = strip_flanked_tokens(&collapse_whitespace(&text));
        fix_abbreviations(&text)
    }

    /// Guess an institution name from the text around a `VKN:` marker.
    pub fn institution_name(&self, text: &str) -> String {
        let text = VKN_LABEL_RE.replace_all(text, " ");
        let text = SERIAL_RE.replace_all(&text, " ");
        let text = SHARE_TAIL_RE.replace(&text, "");
        let text = COLUMN_LABEL_RE.replace_all(&strip_phrase(&text), " ").into_owned();

        let words: Vec<String> = drop_watermark_letters(&text)
            .split_whitespace()
            .map(|w| {
                if w.ends_with('.') {
                    super::similarity::upper_tr(w)
                } else {
                    capitalize_tr(w)
                }
            })
            .collect();

        let mut name = fix_abbreviations(&words.join(" "));
        while name.contains("..") {
            name = name.replace("..", ".");
        }
        let keeps_dot = ["A.Ş.", "T.A.O.", "T.A.Ş.", "Ltd.Şti."]
            .iter()
            .any(|s| name.ends_with(s));
        if !keeps_dot {
            while name.ends_with('.') {
                name.pop();
            }
        }
        name.trim().to_string()
    }
}

impl Default for TextNormalizer {
    fn default() -> Self {
        Self::new(BankDirectory::with_defaults())
    }
}
