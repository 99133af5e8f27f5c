//! Section header detection.
//!
//! Two passes per document. The lexicon pass records every span containing
//! a known section name. The learned pass then derives the dominant font and
//! size of those headers and accepts further spans that share the signature
//! and look like headers (left-aligned, uppercase, "... BİLGİLERİ").

use lazy_static::lazy_static;
use regex::Regex;

use crate::model::{DocumentLayout, HeaderRecord, HeaderSet, HeaderSignature, HeaderSource, Span};
use crate::text::is_all_uppercase;

/// Known section names, in match order.
pub const SECTION_LEXICON: &[&str] = &[
    "TAPU KAYIT BİLGİSİ",
    "TEFERRUAT BİLGİLERİ",
    "MUHDESAT BİLGİLERİ",
    "MÜLKİYET BİLGİLERİ",
    "MÜLKİYETE AİT ŞERH BEYAN İRTİFAK BİLGİLERİ",
    "MÜLKİYETE AİT REHİN BİLGİLERİ",
    "EKLENTİ BİLGİLERİ",
    "TAŞINMAZA AİT ŞERH BEYAN İRTİFAK BİLGİLERİ",
];

/// The identity section every certificate starts with.
pub const IDENTITY_SECTION: &str = "TAPU KAYIT BİLGİSİ";

/// The ownership section.
pub const OWNERSHIP_SECTION: &str = "MÜLKİYET BİLGİLERİ";

lazy_static! {
    static ref WATERMARK_RE: Regex = Regex::new(r"(?i)B[İI]LG[İI] AMA[ÇC]LIDIR").unwrap();
    static ref SPACES_RE: Regex = Regex::new(r" {2,}").unwrap();
    static ref SUFFIX_RE: Regex = Regex::new(r"BİLGİ(LERİ)?$").unwrap();
    static ref EXCLUSIONS: Vec<Regex> = [
        r"(?i)\(SN:\d+\)",
        r"(?i)\d{8}-\d+-\w+",
        r"(?i)^BU BELGE TOPLAM",
        r"(?i)^Kaydı Oluşturan",
        r"(?i)\bTABLO\b",
        r"(?i)\d+\s*/\s*\d+",
    ]
    .iter()
    .map(|p| Regex::new(p).unwrap())
    .collect();
}

/// Clean span text for header matching.
pub fn clean_header_text(text: &str) -> String {
    let text = WATERMARK_RE.replace_all(text, "");
    let text = text.replace("- ", "");
    SPACES_RE.replace_all(&text, " ").trim().to_string()
}

/// Header classifier configuration.
#[derive(Debug, Clone)]
pub struct HeaderClassifierConfig {
    /// Allowed size deviation from the majority size
    pub size_tolerance: f64,
    /// Rightmost x origin for learned headers
    pub max_x: f64,
    /// Minimum word count for learned headers
    pub min_words: usize,
}

impl Default for HeaderClassifierConfig {
    fn default() -> Self {
        Self {
            size_tolerance: 1.0,
            max_x: 50.0,
            min_words: 3,
        }
    }
}

/// Detects section headers in a document.
pub struct HeaderClassifier {
    config: HeaderClassifierConfig,
}

impl HeaderClassifier {
    /// Create a classifier with default configuration.
    pub fn new() -> Self {
        Self {
            config: HeaderClassifierConfig::default(),
        }
    }

    /// Create a classifier with custom configuration.
    pub fn with_config(config: HeaderClassifierConfig) -> Self {
        Self { config }
    }

    /// Detect headers in every page of the document.
    pub fn classify(&self, doc: &DocumentLayout) -> HeaderSet {
        let mut set = HeaderSet::new();
        let mut lexicon_spans: Vec<&Span> = Vec::new();

        // Pass 1: lexicon
        for page in &doc.pages {
            for span in &page.spans {
                let cleaned = clean_header_text(&span.text);
                let mut matched = false;
                for name in SECTION_LEXICON {
                    if cleaned.contains(name) {
                        matched = true;
                        if !set.contains_on_page(name, page.number) {
                            set.insert(
                                HeaderRecord::new(*name, page.number, span.y)
                                    .with_x(span.x)
                                    .with_font(span.font.clone(), span.size),
                            );
                        }
                    }
                }
                if matched {
                    lexicon_spans.push(span);
                }
            }
        }
        log::debug!("HeaderClassifier: {} lexicon headers", set.len());

        // Pass 2: learned signature
        let Some(signature) = majority_signature(&lexicon_spans) else {
            log::debug!("HeaderClassifier: no lexicon headers, skipping learned pass");
            return set;
        };
        log::debug!(
            "HeaderClassifier: signature {} @ {:.1}",
            signature.font,
            signature.size
        );

        for page in &doc.pages {
            for span in &page.spans {
                let cleaned = clean_header_text(&span.text);
                if cleaned.is_empty() || set.contains_name(&cleaned) {
                    continue;
                }
                if self.accepts(span, &cleaned, &signature) {
                    log::debug!(
                        "HeaderClassifier: learned header '{}' on page {}",
                        cleaned,
                        page.number
                    );
                    set.insert(
                        HeaderRecord::new(cleaned, page.number, span.y)
                            .with_x(span.x)
                            .with_font(span.font.clone(), span.size)
                            .with_source(HeaderSource::Learned),
                    );
                }
            }
        }

        set.signature = Some(signature);
        set
    }

    /// Whether a span not in the lexicon qualifies as a learned header.
    pub fn accepts(&self, span: &Span, cleaned: &str, signature: &HeaderSignature) -> bool {
        span.font == signature.font
            && (span.size - signature.size).abs() <= self.config.size_tolerance
            && (0.0..=self.config.max_x).contains(&span.x)
            && is_all_uppercase(cleaned)
            && SUFFIX_RE.is_match(cleaned)
            && cleaned.split_whitespace().count() >= self.config.min_words
            && !EXCLUSIONS.iter().any(|re| re.is_match(cleaned))
    }
}

impl Default for HeaderClassifier {
    fn default() -> Self {
        Self::new()
    }
}

/// Most frequent font and size; ties go to the value seen first.
fn majority_signature(spans: &[&Span]) -> Option<HeaderSignature> {
    fn mode<T: PartialEq + Clone>(values: impl Iterator<Item = T>) -> Option<T> {
        let mut counts: Vec<(T, usize)> = Vec::new();
        for value in values {
            match counts.iter_mut().find(|(v, _)| *v == value) {
                Some((_, n)) => *n += 1,
                None => counts.push((value, 1)),
            }
        }
        let mut best: Option<(T, usize)> = None;
        for (value, n) in counts {
            if best.as_ref().map_or(true, |(_, b)| n > *b) {
                best = Some((value, n));
            }
        }
        best.map(|(v, _)| v)
    }

    Some(HeaderSignature {
        font: mode(spans.iter().map(|s| s.font.clone()))?,
        size: mode(spans.iter().map(|s| s.size))?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PageLayout;

    const BOLD: &str = "Arial-BoldMT";

    fn doc() -> DocumentLayout {
        let page1 = PageLayout::a4_landscape(1)
            .with_span(Span::new("TAPU KAYIT BİLGİSİ", BOLD, 9.0, 30.0, 50.0))
            .with_span(Span::new("MÜLKİYET BİLGİLERİ", BOLD, 9.0, 30.0, 300.0))
            .with_span(Span::new("Zemin Tipi:", "ArialMT", 8.0, 30.0, 70.0))
            .with_span(Span::new("YÖNETİM PLANI BİLGİLERİ", BOLD, 9.2, 30.0, 400.0));
        let page2 = PageLayout::a4_landscape(2)
            .with_span(Span::new("MÜLKİYET BİLGİLERİ", BOLD, 9.0, 30.0, 40.0))
            .with_span(Span::new("MÜLKİYET BİLGİLERİ", BOLD, 9.0, 30.0, 90.0))
            .with_span(Span::new("KAT İRTİFAKI BİLGİLERİ", "ArialMT", 9.0, 30.0, 200.0))
            .with_span(Span::new("ARSA PAYI 12/480 BİLGİLERİ", BOLD, 9.0, 30.0, 250.0))
            .with_span(Span::new("ORTAK ALAN BİLGİLERİ", BOLD, 9.0, 300.0, 260.0))
            .with_span(Span::new("YÖNETİM PLANI BİLGİLERİ", BOLD, 9.0, 30.0, 500.0));
        DocumentLayout::new(vec![page1, page2])
    }

    #[test]
    fn test_signature_counts_each_span_once() {
        let page = PageLayout::a4_landscape(1)
            .with_span(Span::new(
                "TEFERRUAT BİLGİLERİ MUHDESAT BİLGİLERİ",
                "Times-Bold",
                10.0,
                30.0,
                50.0,
            ))
            .with_span(Span::new("MÜLKİYET BİLGİLERİ", BOLD, 9.0, 30.0, 100.0))
            .with_span(Span::new("EKLENTİ BİLGİLERİ", BOLD, 9.0, 30.0, 150.0));
        let set = HeaderClassifier::new().classify(&DocumentLayout::new(vec![page]));

        assert_eq!(set.len(), 4);
        let signature = set.signature.as_ref().unwrap();
        assert_eq!(signature.font, BOLD);
        assert_eq!(signature.size, 9.0);
    }

    #[test]
    fn test_clean_header_text() {
        assert_eq!(
            clean_header_text("TAPU  KAYIT BİLGİSİ BİLGİ AMAÇLIDIR"),
            "TAPU KAYIT BİLGİSİ"
        );
        assert_eq!(clean_header_text("- MÜLKİYET BİLGİLERİ"), "MÜLKİYET BİLGİLERİ");
    }

    #[test]
    fn test_lexicon_first_occurrence_per_page() {
        let set = HeaderClassifier::new().classify(&doc());
        let ownership: Vec<_> = set
            .records()
            .iter()
            .filter(|r| r.name == "MÜLKİYET BİLGİLERİ")
            .map(|r| (r.page, r.y))
            .collect();
        assert_eq!(ownership, vec![(1, 300.0), (2, 40.0)]);
    }

    #[test]
    fn test_learned_headers() {
        let set = HeaderClassifier::new().classify(&doc());
        let signature = set.signature.clone().unwrap();
        assert_eq!(signature.font, BOLD);
        assert_eq!(signature.size, 9.0);

        let learned: Vec<_> = set
            .records()
            .iter()
            .filter(|r| r.source == HeaderSource::Learned)
            .map(|r| (r.name.as_str(), r.page))
            .collect();
        // Wrong font, page fraction, and x > 50 are all rejected; the second
        // occurrence of a learned name is not re-recorded.
        assert_eq!(learned, vec![("YÖNETİM PLANI BİLGİLERİ", 1)]);
    }

    #[test]
    fn test_no_lexicon_no_learning() {
        let doc = DocumentLayout::new(vec![PageLayout::a4_landscape(1)
            .with_span(Span::new("YÖNETİM PLANI BİLGİLERİ", BOLD, 9.0, 30.0, 400.0))]);
        let set = HeaderClassifier::new().classify(&doc);
        assert!(set.is_empty());
        assert!(set.signature.is_none());
    }

    #[test]
    fn test_exclusions() {
        let classifier = HeaderClassifier::new();
        let signature = HeaderSignature {
            font: BOLD.to_string(),
            size: 9.0,
        };
        let span = |text: &str| Span::new(text, BOLD, 9.0, 30.0, 10.0);
        assert!(classifier.accepts(&span("x"), "YÖNETİM PLANI BİLGİLERİ", &signature));
        assert!(!classifier.accepts(&span("x"), "EK TABLO BİLGİLERİ", &signature));
        assert!(!classifier.accepts(&span("x"), "HİSSE (SN:12) BİLGİSİ", &signature));
        assert!(!classifier.accepts(&span("x"), "PLAN BİLGİLERİ", &signature));
        assert!(!classifier.accepts(&span("x"), "Yönetim Planı Bilgileri", &signature));
    }
}
