//! Document-level checks and page-one metadata.

use lazy_static::lazy_static;
use regex::Regex;

use crate::error::{Error, Result};
use crate::model::{CertificateInfo, DocumentLayout, ObservationPool, PageLayout};

use super::headers::IDENTITY_SECTION;

/// Labels at least some of which every genuine certificate prints on page one.
pub const MANDATORY_LABELS: &[&str] = &[
    "Zemin Tipi:",
    "Taşınmaz Kimlik No:",
    "İl/İlçe:",
    "Ada/Parsel:",
];

const IDENTITY_LABEL: &str = "Taşınmaz Kimlik No:";

/// Span texts that never anchor a row: portal prose, footers, captions.
const OBSERVATION_SKIP: &[&str] = &[
    "veya Web Tapu anasayfasından",
    "veya Web Tapu",
    "kodunu Online İşlemler",
    "kodunu Online",
    "https://webtapu.tkgm.gov.tr",
    "alanına yazarak doğrulayabilirsiniz",
    "adresinden)",
    "Kaydı Oluşturan:",
    "Bu belgeyi akıllı telefonunuzdan",
    "taratarak;",
    "akıllı telefonunuzdan",
    "BU BELGE TOPLAM",
    "BİLGİ AMAÇLIDIR",
    "İl/İlçe:",
    "Tesis Tarih - Yev",
    "Tesis Kurum Tarih-Yevmiye",
    "Tesis Kurum Tarih-",
    "Tescil Tarih - Yev",
    "Terkin Sebebi-",
    "Zemin Tipi:",
    "Başvuru No",
    "Bağımsız Bölüm Nitelik:",
    "Bağımsız Bölüm Net",
    "Bağımsız Bölüm Brüt",
    "Arsa Pay/Payda:",
];

/// Texts skipped only when they are the whole span.
const OBSERVATION_SKIP_EXACT: &[&str] = &["-", "_", "Ş/B/İ"];

lazy_static! {
    static ref IDENTITY_RE: Regex = Regex::new(r"Taşınmaz Kimlik No:\s*(\d+)").unwrap();
    static ref STAMP_RE: Regex =
        Regex::new(r"Tarih:\s*(\d{1,2}-\d{1,2}-\d{4}-\d{1,2}:\d{2})").unwrap();
    static ref AT_RE: Regex = Regex::new(r"\bAT\b").unwrap();
}

/// Check that the layout is a certificate and return its parcel identity.
pub fn validate_document(doc: &DocumentLayout, min_labels: usize) -> Result<String> {
    let page = doc
        .first_page()
        .ok_or_else(|| Error::MalformedDocument("document has no pages".to_string()))?;
    let text = page.plain_text();

    if !text.contains(IDENTITY_SECTION) {
        return Err(Error::MalformedDocument(format!(
            "{} not found on page one",
            IDENTITY_SECTION
        )));
    }

    let present = MANDATORY_LABELS.iter().filter(|l| text.contains(*l)).count();
    if present < min_labels {
        return Err(Error::MalformedDocument(format!(
            "only {} of {} mandatory labels on page one",
            present,
            MANDATORY_LABELS.len()
        )));
    }

    identity_from_text(&text)
        .or_else(|| identity_from_region(page))
        .ok_or_else(|| Error::MalformedDocument("parcel identity not found".to_string()))
}

/// Identity from the page-one line carrying the label.
///
/// The value sits between the label and the `AT Yüzölçüm` column when both
/// share a line.
pub fn identity_from_text(text: &str) -> Option<String> {
    let line = text.lines().find(|l| l.contains(IDENTITY_LABEL))?;
    let after = line.split(IDENTITY_LABEL).nth(1)?;
    let value = match AT_RE.find(after) {
        Some(m) => &after[..m.start()],
        None => after,
    };
    let digits: String = value
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    (!digits.is_empty()).then_some(digits)
}

/// Identity from the words in the top-left region of page one.
pub fn identity_from_region(page: &PageLayout) -> Option<String> {
    let text = page
        .words_in(0.0, page.width * 0.5, 0.0, page.height * 0.4)
        .map(|w| w.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    IDENTITY_RE
        .captures(&text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
}

/// Certificate stamp from the top-right region of page one.
pub fn certificate_info(page: &PageLayout) -> CertificateInfo {
    let text = page
        .words
        .iter()
        .filter(|w| w.x0 > page.width * 0.7 && w.top < page.height * 0.1)
        .map(|w| w.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    match STAMP_RE.captures(&text).and_then(|c| c.get(1)) {
        Some(m) => CertificateInfo::from_stamp(m.as_str()),
        None => {
            log::debug!("No certificate stamp on page {}", page.number);
            CertificateInfo::default()
        }
    }
}

/// Whether a span is boilerplate rather than row content.
pub fn is_boilerplate(text: &str) -> bool {
    let lowered = text.to_lowercase();
    OBSERVATION_SKIP_EXACT.contains(&text)
        || OBSERVATION_SKIP
            .iter()
            .any(|skip| lowered.contains(&skip.to_lowercase()))
}

/// Remember every non-boilerplate span with its position.
pub fn capture_observations(doc: &DocumentLayout, parcel: &str) -> ObservationPool {
    let mut pool = ObservationPool::new();
    for page in &doc.pages {
        for span in &page.spans {
            let text = span.text.trim();
            if text.is_empty() || is_boilerplate(text) {
                continue;
            }
            pool.push(parcel, page.number, text, span.y);
        }
    }
    log::debug!("Captured {} coordinate observations", pool.len());
    pool
}
