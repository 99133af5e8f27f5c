//! Coordinate-zone field extraction for the mortgage and share tables.
//!
//! The mortgage page prints two small tables at nearly fixed positions: the
//! mortgage terms (lender, amount, rank, ...) and the share the mortgage
//! rests on. Fields are read by collecting the words inside a rectangle per
//! field. When the page has drifted and the fixed rectangles miss, zones are
//! rebuilt from the positions of two anchor labels.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Diagnostic, Result};
use crate::model::{MortgageRecord, PageLayout};
use crate::text::{count_vkn, TextNormalizer};

/// Lender-column anchor label.
pub const LENDER_ANCHOR: &str = "Alacaklı";

/// Share-table anchor label.
pub const SHARE_ANCHOR: &str = "İpoteğin Konulduğu Hisse Bilgisi";

lazy_static! {
    static ref SERIAL_TAG_RE: Regex = Regex::new(r"\(SN:(\d+)\)").unwrap();
}

/// A rectangle in page coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub x0: f64,
    pub x1: f64,
    pub y0: f64,
    pub y1: f64,
}

impl Zone {
    pub const fn new(x0: f64, x1: f64, y0: f64, y1: f64) -> Self {
        Self { x0, x1, y0, y1 }
    }

    /// Same horizontal extent, new vertical extent.
    pub fn with_rows(&self, y0: f64, y1: f64) -> Self {
        Self { y0, y1, ..*self }
    }
}

/// Fields of the mortgage table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MortgageField {
    Lender,
    CoDebtor,
    Amount,
    Interest,
    Rank,
    Tenor,
    Establishment,
}

/// Fields of the share table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShareField {
    Property,
    Share,
    DebtorOwner,
    OwnerDebt,
    Registration,
    Cancellation,
}

/// Zone rectangles for both tables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZoneLayout {
    pub mortgage: Vec<(MortgageField, Zone)>,
    pub share: Vec<(ShareField, Zone)>,
}

impl Default for ZoneLayout {
    fn default() -> Self {
        Self {
            mortgage: vec![
                (MortgageField::Lender, Zone::new(40.0, 250.0, 70.0, 220.0)),
                (MortgageField::CoDebtor, Zone::new(260.0, 320.0, 70.0, 140.0)),
                (MortgageField::Amount, Zone::new(330.0, 430.0, 70.0, 140.0)),
                (MortgageField::Interest, Zone::new(440.0, 500.0, 70.0, 140.0)),
                (MortgageField::Rank, Zone::new(510.0, 560.0, 70.0, 140.0)),
                (MortgageField::Tenor, Zone::new(560.0, 600.0, 70.0, 140.0)),
                (MortgageField::Establishment, Zone::new(610.0, 800.0, 60.0, 160.0)),
            ],
            share: vec![
                (ShareField::Property, Zone::new(40.0, 240.0, 200.0, 290.0)),
                (ShareField::Share, Zone::new(240.0, 320.0, 200.0, 260.0)),
                (ShareField::DebtorOwner, Zone::new(320.0, 530.0, 200.0, 260.0)),
                (ShareField::OwnerDebt, Zone::new(530.0, 610.0, 200.0, 260.0)),
                (ShareField::Registration, Zone::new(610.0, 720.0, 200.0, 280.0)),
                (ShareField::Cancellation, Zone::new(720.0, 800.0, 200.0, 260.0)),
            ],
        }
    }
}

impl ZoneLayout {
    /// Rebuild zones from anchor positions.
    ///
    /// `lender_top` and `share_top` are the tops of the two anchor labels.
    /// The lender column spans from just above its anchor down to the share
    /// anchor; other mortgage columns cover 30% of the gap below the lender
    /// anchor; share columns start 20 units under their anchor and cover 40%
    /// of the gap.
    pub fn anchored(&self, lender_top: f64, share_top: f64) -> Self {
        let gap = share_top - lender_top;
        let mortgage = self
            .mortgage
            .iter()
            .map(|(field, zone)| {
                let zone = match field {
                    MortgageField::Lender => zone.with_rows(lender_top - 5.0, share_top),
                    _ => zone.with_rows(lender_top, lender_top + gap * 0.3),
                };
                (*field, zone)
            })
            .collect();
        let share = self
            .share
            .iter()
            .map(|(field, zone)| (*field, zone.with_rows(share_top + 20.0, share_top + gap * 0.4)))
            .collect();
        Self { mortgage, share }
    }
}

/// Raw and normalized text of one zone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ZoneValue {
    pub raw: String,
    pub value: String,
}

/// Everything read from one mortgage page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ZoneReading {
    pub mortgage: Vec<(MortgageField, ZoneValue)>,
    pub share: Vec<(ShareField, ZoneValue)>,
}

impl ZoneReading {
    pub fn mortgage(&self, field: MortgageField) -> &ZoneValue {
        self.mortgage
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, v)| v)
            .unwrap_or(&EMPTY_VALUE)
    }

    pub fn share(&self, field: ShareField) -> &ZoneValue {
        self.share
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, v)| v)
            .unwrap_or(&EMPTY_VALUE)
    }

    /// Reasons the reading fails validation; empty when it passes.
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        let lender = &self.mortgage(MortgageField::Lender).raw;
        if lender.is_empty() {
            problems.push("lender empty".to_string());
        }

        let vkn = count_vkn(lender);
        let serials = SERIAL_TAG_RE.find_iter(lender).count();
        if vkn > 0 && vkn != serials {
            problems.push(format!("{} tax ids but {} serial tags", vkn, serials));
        }
        let words = lender.split_whitespace().count();
        if serials > 0 && words < serials * 3 {
            problems.push(format!("{} words for {} serial tags", words, serials));
        }

        for (field, name) in [
            (MortgageField::CoDebtor, "co-debtor"),
            (MortgageField::Amount, "amount"),
            (MortgageField::Establishment, "establishment"),
        ] {
            if self.mortgage(field).raw.is_empty() {
                problems.push(format!("{} empty", name));
            }
        }
        problems
    }
}

static EMPTY_VALUE: ZoneValue = ZoneValue {
    raw: String::new(),
    value: String::new(),
};

/// Whether a page carries the mortgage tables.
pub fn is_mortgage_page(text: &str, min_len: usize) -> bool {
    const TERMS: &[&str] = &[
        "potek",
        "Rehin",
        "MÜLKİYETE AİT REHİN BİLGİLERİ",
        "İpoteğin Konulduğu",
    ];
    const LABELS: &[&str] = &["Alacaklı", "Borç", "Faiz", "Derece", "Tesis Tarih"];
    const FINANCE: &[&str] = &["A.Ş.", "T.A.O.", "Ltd.Şti.", "Bankası", "Bank"];

    if text.trim().chars().count() < min_len {
        return false;
    }
    let has_term = TERMS.iter().any(|t| text.contains(t));
    let labels = LABELS.iter().filter(|l| text.contains(*l)).count();
    let has_finance = text.contains("VKN") || FINANCE.iter().any(|f| text.contains(f));

    (has_term && labels >= 1) || (labels >= 2 && has_finance)
}

/// Pull a serial tag out of text, returning the tag and the text without it.
pub fn split_serial_tag(text: &str) -> (Option<String>, String) {
    match SERIAL_TAG_RE.captures(text) {
        Some(caps) => {
            let tag = caps.get(1).map(|m| m.as_str().to_string());
            let stripped = SERIAL_TAG_RE.replace_all(text, " ");
            (tag, crate::text::collapse_whitespace(&stripped))
        }
        None => (None, text.to_string()),
    }
}

/// Outcome of zone extraction for one page.
#[derive(Debug, Clone)]
pub struct PageMortgage {
    pub record: MortgageRecord,
    pub diagnostic: Option<Diagnostic>,
}

/// Reads mortgage records from fixed or anchored zones.
pub struct ZoneExtractor {
    layout: ZoneLayout,
}

impl ZoneExtractor {
    /// Create an extractor with the default zones.
    pub fn new() -> Self {
        Self {
            layout: ZoneLayout::default(),
        }
    }

    /// Create an extractor with custom zones.
    pub fn with_layout(layout: ZoneLayout) -> Self {
        Self { layout }
    }

    /// Read raw zone text for one layout.
    pub fn read(&self, page: &PageLayout, layout: &ZoneLayout) -> ZoneReading {
        let grab = |zone: &Zone| {
            page.words_in(zone.x0, zone.x1, zone.y0, zone.y1)
                .map(|w| w.text.trim())
                .filter(|t| !t.is_empty())
                .collect::<Vec<_>>()
                .join(" ")
        };
        ZoneReading {
            mortgage: layout
                .mortgage
                .iter()
                .map(|(f, z)| (*f, ZoneValue { raw: grab(z), value: String::new() }))
                .collect(),
            share: layout
                .share
                .iter()
                .map(|(f, z)| (*f, ZoneValue { raw: grab(z), value: String::new() }))
                .collect(),
        }
    }

    /// Top positions of the two anchors, matched exactly.
    ///
    /// The lender anchor is the last one above the share anchor, so a
    /// repeated caption higher on the page does not widen the gap.
    pub fn anchors(page: &PageLayout) -> Option<(f64, f64)> {
        let share_top = page
            .words
            .iter()
            .find(|w| w.text.trim() == SHARE_ANCHOR)
            .map(|w| w.top)?;
        let lender_top = page
            .words
            .iter()
            .filter(|w| w.text.trim() == LENDER_ANCHOR && w.top < share_top)
            .map(|w| w.top)
            .fold(None, |last: Option<f64>, top| Some(last.map_or(top, |l| l.max(top))))?;
        Some((lender_top, share_top))
    }

    /// Extract one page's mortgage record.
    ///
    /// Validation runs on the raw fixed-zone text. A failing reading is
    /// retried with anchored zones; if the anchors are missing the fixed
    /// reading is kept and flagged.
    pub fn extract(
        &self,
        page: &PageLayout,
        parcel: &str,
        normalizer: &mut TextNormalizer,
    ) -> Result<PageMortgage> {
        let mut reading = self.read(page, &self.layout);
        let mut problems = reading.problems();
        let mut diagnostic = None;

        if !problems.is_empty() {
            log::debug!(
                "ZoneExtractor: page {} incomplete ({}), trying anchors",
                page.number,
                problems.join("; ")
            );
            let recovered = match Self::anchors(page) {
                Some((lender_top, share_top)) => {
                    let anchored = self.layout.anchored(lender_top, share_top);
                    reading = self.read(page, &anchored);
                    let retry = reading.problems();
                    let ok = retry.is_empty();
                    problems = if ok { problems } else { retry };
                    ok
                }
                None => {
                    log::warn!("Mortgage anchors not found on page {}", page.number);
                    false
                }
            };
            diagnostic = Some(Diagnostic::ZoneExtractionIncomplete {
                page: page.number,
                reasons: problems.clone(),
                recovered,
            });
        }

        for (_, value) in reading.mortgage.iter_mut() {
            value.value = normalizer.normalize(&value.raw)?;
        }
        for (_, value) in reading.share.iter_mut() {
            value.value = normalizer.normalize(&value.raw)?;
        }

        let mut record = MortgageRecord::new(parcel, page.number);
        record.lender = reading.mortgage(MortgageField::Lender).value.clone();
        record.co_debtor = reading.mortgage(MortgageField::CoDebtor).value.clone();
        record.amount = reading.mortgage(MortgageField::Amount).value.clone();
        record.interest = reading.mortgage(MortgageField::Interest).value.clone();
        record.rank = reading.mortgage(MortgageField::Rank).value.clone();
        record.tenor = reading.mortgage(MortgageField::Tenor).value.clone();
        record.establishment_text = reading.mortgage(MortgageField::Establishment).value.clone();
        record.property = reading.share(ShareField::Property).value.clone();
        record.share = reading.share(ShareField::Share).value.clone();
        record.owner_debt = reading.share(ShareField::OwnerDebt).value.clone();
        record.registration = reading.share(ShareField::Registration).value.clone();
        record.cancellation = reading.share(ShareField::Cancellation).value.clone();

        let (tag, debtor) = split_serial_tag(&reading.share(ShareField::DebtorOwner).value);
        record.debtor = debtor;
        record.serial_tag = tag.or_else(|| {
            split_serial_tag(&reading.mortgage(MortgageField::CoDebtor).raw).0
        });
        if let (Some(_), co_debtor) = split_serial_tag(&record.co_debtor) {
            record.co_debtor = co_debtor;
        }
        record.complete = match &diagnostic {
            Some(Diagnostic::ZoneExtractionIncomplete { recovered, .. }) => *recovered,
            _ => true,
        };

        Ok(PageMortgage { record, diagnostic })
    }
}

impl Default for ZoneExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Word;

    fn fixed_page() -> PageLayout {
        PageLayout::a4_landscape(3)
            .with_word(Word::new("VKN : 4810058590 (SN:12) İş Bankası", 45.0, 90.0))
            .with_word(Word::new("Hayır", 265.0, 90.0))
            .with_word(Word::new("250.000,00 TL", 335.0, 90.0))
            .with_word(Word::new("%45", 445.0, 90.0))
            .with_word(Word::new("1/1", 515.0, 90.0))
            .with_word(Word::new("-", 565.0, 90.0))
            .with_word(Word::new("Bakırköy - 12-03-2020 10:15 - 4567", 615.0, 90.0))
            .with_word(Word::new("Daire 4", 45.0, 210.0))
            .with_word(Word::new("1/2", 245.0, 210.0))
            .with_word(Word::new("AYŞE KAYA (SN:12)", 325.0, 210.0))
    }

    #[test]
    fn test_fixed_zones_complete() {
        let mut normalizer = TextNormalizer::default();
        let result = ZoneExtractor::new()
            .extract(&fixed_page(), "1000", &mut normalizer)
            .unwrap();
        assert!(result.diagnostic.is_none());
        let record = result.record;
        assert!(record.complete);
        assert_eq!(record.lender, "Türkiye İş Bankası A.Ş.");
        assert_eq!(record.co_debtor, "Hayır");
        assert_eq!(record.amount, "250.000,00 TL");
        assert_eq!(record.debtor, "AYŞE KAYA");
        assert_eq!(record.serial_tag.as_deref(), Some("12"));
        assert_eq!(record.share, "1/2");
    }

    #[test]
    fn test_vkn_serial_mismatch_uses_anchors() {
        // Drifted page: fixed lender zone only catches one of two VKNs'
        // serial tags; anchors sit 60 units lower than the fixed layout.
        let page = PageLayout::a4_landscape(2)
            .with_word(Word::new("VKN : 4810058590 İş Bankası", 45.0, 200.0))
            .with_word(Word::new(LENDER_ANCHOR, 45.0, 120.0))
            .with_word(Word::new(SHARE_ANCHOR, 45.0, 320.0))
            .with_word(Word::new("(SN:7)", 45.0, 240.0))
            .with_word(Word::new("Evet", 265.0, 150.0))
            .with_word(Word::new("100.000,00 TL", 335.0, 150.0))
            .with_word(Word::new("Fatih - 01-02-2019 09:00 - 12", 615.0, 150.0))
            .with_word(Word::new("ALİ VELİ (SN:7)", 325.0, 350.0));

        let extractor = ZoneExtractor::new();
        let fixed = extractor.read(&page, &ZoneLayout::default());
        assert!(!fixed.problems().is_empty());

        let (lender_top, share_top) = ZoneExtractor::anchors(&page).unwrap();
        assert_eq!((lender_top, share_top), (120.0, 320.0));
        let anchored = ZoneLayout::default().anchored(lender_top, share_top);
        let lender_zone = anchored.mortgage[0].1;
        assert_eq!((lender_zone.y0, lender_zone.y1), (115.0, 320.0));
        let amount_zone = anchored.mortgage[2].1;
        assert_eq!((amount_zone.y0, amount_zone.y1), (120.0, 180.0));
        let share_zone = anchored.share[2].1;
        assert_eq!((share_zone.y0, share_zone.y1), (340.0, 400.0));

        let mut normalizer = TextNormalizer::default();
        let result = extractor.extract(&page, "1000", &mut normalizer).unwrap();
        match result.diagnostic {
            Some(Diagnostic::ZoneExtractionIncomplete { recovered, page, .. }) => {
                assert!(recovered);
                assert_eq!(page, 2);
            }
            other => panic!("expected incomplete diagnostic, got {:?}", other),
        }
        assert_eq!(result.record.lender, "Türkiye İş Bankası A.Ş.");
        assert_eq!(result.record.amount, "100.000,00 TL");
        assert_eq!(result.record.serial_tag.as_deref(), Some("7"));
        assert_eq!(result.record.debtor, "ALİ VELİ");
    }

    #[test]
    fn test_anchors_use_last_lender_caption() {
        let page = PageLayout::a4_landscape(2)
            .with_word(Word::new(LENDER_ANCHOR, 45.0, 40.0))
            .with_word(Word::new(LENDER_ANCHOR, 45.0, 120.0))
            .with_word(Word::new(SHARE_ANCHOR, 45.0, 320.0))
            .with_word(Word::new(LENDER_ANCHOR, 45.0, 420.0));
        assert_eq!(ZoneExtractor::anchors(&page), Some((120.0, 320.0)));

        let below_only = PageLayout::a4_landscape(2)
            .with_word(Word::new(SHARE_ANCHOR, 45.0, 320.0))
            .with_word(Word::new(LENDER_ANCHOR, 45.0, 420.0));
        assert_eq!(ZoneExtractor::anchors(&below_only), None);
    }

    #[test]
    fn test_missing_anchors_keep_partial_values() {
        let page = PageLayout::a4_landscape(4)
            .with_word(Word::new("250.000,00 TL", 335.0, 90.0));
        let mut normalizer = TextNormalizer::default();
        let result = ZoneExtractor::new()
            .extract(&page, "1000", &mut normalizer)
            .unwrap();
        assert!(!result.record.complete);
        assert_eq!(result.record.amount, "250.000,00 TL");
        assert!(matches!(
            result.diagnostic,
            Some(Diagnostic::ZoneExtractionIncomplete { recovered: false, .. })
        ));
    }

    #[test]
    fn test_is_mortgage_page() {
        let text = "MÜLKİYETE AİT REHİN BİLGİLERİ\nAlacaklı Müşterek Mi? Borç Faiz Derece Sıra";
        assert!(is_mortgage_page(text, 50));
        let text = "Alacaklı Borç ..... Türkiye Garanti Bankası A.Ş. ...................";
        assert!(is_mortgage_page(text, 50));
        assert!(!is_mortgage_page("İpotek Alacaklı", 50));
        let text = "MÜLKİYET BİLGİLERİ Hisse Pay/Payda Malik Edinme Sebebi Tarih Yevmiye";
        assert!(!is_mortgage_page(text, 50));
    }

    #[test]
    fn test_split_serial_tag() {
        let (tag, text) = split_serial_tag("AYŞE KAYA (SN:12) Hissesi");
        assert_eq!(tag.as_deref(), Some("12"));
        assert_eq!(text, "AYŞE KAYA Hissesi");
        let (tag, text) = split_serial_tag("AYŞE KAYA");
        assert!(tag.is_none());
        assert_eq!(text, "AYŞE KAYA");
    }
}
