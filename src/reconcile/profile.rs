//! Parcel profile: owners, encumbrances, mortgages and a risk score.

use serde::{Deserialize, Serialize};

use crate::model::{JournalEntry, MortgageRecord, ParcelEntity, RowRecord};
use crate::parser::{IDENTITY_SECTION, OWNERSHIP_SECTION};
use crate::text::upper_tr;

const SEIZURE_KEYWORDS: &[&str] = &["HACİZ", "HACZİ", "HACIZ", "HACZI"];
const FORECLOSURE: &str = "İPOTEĞİN PARAYA ÇEVRİLMESİ";
const INJUNCTION_KEYWORDS: &[&str] = &["İHTİYATİ TEDBİR", "İHTİYATİ", "TEDBİR"];
const PLEDGE_KEYWORDS: &[&str] = &["İPOTEK", "REHİN"];

/// Risk added per mortgage record.
pub const MORTGAGE_WEIGHT: f64 = 2.0;

/// Kind of a legal encumbrance row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EncumbranceKind {
    /// Haciz
    Attachment,
    /// Tedbir
    Injunction,
    /// İpotek
    Mortgage,
    /// Şerh
    Annotation,
    /// Beyan
    Declaration,
    /// Anything else
    Other,
}

impl EncumbranceKind {
    /// Classify a row by its first two cells and section name.
    pub fn classify(row: &RowRecord) -> Self {
        let first = upper_tr(row.first_cell());
        let second = upper_tr(row.cell(1));
        let section = row.section.as_deref().map(upper_tr).unwrap_or_default();

        if SEIZURE_KEYWORDS.iter().any(|k| second.contains(k)) || first.contains(FORECLOSURE) {
            EncumbranceKind::Attachment
        } else if INJUNCTION_KEYWORDS
            .iter()
            .any(|k| first.contains(k) || second.contains(k))
        {
            EncumbranceKind::Injunction
        } else if PLEDGE_KEYWORDS.iter().any(|k| second.contains(k)) {
            EncumbranceKind::Mortgage
        } else if section.contains("ŞERH") {
            EncumbranceKind::Annotation
        } else if section.contains("BEYAN") {
            EncumbranceKind::Declaration
        } else {
            EncumbranceKind::Other
        }
    }

    /// Registry label of the kind.
    pub fn label(&self) -> &'static str {
        match self {
            EncumbranceKind::Attachment => "HACİZ",
            EncumbranceKind::Injunction => "TEDBİR",
            EncumbranceKind::Mortgage => "İPOTEK",
            EncumbranceKind::Annotation => "ŞERH",
            EncumbranceKind::Declaration => "BEYAN",
            EncumbranceKind::Other => "DİĞER",
        }
    }

    /// Contribution to the risk score.
    pub fn weight(&self) -> f64 {
        match self {
            EncumbranceKind::Mortgage => 2.0,
            EncumbranceKind::Attachment | EncumbranceKind::Injunction => 25.0,
            EncumbranceKind::Annotation => 0.6,
            EncumbranceKind::Declaration => 0.5,
            EncumbranceKind::Other => 0.0,
        }
    }
}

/// One encumbrance row of a parcel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Encumbrance {
    pub seq: u32,
    pub section: String,
    pub kind: EncumbranceKind,
    pub text: String,
    pub journal: Option<JournalEntry>,
}

/// Everything known about one parcel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParcelProfile {
    pub parcel: ParcelEntity,
    /// Ownership rows in document order
    pub owners: Vec<RowRecord>,
    pub encumbrances: Vec<Encumbrance>,
    pub mortgages: Vec<MortgageRecord>,
    /// Rounded risk score
    pub risk_score: i64,
}

impl ParcelProfile {
    /// Group finalized rows and mortgages into a profile.
    pub fn build(parcel: ParcelEntity, rows: &[RowRecord], mortgages: Vec<MortgageRecord>) -> Self {
        let owners: Vec<RowRecord> = rows
            .iter()
            .filter(|r| r.is_data() && r.section.as_deref() == Some(OWNERSHIP_SECTION))
            .cloned()
            .collect();
        let encumbrances = encumbrances(rows);
        let risk_score = risk_score(&encumbrances, mortgages.len());
        Self {
            parcel,
            owners,
            encumbrances,
            mortgages,
            risk_score,
        }
    }

    /// Number of encumbrances of one kind.
    pub fn count(&self, kind: EncumbranceKind) -> usize {
        self.encumbrances.iter().filter(|e| e.kind == kind).count()
    }
}

/// Data rows outside the identity and ownership sections.
pub fn encumbrances(rows: &[RowRecord]) -> Vec<Encumbrance> {
    rows.iter()
        .filter(|r| r.is_data())
        .filter_map(|r| {
            let section = r.section.as_deref().filter(|s| !s.is_empty())?;
            if section == IDENTITY_SECTION || section == OWNERSHIP_SECTION {
                return None;
            }
            let text = if r.cell(1).is_empty() { r.first_cell() } else { r.cell(1) };
            Some(Encumbrance {
                seq: r.seq,
                section: section.to_string(),
                kind: EncumbranceKind::classify(r),
                text: text.to_string(),
                journal: r.journal.clone(),
            })
        })
        .collect()
}

/// Weighted sum of encumbrances plus a fixed weight per mortgage, rounded.
pub fn risk_score(encumbrances: &[Encumbrance], mortgages: usize) -> i64 {
    let total: f64 = encumbrances.iter().map(|e| e.kind.weight()).sum::<f64>()
        + mortgages as f64 * MORTGAGE_WEIGHT;
    total.round() as i64
}
