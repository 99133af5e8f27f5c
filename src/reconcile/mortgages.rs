//! Mortgage post-processing: date fields, serial-tag links, empty pledges.

use lazy_static::lazy_static;
use regex::Regex;

use crate::model::{Establishment, MortgageRecord, RowRecord};
use crate::parser::{split_serial_tag, SHARE_ANCHOR};
use crate::text::collapse_whitespace;

/// Lender label given to share-table entries with no pledge behind them.
pub const EMPTY_PLEDGE_LABEL: &str = "Boş Rehin Bilgisi";

const EMPTY_PLEDGE_MARKER: &str = "BosRehin";

const DATE_LABELS: &[&str] = &["Tesis Tarih - Yev", "Tescil Tarih - Yev", "Tarih - Yev", "Tesis Kurum"];

lazy_static! {
    static ref DATED_REFERENCE_RE: Regex =
        Regex::new(r"^.+ - \d{2}-\d{2}-\d{4} \d{2}:\d{2} - \d+$").unwrap();
}

fn strip_date_labels(text: &str) -> String {
    let mut text = text.to_string();
    for label in DATE_LABELS {
        text = text.replace(label, " ");
    }
    collapse_whitespace(&text)
}

/// Split `Office - dd-mm-yyyy hh:mm - number` into its parts.
pub fn parse_establishment(text: &str) -> Establishment {
    let parts: Vec<&str> = text.split(" - ").map(str::trim).collect();
    let part = |i: usize| {
        parts
            .get(i)
            .filter(|p| !p.is_empty())
            .map(|p| p.to_string())
    };
    if parts.len() < 3 {
        return Establishment::default();
    }
    Establishment {
        office: Some(parts[..parts.len() - 2].join(" - ")).filter(|o| !o.is_empty()),
        date: part(parts.len() - 2),
        journal_no: part(parts.len() - 1),
    }
}

/// Clean the establishment and registration fields of every record.
///
/// When exactly one of them is a well-formed dated reference it is copied
/// into the other before the establishment is parsed.
pub fn clean_dates(mut records: Vec<MortgageRecord>) -> Vec<MortgageRecord> {
    for record in records.iter_mut() {
        record.establishment_text = strip_date_labels(&record.establishment_text);
        record.registration = strip_date_labels(&record.registration);

        let establishment_ok = DATED_REFERENCE_RE.is_match(&record.establishment_text);
        let registration_ok = DATED_REFERENCE_RE.is_match(&record.registration);
        match (establishment_ok, registration_ok) {
            (true, false) => record.registration = record.establishment_text.clone(),
            (false, true) => record.establishment_text = record.registration.clone(),
            _ => {}
        }
        record.establishment = parse_establishment(&record.establishment_text);
    }
    records
}

/// Update records from the shareholder rows that carry their serial tag.
pub fn link_serial_tags(mut records: Vec<MortgageRecord>, rows: &[RowRecord]) -> Vec<MortgageRecord> {
    let mut linked = 0;
    for row in rows.iter().filter(|r| r.is_data()) {
        let (Some(tag), debtor) = split_serial_tag(row.cell(1)) else {
            continue;
        };
        for record in records.iter_mut() {
            if record.serial_tag.as_deref() == Some(tag.as_str())
                && row.parcel.as_deref().map_or(true, |p| p == record.parcel)
            {
                record.debtor = debtor.clone();
                record.share = row.cell(3).to_string();
                linked += 1;
            }
        }
    }
    log::debug!("Mortgages: {} serial-tag links", linked);
    records
}

/// Relabel share-table entries that belong to an empty pledge.
///
/// A `BosRehin` row with nothing in columns two to six marks the pledge;
/// the row two positions further down on the same page carries its tag.
pub fn mark_empty_pledges(mut records: Vec<MortgageRecord>, rows: &[RowRecord]) -> Vec<MortgageRecord> {
    for (i, row) in rows.iter().enumerate() {
        if row.first_cell() != EMPTY_PLEDGE_MARKER || !row.cells_empty(1..6) {
            continue;
        }
        let Some(tagged) = rows.get(i + 2).filter(|r| r.page == row.page) else {
            continue;
        };
        let (Some(tag), _) = split_serial_tag(tagged.first_cell()) else {
            continue;
        };
        for record in records.iter_mut() {
            if record.serial_tag.as_deref() == Some(tag.as_str()) && record.lender == SHARE_ANCHOR {
                log::debug!("Mortgages: SN {} is an empty pledge", tag);
                record.lender = EMPTY_PLEDGE_LABEL.to_string();
            }
        }
    }
    records
}
