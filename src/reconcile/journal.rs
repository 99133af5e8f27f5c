//! Journal (yevmiye) references.

use lazy_static::lazy_static;
use regex::Regex;

use crate::model::{JournalEntry, RowRecord};
use crate::text::strip_for_journal;

lazy_static! {
    static ref JOURNAL_RE: Regex = Regex::new(
        r"(?:[^-\d]+)?(\d{2}[-./]\d{2}[-./]\d{4})(?:\s+(\d{1,2}:\d{1,2}))?.*?[-\s]+(\d+)\s*$"
    )
    .unwrap();
    static ref PARENTHETICAL_RE: Regex = Regex::new(r"\([^)]*\)").unwrap();
    static ref DATE_SEPARATOR_RE: Regex = Regex::new(r"[-./]").unwrap();
}

/// Columns that may carry an `office - date time - number` reference.
const JOURNAL_COLUMNS: std::ops::RangeInclusive<usize> = 2..=8;

/// Parse `Office - dd-mm-yyyy hh:mm - number`.
pub fn parse_journal(text: &str) -> Option<JournalEntry> {
    let cleaned = strip_for_journal(text);
    let cleaned = PARENTHETICAL_RE.replace_all(&cleaned, "");
    let caps = JOURNAL_RE.captures(cleaned.trim())?;
    let date = caps.get(1)?;
    let number = caps.get(3)?.as_str().to_string();

    let mut normalized = DATE_SEPARATOR_RE.replace_all(date.as_str(), ".").into_owned();
    if let Some(time) = caps.get(2) {
        normalized.push(' ');
        normalized.push_str(time.as_str());
    }

    let office = cleaned.trim()[..date.start()]
        .trim_end_matches(|c: char| c == '-' || c.is_whitespace())
        .trim()
        .to_string();

    Some(JournalEntry {
        number,
        date: normalized,
        office,
    })
}

/// Attach the first parseable journal reference to every data row.
pub fn extract_journals(mut rows: Vec<RowRecord>) -> Vec<RowRecord> {
    let mut found = 0;
    for row in rows.iter_mut() {
        if row.finalized || !row.is_data() || row.first_cell().is_empty() || row.journal.is_some() {
            continue;
        }
        row.journal = JOURNAL_COLUMNS.clone().find_map(|i| parse_journal(row.cell(i)));
        if row.journal.is_some() {
            found += 1;
        }
    }
    log::debug!("Journal: {} references parsed", found);
    rows
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_journal_full() {
        let entry = parse_journal("Kadıköy Tapu Müdürlüğü - 12-03-2020 10:15 - 4521").unwrap();
        assert_eq!(entry.office, "Kadıköy Tapu Müdürlüğü");
        assert_eq!(entry.date, "12.03.2020 10:15");
        assert_eq!(entry.number, "4521");
    }

    #[test]
    fn test_parse_journal_without_time_and_office() {
        let entry = parse_journal("01/02/2019-77").unwrap();
        assert_eq!(entry.office, "");
        assert_eq!(entry.date, "01.02.2019");
        assert_eq!(entry.number, "77");
    }

    #[test]
    fn test_parse_journal_drops_parentheticals_and_watermark() {
        let entry =
            parse_journal("Üsküdar (Eski Kayıt) - 05-06-2018 0B9:30 - 12 BİLGİ AMAÇLIDIR").unwrap();
        assert_eq!(entry.office, "Üsküdar");
        assert_eq!(entry.date, "05.06.2018 09:30");
        assert_eq!(entry.number, "12");
    }

    #[test]
    fn test_parse_journal_rejects_plain_text() {
        assert!(parse_journal("Ahmet Yılmaz").is_none());
        assert!(parse_journal("").is_none());
    }

    #[test]
    fn test_extract_journals_scans_columns_in_order() {
        let rows = vec![
            RowRecord::new(0, 2, 0, &["Ahmet", "1/2", "Tam", "Beşiktaş - 10-10-2010 - 5", "Kadıköy - 11-11-2011 - 6"]),
            RowRecord::new(1, 2, 1, &["", "", "Beşiktaş - 10-10-2010 - 5"]),
        ];
        let rows = extract_journals(rows);
        let journal = rows[0].journal.as_ref().unwrap();
        assert_eq!(journal.office, "Beşiktaş");
        assert_eq!(journal.number, "5");
        assert!(rows[1].journal.is_none());
    }
}
