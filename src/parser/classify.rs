//! Row classification and continuation merging.
//!
//! Tables on the certificate repeat their column captions on every page and
//! page one is a two-column label/value grid. Both kinds of row are
//! recognised here as headers. Everything else is data; a data row with an
//! empty first cell is the tail of the row above that a page break or
//! re-flow split off, and gets folded back into it.

use crate::model::{RowRecord, RowState, CELL_COUNT};
use crate::text::{fold, folded_ratio};

/// Labels of the page-one identity grid.
pub const PAGE_ONE_LABELS: &[&str] = &[
    "Makbuz No",
    "Dekont No",
    "Başvuru No",
    "Zemin Tipi:",
    "Taşınmaz Kimlik No:",
    "İl/İlçe:",
    "Ada/Parsel:",
    "Mahalle/Köy Adı:",
    "Mevkii:",
    "Cilt/Sayfa No:",
    "Kayıt Durum:",
    "Kurum Adı:",
    "AT Yüzölçüm(m2):",
    "Bağımsız Bölüm Nitelik:",
    "Bağımsız Bölüm Brüt YüzÖlçümü:",
    "Bağımsız Bölüm Net YüzÖlçümü:",
    "Blok/Kat/Giriş/BBNo:",
    "Arsa Pay/Payda:",
    "Ana Taşınmaz Nitelik:",
];

const MORTGAGE_VARIANTS: &[&str] = &["İpotek", "Ipotek", "İPOTEK", "IPOTEK"];

/// A column-caption pattern: (0-based column, expected captions).
pub struct HeaderArchetype {
    pub name: &'static str,
    pub columns: &'static [(usize, &'static [&'static str])],
}

/// Caption rows of the certificate's tables.
pub const HEADER_ARCHETYPES: &[HeaderArchetype] = &[
    HeaderArchetype {
        name: "restriction",
        columns: &[
            (0, &["Ş//", "Ş."]),
            (1, &["Açıklama"]),
            (2, &["Kısıtlı Malik", "Malik (Hisse)"]),
            (3, &["Malik/Lehtar"]),
            (4, &["Tesis Kurum", "Tarih- Yevmiye"]),
            (5, &["Terkin Sebebi"]),
        ],
    },
    HeaderArchetype {
        name: "restriction_dated",
        columns: &[
            (0, &["Ş//", "Ş."]),
            (1, &["Açıklama"]),
            (2, &["Kısıtlı Malik", "Malik (Hisse)"]),
            (3, &["Malik/Lehtar"]),
            (4, &["Tesis Kurum", "Tarih- Yevmiye"]),
            (5, &["Terkin Sebebi", "Terkin Sebebi- Tarih- Yevmiye"]),
        ],
    },
    HeaderArchetype {
        name: "system_info",
        columns: &[
            (0, &["Sistem No"]),
            (1, &["Tip"]),
            (2, &["Tanım"]),
            (3, &["Adet"]),
            (4, &["Deger"]),
            (5, &["Tesis Kurum", "Tarih- Yevmiye"]),
        ],
    },
    HeaderArchetype {
        name: "annotation",
        columns: &[
            (0, &["Ş//", "Ş."]),
            (1, &["Açıklama"]),
            (2, &["Malik/Lehtar"]),
            (3, &["Tesis Kurum"]),
            (4, &["Terkin"]),
        ],
    },
    HeaderArchetype {
        name: "mortgage",
        columns: &[
            (0, MORTGAGE_VARIANTS),
            (1, &["Hisse Pay", "Payda"]),
            (2, &["Borçlu"]),
            (3, &["Malik"]),
            (4, &["Tescil"]),
            (5, &["Terkin"]),
        ],
    },
    HeaderArchetype {
        name: "mortgage_share",
        columns: &[
            (0, &["Taşınmaz"]),
            (1, &["Hisse Pay", "Pay/Payda"]),
            (2, &["Borçlu", "Borçlu Malik"]),
            (3, &["Malik", "Borç"]),
            (4, &["Tescil", "Tarih - Yev"]),
            (5, &["Terkin", "Terkin Sebebi", "Tarih Yev"]),
        ],
    },
    HeaderArchetype {
        name: "mortgage_terms",
        columns: &[
            (0, &["Alacaklı"]),
            (1, &["Müşterek"]),
            (2, &["Borç"]),
            (3, &["Faiz"]),
            (4, &["Derece"]),
            (5, &["Süre"]),
            (6, &["Tesis"]),
        ],
    },
    HeaderArchetype {
        name: "ownership",
        columns: &[
            (0, &["Hisse", "Sistem"]),
            (1, &["Malik"]),
            (2, &["El Birliği"]),
            (3, &["Pay"]),
            (4, &["Metrekare"]),
            (5, &["Toplam"]),
            (6, &["Edinme"]),
            (7, &["Terkin"]),
        ],
    },
    HeaderArchetype {
        name: "ownership_numbers",
        columns: &[
            (0, &["No"]),
            (2, &["No"]),
            (3, &["Payda"]),
            (5, &["Metrekare"]),
            (6, &["Sebebi-Tarih- Yevmiye", "Sebebi-Tarih - Yevmiye"]),
            (7, &["Tarih-Yevmiye"]),
        ],
    },
];

/// Decides which rows are captions and folds continuation rows upward.
pub struct RowClassifier {
    label_threshold: f64,
    archetype_threshold: f64,
}

impl RowClassifier {
    /// Create a classifier with the default 0.8 thresholds.
    pub fn new() -> Self {
        Self {
            label_threshold: 0.8,
            archetype_threshold: 0.8,
        }
    }

    /// Set the page-one label and archetype thresholds.
    pub fn with_thresholds(mut self, label: f64, archetype: f64) -> Self {
        self.label_threshold = label;
        self.archetype_threshold = archetype;
        self
    }

    /// Whether a row is a header.
    pub fn is_header(&self, row: &RowRecord) -> bool {
        let first = row.first_cell();

        // Lone "İpotek" caption
        if is_mortgage_word(first) && row.cells_empty(1..CELL_COUNT) {
            return true;
        }
        if row.is_blank() {
            return false;
        }
        if !first.is_empty()
            && PAGE_ONE_LABELS
                .iter()
                .any(|label| folded_ratio(first, label) > self.label_threshold)
        {
            return true;
        }

        HEADER_ARCHETYPES
            .iter()
            .any(|archetype| self.matched_columns(row, archetype) >= 2)
    }

    /// Columns of `row` matching the archetype; empty cells never match.
    pub fn matched_columns(&self, row: &RowRecord, archetype: &HeaderArchetype) -> usize {
        archetype
            .columns
            .iter()
            .filter(|(column, expected)| {
                let value = row.cell(*column);
                !value.is_empty()
                    && expected
                        .iter()
                        .any(|e| folded_ratio(value, e) > self.archetype_threshold)
            })
            .count()
    }

    /// Set the state of every row that is not finalized.
    pub fn classify(&self, rows: Vec<RowRecord>) -> Vec<RowRecord> {
        let mut headers = 0usize;
        let rows: Vec<RowRecord> = rows
            .into_iter()
            .map(|mut row| {
                if !row.finalized && row.state != RowState::MergedAway {
                    row.state = if self.is_header(&row) {
                        headers += 1;
                        RowState::Header
                    } else {
                        RowState::Data
                    };
                }
                row
            })
            .collect();
        log::debug!("RowClassifier: {} header rows of {}", headers, rows.len());
        rows
    }
}

impl Default for RowClassifier {
    fn default() -> Self {
        Self::new()
    }
}

fn is_mortgage_word(text: &str) -> bool {
    !text.is_empty() && fold(text) == "IPOTEK"
}

/// Merge continuation rows into the row above.
///
/// A non-finalized data row with an empty first cell is folded into the
/// nearest preceding row that has not itself been merged away, unless that
/// row is a header. Each target cell becomes `"{above} {below}"` when both
/// are non-empty. The continuation row is marked `MERGED_AWAY`.
///
/// Returns the rows and the number of merges.
pub fn merge_continuations(mut rows: Vec<RowRecord>) -> (Vec<RowRecord>, usize) {
    let mut merged = 0usize;
    let mut target: Option<usize> = None;

    for i in 0..rows.len() {
        let row = &rows[i];
        let is_continuation = !row.finalized
            && row.state == RowState::Data
            && row.first_cell().is_empty()
            && !row.is_blank();

        if is_continuation {
            if let Some(t) = target.filter(|&t| rows[t].state != RowState::Header) {
                let (upper, lower) = rows.split_at_mut(i);
                let above = &mut upper[t];
                let below = &mut lower[0];
                for (a, b) in above.cells.iter_mut().zip(below.cells.iter()) {
                    if let Some(b) = b {
                        *a = Some(match a.take() {
                            Some(a) => format!("{} {}", a, b).trim().to_string(),
                            None => b.clone(),
                        });
                    }
                }
                below.state = RowState::MergedAway;
                merged += 1;
                continue;
            }
        }

        if rows[i].state != RowState::MergedAway {
            target = Some(i);
        }
    }

    log::debug!("merge_continuations: {} rows merged", merged);
    (rows, merged)
}

/// Drop rows marked `MERGED_AWAY`.
pub fn remove_merged(rows: Vec<RowRecord>) -> Vec<RowRecord> {
    rows.into_iter()
        .filter(|r| r.state != RowState::MergedAway)
        .collect()
}
