//! Parcel summary from the page-one identity rows.

use crate::model::{CertificateInfo, ParcelEntity, RowRecord};
use crate::parser::{Thresholds, ThresholdKey, IDENTITY_SECTION};
use crate::text::folded_ratio;

/// Page-one summary fields and their printed labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SummaryField {
    LandType,
    ProvinceDistrict,
    Institution,
    Neighbourhood,
    Locality,
    VolumePage,
    RecordStatus,
    BlockParcel,
    Area,
    UnitNature,
    UnitGrossArea,
    UnitNetArea,
    UnitDescriptor,
    LandShare,
}

impl SummaryField {
    pub const ALL: [SummaryField; 14] = [
        SummaryField::LandType,
        SummaryField::ProvinceDistrict,
        SummaryField::Institution,
        SummaryField::Neighbourhood,
        SummaryField::Locality,
        SummaryField::VolumePage,
        SummaryField::RecordStatus,
        SummaryField::BlockParcel,
        SummaryField::Area,
        SummaryField::UnitNature,
        SummaryField::UnitGrossArea,
        SummaryField::UnitNetArea,
        SummaryField::UnitDescriptor,
        SummaryField::LandShare,
    ];

    /// Label as printed in the first column.
    pub fn label(&self) -> &'static str {
        match self {
            SummaryField::LandType => "Zemin Tipi:",
            SummaryField::ProvinceDistrict => "İl/İlçe:",
            SummaryField::Institution => "Kurum Adı:",
            SummaryField::Neighbourhood => "Mahalle/Köy Adı:",
            SummaryField::Locality => "Mevkii:",
            SummaryField::VolumePage => "Cilt/Sayfa No:",
            SummaryField::RecordStatus => "Kayıt Durum:",
            SummaryField::BlockParcel => "Ada/Parsel:",
            SummaryField::Area => "AT Yüzölçüm(m2):",
            SummaryField::UnitNature => "Bağımsız Bölüm Nitelik:",
            SummaryField::UnitGrossArea => "Bağımsız Bölüm Brüt YüzÖlçümü:",
            SummaryField::UnitNetArea => "Bağımsız Bölüm Net YüzÖlçümü:",
            SummaryField::UnitDescriptor => "Blok/Kat/Giriş/BBNo:",
            SummaryField::LandShare => "Arsa Pay/Payda:",
        }
    }

    /// Threshold key governing the label match.
    pub fn threshold_key(&self) -> ThresholdKey {
        match self {
            SummaryField::LandType => ThresholdKey::LandType,
            SummaryField::ProvinceDistrict => ThresholdKey::ProvinceDistrict,
            SummaryField::Institution => ThresholdKey::Institution,
            SummaryField::Neighbourhood => ThresholdKey::Neighbourhood,
            SummaryField::Locality => ThresholdKey::Locality,
            SummaryField::VolumePage => ThresholdKey::VolumePage,
            SummaryField::RecordStatus => ThresholdKey::RecordStatus,
            SummaryField::BlockParcel => ThresholdKey::BlockParcel,
            SummaryField::Area => ThresholdKey::Area,
            SummaryField::UnitNature => ThresholdKey::UnitNature,
            SummaryField::UnitGrossArea => ThresholdKey::UnitGrossArea,
            SummaryField::UnitNetArea => ThresholdKey::UnitNetArea,
            SummaryField::UnitDescriptor => ThresholdKey::UnitDescriptor,
            SummaryField::LandShare => ThresholdKey::LandShare,
        }
    }

    fn apply(&self, parcel: &mut ParcelEntity, value: &str) {
        let value_owned = Some(value.to_string());
        match self {
            SummaryField::LandType => parcel.set_land_type(value),
            SummaryField::ProvinceDistrict => parcel.province_district = value_owned,
            SummaryField::Institution => parcel.institution = value_owned,
            SummaryField::Neighbourhood => parcel.neighbourhood = value_owned,
            SummaryField::Locality => parcel.locality = value_owned,
            SummaryField::VolumePage => parcel.volume_page = value_owned,
            SummaryField::RecordStatus => parcel.record_status = value_owned,
            SummaryField::BlockParcel => parcel.set_block_parcel(value),
            SummaryField::Area => parcel.area = value_owned,
            SummaryField::UnitNature => parcel.unit_nature = value_owned,
            SummaryField::UnitGrossArea => parcel.unit_gross_area = value_owned,
            SummaryField::UnitNetArea => parcel.unit_net_area = value_owned,
            SummaryField::UnitDescriptor => parcel.set_unit(value),
            SummaryField::LandShare => parcel.land_share = value_owned,
        }
    }
}

const IDENTITY_LABEL: &str = "Taşınmaz Kimlik No:";
const MAIN_NATURE_LABEL: &str = "Ana Taşınmaz Nitelik:";

/// Page-one row whose first cell is most similar to `label`, with its score.
fn best_row<'a>(rows: &[&'a RowRecord], label: &str) -> Option<(&'a RowRecord, f64)> {
    let mut best: Option<(&RowRecord, f64)> = None;
    for &row in rows {
        let score = folded_ratio(row.first_cell(), label);
        if best.map_or(true, |(_, b)| score > b) {
            best = Some((row, score));
        }
    }
    best
}

fn value_of(row: &RowRecord) -> Option<&str> {
    Some(row.cell(1)).filter(|v| !v.is_empty())
}

/// Build the parcel summary from page-one rows.
pub fn build_parcel(
    identity: &str,
    rows: &[RowRecord],
    thresholds: &Thresholds,
    certificate: CertificateInfo,
) -> ParcelEntity {
    let mut parcel = ParcelEntity::new(identity);
    parcel.certificate = certificate;

    let page_one: Vec<&RowRecord> = rows.iter().filter(|r| r.page == 1).collect();

    for field in SummaryField::ALL {
        let Some((row, score)) = best_row(&page_one, field.label()) else {
            continue;
        };
        if score < thresholds.get(field.threshold_key()) {
            continue;
        }
        if let Some(value) = value_of(row) {
            field.apply(&mut parcel, value);
        }
    }

    if parcel.land_type_text.is_none() {
        let window: Vec<&RowRecord> = page_one
            .iter()
            .copied()
            .filter(|r| (1..=3).contains(&r.row_number))
            .collect();
        let fallback = best_row(&window, SummaryField::LandType.label());
        if let Some(value) = fallback.and_then(|(row, _)| value_of(row)) {
            log::debug!("Summary: land type from fixed position");
            parcel.set_land_type(value);
        }
    }

    parcel.main_nature = main_nature(&page_one);

    if let Some((row, score)) = best_row(&page_one, IDENTITY_LABEL) {
        if score >= thresholds.get(ThresholdKey::IdentityLabel) {
            let printed: String = row.cell(1).chars().filter(|c| c.is_ascii_digit()).collect();
            if !printed.is_empty() && printed != identity {
                log::warn!(
                    "Identity row reads {} but the document validated as {}",
                    printed,
                    identity
                );
            }
        }
    }

    parcel
}

/// Main-property nature: the labelled row, else the last identity row.
fn main_nature(page_one: &[&RowRecord]) -> Option<String> {
    if let Some(row) = page_one.iter().find(|r| r.first_cell().contains(MAIN_NATURE_LABEL)) {
        let inline = row.first_cell().replace(MAIN_NATURE_LABEL, "");
        let inline = inline.trim();
        return value_of(row)
            .or((!inline.is_empty()).then_some(inline))
            .map(String::from);
    }
    page_one
        .iter()
        .rev()
        .find(|r| r.section.as_deref() == Some(IDENTITY_SECTION))
        .and_then(|r| value_of(r).map(String::from))
}
