//! Parcel identity and summary attributes.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::text::fold;

/// Land type of a parcel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LandType {
    /// Plain parcel (ana taşınmaz)
    #[default]
    Parcel,
    /// Floor easement (kat irtifakı)
    FloorEasement,
    /// Floor ownership (kat mülkiyeti)
    FloorOwnership,
}

impl LandType {
    /// Derive the land type from the certificate's "Zemin Tipi" text.
    pub fn from_text(text: &str) -> Self {
        let folded = fold(text);
        if folded.contains("KAT MULKIYETI") {
            LandType::FloorOwnership
        } else if folded.contains("KAT IRTIFAKI") {
            LandType::FloorEasement
        } else {
            LandType::Parcel
        }
    }

    /// Whether the parcel is an independent unit in a building.
    pub fn is_unit(&self) -> bool {
        !matches!(self, LandType::Parcel)
    }
}

/// Block/floor/entrance/unit descriptor of an independent unit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitDescriptor {
    pub block: Option<String>,
    pub floor: Option<String>,
    pub entrance: Option<String>,
    pub unit_number: Option<String>,
}

impl UnitDescriptor {
    /// Split a `Blok/Kat/Giriş/BBNo` value such as `A/3/1/12`.
    pub fn parse(text: &str) -> Self {
        let parts: Vec<Option<String>> = text
            .split('/')
            .map(|p| {
                let p = p.trim();
                (!p.is_empty()).then(|| p.to_string())
            })
            .collect();
        let part = |i: usize| parts.get(i).cloned().flatten();
        Self {
            block: part(0),
            floor: part(1),
            entrance: part(2),
            unit_number: if parts.len() > 1 {
                parts.last().cloned().flatten()
            } else {
                None
            },
        }
    }
}

/// Certificate issue timestamp as printed in the page-one corner.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CertificateInfo {
    /// Raw stamp, e.g. `17-1-2024-14:35`
    pub raw: Option<String>,
    /// Parsed timestamp
    pub issued_at: Option<NaiveDateTime>,
}

impl CertificateInfo {
    /// Parse a `d-m-yyyy-hh:mm` stamp.
    pub fn from_stamp(raw: &str) -> Self {
        let issued_at = NaiveDateTime::parse_from_str(raw.trim(), "%d-%m-%Y-%H:%M").ok();
        if issued_at.is_none() {
            log::warn!("Unparseable certificate stamp: {}", raw);
        }
        Self {
            raw: Some(raw.trim().to_string()),
            issued_at,
        }
    }
}

/// One parcel, created once per unique identity.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParcelEntity {
    /// Unique numeric parcel identity (Taşınmaz Kimlik No)
    pub identity: String,
    /// Raw "Zemin Tipi" value
    pub land_type_text: Option<String>,
    /// Derived land type
    pub land_type: LandType,
    pub province_district: Option<String>,
    pub institution: Option<String>,
    pub neighbourhood: Option<String>,
    pub locality: Option<String>,
    pub volume_page: Option<String>,
    pub record_status: Option<String>,
    /// Raw "Ada/Parsel" value
    pub block_parcel: Option<String>,
    pub block_no: Option<String>,
    pub parcel_no: Option<String>,
    /// Land area in m²
    pub area: Option<String>,
    /// Independent unit nature (e.g. "Mesken")
    pub unit_nature: Option<String>,
    pub unit_gross_area: Option<String>,
    pub unit_net_area: Option<String>,
    /// Raw "Blok/Kat/Giriş/BBNo" value
    pub unit_text: Option<String>,
    pub unit: UnitDescriptor,
    /// Land share fraction (arsa pay/payda)
    pub land_share: Option<String>,
    /// Nature of the main property
    pub main_nature: Option<String>,
    /// Certificate issue timestamp
    pub certificate: CertificateInfo,
}

impl ParcelEntity {
    /// Create a parcel with only its identity set.
    pub fn new(identity: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            ..Default::default()
        }
    }

    /// Set the block/parcel text and split it into numbers.
    pub fn set_block_parcel(&mut self, text: &str) {
        let mut parts = text.splitn(2, '/').map(str::trim);
        self.block_no = parts.next().filter(|p| !p.is_empty()).map(String::from);
        self.parcel_no = parts.next().filter(|p| !p.is_empty()).map(String::from);
        self.block_parcel = Some(text.to_string());
    }

    /// Set the land type text and derive the land type.
    pub fn set_land_type(&mut self, text: &str) {
        self.land_type = LandType::from_text(text);
        self.land_type_text = Some(text.to_string());
    }

    /// Set the unit text and split it into descriptors.
    pub fn set_unit(&mut self, text: &str) {
        self.unit = UnitDescriptor::parse(text);
        self.unit_text = Some(text.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_land_type_from_text() {
        assert_eq!(LandType::from_text("Kat Mülkiyeti"), LandType::FloorOwnership);
        assert_eq!(LandType::from_text("KAT İRTİFAKI"), LandType::FloorEasement);
        assert_eq!(LandType::from_text("Ana Taşınmaz"), LandType::Parcel);
        assert!(LandType::FloorEasement.is_unit());
    }

    #[test]
    fn test_unit_descriptor_parse() {
        let unit = UnitDescriptor::parse("A/3/1/12");
        assert_eq!(unit.block.as_deref(), Some("A"));
        assert_eq!(unit.floor.as_deref(), Some("3"));
        assert_eq!(unit.entrance.as_deref(), Some("1"));
        assert_eq!(unit.unit_number.as_deref(), Some("12"));

        let unit = UnitDescriptor::parse("/ZEMİN/ /4");
        assert_eq!(unit.block, None);
        assert_eq!(unit.floor.as_deref(), Some("ZEMİN"));
        assert_eq!(unit.entrance, None);
        assert_eq!(unit.unit_number.as_deref(), Some("4"));
    }

    #[test]
    fn test_block_parcel_split() {
        let mut parcel = ParcelEntity::new("1234");
        parcel.set_block_parcel("101 / 7");
        assert_eq!(parcel.block_no.as_deref(), Some("101"));
        assert_eq!(parcel.parcel_no.as_deref(), Some("7"));
    }

    #[test]
    fn test_certificate_stamp() {
        let info = CertificateInfo::from_stamp("17-1-2024-14:35");
        let issued = info.issued_at.unwrap();
        assert_eq!(issued.format("%Y-%m-%d %H:%M").to_string(), "2024-01-17 14:35");

        let info = CertificateInfo::from_stamp("yarın");
        assert!(info.issued_at.is_none());
        assert_eq!(info.raw.as_deref(), Some("yarın"));
    }
}
