//! Mortgage entries read from the mortgage and share tables.

use serde::{Deserialize, Serialize};

/// Establishment (tesis) reference of a mortgage.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Establishment {
    /// Registry office
    pub office: Option<String>,
    /// Date as `dd-mm-yyyy hh:mm`
    pub date: Option<String>,
    /// Journal number
    pub journal_no: Option<String>,
}

/// One mortgage entry of a parcel.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MortgageRecord {
    /// Owning parcel identity
    pub parcel: String,
    /// Page the entry was read from
    pub page: u32,
    /// Lender name (normalized)
    pub lender: String,
    /// Co-debtor flag as printed ("Evet"/"Hayır")
    pub co_debtor: String,
    /// Mortgage amount
    pub amount: String,
    /// Interest description
    pub interest: String,
    /// Rank (derece/sıra)
    pub rank: String,
    /// Tenor
    pub tenor: String,
    /// Raw establishment text
    pub establishment_text: String,
    /// Parsed establishment reference
    pub establishment: Establishment,
    /// Property described in the share table
    pub property: String,
    /// Share fraction (hisse pay/payda)
    pub share: String,
    /// Debtor/owner description
    pub debtor: String,
    /// Owner debt
    pub owner_debt: String,
    /// Registration (tescil) text
    pub registration: String,
    /// Cancellation (terkin) text
    pub cancellation: String,
    /// Serial tag linking the entry to a shareholder row
    pub serial_tag: Option<String>,
    /// Whether zone extraction passed validation
    pub complete: bool,
}

impl MortgageRecord {
    /// Create an empty record for a parcel page.
    pub fn new(parcel: impl Into<String>, page: u32) -> Self {
        Self {
            parcel: parcel.into(),
            page,
            ..Default::default()
        }
    }

    /// Whether the record carries no field values at all.
    pub fn is_empty(&self) -> bool {
        self.serial_tag.is_none()
            && [
                &self.lender,
                &self.co_debtor,
                &self.amount,
                &self.interest,
                &self.rank,
                &self.tenor,
                &self.establishment_text,
                &self.property,
                &self.share,
                &self.debtor,
                &self.owner_debt,
                &self.registration,
                &self.cancellation,
            ]
            .iter()
            .all(|v| v.trim().is_empty())
    }
}
