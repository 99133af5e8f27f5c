//! Plain text report of a parcel profile.

use std::fmt::{self, Write};

use crate::error::{Error, Result};
use crate::reconcile::ParcelProfile;

fn line(out: &mut String, label: &str, value: Option<&str>) -> fmt::Result {
    match value.filter(|v| !v.is_empty()) {
        Some(value) => writeln!(out, "{:<14}{}", label, value),
        None => Ok(()),
    }
}

fn write_report(out: &mut String, profile: &ParcelProfile) -> fmt::Result {
    let parcel = &profile.parcel;

    writeln!(out, "Parcel {}", parcel.identity)?;
    line(out, "Land type:", parcel.land_type_text.as_deref())?;
    line(out, "Province:", parcel.province_district.as_deref())?;
    line(out, "Neighbourhood:", parcel.neighbourhood.as_deref())?;
    line(out, "Block/parcel:", parcel.block_parcel.as_deref())?;
    line(out, "Area:", parcel.area.as_deref())?;
    line(out, "Unit:", parcel.unit_text.as_deref())?;
    line(out, "Main nature:", parcel.main_nature.as_deref())?;
    let issued = parcel
        .certificate
        .issued_at
        .map(|d| d.format("%d.%m.%Y %H:%M").to_string());
    line(out, "Issued:", issued.as_deref())?;

    writeln!(out, "\nOwners ({})", profile.owners.len())?;
    for owner in &profile.owners {
        writeln!(out, "  - {}  {}", owner.first_cell(), owner.cell(1))?;
    }

    writeln!(out, "\nEncumbrances ({})", profile.encumbrances.len())?;
    for e in &profile.encumbrances {
        write!(out, "  [{}] {}", e.kind.label(), e.text)?;
        if let Some(journal) = &e.journal {
            write!(out, " (Yev. {} {})", journal.number, journal.date)?;
        }
        out.push('\n');
    }

    writeln!(out, "\nMortgages ({})", profile.mortgages.len())?;
    for m in &profile.mortgages {
        writeln!(out, "  - {}  {}  rank {}", m.lender, m.amount, m.rank)?;
    }

    writeln!(out, "\nRisk score: {}", profile.risk_score)
}

/// Render a profile as a human-readable report.
pub fn to_text(profile: &ParcelProfile) -> Result<String> {
    let mut out = String::new();
    write_report(&mut out, profile)
        .map_err(|e| Error::Render(format!("text report error: {}", e)))?;
    Ok(out.trim_end().to_string())
}
