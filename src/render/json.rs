//! JSON rendering for processed certificates and profiles.

use serde::Serialize;

use crate::error::{Error, Result};

/// JSON output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonFormat {
    /// Pretty-printed JSON with indentation
    #[default]
    Pretty,
    /// Compact JSON without extra whitespace
    Compact,
}

/// Serialize any pipeline output to JSON.
pub fn to_json<T: Serialize + ?Sized>(value: &T, format: JsonFormat) -> Result<String> {
    let result = match format {
        JsonFormat::Pretty => serde_json::to_string_pretty(value),
        JsonFormat::Compact => serde_json::to_string(value),
    };

    result.map_err(|e| Error::Render(format!("JSON serialization error: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ParcelEntity, RowRecord};

    #[test]
    fn test_parcel_pretty() {
        let mut parcel = ParcelEntity::new("123456789");
        parcel.set_land_type("Kat İrtifakı");

        let json = to_json(&parcel, JsonFormat::Pretty).unwrap();
        assert!(json.contains("\"identity\": \"123456789\""));
        assert!(json.contains("floor_easement"));
        assert!(json.contains('\n'));
    }

    #[test]
    fn test_rows_compact() {
        let rows = vec![RowRecord::new(0, 2, 0, &["Ahmet", "1/2"])];
        let json = to_json(&rows, JsonFormat::Compact).unwrap();
        assert!(!json.contains('\n'));
        assert!(json.contains("\"state\":\"DATA\""));
    }
}
