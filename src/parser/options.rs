//! Pipeline options and configuration.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

use super::zones::ZoneLayout;

/// Names of every tunable similarity threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThresholdKey {
    /// Fuzzy institution-name resolution (strictly greater)
    BankName,
    /// Row classifier: first cell against page-one field labels
    PageOneLabel,
    /// Row classifier: cell against a header archetype column
    HeaderArchetype,
    /// Identity-section labelling of page-one rows
    IdentitySectionLabel,
    /// "Taşınmaz Kimlik No:" row lookup
    IdentityLabel,
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

impl ThresholdKey {
    /// Built-in value for the key.
    pub fn default_value(&self) -> f64 {
        match self {
            ThresholdKey::BankName => 0.95,
            ThresholdKey::PageOneLabel | ThresholdKey::HeaderArchetype => 0.80,
            ThresholdKey::IdentitySectionLabel => 0.95,
            ThresholdKey::IdentityLabel => 0.85,
            ThresholdKey::LandType
            | ThresholdKey::ProvinceDistrict
            | ThresholdKey::Institution
            | ThresholdKey::Neighbourhood
            | ThresholdKey::Locality
            | ThresholdKey::VolumePage
            | ThresholdKey::RecordStatus
            | ThresholdKey::BlockParcel => 0.60,
            ThresholdKey::Area => 0.80,
            ThresholdKey::UnitNature | ThresholdKey::UnitGrossArea | ThresholdKey::UnitNetArea => {
                0.98
            }
            ThresholdKey::UnitDescriptor | ThresholdKey::LandShare => 0.50,
        }
    }
}

/// Table of (field, threshold) pairs; unset keys use their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Thresholds {
    overrides: BTreeMap<ThresholdKey, f64>,
}

impl Thresholds {
    /// Create a table with only defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Threshold for a key.
    pub fn get(&self, key: ThresholdKey) -> f64 {
        self.overrides
            .get(&key)
            .copied()
            .unwrap_or_else(|| key.default_value())
    }

    /// Override one threshold.
    pub fn with(mut self, key: ThresholdKey, value: f64) -> Self {
        self.overrides.insert(key, value);
        self
    }

    /// Overridden entries.
    pub fn overrides(&self) -> impl Iterator<Item = (ThresholdKey, f64)> + '_ {
        self.overrides.iter().map(|(k, v)| (*k, *v))
    }
}

/// Options for processing certificates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineOptions {
    /// Similarity thresholds
    pub thresholds: Thresholds,

    /// Fixed mortgage/share zones
    pub zones: ZoneLayout,

    /// Row height assumed when a row's position cannot be recovered
    pub average_row_height: f64,

    /// Allowed font-size deviation for learned headers
    pub header_size_tolerance: f64,

    /// Rightmost x origin of a learned header
    pub header_max_x: f64,

    /// Minimum word count of a learned header
    pub header_min_words: usize,

    /// How many rows the neighbour repair looks in each direction
    pub neighbor_window: usize,

    /// Minimum page text length for mortgage detection
    pub mortgage_min_text: usize,

    /// Mandatory page-one labels that must be present
    pub min_mandatory_labels: usize,

    /// Bank directory file; `None` keeps the built-in list in memory
    pub bank_directory: Option<PathBuf>,
}

impl PipelineOptions {
    /// Create new options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load options from a JSON file; missing fields use defaults.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)?;
        let options: Self = serde_json::from_str(&raw)
            .map_err(|e| Error::InvalidConfig(format!("{}: {}", path.display(), e)))?;
        options.validate()?;
        Ok(options)
    }

    /// Check that every value is in range.
    pub fn validate(&self) -> Result<()> {
        for (key, value) in self.thresholds.overrides() {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::InvalidConfig(format!(
                    "threshold {:?} = {} is outside [0, 1]",
                    key, value
                )));
            }
        }
        if self.average_row_height <= 0.0 {
            return Err(Error::InvalidConfig(
                "average_row_height must be positive".to_string(),
            ));
        }
        if self.neighbor_window == 0 {
            return Err(Error::InvalidConfig(
                "neighbor_window must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Threshold for a key.
    pub fn threshold(&self, key: ThresholdKey) -> f64 {
        self.thresholds.get(key)
    }

    /// Override one threshold.
    pub fn with_threshold(mut self, key: ThresholdKey, value: f64) -> Self {
        self.thresholds = self.thresholds.with(key, value);
        self
    }

    /// Set the zone layout.
    pub fn with_zones(mut self, zones: ZoneLayout) -> Self {
        self.zones = zones;
        self
    }

    /// Set the fallback row height.
    pub fn with_average_row_height(mut self, height: f64) -> Self {
        self.average_row_height = height;
        self
    }

    /// Set the neighbour repair window.
    pub fn with_neighbor_window(mut self, window: usize) -> Self {
        self.neighbor_window = window;
        self
    }

    /// Persist the bank directory at `path`.
    pub fn with_bank_directory(mut self, path: impl Into<PathBuf>) -> Self {
        self.bank_directory = Some(path.into());
        self
    }

    /// Set the learned-header size tolerance.
    pub fn with_header_size_tolerance(mut self, tolerance: f64) -> Self {
        self.header_size_tolerance = tolerance;
        self
    }
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            thresholds: Thresholds::default(),
            zones: ZoneLayout::default(),
            average_row_height: 20.0,
            header_size_tolerance: 1.0,
            header_max_x: 50.0,
            header_min_words: 3,
            neighbor_window: 6,
            mortgage_min_text: 50,
            min_mandatory_labels: 3,
            bank_directory: None,
        }
    }
}
