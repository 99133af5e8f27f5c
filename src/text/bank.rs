//! Tax-id → institution directory.
//!
//! The directory is append-only: a tax id, once known, keeps its name. It
//! is persisted as a pretty-printed JSON object and rewritten in full on
//! every addition. Mutation goes through `&mut self`, so appends from
//! several documents are serialized by whoever owns the directory.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::Result;

use super::similarity::{fold, ratio};

/// Institutions known out of the box.
const DEFAULT_BANKS: &[(&str, &str)] = &[
    ("4810058590", "Türkiye İş Bankası A.Ş."),
    ("9980069675", "Türkiye Cumhuriyeti Ziraat Bankası A.Ş."),
    ("8790017566", "Türkiye Garanti Bankası A.Ş."),
    ("9370014354", "Yapı ve Kredi Bankası A.Ş."),
    ("9370020892", "Yapı ve Kredi Bankası A.Ş."),
    ("0150015264", "Akbank T.A.Ş."),
    ("9220039789", "Türkiye Vakıflar Bankası T.A.O."),
    ("9220034970", "Türkiye Vakıflar Bankası T.A.O."),
    ("4290049462", "Türkiye Halk Bankası A.Ş."),
    ("4560004685", "Türkiye Halk Bankası A.Ş."),
    ("7840068284", "QNB Finansbank A.Ş."),
    ("3880023334", "QNB Finansbank A.Ş."),
    ("7590039478", "Denizbank A.Ş."),
    ("2920084496", "Denizbank A.Ş."),
    ("0680015990", "HSBC Bank A.Ş."),
    ("3250060039", "ING Bank A.Ş."),
    ("2920084764", "Türk Ekonomi Bankası A.Ş."),
    ("8760043420", "Türk Ekonomi Bankası A.Ş."),
    ("0750056946", "Anadolubank A.Ş."),
    ("2860013350", "Şekerbank T.A.Ş."),
    ("8010048575", "Şekerbank T.A.Ş."),
    ("2040042843", "Alternatifbank A.Ş."),
    ("4580037181", "Fibabanka A.Ş."),
    ("2090007808", "Fibabanka A.Ş."),
    ("3580065777", "Kuveyt Türk Katılım Bankası A.Ş."),
    ("6000026814", "Kuveyt Türk Katılım Bankası A.Ş."),
    ("9800148343", "Ziraat Katılım Bankası A.Ş."),
    ("9980793117", "Ziraat Katılım Bankası A.Ş."),
    ("0630201483", "Albaraka Türk Katılım Bankası A.Ş."),
    ("9860233352", "Vakıf Katılım Bankası A.Ş."),
    ("6110312806", "Maliye Hazinesi"),
    ("7960069236", "Türkiye Finans Katılım Bankası A.Ş."),
    ("6290068498", "Emlak Katılım Bankası A.Ş."),
    ("1400032310", "Burgan Bank A.Ş."),
    ("3010006447", "İller Bankası A.Ş."),
    ("6490408527", "Citibank A.Ş."),
    ("8010015359", "Deutsche Bank A.Ş."),
];

/// Persisted tax-id → canonical name mapping.
#[derive(Debug, Clone, Default)]
pub struct BankDirectory {
    entries: BTreeMap<String, String>,
    path: Option<PathBuf>,
}

impl BankDirectory {
    /// Directory with the built-in entries and no backing file.
    pub fn with_defaults() -> Self {
        let entries = DEFAULT_BANKS
            .iter()
            .map(|(vkn, name)| (vkn.to_string(), name.to_string()))
            .collect();
        Self {
            entries,
            path: None,
        }
    }

    /// Empty in-memory directory.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Load the directory file, seeding it with the defaults when it is
    /// missing or unreadable.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let loaded = fs::read_to_string(&path)
            .ok()
            .and_then(|raw| match serde_json::from_str::<BTreeMap<String, String>>(&raw) {
                Ok(entries) => Some(entries),
                Err(e) => {
                    log::warn!("Bank directory {} is invalid ({}), reseeding", path.display(), e);
                    None
                }
            });

        match loaded {
            Some(entries) => {
                log::debug!("Loaded {} bank entries from {}", entries.len(), path.display());
                Ok(Self {
                    entries,
                    path: Some(path),
                })
            }
            None => {
                let mut directory = Self::with_defaults();
                directory.path = Some(path);
                directory.save()?;
                Ok(directory)
            }
        }
    }

    /// Canonical name for a tax id.
    pub fn get(&self, vkn: &str) -> Option<&str> {
        self.entries.get(vkn).map(String::as_str)
    }

    pub fn contains(&self, vkn: &str) -> bool {
        self.entries.contains_key(vkn)
    }

    /// Record a new tax id. Known ids are left untouched.
    ///
    /// Returns `true` when the directory grew.
    pub fn add(&mut self, vkn: &str, name: &str) -> Result<bool> {
        let vkn = vkn.trim();
        let name = name.trim();
        if vkn.is_empty() || name.is_empty() || self.entries.contains_key(vkn) {
            return Ok(false);
        }
        self.entries.insert(vkn.to_string(), name.to_string());
        log::debug!("New institution {} -> {}", vkn, name);
        self.save()?;
        Ok(true)
    }

    /// Best canonical name whose folded similarity to `text` exceeds
    /// `threshold`.
    pub fn resolve_similar(&self, text: &str, threshold: f64) -> Option<&str> {
        let probe = fold(text);
        if probe.is_empty() {
            return None;
        }
        let mut best: Option<(&str, f64)> = None;
        for name in self.entries.values() {
            let score = ratio(&probe, &fold(name));
            if score > threshold && best.map_or(true, |(_, b)| score > b) {
                best = Some((name, score));
            }
        }
        best.map(|(name, _)| name)
    }

    /// Write the whole directory to its backing file, if any.
    pub fn save(&self) -> Result<()> {
        if let Some(path) = &self.path {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, serde_json::to_string_pretty(&self.entries)?)?;
        }
        Ok(())
    }

    /// Entries ordered by tax id.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}
