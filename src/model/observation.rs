//! Raw label/coordinate observations used to repair key collisions.

use serde::{Deserialize, Serialize};

use super::row::ordering_key;

/// A positioned text span remembered for later re-matching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordinateObservation {
    /// Capture order within the document
    pub seq: u32,
    /// Parcel identity
    pub parcel: String,
    /// Page number (1-indexed)
    pub page: u32,
    /// Trimmed span text
    pub text: String,
    /// Vertical position
    pub y: f64,
    /// Ordering key derived from page and y
    pub key: i64,
    /// Row that consumed this observation
    pub consumed_by: Option<u32>,
}

impl CoordinateObservation {
    pub fn new(seq: u32, parcel: impl Into<String>, page: u32, text: impl Into<String>, y: f64) -> Self {
        Self {
            seq,
            parcel: parcel.into(),
            page,
            text: text.into(),
            y,
            key: ordering_key(page, y),
            consumed_by: None,
        }
    }

    pub fn is_consumed(&self) -> bool {
        self.consumed_by.is_some()
    }
}

/// Observations of one document, in capture order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObservationPool {
    observations: Vec<CoordinateObservation>,
}

impl ObservationPool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_observations(mut observations: Vec<CoordinateObservation>) -> Self {
        observations.sort_by_key(|o| o.seq);
        Self { observations }
    }

    /// Append an observation with the next sequence number.
    pub fn push(&mut self, parcel: &str, page: u32, text: &str, y: f64) {
        let seq = self.observations.len() as u32;
        self.observations
            .push(CoordinateObservation::new(seq, parcel, page, text, y));
    }

    /// Consume the earliest unconsumed observation whose text equals `text`.
    pub fn consume_exact(
        &mut self,
        parcel: &str,
        page: u32,
        text: &str,
        row_seq: u32,
    ) -> Option<&CoordinateObservation> {
        let found = self.observations.iter_mut().find(|o| {
            !o.is_consumed() && o.parcel == parcel && o.page == page && o.text == text
        })?;
        found.consumed_by = Some(row_seq);
        Some(&*found)
    }

    /// Look up an observation by text for a parcel without consuming it.
    ///
    /// Exact matches win; otherwise an observation that starts with `text`
    /// is accepted when `text` is at least three characters long.
    pub fn find_for_text(&self, parcel: &str, text: &str) -> Option<&CoordinateObservation> {
        let mut candidates = self.observations.iter().filter(|o| o.parcel == parcel);
        if let Some(exact) = candidates.clone().find(|o| o.text == text) {
            return Some(exact);
        }
        if text.chars().count() < 3 {
            return None;
        }
        candidates.find(|o| o.text.starts_with(text))
    }

    /// Drop observations nothing consumed.
    pub fn discard_unconsumed(&mut self) -> usize {
        let before = self.observations.len();
        self.observations.retain(|o| o.is_consumed());
        before - self.observations.len()
    }

    pub fn observations(&self) -> &[CoordinateObservation] {
        &self.observations
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn into_observations(self) -> Vec<CoordinateObservation> {
        self.observations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool() -> ObservationPool {
        let mut pool = ObservationPool::new();
        pool.push("100", 2, "Ahmet Yılmaz", 140.0);
        pool.push("100", 2, "Ahmet Yılmaz", 180.0);
        pool.push("100", 3, "Banka Şerhi", 60.0);
        pool
    }

    #[test]
    fn test_consume_exact_in_capture_order() {
        let mut pool = pool();
        let first = pool.consume_exact("100", 2, "Ahmet Yılmaz", 7).unwrap();
        assert_eq!(first.y, 140.0);
        let second = pool.consume_exact("100", 2, "Ahmet Yılmaz", 8).unwrap();
        assert_eq!(second.y, 180.0);
        assert!(pool.consume_exact("100", 2, "Ahmet Yılmaz", 9).is_none());
        assert!(pool.consume_exact("100", 3, "Ahmet Yılmaz", 9).is_none());
    }

    #[test]
    fn test_find_for_text_prefers_exact() {
        let pool = pool();
        assert_eq!(pool.find_for_text("100", "Banka Şerhi").unwrap().page, 3);
        assert_eq!(pool.find_for_text("100", "Banka").unwrap().page, 3);
        assert!(pool.find_for_text("100", "Ba").is_none());
        assert!(pool.find_for_text("200", "Banka").is_none());
    }

    #[test]
    fn test_discard_unconsumed() {
        let mut pool = pool();
        pool.consume_exact("100", 3, "Banka Şerhi", 1);
        assert_eq!(pool.discard_unconsumed(), 2);
        assert_eq!(pool.len(), 1);
    }
}
