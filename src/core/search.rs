//! In-memory embedding store with brute-force nearest-neighbour search.
//!
//! Records are kept in insertion order and every vector in a store shares one
//! dimension, either fixed at construction or taken from the first append.
//! Queries rank records by cosine distance and break ties by insertion order.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::embeddings::cosine_distance;

/// Errors raised by [`EmbeddingStore`] operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    /// Vector length disagrees with the store's dimension
    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimension established by the store.
        expected: usize,
        /// Length of the rejected vector.
        actual: usize,
    },

    /// Query against a store with no records
    #[error("Embedding store is empty")]
    EmptyStore,

    /// `k` must be at least 1
    #[error("Top-k must be at least 1")]
    InvalidTopK,

    /// Zero-length vectors cannot establish or match a dimension
    #[error("Embedding vector is empty")]
    EmptyVector,
}

/// A single stored embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingRecord {
    /// Caller-chosen identifier. Not required to be unique.
    pub id: String,
    /// The embedding values
    pub vector: Vec<f32>,
}

impl EmbeddingRecord {
    /// Creates a record from an id and its vector.
    pub fn new(id: impl Into<String>, vector: Vec<f32>) -> Self {
        Self {
            id: id.into(),
            vector,
        }
    }
}

/// One ranked query result, borrowing the matched record from the store.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchHit<'a> {
    /// Position of the record in insertion order
    pub index: usize,
    /// The matched record
    pub record: &'a EmbeddingRecord,
    /// Cosine distance to the query, in `[0, 2]`
    pub distance: f32,
}

/// Append-only store of embeddings sharing a single dimension.
#[derive(Debug, Clone, Default)]
pub struct EmbeddingStore {
    dimension: Option<usize>,
    records: Vec<EmbeddingRecord>,
}

impl EmbeddingStore {
    /// Creates an empty store whose dimension is taken from the first append.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store that only accepts vectors of `dimension` values.
    pub fn with_dimension(dimension: usize) -> Result<Self, SearchError> {
        if dimension == 0 {
            return Err(SearchError::EmptyVector);
        }
        Ok(Self {
            dimension: Some(dimension),
            records: Vec::new(),
        })
    }

    /// The established dimension, if any.
    pub fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the store holds no records
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All records in insertion order.
    pub fn records(&self) -> &[EmbeddingRecord] {
        &self.records
    }

    /// Record at `index` in insertion order.
    pub fn get(&self, index: usize) -> Option<&EmbeddingRecord> {
        self.records.get(index)
    }

    /// Appends a record.
    ///
    /// Duplicate ids are kept as distinct entries. On error the store is left
    /// unchanged.
    pub fn append(&mut self, record: EmbeddingRecord) -> Result<(), SearchError> {
        let actual = record.vector.len();
        if actual == 0 {
            return Err(SearchError::EmptyVector);
        }

        match self.dimension {
            Some(expected) if expected != actual => {
                return Err(SearchError::DimensionMismatch { expected, actual });
            }
            Some(_) => {}
            None => self.dimension = Some(actual),
        }

        self.records.push(record);
        Ok(())
    }

    /// Returns the `min(k, len)` records closest to `vector`, nearest first.
    ///
    /// Equal distances keep insertion order.
    pub fn query(&self, vector: &[f32], k: usize) -> Result<Vec<SearchHit<'_>>, SearchError> {
        if self.records.is_empty() {
            return Err(SearchError::EmptyStore);
        }
        if k == 0 {
            return Err(SearchError::InvalidTopK);
        }
        // A non-empty store always has an established dimension
        let expected = self.dimension.unwrap_or_default();
        if vector.len() != expected {
            return Err(SearchError::DimensionMismatch {
                expected,
                actual: vector.len(),
            });
        }

        let mut scored: Vec<(f32, usize)> = self
            .records
            .iter()
            .enumerate()
            .map(|(index, record)| (cosine_distance(vector, &record.vector), index))
            .collect();

        let k = k.min(scored.len());
        if k < scored.len() {
            scored.select_nth_unstable_by(k - 1, rank_order);
            scored.truncate(k);
        }
        scored.sort_unstable_by(rank_order);

        Ok(scored
            .into_iter()
            .map(|(distance, index)| SearchHit {
                index,
                record: &self.records[index],
                distance,
            })
            .collect())
    }
}

// Distance first, then insertion index. Indices are unique so the order is total.
fn rank_order(a: &(f32, usize), b: &(f32, usize)) -> Ordering {
    a.0.total_cmp(&b.0).then(a.1.cmp(&b.1))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_of(entries: &[(&str, &[f32])]) -> EmbeddingStore {
        let mut store = EmbeddingStore::new();
        for (id, vector) in entries {
            store
                .append(EmbeddingRecord::new(*id, vector.to_vec()))
                .unwrap();
        }
        store
    }

    fn ids(hits: &[SearchHit<'_>]) -> Vec<String> {
        hits.iter().map(|h| h.record.id.clone()).collect()
    }

    #[test]
    fn test_query_ranks_by_cosine_distance() {
        let store = store_of(&[("A", &[1.0, 0.0]), ("B", &[0.0, 1.0]), ("C", &[0.9, 0.1])]);

        let hits = store.query(&[1.0, 0.0], 2).unwrap();

        assert_eq!(ids(&hits), vec!["A", "C"]);
        assert!(hits[0].distance.abs() < 1e-6);
        assert!(hits[1].distance > hits[0].distance);
        assert_eq!(hits[0].index, 0);
        assert_eq!(hits[1].index, 2);
    }

    #[test]
    fn test_query_returns_min_of_k_and_len() {
        let store = store_of(&[("A", &[1.0, 0.0]), ("B", &[0.0, 1.0])]);

        assert_eq!(store.query(&[1.0, 1.0], 1).unwrap().len(), 1);
        assert_eq!(store.query(&[1.0, 1.0], 2).unwrap().len(), 2);
        assert_eq!(store.query(&[1.0, 1.0], 10).unwrap().len(), 2);
    }

    #[test]
    fn test_results_sorted_non_decreasing() {
        let store = store_of(&[
            ("a", &[0.1, 0.9, 0.3]),
            ("b", &[1.0, 0.0, 0.0]),
            ("c", &[-1.0, 0.2, 0.0]),
            ("d", &[0.5, 0.5, 0.5]),
            ("e", &[0.0, 0.0, 1.0]),
        ]);

        for k in 1..=5 {
            let hits = store.query(&[0.7, 0.2, 0.1], k).unwrap();
            assert_eq!(hits.len(), k);
            assert!(hits.windows(2).all(|w| w[0].distance <= w[1].distance));
        }
    }

    #[test]
    fn test_partial_selection_matches_full_ranking() {
        let store = store_of(&[
            ("a", &[0.1, 0.9]),
            ("b", &[1.0, 0.0]),
            ("c", &[-1.0, 0.2]),
            ("d", &[0.5, 0.5]),
            ("e", &[0.0, 1.0]),
            ("f", &[0.8, 0.3]),
        ]);

        let full = ids(&store.query(&[0.6, 0.4], 6).unwrap());
        let top3 = ids(&store.query(&[0.6, 0.4], 3).unwrap());
        assert_eq!(top3, full[..3].to_vec());
    }

    #[test]
    fn test_query_is_idempotent() {
        let store = store_of(&[("A", &[1.0, 0.0]), ("B", &[0.0, 1.0]), ("C", &[0.9, 0.1])]);

        let first = store.query(&[0.3, 0.7], 3).unwrap();
        let second = store.query(&[0.3, 0.7], 3).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_tie_break_keeps_insertion_order() {
        let store = store_of(&[("X", &[0.6, 0.8]), ("Y", &[0.6, 0.8])]);

        let hits = store.query(&[0.6, 0.8], 1).unwrap();
        assert_eq!(ids(&hits), vec!["X"]);

        let hits = store.query(&[0.6, 0.8], 2).unwrap();
        assert_eq!(ids(&hits), vec!["X", "Y"]);
    }

    #[test]
    fn test_tie_break_survives_partial_selection() {
        let mut store = EmbeddingStore::new();
        for i in 0..20 {
            store
                .append(EmbeddingRecord::new(format!("dup-{i}"), vec![1.0, 1.0]))
                .unwrap();
        }

        let hits = store.query(&[2.0, 2.0], 5).unwrap();
        assert_eq!(
            ids(&hits),
            vec!["dup-0", "dup-1", "dup-2", "dup-3", "dup-4"]
        );
    }

    #[test]
    fn test_zero_vector_reports_max_distance() {
        let store = store_of(&[("zero", &[0.0, 0.0])]);

        let hits = store.query(&[1.0, 0.0], 1).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].distance, 2.0);
    }

    #[test]
    fn test_zero_query_ranks_everything_equally() {
        let store = store_of(&[("A", &[1.0, 0.0]), ("B", &[0.0, 1.0])]);

        let hits = store.query(&[0.0, 0.0], 2).unwrap();
        assert_eq!(ids(&hits), vec!["A", "B"]);
        assert!(hits.iter().all(|h| h.distance == 2.0));
    }

    #[test]
    fn test_query_empty_store() {
        let store = EmbeddingStore::new();
        assert_eq!(store.query(&[1.0, 0.0], 1).unwrap_err(), SearchError::EmptyStore);

        let store = EmbeddingStore::with_dimension(2).unwrap();
        assert_eq!(store.query(&[1.0, 0.0], 1).unwrap_err(), SearchError::EmptyStore);
    }

    #[test]
    fn test_query_zero_k() {
        let store = store_of(&[("A", &[1.0, 0.0])]);
        assert_eq!(store.query(&[1.0, 0.0], 0).unwrap_err(), SearchError::InvalidTopK);
    }

    #[test]
    fn test_query_dimension_mismatch() {
        let store = store_of(&[("A", &[1.0, 0.0])]);

        assert_eq!(
            store.query(&[1.0, 0.0, 0.0], 1).unwrap_err(),
            SearchError::DimensionMismatch {
                expected: 2,
                actual: 3
            }
        );
    }

    #[test]
    fn test_append_infers_dimension() {
        let mut store = EmbeddingStore::new();
        assert_eq!(store.dimension(), None);

        store.append(EmbeddingRecord::new("A", vec![1.0, 2.0, 3.0])).unwrap();
        assert_eq!(store.dimension(), Some(3));

        let err = store
            .append(EmbeddingRecord::new("B", vec![1.0, 2.0]))
            .unwrap_err();
        assert_eq!(
            err,
            SearchError::DimensionMismatch {
                expected: 3,
                actual: 2
            }
        );
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_with_dimension_enforced_from_start() {
        let mut store = EmbeddingStore::with_dimension(4).unwrap();
        assert_eq!(store.dimension(), Some(4));

        assert!(matches!(
            store.append(EmbeddingRecord::new("A", vec![1.0; 3])),
            Err(SearchError::DimensionMismatch { expected: 4, actual: 3 })
        ));
        assert!(store.is_empty());

        store.append(EmbeddingRecord::new("A", vec![1.0; 4])).unwrap();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_empty_vectors_rejected() {
        assert_eq!(
            EmbeddingStore::with_dimension(0).unwrap_err(),
            SearchError::EmptyVector
        );

        let mut store = EmbeddingStore::new();
        assert_eq!(
            store.append(EmbeddingRecord::new("A", Vec::new())).unwrap_err(),
            SearchError::EmptyVector
        );
        assert_eq!(store.dimension(), None);
    }

    #[test]
    fn test_duplicate_ids_are_distinct_entries() {
        let store = store_of(&[("same", &[1.0, 0.0]), ("same", &[0.0, 1.0])]);

        assert_eq!(store.len(), 2);
        let hits = store.query(&[0.0, 1.0], 2).unwrap();
        assert_eq!(hits[0].index, 1);
        assert_eq!(hits[1].index, 0);
    }

    #[test]
    fn test_append_preserves_existing_records() {
        let mut store = store_of(&[("A", &[1.0, 0.0])]);
        let before = store.records().to_vec();

        store.append(EmbeddingRecord::new("B", vec![0.0, 1.0])).unwrap();
        let _ = store.append(EmbeddingRecord::new("bad", vec![1.0]));

        assert_eq!(&store.records()[..1], before.as_slice());
        assert_eq!(store.get(1).map(|r| r.id.as_str()), Some("B"));
        assert_eq!(store.get(2), None);
    }

    #[test]
    fn test_non_finite_vectors_sort_last() {
        let store = store_of(&[
            ("nan", &[f32::NAN, 0.0]),
            ("inf", &[f32::INFINITY, 0.0]),
            ("A", &[0.0, 1.0]),
        ]);

        let hits = store.query(&[1.0, 0.0], 3).unwrap();
        assert_eq!(ids(&hits), vec!["A", "nan", "inf"]);
        assert_eq!(hits[1].distance, 2.0);
        assert_eq!(hits[2].distance, 2.0);
    }

    #[test]
    fn test_extreme_magnitudes_rank_by_direction() {
        let store = store_of(&[("orth", &[0.0, 1.0]), ("tiny", &[1e-25, 0.0])]);
        let hits = store.query(&[1.0, 0.0], 2).unwrap();
        assert_eq!(ids(&hits), vec!["tiny", "orth"]);
        assert!(hits[0].distance.abs() < 1e-6);

        let store = store_of(&[("near", &[1.0, 0.5]), ("big", &[1e20, 0.0])]);
        let hits = store.query(&[1.0, 0.0], 2).unwrap();
        assert_eq!(ids(&hits), vec!["big", "near"]);
        assert!(hits[0].distance.abs() < 1e-6);
        assert!((hits[1].distance - 0.105573).abs() < 1e-4);
    }
}
