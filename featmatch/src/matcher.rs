use serde::{Deserialize, Serialize};

use crate::descriptor::Descriptor;
use crate::distance::hamming;
use crate::error::MatchError;

/// One reference descriptor ranked against a query descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    /// Index into the reference descriptor set.
    pub index: usize,

    /// Distance between the query and reference descriptor.
    /// Lower values indicate higher similarity.
    pub distance: f32,
}

/// The two nearest reference descriptors for one query descriptor,
/// ordered ascending by distance.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchPair {
    /// Index into the query descriptor set.
    pub query: usize,
    /// Closest reference descriptor.
    pub best: Neighbor,
    /// Second-closest reference descriptor.
    pub second: Neighbor,
}

/// DescriptorMatcher is the interface for k-nearest-neighbor search of
/// query descriptors against one reference descriptor set.
///
/// All implementations must be safe for concurrent use (Send + Sync).
pub trait DescriptorMatcher: Send + Sync {
    /// Returns one row per query descriptor, each row holding the `k`
    /// nearest reference descriptors ordered ascending by distance.
    ///
    /// Rows are shorter than `k` when the reference set has fewer than `k`
    /// descriptors. The reference set must not be empty.
    fn knn(
        &self,
        query: &[Descriptor],
        reference: &[Descriptor],
        k: usize,
    ) -> Result<Vec<Vec<Neighbor>>, MatchError>;
}

/// Exhaustive Hamming-distance matcher.
///
/// Scans every reference descriptor for every query descriptor. Intended
/// for moderate reference set sizes (a few thousand descriptors); larger
/// sets want an index-backed [`DescriptorMatcher`] implementation.
///
/// Ties in distance resolve to the lower reference index, so output is
/// deterministic for a given input.
#[derive(Debug, Default)]
pub struct BruteForceMatcher;

impl BruteForceMatcher {
    pub fn new() -> Self {
        Self
    }
}

impl DescriptorMatcher for BruteForceMatcher {
    fn knn(
        &self,
        query: &[Descriptor],
        reference: &[Descriptor],
        k: usize,
    ) -> Result<Vec<Vec<Neighbor>>, MatchError> {
        if k == 0 {
            return Err(MatchError::ZeroK);
        }
        if reference.is_empty() {
            return Err(MatchError::EmptyReference);
        }

        let mut rows = Vec::with_capacity(query.len());
        for q in query {
            let mut dists: Vec<(usize, u32)> = reference
                .iter()
                .enumerate()
                .map(|(i, r)| (i, hamming(q, r)))
                .collect();
            // Stable sort over index-ordered input: equal distances keep
            // ascending reference index.
            dists.sort_by_key(|&(_, d)| d);

            rows.push(
                dists
                    .into_iter()
                    .take(k)
                    .map(|(index, d)| Neighbor {
                        index,
                        distance: d as f32,
                    })
                    .collect(),
            );
        }

        Ok(rows)
    }
}
