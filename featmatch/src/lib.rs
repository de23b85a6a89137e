//! Binary feature descriptors and k-nearest-neighbor matching primitives.
//!
//! # Architecture
//!
//! Matching proceeds in three stages:
//!
//! 1. [`hamming`]: popcount distance between two 256-bit descriptors
//! 2. [`DescriptorMatcher::knn`]: per-query-descriptor ranked nearest
//!    neighbors against one reference set
//! 3. [`ratio_filter`]: Lowe's ratio test over the raw KNN rows, keeping
//!    only unambiguous [`MatchPair`]s
//!
//! [`BruteForceMatcher`] is the bundled reference implementation of the
//! matcher contract: an exhaustive Hamming scan, deterministic for a given
//! input. Alternative backends (FLANN-style indexes, GPU matchers) plug in
//! behind the same trait.

mod descriptor;
mod distance;
mod error;
mod matcher;
mod ratio;

pub use descriptor::{Descriptor, Features, Keypoint, DESCRIPTOR_BYTES};
pub use distance::hamming;
pub use error::MatchError;
pub use matcher::{BruteForceMatcher, DescriptorMatcher, MatchPair, Neighbor};
pub use ratio::ratio_filter;
