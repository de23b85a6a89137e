//! In-memory registry of labeled face signatures with concurrent recognition.
//!
//! # Architecture
//!
//! Recognition runs in four stages per [`Facebase::detect`] call:
//!
//! 1. [`FeatureExtractor::extract`]: image bytes -> keypoints + descriptors
//! 2. Snapshot + shard: the registered faces are copied under the lock and
//!    partitioned into contiguous shards, one per worker thread
//! 3. Fork-join matching: each worker runs 2-nearest-neighbor descriptor
//!    matching for every face in its shard; the join barrier completes
//!    before any result is consumed
//! 4. Ratio filter + aggregation: ambiguous matches are rejected per face,
//!    surviving counts are compared against the detection threshold under
//!    the configured [`DetectPolicy`]
//!
//! # Registration
//!
//! [`Facebase::add_face`] is two-phase: the label is reserved under the
//! lock, extraction runs with the lock released, and the computed signature
//! fills the reservation afterwards. A face mid-registration is invisible
//! to recognition and to [`Facebase::labels`], but its label is already
//! taken. Extraction latency therefore never blocks operations on other
//! labels.
//!
//! # Lifecycle
//!
//! Dropping the [`Facebase`] (or calling the consuming [`Facebase::close`])
//! releases the extractor and matcher handles. Ownership rules make
//! use-after-close unrepresentable.

mod config;
mod detect;
mod error;
mod extractor;
mod shard;
mod store;

pub use config::{DetectPolicy, FacebaseConfig};
pub use detect::Detection;
pub use error::FacebaseError;
pub use extractor::FeatureExtractor;
pub use shard::partition;
pub use store::Facebase;

// Re-export the matching-layer types callers need to implement the
// collaborator contracts or inspect detections.
pub use facekit_featmatch::{
    BruteForceMatcher, Descriptor, DescriptorMatcher, Features, Keypoint, MatchError, MatchPair,
    Neighbor,
};
