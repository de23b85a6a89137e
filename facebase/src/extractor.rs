use facekit_featmatch::Features;

use crate::FacebaseError;

/// Extracts keypoints and binary descriptors from an image.
///
/// The accepted image encoding is determined by the implementation; the
/// registry treats the input as opaque bytes. Extraction must be
/// deterministic: identical bytes and identical extractor configuration
/// produce identical [`Features`].
///
/// Failures surface as [`FacebaseError::Extraction`] with the
/// implementation's diagnostic message.
///
/// # Thread Safety
///
/// Implementations must be safe for concurrent use. The registry invokes
/// extraction outside its internal lock, so several extractions may run
/// at once.
pub trait FeatureExtractor: Send + Sync {
    /// Computes the feature signature of one image.
    fn extract(&self, image: &[u8]) -> Result<Features, FacebaseError>;
}
