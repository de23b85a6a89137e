use serde::{Deserialize, Serialize};

/// Size of one binary descriptor in bytes (256 bits, ORB-style).
pub const DESCRIPTOR_BYTES: usize = 32;

/// 256-bit binary feature descriptor.
pub type Descriptor = [u8; DESCRIPTOR_BYTES];

/// A salient image location used as an anchor for descriptor extraction.
///
/// Keypoints are carried alongside descriptors for downstream consumers
/// (visualization, geometric verification). Matching itself never reads
/// them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Keypoint {
    /// Subpixel x coordinate.
    pub x: f32,
    /// Subpixel y coordinate.
    pub y: f32,
    /// Orientation in radians.
    pub angle: f32,
}

/// Output of feature extraction for one image.
///
/// `keypoints` and `descriptors` are index-aligned: `descriptors[i]` was
/// computed around `keypoints[i]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Features {
    pub keypoints: Vec<Keypoint>,
    pub descriptors: Vec<Descriptor>,
}

impl Features {
    /// Returns the number of extracted features.
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Returns true if no features were extracted.
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}
