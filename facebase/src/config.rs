use serde::{Deserialize, Serialize};

/// Result shape selected by detection aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DetectPolicy {
    /// Return every face whose surviving match count meets the detection
    /// threshold.
    #[default]
    Multi,
    /// Return only the face with the maximum surviving match count,
    /// provided it meets the threshold. Ties resolve to the
    /// lexicographically smallest label.
    Best,
}

/// Configuration for [`Facebase`](crate::Facebase).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FacebaseConfig {
    /// Lowe's ratio threshold: a match survives iff its best distance is
    /// strictly below this fraction of the second-best distance.
    /// Must be in (0, 1] (default: 0.75).
    pub ratio_threshold: f32,

    /// Minimum surviving matches for a face to count as detected.
    /// Must be at least 1 (default: 40).
    pub detection_threshold: usize,

    /// Aggregation policy (default: [`DetectPolicy::Multi`]).
    pub policy: DetectPolicy,

    /// Worker thread cap for one detection call. `None` uses the available
    /// parallelism. The effective count never exceeds the number of
    /// registered faces at snapshot time.
    pub workers: Option<usize>,
}

impl Default for FacebaseConfig {
    fn default() -> Self {
        Self {
            ratio_threshold: 0.75,
            detection_threshold: 40,
            policy: DetectPolicy::Multi,
            workers: None,
        }
    }
}

impl FacebaseConfig {
    /// Replaces out-of-range fields with their defaults.
    pub(crate) fn sanitized(mut self) -> Self {
        let defaults = Self::default();
        if !(self.ratio_threshold > 0.0 && self.ratio_threshold <= 1.0) {
            self.ratio_threshold = defaults.ratio_threshold;
        }
        if self.detection_threshold == 0 {
            self.detection_threshold = defaults.detection_threshold;
        }
        if self.workers == Some(0) {
            self.workers = None;
        }
        self
    }

    /// Worker count before the snapshot-size cap is applied.
    pub(crate) fn effective_workers(&self) -> usize {
        match self.workers {
            Some(n) => n,
            None => std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
        }
    }
}
