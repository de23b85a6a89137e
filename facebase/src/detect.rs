use std::thread;

use serde::{Deserialize, Serialize};
use tracing::debug;

use facekit_featmatch::{ratio_filter, Descriptor, MatchError, MatchPair, Neighbor};

use crate::config::DetectPolicy;
use crate::shard::partition;
use crate::store::Facebase;
use crate::FacebaseError;

/// One recognized face in a query image.
///
/// Produced fresh by every [`Facebase::detect`] call and owned by the
/// caller; the registry keeps no detection state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Detection {
    /// Label of the recognized face.
    pub label: String,

    /// Number of query descriptors that matched this face unambiguously.
    pub match_count: usize,

    /// The surviving match pairs, one per counted query descriptor.
    pub pairs: Vec<MatchPair>,
}

impl Facebase {
    /// Recognizes registered faces in an image.
    ///
    /// Extracts the query signature, then matches it against a snapshot of
    /// every registered face in parallel. Returns the faces selected by the
    /// configured [`DetectPolicy`], or [`FacebaseError::NoFaceFound`] if
    /// none meets the detection threshold.
    pub fn detect(&self, image: &[u8]) -> Result<Vec<Detection>, FacebaseError> {
        let features = self.extractor.extract(image)?;
        self.detect_descriptors(&features.descriptors)
    }

    /// Recognizes registered faces from an already-extracted query
    /// descriptor set.
    ///
    /// The registry is snapshotted once at the start: faces removed while
    /// the call runs are still matched, faces added are not seen. One
    /// worker thread is launched per shard of the snapshot, and every
    /// worker completes before any result is aggregated.
    pub fn detect_descriptors(
        &self,
        query: &[Descriptor],
    ) -> Result<Vec<Detection>, FacebaseError> {
        let snapshot = self.snapshot();
        if snapshot.is_empty() || query.is_empty() {
            return Err(FacebaseError::NoFaceFound);
        }

        // Never more workers than faces: every shard stays non-empty.
        let workers = self.config.effective_workers().min(snapshot.len());
        let shards = partition(snapshot.len(), workers);
        debug!(
            "Matching {} query descriptors against {} faces on {} workers",
            query.len(),
            snapshot.len(),
            workers
        );

        let matcher = self.matcher.as_ref();
        // The scope exit is the join barrier: no result is consumed until
        // every worker has finished.
        let worker_results: Vec<Result<Vec<(String, Vec<Vec<Neighbor>>)>, MatchError>> =
            thread::scope(|scope| {
                let handles: Vec<_> = shards
                    .into_iter()
                    .map(|shard| {
                        let snapshot = &snapshot;
                        scope.spawn(move || {
                            let mut rows_by_label = Vec::with_capacity(shard.len());
                            for (label, entry) in &snapshot[shard] {
                                // An empty signature can never produce a
                                // match pair; the matcher contract rejects
                                // empty reference sets, so guard here.
                                if entry.descriptors.is_empty() {
                                    continue;
                                }
                                let rows = matcher.knn(query, &entry.descriptors, 2)?;
                                rows_by_label.push((label.clone(), rows));
                            }
                            Ok(rows_by_label)
                        })
                    })
                    .collect();
                handles
                    .into_iter()
                    .map(|handle| handle.join().expect("matching worker panicked"))
                    .collect()
            });

        // Shards are contiguous over the sorted snapshot and each worker
        // reports in shard-local order, so the flattened list stays sorted
        // by label.
        let mut detections = Vec::with_capacity(snapshot.len());
        for result in worker_results {
            for (label, rows) in result? {
                let pairs = ratio_filter(&rows, self.config.ratio_threshold);
                detections.push(Detection {
                    label,
                    match_count: pairs.len(),
                    pairs,
                });
            }
        }

        self.aggregate(detections)
    }

    fn aggregate(&self, mut detections: Vec<Detection>) -> Result<Vec<Detection>, FacebaseError> {
        let threshold = self.config.detection_threshold;
        match self.config.policy {
            DetectPolicy::Multi => {
                detections.retain(|d| d.match_count >= threshold);
                if detections.is_empty() {
                    return Err(FacebaseError::NoFaceFound);
                }
                debug!("Detected {} faces", detections.len());
                Ok(detections)
            }
            DetectPolicy::Best => {
                // Label-ordered scan keeping the current winner on ties, so
                // equal counts resolve to the lexicographically smallest
                // label.
                let best = detections
                    .into_iter()
                    .fold(None::<Detection>, |acc, d| match acc {
                        Some(cur) if cur.match_count >= d.match_count => Some(cur),
                        _ => Some(d),
                    });
                match best {
                    Some(d) if d.match_count >= threshold => {
                        debug!("Best face {} with {} matches", d.label, d.match_count);
                        Ok(vec![d])
                    }
                    _ => Err(FacebaseError::NoFaceFound),
                }
            }
        }
    }
}
