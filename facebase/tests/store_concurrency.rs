//! Cross-thread behavior of the face registry.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use facekit_facebase::{
    Descriptor, DescriptorMatcher, Detection, Facebase, FacebaseConfig, FacebaseError,
    FeatureExtractor, Features, Keypoint, MatchError, Neighbor,
};

/// Derives one descriptor per input byte.
struct StubExtractor;

impl FeatureExtractor for StubExtractor {
    fn extract(&self, image: &[u8]) -> Result<Features, FacebaseError> {
        if image.is_empty() {
            return Err(FacebaseError::Extraction("empty image".into()));
        }
        Ok(Features {
            keypoints: vec![
                Keypoint {
                    x: 0.0,
                    y: 0.0,
                    angle: 0.0
                };
                image.len()
            ],
            descriptors: image.iter().map(|&b| [b; 32]).collect(),
        })
    }
}

/// Produces a distinctive pair for every query descriptor, so every face in
/// the snapshot is reported with `match_count == query.len()`.
struct AlwaysMatcher;

impl DescriptorMatcher for AlwaysMatcher {
    fn knn(
        &self,
        query: &[Descriptor],
        reference: &[Descriptor],
        _k: usize,
    ) -> Result<Vec<Vec<Neighbor>>, MatchError> {
        if reference.is_empty() {
            return Err(MatchError::EmptyReference);
        }
        Ok((0..query.len())
            .map(|_| {
                vec![
                    Neighbor {
                        index: 0,
                        distance: 1.0,
                    },
                    Neighbor {
                        index: 1,
                        distance: 100.0,
                    },
                ]
            })
            .collect())
    }
}

/// [`AlwaysMatcher`] that parks on its first invocation until released, so
/// tests can mutate the store while a detection is in flight.
struct GateMatcher {
    entered: Arc<AtomicBool>,
    release: Arc<AtomicBool>,
}

impl DescriptorMatcher for GateMatcher {
    fn knn(
        &self,
        query: &[Descriptor],
        reference: &[Descriptor],
        k: usize,
    ) -> Result<Vec<Vec<Neighbor>>, MatchError> {
        self.entered.store(true, Ordering::SeqCst);
        while !self.release.load(Ordering::SeqCst) {
            thread::yield_now();
        }
        AlwaysMatcher.knn(query, reference, k)
    }
}

fn low_threshold() -> FacebaseConfig {
    FacebaseConfig {
        detection_threshold: 1,
        ..FacebaseConfig::default()
    }
}

#[test]
fn concurrent_distinct_adds_all_succeed() {
    let base = Arc::new(Facebase::new(Box::new(StubExtractor), Box::new(AlwaysMatcher)));

    let handles: Vec<_> = (0..16u8)
        .map(|i| {
            let base = Arc::clone(&base);
            thread::spawn(move || base.add_face(&format!("face-{i:02}"), &[i + 1]))
        })
        .collect();

    for handle in handles {
        handle.join().unwrap().expect("distinct adds must all succeed");
    }

    let labels = base.labels();
    assert_eq!(labels.len(), 16);
    for i in 0..16u8 {
        assert!(labels.contains(&format!("face-{i:02}")), "missing face-{i:02}");
    }
}

#[test]
fn concurrent_adds_of_same_label_admit_exactly_one() {
    let base = Arc::new(Facebase::new(Box::new(StubExtractor), Box::new(AlwaysMatcher)));

    let handles: Vec<_> = (0..8u8)
        .map(|i| {
            let base = Arc::clone(&base);
            thread::spawn(move || base.add_face("bob", &[i + 1]))
        })
        .collect();

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let admitted = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(admitted, 1);
    for result in results.iter().filter(|r| r.is_err()) {
        assert!(matches!(
            result.as_ref().unwrap_err(),
            FacebaseError::AlreadyRegistered { .. }
        ));
    }
    assert_eq!(base.labels(), vec!["bob"]);
}

#[test]
fn detection_outcome_survives_concurrent_removal() {
    let entered = Arc::new(AtomicBool::new(false));
    let release = Arc::new(AtomicBool::new(false));
    let base = Arc::new(Facebase::with_config(
        Box::new(StubExtractor),
        Box::new(GateMatcher {
            entered: Arc::clone(&entered),
            release: Arc::clone(&release),
        }),
        low_threshold(),
    ));

    base.add_face("alice", &[1]).unwrap();
    base.add_face("bob", &[2]).unwrap();

    let detector = {
        let base = Arc::clone(&base);
        thread::spawn(move || base.detect_descriptors(&[[0u8; 32]]))
    };

    // Wait until matching started, then pull a face out of the store.
    while !entered.load(Ordering::SeqCst) {
        thread::yield_now();
    }
    base.remove_face("bob").unwrap();
    release.store(true, Ordering::SeqCst);

    // The in-flight detection still observes its snapshot.
    let detections: Vec<Detection> = detector.join().unwrap().unwrap();
    let labels: Vec<&str> = detections.iter().map(|d| d.label.as_str()).collect();
    assert_eq!(labels, vec!["alice", "bob"]);

    // A detection started after the removal does not.
    release.store(true, Ordering::SeqCst);
    let detections = base.detect_descriptors(&[[0u8; 32]]).unwrap();
    let labels: Vec<&str> = detections.iter().map(|d| d.label.as_str()).collect();
    assert_eq!(labels, vec!["alice"]);
}

#[test]
fn registrations_and_detections_interleave() {
    let base = Arc::new(Facebase::with_config(
        Box::new(StubExtractor),
        Box::new(AlwaysMatcher),
        low_threshold(),
    ));
    base.add_face("seed", &[1]).unwrap();

    let adders: Vec<_> = (0..4u8)
        .map(|t| {
            let base = Arc::clone(&base);
            thread::spawn(move || {
                for i in 0..10u8 {
                    base.add_face(&format!("face-{t}-{i}"), &[t * 10 + i + 1])
                        .unwrap();
                }
            })
        })
        .collect();

    let detectors: Vec<_> = (0..4)
        .map(|_| {
            let base = Arc::clone(&base);
            thread::spawn(move || {
                for _ in 0..10 {
                    // The store is never empty, so every pass must succeed
                    // and report whatever snapshot it caught.
                    let detections = base.detect_descriptors(&[[0u8; 32]]).unwrap();
                    assert!(!detections.is_empty());
                }
            })
        })
        .collect();

    for handle in adders {
        handle.join().unwrap();
    }
    for handle in detectors {
        handle.join().unwrap();
    }

    assert_eq!(base.labels().len(), 41);
}
