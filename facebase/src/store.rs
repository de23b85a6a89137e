use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use facekit_featmatch::{Descriptor, DescriptorMatcher, Keypoint};

use crate::config::FacebaseConfig;
use crate::extractor::FeatureExtractor;
use crate::FacebaseError;

/// One registered face signature.
pub(crate) struct FaceEntry {
    pub(crate) keypoints: Vec<Keypoint>,
    pub(crate) descriptors: Vec<Descriptor>,
}

/// A label slot. `Pending` marks a label reserved by an in-flight
/// registration; the ticket ties the reservation to the reserving call so
/// a remove-then-re-add of the same label cannot be filled by a stale
/// extraction.
pub(crate) enum Slot {
    Pending(u64),
    Ready(Arc<FaceEntry>),
}

pub(crate) struct FaceMap {
    pub(crate) slots: HashMap<String, Slot>,
    next_ticket: u64,
}

/// An in-memory database of labeled face signatures.
///
/// Registration computes a keypoint/descriptor signature through the
/// [`FeatureExtractor`] collaborator; recognition matches a query signature
/// against every registered face in parallel through the
/// [`DescriptorMatcher`] collaborator.
///
/// The label map is the only shared mutable state. Its lock is held for
/// short bookkeeping windows only, never across extraction or matching, so
/// registration and recognition interleave freely.
pub struct Facebase {
    pub(crate) extractor: Box<dyn FeatureExtractor>,
    pub(crate) matcher: Box<dyn DescriptorMatcher>,
    pub(crate) config: FacebaseConfig,
    pub(crate) faces: Mutex<FaceMap>,
}

impl Facebase {
    /// Creates a facebase with default configuration.
    pub fn new(extractor: Box<dyn FeatureExtractor>, matcher: Box<dyn DescriptorMatcher>) -> Self {
        Self::with_config(extractor, matcher, FacebaseConfig::default())
    }

    /// Creates a facebase with the given configuration. Out-of-range
    /// fields fall back to their defaults.
    pub fn with_config(
        extractor: Box<dyn FeatureExtractor>,
        matcher: Box<dyn DescriptorMatcher>,
        config: FacebaseConfig,
    ) -> Self {
        Self {
            extractor,
            matcher,
            config: config.sanitized(),
            faces: Mutex::new(FaceMap {
                slots: HashMap::new(),
                next_ticket: 0,
            }),
        }
    }

    /// Registers a face signature under `label`.
    ///
    /// The label is reserved before extraction starts and filled after it
    /// completes, so extraction latency never blocks operations on other
    /// labels. A second registration of the same label fails immediately
    /// with [`FacebaseError::AlreadyRegistered`], even while the first is
    /// still extracting.
    ///
    /// If the label is removed while extraction is in flight, the removal
    /// wins: the signature is discarded and the call returns
    /// [`FacebaseError::NotRegistered`].
    pub fn add_face(&self, label: &str, image: &[u8]) -> Result<(), FacebaseError> {
        let ticket = {
            let mut faces = self.faces.lock();
            if faces.slots.contains_key(label) {
                return Err(FacebaseError::AlreadyRegistered {
                    label: label.to_string(),
                });
            }
            let ticket = faces.next_ticket;
            faces.next_ticket += 1;
            faces.slots.insert(label.to_string(), Slot::Pending(ticket));
            ticket
        };

        // Extraction runs with the lock released.
        let features = match self.extractor.extract(image) {
            Ok(features) => features,
            Err(err) => {
                let mut faces = self.faces.lock();
                if matches!(faces.slots.get(label), Some(Slot::Pending(t)) if *t == ticket) {
                    faces.slots.remove(label);
                }
                return Err(err);
            }
        };

        let entry = Arc::new(FaceEntry {
            keypoints: features.keypoints,
            descriptors: features.descriptors,
        });

        let mut faces = self.faces.lock();
        let reserved = matches!(faces.slots.get(label), Some(Slot::Pending(t)) if *t == ticket);
        if reserved {
            debug!(
                "Face {} registered ({} descriptors)",
                label,
                entry.descriptors.len()
            );
            faces.slots.insert(label.to_string(), Slot::Ready(entry));
            Ok(())
        } else {
            warn!("Registration of {} cancelled by concurrent removal", label);
            Err(FacebaseError::NotRegistered {
                label: label.to_string(),
            })
        }
    }

    /// Removes a face in any state, including one still being registered.
    pub fn remove_face(&self, label: &str) -> Result<(), FacebaseError> {
        let mut faces = self.faces.lock();
        match faces.slots.remove(label) {
            Some(_) => {
                debug!("Face {} removed", label);
                Ok(())
            }
            None => Err(FacebaseError::NotRegistered {
                label: label.to_string(),
            }),
        }
    }

    /// Returns the sorted labels of all fully registered faces. Faces
    /// whose registration is still in flight are excluded.
    pub fn labels(&self) -> Vec<String> {
        let faces = self.faces.lock();
        let mut labels: Vec<String> = faces
            .slots
            .iter()
            .filter(|(_, slot)| matches!(slot, Slot::Ready(_)))
            .map(|(label, _)| label.clone())
            .collect();
        drop(faces);
        labels.sort();
        labels
    }

    /// Returns the number of fully registered faces.
    pub fn len(&self) -> usize {
        let faces = self.faces.lock();
        faces
            .slots
            .values()
            .filter(|slot| matches!(slot, Slot::Ready(_)))
            .count()
    }

    /// Returns true if no face is fully registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A point-in-time view of all fully registered faces, sorted by
    /// label. Entries are shared, not copied, so mutations after the
    /// snapshot cannot affect a recognition call already holding one.
    pub(crate) fn snapshot(&self) -> Vec<(String, Arc<FaceEntry>)> {
        let faces = self.faces.lock();
        let mut entries: Vec<(String, Arc<FaceEntry>)> = faces
            .slots
            .iter()
            .filter_map(|(label, slot)| match slot {
                Slot::Ready(entry) => Some((label.clone(), Arc::clone(entry))),
                Slot::Pending(_) => None,
            })
            .collect();
        drop(faces);
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    /// Consumes the facebase, releasing the extractor and matcher handles.
    ///
    /// Taking `self` by value makes the lifecycle rules of the underlying
    /// resources compile-time properties: close happens exactly once, no
    /// operation can run after it, and in-flight calls hold borrows that
    /// must end first.
    pub fn close(self) {
        info!("Facebase closed ({} faces)", self.len());
    }
}
