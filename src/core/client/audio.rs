//! Audio clip storage.
//!
//! The native analogue of browser blob URLs: decoded audio bytes live in an
//! [`AudioStore`] owned by the client, and emitted events carry lightweight
//! [`AudioRef`] handles. Consumers release a reference once playback ends;
//! the client clears the whole store on disconnect so clips cannot outlive
//! the session that produced them.

use std::collections::HashMap;

use bytes::Bytes;
use parking_lot::Mutex;
use uuid::Uuid;

/// Handle to an audio clip held by an [`AudioStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AudioRef(Uuid);

/// Shared store of playable audio clips.
#[derive(Debug, Default)]
pub struct AudioStore {
    clips: Mutex<HashMap<AudioRef, Bytes>>,
}

impl AudioStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a clip and return its reference.
    pub fn insert(&self, data: Bytes) -> AudioRef {
        let clip = AudioRef(Uuid::new_v4());
        self.clips.lock().insert(clip, data);
        clip
    }

    /// Look up a clip's bytes. Cheap: `Bytes` clones share the buffer.
    pub fn bytes(&self, clip: AudioRef) -> Option<Bytes> {
        self.clips.lock().get(&clip).cloned()
    }

    /// Release a clip. Returns whether it was present.
    pub fn release(&self, clip: AudioRef) -> bool {
        self.clips.lock().remove(&clip).is_some()
    }

    /// Release every clip.
    pub fn clear(&self) {
        self.clips.lock().clear();
    }

    /// Number of clips currently held.
    pub fn len(&self) -> usize {
        self.clips.lock().len()
    }

    /// Whether the store holds no clips.
    pub fn is_empty(&self) -> bool {
        self.clips.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_resolve() {
        let store = AudioStore::new();
        let clip = store.insert(Bytes::from_static(b"pcm"));
        assert_eq!(store.bytes(clip).unwrap().as_ref(), b"pcm");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_release() {
        let store = AudioStore::new();
        let clip = store.insert(Bytes::from_static(b"pcm"));
        assert!(store.release(clip));
        assert!(store.bytes(clip).is_none());
        assert!(!store.release(clip));
        assert!(store.is_empty());
    }

    #[test]
    fn test_clear_releases_everything() {
        let store = AudioStore::new();
        store.insert(Bytes::from_static(b"a"));
        store.insert(Bytes::from_static(b"b"));
        store.clear();
        assert!(store.is_empty());
    }

    #[test]
    fn test_refs_are_distinct() {
        let store = AudioStore::new();
        let a = store.insert(Bytes::from_static(b"a"));
        let b = store.insert(Bytes::from_static(b"a"));
        assert_ne!(a, b);
    }
}
