//! # Preview Registry Module
//!
//! Tracks the transient object reference that backs the displayed image.
//!
//! The presentation layer shows the selected image through a handle (a blob
//! URL, a texture id, a cached file). Exactly one handle should be live per
//! session, and it must be released when superseded or on reset so repeated
//! sessions do not accumulate resources.
//!
//! ```rust
//! use golden_harmony::core::preview::{InMemoryPreviews, PreviewRegistry};
//! use golden_harmony::imaging::ImageSource;
//!
//! let previews = InMemoryPreviews::new();
//! let handle = previews.acquire(&ImageSource::new("image/png", vec![0u8; 8]));
//! assert_eq!(previews.live_count(), 1);
//!
//! previews.release(handle);
//! assert_eq!(previews.live_count(), 0);
//! assert_eq!(previews.release_count(handle), 1);
//! ```

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use crate::imaging::ImageSource;

/// Opaque identifier of one displayed-image resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PreviewHandle(u64);

impl PreviewHandle {
    pub fn id(self) -> u64 {
        self.0
    }
}

/// Owner of displayed-image resources.
pub trait PreviewRegistry: Send + Sync {
    /// Binds a new resource to `source` and returns its handle.
    fn acquire(&self, source: &ImageSource) -> PreviewHandle;

    /// Releases the resource behind `handle`. Releasing twice is a caller bug;
    /// implementations should tolerate it without freeing anything else.
    fn release(&self, handle: PreviewHandle);
}

/// Number of released handles whose release count is remembered.
pub const RELEASE_HISTORY: usize = 64;

#[derive(Debug, Default)]
struct Entries {
    live: HashMap<PreviewHandle, ImageSource>,
    releases: BTreeMap<PreviewHandle, u32>,
}

/// Registry that keeps previews in memory and counts releases per handle.
///
/// Release counts are kept for the most recent [`RELEASE_HISTORY`] handles
/// only, so a long run of sessions does not grow the registry.
#[derive(Debug, Default)]
pub struct InMemoryPreviews {
    next_id: AtomicU64,
    entries: Mutex<Entries>,
}

impl InMemoryPreviews {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, Entries> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Image currently bound to `handle`, if still live.
    pub fn get(&self, handle: PreviewHandle) -> Option<ImageSource> {
        self.entries().live.get(&handle).cloned()
    }

    pub fn live_count(&self) -> usize {
        self.entries().live.len()
    }

    /// Number of handles whose release count is still remembered.
    pub fn tracked_releases(&self) -> usize {
        self.entries().releases.len()
    }

    /// How many times `release` was called for `handle`.
    pub fn release_count(&self, handle: PreviewHandle) -> u32 {
        self.entries().releases.get(&handle).copied().unwrap_or(0)
    }
}

impl PreviewRegistry for InMemoryPreviews {
    fn acquire(&self, source: &ImageSource) -> PreviewHandle {
        let handle = PreviewHandle(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        self.entries().live.insert(handle, source.clone());
        debug!(handle = handle.0, bytes = source.len(), "preview acquired");
        handle
    }

    fn release(&self, handle: PreviewHandle) {
        let mut entries = self.entries();
        *entries.releases.entry(handle).or_insert(0) += 1;
        while entries.releases.len() > RELEASE_HISTORY {
            entries.releases.pop_first();
        }
        if entries.live.remove(&handle).is_some() {
            debug!(handle = handle.0, "preview released");
        } else {
            warn!(handle = handle.0, "release of preview that is not live");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handles_are_unique() {
        let previews = InMemoryPreviews::new();
        let source = ImageSource::new("image/png", vec![1]);
        let a = previews.acquire(&source);
        let b = previews.acquire(&source);
        assert_ne!(a, b);
        assert_eq!(previews.live_count(), 2);
        assert!(previews.get(a).is_some());
    }

    #[test]
    fn test_double_release_is_counted_but_harmless() {
        let previews = InMemoryPreviews::new();
        let keep = previews.acquire(&ImageSource::new("image/png", vec![1]));
        let drop_me = previews.acquire(&ImageSource::new("image/png", vec![2]));

        previews.release(drop_me);
        previews.release(drop_me);

        assert_eq!(previews.release_count(drop_me), 2);
        assert_eq!(previews.live_count(), 1);
        assert!(previews.get(keep).is_some());
        assert!(previews.get(drop_me).is_none());
    }

    #[test]
    fn test_release_history_is_bounded() {
        let previews = InMemoryPreviews::new();
        let source = ImageSource::new("image/png", vec![1]);

        let mut last = None;
        for _ in 0..RELEASE_HISTORY * 3 {
            let handle = previews.acquire(&source);
            previews.release(handle);
            last = Some(handle);
        }

        assert_eq!(previews.live_count(), 0);
        assert_eq!(previews.tracked_releases(), RELEASE_HISTORY);
        assert_eq!(previews.release_count(last.unwrap()), 1);
        assert_eq!(previews.release_count(PreviewHandle(1)), 0);
    }
}
