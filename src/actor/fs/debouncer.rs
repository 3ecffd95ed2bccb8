use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use rustc_hash::FxHashMap;

use super::types::ChangeKind;

/// A path must stay unchanged this long before it is reported.
pub(super) const STABILITY_MS: u64 = 300;
/// How often pending paths are sampled.
pub(super) const POLL_INTERVAL_MS: u64 = 100;

/// A path waiting for its writes to finish.
#[derive(Debug, Clone, Copy)]
pub(super) struct Pending {
    pub(super) kind: ChangeKind,
    /// Last time an event arrived or the sampled size moved
    pub(super) last_change: Instant,
    /// Last sampled size (`None` when the file is missing)
    pub(super) size: Option<u64>,
    pub(super) sampled: bool,
}

/// Pure debouncer: only handles timing and event deduplication.
/// No filesystem access of its own; sizes come from the function passed to `poll`.
pub(super) struct Debouncer {
    pub(super) pending: FxHashMap<PathBuf, Pending>,
}

impl Debouncer {
    pub(super) fn new() -> Self {
        Self {
            pending: FxHashMap::default(),
        }
    }

    /// Record an event, applying dedup rules:
    /// - Remove + Create/Modify → Create/Modify (file was restored)
    /// - Modify + Remove → Remove (file was deleted)
    /// - Create + Remove → discard (appeared then vanished)
    /// - otherwise the first kind wins
    ///
    /// Every event restarts the stability window of its path.
    pub(super) fn add(&mut self, path: PathBuf, kind: ChangeKind, now: Instant) {
        let Some(pending) = self.pending.get_mut(&path) else {
            crate::debug!("watch"; "event {}: {}", kind.label(), path.display());
            self.pending.insert(
                path,
                Pending {
                    kind,
                    last_change: now,
                    size: None,
                    sampled: false,
                },
            );
            return;
        };

        match (pending.kind, kind) {
            (ChangeKind::Removed, ChangeKind::Created | ChangeKind::Modified) => {
                crate::debug!("watch"; "restore {}: {}", kind.label(), path.display());
                pending.kind = kind;
            }
            (ChangeKind::Modified, ChangeKind::Removed) => {
                crate::debug!("watch"; "upgrade modified->removed: {}", path.display());
                pending.kind = ChangeKind::Removed;
            }
            (ChangeKind::Created, ChangeKind::Removed) => {
                crate::debug!("watch"; "discard created+removed: {}", path.display());
                self.pending.remove(&path);
                return;
            }
            _ => {}
        }
        pending.last_change = now;
    }

    /// Sample every pending path and return those whose size has held
    /// still for the whole stability window.
    pub(super) fn poll<F>(&mut self, now: Instant, size_at: F) -> Vec<(PathBuf, ChangeKind)>
    where
        F: Fn(&Path) -> Option<u64>,
    {
        let window = Duration::from_millis(STABILITY_MS);
        let mut settled = Vec::new();

        self.pending.retain(|path, pending| {
            let size = size_at(path);
            if !pending.sampled {
                pending.sampled = true;
                pending.size = size;
            } else if pending.size != size {
                pending.size = size;
                pending.last_change = now;
            }

            if now.saturating_duration_since(pending.last_change) >= window {
                settled.push((path.clone(), pending.kind));
                false
            } else {
                true
            }
        });

        settled.sort_by(|a, b| a.0.cmp(&b.0));
        settled
    }

    pub(super) fn is_idle(&self) -> bool {
        self.pending.is_empty()
    }
}

/// File size lookup used by the live watcher.
pub(super) fn file_size(path: &Path) -> Option<u64> {
    std::fs::metadata(path).ok().map(|meta| meta.len())
}
