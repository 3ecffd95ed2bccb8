use std::path::{Path, PathBuf};

use notify::{RecursiveMode, Watcher};
use rustc_hash::FxHashSet;

use super::classifier::is_hidden;

/// Depth-limited watch set.
///
/// Responsibility:
/// - Watch the template root and each template directory non-recursively
/// - Attach directories created while running
/// - Forget directories that disappeared
pub(super) struct WatchRoots {
    root: PathBuf,
    attached: FxHashSet<PathBuf>,
}

impl WatchRoots {
    pub(super) fn new(root: PathBuf) -> Self {
        Self {
            root,
            attached: FxHashSet::default(),
        }
    }

    /// Attach the root and every existing child directory.
    ///
    /// Only a failure on the root itself is an error.
    pub(super) fn attach_existing<W: Watcher>(&mut self, watcher: &mut W) -> notify::Result<()> {
        watcher.watch(&self.root, RecursiveMode::NonRecursive)?;

        let Ok(entries) = std::fs::read_dir(&self.root) else {
            return Ok(());
        };
        for entry in entries.flatten() {
            if entry.file_type().is_ok_and(|t| t.is_dir()) {
                self.attach(watcher, &entry.path());
            }
        }
        Ok(())
    }

    /// Attach a single template directory (no-op if hidden or attached).
    pub(super) fn attach<W: Watcher>(&mut self, watcher: &mut W, dir: &Path) {
        let hidden = dir
            .file_name()
            .and_then(|n| n.to_str())
            .is_none_or(is_hidden);
        if hidden || self.attached.contains(dir) || !dir.is_dir() {
            return;
        }

        match watcher.watch(dir, RecursiveMode::NonRecursive) {
            Ok(()) => {
                crate::debug!("watch"; "attached: {}", dir.display());
                self.attached.insert(dir.to_path_buf());
            }
            Err(e) => crate::debug!("watch"; "cannot watch {}: {}", dir.display(), e),
        }
    }

    /// Drop stale handles for directories that no longer exist.
    pub(super) fn prune(&mut self) {
        self.attached.retain(|path| path.exists());
    }
}
