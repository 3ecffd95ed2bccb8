//! FileSystem Actor
//!
//! Watches the template root and publishes settled template changes.
//!
//! Architecture:
//! ```text
//! notify → bridge thread → FsActor
//!                            ├─ classifier (depth-1 filter)
//!                            ├─ debouncer  (300ms stability, 100ms sampling)
//!                            ├─ DirectoryIndex (published via ArcSwap)
//!                            └─ subscribers (ChangeBatch, registration order)
//! ```
//!
//! [`TemplateWatcher`] is the owning handle. Snapshots are computed on the
//! caller's thread from the last published index, so queries never wait on
//! the actor.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use arc_swap::ArcSwap;
use notify::RecommendedWatcher;
use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use super::messages::{ChangeBatch, TemplateSource};
use crate::manifest::{self, MANIFEST_FILE, Manifest, Snapshot, TemplateEntry};
use crate::utils::path::normalize_path;

// Depth-1 path filter.
mod classifier;
// Pure timing and deduplication.
mod debouncer;
// Live directory index.
mod index;
// Shared fs event types.
mod types;
// Depth-limited watch attachment.
mod watch_roots;

#[cfg(test)]
mod tests;

use debouncer::{Debouncer, POLL_INTERVAL_MS, file_size};
use index::DirectoryIndex;
use types::{ChangeKind, WatchedPath};
use watch_roots::WatchRoots;

type Subscribers = Arc<Mutex<Vec<mpsc::UnboundedSender<ChangeBatch>>>>;
type SharedWatcher = Arc<Mutex<Option<RecommendedWatcher>>>;

/// Errors that prevent the watcher from starting.
#[derive(Debug, Error)]
pub enum WatchError {
    #[error("cannot read template root `{}`", path.display())]
    Root {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to start file watcher")]
    Notify(#[from] notify::Error),
}

/// Owning handle of the template directory watcher.
pub struct TemplateWatcher {
    root: PathBuf,
    index: Arc<ArcSwap<DirectoryIndex>>,
    subscribers: Subscribers,
    /// `None` once closed
    watcher: SharedWatcher,
    task: Mutex<Option<tokio::task::JoinHandle<()>>>,
}

impl TemplateWatcher {
    /// Start watching `root` one level deep.
    ///
    /// Must be called from within a tokio runtime. Fails if `root` cannot be
    /// read; missing or broken templates never fail the watcher.
    pub fn watch(root: impl AsRef<Path>) -> Result<Arc<Self>, WatchError> {
        let root = normalize_path(root.as_ref());

        let index = DirectoryIndex::scan(&root).map_err(|source| WatchError::Root {
            path: root.clone(),
            source,
        })?;

        // Create sync channel for notify (it doesn't support async)
        let (notify_tx, notify_rx) = std::sync::mpsc::channel();
        let mut watcher = notify::recommended_watcher(move |res| {
            let _ = notify_tx.send(res);
        })?;

        let mut roots = WatchRoots::new(root.clone());
        roots.attach_existing(&mut watcher)?;

        crate::debug!("watch"; "{} template(s) in {}", index.len(), root.display());

        let index = Arc::new(ArcSwap::from_pointee(index));
        let subscribers = Subscribers::default();
        let watcher: SharedWatcher = Arc::new(Mutex::new(Some(watcher)));

        let actor = FsActor {
            root: root.clone(),
            notify_rx,
            roots,
            debouncer: Debouncer::new(),
            index: Arc::clone(&index),
            subscribers: Arc::clone(&subscribers),
            watcher: Arc::clone(&watcher),
        };
        let task = tokio::spawn(actor.run());

        Ok(Arc::new(Self {
            root,
            index,
            subscribers,
            watcher,
            task: Mutex::new(Some(task)),
        }))
    }

    /// Normalized template root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Current templates, in name order.
    ///
    /// Manifests are read and normalized on every call; a manifest that
    /// fails to load yields an entry without one.
    pub fn snapshot(&self) -> Snapshot {
        let index = self.index.load();
        index
            .iter()
            .map(|(name, files)| TemplateEntry {
                name: name.to_string(),
                manifest: files.manifest.then(|| self.load_manifest(name)).flatten(),
            })
            .collect()
    }

    fn load_manifest(&self, name: &str) -> Option<Manifest> {
        let dir = self.root.join(name);
        let path = dir.join(MANIFEST_FILE);

        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) => {
                crate::debug!("watch"; "cannot read {}: {}", path.display(), e);
                return None;
            }
        };

        match manifest::normalize(&text, &dir, &self.root) {
            Ok(manifest) => Some(manifest),
            Err(e) => {
                crate::logger::status_error(
                    &format!("invalid manifest: {name}/{MANIFEST_FILE}"),
                    &e.to_string(),
                );
                None
            }
        }
    }

    /// Register a change listener.
    ///
    /// Listeners are notified in registration order. After [`close`], the
    /// returned receiver yields `None` immediately.
    ///
    /// [`close`]: Self::close
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<ChangeBatch> {
        let (tx, rx) = mpsc::unbounded_channel();
        if !self.is_closed() {
            self.subscribers.lock().push(tx);
        }
        rx
    }

    pub fn is_closed(&self) -> bool {
        self.watcher.lock().is_none()
    }

    /// Stop watching and release OS handles. Idempotent.
    pub fn close(&self) {
        let watcher = self.watcher.lock().take();
        if watcher.is_none() {
            return;
        }
        drop(watcher);

        if let Some(task) = self.task.lock().take() {
            task.abort();
        }
        self.subscribers.lock().clear();
        crate::debug!("watch"; "closed");
    }
}

impl Drop for TemplateWatcher {
    fn drop(&mut self) {
        self.close();
    }
}

impl TemplateSource for TemplateWatcher {
    fn snapshot(&self) -> Snapshot {
        TemplateWatcher::snapshot(self)
    }

    fn subscribe(&self) -> mpsc::UnboundedReceiver<ChangeBatch> {
        TemplateWatcher::subscribe(self)
    }
}

// =============================================================================
// Actor
// =============================================================================

/// FileSystem Actor - turns raw notify events into settled change batches
struct FsActor {
    root: PathBuf,
    /// Channel to receive notify events (sync -> async bridge)
    notify_rx: std::sync::mpsc::Receiver<notify::Result<notify::Event>>,
    roots: WatchRoots,
    debouncer: Debouncer,
    index: Arc<ArcSwap<DirectoryIndex>>,
    subscribers: Subscribers,
    watcher: SharedWatcher,
}

impl FsActor {
    async fn run(mut self) {
        let notify_rx = std::mem::replace(&mut self.notify_rx, std::sync::mpsc::channel().1);
        let (async_tx, mut async_rx) = mpsc::channel::<notify::Event>(64);

        // Ends when the notify watcher (and with it the sender) is dropped
        std::thread::spawn(move || {
            while let Ok(result) = notify_rx.recv() {
                match result {
                    Ok(event) => {
                        if async_tx.blocking_send(event).is_err() {
                            break; // Receiver dropped
                        }
                    }
                    Err(e) => crate::log!("watch"; "notify error: {}", e),
                }
            }
        });

        // Fixed schedule: incoming events never delay the next sample
        let mut sampling = tokio::time::interval(Duration::from_millis(POLL_INTERVAL_MS));
        sampling.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = sampling.tick(), if !self.debouncer.is_idle() => self.settle(),
                event = async_rx.recv() => match event {
                    Some(event) => self.on_event(&event),
                    None => break,
                },
            }
        }

        crate::debug!("watch"; "actor stopped");
    }

    fn on_event(&mut self, event: &notify::Event) {
        let Some(kind) = ChangeKind::from_event(&event.kind) else {
            return;
        };
        let now = Instant::now();

        for path in &event.paths {
            let Some(watched) = classifier::classify(&self.root, path) else {
                continue;
            };

            if matches!(watched, WatchedPath::Dir(_)) && kind != ChangeKind::Removed {
                if let Some(watcher) = self.watcher.lock().as_mut() {
                    self.roots.attach(watcher, path);
                }
            }

            self.debouncer.add(path.clone(), kind, now);
        }
    }

    /// Apply settled paths to the index and notify subscribers once.
    fn settle(&mut self) {
        let settled = self.debouncer.poll(Instant::now(), file_size);
        if settled.is_empty() {
            return;
        }

        self.roots.prune();

        let mut next = DirectoryIndex::clone(&self.index.load());
        let mut dirs: Vec<String> = settled
            .iter()
            .filter_map(|(path, _)| classifier::classify(&self.root, path))
            .map(|watched| watched.dir().to_string())
            .collect();
        dirs.dedup();
        for dir in &dirs {
            next.refresh(&self.root, dir);
        }
        self.index.store(Arc::new(next));

        for (path, kind) in &settled {
            crate::debug!("watch"; "{}: {}", kind.label(), path.display());
        }
        crate::logger::status_success(&describe(&self.root, &settled));

        let batch = ChangeBatch {
            paths: settled.into_iter().map(|(path, _)| path).collect(),
        };
        self.subscribers
            .lock()
            .retain(|tx| tx.send(batch.clone()).is_ok());
    }
}

/// Short status line for a settled batch.
fn describe(root: &Path, settled: &[(PathBuf, ChangeKind)]) -> String {
    let first = settled
        .first()
        .map(|(path, kind)| {
            let rel = path.strip_prefix(root).unwrap_or(path);
            format!("{}: {}", kind.label(), rel.display())
        })
        .unwrap_or_default();

    match settled.len() {
        0 | 1 => first,
        n => format!("{first} (+{} more)", n - 1),
    }
}
