use std::path::PathBuf;

/// What happened to a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum ChangeKind {
    Created,
    Modified,
    Removed,
}

impl ChangeKind {
    pub(super) fn label(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Modified => "modified",
            Self::Removed => "removed",
        }
    }

    /// Map a notify event kind, ignoring access and metadata-only noise.
    pub(super) fn from_event(kind: &notify::EventKind) -> Option<Self> {
        use notify::EventKind;
        use notify::event::ModifyKind;

        match kind {
            EventKind::Create(_) => Some(Self::Created),
            EventKind::Remove(_) => Some(Self::Removed),
            EventKind::Modify(ModifyKind::Metadata(_)) => None,
            EventKind::Modify(_) => Some(Self::Modified),
            _ => None,
        }
    }
}

/// A path under the template root the watcher cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum WatchedPath {
    /// A direct child directory of the root (a template candidate)
    Dir(String),
    /// `index.html` or `manifest.json` inside a template directory
    File { dir: String, file: PathBuf },
}

impl WatchedPath {
    pub(super) fn dir(&self) -> &str {
        match self {
            Self::Dir(dir) | Self::File { dir, .. } => dir,
        }
    }
}
