//! Decide which raw filesystem paths matter.
//!
//! The watcher looks exactly one level below the template root:
//!
//! ```text
//! <root>/<template>/               -> WatchedPath::Dir
//! <root>/<template>/index.html     -> WatchedPath::File
//! <root>/<template>/manifest.json  -> WatchedPath::File
//! everything else                  -> ignored
//! ```

use std::path::{Component, Path};

use super::types::WatchedPath;
use crate::manifest::{INDEX_FILE, MANIFEST_FILE};

/// Classify `path` relative to the (normalized) template root.
pub(super) fn classify(root: &Path, path: &Path) -> Option<WatchedPath> {
    let relative = path.strip_prefix(root).ok()?;
    let mut parts = relative.components();

    let dir = match parts.next()? {
        Component::Normal(dir) => dir.to_str()?,
        _ => return None,
    };
    if is_hidden(dir) {
        return None;
    }

    let Some(file) = parts.next() else {
        return Some(WatchedPath::Dir(dir.to_string()));
    };
    if parts.next().is_some() {
        return None;
    }

    let file = match file {
        Component::Normal(file) => file.to_str()?,
        _ => return None,
    };
    is_template_file(file).then(|| WatchedPath::File {
        dir: dir.to_string(),
        file: file.into(),
    })
}

/// Is this one of the files that make a directory a template?
pub(super) fn is_template_file(name: &str) -> bool {
    name == INDEX_FILE || name == MANIFEST_FILE
}

/// Hidden directories (`.git`, `.cache`, ...) never hold templates.
pub(super) fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}
