//! The live directory index: which template directories exist and which of
//! the two template files each one currently has.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

use super::classifier::is_hidden;
use crate::manifest::{INDEX_FILE, MANIFEST_FILE};

/// Template files present in one directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TemplateFiles {
    pub index: bool,
    pub manifest: bool,
}

impl TemplateFiles {
    fn scan(dir: &Path) -> Self {
        Self {
            index: dir.join(INDEX_FILE).is_file(),
            manifest: dir.join(MANIFEST_FILE).is_file(),
        }
    }

    pub fn is_template(self) -> bool {
        self.index || self.manifest
    }
}

/// Template directories keyed by name, in name order.
///
/// Immutable once published; the watcher builds a new one per settled batch.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectoryIndex {
    dirs: BTreeMap<String, TemplateFiles>,
}

impl DirectoryIndex {
    /// Scan the direct children of `root`.
    ///
    /// Fails only if `root` itself cannot be read.
    pub fn scan(root: &Path) -> io::Result<Self> {
        let mut index = Self::default();

        for entry in fs::read_dir(root)? {
            let Ok(entry) = entry else { continue };
            if !entry.file_type().is_ok_and(|t| t.is_dir()) {
                continue;
            }
            let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
                continue;
            };
            if is_hidden(&name) {
                continue;
            }
            index.refresh(root, &name);
        }

        Ok(index)
    }

    /// Re-read one directory from disk, dropping it when it no longer
    /// holds any template file.
    pub fn refresh(&mut self, root: &Path, name: &str) {
        let files = TemplateFiles::scan(&root.join(name));
        if files.is_template() {
            self.dirs.insert(name.to_string(), files);
        } else {
            self.dirs.remove(name);
        }
    }

    pub fn get(&self, name: &str) -> Option<TemplateFiles> {
        self.dirs.get(name).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, TemplateFiles)> {
        self.dirs.iter().map(|(name, files)| (name.as_str(), *files))
    }

    pub fn len(&self) -> usize {
        self.dirs.len()
    }
}
