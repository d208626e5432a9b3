//! Tree Serializer
//!
//! Nested name -> (path | subtree) view of the repository layout.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::error;

use crate::classifier::is_binary_name;

/// Directory listing keyed by entry name
pub type FileTree = BTreeMap<String, TreeEntry>;

/// A file maps to its path, a directory to its non-empty subtree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TreeEntry {
    File(String),
    Dir(FileTree),
}

/// Outcome of listing a single directory
struct TreeNode {
    entries: FileTree,
    error: Option<io::Error>,
}

/// Build the tree rooted at `root`, skipping dot-prefixed entries, binary
/// files and empty directories. A directory that cannot be listed
/// contributes nothing.
pub fn build_tree(root: &Path) -> FileTree {
    let node = visit(root);
    if let Some(e) = node.error {
        error!("Error building tree for {}: {}", root.display(), e);
    }
    node.entries
}

fn visit(dir: &Path) -> TreeNode {
    let mut entries = FileTree::new();

    let read_dir = match fs::read_dir(dir) {
        Ok(read_dir) => read_dir,
        Err(e) => {
            return TreeNode {
                entries,
                error: Some(e),
            }
        }
    };

    for entry in read_dir {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                return TreeNode {
                    entries: FileTree::new(),
                    error: Some(e),
                }
            }
        };

        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with('.') {
            continue;
        }

        let path = entry.path();
        let file_type = match entry.file_type() {
            Ok(file_type) => file_type,
            Err(e) => {
                error!("Error reading file type of {}: {}", path.display(), e);
                continue;
            }
        };

        // Symlinked directories are never followed; links to files are listed
        if file_type.is_dir() {
            let child = visit(&path);
            match child.error {
                Some(e) => error!("Error building tree for {}: {}", path.display(), e),
                None if child.entries.is_empty() => {}
                None => {
                    entries.insert(name, TreeEntry::Dir(child.entries));
                }
            }
        } else if path.is_file() {
            if is_binary_name(&name) {
                continue;
            }
            entries.insert(name, TreeEntry::File(path.to_string_lossy().into_owned()));
        }
    }

    TreeNode {
        entries,
        error: None,
    }
}
