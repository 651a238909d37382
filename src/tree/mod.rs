use crate::{FilePair, FileRef};
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

/// Which entries a tree walk includes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalkPolicy {
    pub include_hidden: bool,
    pub follow_symlinks: bool,
    /// Any path whose root-relative form contains one of these substrings is
    /// skipped, and directories are not descended into.
    pub ignore_substrings: Vec<String>,
}

/// Regular files found under one root.
#[derive(Debug, Clone, Default)]
pub struct Listing {
    pub files: Vec<PathBuf>,
    pub dirs_visited: usize,
}

/// Enumerate regular files under `root` in sorted, depth-first order.
///
/// Entries that fail to read are skipped, the walk carries on.
pub fn list_files(root: &Path, policy: &WalkPolicy) -> Listing {
    let mut listing = Listing::default();
    let walker = WalkDir::new(root)
        .follow_links(policy.follow_symlinks)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| is_included(root, entry, policy));

    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                debug!(error = %err, "skipping unreadable entry");
                continue;
            }
        };

        let file_type = entry.file_type();
        if file_type.is_dir() {
            listing.dirs_visited += 1;
        } else if file_type.is_file() {
            debug!(path = %entry.path().display(), "including file");
            listing.files.push(entry.into_path());
        }
    }

    listing
}

fn is_included(root: &Path, entry: &DirEntry, policy: &WalkPolicy) -> bool {
    let path = entry.path();
    if entry.depth() == 0 {
        return true;
    }
    let relative = path.strip_prefix(root).unwrap_or(path);

    if !policy.include_hidden && has_hidden_component(relative) {
        debug!(path = %path.display(), "ignoring hidden path");
        return false;
    }

    if entry.path_is_symlink() && !policy.follow_symlinks {
        debug!(path = %path.display(), "ignoring symlink");
        return false;
    }

    let display = relative.to_string_lossy();
    if let Some(pattern) = policy
        .ignore_substrings
        .iter()
        .find(|pattern| display.contains(pattern.as_str()))
    {
        debug!(path = %path.display(), pattern = %pattern, "ignoring path");
        return false;
    }

    true
}

fn has_hidden_component(path: &Path) -> bool {
    path.components().any(|component| match component {
        Component::Normal(name) => name.to_string_lossy().starts_with('.'),
        _ => false,
    })
}

/// Key a file by its path below `root`, with a single leading separator trimmed.
pub fn relative_key(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path).to_string_lossy();
    relative
        .strip_prefix(std::path::MAIN_SEPARATOR)
        .unwrap_or(&relative[..])
        .to_string()
}

/// Files of two trees paired by relative path.
#[derive(Debug, Clone, Default)]
pub struct TreeMatch {
    /// Pairs in the walk order of the first tree.
    pub pairs: Vec<FilePair>,
    pub only_in_original: Vec<String>,
    pub only_in_desired: Vec<String>,
    pub files_scanned: usize,
    pub dirs_visited: usize,
}

/// Pair the files that exist at the same relative path under both roots.
///
/// Files present under only one root are left out of `pairs`; they are
/// recorded in `only_in_*` and otherwise skipped.
pub fn match_trees(
    original_root: &Path,
    desired_root: &Path,
    policy: &WalkPolicy,
    auto_patch: bool,
) -> TreeMatch {
    let original = list_files(original_root, policy);
    let desired = list_files(desired_root, policy);

    let mut desired_by_key: HashMap<String, PathBuf> = desired
        .files
        .iter()
        .map(|path| (relative_key(desired_root, path), path.clone()))
        .collect();

    let mut result = TreeMatch {
        files_scanned: original.files.len() + desired.files.len(),
        dirs_visited: original.dirs_visited + desired.dirs_visited,
        ..TreeMatch::default()
    };

    for path in original.files {
        let key = relative_key(original_root, &path);
        match desired_by_key.remove(&key) {
            Some(desired_path) => {
                debug!(key = %key, "pairing file");
                result.pairs.push(FilePair {
                    key,
                    original: FileRef::new(path).with_auto_patch(auto_patch),
                    desired: FileRef::new(desired_path),
                });
            }
            None => {
                debug!(key = %key, "skipping file only in original tree");
                result.only_in_original.push(key);
            }
        }
    }

    let mut leftover: Vec<String> = desired_by_key.into_keys().collect();
    leftover.sort();
    for key in &leftover {
        debug!(key = %key, "skipping file only in desired tree");
    }
    result.only_in_desired = leftover;

    result
}
