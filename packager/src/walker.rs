//! Filtered recursive enumeration of the tree being packaged.
//!
//! The same walk drives both archive membership and per-file hashing, so
//! the manifest's file list always describes the archive's contents.

use crate::error::{PipelineError, Result};
use crate::pattern::ExclusionSet;
use std::io;
use std::path::{Component, Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// A regular file discovered beneath the walk root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Absolute location on disk.
    pub absolute_path: PathBuf,
    /// Path relative to the walk root, `/`-separated on every host.
    pub relative_path: String,
}

/// Recursively list the files under `root` that survive exclusion.
///
/// Entries whose relative path appears in `extra_exclusions` are skipped
/// outright, whether file or directory. Directories pruned by `patterns`
/// are not descended into. Entries are visited in file-name order, so the
/// result is deterministic. Symbolic links are not followed.
///
/// # Errors
///
/// Returns [`PipelineError::Traversal`] if `root` is missing or not a
/// directory, or if any entry beneath it cannot be read.
///
/// # Examples
///
/// ```
/// use dh_updater::pattern::ExclusionSet;
/// use dh_updater::walker::walk;
///
/// let dir = tempfile::tempdir()?;
/// std::fs::write(dir.path().join("app.exe"), b"MZ")?;
/// std::fs::write(dir.path().join("app.pdb"), b"symbols")?;
///
/// let files = walk(dir.path(), &ExclusionSet::parse("*.pdb"), &[])?;
/// let names: Vec<_> = files.iter().map(|f| f.relative_path.as_str()).collect();
/// assert_eq!(names, ["app.exe"]);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn walk(
    root: &Path,
    patterns: &ExclusionSet,
    extra_exclusions: &[String],
) -> Result<Vec<FileEntry>> {
    let root = resolve_root(root)?;
    let walker = WalkDir::new(&root)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| keep_entry(&root, entry, patterns, extra_exclusions));

    let mut files = Vec::new();
    for entry in walker {
        let entry = entry.map_err(|err| PipelineError::Traversal {
            path: err.path().unwrap_or(root.as_path()).to_path_buf(),
            reason: err.to_string(),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        files.push(FileEntry {
            relative_path: relative_path(&root, entry.path()),
            absolute_path: entry.into_path(),
        });
    }
    log::debug!("walked {} files under {}", files.len(), root.display());
    Ok(files)
}

fn resolve_root(root: &Path) -> Result<PathBuf> {
    let traversal_error = |reason: &str| PipelineError::Traversal {
        path: root.to_path_buf(),
        reason: reason.to_owned(),
    };
    if !root.exists() {
        return Err(traversal_error("directory does not exist"));
    }
    if !root.is_dir() {
        return Err(traversal_error("not a directory"));
    }
    absolute_normalised(root).map_err(|err| traversal_error(&err.to_string()))
}

/// Make `path` absolute and fold away its `.` and `..` components.
///
/// The path need not exist and symbolic links are left untouched, so two
/// spellings of the same location compare equal without touching the disk.
///
/// # Errors
///
/// Returns the error from [`std::path::absolute`], typically when the
/// working directory cannot be read.
///
/// # Examples
///
/// ```
/// use dh_updater::walker::absolute_normalised;
/// use std::path::Path;
///
/// let folded = absolute_normalised(Path::new("dist/tmp/../widget.zip"))?;
/// assert_eq!(folded, std::path::absolute("dist/widget.zip")?);
/// # Ok::<(), std::io::Error>(())
/// ```
pub fn absolute_normalised(path: &Path) -> io::Result<PathBuf> {
    let absolute = std::path::absolute(path)?;
    let mut normalised = PathBuf::new();
    for component in absolute.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                normalised.pop();
            }
            other => normalised.push(other),
        }
    }
    Ok(normalised)
}

fn keep_entry(
    root: &Path,
    entry: &DirEntry,
    patterns: &ExclusionSet,
    extra_exclusions: &[String],
) -> bool {
    let relative = relative_path(root, entry.path());
    if extra_exclusions.iter().any(|extra| *extra == relative) {
        log::trace!("skipping {relative}: explicitly excluded");
        return false;
    }
    let excluded = if entry.file_type().is_dir() {
        patterns.prunes_directory(&relative)
    } else {
        patterns.is_excluded(&relative)
    };
    if excluded {
        log::trace!("skipping {relative}: matches exclusion pattern");
    }
    !excluded
}

/// Express `path` relative to `root` with `/` separators.
fn relative_path(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
