//! Standalone version stamping.
//!
//! Release workflows that only need the binary's version, without packaging
//! anything, read it from a `<binary>.version.txt` file written next to the
//! binary.

use crate::error::{PipelineError, Result};
use crate::extractor::TextExtractor;
use crate::version::{Version, extract_version};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

/// Suffix appended to the binary's full path.
pub const VERSION_FILE_SUFFIX: &str = ".version.txt";

/// Outcome of [`write_version_file`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionFile {
    /// Version read from the binary.
    pub version: Version,
    /// File the version was written to.
    pub path: PathBuf,
}

/// Return `<binary>.version.txt`, keeping the binary's own extension.
///
/// # Examples
///
/// ```
/// use dh_updater::version_file::version_file_path;
/// use std::path::{Path, PathBuf};
///
/// assert_eq!(
///     version_file_path(Path::new("dist/Widget.exe")),
///     PathBuf::from("dist/Widget.exe.version.txt")
/// );
/// ```
#[must_use]
pub fn version_file_path(binary: &Path) -> PathBuf {
    let mut path = OsString::from(binary.as_os_str());
    path.push(VERSION_FILE_SUFFIX);
    PathBuf::from(path)
}

/// Read the version embedded in `binary` and write it, newline-terminated,
/// to [`version_file_path`].
///
/// Nothing is written unless a version token is found.
///
/// # Errors
///
/// Returns [`PipelineError::InputNotFound`] for a missing binary, the
/// extractor's error if its text cannot be read,
/// [`PipelineError::VersionNotFound`] when no `x.x.x.x` token is present, or
/// [`PipelineError::Io`] if the file cannot be written.
pub fn write_version_file(extractor: &dyn TextExtractor, binary: &Path) -> Result<VersionFile> {
    if !binary.is_file() {
        return Err(PipelineError::InputNotFound {
            path: binary.to_path_buf(),
        });
    }

    let text = extractor.extract(binary)?;
    let version = extract_version(&text)?;
    let path = version_file_path(binary);
    fs::write(&path, format!("{version}\n")).map_err(|err| PipelineError::io(&path, err))?;
    log::info!("wrote version {version} to {}", path.display());

    Ok(VersionFile { version, path })
}
