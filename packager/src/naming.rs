//! Manifest file naming.
//!
//! Manifests are named after the binary they describe, extension included:
//! `widget.exe` yields `widget.exe.dh.updater.json` and
//! `widget.exe.dh.updater.xml`.

use crate::error::{PipelineError, Result};
use std::path::{Path, PathBuf};

/// Suffix appended to the binary name for the JSON manifest.
const JSON_SUFFIX: &str = ".dh.updater.json";

/// Suffix appended to the binary name for the XML manifest.
const XML_SUFFIX: &str = ".dh.updater.xml";

/// Output locations of both manifest forms for one binary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestPaths {
    /// Path of the JSON manifest.
    pub json: PathBuf,
    /// Path of the XML manifest.
    pub xml: PathBuf,
}

impl ManifestPaths {
    /// Place the manifests for `binary` inside `output_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::InputNotFound`] if `binary` has no file name
    /// component (for example `..` or a root path).
    ///
    /// # Examples
    ///
    /// ```
    /// use dh_updater::naming::ManifestPaths;
    /// use std::path::Path;
    ///
    /// let paths = ManifestPaths::for_binary(Path::new("build/widget.exe"), Path::new("/out"))
    ///     .expect("binary has a file name");
    /// assert_eq!(paths.json, Path::new("/out/widget.exe.dh.updater.json"));
    /// assert_eq!(paths.xml, Path::new("/out/widget.exe.dh.updater.xml"));
    /// ```
    pub fn for_binary(binary: &Path, output_dir: &Path) -> Result<Self> {
        let base = binary
            .file_name()
            .ok_or_else(|| PipelineError::InputNotFound {
                path: binary.to_path_buf(),
            })?
            .to_string_lossy();
        Ok(Self {
            json: output_dir.join(format!("{base}{JSON_SUFFIX}")),
            xml: output_dir.join(format!("{base}{XML_SUFFIX}")),
        })
    }
}
