//! Update manifest schema and assembly.
//!
//! The self-update client reads one manifest per release:
//!
//! ```json
//! {
//!   "version": "2.3.1.7",
//!   "sha512": "<base64 SHA-512 of the zip>",
//!   "package_type": "zip",
//!   "urls": ["https://github.com/acme/widget/releases/download/v2.3.1.7/widget.zip"],
//!   "file_md5": { "widget.exe": "<hex MD5>" }
//! }
//! ```

use crate::config::RepositoryId;
use crate::digest::{Md5Digest, Sha512Digest};
use crate::version::Version;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Archive format of the distributed package.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PackageKind {
    /// A zip archive.
    #[default]
    Zip,
}

impl PackageKind {
    /// Return the wire name of the package kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Zip => "zip",
        }
    }
}

impl fmt::Display for PackageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The update manifest describing one release archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageManifest {
    version: Version,
    sha512: Sha512Digest,
    package_type: PackageKind,
    urls: Vec<String>,
    file_md5: BTreeMap<String, Md5Digest>,
}

impl PackageManifest {
    /// Assemble a manifest from already-ordered parts.
    ///
    /// Prefer [`build_manifest`], which applies URL ordering rules.
    #[must_use]
    pub fn new(
        version: Version,
        sha512: Sha512Digest,
        urls: Vec<String>,
        file_md5: BTreeMap<String, Md5Digest>,
    ) -> Self {
        Self {
            version,
            sha512,
            package_type: PackageKind::Zip,
            urls,
            file_md5,
        }
    }

    /// Return the release version.
    #[must_use]
    pub fn version(&self) -> &Version {
        &self.version
    }

    /// Return the base64 SHA-512 digest of the archive.
    #[must_use]
    pub fn sha512(&self) -> &Sha512Digest {
        &self.sha512
    }

    /// Return the package kind.
    #[must_use]
    pub fn package_type(&self) -> PackageKind {
        self.package_type
    }

    /// Return the download URLs, primary first.
    #[must_use]
    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    /// Return the per-file MD5 digests keyed by relative path.
    #[must_use]
    pub fn file_md5(&self) -> &BTreeMap<String, Md5Digest> {
        &self.file_md5
    }
}

/// Where the archive will be published as a release asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseLocation {
    /// Repository hosting the release.
    pub repository: RepositoryId,
    /// File name of the uploaded archive asset.
    pub asset_name: String,
}

/// Inputs for [`build_manifest`].
#[derive(Debug, Clone)]
pub struct ManifestParams {
    /// Version extracted from the binary.
    pub version: Version,
    /// Whole-archive digest.
    pub archive_digest: Sha512Digest,
    /// Per-file digests from the filtered walk.
    pub file_digests: BTreeMap<String, Md5Digest>,
    /// Caller-supplied download URLs, in priority order.
    pub explicit_urls: Vec<String>,
    /// Release to derive the primary download URL from, if known.
    pub release: Option<ReleaseLocation>,
}

/// Build a [`PackageManifest`] from `params`.
///
/// The release download URL, when derivable, comes first. Explicit URLs
/// follow in the given order, trimmed, with blank entries dropped.
///
/// # Examples
///
/// ```
/// use dh_updater::config::RepositoryId;
/// use dh_updater::digest::digest_archive;
/// use dh_updater::manifest::{ManifestParams, ReleaseLocation, build_manifest};
/// use dh_updater::version::Version;
///
/// let manifest = build_manifest(ManifestParams {
///     version: Version::try_from("1.0.0.2").expect("valid version"),
///     archive_digest: digest_archive(b"zip bytes"),
///     file_digests: Default::default(),
///     explicit_urls: vec![" https://mirror.example/app.zip ".to_owned(), "".to_owned()],
///     release: Some(ReleaseLocation {
///         repository: RepositoryId::try_from("acme/app").expect("valid repository"),
///         asset_name: "app.zip".to_owned(),
///     }),
/// });
/// assert_eq!(
///     manifest.urls(),
///     [
///         "https://github.com/acme/app/releases/download/v1.0.0.2/app.zip",
///         "https://mirror.example/app.zip",
///     ]
/// );
/// ```
#[must_use]
pub fn build_manifest(params: ManifestParams) -> PackageManifest {
    let primary = params
        .release
        .as_ref()
        .map(|release| {
            release
                .repository
                .release_download_url(&params.version, &release.asset_name)
        });
    let explicit = params
        .explicit_urls
        .iter()
        .map(|url| url.trim())
        .filter(|url| !url.is_empty())
        .map(str::to_owned);
    let urls = primary.into_iter().chain(explicit).collect();

    PackageManifest::new(
        params.version,
        params.archive_digest,
        urls,
        params.file_digests,
    )
}

/// Split a comma-separated URL argument, dropping blank entries.
///
/// # Examples
///
/// ```
/// use dh_updater::manifest::parse_url_list;
///
/// assert_eq!(parse_url_list("a, ,b,"), ["a", "b"]);
/// assert!(parse_url_list("").is_empty());
/// ```
#[must_use]
pub fn parse_url_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|url| !url.is_empty())
        .map(str::to_owned)
        .collect()
}

#[cfg(test)]
#[path = "manifest_tests.rs"]
mod tests;
