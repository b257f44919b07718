//! Four-part dotted version extraction.
//!
//! Windows builds embed their file version as `major.minor.build.revision`
//! in the version resource, which survives as a printable string. The first
//! such token in the extracted text names the release.

use crate::error::{PipelineError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

#[expect(clippy::expect_used, reason = "pattern is a compile-time constant")]
static VERSION_TOKEN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[0-9]+\.[0-9]+\.[0-9]+\.[0-9]+").expect("version pattern compiles")
});

/// A dotted four-component numeric version, e.g. `2.3.1.7`.
///
/// Components are kept as text so leading zeros survive unchanged into
/// manifest file contents and release URLs.
///
/// # Examples
///
/// ```
/// use dh_updater::version::Version;
///
/// let version = Version::try_from("1.0.12.3").expect("valid version");
/// assert_eq!(version.as_str(), "1.0.12.3");
/// assert!(Version::try_from("1.0.12").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Version(String);

impl Version {
    /// Return the version as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Error returned when a string is not a four-part dotted numeric version.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid version \"{0}\": expected four dot-separated numbers")]
pub struct InvalidVersion(String);

fn is_four_part_numeric(value: &str) -> bool {
    let parts: Vec<&str> = value.split('.').collect();
    parts.len() == 4
        && parts
            .iter()
            .all(|part| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit()))
}

impl TryFrom<&str> for Version {
    type Error = InvalidVersion;

    fn try_from(value: &str) -> std::result::Result<Self, Self::Error> {
        Self::try_from(value.to_owned())
    }
}

impl TryFrom<String> for Version {
    type Error = InvalidVersion;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        if is_four_part_numeric(&value) {
            Ok(Self(value))
        } else {
            Err(InvalidVersion(value))
        }
    }
}

impl From<Version> for String {
    fn from(value: Version) -> Self {
        value.0
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Find the first four-part dotted version token in `text`.
///
/// No semantic check is applied, so `0.0.0.0` is accepted. A longer run
/// such as `1.2.3.4.5` yields its first four components.
///
/// # Errors
///
/// Returns [`PipelineError::VersionNotFound`] when no token is present.
///
/// # Examples
///
/// ```
/// use dh_updater::version::extract_version;
///
/// let version = extract_version("ProductVersion v2.3.1.7 (x64)").expect("token present");
/// assert_eq!(version.as_str(), "2.3.1.7");
/// ```
pub fn extract_version(text: &str) -> Result<Version> {
    VERSION_TOKEN
        .find(text)
        .map(|found| Version(found.as_str().to_owned()))
        .ok_or(PipelineError::VersionNotFound)
}
