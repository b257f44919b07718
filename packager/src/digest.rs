//! Archive and per-file digests.
//!
//! The update client verifies the downloaded archive against a base64
//! SHA-512 digest and decides which installed files changed by comparing
//! hex MD5 digests. Both are computed over raw bytes with no normalisation.

use crate::error::{PipelineError, Result};
use crate::walker::FileEntry;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha512};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io::Read;
use std::path::Path;

/// Length in bytes of a SHA-512 digest.
const SHA512_LEN: usize = 64;

/// Length of a hex-encoded MD5 digest.
const MD5_HEX_LEN: usize = 32;

/// Errors raised when a digest string fails validation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DigestError {
    /// The value is not standard base64 of a 64-byte digest.
    #[error("invalid SHA-512 digest: {reason}")]
    InvalidSha512 {
        /// Description of the validation failure.
        reason: String,
    },

    /// The value is not a 32-character lowercase hex string.
    #[error("invalid MD5 digest: {reason}")]
    InvalidMd5 {
        /// Description of the validation failure.
        reason: String,
    },
}

/// A base64-encoded SHA-512 digest of a whole archive.
///
/// # Examples
///
/// ```
/// use dh_updater::digest::digest_archive;
///
/// let digest = digest_archive(b"");
/// assert_eq!(digest.as_str().len(), 88);
/// assert!(digest.as_str().ends_with("=="));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Sha512Digest(String);

impl Sha512Digest {
    /// Return the digest as a base64 string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Sha512Digest {
    type Error = DigestError;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        let decoded = STANDARD
            .decode(&value)
            .map_err(|err| DigestError::InvalidSha512 {
                reason: err.to_string(),
            })?;
        if decoded.len() != SHA512_LEN {
            return Err(DigestError::InvalidSha512 {
                reason: format!("expected {SHA512_LEN} bytes, got {}", decoded.len()),
            });
        }
        Ok(Self(value))
    }
}

impl TryFrom<&str> for Sha512Digest {
    type Error = DigestError;

    fn try_from(value: &str) -> std::result::Result<Self, Self::Error> {
        Self::try_from(value.to_owned())
    }
}

impl From<Sha512Digest> for String {
    fn from(value: Sha512Digest) -> Self {
        value.0
    }
}

impl fmt::Display for Sha512Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A lowercase hex MD5 digest of one file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Md5Digest(String);

impl Md5Digest {
    /// Return the digest as a hex string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Md5Digest {
    type Error = DigestError;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        if value.len() != MD5_HEX_LEN {
            return Err(DigestError::InvalidMd5 {
                reason: format!("expected {MD5_HEX_LEN} hex characters, got {}", value.len()),
            });
        }
        if let Some(bad) = value
            .chars()
            .find(|c| !matches!(c, '0'..='9' | 'a'..='f'))
        {
            return Err(DigestError::InvalidMd5 {
                reason: format!("non-lowercase-hex character '{bad}'"),
            });
        }
        Ok(Self(value))
    }
}

impl TryFrom<&str> for Md5Digest {
    type Error = DigestError;

    fn try_from(value: &str) -> std::result::Result<Self, Self::Error> {
        Self::try_from(value.to_owned())
    }
}

impl From<Md5Digest> for String {
    fn from(value: Md5Digest) -> Self {
        value.0
    }
}

impl fmt::Display for Md5Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Compute the base64 SHA-512 digest of in-memory archive bytes.
#[must_use]
pub fn digest_archive(bytes: &[u8]) -> Sha512Digest {
    Sha512Digest(STANDARD.encode(Sha512::digest(bytes)))
}

/// Compute the hex MD5 digest of in-memory file bytes.
#[must_use]
pub fn digest_file(bytes: &[u8]) -> Md5Digest {
    Md5Digest(format!("{:x}", md5::compute(bytes)))
}

/// Compute the SHA-512 digest of the archive at `path`.
///
/// Reads the file in chunks so large archives are not held in memory.
///
/// # Errors
///
/// Returns [`PipelineError::Io`] if the file cannot be read.
pub fn digest_archive_file(path: &Path) -> Result<Sha512Digest> {
    let mut file = fs::File::open(path).map_err(|err| PipelineError::io(path, err))?;
    let mut hasher = Sha512::new();
    let mut buffer = [0u8; 8192];
    loop {
        let bytes_read = file
            .read(&mut buffer)
            .map_err(|err| PipelineError::io(path, err))?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(buffer.get(..bytes_read).unwrap_or_default());
    }
    Ok(Sha512Digest(STANDARD.encode(hasher.finalize())))
}

/// Compute the MD5 digest of every walked file, keyed by relative path.
///
/// # Errors
///
/// Returns [`PipelineError::Io`] if any file cannot be read.
pub fn digest_tree(files: &[FileEntry]) -> Result<BTreeMap<String, Md5Digest>> {
    files
        .iter()
        .map(|file| {
            let bytes = fs::read(&file.absolute_path)
                .map_err(|err| PipelineError::io(&file.absolute_path, err))?;
            Ok((file.relative_path.clone(), digest_file(&bytes)))
        })
        .collect()
}
