//! Pipeline configuration.
//!
//! CI workflows hand the packager its exclusion patterns and repository
//! through the environment. Those values are gathered once into a
//! [`PipelineConfig`] so the pipeline itself never reads the environment.

use crate::pattern::ExclusionSet;
use crate::version::Version;
use std::fmt;
use thiserror::Error;

/// Environment variable holding the `;`/`,` separated exclusion patterns.
pub const EXCLUDE_PATTERNS_ENV: &str = "EXCLUDE_PATTERNS";

/// Environment variable holding the `owner/name` repository identifier.
pub const REPOSITORY_ENV: &str = "GITHUB_REPOSITORY";

/// Host that serves release downloads.
const RELEASE_HOST: &str = "https://github.com";

/// Errors raised while assembling configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// The repository identifier is not of the form `owner/name`.
    #[error("invalid repository identifier \"{value}\"; expected owner/name")]
    InvalidRepository {
        /// The rejected identifier.
        value: String,
    },
}

/// A validated `owner/name` repository identifier.
///
/// # Examples
///
/// ```
/// use dh_updater::config::RepositoryId;
///
/// let repo = RepositoryId::try_from("acme/widget").expect("valid repository");
/// assert_eq!(repo.owner(), "acme");
/// assert_eq!(repo.name(), "widget");
/// assert!(RepositoryId::try_from("acme").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RepositoryId {
    owner: String,
    name: String,
}

impl RepositoryId {
    /// Return the owning user or organisation.
    #[must_use]
    pub fn owner(&self) -> &str {
        &self.owner
    }

    /// Return the repository name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Return the download URL of `asset` attached to the `v<version>` release.
    ///
    /// # Examples
    ///
    /// ```
    /// use dh_updater::config::RepositoryId;
    /// use dh_updater::version::Version;
    ///
    /// let repo = RepositoryId::try_from("acme/widget").expect("valid repository");
    /// let version = Version::try_from("1.2.3.4").expect("valid version");
    /// assert_eq!(
    ///     repo.release_download_url(&version, "widget.zip"),
    ///     "https://github.com/acme/widget/releases/download/v1.2.3.4/widget.zip"
    /// );
    /// ```
    #[must_use]
    pub fn release_download_url(&self, version: &Version, asset: &str) -> String {
        format!(
            "{RELEASE_HOST}/{}/{}/releases/download/v{version}/{asset}",
            self.owner, self.name
        )
    }
}

impl TryFrom<&str> for RepositoryId {
    type Error = ConfigError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let invalid = || ConfigError::InvalidRepository {
            value: value.to_owned(),
        };
        let (owner, name) = value.trim().split_once('/').ok_or_else(invalid)?;
        let valid_part =
            |part: &str| !part.is_empty() && !part.contains('/') && !part.contains(char::is_whitespace);
        if !valid_part(owner) || !valid_part(name) {
            return Err(invalid());
        }
        Ok(Self {
            owner: owner.to_owned(),
            name: name.to_owned(),
        })
    }
}

impl fmt::Display for RepositoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Explicit configuration for one pipeline run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineConfig {
    /// Patterns applied to both archiving and hashing.
    pub exclude_patterns: ExclusionSet,
    /// Repository used to derive the primary release download URL.
    pub repository: Option<RepositoryId>,
}

impl PipelineConfig {
    /// Build a configuration from raw pattern and repository strings.
    ///
    /// A missing or blank repository yields `None`; a non-blank but
    /// malformed one is an error.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidRepository`] for a malformed repository.
    pub fn from_values(
        exclude_patterns: Option<&str>,
        repository: Option<&str>,
    ) -> Result<Self, ConfigError> {
        let repository = repository
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(RepositoryId::try_from)
            .transpose()?;
        Ok(Self {
            exclude_patterns: ExclusionSet::parse(exclude_patterns.unwrap_or_default()),
            repository,
        })
    }

    /// Read [`EXCLUDE_PATTERNS_ENV`] and [`REPOSITORY_ENV`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidRepository`] for a malformed repository.
    pub fn from_env() -> Result<Self, ConfigError> {
        let patterns = std::env::var(EXCLUDE_PATTERNS_ENV).ok();
        let repository = std::env::var(REPOSITORY_ENV).ok();
        Self::from_values(patterns.as_deref(), repository.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::simple("acme/widget")]
    #[case::dotted("acme-corp/widget.rs")]
    #[case::padded("  acme/widget ")]
    fn accepts_owner_and_name(#[case] value: &str) {
        assert!(RepositoryId::try_from(value).is_ok());
    }

    #[rstest]
    #[case::no_slash("widget")]
    #[case::empty_owner("/widget")]
    #[case::empty_name("acme/")]
    #[case::too_many_parts("acme/widget/extra")]
    #[case::inner_space("acme/my widget")]
    fn rejects_malformed_repository(#[case] value: &str) {
        assert_eq!(
            RepositoryId::try_from(value),
            Err(ConfigError::InvalidRepository {
                value: value.to_owned()
            })
        );
    }

    #[test]
    fn display_round_trips() {
        let repo = RepositoryId::try_from("acme/widget").expect("valid");
        assert_eq!(repo.to_string(), "acme/widget");
    }

    #[test]
    fn from_values_treats_blank_repository_as_absent() {
        let config = PipelineConfig::from_values(Some("*.pdb"), Some("   ")).expect("valid");
        assert!(config.repository.is_none());
        assert_eq!(config.exclude_patterns.len(), 1);
    }

    #[test]
    fn from_values_rejects_malformed_repository() {
        let result = PipelineConfig::from_values(None, Some("not-a-repo"));
        assert!(result.is_err());
    }

    #[test]
    fn from_env_reads_both_variables() {
        temp_env::with_vars(
            [
                (EXCLUDE_PATTERNS_ENV, Some("*.pdb;logs/**")),
                (REPOSITORY_ENV, Some("acme/widget")),
            ],
            || {
                let config = PipelineConfig::from_env().expect("valid env");
                assert_eq!(config.exclude_patterns.len(), 2);
                assert_eq!(
                    config.repository.map(|r| r.to_string()),
                    Some("acme/widget".to_owned())
                );
            },
        );
    }

    #[test]
    fn from_env_defaults_when_unset() {
        temp_env::with_vars_unset([EXCLUDE_PATTERNS_ENV, REPOSITORY_ENV], || {
            let config = PipelineConfig::from_env().expect("valid env");
            assert_eq!(config, PipelineConfig::default());
        });
    }
}
