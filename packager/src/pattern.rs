//! Exclusion patterns for packaging and hashing.
//!
//! Three pattern forms are recognised:
//!
//! - `dir/**` excludes `dir` itself and everything beneath it.
//! - `*.ext` excludes any path ending in `.ext`.
//! - anything else excludes exactly that relative path.
//!
//! Patterns are parsed once into [`ExclusionPattern`] values. Matching is a
//! union of independent predicates, so the order of patterns never changes
//! the outcome.

use std::fmt;

/// Synthetic child appended to a directory path when deciding whether to prune it.
pub const DIRECTORY_PLACEHOLDER: &str = "dummy";

/// A single parsed exclusion rule.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ExclusionPattern {
    /// Matches the prefix itself or any path nested beneath it.
    DirectoryPrefix(String),
    /// Matches any path ending in this suffix; the suffix keeps its dot.
    ExtensionSuffix(String),
    /// Matches one literal relative path.
    ExactPath(String),
}

impl ExclusionPattern {
    /// Parse one pattern from its source form.
    ///
    /// Backslashes are normalised to `/` and surrounding whitespace is
    /// trimmed. Returns `None` for an empty entry.
    ///
    /// # Examples
    ///
    /// ```
    /// use dh_updater::pattern::ExclusionPattern;
    ///
    /// assert_eq!(
    ///     ExclusionPattern::parse("logs\\**"),
    ///     Some(ExclusionPattern::DirectoryPrefix("logs".to_owned()))
    /// );
    /// assert_eq!(
    ///     ExclusionPattern::parse("*.pdb"),
    ///     Some(ExclusionPattern::ExtensionSuffix(".pdb".to_owned()))
    /// );
    /// assert_eq!(ExclusionPattern::parse("  "), None);
    /// ```
    #[must_use]
    pub fn parse(source: &str) -> Option<Self> {
        let normalised = normalise(source.trim());
        if normalised.is_empty() {
            return None;
        }
        if let Some(prefix) = normalised.strip_suffix("/**") {
            return Some(Self::DirectoryPrefix(prefix.to_owned()));
        }
        if let Some(suffix) = normalised.strip_prefix('*')
            && suffix.starts_with('.')
        {
            return Some(Self::ExtensionSuffix(suffix.to_owned()));
        }
        Some(Self::ExactPath(normalised))
    }

    /// Return whether this pattern matches a `/`-separated relative path.
    #[must_use]
    pub fn matches(&self, path: &str) -> bool {
        match self {
            Self::DirectoryPrefix(prefix) => {
                path == prefix
                    || path
                        .strip_prefix(prefix.as_str())
                        .is_some_and(|rest| rest.starts_with('/'))
            }
            Self::ExtensionSuffix(suffix) => path.ends_with(suffix.as_str()),
            Self::ExactPath(exact) => path == exact,
        }
    }
}

impl fmt::Display for ExclusionPattern {
    /// Render the pattern back into its source form.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DirectoryPrefix(prefix) => write!(f, "{prefix}/**"),
            Self::ExtensionSuffix(suffix) => write!(f, "*{suffix}"),
            Self::ExactPath(exact) => f.write_str(exact),
        }
    }
}

/// An immutable, ordered collection of exclusion patterns.
///
/// # Examples
///
/// ```
/// use dh_updater::pattern::ExclusionSet;
///
/// let set = ExclusionSet::parse("*.pdb; b/obj/**, ,notes.txt");
/// assert_eq!(set.len(), 3);
/// assert!(set.is_excluded("b/obj"));
/// assert!(set.is_excluded("b\\c.pdb"));
/// assert!(!set.is_excluded("a.txt"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExclusionSet {
    patterns: Vec<ExclusionPattern>,
}

impl ExclusionSet {
    /// Parse a `;` or `,` separated pattern list, dropping empty entries.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        raw.split([';', ',']).filter_map(ExclusionPattern::parse).collect()
    }

    /// Return the parsed patterns in their configured order.
    #[must_use]
    pub fn patterns(&self) -> &[ExclusionPattern] {
        &self.patterns
    }

    /// Return the number of patterns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Return `true` when no pattern is configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Return whether `relative_path` is excluded by any pattern.
    ///
    /// Backslash separators in `relative_path` are normalised first.
    #[must_use]
    pub fn is_excluded(&self, relative_path: &str) -> bool {
        let path = normalise(relative_path);
        self.patterns.iter().any(|pattern| pattern.matches(&path))
    }

    /// Return whether the directory at `relative_path` should be pruned.
    ///
    /// The matcher is tried against a synthetic child so that only patterns
    /// covering every descendant prune the subtree.
    #[must_use]
    pub fn prunes_directory(&self, relative_path: &str) -> bool {
        self.is_excluded(&format!("{relative_path}/{DIRECTORY_PLACEHOLDER}"))
    }
}

impl FromIterator<ExclusionPattern> for ExclusionSet {
    fn from_iter<I: IntoIterator<Item = ExclusionPattern>>(iter: I) -> Self {
        Self {
            patterns: iter.into_iter().collect(),
        }
    }
}

impl fmt::Display for ExclusionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.patterns.is_empty() {
            return f.write_str("(none)");
        }
        for (index, pattern) in self.patterns.iter().enumerate() {
            if index > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{pattern}")?;
        }
        Ok(())
    }
}

/// Replace `\` separators with `/`.
#[must_use]
pub fn normalise(path: &str) -> String {
    path.replace('\\', "/")
}

#[cfg(test)]
#[path = "pattern_tests.rs"]
mod tests;
