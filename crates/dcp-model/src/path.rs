//! Package paths
//!
//! Provides [`PackagePath`], the dotted package an object lives in
//! (for example `old.pkg`) and the target package it is copied into.

use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Dotted package path
///
/// The default package is the empty path.
///
/// # Examples
/// - `["old", "pkg"]` → `old.pkg`
/// - `[]` → `` (default package)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PackagePath(Vec<String>);

impl PackagePath {
    /// Create new path from segments
    #[inline]
    #[must_use]
    pub fn new(segments: Vec<String>) -> Self {
        Self(segments)
    }

    /// The default (empty) package
    #[inline]
    #[must_use]
    pub fn default_package() -> Self {
        Self(Vec::new())
    }

    /// Get path segments
    #[inline]
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.0
    }

    /// Get number of segments
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if this is the default package
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Parent package (if not the default package)
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        if self.0.is_empty() {
            None
        } else {
            Some(Self(self.0[..self.0.len() - 1].to_vec()))
        }
    }

    /// Append a segment, returning new path
    #[inline]
    #[must_use]
    pub fn child(&self, segment: impl Into<String>) -> Self {
        let mut new = self.clone();
        new.0.push(segment.into());
        new
    }

    /// Append all segments of `other`
    #[inline]
    #[must_use]
    pub fn join(&self, other: &Self) -> Self {
        let mut new = self.clone();
        new.0.extend(other.0.iter().cloned());
        new
    }

    /// Number of leading segments equal in both paths
    ///
    /// # Examples
    /// - `a.b.c` vs `a.b.d` → 2
    /// - `a.b` vs `x` → 0
    #[inline]
    #[must_use]
    pub fn matching_first_segments(&self, other: &Self) -> usize {
        self.0
            .iter()
            .zip(&other.0)
            .take_while(|(a, b)| a == b)
            .count()
    }

    /// Drop the first `count` segments
    ///
    /// Removing more segments than the path has yields the default package.
    #[inline]
    #[must_use]
    pub fn remove_first_segments(&self, count: usize) -> Self {
        Self(self.0.iter().skip(count).cloned().collect())
    }

    /// Check if this path is a prefix of another
    #[inline]
    #[must_use]
    pub fn is_prefix_of(&self, other: &Self) -> bool {
        self.matching_first_segments(other) == self.0.len()
    }

    /// Qualify a simple name with this package
    #[must_use]
    pub fn qualify(&self, name: &str) -> String {
        if self.0.is_empty() {
            name.to_string()
        } else {
            format!("{self}.{name}")
        }
    }

    /// Iterator over segments from outermost to innermost
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl Display for PackagePath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.join("."))
    }
}

impl FromStr for PackagePath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.is_empty() {
            return Ok(Self::default_package());
        }

        let segments: Vec<String> = s
            .split('.')
            .map(|seg| {
                if seg.is_empty() {
                    Err(PathError::EmptySegment(s.to_string()))
                } else if seg.contains(|c: char| !c.is_alphanumeric() && c != '_') {
                    Err(PathError::InvalidSegment(seg.to_string()))
                } else {
                    Ok(seg.to_string())
                }
            })
            .collect::<Result<_, _>>()?;

        Ok(Self(segments))
    }
}

impl TryFrom<String> for PackagePath {
    type Error = PathError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PackagePath> for String {
    fn from(path: PackagePath) -> Self {
        path.to_string()
    }
}

/// Errors related to package paths
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    /// Empty segment in path
    #[error("package '{0}' contains an empty segment")]
    EmptySegment(String),

    /// Invalid segment characters
    #[error("invalid package segment: {0} (must be alphanumeric or underscore)")]
    InvalidSegment(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pkg(s: &str) -> PackagePath {
        s.parse().unwrap()
    }

    #[test]
    fn path_segments_and_len() {
        let path = pkg("old.pkg");
        assert_eq!(path.segments(), &["old", "pkg"]);
        assert_eq!(path.len(), 2);
    }

    #[test]
    fn default_package_is_empty() {
        let path = pkg("");
        assert!(path.is_empty());
        assert!(path.parent().is_none());
        assert_eq!(path.to_string(), "");
    }

    #[test]
    fn path_parent_and_child() {
        let path = pkg("a.b.c");
        assert_eq!(path.parent().unwrap(), pkg("a.b"));
        assert_eq!(pkg("a").child("b"), pkg("a.b"));
    }

    #[test]
    fn matching_first_segments_counts_common_prefix() {
        assert_eq!(pkg("a.b.c").matching_first_segments(&pkg("a.b.d")), 2);
        assert_eq!(pkg("a.b").matching_first_segments(&pkg("a.b")), 2);
        assert_eq!(pkg("a.b").matching_first_segments(&pkg("x")), 0);
        assert_eq!(pkg("").matching_first_segments(&pkg("a")), 0);
    }

    #[test]
    fn remove_first_segments_saturates() {
        assert_eq!(pkg("old.pkg.sub").remove_first_segments(1), pkg("pkg.sub"));
        assert_eq!(pkg("old.pkg").remove_first_segments(2), pkg(""));
        assert_eq!(pkg("old.pkg").remove_first_segments(5), pkg(""));
    }

    #[test]
    fn join_appends_segments() {
        assert_eq!(pkg("new.pkg").join(&pkg("sub")), pkg("new.pkg.sub"));
        assert_eq!(pkg("new.pkg").join(&pkg("")), pkg("new.pkg"));
        assert_eq!(pkg("").join(&pkg("sub")), pkg("sub"));
    }

    #[test]
    fn qualify_handles_default_package() {
        assert_eq!(pkg("a.b").qualify("Foo"), "a.b.Foo");
        assert_eq!(pkg("").qualify("Foo"), "Foo");
    }

    #[test]
    fn from_str_rejects_empty_segment() {
        let result: Result<PackagePath, _> = "a..b".parse();
        assert!(matches!(result, Err(PathError::EmptySegment(_))));
    }

    #[test]
    fn from_str_rejects_invalid_chars() {
        let result: Result<PackagePath, _> = "a.b-c".parse();
        assert!(matches!(result, Err(PathError::InvalidSegment(_))));
    }

    #[test]
    fn serde_uses_dotted_string() {
        let json = serde_json::to_string(&pkg("old.pkg")).unwrap();
        assert_eq!(json, "\"old.pkg\"");
        let back: PackagePath = serde_json::from_str(&json).unwrap();
        assert_eq!(back, pkg("old.pkg"));
    }
}
