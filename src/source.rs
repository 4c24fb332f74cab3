//! Source locators: local paths and remote URIs.

use crate::error::{Error, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Where a document comes from.
///
/// The locator keeps the caller's string verbatim; it is what the default id
/// function returns and what converters receive.
///
/// # Example
/// ```
/// use docling_reader::SourceLocator;
///
/// let remote = SourceLocator::parse("https://example.com/foo.pdf").unwrap();
/// assert!(remote.is_remote());
/// assert_eq!(remote.file_name(), Some("foo.pdf"));
///
/// let local = SourceLocator::parse("reports/q3.md").unwrap();
/// assert_eq!(local.extension().as_deref(), Some("md"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceLocator {
    raw: String,
    kind: SourceKind,
}

/// Kind of source a locator points to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SourceKind {
    /// A local filesystem path (including `file://` URIs).
    Path(PathBuf),
    /// A remote URI with the given scheme (e.g. `https`).
    Remote {
        /// Lowercase URI scheme
        scheme: String,
    },
}

impl SourceLocator {
    /// Parse a locator. Fails on empty or whitespace-only input.
    pub fn parse(raw: impl Into<String>) -> Result<Self> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(Error::InvalidSource("source locator is empty".into()));
        }

        let kind = match split_scheme(&raw) {
            Some(("file", rest)) => SourceKind::Path(PathBuf::from(rest)),
            Some((scheme, _)) => SourceKind::Remote {
                scheme: scheme.to_ascii_lowercase(),
            },
            None => SourceKind::Path(PathBuf::from(&raw)),
        };

        Ok(Self { raw, kind })
    }

    /// Build a locator from a filesystem path.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = path.to_string_lossy().into_owned();
        if raw.trim().is_empty() {
            return Err(Error::InvalidSource("source path is empty".into()));
        }
        Ok(Self {
            raw,
            kind: SourceKind::Path(path.to_path_buf()),
        })
    }

    /// The locator exactly as the caller supplied it.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// The kind of source.
    pub fn kind(&self) -> &SourceKind {
        &self.kind
    }

    /// Whether the locator is a remote URI.
    pub fn is_remote(&self) -> bool {
        matches!(self.kind, SourceKind::Remote { .. })
    }

    /// URI scheme for remote locators.
    pub fn scheme(&self) -> Option<&str> {
        match &self.kind {
            SourceKind::Remote { scheme } => Some(scheme),
            SourceKind::Path(_) => None,
        }
    }

    /// Local path, if this locator points at the filesystem.
    pub fn path(&self) -> Option<&Path> {
        match &self.kind {
            SourceKind::Path(p) => Some(p),
            SourceKind::Remote { .. } => None,
        }
    }

    /// Last path segment, without query string or fragment.
    pub fn file_name(&self) -> Option<&str> {
        match &self.kind {
            SourceKind::Path(p) => p.file_name().and_then(|n| n.to_str()),
            SourceKind::Remote { .. } => {
                let end = self.raw.find(&['?', '#'][..]).unwrap_or(self.raw.len());
                let without_query = &self.raw[..end];
                let after_scheme = without_query
                    .split_once("://")
                    .map(|(_, rest)| rest)
                    .unwrap_or(without_query);
                // Host only, no path segment.
                let (_, path) = after_scheme.split_once('/')?;
                path.rsplit('/').next().filter(|s| !s.is_empty())
            }
        }
    }

    /// Lowercase file extension without the leading dot.
    pub fn extension(&self) -> Option<String> {
        let name = self.file_name()?;
        let (stem, ext) = name.rsplit_once('.')?;
        if stem.is_empty() || ext.is_empty() {
            return None;
        }
        Some(ext.to_lowercase())
    }
}

/// Split `scheme://rest`. The scheme must start with a letter and contain only
/// letters, digits, `+`, `-` or `.`; single-letter schemes are rejected so that
/// Windows drive letters stay paths.
fn split_scheme(raw: &str) -> Option<(&str, &str)> {
    let (scheme, rest) = raw.split_once("://")?;
    let mut chars = scheme.chars();
    let first = chars.next()?;
    if !first.is_ascii_alphabetic() || scheme.len() < 2 {
        return None;
    }
    if !chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')) {
        return None;
    }
    // Schemes are case-insensitive; only "file" is matched on, the rest is kept.
    if scheme.eq_ignore_ascii_case("file") {
        return Some(("file", rest));
    }
    Some((scheme, rest))
}

impl fmt::Display for SourceLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl FromStr for SourceLocator {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl AsRef<str> for SourceLocator {
    fn as_ref(&self) -> &str {
        &self.raw
    }
}

impl TryFrom<&str> for SourceLocator {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self> {
        Self::parse(value)
    }
}

impl TryFrom<String> for SourceLocator {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(value)
    }
}
