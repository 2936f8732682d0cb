//! Version descriptors and package version ordering.
//!
//! # Responsibility
//! - Carry the requested version and the exact/minimum flag to the host.
//! - Parse and order host package versions (`8.6`, `8.7a5`, `9.0b1`).
//!
//! # Invariants
//! - A version is decimal components separated by `.`, with at most one `a`
//!   (alpha) or `b` (beta) separator.
//! - At the same position alpha < beta < release.
//! - Negotiation never parses or rewrites the requested version;
//!   `is_satisfied_by` exists for host-side registries.

use once_cell::sync::Lazy;
use regex::Regex;
use std::cmp::Ordering;
use std::error::Error;
use std::fmt::{Display, Formatter};

static VERSION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d+(?:\.\d+)*(?:[ab]\d+(?:\.\d+)*)?$").expect("valid version regex")
});

const ALPHA_MARKER: i64 = -2;
const BETA_MARKER: i64 = -1;

/// How the host registry must match the requested version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequireMode {
    /// Only the requested version itself.
    Exact,
    /// The newest version with the same major component, at least the request.
    AtLeast,
}

impl RequireMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::AtLeast => "at_least",
        }
    }
}

/// Requested version plus match mode.
///
/// A request without a version asks the host for whatever it provides; the
/// mode is still passed through unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionRequest {
    version: Option<String>,
    mode: RequireMode,
}

impl VersionRequest {
    pub fn new(version: impl Into<String>, mode: RequireMode) -> Self {
        Self {
            version: Some(version.into()),
            mode,
        }
    }

    pub fn exact(version: impl Into<String>) -> Self {
        Self::new(version, RequireMode::Exact)
    }

    pub fn at_least(version: impl Into<String>) -> Self {
        Self::new(version, RequireMode::AtLeast)
    }

    /// Any version the host provides.
    pub fn any() -> Self {
        Self {
            version: None,
            mode: RequireMode::AtLeast,
        }
    }

    /// Builds a request from a C-style nullable version and `exact` flag.
    pub fn from_flag(version: Option<String>, exact: bool) -> Self {
        let mode = if exact {
            RequireMode::Exact
        } else {
            RequireMode::AtLeast
        };
        Self { version, mode }
    }

    /// The requested version exactly as it will be sent to the host.
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }

    pub fn mode(&self) -> RequireMode {
        self.mode
    }

    pub fn exact_flag(&self) -> bool {
        self.mode == RequireMode::Exact
    }

    /// Parses the requested version string; `None` for an any-version request.
    pub fn parsed(&self) -> Option<Result<Version, VersionError>> {
        self.version.as_deref().map(Version::parse)
    }

    /// Returns whether `actual` meets this request.
    ///
    /// An any-version request accepts everything; an unparsable request
    /// accepts nothing.
    pub fn is_satisfied_by(&self, actual: &Version) -> bool {
        let requested = match self.parsed() {
            None => return true,
            Some(Ok(requested)) => requested,
            Some(Err(_)) => return false,
        };
        match self.mode {
            RequireMode::Exact => *actual == requested,
            RequireMode::AtLeast => actual.major() == requested.major() && *actual >= requested,
        }
    }
}

/// Parsed package version.
#[derive(Debug, Clone)]
pub struct Version {
    text: String,
    parts: Vec<i64>,
}

impl Version {
    pub fn parse(value: &str) -> Result<Self, VersionError> {
        let text = value.trim();
        if text.is_empty() {
            return Err(VersionError::Empty);
        }
        if !VERSION_RE.is_match(text) {
            return Err(VersionError::Malformed(text.to_string()));
        }

        let mut parts = Vec::new();
        let mut digits = String::new();
        for c in text.chars() {
            if c.is_ascii_digit() {
                digits.push(c);
                continue;
            }
            parts.push(parse_component(&digits, text)?);
            digits.clear();
            match c {
                'a' => parts.push(ALPHA_MARKER),
                'b' => parts.push(BETA_MARKER),
                _ => {}
            }
        }
        parts.push(parse_component(&digits, text)?);

        Ok(Self {
            text: text.to_string(),
            parts,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn major(&self) -> i64 {
        self.parts[0]
    }

    pub fn is_prerelease(&self) -> bool {
        self.parts.iter().any(|part| *part < 0)
    }
}

fn parse_component(digits: &str, text: &str) -> Result<i64, VersionError> {
    digits
        .parse::<i64>()
        .map_err(|_| VersionError::Malformed(text.to_string()))
}

impl Ord for Version {
    fn cmp(&self, other: &Self) -> Ordering {
        for (left, right) in self.parts.iter().zip(&other.parts) {
            match left.cmp(right) {
                Ordering::Equal => continue,
                unequal => return unequal,
            }
        }

        // The longer version wins unless its next part opens a pre-release.
        match self.parts.len().cmp(&other.parts.len()) {
            Ordering::Equal => Ordering::Equal,
            Ordering::Greater => {
                if self.parts[other.parts.len()] < 0 {
                    Ordering::Less
                } else {
                    Ordering::Greater
                }
            }
            Ordering::Less => {
                if other.parts[self.parts.len()] < 0 {
                    Ordering::Greater
                } else {
                    Ordering::Less
                }
            }
        }
    }
}

impl PartialOrd for Version {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Version {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Version {}

impl Display for Version {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.text)
    }
}

/// Version parse errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionError {
    Empty,
    Malformed(String),
}

impl Display for VersionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty => write!(f, "version must not be empty"),
            Self::Malformed(value) => write!(
                f,
                "version is malformed: {value} (expected digits separated by `.`, `a` or `b`)"
            ),
        }
    }
}

impl Error for VersionError {}
