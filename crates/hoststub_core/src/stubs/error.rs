//! Negotiation failure taxonomy.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Result alias for stub negotiation.
pub type NegotiationResult<T> = Result<T, NegotiationError>;

/// Why a negotiation produced no binding.
///
/// None of these are retryable from the core's side; the C ABI collapses all
/// of them into a null return.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NegotiationError {
    /// The host exposes no usable stub table.
    NoStubSupport,
    /// The host's table carries a foreign identification value.
    IncompatibleMagic { found: u32 },
    /// The host registry has no provider meeting the request. `requested` is
    /// `None` for an any-version request.
    VersionUnsatisfiable {
        package: &'static str,
        requested: Option<String>,
        exact: bool,
    },
}

impl NegotiationError {
    /// Stable code used in log records.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NoStubSupport => "no_stub_support",
            Self::IncompatibleMagic { .. } => "incompatible_magic",
            Self::VersionUnsatisfiable { .. } => "version_unsatisfiable",
        }
    }
}

impl Display for NegotiationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoStubSupport => write!(f, "host does not expose a stub table"),
            Self::IncompatibleMagic { found } => write!(
                f,
                "host stub table magic {found:#010x} does not match {:#010x}",
                crate::abi::STUB_MAGIC
            ),
            Self::VersionUnsatisfiable {
                package,
                requested,
                exact,
            } => {
                let Some(requested) = requested else {
                    return write!(f, "host cannot provide any version of package {package}");
                };
                let qualifier = if *exact { "exactly" } else { "at least" };
                write!(
                    f,
                    "host cannot provide package {package} {qualifier} {requested}"
                )
            }
        }
    }
}

impl Error for NegotiationError {}
