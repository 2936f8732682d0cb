//! Stub-table binding for extensions loaded into a host runtime.
//!
//! An extension links against this crate instead of a specific host build.
//! At load time the host hands over a negotiation handle; `init_stubs` checks
//! the table layout, negotiates a version through the host's package registry
//! and binds the resulting tables for indirect calls.

pub mod abi;
pub mod logging;
pub mod stubs;
pub mod version;

pub use abi::{PACKAGE_NAME, STUB_MAGIC};
pub use logging::{default_log_level, init_logging, logging_status, LoggingConfig, LoggingError};
pub use stubs::{
    check_stub_support, init_stubs, process_bindings, BindingRegistry, BindingSnapshot, Bindings,
    HostHandle, NegotiationError, NegotiationResult,
};
pub use version::{RequireMode, Version, VersionError, VersionRequest};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
