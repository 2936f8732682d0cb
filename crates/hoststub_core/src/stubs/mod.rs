//! Stub table negotiation.
//!
//! Flow: `check_stub_support` validates the host's table, `init_stubs` asks
//! the host registry for a version match and records the result in a
//! `BindingRegistry`.

pub mod bindings;
pub mod compat;
pub mod error;
pub mod handle;
pub mod negotiate;

pub use bindings::{process_bindings, BindingRegistry, BindingSnapshot, Bindings};
pub use compat::{check_stub_support, SupportedTable, TableView};
pub use error::{NegotiationError, NegotiationResult};
pub use handle::HostHandle;
pub use negotiate::init_stubs;
