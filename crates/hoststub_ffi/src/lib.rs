//! C ABI surface for extensions built on `hoststub_core`.

pub mod api;
