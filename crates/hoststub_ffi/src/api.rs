//! C ABI entry points an extension exports to its host loader.
//!
//! # Responsibility
//! - Expose stub negotiation with the host's historical pass/fail contract.
//! - Expose the process-wide bound tables for indirect calls.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - Every failure is a null pointer (or non-zero status); details go to the
//!   log only.

use hoststub_core::abi::{HandleHeader, SecondaryTable, StubTable};
use hoststub_core::{
    init_logging as init_logging_inner, init_stubs, process_bindings, HostHandle, LoggingConfig,
    VersionRequest,
};
use log::{error, warn};
use std::ffi::{c_char, c_int, CStr};
use std::ptr;

const CORE_VERSION_C: &CStr =
    match CStr::from_bytes_with_nul(concat!(env!("CARGO_PKG_VERSION"), "\0").as_bytes()) {
        Ok(value) => value,
        Err(_) => panic!("crate version contains a NUL byte"),
    };

/// Negotiates and binds the host's stub tables.
///
/// Input semantics:
/// - `handle`: the host's negotiation handle (starts with `HandleHeader`).
/// - `version`: NUL-terminated requested version, e.g. `8.6`, or null for
///   whatever version the host provides. Forwarded to the host unchanged.
/// - `exact`: non-zero requires exactly `version`; zero accepts the newest
///   version with the same major component.
///
/// Returns the host-owned actual version, or null on any failure.
///
/// # Safety
/// `handle` must be null or satisfy `HostHandle::from_raw`; `version` must be
/// null or a NUL-terminated string.
#[no_mangle]
pub unsafe extern "C" fn hoststub_init_stubs(
    handle: *mut HandleHeader,
    version: *const c_char,
    exact: c_int,
) -> *const c_char {
    let Some(handle) = HostHandle::from_raw(handle) else {
        warn!("event=ffi_init_stubs module=ffi status=error error_code=null_handle");
        return ptr::null();
    };

    let version =
        (!version.is_null()).then(|| CStr::from_ptr(version).to_string_lossy().into_owned());
    let request = VersionRequest::from_flag(version, exact != 0);
    match init_stubs(&handle, &request, process_bindings()) {
        Ok(actual) => actual.as_ptr(),
        Err(_) => ptr::null(),
    }
}

/// Bound main table, or null before a successful negotiation.
#[no_mangle]
pub extern "C" fn hoststub_stubs() -> *const StubTable {
    process_bindings().current().main
}

/// Bound platform table, or null.
#[no_mangle]
pub extern "C" fn hoststub_plat_stubs() -> *const SecondaryTable {
    process_bindings().current().plat
}

/// Bound internal table, or null.
#[no_mangle]
pub extern "C" fn hoststub_int_stubs() -> *const SecondaryTable {
    process_bindings().current().int
}

/// Bound internal-platform table, or null.
#[no_mangle]
pub extern "C" fn hoststub_int_plat_stubs() -> *const SecondaryTable {
    process_bindings().current().int_plat
}

/// Clears every bound table; call before the extension is unloaded.
#[no_mangle]
pub extern "C" fn hoststub_unbind() {
    process_bindings().unbind();
}

/// Starts file logging once per process.
///
/// Returns 0 on success, 1 on invalid input or startup failure.
/// Safe to repeat with the same `level` + `log_dir`.
///
/// # Safety
/// Both pointers must be null or NUL-terminated strings.
#[no_mangle]
pub unsafe extern "C" fn hoststub_init_logging(
    level: *const c_char,
    log_dir: *const c_char,
) -> c_int {
    if level.is_null() || log_dir.is_null() {
        return 1;
    }
    let level = CStr::from_ptr(level).to_string_lossy();
    let log_dir = CStr::from_ptr(log_dir).to_string_lossy();
    let result =
        LoggingConfig::new(&level, log_dir.trim()).and_then(|config| init_logging_inner(&config));
    match result {
        Ok(()) => 0,
        Err(err) => {
            error!("event=ffi_init_logging module=ffi status=error error={}", err);
            1
        }
    }
}

/// Starts file logging from `HOSTSTUB_LOG_LEVEL` / `HOSTSTUB_LOG_DIR`.
///
/// Returns 0 on success, 1 when the directory is missing or invalid or
/// logging cannot start.
#[no_mangle]
pub extern "C" fn hoststub_init_logging_from_env() -> c_int {
    match LoggingConfig::from_env().and_then(|config| init_logging_inner(&config)) {
        Ok(()) => 0,
        Err(err) => {
            error!("event=ffi_init_logging module=ffi status=error source=env error={}", err);
            1
        }
    }
}

/// Static NUL-terminated core version.
#[no_mangle]
pub extern "C" fn hoststub_core_version() -> *const c_char {
    CORE_VERSION_C.as_ptr()
}
