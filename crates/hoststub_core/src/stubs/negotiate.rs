//! Version negotiation and binding entry point.
//!
//! # Responsibility
//! - Run the support check, ask the host registry for a version match and
//!   bind the tables it returns.
//!
//! # Invariants
//! - The table pointer is re-derived from the handle on every call so an
//!   extension can be reloaded against a different host.
//! - Once support is confirmed the main slot is written before the version
//!   request and is not rolled back if the request fails.
//! - Every call that reaches the registry successfully leaves all four slots
//!   from the same negotiation (secondary slots nulled when hooks are absent).
//! - The requested version reaches the registry byte for byte; matching policy
//!   belongs to the host.

use crate::abi::{StubTable, PACKAGE_NAME};
use crate::stubs::bindings::BindingRegistry;
use crate::stubs::compat::check_stub_support;
use crate::stubs::error::{NegotiationError, NegotiationResult};
use crate::stubs::handle::HostHandle;
use crate::version::VersionRequest;
use log::{error, info, warn};
use std::ffi::{c_int, c_void, CStr, CString};
use std::ptr;
use std::time::Instant;

/// Binds `bindings` to the stub tables the host registry selects.
///
/// Returns the actual version string owned by the host.
///
/// # Errors
/// - `NoStubSupport` when the handle has no usable table.
/// - `IncompatibleMagic` when the table layout is foreign (a diagnostic is
///   reported to the host).
/// - `VersionUnsatisfiable` when the registry has no matching provider or the
///   requested version contains an interior NUL.
pub fn init_stubs<'h>(
    handle: &HostHandle<'h>,
    request: &VersionRequest,
    bindings: &BindingRegistry,
) -> NegotiationResult<&'h CStr> {
    let started_at = Instant::now();
    info!(
        "event=stub_negotiate module=stubs status=start version={} mode={}",
        request.version().unwrap_or("any"),
        request.mode().as_str()
    );

    let supported = match check_stub_support(handle) {
        Ok(supported) => supported,
        Err(err) => {
            log_failure(&err, started_at);
            return Err(err);
        }
    };
    let checked_table: *const StubTable = supported.table;
    bindings.bind_main(checked_table);

    let unsatisfiable = || NegotiationError::VersionUnsatisfiable {
        package: package_name(),
        requested: request.version().map(str::to_string),
        exact: request.exact_flag(),
    };

    let version = match request.version().map(CString::new).transpose() {
        Ok(version) => version,
        Err(err) => {
            error!(
                "event=stub_negotiate module=stubs status=error error_code=invalid_version error={}",
                err
            );
            return Err(unsatisfiable());
        }
    };

    let mut provided: *const c_void = ptr::null();
    // SAFETY: `pkg_require` comes from a current-layout table; all string
    // arguments are NUL-terminated (or a null version) and outlive the call.
    let actual = unsafe {
        (supported.pkg_require)(
            handle.as_ptr(),
            PACKAGE_NAME.as_ptr(),
            version.as_deref().map_or(ptr::null(), CStr::as_ptr),
            c_int::from(request.exact_flag()),
            &mut provided,
        )
    };
    if actual.is_null() {
        let err = unsatisfiable();
        log_failure(&err, started_at);
        return Err(err);
    }

    let bound = if provided.is_null() {
        warn!("event=stub_negotiate module=stubs status=degraded reason=registry_returned_null_table");
        checked_table
    } else {
        provided.cast::<StubTable>()
    };
    bindings.bind_main(bound);
    // SAFETY: tables handed back by the registry follow the current layout
    // and live as long as the host (see `HostHandle::from_raw`).
    let hooks = unsafe { (*bound).hooks() };
    bindings.bind_hooks(hooks);

    // SAFETY: a non-null registry result is a host-owned NUL-terminated string.
    let actual = unsafe { CStr::from_ptr(actual) };
    info!(
        "event=stub_negotiate module=stubs status=ok actual_version={} hooks={} replaced_table={} duration_us={}",
        actual.to_string_lossy(),
        if hooks.is_some() { "present" } else { "absent" },
        bound != checked_table,
        started_at.elapsed().as_micros()
    );
    Ok(actual)
}

fn package_name() -> &'static str {
    PACKAGE_NAME.to_str().unwrap_or("Host")
}

fn log_failure(err: &NegotiationError, started_at: Instant) {
    error!(
        "event=stub_negotiate module=stubs status=error error_code={} duration_us={} error={}",
        err.error_code(),
        started_at.elapsed().as_micros(),
        err
    );
}
