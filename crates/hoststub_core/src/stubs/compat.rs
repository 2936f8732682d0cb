//! Stub support detection.
//!
//! # Responsibility
//! - Decide whether a host handle exposes a stub table this crate understands.
//! - Surface a host-readable diagnostic when the table layout is foreign.
//!
//! # Invariants
//! - A table whose magic mismatches is read only through its magic and its
//!   `LegacyReporter` slots.
//! - Binding state is never touched here.

use crate::abi::{LegacyReporter, PkgRequireFn, StubTable, INCOMPATIBLE_HOST_MESSAGE, STUB_MAGIC};
use crate::stubs::error::{NegotiationError, NegotiationResult};
use crate::stubs::handle::HostHandle;
use log::{error, warn};
use std::ptr::{self, NonNull};

/// Checked view of an untyped table pointer.
#[derive(Debug, Clone, Copy)]
pub enum TableView<'t> {
    /// Layout matches `STUB_MAGIC`; every field may be read.
    Current(&'t StubTable),
    /// Foreign layout; only the stable prefix was read.
    Foreign { magic: u32, reporter: LegacyReporter },
}

impl<'t> TableView<'t> {
    /// Reads the magic and exposes a typed view only when it matches.
    ///
    /// # Safety
    /// `table` must be readable up to and including `StubTable::reporter`.
    /// When the magic matches, the whole table must be valid for `'t`.
    pub unsafe fn classify(table: NonNull<StubTable>) -> Self {
        let raw = table.as_ptr();
        let magic = ptr::addr_of!((*raw).magic).read();
        if magic == STUB_MAGIC {
            return Self::Current(&*raw);
        }
        let reporter = ptr::addr_of!((*raw).reporter).read();
        Self::Foreign { magic, reporter }
    }
}

/// A current-layout table that can negotiate versions.
#[derive(Debug, Clone, Copy)]
pub struct SupportedTable<'h> {
    pub table: &'h StubTable,
    pub pkg_require: PkgRequireFn,
}

/// Locates the host's stub table and validates its layout.
///
/// On a foreign layout exactly one diagnostic is reported through the
/// table's legacy slots before failing with `IncompatibleMagic`.
pub fn check_stub_support<'h>(handle: &HostHandle<'h>) -> NegotiationResult<SupportedTable<'h>> {
    let Some(table) = NonNull::new(handle.stub_table_ptr().cast_mut()) else {
        warn!("event=stub_check module=stubs status=error error_code=no_stub_support reason=null_table");
        return Err(NegotiationError::NoStubSupport);
    };

    // SAFETY: `HostHandle::from_raw` requires the stable prefix to be
    // readable, and the whole table when the magic matches.
    match unsafe { TableView::<'h>::classify(table) } {
        TableView::Current(table) => {
            let Some(pkg_require) = table.pkg_require else {
                warn!(
                    "event=stub_check module=stubs status=error error_code=no_stub_support reason=missing_pkg_require"
                );
                return Err(NegotiationError::NoStubSupport);
            };
            Ok(SupportedTable { table, pkg_require })
        }
        TableView::Foreign { magic, reporter } => {
            // SAFETY: the legacy slots keep their shape in every layout, and
            // the handle is the host object they belong to.
            let reported = unsafe { reporter.report(handle.as_ptr(), INCOMPATIBLE_HOST_MESSAGE) };
            error!(
                "event=stub_check module=stubs status=error error_code=incompatible_magic found={:#010x} expected={:#010x} diagnostic_reported={}",
                magic, STUB_MAGIC, reported
            );
            Err(NegotiationError::IncompatibleMagic { found: magic })
        }
    }
}
