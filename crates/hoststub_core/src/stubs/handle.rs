//! Borrowed view of a host negotiation handle.

use crate::abi::{HandleHeader, StubTable};
use std::marker::PhantomData;
use std::ptr::{self, NonNull};

/// Host context borrowed for the duration of one negotiation.
///
/// The core never keeps a handle past the call it was passed to.
#[derive(Debug)]
pub struct HostHandle<'h> {
    raw: NonNull<HandleHeader>,
    _host: PhantomData<&'h HandleHeader>,
}

impl<'h> HostHandle<'h> {
    /// Wraps a raw handle; returns `None` for null.
    ///
    /// # Safety
    /// - A non-null `raw` must point at a live host object that begins with
    ///   `HandleHeader` and stays valid for `'h`.
    /// - A non-null `stub_table` must be readable up to and including
    ///   `StubTable::reporter`. When its magic equals `STUB_MAGIC` the whole
    ///   table, its hooks and every table handed back by the host registry
    ///   must follow the current layout and stay valid for `'h`.
    pub unsafe fn from_raw(raw: *mut HandleHeader) -> Option<Self> {
        NonNull::new(raw).map(|raw| Self {
            raw,
            _host: PhantomData,
        })
    }

    pub fn as_ptr(&self) -> *mut HandleHeader {
        self.raw.as_ptr()
    }

    /// Re-reads the table pointer from the host on every call.
    pub(crate) fn stub_table_ptr(&self) -> *const StubTable {
        // SAFETY: `from_raw` requires a live `HandleHeader` prefix.
        unsafe { ptr::addr_of!((*self.raw.as_ptr()).stub_table).read() }
    }
}
