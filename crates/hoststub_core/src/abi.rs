//! Stub table binary contract shared with the host runtime.
//!
//! # Responsibility
//! - Declare the `#[repr(C)]` layouts the host exports and this crate reads.
//! - Provide raw slot accessors for indirect dispatch through bound tables.
//!
//! # Invariants
//! - `StubTable::magic` and `StubTable::reporter` keep their offsets and shape
//!   across every layout revision. Nothing else in a table is trusted until the
//!   magic has been checked.
//! - This crate never writes through any pointer declared here.

use std::ffi::{c_char, c_int, c_void, CStr};

/// Identification value of the table layout this crate was built for.
pub const STUB_MAGIC: u32 = 0xFCA3_BACF;

/// Package identifier the host registers its own stub table under.
pub const PACKAGE_NAME: &CStr = c"Host";

/// Diagnostic handed to the host when its table layout is foreign.
pub const INCOMPATIBLE_HOST_MESSAGE: &CStr =
    c"This extension is compiled for an incompatible version of the host";

/// One untyped entry of a function-pointer array.
///
/// Callers cast the pointer to the signature the host documents for the slot.
pub type StubFn = unsafe extern "C" fn();

/// Nullable function-pointer array entry.
pub type StubSlot = Option<StubFn>;

/// Creates a host-owned string object from `bytes`.
///
/// A negative `length` means `bytes` is NUL-terminated.
pub type NewStringFn = unsafe extern "C" fn(bytes: *const c_char, length: isize) -> *mut c_void;

/// Stores a host-owned object as the handle's result.
pub type SetResultFn = unsafe extern "C" fn(handle: *mut HandleHeader, value: *mut c_void);

/// Host package registry request.
///
/// Returns the actual version (host-owned, NUL-terminated) or null on failure.
/// On success the provider's table is written to `table_out`.
pub type PkgRequireFn = unsafe extern "C" fn(
    handle: *mut HandleHeader,
    name: *const c_char,
    version: *const c_char,
    exact: c_int,
    table_out: *mut *const c_void,
) -> *const c_char;

/// Prefix every host negotiation handle starts with.
#[repr(C)]
#[derive(Debug)]
pub struct HandleHeader {
    /// Null when the host was built without stub support.
    pub stub_table: *const StubTable,
}

/// The two slots every layout revision keeps in place.
///
/// Only used to report a diagnostic when the rest of the table is foreign.
#[repr(C)]
#[derive(Debug, Clone, Copy)]
pub struct LegacyReporter {
    pub new_string: Option<NewStringFn>,
    pub set_result: Option<SetResultFn>,
}

impl LegacyReporter {
    /// Hands `message` to the host as the handle's result.
    ///
    /// Returns `false` when either slot is null and nothing was reported.
    ///
    /// # Safety
    /// - Non-null slots must be callable host functions with the declared
    ///   signatures.
    /// - `handle` must point at the live host object the slots belong to.
    pub unsafe fn report(&self, handle: *mut HandleHeader, message: &CStr) -> bool {
        let (Some(new_string), Some(set_result)) = (self.new_string, self.set_result) else {
            return false;
        };
        let value = new_string(message.as_ptr(), -1);
        set_result(handle, value);
        true
    }
}

/// Main stub table exported by the host.
#[repr(C)]
#[derive(Debug)]
pub struct StubTable {
    pub magic: u32,
    pub reporter: LegacyReporter,
    pub hooks: *const StubHooks,
    pub pkg_require: Option<PkgRequireFn>,
    pub slot_count: usize,
    pub slots: *const StubSlot,
}

impl StubTable {
    /// Returns the hooks structure, if the host provides one.
    ///
    /// # Safety
    /// `hooks` must be null or point at a live `StubHooks`.
    pub unsafe fn hooks(&self) -> Option<&StubHooks> {
        self.hooks.as_ref()
    }

    /// Returns the function pointer stored at `index`.
    ///
    /// # Safety
    /// `slots` must be null or point at `slot_count` initialized entries.
    pub unsafe fn slot(&self, index: usize) -> Option<StubFn> {
        read_slot(self.slots, self.slot_count, index)
    }
}

/// Optional secondary tables reachable from the main table.
#[repr(C)]
#[derive(Debug)]
pub struct StubHooks {
    pub plat: *const SecondaryTable,
    pub int: *const SecondaryTable,
    pub int_plat: *const SecondaryTable,
}

/// Platform, internal or internal-platform table.
#[repr(C)]
#[derive(Debug)]
pub struct SecondaryTable {
    pub magic: u32,
    pub slot_count: usize,
    pub slots: *const StubSlot,
}

impl SecondaryTable {
    /// # Safety
    /// `slots` must be null or point at `slot_count` initialized entries.
    pub unsafe fn slot(&self, index: usize) -> Option<StubFn> {
        read_slot(self.slots, self.slot_count, index)
    }
}

unsafe fn read_slot(slots: *const StubSlot, slot_count: usize, index: usize) -> Option<StubFn> {
    if slots.is_null() || index >= slot_count {
        return None;
    }
    *slots.add(index)
}
