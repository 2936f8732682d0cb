//! Binding registry for negotiated stub tables.
//!
//! # Responsibility
//! - Hold the main table and the three secondary tables an extension calls
//!   through after negotiation.
//! - Support rebinding and unbinding across load/unload/reload cycles.
//!
//! # Invariants
//! - Slots start unbound (null).
//! - Writes are not lock-protected; negotiation is not concurrent by host
//!   contract. Reads are atomic, so observers never see torn pointers.

use crate::abi::{SecondaryTable, StubFn, StubHooks, StubTable};
use serde::Serialize;
use std::ptr::{self, NonNull};
use std::sync::atomic::{AtomicPtr, Ordering};

static PROCESS_BINDINGS: BindingRegistry = BindingRegistry::new();

/// Registry the C ABI entry points bind into.
pub fn process_bindings() -> &'static BindingRegistry {
    &PROCESS_BINDINGS
}

/// Main and secondary stub table slots.
#[derive(Debug)]
pub struct BindingRegistry {
    main: AtomicPtr<StubTable>,
    plat: AtomicPtr<SecondaryTable>,
    int: AtomicPtr<SecondaryTable>,
    int_plat: AtomicPtr<SecondaryTable>,
}

impl BindingRegistry {
    pub const fn new() -> Self {
        Self {
            main: AtomicPtr::new(ptr::null_mut()),
            plat: AtomicPtr::new(ptr::null_mut()),
            int: AtomicPtr::new(ptr::null_mut()),
            int_plat: AtomicPtr::new(ptr::null_mut()),
        }
    }

    /// Sets the main slot only; secondary slots keep their value.
    pub fn bind_main(&self, table: *const StubTable) {
        self.main.store(table.cast_mut(), Ordering::Release);
    }

    /// Copies hook pointers into the secondary slots, or nulls all three.
    pub fn bind_hooks(&self, hooks: Option<&StubHooks>) {
        let (plat, int, int_plat) = match hooks {
            Some(hooks) => (hooks.plat, hooks.int, hooks.int_plat),
            None => (ptr::null(), ptr::null(), ptr::null()),
        };
        self.plat.store(plat.cast_mut(), Ordering::Release);
        self.int.store(int.cast_mut(), Ordering::Release);
        self.int_plat.store(int_plat.cast_mut(), Ordering::Release);
    }

    /// Clears every slot.
    pub fn unbind(&self) {
        self.bind_main(ptr::null());
        self.bind_hooks(None);
    }

    pub fn current(&self) -> Bindings {
        Bindings {
            main: self.main.load(Ordering::Acquire),
            plat: self.plat.load(Ordering::Acquire),
            int: self.int.load(Ordering::Acquire),
            int_plat: self.int_plat.load(Ordering::Acquire),
        }
    }
}

impl Default for BindingRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of the four slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bindings {
    pub main: *const StubTable,
    pub plat: *const SecondaryTable,
    pub int: *const SecondaryTable,
    pub int_plat: *const SecondaryTable,
}

impl Bindings {
    pub fn is_bound(&self) -> bool {
        !self.main.is_null()
    }

    pub fn main(&self) -> Option<NonNull<StubTable>> {
        NonNull::new(self.main.cast_mut())
    }

    pub fn plat(&self) -> Option<NonNull<SecondaryTable>> {
        NonNull::new(self.plat.cast_mut())
    }

    pub fn int(&self) -> Option<NonNull<SecondaryTable>> {
        NonNull::new(self.int.cast_mut())
    }

    pub fn int_plat(&self) -> Option<NonNull<SecondaryTable>> {
        NonNull::new(self.int_plat.cast_mut())
    }

    /// Function pointer at `index` of the bound main table.
    ///
    /// # Safety
    /// The bound table must still be alive, which holds while the host that
    /// produced it is loaded.
    pub unsafe fn main_slot(&self, index: usize) -> Option<StubFn> {
        self.main.as_ref()?.slot(index)
    }

    /// Address-only rendering for diagnostics.
    pub fn snapshot(&self) -> BindingSnapshot {
        BindingSnapshot {
            main: address(self.main),
            plat: address(self.plat),
            int: address(self.int),
            int_plat: address(self.int_plat),
        }
    }
}

/// Serializable slot addresses; `None` means unbound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BindingSnapshot {
    pub main: Option<usize>,
    pub plat: Option<usize>,
    pub int: Option<usize>,
    pub int_plat: Option<usize>,
}

fn address<T>(value: *const T) -> Option<usize> {
    (!value.is_null()).then_some(value as usize)
}
