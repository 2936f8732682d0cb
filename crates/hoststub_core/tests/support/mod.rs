//! In-process fake host for negotiation tests.
//!
//! `FakeHost` is `#[repr(C)]` and starts with `HandleHeader`, so the handle
//! pointer passed to the `extern "C"` slots can be cast back to the host.

#![allow(dead_code)]

use hoststub_core::abi::{
    HandleHeader, LegacyReporter, PkgRequireFn, SecondaryTable, StubFn, StubHooks, StubSlot,
    StubTable, STUB_MAGIC,
};
use hoststub_core::{HostHandle, Version, VersionRequest};
use std::cell::{Cell, RefCell};
use std::ffi::{c_char, c_int, c_void, CStr, CString};
use std::ptr;

thread_local! {
    static SLOT_CALLS: Cell<u32> = const { Cell::new(0) };
}

unsafe extern "C" fn count_slot_call() {
    SLOT_CALLS.with(|calls| calls.set(calls.get() + 1));
}

pub fn slot_calls() -> u32 {
    SLOT_CALLS.with(Cell::get)
}

/// Which secondary tables the host exposes through hooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hooks {
    Absent,
    PlatformOnly,
    All,
}

/// Owned table plus everything its pointers refer to.
pub struct OwnedTable {
    table: Box<StubTable>,
    _slots: Box<[StubSlot]>,
    _hooks: Option<Box<StubHooks>>,
    secondaries: Vec<Box<SecondaryTable>>,
}

impl OwnedTable {
    pub fn current(hooks: Hooks) -> Self {
        Self::build(STUB_MAGIC, hooks, Some(fake_pkg_require))
    }

    fn build(magic: u32, hooks: Hooks, pkg_require: Option<PkgRequireFn>) -> Self {
        let slots: Box<[StubSlot]> = vec![Some(count_slot_call as StubFn), None].into_boxed_slice();
        let secondary_count = match hooks {
            Hooks::Absent => 0,
            Hooks::PlatformOnly => 1,
            Hooks::All => 3,
        };
        let secondaries: Vec<Box<SecondaryTable>> = (0..secondary_count)
            .map(|index| {
                Box::new(SecondaryTable {
                    magic: STUB_MAGIC + index + 1,
                    slot_count: 0,
                    slots: ptr::null(),
                })
            })
            .collect();
        let secondary = |index: usize| -> *const SecondaryTable {
            secondaries
                .get(index)
                .map_or(ptr::null(), |table| &**table as *const SecondaryTable)
        };
        let stub_hooks = (hooks != Hooks::Absent).then(|| {
            Box::new(StubHooks {
                plat: secondary(0),
                int: secondary(1),
                int_plat: secondary(2),
            })
        });

        let table = Box::new(StubTable {
            magic,
            reporter: reporter(),
            hooks: stub_hooks
                .as_deref()
                .map_or(ptr::null(), |hooks| hooks as *const StubHooks),
            pkg_require,
            slot_count: slots.len(),
            slots: slots.as_ptr(),
        });

        Self {
            table,
            _slots: slots,
            _hooks: stub_hooks,
            secondaries,
        }
    }

    pub fn ptr(&self) -> *const StubTable {
        &*self.table
    }

    pub fn secondary_ptrs(&self) -> Vec<*const SecondaryTable> {
        self.secondaries
            .iter()
            .map(|table| &**table as *const SecondaryTable)
            .collect()
    }
}

fn reporter() -> LegacyReporter {
    LegacyReporter {
        new_string: Some(fake_new_string),
        set_result: Some(fake_set_result),
    }
}

struct Offer {
    version: Version,
    text: CString,
}

/// Host object handed to the core as a negotiation handle.
#[repr(C)]
pub struct FakeHost {
    header: HandleHeader,
    primary: Option<OwnedTable>,
    replacement: Option<OwnedTable>,
    foreign: Option<Box<StubTable>>,
    offers: Vec<Offer>,
    results: RefCell<Vec<String>>,
    require_calls: Cell<usize>,
    last_request: RefCell<Option<(String, Option<String>, bool)>>,
    null_provider_table: bool,
}

impl FakeHost {
    /// Current-layout host offering `versions` of the package.
    pub fn new(versions: &[&str], hooks: Hooks) -> Box<Self> {
        Self::assemble(Some(OwnedTable::current(hooks)), None, None, versions)
    }

    /// Host whose registry resolves to a different table than the handle's.
    pub fn with_replacement(
        versions: &[&str],
        handle_hooks: Hooks,
        provider_hooks: Hooks,
    ) -> Box<Self> {
        Self::assemble(
            Some(OwnedTable::current(handle_hooks)),
            Some(OwnedTable::current(provider_hooks)),
            None,
            versions,
        )
    }

    /// Host whose registry finds a match but hands back no table.
    pub fn with_null_provider_table(versions: &[&str], hooks: Hooks) -> Box<Self> {
        let mut host = Self::new(versions, hooks);
        host.null_provider_table = true;
        host
    }

    /// Host built without stub support.
    pub fn without_table() -> Box<Self> {
        Self::assemble(None, None, None, &["8.7"])
    }

    /// Current magic but no package registry slot.
    pub fn without_registry() -> Box<Self> {
        Self::assemble(
            Some(OwnedTable::build(STUB_MAGIC, Hooks::All, None)),
            None,
            None,
            &["8.7"],
        )
    }

    /// Foreign layout: only magic and the legacy slots are meaningful, every
    /// other field is garbage.
    pub fn foreign(magic: u32, with_reporter: bool) -> Box<Self> {
        // SAFETY: a non-null address is a valid fn pointer value; it is never
        // called.
        let garbage_require: PkgRequireFn = unsafe { std::mem::transmute(0xdead_beef_usize) };
        let table = Box::new(StubTable {
            magic,
            reporter: if with_reporter {
                reporter()
            } else {
                LegacyReporter {
                    new_string: None,
                    set_result: None,
                }
            },
            hooks: 0xbad0_usize as *const StubHooks,
            pkg_require: Some(garbage_require),
            slot_count: usize::MAX,
            slots: 0xbad8_usize as *const StubSlot,
        });
        Self::assemble(None, None, Some(table), &["8.7"])
    }

    fn assemble(
        primary: Option<OwnedTable>,
        replacement: Option<OwnedTable>,
        foreign: Option<Box<StubTable>>,
        versions: &[&str],
    ) -> Box<Self> {
        let stub_table = match (&primary, &foreign) {
            (Some(owned), _) => owned.ptr(),
            (None, Some(table)) => &**table as *const StubTable,
            (None, None) => ptr::null(),
        };
        let offers = versions
            .iter()
            .map(|value| Offer {
                version: Version::parse(value).expect("offered version"),
                text: CString::new(*value).expect("offered version"),
            })
            .collect();
        Box::new(Self {
            header: HandleHeader { stub_table },
            primary,
            replacement,
            foreign,
            offers,
            results: RefCell::new(Vec::new()),
            require_calls: Cell::new(0),
            last_request: RefCell::new(None),
            null_provider_table: false,
        })
    }

    pub fn handle(&self) -> HostHandle<'_> {
        // SAFETY: `FakeHost` is `#[repr(C)]` with `HandleHeader` first and
        // owns every table it points at.
        unsafe { HostHandle::from_raw(self as *const Self as *mut HandleHeader) }
            .expect("boxed host is non-null")
    }

    pub fn table_ptr(&self) -> *const StubTable {
        self.header.stub_table
    }

    pub fn primary(&self) -> &OwnedTable {
        self.primary.as_ref().expect("host has a primary table")
    }

    pub fn replacement(&self) -> &OwnedTable {
        self.replacement.as_ref().expect("host has a replacement table")
    }

    pub fn results(&self) -> Vec<String> {
        self.results.borrow().clone()
    }

    pub fn require_calls(&self) -> usize {
        self.require_calls.get()
    }

    /// `(package, version, exact)` of the last registry request.
    pub fn last_request(&self) -> Option<(String, Option<String>, bool)> {
        self.last_request.borrow().clone()
    }

    fn provider_table(&self) -> *const StubTable {
        if self.null_provider_table {
            return ptr::null();
        }
        match &self.replacement {
            Some(table) => table.ptr(),
            None => self.table_ptr(),
        }
    }
}

unsafe fn host<'a>(handle: *mut HandleHeader) -> &'a FakeHost {
    &*(handle as *const FakeHost)
}

unsafe extern "C" fn fake_new_string(bytes: *const c_char, length: isize) -> *mut c_void {
    let text = if length < 0 {
        CStr::from_ptr(bytes).to_string_lossy().into_owned()
    } else {
        let raw = std::slice::from_raw_parts(bytes.cast::<u8>(), length as usize);
        String::from_utf8_lossy(raw).into_owned()
    };
    Box::into_raw(Box::new(text)).cast()
}

unsafe extern "C" fn fake_set_result(handle: *mut HandleHeader, value: *mut c_void) {
    let text = *Box::from_raw(value.cast::<String>());
    host(handle).results.borrow_mut().push(text);
}

unsafe extern "C" fn fake_pkg_require(
    handle: *mut HandleHeader,
    name: *const c_char,
    version: *const c_char,
    exact: c_int,
    table_out: *mut *const c_void,
) -> *const c_char {
    let host = host(handle);
    host.require_calls.set(host.require_calls.get() + 1);

    let name = CStr::from_ptr(name).to_string_lossy().into_owned();
    let requested =
        (!version.is_null()).then(|| CStr::from_ptr(version).to_string_lossy().into_owned());
    host.last_request
        .replace(Some((name.clone(), requested.clone(), exact != 0)));
    if name != "Host" {
        return ptr::null();
    }

    let request = VersionRequest::from_flag(requested, exact != 0);
    let best = host
        .offers
        .iter()
        .filter(|offer| request.is_satisfied_by(&offer.version))
        .max_by(|left, right| left.version.cmp(&right.version));
    match best {
        Some(offer) => {
            *table_out = host.provider_table().cast();
            offer.text.as_ptr()
        }
        None => ptr::null(),
    }
}
