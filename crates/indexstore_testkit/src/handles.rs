//! Objects behind the fake library's opaque handles.

use crate::fake::{stats_for, HandleStats};
use crate::fixtures::{ListenFault, RecordFixture, StoreFixture, UnitFixture};
use indexstore_abi::functions::{EventHandlerFn, FinalizerFn};
use indexstore_abi::{
    BlockLiteralHeader, DependencyKind, RawError, RawUnitEventNotification, UnitEventKind,
};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::ffi::{c_void, CString};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

pub(crate) struct FakeError {
    pub(crate) description: CString,
    stats: Arc<HandleStats>,
}

impl Drop for FakeError {
    fn drop(&mut self) {
        HandleStats::bump(&self.stats.errors_disposed);
    }
}

/// Writes a new error object to `out`, if the caller asked for one.
///
/// # Safety
///
/// `out` must be null or valid for writes.
pub(crate) unsafe fn report_error(out: *mut RawError, stats: &Arc<HandleStats>, message: &str) {
    if out.is_null() {
        return;
    }
    HandleStats::bump(&stats.errors_created);
    let description = CString::new(message.replace('\0', " ")).unwrap_or_default();
    let error = Box::new(FakeError {
        description,
        stats: Arc::clone(stats),
    });
    *out = Box::into_raw(error).cast();
}

#[derive(Default)]
pub(crate) struct FakeOptions {
    pub(crate) prefix_mappings: Vec<(String, String)>,
}

pub(crate) struct FakeEvent {
    pub(crate) kind: u32,
    pub(crate) unit_name: Vec<u8>,
}

pub(crate) struct FakeNotification {
    pub(crate) initial: bool,
    pub(crate) events: Vec<FakeEvent>,
}

impl FakeNotification {
    fn new(initial: bool, kind: UnitEventKind, names: impl IntoIterator<Item = String>) -> Self {
        Self {
            initial,
            events: names
                .into_iter()
                .map(|name| FakeEvent {
                    kind: kind.as_raw(),
                    unit_name: name.into_bytes(),
                })
                .collect(),
        }
    }
}

enum HandlerCallback {
    Function {
        context: *mut c_void,
        handler: EventHandlerFn,
        finalizer: FinalizerFn,
    },
    /// A heap copy of the caller's block literal.
    Block { literal: Vec<u64> },
}

pub(crate) struct RegisteredHandler {
    callback: HandlerCallback,
    stats: Arc<HandleStats>,
}

// SAFETY: the registering caller promises the handler may be called from
// any thread; the fake never calls it concurrently with itself for one store.
unsafe impl Send for RegisteredHandler {}
unsafe impl Sync for RegisteredHandler {}

impl RegisteredHandler {
    pub(crate) fn function(
        context: *mut c_void,
        handler: EventHandlerFn,
        finalizer: FinalizerFn,
        stats: &Arc<HandleStats>,
    ) -> Self {
        Self {
            callback: HandlerCallback::Function {
                context,
                handler,
                finalizer,
            },
            stats: Arc::clone(stats),
        }
    }

    /// Copies the block literal at `block`.
    ///
    /// # Safety
    ///
    /// `block` must point to a block literal whose descriptor reports its size.
    pub(crate) unsafe fn block(block: *mut c_void, stats: &Arc<HandleStats>) -> Self {
        let header = &*block.cast::<BlockLiteralHeader>();
        let size = (*header.descriptor).size as usize;
        let mut literal = vec![0u64; size.div_ceil(8)];
        std::ptr::copy_nonoverlapping(block.cast::<u8>(), literal.as_mut_ptr().cast::<u8>(), size);
        Self {
            callback: HandlerCallback::Block { literal },
            stats: Arc::clone(stats),
        }
    }

    fn deliver(&self, notification: &FakeNotification) {
        let raw: RawUnitEventNotification = (notification as *const FakeNotification)
            .cast_mut()
            .cast();
        // SAFETY: the notification outlives the call; the callback was
        // registered with the matching signature.
        unsafe {
            match &self.callback {
                HandlerCallback::Function {
                    context, handler, ..
                } => handler(*context, raw),
                HandlerCallback::Block { literal } => {
                    let block = literal.as_ptr().cast_mut().cast::<c_void>();
                    let header = &*block.cast::<BlockLiteralHeader>();
                    let invoke: unsafe extern "C" fn(*mut c_void, RawUnitEventNotification) =
                        std::mem::transmute_copy(&header.invoke);
                    invoke(block, raw);
                }
            }
        }
    }
}

impl Drop for RegisteredHandler {
    fn drop(&mut self) {
        if let HandlerCallback::Function {
            context, finalizer, ..
        } = self.callback
        {
            // SAFETY: the context is released exactly once, here.
            unsafe { finalizer(context) };
        }
        HandleStats::bump(&self.stats.handlers_finalized);
    }
}

pub(crate) struct FakeStore {
    pub(crate) dir: PathBuf,
    pub(crate) stats: Arc<HandleStats>,
    prefix_mappings: Vec<(String, String)>,
    fixture: Mutex<StoreFixture>,
    handler: Mutex<Option<Arc<RegisteredHandler>>>,
    listening: AtomicBool,
    listener: Mutex<Option<JoinHandle<()>>>,
}

impl FakeStore {
    pub(crate) fn open(dir: &Path, prefix_mappings: Vec<(String, String)>) -> Result<Self, String> {
        let fixture = StoreFixture::read_from(dir)
            .map_err(|err| format!("cannot open index store at {}: {err}", dir.display()))?;
        let stats = stats_for(dir);
        HandleStats::bump(&stats.stores_created);
        Ok(Self {
            dir: dir.to_path_buf(),
            stats,
            prefix_mappings,
            fixture: Mutex::new(fixture),
            handler: Mutex::new(None),
            listening: AtomicBool::new(false),
            listener: Mutex::new(None),
        })
    }

    fn persist(&self, fixture: &StoreFixture) {
        // A store directory removed under us keeps the in-memory state.
        let _ = fixture.write_to(&self.dir);
    }

    /// Applies the first matching prefix mapping.
    pub(crate) fn remap(&self, path: &str) -> String {
        for (from, to) in &self.prefix_mappings {
            if let Some(rest) = path.strip_prefix(from.as_str()) {
                return format!("{to}{rest}");
            }
        }
        path.to_owned()
    }

    pub(crate) fn unit_names(&self, sorted: bool) -> Vec<String> {
        let mut names: Vec<String> = self
            .fixture
            .lock()
            .units
            .iter()
            .map(|unit| unit.name.clone())
            .collect();
        if sorted {
            names.sort();
        }
        names
    }

    pub(crate) fn unit(&self, name: &str) -> Option<UnitFixture> {
        self.fixture.lock().find_unit(name).cloned()
    }

    pub(crate) fn record(&self, name: &str) -> Option<RecordFixture> {
        self.fixture.lock().find_record(name).cloned()
    }

    pub(crate) fn listen_fault(&self) -> ListenFault {
        self.fixture.lock().listen_fault
    }

    pub(crate) fn discard_unit(&self, name: &str) {
        let removed = {
            let mut fixture = self.fixture.lock();
            let before = fixture.units.len();
            fixture.units.retain(|unit| unit.name != name);
            let removed = fixture.units.len() != before;
            if removed {
                self.persist(&fixture);
            }
            removed
        };
        if removed && self.listening.load(Ordering::SeqCst) {
            self.deliver(&FakeNotification::new(
                false,
                UnitEventKind::Removed,
                [name.to_owned()],
            ));
        }
    }

    pub(crate) fn discard_record(&self, name: &str) {
        let mut fixture = self.fixture.lock();
        fixture.records.retain(|record| record.name != name);
        self.persist(&fixture);
    }

    /// Drops records no unit depends on.
    pub(crate) fn purge(&self) {
        let mut fixture = self.fixture.lock();
        let referenced: HashSet<String> = fixture
            .units
            .iter()
            .flat_map(|unit| &unit.dependencies)
            .filter(|dep| dep.kind == DependencyKind::Record.as_raw())
            .map(|dep| dep.name.clone())
            .collect();
        fixture
            .records
            .retain(|record| referenced.contains(&record.name));
        self.persist(&fixture);
    }

    pub(crate) fn set_handler(&self, handler: RegisteredHandler) {
        let previous = self.handler.lock().replace(Arc::new(handler));
        drop(previous);
    }

    fn deliver(&self, notification: &FakeNotification) {
        let handler = self.handler.lock().clone();
        if let Some(handler) = handler {
            handler.deliver(notification);
        }
    }

    pub(crate) fn start_listening(&self, wait_initial_sync: bool) -> Result<(), String> {
        if self.listening.swap(true, Ordering::SeqCst) {
            return Err("already listening for unit events".to_owned());
        }
        let initial = FakeNotification::new(true, UnitEventKind::Added, self.unit_names(false));
        if wait_initial_sync {
            self.deliver(&initial);
            return Ok(());
        }
        let handler = self.handler.lock().clone();
        if let Some(handler) = handler {
            let thread = std::thread::spawn(move || handler.deliver(&initial));
            *self.listener.lock() = Some(thread);
        }
        Ok(())
    }

    pub(crate) fn stop_listening(&self) {
        self.listening.store(false, Ordering::SeqCst);
        let thread = self.listener.lock().take();
        if let Some(thread) = thread {
            let _ = thread.join();
        }
    }
}

impl Drop for FakeStore {
    fn drop(&mut self) {
        self.stop_listening();
        self.handler.lock().take();
        HandleStats::bump(&self.stats.stores_disposed);
    }
}

pub(crate) struct FakeSymbol {
    pub(crate) name: Vec<u8>,
    pub(crate) usr: Vec<u8>,
    pub(crate) codegen_name: Vec<u8>,
    pub(crate) kind: u32,
    pub(crate) sub_kind: u32,
    pub(crate) language: u32,
    pub(crate) properties: u64,
    pub(crate) roles: u64,
    pub(crate) related_roles: u64,
}

pub(crate) struct FakeRelation {
    pub(crate) symbol: *const FakeSymbol,
    pub(crate) roles: u64,
}

pub(crate) struct FakeOccurrence {
    pub(crate) symbol: *const FakeSymbol,
    pub(crate) roles: u64,
    pub(crate) line: u32,
    pub(crate) column: u32,
    pub(crate) relations: Vec<FakeRelation>,
}

pub(crate) struct FakeRecordReader {
    /// Boxed so symbol handles keep their address.
    pub(crate) symbols: Vec<Box<FakeSymbol>>,
    pub(crate) occurrences: Vec<FakeOccurrence>,
    pub(crate) stats: Arc<HandleStats>,
}

impl FakeRecordReader {
    pub(crate) fn open(store: &FakeStore, name: &str) -> Result<Self, String> {
        let record = store
            .record(name)
            .ok_or_else(|| format!("record not found: {name}"))?;
        let symbols: Vec<Box<FakeSymbol>> = record
            .symbols
            .iter()
            .map(|symbol| {
                Box::new(FakeSymbol {
                    name: symbol.name.clone().into_bytes(),
                    usr: symbol.usr.clone().into_bytes(),
                    codegen_name: symbol.codegen_name.clone().into_bytes(),
                    kind: symbol.kind,
                    sub_kind: symbol.sub_kind,
                    language: symbol.language,
                    properties: symbol.properties,
                    roles: symbol.roles,
                    related_roles: symbol.related_roles,
                })
            })
            .collect();
        let symbol_at = |index: usize| -> Result<*const FakeSymbol, String> {
            symbols
                .get(index)
                .map(|symbol| &**symbol as *const FakeSymbol)
                .ok_or_else(|| format!("record {name} refers to missing symbol {index}"))
        };

        let mut occurrences = Vec::with_capacity(record.occurrences.len());
        for occurrence in &record.occurrences {
            let relations = occurrence
                .relations
                .iter()
                .map(|relation| {
                    Ok(FakeRelation {
                        symbol: symbol_at(relation.symbol)?,
                        roles: relation.roles,
                    })
                })
                .collect::<Result<Vec<_>, String>>()?;
            occurrences.push(FakeOccurrence {
                symbol: symbol_at(occurrence.symbol)?,
                roles: occurrence.roles,
                line: occurrence.line,
                column: occurrence.column,
                relations,
            });
        }
        occurrences.sort_by_key(|occurrence| (occurrence.line, occurrence.column));

        HandleStats::bump(&store.stats.record_readers_created);
        Ok(Self {
            symbols,
            occurrences,
            stats: Arc::clone(&store.stats),
        })
    }
}

impl Drop for FakeRecordReader {
    fn drop(&mut self) {
        HandleStats::bump(&self.stats.record_readers_disposed);
    }
}

pub(crate) struct FakeDependency {
    pub(crate) kind: u32,
    pub(crate) is_system: bool,
    pub(crate) file_path: Vec<u8>,
    pub(crate) module_name: Vec<u8>,
    pub(crate) name: Vec<u8>,
}

pub(crate) struct FakeInclude {
    pub(crate) source_path: Vec<u8>,
    pub(crate) target_path: Vec<u8>,
    pub(crate) source_line: u32,
}

pub(crate) struct FakeUnitReader {
    pub(crate) provider_identifier: Vec<u8>,
    pub(crate) provider_version: Vec<u8>,
    pub(crate) seconds: i64,
    pub(crate) nanoseconds: i64,
    pub(crate) is_system: bool,
    pub(crate) is_module: bool,
    pub(crate) is_debug: bool,
    pub(crate) main_file: Option<Vec<u8>>,
    pub(crate) module_name: Vec<u8>,
    pub(crate) working_dir: Vec<u8>,
    pub(crate) output_file: Vec<u8>,
    pub(crate) sysroot_path: Vec<u8>,
    pub(crate) target: Vec<u8>,
    pub(crate) dependencies: Vec<FakeDependency>,
    pub(crate) includes: Vec<FakeInclude>,
    stats: Arc<HandleStats>,
}

impl FakeUnitReader {
    pub(crate) fn open(store: &FakeStore, name: &str) -> Result<Self, String> {
        let unit = store
            .unit(name)
            .ok_or_else(|| format!("unit not found: {name}"))?;
        let path = |value: &str| store.remap(value).into_bytes();
        let reader = Self {
            provider_identifier: unit.provider_identifier.into_bytes(),
            provider_version: unit.provider_version.into_bytes(),
            seconds: unit.seconds,
            nanoseconds: unit.nanoseconds,
            is_system: unit.is_system,
            is_module: unit.is_module,
            is_debug: unit.is_debug,
            main_file: unit.main_file.as_deref().map(path),
            module_name: unit.module_name.into_bytes(),
            working_dir: path(&unit.working_dir),
            output_file: path(&unit.output_file),
            sysroot_path: path(&unit.sysroot_path),
            target: unit.target.into_bytes(),
            dependencies: unit
                .dependencies
                .iter()
                .map(|dep| FakeDependency {
                    kind: dep.kind,
                    is_system: dep.is_system,
                    file_path: path(&dep.file_path),
                    module_name: dep.module_name.clone().into_bytes(),
                    name: dep.name.clone().into_bytes(),
                })
                .collect(),
            includes: unit
                .includes
                .iter()
                .map(|include| FakeInclude {
                    source_path: path(&include.source_path),
                    target_path: path(&include.target_path),
                    source_line: include.source_line,
                })
                .collect(),
            stats: Arc::clone(&store.stats),
        };
        HandleStats::bump(&store.stats.unit_readers_created);
        Ok(reader)
    }
}

impl Drop for FakeUnitReader {
    fn drop(&mut self) {
        HandleStats::bump(&self.stats.unit_readers_disposed);
    }
}
