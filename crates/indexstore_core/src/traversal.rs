//! The apply protocol shared by every traversal.
//!
//! The store drives iteration and calls an applier once per item; the
//! applier returns `false` to stop. Each traversal keeps its bookkeeping in a
//! single state object. The context-pointer convention passes that object
//! directly to a trampoline; the closure convention wraps it in a stack block
//! literal whose invoke function forwards to the very same trampoline, so the
//! two conventions cannot diverge.
//!
//! Panics raised by an applier are caught before they reach foreign frames,
//! iteration is stopped, and the panic resumes once the foreign call returns.

use crate::error::{IndexStoreError, IndexStoreResult};
use crate::library::{BlockFunctions, IndexStoreLibrary};
use indexstore_abi::functions::{BlockPtr, ContextApplierFn, SearchFilterFn, SearchReceiverFn};
use indexstore_abi::{BlockDescriptor, BlockLiteralHeader, RawSymbol};
use std::any::Any;
use std::ffi::{c_ulong, c_void};
use std::fmt;
use std::panic::{catch_unwind, resume_unwind, AssertUnwindSafe};
use tracing::trace;

/// How callbacks are passed to the library. Chosen once per loaded library.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CallingConvention {
    /// Block literals (closure-form operations).
    Closure,
    /// A context pointer plus a plain function (`_f` operations).
    ContextPointer,
}

impl fmt::Display for CallingConvention {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closure => f.write_str("closure"),
            Self::ContextPointer => f.write_str("context-pointer"),
        }
    }
}

/// How a traversal ended when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ApplyOutcome {
    /// Every item was delivered.
    Completed,
    /// The applier asked to stop.
    Stopped,
}

impl ApplyOutcome {
    /// Returns true if every item was delivered.
    #[must_use]
    pub const fn is_completed(self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Returns true if the traversal was stopped by the applier.
    #[must_use]
    pub const fn is_stopped(self) -> bool {
        matches!(self, Self::Stopped)
    }
}

/// Decision of a symbol search filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SearchVerdict {
    /// Pass the symbol to the receiver.
    pub accept: bool,
    /// End the search after this symbol.
    pub stop: bool,
}

impl SearchVerdict {
    /// Accept and continue.
    pub const ACCEPT: Self = Self {
        accept: true,
        stop: false,
    };
    /// Reject and continue.
    pub const REJECT: Self = Self {
        accept: false,
        stop: false,
    };

    /// Accept the symbol, then end the search.
    #[must_use]
    pub const fn accept_and_stop() -> Self {
        Self {
            accept: true,
            stop: true,
        }
    }

    /// Reject the symbol and end the search.
    #[must_use]
    pub const fn stop() -> Self {
        Self {
            accept: false,
            stop: true,
        }
    }

    /// Builds a verdict from an acceptance flag.
    #[must_use]
    pub const fn accept_if(accept: bool) -> Self {
        Self {
            accept,
            stop: false,
        }
    }
}

/// Layout handed to closure-form operations: the block header followed by
/// the captured context.
#[repr(C)]
struct BlockLiteral {
    header: BlockLiteralHeader,
    context: *mut c_void,
}

static BLOCK_DESCRIPTOR: BlockDescriptor = BlockDescriptor {
    reserved: 0,
    size: std::mem::size_of::<BlockLiteral>() as c_ulong,
};

impl BlockLiteral {
    fn new(isa: *const c_void, invoke: *const c_void, context: *mut c_void) -> Self {
        Self {
            header: BlockLiteralHeader {
                isa,
                flags: 0,
                reserved: 0,
                invoke,
                descriptor: &BLOCK_DESCRIPTOR,
            },
            context,
        }
    }

    fn as_block_ptr(&mut self) -> BlockPtr {
        (self as *mut Self).cast()
    }
}

/// Reads the captured context out of a block literal built by this module.
unsafe fn block_context(block: *mut c_void) -> *mut c_void {
    (*block.cast::<BlockLiteral>()).context
}

/// The callback argument of one apply call, in the library's convention.
pub(crate) enum Applier<'t, H> {
    /// Call the closure-form operation with `block`.
    Block {
        functions: &'t BlockFunctions,
        block: BlockPtr,
    },
    /// Call the `_f` operation with `context` and `function`.
    Function {
        context: *mut c_void,
        function: ContextApplierFn<H>,
    },
}

struct ApplyState<F> {
    applier: F,
    stopped: bool,
    delivered: usize,
    late_calls: usize,
    panic: Option<Box<dyn Any + Send>>,
}

impl<F> ApplyState<F> {
    fn new(applier: F) -> Self {
        Self {
            applier,
            stopped: false,
            delivered: 0,
            late_calls: 0,
            panic: None,
        }
    }

    fn dispatch<H>(&mut self, item: H) -> bool
    where
        F: FnMut(H) -> bool,
    {
        if self.stopped {
            self.late_calls += 1;
            return false;
        }
        let applier = &mut self.applier;
        match catch_unwind(AssertUnwindSafe(|| applier(item))) {
            Ok(proceed) => {
                self.delivered += 1;
                self.stopped = !proceed;
                proceed
            }
            Err(payload) => {
                self.panic = Some(payload);
                self.stopped = true;
                false
            }
        }
    }

    fn finish(self, operation: &'static str, returned: bool) -> IndexStoreResult<ApplyOutcome> {
        if let Some(payload) = self.panic {
            resume_unwind(payload);
        }
        trace!(
            operation,
            delivered = self.delivered,
            returned,
            stopped = self.stopped,
            "traversal finished"
        );
        if self.late_calls > 0 {
            return Err(IndexStoreError::protocol_violation(
                operation,
                format!("applier invoked {} time(s) after a stop", self.late_calls),
            ));
        }
        match (returned, self.stopped) {
            (true, false) => Ok(ApplyOutcome::Completed),
            (false, true) => Ok(ApplyOutcome::Stopped),
            (false, false) => Err(IndexStoreError::TraversalFailed { operation }),
            (true, true) => Err(IndexStoreError::protocol_violation(
                operation,
                "reported completion after the applier stopped",
            )),
        }
    }
}

unsafe extern "C" fn context_trampoline<H, F>(context: *mut c_void, item: H) -> bool
where
    F: FnMut(H) -> bool,
{
    let state = &mut *context.cast::<ApplyState<F>>();
    state.dispatch(item)
}

unsafe extern "C" fn block_trampoline<H, F>(block: *mut c_void, item: H) -> bool
where
    F: FnMut(H) -> bool,
{
    context_trampoline::<H, F>(block_context(block), item)
}

/// Runs one apply operation.
///
/// `applier` receives raw items and returns the continue signal. `call`
/// performs the foreign call with the callback in the library's convention
/// and returns the operation's own result.
pub(crate) fn drive<H, F, C>(
    library: &IndexStoreLibrary,
    operation: &'static str,
    applier: F,
    call: C,
) -> IndexStoreResult<ApplyOutcome>
where
    F: FnMut(H) -> bool,
    C: FnOnce(Applier<'_, H>) -> bool,
{
    trace!(operation, convention = %library.convention(), "traversal started");
    let mut state = ApplyState::new(applier);
    let context = std::ptr::addr_of_mut!(state).cast::<c_void>();

    let returned = match library.block_runtime() {
        Some(runtime) => {
            let invoke: unsafe extern "C" fn(*mut c_void, H) -> bool = block_trampoline::<H, F>;
            let mut block = BlockLiteral::new(runtime.stack_block_isa, invoke as *const c_void, context);
            call(Applier::Block {
                functions: &runtime.functions,
                block: block.as_block_ptr(),
            })
        }
        None => call(Applier::Function {
            context,
            function: context_trampoline::<H, F>,
        }),
    };

    state.finish(operation, returned)
}

/// The two callbacks of a symbol search, in the library's convention.
pub(crate) enum SearchCallbacks<'t> {
    /// Closure form: filter block and receiver block.
    Block {
        functions: &'t BlockFunctions,
        filter: BlockPtr,
        receiver: BlockPtr,
    },
    /// Context-pointer form. Both callbacks share `context`.
    Function {
        context: *mut c_void,
        filter: SearchFilterFn,
        receiver: SearchReceiverFn,
    },
}

struct SearchState<P, R> {
    filter: P,
    receiver: R,
    stopped: bool,
    examined: usize,
    pending: usize,
    received: usize,
    late_calls: usize,
    unrequested: usize,
    panic: Option<Box<dyn Any + Send>>,
}

impl<P, R> SearchState<P, R>
where
    P: FnMut(RawSymbol) -> SearchVerdict,
    R: FnMut(RawSymbol),
{
    fn new(filter: P, receiver: R) -> Self {
        Self {
            filter,
            receiver,
            stopped: false,
            examined: 0,
            pending: 0,
            received: 0,
            late_calls: 0,
            unrequested: 0,
            panic: None,
        }
    }

    fn filter(&mut self, symbol: RawSymbol) -> SearchVerdict {
        if self.stopped {
            self.late_calls += 1;
            return SearchVerdict::stop();
        }
        let filter = &mut self.filter;
        match catch_unwind(AssertUnwindSafe(|| filter(symbol))) {
            Ok(verdict) => {
                self.examined += 1;
                if verdict.accept {
                    self.pending += 1;
                }
                self.stopped = verdict.stop;
                verdict
            }
            Err(payload) => {
                self.panic = Some(payload);
                self.stopped = true;
                SearchVerdict::stop()
            }
        }
    }

    fn receive(&mut self, symbol: RawSymbol) {
        if self.panic.is_some() {
            return;
        }
        if self.pending == 0 {
            self.unrequested += 1;
            return;
        }
        self.pending -= 1;
        let receiver = &mut self.receiver;
        match catch_unwind(AssertUnwindSafe(|| receiver(symbol))) {
            Ok(()) => self.received += 1,
            Err(payload) => {
                self.panic = Some(payload);
                self.stopped = true;
            }
        }
    }

    fn finish(self, operation: &'static str, returned: bool) -> IndexStoreResult<ApplyOutcome> {
        if let Some(payload) = self.panic {
            resume_unwind(payload);
        }
        trace!(
            operation,
            examined = self.examined,
            received = self.received,
            returned,
            stopped = self.stopped,
            "search finished"
        );
        if self.late_calls > 0 {
            return Err(IndexStoreError::protocol_violation(
                operation,
                format!("filter invoked {} time(s) after a stop", self.late_calls),
            ));
        }
        if self.unrequested > 0 {
            return Err(IndexStoreError::protocol_violation(
                operation,
                format!("receiver invoked {} time(s) for rejected symbols", self.unrequested),
            ));
        }
        // A filter stop ends the search whatever the library then returns.
        match (returned, self.stopped) {
            (_, true) => Ok(ApplyOutcome::Stopped),
            (true, false) => Ok(ApplyOutcome::Completed),
            (false, false) => Err(IndexStoreError::TraversalFailed { operation }),
        }
    }
}

unsafe extern "C" fn search_filter_trampoline<P, R>(
    context: *mut c_void,
    symbol: RawSymbol,
    stop: *mut bool,
) -> bool
where
    P: FnMut(RawSymbol) -> SearchVerdict,
    R: FnMut(RawSymbol),
{
    let state = &mut *context.cast::<SearchState<P, R>>();
    let verdict = state.filter(symbol);
    if verdict.stop && !stop.is_null() {
        *stop = true;
    }
    verdict.accept
}

unsafe extern "C" fn search_receiver_trampoline<P, R>(context: *mut c_void, symbol: RawSymbol)
where
    P: FnMut(RawSymbol) -> SearchVerdict,
    R: FnMut(RawSymbol),
{
    let state = &mut *context.cast::<SearchState<P, R>>();
    state.receive(symbol);
}

unsafe extern "C" fn search_filter_block<P, R>(
    block: *mut c_void,
    symbol: RawSymbol,
    stop: *mut bool,
) -> bool
where
    P: FnMut(RawSymbol) -> SearchVerdict,
    R: FnMut(RawSymbol),
{
    search_filter_trampoline::<P, R>(block_context(block), symbol, stop)
}

unsafe extern "C" fn search_receiver_block<P, R>(block: *mut c_void, symbol: RawSymbol)
where
    P: FnMut(RawSymbol) -> SearchVerdict,
    R: FnMut(RawSymbol),
{
    search_receiver_trampoline::<P, R>(block_context(block), symbol);
}

/// Runs a two-stage symbol search: `filter` sees every candidate and
/// `receiver` only the accepted ones.
pub(crate) fn drive_search<P, R, C>(
    library: &IndexStoreLibrary,
    operation: &'static str,
    filter: P,
    receiver: R,
    call: C,
) -> IndexStoreResult<ApplyOutcome>
where
    P: FnMut(RawSymbol) -> SearchVerdict,
    R: FnMut(RawSymbol),
    C: FnOnce(SearchCallbacks<'_>) -> bool,
{
    trace!(operation, convention = %library.convention(), "search started");
    let mut state = SearchState::new(filter, receiver);
    let context = std::ptr::addr_of_mut!(state).cast::<c_void>();

    let returned = match library.block_runtime() {
        Some(runtime) => {
            let filter_invoke: unsafe extern "C" fn(*mut c_void, RawSymbol, *mut bool) -> bool =
                search_filter_block::<P, R>;
            let receiver_invoke: unsafe extern "C" fn(*mut c_void, RawSymbol) =
                search_receiver_block::<P, R>;
            let mut filter_block =
                BlockLiteral::new(runtime.stack_block_isa, filter_invoke as *const c_void, context);
            let mut receiver_block = BlockLiteral::new(
                runtime.stack_block_isa,
                receiver_invoke as *const c_void,
                context,
            );
            call(SearchCallbacks::Block {
                functions: &runtime.functions,
                filter: filter_block.as_block_ptr(),
                receiver: receiver_block.as_block_ptr(),
            })
        }
        None => call(SearchCallbacks::Function {
            context,
            filter: search_filter_trampoline::<P, R>,
            receiver: search_receiver_trampoline::<P, R>,
        }),
    };

    state.finish(operation, returned)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trampoline_of<H, F>(_: &ApplyState<F>) -> ContextApplierFn<H>
    where
        F: FnMut(H) -> bool,
    {
        context_trampoline::<H, F>
    }

    fn block_invoke_of<H, F>(_: &ApplyState<F>) -> unsafe extern "C" fn(*mut c_void, H) -> bool
    where
        F: FnMut(H) -> bool,
    {
        block_trampoline::<H, F>
    }

    fn search_functions_of<P, R>(_: &SearchState<P, R>) -> (SearchFilterFn, SearchReceiverFn)
    where
        P: FnMut(RawSymbol) -> SearchVerdict,
        R: FnMut(RawSymbol),
    {
        (
            search_filter_trampoline::<P, R>,
            search_receiver_trampoline::<P, R>,
        )
    }

    /// Stands in for a library-side apply loop.
    unsafe fn run_context_pointer(
        items: &[u32],
        context: *mut c_void,
        function: ContextApplierFn<u32>,
    ) -> bool {
        for &item in items {
            if !function(context, item) {
                return false;
            }
        }
        true
    }

    fn apply_items(items: &[u32], stop_after: Option<usize>) -> (Vec<u32>, IndexStoreResult<ApplyOutcome>) {
        let mut seen = Vec::new();
        let mut state = ApplyState::new(|item: u32| {
            seen.push(item);
            stop_after.map_or(true, |k| seen.len() < k)
        });
        let function = trampoline_of(&state);
        let context = std::ptr::addr_of_mut!(state).cast::<c_void>();
        let returned = unsafe { run_context_pointer(items, context, function) };
        let outcome = state.finish("test_apply", returned);
        (seen, outcome)
    }

    #[test]
    fn completes() {
        let (seen, outcome) = apply_items(&[1, 2, 3], None);
        assert_eq!(seen, vec![1, 2, 3]);
        assert_eq!(outcome.unwrap(), ApplyOutcome::Completed);
    }

    #[test]
    fn stops_after_k() {
        let (seen, outcome) = apply_items(&[1, 2, 3, 4], Some(2));
        assert_eq!(seen, vec![1, 2]);
        assert_eq!(outcome.unwrap(), ApplyOutcome::Stopped);
    }

    #[test]
    fn outcome_mapping() {
        let finish = |returned, stopped| {
            let mut state = ApplyState::new(|_: u32| true);
            state.stopped = stopped;
            state.finish("test_apply", returned)
        };
        assert!(matches!(
            finish(false, false),
            Err(IndexStoreError::TraversalFailed { operation: "test_apply" })
        ));
        assert!(matches!(
            finish(true, true),
            Err(IndexStoreError::ProtocolViolation { .. })
        ));
    }

    #[test]
    fn calls_after_stop_are_not_delivered() {
        let mut seen = 0;
        let mut state = ApplyState::new(|_: u32| {
            seen += 1;
            false
        });
        assert!(!state.dispatch(1));
        assert!(!state.dispatch(2));
        let result = state.finish("test_apply", false);
        assert!(matches!(result, Err(IndexStoreError::ProtocolViolation { .. })));
        assert_eq!(seen, 1);
    }

    #[test]
    fn panic_resumes_after_call() {
        let result = std::panic::catch_unwind(|| {
            let mut state = ApplyState::new(|item: u32| {
                assert!(item < 2, "applier failure");
                true
            });
            let function = trampoline_of(&state);
            let context = std::ptr::addr_of_mut!(state).cast::<c_void>();
            let returned = unsafe { run_context_pointer(&[1, 2, 3], context, function) };
            assert!(!returned);
            let _ = state.finish("test_apply", returned);
        });
        assert!(result.is_err());
    }

    #[test]
    fn block_invoke_reaches_the_same_state() {
        let mut seen = Vec::new();
        let mut state = ApplyState::new(|item: u32| {
            seen.push(item);
            item != 2
        });
        let invoke = block_invoke_of::<u32, _>(&state);
        let context = std::ptr::addr_of_mut!(state).cast::<c_void>();
        let mut block = BlockLiteral::new(std::ptr::null(), invoke as *const c_void, context);
        let block_ptr = block.as_block_ptr();

        let returned = unsafe {
            let header = &*block_ptr.cast::<BlockLiteralHeader>();
            assert_eq!((*header.descriptor).size as usize, std::mem::size_of::<BlockLiteral>());
            let invoke: unsafe extern "C" fn(*mut c_void, u32) -> bool =
                std::mem::transmute(header.invoke);
            [1u32, 2, 3].iter().all(|&item| invoke(block_ptr, item))
        };
        assert_eq!(state.finish("test_apply", returned).unwrap(), ApplyOutcome::Stopped);
        assert_eq!(seen, vec![1, 2]);
    }

    #[test]
    fn search_two_stage() {
        let mut received = Vec::new();
        let mut state = SearchState::new(
            |symbol: RawSymbol| {
                let value = symbol as usize;
                SearchVerdict {
                    accept: value % 2 == 0,
                    stop: value == 6,
                }
            },
            |symbol: RawSymbol| received.push(symbol as usize),
        );
        let (filter, receiver) = search_functions_of(&state);
        let context = std::ptr::addr_of_mut!(state).cast::<c_void>();
        let returned = unsafe {
            let mut completed = true;
            for value in 1usize..=10 {
                let symbol = value as RawSymbol;
                let mut stop = false;
                if filter(context, symbol, &mut stop) {
                    receiver(context, symbol);
                }
                if stop {
                    completed = false;
                    break;
                }
            }
            completed
        };
        assert_eq!(state.finish("test_search", returned).unwrap(), ApplyOutcome::Stopped);
        assert_eq!(received, vec![2, 4, 6]);
    }

    #[test]
    fn receiver_without_acceptance_is_a_violation() {
        let mut state = SearchState::new(|_: RawSymbol| SearchVerdict::REJECT, |_: RawSymbol| {});
        state.filter(std::ptr::null_mut());
        state.receive(std::ptr::null_mut());
        assert!(matches!(
            state.finish("test_search", true),
            Err(IndexStoreError::ProtocolViolation { .. })
        ));
    }

    #[test]
    fn verdict_constructors() {
        assert_eq!(SearchVerdict::accept_if(true), SearchVerdict::ACCEPT);
        assert!(SearchVerdict::accept_and_stop().stop);
        assert!(!SearchVerdict::stop().accept);
        assert_eq!(SearchVerdict::default(), SearchVerdict::REJECT);
    }
}
