//! Unit event listening.
//!
//! The store reports added, removed and modified units to a single handler,
//! possibly on a thread of its own. [`Store::set_unit_event_handler`]
//! installs a closure directly; [`Store::subscribe_unit_events`] installs a
//! [`UnitEventFeed`] that copies each notification into an owned
//! [`UnitEventBatch`] and fans it out over channels.

use crate::error::IndexStoreResult;
use crate::error_slot::ErrorSlot;
use crate::library::IndexStoreLibrary;
use crate::store::Store;
use crate::string::copy_string_ref;
use indexstore_abi::{ListenOptions, RawUnitEvent, RawUnitEventNotification, UnitEventKind};
use parking_lot::RwLock;
use std::ffi::c_void;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;
use tracing::{debug, error, warn};

/// A batch of unit events. Valid only inside the handler it was passed to.
#[derive(Clone, Copy)]
pub struct UnitEventNotification<'a> {
    library: &'a IndexStoreLibrary,
    raw: RawUnitEventNotification,
}

impl<'a> UnitEventNotification<'a> {
    fn new(library: &'a IndexStoreLibrary, raw: RawUnitEventNotification) -> Self {
        Self { library, raw }
    }

    /// Number of events in the batch.
    #[must_use]
    pub fn len(&self) -> usize {
        // SAFETY: live notification.
        unsafe { (self.library.functions().unit_event_notification_get_events_count)(self.raw) }
    }

    /// Returns true if the batch has no events.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True for the snapshot of existing units delivered when listening starts.
    #[must_use]
    pub fn is_initial(&self) -> bool {
        // SAFETY: live notification.
        unsafe { (self.library.functions().unit_event_notification_is_initial)(self.raw) }
    }

    /// The event at `index`, or `None` past the end.
    #[must_use]
    pub fn event(&self, index: usize) -> Option<UnitEvent<'a>> {
        if index >= self.len() {
            return None;
        }
        // SAFETY: live notification, index in bounds.
        let raw = unsafe {
            (self.library.functions().unit_event_notification_get_event)(self.raw, index)
        };
        (!raw.is_null()).then(|| UnitEvent {
            library: self.library,
            raw,
        })
    }

    /// Events in delivery order.
    pub fn events(&self) -> impl Iterator<Item = UnitEvent<'a>> + '_ {
        (0..self.len()).filter_map(|index| self.event(index))
    }

    /// Copies the batch.
    #[must_use]
    pub fn to_batch(&self) -> UnitEventBatch {
        UnitEventBatch {
            is_initial: self.is_initial(),
            events: self.events().map(|event| event.record()).collect(),
        }
    }
}

impl fmt::Debug for UnitEventNotification<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("UnitEventNotification").field(&self.raw).finish()
    }
}

/// One unit event. Valid only inside the handler it was passed to.
#[derive(Clone, Copy)]
pub struct UnitEvent<'a> {
    library: &'a IndexStoreLibrary,
    raw: RawUnitEvent,
}

impl UnitEvent<'_> {
    /// Raw kind value.
    #[must_use]
    pub fn raw_kind(&self) -> u32 {
        // SAFETY: live event.
        unsafe { (self.library.functions().unit_event_get_kind)(self.raw) }
    }

    /// Kind, or `None` for values this crate does not know.
    #[must_use]
    pub fn kind(&self) -> Option<UnitEventKind> {
        let raw = self.raw_kind();
        let kind = UnitEventKind::from_raw(raw);
        if kind.is_none() {
            warn!(what = "unit event kind", raw, "unknown wire value");
        }
        kind
    }

    /// Name of the unit the event is about.
    #[must_use]
    pub fn unit_name(&self) -> String {
        // SAFETY: live event; copied immediately.
        unsafe { copy_string_ref((self.library.functions().unit_event_get_unit_name)(self.raw)) }
    }

    /// Copies the event.
    #[must_use]
    pub fn record(&self) -> UnitEventRecord {
        UnitEventRecord {
            kind: self.kind(),
            unit_name: self.unit_name(),
        }
    }
}

impl fmt::Debug for UnitEvent<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("UnitEvent").field(&self.raw).finish()
    }
}

/// Owned copy of a unit event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitEventRecord {
    /// Kind, if known.
    pub kind: Option<UnitEventKind>,
    /// Unit name.
    pub unit_name: String,
}

/// Owned copy of a notification.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UnitEventBatch {
    /// True for the initial snapshot.
    pub is_initial: bool,
    /// Events in delivery order.
    pub events: Vec<UnitEventRecord>,
}

/// Fans unit event batches out to channel subscribers.
///
/// Subscribers whose receiver has been dropped are removed on the next emit.
pub struct UnitEventFeed {
    subscribers: RwLock<Vec<Sender<UnitEventBatch>>>,
}

impl UnitEventFeed {
    /// Creates a feed with no subscribers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            subscribers: RwLock::new(Vec::new()),
        }
    }

    /// Returns a receiver for every batch emitted from now on.
    pub fn subscribe(&self) -> Receiver<UnitEventBatch> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.write().push(tx);
        rx
    }

    /// Sends `batch` to every live subscriber.
    pub fn emit(&self, batch: UnitEventBatch) {
        let mut subscribers = self.subscribers.write();
        subscribers.retain(|tx| tx.send(batch.clone()).is_ok());
    }

    /// Number of subscribers, including ones not yet found dead.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.read().len()
    }
}

impl Default for UnitEventFeed {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for UnitEventFeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UnitEventFeed")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

struct HandlerContext<F> {
    library: IndexStoreLibrary,
    handler: F,
}

unsafe extern "C" fn event_trampoline<F>(context: *mut c_void, notification: RawUnitEventNotification)
where
    F: Fn(&UnitEventNotification<'_>) + Send + Sync + 'static,
{
    let context = &*context.cast::<HandlerContext<F>>();
    let notification = UnitEventNotification::new(&context.library, notification);
    // Unwinding into the store's thread is not an option.
    if catch_unwind(AssertUnwindSafe(|| (context.handler)(&notification))).is_err() {
        error!("unit event handler panicked; notification dropped");
    }
}

unsafe extern "C" fn finalize_handler<F>(context: *mut c_void) {
    drop(Box::from_raw(context.cast::<HandlerContext<F>>()));
}

impl Store {
    /// Installs `handler` for unit events, replacing any previous handler.
    ///
    /// The handler may run on a thread owned by the store, concurrently with
    /// calls on this store. Events are only delivered between
    /// [`Store::start_unit_event_listening`] and
    /// [`Store::stop_unit_event_listening`]. A feed installed by
    /// [`Store::subscribe_unit_events`] is detached, and its receivers
    /// disconnect once the store releases the old handler.
    pub fn set_unit_event_handler<F>(&self, handler: F)
    where
        F: Fn(&UnitEventNotification<'_>) + Send + Sync + 'static,
    {
        let mut feed = self.event_feed.lock();
        if feed.take().is_some() {
            debug!(path = %self.path().display(), "unit event feed detached");
        }
        self.install_handler(handler);
    }

    fn install_handler<F>(&self, handler: F)
    where
        F: Fn(&UnitEventNotification<'_>) + Send + Sync + 'static,
    {
        let context = Box::into_raw(Box::new(HandlerContext {
            library: self.library().clone(),
            handler,
        }));
        // SAFETY: ownership of the context passes to the store, which hands
        // it back to `finalize_handler` exactly once.
        unsafe {
            (self.library().functions().store_set_unit_event_handler_f)(
                self.raw(),
                context.cast(),
                event_trampoline::<F>,
                finalize_handler::<F>,
            );
        }
        debug!(path = %self.path().display(), "unit event handler installed");
    }

    /// Starts delivering unit events to the installed handler.
    ///
    /// With `wait_initial_sync`, returns only after the initial snapshot has
    /// been delivered.
    pub fn start_unit_event_listening(&self, options: ListenOptions) -> IndexStoreResult<()> {
        const OPERATION: &str = "store_start_unit_event_listening";
        let mut options = options;
        let mut error = ErrorSlot::new(self.library());
        // SAFETY: the options and the error slot outlive the call.
        let started = unsafe {
            (self.library().functions().store_start_unit_event_listening)(
                self.raw(),
                &mut options,
                std::mem::size_of::<ListenOptions>(),
                error.as_out(),
            )
        };
        if !started {
            return Err(error.into_error(OPERATION));
        }
        debug!(
            path = %self.path().display(),
            wait_initial_sync = options.wait_initial_sync,
            "unit event listening started"
        );
        Ok(())
    }

    /// Stops delivering unit events.
    pub fn stop_unit_event_listening(&self) {
        // SAFETY: live store.
        unsafe { (self.library().functions().store_stop_unit_event_listening)(self.raw()) };
        debug!(path = %self.path().display(), "unit event listening stopped");
    }

    /// Returns a receiver of owned unit event batches.
    ///
    /// The first call installs a [`UnitEventFeed`] as the store's handler;
    /// later calls add subscribers to it. Installing another handler with
    /// [`Store::set_unit_event_handler`] disconnects the feed, and the next
    /// call installs a fresh one.
    pub fn subscribe_unit_events(&self) -> Receiver<UnitEventBatch> {
        let mut slot = self.event_feed.lock();
        let feed = match slot.as_ref() {
            Some(feed) => Arc::clone(feed),
            None => {
                let feed = Arc::new(UnitEventFeed::new());
                let sink = Arc::clone(&feed);
                self.install_handler(move |notification| sink.emit(notification.to_batch()));
                *slot = Some(Arc::clone(&feed));
                feed
            }
        };
        feed.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn batch(names: &[&str]) -> UnitEventBatch {
        UnitEventBatch {
            is_initial: false,
            events: names
                .iter()
                .map(|name| UnitEventRecord {
                    kind: Some(UnitEventKind::Added),
                    unit_name: (*name).to_owned(),
                })
                .collect(),
        }
    }

    #[test]
    fn emit_and_receive() {
        let feed = UnitEventFeed::new();
        let rx = feed.subscribe();
        feed.emit(batch(&["a.o-1"]));
        assert_eq!(rx.try_recv().unwrap(), batch(&["a.o-1"]));
    }

    #[test]
    fn multiple_subscribers() {
        let feed = UnitEventFeed::new();
        let rx1 = feed.subscribe();
        let rx2 = feed.subscribe();
        assert_eq!(feed.subscriber_count(), 2);

        feed.emit(batch(&["a", "b"]));
        assert_eq!(rx1.try_recv().unwrap().events.len(), 2);
        assert_eq!(rx2.try_recv().unwrap().events.len(), 2);
    }

    #[test]
    fn dropped_subscribers_are_removed() {
        let feed = UnitEventFeed::new();
        let rx1 = feed.subscribe();
        {
            let _rx2 = feed.subscribe();
        }
        feed.emit(batch(&[]));
        assert_eq!(feed.subscriber_count(), 1);
        assert!(rx1.try_recv().is_ok());
    }
}
