//! Receive-interrupt bridge and callback registration.
//!
//! The device signals data-ready from interrupt context; the
//! application drains data from its normal context by calling `read`.
//! [`EventTable`] sits between the two: it holds the registered
//! callbacks and a pending-receive flag that guarantees the receive
//! callback fires at most once per read cycle, however many interrupts
//! arrive in between.
//!
//! The flag is the only state touched from both contexts. It is
//! claimed with an atomic test-and-set so an interrupt preempting the
//! normal context cannot double-fire or lose a notification.

use alloc::boxed::Box;
use core::sync::atomic::{AtomicBool, Ordering};

use hal::serial::Events;
use spin::Mutex;

/// Notification kinds a callback can be attached to.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// Data arrived and has not been drained yet.
    Receive = 0,
    /// A buffered write completed (fully or partially).
    Transmit = 1,
}

/// Zero-argument notification callback.
pub type Callback = Box<dyn FnMut() + Send>;

/// Callback slots plus the pending-receive flag.
///
/// One slot per [`EventKind`]; a later `attach` for the same kind
/// replaces the earlier callback. Slots are locked while the callback
/// runs, so callbacks must not attach callbacks.
///
/// The interrupt-context path never spins on a slot lock: it claims
/// the pending flag atomically and then only *tries* the lock, backing
/// off if the normal context holds it. Spinning there would deadlock a
/// single core, since the preempted normal context cannot resume to
/// release the lock.
pub struct EventTable {
    slots: [Mutex<Option<Callback>>; 2],
    rx_pending: AtomicBool,
}

impl EventTable {
    pub const fn new() -> Self {
        Self {
            slots: [Mutex::new(None), Mutex::new(None)],
            rx_pending: AtomicBool::new(false),
        }
    }

    /// Register `callback` for `kind`, replacing any previous one.
    pub fn attach(&self, kind: EventKind, callback: Callback) {
        *self.slots[kind as usize].lock() = Some(callback);
    }

    /// Invoke the callback for `kind` once, if one is registered.
    pub fn notify(&self, kind: EventKind) {
        if let Some(callback) = self.slots[kind as usize].lock().as_mut() {
            callback();
        }
    }

    /// Data-ready signal entry point, runs in interrupt context.
    ///
    /// Fires the receive callback exactly once per Idle -> Pending
    /// transition: the flag is claimed atomically before the call, and
    /// further signals while it stays set are observed but silent. A
    /// signal with no receive callback registered leaves the flag
    /// clear, so a callback attached later still gets the next signal.
    ///
    /// If the signal lands while the normal context is mid-`attach`,
    /// the claim is released and the signal dropped; the device raises
    /// another one for data that is still queued.
    pub fn data_ready(&self, events: Events) {
        if !events.contains(Events::READABLE) {
            return;
        }

        // Claim the cycle before touching the slot; only one signal
        // per read cycle gets past this point.
        if self
            .rx_pending
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return;
        }

        // Never spin here: the lock holder may be the very context
        // this interrupt preempted.
        let Some(mut slot) = self.slots[EventKind::Receive as usize].try_lock() else {
            self.rx_pending.store(false, Ordering::Release);
            return;
        };

        match slot.as_mut() {
            Some(callback) => callback(),
            None => self.rx_pending.store(false, Ordering::Release),
        }
    }

    /// Pending -> Idle: re-arm the notification for the next signal.
    ///
    /// Called at the end of every completed `read`, regardless of how
    /// much data it consumed.
    pub fn finish_read(&self) {
        self.rx_pending.store(false, Ordering::Release);
    }

    /// Whether a receive notification is currently outstanding.
    pub fn rx_pending(&self) -> bool {
        self.rx_pending.load(Ordering::Acquire)
    }
}

impl Default for EventTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    fn counting_callback() -> (Arc<AtomicUsize>, Callback) {
        let count = Arc::new(AtomicUsize::new(0));
        let inner = Arc::clone(&count);
        (
            count,
            Box::new(move || {
                inner.fetch_add(1, Ordering::SeqCst);
            }),
        )
    }

    #[test]
    fn repeated_signals_fire_once_per_read_cycle() {
        let table = EventTable::new();
        let (count, cb) = counting_callback();
        table.attach(EventKind::Receive, cb);

        table.data_ready(Events::READABLE);
        table.data_ready(Events::READABLE);
        table.data_ready(Events::READABLE);
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(table.rx_pending());

        table.finish_read();
        table.data_ready(Events::READABLE);
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn non_readable_signals_are_ignored() {
        let table = EventTable::new();
        let (count, cb) = counting_callback();
        table.attach(EventKind::Receive, cb);

        table.data_ready(Events::WRITABLE);
        table.data_ready(Events::empty());
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert!(!table.rx_pending());
    }

    #[test]
    fn signal_without_callback_does_not_latch_the_flag() {
        let table = EventTable::new();
        table.data_ready(Events::READABLE);
        assert!(!table.rx_pending());

        // A callback attached afterwards still sees the next signal.
        let (count, cb) = counting_callback();
        table.attach(EventKind::Receive, cb);
        table.data_ready(Events::READABLE);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn signal_against_a_held_slot_backs_off_without_spinning() {
        let table = EventTable::new();
        let (count, cb) = counting_callback();
        table.attach(EventKind::Receive, cb);

        // Hold the slot the way a preempted attach would.
        let guard = table.slots[EventKind::Receive as usize].lock();

        // Must return immediately (a spin here would hang the test)
        // and must not leave the flag claimed with no callback fired.
        table.data_ready(Events::READABLE);
        assert_eq!(count.load(Ordering::SeqCst), 0);
        assert!(!table.rx_pending());

        drop(guard);

        // The next signal for the still-queued data gets through.
        table.data_ready(Events::READABLE);
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(table.rx_pending());
    }

    #[test]
    fn last_attach_wins() {
        let table = EventTable::new();
        let (first, cb1) = counting_callback();
        let (second, cb2) = counting_callback();

        table.attach(EventKind::Transmit, cb1);
        table.attach(EventKind::Transmit, cb2);
        table.notify(EventKind::Transmit);

        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn notify_without_callback_is_a_no_op() {
        let table = EventTable::new();
        table.notify(EventKind::Transmit);
    }
}
