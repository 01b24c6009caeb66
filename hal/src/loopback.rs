//! Software Loopback Serial Device.
//!
//! [`Loopback`] implements [`SerialDevice`] entirely in memory: bytes
//! written come back out of the read side. It exists for host-side
//! tests and early bring-up of code that is generic over
//! [`SerialDevice`], standing in for a real peripheral.
//!
//! Inbound traffic from a fake remote end is injected with
//! [`Loopback::feed`], and the device interrupt is simulated with
//! [`Loopback::raise_data_ready`].

use alloc::collections::VecDeque;

use crate::serial::{EventHook, Events, FlowControl, SerialConfig, SerialDevice, SerialError};

/// In-memory serial device that echoes writes back to the read side.
pub struct Loopback {
    queue: VecDeque<u8>,
    capacity: Option<usize>,
    config: SerialConfig,
    flow: FlowControl,
    hook: Option<EventHook>,
}

impl Loopback {
    /// Create a loopback device with an unbounded queue.
    pub fn new() -> Self {
        Self::with_capacity(None)
    }

    /// Create a loopback device holding at most `capacity` bytes.
    ///
    /// A full queue reports not-writable, which is how tests provoke
    /// write timeouts.
    pub fn bounded(capacity: usize) -> Self {
        Self::with_capacity(Some(capacity))
    }

    fn with_capacity(capacity: Option<usize>) -> Self {
        Self {
            queue: VecDeque::new(),
            capacity,
            config: SerialConfig::default(),
            flow: FlowControl::None,
            hook: None,
        }
    }

    /// Inject bytes as if they arrived from the remote end.
    ///
    /// Ignores the capacity bound: a real wire does not stop sending
    /// because the local queue is full.
    pub fn feed(&mut self, bytes: &[u8]) {
        self.queue.extend(bytes.iter().copied());
    }

    /// Number of bytes currently queued.
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Current line configuration, as last applied.
    pub fn config(&self) -> SerialConfig {
        self.config
    }

    /// Current flow-control mode, as last applied.
    pub fn flow_control(&self) -> FlowControl {
        self.flow
    }

    /// Simulate the receive interrupt.
    ///
    /// Invokes the registered event hook with the device's current
    /// readiness set, exactly as a peripheral driver would from its
    /// interrupt handler.
    pub fn raise_data_ready(&mut self) {
        let events = self.readiness();
        if let Some(hook) = self.hook.as_mut() {
            hook(events);
        }
    }

    fn readiness(&self) -> Events {
        let mut events = Events::empty();
        if !self.queue.is_empty() {
            events |= Events::READABLE;
        }
        if self.capacity.is_none_or(|cap| self.queue.len() < cap) {
            events |= Events::WRITABLE;
        }
        events
    }
}

impl Default for Loopback {
    fn default() -> Self {
        Self::new()
    }
}

impl SerialDevice for Loopback {
    type Pin = u8;

    fn configure(&mut self, config: SerialConfig) -> Result<(), SerialError> {
        if config.baud_rate == 0 {
            return Err(SerialError::InvalidConfig);
        }
        self.config = config;
        Ok(())
    }

    fn set_flow_control(
        &mut self,
        mode: FlowControl,
        _rts: Option<u8>,
        _cts: Option<u8>,
    ) -> Result<(), SerialError> {
        self.flow = mode;
        Ok(())
    }

    fn poll(&self, interest: Events) -> Events {
        self.readiness() & interest
    }

    fn try_read(&mut self, buf: &mut [u8]) -> Result<usize, SerialError> {
        let mut count = 0;
        while count < buf.len() {
            match self.queue.pop_front() {
                Some(byte) => {
                    buf[count] = byte;
                    count += 1;
                }
                None => break,
            }
        }
        Ok(count)
    }

    fn try_write(&mut self, buf: &[u8]) -> Result<usize, SerialError> {
        let room = match self.capacity {
            Some(cap) => cap.saturating_sub(self.queue.len()),
            None => buf.len(),
        };
        let count = buf.len().min(room);
        self.queue.extend(buf[..count].iter().copied());
        Ok(count)
    }

    fn set_event_hook(&mut self, hook: EventHook) {
        self.hook = Some(hook);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn writes_come_back_on_the_read_side() {
        let mut dev = Loopback::new();
        assert_eq!(dev.try_write(b"abc"), Ok(3));

        let mut buf = [0u8; 8];
        assert_eq!(dev.try_read(&mut buf), Ok(3));
        assert_eq!(&buf[..3], b"abc");
    }

    #[test]
    fn poll_reflects_queue_state() {
        let mut dev = Loopback::bounded(2);
        assert_eq!(dev.poll(Events::all()), Events::WRITABLE);

        dev.feed(b"xy");
        assert_eq!(dev.poll(Events::all()), Events::READABLE);
        assert_eq!(dev.poll(Events::WRITABLE), Events::empty());
    }

    #[test]
    fn bounded_queue_accepts_partial_writes() {
        let mut dev = Loopback::bounded(2);
        assert_eq!(dev.try_write(b"abcd"), Ok(2));
        assert_eq!(dev.try_write(b"e"), Ok(0));
    }

    #[test]
    fn feed_bypasses_capacity() {
        let mut dev = Loopback::bounded(1);
        dev.feed(b"abc");
        assert_eq!(dev.queued(), 3);
    }

    #[test]
    fn raise_data_ready_reports_readiness_to_hook() {
        use core::sync::atomic::{AtomicU8, Ordering};
        use std::sync::Arc;

        let seen = Arc::new(AtomicU8::new(0));
        let seen_by_hook = Arc::clone(&seen);

        let mut dev = Loopback::new();
        dev.set_event_hook(Box::new(move |events| {
            seen_by_hook.store(events.bits(), Ordering::SeqCst);
        }));

        dev.feed(b"!");
        dev.raise_data_ready();
        let events = Events::from_bits_truncate(seen.load(Ordering::SeqCst));
        assert!(events.contains(Events::READABLE));
    }

    #[test]
    fn zero_baud_is_rejected() {
        let mut dev = Loopback::new();
        assert_eq!(
            dev.configure(SerialConfig::new_8n1(0)),
            Err(SerialError::InvalidConfig)
        );
    }
}
