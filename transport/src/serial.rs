//! Asynchronous serial transport.
//!
//! [`AsyncSerial`] owns a non-blocking serial device and a microsecond
//! clock and builds the synchronous byte API on top of them:
//!
//! - [`getc`]/[`putc`]: single-byte transfers, each bounded by the
//!   per-byte timeout derived from the line configuration
//! - [`read`]/[`write`]: buffered loops over the single-byte
//!   primitives, with short-read and partial-write semantics
//! - [`flush`]: drain of residual inbound bytes
//! - the configuration surface, which keeps the cached timeout
//!   consistent with the line parameters at all times
//!
//! [`getc`]: AsyncSerial::getc
//! [`putc`]: AsyncSerial::putc
//! [`read`]: AsyncSerial::read
//! [`write`]: AsyncSerial::write
//! [`flush`]: AsyncSerial::flush

use alloc::boxed::Box;
use alloc::sync::Arc;
use core::fmt;

use hal::clock::Clock;
use hal::serial::{
    DataBits, Events, FlowControl, Parity, SerialConfig, SerialDevice, SerialError, StopBits,
};
use log::{debug, trace};

use crate::error::TransferError;
use crate::notifier::{EventKind, EventTable};
use crate::timeout::frame_timeout_ms;

/// Timeout-bounded transport over a non-blocking serial device.
///
/// The device is owned exclusively; all operations borrow the
/// transport. Interrupt-context state (the callback table and the
/// pending-receive flag) lives behind an `Arc` shared with the hook
/// registered on the device.
pub struct AsyncSerial<D: SerialDevice, C: Clock> {
    dev: D,
    clock: C,
    config: SerialConfig,
    extra_timeout_ms: u32,
    timeout_ms: u32,
    events: Arc<EventTable>,
}

impl<D: SerialDevice, C: Clock> AsyncSerial<D, C> {
    /// Create a transport over `dev` with the default 8N1 frame format
    /// at the given baud rate.
    ///
    /// Configures the device immediately. Fails fast on a zero baud
    /// rate rather than dividing by it later.
    pub fn new(mut dev: D, clock: C, baud: u32) -> Result<Self, SerialError> {
        let config = SerialConfig::new_8n1(baud);
        let timeout_ms = frame_timeout_ms(&config, 0)?;
        dev.configure(config)?;

        Ok(Self {
            dev,
            clock,
            config,
            extra_timeout_ms: 0,
            timeout_ms,
            events: Arc::new(EventTable::new()),
        })
    }

    /// Arm the receive-signal bridge and apply the extra timeout margin.
    ///
    /// After this call, a data-ready signal from the device fires the
    /// attached Receive callback once per read cycle.
    pub fn init(&mut self, extra_timeout_ms: u32) -> Result<(), SerialError> {
        self.extra_timeout_ms = extra_timeout_ms;
        self.timeout_ms = frame_timeout_ms(&self.config, self.extra_timeout_ms)?;

        let table = Arc::clone(&self.events);
        self.dev
            .set_event_hook(Box::new(move |events| table.data_ready(events)));

        debug!(
            "receive bridge armed, per-byte timeout {} ms",
            self.timeout_ms
        );
        Ok(())
    }

    /// Register `callback` for the given notification kind.
    ///
    /// At most one callback per kind; a later call replaces the
    /// earlier one.
    pub fn attach<F>(&mut self, callback: F, kind: EventKind)
    where
        F: FnMut() + Send + 'static,
    {
        self.events.attach(kind, Box::new(callback));
    }

    /// Change the baud rate.
    ///
    /// Validates first, then reconfigures the device and recomputes
    /// the timeout, so the cached timeout never disagrees with the
    /// line parameters.
    pub fn set_baud(&mut self, baud: u32) -> Result<(), SerialError> {
        let config = SerialConfig {
            baud_rate: baud,
            ..self.config
        };
        let timeout_ms = frame_timeout_ms(&config, self.extra_timeout_ms)?;

        self.dev.configure(config)?;
        self.config = config;
        self.timeout_ms = timeout_ms;
        debug!("baud {} -> per-byte timeout {} ms", baud, timeout_ms);
        Ok(())
    }

    /// Change the frame format.
    pub fn set_format(
        &mut self,
        data_bits: DataBits,
        parity: Parity,
        stop_bits: StopBits,
    ) -> Result<(), SerialError> {
        let config = SerialConfig {
            data_bits,
            parity,
            stop_bits,
            ..self.config
        };
        let timeout_ms = frame_timeout_ms(&config, self.extra_timeout_ms)?;

        self.dev.configure(config)?;
        self.config = config;
        self.timeout_ms = timeout_ms;
        Ok(())
    }

    /// Configure hardware flow control; pass-through to the device.
    pub fn set_flow_control(
        &mut self,
        mode: FlowControl,
        rts: Option<D::Pin>,
        cts: Option<D::Pin>,
    ) -> Result<(), SerialError> {
        self.dev.set_flow_control(mode, rts, cts)
    }

    /// Read one byte, waiting at most the per-byte timeout.
    ///
    /// [`TransferError::NoData`] means no byte arrived in time — the
    /// usual state of an idle line, not a fault.
    pub fn getc(&mut self) -> Result<u8, TransferError> {
        if !self.wait_ready(Events::READABLE) {
            return Err(TransferError::NoData);
        }

        let mut byte = [0u8; 1];
        match self.dev.try_read(&mut byte) {
            Ok(1) => Ok(byte[0]),
            // Readiness was reported but the transfer came up empty;
            // resolves to NoData like an expired wait.
            _ => Err(TransferError::NoData),
        }
    }

    /// Write one byte, waiting at most the per-byte timeout for the
    /// device to accept it.
    pub fn putc(&mut self, byte: u8) -> Result<(), TransferError> {
        if !self.wait_ready(Events::WRITABLE) {
            return Err(TransferError::NoData);
        }

        match self.dev.try_write(&[byte]) {
            Ok(1) => Ok(()),
            _ => Err(TransferError::NoData),
        }
    }

    /// Read up to `buf.len()` bytes.
    ///
    /// - `None` fails with [`TransferError::NoBuffer`] before anything
    ///   is transferred, leaving the pending-receive flag untouched.
    /// - A short read is success: the count of bytes that arrived
    ///   before the line went idle.
    /// - Zero bytes on a non-empty buffer is [`TransferError::NoData`].
    /// - A completely filled buffer triggers a drain of whatever is
    ///   still queued, on the assumption the buffer was undersized for
    ///   the burst; those residual bytes are discarded.
    ///
    /// Every non-`NoBuffer` exit clears the pending-receive flag so
    /// the next data-ready signal re-arms the Receive callback.
    pub fn read(&mut self, buf: Option<&mut [u8]>) -> Result<usize, TransferError> {
        let Some(buf) = buf else {
            return Err(TransferError::NoBuffer);
        };

        let mut count = 0;
        while count < buf.len() {
            match self.getc() {
                Ok(byte) => {
                    buf[count] = byte;
                    count += 1;
                }
                Err(_) => break,
            }
        }

        // Caller's buffer may be shorter than the burst; discard the
        // rest so stale bytes cannot leak into the next read.
        if count == buf.len() {
            self.flush();
        }

        self.events.finish_read();

        if count == 0 && !buf.is_empty() {
            Err(TransferError::NoData)
        } else {
            Ok(count)
        }
    }

    /// Write `buf`, stopping at the first byte the device refuses.
    ///
    /// - `None` fails with [`TransferError::NoBuffer`] and does not
    ///   fire the Transmit callback.
    /// - A mid-buffer failure reports [`TransferError::Partial`] with
    ///   the count that made it out; nothing is retried.
    ///
    /// The Transmit callback fires exactly once on every path that was
    /// handed a buffer, success or partial.
    pub fn write(&mut self, buf: Option<&[u8]>) -> Result<usize, TransferError> {
        let Some(buf) = buf else {
            return Err(TransferError::NoBuffer);
        };

        let mut sent = 0;
        let mut stalled = false;
        for &byte in buf {
            if self.putc(byte).is_err() {
                stalled = true;
                break;
            }
            sent += 1;
        }

        self.events.notify(EventKind::Transmit);

        if stalled {
            Err(TransferError::Partial { sent })
        } else {
            Ok(sent)
        }
    }

    /// Drain and discard inbound bytes until the line goes idle.
    pub fn flush(&mut self) {
        let mut drained = 0usize;
        while self.getc().is_ok() {
            drained += 1;
        }
        if drained > 0 {
            trace!("flushed {} residual bytes", drained);
        }
    }

    /// Current line configuration.
    pub fn config(&self) -> SerialConfig {
        self.config
    }

    /// Current per-byte timeout in milliseconds, margin included.
    pub fn timeout_ms(&self) -> u32 {
        self.timeout_ms
    }

    /// Whether a receive notification is outstanding (set by the
    /// data-ready signal, cleared by `read`).
    pub fn rx_pending(&self) -> bool {
        self.events.rx_pending()
    }

    /// Borrow the underlying device.
    pub fn device(&self) -> &D {
        &self.dev
    }

    /// Mutably borrow the underlying device.
    pub fn device_mut(&mut self) -> &mut D {
        &mut self.dev
    }

    /// Consume the transport, returning the device.
    pub fn release(self) -> D {
        self.dev
    }

    /// Poll the device for `interest`, bounded by the per-byte timeout.
    ///
    /// Returns `true` as soon as any requested readiness shows up,
    /// `false` once the timeout elapses.
    fn wait_ready(&mut self, interest: Events) -> bool {
        let budget_us = u64::from(self.timeout_ms) * 1000;
        let start = self.clock.now_us();

        loop {
            if self.dev.poll(interest).intersects(interest) {
                return true;
            }
            if self.clock.now_us().wrapping_sub(start) >= budget_us {
                return false;
            }
            core::hint::spin_loop();
        }
    }
}

/// Formatted output through the transport, byte for byte.
///
/// Formatting fails if any byte times out; no newline translation is
/// performed.
impl<D: SerialDevice, C: Clock> fmt::Write for AsyncSerial<D, C> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        for &byte in s.as_bytes() {
            self.putc(byte).map_err(|_| fmt::Error)?;
        }
        Ok(())
    }
}
