//! Serial Port (UART) Hardware Abstraction Layer.
//!
//! This module defines the platform-independent trait for a
//! non-blocking serial device. The device never waits: readiness is
//! reported through [`SerialDevice::poll`], transfers move whatever is
//! immediately possible, and inbound data is announced through an
//! event hook invoked from interrupt context. All timing policy lives
//! in the transport layer above.

use alloc::boxed::Box;
use bitflags::bitflags;

/// Serial line configuration.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SerialConfig {
    /// Baud rate in bits per second.
    pub baud_rate: u32,
    /// Number of data bits per frame.
    pub data_bits: DataBits,
    /// Parity checking mode.
    pub parity: Parity,
    /// Number of stop bits.
    pub stop_bits: StopBits,
}

impl SerialConfig {
    /// Create a standard 8N1 configuration at the specified baud rate.
    ///
    /// 8N1 means: 8 data bits, no parity, 1 stop bit.
    pub const fn new_8n1(baud_rate: u32) -> Self {
        Self {
            baud_rate,
            data_bits: DataBits::Eight,
            parity: Parity::None,
            stop_bits: StopBits::One,
        }
    }

    /// Total bits on the wire per frame, including the start bit.
    pub const fn frame_bits(&self) -> u32 {
        1 + self.data_bits.bit_count() + self.parity.bit_count() + self.stop_bits.bit_count()
    }
}

impl Default for SerialConfig {
    /// Default configuration: 115200 baud, 8N1.
    fn default() -> Self {
        Self::new_8n1(115200)
    }
}

/// Number of data bits per frame.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DataBits {
    Five,
    Six,
    Seven,
    Eight,
    Nine,
}

impl DataBits {
    /// Data bit count as it appears on the wire.
    pub const fn bit_count(self) -> u32 {
        match self {
            DataBits::Five => 5,
            DataBits::Six => 6,
            DataBits::Seven => 7,
            DataBits::Eight => 8,
            DataBits::Nine => 9,
        }
    }
}

/// Parity mode.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Parity {
    /// No parity bit.
    None,
    /// Odd parity.
    Odd,
    /// Even parity.
    Even,
    /// Parity bit always 1.
    Mark,
    /// Parity bit always 0.
    Space,
}

impl Parity {
    /// Width of the parity field in bits: 0 when disabled, else 1.
    pub const fn bit_count(self) -> u32 {
        match self {
            Parity::None => 0,
            _ => 1,
        }
    }
}

/// Number of stop bits.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum StopBits {
    /// One stop bit.
    One,
    /// Two stop bits.
    Two,
}

impl StopBits {
    pub const fn bit_count(self) -> u32 {
        match self {
            StopBits::One => 1,
            StopBits::Two => 2,
        }
    }
}

/// Hardware flow control mode.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FlowControl {
    /// No flow control.
    None,
    /// RTS line only.
    Rts,
    /// CTS line only.
    Cts,
    /// Full RTS/CTS handshaking.
    RtsCts,
}

bitflags! {
    /// Readiness set reported by [`SerialDevice::poll`].
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    pub struct Events: u8 {
        /// At least one byte can be read without blocking.
        const READABLE = 1 << 0;
        /// At least one byte can be written without blocking.
        const WRITABLE = 1 << 1;
    }
}

/// Serial device errors.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum SerialError {
    /// Framing error (invalid stop bit).
    Framing,
    /// Parity error (parity check failed).
    Parity,
    /// Overrun error (data received faster than it could be read).
    Overrun,
    /// Break condition detected.
    Break,
    /// Operation would block.
    WouldBlock,
    /// Invalid configuration parameter.
    InvalidConfig,
    /// Other platform-specific error.
    Other,
}

impl core::fmt::Display for SerialError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let msg = match self {
            SerialError::Framing => "framing error",
            SerialError::Parity => "parity error",
            SerialError::Overrun => "receive overrun",
            SerialError::Break => "break condition",
            SerialError::WouldBlock => "operation would block",
            SerialError::InvalidConfig => "invalid configuration",
            SerialError::Other => "device error",
        };
        f.write_str(msg)
    }
}

/// Data-ready signal handler.
///
/// Invoked by the device from interrupt context with its readiness set
/// at the time of the signal. The handler must not block and must not
/// call back into the device.
pub type EventHook = Box<dyn FnMut(Events) + Send>;

/// Non-blocking serial device trait.
///
/// Implementations wrap a UART peripheral already placed in
/// non-blocking mode. Clock setup, FIFO management and pin muxing are
/// the implementation's concern and happen at construction time.
pub trait SerialDevice {
    /// Platform-specific pin identifier, used for flow-control wiring.
    type Pin: Copy;

    /// Apply a line configuration.
    fn configure(&mut self, config: SerialConfig) -> Result<(), SerialError>;

    /// Configure hardware flow control and its pin assignment.
    fn set_flow_control(
        &mut self,
        mode: FlowControl,
        rts: Option<Self::Pin>,
        cts: Option<Self::Pin>,
    ) -> Result<(), SerialError>;

    /// Query readiness without blocking.
    ///
    /// Returns the subset of `interest` that is currently ready.
    fn poll(&self, interest: Events) -> Events;

    /// Read immediately available bytes into `buf`.
    ///
    /// Returns the number of bytes transferred, which may be zero.
    fn try_read(&mut self, buf: &mut [u8]) -> Result<usize, SerialError>;

    /// Write as many bytes from `buf` as fit without blocking.
    ///
    /// Returns the number of bytes accepted, which may be zero.
    fn try_write(&mut self, buf: &[u8]) -> Result<usize, SerialError>;

    /// Register the data-ready signal handler.
    ///
    /// Replaces any previously registered hook.
    fn set_event_hook(&mut self, hook: EventHook);
}
