//! Timeout-Bounded Asynchronous Serial Transport
//!
//! This crate turns a non-blocking, interrupt-driven serial device
//! (anything implementing [`hal::SerialDevice`]) into a synchronous
//! byte transport with bounded waits and a one-shot receive
//! notification.
//!
//! # Module Organization
//!
//! - [`serial`]: The transport itself — poll-bounded `getc`/`putc`,
//!   buffered `read`/`write`, `flush`, and the configuration surface
//! - [`notifier`]: Callback registration and the interrupt-to-callback
//!   bridge with its pending-receive de-duplication
//! - [`timeout`]: Per-byte timeout derivation from the line parameters
//! - [`error`]: Transfer outcome types
//!
//! # Timing model
//!
//! Every blocking primitive is bounded by a timeout derived from the
//! configured baud rate and frame format: the time one frame takes on
//! the wire, rounded up to whole milliseconds, plus a caller-supplied
//! margin. A byte that does not arrive within that window is reported
//! as [`TransferError::NoData`] — an expected outcome to branch on,
//! not a fault.

#![cfg_attr(not(test), no_std)]
#![allow(dead_code)]

pub mod error;
pub mod notifier;
pub mod serial;
pub mod timeout;

// Re-export commonly used types
pub use error::TransferError;
pub use notifier::EventKind;
pub use serial::AsyncSerial;

extern crate alloc;
