//! Serial Hardware Abstraction Layer
//!
//! This crate defines the platform-independent traits the transport
//! layer is built against:
//!
//! # Module Organization
//!
//! - [`serial`]: Non-blocking serial device trait and line parameters
//! - [`clock`]: Free-running microsecond time source
//! - [`loopback`]: Software serial device for tests and bring-up
//!
//! # Design Principles
//!
//! 1. **Separation of Concerns**: Line timing and buffering live above
//!    this crate; register access lives below it
//! 2. **Zero-Cost Abstractions**: Trait calls compile to direct
//!    hardware access on a real platform
//! 3. **No platform leakage**: Traits must not reference
//!    platform-specific types

#![cfg_attr(not(test), no_std)]
#![allow(dead_code)]

pub mod clock;
pub mod loopback;
pub mod serial;

// Re-export commonly used types
pub use clock::Clock;
pub use serial::{Events, FlowControl, SerialConfig, SerialDevice, SerialError};

extern crate alloc;
