//! Per-byte timeout derivation.
//!
//! The bounded wait used by `getc`/`putc` must cover at least the time
//! one frame takes on the wire, or a slow line would time out on every
//! byte. The derivation is pure arithmetic on the line configuration
//! and is re-run whenever baud rate, frame format, or the extra margin
//! change; the transport caches the result.

use hal::serial::{SerialConfig, SerialError};

/// Compute the per-byte timeout in milliseconds.
///
/// Frame time in microseconds is `frame_bits * 1_000_000 / baud`,
/// rounded up to the next whole millisecond — a frame that takes 1.2ms
/// must reserve 2ms or it would expire mid-byte. A floor of 1ms
/// applies at high baud rates where the frame time rounds to zero.
/// `extra_ms` is added unconditionally as the caller's safety margin.
///
/// A baud rate of zero is rejected with [`SerialError::InvalidConfig`].
pub fn frame_timeout_ms(config: &SerialConfig, extra_ms: u32) -> Result<u32, SerialError> {
    if config.baud_rate == 0 {
        return Err(SerialError::InvalidConfig);
    }

    let frame_us = u64::from(config.frame_bits()) * 1_000_000 / u64::from(config.baud_rate);
    let frame_ms = frame_us.div_ceil(1000).max(1) as u32;

    Ok(frame_ms.saturating_add(extra_ms))
}

#[cfg(test)]
mod tests {
    use super::*;
    use hal::serial::{DataBits, Parity, StopBits};
    use pretty_assertions::assert_eq;

    #[test]
    fn standard_9600_8n1_rounds_up_to_two_ms() {
        // 10 bits/frame at 9600 baud is ~1041.67us, which must round
        // up to 2ms, not truncate to 1ms.
        let cfg = SerialConfig::new_8n1(9600);
        assert_eq!(frame_timeout_ms(&cfg, 0), Ok(2));
    }

    #[test]
    fn one_megabaud_hits_the_floor() {
        // 10us/frame rounds to 1ms via the floor.
        let cfg = SerialConfig::new_8n1(1_000_000);
        assert_eq!(frame_timeout_ms(&cfg, 0), Ok(1));
    }

    #[test]
    fn extra_margin_is_added_unconditionally() {
        let cfg = SerialConfig::new_8n1(1_000_000);
        assert_eq!(frame_timeout_ms(&cfg, 5), Ok(6));
    }

    #[test]
    fn absurd_margin_saturates_instead_of_overflowing() {
        let cfg = SerialConfig::new_8n1(9600);
        assert_eq!(frame_timeout_ms(&cfg, u32::MAX), Ok(u32::MAX));
    }

    #[test]
    fn enabling_parity_never_shrinks_the_timeout() {
        for baud in [300, 9600, 115_200, 1_000_000] {
            let none = SerialConfig::new_8n1(baud);
            let even = SerialConfig {
                parity: Parity::Even,
                ..none
            };
            assert!(frame_timeout_ms(&even, 0).unwrap() >= frame_timeout_ms(&none, 0).unwrap());
        }
    }

    #[test]
    fn seven_e_two_counts_eleven_frame_bits() {
        let cfg = SerialConfig {
            baud_rate: 9600,
            data_bits: DataBits::Seven,
            parity: Parity::Even,
            stop_bits: StopBits::Two,
        };
        // 11 bits -> 1145us -> 2ms.
        assert_eq!(frame_timeout_ms(&cfg, 0), Ok(2));
    }

    #[test]
    fn exact_millisecond_frames_do_not_round_up_twice() {
        // 10 bits at 10000 baud is exactly 1ms.
        let cfg = SerialConfig::new_8n1(10_000);
        assert_eq!(frame_timeout_ms(&cfg, 0), Ok(1));
    }

    #[test]
    fn zero_baud_fails_fast() {
        let cfg = SerialConfig::new_8n1(0);
        assert_eq!(frame_timeout_ms(&cfg, 0), Err(SerialError::InvalidConfig));
    }

    #[test]
    fn very_slow_lines_get_proportional_timeouts() {
        // 10 bits at 300 baud is ~33.3ms -> 34ms.
        let cfg = SerialConfig::new_8n1(300);
        assert_eq!(frame_timeout_ms(&cfg, 0), Ok(34));
    }
}
