//! Transfer outcome types.
//!
//! Timeouts and short transfers are a normal part of serial traffic,
//! so they are carried as values rather than faults. Callers branch on
//! them the same way they branch on a byte count.

/// Failure outcomes of a transfer operation.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TransferError {
    /// No byte could be transferred within the bounded wait.
    ///
    /// Expected and frequent: it means "the line went idle", not that
    /// anything is broken.
    NoData,
    /// No buffer was supplied to `read`/`write`.
    NoBuffer,
    /// A buffered write failed partway through.
    Partial {
        /// Bytes successfully sent before the failure.
        sent: usize,
    },
}

impl core::fmt::Display for TransferError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            TransferError::NoData => f.write_str("no transfer within timeout"),
            TransferError::NoBuffer => f.write_str("no buffer supplied"),
            TransferError::Partial { sent } => {
                write!(f, "transfer stopped after {sent} bytes")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_wording_fits_both_directions() {
        // NoData covers a read that saw nothing and a write the device
        // refused, so the message must not presume a direction.
        assert_eq!(TransferError::NoData.to_string(), "no transfer within timeout");
        assert_eq!(
            TransferError::Partial { sent: 3 }.to_string(),
            "transfer stopped after 3 bytes"
        );
    }
}
