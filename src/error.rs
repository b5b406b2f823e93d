//! Error types for PCM transfers.
//!
//! Faults are split into two layers: [`Fault`] is the outcome of a single
//! device call (the transient set plus fatal), and [`TransferError`] is what
//! a whole transfer reports to the caller once recovery is exhausted or
//! impossible. Transient faults that recover in place never surface.

/// Outcome of one failed device call.
///
/// Produced by [`StreamEndpoint::transfer_chunk`](crate::StreamEndpoint::transfer_chunk)
/// and consumed immediately by the recovery loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Fault {
    /// Playback starved the device (EPIPE on a playback stream).
    #[error("buffer underrun")]
    Underrun,

    /// Capture overflowed the device (EPIPE on a capture stream).
    #[error("buffer overrun")]
    Overrun,

    /// Device temporarily unavailable (ESTRPIPE), e.g. system suspend.
    #[error("device suspended")]
    Suspended,

    /// Unrecoverable device error carrying the raw errno.
    #[error("device error (errno {0})")]
    Fatal(i32),
}

impl Fault {
    /// The underlying errno for this fault.
    pub fn errno(&self) -> i32 {
        match self {
            Fault::Underrun | Fault::Overrun => libc::EPIPE,
            Fault::Suspended => libc::ESTRPIPE,
            Fault::Fatal(errno) => *errno,
        }
    }
}

/// Failure of a whole transfer call.
///
/// Every variant that aborts mid-stream carries the number of frames already
/// moved, so the caller can resume or discard the partial take. The buffer
/// prefix up to that count is valid; nothing past it was touched.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransferError {
    /// The recovery ceiling was hit before the transfer completed.
    #[error("recovery retry limit ({limit}) exceeded after {frames_done} frames")]
    RetryLimitExceeded {
        /// The configured ceiling that was exceeded.
        limit: u32,
        /// Frames successfully moved before giving up.
        frames_done: usize,
    },

    /// The device reported an error outside the recoverable set, or refused
    /// to re-prepare after a fault.
    #[error("device failed (errno {errno}) after {frames_done} frames")]
    DeviceFatal {
        /// Raw errno from the device.
        errno: i32,
        /// Frames successfully moved before the failure.
        frames_done: usize,
    },

    /// The cancel flag was cleared mid-transfer.
    #[error("transfer cancelled after {frames_done} frames")]
    Cancelled {
        /// Frames successfully moved before cancellation.
        frames_done: usize,
    },

    /// The request is malformed (zero period, range past the buffer end).
    /// Refused before any device call.
    #[error("bad transfer request: {0}")]
    BadRequest(&'static str),

    /// Endpoint and buffer disagree on the channel count.
    /// Refused before any device call.
    #[error("endpoint is configured for {endpoint} channels but the buffer holds {buffer}")]
    ChannelMismatch {
        /// Channels the endpoint was configured with.
        endpoint: u32,
        /// Channels the buffer was allocated with.
        buffer: u32,
    },
}

impl TransferError {
    /// Frames moved before the failure (zero for requests refused up front).
    pub fn frames_done(&self) -> usize {
        match self {
            TransferError::RetryLimitExceeded { frames_done, .. }
            | TransferError::DeviceFatal { frames_done, .. }
            | TransferError::Cancelled { frames_done } => *frames_done,
            TransferError::BadRequest(_) | TransferError::ChannelMismatch { .. } => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fault_errno_maps_to_posix_codes() {
        assert_eq!(Fault::Underrun.errno(), libc::EPIPE);
        assert_eq!(Fault::Overrun.errno(), libc::EPIPE);
        assert_eq!(Fault::Suspended.errno(), libc::ESTRPIPE);
        assert_eq!(Fault::Fatal(libc::EIO).errno(), libc::EIO);
    }

    #[test]
    fn transfer_error_reports_frames_done() {
        let err = TransferError::DeviceFatal {
            errno: libc::EIO,
            frames_done: 512,
        };
        assert_eq!(err.frames_done(), 512);
        assert_eq!(TransferError::BadRequest("period size must be positive").frames_done(), 0);
    }

    #[test]
    fn display_carries_context() {
        let err = TransferError::RetryLimitExceeded {
            limit: 1000,
            frames_done: 42,
        };
        assert_eq!(
            err.to_string(),
            "recovery retry limit (1000) exceeded after 42 frames"
        );
    }
}
