//! The resilient transfer loop.
//!
//! Moves an exact number of frames between an [`AudioBuffer`] and a
//! [`StreamEndpoint`] in period-sized chunks, recovering in place from
//! xruns and suspend. Direction-agnostic: the same loop drives capture
//! and playback, the endpoint decides which way samples flow.

use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use crate::buffer::AudioBuffer;
use crate::endpoint::{Direction, ResumeState, StreamEndpoint};
use crate::error::{Fault, TransferError};

/// How aggressively a transfer recovers from transient faults.
#[derive(Debug, Clone)]
pub struct RecoveryPolicy {
    /// Total recoveries allowed per transfer call before it aborts with
    /// [`TransferError::RetryLimitExceeded`]. Counts xruns and suspends
    /// alike, with no reset on progress.
    pub max_recoveries: u32,
    /// Interval between resume polls while the device is suspended.
    pub resume_poll: Duration,
}

impl Default for RecoveryPolicy {
    fn default() -> Self {
        Self {
            max_recoveries: 1000,
            resume_poll: Duration::from_secs(1),
        }
    }
}

/// The parameters of one transfer: a frame range within the buffer and the
/// chunk granularity of the underlying device calls.
#[derive(Debug, Clone)]
pub struct TransferRequest {
    /// First frame of the buffer region.
    pub offset: usize,
    /// Frames to move. Zero is a no-op that returns immediately.
    pub frames: usize,
    /// Frames requested per device call, normally the negotiated period
    /// size. Must be positive.
    pub period: usize,
}

impl TransferRequest {
    /// A request for `frames` frames from the start of the buffer.
    pub fn new(frames: usize, period: usize) -> Self {
        Self {
            offset: 0,
            frames,
            period,
        }
    }
}

/// Runs whole transfers against an endpoint under a [`RecoveryPolicy`].
#[derive(Debug, Default)]
pub struct StreamTransfer {
    policy: RecoveryPolicy,
}

impl StreamTransfer {
    /// A transfer runner with the given recovery policy.
    pub fn new(policy: RecoveryPolicy) -> Self {
        Self { policy }
    }

    /// Move exactly `request.frames` frames between `buffer` and `endpoint`.
    ///
    /// Succeeds only when the cumulative count of frames moved equals the
    /// request; each device call is bounded to the remaining count, so the
    /// transfer never moves more. Transient faults (xrun, suspend) are
    /// recovered in place and do not surface. On failure the buffer prefix
    /// covering the frames already moved is valid and the remainder is
    /// untouched; the error reports that count.
    ///
    /// `running` is the cooperative cancel flag, checked once before every
    /// device call; clearing it aborts with [`TransferError::Cancelled`]
    /// within one chunk period.
    pub fn run(
        &self,
        endpoint: &mut dyn StreamEndpoint,
        buffer: &mut AudioBuffer,
        request: &TransferRequest,
        running: &AtomicBool,
    ) -> Result<(), TransferError> {
        if endpoint.channels() != buffer.channels() {
            return Err(TransferError::ChannelMismatch {
                endpoint: endpoint.channels(),
                buffer: buffer.channels(),
            });
        }
        if request.period == 0 {
            return Err(TransferError::BadRequest("period size must be positive"));
        }
        if request.offset + request.frames > buffer.capacity() {
            return Err(TransferError::BadRequest(
                "request range exceeds buffer capacity",
            ));
        }
        if request.frames == 0 {
            return Ok(());
        }

        let is_capture = endpoint.direction() == Direction::Capture;
        let mut done = 0usize;
        let mut recoveries = 0u32;

        while done < request.frames {
            if !running.load(Ordering::Relaxed) {
                log::info!("transfer cancelled after {} frames", done);
                return Err(TransferError::Cancelled { frames_done: done });
            }

            let want = (request.frames - done).min(request.period);
            let outcome = endpoint.transfer_chunk(buffer.region_mut(request.offset + done, want));
            match outcome {
                Ok(moved) => {
                    // Zero frames moved means the device is flow-controlling;
                    // the same range is retried, it is not completion.
                    done += moved.min(want);
                    if is_capture {
                        let filled = request.offset + done;
                        if filled > buffer.len() {
                            buffer.set_len(filled);
                        }
                    }
                }
                Err(fault) => self.recover(endpoint, fault, &mut recoveries, done)?,
            }
        }

        Ok(())
    }

    /// Bring the endpoint back to a ready state after `fault`, or abort.
    ///
    /// The cursor is untouched: the caller retries the same remaining range.
    fn recover(
        &self,
        endpoint: &mut dyn StreamEndpoint,
        fault: Fault,
        recoveries: &mut u32,
        frames_done: usize,
    ) -> Result<(), TransferError> {
        match fault {
            Fault::Fatal(errno) => {
                log::error!("unrecoverable PCM error (errno {}), aborting", errno);
                return Err(TransferError::DeviceFatal { errno, frames_done });
            }
            Fault::Suspended => {
                log::warn!("PCM device suspended, polling resume");
                loop {
                    match endpoint.resume() {
                        Ok(ResumeState::Ready) => break,
                        Ok(ResumeState::Pending) => thread::sleep(self.policy.resume_poll),
                        // Resume refused outright: fall back to a fresh prepare.
                        Err(_) => break,
                    }
                }
            }
            Fault::Underrun | Fault::Overrun => {
                log::warn!("PCM fault: {}, recovering...", fault);
            }
        }

        *recoveries += 1;
        if *recoveries > self.policy.max_recoveries {
            log::error!(
                "recovery limit ({}) exceeded, giving up after {} frames",
                self.policy.max_recoveries,
                frames_done,
            );
            return Err(TransferError::RetryLimitExceeded {
                limit: self.policy.max_recoveries,
                frames_done,
            });
        }

        endpoint.prepare().map_err(|e| {
            log::error!("failed to re-prepare PCM: {}", e);
            TransferError::DeviceFatal {
                errno: e.errno(),
                frames_done,
            }
        })
    }
}

/// Block until every frame already accepted by the device has been played
/// out (playback), or the stream has stopped producing (capture).
///
/// A separate call rather than part of [`StreamTransfer::run`], so several
/// transfers can be issued before draining once.
pub fn drain(endpoint: &mut dyn StreamEndpoint) -> Result<(), TransferError> {
    endpoint.drain().map_err(|e| TransferError::DeviceFatal {
        errno: e.errno(),
        frames_done: 0,
    })
}
