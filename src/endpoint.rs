//! The device endpoint seam consumed by the transfer loop.

use crate::error::Fault;

/// Stream direction of a PCM endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Device produces frames, the application consumes them.
    Capture,
    /// Application produces frames, the device consumes them.
    Playback,
}

/// Answer of a resume poll after [`Fault::Suspended`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeState {
    /// The device is back; re-prepare and continue.
    Ready,
    /// Resumption is still in progress; poll again later.
    Pending,
}

/// A configured, blocking PCM endpoint.
///
/// Implementations wrap real hardware ([`AlsaEndpoint`](crate::AlsaEndpoint))
/// or a scripted test double ([`MockEndpoint`](crate::mock::MockEndpoint)).
/// Format, rate and channel count are fixed when the endpoint is opened;
/// the transfer loop refuses endpoints that disagree with its buffer.
pub trait StreamEndpoint {
    /// Direction this endpoint was opened with.
    fn direction(&self) -> Direction;

    /// Interleaved channels per frame.
    fn channels(&self) -> u32;

    /// Move up to `buf.len() / channels` frames between `buf` and the device,
    /// blocking until at least one frame moves or a fault occurs.
    ///
    /// Playback endpoints consume from `buf`; capture endpoints fill it.
    /// Returns the number of frames actually moved, which may be less than
    /// requested, or zero when the device is flow-controlling.
    fn transfer_chunk(&mut self, buf: &mut [i16]) -> Result<usize, Fault>;

    /// Reset the device state machine to ready after an xrun.
    fn prepare(&mut self) -> Result<(), Fault>;

    /// Poll resumption progress after [`Fault::Suspended`].
    fn resume(&mut self) -> Result<ResumeState, Fault>;

    /// Block until every frame already accepted has been played out
    /// (playback), or stop the stream so no further data arrives (capture).
    fn drain(&mut self) -> Result<(), Fault>;
}
