//! Scripted endpoint for exercising the transfer loop without hardware.
//!
//! Suitable for CI: every outcome is scripted, nothing blocks on a real
//! device. Playback endpoints collect accepted samples into a sink; capture
//! endpoints serve samples from a preloaded source (silence once exhausted,
//! like an idle microphone).

use std::collections::VecDeque;

use crate::endpoint::{Direction, ResumeState, StreamEndpoint};
use crate::error::Fault;

#[derive(Debug, Clone, Copy)]
enum Step {
    /// Accept at most this many frames of the request.
    Accept(usize),
    /// Fail the call with the given fault.
    Fault(Fault),
}

/// A scripted [`StreamEndpoint`].
///
/// With an empty script every call accepts the full request. Queued steps
/// are consumed one per `transfer_chunk` call, so partial accepts and faults
/// can be injected at exact points in a transfer. Call counters let tests
/// assert how often each primitive was hit.
///
/// # Example
///
/// ```
/// use pcm_stream::mock::MockEndpoint;
/// use pcm_stream::{Fault, StreamEndpoint};
///
/// // Accept at most 100 frames, underrun once, then accept everything.
/// let mut endpoint = MockEndpoint::playback(2)
///     .accept_next(100)
///     .fault_next(Fault::Underrun);
///
/// let mut chunk = vec![0i16; 8];
/// assert_eq!(endpoint.transfer_chunk(&mut chunk), Ok(4));
/// assert_eq!(endpoint.transfer_chunk(&mut chunk), Err(Fault::Underrun));
/// ```
pub struct MockEndpoint {
    direction: Direction,
    channels: u32,
    script: VecDeque<Step>,
    resume_script: VecDeque<ResumeState>,
    source: Vec<i16>,
    source_pos: usize,
    sink: Vec<i16>,
    fail_prepare: Option<i32>,
    /// Number of `transfer_chunk` calls issued.
    pub chunk_calls: u32,
    /// Number of `prepare` calls issued.
    pub prepare_calls: u32,
    /// Number of `resume` polls issued.
    pub resume_calls: u32,
    /// Number of `drain` calls issued.
    pub drain_calls: u32,
}

impl MockEndpoint {
    fn new(direction: Direction, channels: u32) -> Self {
        assert!(channels > 0, "channel count must be positive");
        Self {
            direction,
            channels,
            script: VecDeque::new(),
            resume_script: VecDeque::new(),
            source: Vec::new(),
            source_pos: 0,
            sink: Vec::new(),
            fail_prepare: None,
            chunk_calls: 0,
            prepare_calls: 0,
            resume_calls: 0,
            drain_calls: 0,
        }
    }

    /// A playback endpoint; accepted samples accumulate in [`sink`](Self::sink).
    pub fn playback(channels: u32) -> Self {
        Self::new(Direction::Playback, channels)
    }

    /// A capture endpoint; serves silence until a source is loaded.
    pub fn capture(channels: u32) -> Self {
        Self::new(Direction::Capture, channels)
    }

    /// Preload the samples a capture endpoint serves.
    pub fn with_source(mut self, samples: Vec<i16>) -> Self {
        self.source = samples;
        self
    }

    /// Queue a call that accepts at most `frames` of the request.
    pub fn accept_next(mut self, frames: usize) -> Self {
        self.script.push_back(Step::Accept(frames));
        self
    }

    /// Queue a call that fails with `fault`.
    pub fn fault_next(mut self, fault: Fault) -> Self {
        self.script.push_back(Step::Fault(fault));
        self
    }

    /// Queue the answers successive `resume` polls return.
    pub fn resume_sequence(mut self, states: &[ResumeState]) -> Self {
        self.resume_script.extend(states.iter().copied());
        self
    }

    /// Make `prepare` fail with the given errno.
    pub fn failing_prepare(mut self, errno: i32) -> Self {
        self.fail_prepare = Some(errno);
        self
    }

    /// Samples accepted so far on a playback endpoint, interleaved.
    pub fn sink(&self) -> &[i16] {
        &self.sink
    }

    /// Consume the endpoint and take its sink.
    pub fn into_sink(self) -> Vec<i16> {
        self.sink
    }
}

impl StreamEndpoint for MockEndpoint {
    fn direction(&self) -> Direction {
        self.direction
    }

    fn channels(&self) -> u32 {
        self.channels
    }

    fn transfer_chunk(&mut self, buf: &mut [i16]) -> Result<usize, Fault> {
        self.chunk_calls += 1;
        let ch = self.channels as usize;
        let requested = buf.len() / ch;

        let step = self.script.pop_front().unwrap_or(Step::Accept(usize::MAX));
        match step {
            Step::Fault(fault) => Err(fault),
            Step::Accept(cap) => {
                let frames = requested.min(cap);
                let samples = frames * ch;
                match self.direction {
                    Direction::Playback => self.sink.extend_from_slice(&buf[..samples]),
                    Direction::Capture => {
                        for slot in buf[..samples].iter_mut() {
                            *slot = self.source.get(self.source_pos).copied().unwrap_or(0);
                            self.source_pos += 1;
                        }
                    }
                }
                Ok(frames)
            }
        }
    }

    fn prepare(&mut self) -> Result<(), Fault> {
        self.prepare_calls += 1;
        match self.fail_prepare {
            Some(errno) => Err(Fault::Fatal(errno)),
            None => Ok(()),
        }
    }

    fn resume(&mut self) -> Result<ResumeState, Fault> {
        self.resume_calls += 1;
        Ok(self.resume_script.pop_front().unwrap_or(ResumeState::Ready))
    }

    fn drain(&mut self) -> Result<(), Fault> {
        self.drain_calls += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn playback_collects_accepted_samples() {
        let mut ep = MockEndpoint::playback(2);
        let mut buf = vec![1i16, 2, 3, 4];
        assert_eq!(ep.transfer_chunk(&mut buf), Ok(2));
        assert_eq!(ep.sink(), &[1, 2, 3, 4]);
    }

    #[test]
    fn capture_serves_source_then_silence() {
        let mut ep = MockEndpoint::capture(1).with_source(vec![5, 6]);
        let mut buf = vec![0i16; 4];
        assert_eq!(ep.transfer_chunk(&mut buf), Ok(4));
        assert_eq!(buf, vec![5, 6, 0, 0]);
    }

    #[test]
    fn script_caps_and_faults_in_order() {
        let mut ep = MockEndpoint::playback(1)
            .accept_next(1)
            .fault_next(Fault::Underrun);
        let mut buf = vec![9i16, 9, 9];
        assert_eq!(ep.transfer_chunk(&mut buf), Ok(1));
        assert_eq!(ep.transfer_chunk(&mut buf), Err(Fault::Underrun));
        // Script exhausted: back to accepting everything.
        assert_eq!(ep.transfer_chunk(&mut buf), Ok(3));
        assert_eq!(ep.chunk_calls, 3);
    }

    #[test]
    fn resume_script_then_ready() {
        let mut ep = MockEndpoint::capture(1).resume_sequence(&[ResumeState::Pending]);
        assert_eq!(ep.resume(), Ok(ResumeState::Pending));
        assert_eq!(ep.resume(), Ok(ResumeState::Ready));
        assert_eq!(ep.resume_calls, 2);
    }
}
