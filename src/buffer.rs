//! Fixed-capacity interleaved sample buffer.

use std::time::Duration;

/// An ordered, fixed-capacity sequence of interleaved signed 16-bit samples,
/// grouped into frames (one sample per channel per frame).
///
/// Capacity is fixed at allocation and never changes during a transfer. The
/// fill length tracks how many frames hold valid data: capture transfers
/// advance it, playback transfers read below it. The buffer is exclusively
/// owned by the caller; the transfer loop only borrows it for one call.
#[derive(Debug, Clone)]
pub struct AudioBuffer {
    samples: Vec<i16>,
    sample_rate: u32,
    channels: u32,
    len_frames: usize,
}

impl AudioBuffer {
    /// Allocate a zeroed buffer holding `capacity_frames` frames.
    pub fn new(sample_rate: u32, channels: u32, capacity_frames: usize) -> Self {
        assert!(channels > 0, "channel count must be positive");
        Self {
            samples: vec![0i16; capacity_frames * channels as usize],
            sample_rate,
            channels,
            len_frames: 0,
        }
    }

    /// Wrap existing interleaved samples; the buffer starts fully filled.
    ///
    /// `samples.len()` must be a whole number of frames.
    pub fn from_samples(sample_rate: u32, channels: u32, samples: Vec<i16>) -> Self {
        assert!(channels > 0, "channel count must be positive");
        assert!(
            samples.len() % channels as usize == 0,
            "sample count must be a whole number of frames"
        );
        let len_frames = samples.len() / channels as usize;
        Self {
            samples,
            sample_rate,
            channels,
            len_frames,
        }
    }

    /// Sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Interleaved channels per frame.
    pub fn channels(&self) -> u32 {
        self.channels
    }

    /// Total capacity in frames, fixed at allocation.
    pub fn capacity(&self) -> usize {
        self.samples.len() / self.channels as usize
    }

    /// Current fill length in frames.
    pub fn len(&self) -> usize {
        self.len_frames
    }

    /// True when no frames are filled.
    pub fn is_empty(&self) -> bool {
        self.len_frames == 0
    }

    /// Duration of the filled region at this buffer's sample rate.
    pub fn duration(&self) -> Duration {
        Duration::from_secs_f64(self.len_frames as f64 / self.sample_rate as f64)
    }

    /// The filled samples, interleaved.
    pub fn samples(&self) -> &[i16] {
        &self.samples[..self.len_frames * self.channels as usize]
    }

    /// Mutable view of the filled samples, interleaved.
    pub fn samples_mut(&mut self) -> &mut [i16] {
        &mut self.samples[..self.len_frames * self.channels as usize]
    }

    /// Mutable view of `frames` frames starting at frame `offset`, spanning
    /// filled and unfilled capacity alike.
    pub(crate) fn region_mut(&mut self, offset: usize, frames: usize) -> &mut [i16] {
        let ch = self.channels as usize;
        &mut self.samples[offset * ch..(offset + frames) * ch]
    }

    /// Move the fill cursor. Capture transfers call this as frames land.
    pub(crate) fn set_len(&mut self, frames: usize) {
        debug_assert!(frames <= self.capacity());
        self.len_frames = frames;
    }

    /// Mark the whole capacity as filled (after generating into it).
    pub(crate) fn fill_to_capacity(&mut self) {
        self.len_frames = self.capacity();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frames_and_samples_agree() {
        let buf = AudioBuffer::new(44100, 2, 1024);
        assert_eq!(buf.capacity(), 1024);
        assert_eq!(buf.len(), 0);
        assert!(buf.is_empty());
        assert_eq!(buf.samples().len(), 0);
    }

    #[test]
    fn from_samples_starts_filled() {
        let buf = AudioBuffer::from_samples(48000, 2, vec![1, 2, 3, 4, 5, 6]);
        assert_eq!(buf.len(), 3);
        assert_eq!(buf.capacity(), 3);
        assert_eq!(buf.samples(), &[1, 2, 3, 4, 5, 6]);
    }

    #[test]
    #[should_panic(expected = "whole number of frames")]
    fn from_samples_rejects_ragged_frame() {
        AudioBuffer::from_samples(48000, 2, vec![1, 2, 3]);
    }

    #[test]
    fn duration_uses_rate_and_len() {
        let mut buf = AudioBuffer::new(44100, 2, 44100);
        buf.set_len(22050);
        assert_eq!(buf.duration(), Duration::from_millis(500));
    }

    #[test]
    fn region_spans_unfilled_capacity() {
        let mut buf = AudioBuffer::new(8000, 1, 10);
        buf.region_mut(4, 2).copy_from_slice(&[7, 8]);
        buf.set_len(6);
        assert_eq!(buf.samples(), &[0, 0, 0, 0, 7, 8]);
    }
}
