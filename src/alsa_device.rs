//! ALSA PCM endpoints for audio capture and playback.

use alsa::pcm::{Access, Format, HwParams, PCM};
use alsa::ValueOr;
use anyhow::{Context, Result};

use crate::endpoint::{Direction, ResumeState, StreamEndpoint};
use crate::error::Fault;

/// Parameters negotiated with the ALSA hardware.
#[derive(Debug, Clone)]
pub struct DeviceParams {
    /// Actual sample rate after negotiation
    pub sample_rate: u32,
    /// Actual number of channels
    pub channels: u32,
    /// Period size in frames (one frame = channels × sample_width)
    pub period_size: usize,
}

/// A configured ALSA PCM stream in blocking RW-interleaved S16LE mode.
///
/// The device state machine (prepare/resume/drain) is driven through the
/// [`StreamEndpoint`] impl; closing is the `Drop` of the inner handle.
pub struct AlsaEndpoint {
    pcm: PCM,
    direction: Direction,
    params: DeviceParams,
}

/// Open a PCM device for capture (recording).
pub fn open_capture(
    device: &str,
    sample_rate: u32,
    channels: u32,
    period_size: Option<usize>,
) -> Result<AlsaEndpoint> {
    open_pcm(device, Direction::Capture, sample_rate, channels, period_size, "Capture")
}

/// Open a PCM device for playback.
pub fn open_playback(
    device: &str,
    sample_rate: u32,
    channels: u32,
    period_size: Option<usize>,
) -> Result<AlsaEndpoint> {
    open_pcm(
        device,
        Direction::Playback,
        sample_rate,
        channels,
        period_size,
        "Playback",
    )
}

fn open_pcm(
    device: &str,
    direction: Direction,
    sample_rate: u32,
    channels: u32,
    period_size: Option<usize>,
    dir_name: &str,
) -> Result<AlsaEndpoint> {
    let alsa_dir = match direction {
        Direction::Capture => alsa::Direction::Capture,
        Direction::Playback => alsa::Direction::Playback,
    };
    let pcm = PCM::new(device, alsa_dir, false)
        .with_context(|| format!("Failed to open PCM device '{}' for {}", device, dir_name))?;

    // Configure hardware parameters
    {
        let hwp = HwParams::any(&pcm).with_context(|| "Failed to initialize HwParams")?;
        hwp.set_access(Access::RWInterleaved)?;
        hwp.set_format(Format::S16LE)?;
        hwp.set_channels(channels)?;
        hwp.set_rate_near(sample_rate, ValueOr::Nearest)?;
        if let Some(ps) = period_size {
            hwp.set_period_size_near(ps as alsa::pcm::Frames, ValueOr::Nearest)?;
        }
        pcm.hw_params(&hwp)?;
    }

    // Read back actual negotiated parameters
    let (actual_rate, actual_channels, period_size) = {
        let hwp = pcm.hw_params_current()?;
        let rate = hwp.get_rate()?;
        let ch = hwp.get_channels()?;
        let ps = hwp.get_period_size()? as usize;
        (rate, ch, ps)
    };

    let params = DeviceParams {
        sample_rate: actual_rate,
        channels: actual_channels,
        period_size,
    };

    log::info!(
        "ALSA {}: device={}, rate={}, channels={}, period_size={}",
        dir_name,
        device,
        actual_rate,
        actual_channels,
        period_size,
    );

    Ok(AlsaEndpoint {
        pcm,
        direction,
        params,
    })
}

impl AlsaEndpoint {
    /// Parameters the hardware actually granted.
    pub fn params(&self) -> &DeviceParams {
        &self.params
    }

    /// EPIPE is an xrun (which side depends on direction), ESTRPIPE is a
    /// suspend; everything else ends the transfer.
    fn classify(&self, err: alsa::Error) -> Fault {
        match err.errno() {
            libc::EPIPE => match self.direction {
                Direction::Playback => Fault::Underrun,
                Direction::Capture => Fault::Overrun,
            },
            libc::ESTRPIPE => Fault::Suspended,
            errno => Fault::Fatal(errno),
        }
    }
}

impl StreamEndpoint for AlsaEndpoint {
    fn direction(&self) -> Direction {
        self.direction
    }

    fn channels(&self) -> u32 {
        self.params.channels
    }

    fn transfer_chunk(&mut self, buf: &mut [i16]) -> Result<usize, Fault> {
        let io = self.pcm.io_i16().map_err(|e| self.classify(e))?;
        let moved = match self.direction {
            Direction::Playback => io.writei(buf),
            Direction::Capture => io.readi(buf),
        };
        moved.map_err(|e| self.classify(e))
    }

    fn prepare(&mut self) -> Result<(), Fault> {
        self.pcm.prepare().map_err(|e| Fault::Fatal(e.errno()))
    }

    fn resume(&mut self) -> Result<ResumeState, Fault> {
        match self.pcm.resume() {
            Ok(()) => Ok(ResumeState::Ready),
            Err(e) if e.errno() == libc::EAGAIN => Ok(ResumeState::Pending),
            Err(e) => Err(Fault::Fatal(e.errno())),
        }
    }

    fn drain(&mut self) -> Result<(), Fault> {
        self.pcm.drain().map_err(|e| Fault::Fatal(e.errno()))
    }
}
