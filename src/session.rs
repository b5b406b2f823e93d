//! End-to-end capture/playback session.
//!
//! The full demo flow, once, parameterized: play a test tone, record for
//! the configured duration, analyze levels, persist the take, then play it
//! back with gain applied. One transfer loop drives both directions,
//! sequentially — capture and playback may share a clock domain, so a
//! direction always completes (and drains) before the other starts.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use anyhow::{Context, Result};

use crate::alsa_device;
use crate::buffer::AudioBuffer;
use crate::config::StreamConfig;
use crate::signal::{self, LevelStats};
use crate::store;
use crate::transfer::{self, RecoveryPolicy, StreamTransfer, TransferRequest};

/// What a completed session produced.
#[derive(Debug)]
pub struct SessionReport {
    /// Summary levels of the unprocessed capture.
    pub stats: LevelStats,
    /// Where the raw samples were written.
    pub raw_path: PathBuf,
    /// Where the metadata side file was written.
    pub metadata_path: PathBuf,
    /// Frames captured.
    pub frames_captured: usize,
}

/// Runs one capture/playback session against the configured ALSA devices.
pub struct Session {
    config: StreamConfig,
    transfer: StreamTransfer,
    running: Arc<AtomicBool>,
}

impl Session {
    /// A session over the given configuration.
    pub fn new(config: StreamConfig) -> Self {
        let transfer = StreamTransfer::new(RecoveryPolicy {
            max_recoveries: config.max_recoveries,
            ..RecoveryPolicy::default()
        });
        Self {
            config,
            transfer,
            running: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Shared cancel flag. Clearing it aborts the transfer in flight within
    /// one chunk period; the session then returns the cancellation error.
    pub fn cancel_flag(&self) -> Arc<AtomicBool> {
        self.running.clone()
    }

    /// Run the whole session: tone, capture, analysis, persistence, playback.
    pub fn run(&self) -> Result<SessionReport> {
        self.play_test_tone()?;

        let mut take = self.record()?;
        let stats = signal::analyze(take.samples());
        log::info!(
            "Capture levels: peak {:.2} dB, rms {:.2} dB, {} clipped samples",
            stats.peak_db(),
            stats.rms_db(),
            stats.clipped_samples,
        );

        let raw_path = self.config.output_path.clone();
        let metadata_path = store::metadata_path(&raw_path);
        store::save_raw(&raw_path, &take)?;
        store::save_metadata(&metadata_path, &take, &stats)?;

        signal::apply_gain(take.samples_mut(), self.config.playback_gain);
        self.play_back(&mut take)?;

        Ok(SessionReport {
            stats,
            raw_path,
            metadata_path,
            frames_captured: take.len(),
        })
    }

    fn period_hint(&self) -> Option<usize> {
        if self.config.period_size > 0 {
            Some(self.config.period_size)
        } else {
            None
        }
    }

    fn play_test_tone(&self) -> Result<()> {
        let cfg = &self.config;
        let mut endpoint = alsa_device::open_playback(
            &cfg.playback_device,
            cfg.sample_rate,
            cfg.channels,
            self.period_hint(),
        )?;
        let params = endpoint.params().clone();

        let frames = params.sample_rate as usize * cfg.duration_secs as usize;
        let mut buffer = AudioBuffer::new(params.sample_rate, params.channels, frames);
        signal::sine_tone(&mut buffer, cfg.tone_hz, cfg.tone_amplitude);

        log::info!(
            "Playing {} Hz test tone for {} seconds",
            cfg.tone_hz,
            cfg.duration_secs,
        );
        self.transfer
            .run(
                &mut endpoint,
                &mut buffer,
                &TransferRequest::new(frames, params.period_size),
                &self.running,
            )
            .context("Test tone playback failed")?;
        transfer::drain(&mut endpoint)?;
        Ok(())
    }

    fn record(&self) -> Result<AudioBuffer> {
        let cfg = &self.config;
        let mut endpoint = alsa_device::open_capture(
            &cfg.capture_device,
            cfg.sample_rate,
            cfg.channels,
            self.period_hint(),
        )?;
        let params = endpoint.params().clone();

        let frames = params.sample_rate as usize * cfg.duration_secs as usize;
        let mut buffer = AudioBuffer::new(params.sample_rate, params.channels, frames);

        log::info!(
            "Recording {} seconds from '{}'",
            cfg.duration_secs,
            cfg.capture_device,
        );
        self.transfer
            .run(
                &mut endpoint,
                &mut buffer,
                &TransferRequest::new(frames, params.period_size),
                &self.running,
            )
            .context("Capture failed")?;
        transfer::drain(&mut endpoint)?;
        Ok(buffer)
    }

    fn play_back(&self, take: &mut AudioBuffer) -> Result<()> {
        let cfg = &self.config;
        let mut endpoint = alsa_device::open_playback(
            &cfg.playback_device,
            take.sample_rate(),
            take.channels(),
            self.period_hint(),
        )?;
        let period = endpoint.params().period_size;

        log::info!("Playing back the recording with gain {:.2}", cfg.playback_gain);
        let frames = take.len();
        self.transfer
            .run(
                &mut endpoint,
                take,
                &TransferRequest::new(frames, period),
                &self.running,
            )
            .context("Playback of the recording failed")?;
        transfer::drain(&mut endpoint)?;
        Ok(())
    }
}
