//! Runtime configuration for a capture/playback session.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Session configuration.
///
/// Rate, channels and period size are requests; the hardware may negotiate
/// nearby values, which the session reads back from the opened endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamConfig {
    /// ALSA capture device name (e.g. "default", "plughw:0,0").
    pub capture_device: String,
    /// ALSA playback device name.
    pub playback_device: String,
    /// Desired sample rate in Hz.
    pub sample_rate: u32,
    /// Desired channel count.
    pub channels: u32,
    /// Desired period size in frames (0 = let the driver decide).
    pub period_size: usize,
    /// Capture and tone duration in seconds.
    pub duration_secs: u32,
    /// Test tone frequency in Hz.
    pub tone_hz: f64,
    /// Test tone amplitude, linear full-scale.
    pub tone_amplitude: f64,
    /// Gain applied to the recording before playback.
    pub playback_gain: f32,
    /// Recovery ceiling per transfer call.
    pub max_recoveries: u32,
    /// Where the raw capture is written; metadata lands beside it.
    pub output_path: PathBuf,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            capture_device: "default".to_string(),
            playback_device: "default".to_string(),
            sample_rate: 44100,
            channels: 2,
            period_size: 1024,
            duration_secs: 5,
            tone_hz: 440.0,
            tone_amplitude: 0.5,
            playback_gain: 1.2,
            max_recoveries: 1000,
            output_path: PathBuf::from("recording.raw"),
        }
    }
}

impl StreamConfig {
    /// Load configuration from a JSON file; absent fields take defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
        serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config file '{}'", path.display()))
    }

    /// Frames covered by the configured duration at the desired rate.
    pub fn duration_frames(&self) -> usize {
        self.sample_rate as usize * self.duration_secs as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn defaults_describe_a_stereo_cd_rate_session() {
        let config = StreamConfig::default();
        assert_eq!(config.sample_rate, 44100);
        assert_eq!(config.channels, 2);
        assert_eq!(config.duration_frames(), 220500);
    }

    #[test]
    fn partial_file_overrides_keep_defaults_elsewhere() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"sample_rate": 48000, "duration_secs": 2}}"#).unwrap();

        let config = StreamConfig::from_file(file.path()).unwrap();
        assert_eq!(config.sample_rate, 48000);
        assert_eq!(config.duration_secs, 2);
        assert_eq!(config.channels, 2);
        assert_eq!(config.capture_device, "default");
    }

    #[test]
    fn malformed_file_reports_its_path() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let err = StreamConfig::from_file(file.path()).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }
}
