//! Raw PCM persistence.
//!
//! A capture is stored as a flat file of little-endian interleaved i16
//! samples, no header, paired with a human-readable `.meta` text file
//! recording the format and summary levels.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result, bail};

use crate::buffer::AudioBuffer;
use crate::signal::LevelStats;

/// Write the buffer's filled frames as flat little-endian samples.
pub fn save_raw(path: &Path, buffer: &AudioBuffer) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create raw PCM file '{}'", path.display()))?;
    let mut writer = BufWriter::new(file);

    for sample in buffer.samples() {
        writer
            .write_all(&sample.to_le_bytes())
            .with_context(|| format!("Failed to write raw PCM file '{}'", path.display()))?;
    }
    writer.flush()?;

    log::info!(
        "Saved {} frames ({} bytes) to {}",
        buffer.len(),
        buffer.samples().len() * 2,
        path.display(),
    );
    Ok(())
}

/// Read a flat little-endian sample file back into a fully-filled buffer.
///
/// The file length must be a whole number of samples and of frames for the
/// given channel count.
pub fn load_raw(path: &Path, sample_rate: u32, channels: u32) -> Result<AudioBuffer> {
    let bytes = fs::read(path)
        .with_context(|| format!("Failed to read raw PCM file '{}'", path.display()))?;

    if bytes.len() % 2 != 0 {
        bail!(
            "Raw PCM file '{}' is truncated mid-sample ({} bytes)",
            path.display(),
            bytes.len(),
        );
    }
    let samples: Vec<i16> = bytes
        .chunks_exact(2)
        .map(|pair| i16::from_le_bytes([pair[0], pair[1]]))
        .collect();
    if samples.len() % channels as usize != 0 {
        bail!(
            "Raw PCM file '{}' holds {} samples, not a whole number of {}-channel frames",
            path.display(),
            samples.len(),
            channels,
        );
    }

    Ok(AudioBuffer::from_samples(sample_rate, channels, samples))
}

/// The side-file path for a raw capture: the raw path with `.meta` appended.
pub fn metadata_path(raw: &Path) -> std::path::PathBuf {
    let mut os = raw.to_path_buf().into_os_string();
    os.push(".meta");
    os.into()
}

/// Write the metadata side file describing a stored capture.
pub fn save_metadata(path: &Path, buffer: &AudioBuffer, stats: &LevelStats) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create metadata file '{}'", path.display()))?;
    let mut writer = BufWriter::new(file);

    writeln!(writer, "Recording Metadata:")?;
    writeln!(writer, "Sample Rate: {} Hz", buffer.sample_rate())?;
    writeln!(writer, "Channels: {}", buffer.channels())?;
    writeln!(writer, "Duration: {:.2} seconds", buffer.duration().as_secs_f64())?;
    writeln!(writer, "Peak Level: {:.2} dB", stats.peak_db())?;
    writeln!(writer, "Average Level: {:.2} dB", stats.average_db())?;
    writeln!(writer, "RMS Level: {:.2} dB", stats.rms_db())?;
    writeln!(writer, "Clipping Instances: {}", stats.clipped_samples)?;
    writer.flush()?;

    log::info!("Saved metadata to {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal;
    use tempfile::tempdir;

    #[test]
    fn raw_file_round_trips() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("take.raw");

        let buffer = AudioBuffer::from_samples(44100, 2, vec![0x1234, -2, 0, 32767, -32768, 7]);
        save_raw(&path, &buffer).unwrap();

        let loaded = load_raw(&path, 44100, 2).unwrap();
        assert_eq!(loaded.samples(), buffer.samples());
        assert_eq!(loaded.len(), buffer.len());
    }

    #[test]
    fn raw_bytes_are_little_endian_interleaved() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("take.raw");

        let buffer = AudioBuffer::from_samples(8000, 1, vec![0x1234, 0x5678]);
        save_raw(&path, &buffer).unwrap();

        let bytes = fs::read(&path).unwrap();
        assert_eq!(bytes, vec![0x34, 0x12, 0x78, 0x56]);
    }

    #[test]
    fn truncated_file_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("take.raw");
        fs::write(&path, [0u8, 1, 2]).unwrap();

        let err = load_raw(&path, 8000, 1).unwrap_err();
        assert!(err.to_string().contains("truncated"));
    }

    #[test]
    fn ragged_frame_count_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("take.raw");
        // Three samples cannot form whole stereo frames.
        fs::write(&path, [0u8; 6]).unwrap();

        let err = load_raw(&path, 8000, 2).unwrap_err();
        assert!(err.to_string().contains("whole number"));
    }

    #[test]
    fn metadata_path_appends_suffix() {
        assert_eq!(
            metadata_path(Path::new("takes/session.raw")),
            Path::new("takes/session.raw.meta"),
        );
    }

    #[test]
    fn metadata_records_format_and_levels() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("take.raw.meta");

        let mut buffer = AudioBuffer::new(44100, 2, 44100);
        signal::sine_tone(&mut buffer, 440.0, 0.5);
        let stats = signal::analyze(buffer.samples());
        save_metadata(&path, &buffer, &stats).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.contains("Sample Rate: 44100 Hz"));
        assert!(text.contains("Channels: 2"));
        assert!(text.contains("Duration: 1.00 seconds"));
        assert!(text.contains("RMS Level:"));
        assert!(text.contains("Clipping Instances: 0"));
    }
}
