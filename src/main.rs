use std::path::Path;

use anyhow::Result;

use pcm_stream::{Session, StreamConfig};

fn main() -> Result<()> {
    env_logger::init();

    // Optional single argument: path to a JSON config file.
    let config = match std::env::args().nth(1) {
        Some(path) => StreamConfig::from_file(Path::new(&path))?,
        None => StreamConfig::default(),
    };

    let session = Session::new(config);
    let report = session.run()?;

    println!("\nAudio Analysis Results:");
    println!("Peak Level: {:.2} dB", report.stats.peak_db());
    println!("Average Level: {:.2} dB", report.stats.average_db());
    println!("RMS Level: {:.2} dB", report.stats.rms_db());
    println!("Clipping Detected: {} instances", report.stats.clipped_samples);
    println!("\nFiles generated:");
    println!("1. {} (raw audio data)", report.raw_path.display());
    println!("2. {} (recording metadata)", report.metadata_path.display());

    Ok(())
}
