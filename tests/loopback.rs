//! End-to-end loopback: play a deterministic tone through a scripted
//! endpoint, capture it back, and round-trip the take through the raw store.

use std::sync::atomic::AtomicBool;
use std::time::Duration;

use pcm_stream::mock::MockEndpoint;
use pcm_stream::{
    AudioBuffer, Fault, RecoveryPolicy, StreamTransfer, TransferRequest, signal, store,
};

fn transfer() -> StreamTransfer {
    StreamTransfer::new(RecoveryPolicy {
        max_recoveries: 1000,
        resume_poll: Duration::ZERO,
    })
}

#[test]
fn tone_round_trips_byte_identical_through_a_loopback() {
    let frames = 44100;
    let mut tone = AudioBuffer::new(44100, 2, frames);
    signal::sine_tone(&mut tone, 440.0, 0.5);

    let transfer = transfer();
    let running = AtomicBool::new(true);

    let mut playback = MockEndpoint::playback(2);
    transfer
        .run(
            &mut playback,
            &mut tone,
            &TransferRequest::new(frames, 1024),
            &running,
        )
        .unwrap();
    pcm_stream::drain(&mut playback).unwrap();

    let mut capture = MockEndpoint::capture(2).with_source(playback.into_sink());
    let mut take = AudioBuffer::new(44100, 2, frames);
    transfer
        .run(
            &mut capture,
            &mut take,
            &TransferRequest::new(frames, 1024),
            &running,
        )
        .unwrap();

    assert_eq!(take.len(), frames);
    assert_eq!(take.samples(), tone.samples());
}

#[test]
fn xruns_in_both_directions_leave_the_take_intact() {
    let frames = 8192;
    let mut tone = AudioBuffer::new(48000, 2, frames);
    signal::sine_tone(&mut tone, 1000.0, 0.3);

    let transfer = transfer();
    let running = AtomicBool::new(true);

    // Underrun partway through playback, overrun partway through capture:
    // both recover in place and the data must come through unharmed.
    let mut playback = MockEndpoint::playback(2)
        .accept_next(1000)
        .fault_next(Fault::Underrun)
        .accept_next(500);
    transfer
        .run(
            &mut playback,
            &mut tone,
            &TransferRequest::new(frames, 1024),
            &running,
        )
        .unwrap();
    assert_eq!(playback.prepare_calls, 1);

    let mut capture = MockEndpoint::capture(2)
        .fault_next(Fault::Overrun)
        .accept_next(300)
        .with_source(playback.into_sink());
    let mut take = AudioBuffer::new(48000, 2, frames);
    transfer
        .run(
            &mut capture,
            &mut take,
            &TransferRequest::new(frames, 1024),
            &running,
        )
        .unwrap();
    assert_eq!(capture.prepare_calls, 1);

    assert_eq!(take.samples(), tone.samples());
}

#[test]
fn capture_survives_the_raw_store_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let raw_path = dir.path().join("take.raw");

    let frames = 4410;
    let mut take = AudioBuffer::new(44100, 2, frames);
    signal::white_noise(&mut take, 0.2, 7);
    let stats = signal::analyze(take.samples());

    store::save_raw(&raw_path, &take).unwrap();
    store::save_metadata(&store::metadata_path(&raw_path), &take, &stats).unwrap();

    let restored = store::load_raw(&raw_path, 44100, 2).unwrap();
    assert_eq!(restored.samples(), take.samples());
    assert_eq!(restored.duration(), take.duration());

    let meta = std::fs::read_to_string(store::metadata_path(&raw_path)).unwrap();
    assert!(meta.contains("Sample Rate: 44100 Hz"));
    assert!(meta.contains("Channels: 2"));
}
