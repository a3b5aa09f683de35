mod common;

use beatgrid::audio::decode::decode_file;
use beatgrid::{analyze_file, AnalysisConfig, AnalysisError};
use common::*;
use std::path::PathBuf;

fn temp_path(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("beatgrid-{}-{}", std::process::id(), name))
}

fn write_stereo_wav(path: &PathBuf, left: &[f32], right: &[f32]) {
    let spec = hound::WavSpec {
        channels: 2,
        sample_rate: SR,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec).expect("create wav");
    for (&l, &r) in left.iter().zip(right) {
        writer.write_sample((l * i16::MAX as f32) as i16).unwrap();
        writer.write_sample((r * i16::MAX as f32) as i16).unwrap();
    }
    writer.finalize().unwrap();
}

#[test]
fn decodes_planar_channels() {
    let path = temp_path("planar.wav");
    let left = vec![0.5f32; 4410];
    let right = vec![-0.25f32; 4410];
    write_stereo_wav(&path, &left, &right);

    let buffer = decode_file(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(buffer.sample_rate(), SR);
    assert_eq!(buffer.channel_count(), 2);
    assert_eq!(buffer.len(), 4410);
    assert!(buffer.channel(0).unwrap().iter().all(|s| (s - 0.5).abs() < 1e-3));
    assert!(buffer.channel(1).unwrap().iter().all(|s| (s + 0.25).abs() < 1e-3));
}

#[test]
fn analyzes_a_wav_file() {
    let path = temp_path("clicks.wav");
    let clicks = gen_click_track(128.0, SR, 30.0, 0.0);
    write_stereo_wav(&path, &clicks, &clicks);

    let result = analyze_file(&path, &AnalysisConfig::default());
    std::fs::remove_file(&path).ok();

    let result = result.unwrap();
    assert_bpm(result.bpm, 128.0, 0.5);
    assert_eq!(result.sample_rate, SR);
    assert!((result.duration - 30.0).abs() < 1e-3);
}

#[test]
fn missing_file_is_incomplete() {
    let err = analyze_file(&temp_path("missing.wav"), &AnalysisConfig::default()).unwrap_err();
    assert!(matches!(err, AnalysisError::AnalysisIncomplete(_)));
}

#[test]
fn undecodable_file_is_incomplete() {
    let path = temp_path("garbage.wav");
    std::fs::write(&path, b"this is not audio at all").unwrap();
    let err = decode_file(&path).unwrap_err();
    std::fs::remove_file(&path).ok();
    assert!(matches!(err, AnalysisError::AnalysisIncomplete(_)));
}

#[test]
fn invalid_config_is_rejected_before_decoding() {
    let cfg = AnalysisConfig {
        threshold_step: -0.05,
        ..Default::default()
    };
    let err = analyze_file(&temp_path("missing.wav"), &cfg).unwrap_err();
    assert!(matches!(err, AnalysisError::InvalidParameter(_)));
}
