use super::*;
use crate::synthetic::{alternating_strums, SyntheticSpec};

fn ramp_motion(duration_secs: f64, rate_hz: f64) -> (Vec<f64>, Vec<f64>) {
    let count = (duration_secs * rate_hz) as usize;
    let timestamps: Vec<f64> = (0..count).map(|i| i as f64 / rate_hz).collect();
    let values = timestamps.iter().map(|t| t / duration_secs).collect();
    (values, timestamps)
}

#[test]
fn test_single_burst_on_rising_motion_is_an_upstroke() {
    let spec = SyntheticSpec {
        duration_secs: 1.0,
        ..SyntheticSpec::default()
    }
    .with_strums(vec![(0.5, StrumDirection::Up)]);
    let waveform = spec.audio();
    let (values, timestamps) = ramp_motion(1.0, 100.0);

    let estimate = classify_example(
        &waveform.samples,
        waveform.sample_rate,
        &values,
        &timestamps,
        &AppConfig::default(),
    )
    .unwrap();

    assert_eq!(estimate.up.len(), 1, "estimate: {:?}", estimate);
    assert!((estimate.up[0] - 0.5).abs() < 0.1);
    assert!(estimate.down.is_empty());
}

#[test]
fn test_alternating_strums_are_recovered() {
    let spec = SyntheticSpec::default();
    let example = spec.build();

    let estimate = classify_example(
        &example.waveform.samples,
        example.waveform.sample_rate,
        &example.motion.values,
        &example.motion.timestamps,
        &AppConfig::default(),
    )
    .unwrap();

    assert_eq!(estimate.down.len(), 3, "estimate: {:?}", estimate);
    assert_eq!(estimate.up.len(), 2, "estimate: {:?}", estimate);
    for (found, expected) in estimate.down.iter().zip([0.5, 1.5, 2.5]) {
        assert!((found - expected).abs() < 0.1, "{found} vs {expected}");
    }
    for (found, expected) in estimate.up.iter().zip([1.0, 2.0]) {
        assert!((found - expected).abs() < 0.1, "{found} vs {expected}");
    }
}

#[test]
fn test_every_onset_is_classified_exactly_once() {
    let config = AppConfig::default();
    let spec = SyntheticSpec::default().with_strums(alternating_strums(6, 0.3, 0.4));
    let example = spec.build();
    let detector = StrumDetector::new(example.waveform.sample_rate, &config);

    let onsets = detector.onset_detector().detect(&example.waveform.samples);
    let estimate = detector.detect(
        &example.waveform.samples,
        &example.motion.values,
        &example.motion.timestamps,
    );

    assert_eq!(estimate.len(), onsets.len());
    let merged: Vec<f64> = estimate.merged().into_iter().map(|(t, _)| t).collect();
    assert_eq!(merged, onsets);
}

#[test]
fn test_silence_produces_empty_estimate() {
    let (values, timestamps) = ramp_motion(1.0, 100.0);
    let estimate = classify_example(
        &vec![0.0; 22_050],
        22_050,
        &values,
        &timestamps,
        &AppConfig::default(),
    )
    .unwrap();
    assert!(estimate.is_empty());
}

#[test]
fn test_precondition_errors() {
    let config = AppConfig::default();
    assert_eq!(
        classify_example(&[], 22_050, &[1.0], &[0.0], &config),
        Err(AnalysisError::EmptyWaveform)
    );
    assert_eq!(
        classify_example(&[0.0], 0, &[1.0], &[0.0], &config),
        Err(AnalysisError::InvalidSampleRate { sample_rate: 0 })
    );
    assert_eq!(
        classify_example(&[0.0], 22_050, &[], &[], &config),
        Err(AnalysisError::EmptyMotion)
    );
    assert_eq!(
        classify_example(&[0.0], 22_050, &[1.0, 2.0], &[0.0], &config),
        Err(AnalysisError::MotionLengthMismatch {
            values: 2,
            timestamps: 1
        })
    );
}

#[test]
fn test_direction_codes() {
    assert_eq!(StrumDirection::from_code("U"), Some(StrumDirection::Up));
    assert_eq!(StrumDirection::from_code("D"), Some(StrumDirection::Down));
    assert_eq!(StrumDirection::from_code("x"), None);
    assert_eq!(StrumDirection::Up.code(), 'U');
}

#[test]
fn test_merged_orders_across_directions() {
    let estimate = StrumEstimate {
        up: vec![1.0, 3.0],
        down: vec![0.5, 2.0],
    };
    let merged = estimate.merged();
    assert_eq!(
        merged,
        vec![
            (0.5, StrumDirection::Down),
            (1.0, StrumDirection::Up),
            (2.0, StrumDirection::Down),
            (3.0, StrumDirection::Up),
        ]
    );
}
