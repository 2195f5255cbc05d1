/// Integration tests for the hotword detector
///
/// Exercises the full path from model registration through detection
/// dispatch, with a scripted engine for exact code sequences and the
/// energy-based mock engine for synthetic audio streams.

use hotword_detector::{
    AudioSample, DetectionEngine, DetectionEvent, DetectorConfig, DetectorError,
    HotwordDetector, HotwordModel, MockEngine, ModelRegistry, RegistryError, CODE_ERROR,
    CODE_NOISE, CODE_SILENCE,
};
use std::collections::VecDeque;
use tempfile::NamedTempFile;

/// Engine that replays a fixed sequence of detection codes.
struct ScriptedEngine {
    codes: VecDeque<i32>,
    num_hotwords: usize,
    sensitivity: String,
    audio_gain: f32,
}

impl ScriptedEngine {
    fn new(num_hotwords: usize, codes: &[i32]) -> Self {
        Self {
            codes: codes.iter().copied().collect(),
            num_hotwords,
            sensitivity: "0.5".to_string(),
            audio_gain: 1.0,
        }
    }
}

impl DetectionEngine for ScriptedEngine {
    fn run_detection(&mut self, _samples: &[AudioSample]) -> i32 {
        self.codes.pop_front().unwrap_or(CODE_SILENCE)
    }

    fn reset(&mut self) {
        self.codes.clear();
    }

    fn set_sensitivity(&mut self, sensitivity: &str) {
        self.sensitivity = sensitivity.to_string();
    }

    fn sensitivity(&self) -> String {
        self.sensitivity.clone()
    }

    fn set_audio_gain(&mut self, gain: f32) {
        self.audio_gain = gain;
    }

    fn update_model(&mut self) {}

    fn num_hotwords(&self) -> usize {
        self.num_hotwords
    }

    fn sample_rate(&self) -> u32 {
        16_000
    }

    fn num_channels(&self) -> u16 {
        1
    }

    fn bits_per_sample(&self) -> u16 {
        16
    }
}

/// Registry with lookup table ["alexa", "ok_google", "hey_google"].
fn three_hotword_registry() -> (ModelRegistry, Vec<NamedTempFile>) {
    let a = NamedTempFile::new().expect("temp model file");
    let b = NamedTempFile::new().expect("temp model file");

    let mut registry = ModelRegistry::new();
    registry
        .add(HotwordModel::new(a.path(), "alexa").with_sensitivity("0.5"))
        .expect("register model A");
    registry
        .add(HotwordModel::new(b.path(), vec!["ok_google", "hey_google"]))
        .expect("register model B");

    (registry, vec![a, b])
}

fn generate_tone(frequency: f32, num_samples: usize, amplitude: f32) -> Vec<i16> {
    (0..num_samples)
        .map(|i| {
            let t = i as f32 / 16_000.0;
            let sample = amplitude * (2.0 * std::f32::consts::PI * frequency * t).sin();
            (sample * i16::MAX as f32) as i16
        })
        .collect()
}

#[tokio::test]
async fn test_two_model_scenario() {
    let (registry, _files) = three_hotword_registry();
    let resource = NamedTempFile::new().expect("temp resource");

    assert_eq!(registry.num_hotwords(), 3);

    let engine = ScriptedEngine::new(3, &[2, CODE_SILENCE, CODE_NOISE, 4]);
    let config = DetectorConfig::new(resource.path(), registry);
    let detector = HotwordDetector::new(Box::new(engine), config).expect("detector");

    let buffer = vec![0i16; 2048];

    // Code 2 selects the second entry of the flattened table
    assert_eq!(detector.process_audio(&buffer).await.unwrap(), 2);
    assert_eq!(
        detector.try_recv_event().await,
        Some(DetectionEvent::Hotword("ok_google".to_string()))
    );

    assert_eq!(detector.process_audio(&buffer).await.unwrap(), CODE_SILENCE);
    assert_eq!(detector.try_recv_event().await, Some(DetectionEvent::Silence));

    assert_eq!(detector.process_audio(&buffer).await.unwrap(), CODE_NOISE);
    assert_eq!(detector.try_recv_event().await, Some(DetectionEvent::Noise));

    // Code 4 points past the 3-entry table and must fail the call
    let result = detector.process_audio(&buffer).await;
    assert!(matches!(
        result,
        Err(DetectorError::Registry(RegistryError::IndexOutOfBounds {
            index: 3,
            len: 3
        }))
    ));
    assert_eq!(detector.try_recv_event().await, None);
}

#[tokio::test]
async fn test_count_mismatch_rejected_before_audio() {
    let (registry, _files) = three_hotword_registry();
    let resource = NamedTempFile::new().expect("temp resource");

    let engine = ScriptedEngine::new(5, &[1]);
    let config = DetectorConfig::new(resource.path(), registry);

    match HotwordDetector::new(Box::new(engine), config) {
        Err(DetectorError::HotwordCountMismatch { engine, registry }) => {
            assert_eq!(engine, 5);
            assert_eq!(registry, 3);
        }
        _ => panic!("Expected HotwordCountMismatch"),
    }
}

#[tokio::test]
async fn test_one_event_per_buffer() {
    let (registry, _files) = three_hotword_registry();
    let resource = NamedTempFile::new().expect("temp resource");

    let codes = [CODE_SILENCE, CODE_NOISE, 1, CODE_ERROR, 3, CODE_SILENCE];
    let engine = ScriptedEngine::new(3, &codes);
    let config = DetectorConfig::new(resource.path(), registry);
    let detector = HotwordDetector::new(Box::new(engine), config).expect("detector");

    let buffer = vec![0i16; 2048];
    for _ in 0..codes.len() {
        detector.process_audio(&buffer).await.unwrap();
    }

    let mut events = Vec::new();
    while let Some(event) = detector.try_recv_event().await {
        events.push(event);
    }

    assert_eq!(
        events,
        vec![
            DetectionEvent::Silence,
            DetectionEvent::Noise,
            DetectionEvent::Hotword("alexa".to_string()),
            DetectionEvent::Error,
            DetectionEvent::Hotword("hey_google".to_string()),
            DetectionEvent::Silence,
        ]
    );

    let stats = detector.stats().await;
    assert_eq!(stats.buffers_processed, codes.len() as u64);
    assert_eq!(stats.hotwords_detected, 2);
}

#[tokio::test]
async fn test_error_event_does_not_stop_the_stream() {
    let (registry, _files) = three_hotword_registry();
    let resource = NamedTempFile::new().expect("temp resource");

    let engine = ScriptedEngine::new(3, &[CODE_ERROR, CODE_ERROR, 1]);
    let config = DetectorConfig::new(resource.path(), registry);
    let detector = HotwordDetector::new(Box::new(engine), config).expect("detector");

    let buffer = vec![0i16; 2048];
    for _ in 0..3 {
        assert!(detector.process_audio(&buffer).await.is_ok());
    }

    assert_eq!(detector.try_recv_event().await, Some(DetectionEvent::Error));
    assert_eq!(detector.try_recv_event().await, Some(DetectionEvent::Error));
    assert_eq!(
        detector.try_recv_event().await,
        Some(DetectionEvent::Hotword("alexa".to_string()))
    );
}

#[tokio::test]
async fn test_mock_engine_end_to_end() {
    let model = NamedTempFile::new().expect("temp model file");
    let resource = NamedTempFile::new().expect("temp resource");

    let mut registry = ModelRegistry::new();
    registry
        .add(HotwordModel::new(model.path(), "computer"))
        .expect("register model");

    let engine = MockEngine::new(resource.path(), registry.num_hotwords()).expect("engine");
    let config = DetectorConfig::new(resource.path(), registry);
    let detector = HotwordDetector::new(Box::new(engine), config).expect("detector");

    // Silence, then a loud tone, then silence again
    let mut audio: Vec<i16> = vec![0; 4096];
    audio.extend(generate_tone(200.0, 8192, 0.8));
    audio.extend(vec![0i16; 4096]);

    for chunk in audio.chunks(2048) {
        detector.process_audio(chunk).await.expect("process chunk");
    }

    let mut events = Vec::new();
    while let Some(event) = detector.try_recv_event().await {
        events.push(event);
    }

    assert_eq!(events.len(), audio.len() / 2048);
    assert_eq!(events.first(), Some(&DetectionEvent::Silence));
    assert!(events.contains(&DetectionEvent::Hotword("computer".to_string())));
    assert_eq!(events.last(), Some(&DetectionEvent::Silence));
}

#[tokio::test]
async fn test_audio_gain_changes_mock_classification() {
    let model = NamedTempFile::new().expect("temp model file");
    let resource = NamedTempFile::new().expect("temp resource");

    let quiet = generate_tone(200.0, 2048, 0.05);

    // Without gain the quiet tone is just noise
    let mut registry = ModelRegistry::new();
    registry
        .add(HotwordModel::new(model.path(), "computer"))
        .expect("register model");
    let engine = MockEngine::new(resource.path(), 1).expect("engine");
    let detector = HotwordDetector::new(
        Box::new(engine),
        DetectorConfig::new(resource.path(), registry.clone()),
    )
    .expect("detector");

    assert_eq!(detector.process_audio(&quiet).await.unwrap(), CODE_NOISE);

    // With gain configured at construction it crosses the trigger threshold
    let engine = MockEngine::new(resource.path(), 1).expect("engine");
    let detector = HotwordDetector::new(
        Box::new(engine),
        DetectorConfig::new(resource.path(), registry).with_audio_gain(10.0),
    )
    .expect("detector");

    assert_eq!(detector.process_audio(&quiet).await.unwrap(), 1);
    assert_eq!(
        detector.try_recv_event().await,
        Some(DetectionEvent::Hotword("computer".to_string()))
    );
}

#[tokio::test]
async fn test_runtime_surface_round_trip() {
    let (registry, _files) = three_hotword_registry();
    let resource = NamedTempFile::new().expect("temp resource");

    let engine = ScriptedEngine::new(3, &[]);
    let config = DetectorConfig::new(resource.path(), registry);
    let detector = HotwordDetector::new(Box::new(engine), config).expect("detector");

    detector.set_sensitivity("0.4,0.6").await;
    assert_eq!(detector.sensitivity().await, "0.4,0.6");

    let format = detector.audio_format().await;
    assert_eq!(format.sample_rate, 16_000);
    assert_eq!(format.num_channels, 1);
    assert_eq!(format.bits_per_sample, 16);

    assert_eq!(detector.num_hotwords(), 3);
    assert_eq!(detector.registry().lookup(2).unwrap(), "hey_google");
}
