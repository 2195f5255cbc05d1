/// Energy-based mock engine
///
/// A stand-in for a real acoustic engine, classifying buffers by RMS
/// level. Lets the demo binary and tests exercise the full dispatch path
/// without a trained model; it is not a detection algorithm.

use crate::engine::{AudioSample, DetectionEngine, CODE_NOISE, CODE_SILENCE};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, trace};

/// Sample rate the mock engine reports (16kHz mono, 16-bit).
pub const SAMPLE_RATE: u32 = 16_000;

/// RMS level below which a buffer counts as silence.
pub const DEFAULT_SILENCE_FLOOR: f32 = 0.005;

/// RMS level above which a buffer triggers the first hotword.
pub const DEFAULT_TRIGGER_THRESHOLD: f32 = 0.25;

#[derive(Error, Debug)]
pub enum MockEngineError {
    #[error("Engine resource not found: {0}")]
    ResourceNotFound(PathBuf),
}

/// Mock detection engine driven by RMS thresholds.
///
/// Quiet buffers classify as silence, moderate ones as noise, and buffers
/// whose gain-adjusted RMS exceeds the trigger threshold report hotword
/// index 1 (the mock cannot tell trigger phrases apart).
pub struct MockEngine {
    resource: PathBuf,
    num_hotwords: usize,
    sensitivity: String,
    audio_gain: f32,
    silence_floor: f32,
    trigger_threshold: f32,
    buffers_seen: u64,
}

impl MockEngine {
    /// Create a mock engine claiming `num_hotwords` trigger phrases.
    ///
    /// Mirrors a real engine's construction contract: the resource file
    /// must exist or construction fails.
    pub fn new(
        resource: impl AsRef<Path>,
        num_hotwords: usize,
    ) -> Result<Self, MockEngineError> {
        let resource = resource.as_ref().to_path_buf();
        if !resource.exists() {
            return Err(MockEngineError::ResourceNotFound(resource));
        }

        debug!(
            "Mock engine ready: resource={}, hotwords={}",
            resource.display(),
            num_hotwords
        );

        Ok(Self {
            resource,
            num_hotwords,
            sensitivity: "0.5".to_string(),
            audio_gain: 1.0,
            silence_floor: DEFAULT_SILENCE_FLOOR,
            trigger_threshold: DEFAULT_TRIGGER_THRESHOLD,
            buffers_seen: 0,
        })
    }

    /// Override the classification thresholds.
    pub fn with_thresholds(mut self, silence_floor: f32, trigger_threshold: f32) -> Self {
        self.silence_floor = silence_floor;
        self.trigger_threshold = trigger_threshold;
        self
    }

    pub fn resource(&self) -> &Path {
        &self.resource
    }

    pub fn buffers_seen(&self) -> u64 {
        self.buffers_seen
    }

    /// Normalized RMS level of a buffer after gain.
    fn rms_level(&self, samples: &[AudioSample]) -> f32 {
        if samples.is_empty() {
            return 0.0;
        }

        let sum_squares: f64 = samples
            .iter()
            .map(|&s| {
                let normalized = s as f64 * self.audio_gain as f64 / i16::MAX as f64;
                normalized * normalized
            })
            .sum();

        (sum_squares / samples.len() as f64).sqrt() as f32
    }
}

impl DetectionEngine for MockEngine {
    fn run_detection(&mut self, samples: &[AudioSample]) -> i32 {
        self.buffers_seen += 1;

        let rms = self.rms_level(samples);
        trace!("Buffer #{}: rms={:.4}", self.buffers_seen, rms);

        if rms < self.silence_floor {
            CODE_SILENCE
        } else if rms >= self.trigger_threshold && self.num_hotwords > 0 {
            1
        } else {
            CODE_NOISE
        }
    }

    fn reset(&mut self) {
        self.buffers_seen = 0;
        debug!("Mock engine reset");
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

    fn update_model(&mut self) {
        // Nothing to re-read; a real engine would reload model files here.
        debug!("Mock engine model update requested");
    }

    fn num_hotwords(&self) -> usize {
        self.num_hotwords
    }

    fn sample_rate(&self) -> u32 {
        SAMPLE_RATE
    }

    fn num_channels(&self) -> u16 {
        1
    }

    fn bits_per_sample(&self) -> u16 {
        16
    }
}
