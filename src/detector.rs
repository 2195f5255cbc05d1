/// Detection dispatcher module
///
/// Sequential one-buffer-in, one-event-out processing loop over an
/// injected detection engine. Each call forwards the buffer to the engine,
/// interprets the returned code against the model registry, emits exactly
/// one classified event, and hands the raw code back to the caller.

use crate::engine::{
    AudioFormat, AudioSample, DetectionEngine, CODE_ERROR, CODE_NOISE, CODE_SILENCE,
};
use crate::registry::{ModelRegistry, RegistryError};
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum DetectorError {
    #[error("Engine resource not found: {0}")]
    ResourceNotFound(PathBuf),

    #[error("Engine reports {engine} hotword(s) but registry declares {registry}")]
    HotwordCountMismatch { engine: usize, registry: usize },

    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Detection code {0} does not correspond to any known status or hotword")]
    UnknownCode(i32),
}

/// Classified result of one detection call. Exactly one event is emitted
/// per processed buffer; never zero, never more than one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetectionEvent {
    /// Engine reported a detection failure (recoverable, per-buffer).
    Error,

    /// Buffer classified as silence.
    Silence,

    /// Audio present, no trigger phrase.
    Noise,

    /// A trigger phrase was recognized.
    Hotword(String),
}

/// Configuration for a hotword detector.
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    /// Path to the engine's common resource file. Must exist.
    pub resource: PathBuf,

    /// Registered hotword models; frozen once the detector is built.
    pub registry: ModelRegistry,

    /// Optional gain applied to the engine at construction.
    pub audio_gain: Option<f32>,
}

impl DetectorConfig {
    pub fn new(resource: impl Into<PathBuf>, registry: ModelRegistry) -> Self {
        Self {
            resource: resource.into(),
            registry,
            audio_gain: None,
        }
    }

    pub fn with_audio_gain(mut self, gain: f32) -> Self {
        self.audio_gain = Some(gain);
        self
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), DetectorError> {
        if !self.resource.exists() {
            return Err(DetectorError::ResourceNotFound(self.resource.clone()));
        }
        Ok(())
    }
}

/// Detector state guarded by one lock: a buffer is fully processed before
/// the next is accepted.
struct DetectorState {
    engine: Box<dyn DetectionEngine>,
    buffers_processed: u64,
    hotwords_detected: u64,
}

/// Streaming hotword detector.
///
/// Composes the model registry with an injected engine. Events flow
/// through an unbounded channel consumed via `recv_event` /
/// `try_recv_event`; `process_audio` additionally returns the raw
/// detection code for callers that want the numeric value.
pub struct HotwordDetector {
    registry: ModelRegistry,
    state: Arc<RwLock<DetectorState>>,
    event_tx: mpsc::UnboundedSender<DetectionEvent>,
    event_rx: Arc<RwLock<mpsc::UnboundedReceiver<DetectionEvent>>>,
}

impl HotwordDetector {
    /// Build a detector from an engine and configuration.
    ///
    /// Fails fast, before any audio is accepted, when the resource file is
    /// missing or the engine's hotword count disagrees with the registry's.
    /// The count check happens exactly once, here, never per buffer. A
    /// configured audio gain is applied to the engine immediately.
    pub fn new(
        mut engine: Box<dyn DetectionEngine>,
        config: DetectorConfig,
    ) -> Result<Self, DetectorError> {
        config.validate()?;

        let declared = config.registry.num_hotwords();
        let reported = engine.num_hotwords();
        if reported != declared {
            return Err(DetectorError::HotwordCountMismatch {
                engine: reported,
                registry: declared,
            });
        }

        if let Some(gain) = config.audio_gain {
            engine.set_audio_gain(gain);
        }

        info!("Initializing hotword detector");
        info!("Models: {}", config.registry.model_string());
        info!("Hotwords: {}", declared);

        let (event_tx, event_rx) = mpsc::unbounded_channel();

        let state = DetectorState {
            engine,
            buffers_processed: 0,
            hotwords_detected: 0,
        };

        Ok(Self {
            registry: config.registry,
            state: Arc::new(RwLock::new(state)),
            event_tx,
            event_rx: Arc::new(RwLock::new(event_rx)),
        })
    }

    /// Process one audio buffer.
    ///
    /// Forwards the buffer to the engine, interprets the returned code,
    /// emits the corresponding event, and returns the raw code. Codes the
    /// registry cannot resolve fail the call instead of emitting a
    /// malformed event.
    pub async fn process_audio(
        &self,
        samples: &[AudioSample],
    ) -> Result<i32, DetectorError> {
        let mut state = self.state.write().await;

        let code = state.engine.run_detection(samples);
        state.buffers_processed += 1;

        let event = match code {
            CODE_ERROR => {
                warn!("Engine reported a detection error");
                DetectionEvent::Error
            }
            CODE_SILENCE => DetectionEvent::Silence,
            CODE_NOISE => DetectionEvent::Noise,
            index if index > 0 => {
                // Engine codes are 1-based; the lookup table is 0-based.
                let label = self.registry.lookup((index - 1) as usize)?;
                state.hotwords_detected += 1;
                info!("Hotword detected: {}", label);
                DetectionEvent::Hotword(label.to_string())
            }
            other => return Err(DetectorError::UnknownCode(other)),
        };

        if let Err(e) = self.event_tx.send(event) {
            warn!("Failed to deliver detection event: {}", e);
        }

        Ok(code)
    }

    /// Get the next detection event (non-blocking).
    pub async fn try_recv_event(&self) -> Option<DetectionEvent> {
        let mut rx = self.event_rx.write().await;
        rx.try_recv().ok()
    }

    /// Get the next detection event (blocking).
    pub async fn recv_event(&self) -> Option<DetectionEvent> {
        let mut rx = self.event_rx.write().await;
        rx.recv().await
    }

    /// Reset engine state and stream counters.
    pub async fn reset(&self) {
        let mut state = self.state.write().await;
        state.engine.reset();
        state.buffers_processed = 0;
        state.hotwords_detected = 0;
        debug!("Detector reset");
    }

    pub async fn set_sensitivity(&self, sensitivity: &str) {
        let mut state = self.state.write().await;
        state.engine.set_sensitivity(sensitivity);
    }

    pub async fn sensitivity(&self) -> String {
        let state = self.state.read().await;
        state.engine.sensitivity()
    }

    pub async fn set_audio_gain(&self, gain: f32) {
        let mut state = self.state.write().await;
        state.engine.set_audio_gain(gain);
    }

    /// Ask the engine to re-read its model resources.
    pub async fn update_model(&self) {
        let mut state = self.state.write().await;
        state.engine.update_model();
    }

    /// PCM format the engine expects for ingested buffers.
    pub async fn audio_format(&self) -> AudioFormat {
        let state = self.state.read().await;
        AudioFormat {
            sample_rate: state.engine.sample_rate(),
            num_channels: state.engine.num_channels(),
            bits_per_sample: state.engine.bits_per_sample(),
        }
    }

    /// Declared hotword count; equals the engine's count by construction.
    pub fn num_hotwords(&self) -> usize {
        self.registry.num_hotwords()
    }

    pub fn registry(&self) -> &ModelRegistry {
        &self.registry
    }

    /// Get current statistics
    pub async fn stats(&self) -> DetectorStats {
        let state = self.state.read().await;
        DetectorStats {
            buffers_processed: state.buffers_processed,
            hotwords_detected: state.hotwords_detected,
        }
    }
}

/// Detector statistics
#[derive(Debug, Clone)]
pub struct DetectorStats {
    pub buffers_processed: u64,
    pub hotwords_detected: u64,
}
