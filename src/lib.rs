/// Hotword detection front end library
///
/// Streaming front end for keyword spotting: a model registry mapping
/// declared hotword models to a stable index space, and a dispatcher that
/// feeds audio buffers to an injected detection engine and emits one
/// classified event per buffer.

pub mod detector;
pub mod engine;
pub mod mock;
pub mod registry;

// Re-export main types
pub use detector::{
    DetectionEvent, DetectorConfig, DetectorError, DetectorStats, HotwordDetector,
};
pub use engine::{
    AudioFormat, AudioSample, DetectionEngine, CODE_ERROR, CODE_NOISE, CODE_SILENCE,
};
pub use mock::{MockEngine, MockEngineError};
pub use registry::{HotwordLabels, HotwordModel, ModelRegistry, RegistryError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
