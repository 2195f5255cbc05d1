/// Hotword detection service binary
///
/// Demo wiring: builds a model registry from environment configuration,
/// attaches the energy-based mock engine, and streams a WAV file through
/// the detector, logging one event per chunk.

use anyhow::{Context, Result};
use hotword_detector::{
    DetectionEvent, DetectorConfig, HotwordDetector, HotwordModel, MockEngine, ModelRegistry,
};
use std::path::PathBuf;
use tracing::{debug, error, info};

/// Chunk size fed to the detector (~128ms at 16kHz)
const CHUNK_SIZE: usize = 2048;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("hotword_detector=debug".parse().unwrap()),
        )
        .init();

    info!("Starting hotword detection service");

    let settings = match load_settings() {
        Ok(s) => s,
        Err(e) => {
            error!("Failed to load configuration: {:#}", e);
            std::process::exit(1);
        }
    };

    let detector = match build_detector(&settings) {
        Ok(d) => d,
        Err(e) => {
            error!("Failed to create detector: {:#}", e);
            std::process::exit(1);
        }
    };

    info!(
        "Detector ready: {} hotword(s) registered",
        detector.num_hotwords()
    );

    match settings.wav {
        Some(path) => {
            if let Err(e) = stream_wav(&detector, &path).await {
                error!("Streaming failed: {:#}", e);
                std::process::exit(1);
            }
        }
        None => {
            info!("No input configured; set HOTWORD_WAV to stream a file");
        }
    }

    info!("Hotword detection service stopped");
}

/// Runtime settings taken from the environment.
struct Settings {
    resource: PathBuf,
    models: Vec<HotwordModel>,
    audio_gain: Option<f32>,
    wav: Option<PathBuf>,
}

/// Load configuration from environment variables.
///
/// `HOTWORD_MODELS` is a JSON array of model declarations, e.g.
/// `[{"file": "models/alexa.umdl", "hotwords": "alexa", "sensitivity": "0.5"}]`.
fn load_settings() -> Result<Settings> {
    let resource = std::env::var("HOTWORD_RESOURCE")
        .unwrap_or_else(|_| "resources/common.res".to_string());

    let models_json = std::env::var("HOTWORD_MODELS")
        .context("HOTWORD_MODELS is required (JSON array of model declarations)")?;
    let models: Vec<HotwordModel> =
        serde_json::from_str(&models_json).context("HOTWORD_MODELS is not valid JSON")?;

    let audio_gain = match std::env::var("HOTWORD_AUDIO_GAIN") {
        Ok(value) => Some(
            value
                .parse::<f32>()
                .context("HOTWORD_AUDIO_GAIN is not a number")?,
        ),
        Err(_) => None,
    };

    let wav = std::env::var("HOTWORD_WAV").ok().map(PathBuf::from);

    Ok(Settings {
        resource: PathBuf::from(resource),
        models,
        audio_gain,
        wav,
    })
}

fn build_detector(settings: &Settings) -> Result<HotwordDetector> {
    let mut registry = ModelRegistry::new();
    for model in &settings.models {
        registry
            .add(model.clone())
            .with_context(|| format!("failed to register model {}", model.file.display()))?;
    }

    let engine = MockEngine::new(&settings.resource, registry.num_hotwords())
        .context("failed to construct engine")?;

    let mut config = DetectorConfig::new(&settings.resource, registry);
    if let Some(gain) = settings.audio_gain {
        config = config.with_audio_gain(gain);
    }

    HotwordDetector::new(Box::new(engine), config).context("failed to construct detector")
}

/// Stream a 16-bit WAV file through the detector in fixed-size chunks.
async fn stream_wav(detector: &HotwordDetector, path: &PathBuf) -> Result<()> {
    let mut reader = hound::WavReader::open(path)
        .with_context(|| format!("failed to open {}", path.display()))?;

    let spec = reader.spec();
    let format = detector.audio_format().await;
    info!(
        "Streaming {} ({} Hz, {} channel(s)); engine expects {} Hz",
        path.display(),
        spec.sample_rate,
        spec.channels,
        format.sample_rate
    );

    let samples: Vec<i16> = reader
        .samples::<i16>()
        .collect::<std::result::Result<_, _>>()
        .context("failed to decode WAV samples")?;

    for chunk in samples.chunks(CHUNK_SIZE) {
        let code = detector.process_audio(chunk).await?;
        debug!("Chunk classified with code {}", code);

        while let Some(event) = detector.try_recv_event().await {
            match event {
                DetectionEvent::Hotword(label) => info!("Hotword detected: {}", label),
                DetectionEvent::Error => error!("Engine reported a detection error"),
                DetectionEvent::Silence | DetectionEvent::Noise => {}
            }
        }
    }

    let stats = detector.stats().await;
    info!(
        "Stream finished: {} buffer(s) processed, {} hotword(s) detected",
        stats.buffers_processed, stats.hotwords_detected
    );

    Ok(())
}
