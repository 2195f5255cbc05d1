/// Detection engine adapter module
///
/// The narrow contract the dispatcher requires from an acoustic detection
/// engine. Engines are constructed by the caller and injected; this layer
/// never loads or locates one itself.

/// Audio sample format (16-bit PCM).
pub type AudioSample = i16;

/// Engine reported a detection failure for this buffer.
pub const CODE_ERROR: i32 = -1;

/// Buffer classified as silence.
pub const CODE_SILENCE: i32 = -2;

/// Buffer contains audio but no trigger phrase.
pub const CODE_NOISE: i32 = 0;

/// PCM stream format an engine expects, static per engine instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioFormat {
    pub sample_rate: u32,
    pub num_channels: u16,
    pub bits_per_sample: u16,
}

/// Contract for an acoustic hotword-detection engine.
///
/// `run_detection` is synchronous and CPU-bound; it advances engine
/// internal state as a side effect and must be fed buffers matching the
/// format the accessors report. Positive return codes are 1-based hotword
/// indices; zero and negative codes are reserved status values
/// (`CODE_ERROR`, `CODE_SILENCE`, `CODE_NOISE`).
#[cfg_attr(test, mockall::automock)]
pub trait DetectionEngine: Send {
    /// Classify one audio buffer, returning the raw detection code.
    fn run_detection(&mut self, samples: &[AudioSample]) -> i32;

    /// Reset internal detection state (e.g. ring buffers).
    fn reset(&mut self);

    /// Replace the per-model sensitivity string.
    fn set_sensitivity(&mut self, sensitivity: &str);

    /// Current per-model sensitivity string.
    fn sensitivity(&self) -> String;

    /// Multiplicative gain applied to input audio before detection.
    fn set_audio_gain(&mut self, gain: f32);

    /// Re-read model resources without reconstructing the engine.
    fn update_model(&mut self);

    /// Number of hotwords the loaded models recognize. Must equal the
    /// registry's declared count; the dispatcher checks at construction.
    fn num_hotwords(&self) -> usize;

    fn sample_rate(&self) -> u32;

    fn num_channels(&self) -> u16;

    fn bits_per_sample(&self) -> u16;
}
