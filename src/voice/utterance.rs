//! Energy-based end-of-utterance detection
//!
//! Microphone chunks are fed in as they arrive. Once loud audio starts, the
//! detector accumulates everything until enough speech has been heard and is
//! followed by a stretch of silence; the buffered utterance is then handed
//! back for transcription.

/// Minimum RMS energy to count a chunk as speech
const ENERGY_THRESHOLD: f32 = 0.03;

/// Minimum speech before an utterance counts (0.3 s at 16kHz)
const MIN_SPEECH_SAMPLES: usize = 4800;

/// Trailing silence that ends an utterance (0.5 s at 16kHz)
const SILENCE_SAMPLES: usize = 8000;

/// Longest utterance kept before it is cut off (30 s at 16kHz)
const MAX_UTTERANCE_SAMPLES: usize = 480_000;

/// State of the utterance detector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DetectorState {
    /// Waiting for speech
    Idle,
    /// Speech started, accumulating
    Listening,
}

/// Detects complete spoken utterances in a stream of samples
#[derive(Debug)]
pub struct UtteranceDetector {
    threshold: f32,
    state: DetectorState,
    buffer: Vec<f32>,
    speech_samples: usize,
    silence_counter: usize,
}

impl Default for UtteranceDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl UtteranceDetector {
    /// Create a detector with the default energy threshold
    #[must_use]
    pub const fn new() -> Self {
        Self::with_threshold(ENERGY_THRESHOLD)
    }

    /// Create a detector with a custom energy threshold
    #[must_use]
    pub const fn with_threshold(threshold: f32) -> Self {
        Self {
            threshold,
            state: DetectorState::Idle,
            buffer: Vec::new(),
            speech_samples: 0,
            silence_counter: 0,
        }
    }

    /// Feed a chunk of samples
    ///
    /// Returns the buffered utterance once speech has been followed by enough
    /// silence; the detector is then back to idle.
    pub fn process(&mut self, samples: &[f32]) -> Option<Vec<f32>> {
        if samples.is_empty() {
            return None;
        }

        let energy = calculate_energy(samples);
        let is_speech = energy > self.threshold;

        match self.state {
            DetectorState::Idle => {
                if is_speech {
                    self.state = DetectorState::Listening;
                    self.buffer.clear();
                    self.buffer.extend_from_slice(samples);
                    self.speech_samples = samples.len();
                    self.silence_counter = 0;
                    tracing::trace!(energy, "speech started");
                }
                None
            }
            DetectorState::Listening => {
                self.buffer.extend_from_slice(samples);

                if is_speech {
                    self.speech_samples += samples.len();
                    self.silence_counter = 0;
                } else {
                    self.silence_counter += samples.len();
                }

                if self.silence_counter > SILENCE_SAMPLES
                    && self.speech_samples >= MIN_SPEECH_SAMPLES
                {
                    tracing::debug!(samples = self.buffer.len(), "utterance complete");
                    let utterance = std::mem::take(&mut self.buffer);
                    self.reset();
                    return Some(utterance);
                }

                // Continuous noise never goes quiet; cut it off
                if self.buffer.len() >= MAX_UTTERANCE_SAMPLES {
                    tracing::debug!(samples = self.buffer.len(), "utterance cut off at limit");
                    let mut utterance = std::mem::take(&mut self.buffer);
                    utterance.truncate(MAX_UTTERANCE_SAMPLES);
                    self.reset();
                    return Some(utterance);
                }

                // Too little speech before a long pause: treat as noise
                if self.silence_counter > SILENCE_SAMPLES * 2 {
                    tracing::trace!(speech = self.speech_samples, "discarding short noise");
                    self.reset();
                }

                None
            }
        }
    }

    /// Reset to idle, dropping any partial utterance
    pub fn reset(&mut self) {
        self.state = DetectorState::Idle;
        self.buffer.clear();
        self.speech_samples = 0;
        self.silence_counter = 0;
    }

    /// Whether speech has started in the current cycle
    #[must_use]
    pub fn is_listening(&self) -> bool {
        self.state == DetectorState::Listening
    }

    #[must_use]
    pub const fn state(&self) -> DetectorState {
        self.state
    }
}

/// RMS energy of a chunk
#[allow(clippy::cast_precision_loss)]
fn calculate_energy(samples: &[f32]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum_squares: f32 = samples.iter().map(|s| s * s).sum();
    (sum_squares / samples.len() as f32).sqrt()
}
