//! Capture device abstraction
//!
//! A device runs one recognition cycle per [`CaptureDevice::start`]. Each
//! cycle ends with exactly one event: a transcript, an error, or `End` when
//! the cycle finished without a result.

use async_trait::async_trait;

use crate::interpreter::Transcript;

/// Why a recognition cycle failed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CaptureError {
    /// Nothing was said before the listening window closed
    #[error("no speech detected")]
    NoSpeech,

    /// The audio stream failed
    #[error("audio error: {0}")]
    Audio(String),

    /// Speech was recorded but could not be transcribed
    #[error("transcription error: {0}")]
    Transcription(String),

    /// Recognition is not available on this host
    #[error("speech recognition unsupported: {0}")]
    Unsupported(String),
}

impl CaptureError {
    /// Whether retrying can never succeed
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Unsupported(_))
    }
}

/// Outcome of a recognition cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureEvent {
    /// A final transcript
    Transcript(Transcript),
    /// The cycle failed
    Error(CaptureError),
    /// The cycle ended without a result
    End,
}

/// A single-shot speech recognizer
#[async_trait(?Send)]
pub trait CaptureDevice {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Begin a recognition cycle
    ///
    /// # Errors
    ///
    /// Returns error if a cycle is already running or the device cannot start
    fn start(&mut self) -> Result<(), CaptureError>;

    /// Abort the current cycle, if any
    fn stop(&mut self);

    /// Wait for the current cycle's event
    ///
    /// Returns `None` once the device has no more input.
    async fn next_event(&mut self) -> Option<CaptureEvent>;
}
