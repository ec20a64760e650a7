//! Microphone recognition: record, detect end of speech, transcribe

use std::time::{Duration, Instant};

use async_trait::async_trait;

use super::capture::{AudioCapture, SAMPLE_RATE, samples_to_wav};
use super::device::{CaptureDevice, CaptureError, CaptureEvent};
use super::stt::SpeechToText;
use super::utterance::UtteranceDetector;
use crate::interpreter::Transcript;

/// How often recorded audio is drained into the detector
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// How long a cycle waits for speech to begin
const DEFAULT_LISTEN_TIMEOUT: Duration = Duration::from_secs(8);

/// Speech recognition from the default microphone
pub struct MicCapture {
    capture: Option<AudioCapture>,
    detector: UtteranceDetector,
    stt: SpeechToText,
    started: Option<Instant>,
}

impl MicCapture {
    /// Create a recognizer; the microphone is opened on the first cycle
    #[must_use]
    pub fn new(stt: SpeechToText) -> Self {
        Self {
            capture: None,
            detector: UtteranceDetector::new(),
            stt,
            started: None,
        }
    }

    fn open(&mut self) -> Result<&mut AudioCapture, CaptureError> {
        if self.capture.is_none() {
            if !AudioCapture::input_available() {
                return Err(CaptureError::Unsupported("no microphone available".to_string()));
            }
            let capture = AudioCapture::new().map_err(|e| CaptureError::Audio(e.to_string()))?;
            self.capture = Some(capture);
        }

        self.capture
            .as_mut()
            .ok_or_else(|| CaptureError::Audio("microphone not open".to_string()))
    }

    async fn transcribe(&self, samples: &[f32]) -> CaptureEvent {
        let wav = match samples_to_wav(samples, SAMPLE_RATE) {
            Ok(wav) => wav,
            Err(e) => return CaptureEvent::Error(CaptureError::Audio(e.to_string())),
        };

        match self.stt.transcribe(&wav).await {
            Ok(text) => {
                let transcript = Transcript::new(text);
                if transcript.as_str().is_empty() {
                    CaptureEvent::End
                } else {
                    CaptureEvent::Transcript(transcript)
                }
            }
            Err(e) => CaptureEvent::Error(CaptureError::Transcription(e.to_string())),
        }
    }
}

#[async_trait(?Send)]
impl CaptureDevice for MicCapture {
    fn name(&self) -> &'static str {
        "microphone"
    }

    fn start(&mut self) -> Result<(), CaptureError> {
        if self.started.is_some() {
            return Err(CaptureError::Audio("recognition already started".to_string()));
        }

        let capture = self.open()?;
        capture.clear_buffer();
        capture
            .start()
            .map_err(|e| CaptureError::Audio(e.to_string()))?;

        self.detector.reset();
        self.started = Some(Instant::now());
        tracing::debug!("listening");
        Ok(())
    }

    fn stop(&mut self) {
        if let Some(capture) = self.capture.as_mut() {
            capture.stop();
            capture.clear_buffer();
        }
        self.started = None;
    }

    async fn next_event(&mut self) -> Option<CaptureEvent> {
        let Some(started) = self.started else {
            // No cycle running; nothing will ever arrive
            return std::future::pending().await;
        };

        loop {
            tokio::time::sleep(POLL_INTERVAL).await;

            let samples = match self.capture.as_ref() {
                Some(capture) => capture.take_buffer(),
                None => Vec::new(),
            };

            if let Some(utterance) = self.detector.process(&samples) {
                self.stop();
                tracing::debug!(samples = utterance.len(), "transcribing utterance");
                return Some(self.transcribe(&utterance).await);
            }

            if !self.detector.is_listening() && started.elapsed() > DEFAULT_LISTEN_TIMEOUT {
                self.stop();
                return Some(CaptureEvent::Error(CaptureError::NoSpeech));
            }
        }
    }
}
