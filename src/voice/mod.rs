//! Voice input and output
//!
//! Capture devices deliver one transcript per recognition cycle; speakers
//! voice the interpreter's responses. Microphone capture and synthesized
//! speech go through `OpenAI` Whisper and TTS.

mod capture;
mod console;
mod device;
mod mic;
mod playback;
mod selection;
mod speaker;
mod stt;
mod tts;
mod utterance;

pub use capture::{AudioCapture, SAMPLE_RATE, samples_to_wav};
pub use console::ConsoleCapture;
pub use device::{CaptureDevice, CaptureError, CaptureEvent};
pub use mic::MicCapture;
pub use playback::{AudioPlayback, decode_mp3};
pub use selection::{OPENAI_VOICES, VoiceGender, VoiceInfo, VoicePreferences, VoiceSelector};
pub use speaker::{ConsoleSpeaker, Speaker, SynthSpeaker};
pub use stt::SpeechToText;
pub use tts::TextToSpeech;
pub use utterance::{DetectorState, UtteranceDetector};

use std::time::Duration;

/// Upper bound on a single Whisper or TTS request
pub(crate) const API_TIMEOUT: Duration = Duration::from_secs(30);

/// HTTP client for the speech APIs
fn api_client(timeout: Duration) -> crate::Result<reqwest::Client> {
    Ok(reqwest::Client::builder().timeout(timeout).build()?)
}
