//! Speech output

use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::task::JoinHandle;

use super::playback::{AudioPlayback, decode_mp3};
use super::tts::TextToSpeech;
use crate::Result;

/// Voices the assistant's responses
#[async_trait(?Send)]
pub trait Speaker {
    /// Speak `text`, cutting off anything still playing
    ///
    /// # Errors
    ///
    /// Returns error if the utterance cannot be produced
    async fn speak(&mut self, text: &str) -> Result<()>;

    /// Stop anything still playing
    fn cancel(&mut self);

    /// Wait until the current utterance has finished playing
    async fn wait_idle(&mut self) {}
}

/// Prints responses to stdout
#[derive(Debug, Default)]
pub struct ConsoleSpeaker;

#[async_trait(?Send)]
impl Speaker for ConsoleSpeaker {
    async fn speak(&mut self, text: &str) -> Result<()> {
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "assistant: {text}")?;
        stdout.flush()?;
        Ok(())
    }

    fn cancel(&mut self) {}
}

struct Playing {
    cancel: Arc<AtomicBool>,
    handle: JoinHandle<Result<()>>,
}

/// Synthesized speech played on the default output device
pub struct SynthSpeaker {
    tts: TextToSpeech,
    playback: AudioPlayback,
    current: Option<Playing>,
}

impl SynthSpeaker {
    #[must_use]
    pub const fn new(tts: TextToSpeech, playback: AudioPlayback) -> Self {
        Self {
            tts,
            playback,
            current: None,
        }
    }
}

#[async_trait(?Send)]
impl Speaker for SynthSpeaker {
    async fn speak(&mut self, text: &str) -> Result<()> {
        self.cancel();
        tracing::debug!(text, voice = self.tts.voice(), "speaking");

        let mp3 = self.tts.synthesize(text).await?;
        let samples = decode_mp3(&mp3)?;

        let cancel = Arc::new(AtomicBool::new(false));
        let playback = self.playback.clone();
        let flag = Arc::clone(&cancel);
        let handle = tokio::task::spawn_blocking(move || playback.play_blocking(samples, &flag));

        self.current = Some(Playing { cancel, handle });
        Ok(())
    }

    fn cancel(&mut self) {
        if let Some(playing) = self.current.take() {
            playing.cancel.store(true, Ordering::Relaxed);
        }
    }

    async fn wait_idle(&mut self) {
        let Some(playing) = self.current.take() else {
            return;
        };

        match playing.handle.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!(error = %e, "playback failed"),
            Err(e) => tracing::warn!(error = %e, "playback task failed"),
        }
    }
}
