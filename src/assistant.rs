//! Assistant host loop
//!
//! Owns the interpreter, session and I/O capabilities. Each capture event is
//! fed through the interpreter and the resulting effects are carried out here:
//! speech, the durable name cache, backend reporting and navigation.

use std::future::Future;
use std::time::Duration;

use crate::backend::{BackendClient, BackendReporter, Report};
use crate::interpreter::{Effect, Interpreter, Session, Transcript};
use crate::navigation::{Navigator, PendingNavigation};
use crate::store::LocalCache;
use crate::voice::{CaptureDevice, CaptureError, CaptureEvent, Speaker};
use crate::{Error, Result};

/// Default pause before re-arming after a capture error
pub const DEFAULT_REARM_DELAY: Duration = Duration::from_millis(250);

/// How long queued backend reports may take to drain on shutdown
const BACKEND_DRAIN_TIMEOUT: Duration = Duration::from_secs(5);

/// The voice assistant
pub struct Assistant {
    interpreter: Interpreter,
    session: Session,
    capture: Box<dyn CaptureDevice>,
    speaker: Box<dyn Speaker>,
    navigator: Box<dyn Navigator>,
    cache: LocalCache,
    backend: Option<BackendReporter>,
    rearm_delay: Duration,
    pending: Option<PendingNavigation>,
    fatal: Option<CaptureError>,
}

impl Assistant {
    /// Create an assistant, restoring the user name from the cache
    ///
    /// # Errors
    ///
    /// Returns error if the cache cannot be read
    pub fn new(
        interpreter: Interpreter,
        capture: Box<dyn CaptureDevice>,
        speaker: Box<dyn Speaker>,
        navigator: Box<dyn Navigator>,
        cache: LocalCache,
    ) -> Result<Self> {
        let session = Session::new(cache.user_name()?);

        Ok(Self {
            interpreter,
            session,
            capture,
            speaker,
            navigator,
            cache,
            backend: None,
            rearm_delay: DEFAULT_REARM_DELAY,
            pending: None,
            fatal: None,
        })
    }

    /// Report names and commands to a persistence backend
    ///
    /// Starts the reporting worker, so this must be called from within a
    /// Tokio runtime.
    #[must_use]
    pub fn with_backend(mut self, backend: BackendClient) -> Self {
        self.backend = Some(BackendReporter::spawn(backend));
        self
    }

    /// Set the pause before re-arming after a capture error
    #[must_use]
    pub const fn with_rearm_delay(mut self, delay: Duration) -> Self {
        self.rearm_delay = delay;
        self
    }

    /// Current session
    #[must_use]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    /// Run until Ctrl-C or the capture device closes
    ///
    /// # Errors
    ///
    /// Returns error if speech recognition is unsupported on this host
    #[allow(clippy::future_not_send)]
    pub async fn run(self) -> Result<Session> {
        self.run_until(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("shutdown requested");
            }
        })
        .await
    }

    /// Run until `shutdown` completes or the capture device closes
    ///
    /// Returns the final session.
    ///
    /// # Errors
    ///
    /// Returns error if speech recognition is unsupported on this host
    #[allow(clippy::future_not_send)]
    pub async fn run_until<F>(mut self, shutdown: F) -> Result<Session>
    where
        F: Future<Output = ()>,
    {
        tracing::info!(
            device = self.capture.name(),
            user = self.session.user_name.as_deref().unwrap_or("<none>"),
            "assistant started"
        );

        let effects = self.interpreter.start(&self.session);
        self.apply(effects).await;

        tokio::pin!(shutdown);

        loop {
            if self.fatal.is_some() {
                break;
            }

            if !self.interpreter.is_recognizing() {
                // Nothing armed: a start failed or a cycle errored
                tokio::select! {
                    () = &mut shutdown => break,
                    () = tokio::time::sleep(self.rearm_delay) => {
                        self.arm().await;
                        continue;
                    }
                }
            }

            let event = tokio::select! {
                () = &mut shutdown => break,
                event = self.capture.next_event() => event,
            };

            let Some(event) = event else {
                tracing::info!(device = self.capture.name(), "capture device closed");
                break;
            };

            self.handle_event(event).await;
        }

        self.capture.stop();
        self.speaker.wait_idle().await;

        if let Some(reporter) = self.backend.take() {
            reporter.close(BACKEND_DRAIN_TIMEOUT).await;
        }

        match self.fatal {
            Some(e) => Err(Error::Capture(e.to_string())),
            None => Ok(self.session),
        }
    }

    #[allow(clippy::future_not_send)]
    async fn handle_event(&mut self, event: CaptureEvent) {
        self.interpreter.cycle_finished();

        match event {
            CaptureEvent::Transcript(transcript) => self.on_transcript(transcript).await,
            CaptureEvent::Error(e) => self.on_capture_error(e).await,
            CaptureEvent::End => {
                tracing::debug!("cycle ended without a result");
                self.arm().await;
            }
        }
    }

    #[allow(clippy::future_not_send)]
    async fn on_transcript(&mut self, transcript: Transcript) {
        tracing::info!(transcript = transcript.as_str(), "heard");

        let session = std::mem::replace(&mut self.session, Session::anonymous());
        let transition = self.interpreter.transition(session, transcript);
        self.session = transition.session;
        self.apply(transition.effects).await;
    }

    /// Log a capture failure; fatal ones are announced once and stop the loop
    #[allow(clippy::future_not_send)]
    async fn on_capture_error(&mut self, error: CaptureError) {
        if error.is_fatal() {
            tracing::error!(error = %error, "speech recognition unavailable");
            if let Err(e) = self.speaker.speak(&format!("Sorry, {error}.")).await {
                tracing::warn!(error = %e, "failed to announce capture failure");
            }
            self.fatal = Some(error);
            return;
        }

        match error {
            CaptureError::NoSpeech => tracing::debug!("no speech detected"),
            other => tracing::warn!(error = %other, "capture error"),
        }
        // The run loop re-arms after the delay
    }

    #[allow(clippy::future_not_send)]
    async fn apply(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Speak(text) => {
                    if let Err(e) = self.speaker.speak(&text).await {
                        tracing::warn!(error = %e, "failed to speak");
                    }
                }
                Effect::StoreName(name) => {
                    if let Err(e) = self.cache.set_user_name(&name) {
                        tracing::warn!(error = %e, "failed to cache user name");
                    }
                }
                Effect::ClearName => {
                    if let Err(e) = self.cache.clear_user_name() {
                        tracing::warn!(error = %e, "failed to clear cached user name");
                    }
                }
                Effect::RegisterUser { name } => {
                    if let Some(backend) = &self.backend {
                        backend.report(Report::SaveUser { name });
                    }
                }
                Effect::Persist { name, command } => {
                    if let Some(backend) = &self.backend {
                        backend.report(Report::LogCommand { name, command });
                    }
                }
                Effect::Navigate(navigation) => self.pending = Some(navigation),
                Effect::Arm => {
                    self.navigate();
                    self.arm().await;
                }
            }
        }

        self.navigate();
    }

    /// Hand the pending URL, if any, to the navigator
    fn navigate(&mut self) {
        let Some(navigation) = self.pending.take() else {
            return;
        };

        match navigation.parse() {
            Ok(url) => {
                tracing::info!(url = %url, "opening");
                if let Err(e) = self.navigator.open(&url) {
                    tracing::warn!(error = %e, url = %url, "failed to open URL");
                }
            }
            Err(e) => tracing::warn!(error = %e, url = navigation.url(), "invalid URL dropped"),
        }
    }

    /// Start a recognition cycle unless one is already running
    #[allow(clippy::future_not_send)]
    async fn arm(&mut self) {
        if self.fatal.is_some() {
            return;
        }

        if !self.interpreter.try_arm() {
            tracing::trace!("already recognizing");
            return;
        }

        // Don't record our own voice
        self.speaker.wait_idle().await;

        if let Err(e) = self.capture.start() {
            self.interpreter.cycle_finished();
            self.on_capture_error(e).await;
        }
    }
}
