//! Typed input standing in for speech recognition

use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use super::device::{CaptureDevice, CaptureError, CaptureEvent};
use crate::interpreter::Transcript;

/// Reads one line per recognition cycle
///
/// Lines are read on a background task. A line taken while a cycle is armed
/// becomes that cycle's transcript; a line taken while disarmed is dropped.
/// End of input closes the device.
pub struct ConsoleCapture {
    lines: mpsc::UnboundedReceiver<String>,
    armed: bool,
}

impl ConsoleCapture {
    /// Read from stdin
    #[must_use]
    pub fn stdin() -> Self {
        Self::from_reader(BufReader::new(tokio::io::stdin()))
    }

    /// Read from any buffered reader
    pub fn from_reader<R>(reader: R) -> Self
    where
        R: AsyncBufRead + Unpin + Send + 'static,
    {
        let (tx, rx) = mpsc::unbounded_channel();

        tokio::spawn(async move {
            let mut lines = reader.lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        if tx.send(line).is_err() {
                            break;
                        }
                    }
                    Ok(None) => {
                        tracing::debug!("console input closed");
                        break;
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "failed to read console input");
                        break;
                    }
                }
            }
        });

        Self {
            lines: rx,
            armed: false,
        }
    }

    #[must_use]
    pub const fn is_armed(&self) -> bool {
        self.armed
    }
}

#[async_trait(?Send)]
impl CaptureDevice for ConsoleCapture {
    fn name(&self) -> &'static str {
        "console"
    }

    fn start(&mut self) -> Result<(), CaptureError> {
        if self.armed {
            return Err(CaptureError::Audio("recognition already started".to_string()));
        }
        self.armed = true;
        Ok(())
    }

    fn stop(&mut self) {
        self.armed = false;
    }

    async fn next_event(&mut self) -> Option<CaptureEvent> {
        loop {
            let line = self.lines.recv().await?;

            if !self.armed {
                tracing::debug!(line = %line, "input while not listening, dropped");
                continue;
            }

            self.armed = false;
            let transcript = Transcript::new(line);
            if transcript.as_str().is_empty() {
                return Some(CaptureEvent::End);
            }
            return Some(CaptureEvent::Transcript(transcript));
        }
    }
}
