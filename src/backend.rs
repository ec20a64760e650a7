//! Client for the command persistence API
//!
//! The assistant never waits on these calls. Reports are queued on a
//! [`BackendReporter`], whose single worker task delivers them in the order
//! they were made and only logs failures.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::api::{CommandLogged, LogCommandRequest, SaveUserRequest, SavedUser, UserSaved};
use crate::{Error, Result};

/// Default persistence API base URL
pub const DEFAULT_BACKEND_URL: &str = "http://localhost:5000";

/// Reports that can wait in the queue before new ones are dropped
const QUEUE_CAPACITY: usize = 100;

/// HTTP client for the persistence API
#[derive(Debug, Clone)]
pub struct BackendClient {
    client: reqwest::Client,
    base_url: String,
    device_id: String,
}

impl BackendClient {
    /// Create a client for a base URL, identifying as `device_id`
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn new(base_url: &str, device_id: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            device_id: device_id.into(),
        })
    }

    /// Device this client reports as
    #[must_use]
    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    /// Register (or rename) this device's user
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the API rejects it
    pub async fn save_user(&self, name: &str) -> Result<SavedUser> {
        let body = SaveUserRequest {
            name: name.to_string(),
            device_id: self.device_id.clone(),
        };

        let response = self
            .client
            .post(format!("{}/api/user/save", self.base_url))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Backend(format!("save failed {status}: {body}")));
        }

        let saved: UserSaved = response.json().await?;
        Ok(saved.user)
    }

    /// Record a spoken command for this device
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if the backend does not know the device,
    /// or another error if the request fails or the API rejects the command
    pub async fn log_command(&self, command: &str) -> Result<()> {
        let body = LogCommandRequest {
            device_id: self.device_id.clone(),
            command: command.to_string(),
        };

        let response = self
            .client
            .post(format!("{}/api/user/log-command", self.base_url))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(Error::NotFound(format!("user for device {}", self.device_id)));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Backend(format!("log-command failed {status}: {body}")));
        }

        let _: CommandLogged = response.json().await?;
        Ok(())
    }

    /// Fetch this device's user and command history
    ///
    /// Returns `None` if the backend does not know the device.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the API rejects it
    pub async fn fetch_user(&self) -> Result<Option<SavedUser>> {
        let response = self
            .client
            .get(format!("{}/api/user/{}", self.base_url, self.device_id))
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Backend(format!("fetch failed {status}: {body}")));
        }

        Ok(Some(response.json().await?))
    }

    /// Log a command, registering `name` first if the device is unknown
    ///
    /// # Errors
    ///
    /// Returns error if the command could not be recorded
    pub async fn log_command_as(&self, name: &str, command: &str) -> Result<()> {
        match self.log_command(command).await {
            Err(Error::NotFound(_)) => {
                tracing::debug!(device_id = %self.device_id, "device unknown to backend, registering");
                self.save_user(name).await?;
                self.log_command(command).await
            }
            other => other,
        }
    }

    async fn deliver(&self, report: Report) {
        match report {
            Report::SaveUser { name } => match self.save_user(&name).await {
                Ok(user) => tracing::debug!(device_id = %user.device_id, "user saved"),
                Err(e) => tracing::warn!(error = %e, "failed to save user"),
            },
            Report::LogCommand { name, command } => {
                if let Err(e) = self.log_command_as(&name, &command).await {
                    tracing::warn!(error = %e, "failed to log command");
                }
            }
        }
    }
}

/// A report queued for the backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Report {
    SaveUser { name: String },
    LogCommand { name: String, command: String },
}

/// Ordered, fire-and-forget delivery of reports to the backend
pub struct BackendReporter {
    tx: mpsc::Sender<Report>,
    worker: JoinHandle<()>,
}

impl BackendReporter {
    /// Start the delivery worker
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn spawn(client: BackendClient) -> Self {
        let (tx, mut rx) = mpsc::channel::<Report>(QUEUE_CAPACITY);

        let worker = tokio::spawn(async move {
            tracing::debug!(device_id = %client.device_id(), "backend reporter started");
            while let Some(report) = rx.recv().await {
                client.deliver(report).await;
            }
            tracing::debug!("backend reporter stopped");
        });

        Self { tx, worker }
    }

    /// Queue a report; dropped with a warning if the queue is full
    pub fn report(&self, report: Report) {
        if let Err(e) = self.tx.try_send(report) {
            tracing::warn!(error = %e, "backend report dropped");
        }
    }

    /// Stop accepting reports and wait up to `grace` for queued ones
    pub async fn close(self, grace: Duration) {
        let Self { tx, worker } = self;
        drop(tx);

        match tokio::time::timeout(grace, worker).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!(error = %e, "backend reporter failed"),
            Err(_) => tracing::warn!("backend reports still pending at shutdown"),
        }
    }
}
