//! User endpoints: register a device's user and log spoken commands

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};

use super::ApiState;
use crate::db::User;

/// Build user router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route("/save", post(save))
        .route("/log-command", post(log_command))
        .route("/{device_id}", get(get_user))
        .with_state(state)
}

/// Body of `POST /api/user/save`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveUserRequest {
    pub name: String,
    pub device_id: String,
}

/// Response of `POST /api/user/save`
#[derive(Debug, Serialize, Deserialize)]
pub struct UserSaved {
    pub message: String,
    pub user: SavedUser,
}

/// User record as returned by the API
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedUser {
    pub device_id: String,
    pub name: String,
    #[serde(default)]
    pub last_command: Option<String>,
    #[serde(default)]
    pub commands: Vec<String>,
}

impl From<User> for SavedUser {
    fn from(user: User) -> Self {
        Self {
            device_id: user.device_id,
            name: user.name,
            last_command: user.last_command,
            commands: user.commands,
        }
    }
}

/// Body of `POST /api/user/log-command`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogCommandRequest {
    pub device_id: String,
    pub command: String,
}

/// Response of `POST /api/user/log-command`
#[derive(Debug, Serialize, Deserialize)]
pub struct CommandLogged {
    pub message: String,
}

/// Create or rename the user for a device
async fn save(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<SaveUserRequest>,
) -> Result<Json<UserSaved>, UserApiError> {
    let name = request.name.trim();
    let device_id = request.device_id.trim();

    if name.is_empty() {
        return Err(UserApiError::BadRequest("name is required"));
    }
    if device_id.is_empty() {
        return Err(UserApiError::BadRequest("deviceId is required"));
    }

    let user = state
        .user_repo
        .save(device_id, name)
        .map_err(|e| UserApiError::Internal(e.to_string()))?;

    tracing::info!(device_id, name, "user saved");

    Ok(Json(UserSaved {
        message: "User saved successfully".to_string(),
        user: user.into(),
    }))
}

/// Append a command to a device's history
async fn log_command(
    State(state): State<Arc<ApiState>>,
    Json(request): Json<LogCommandRequest>,
) -> Result<Json<CommandLogged>, UserApiError> {
    let device_id = request.device_id.trim();
    if device_id.is_empty() {
        return Err(UserApiError::BadRequest("deviceId is required"));
    }

    let logged = state
        .user_repo
        .log_command(device_id, &request.command)
        .map_err(|e| UserApiError::Internal(e.to_string()))?;

    if !logged {
        tracing::debug!(device_id, "command for unknown device");
        return Err(UserApiError::NotFound);
    }

    tracing::debug!(device_id, command = %request.command, "command logged");
    Ok(Json(CommandLogged {
        message: "Command logged".to_string(),
    }))
}

/// Fetch a device's user with their command history
async fn get_user(
    State(state): State<Arc<ApiState>>,
    Path(device_id): Path<String>,
) -> Result<Json<SavedUser>, UserApiError> {
    state
        .user_repo
        .find(&device_id)
        .map_err(|e| UserApiError::Internal(e.to_string()))?
        .map(|user| Json(user.into()))
        .ok_or(UserApiError::NotFound)
}

/// User API errors
#[derive(Debug)]
pub enum UserApiError {
    BadRequest(&'static str),
    NotFound,
    Internal(String),
}

impl IntoResponse for UserApiError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            error: String,
        }

        let (status, error) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.to_string()),
            Self::NotFound => (StatusCode::NOT_FOUND, "User not found".to_string()),
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "user API failure");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal error".to_string())
            }
        };

        (status, Json(ErrorResponse { error })).into_response()
    }
}
