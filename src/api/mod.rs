//! HTTP API server for command persistence

pub mod health;
pub mod user;

use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::Result;
use crate::db::{DbPool, UserRepo};

pub use user::{CommandLogged, LogCommandRequest, SaveUserRequest, SavedUser, UserSaved};

/// Shared state for API handlers
#[derive(Clone)]
pub struct ApiState {
    pub db: DbPool,
    pub user_repo: UserRepo,
}

impl ApiState {
    /// Create state over a database pool
    #[must_use]
    pub fn new(db: DbPool) -> Self {
        let user_repo = UserRepo::new(db.clone());
        Self { db, user_repo }
    }
}

/// API server
pub struct ApiServer {
    state: Arc<ApiState>,
    port: u16,
}

impl ApiServer {
    /// Create a server on the given port
    #[must_use]
    pub fn new(db: DbPool, port: u16) -> Self {
        Self {
            state: Arc::new(ApiState::new(db)),
            port,
        }
    }

    /// Build the router with all routes
    #[must_use]
    pub fn router(&self) -> Router {
        build_router(self.state.clone())
    }

    /// Run the API server
    ///
    /// # Errors
    ///
    /// Returns error if server fails to bind or run
    pub async fn run(self) -> Result<()> {
        let addr = format!("0.0.0.0:{}", self.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| crate::Error::Config(format!("failed to bind API server: {e}")))?;

        tracing::info!(port = self.port, "API server listening");

        axum::serve(listener, self.router())
            .with_graceful_shutdown(async {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::info!("shutdown requested");
                }
            })
            .await
            .map_err(|e| crate::Error::Config(format!("API server error: {e}")))?;

        Ok(())
    }
}

/// Build the full router over shared state
pub fn build_router(state: Arc<ApiState>) -> Router {
    let router = Router::new()
        .nest("/api/user", user::router(state.clone()))
        .merge(health::router())
        .merge(health::ready_router(state));

    // The assistant may run in a browser on another origin
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    router.layer(cors).layer(TraceLayer::new_for_http())
}
