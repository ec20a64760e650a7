//! Shared test utilities

#![allow(dead_code)]

use std::sync::Arc;

use voice_assist::api::{ApiState, build_router};
use voice_assist::{DbPool, db};

/// Set up an in-memory test database
#[must_use]
pub fn setup_test_db() -> DbPool {
    db::init_memory().expect("failed to init test db")
}

/// Build the full API router over a database
pub fn build_test_router(db: DbPool) -> axum::Router {
    build_router(Arc::new(ApiState::new(db)))
}

/// Register a user directly in the database
pub fn create_test_user(db: &DbPool, device_id: &str, name: &str) -> db::User {
    db::UserRepo::new(db.clone())
        .save(device_id, name)
        .expect("failed to create test user")
}

/// Serve the API on an ephemeral local port, returning its base URL
pub async fn serve_test_backend(db: DbPool) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("failed to bind test backend");
    let addr = listener.local_addr().expect("test backend has no address");

    tokio::spawn(async move {
        axum::serve(listener, build_test_router(db))
            .await
            .expect("test backend failed");
    });

    format!("http://{addr}")
}
