//! Voice Assist - a voice-driven command assistant
//!
//! This library provides the pieces of a small spoken-command front end and
//! the backend that records what was said:
//! - Command interpreter (name capture, open site, play a song, logout)
//! - Capture devices (console, microphone + Whisper)
//! - Speech output (console, TTS + playback) with a voice selection policy
//! - Command persistence API (axum + `SQLite`)
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────┐
//! │                   Capture device                      │
//! │        Console  │  Microphone + VAD + Whisper         │
//! └────────────────────────┬─────────────────────────────┘
//!                          │ CaptureEvent
//! ┌────────────────────────▼─────────────────────────────┐
//! │                   Assistant host                      │
//! │   Interpreter (pure)  →  Effects  →  Speak / Open /   │
//! │                                      Persist / Arm    │
//! └────────────────────────┬─────────────────────────────┘
//!                          │ HTTP (fire-and-forget)
//! ┌────────────────────────▼─────────────────────────────┐
//! │                  Persistence API                      │
//! │        /api/user/save  │  /api/user/log-command       │
//! └──────────────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod assistant;
pub mod backend;
pub mod config;
pub mod db;
pub mod error;
pub mod interpreter;
pub mod navigation;
pub mod store;
pub mod voice;

pub use assistant::Assistant;
pub use backend::BackendClient;
pub use config::Config;
pub use db::DbPool;
pub use error::{Error, Result};
pub use interpreter::{Effect, Interpreter, Session, State, Transcript};
pub use navigation::{Navigator, PendingNavigation};
pub use store::LocalCache;
