//! Assistant-to-backend integration tests
//!
//! Runs the persistence API on a local port and drives the assistant with
//! typed input, then checks what the backend recorded for the device.

use std::io::Cursor;

use tokio::io::BufReader;
use voice_assist::navigation::ConsoleNavigator;
use voice_assist::voice::{ConsoleCapture, ConsoleSpeaker};
use voice_assist::{Assistant, BackendClient, Interpreter, LocalCache, db};

mod common;
use common::{serve_test_backend, setup_test_db};

fn typed(input: &str) -> Box<ConsoleCapture> {
    Box::new(ConsoleCapture::from_reader(BufReader::new(Cursor::new(
        input.as_bytes().to_vec(),
    ))))
}

/// Run the assistant over `input` until the input is exhausted
async fn run_with_backend(cache: &LocalCache, url: &str, input: &str) {
    let backend = BackendClient::new(url, cache.device_id().unwrap()).unwrap();

    Assistant::new(
        Interpreter::default(),
        typed(input),
        Box::new(ConsoleSpeaker),
        Box::new(ConsoleNavigator),
        cache.clone(),
    )
    .unwrap()
    .with_backend(backend)
    .run_until(std::future::pending())
    .await
    .unwrap();
}

#[tokio::test]
async fn test_new_user_commands_are_recorded_in_order() {
    let url = serve_test_backend(setup_test_db()).await;
    let cache = LocalCache::new(db::init_memory().unwrap());

    run_with_backend(
        &cache,
        &url,
        "my name is Alex\nopen example.com\nplay a song shape of you\nwhat time is it\n",
    )
    .await;

    let client = BackendClient::new(&url, cache.device_id().unwrap()).unwrap();
    let user = client.fetch_user().await.unwrap().expect("user should be registered");

    assert_eq!(user.name, "Alex");
    assert_eq!(
        user.commands,
        vec!["open example.com", "play a song shape of you", "what time is it"]
    );
    assert_eq!(user.last_command.as_deref(), Some("what time is it"));
}

#[tokio::test]
async fn test_cached_user_registers_with_fresh_backend() {
    let url = serve_test_backend(setup_test_db()).await;
    let cache = LocalCache::new(db::init_memory().unwrap());
    cache.set_user_name("Sam").unwrap();

    run_with_backend(&cache, &url, "open example.com\nplay a song hello\n").await;

    let client = BackendClient::new(&url, cache.device_id().unwrap()).unwrap();
    let user = client.fetch_user().await.unwrap().expect("user should be registered");

    assert_eq!(user.name, "Sam");
    assert_eq!(user.commands, vec!["open example.com", "play a song hello"]);
}

#[tokio::test]
async fn test_restart_keeps_appending_history() {
    let url = serve_test_backend(setup_test_db()).await;
    let cache = LocalCache::new(db::init_memory().unwrap());

    run_with_backend(&cache, &url, "i am Priya\nopen example.com\n").await;
    run_with_backend(&cache, &url, "open github.com\n").await;

    let client = BackendClient::new(&url, cache.device_id().unwrap()).unwrap();
    let user = client.fetch_user().await.unwrap().unwrap();

    assert_eq!(user.name, "Priya");
    assert_eq!(user.commands, vec!["open example.com", "open github.com"]);
}

#[tokio::test]
async fn test_unknown_device_is_registered_before_logging() {
    let url = serve_test_backend(setup_test_db()).await;
    let client = BackendClient::new(&url, "device-reset").unwrap();

    assert!(client.fetch_user().await.unwrap().is_none());
    assert!(matches!(
        client.log_command("hello").await,
        Err(voice_assist::Error::NotFound(_))
    ));

    client.log_command_as("Kim", "hello").await.unwrap();

    let user = client.fetch_user().await.unwrap().unwrap();
    assert_eq!(user.name, "Kim");
    assert_eq!(user.commands, vec!["hello"]);
}
