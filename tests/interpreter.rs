//! Command interpreter integration tests
//!
//! Drive the interpreter the way the host does: feed transcripts, apply the
//! effects that touch the name cache, and check the resulting session.

use voice_assist::interpreter::{
    ASK_NAME, CommandOptions, LOGGED_OUT, NAME_NOT_CAUGHT, NOT_UNDERSTOOD, Transition,
};
use voice_assist::{Effect, Interpreter, LocalCache, Session, State, Transcript};

mod common;
use common::setup_test_db;

/// Apply cache effects the way the assistant host does
fn apply_cache_effects(cache: &LocalCache, transition: &Transition) {
    for effect in &transition.effects {
        match effect {
            Effect::StoreName(name) => cache.set_user_name(name).unwrap(),
            Effect::ClearName => cache.clear_user_name().unwrap(),
            _ => {}
        }
    }
}

fn spoken(transition: &Transition) -> Vec<&str> {
    transition
        .effects
        .iter()
        .filter_map(|e| match e {
            Effect::Speak(text) => Some(text.as_str()),
            _ => None,
        })
        .collect()
}

fn navigations(transition: &Transition) -> Vec<&str> {
    transition
        .effects
        .iter()
        .filter_map(|e| match e {
            Effect::Navigate(nav) => Some(nav.url()),
            _ => None,
        })
        .collect()
}

#[test]
fn test_first_run_name_capture() {
    let cache = LocalCache::new(setup_test_db());
    let interpreter = Interpreter::default();

    let session = Session::new(cache.user_name().unwrap());
    assert_eq!(session.state, State::AwaitingName);

    let start = interpreter.start(&session);
    assert_eq!(start, vec![Effect::Speak(ASK_NAME.to_string()), Effect::Arm]);

    let t = interpreter.transition(session, Transcript::new("my name is Alex"));
    apply_cache_effects(&cache, &t);

    assert_eq!(t.session.state, State::Ready);
    assert_eq!(spoken(&t), vec!["Hello Alex, how can I help you?"]);
    assert_eq!(cache.user_name().unwrap().as_deref(), Some("Alex"));
}

#[test]
fn test_name_patterns() {
    let interpreter = Interpreter::default();

    for (said, expected) in [
        ("My name is Alex", Some("Alex")),
        ("I am Priya", Some("Priya")),
        ("this is John Smith", Some("John Smith")),
        ("Maria", Some("Maria")),
        ("Mary Jane", Some("Mary Jane")),
        ("open example.com", None),
        ("my name is abcdefghijklmnopqrstuvwxyz", None),
    ] {
        let t = interpreter.transition(Session::new(None), Transcript::new(said));
        assert_eq!(t.session.user_name.as_deref(), expected, "for {said:?}");
        if expected.is_none() {
            assert_eq!(spoken(&t), vec![NAME_NOT_CAUGHT], "for {said:?}");
            assert_eq!(t.session.state, State::AwaitingName);
        }
    }
}

#[test]
fn test_every_transition_rearms() {
    let interpreter = Interpreter::default();
    let ready = Session::new(Some("Alex".to_string()));

    for said in [
        "logout",
        "open example.com",
        "play a song believer",
        "what's the weather",
        "",
    ] {
        let t = interpreter.transition(ready.clone(), Transcript::new(said));
        assert_eq!(t.effects.last(), Some(&Effect::Arm), "for {said:?}");
    }

    for said in ["logout", "my name is Alex", "???"] {
        let t = interpreter.transition(Session::new(None), Transcript::new(said));
        assert_eq!(t.effects.last(), Some(&Effect::Arm), "for {said:?}");
    }
}

#[test]
fn test_commands_are_persisted_in_ready() {
    let interpreter = Interpreter::default();
    let ready = Session::new(Some("Alex".to_string()));

    let t = interpreter.transition(ready, Transcript::new("Open GitHub.com"));

    assert!(t.effects.contains(&Effect::Persist {
        name: "Alex".to_string(),
        command: "Open GitHub.com".to_string(),
    }));
    assert_eq!(navigations(&t), vec!["https://GitHub.com"]);
}

#[test]
fn test_open_keeps_existing_scheme() {
    let interpreter = Interpreter::default();
    let ready = Session::new(Some("Alex".to_string()));

    let t = interpreter.transition(ready.clone(), Transcript::new("open http://localhost:3000"));
    assert_eq!(navigations(&t), vec!["http://localhost:3000"]);

    let t = interpreter.transition(ready, Transcript::new("open "));
    assert!(navigations(&t).is_empty());
    assert_eq!(spoken(&t), vec![NOT_UNDERSTOOD]);
}

#[test]
fn test_song_offset_modes() {
    let ready = Session::new(Some("Alex".to_string()));

    let t = Interpreter::default()
        .transition(ready.clone(), Transcript::new("play a song shape of you"));
    assert_eq!(spoken(&t), vec!["Playing shape of you on YouTube"]);

    let legacy = Interpreter::new(CommandOptions {
        legacy_song_offset: true,
        ..CommandOptions::default()
    });
    let t = legacy.transition(ready, Transcript::new("play a song shape of you"));
    assert_eq!(spoken(&t), vec!["Playing g shape of you on YouTube"]);
}

#[test]
fn test_custom_search_url() {
    let interpreter = Interpreter::new(CommandOptions {
        search_url: "https://music.example/search?q=".to_string(),
        ..CommandOptions::default()
    });

    let t = interpreter.transition(
        Session::new(Some("Alex".to_string())),
        Transcript::new("play a song rock & roll"),
    );
    assert_eq!(navigations(&t), vec!["https://music.example/search?q=rock%20%26%20roll"]);
}

#[test]
fn test_logout_round_trip_through_cache() {
    let cache = LocalCache::new(setup_test_db());
    cache.set_user_name("Alex").unwrap();
    let interpreter = Interpreter::default();

    let session = Session::new(cache.user_name().unwrap());
    assert_eq!(
        interpreter.start(&session)[0],
        Effect::Speak("Welcome, Alex. Tap anywhere to speak.".to_string())
    );

    let t = interpreter.transition(session, Transcript::new("please LOGOUT"));
    apply_cache_effects(&cache, &t);

    assert_eq!(t.session.state, State::AwaitingName);
    assert_eq!(spoken(&t), vec![LOGGED_OUT]);
    assert!(cache.user_name().unwrap().is_none());

    let restarted = Session::new(cache.user_name().unwrap());
    assert_eq!(restarted.state, State::AwaitingName);
}

#[test]
fn test_logout_while_awaiting_name_does_not_set_name() {
    let interpreter = Interpreter::default();

    let t = interpreter.transition(Session::new(None), Transcript::new("logout"));

    assert!(t.session.user_name.is_none());
    assert_eq!(spoken(&t), vec![ASK_NAME]);
}

#[test]
fn test_guard_blocks_double_start() {
    let mut interpreter = Interpreter::default();

    assert!(interpreter.try_arm());
    assert!(!interpreter.try_arm());
    interpreter.cycle_finished();
    assert!(interpreter.try_arm());
}
