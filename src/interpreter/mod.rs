//! Command interpreter
//!
//! A small state machine over recognized transcripts. [`Interpreter::transition`]
//! is pure: it takes the current [`Session`] and one [`Transcript`] and returns
//! the next session plus the [`Effect`]s the host must carry out (speak, open a
//! URL, persist, re-arm capture). The only mutable state the interpreter keeps
//! is the guard that allows one recognition cycle at a time.

mod command;
mod name;

pub use command::{Command, CommandOptions, DEFAULT_SEARCH_URL, classify, site_url};
pub use name::{MAX_NAME_LEN, extract_name};

use crate::navigation::PendingNavigation;

/// Spoken when no name is known
pub const ASK_NAME: &str = "Hello, may I know your good name please?";

/// Spoken when a name could not be extracted
pub const NAME_NOT_CAUGHT: &str = "I didn't catch your name clearly. Please try again.";

/// Spoken when a command arrives before a name was given
pub const NAME_FIRST: &str = "Please tell me your name first.";

/// Spoken after logging out
pub const LOGGED_OUT: &str = "Logged out. Please tell me your name to continue.";

/// Spoken for unrecognized commands
pub const NOT_UNDERSTOOD: &str = "Sorry, I didn't understand that.";

/// Interpreter state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    /// Waiting for the user to say their name
    AwaitingName,
    /// Name known, accepting commands
    Ready,
}

/// In-memory state for the current user interaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_name: Option<String>,
    pub state: State,
    pub last_command: Option<String>,
}

impl Session {
    /// Create a session from the cached user name, if any
    #[must_use]
    pub fn new(cached_name: Option<String>) -> Self {
        let user_name = cached_name.filter(|n| !n.trim().is_empty());
        let state = if user_name.is_some() {
            State::Ready
        } else {
            State::AwaitingName
        };

        Self {
            user_name,
            state,
            last_command: None,
        }
    }

    /// A session with no user
    #[must_use]
    pub const fn anonymous() -> Self {
        Self {
            user_name: None,
            state: State::AwaitingName,
            last_command: None,
        }
    }
}

/// Finalized text of one recognition cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript(String);

impl Transcript {
    /// Create a transcript, trimming surrounding whitespace
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        let text: String = text.into();
        Self(text.trim().to_string())
    }

    /// Transcript text
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume into the inner string
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

/// Side effect requested by a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Speak a response, cancelling any in-flight utterance
    Speak(String),
    /// Write the user name to the durable cache
    StoreName(String),
    /// Remove the user name from the durable cache
    ClearName,
    /// Register the user with the persistence backend
    RegisterUser { name: String },
    /// Record a spoken command with the persistence backend; `name`
    /// re-registers the user if the backend no longer knows the device
    Persist { name: String, command: String },
    /// Hand a URL to the hosting environment
    Navigate(PendingNavigation),
    /// Start another recognition cycle
    Arm,
}

/// Result of a transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub session: Session,
    pub effects: Vec<Effect>,
}

impl Transition {
    fn new(session: Session, mut effects: Vec<Effect>) -> Self {
        effects.push(Effect::Arm);
        Self { session, effects }
    }
}

/// The command interpreter
#[derive(Debug, Default)]
pub struct Interpreter {
    options: CommandOptions,
    recognizing: bool,
}

impl Interpreter {
    /// Create an interpreter with the given command options
    #[must_use]
    pub const fn new(options: CommandOptions) -> Self {
        Self {
            options,
            recognizing: false,
        }
    }

    /// Effects to run when the assistant starts
    ///
    /// A cached user is registered again so the backend knows the device
    /// even if it was reset or unreachable when the name was captured.
    #[must_use]
    pub fn start(&self, session: &Session) -> Vec<Effect> {
        match (&session.state, &session.user_name) {
            (State::Ready, Some(name)) => vec![
                Effect::Speak(format!("Welcome, {name}. Tap anywhere to speak.")),
                Effect::RegisterUser { name: name.clone() },
                Effect::Arm,
            ],
            _ => vec![Effect::Speak(ASK_NAME.to_string()), Effect::Arm],
        }
    }

    /// Apply one transcript to the session
    #[must_use]
    pub fn transition(&self, session: Session, transcript: Transcript) -> Transition {
        match session.state {
            State::AwaitingName => Self::on_awaiting_name(session, &transcript),
            State::Ready => self.on_ready(session, transcript),
        }
    }

    fn on_awaiting_name(session: Session, transcript: &Transcript) -> Transition {
        let spoken = transcript.as_str();

        if spoken.to_lowercase().contains("logout") {
            tracing::debug!("logout while awaiting name");
            return Transition::new(session, vec![Effect::Speak(ASK_NAME.to_string())]);
        }

        let Some(name) = extract_name(spoken) else {
            tracing::info!(transcript = spoken, "name not recognized");
            return Transition::new(session, vec![Effect::Speak(NAME_NOT_CAUGHT.to_string())]);
        };

        tracing::info!(name = %name, "user identified");
        let effects = vec![
            Effect::StoreName(name.clone()),
            Effect::RegisterUser { name: name.clone() },
            Effect::Speak(format!("Hello {name}, how can I help you?")),
        ];

        Transition::new(
            Session {
                user_name: Some(name),
                state: State::Ready,
                last_command: session.last_command,
            },
            effects,
        )
    }

    fn on_ready(&self, session: Session, transcript: Transcript) -> Transition {
        let Some(name) = session.user_name.clone() else {
            tracing::warn!("ready without a user name");
            return Transition::new(
                Session {
                    state: State::AwaitingName,
                    ..session
                },
                vec![Effect::Speak(NAME_FIRST.to_string())],
            );
        };

        let command = transcript.into_inner();
        let mut effects = vec![Effect::Persist {
            name: name.clone(),
            command: command.clone(),
        }];

        let classified = classify(&command, &self.options);
        tracing::info!(command = %command, ?classified, "command received");

        let next = Session {
            user_name: Some(name),
            state: State::Ready,
            last_command: Some(command),
        };

        match classified {
            Command::Logout => {
                effects.push(Effect::ClearName);
                effects.push(Effect::Speak(LOGGED_OUT.to_string()));
                Transition::new(Session::anonymous(), effects)
            }
            Command::Open { url } => {
                effects.push(Effect::Navigate(PendingNavigation::new(url)));
                Transition::new(next, effects)
            }
            Command::PlaySong { song, url } => {
                effects.push(Effect::Speak(format!("Playing {song} on YouTube")));
                effects.push(Effect::Navigate(PendingNavigation::new(url)));
                Transition::new(next, effects)
            }
            Command::Unknown => {
                effects.push(Effect::Speak(NOT_UNDERSTOOD.to_string()));
                Transition::new(next, effects)
            }
        }
    }

    /// Claim the recognition guard
    ///
    /// Returns `true` if the caller should start the capture device, `false`
    /// if a cycle is already active.
    pub const fn try_arm(&mut self) -> bool {
        if self.recognizing {
            return false;
        }
        self.recognizing = true;
        true
    }

    /// Release the recognition guard after a result, error or end event
    pub const fn cycle_finished(&mut self) {
        self.recognizing = false;
    }

    /// Whether a recognition cycle is active
    #[must_use]
    pub const fn is_recognizing(&self) -> bool {
        self.recognizing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ready(name: &str) -> Session {
        Session::new(Some(name.to_string()))
    }

    fn speech(effects: &[Effect]) -> Vec<&str> {
        effects
            .iter()
            .filter_map(|e| match e {
                Effect::Speak(text) => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_initial_state() {
        assert_eq!(Session::new(None).state, State::AwaitingName);
        assert_eq!(Session::new(Some("  ".to_string())).state, State::AwaitingName);
        assert_eq!(ready("Alex").state, State::Ready);
    }

    #[test]
    fn test_start_effects() {
        let interpreter = Interpreter::default();

        let effects = interpreter.start(&Session::new(None));
        assert_eq!(speech(&effects), vec![ASK_NAME]);
        assert_eq!(effects.last(), Some(&Effect::Arm));

        assert!(!effects.iter().any(|e| matches!(e, Effect::RegisterUser { .. })));

        let effects = interpreter.start(&ready("Alex"));
        assert_eq!(speech(&effects), vec!["Welcome, Alex. Tap anywhere to speak."]);
        assert!(effects.contains(&Effect::RegisterUser {
            name: "Alex".to_string()
        }));
        assert_eq!(effects.last(), Some(&Effect::Arm));
    }

    #[test]
    fn test_name_capture() {
        let interpreter = Interpreter::default();
        let t = interpreter.transition(Session::new(None), Transcript::new("my name is Alex"));

        assert_eq!(t.session.state, State::Ready);
        assert_eq!(t.session.user_name.as_deref(), Some("Alex"));
        assert!(t.effects.contains(&Effect::StoreName("Alex".to_string())));
        assert!(t.effects.contains(&Effect::RegisterUser {
            name: "Alex".to_string()
        }));
        assert_eq!(speech(&t.effects), vec!["Hello Alex, how can I help you?"]);
        assert_eq!(t.effects.last(), Some(&Effect::Arm));
    }

    #[test]
    fn test_name_rejected() {
        let interpreter = Interpreter::default();
        let start = Session::new(None);
        let t = interpreter.transition(start.clone(), Transcript::new("1234 5678 90"));

        assert_eq!(t.session, start);
        assert_eq!(
            t.effects,
            vec![Effect::Speak(NAME_NOT_CAUGHT.to_string()), Effect::Arm]
        );
    }

    #[test]
    fn test_logout_while_awaiting_name_reprompts() {
        let interpreter = Interpreter::default();
        let t = interpreter.transition(Session::new(None), Transcript::new("logout"));

        assert_eq!(t.session.state, State::AwaitingName);
        assert!(t.session.user_name.is_none());
        assert_eq!(t.effects, vec![Effect::Speak(ASK_NAME.to_string()), Effect::Arm]);
    }

    #[test]
    fn test_ready_persists_before_acting() {
        let interpreter = Interpreter::default();
        let t = interpreter.transition(ready("Alex"), Transcript::new("what time is it"));

        assert_eq!(
            t.effects.first(),
            Some(&Effect::Persist {
                name: "Alex".to_string(),
                command: "what time is it".to_string(),
            })
        );
        assert_eq!(t.session.last_command.as_deref(), Some("what time is it"));
        assert_eq!(speech(&t.effects), vec![NOT_UNDERSTOOD]);
        assert_eq!(t.session.state, State::Ready);
    }

    #[test]
    fn test_logout_clears_session() {
        let interpreter = Interpreter::default();
        let t = interpreter.transition(ready("Alex"), Transcript::new("Logout this account"));

        assert_eq!(t.session, Session::anonymous());
        assert!(t.effects.contains(&Effect::ClearName));
        assert_eq!(speech(&t.effects), vec![LOGGED_OUT]);
    }

    #[test]
    fn test_open_navigates() {
        let interpreter = Interpreter::default();
        let t = interpreter.transition(ready("Alex"), Transcript::new("open example.com"));

        assert!(t.effects.contains(&Effect::Navigate(PendingNavigation::new(
            "https://example.com"
        ))));
        assert!(speech(&t.effects).is_empty());
        assert_eq!(t.session.state, State::Ready);
    }

    #[test]
    fn test_play_song_announces_and_navigates() {
        let interpreter = Interpreter::default();
        let t = interpreter.transition(ready("Alex"), Transcript::new("play a song shape of you"));

        assert_eq!(speech(&t.effects), vec!["Playing shape of you on YouTube"]);
        assert!(t.effects.iter().any(|e| matches!(
            e,
            Effect::Navigate(nav) if nav.url().ends_with("search_query=shape%20of%20you")
        )));
    }

    #[test]
    fn test_ready_without_name_guard() {
        let interpreter = Interpreter::default();
        let broken = Session {
            user_name: None,
            state: State::Ready,
            last_command: None,
        };
        let t = interpreter.transition(broken, Transcript::new("open example.com"));

        assert_eq!(t.session.state, State::AwaitingName);
        assert_eq!(t.effects, vec![Effect::Speak(NAME_FIRST.to_string()), Effect::Arm]);
    }

    #[test]
    fn test_recognition_guard() {
        let mut interpreter = Interpreter::default();

        assert!(interpreter.try_arm());
        assert!(!interpreter.try_arm());
        assert!(interpreter.is_recognizing());

        interpreter.cycle_finished();
        assert!(!interpreter.is_recognizing());
        assert!(interpreter.try_arm());
    }

    #[test]
    fn test_transcript_trimmed() {
        assert_eq!(Transcript::new("  open example.com \n").as_str(), "open example.com");
    }
}
