//! Spoken command classification

use std::sync::LazyLock;

use regex::Regex;

/// Prefix that asks the assistant to open a site
const OPEN_PREFIX: &str = "open ";

/// Prefix that asks the assistant to search for a song
const PLAY_PREFIX: &str = "play a song ";

/// Offset the first release sliced song names at
const LEGACY_SONG_OFFSET: usize = 10;

/// Default video search endpoint; the encoded query is appended
pub const DEFAULT_SEARCH_URL: &str = "https://www.youtube.com/results?search_query=";

static SCHEME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9+.\-]*://").expect("valid regex"));

/// Options that shape command classification
#[derive(Debug, Clone)]
pub struct CommandOptions {
    /// Search URL the encoded song query is appended to
    pub search_url: String,

    /// Slice song names at the first release's 10-character offset instead
    /// of stripping the whole prefix
    pub legacy_song_offset: bool,
}

impl Default for CommandOptions {
    fn default() -> Self {
        Self {
            search_url: DEFAULT_SEARCH_URL.to_string(),
            legacy_song_offset: false,
        }
    }
}

/// A classified command
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Forget the current user
    Logout,
    /// Open a site in the browser
    Open { url: String },
    /// Search the video site for a song
    PlaySong { song: String, url: String },
    /// Nothing matched
    Unknown,
}

/// Classify a spoken command
///
/// Matching is case-insensitive; arguments keep the speaker's casing.
#[must_use]
pub fn classify(spoken: &str, options: &CommandOptions) -> Command {
    let lower = spoken.to_lowercase();

    if lower.contains("logout") {
        return Command::Logout;
    }

    if let Some(site) = strip_prefix_ignore_case(spoken, OPEN_PREFIX) {
        let site = site.trim();
        if !site.is_empty() {
            return Command::Open {
                url: site_url(site),
            };
        }
    }

    if strip_prefix_ignore_case(spoken, PLAY_PREFIX).is_some() {
        let offset = if options.legacy_song_offset {
            LEGACY_SONG_OFFSET
        } else {
            PLAY_PREFIX.len()
        };
        // The prefix is ASCII, so any offset within it is a char boundary
        let song = spoken.get(offset..).unwrap_or_default().trim();
        if !song.is_empty() {
            let url = format!("{}{}", options.search_url, urlencoding::encode(song));
            return Command::PlaySong {
                song: song.to_string(),
                url,
            };
        }
    }

    Command::Unknown
}

/// Turn a spoken site into a URL, adding `https://` when no scheme is given
#[must_use]
pub fn site_url(site: &str) -> String {
    if SCHEME.is_match(site) {
        site.to_string()
    } else {
        format!("https://{site}")
    }
}

fn strip_prefix_ignore_case<'a>(text: &'a str, prefix: &str) -> Option<&'a str> {
    let head = text.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &text[prefix.len()..])
}
