//! Name extraction from spoken introductions

use std::sync::LazyLock;

use regex::Regex;

/// Longest name the assistant will accept, in characters
pub const MAX_NAME_LEN: usize = 25;

/// Introduction patterns, tried in order; first match wins
static NAME_PATTERNS: LazyLock<[Regex; 4]> = LazyLock::new(|| {
    [
        Regex::new(r"(?i)\bmy name is (.+)").expect("valid regex"),
        Regex::new(r"(?i)\bi am (.+)").expect("valid regex"),
        Regex::new(r"(?i)\bthis is (.+)").expect("valid regex"),
        Regex::new(r"(?i)^([a-z]+(?:\s+[a-z]+)?)$").expect("valid regex"),
    ]
});

/// Extract a user's name from an utterance
///
/// Returns `None` when no pattern matches, the captured name is blank, or it
/// is longer than [`MAX_NAME_LEN`] characters.
#[must_use]
pub fn extract_name(utterance: &str) -> Option<String> {
    let name = NAME_PATTERNS
        .iter()
        .find_map(|pattern| pattern.captures(utterance))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())?;

    if name.is_empty() || name.chars().count() > MAX_NAME_LEN {
        tracing::debug!(utterance, "rejected name");
        return None;
    }

    Some(name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_introduction_patterns() {
        assert_eq!(extract_name("my name is Alex").as_deref(), Some("Alex"));
        assert_eq!(extract_name("My Name Is Alex Smith").as_deref(), Some("Alex Smith"));
        assert_eq!(extract_name("I am Priya").as_deref(), Some("Priya"));
        assert_eq!(extract_name("this is Sam").as_deref(), Some("Sam"));
        assert_eq!(extract_name("hello, my name is Jo").as_deref(), Some("Jo"));
    }

    #[test]
    fn test_bare_name() {
        assert_eq!(extract_name("Alex").as_deref(), Some("Alex"));
        assert_eq!(extract_name("Mary Jane").as_deref(), Some("Mary Jane"));
        assert!(extract_name("one two three").is_none());
        assert!(extract_name("R2D2").is_none());
    }

    #[test]
    fn test_first_pattern_wins() {
        // "my name is" is tried before "i am"
        assert_eq!(
            extract_name("my name is Kim and I am here").as_deref(),
            Some("Kim and I am here")
        );
    }

    #[test]
    fn test_length_limit() {
        let exact = "a".repeat(MAX_NAME_LEN);
        assert_eq!(extract_name(&exact).as_deref(), Some(exact.as_str()));

        let long = format!("my name is {}", "b".repeat(MAX_NAME_LEN + 1));
        assert!(extract_name(&long).is_none());
    }

    #[test]
    fn test_blank_and_empty() {
        assert!(extract_name("").is_none());
        assert!(extract_name("my name is    ").is_none());
    }

    #[test]
    fn test_word_boundary() {
        // "hi am..." must not read as "i am"
        assert!(extract_name("hi amy how are you").is_none());
    }
}
