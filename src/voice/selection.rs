//! Synthesis voice selection

use serde::{Deserialize, Serialize};

/// Perceived gender of a synthesis voice
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoiceGender {
    Female,
    Male,
    Neutral,
}

/// A voice offered by the synthesis service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoiceInfo {
    pub name: &'static str,
    pub gender: VoiceGender,
}

/// Voices offered by `OpenAI` TTS
pub const OPENAI_VOICES: &[VoiceInfo] = &[
    VoiceInfo { name: "alloy", gender: VoiceGender::Neutral },
    VoiceInfo { name: "echo", gender: VoiceGender::Male },
    VoiceInfo { name: "fable", gender: VoiceGender::Neutral },
    VoiceInfo { name: "onyx", gender: VoiceGender::Male },
    VoiceInfo { name: "nova", gender: VoiceGender::Female },
    VoiceInfo { name: "shimmer", gender: VoiceGender::Female },
];

/// Configured voice preferences
#[derive(Debug, Clone, Default)]
pub struct VoicePreferences {
    /// Name fragments to look for, most preferred first
    pub names: Vec<String>,
    /// Gender to fall back on when no named voice is offered
    pub gender: Option<VoiceGender>,
}

/// Picks a voice from a catalog
///
/// Preferred names are tried in order (case-insensitive substring match),
/// then the preferred gender, then the first voice in the catalog.
#[derive(Debug, Clone)]
pub struct VoiceSelector {
    preferences: VoicePreferences,
}

impl VoiceSelector {
    #[must_use]
    pub const fn new(preferences: VoicePreferences) -> Self {
        Self { preferences }
    }

    /// Select a voice, or `None` for an empty catalog
    #[must_use]
    pub fn select<'a>(&self, catalog: &'a [VoiceInfo]) -> Option<&'a VoiceInfo> {
        let by_name = self.preferences.names.iter().find_map(|wanted| {
            let wanted = wanted.trim().to_lowercase();
            if wanted.is_empty() {
                return None;
            }
            catalog
                .iter()
                .find(|v| v.name.to_lowercase().contains(&wanted))
        });

        let chosen = by_name
            .or_else(|| {
                self.preferences
                    .gender
                    .and_then(|g| catalog.iter().find(|v| v.gender == g))
            })
            .or_else(|| catalog.first());

        if let Some(voice) = chosen {
            tracing::debug!(voice = voice.name, "voice selected");
        }
        chosen
    }
}
