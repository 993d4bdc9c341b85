use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a raw dialogue line was harvested from.
///
/// Each category carries its own structured payload. Adapters build one of
/// these per content-sheet entry; the core only uses it for provenance and
/// to synthesize a stable translation key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SourceKey {
    /// A character dialogue sheet entry (`Characters/Dialogue/<character>`).
    Dialogue { character: String, key: String },
    /// A `speak` command embedded in an event script.
    Event {
        location: String,
        event: String,
        speak_index: usize,
    },
    /// Festival dialogue for a character.
    Festival { festival: String, key: String },
    /// Gift-taste reaction line.
    Gift { character: String, taste: String },
    /// Movie theater reaction or concession line.
    Movie { movie: String, key: String },
    /// Marriage dialogue sheet entry.
    Marriage { character: String, key: String },
    /// Overhead speech bubble. Has no translation key.
    SpeechBubble { character: String, index: usize },
    /// A generic strings sheet entry.
    Strings { sheet: String, key: String },
}

impl SourceKey {
    /// Stable cross-language key for this source, if the category has one.
    ///
    /// Event lines have no sheet key of their own, so a "speak index" key
    /// is synthesized from the event id and the ordinal of the speak command.
    pub fn translation_key(&self) -> Option<String> {
        match self {
            Self::Dialogue { character, key } => {
                Some(format!("Characters/Dialogue/{character}:{key}"))
            }
            Self::Event {
                location,
                event,
                speak_index,
            } => Some(format!("Data/Events/{location}:{event}:speak{speak_index}")),
            Self::Festival { festival, key } => Some(format!("Data/Festivals/{festival}:{key}")),
            Self::Gift { character, taste } => {
                Some(format!("Data/NPCGiftTastes:{character}:{taste}"))
            }
            Self::Movie { movie, key } => Some(format!("Data/Movies:{movie}:{key}")),
            Self::Marriage { character, key } => {
                Some(format!("Characters/Dialogue/MarriageDialogue{character}:{key}"))
            }
            Self::SpeechBubble { .. } => None,
            Self::Strings { sheet, key } => Some(format!("Strings/{sheet}:{key}")),
        }
    }

    /// Short category name, used in logs and lint output.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Dialogue { .. } => "dialogue",
            Self::Event { .. } => "event",
            Self::Festival { .. } => "festival",
            Self::Gift { .. } => "gift",
            Self::Movie { .. } => "movie",
            Self::Marriage { .. } => "marriage",
            Self::SpeechBubble { .. } => "speech_bubble",
            Self::Strings { .. } => "strings",
        }
    }
}

impl fmt::Display for SourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SpeechBubble { character, index } => {
                write!(f, "speech_bubble:{character}#{index}")
            }
            other => match other.translation_key() {
                Some(key) => write!(f, "{}:{}", other.category(), key),
                None => f.write_str(other.category()),
            },
        }
    }
}
