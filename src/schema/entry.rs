use serde::{Deserialize, Serialize};

use super::line::Gender;
use super::source::SourceKey;

/// Format tag written by the current canonicalization scheme.
pub const CURRENT_FORMAT: u32 = 2;
/// Format tag of packs keyed under the older one-file-per-raw-line scheme.
pub const LEGACY_FORMAT: u32 = 1;

/// A single voiced line inside a pack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceEntry {
    /// Provenance of the line.
    pub source: SourceKey,
    /// The DisplayPattern this entry is looked up by.
    pub display_text: String,
    /// Audio file path, relative to the pack directory.
    pub audio: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub translation_key: Option<String>,
    #[serde(default)]
    pub page: u32,
    #[serde(default, skip_serializing_if = "Gender::is_none")]
    pub gender: Gender,
}

/// Entries for one (character, language) pair inside a pack document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackSection {
    pub character: String,
    pub language: String,
    #[serde(default)]
    pub entries: Vec<VoiceEntry>,
}

/// On-disk document holding one or more pack sections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackDocument {
    pub format: u32,
    #[serde(default)]
    pub packs: Vec<PackSection>,
}

impl PackDocument {
    pub fn new(packs: Vec<PackSection>) -> Self {
        Self {
            format: CURRENT_FORMAT,
            packs,
        }
    }
}

/// An entry recorded under the legacy scheme: one audio file per raw line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyEntry {
    /// Free-form provenance tag as the old tooling wrote it.
    #[serde(default)]
    pub source: String,
    /// The raw script text the audio was recorded for.
    pub text: String,
    /// The display pattern the old scheme computed.
    #[serde(default)]
    pub pattern: String,
    /// Audio path relative to the legacy pack directory.
    pub audio: String,
}

/// Legacy pack document for a single (character, language).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegacyDocument {
    #[serde(default = "legacy_format")]
    pub format: u32,
    pub character: String,
    pub language: String,
    #[serde(default)]
    pub entries: Vec<LegacyEntry>,
}

fn legacy_format() -> u32 {
    LEGACY_FORMAT
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_omits_empty_optionals() {
        let entry = VoiceEntry {
            source: SourceKey::SpeechBubble {
                character: "Gus".to_string(),
                index: 0,
            },
            display_text: "Welcome!".to_string(),
            audio: "1.ogg".to_string(),
            translation_key: None,
            page: 0,
            gender: Gender::None,
        };
        let json = serde_json::to_string(&entry).unwrap();
        assert!(!json.contains("translation_key"));
        assert!(!json.contains("gender"));
    }

    #[test]
    fn legacy_document_defaults_format() {
        let json = r#"{"character":"Gus","language":"en","entries":[{"text":"Hi","audio":"a.ogg"}]}"#;
        let doc: LegacyDocument = serde_json::from_str(json).unwrap();
        assert_eq!(doc.format, LEGACY_FORMAT);
        assert_eq!(doc.entries[0].pattern, "");
    }
}
