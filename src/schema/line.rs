use serde::{Deserialize, Serialize};
use std::fmt;

use super::source::SourceKey;

/// A raw script line exactly as an adapter harvested it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawLine {
    pub source: SourceKey,
    pub language: String,
    pub text: String,
    /// Explicit translation key. When absent the source's own key is used.
    #[serde(default)]
    pub translation_key: Option<String>,
}

impl RawLine {
    pub fn new(source: SourceKey, language: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            source,
            language: language.into(),
            text: text.into(),
            translation_key: None,
        }
    }

    pub fn with_translation_key(mut self, key: impl Into<String>) -> Self {
        self.translation_key = Some(key.into());
        self
    }

    /// The adapter-supplied key, falling back to the one the source synthesizes.
    pub fn effective_translation_key(&self) -> Option<String> {
        self.translation_key
            .clone()
            .or_else(|| self.source.translation_key())
    }
}

/// Gender variant a segment was expanded for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    #[default]
    None,
    Male,
    Female,
    Nonbinary,
}

impl Gender {
    /// Filename suffix for gendered audio, `None` for ungendered lines.
    pub fn suffix(&self) -> Option<&'static str> {
        match self {
            Self::None => None,
            Self::Male => Some("male"),
            Self::Female => Some("female"),
            Self::Nonbinary => Some("nonbinary"),
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Gender for the n-th alternative of a gender switch.
    pub fn from_alternative(index: usize) -> Self {
        match index {
            0 => Self::Male,
            1 => Self::Female,
            _ => Self::Nonbinary,
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix().unwrap_or("none"))
    }
}

/// One canonical text segment emitted for a raw line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    /// Unique, strictly increasing within the raw line.
    pub page: u32,
    /// Production reference text with portrait tags kept.
    pub actor_text: String,
    /// Canonical lookup key (DisplayPattern).
    pub display_text: String,
    pub gender: Gender,
}
