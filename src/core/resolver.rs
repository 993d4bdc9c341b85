/// Runtime resolution of on-screen dialogue text to an audio file in the
/// speaking character's selected voice pack.
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;

use crate::core::dictionary::{Dictionary, KeyPage};
use crate::core::pack::{bubble_key, PackCatalog, VoicePack};
use crate::core::sanitize::{sanitize_display, PLAYER_TAG};
use crate::schema::capture::{replace_word, Capture};
use crate::schema::entry::VoiceEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameKind {
    #[default]
    Dialogue,
    /// Overhead bubble text with no translation key behind it.
    SpeechBubble,
}

/// What the host sees on screen this tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogueFrame {
    pub speaker: String,
    pub text: String,
    pub language: String,
    #[serde(default)]
    pub kind: FrameKind,
}

impl DialogueFrame {
    pub fn dialogue(
        speaker: impl Into<String>,
        text: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            speaker: speaker.into(),
            text: text.into(),
            language: language.into(),
            kind: FrameKind::Dialogue,
        }
    }

    pub fn bubble(
        speaker: impl Into<String>,
        text: impl Into<String>,
        language: impl Into<String>,
    ) -> Self {
        Self {
            kind: FrameKind::SpeechBubble,
            ..Self::dialogue(speaker, text, language)
        }
    }
}

/// Which index produced a match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Display,
    CanonicalDisplay,
    Dictionary(KeyPage),
    Bubble,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveFailure {
    #[error("no voice pack selected for {character}")]
    NoPackSelected { character: String },
    #[error("display key not found in any index: {key:?}")]
    KeyNotFound { key: String },
    #[error("display key matched but audio file is missing: {}", path.display())]
    FileMissing { path: PathBuf },
    #[error("language mismatch, {candidates} dictionary candidates and no playable match for {key:?}")]
    CrossLanguageMiss { key: String, candidates: usize },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Matched { path: PathBuf, route: Route },
    Unmatched(ResolveFailure),
}

impl Resolution {
    pub fn is_matched(&self) -> bool {
        matches!(self, Resolution::Matched { .. })
    }

    pub fn path(&self) -> Option<&std::path::Path> {
        match self {
            Resolution::Matched { path, .. } => Some(path),
            Resolution::Unmatched(_) => None,
        }
    }
}

/// Reduce on-screen text to the key the display indices are built on:
/// the farmer's name goes back to its tag, then the display sanitizer runs.
pub fn display_key(text: &str, capture: &Capture) -> String {
    let text = match capture.player_name() {
        Some(name) => replace_word(text, name, PLAYER_TAG),
        None => text.to_string(),
    };
    sanitize_display(&text.replace("\r\n", "\n"))
}

/// Resolve one stabilized frame against the speaker's selected pack.
///
/// Same-language frames use the display index with a punctuation-canonical
/// retry. A pack in another language goes through the dictionary. Bubbles
/// use the bubble index after capture stripping.
pub fn resolve(
    catalog: &PackCatalog,
    dictionary: &mut Dictionary,
    pack: Option<&VoicePack>,
    frame: &DialogueFrame,
    capture: &Capture,
) -> Resolution {
    let Some(pack) = pack else {
        return unmatched(ResolveFailure::NoPackSelected {
            character: frame.speaker.clone(),
        });
    };

    let outcome = match frame.kind {
        FrameKind::SpeechBubble => resolve_bubble(pack, &frame.text, capture),
        FrameKind::Dialogue if pack.language == frame.language => {
            resolve_same_language(pack, &display_key(&frame.text, capture))
        }
        FrameKind::Dialogue => resolve_cross_language(
            catalog,
            dictionary,
            pack,
            &frame.language,
            &display_key(&frame.text, capture),
        ),
    };

    match outcome {
        Resolution::Matched { path, route } => {
            log::debug!("{} resolved via {:?}: {}", frame.speaker, route, path.display());
            Resolution::Matched { path, route }
        }
        Resolution::Unmatched(failure) => unmatched(failure),
    }
}

fn unmatched(failure: ResolveFailure) -> Resolution {
    log::info!("Unresolved: {failure}");
    Resolution::Unmatched(failure)
}

fn playable(pack: &VoicePack, entry: &VoiceEntry, route: Route) -> Resolution {
    let path = pack.audio_path(entry);
    if path.is_file() {
        Resolution::Matched { path, route }
    } else {
        Resolution::Unmatched(ResolveFailure::FileMissing { path })
    }
}

fn resolve_same_language(pack: &VoicePack, key: &str) -> Resolution {
    if let Some(entry) = pack.lookup_display(key) {
        return playable(pack, entry, Route::Display);
    }
    match pack.lookup_canonical(key) {
        Some(entry) => playable(pack, entry, Route::CanonicalDisplay),
        None => Resolution::Unmatched(ResolveFailure::KeyNotFound {
            key: key.to_string(),
        }),
    }
}

fn resolve_cross_language(
    catalog: &PackCatalog,
    dictionary: &mut Dictionary,
    pack: &VoicePack,
    active_language: &str,
    key: &str,
) -> Resolution {
    dictionary.prime(catalog, &pack.character, &pack.language, active_language);
    let candidates = dictionary.candidates_for_display_key(&pack.character, key);

    let mut missing = None;
    for candidate in &candidates {
        let entry = dictionary
            .display_key_for(&pack.character, &pack.language, candidate)
            .and_then(|display| {
                pack.lookup_display(display)
                    .or_else(|| pack.lookup_canonical(display))
            })
            .or_else(|| pack.lookup_key_page(&candidate.key, candidate.page));

        let Some(entry) = entry else { continue };
        match playable(pack, entry, Route::Dictionary(candidate.clone())) {
            Resolution::Unmatched(ResolveFailure::FileMissing { path }) => {
                missing.get_or_insert(path);
            }
            matched => return matched,
        }
    }

    match missing {
        Some(path) => Resolution::Unmatched(ResolveFailure::FileMissing { path }),
        None => Resolution::Unmatched(ResolveFailure::CrossLanguageMiss {
            key: key.to_string(),
            candidates: candidates.len(),
        }),
    }
}

fn resolve_bubble(pack: &VoicePack, text: &str, capture: &Capture) -> Resolution {
    let key = bubble_key(&capture.strip_words(&capture.insert_placeholders(text)));
    match pack.lookup_bubble(&key) {
        Some(entry) => playable(pack, entry, Route::Bubble),
        None => Resolution::Unmatched(ResolveFailure::KeyNotFound { key }),
    }
}
