/// Pack index builder: numbers audio files for canonical segments and
/// indexes them into a [`VoicePack`].
use rustc_hash::{FxHashMap, FxHashSet};
use std::path::Path;
use thiserror::Error;

use crate::core::canonical::canonicalize;
use crate::core::pack::VoicePack;
use crate::schema::entry::VoiceEntry;
use crate::schema::line::{Gender, RawLine, Segment};
use crate::schema::source::SourceKey;

pub const DEFAULT_AUDIO_EXTENSION: &str = "ogg";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("empty display pattern for {origin} page {page}")]
    EmptyPattern { origin: String, page: u32 },
    #[error("audio file {audio} is already assigned to a different line")]
    DuplicateAudio { audio: String },
}

/// `{n}[_{gender}].{ext}`
pub fn audio_file_name(number: u32, gender: Gender, extension: &str) -> String {
    match gender.suffix() {
        Some(suffix) => format!("{number}_{suffix}.{extension}"),
        None => format!("{number}.{extension}"),
    }
}

/// Result of a build: the pack plus every entry that could not be indexed.
#[derive(Debug)]
pub struct BuildReport {
    pub pack: VoicePack,
    pub skipped: Vec<BuildError>,
}

/// Accumulates entries for one (character, language) pack.
///
/// Identical display patterns share one audio file, so the display index
/// and the translation-key index always agree for every entry.
pub struct PackBuilder {
    pack: VoicePack,
    extension: String,
    next_number: u32,
    audio_by_pattern: FxHashMap<String, String>,
    used_audio: FxHashSet<String>,
    skipped: Vec<BuildError>,
}

impl PackBuilder {
    pub fn new(name: &str, character: &str, language: &str, root: &Path) -> Self {
        Self {
            pack: VoicePack::new(name, character, language, root),
            extension: DEFAULT_AUDIO_EXTENSION.to_string(),
            next_number: 1,
            audio_by_pattern: FxHashMap::default(),
            used_audio: FxHashSet::default(),
            skipped: Vec::new(),
        }
    }

    pub fn extension(mut self, extension: &str) -> Self {
        self.extension = extension.trim_start_matches('.').to_string();
        self
    }

    /// Index one segment under an explicit sequence number.
    ///
    /// An entry whose display pattern is empty, or whose numbered file is
    /// already taken by another pattern, is rejected and recorded; the
    /// build carries on.
    pub fn push(
        &mut self,
        source: &SourceKey,
        translation_key: Option<&str>,
        segment: &Segment,
        number: u32,
    ) -> Result<&VoiceEntry, BuildError> {
        match self.try_push(source, translation_key, segment, number) {
            Ok(()) => Ok(&self.pack.entries()[self.pack.len() - 1]),
            Err(e) => {
                log::warn!("Skipping entry: {e}");
                self.skipped.push(e.clone());
                Err(e)
            }
        }
    }

    fn try_push(
        &mut self,
        source: &SourceKey,
        translation_key: Option<&str>,
        segment: &Segment,
        number: u32,
    ) -> Result<(), BuildError> {
        if segment.display_text.trim().is_empty() {
            return Err(BuildError::EmptyPattern {
                origin: source.to_string(),
                page: segment.page,
            });
        }

        let audio = match self.audio_by_pattern.get(&segment.display_text) {
            Some(existing) => existing.clone(),
            None => {
                let audio = audio_file_name(number, segment.gender, &self.extension);
                if !self.used_audio.insert(audio.clone()) {
                    return Err(BuildError::DuplicateAudio { audio });
                }
                self.audio_by_pattern
                    .insert(segment.display_text.clone(), audio.clone());
                audio
            }
        };

        self.pack.insert(VoiceEntry {
            source: source.clone(),
            display_text: segment.display_text.clone(),
            audio,
            translation_key: translation_key.map(str::to_string),
            page: segment.page,
            gender: segment.gender,
        });
        Ok(())
    }

    /// Canonicalize a raw line and index every segment, numbering new audio
    /// files sequentially. Returns how many segments were indexed.
    pub fn push_line(&mut self, line: &RawLine) -> usize {
        let key = line.effective_translation_key();
        let mut indexed = 0;

        for segment in canonicalize(&line.text) {
            let reused = self.audio_by_pattern.contains_key(&segment.display_text);
            let number = self.next_number;
            if self.push(&line.source, key.as_deref(), &segment, number).is_ok() {
                indexed += 1;
                if !reused {
                    self.next_number += 1;
                }
            }
        }

        indexed
    }

    pub fn finish(self) -> BuildReport {
        log::info!(
            "Built pack {}/{}: {} entries, {} skipped",
            self.pack.character,
            self.pack.language,
            self.pack.len(),
            self.skipped.len()
        );
        BuildReport {
            pack: self.pack,
            skipped: self.skipped,
        }
    }
}
