/// Voice packs: loaded entries plus the indices the resolver looks them up by.
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::core::lexicon::is_description;
use crate::core::punctuation::canonical_punctuation;
use crate::core::sanitize::PLAYER_TAG;
use crate::schema::capture::{FARMER_PLACEHOLDER, FARM_PLACEHOLDER};
use crate::schema::entry::{PackDocument, PackSection, VoiceEntry, CURRENT_FORMAT};

static RE_BRACKET_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[[A-Za-z0-9:]+\]").unwrap());
static RE_HORIZONTAL_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[ \t]+").unwrap());

const FARM_TAG: &str = "[FarmName]";

#[derive(Debug, Error)]
pub enum PackError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unsupported pack format {found} (expected {expected})")]
    UnsupportedFormat { found: u32, expected: u32 },
}

/// Lookup key for speech-bubble text, which has no translation key.
///
/// Farmer and farm names map to their numbered placeholders and every
/// other dynamic substitution is dropped, so a pattern from a pack and a
/// captured on-screen bubble reduce to the same key.
pub fn bubble_key(text: &str) -> String {
    let text = text
        .replace(PLAYER_TAG, FARMER_PLACEHOLDER)
        .replace(FARM_TAG, FARM_PLACEHOLDER);
    let stripped = RE_BRACKET_TAG.replace_all(&text, |caps: &Captures| {
        if is_description(&caps[0]) {
            String::new()
        } else {
            caps[0].to_string()
        }
    });
    let collapsed = RE_HORIZONTAL_WS.replace_all(&stripped, " ");
    canonical_punctuation(&collapsed)
}

/// All entries for one (content pack, character, language), immutable
/// after load.
#[derive(Debug, Clone)]
pub struct VoicePack {
    pub name: String,
    pub character: String,
    pub language: String,
    pub format: u32,
    /// Directory audio paths are relative to.
    pub root: PathBuf,
    entries: Vec<VoiceEntry>,
    by_display: FxHashMap<String, usize>,
    by_key_page: FxHashMap<(String, u32), usize>,
    by_canonical: FxHashMap<String, usize>,
    by_bubble: FxHashMap<String, usize>,
    by_audio: FxHashMap<String, Vec<usize>>,
}

impl VoicePack {
    pub fn new(
        name: impl Into<String>,
        character: impl Into<String>,
        language: impl Into<String>,
        root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            character: character.into(),
            language: language.into(),
            format: CURRENT_FORMAT,
            root: root.into(),
            entries: Vec::new(),
            by_display: FxHashMap::default(),
            by_key_page: FxHashMap::default(),
            by_canonical: FxHashMap::default(),
            by_bubble: FxHashMap::default(),
            by_audio: FxHashMap::default(),
        }
    }

    pub fn from_section(name: &str, section: PackSection, root: &Path) -> Self {
        let mut pack = Self::new(name, section.character, section.language, root);
        for entry in section.entries {
            pack.insert(entry);
        }
        pack
    }

    /// Add an entry and index it. The first entry seen for a key keeps it.
    pub fn insert(&mut self, entry: VoiceEntry) {
        let idx = self.entries.len();

        self.by_display
            .entry(entry.display_text.clone())
            .or_insert(idx);
        self.by_canonical
            .entry(canonical_punctuation(&entry.display_text))
            .or_insert(idx);
        if let Some(key) = &entry.translation_key {
            self.by_key_page
                .entry((key.clone(), entry.page))
                .or_insert(idx);
        } else {
            self.by_bubble
                .entry(bubble_key(&entry.display_text))
                .or_insert(idx);
        }
        self.by_audio
            .entry(entry.audio.clone())
            .or_default()
            .push(idx);

        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[VoiceEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn lookup_display(&self, pattern: &str) -> Option<&VoiceEntry> {
        self.by_display.get(pattern).map(|&i| &self.entries[i])
    }

    /// Display lookup after punctuation canonicalization of both sides.
    pub fn lookup_canonical(&self, pattern: &str) -> Option<&VoiceEntry> {
        self.by_canonical
            .get(&canonical_punctuation(pattern))
            .map(|&i| &self.entries[i])
    }

    pub fn lookup_key_page(&self, key: &str, page: u32) -> Option<&VoiceEntry> {
        self.by_key_page
            .get(&(key.to_string(), page))
            .map(|&i| &self.entries[i])
    }

    /// `key` must already be a [`bubble_key`].
    pub fn lookup_bubble(&self, key: &str) -> Option<&VoiceEntry> {
        self.by_bubble.get(key).map(|&i| &self.entries[i])
    }

    /// Reverse audio table: every entry voiced by the given file.
    pub fn entries_for_audio(&self, audio: &str) -> Vec<&VoiceEntry> {
        self.by_audio
            .get(audio)
            .map(|idxs| idxs.iter().map(|&i| &self.entries[i]).collect())
            .unwrap_or_default()
    }

    /// Absolute location of an entry's audio file.
    pub fn audio_path(&self, entry: &VoiceEntry) -> PathBuf {
        self.root.join(&entry.audio)
    }

    /// DisplayPattern → audio path, ordered for comparison.
    pub fn display_index(&self) -> BTreeMap<String, String> {
        self.by_display
            .iter()
            .map(|(k, &i)| (k.clone(), self.entries[i].audio.clone()))
            .collect()
    }

    /// (TranslationKey, page) → audio path, ordered for comparison.
    pub fn key_page_index(&self) -> BTreeMap<(String, u32), String> {
        self.by_key_page
            .iter()
            .map(|(k, &i)| (k.clone(), self.entries[i].audio.clone()))
            .collect()
    }

    pub fn to_section(&self) -> PackSection {
        PackSection {
            character: self.character.clone(),
            language: self.language.clone(),
            entries: self.entries.clone(),
        }
    }
}

/// Read a pack document without interpreting it.
pub fn read_document(path: &Path) -> Result<PackDocument, PackError> {
    let contents = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&contents)?)
}

/// Load every pack section of a current-format document. Audio paths are
/// resolved against the document's directory.
pub fn load_packs(path: &Path) -> Result<Vec<VoicePack>, PackError> {
    let doc = read_document(path)?;
    if doc.format != CURRENT_FORMAT {
        return Err(PackError::UnsupportedFormat {
            found: doc.format,
            expected: CURRENT_FORMAT,
        });
    }

    let root = path.parent().unwrap_or_else(|| Path::new("."));
    let name = pack_name(path);
    Ok(doc
        .packs
        .into_iter()
        .map(|section| VoicePack::from_section(&name, section, root))
        .collect())
}

/// Write packs as one current-format document.
pub fn save_packs(packs: &[&VoicePack], path: &Path) -> Result<(), PackError> {
    let doc = PackDocument::new(packs.iter().map(|p| p.to_section()).collect());
    save_document(&doc, path)
}

pub fn save_document(doc: &PackDocument, path: &Path) -> Result<(), PackError> {
    let json = serde_json::to_string_pretty(doc)?;
    write_atomic(path, json.as_bytes())?;
    Ok(())
}

/// Write through a temporary sibling file, then rename over the target.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)
}

fn pack_name(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("pack")
        .to_string()
}

/// Every loaded pack, grouped by character.
#[derive(Debug, Clone, Default)]
pub struct PackCatalog {
    packs: FxHashMap<String, Vec<VoicePack>>,
}

impl PackCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, pack: VoicePack) {
        self.packs
            .entry(pack.character.clone())
            .or_default()
            .push(pack);
    }

    /// Append every pack of `other`, keeping load order.
    pub fn merge(&mut self, other: PackCatalog) {
        let mut characters: Vec<_> = other.packs.into_iter().collect();
        characters.sort_by(|a, b| a.0.cmp(&b.0));
        for (_, packs) in characters {
            for pack in packs {
                self.insert(pack);
            }
        }
    }

    /// Recursively load every `.json` pack document under `dir`.
    ///
    /// A document that fails to parse, or is not current-format, is logged
    /// and skipped; the rest of the directory still loads.
    pub fn load_dir(dir: &Path) -> Result<Self, PackError> {
        let mut catalog = Self::new();
        catalog.load_dir_into(dir)?;
        log::info!(
            "Loaded {} voice packs for {} characters from {}",
            catalog.len(),
            catalog.packs.len(),
            dir.display()
        );
        Ok(catalog)
    }

    fn load_dir_into(&mut self, dir: &Path) -> Result<(), PackError> {
        let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(|e| e.ok().map(|e| e.path()))
            .collect();
        paths.sort();

        for path in paths {
            if path.is_dir() {
                self.load_dir_into(&path)?;
            } else if path.extension().and_then(|s| s.to_str()) == Some("json") {
                match load_packs(&path) {
                    Ok(packs) => {
                        log::debug!("Loaded {} pack sections from {}", packs.len(), path.display());
                        for pack in packs {
                            self.insert(pack);
                        }
                    }
                    Err(e) => log::warn!("Skipping pack document {}: {}", path.display(), e),
                }
            }
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.packs.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn packs_for(&self, character: &str) -> &[VoicePack] {
        self.packs.get(character).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Packs for a character in one language, in load order.
    pub fn packs_in_language<'a>(
        &'a self,
        character: &str,
        language: &'a str,
    ) -> impl Iterator<Item = &'a VoicePack> + 'a {
        self.packs_for(character)
            .iter()
            .filter(move |p| p.language == language)
    }

    pub fn find(&self, character: &str, name: &str, language: &str) -> Option<&VoicePack> {
        self.packs_for(character)
            .iter()
            .find(|p| p.name == name && p.language == language)
    }

    /// Languages any pack offers for a character, sorted and unique.
    pub fn languages_for(&self, character: &str) -> Vec<String> {
        let mut langs: Vec<String> = self
            .packs_for(character)
            .iter()
            .map(|p| p.language.clone())
            .collect();
        langs.sort();
        langs.dedup();
        langs
    }
}
