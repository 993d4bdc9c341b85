/// Multilingual dictionary: maps display text in any loaded language back
/// to (translation key, page) pairs, so a line shown in one language can be
/// voiced by a pack recorded in another.
use rustc_hash::{FxHashMap, FxHashSet};

use crate::core::pack::PackCatalog;
use crate::core::punctuation::canonical_punctuation;

/// A stable, language-independent line reference.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyPage {
    pub key: String,
    pub page: u32,
}

impl KeyPage {
    pub fn new(key: impl Into<String>, page: u32) -> Self {
        Self {
            key: key.into(),
            page,
        }
    }
}

#[derive(Debug, Default)]
struct CharacterIndex {
    languages: FxHashSet<String>,
    by_display: FxHashMap<String, Vec<KeyPage>>,
    by_canonical: FxHashMap<String, Vec<KeyPage>>,
    display_for: FxHashMap<(String, KeyPage), String>,
}

impl CharacterIndex {
    fn add(&mut self, language: &str, display: &str, key_page: KeyPage) {
        push_unique(self.by_display.entry(display.to_string()).or_default(), &key_page);
        push_unique(
            self.by_canonical
                .entry(canonical_punctuation(display))
                .or_default(),
            &key_page,
        );
        self.display_for
            .entry((language.to_string(), key_page))
            .or_insert_with(|| display.to_string());
    }
}

fn push_unique(list: &mut Vec<KeyPage>, key_page: &KeyPage) {
    if !list.contains(key_page) {
        list.push(key_page.clone());
    }
}

/// Session-scoped cache, populated lazily and cleared when the session ends.
#[derive(Debug, Default)]
pub struct Dictionary {
    session: Option<String>,
    characters: FxHashMap<String, CharacterIndex>,
    primed: FxHashSet<(String, String, String)>,
}

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind the cache to a session. A different session id drops
    /// everything loaded for the previous one.
    pub fn begin_session(&mut self, session: &str) {
        if self.session.as_deref() != Some(session) {
            self.clear();
            self.session = Some(session.to_string());
        }
    }

    pub fn session(&self) -> Option<&str> {
        self.session.as_deref()
    }

    /// Forget every loaded language and the session binding.
    pub fn clear(&mut self) {
        if !self.characters.is_empty() {
            log::debug!("Clearing dictionary for {} characters", self.characters.len());
        }
        self.session = None;
        self.characters.clear();
        self.primed.clear();
    }

    pub fn is_loaded(&self, character: &str, language: &str) -> bool {
        self.characters
            .get(character)
            .map(|c| c.languages.contains(language))
            .unwrap_or(false)
    }

    /// Merge every pack of the given languages for a character. Languages
    /// already loaded are skipped. Returns how many languages were added.
    pub fn ensure_loaded(
        &mut self,
        catalog: &PackCatalog,
        character: &str,
        languages: &[&str],
    ) -> usize {
        let index = self.characters.entry(character.to_string()).or_default();
        let mut added = 0;

        for &language in languages {
            if !index.languages.insert(language.to_string()) {
                continue;
            }
            added += 1;

            let mut entries = 0usize;
            for pack in catalog.packs_in_language(character, language) {
                for entry in pack.entries() {
                    if let Some(key) = &entry.translation_key {
                        index.add(language, &entry.display_text, KeyPage::new(key, entry.page));
                        entries += 1;
                    }
                }
            }
            log::debug!("Dictionary loaded {character}/{language}: {entries} keyed entries");
        }

        added
    }

    /// Load both languages the first time a (character, pack language,
    /// active language) mismatch is seen in this session.
    pub fn prime(
        &mut self,
        catalog: &PackCatalog,
        character: &str,
        pack_language: &str,
        active_language: &str,
    ) {
        let marker = (
            character.to_string(),
            pack_language.to_string(),
            active_language.to_string(),
        );
        if self.primed.contains(&marker) {
            return;
        }
        self.ensure_loaded(catalog, character, &[active_language, pack_language]);
        self.primed.insert(marker);
    }

    /// Candidate line references for a display key, in any loaded language.
    /// Falls back to punctuation-canonical matching when the exact key is
    /// unknown.
    pub fn candidates_for_display_key(&self, character: &str, key: &str) -> Vec<KeyPage> {
        let Some(index) = self.characters.get(character) else {
            return Vec::new();
        };
        if let Some(found) = index.by_display.get(key) {
            return found.clone();
        }
        index
            .by_canonical
            .get(&canonical_punctuation(key))
            .cloned()
            .unwrap_or_default()
    }

    /// The display key a line has in a specific language.
    pub fn display_key_for(
        &self,
        character: &str,
        language: &str,
        key_page: &KeyPage,
    ) -> Option<&str> {
        self.characters
            .get(character)?
            .display_for
            .get(&(language.to_string(), key_page.clone()))
            .map(String::as_str)
    }
}
