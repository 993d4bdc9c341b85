/// Dynamic-substitution capture for the active game context.
use regex::Regex;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

/// Placeholder the game substitutes with the farmer's name in bubbles.
pub const FARMER_PLACEHOLDER: &str = "{0}";
/// Placeholder the game substitutes with the farm name in bubbles.
pub const FARM_PLACEHOLDER: &str = "{1}";

/// Host-provided view of the player and world state that feeds dynamic
/// substitutions into displayed text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldSnapshot {
    #[serde(default)]
    pub player_name: String,
    #[serde(default)]
    pub farm_name: String,
    #[serde(default)]
    pub pet_name: Option<String>,
    #[serde(default)]
    pub spouse_name: Option<String>,
    #[serde(default)]
    pub children: Vec<String>,
    #[serde(default)]
    pub favorite_thing: Option<String>,
    /// Canonical first choice of each randomized lexicon token on the page.
    #[serde(default)]
    pub lexicon_choices: Vec<String>,
}

/// Words substituted into the current page, built fresh per context and
/// never persisted.
#[derive(Debug, Clone, Default)]
pub struct Capture {
    player_name: Option<String>,
    farm_name: Option<String>,
    words: FxHashSet<String>,
}

impl Capture {
    pub fn from_world(world: &WorldSnapshot) -> Self {
        let mut words = FxHashSet::default();
        let optional = [&world.pet_name, &world.spouse_name, &world.favorite_thing];
        for word in optional.into_iter().flatten() {
            insert_word(&mut words, word);
        }
        for word in world.children.iter().chain(&world.lexicon_choices) {
            insert_word(&mut words, word);
        }

        Self {
            player_name: non_empty(&world.player_name),
            farm_name: non_empty(&world.farm_name),
            words,
        }
    }

    pub fn words(&self) -> &FxHashSet<String> {
        &self.words
    }

    pub fn player_name(&self) -> Option<&str> {
        self.player_name.as_deref()
    }

    /// Put the numbered farmer/farm placeholders back where the game
    /// substituted them. The longer name is replaced first so a farm named
    /// after the farmer is not split.
    pub fn insert_placeholders(&self, text: &str) -> String {
        let mut names: Vec<(&str, &str)> = Vec::new();
        if let Some(player) = self.player_name.as_deref() {
            names.push((player, FARMER_PLACEHOLDER));
        }
        if let Some(farm) = self.farm_name.as_deref() {
            names.push((farm, FARM_PLACEHOLDER));
        }
        names.sort_by(|a, b| b.0.len().cmp(&a.0.len()));

        let mut out = text.to_string();
        for (name, placeholder) in names {
            out = replace_word(&out, name, placeholder);
        }
        out
    }

    /// Remove every captured word, longest first, on word boundaries.
    pub fn strip_words(&self, text: &str) -> String {
        if self.words.is_empty() {
            return text.to_string();
        }

        let mut sorted: Vec<&String> = self.words.iter().collect();
        sorted.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        let alternation = sorted
            .iter()
            .map(|w| regex::escape(w))
            .collect::<Vec<_>>()
            .join("|");

        match Regex::new(&format!(r"\b(?:{alternation})\b")) {
            Ok(re) => re.replace_all(text, "").into_owned(),
            Err(e) => {
                log::warn!("capture pattern rejected, leaving text untouched: {e}");
                text.to_string()
            }
        }
    }
}

/// Replace whole-word occurrences of `word`. A name that starts or ends
/// with punctuation is only bounded on its word-character edges.
pub fn replace_word(text: &str, word: &str, replacement: &str) -> String {
    if word.is_empty() {
        return text.to_string();
    }
    let edge = |c: Option<char>| match c {
        Some(c) if c.is_alphanumeric() || c == '_' => r"\b",
        _ => "",
    };
    let pattern = format!(
        "{}{}{}",
        edge(word.chars().next()),
        regex::escape(word),
        edge(word.chars().last())
    );
    match Regex::new(&pattern) {
        Ok(re) => re.replace_all(text, regex::NoExpand(replacement)).into_owned(),
        Err(e) => {
            log::warn!("name pattern rejected, leaving text untouched: {e}");
            text.to_string()
        }
    }
}

fn insert_word(words: &mut FxHashSet<String>, word: &str) {
    let trimmed = word.trim();
    if !trimmed.is_empty() {
        words.insert(trimmed.to_string());
    }
}

fn non_empty(s: &str) -> Option<String> {
    let trimmed = s.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn world() -> WorldSnapshot {
        WorldSnapshot {
            player_name: "Alex".to_string(),
            farm_name: "Alex Acres".to_string(),
            pet_name: Some("Biscuit".to_string()),
            spouse_name: Some("Haley".to_string()),
            children: vec!["Pip".to_string()],
            favorite_thing: Some("Pizza".to_string()),
            lexicon_choices: vec!["lovely".to_string()],
        }
    }

    #[test]
    fn capture_collects_dynamic_words() {
        let capture = Capture::from_world(&world());
        for w in ["Biscuit", "Haley", "Pip", "Pizza", "lovely"] {
            assert!(capture.words().contains(w), "missing {w}");
        }
        assert!(!capture.words().contains("Alex"));
    }

    #[test]
    fn placeholders_prefer_longer_name() {
        let capture = Capture::from_world(&world());
        let out = capture.insert_placeholders("Alex, welcome to Alex Acres!");
        assert_eq!(out, "{0}, welcome to {1}!");
    }

    #[test]
    fn strip_respects_word_boundaries() {
        let capture = Capture::from_world(&world());
        let out = capture.strip_words("Pip and Pippa ate Pizza");
        assert_eq!(out, " and Pippa ate ");
    }

    #[test]
    fn placeholders_leave_longer_words_alone() {
        let capture = Capture::from_world(&WorldSnapshot {
            player_name: "Al".to_string(),
            farm_name: "Oak".to_string(),
            ..WorldSnapshot::default()
        });
        assert_eq!(
            capture.insert_placeholders("Also, Al, the Oakland trees at Oak are tall."),
            "Also, {0}, the Oakland trees at {1} are tall."
        );
    }

    #[test]
    fn replace_word_handles_punctuated_names() {
        assert_eq!(replace_word("Hi, J.D.!", "J.D.", "{0}"), "Hi, {0}!");
        assert_eq!(replace_word("Alan and Al", "Al", "@"), "Alan and @");
    }

    #[test]
    fn empty_world_is_inert() {
        let capture = Capture::from_world(&WorldSnapshot::default());
        assert_eq!(capture.insert_placeholders("Hello"), "Hello");
        assert_eq!(capture.strip_words("Hello"), "Hello");
        assert!(capture.player_name().is_none());
    }
}
