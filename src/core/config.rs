/// Engine configuration, loaded from RON.
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Ticks the on-screen text must stay unchanged before it is resolved.
    pub stable_ticks: u32,
    /// Consecutive ticks without a dialogue box before returning to idle.
    pub absent_ticks: u32,
    /// Ticks between playback disposal sweeps.
    pub sweep_interval_ticks: u32,
    pub audio_extension: String,
    /// Fallback language when a frame does not say which one is active.
    pub default_language: String,
    /// Character name → pack name chosen for that character.
    pub pack_selection: HashMap<String, String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            stable_ticks: 3,
            absent_ticks: 4,
            sweep_interval_ticks: 30,
            audio_extension: "ogg".to_string(),
            default_language: "en".to_string(),
            pack_selection: HashMap::new(),
        }
    }
}

impl EngineConfig {
    pub fn load_from_ron(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    pub fn parse_ron(input: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = ron::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.stable_ticks == 0 {
            return Err(ConfigError::Invalid("stable_ticks must be at least 1".to_string()));
        }
        if self.absent_ticks == 0 {
            return Err(ConfigError::Invalid("absent_ticks must be at least 1".to_string()));
        }
        if self.sweep_interval_ticks == 0 {
            return Err(ConfigError::Invalid(
                "sweep_interval_ticks must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_take_defaults() {
        let config = EngineConfig::parse_ron("(stable_ticks: 5)").unwrap();
        assert_eq!(config.stable_ticks, 5);
        assert_eq!(config.absent_ticks, 4);
        assert_eq!(config.audio_extension, "ogg");
    }

    #[test]
    fn pack_selection_parses() {
        let config = EngineConfig::parse_ron(
            r#"(pack_selection: {"Abigail": "abigail_fr", "Sam": "sam_voices"})"#,
        )
        .unwrap();
        assert_eq!(config.pack_selection["Abigail"], "abigail_fr");
    }

    #[test]
    fn zero_debounce_rejected() {
        assert!(matches!(
            EngineConfig::parse_ron("(stable_ticks: 0)"),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn load_fixture() {
        let path = std::path::PathBuf::from("tests/fixtures/engine.ron");
        let config = EngineConfig::load_from_ron(&path).unwrap();
        assert_eq!(config.stable_ticks, 2);
        assert_eq!(config.pack_selection.get("Abigail").map(String::as_str), Some("abigail"));
    }
}
