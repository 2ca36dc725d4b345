// Engine configuration: voice ranges and scoring weights.
//
// `EngineConfig` gathers every tunable the engine reads, so nothing in the
// generator or the leading search relies on magic numbers. Defaults are the
// classical SATB ranges and the standard voice-leading weights. Configs load
// from JSON; any field a file omits keeps its default, so a file can override
// a single range or weight.
//
// See voicing.rs for `VoiceRanges` and leading.rs for `LeadingWeights`.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::HarmonyError;
use crate::leading::LeadingWeights;
use crate::voicing::VoiceRanges;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub ranges: VoiceRanges,
    pub weights: LeadingWeights,
}

impl EngineConfig {
    /// Load a config from a JSON file.
    pub fn load(path: &Path) -> Result<Self, HarmonyError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, HarmonyError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Write the config as pretty-printed JSON.
    pub fn save(&self, path: &Path) -> Result<(), HarmonyError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voicing::VoiceRange;

    #[test]
    fn test_empty_json_is_default() {
        let config = EngineConfig::from_json("{}").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.weights.parallel_fifths, -1000);
    }

    #[test]
    fn test_partial_override() {
        let config = EngineConfig::from_json(
            r#"{"weights": {"commonTone": 80}, "ranges": {"soprano": {"low": 62, "high": 81}}}"#,
        )
        .unwrap();
        assert_eq!(config.weights.common_tone, 80);
        assert_eq!(config.weights.motion_per_semitone, -2);
        assert_eq!(config.ranges.soprano, VoiceRange::new(62, 81));
        assert_eq!(config.ranges.bass, VoiceRange::new(40, 60));
    }

    #[test]
    fn test_bad_json_is_an_error() {
        assert!(matches!(
            EngineConfig::from_json("{\"weights\": 3}"),
            Err(HarmonyError::Json(_))
        ));
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.json");
        let mut config = EngineConfig::default();
        config.weights.voice_crossing = -40;
        config.save(&path).unwrap();
        assert_eq!(EngineConfig::load(&path).unwrap(), config);
    }
}
