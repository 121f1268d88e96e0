// Data-driven engine configuration.
//
// All tunable engine parameters live in `EngineConfig`, loadable from JSON.
// Every field has a named default (`Default` impl + `#[serde(default)]`), so
// a config file only needs to mention what it changes.
//
// `scale` and `voice_defaults` are starting values for a host that builds
// voices from this config (the CLI does). The engine itself never reads a
// scale from here: every call takes the current scale as a parameter.
//
// See also: `mutation.rs` for `MutationConfig`, `voice.rs` for
// `VoiceConfig`.

use crate::error::{EngineError, Result};
use crate::mutation::MutationConfig;
use crate::scale::{Scale, ScaleKind};
use crate::voice::VoiceConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Seed for the engine's `StepRng`.
    pub seed: u64,
    /// Resolve pitch collisions between sounding voices.
    pub counterpoint: bool,
    /// Let an empty position selection stay empty (density 0 means silence)
    /// instead of falling back to a single step.
    pub allow_zero_positions: bool,
    pub mutation: MutationConfig,
    /// Initial scale for hosts that build voices from this config.
    pub scale: Scale,
    /// Template for new voices.
    pub voice_defaults: VoiceConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            seed: 0x100f,
            counterpoint: true,
            allow_zero_positions: false,
            mutation: MutationConfig::default(),
            scale: Scale::from_kind(ScaleKind::Major),
            voice_defaults: VoiceConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Load from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|source| EngineError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&json)
    }
}
