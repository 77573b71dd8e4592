// Copyright (c) 2023 Mike Tsao. All rights reserved.

use crate::{EffectChain, PluginSpec, RenderConfig, TrackConfig};
use mixdown_core::{RenderError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One effect slot as it appears in a configuration file.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct EffectSettings {
    /// Plugin id. Empty means "skip this slot."
    pub effect: String,
    #[serde(default)]
    pub preset: Option<String>,
}
impl EffectSettings {
    fn to_plugin_spec(&self) -> PluginSpec {
        PluginSpec::new_with(&self.effect, non_empty(&self.preset))
    }
}

/// One track's instrument and effects.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct TrackSettings {
    pub synthesizer: String,
    #[serde(default)]
    pub preset: Option<String>,
    #[serde(default)]
    pub effect_chain: Vec<EffectSettings>,
}

/// The whole configuration file.
#[derive(Clone, Debug, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct RenderSettings {
    /// Matched to the MIDI file's renderable tracks by position.
    pub tracks: Vec<TrackSettings>,

    /// Applied to the mix of all tracks.
    #[serde(default)]
    pub master_effects: Vec<EffectSettings>,
}
impl RenderSettings {
    /// Reads YAML if the extension says so, JSON otherwise.
    pub fn new_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| RenderError::Config(format!("{}: {e}", path.display())))?;
        match path.extension().and_then(|e| e.to_str()) {
            Some("yaml") | Some("yml") => Self::new_from_yaml(&contents),
            _ => Self::new_from_json(&contents),
        }
    }

    pub fn new_from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| RenderError::Config(e.to_string()))
    }

    pub fn new_from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| RenderError::Config(e.to_string()))
    }

    pub fn to_render_config(&self) -> RenderConfig {
        RenderConfig::new_with(
            self.tracks
                .iter()
                .map(|track| {
                    TrackConfig::new_with(
                        PluginSpec::new_with(&track.synthesizer, non_empty(&track.preset)),
                        Self::chain(&track.effect_chain),
                    )
                })
                .collect(),
            Self::chain(&self.master_effects),
        )
    }

    fn chain(effects: &[EffectSettings]) -> EffectChain {
        EffectChain::new_with(effects.iter().map(EffectSettings::to_plugin_spec).collect())
    }
}

// An empty preset string means no preset.
fn non_empty(preset: &Option<String>) -> Option<&str> {
    preset.as_deref().filter(|p| !p.is_empty())
}
