// Copyright (c) 2023 Mike Tsao. All rights reserved.

/// Names a plugin and, optionally, the preset to load into it. Used for
/// instruments and effects alike.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PluginSpec {
    pub plugin_id: String,
    pub preset_id: Option<String>,
}
impl PluginSpec {
    pub fn new_with(plugin_id: &str, preset_id: Option<&str>) -> Self {
        Self {
            plugin_id: plugin_id.to_string(),
            preset_id: preset_id.map(str::to_string),
        }
    }

    /// An empty plugin id marks a placeholder slot that does nothing.
    pub fn is_empty(&self) -> bool {
        self.plugin_id.is_empty()
    }
}

/// Effects applied one after another, left to right.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EffectChain(Vec<PluginSpec>);
impl EffectChain {
    pub fn new_with(effects: Vec<PluginSpec>) -> Self {
        Self(effects)
    }

    /// Every slot, including empty ones.
    pub fn slots(&self) -> &[PluginSpec] {
        &self.0
    }

    /// The slots that actually name an effect, in order.
    pub fn active(&self) -> impl Iterator<Item = &PluginSpec> {
        self.0.iter().filter(|spec| !spec.is_empty())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
impl From<Vec<PluginSpec>> for EffectChain {
    fn from(value: Vec<PluginSpec>) -> Self {
        Self(value)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TrackConfig {
    pub instrument: PluginSpec,
    pub effects: EffectChain,
}
impl TrackConfig {
    pub fn new_with(instrument: PluginSpec, effects: EffectChain) -> Self {
        Self {
            instrument,
            effects,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RenderConfig {
    pub track_configs: Vec<TrackConfig>,
    pub master_effects: EffectChain,
}
impl RenderConfig {
    pub fn new_with(track_configs: Vec<TrackConfig>, master_effects: EffectChain) -> Self {
        Self {
            track_configs,
            master_effects,
        }
    }

    /// The configuration for the `index`th renderable track, if there is one.
    ///
    /// Tracks and configurations are matched by position, so reordering the
    /// tracks in a MIDI file reassigns their instruments. This is the only
    /// place that knows about that rule.
    pub fn config_for_track(&self, index: usize) -> Option<&TrackConfig> {
        self.track_configs.get(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_slots_are_inactive() {
        let chain = EffectChain::new_with(vec![
            PluginSpec::new_with("gain", None),
            PluginSpec::new_with("", Some("ignored.json")),
            PluginSpec::new_with("limiter", Some("loud.json")),
        ]);
        assert_eq!(chain.len(), 3);
        let ids: Vec<&str> = chain.active().map(|s| s.plugin_id.as_str()).collect();
        assert_eq!(ids, vec!["gain", "limiter"]);
    }

    #[test]
    fn tracks_bind_by_position() {
        let config = RenderConfig::new_with(
            vec![
                TrackConfig::new_with(PluginSpec::new_with("a", None), EffectChain::default()),
                TrackConfig::new_with(PluginSpec::new_with("b", None), EffectChain::default()),
            ],
            EffectChain::default(),
        );
        assert_eq!(
            config.config_for_track(1).map(|c| c.instrument.plugin_id.as_str()),
            Some("b")
        );
        assert!(config.config_for_track(2).is_none());
    }
}
