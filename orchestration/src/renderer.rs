// Copyright (c) 2023 Mike Tsao. All rights reserved.

use log::{debug, info, warn};
use mixdown_core::{
    midi::Track,
    time::SampleRate,
    traits::{Plugin, PluginHost},
    AudioBuffer, BufferShape, RenderError, Result,
};
use mixdown_settings::{EffectChain, PluginSpec, TrackConfig};

/// The fixed time window every track is rendered into. All buffers rendered
/// against the same window have the same shape, which is what lets them mix.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderWindow {
    pub sample_rate: SampleRate,
    pub channels: usize,
    pub duration_seconds: f64,
}
impl RenderWindow {
    /// The longest window we'll allocate buffers for.
    pub const MAX_SECONDS: f64 = 60.0 * 60.0;

    pub fn new_with(sample_rate: SampleRate, channels: usize, duration_seconds: f64) -> Self {
        Self {
            sample_rate,
            channels,
            duration_seconds,
        }
    }

    pub fn frames(&self) -> usize {
        self.sample_rate.frames_for_duration(self.duration_seconds)
    }

    pub fn shape(&self) -> BufferShape {
        BufferShape::new(self.channels, self.frames())
    }

    /// Fails with [RenderError::InvalidParameter] unless the window is a
    /// finite, non-negative duration no longer than [Self::MAX_SECONDS].
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=Self::MAX_SECONDS).contains(&self.duration_seconds) {
            return Err(RenderError::InvalidParameter(format!(
                "render length {}s is outside [0, {}]",
                self.duration_seconds,
                Self::MAX_SECONDS
            )));
        }
        Ok(())
    }
}

fn load(host: &dyn PluginHost, spec: &PluginSpec) -> Result<Box<dyn Plugin>> {
    let mut plugin = host.load_plugin(&spec.plugin_id)?;
    if let Some(preset_id) = &spec.preset_id {
        debug!("applying preset {preset_id} to {}", spec.plugin_id);
        plugin.load_preset(preset_id)?;
    }
    Ok(plugin)
}

/// Plays `track` through its configured instrument and effect chain.
///
/// Returns `Ok(None)` if the configured instrument turns out not to accept
/// MIDI. That's logged and the caller leaves the track out of the mix.
pub fn render_track(
    host: &dyn PluginHost,
    track: &Track,
    config: &TrackConfig,
    window: &RenderWindow,
) -> Result<Option<AudioBuffer>> {
    let instrument_id = &config.instrument.plugin_id;
    let mut instrument = load(host, &config.instrument)?;
    if !instrument.is_instrument() {
        let error = RenderError::NonInstrumentPlugin(instrument_id.clone());
        warn!("skipping track {}: {error}", track.source_index);
        return Ok(None);
    }

    info!(
        "rendering track {} ({} events) with {instrument_id}",
        track.source_index,
        track.events.len()
    );
    let buffer = instrument.render_midi(
        &track.events,
        window.sample_rate,
        window.duration_seconds,
        window.channels,
    )?;
    let expected = window.shape();
    if buffer.shape() != expected {
        return Err(RenderError::InstrumentShape {
            plugin_id: instrument_id.clone(),
            expected,
            actual: buffer.shape(),
        });
    }

    apply_effect_chain(host, &config.effects, buffer, window.sample_rate).map(Some)
}

/// Runs `buffer` through each non-empty slot of `chain`, in order. Every
/// effect must hand back a buffer of the shape it was given.
pub fn apply_effect_chain(
    host: &dyn PluginHost,
    chain: &EffectChain,
    buffer: AudioBuffer,
    sample_rate: SampleRate,
) -> Result<AudioBuffer> {
    let mut buffer = buffer;
    for spec in chain.active() {
        let mut effect = load(host, spec)?;
        let expected = buffer.shape();
        buffer = effect.process(buffer, sample_rate)?;
        if buffer.shape() != expected {
            return Err(RenderError::EffectShape {
                plugin_id: spec.plugin_id.clone(),
                expected,
                actual: buffer.shape(),
            });
        }
    }
    Ok(buffer)
}
