// Copyright (c) 2023 Mike Tsao. All rights reserved.

use crate::{Delay, Gain, Limiter, Preset, ToyAudioSource, ToyEffect, ToySynth};
use mixdown_core::{
    midi::TimedEvent,
    time::SampleRate,
    traits::{Controllable, IsEffect, IsInstrument, Plugin, PluginHost},
    AudioBuffer, BufferShape, RenderError, Result, Sample,
};
use rustc_hash::FxHashMap;
use std::path::Path;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};

/// The plugins every [ToyPluginHost] knows about out of the box.
#[derive(Clone, Copy, Debug, Display, EnumIter, EnumString, IntoStaticStr, PartialEq, Eq)]
#[strum(serialize_all = "kebab-case")]
pub enum ToyPluginId {
    ToySynth,
    ToyAudioSource,
    ToyEffect,
    Gain,
    Limiter,
    Delay,
}

fn apply_preset_file(
    plugin_id: &str,
    preset_id: &str,
    target: &mut dyn Controllable,
) -> Result<()> {
    let preset = Preset::new_from_file(Path::new(preset_id))
        .map_err(|reason| RenderError::plugin_load(plugin_id, reason))?;
    log::debug!(
        "{plugin_id}: setting {} parameters from {preset_id}",
        preset.values().len()
    );
    preset
        .apply_to(target)
        .map_err(|reason| RenderError::plugin_load(plugin_id, reason))
}

/// Wraps a frame-at-a-time [IsInstrument] as a buffer-at-a-time [Plugin].
#[derive(Debug)]
pub struct InstrumentPlugin<T: IsInstrument> {
    plugin_id: String,
    instrument: T,
}
impl<T: IsInstrument> InstrumentPlugin<T> {
    pub fn new_with(plugin_id: &str, instrument: T) -> Self {
        Self {
            plugin_id: plugin_id.to_string(),
            instrument,
        }
    }

    pub fn instrument(&self) -> &T {
        &self.instrument
    }
}
impl<T: IsInstrument> Plugin for InstrumentPlugin<T> {
    fn plugin_id(&self) -> &str {
        &self.plugin_id
    }

    fn is_instrument(&self) -> bool {
        true
    }

    fn load_preset(&mut self, preset_id: &str) -> Result<()> {
        apply_preset_file(&self.plugin_id, preset_id, &mut self.instrument)
    }

    fn render_midi(
        &mut self,
        events: &[TimedEvent],
        sample_rate: SampleRate,
        duration_seconds: f64,
        channels: usize,
    ) -> Result<AudioBuffer> {
        if channels == 0 {
            return Err(RenderError::InvalidParameter(
                "can't render zero channels".to_string(),
            ));
        }
        let frames = sample_rate.frames_for_duration(duration_seconds);
        let mut buffer = AudioBuffer::new_with(BufferShape::new(channels, frames));

        self.instrument.reset(sample_rate);
        let mut events = events.iter().peekable();
        for frame in 0..frames {
            // An event lands on the frame nearest its time, so it can sound up
            // to half a frame early.
            while let Some(event) =
                events.next_if(|event| sample_rate.frame_for_time(event.time) <= frame)
            {
                if let Some((channel, message)) = event.midi_message() {
                    self.instrument.handle_midi_message(channel, &message);
                }
            }
            self.instrument.tick(1);
            let value = self.instrument.value();
            for channel in 0..channels {
                buffer.set_sample(channel, frame, value);
            }
        }
        Ok(buffer)
    }

    fn process(&mut self, _buffer: AudioBuffer, _sample_rate: SampleRate) -> Result<AudioBuffer> {
        Err(RenderError::PluginProcess {
            id: self.plugin_id.clone(),
            reason: "instruments don't process audio".to_string(),
        })
    }
}

/// Wraps a sample-at-a-time [IsEffect] as a buffer-at-a-time [Plugin].
#[derive(Debug)]
pub struct EffectPlugin<T: IsEffect> {
    plugin_id: String,
    effect: T,
}
impl<T: IsEffect> EffectPlugin<T> {
    pub fn new_with(plugin_id: &str, effect: T) -> Self {
        Self {
            plugin_id: plugin_id.to_string(),
            effect,
        }
    }

    pub fn effect(&self) -> &T {
        &self.effect
    }
}
impl<T: IsEffect> Plugin for EffectPlugin<T> {
    fn plugin_id(&self) -> &str {
        &self.plugin_id
    }

    fn is_instrument(&self) -> bool {
        false
    }

    fn load_preset(&mut self, preset_id: &str) -> Result<()> {
        apply_preset_file(&self.plugin_id, preset_id, &mut self.effect)
    }

    fn render_midi(
        &mut self,
        _events: &[TimedEvent],
        _sample_rate: SampleRate,
        _duration_seconds: f64,
        _channels: usize,
    ) -> Result<AudioBuffer> {
        Err(RenderError::NonInstrumentPlugin(self.plugin_id.clone()))
    }

    fn process(&mut self, mut buffer: AudioBuffer, sample_rate: SampleRate) -> Result<AudioBuffer> {
        self.effect.reset(sample_rate);
        for (index, channel) in buffer.channels_mut().enumerate() {
            for sample in channel.iter_mut() {
                *sample = self.effect.transform_channel(index, Sample(*sample)).0;
            }
        }
        Ok(buffer)
    }
}

type PluginFactory = Box<dyn Fn() -> Box<dyn Plugin> + Send + Sync>;

/// A [PluginHost] that serves in-process toy plugins from a registry of
/// factories. [ToyPluginHost::default()] registers everything in
/// [ToyPluginId]; more can be added with [ToyPluginHost::register()].
pub struct ToyPluginHost {
    factories: FxHashMap<String, PluginFactory>,
}
impl std::fmt::Debug for ToyPluginHost {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToyPluginHost")
            .field("plugin_ids", &self.plugin_ids())
            .finish()
    }
}
impl Default for ToyPluginHost {
    fn default() -> Self {
        let mut r = Self::new_empty();
        for id in ToyPluginId::iter() {
            let name: &'static str = id.into();
            match id {
                ToyPluginId::ToySynth => r.register_instrument::<ToySynth>(name),
                ToyPluginId::ToyAudioSource => r.register_instrument::<ToyAudioSource>(name),
                ToyPluginId::ToyEffect => r.register_effect::<ToyEffect>(name),
                ToyPluginId::Gain => r.register_effect::<Gain>(name),
                ToyPluginId::Limiter => r.register_effect::<Limiter>(name),
                ToyPluginId::Delay => r.register_effect::<Delay>(name),
            }
        }
        r
    }
}
impl PluginHost for ToyPluginHost {
    fn load_plugin(&self, plugin_id: &str) -> Result<Box<dyn Plugin>> {
        self.factories
            .get(plugin_id)
            .map(|factory| factory())
            .ok_or_else(|| RenderError::plugin_load(plugin_id, "no such plugin"))
    }
}
impl ToyPluginHost {
    /// A host that knows no plugins at all.
    pub fn new_empty() -> Self {
        Self {
            factories: Default::default(),
        }
    }

    /// Adds (or replaces) the factory for `plugin_id`.
    pub fn register<F>(&mut self, plugin_id: &str, factory: F)
    where
        F: Fn() -> Box<dyn Plugin> + Send + Sync + 'static,
    {
        self.factories
            .insert(plugin_id.to_string(), Box::new(factory));
    }

    pub fn register_instrument<T: IsInstrument + Default + 'static>(&mut self, plugin_id: &str) {
        let id = plugin_id.to_string();
        self.register(plugin_id, move || -> Box<dyn Plugin> {
            Box::new(InstrumentPlugin::new_with(&id, T::default()))
        });
    }

    pub fn register_effect<T: IsEffect + Default + 'static>(&mut self, plugin_id: &str) {
        let id = plugin_id.to_string();
        self.register(plugin_id, move || -> Box<dyn Plugin> {
            Box::new(EffectPlugin::new_with(&id, T::default()))
        });
    }

    /// Registered identifiers, sorted.
    pub fn plugin_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}
