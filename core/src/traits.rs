// Copyright (c) 2023 Mike Tsao. All rights reserved.

pub use crate::midi::HandlesMidi;

use crate::{
    midi::TimedEvent, time::SampleRate, AudioBuffer, ParameterType, Result, Sample,
};

/// An [IsInstrument] produces audio, usually upon request from MIDI input.
pub trait IsInstrument:
    Generates<Sample> + Ticks + HandlesMidi + Controllable + Send + std::fmt::Debug
{
}

/// An [IsEffect] transforms audio. It takes audio inputs and produces audio
/// output. It does not get called unless there is audio input to provide to it
/// (which can include silence, e.g., in the case of a muted instrument).
pub trait IsEffect: TransformsAudio + Controllable + Resets + Send + std::fmt::Debug {}

/// Something that [Generates] creates the given type as its work product over
/// time.
pub trait Generates<V>: Send + std::fmt::Debug + Ticks {
    /// The value for the current frame. Advance the frame by calling
    /// Ticks::tick().
    fn value(&self) -> V;
}

/// Since the Ticks family of traits don't get access to a global clock, they
/// have to maintain internal clocks and trust that they'll be asked to tick
/// exactly the same number of times as everyone else in the system.
/// Resets::reset() ensures that everyone starts from the beginning at the same
/// time, and that everyone agrees how long a tick lasts.
pub trait Resets {
    /// The entity should reset its internal state.
    #[allow(unused_variables)]
    fn reset(&mut self, sample_rate: SampleRate) {}
}

pub trait Ticks: Resets + Send + std::fmt::Debug {
    /// The entity should perform work for the current frame or frames.
    /// Successive tick()s represent successive frames, and state for a frame
    /// is valid *after* tick() has been called for it.
    fn tick(&mut self, tick_count: usize);
}

/// A [TransformsAudio] takes input audio, does something to it, and then
/// outputs it. It's what effects do.
pub trait TransformsAudio: std::fmt::Debug {
    /// `channel` is an index into the buffer's channels. Implementations that
    /// keep per-channel state must size it from the channel indexes they see.
    fn transform_channel(&mut self, channel: usize, input_sample: Sample) -> Sample;
}

/// Something that is [Controllable] exposes a set of named parameters. Presets
/// are applied through this interface.
pub trait Controllable {
    fn control_index_count(&self) -> usize;
    fn control_index_for_name(&self, name: &str) -> Option<usize>;
    fn control_name_for_index(&self, index: usize) -> Option<&'static str>;
    fn control_set_param_by_index(&mut self, index: usize, value: ParameterType);

    /// Returns false if there is no such parameter.
    fn control_set_param_by_name(&mut self, name: &str, value: ParameterType) -> bool {
        if let Some(index) = self.control_index_for_name(name) {
            self.control_set_param_by_index(index, value);
            true
        } else {
            false
        }
    }
}

/// A loaded plugin instance, as handed out by a [PluginHost].
///
/// Instances aren't shared: every track render asks the host for its own, so
/// implementations need not be [Sync].
pub trait Plugin: Send + std::fmt::Debug {
    /// The identifier the host loaded this plugin by.
    fn plugin_id(&self) -> &str;

    /// Whether the plugin accepts MIDI input.
    fn is_instrument(&self) -> bool;

    /// Applies the named parameter snapshot.
    fn load_preset(&mut self, preset_id: &str) -> Result<()>;

    /// Plays `events` and returns exactly `duration_seconds` of audio with
    /// `channels` channels. Events after the end are never heard.
    fn render_midi(
        &mut self,
        events: &[TimedEvent],
        sample_rate: SampleRate,
        duration_seconds: f64,
        channels: usize,
    ) -> Result<AudioBuffer>;

    /// Transforms `buffer`. Well-behaved effects keep its shape.
    fn process(&mut self, buffer: AudioBuffer, sample_rate: SampleRate) -> Result<AudioBuffer>;
}

/// Loads plugins by identifier.
///
/// A host is a stateless factory: each call returns a fresh instance, so one
/// host can serve several render threads at once.
pub trait PluginHost: Send + Sync {
    fn load_plugin(&self, plugin_id: &str) -> Result<Box<dyn Plugin>>;
}
