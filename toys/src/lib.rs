// Copyright (c) 2023 Mike Tsao. All rights reserved.

//! `mixdown-toys` contains "toy" plugins and the host that serves them. They
//! implement the core traits in a simple fashion: enough to render a MIDI
//! file into something audible and to exercise every stage of the pipeline,
//! but not likely to be useful in real music production.

pub use effects::{Delay, Gain, Limiter, ToyEffect};
pub use host::{EffectPlugin, InstrumentPlugin, ToyPluginHost, ToyPluginId};
pub use instruments::{Oscillator, ToyAudioSource, ToySynth, Waveform};
pub use presets::Preset;

mod effects;
mod host;
mod instruments;
mod presets;
