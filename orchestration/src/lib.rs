// Copyright (c) 2023 Mike Tsao. All rights reserved.

//! This crate provides the [crate::Orchestrator] struct, which coordinates the
//! rendering of every track in a MIDI file through its configured plugins,
//! mixes the results, and masters the mix.

pub use helpers::{IOHelper, WavEncoding};
pub use mixer::MixBus;
pub use orchestrator::{
    Orchestrator, RenderOutcome, RenderParams, RenderedMix, TrackOutcome, TrackReport,
};
pub use renderer::{apply_effect_chain, render_track, RenderWindow};

pub mod helpers;

mod mixer;
mod orchestrator;
mod renderer;
