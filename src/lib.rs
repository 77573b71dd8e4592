// Copyright (c) 2023 Mike Tsao. All rights reserved.

//! Mixdown renders a MIDI file into a mixed, mastered WAV file. Each track of
//! the file is played through its own instrument plugin and effect chain, the
//! results are summed on a master bus, and the master chain runs over the
//! sum.
//!
//! The work is spread over several crates, re-exported here:
//!
//! - [mixdown_core] has the buffer, time, and plugin traits.
//! - [mixdown_midi] reads MIDI files and resolves their timing.
//! - [mixdown_settings] reads render configurations.
//! - [mixdown_orchestration] runs the pipeline.
//! - [mixdown_toys] has the built-in plugins.

pub use mixdown_core::{AudioBuffer, BufferShape, RenderError};
pub use mixdown_midi::{resolve_timing, MidiFile, ResolvedPerformance};
pub use mixdown_orchestration::{
    IOHelper, Orchestrator, RenderOutcome, RenderParams, RenderedMix, TrackOutcome, WavEncoding,
};
pub use mixdown_settings::{RenderConfig, RenderSettings};
pub use mixdown_toys::ToyPluginHost;

/// The version string reported by the CLI.
pub fn app_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
