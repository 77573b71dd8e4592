// Copyright (c) 2023 Mike Tsao. All rights reserved.

use crate::BufferShape;
use thiserror::Error;

/// Everything that can go wrong while turning a MIDI file into audio.
///
/// Only [RenderError::NonInstrumentPlugin] is recoverable: the orchestrator
/// logs it, leaves the track out of the mix, and keeps going. Everything else
/// aborts the render before the master file is written.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The MIDI container itself couldn't be read.
    #[error("couldn't parse MIDI file: {0}")]
    MidiParse(String),

    /// Ticks-per-beat, tempo, or file layout can't be turned into seconds.
    #[error("invalid MIDI timing data: {0}")]
    InvalidTimingData(String),

    /// The host doesn't know the plugin, or the preset couldn't be applied.
    #[error("couldn't load plugin `{id}`: {reason}")]
    PluginLoad { id: String, reason: String },

    /// A loaded plugin refused or failed a process call.
    #[error("plugin `{id}` failed: {reason}")]
    PluginProcess { id: String, reason: String },

    /// The track's plugin can't accept MIDI input.
    #[error("plugin `{0}` does not accept MIDI input")]
    NonInstrumentPlugin(String),

    #[error("instrument `{plugin_id}` rendered {actual}, expected {expected}")]
    InstrumentShape {
        plugin_id: String,
        expected: BufferShape,
        actual: BufferShape,
    },

    #[error("effect `{plugin_id}` changed buffer shape from {expected} to {actual}")]
    EffectShape {
        plugin_id: String,
        expected: BufferShape,
        actual: BufferShape,
    },

    #[error("can't mix a {actual} buffer into a {expected} bus")]
    MixShape {
        expected: BufferShape,
        actual: BufferShape,
    },

    #[error("invalid render parameter: {0}")]
    InvalidParameter(String),

    #[error("invalid render configuration: {0}")]
    Config(String),

    /// A parallel render thread panicked instead of reporting a result.
    #[error("a render worker thread panicked")]
    WorkerPanic,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Wav(#[from] hound::Error),
}
impl RenderError {
    /// Whether the pipeline may continue after logging this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, RenderError::NonInstrumentPlugin(_))
    }

    pub fn plugin_load(id: &str, reason: impl Into<String>) -> Self {
        RenderError::PluginLoad {
            id: id.to_string(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RenderError>;
