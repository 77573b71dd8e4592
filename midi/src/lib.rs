// Copyright (c) 2023 Mike Tsao. All rights reserved.

//! This crate reads Standard MIDI Files (thanks to the `midly` crate) and
//! places their events on an absolute timeline. Start with
//! [MidiFile::from_path], then hand the result to [resolve_timing].

pub use file::{MidiFile, RawEventKind, RawMidiEvent};
pub use timing::{resolve_timing, resolve_tracks, ResolvedPerformance};

mod file;
mod timing;
