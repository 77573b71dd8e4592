// Copyright (c) 2023 Mike Tsao. All rights reserved.

use midly::{live::LiveEvent, Format, MetaMessage, Smf, Timing, TrackEventKind};
use mixdown_core::{time::Tempo, RenderError, Result};
use std::path::Path;

/// What a [RawMidiEvent] carries.
#[derive(Clone, Debug, PartialEq)]
pub enum RawEventKind {
    /// A channel message, SysEx, or escape sequence, as wire bytes.
    Message(Vec<u8>),
    /// A tempo-change meta event, in microseconds per quarter note.
    Tempo(u32),
    /// Any other meta event. Only its timing matters here.
    OtherMeta,
}

/// One event of an SMF track, still on the tick grid.
#[derive(Clone, Debug, PartialEq)]
pub struct RawMidiEvent {
    pub delta_ticks: u32,
    pub kind: RawEventKind,
}
impl RawMidiEvent {
    pub fn new_message(delta_ticks: u32, bytes: Vec<u8>) -> Self {
        Self {
            delta_ticks,
            kind: RawEventKind::Message(bytes),
        }
    }

    pub fn new_tempo(delta_ticks: u32, microseconds_per_quarter: u32) -> Self {
        Self {
            delta_ticks,
            kind: RawEventKind::Tempo(microseconds_per_quarter),
        }
    }

    pub fn new_meta(delta_ticks: u32) -> Self {
        Self {
            delta_ticks,
            kind: RawEventKind::OtherMeta,
        }
    }

    pub fn is_meta(&self) -> bool {
        !matches!(self.kind, RawEventKind::Message(_))
    }
}

/// A parsed Standard MIDI File with owned event data.
#[derive(Clone, Debug)]
pub struct MidiFile {
    format: Format,
    ticks_per_beat: u16,
    tracks: Vec<Vec<RawMidiEvent>>,
}
impl MidiFile {
    /// Builds a simultaneous-tracks (format 1) file out of events that came
    /// from somewhere other than an SMF.
    pub fn new_with(ticks_per_beat: u16, tracks: Vec<Vec<RawMidiEvent>>) -> Result<Self> {
        Self::check_ticks_per_beat(ticks_per_beat)?;
        Ok(Self {
            format: Format::Parallel,
            ticks_per_beat,
            tracks,
        })
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let data = std::fs::read(path)?;
        Self::from_bytes(&data)
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let smf = Smf::parse(data).map_err(|e| RenderError::MidiParse(e.to_string()))?;
        let ticks_per_beat = match smf.header.timing {
            Timing::Metrical(ticks_per_beat) => ticks_per_beat.as_int(),
            Timing::Timecode(fps, subframes) => {
                return Err(RenderError::InvalidTimingData(format!(
                    "SMPTE timing ({} fps, {subframes} subframes) isn't supported",
                    fps.as_f32()
                )))
            }
        };
        Self::check_ticks_per_beat(ticks_per_beat)?;

        let tracks = smf
            .tracks
            .iter()
            .map(|track| {
                track
                    .iter()
                    .map(|event| RawMidiEvent {
                        delta_ticks: event.delta.as_int(),
                        kind: Self::convert_kind(&event.kind),
                    })
                    .collect()
            })
            .collect();
        Ok(Self {
            format: smf.header.format,
            ticks_per_beat,
            tracks,
        })
    }

    fn check_ticks_per_beat(ticks_per_beat: u16) -> Result<()> {
        if ticks_per_beat == 0 {
            Err(RenderError::InvalidTimingData(
                "ticks per beat must be positive".to_string(),
            ))
        } else {
            Ok(())
        }
    }

    fn convert_kind(kind: &TrackEventKind) -> RawEventKind {
        match kind {
            TrackEventKind::Midi { channel, message } => {
                let mut bytes = Vec::with_capacity(3);
                let _ = LiveEvent::Midi {
                    channel: *channel,
                    message: *message,
                }
                .write(&mut bytes);
                RawEventKind::Message(bytes)
            }
            TrackEventKind::SysEx(data) => {
                // midly strips the leading status byte.
                let mut bytes = Vec::with_capacity(data.len() + 1);
                bytes.push(0xf0);
                bytes.extend_from_slice(data);
                RawEventKind::Message(bytes)
            }
            TrackEventKind::Escape(data) => RawEventKind::Message(data.to_vec()),
            TrackEventKind::Meta(MetaMessage::Tempo(tempo)) => RawEventKind::Tempo(tempo.as_int()),
            TrackEventKind::Meta(_) => RawEventKind::OtherMeta,
        }
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn ticks_per_beat(&self) -> u16 {
        self.ticks_per_beat
    }

    pub fn tracks(&self) -> &[Vec<RawMidiEvent>] {
        &self.tracks
    }

    /// Every event in playback order: sorted by absolute tick, with ties going
    /// to the earlier track. Each item is (absolute tick, track index, event).
    pub fn merged_events(&self) -> Vec<(u64, usize, &RawMidiEvent)> {
        let mut merged = Vec::default();
        for (track_index, track) in self.tracks.iter().enumerate() {
            let mut tick: u64 = 0;
            for event in track {
                tick += event.delta_ticks as u64;
                merged.push((tick, track_index, event));
            }
        }
        // sort_by_key is stable, so equal ticks keep track order.
        merged.sort_by_key(|(tick, _, _)| *tick);
        merged
    }

    /// The tempo of the first tempo-change event in playback order, or the
    /// SMF default of 120 BPM if there isn't one. Later tempo changes don't
    /// matter here.
    pub fn first_tempo(&self) -> Result<Tempo> {
        self.merged_events()
            .iter()
            .find_map(|(_, _, event)| match event.kind {
                RawEventKind::Tempo(tempo) => Some(tempo),
                _ => None,
            })
            .map_or(Ok(Tempo::default()), Tempo::new_with)
    }

    /// How long the whole file plays, in seconds, following every tempo
    /// change along the way.
    pub fn length_seconds(&self) -> Result<f64> {
        if self.format == Format::Sequential {
            return Err(RenderError::InvalidTimingData(
                "a sequential (format 2) file has no single length".to_string(),
            ));
        }
        let mut tempo = Tempo::default();
        let mut last_tick = 0;
        let mut seconds = 0.0;
        for (tick, _, event) in self.merged_events() {
            let delta = (tick - last_tick) as u32;
            if delta > 0 {
                seconds += tempo.seconds_for_ticks(delta, self.ticks_per_beat);
            }
            last_tick = tick;
            if let RawEventKind::Tempo(new_tempo) = event.kind {
                tempo = Tempo::new_with(new_tempo)?;
            }
        }
        Ok(seconds)
    }
}
