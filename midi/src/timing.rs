// Copyright (c) 2023 Mike Tsao. All rights reserved.

use crate::{MidiFile, RawEventKind};
use mixdown_core::{
    midi::{TimedEvent, Track},
    time::Tempo,
    Result,
};

/// Everything the renderer needs from a MIDI file.
#[derive(Clone, Debug)]
pub struct ResolvedPerformance {
    /// The single tempo used for every tick-to-seconds conversion.
    pub tempo: Tempo,
    /// Tracks with something to play, in file order.
    pub tracks: Vec<Track>,
    /// Length of the file in seconds, as its tempo map says.
    pub length_seconds: f64,
}

/// Resolves `file` with its first tempo.
pub fn resolve_timing(file: &MidiFile) -> Result<ResolvedPerformance> {
    let tempo = file.first_tempo()?;
    let tracks = resolve_tracks(file, tempo);
    let length_seconds = file.length_seconds()?;
    log::debug!(
        "Resolved {} of {} tracks at {:.2} BPM, {:.3}s long",
        tracks.len(),
        file.tracks().len(),
        tempo.bpm(),
        length_seconds
    );
    Ok(ResolvedPerformance {
        tempo,
        tracks,
        length_seconds,
    })
}

/// Places every non-meta event of every track on an absolute timeline, using
/// `tempo` throughout.
///
/// Only message events advance the clock. A meta event's delta ticks are
/// dropped along with the event, so a marker between two notes pulls the
/// second note earlier by the marker's delta. Tracks with nothing but meta
/// events are left out.
pub fn resolve_tracks(file: &MidiFile, tempo: Tempo) -> Vec<Track> {
    file.tracks()
        .iter()
        .enumerate()
        .filter_map(|(source_index, raw_events)| {
            let mut last_time = 0.0;
            let mut events = Vec::default();
            for raw in raw_events {
                if let RawEventKind::Message(bytes) = &raw.kind {
                    last_time +=
                        tempo.seconds_for_ticks(raw.delta_ticks, file.ticks_per_beat());
                    events.push(TimedEvent::new_with(last_time, bytes.clone()));
                }
            }
            Track::new_with(source_index, events)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::RawMidiEvent;
    use float_cmp::approx_eq;
    use more_asserts::assert_le;

    fn on(delta: u32) -> RawMidiEvent {
        RawMidiEvent::new_message(delta, vec![0x90, 60, 100])
    }

    fn off(delta: u32) -> RawMidiEvent {
        RawMidiEvent::new_message(delta, vec![0x80, 60, 0])
    }

    #[test]
    fn times_are_cumulative() {
        let file = MidiFile::new_with(480, vec![vec![on(0), off(480), on(240), off(960)]]).unwrap();
        let tracks = resolve_tracks(&file, Tempo::default());
        assert_eq!(tracks.len(), 1);

        let times: Vec<f64> = tracks[0].events.iter().map(|e| e.time).collect();
        let expected = [0.0, 0.5, 0.75, 1.75];
        for (t, e) in times.iter().zip(expected.iter()) {
            assert!(approx_eq!(f64, *t, *e), "{t} != {e}");
        }
        for pair in times.windows(2) {
            assert_le!(pair[0], pair[1]);
        }
    }

    #[test]
    fn meta_event_deltas_do_not_advance_the_clock() {
        // 100 ticks per beat at 120 BPM: 100 ticks is half a second.
        let file =
            MidiFile::new_with(100, vec![vec![on(0), RawMidiEvent::new_meta(100), off(100)]])
                .unwrap();
        let tracks = resolve_tracks(&file, Tempo::default());
        assert_eq!(tracks[0].events.len(), 2);
        assert!(approx_eq!(f64, tracks[0].events[1].time, 0.5));

        let file = MidiFile::new_with(
            100,
            vec![vec![
                on(0),
                RawMidiEvent::new_meta(100),
                RawMidiEvent::new_tempo(100, 250_000),
                off(100),
                on(50),
            ]],
        )
        .unwrap();
        let tracks = resolve_tracks(&file, Tempo::default());
        let times: Vec<f64> = tracks[0].events.iter().map(|e| e.time).collect();
        assert_eq!(times.len(), 3);
        assert!(approx_eq!(f64, times[1], 0.5));
        assert!(approx_eq!(f64, times[2], 0.75));
    }

    #[test]
    fn later_tempo_changes_are_ignored() {
        let file = MidiFile::new_with(
            100,
            vec![
                vec![
                    RawMidiEvent::new_tempo(0, 1_000_000),
                    RawMidiEvent::new_tempo(100, 250_000),
                ],
                vec![on(0), off(100), on(100)],
            ],
        )
        .unwrap();
        let performance = resolve_timing(&file).unwrap();
        assert_eq!(performance.tempo.microseconds_per_quarter(), 1_000_000);

        // Track 0 has only meta events, so only track 1 survives.
        assert_eq!(performance.tracks.len(), 1);
        let track = &performance.tracks[0];
        assert_eq!(track.source_index, 1);
        assert!(approx_eq!(f64, track.events[1].time, 1.0));
        assert!(approx_eq!(f64, track.events[2].time, 2.0));

        // The file's own length does honor the second tempo: 1.0s + 0.25s.
        assert!(approx_eq!(f64, performance.length_seconds, 1.25));
    }

    #[test]
    fn source_order_is_preserved() {
        // Deltas are never negative, so source order is time order. Events at
        // the same instant stay in the order the file lists them.
        let file = MidiFile::new_with(
            480,
            vec![vec![
                RawMidiEvent::new_message(0, vec![0x90, 64, 100]),
                RawMidiEvent::new_message(0, vec![0x90, 60, 100]),
            ]],
        )
        .unwrap();
        let tracks = resolve_tracks(&file, Tempo::default());
        assert_eq!(tracks[0].events[0].bytes[1], 64);
        assert_eq!(tracks[0].events[1].bytes[1], 60);
    }

    #[test]
    fn empty_and_meta_only_tracks_are_omitted() {
        let file = MidiFile::new_with(
            480,
            vec![
                Vec::default(),
                vec![RawMidiEvent::new_meta(0)],
                vec![on(0)],
                vec![on(10), off(10)],
            ],
        )
        .unwrap();
        let tracks = resolve_tracks(&file, Tempo::default());
        let indexes: Vec<usize> = tracks.iter().map(|t| t.source_index).collect();
        assert_eq!(indexes, vec![2, 3]);
    }
}
