// Copyright (c) 2023 Mike Tsao. All rights reserved.

pub use midly::{
    live::LiveEvent,
    num::{u4, u7},
    MidiMessage,
};

pub type MidiChannel = u8;

/// Takes standard MIDI messages. Implementers can ignore the channel if it's
/// not important; each instrument hears only its own track.
pub trait HandlesMidi {
    #[allow(unused_variables)]
    fn handle_midi_message(&mut self, channel: MidiChannel, message: &MidiMessage) {}
}

/// A MIDI message that knows when it happens, in seconds from the start of the
/// performance.
///
/// The payload keeps the message's wire bytes rather than a parsed form, so
/// that SysEx and other non-channel messages survive the trip to the plugin
/// unchanged.
#[derive(Clone, Debug, PartialEq)]
pub struct TimedEvent {
    pub time: f64,
    pub bytes: Vec<u8>,
}
impl TimedEvent {
    pub fn new_with(time: f64, bytes: Vec<u8>) -> Self {
        Self { time, bytes }
    }

    /// Encodes a channel message.
    pub fn new_midi(time: f64, channel: MidiChannel, message: MidiMessage) -> Self {
        let event = LiveEvent::Midi {
            channel: u4::from(channel & 0x0f),
            message,
        };
        let mut bytes = Vec::with_capacity(3);
        // Writing into a Vec can't fail.
        let _ = event.write(&mut bytes);
        Self { time, bytes }
    }

    /// The decoded channel message, if this is one.
    pub fn midi_message(&self) -> Option<(MidiChannel, MidiMessage)> {
        match LiveEvent::parse(&self.bytes) {
            Ok(LiveEvent::Midi { channel, message }) => Some((channel.as_int(), message)),
            _ => None,
        }
    }
}

/// One performance line, ready to drive an instrument. A [Track] always has
/// at least one event; tracks with nothing to play never get built.
#[derive(Clone, Debug, PartialEq)]
pub struct Track {
    /// Position of the source track in the MIDI file.
    pub source_index: usize,
    pub events: Vec<TimedEvent>,
}
impl Track {
    /// Returns None if there's nothing to play.
    pub fn new_with(source_index: usize, events: Vec<TimedEvent>) -> Option<Self> {
        if events.is_empty() {
            None
        } else {
            Some(Self {
                source_index,
                events,
            })
        }
    }

    /// When the last event happens.
    pub fn last_event_time(&self) -> f64 {
        self.events.last().map_or(0.0, |e| e.time)
    }
}

/// Equal-tempered frequency of a MIDI key, A4 (69) = 440 Hz.
pub fn note_to_frequency(key: u8) -> f64 {
    2.0_f64.powf((key as f64 - 69.0) / 12.0) * 440.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::approx_eq;

    #[test]
    fn channel_messages_survive_encoding() {
        let event = TimedEvent::new_midi(
            1.5,
            3,
            MidiMessage::NoteOn {
                key: u7::from(60),
                vel: u7::from(100),
            },
        );
        assert_eq!(event.bytes, vec![0x93, 60, 100]);
        assert_eq!(
            event.midi_message(),
            Some((
                3,
                MidiMessage::NoteOn {
                    key: u7::from(60),
                    vel: u7::from(100)
                }
            ))
        );
    }

    #[test]
    fn non_channel_messages_have_no_midi_message() {
        let sysex = TimedEvent::new_with(0.0, vec![0xf0, 0x7e, 0x7f, 0xf7]);
        assert_eq!(sysex.midi_message(), None);
    }

    #[test]
    fn empty_tracks_are_not_built() {
        assert!(Track::new_with(0, Vec::default()).is_none());
        let track = Track::new_with(
            2,
            vec![
                TimedEvent::new_with(0.0, vec![0x90, 60, 1]),
                TimedEvent::new_with(0.75, vec![0x80, 60, 0]),
            ],
        )
        .unwrap();
        assert_eq!(track.source_index, 2);
        assert_eq!(track.last_event_time(), 0.75);
    }

    #[test]
    fn note_frequencies() {
        assert!(approx_eq!(f64, note_to_frequency(69), 440.0));
        assert!(approx_eq!(f64, note_to_frequency(57), 220.0, epsilon = 1e-9));
        assert!(approx_eq!(f64, note_to_frequency(60), 261.6255653005986, epsilon = 1e-9));
    }
}
