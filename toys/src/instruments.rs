// Copyright (c) 2023 Mike Tsao. All rights reserved.

use mixdown_core::{
    midi::{note_to_frequency, HandlesMidi, MidiChannel, MidiMessage},
    time::SampleRate,
    traits::{Controllable, Generates, IsInstrument, Resets, Ticks},
    ParameterType, Sample, SampleType,
};
use std::f64::consts::PI;
use strum_macros::{Display, FromRepr, IntoStaticStr};

/// The shapes an [Oscillator] knows how to draw. The discriminant is the value
/// of the `waveform` parameter that selects it.
#[derive(Clone, Copy, Debug, Default, Display, FromRepr, IntoStaticStr, PartialEq, Eq)]
#[strum(serialize_all = "kebab-case")]
pub enum Waveform {
    #[default]
    Sine,
    Square,
    Sawtooth,
}
impl Waveform {
    /// Anything out of range falls back to [Waveform::Sine].
    pub fn from_parameter(value: ParameterType) -> Self {
        if value.is_finite() && value >= 0.0 {
            Self::from_repr(value.round() as usize).unwrap_or_default()
        } else {
            Self::default()
        }
    }

    fn amplitude_for_position(&self, cycle_position: f64) -> SampleType {
        match self {
            Waveform::Sine => (cycle_position * 2.0 * PI).sin(),
            Waveform::Square => {
                if cycle_position < 0.5 {
                    1.0
                } else {
                    -1.0
                }
            }
            Waveform::Sawtooth => 2.0 * cycle_position - 1.0,
        }
    }
}

/// A bare-bones periodic signal generator. Its state for a frame is valid
/// after tick() has been called for it, and the first tick lands on the start
/// of the cycle.
#[derive(Clone, Debug)]
pub struct Oscillator {
    waveform: Waveform,
    frequency: f64,
    sample_rate: SampleRate,
    cycle_position: f64,
    delta: f64,
    is_reset_pending: bool,
    signal: SampleType,
}
impl Default for Oscillator {
    fn default() -> Self {
        Self::new_with(Waveform::default(), 440.0, SampleRate::DEFAULT)
    }
}
impl Generates<SampleType> for Oscillator {
    fn value(&self) -> SampleType {
        self.signal
    }
}
impl Resets for Oscillator {
    fn reset(&mut self, sample_rate: SampleRate) {
        self.sample_rate = sample_rate;
        self.update_delta();
        self.cycle_position = 0.0;
        self.is_reset_pending = true;
    }
}
impl Ticks for Oscillator {
    fn tick(&mut self, tick_count: usize) {
        for _ in 0..tick_count {
            if self.is_reset_pending {
                self.is_reset_pending = false;
            } else {
                self.cycle_position = (self.cycle_position + self.delta).fract();
            }
            self.signal = self.waveform.amplitude_for_position(self.cycle_position);
        }
    }
}
impl Oscillator {
    pub fn new_with(waveform: Waveform, frequency: f64, sample_rate: SampleRate) -> Self {
        let mut r = Self {
            waveform,
            frequency,
            sample_rate,
            cycle_position: 0.0,
            delta: 0.0,
            is_reset_pending: true,
            signal: 0.0,
        };
        r.update_delta();
        r
    }

    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    pub fn frequency(&self) -> f64 {
        self.frequency
    }

    fn update_delta(&mut self) {
        self.delta = self.frequency / self.sample_rate.value().max(1) as f64;
    }
}

#[derive(Debug)]
struct Voice {
    key: u8,
    oscillator: Oscillator,
    level: f64,
    // None while the key is held. Otherwise the remaining envelope level.
    release_level: Option<f64>,
}

/// A polyphonic [IsInstrument] with one [Oscillator] per sounding key. Each
/// voice is scaled by its note's velocity, and released notes fade to silence
/// over `release` seconds.
///
/// [Controllable] by three parameters: `gain`, `waveform` (0 sine, 1 square, 2
/// sawtooth), and `release`.
#[derive(Debug)]
pub struct ToySynth {
    gain: ParameterType,
    waveform: Waveform,
    release: ParameterType,

    sample_rate: SampleRate,
    voices: Vec<Voice>,
    sample: Sample,
}
impl IsInstrument for ToySynth {}
impl Default for ToySynth {
    fn default() -> Self {
        Self {
            gain: 0.25,
            waveform: Default::default(),
            release: 0.05,
            sample_rate: Default::default(),
            voices: Default::default(),
            sample: Default::default(),
        }
    }
}
impl Generates<Sample> for ToySynth {
    fn value(&self) -> Sample {
        self.sample
    }
}
impl Resets for ToySynth {
    fn reset(&mut self, sample_rate: SampleRate) {
        self.sample_rate = sample_rate;
        self.voices.clear();
        self.sample = Sample::SILENCE;
    }
}
impl Ticks for ToySynth {
    fn tick(&mut self, tick_count: usize) {
        let release_step = self.release_step();
        for _ in 0..tick_count {
            let mut sum = 0.0;
            for voice in self.voices.iter_mut() {
                voice.oscillator.tick(1);
                let envelope = voice.release_level.unwrap_or(1.0);
                sum += voice.oscillator.value() * voice.level * envelope;
                if let Some(level) = voice.release_level.as_mut() {
                    *level -= release_step;
                }
            }
            self.voices
                .retain(|voice| voice.release_level.map_or(true, |level| level > 0.0));
            self.sample = Sample(sum * self.gain);
        }
    }
}
impl HandlesMidi for ToySynth {
    fn handle_midi_message(&mut self, _channel: MidiChannel, message: &MidiMessage) {
        match message {
            MidiMessage::NoteOn { key, vel } if vel.as_int() > 0 => {
                self.note_on(key.as_int(), vel.as_int());
            }
            MidiMessage::NoteOn { key, .. } | MidiMessage::NoteOff { key, .. } => {
                self.note_off(key.as_int());
            }
            _ => {}
        }
    }
}
impl Controllable for ToySynth {
    fn control_index_count(&self) -> usize {
        Self::CONTROLS.len()
    }

    fn control_index_for_name(&self, name: &str) -> Option<usize> {
        Self::CONTROLS.iter().position(|n| *n == name)
    }

    fn control_name_for_index(&self, index: usize) -> Option<&'static str> {
        Self::CONTROLS.get(index).copied()
    }

    fn control_set_param_by_index(&mut self, index: usize, value: ParameterType) {
        match index {
            0 => self.gain = value,
            1 => self.waveform = Waveform::from_parameter(value),
            2 => self.release = value.max(0.0),
            _ => {}
        }
    }
}
impl ToySynth {
    const CONTROLS: [&'static str; 3] = ["gain", "waveform", "release"];

    pub fn gain(&self) -> ParameterType {
        self.gain
    }

    pub fn waveform(&self) -> Waveform {
        self.waveform
    }

    pub fn release(&self) -> ParameterType {
        self.release
    }

    /// Number of voices still making sound, released ones included.
    pub fn active_voice_count(&self) -> usize {
        self.voices.len()
    }

    fn note_on(&mut self, key: u8, velocity: u8) {
        // Retriggering a key steals its voice.
        self.voices.retain(|voice| voice.key != key);
        let mut oscillator =
            Oscillator::new_with(self.waveform, note_to_frequency(key), self.sample_rate);
        oscillator.reset(self.sample_rate);
        self.voices.push(Voice {
            key,
            oscillator,
            level: velocity as f64 / 127.0,
            release_level: None,
        });
    }

    fn note_off(&mut self, key: u8) {
        for voice in self.voices.iter_mut().filter(|v| v.key == key) {
            if voice.release_level.is_none() {
                voice.release_level = Some(1.0);
            }
        }
        if self.release_step() >= 1.0 {
            self.voices.retain(|voice| voice.release_level.is_none());
        }
    }

    fn release_step(&self) -> f64 {
        let release_frames = self.release * self.sample_rate.value() as f64;
        if release_frames < 1.0 {
            1.0
        } else {
            1.0 / release_frames
        }
    }
}

/// Produces a constant level for as long as it's asked to, no matter what MIDI
/// it gets. Handy for checking the arithmetic of everything downstream.
///
/// [Controllable] by one parameter: `level`.
#[derive(Debug)]
pub struct ToyAudioSource {
    level: ParameterType,
}
impl Default for ToyAudioSource {
    fn default() -> Self {
        Self { level: 1.0 }
    }
}
impl IsInstrument for ToyAudioSource {}
impl Generates<Sample> for ToyAudioSource {
    fn value(&self) -> Sample {
        Sample(self.level)
    }
}
impl Resets for ToyAudioSource {}
impl Ticks for ToyAudioSource {
    fn tick(&mut self, _tick_count: usize) {}
}
impl HandlesMidi for ToyAudioSource {}
impl Controllable for ToyAudioSource {
    fn control_index_count(&self) -> usize {
        1
    }

    fn control_index_for_name(&self, name: &str) -> Option<usize> {
        (name == "level").then_some(0)
    }

    fn control_name_for_index(&self, index: usize) -> Option<&'static str> {
        (index == 0).then_some("level")
    }

    fn control_set_param_by_index(&mut self, index: usize, value: ParameterType) {
        if index == 0 {
            self.level = value;
        }
    }
}
impl ToyAudioSource {
    pub fn new_with(level: ParameterType) -> Self {
        Self { level }
    }

    pub fn level(&self) -> ParameterType {
        self.level
    }
}
