// Copyright (c) 2023 Mike Tsao. All rights reserved.

use crate::{RenderError, Result};
use std::fmt::Display;

/// Frames per second. Usually 44.1KHz for CD-quality audio.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SampleRate(usize);
impl SampleRate {
    pub const DEFAULT_SAMPLE_RATE: usize = 44100;
    pub const DEFAULT: SampleRate = SampleRate(Self::DEFAULT_SAMPLE_RATE);

    pub const fn new(value: usize) -> Self {
        Self(value)
    }

    pub fn value(&self) -> usize {
        self.0
    }

    /// The number of frames that `seconds` of audio occupies, rounded to the
    /// nearest frame. Every buffer in a render is sized with this, so track
    /// buffers and the mix bus always agree.
    pub fn frames_for_duration(&self, seconds: f64) -> usize {
        (seconds * self.0 as f64).round() as usize
    }

    /// The frame on which something happening at `seconds` lands.
    pub fn frame_for_time(&self, seconds: f64) -> usize {
        self.frames_for_duration(seconds)
    }

    pub fn seconds_for_frames(&self, frames: usize) -> f64 {
        frames as f64 / self.0 as f64
    }
}
impl Default for SampleRate {
    fn default() -> Self {
        Self::DEFAULT
    }
}
impl Display for SampleRate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}Hz", self.0)
    }
}
impl From<usize> for SampleRate {
    fn from(value: usize) -> Self {
        Self(value)
    }
}

/// Microseconds per quarter note, the unit SMF tempo meta events use.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tempo(u32);
impl Tempo {
    /// 120 BPM, the tempo an SMF has until it says otherwise.
    pub const DEFAULT_MICROSECONDS_PER_QUARTER: u32 = 500_000;
    pub const DEFAULT: Tempo = Tempo(Self::DEFAULT_MICROSECONDS_PER_QUARTER);

    pub fn new_with(microseconds_per_quarter: u32) -> Result<Self> {
        if microseconds_per_quarter == 0 {
            return Err(RenderError::InvalidTimingData(
                "tempo of zero microseconds per quarter note".to_string(),
            ));
        }
        Ok(Self(microseconds_per_quarter))
    }

    pub fn microseconds_per_quarter(&self) -> u32 {
        self.0
    }

    pub fn bpm(&self) -> f64 {
        60_000_000.0 / self.0 as f64
    }

    /// `ticks / ticks_per_beat * seconds_per_beat`.
    pub fn seconds_for_ticks(&self, ticks: u32, ticks_per_beat: u16) -> f64 {
        debug_assert!(ticks_per_beat > 0);
        ticks as f64 / ticks_per_beat as f64 * (self.0 as f64 / 1_000_000.0)
    }
}
impl Default for Tempo {
    fn default() -> Self {
        Self::DEFAULT
    }
}
