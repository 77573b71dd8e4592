// Copyright (c) 2023 Mike Tsao. All rights reserved.

//! Fundamental structs and traits shared by every mixdown crate.

use std::ops::{Add, AddAssign, Mul, Neg, Sub};

pub use buffer::{AudioBuffer, BufferShape};
pub use error::{RenderError, Result};

/// The [buffer] module holds fixed-shape multichannel audio.
pub mod buffer;
/// The [error] module is the error taxonomy of the render pipeline.
pub mod error;
/// The [midi] module knows about [MIDI](https://en.wikipedia.org/wiki/MIDI)
/// events once they've been placed on an absolute timeline.
pub mod midi;
/// The [time] module handles digital-audio and musical time.
pub mod time;
/// The [traits] module describes the public interfaces of instruments,
/// effects, and the plugin host that loads them.
pub mod traits;

/// [SampleType] is the underlying primitive that makes up [Sample] and every
/// [AudioBuffer].
pub type SampleType = f64;

/// Use [ParameterType] for plugin parameters. There are no range
/// restrictions; each plugin decides what makes sense.
pub type ParameterType = f64;

/// [Sample] represents a single audio sample on a single channel.
#[derive(Clone, Copy, Debug, Default, PartialEq, PartialOrd)]
pub struct Sample(pub SampleType);
impl Sample {
    pub const SILENCE_VALUE: SampleType = 0.0;
    pub const SILENCE: Sample = Sample(Self::SILENCE_VALUE);
    pub const MAX_VALUE: SampleType = 1.0;
    pub const MAX: Sample = Sample(Self::MAX_VALUE);
    pub const MIN_VALUE: SampleType = -1.0;
    pub const MIN: Sample = Sample(Self::MIN_VALUE);
}
impl AddAssign for Sample {
    fn add_assign(&mut self, rhs: Self) {
        self.0 += rhs.0;
    }
}
impl Add for Sample {
    type Output = Self;

    fn add(self, rhs: Sample) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}
impl Sub for Sample {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}
impl Mul<f64> for Sample {
    type Output = Self;

    fn mul(self, rhs: f64) -> Self::Output {
        Self(self.0 * rhs)
    }
}
impl Neg for Sample {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self(-self.0)
    }
}
impl From<f64> for Sample {
    fn from(value: f64) -> Self {
        Sample(value)
    }
}
impl From<Sample> for f64 {
    fn from(value: Sample) -> Self {
        value.0
    }
}
