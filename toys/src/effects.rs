// Copyright (c) 2023 Mike Tsao. All rights reserved.

use mixdown_core::{
    time::SampleRate,
    traits::{Controllable, IsEffect, Resets, TransformsAudio},
    ParameterType, Sample,
};
use std::collections::VecDeque;

/// Implements [Controllable] for a struct whose parameters are plain
/// [ParameterType] fields, listed in index order.
macro_rules! controllable_fields {
    ($type:ty { $($index:literal => $field:ident),* $(,)? }) => {
        impl Controllable for $type {
            fn control_index_count(&self) -> usize {
                [$(stringify!($field)),*].len()
            }

            fn control_index_for_name(&self, name: &str) -> Option<usize> {
                $(if name == stringify!($field) {
                    return Some($index);
                })*
                None
            }

            fn control_name_for_index(&self, index: usize) -> Option<&'static str> {
                match index {
                    $($index => Some(stringify!($field)),)*
                    _ => None,
                }
            }

            fn control_set_param_by_index(&mut self, index: usize, value: ParameterType) {
                match index {
                    $($index => self.$field = value,)*
                    _ => {}
                }
            }
        }
    };
}

/// An [IsEffect] that negates the input signal. It has no parameters, which
/// makes it useful for checking that an effect really ran.
#[derive(Debug, Default)]
pub struct ToyEffect {}
impl IsEffect for ToyEffect {}
impl TransformsAudio for ToyEffect {
    fn transform_channel(&mut self, _channel: usize, input_sample: Sample) -> Sample {
        -input_sample
    }
}
impl Resets for ToyEffect {}
impl Controllable for ToyEffect {
    fn control_index_count(&self) -> usize {
        0
    }

    fn control_index_for_name(&self, _name: &str) -> Option<usize> {
        None
    }

    fn control_name_for_index(&self, _index: usize) -> Option<&'static str> {
        None
    }

    fn control_set_param_by_index(&mut self, _index: usize, _value: ParameterType) {}
}

/// Multiplies every sample by `gain`.
#[derive(Debug)]
pub struct Gain {
    gain: ParameterType,
}
impl Default for Gain {
    fn default() -> Self {
        Self { gain: 1.0 }
    }
}
impl IsEffect for Gain {}
impl TransformsAudio for Gain {
    fn transform_channel(&mut self, _channel: usize, input_sample: Sample) -> Sample {
        input_sample * self.gain
    }
}
impl Resets for Gain {}
controllable_fields!(Gain { 0 => gain });
impl Gain {
    pub fn new_with(gain: ParameterType) -> Self {
        Self { gain }
    }

    pub fn gain(&self) -> ParameterType {
        self.gain
    }
}

/// Hard-clips the signal to +/- `ceiling`.
#[derive(Debug)]
pub struct Limiter {
    ceiling: ParameterType,
}
impl Default for Limiter {
    fn default() -> Self {
        Self {
            ceiling: Sample::MAX_VALUE,
        }
    }
}
impl IsEffect for Limiter {}
impl TransformsAudio for Limiter {
    fn transform_channel(&mut self, _channel: usize, input_sample: Sample) -> Sample {
        let ceiling = self.ceiling.abs();
        Sample(input_sample.0.clamp(-ceiling, ceiling))
    }
}
impl Resets for Limiter {}
controllable_fields!(Limiter { 0 => ceiling });
impl Limiter {
    pub fn new_with(ceiling: ParameterType) -> Self {
        Self { ceiling }
    }

    pub fn ceiling(&self) -> ParameterType {
        self.ceiling
    }
}

/// A feedback delay with one line per channel. Output is the dry signal plus
/// `wet` times the signal from `seconds` ago; `feedback` of the delayed signal
/// is fed back into the line. `seconds` is held to
/// [0, [Delay::MAX_SECONDS]].
#[derive(Debug)]
pub struct Delay {
    seconds: ParameterType,
    feedback: ParameterType,
    wet: ParameterType,

    sample_rate: SampleRate,
    lines: Vec<VecDeque<f64>>,
}
impl Default for Delay {
    fn default() -> Self {
        Self {
            seconds: 0.25,
            feedback: 0.4,
            wet: 0.3,
            sample_rate: Default::default(),
            lines: Default::default(),
        }
    }
}
impl IsEffect for Delay {}
impl TransformsAudio for Delay {
    fn transform_channel(&mut self, channel: usize, input_sample: Sample) -> Sample {
        let delay_frames = self.delay_frames();
        if delay_frames == 0 {
            return input_sample;
        }
        if channel >= self.lines.len() {
            self.lines
                .resize_with(channel + 1, || VecDeque::from(vec![0.0; delay_frames]));
        }
        let line = &mut self.lines[channel];
        let delayed = line.pop_front().unwrap_or_default();
        line.push_back(input_sample.0 + delayed * self.feedback);
        Sample(input_sample.0 + delayed * self.wet)
    }
}
impl Resets for Delay {
    fn reset(&mut self, sample_rate: SampleRate) {
        self.sample_rate = sample_rate;
        self.lines.clear();
    }
}
controllable_fields!(Delay {
    0 => seconds,
    1 => feedback,
    2 => wet,
});
impl Delay {
    pub const MAX_SECONDS: ParameterType = 10.0;

    pub fn seconds(&self) -> ParameterType {
        self.seconds
    }

    pub fn feedback(&self) -> ParameterType {
        self.feedback
    }

    pub fn wet(&self) -> ParameterType {
        self.wet
    }

    fn delay_frames(&self) -> usize {
        // NaN.max(0.0) is 0.0.
        self.sample_rate
            .frames_for_duration(self.seconds.max(0.0).min(Self::MAX_SECONDS))
    }
}
