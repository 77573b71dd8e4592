// Copyright (c) 2023 Mike Tsao. All rights reserved.

use crate::{RenderError, Result, Sample, SampleType};
use std::fmt::Display;

/// Channels by frames. Two buffers can be mixed only if their shapes match.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BufferShape {
    pub channels: usize,
    pub frames: usize,
}
impl BufferShape {
    pub fn new(channels: usize, frames: usize) -> Self {
        Self { channels, frames }
    }
}
impl Display for BufferShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.channels, self.frames)
    }
}

/// A fixed-shape block of planar (one [Vec] per channel) audio.
///
/// An [AudioBuffer] belongs to whichever pipeline stage is working on it. Stages
/// take it by value and hand back the result, so no two stages ever touch the
/// same buffer.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AudioBuffer {
    channels: Vec<Vec<SampleType>>,
    frames: usize,
}
impl AudioBuffer {
    /// A zero-filled buffer.
    pub fn new_with(shape: BufferShape) -> Self {
        Self {
            channels: vec![vec![Sample::SILENCE_VALUE; shape.frames]; shape.channels],
            frames: shape.frames,
        }
    }

    /// Wraps existing per-channel data. Every channel must be the same length.
    pub fn new_from_channels(channels: Vec<Vec<SampleType>>) -> Result<Self> {
        let frames = channels.first().map_or(0, Vec::len);
        if let Some(ragged) = channels.iter().position(|c| c.len() != frames) {
            return Err(RenderError::InvalidParameter(format!(
                "channel {ragged} has {} frames, but channel 0 has {frames}",
                channels[ragged].len()
            )));
        }
        Ok(Self { channels, frames })
    }

    pub fn shape(&self) -> BufferShape {
        BufferShape::new(self.channels.len(), self.frames)
    }

    pub fn channel_count(&self) -> usize {
        self.channels.len()
    }

    pub fn frame_count(&self) -> usize {
        self.frames
    }

    pub fn channel(&self, index: usize) -> &[SampleType] {
        &self.channels[index]
    }

    pub fn channel_mut(&mut self, index: usize) -> &mut [SampleType] {
        &mut self.channels[index]
    }

    pub fn channels(&self) -> impl Iterator<Item = &[SampleType]> {
        self.channels.iter().map(Vec::as_slice)
    }

    pub fn channels_mut(&mut self) -> impl Iterator<Item = &mut [SampleType]> {
        self.channels.iter_mut().map(Vec::as_mut_slice)
    }

    pub fn sample(&self, channel: usize, frame: usize) -> Sample {
        Sample(self.channels[channel][frame])
    }

    pub fn set_sample(&mut self, channel: usize, frame: usize, sample: Sample) {
        self.channels[channel][frame] = sample.0;
    }

    /// Adds `other` into this buffer, sample by sample. Nothing is scaled or
    /// limited, so the result can exceed [-1.0, 1.0].
    pub fn accumulate(&mut self, other: &AudioBuffer) -> Result<()> {
        if self.shape() != other.shape() {
            return Err(RenderError::MixShape {
                expected: self.shape(),
                actual: other.shape(),
            });
        }
        for (dst, src) in self.channels.iter_mut().zip(other.channels.iter()) {
            for (d, s) in dst.iter_mut().zip(src.iter()) {
                *d += *s;
            }
        }
        Ok(())
    }

    /// Samples in frame-major order (L R L R ... for stereo), the layout WAV
    /// files expect.
    pub fn interleaved(&self) -> impl Iterator<Item = SampleType> + '_ {
        (0..self.frames).flat_map(move |frame| self.channels.iter().map(move |c| c[frame]))
    }

    /// The largest absolute sample value.
    pub fn peak(&self) -> SampleType {
        self.channels
            .iter()
            .flat_map(|c| c.iter())
            .fold(0.0, |peak: SampleType, s| peak.max(s.abs()))
    }

    pub fn is_silent(&self) -> bool {
        self.peak() == Sample::SILENCE_VALUE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_buffer_is_silent() {
        let buffer = AudioBuffer::new_with(BufferShape::new(2, 16));
        assert_eq!(buffer.shape(), BufferShape::new(2, 16));
        assert_eq!(buffer.channel_count(), 2);
        assert_eq!(buffer.frame_count(), 16);
        assert!(buffer.is_silent());
    }

    #[test]
    fn ragged_channels_are_rejected() {
        assert!(AudioBuffer::new_from_channels(vec![vec![0.0; 3], vec![0.0; 4]]).is_err());
        let ok = AudioBuffer::new_from_channels(vec![vec![0.0; 3], vec![0.0; 3]]).unwrap();
        assert_eq!(ok.shape(), BufferShape::new(2, 3));
    }

    #[test]
    fn accumulate_sums_without_limiting() {
        let mut a = AudioBuffer::new_from_channels(vec![vec![0.75, -0.5], vec![0.0, 1.0]]).unwrap();
        let b = AudioBuffer::new_from_channels(vec![vec![0.75, 0.25], vec![0.5, 1.0]]).unwrap();
        a.accumulate(&b).unwrap();
        assert_eq!(a.channel(0), &[1.5, -0.25]);
        assert_eq!(a.channel(1), &[0.5, 2.0]);
        assert_eq!(a.peak(), 2.0);
    }

    #[test]
    fn accumulate_rejects_mismatched_shapes() {
        let mut a = AudioBuffer::new_with(BufferShape::new(2, 10));
        let b = AudioBuffer::new_with(BufferShape::new(2, 11));
        match a.accumulate(&b) {
            Err(RenderError::MixShape { expected, actual }) => {
                assert_eq!(expected, BufferShape::new(2, 10));
                assert_eq!(actual, BufferShape::new(2, 11));
            }
            r => panic!("expected MixShape, got {r:?}"),
        }
    }

    #[test]
    fn interleaving_is_frame_major() {
        let buffer =
            AudioBuffer::new_from_channels(vec![vec![1.0, 2.0, 3.0], vec![-1.0, -2.0, -3.0]])
                .unwrap();
        let v: Vec<SampleType> = buffer.interleaved().collect();
        assert_eq!(v, vec![1.0, -1.0, 2.0, -2.0, 3.0, -3.0]);
    }
}
