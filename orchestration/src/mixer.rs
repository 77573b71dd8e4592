// Copyright (c) 2023 Mike Tsao. All rights reserved.

use mixdown_core::{AudioBuffer, BufferShape, Result};

/// Sums track buffers into the master buffer. There's no normalization, so
/// loud mixes can exceed full scale; that's left for the master chain (or the
/// listener) to deal with.
#[derive(Debug)]
pub struct MixBus {
    buffer: AudioBuffer,
    track_count: usize,
}
impl MixBus {
    pub fn new(channels: usize, frames: usize) -> Self {
        Self {
            buffer: AudioBuffer::new_with(BufferShape::new(channels, frames)),
            track_count: 0,
        }
    }

    pub fn shape(&self) -> BufferShape {
        self.buffer.shape()
    }

    /// Adds `track` to the mix. Fails with
    /// [RenderError::MixShape](mixdown_core::RenderError::MixShape) if it
    /// isn't exactly the bus's shape.
    pub fn accumulate(&mut self, track: &AudioBuffer) -> Result<()> {
        self.buffer.accumulate(track)?;
        self.track_count += 1;
        Ok(())
    }

    /// How many buffers have been mixed in so far.
    pub fn track_count(&self) -> usize {
        self.track_count
    }

    pub fn into_buffer(self) -> AudioBuffer {
        self.buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mixdown_core::RenderError;

    #[test]
    fn starts_silent() {
        let bus = MixBus::new(2, 10);
        assert_eq!(bus.shape(), BufferShape::new(2, 10));
        assert_eq!(bus.track_count(), 0);
        assert!(bus.into_buffer().is_silent());
    }

    #[test]
    fn mixing_is_linear() {
        let a = AudioBuffer::new_from_channels(vec![vec![0.25, 0.5], vec![-0.5, 0.0]]).unwrap();
        let b = AudioBuffer::new_from_channels(vec![vec![0.5, 0.75], vec![0.25, -1.0]]).unwrap();

        let mut bus = MixBus::new(2, 2);
        bus.accumulate(&a).unwrap();
        bus.accumulate(&b).unwrap();
        assert_eq!(bus.track_count(), 2);
        let mix = bus.into_buffer();

        // Sums past full scale are kept.
        assert_eq!(mix.channel(0), &[0.75, 1.25]);
        assert_eq!(mix.channel(1), &[-0.25, -1.0]);
    }

    #[test]
    fn mismatched_shapes_are_refused() {
        let mut bus = MixBus::new(2, 4);
        let wrong = AudioBuffer::new_with(BufferShape::new(2, 3));
        assert!(matches!(
            bus.accumulate(&wrong),
            Err(RenderError::MixShape { .. })
        ));
        assert_eq!(bus.track_count(), 0);
        assert!(bus.into_buffer().is_silent());
    }
}
