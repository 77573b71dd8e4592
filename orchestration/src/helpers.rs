// Copyright (c) 2023 Mike Tsao. All rights reserved.

//! The [helpers](crate::helpers) module contains structs and methods that move
//! rendered audio between memory and disk.

use mixdown_core::{time::SampleRate, AudioBuffer, RenderError, Result, SampleType};
use std::{
    io::BufWriter,
    path::{Path, PathBuf},
};
use strum_macros::{Display, EnumString, IntoStaticStr};

/// How samples are stored in the WAV files we write.
#[derive(Clone, Copy, Debug, Default, Display, EnumString, IntoStaticStr, PartialEq, Eq)]
#[strum(serialize_all = "lowercase")]
pub enum WavEncoding {
    /// 32-bit IEEE float, unclipped.
    #[default]
    Float32,
    /// 16-bit integer PCM, clipped to [-1.0, 1.0].
    Pcm16,
    /// 24-bit integer PCM, clipped to [-1.0, 1.0].
    Pcm24,
}
impl WavEncoding {
    pub fn bits_per_sample(&self) -> u16 {
        match self {
            WavEncoding::Float32 => 32,
            WavEncoding::Pcm16 => 16,
            WavEncoding::Pcm24 => 24,
        }
    }

    pub fn sample_format(&self) -> hound::SampleFormat {
        match self {
            WavEncoding::Float32 => hound::SampleFormat::Float,
            WavEncoding::Pcm16 | WavEncoding::Pcm24 => hound::SampleFormat::Int,
        }
    }
}

pub struct IOHelper {}
impl IOHelper {
    /// Where the stem for the track at `index` goes.
    pub fn stem_path(stems_dir: &Path, index: usize) -> PathBuf {
        stems_dir.join(format!("track_{index}.wav"))
    }

    /// Writes `buffer` to `path`. The file is built next to `path` under a
    /// temporary name and moved into place only once it's complete, so a
    /// failed write never leaves a partial file at `path`.
    pub fn write_wav(
        path: &Path,
        buffer: &AudioBuffer,
        sample_rate: SampleRate,
        encoding: WavEncoding,
    ) -> Result<()> {
        let spec = hound::WavSpec {
            channels: u16::try_from(buffer.channel_count()).map_err(|_| {
                RenderError::InvalidParameter(format!(
                    "{} channels won't fit in a WAV file",
                    buffer.channel_count()
                ))
            })?,
            sample_rate: u32::try_from(sample_rate.value()).map_err(|_| {
                RenderError::InvalidParameter(format!("{sample_rate} won't fit in a WAV file"))
            })?,
            bits_per_sample: encoding.bits_per_sample(),
            sample_format: encoding.sample_format(),
        };

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        // Dropped without persist() on any error, which deletes it.
        let temp = tempfile::Builder::new()
            .prefix(".mixdown-")
            .suffix(".wav.partial")
            .tempfile_in(dir)?;
        let mut writer = hound::WavWriter::new(BufWriter::new(temp.as_file()), spec)?;
        match encoding {
            WavEncoding::Float32 => {
                for sample in buffer.interleaved() {
                    writer.write_sample(sample as f32)?;
                }
            }
            WavEncoding::Pcm16 => {
                const AMPLITUDE: SampleType = i16::MAX as SampleType;
                for sample in buffer.interleaved() {
                    writer.write_sample((sample.clamp(-1.0, 1.0) * AMPLITUDE) as i16)?;
                }
            }
            WavEncoding::Pcm24 => {
                const AMPLITUDE: SampleType = 8_388_607.0;
                for sample in buffer.interleaved() {
                    writer.write_sample((sample.clamp(-1.0, 1.0) * AMPLITUDE) as i32)?;
                }
            }
        }
        writer.finalize()?;
        temp.persist(path).map_err(|e| e.error)?;
        Ok(())
    }

    /// Reads any WAV file hound understands back into an [AudioBuffer].
    /// Integer samples are scaled to [-1.0, 1.0].
    pub fn read_wav(path: &Path) -> Result<(SampleRate, AudioBuffer)> {
        let mut reader = hound::WavReader::open(path)?;
        let spec = reader.spec();
        let samples: Vec<SampleType> = match spec.sample_format {
            hound::SampleFormat::Float => reader
                .samples::<f32>()
                .map(|s| s.map(SampleType::from))
                .collect::<std::result::Result<_, _>>()?,
            hound::SampleFormat::Int => {
                let amplitude = ((1_i64 << (spec.bits_per_sample - 1)) - 1) as SampleType;
                reader
                    .samples::<i32>()
                    .map(|s| s.map(|v| v as SampleType / amplitude))
                    .collect::<std::result::Result<_, _>>()?
            }
        };

        let channel_count = spec.channels as usize;
        let mut channels = vec![Vec::with_capacity(samples.len() / channel_count); channel_count];
        for frame in samples.chunks_exact(channel_count) {
            for (channel, sample) in channels.iter_mut().zip(frame) {
                channel.push(*sample);
            }
        }
        Ok((
            SampleRate::new(spec.sample_rate as usize),
            AudioBuffer::new_from_channels(channels)?,
        ))
    }
}
