// Copyright (c) 2023 Mike Tsao. All rights reserved.

use crate::{
    apply_effect_chain, render_track, IOHelper, MixBus, RenderWindow, WavEncoding,
};
use log::{debug, info};
use mixdown_core::{
    midi::Track, time::SampleRate, time::Tempo, traits::PluginHost, AudioBuffer, RenderError,
    Result,
};
use mixdown_midi::{resolve_timing, MidiFile, ResolvedPerformance};
use mixdown_settings::{RenderConfig, RenderSettings, TrackConfig};
use std::path::{Path, PathBuf};
use strum_macros::Display;

/// Everything about a render that doesn't come from the input files.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderParams {
    pub sample_rate: SampleRate,
    pub channels: usize,
    /// Silence added after the performance so effects can ring out.
    pub tail_seconds: f64,
    /// Where per-track stems go. None means don't write them.
    pub stems_dir: Option<PathBuf>,
    /// Render threads. 1 renders on the calling thread.
    pub jobs: usize,
    pub encoding: WavEncoding,
}
impl Default for RenderParams {
    fn default() -> Self {
        Self {
            sample_rate: SampleRate::DEFAULT,
            channels: 2,
            tail_seconds: 0.0,
            stems_dir: None,
            jobs: 1,
            encoding: WavEncoding::default(),
        }
    }
}
impl RenderParams {
    pub fn validate(&self) -> Result<()> {
        if self.sample_rate.value() == 0 || u32::try_from(self.sample_rate.value()).is_err() {
            return Err(RenderError::InvalidParameter(format!(
                "sample rate {} is out of range",
                self.sample_rate.value()
            )));
        }
        if self.channels == 0 || u16::try_from(self.channels).is_err() {
            return Err(RenderError::InvalidParameter(format!(
                "channel count {} is out of range",
                self.channels
            )));
        }
        if !(0.0..=RenderWindow::MAX_SECONDS).contains(&self.tail_seconds) {
            return Err(RenderError::InvalidParameter(format!(
                "tail {} must be between 0 and {} seconds",
                self.tail_seconds,
                RenderWindow::MAX_SECONDS
            )));
        }
        if self.jobs == 0 {
            return Err(RenderError::InvalidParameter(
                "need at least one render job".to_string(),
            ));
        }
        Ok(())
    }
}

/// What happened to one resolved track.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq)]
pub enum TrackOutcome {
    /// Rendered and mixed.
    Rendered,
    /// Its configured instrument doesn't take MIDI, so it contributed silence.
    SkippedNonInstrument,
    /// There were more tracks than track configurations.
    Unconfigured,
}

#[derive(Clone, Debug, PartialEq)]
pub struct TrackReport {
    /// Position among the resolved tracks. This is what configs and stems are
    /// numbered by.
    pub index: usize,
    /// Position in the MIDI file.
    pub source_index: usize,
    pub outcome: TrackOutcome,
    pub stem_path: Option<PathBuf>,
}

/// The result of a successful in-memory render.
#[derive(Clone, Debug)]
pub struct RenderedMix {
    pub tempo: Tempo,
    pub length_seconds: f64,
    pub duration_seconds: f64,
    /// The mastered mix.
    pub buffer: AudioBuffer,
    pub tracks: Vec<TrackReport>,
}

#[derive(Clone, Debug)]
pub enum RenderOutcome {
    Rendered(RenderedMix),
    /// Not both input paths were given, so nothing was done.
    MissingInputs,
}

// One track that has a config, waiting to be rendered.
struct TrackJob<'a> {
    index: usize,
    track: &'a Track,
    config: &'a TrackConfig,
}

// A finished track: its audio, or None if it was skipped.
type JobResult = (usize, Result<Option<(AudioBuffer, Option<PathBuf>)>>);

/// Coordinates the whole pipeline: MIDI in, plugins for each track, mix,
/// master chain, WAV out.
#[derive(Debug)]
pub struct Orchestrator<H: PluginHost> {
    host: H,
    params: RenderParams,
}
impl<H: PluginHost> Orchestrator<H> {
    pub fn new_with(host: H, params: RenderParams) -> Result<Self> {
        params.validate()?;
        Ok(Self { host, params })
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn params(&self) -> &RenderParams {
        &self.params
    }

    /// Renders `midi_path` as configured by `config_path` and writes the
    /// master to `output_path`. Does nothing at all unless both inputs are
    /// given.
    ///
    /// On error, no master file is written, but stems that were already
    /// written stay on disk.
    pub fn render_files(
        &self,
        midi_path: Option<&Path>,
        config_path: Option<&Path>,
        output_path: &Path,
    ) -> Result<RenderOutcome> {
        let (midi_path, config_path) = match (midi_path, config_path) {
            (Some(midi_path), Some(config_path)) => (midi_path, config_path),
            _ => {
                debug!("MIDI file or configuration not given; nothing to do");
                return Ok(RenderOutcome::MissingInputs);
            }
        };

        let midi = MidiFile::from_path(midi_path)?;
        let performance = resolve_timing(&midi)?;
        let config = RenderSettings::new_from_file(config_path)?.to_render_config();
        let mix = self.render_performance(&performance, &config)?;

        IOHelper::write_wav(
            output_path,
            &mix.buffer,
            self.params.sample_rate,
            self.params.encoding,
        )?;
        info!(
            "wrote {:.3}s of {}-channel audio to {}",
            mix.duration_seconds,
            self.params.channels,
            output_path.display()
        );
        Ok(RenderOutcome::Rendered(mix))
    }

    /// The in-memory pipeline. Stems are written if
    /// [RenderParams::stems_dir] is set; nothing else touches the disk.
    pub fn render(&self, midi: &MidiFile, config: &RenderConfig) -> Result<RenderedMix> {
        self.render_performance(&resolve_timing(midi)?, config)
    }

    pub fn render_performance(
        &self,
        performance: &ResolvedPerformance,
        config: &RenderConfig,
    ) -> Result<RenderedMix> {
        let duration_seconds = performance.length_seconds + self.params.tail_seconds;
        let window = RenderWindow::new_with(
            self.params.sample_rate,
            self.params.channels,
            duration_seconds,
        );
        window.validate()?;

        let mut reports = Vec::with_capacity(performance.tracks.len());
        let mut jobs = Vec::default();
        for (index, track) in performance.tracks.iter().enumerate() {
            if let Some(config) = config.config_for_track(index) {
                jobs.push(TrackJob {
                    index,
                    track,
                    config,
                });
            } else {
                debug!(
                    "track {index} (source track {}) has no configuration; leaving it out",
                    track.source_index
                );
                reports.push(TrackReport {
                    index,
                    source_index: track.source_index,
                    outcome: TrackOutcome::Unconfigured,
                    stem_path: None,
                });
            }
        }

        let mut results = if self.params.jobs > 1 && jobs.len() > 1 {
            self.render_parallel(&jobs, &window)?
        } else {
            let mut results = Vec::with_capacity(jobs.len());
            for job in &jobs {
                // Stop at the first failure rather than rendering the rest.
                let result = self.render_job(job, &window);
                let failed = result.is_err();
                results.push((job.index, result));
                if failed {
                    break;
                }
            }
            results
        };
        results.sort_by_key(|(index, _)| *index);

        let mut bus = MixBus::new(window.channels, window.frames());
        for (index, result) in results {
            let source_index = performance.tracks[index].source_index;
            match result? {
                Some((buffer, stem_path)) => {
                    bus.accumulate(&buffer)?;
                    reports.push(TrackReport {
                        index,
                        source_index,
                        outcome: TrackOutcome::Rendered,
                        stem_path,
                    });
                }
                None => reports.push(TrackReport {
                    index,
                    source_index,
                    outcome: TrackOutcome::SkippedNonInstrument,
                    stem_path: None,
                }),
            }
        }
        reports.sort_by_key(|report| report.index);
        info!(
            "mixed {} of {} tracks",
            bus.track_count(),
            performance.tracks.len()
        );

        let buffer = apply_effect_chain(
            &self.host,
            &config.master_effects,
            bus.into_buffer(),
            self.params.sample_rate,
        )?;
        Ok(RenderedMix {
            tempo: performance.tempo,
            length_seconds: performance.length_seconds,
            duration_seconds,
            buffer,
            tracks: reports,
        })
    }

    fn render_job(
        &self,
        job: &TrackJob,
        window: &RenderWindow,
    ) -> Result<Option<(AudioBuffer, Option<PathBuf>)>> {
        let Some(buffer) = render_track(&self.host, job.track, job.config, window)? else {
            return Ok(None);
        };
        let stem_path = match &self.params.stems_dir {
            Some(stems_dir) => {
                let path = IOHelper::stem_path(stems_dir, job.index);
                IOHelper::write_wav(&path, &buffer, window.sample_rate, self.params.encoding)?;
                debug!("wrote stem {}", path.display());
                Some(path)
            }
            None => None,
        };
        Ok(Some((buffer, stem_path)))
    }

    // Splits the jobs into contiguous groups, one per worker. Results come
    // back over a channel in whatever order they finish.
    fn render_parallel(&self, jobs: &[TrackJob], window: &RenderWindow) -> Result<Vec<JobResult>> {
        let worker_count = self.params.jobs.min(jobs.len());
        let group_size = (jobs.len() + worker_count - 1) / worker_count;
        debug!(
            "rendering {} tracks on {worker_count} threads",
            jobs.len()
        );

        let (sender, receiver) = crossbeam::channel::unbounded::<JobResult>();
        crossbeam::thread::scope(|scope| {
            for group in jobs.chunks(group_size) {
                let sender = sender.clone();
                scope.spawn(move |_| {
                    for job in group {
                        let result = self.render_job(job, window);
                        // The receiver outlives the scope, so this can't fail.
                        let _ = sender.send((job.index, result));
                    }
                });
            }
        })
        .map_err(|_| RenderError::WorkerPanic)?;
        drop(sender);

        Ok(receiver.into_iter().collect())
    }
}
