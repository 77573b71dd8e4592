// Copyright (c) 2023 Mike Tsao. All rights reserved.

//! The CLI (command-line interface) tool renders a MIDI file through the
//! plugins named in a configuration file.

use anyhow::Context;
use clap::Parser;
use mixdown::{
    app_version, Orchestrator, RenderOutcome, RenderParams, ToyPluginHost, TrackOutcome,
    WavEncoding,
};
use mixdown_core::time::SampleRate;
use std::{path::PathBuf, time::Instant};

#[derive(Parser, Debug)]
#[clap(author, about, long_about = None)]
struct Args {
    /// MIDI file to render
    #[clap(short = 'i', long, value_parser)]
    input: Option<PathBuf>,

    /// Render configuration (JSON, or YAML if it ends in .yaml/.yml)
    #[clap(short = 'j', long, value_parser)]
    json: Option<PathBuf>,

    /// Where to write the master WAV file
    #[clap(short = 'o', long, value_parser, default_value = "out.wav")]
    output: PathBuf,

    /// Sample rate
    #[clap(short = 'r', long, value_parser, default_value_t = SampleRate::DEFAULT_SAMPLE_RATE)]
    srate: usize,

    /// Number of output channels
    #[clap(short = 'c', long, value_parser, default_value_t = 2)]
    channels: usize,

    /// Seconds of extra audio after the performance
    #[clap(short = 't', long, value_parser, default_value_t = 0.0)]
    tail: f64,

    /// Directory for per-track stem files
    #[clap(short = 's', long, value_parser, default_value = ".")]
    stems_dir: PathBuf,

    /// Number of tracks to render at once
    #[clap(short = 'J', long, value_parser, default_value_t = 1)]
    jobs: usize,

    /// WAV sample encoding: float32, pcm16, or pcm24
    #[clap(short = 'e', long, value_parser, default_value_t = WavEncoding::Float32)]
    encoding: WavEncoding,

    /// Suppress status updates while processing
    #[clap(short = 'q', long, value_parser)]
    quiet: bool,

    /// Print perf information
    #[clap(short = 'p', long, value_parser)]
    perf: bool,

    /// Print version and exit
    #[clap(short = 'v', long, value_parser)]
    version: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(if args.quiet {
        "warn"
    } else {
        "info"
    }))
    .init();

    if args.version {
        println!("mixdown-cli {}", app_version());
        return Ok(());
    }

    // Without both inputs there's nothing to do, and bad render options
    // don't matter.
    if args.input.is_none() || args.json.is_none() {
        log::debug!("--input and --json are both needed to render");
        return Ok(());
    }

    let orchestrator = Orchestrator::new_with(
        ToyPluginHost::default(),
        RenderParams {
            sample_rate: SampleRate::new(args.srate),
            channels: args.channels,
            tail_seconds: args.tail,
            stems_dir: Some(args.stems_dir.clone()),
            jobs: args.jobs,
            encoding: args.encoding,
        },
    )?;

    let start_instant = Instant::now();
    let outcome = orchestrator
        .render_files(args.input.as_deref(), args.json.as_deref(), &args.output)
        .with_context(|| format!("rendering to {}", args.output.display()))?;

    if let RenderOutcome::Rendered(mix) = outcome {
        if !args.quiet {
            let rendered = mix
                .tracks
                .iter()
                .filter(|t| t.outcome == TrackOutcome::Rendered)
                .count();
            println!(
                "Rendered {rendered} of {} tracks ({:.2}s at {:.1} BPM) to {}",
                mix.tracks.len(),
                mix.duration_seconds,
                mix.tempo.bpm(),
                args.output.display()
            );
        }
        if args.perf {
            let elapsed = start_instant.elapsed();
            let frame_count = mix.buffer.frame_count().max(1);
            println!(" Render time: {elapsed:.2?}");
            println!(" Frame count: {}", mix.buffer.frame_count());
            println!(
                " usec per frame: {:.2?} (realtime <{:.2?})",
                elapsed.as_micros() as f64 / frame_count as f64,
                1_000_000.0 / args.srate.max(1) as f64
            );
        }
    }
    Ok(())
}
