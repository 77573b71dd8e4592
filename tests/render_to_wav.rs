// Copyright (c) 2023 Mike Tsao. All rights reserved.

use float_cmp::approx_eq;
use midly::{
    num::{u15, u24, u28, u4, u7},
    Format, Header, MetaMessage, MidiMessage, Smf, Timing, TrackEvent, TrackEventKind,
};
use mixdown::{
    resolve_timing, IOHelper, MidiFile, Orchestrator, RenderOutcome, RenderParams,
    RenderSettings, ToyPluginHost, TrackOutcome, WavEncoding,
};
use mixdown_core::time::SampleRate;
use more_asserts::assert_gt;
use std::{
    path::{Path, PathBuf},
    process::Command,
};

fn note(delta: u32, key: u8, velocity: u8) -> TrackEvent<'static> {
    TrackEvent {
        delta: u28::from(delta),
        kind: TrackEventKind::Midi {
            channel: u4::from(0),
            message: MidiMessage::NoteOn {
                key: u7::from(key),
                vel: u7::from(velocity),
            },
        },
    }
}

fn meta(delta: u32, message: MetaMessage<'static>) -> TrackEvent<'static> {
    TrackEvent {
        delta: u28::from(delta),
        kind: TrackEventKind::Meta(message),
    }
}

// A conductor track at 240 BPM, then two one-note tracks. The second note
// ends at 960 ticks, which is half a second.
fn write_song(dir: &Path) -> PathBuf {
    let mut smf = Smf::new(Header::new(
        Format::Parallel,
        Timing::Metrical(u15::from(480)),
    ));
    smf.tracks = vec![
        vec![
            meta(0, MetaMessage::Tempo(u24::from(250_000))),
            meta(0, MetaMessage::EndOfTrack),
        ],
        vec![
            note(0, 60, 100),
            note(480, 60, 0),
            meta(0, MetaMessage::EndOfTrack),
        ],
        vec![
            note(0, 64, 100),
            note(960, 64, 0),
            meta(0, MetaMessage::EndOfTrack),
        ],
    ];
    let path = dir.join("song.mid");
    smf.save(&path).unwrap();
    path
}

fn write_preset(dir: &Path, name: &str, contents: serde_json::Value) -> String {
    let path = dir.join(name);
    std::fs::write(&path, contents.to_string()).unwrap();
    path.to_str().unwrap().to_string()
}

fn write_config(dir: &Path) -> PathBuf {
    let quiet_source = write_preset(dir, "quiet.json", serde_json::json!({ "level": 0.25 }));
    let half = write_preset(dir, "half.json", serde_json::json!({ "gain": 0.5 }));
    let config = serde_json::json!({
        "tracks": [
            { "synthesizer": "toy-audio-source", "preset": quiet_source },
            {
                "synthesizer": "toy-synth",
                "preset": null,
                "effect_chain": [
                    { "effect": "gain", "preset": half },
                    { "effect": "" }
                ]
            }
        ],
        "master_effects": [ { "effect": "limiter" } ]
    });
    let path = dir.join("config.json");
    std::fs::write(&path, config.to_string()).unwrap();
    path
}

fn render(dir: &Path, params: RenderParams) -> (PathBuf, RenderOutcome) {
    let song = write_song(dir);
    let config = write_config(dir);
    let output = dir.join("out.wav");
    let outcome = Orchestrator::new_with(ToyPluginHost::default(), params)
        .unwrap()
        .render_files(Some(&song), Some(&config), &output)
        .unwrap();
    (output, outcome)
}

#[test]
fn renders_master_and_stems() {
    let dir = tempfile::tempdir().unwrap();
    let (output, outcome) = render(
        dir.path(),
        RenderParams {
            sample_rate: SampleRate::new(8000),
            channels: 2,
            tail_seconds: 0.25,
            stems_dir: Some(dir.path().to_path_buf()),
            ..Default::default()
        },
    );

    let RenderOutcome::Rendered(mix) = outcome else {
        panic!("expected a render");
    };
    assert!(approx_eq!(f64, mix.tempo.bpm(), 240.0));
    assert!(approx_eq!(f64, mix.length_seconds, 0.5));
    assert_eq!(mix.tracks.len(), 2);
    assert_eq!(mix.tracks[0].source_index, 1);
    assert!(mix
        .tracks
        .iter()
        .all(|t| t.outcome == TrackOutcome::Rendered));

    // 0.75 seconds at 8KHz.
    let spec = hound::WavReader::open(&output).unwrap().spec();
    assert_eq!(spec.channels, 2);
    assert_eq!(spec.sample_rate, 8000);
    assert_eq!(spec.sample_format, hound::SampleFormat::Float);
    let (_, master) = IOHelper::read_wav(&output).unwrap();
    assert_eq!(master.frame_count(), 6000);

    let (_, source) = IOHelper::read_wav(&dir.path().join("track_0.wav")).unwrap();
    let (_, synth) = IOHelper::read_wav(&dir.path().join("track_1.wav")).unwrap();
    assert!(source.channel(0).iter().all(|s| *s == 0.25));
    assert_gt!(synth.peak(), 0.0);

    // Nothing reaches the limiter's ceiling, so the master is just the sum.
    for frame in (0..master.frame_count()).step_by(53) {
        for channel in 0..2 {
            let expected = source.sample(channel, frame).0 + synth.sample(channel, frame).0;
            assert!(approx_eq!(
                f64,
                master.sample(channel, frame).0,
                expected,
                epsilon = 1.0e-6
            ));
        }
    }
}

#[test]
fn in_memory_render_matches_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let params = RenderParams {
        sample_rate: SampleRate::new(8000),
        ..Default::default()
    };
    let (output, _) = render(dir.path(), params.clone());
    let (_, from_disk) = IOHelper::read_wav(&output).unwrap();

    let midi = MidiFile::from_path(&dir.path().join("song.mid")).unwrap();
    let performance = resolve_timing(&midi).unwrap();
    assert_eq!(performance.tracks.len(), 2);
    let config = RenderSettings::new_from_file(&dir.path().join("config.json"))
        .unwrap()
        .to_render_config();

    let mix = Orchestrator::new_with(ToyPluginHost::default(), params)
        .unwrap()
        .render(&midi, &config)
        .unwrap();
    assert_eq!(mix.buffer.shape(), from_disk.shape());
    for frame in (0..from_disk.frame_count()).step_by(37) {
        // Float32 files round each sample to f32.
        assert!(approx_eq!(
            f64,
            mix.buffer.sample(0, frame).0,
            from_disk.sample(0, frame).0,
            epsilon = 1.0e-6
        ));
    }
}

#[test]
fn yaml_config_pcm_output_and_threads() {
    let dir = tempfile::tempdir().unwrap();
    let song = write_song(dir.path());
    let config = dir.path().join("config.yaml");
    std::fs::write(
        &config,
        "tracks:\n  - synthesizer: toy-synth\n  - synthesizer: toy-synth\n    effect_chain:\n      - effect: delay\n",
    )
    .unwrap();
    let output = dir.path().join("out.wav");

    let orchestrator = Orchestrator::new_with(
        ToyPluginHost::default(),
        RenderParams {
            sample_rate: SampleRate::new(8000),
            channels: 1,
            jobs: 2,
            encoding: WavEncoding::Pcm24,
            ..Default::default()
        },
    )
    .unwrap();
    let outcome = orchestrator
        .render_files(Some(&song), Some(&config), &output)
        .unwrap();
    assert!(matches!(outcome, RenderOutcome::Rendered(_)));

    let spec = hound::WavReader::open(&output).unwrap().spec();
    assert_eq!(spec.channels, 1);
    assert_eq!(spec.bits_per_sample, 24);
    assert_eq!(spec.sample_format, hound::SampleFormat::Int);
}

#[test]
fn cli_without_inputs_does_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let status = Command::new(env!("CARGO_BIN_EXE_mixdown-cli"))
        .current_dir(dir.path())
        .args(["--output", "out.wav", "--srate", "0"])
        .status()
        .unwrap();
    assert!(status.success());
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}

#[test]
fn cli_renders() {
    let dir = tempfile::tempdir().unwrap();
    let song = write_song(dir.path());
    let config = write_config(dir.path());
    let output = dir.path().join("master.wav");
    let status = Command::new(env!("CARGO_BIN_EXE_mixdown-cli"))
        .arg("--input")
        .arg(&song)
        .arg("--json")
        .arg(&config)
        .arg("--output")
        .arg(&output)
        .arg("--stems-dir")
        .arg(dir.path())
        .args(["--srate", "8000", "--channels", "3", "--tail", "0.5", "-q"])
        .status()
        .unwrap();
    assert!(status.success());

    let (sample_rate, master) = IOHelper::read_wav(&output).unwrap();
    assert_eq!(sample_rate, SampleRate::new(8000));
    assert_eq!(master.channel_count(), 3);
    assert_eq!(master.frame_count(), 8000);
    assert!(dir.path().join("track_0.wav").exists());
    assert!(dir.path().join("track_1.wav").exists());
}

#[test]
fn cli_reports_failures() {
    let dir = tempfile::tempdir().unwrap();
    let song = write_song(dir.path());
    let config = dir.path().join("bad.json");
    std::fs::write(&config, r#"{ "tracks": [ { "synthesizer": "Serum" } ] }"#).unwrap();
    let output = dir.path().join("master.wav");
    let status = Command::new(env!("CARGO_BIN_EXE_mixdown-cli"))
        .arg("--input")
        .arg(&song)
        .arg("--json")
        .arg(&config)
        .arg("--output")
        .arg(&output)
        .arg("-q")
        .status()
        .unwrap();
    assert!(!status.success());
    assert!(!output.exists());
}
