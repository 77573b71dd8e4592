// Copyright (c) 2023 Mike Tsao. All rights reserved.

//! The `mixdown-settings` crate manages render configuration files. Why is
//! this more than `#[derive(Deserialize, Serialize)]`? Because the file format
//! should remain stable even if the structs that the renderer works with
//! change. [RenderSettings] mirrors the file; [RenderConfig] is what the
//! renderer consumes.

pub use config::{EffectChain, PluginSpec, RenderConfig, TrackConfig};
pub use render::{EffectSettings, RenderSettings, TrackSettings};

mod config;
mod render;
