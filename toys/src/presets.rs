// Copyright (c) 2023 Mike Tsao. All rights reserved.

use mixdown_core::{traits::Controllable, ParameterType};
use serde::{Deserialize, Serialize};
use std::{collections::BTreeMap, fs, path::Path};

/// A named-parameter snapshot. On disk it's a flat JSON or YAML map from
/// parameter name to number, e.g. `{ "gain": 0.5, "waveform": 2 }`.
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct Preset {
    values: BTreeMap<String, ParameterType>,
}
impl Preset {
    pub fn new_with(values: BTreeMap<String, ParameterType>) -> Self {
        Self { values }
    }

    /// Reads a preset file. `.yaml` and `.yml` files are YAML; everything
    /// else is JSON. Errors come back as a human-readable reason.
    pub fn new_from_file(path: &Path) -> Result<Self, String> {
        let contents = fs::read_to_string(path)
            .map_err(|e| format!("can't read preset {}: {e}", path.display()))?;
        let is_yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml") | Some("yml")
        );
        if is_yaml {
            serde_yaml::from_str(&contents)
                .map_err(|e| format!("can't parse preset {}: {e}", path.display()))
        } else {
            serde_json::from_str(&contents)
                .map_err(|e| format!("can't parse preset {}: {e}", path.display()))
        }
    }

    pub fn values(&self) -> &BTreeMap<String, ParameterType> {
        &self.values
    }

    /// Sets every parameter in the preset on `target`, in name order. Fails
    /// on the first name `target` doesn't know, or the first value that isn't
    /// a finite number, leaving earlier ones applied.
    pub fn apply_to(&self, target: &mut dyn Controllable) -> Result<(), String> {
        for (name, value) in &self.values {
            if !value.is_finite() {
                return Err(format!("parameter `{name}` has non-finite value {value}"));
            }
            if !target.control_set_param_by_name(name, *value) {
                let known: Vec<&str> = (0..target.control_index_count())
                    .filter_map(|i| target.control_name_for_index(i))
                    .collect();
                return Err(format!(
                    "unknown parameter `{name}` (known: {})",
                    if known.is_empty() {
                        "none".to_string()
                    } else {
                        known.join(", ")
                    }
                ));
            }
        }
        Ok(())
    }
}
