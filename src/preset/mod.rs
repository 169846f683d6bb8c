//! Named directive bundles
//!
//! Presets are written in the directive grammar itself (`thumb: "rc200x200,q85"`)
//! and parsed once at startup. A request references them as `_thumb`.

use crate::directive::DirectiveSet;
use crate::error::ResizeError;
use std::collections::HashMap;

/// Immutable name → directive bundle map
#[derive(Debug, Clone, Default)]
pub struct PresetStore {
    presets: HashMap<String, DirectiveSet>,
}

impl PresetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse every preset definition
    ///
    /// Fails on a malformed definition or on a preset that references
    /// another preset.
    pub fn from_definitions(definitions: &HashMap<String, String>) -> Result<Self, String> {
        let mut presets = HashMap::with_capacity(definitions.len());

        for (name, directives) in definitions {
            if name.is_empty() {
                return Err("Preset name cannot be empty".to_string());
            }
            let set = DirectiveSet::parse_directives(directives)
                .map_err(|e| format!("Preset '{}' is invalid: {}", name, e))?;
            if !set.presets.is_empty() {
                return Err(format!(
                    "Preset '{}' references other presets ({}); nesting is not supported",
                    name,
                    set.presets.join(", ")
                ));
            }
            presets.insert(name.clone(), set);
        }

        Ok(Self { presets })
    }

    /// Look up a preset by name
    pub fn get(&self, name: &str) -> Result<&DirectiveSet, ResizeError> {
        self.presets
            .get(name)
            .ok_or_else(|| ResizeError::unknown_preset(name))
    }

    pub fn len(&self) -> usize {
        self.presets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }
}
