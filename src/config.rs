//! Engine registry and per-slot settings.
//!
//! Both are plain serde structures stored as TOML:
//!
//! ```toml
//! [[engines]]
//! name = "Random"
//! path = "./xo-rust"
//! args = ["brain"]
//!
//! [[slots]]
//! engine_id = 0
//! show_engine_io = true
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::constants::SLOT_COUNT;

/// How to launch one engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineRecord {
    pub name: String,
    pub path: PathBuf,
    /// Run a per-slot copy of the executable instead of `path` itself.
    #[serde(default)]
    pub need_local_copy: bool,
    /// Extra command-line arguments.
    #[serde(default)]
    pub args: Vec<String>,
}

impl EngineRecord {
    pub fn new(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            need_local_copy: false,
            args: Vec::new(),
        }
    }

    pub fn with_args(mut self, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.args = args.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_local_copy(mut self, need_local_copy: bool) -> Self {
        self.need_local_copy = need_local_copy;
        self
    }
}

/// Ordered list of known engines. An engine's id is its index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineRegistry {
    #[serde(default)]
    engines: Vec<EngineRecord>,
}

impl EngineRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an engine and return its id.
    pub fn add(&mut self, record: EngineRecord) -> usize {
        self.engines.push(record);
        self.engines.len() - 1
    }

    pub fn get(&self, id: usize) -> Option<&EngineRecord> {
        self.engines.get(id)
    }

    pub fn count(&self) -> usize {
        self.engines.len()
    }

    pub fn names(&self) -> Vec<String> {
        self.engines.iter().map(|e| e.name.clone()).collect()
    }

    /// `"name (path)"` for each engine.
    pub fn long_names(&self) -> Vec<String> {
        self.engines
            .iter()
            .map(|e| format!("{} ({})", e.name, e.path.display()))
            .collect()
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).context("Failed to parse engine registry")
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).context("Failed to serialize engine registry")
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Loading engine registry");
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let registry = Self::from_toml_str(&text)?;
        info!(engines = registry.count(), "Engine registry loaded");
        Ok(registry)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, self.to_toml_string()?)
            .with_context(|| format!("Failed to write {}", path.display()))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotSettings {
    #[serde(default)]
    pub engine_id: usize,
    #[serde(default)]
    pub show_engine_io: bool,
}

/// Per-slot engine selection and console echo.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    slots: Vec<SlotSettings>,
}

impl Settings {
    fn slot(&self, slot: usize) -> SlotSettings {
        self.slots.get(slot).copied().unwrap_or_default()
    }

    fn slot_mut(&mut self, slot: usize) -> &mut SlotSettings {
        if self.slots.len() <= slot {
            self.slots.resize(slot + 1, SlotSettings::default());
        }
        &mut self.slots[slot]
    }

    /// Selected engine id for `slot`; engine 0 when never chosen.
    pub fn engine_id(&self, slot: usize) -> usize {
        self.slot(slot).engine_id
    }

    pub fn select_engine(&mut self, slot: usize, engine_id: usize) {
        self.slot_mut(slot).engine_id = engine_id;
    }

    pub fn show_engine_io(&self, slot: usize) -> bool {
        self.slot(slot).show_engine_io
    }

    pub fn set_show_engine_io(&mut self, slot: usize, value: bool) {
        self.slot_mut(slot).show_engine_io = value;
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        let mut settings: Self = toml::from_str(text).context("Failed to parse settings")?;
        settings.slots.truncate(SLOT_COUNT);
        Ok(settings)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string(self).context("Failed to serialize settings")
    }

    /// Load settings, falling back to defaults when the file does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            debug!(path = %path.display(), "No settings file, using defaults");
            return Ok(Self::default());
        }
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::from_toml_str(&text)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        fs::write(path, self.to_toml_string()?)
            .with_context(|| format!("Failed to write {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_ids_are_insertion_order() {
        let mut registry = EngineRegistry::new();
        assert_eq!(registry.add(EngineRecord::new("Alpha", "/opt/alpha")), 0);
        assert_eq!(
            registry.add(EngineRecord::new("Beta", "beta").with_local_copy(true)),
            1
        );
        assert_eq!(registry.count(), 2);
        assert_eq!(registry.names(), vec!["Alpha", "Beta"]);
        assert_eq!(registry.long_names()[0], "Alpha (/opt/alpha)");
        assert!(registry.get(1).unwrap().need_local_copy);
        assert!(registry.get(2).is_none());
    }

    #[test]
    fn test_registry_toml() {
        let text = r#"
            [[engines]]
            name = "Random"
            path = "./xo-rust"
            args = ["brain"]

            [[engines]]
            name = "Copy"
            path = "engine.exe"
            need_local_copy = true
        "#;
        let registry = EngineRegistry::from_toml_str(text).unwrap();
        assert_eq!(
            registry.get(0),
            Some(&EngineRecord::new("Random", "./xo-rust").with_args(["brain"]))
        );
        assert!(registry.get(1).unwrap().need_local_copy);

        let again = EngineRegistry::from_toml_str(&registry.to_toml_string().unwrap()).unwrap();
        assert_eq!(again, registry);
    }

    #[test]
    fn test_registry_rejects_garbage() {
        assert!(EngineRegistry::from_toml_str("engines = 3").is_err());
    }

    #[test]
    fn test_settings_defaults() {
        let settings = Settings::from_toml_str("").unwrap();
        assert_eq!(settings.engine_id(0), 0);
        assert_eq!(settings.engine_id(1), 0);
        assert!(!settings.show_engine_io(1));
    }

    #[test]
    fn test_settings_update() {
        let mut settings = Settings::default();
        settings.select_engine(1, 3);
        settings.set_show_engine_io(1, true);
        assert_eq!(settings.engine_id(1), 3);
        assert!(settings.show_engine_io(1));
        assert_eq!(settings.engine_id(0), 0);

        let text = settings.to_toml_string().unwrap();
        assert_eq!(Settings::from_toml_str(&text).unwrap(), settings);
    }
}
