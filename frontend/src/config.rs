//! Configuration: a TOML file merged with command-line flags.
//!
//! The file supplies the ordered binding list, the default-binding switch,
//! the video mode and the fullscreen flag; CLI flags override it. A missing
//! file is not an error (defaults apply), a malformed file is: the user
//! asked for configuration they are not getting.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

use crate::blit::VideoMode;

pub const CONFIG_FILE: &str = "chroma.toml";

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
pub struct Config {
    #[serde(default)]
    pub fullscreen: bool,
    #[serde(default)]
    pub video_mode: Option<VideoMode>,
    /// Drop the built-in default bindings before applying `[[binding]]`
    /// entries.
    #[serde(default)]
    pub clear_default_bindings: bool,
    #[serde(default, rename = "binding")]
    pub bindings: Vec<BindingEntry>,
}

/// One `[[binding]]` table: identifier text and command text, kept in file
/// order so later entries override earlier ones.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BindingEntry {
    pub id: String,
    pub command: String,
}

impl Config {
    pub fn load(path: &Path) -> anyhow::Result<Config> {
        if !path.exists() {
            log::debug!("no config file at {}, using defaults", path.display());
            return Ok(Config::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        toml::from_str(&text).with_context(|| format!("failed to parse {}", path.display()))
    }

    /// Binding list in the shape the table builder consumes.
    pub fn binding_pairs(&self) -> Vec<(String, String)> {
        self.bindings
            .iter()
            .map(|b| (b.id.clone(), b.command.clone()))
            .collect()
    }
}

/// Default config file location under the platform config directory.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("chroma")
        .join(CONFIG_FILE)
}
