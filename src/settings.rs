use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

const DEFAULT_CONFIG_FILE: &str = "antora-spectaql";
const ENV_PREFIX: &str = "ANTORA_SPECTAQL";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Generator command line, split on whitespace.
    pub generator: String,
    /// Directory the generator runs in.
    pub workdir: PathBuf,
    /// Generator output directory, relative to `workdir`.
    pub target_dir: String,
    /// Base for `{component}/modules/{module}/attachments/...`; `~` and `~+` expand.
    pub content_root: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            generator: "npx spectaql".to_string(),
            workdir: PathBuf::from("."),
            target_dir: "public".to_string(),
            content_root: "~+".to_string(),
        }
    }
}

impl Settings {
    /// Defaults, then the settings file, then `ANTORA_SPECTAQL_*` variables.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let source = match file {
            Some(path) => File::from(path).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };
        Config::builder()
            .add_source(source)
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()
            .and_then(|c| c.try_deserialize())
            .context("Failed to load settings")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_spectaql_layout() {
        let s = Settings::default();
        assert_eq!(s.generator, "npx spectaql");
        assert_eq!(s.target_dir, "public");
        assert_eq!(s.content_root, "~+");
        assert_eq!(s.workdir, PathBuf::from("."));
    }

    #[test]
    fn file_values_override_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.yml");
        std::fs::write(&path, "generator: spectaql\ntarget_dir: build/graphql\n").unwrap();
        let s = Settings::load(Some(&path)).unwrap();
        assert_eq!(s.generator, "spectaql");
        assert_eq!(s.target_dir, "build/graphql");
        assert_eq!(s.content_root, "~+");
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Settings::load(Some(&dir.path().join("nope.yml"))).is_err());
    }
}
