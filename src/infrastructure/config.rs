use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::application::render::RenderOptions;

pub const DEFAULT_CONFIG_FILE: &str = "pilotdiff.toml";

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    #[serde(default)]
    pub report: ReportConfig,
    pub output: OutputConfig,
    pub sections: Vec<SectionConfig>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReportConfig {
    #[serde(default = "default_title")]
    pub title: String,
    /// Text for cells of levels a row does not reach.
    #[serde(default = "default_placeholder")]
    pub placeholder: String,
}

fn default_title() -> String {
    "Configuration changes".to_string()
}

fn default_placeholder() -> String {
    "-".to_string()
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            title: default_title(),
            placeholder: default_placeholder(),
        }
    }
}

impl ReportConfig {
    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            placeholder: self.placeholder.clone(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct OutputConfig {
    pub dir: String,
}

/// One report section: a pilot/production snapshot pair.
#[derive(Debug, Deserialize, Clone)]
pub struct SectionConfig {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    pub pilot: PathBuf,
    pub production: PathBuf,
}

impl SectionConfig {
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.id)
    }
}

impl AppConfig {
    /// Load a TOML config, then apply `PILOTDIFF__*` environment overrides
    /// (e.g. `PILOTDIFF__OUTPUT__DIR`). Relative snapshot paths resolve
    /// against the config file's directory.
    pub fn load(path: &str) -> Result<Self> {
        let settings = Config::builder()
            .add_source(File::new(path, FileFormat::Toml))
            .add_source(Environment::with_prefix("PILOTDIFF").separator("__"))
            .build()
            .with_context(|| format!("Failed to read config file: {}", path))?;
        let mut cfg: AppConfig = settings
            .try_deserialize()
            .with_context(|| "Failed to parse config TOML")?;

        let base = Path::new(path).parent().unwrap_or(Path::new(""));
        for section in &mut cfg.sections {
            section.pilot = base.join(&section.pilot);
            section.production = base.join(&section.production);
        }
        Ok(cfg)
    }

    /// `pilotdiff.toml` in the working directory when present, otherwise
    /// the per-user config directory.
    pub fn default_path() -> PathBuf {
        let local = PathBuf::from(DEFAULT_CONFIG_FILE);
        if local.exists() {
            return local;
        }
        dirs::config_dir()
            .map(|dir| dir.join("pilotdiff").join(DEFAULT_CONFIG_FILE))
            .unwrap_or(local)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn load_parses_sections_and_resolves_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pilotdiff.toml");
        fs::write(
            &path,
            r#"
[report]
title = "Release 42"

[output]
dir = "out"

[[sections]]
id = "users"
pilot = "pilot/users.json"
production = "/abs/users.json"
"#,
        )
        .unwrap();

        let cfg = AppConfig::load(path.to_str().unwrap()).unwrap();
        assert_eq!(cfg.report.title, "Release 42");
        assert_eq!(cfg.report.placeholder, "-");
        assert_eq!(cfg.output.dir, "out");
        assert_eq!(cfg.sections.len(), 1);
        assert_eq!(cfg.sections[0].display_title(), "users");
        assert_eq!(cfg.sections[0].pilot, dir.path().join("pilot/users.json"));
        assert_eq!(cfg.sections[0].production, PathBuf::from("/abs/users.json"));
    }

    #[test]
    fn load_fails_on_missing_file() {
        let err = AppConfig::load("/nope/pilotdiff.toml").unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }

    #[test]
    fn report_defaults() {
        let r = ReportConfig::default();
        assert_eq!(r.title, "Configuration changes");
        assert_eq!(r.render_options(), RenderOptions::default());
    }
}
