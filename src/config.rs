// config.rs - Viewer settings loaded from JSON and merged with CLI flags
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::cli::Cli;
use crate::core::{AspectMode, BackendSettings, SurfaceOptions, DEFAULT_CACHE_CAPACITY};

/// GPU power preference as written in config files
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerMode {
    #[default]
    Default,
    Low,
    High,
}

impl From<PowerMode> for wgpu::PowerPreference {
    fn from(mode: PowerMode) -> Self {
        match mode {
            PowerMode::Default => wgpu::PowerPreference::None,
            PowerMode::Low => wgpu::PowerPreference::LowPower,
            PowerMode::High => wgpu::PowerPreference::HighPerformance,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ViewConfig {
    pub aspect_mode: AspectMode,
    pub cache_capacity: usize,
    pub vsync: bool,
    pub clear_color: [f64; 4],
    pub power_preference: PowerMode,
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            aspect_mode: AspectMode::default(),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            vsync: true,
            clear_color: [0.0, 0.0, 0.0, 1.0],
            power_preference: PowerMode::default(),
        }
    }
}

impl ViewConfig {
    pub fn from_json(text: &str) -> anyhow::Result<Self> {
        let config: ViewConfig = serde_json::from_str(text).context("invalid view config")?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_json(&text).with_context(|| format!("in {}", path.display()))
    }

    /// File settings (or defaults) with command-line overrides applied
    pub fn resolve(cli: &Cli) -> anyhow::Result<Self> {
        cli.validate()?;

        let mut config = match &cli.config {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };

        if let Some(mode) = cli.aspect {
            config.aspect_mode = mode;
        }
        if let Some(capacity) = cli.cache_capacity {
            config.cache_capacity = capacity;
        }
        if cli.no_vsync {
            config.vsync = false;
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(self.cache_capacity > 0, "cache_capacity must be at least 1");
        anyhow::ensure!(
            self.clear_color.iter().all(|c| (0.0..=1.0).contains(c)),
            "clear_color components must be within 0.0..=1.0"
        );
        Ok(())
    }

    pub fn surface_options(&self) -> SurfaceOptions {
        SurfaceOptions {
            aspect_mode: self.aspect_mode,
            cache_capacity: self.cache_capacity,
            clear_color: self.clear_color,
        }
    }

    pub fn backend_settings(&self) -> BackendSettings {
        BackendSettings {
            power_preference: self.power_preference.into(),
            vsync: self.vsync,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_empty_json_gives_defaults() {
        let config = ViewConfig::from_json("{}").unwrap();
        assert_eq!(config, ViewConfig::default());
    }

    #[test]
    fn test_partial_json() {
        let config = ViewConfig::from_json(r#"{ "aspect_mode": "fit", "cache_capacity": 2 }"#).unwrap();
        assert_eq!(config.aspect_mode, AspectMode::Fit);
        assert_eq!(config.cache_capacity, 2);
        assert!(config.vsync);
    }

    #[test]
    fn test_unknown_field_rejected() {
        assert!(ViewConfig::from_json(r#"{ "zoom": 2 }"#).is_err());
    }

    #[test]
    fn test_zero_capacity_rejected() {
        assert!(ViewConfig::from_json(r#"{ "cache_capacity": 0 }"#).is_err());
    }

    #[test]
    fn test_clear_color_range_checked() {
        assert!(ViewConfig::from_json(r#"{ "clear_color": [0.0, 2.0, 0.0, 1.0] }"#).is_err());
    }

    #[test]
    fn test_cli_overrides_defaults() {
        let cli = Cli::parse_from(["pixel-view", "--aspect", "stretch", "--cache-capacity", "8", "--no-vsync"]);
        let config = ViewConfig::resolve(&cli).unwrap();
        assert_eq!(config.aspect_mode, AspectMode::Stretch);
        assert_eq!(config.cache_capacity, 8);
        assert!(!config.vsync);
        assert_eq!(config.surface_options().cache_capacity, 8);
        assert!(!config.backend_settings().vsync);
    }

    #[test]
    fn test_resolve_rejects_bad_camera_flags() {
        let cli = Cli::parse_from(["pixel-view", "--width", "40000", "--height", "30000"]);
        assert!(ViewConfig::resolve(&cli).is_err());

        let cli = Cli::parse_from(["pixel-view", "--fps", "0.5"]);
        assert!(ViewConfig::resolve(&cli).is_err());
    }

    #[test]
    fn test_power_mode_maps_to_wgpu() {
        assert_eq!(
            wgpu::PowerPreference::from(PowerMode::High),
            wgpu::PowerPreference::HighPerformance
        );
    }
}
