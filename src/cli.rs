// cli.rs - Command-line interface configuration
use std::path::PathBuf;

use clap::Parser;

use crate::core::{AspectMode, PixelFormat};
use crate::source::{MAX_FRAME_DIMENSION, MIN_FPS};

#[derive(Parser, Debug, Clone)]
#[command(name = "pixel-view")]
#[command(about = "GPU viewer for camera pixel buffers", long_about = None)]
pub struct Cli {
    /// JSON file with view settings
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Aspect policy: fill, fit or stretch
    #[arg(long)]
    pub aspect: Option<AspectMode>,

    /// Distinct frame geometries kept as textures
    #[arg(long = "cache-capacity")]
    pub cache_capacity: Option<usize>,

    /// Present without waiting for vertical sync
    #[arg(long = "no-vsync", default_value = "false")]
    pub no_vsync: bool,

    /// Width of the synthetic camera frames
    #[arg(long, default_value_t = 640)]
    pub width: u32,

    /// Height of the synthetic camera frames
    #[arg(long, default_value_t = 480)]
    pub height: u32,

    /// Frame rate of the synthetic camera
    #[arg(long, default_value_t = 30.0)]
    pub fps: f32,

    /// Pixel format of the synthetic camera: bgra8, rgba8 or gray8
    #[arg(long, default_value = "bgra8")]
    pub format: PixelFormat,
}

impl Cli {
    /// Reject synthetic camera settings the frame source cannot honor
    pub fn validate(&self) -> anyhow::Result<()> {
        for (name, value) in [("width", self.width), ("height", self.height)] {
            anyhow::ensure!(
                (1..=MAX_FRAME_DIMENSION).contains(&value),
                "--{} must be within 1..={}, got {}",
                name,
                MAX_FRAME_DIMENSION,
                value
            );
        }
        anyhow::ensure!(
            self.fps.is_finite() && self.fps >= MIN_FPS,
            "--fps must be at least {}, got {}",
            MIN_FPS,
            self.fps
        );
        anyhow::ensure!(
            self.format.is_supported(),
            "--format {} cannot be generated",
            self.format
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["pixel-view"]);
        assert_eq!((cli.width, cli.height), (640, 480));
        assert_eq!(cli.format, PixelFormat::Bgra8);
        assert!(cli.aspect.is_none());
        assert!(!cli.no_vsync);
    }

    #[test]
    fn test_parses_typed_values() {
        let cli = Cli::parse_from(["pixel-view", "--aspect", "fit", "--format", "gray8", "--fps", "60"]);
        assert_eq!(cli.aspect, Some(AspectMode::Fit));
        assert_eq!(cli.format, PixelFormat::Gray8);
        assert_eq!(cli.fps, 60.0);
    }

    #[test]
    fn test_validate_accepts_defaults() {
        assert!(Cli::parse_from(["pixel-view"]).validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_oversized_frames() {
        let cli = Cli::parse_from(["pixel-view", "--width", "40000", "--height", "30000"]);
        let err = cli.validate().unwrap_err();
        assert!(err.to_string().contains("--width"));

        let cli = Cli::parse_from(["pixel-view", "--height", "0"]);
        assert!(cli.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_slow_fps() {
        let cli = Cli::parse_from(["pixel-view", "--fps", "0.5"]);
        assert!(cli.validate().unwrap_err().to_string().contains("--fps"));
    }

    #[test]
    fn test_validate_rejects_unknown_format() {
        let cli = Cli::parse_from(["pixel-view", "--format", "420v"]);
        assert!(cli.validate().is_err());
    }

    #[test]
    fn test_rejects_bad_aspect() {
        assert!(Cli::try_parse_from(["pixel-view", "--aspect", "zoom"]).is_err());
    }
}
