use std::fmt;
use std::str::FromStr;

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// How a frame is mapped onto bounds with a different aspect ratio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AspectMode {
    /// Scale to cover the bounds, cropping the overflow evenly on both sides
    #[default]
    Fill,
    /// Scale to fit inside the bounds, leaving bars of clear color
    Fit,
    /// Ignore aspect ratio
    Stretch,
}

impl AspectMode {
    pub fn next(self) -> Self {
        match self {
            AspectMode::Fill => AspectMode::Fit,
            AspectMode::Fit => AspectMode::Stretch,
            AspectMode::Stretch => AspectMode::Fill,
        }
    }
}

impl fmt::Display for AspectMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AspectMode::Fill => "fill",
            AspectMode::Fit => "fit",
            AspectMode::Stretch => "stretch",
        };
        f.write_str(name)
    }
}

impl FromStr for AspectMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fill" => Ok(AspectMode::Fill),
            "fit" => Ok(AspectMode::Fit),
            "stretch" => Ok(AspectMode::Stretch),
            _ => Err(format!("unknown aspect mode '{}' (fill, fit, stretch)", s)),
        }
    }
}

/// Drawable size in physical pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bounds {
    pub width: u32,
    pub height: u32,
}

impl Bounds {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }
}

/// Placement of a textured quad in normalized device coordinates
///
/// `position_scale` shrinks the full-screen quad, `uv_scale`/`uv_offset`
/// select the visible part of the texture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quad {
    pub position_scale: Vec2,
    pub uv_scale: Vec2,
    pub uv_offset: Vec2,
}

impl Quad {
    pub const FULL: Quad = Quad {
        position_scale: Vec2::ONE,
        uv_scale: Vec2::ONE,
        uv_offset: Vec2::ZERO,
    };

    /// Compute the quad for an image of `image_aspect` drawn into `bounds`
    pub fn compute(mode: AspectMode, image_aspect: f32, bounds: Bounds) -> Quad {
        if bounds.is_empty() || !image_aspect.is_finite() || image_aspect <= 0.0 {
            return Quad::FULL;
        }

        let bounds_aspect = bounds.aspect_ratio();
        // > 1 when the image is relatively wider than the bounds
        let ratio = image_aspect / bounds_aspect;

        match mode {
            AspectMode::Stretch => Quad::FULL,
            AspectMode::Fit => {
                let position_scale = if ratio > 1.0 {
                    Vec2::new(1.0, 1.0 / ratio)
                } else {
                    Vec2::new(ratio, 1.0)
                };
                Quad {
                    position_scale,
                    ..Quad::FULL
                }
            }
            AspectMode::Fill => {
                let uv_scale = if ratio > 1.0 {
                    Vec2::new(1.0 / ratio, 1.0)
                } else {
                    Vec2::new(1.0, ratio)
                };
                Quad {
                    position_scale: Vec2::ONE,
                    uv_scale,
                    uv_offset: (Vec2::ONE - uv_scale) * 0.5,
                }
            }
        }
    }

    /// Pixel rectangle `(x, y, width, height)` covered by the quad
    pub fn pixel_rect(&self, bounds: Bounds) -> (u32, u32, u32, u32) {
        let size = Vec2::new(bounds.width as f32, bounds.height as f32);
        let drawn = (size * self.position_scale).round();
        let origin = ((size - drawn) * 0.5).round();
        (origin.x as u32, origin.y as u32, drawn.x as u32, drawn.y as u32)
    }
}
