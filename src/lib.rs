pub mod cli;
pub mod config;
pub mod core;
pub mod source;
pub mod traits;

pub use crate::core::{
    AspectMode, Bounds, DisplayStats, DisplaySurface, PixelBuffer, PixelFormat, SurfaceError,
    SurfaceOptions,
};
pub use traits::{PixelBufferView, RenderBackend};
