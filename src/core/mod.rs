pub mod display_surface;
pub mod error;
pub mod gpu_context;
pub mod pixel_buffer;
pub mod texture_cache;
pub mod viewport;
pub mod wgpu_backend;

pub use display_surface::{DisplayStats, DisplaySurface, SurfaceOptions};
pub use error::{BufferError, SurfaceError};
pub use gpu_context::GpuContext;
pub use pixel_buffer::{PixelBuffer, PixelFormat, TextureKey};
pub use texture_cache::{TextureCache, DEFAULT_CACHE_CAPACITY};
pub use viewport::{AspectMode, Bounds, Quad};
pub use wgpu_backend::{BackendSettings, WgpuBackend};
