use crate::traits::{DrawParams, PixelBufferView, RenderBackend};

use super::error::{Result, SurfaceError};
use super::pixel_buffer::PixelBuffer;
use super::texture_cache::{TextureCache, DEFAULT_CACHE_CAPACITY};
use super::viewport::{AspectMode, Bounds, Quad};

/// Surface settings that survive `reset`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceOptions {
    pub aspect_mode: AspectMode,
    pub cache_capacity: usize,
    pub clear_color: [f64; 4],
}

impl Default for SurfaceOptions {
    fn default() -> Self {
        Self {
            aspect_mode: AspectMode::default(),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            clear_color: [0.0, 0.0, 0.0, 1.0],
        }
    }
}

/// Running counters for a surface
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DisplayStats {
    pub frames_presented: u64,
    pub frames_dropped: u64,
    pub contexts_created: u64,
    pub textures_created: u64,
    pub textures_evicted: u64,
    pub textures_released: u64,
}

/// Context and the cache whose entries belong to it
struct ActiveState<C, T> {
    context: C,
    cache: TextureCache<T>,
}

/// Presents externally owned pixel buffers through a render backend
///
/// The context and texture cache are created on the first frame and torn
/// down by `reset`, cache first.
pub struct DisplaySurface<B: RenderBackend> {
    backend: B,
    options: SurfaceOptions,
    bounds: Bounds,
    state: Option<ActiveState<B::Context, B::Texture>>,
    stats: DisplayStats,
}

impl<B: RenderBackend> DisplaySurface<B> {
    pub fn new(backend: B, bounds: Bounds) -> Self {
        Self::with_options(backend, bounds, SurfaceOptions::default())
    }

    pub fn with_options(backend: B, bounds: Bounds, options: SurfaceOptions) -> Self {
        Self {
            backend,
            options,
            bounds,
            state: None,
            stats: DisplayStats::default(),
        }
    }

    /// Whether a rendering context is live
    pub fn is_active(&self) -> bool {
        self.state.is_some()
    }

    /// Number of textures currently cached
    pub fn cached_textures(&self) -> usize {
        self.state.as_ref().map_or(0, |state| state.cache.len())
    }

    pub fn stats(&self) -> DisplayStats {
        self.stats
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn options(&self) -> &SurfaceOptions {
        &self.options
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Update the drawable size; takes effect on the next frame
    pub fn set_bounds(&mut self, bounds: Bounds) {
        if bounds != self.bounds {
            log::debug!("surface bounds {}x{}", bounds.width, bounds.height);
            self.bounds = bounds;
        }
    }

    pub fn set_aspect_mode(&mut self, mode: AspectMode) {
        self.options.aspect_mode = mode;
    }

    fn present(&mut self, buffer: &PixelBuffer<'_>) -> Result<()> {
        buffer.validate()?;

        if self.bounds.is_empty() {
            return Err(SurfaceError::Present("drawable has zero area".into()));
        }

        if self.state.is_none() {
            let context = self.backend.create_context(self.bounds)?;
            self.stats.contexts_created += 1;
            log::info!(
                "rendering context created ({}x{})",
                self.bounds.width,
                self.bounds.height
            );
            self.state = Some(ActiveState {
                context,
                cache: TextureCache::new(self.options.cache_capacity),
            });
        }

        let Some(state) = self.state.as_mut() else {
            return Err(SurfaceError::ContextCreation("no active context".into()));
        };
        let ActiveState { context, cache } = state;
        let backend = &mut self.backend;
        let key = buffer.key();

        // Free the stale texture before allocating, so a full device gets it back
        if let Some((old_key, old_texture)) = cache.make_room(&key) {
            self.stats.textures_evicted += 1;
            log::debug!(
                "texture evicted for {}x{} {}",
                old_key.width,
                old_key.height,
                old_key.format
            );
            backend.release_texture(context, old_texture);
        }

        let lookup = cache.get_or_insert_with(key, || backend.create_texture(context, key))?;
        if lookup.created {
            self.stats.textures_created += 1;
            log::debug!("texture created for {}x{} {}", key.width, key.height, key.format);
        }

        let texture = lookup.texture;
        backend.upload(context, texture, buffer)?;

        let params = DrawParams {
            bounds: self.bounds,
            quad: Quad::compute(self.options.aspect_mode, buffer.aspect_ratio(), self.bounds),
            clear_color: self.options.clear_color,
        };
        backend.draw(context, texture, &params)
    }

    fn release_cache(&mut self) -> usize {
        let Some(ActiveState { context, cache }) = self.state.as_mut() else {
            return 0;
        };

        let drained = cache.drain();
        let released = drained.len();
        for (_, texture) in drained {
            self.backend.release_texture(context, texture);
        }
        self.stats.textures_released += released as u64;
        released
    }
}

impl<B: RenderBackend> PixelBufferView for DisplaySurface<B> {
    fn display_pixel_buffer(&mut self, buffer: &PixelBuffer<'_>) -> Result<()> {
        match self.present(buffer) {
            Ok(()) => {
                self.stats.frames_presented += 1;
                Ok(())
            }
            Err(err) => {
                self.stats.frames_dropped += 1;
                match &err {
                    SurfaceError::InvalidBuffer(_) => log::warn!("frame dropped: {}", err),
                    _ => log::error!("frame dropped: {}", err),
                }
                Err(err)
            }
        }
    }

    fn flush_pixel_buffer_cache(&mut self) {
        let released = self.release_cache();
        if released > 0 {
            log::debug!("flushed {} cached textures", released);
        }
    }

    fn reset(&mut self) {
        self.release_cache();
        if let Some(state) = self.state.take() {
            self.backend.destroy_context(state.context);
            log::info!("rendering context destroyed");
        }
    }
}

impl<B: RenderBackend> Drop for DisplaySurface<B> {
    fn drop(&mut self) {
        self.reset();
    }
}
