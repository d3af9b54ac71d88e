use crate::core::error::Result;
use crate::core::pixel_buffer::{PixelBuffer, TextureKey};
use crate::core::viewport::{Bounds, Quad};

/// Everything a draw call needs besides the texture
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawParams {
    pub bounds: Bounds,
    pub quad: Quad,
    pub clear_color: [f64; 4],
}

/// GPU operations the display surface is built on
///
/// The surface owns every `Context` and `Texture` it gets back and hands
/// them back for release; textures are always released before the context
/// that created them.
pub trait RenderBackend {
    type Context;
    type Texture;

    /// Create a rendering context for the given drawable size
    fn create_context(&mut self, bounds: Bounds) -> Result<Self::Context>;

    /// Allocate a texture able to hold frames with this key
    fn create_texture(&mut self, context: &mut Self::Context, key: TextureKey) -> Result<Self::Texture>;

    /// Copy the frame's pixels into the texture
    fn upload(
        &mut self,
        context: &mut Self::Context,
        texture: &mut Self::Texture,
        buffer: &PixelBuffer<'_>,
    ) -> Result<()>;

    /// Draw the texture and present it
    fn draw(
        &mut self,
        context: &mut Self::Context,
        texture: &Self::Texture,
        params: &DrawParams,
    ) -> Result<()>;

    fn release_texture(&mut self, context: &mut Self::Context, texture: Self::Texture);

    fn destroy_context(&mut self, context: Self::Context);
}
