use crate::core::error::Result;
use crate::core::pixel_buffer::PixelBuffer;

/// Anything that can present a stream of camera frames
///
/// Calls must come from the thread that owns the rendering context.
pub trait PixelBufferView {
    /// Draw one frame into the view's bounds
    ///
    /// The buffer is only read during the call. Failures drop the frame and
    /// are logged; the returned error lets stricter callers count them.
    fn display_pixel_buffer(&mut self, buffer: &PixelBuffer<'_>) -> Result<()>;

    /// Release every cached texture, keeping the rendering context
    fn flush_pixel_buffer_cache(&mut self);

    /// Release textures and the rendering context
    fn reset(&mut self);
}
