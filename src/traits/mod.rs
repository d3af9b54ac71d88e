pub mod backend;
pub mod pixel_buffer_view;

pub use backend::*;
pub use pixel_buffer_view::*;
