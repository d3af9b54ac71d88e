use thiserror::Error;

use super::pixel_buffer::PixelFormat;

/// Why a pixel buffer was rejected before touching the GPU
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BufferError {
    #[error("buffer has zero area ({width}x{height})")]
    ZeroDimensions { width: u32, height: u32 },

    #[error("unsupported pixel format {0}")]
    UnsupportedFormat(PixelFormat),

    #[error("row stride {bytes_per_row} is shorter than {min} bytes")]
    RowStride { bytes_per_row: u32, min: u32 },

    #[error("backing memory holds {actual} bytes, expected at least {expected}")]
    Truncated { expected: usize, actual: usize },
}

/// Failure of a single display-surface operation
///
/// Every variant degrades to "frame not shown"; none of them leave the
/// surface unusable.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SurfaceError {
    #[error("invalid pixel buffer: {0}")]
    InvalidBuffer(#[from] BufferError),

    #[error("failed to create rendering context: {0}")]
    ContextCreation(String),

    #[error("failed to allocate texture: {0}")]
    TextureAllocation(String),

    #[error("failed to present frame: {0}")]
    Present(String),
}

impl SurfaceError {
    /// Short label for log lines and counters
    pub fn kind(&self) -> &'static str {
        match self {
            SurfaceError::InvalidBuffer(_) => "invalid-buffer",
            SurfaceError::ContextCreation(_) => "context-creation",
            SurfaceError::TextureAllocation(_) => "texture-allocation",
            SurfaceError::Present(_) => "present",
        }
    }
}

pub type Result<T> = std::result::Result<T, SurfaceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_buffer_error_converts_into_invalid_buffer() {
        let err: SurfaceError = BufferError::ZeroDimensions { width: 0, height: 480 }.into();
        assert_eq!(err.kind(), "invalid-buffer");
        assert!(err.to_string().contains("0x480"));
    }

    #[test]
    fn test_unsupported_format_message_names_fourcc() {
        let err = BufferError::UnsupportedFormat(PixelFormat::Other(u32::from_be_bytes(*b"420v")));
        assert!(err.to_string().contains("'420v'"));
    }
}
