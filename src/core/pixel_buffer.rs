use std::fmt;
use std::str::FromStr;

use super::error::BufferError;

/// Pixel layout of a captured frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// 32-bit BGRA, the native output of most capture pipelines
    Bgra8,
    /// 32-bit RGBA
    Rgba8,
    /// 8-bit luma
    Gray8,
    /// Anything else, identified by its FourCC code
    Other(u32),
}

impl PixelFormat {
    /// Bytes per pixel, or None for formats the surface cannot draw
    pub fn bytes_per_pixel(&self) -> Option<u32> {
        match self {
            PixelFormat::Bgra8 | PixelFormat::Rgba8 => Some(4),
            PixelFormat::Gray8 => Some(1),
            PixelFormat::Other(_) => None,
        }
    }

    pub fn is_supported(&self) -> bool {
        self.bytes_per_pixel().is_some()
    }

    /// Build from a big-endian FourCC such as `b"BGRA"`
    pub fn from_fourcc(code: [u8; 4]) -> Self {
        match &code {
            b"BGRA" => PixelFormat::Bgra8,
            b"RGBA" => PixelFormat::Rgba8,
            b"L008" => PixelFormat::Gray8,
            _ => PixelFormat::Other(u32::from_be_bytes(code)),
        }
    }

    pub fn fourcc(&self) -> [u8; 4] {
        match self {
            PixelFormat::Bgra8 => *b"BGRA",
            PixelFormat::Rgba8 => *b"RGBA",
            PixelFormat::Gray8 => *b"L008",
            PixelFormat::Other(code) => code.to_be_bytes(),
        }
    }
}

impl fmt::Display for PixelFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PixelFormat::Bgra8 => write!(f, "bgra8"),
            PixelFormat::Rgba8 => write!(f, "rgba8"),
            PixelFormat::Gray8 => write!(f, "gray8"),
            PixelFormat::Other(code) => {
                let bytes = code.to_be_bytes();
                if bytes.iter().all(|b| b.is_ascii_graphic() || *b == b' ') {
                    write!(f, "'{}'", String::from_utf8_lossy(&bytes))
                } else {
                    write!(f, "{:#010x}", code)
                }
            }
        }
    }
}

impl FromStr for PixelFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bgra8" | "bgra" => Ok(PixelFormat::Bgra8),
            "rgba8" | "rgba" => Ok(PixelFormat::Rgba8),
            "gray8" | "gray" | "luma" => Ok(PixelFormat::Gray8),
            other => match <[u8; 4]>::try_from(other.as_bytes()) {
                Ok(code) => Ok(PixelFormat::from_fourcc(code)),
                Err(_) => Err(format!("unknown pixel format '{}'", s)),
            },
        }
    }
}

/// Identity of a cached texture: frames sharing a key share a texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureKey {
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
}

/// Borrowed view of a decoded frame
///
/// The surface reads from it only for the duration of one display call,
/// so the backing memory stays with whoever produced it.
#[derive(Debug, Clone, Copy)]
pub struct PixelBuffer<'a> {
    width: u32,
    height: u32,
    bytes_per_row: u32,
    format: PixelFormat,
    data: &'a [u8],
}

impl<'a> PixelBuffer<'a> {
    /// Tightly packed buffer (no row padding)
    pub fn new(width: u32, height: u32, format: PixelFormat, data: &'a [u8]) -> Self {
        let bytes_per_row = width.saturating_mul(format.bytes_per_pixel().unwrap_or(0));
        Self::with_stride(width, height, bytes_per_row, format, data)
    }

    /// Buffer whose rows are `bytes_per_row` apart, as capture hardware
    /// often pads rows for alignment
    pub fn with_stride(
        width: u32,
        height: u32,
        bytes_per_row: u32,
        format: PixelFormat,
        data: &'a [u8],
    ) -> Self {
        Self {
            width,
            height,
            bytes_per_row,
            format,
            data,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn bytes_per_row(&self) -> u32 {
        self.bytes_per_row
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    pub fn key(&self) -> TextureKey {
        TextureKey {
            width: self.width,
            height: self.height,
            format: self.format,
        }
    }

    /// Width over height; only meaningful for validated buffers
    pub fn aspect_ratio(&self) -> f32 {
        self.width as f32 / self.height.max(1) as f32
    }

    /// Check that the buffer can be uploaded as-is
    pub fn validate(&self) -> Result<(), BufferError> {
        if self.width == 0 || self.height == 0 {
            return Err(BufferError::ZeroDimensions {
                width: self.width,
                height: self.height,
            });
        }

        let bpp = self
            .format
            .bytes_per_pixel()
            .ok_or(BufferError::UnsupportedFormat(self.format))?;

        let min = self.width.saturating_mul(bpp);
        if self.bytes_per_row < min {
            return Err(BufferError::RowStride {
                bytes_per_row: self.bytes_per_row,
                min,
            });
        }

        // Last row only needs its visible pixels
        let expected = self.bytes_per_row as usize * (self.height as usize - 1) + min as usize;
        if self.data.len() < expected {
            return Err(BufferError::Truncated {
                expected,
                actual: self.data.len(),
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tight_stride_from_format() {
        let data = vec![0u8; 4 * 4 * 2];
        let buffer = PixelBuffer::new(4, 2, PixelFormat::Bgra8, &data);
        assert_eq!(buffer.bytes_per_row(), 16);
        assert!(buffer.validate().is_ok());
    }

    #[test]
    fn test_gray_stride() {
        let data = vec![0u8; 10 * 3];
        let buffer = PixelBuffer::new(10, 3, PixelFormat::Gray8, &data);
        assert_eq!(buffer.bytes_per_row(), 10);
        assert!(buffer.validate().is_ok());
    }

    #[test]
    fn test_padded_last_row_may_be_short() {
        // 3 rows of 64 bytes, but the last row only needs 40
        let data = vec![0u8; 64 * 2 + 40];
        let buffer = PixelBuffer::with_stride(10, 3, 64, PixelFormat::Rgba8, &data);
        assert!(buffer.validate().is_ok());
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        let buffer = PixelBuffer::new(0, 480, PixelFormat::Bgra8, &[]);
        assert_eq!(
            buffer.validate(),
            Err(BufferError::ZeroDimensions { width: 0, height: 480 })
        );
    }

    #[test]
    fn test_unsupported_format_rejected() {
        let format = PixelFormat::from_fourcc(*b"420v");
        let data = vec![0u8; 64];
        let buffer = PixelBuffer::with_stride(4, 4, 4, format, &data);
        assert_eq!(buffer.validate(), Err(BufferError::UnsupportedFormat(format)));
    }

    #[test]
    fn test_short_stride_rejected() {
        let data = vec![0u8; 1024];
        let buffer = PixelBuffer::with_stride(8, 8, 16, PixelFormat::Bgra8, &data);
        assert_eq!(
            buffer.validate(),
            Err(BufferError::RowStride { bytes_per_row: 16, min: 32 })
        );
    }

    #[test]
    fn test_truncated_data_rejected() {
        let data = vec![0u8; 100];
        let buffer = PixelBuffer::new(8, 8, PixelFormat::Bgra8, &data);
        assert_eq!(
            buffer.validate(),
            Err(BufferError::Truncated { expected: 256, actual: 100 })
        );
    }

    #[test]
    fn test_key_matches_geometry() {
        let data = vec![0u8; 640 * 480 * 4];
        let key = PixelBuffer::new(640, 480, PixelFormat::Bgra8, &data).key();
        assert_eq!(
            key,
            TextureKey { width: 640, height: 480, format: PixelFormat::Bgra8 }
        );
    }

    #[test]
    fn test_fourcc_round_trip_for_known_formats() {
        for format in [PixelFormat::Bgra8, PixelFormat::Rgba8, PixelFormat::Gray8] {
            assert_eq!(PixelFormat::from_fourcc(format.fourcc()), format);
        }
    }

    #[test]
    fn test_parse_format_names() {
        assert_eq!("BGRA8".parse::<PixelFormat>(), Ok(PixelFormat::Bgra8));
        assert_eq!("luma".parse::<PixelFormat>(), Ok(PixelFormat::Gray8));
        assert_eq!(
            "420v".parse::<PixelFormat>(),
            Ok(PixelFormat::Other(u32::from_be_bytes(*b"420v")))
        );
        assert!("nonsense".parse::<PixelFormat>().is_err());
    }
}
