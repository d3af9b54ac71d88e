//! Synthetic camera feeding the viewer when no capture pipeline is attached.
use std::time::Instant;

use crate::core::{PixelBuffer, PixelFormat};

/// Resolutions the demo cycles through
pub const RESOLUTIONS: [(u32, u32); 3] = [(640, 480), (1280, 720), (1920, 1080)];

/// Formats the demo cycles through
pub const FORMATS: [PixelFormat; 3] = [PixelFormat::Bgra8, PixelFormat::Rgba8, PixelFormat::Gray8];

/// Largest frame edge the synthetic camera produces
pub const MAX_FRAME_DIMENSION: u32 = 8192;

/// Slowest rate the pacer accepts
pub const MIN_FPS: f32 = 1.0;

/// Rows are padded to this many bytes, like capture hardware does
const ROW_ALIGNMENT: usize = 64;

const BAR_COLORS: [[u8; 3]; 8] = [
    [235, 235, 235],
    [235, 235, 16],
    [16, 235, 235],
    [16, 235, 16],
    [235, 16, 235],
    [235, 16, 16],
    [16, 16, 235],
    [16, 16, 16],
];

/// Owned frame as produced by a capture pipeline
#[derive(Debug, Clone)]
pub struct CapturedFrame {
    pub number: u64,
    pub width: u32,
    pub height: u32,
    pub bytes_per_row: u32,
    pub format: PixelFormat,
    pub data: Vec<u8>,
}

impl CapturedFrame {
    /// Borrow the frame for a single display call
    pub fn as_pixel_buffer(&self) -> PixelBuffer<'_> {
        PixelBuffer::with_stride(self.width, self.height, self.bytes_per_row, self.format, &self.data)
    }
}

/// Fires at a fixed rate, accumulating elapsed time between polls
#[derive(Debug, Clone, Copy)]
pub struct FramePacer {
    interval: f32,
    accumulator: f32,
    last_tick: Instant,
}

impl FramePacer {
    /// Rates below [`MIN_FPS`] are rejected when the CLI is resolved
    pub fn new(hz: f32) -> Self {
        Self {
            interval: 1.0 / hz.max(MIN_FPS),
            accumulator: 0.0,
            last_tick: Instant::now(),
        }
    }

    /// Add wall-clock time since the last poll; true if a frame is due
    pub fn poll(&mut self) -> bool {
        let now = Instant::now();
        let delta = now.duration_since(self.last_tick).as_secs_f32();
        self.last_tick = now;
        self.advance(delta)
    }

    /// Add `delta` seconds; true if a frame is due
    pub fn advance(&mut self, delta: f32) -> bool {
        self.accumulator += delta;
        if self.accumulator >= self.interval {
            // Never queue up more than one late frame
            self.accumulator = (self.accumulator - self.interval).min(self.interval);
            true
        } else {
            false
        }
    }
}

/// SMPTE-style color bars with a sweeping marker so motion is visible
#[derive(Debug, Clone)]
pub struct TestPatternSource {
    width: u32,
    height: u32,
    format: PixelFormat,
    frame_number: u64,
}

impl TestPatternSource {
    /// Dimensions are clamped to `1..=MAX_FRAME_DIMENSION`
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Self {
        Self {
            width: width.clamp(1, MAX_FRAME_DIMENSION),
            height: height.clamp(1, MAX_FRAME_DIMENSION),
            format,
            frame_number: 0,
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    pub fn set_resolution(&mut self, width: u32, height: u32) {
        self.width = width.clamp(1, MAX_FRAME_DIMENSION);
        self.height = height.clamp(1, MAX_FRAME_DIMENSION);
    }

    /// Switch to the resolution after the current one in [`RESOLUTIONS`]
    pub fn cycle_resolution(&mut self) -> (u32, u32) {
        let current = RESOLUTIONS
            .iter()
            .position(|&r| r == (self.width, self.height));
        let next = current.map_or(0, |i| (i + 1) % RESOLUTIONS.len());
        let (width, height) = RESOLUTIONS[next];
        self.set_resolution(width, height);
        (width, height)
    }

    pub fn cycle_format(&mut self) -> PixelFormat {
        let current = FORMATS.iter().position(|&f| f == self.format);
        let next = current.map_or(0, |i| (i + 1) % FORMATS.len());
        self.format = FORMATS[next];
        self.format
    }

    pub fn next_frame(&mut self) -> CapturedFrame {
        let bpp = self.format.bytes_per_pixel().unwrap_or(4) as usize;
        let width = self.width as usize;
        let height = self.height as usize;
        let row_bytes = width * bpp;
        let bytes_per_row = row_bytes.div_ceil(ROW_ALIGNMENT) * ROW_ALIGNMENT;
        let mut data = vec![0u8; bytes_per_row * height];

        let bar_width = (width / BAR_COLORS.len()).max(1);
        let marker_x = (self.frame_number * 4 % self.width as u64) as usize;

        for row in data.chunks_exact_mut(bytes_per_row) {
            for (x, pixel) in row[..row_bytes].chunks_exact_mut(bpp).enumerate() {
                let bar = (x / bar_width).min(BAR_COLORS.len() - 1);
                let rgb = if x.abs_diff(marker_x) < 4 {
                    [255, 255, 255]
                } else {
                    BAR_COLORS[bar]
                };
                write_pixel(pixel, self.format, rgb);
            }
        }

        let frame = CapturedFrame {
            number: self.frame_number,
            width: self.width,
            height: self.height,
            // At most MAX_FRAME_DIMENSION * 4 rounded up to ROW_ALIGNMENT
            bytes_per_row: bytes_per_row as u32,
            format: self.format,
            data,
        };
        self.frame_number += 1;
        frame
    }
}

fn write_pixel(pixel: &mut [u8], format: PixelFormat, [r, g, b]: [u8; 3]) {
    match format {
        PixelFormat::Bgra8 => pixel.copy_from_slice(&[b, g, r, 255]),
        PixelFormat::Rgba8 => pixel.copy_from_slice(&[r, g, b, 255]),
        PixelFormat::Gray8 => {
            // BT.601 luma
            let luma = (299 * r as u32 + 587 * g as u32 + 114 * b as u32) / 1000;
            pixel[0] = luma as u8;
        }
        PixelFormat::Other(_) => {}
    }
}
