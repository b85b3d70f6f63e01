use image::imageops::{self, FilterType};
use image::{Rgba, RgbaImage};

use crate::backend::RgbaFrame;
use crate::error::{AppError, AppResult};

/// Largest bitmap area handed out, in pixels (a 16384 x 16384 canvas).
pub const MAX_SURFACE_PIXELS: u64 = 16_384 * 16_384;

const SMOOTHING_FILTER: FilterType = FilterType::Lanczos3;

#[derive(Debug, Clone)]
pub struct RasterSurface {
    image: RgbaImage,
    smoothing: bool,
}

impl RasterSurface {
    pub fn allocate(width: u32, height: u32) -> AppResult<Self> {
        let fits = u64::from(width)
            .checked_mul(u64::from(height))
            .filter(|pixels| *pixels <= MAX_SURFACE_PIXELS)
            .and_then(|pixels| pixels.checked_mul(4))
            .is_some_and(|bytes| usize::try_from(bytes).is_ok());
        if !fits {
            return Err(AppError::surface(format!(
                "page is too large to render ({width}x{height} pixels, limit {MAX_SURFACE_PIXELS})"
            )));
        }

        Ok(Self {
            image: RgbaImage::from_pixel(width, height, Rgba([255, 255, 255, 255])),
            smoothing: false,
        })
    }

    pub fn enable_smoothing(&mut self) {
        self.smoothing = true;
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Paints a rendered frame at the origin. Frames within a pixel of the
    /// surface size are copied as-is; anything else is resampled to fit.
    pub fn paint(&mut self, frame: &RgbaFrame) -> AppResult<()> {
        let source = RgbaImage::from_raw(frame.width, frame.height, frame.pixels_to_vec())
            .ok_or_else(|| {
                AppError::surface(format!(
                    "frame buffer of {} bytes does not match {}x{} RGBA",
                    frame.byte_len(),
                    frame.width,
                    frame.height
                ))
            })?;

        if frame.width.abs_diff(self.width()) <= 1 && frame.height.abs_diff(self.height()) <= 1 {
            imageops::replace(&mut self.image, &source, 0, 0);
            return Ok(());
        }

        let filter = if self.smoothing {
            SMOOTHING_FILTER
        } else {
            FilterType::Nearest
        };
        let resized = imageops::resize(&source, self.width(), self.height(), filter);
        imageops::replace(&mut self.image, &resized, 0, 0);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{MAX_SURFACE_PIXELS, RasterSurface};
    use crate::error::AppError;
    use crate::backend::RgbaFrame;

    fn solid_frame(width: u32, height: u32, rgba: [u8; 4]) -> RgbaFrame {
        RgbaFrame {
            width,
            height,
            pixels: Arc::from(rgba.repeat(width as usize * height as usize)),
        }
    }

    #[test]
    fn allocate_starts_white() {
        let surface = RasterSurface::allocate(3, 2).expect("allocate");
        assert_eq!((surface.width(), surface.height()), (3, 2));
        assert!(surface.image().pixels().all(|px| px.0 == [255, 255, 255, 255]));
    }

    #[test]
    fn paint_crops_frames_one_pixel_larger() {
        let mut surface = RasterSurface::allocate(10, 10).expect("allocate");
        surface
            .paint(&solid_frame(11, 11, [10, 20, 30, 255]))
            .expect("paint");

        assert_eq!((surface.width(), surface.height()), (10, 10));
        assert_eq!(surface.image().get_pixel(9, 9).0, [10, 20, 30, 255]);
    }

    #[test]
    fn paint_resamples_mismatched_frames() {
        let mut surface = RasterSurface::allocate(40, 20).expect("allocate");
        surface.enable_smoothing();
        surface
            .paint(&solid_frame(10, 5, [0, 0, 0, 255]))
            .expect("paint");

        assert_eq!(surface.image().get_pixel(39, 19).0, [0, 0, 0, 255]);
    }

    #[test]
    fn paint_rejects_truncated_frames() {
        let mut surface = RasterSurface::allocate(4, 4).expect("allocate");
        let frame = RgbaFrame {
            width: 4,
            height: 4,
            pixels: Arc::from(vec![0_u8; 8]),
        };
        assert!(surface.paint(&frame).is_err());
    }

    #[test]
    fn allocate_refuses_oversized_areas() {
        for (width, height) in [(u32::MAX, u32::MAX), (u32::MAX, 1), (16_385, 16_384)] {
            let err = RasterSurface::allocate(width, height).expect_err("oversized surface");
            assert!(matches!(err, AppError::Surface(message) if message.starts_with("page is too large")));
        }

        let side = (MAX_SURFACE_PIXELS as f64).sqrt() as u32;
        assert!(RasterSurface::allocate(side, 1).is_ok());
    }
}
