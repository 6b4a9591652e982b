//! Crop and resample applied after color processing.

use image::imageops::{self, FilterType};
use image::Rgb32FImage;
use tracing::{debug, warn};

use crate::image_pipeline::cine::{Rect, Setup};
use crate::image_pipeline::color::color_image::ColorImage;
use crate::image_pipeline::common::error::{CineError, Result};

/// Crops to `rect`, bounds inclusive, clamped to the image.
///
/// A rectangle that does not overlap the image leaves it unchanged.
pub fn crop(image: &ColorImage, rect: Rect) -> ColorImage {
    let max_col = image.width.saturating_sub(1) as i64;
    let max_row = image.height.saturating_sub(1) as i64;
    let left = (rect.left as i64).clamp(0, max_col) as usize;
    let right = (rect.right as i64).clamp(0, max_col) as usize;
    let top = (rect.top as i64).clamp(0, max_row) as usize;
    let bottom = (rect.bottom as i64).clamp(0, max_row) as usize;

    if image.width == 0 || image.height == 0 || left > right || top > bottom {
        warn!(?rect, width = image.width, height = image.height, "ignoring empty crop rectangle");
        return image.clone();
    }

    let width = right - left + 1;
    let height = bottom - top + 1;
    let mut data = Vec::with_capacity(width * height * 3);
    for row in top..=bottom {
        let start = (row * image.width + left) * 3;
        data.extend_from_slice(&image.data[start..start + width * 3]);
    }
    ColorImage { width, height, data }
}

/// Resizes to exactly `width x height` with a triangle filter.
pub fn resample(image: ColorImage, width: u32, height: u32) -> Result<ColorImage> {
    if width == 0 || height == 0 {
        warn!(width, height, "ignoring empty resample size");
        return Ok(image);
    }
    if (image.width, image.height) == (width as usize, height as usize) {
        return Ok(image);
    }
    let buffer = Rgb32FImage::from_raw(image.width as u32, image.height as u32, image.data)
        .ok_or_else(|| CineError::Format("RGB buffer does not match its dimensions".to_string()))?;
    let resized = imageops::resize(&buffer, width, height, FilterType::Triangle);
    Ok(ColorImage { width: width as usize, height: height as usize, data: resized.into_raw() })
}

/// Applies the crop and resample settings stored in `setup`, in that order.
pub fn apply_setup_geometry(image: ColorImage, setup: &Setup) -> Result<ColorImage> {
    let image = if setup.crop_enabled() {
        let rect = setup.crop_rect();
        debug!(?rect, "cropping");
        crop(&image, rect)
    } else {
        image
    };
    if setup.resample_enabled() {
        let (w, h) = setup.resample_size();
        debug!(width = w, height = h, "resampling");
        return resample(image, w, h);
    }
    Ok(image)
}
