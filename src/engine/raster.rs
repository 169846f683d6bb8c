//! In-process raster engine

use super::blend::{composite_over, flatten_onto};
use super::encoder::{EncodedImage, EncoderFactory, EncoderQuality, OutputFormat};
use super::ImageEngine;
use crate::directive::{CropRect, Rgb};
use crate::error::ResizeError;
use fast_image_resize::{FilterType, Image, PixelType, ResizeAlg, Resizer};
use image::io::Reader as ImageReader;
use image::{DynamicImage, GrayImage, Rgba, RgbaImage};
use std::io::Cursor;
use std::num::NonZeroU32;

/// Sharpen radius, in pixels
const SHARPEN_SIGMA: f32 = 0.5;

/// Upper bound on candidate offsets per axis evaluated by smart crop
const SMART_CROP_STEPS: u32 = 64;

#[derive(Debug, Default, Clone, Copy)]
pub struct RasterEngine;

impl RasterEngine {
    pub fn new() -> Self {
        Self
    }
}

impl ImageEngine for RasterEngine {
    fn decode(&self, data: &[u8]) -> Result<DynamicImage, ResizeError> {
        ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(|e| ResizeError::engine("decode", e.to_string()))?
            .decode()
            .map_err(|e| ResizeError::engine("decode", e.to_string()))
    }

    fn crop(&self, image: &DynamicImage, rect: CropRect) -> Result<DynamicImage, ResizeError> {
        let inside = rect.x.checked_add(rect.width).map_or(false, |r| r <= image.width())
            && rect.y.checked_add(rect.height).map_or(false, |b| b <= image.height());
        if rect.is_empty() || !inside {
            return Err(ResizeError::engine(
                "crop",
                format!(
                    "rectangle {}x{}+{}+{} does not fit a {}x{} image",
                    rect.width,
                    rect.height,
                    rect.x,
                    rect.y,
                    image.width(),
                    image.height()
                ),
            ));
        }
        Ok(image.crop_imm(rect.x, rect.y, rect.width, rect.height))
    }

    fn scale(
        &self,
        image: &DynamicImage,
        width: u32,
        height: u32,
    ) -> Result<DynamicImage, ResizeError> {
        if width == image.width() && height == image.height() {
            return Ok(image.clone());
        }

        let resize_err = |message: String| ResizeError::engine("scale", message);
        let src_width =
            NonZeroU32::new(image.width()).ok_or_else(|| resize_err("source width is 0".into()))?;
        let src_height = NonZeroU32::new(image.height())
            .ok_or_else(|| resize_err("source height is 0".into()))?;
        let dst_width =
            NonZeroU32::new(width).ok_or_else(|| resize_err("target width is 0".into()))?;
        let dst_height =
            NonZeroU32::new(height).ok_or_else(|| resize_err("target height is 0".into()))?;

        let src_image = Image::from_vec_u8(
            src_width,
            src_height,
            image.to_rgba8().into_raw(),
            PixelType::U8x4,
        )
        .map_err(|e| resize_err(format!("failed to create source image: {:?}", e)))?;

        let mut dst_image = Image::new(dst_width, dst_height, PixelType::U8x4);
        let mut resizer = Resizer::new(ResizeAlg::Convolution(FilterType::Lanczos3));
        resizer
            .resize(&src_image.view(), &mut dst_image.view_mut())
            .map_err(|e| resize_err(format!("resize operation failed: {:?}", e)))?;

        let rgba = RgbaImage::from_raw(width, height, dst_image.into_vec())
            .ok_or_else(|| resize_err("failed to create output image buffer".into()))?;
        Ok(DynamicImage::ImageRgba8(rgba))
    }

    fn smart_crop(
        &self,
        image: &DynamicImage,
        width: u32,
        height: u32,
    ) -> Result<DynamicImage, ResizeError> {
        let width = width.min(image.width());
        let height = height.min(image.height());
        let (x, y) = most_detailed_window(&image.to_luma8(), width, height);
        self.crop(image, CropRect::new(x, y, width, height))
    }

    fn embed(
        &self,
        image: &DynamicImage,
        width: u32,
        height: u32,
        background: Rgb,
    ) -> Result<DynamicImage, ResizeError> {
        if width == 0 || height == 0 {
            return Err(ResizeError::engine("embed", "canvas has a zero side"));
        }
        let mut canvas =
            RgbaImage::from_pixel(width, height, Rgba([background.r, background.g, background.b, 255]));
        let x = (width as i32 - image.width() as i32) / 2;
        let y = (height as i32 - image.height() as i32) / 2;
        composite_over(&mut canvas, &image.to_rgba8(), x, y);
        Ok(DynamicImage::ImageRgba8(canvas))
    }

    fn flatten(&self, image: &DynamicImage, background: Rgb) -> DynamicImage {
        if !image.color().has_alpha() {
            return image.clone();
        }
        let mut rgba = image.to_rgba8();
        flatten_onto(&mut rgba, background);
        DynamicImage::ImageRgba8(rgba)
    }

    fn composite(
        &self,
        base: &DynamicImage,
        overlay: &DynamicImage,
        x: i32,
        y: i32,
    ) -> DynamicImage {
        let mut canvas = base.to_rgba8();
        composite_over(&mut canvas, &overlay.to_rgba8(), x, y);
        DynamicImage::ImageRgba8(canvas)
    }

    fn sharpen(&self, image: &DynamicImage) -> DynamicImage {
        image.unsharpen(SHARPEN_SIGMA, 0)
    }

    fn encode(
        &self,
        image: &DynamicImage,
        format: OutputFormat,
        quality: u8,
    ) -> Result<EncodedImage, ResizeError> {
        let rgba = image.to_rgba8();
        EncoderFactory::create(format).encode(
            rgba.as_raw(),
            rgba.width(),
            rgba.height(),
            EncoderQuality::with_quality(quality),
        )
    }
}

/// Top-left corner of the `width`×`height` window with the highest edge
/// energy. Ties go to the window closest to the center.
fn most_detailed_window(gray: &GrayImage, width: u32, height: u32) -> (u32, u32) {
    let (img_w, img_h) = gray.dimensions();
    let slack_x = img_w.saturating_sub(width);
    let slack_y = img_h.saturating_sub(height);
    if slack_x == 0 && slack_y == 0 {
        return (0, 0);
    }

    let integral = energy_integral(gray);
    let stride = img_w as usize + 1;
    let window_energy = |x: u32, y: u32| -> u64 {
        let (x0, y0) = (x as usize, y as usize);
        let (x1, y1) = (x0 + width as usize, y0 + height as usize);
        integral[y1 * stride + x1] + integral[y0 * stride + x0]
            - integral[y0 * stride + x1]
            - integral[y1 * stride + x0]
    };

    let step_x = (slack_x / SMART_CROP_STEPS).max(1);
    let step_y = (slack_y / SMART_CROP_STEPS).max(1);
    let center = (slack_x as i64 / 2, slack_y as i64 / 2);

    let mut best = (center.0 as u32, center.1 as u32);
    let mut best_score = (window_energy(best.0, best.1), 0i64);
    let candidates_y = (0..=slack_y).step_by(step_y as usize);
    for y in candidates_y {
        for x in (0..=slack_x).step_by(step_x as usize) {
            let distance = (x as i64 - center.0).abs() + (y as i64 - center.1).abs();
            let score = (window_energy(x, y), -distance);
            if score > best_score {
                best_score = score;
                best = (x, y);
            }
        }
    }
    best
}

/// Summed-area table of |dx| + |dy| luminance gradients, (w+1)×(h+1)
fn energy_integral(gray: &GrayImage) -> Vec<u64> {
    let (w, h) = gray.dimensions();
    let stride = w as usize + 1;
    let mut integral = vec![0u64; stride * (h as usize + 1)];

    for y in 0..h {
        let mut row_sum = 0u64;
        for x in 0..w {
            let value = gray.get_pixel(x, y)[0] as i32;
            let right = if x + 1 < w { gray.get_pixel(x + 1, y)[0] as i32 } else { value };
            let below = if y + 1 < h { gray.get_pixel(x, y + 1)[0] as i32 } else { value };
            row_sum += ((right - value).abs() + (below - value).abs()) as u64;

            let idx = (y as usize + 1) * stride + x as usize + 1;
            integral[idx] = integral[idx - stride] + row_sum;
        }
    }
    integral
}
