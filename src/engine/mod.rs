//! Image engine
//!
//! The orchestrator drives every pixel operation through [`ImageEngine`].
//! [`RasterEngine`] is the in-process implementation built on the `image`,
//! `fast_image_resize` and `webp` crates.

pub mod blend;
pub mod encoder;
mod raster;

pub use encoder::{EncodedImage, EncoderFactory, EncoderQuality, ImageEncoder, OutputFormat};
pub use raster::RasterEngine;

use crate::directive::{CropRect, Rgb};
use crate::error::ResizeError;
use image::DynamicImage;

/// Pixel operations needed to execute a transform plan
///
/// All methods are CPU-bound and synchronous; callers run them on a
/// blocking thread.
pub trait ImageEngine: Send + Sync {
    fn decode(&self, data: &[u8]) -> Result<DynamicImage, ResizeError>;

    /// Cut out `rect`, which must lie inside the image and be non-empty
    fn crop(&self, image: &DynamicImage, rect: CropRect) -> Result<DynamicImage, ResizeError>;

    /// Resample to exactly `width`×`height`
    fn scale(&self, image: &DynamicImage, width: u32, height: u32)
        -> Result<DynamicImage, ResizeError>;

    /// Crop to `width`×`height`, keeping the most detailed region
    fn smart_crop(
        &self,
        image: &DynamicImage,
        width: u32,
        height: u32,
    ) -> Result<DynamicImage, ResizeError>;

    /// Center `image` on a `width`×`height` canvas filled with `background`
    fn embed(
        &self,
        image: &DynamicImage,
        width: u32,
        height: u32,
        background: Rgb,
    ) -> Result<DynamicImage, ResizeError>;

    /// Replace transparency with `background`
    fn flatten(&self, image: &DynamicImage, background: Rgb) -> DynamicImage;

    /// Draw `overlay` over `base` with its top-left corner at (`x`, `y`)
    fn composite(&self, base: &DynamicImage, overlay: &DynamicImage, x: i32, y: i32)
        -> DynamicImage;

    fn sharpen(&self, image: &DynamicImage) -> DynamicImage;

    fn encode(
        &self,
        image: &DynamicImage,
        format: OutputFormat,
        quality: u8,
    ) -> Result<EncodedImage, ResizeError>;
}
