//! Watermark sizing and placement

use crate::directive::{NamedPosition, PixelRatio, WatermarkPosition};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

/// Top-left corner of a placed watermark; negative when it overhangs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacementPosition {
    pub x: i32,
    pub y: i32,
}

impl PlacementPosition {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Scale factor applied to a watermark asset.
///
/// `size_percent` only ever shrinks; the pixel ratio grows the mark along
/// with the target box.
pub fn watermark_scale(size_percent: u32, pixel_ratio: Option<PixelRatio>) -> f32 {
    let size = if size_percent < 100 {
        size_percent as f32 / 100.0
    } else {
        1.0
    };
    size * pixel_ratio.map_or(1.0, |r| r.factor())
}

/// Watermark dimensions after scaling, never below 1×1
pub fn scaled_dimensions(natural: Dimensions, scale: f32) -> Dimensions {
    let scale_side = |side: u32| ((side as f32 * scale).round() as u32).max(1);
    Dimensions::new(scale_side(natural.width), scale_side(natural.height))
}

/// Compute where the watermark's top-left corner lands on the image
pub fn calculate_position(
    position: WatermarkPosition,
    image: Dimensions,
    watermark: Dimensions,
    pixel_ratio: Option<PixelRatio>,
) -> PlacementPosition {
    let img_w = image.width as i32;
    let img_h = image.height as i32;
    let wm_w = watermark.width as i32;
    let wm_h = watermark.height as i32;

    match position {
        WatermarkPosition::Named(named) => match named {
            NamedPosition::North => PlacementPosition::new(img_w / 2 - wm_w / 2, 0),
            NamedPosition::SouthEast => PlacementPosition::new(img_w - wm_w, img_h - wm_h),
            NamedPosition::SouthWest => PlacementPosition::new(0, img_h - wm_h),
            NamedPosition::NorthWest => PlacementPosition::new(0, 0),
            NamedPosition::Center => {
                PlacementPosition::new((img_w - wm_w) / 2, (img_h - wm_h) / 2)
            }
        },
        WatermarkPosition::Offset { x, y } => {
            let ratio = pixel_ratio.unwrap_or(PixelRatio::One);
            let dx = ratio.scale(x) as i32;
            let dy = ratio.scale(y) as i32;
            PlacementPosition::new(img_w - wm_w - dx, img_h - wm_h - dy)
        }
    }
}
