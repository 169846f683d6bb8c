//! Pixel blending
//!
//! Porter-Duff "over" compositing on straight (non-premultiplied) RGBA8.

use crate::directive::Rgb;
use image::{Rgba, RgbaImage};

/// Composite `overlay` onto `base` with its top-left corner at (`x`, `y`).
///
/// Parts of the overlay outside the base are clipped. Positions may be
/// negative when the overlay is larger than the base.
pub fn composite_over(base: &mut RgbaImage, overlay: &RgbaImage, x: i32, y: i32) {
    let base_width = base.width() as i32;
    let base_height = base.height() as i32;

    // Visible region, clamped to base bounds
    let x_start = x.max(0);
    let y_start = y.max(0);
    let x_end = (x + overlay.width() as i32).min(base_width);
    let y_end = (y + overlay.height() as i32).min(base_height);

    for ty in y_start..y_end {
        for tx in x_start..x_end {
            let src = *overlay.get_pixel((tx - x) as u32, (ty - y) as u32);
            let dst = *base.get_pixel(tx as u32, ty as u32);
            base.put_pixel(tx as u32, ty as u32, blend_pixels(dst, src));
        }
    }
}

/// Replace transparency with `background`, leaving a fully opaque image
pub fn flatten_onto(image: &mut RgbaImage, background: Rgb) {
    let backdrop = Rgba([background.r, background.g, background.b, 255]);
    for pixel in image.pixels_mut() {
        if pixel[3] != 255 {
            *pixel = blend_pixels(backdrop, *pixel);
        }
    }
}

/// "over": result = foreground + background * (1 - foreground.alpha)
pub fn blend_pixels(background: Rgba<u8>, foreground: Rgba<u8>) -> Rgba<u8> {
    let fg_alpha = foreground[3] as f32 / 255.0;
    let bg_alpha = background[3] as f32 / 255.0;

    let out_alpha = fg_alpha + bg_alpha * (1.0 - fg_alpha);

    if out_alpha < 0.001 {
        return Rgba([0, 0, 0, 0]);
    }

    let blend_channel = |fg: u8, bg: u8| -> u8 {
        let fg_f = fg as f32 / 255.0;
        let bg_f = bg as f32 / 255.0;
        let result = (fg_f * fg_alpha + bg_f * bg_alpha * (1.0 - fg_alpha)) / out_alpha;
        (result * 255.0).round().clamp(0.0, 255.0) as u8
    };

    Rgba([
        blend_channel(foreground[0], background[0]),
        blend_channel(foreground[1], background[1]),
        blend_channel(foreground[2], background[2]),
        (out_alpha * 255.0).round() as u8,
    ])
}
