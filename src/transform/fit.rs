//! Resize/fit geometry
//!
//! Pure size arithmetic for the three fit modes. The orchestrator turns the
//! resulting [`FitDecision`] into engine calls.

use crate::directive::FitMode;
use crate::plan::TargetBox;

/// What the resize stage has to do for a given source size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitDecision {
    /// Scale to exactly `width`×`height`
    Scale { width: u32, height: u32 },
    /// Cut a `crop_width`×`crop_height` region with the box's aspect ratio out
    /// of the source, then scale it to the box
    Cover {
        crop_width: u32,
        crop_height: u32,
        box_width: u32,
        box_height: u32,
    },
    /// Scale to `width`×`height`, then center on a `box_width`×`box_height`
    /// canvas filled with the background
    Embed {
        width: u32,
        height: u32,
        box_width: u32,
        box_height: u32,
    },
}

impl FitDecision {
    /// Output dimensions after the stage
    pub fn output_size(&self) -> (u32, u32) {
        match *self {
            FitDecision::Scale { width, height } => (width, height),
            FitDecision::Cover {
                box_width,
                box_height,
                ..
            }
            | FitDecision::Embed {
                box_width,
                box_height,
                ..
            } => (box_width, box_height),
        }
    }

    /// Whether the stage would produce an image wider or taller than `max`
    ///
    /// Scaled images never outgrow the output, so the output size bounds
    /// every buffer the stage allocates.
    pub fn exceeds(&self, max: (u32, u32)) -> bool {
        let (width, height) = self.output_size();
        width > max.0 || height > max.1
    }
}

/// Decide the resize stage for a `source` of the given size
///
/// Returns the decision plus whether crop-fit fell back to fill because the
/// source is smaller than the box and upscaling is not permitted.
pub fn decide(
    source: (u32, u32),
    target: TargetBox,
    mode: FitMode,
    may_upscale: bool,
) -> (FitDecision, bool) {
    let (width, height) = contain_size(source, target, may_upscale);
    let contain = FitDecision::Scale { width, height };

    let Some((box_width, box_height)) = target.both() else {
        return (contain, false);
    };

    match mode {
        FitMode::Contain => (contain, false),
        FitMode::Fill => (
            FitDecision::Embed {
                width,
                height,
                box_width,
                box_height,
            },
            false,
        ),
        FitMode::Crop => {
            let (src_w, src_h) = source;
            if !may_upscale && (src_w < box_width || src_h < box_height) {
                return (
                    FitDecision::Embed {
                        width,
                        height,
                        box_width,
                        box_height,
                    },
                    true,
                );
            }
            let (crop_width, crop_height) = cover_region(source, box_width, box_height);
            (
                FitDecision::Cover {
                    crop_width,
                    crop_height,
                    box_width,
                    box_height,
                },
                false,
            )
        }
    }
}

/// Largest size fitting inside the box with the source aspect ratio
///
/// A missing side is unconstrained. Without upscale permission the scale is
/// capped at 1.
pub fn contain_size(source: (u32, u32), target: TargetBox, may_upscale: bool) -> (u32, u32) {
    let (src_w, src_h) = source;
    let scale_w = target.width.map(|w| w as f64 / src_w as f64);
    let scale_h = target.height.map(|h| h as f64 / src_h as f64);

    let mut scale = match (scale_w, scale_h) {
        (Some(a), Some(b)) => a.min(b),
        (Some(s), None) | (None, Some(s)) => s,
        (None, None) => 1.0,
    };
    if !may_upscale {
        scale = scale.min(1.0);
    }

    (scale_side(src_w, scale), scale_side(src_h, scale))
}

/// Source region that, scaled to cover the box, maps exactly onto it
fn cover_region(source: (u32, u32), box_width: u32, box_height: u32) -> (u32, u32) {
    let (src_w, src_h) = source;
    let scale = (box_width as f64 / src_w as f64).max(box_height as f64 / src_h as f64);
    (
        scale_side(box_width, 1.0 / scale).min(src_w),
        scale_side(box_height, 1.0 / scale).min(src_h),
    )
}

fn scale_side(side: u32, scale: f64) -> u32 {
    ((side as f64 * scale).round() as u32).max(1)
}
