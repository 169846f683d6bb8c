//! Directive URL codec
//!
//! A request URL carries a compact directive list and a source path in one
//! segment: `<directives>/<path>`, e.g. `rc300x200,q85,wse-50-logo.png/photos/cat.jpg`.
//!
//! | Tag | Form | Meaning |
//! |-----|------|---------|
//! | `r` | `r[f\|c]<W>x<H>`, `r<W>` | resize (Contain / Fill / Crop) |
//! | `c` | `c<X>x<Y>x<W>x<H>` | crop source rectangle |
//! | `q` | `q<5..99>` | quality |
//! | `g` | `gs`, `gc`, `gf<X>x<Y>` | gravity for crop-fit |
//! | `b` | `b<RRGGBB>` | background color |
//! | `w` | `w[<pos>-[<size>-]]<path>` | watermark |
//! | `f` | `f<code>` | filter (`s` = sharpen) |
//! | `p` | `p<1\|1.5\|2\|3>` | pixel ratio |
//! | `_` | `_<name>` | preset reference |
//! | `n` | `n` | no-op |

mod decode;
mod encode;
pub mod types;

pub use encode::{encode, EncodeOptions};
pub use types::{
    CropRect, FilterKind, FitMode, Gravity, NamedPosition, PixelRatio, Resize, Rgb,
    WatermarkPosition, WatermarkSpec,
};

/// Decoded directive bundle for one request
///
/// Produced by [`DirectiveSet::decode`] and never mutated afterwards.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectiveSet {
    /// Source path, percent-decoded, without leading slash
    pub path: String,
    pub resize: Option<Resize>,
    pub crop: Option<CropRect>,
    pub quality: Option<u8>,
    pub gravity: Option<Gravity>,
    pub background: Option<Rgb>,
    pub watermarks: Vec<WatermarkSpec>,
    pub filters: Vec<FilterKind>,
    pub pixel_ratio: Option<PixelRatio>,
    /// Preset names, in reference order
    pub presets: Vec<String>,
}

impl DirectiveSet {
    /// True when the only directives present are preset references (or none)
    pub fn is_preset_only(&self) -> bool {
        self.resize.is_none()
            && self.crop.is_none()
            && self.quality.is_none()
            && self.gravity.is_none()
            && self.background.is_none()
            && self.watermarks.is_empty()
            && self.filters.is_empty()
            && self.pixel_ratio.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_preset_only() {
        assert!(DirectiveSet::decode("_thumb,_brand/a.jpg").unwrap().is_preset_only());
        assert!(DirectiveSet::decode("n/a.jpg").unwrap().is_preset_only());
        assert!(!DirectiveSet::decode("_thumb,q80/a.jpg").unwrap().is_preset_only());
        assert!(!DirectiveSet::decode("fs/a.jpg").unwrap().is_preset_only());
    }
}
