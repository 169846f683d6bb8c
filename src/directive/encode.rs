//! Directive segment encoder
//!
//! Builds URLs the decoder accepts. Output is sparse: absent options are
//! omitted and an empty option bundle encodes as `n`.

use super::types::{
    CropRect, FilterKind, FitMode, Gravity, PixelRatio, Resize, Rgb, WatermarkPosition,
    WatermarkSpec,
};
use super::DirectiveSet;
use crate::constants::DEFAULT_WATERMARK_SIZE;

/// Typed option bundle for [`encode`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncodeOptions {
    resize: Option<Resize>,
    crop: Option<CropRect>,
    quality: Option<u8>,
    gravity: Option<Gravity>,
    background: Option<Rgb>,
    pixel_ratio: Option<PixelRatio>,
    watermarks: Vec<WatermarkSpec>,
    filters: Vec<FilterKind>,
    presets: Vec<String>,
}

impl EncodeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resize(mut self, fit: FitMode, width: Option<u32>, height: Option<u32>) -> Self {
        self.resize = Some(Resize::new(fit, width, height));
        self
    }

    pub fn crop(mut self, rect: CropRect) -> Self {
        self.crop = Some(rect);
        self
    }

    pub fn quality(mut self, quality: u8) -> Self {
        self.quality = Some(quality);
        self
    }

    pub fn gravity(mut self, gravity: Gravity) -> Self {
        self.gravity = Some(gravity);
        self
    }

    pub fn background(mut self, background: Rgb) -> Self {
        self.background = Some(background);
        self
    }

    pub fn pixel_ratio(mut self, ratio: PixelRatio) -> Self {
        self.pixel_ratio = Some(ratio);
        self
    }

    pub fn watermark(mut self, spec: WatermarkSpec) -> Self {
        self.watermarks.push(spec);
        self
    }

    pub fn filter(mut self, filter: FilterKind) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn preset(mut self, name: impl Into<String>) -> Self {
        self.presets.push(name.into());
        self
    }

    fn tokens(&self) -> Vec<String> {
        let mut tokens = Vec::new();

        if let Some(resize) = self.resize.filter(Resize::is_sized) {
            tokens.push(format!(
                "r{}{}x{}",
                resize.fit.code(),
                side(resize.width),
                side(resize.height)
            ));
        }
        if let Some(rect) = self.crop {
            tokens.push(format!(
                "c{}x{}x{}x{}",
                rect.x, rect.y, rect.width, rect.height
            ));
        }
        if let Some(quality) = self.quality {
            tokens.push(format!("q{}", quality));
        }
        if let Some(gravity) = self.gravity {
            tokens.push(match gravity {
                Gravity::Center => "gc".to_string(),
                Gravity::Smart => "gs".to_string(),
                Gravity::Focal { x, y } => format!("gf{}x{}", x, y),
            });
        }
        if let Some(background) = self.background {
            tokens.push(format!("b{}", background.to_hex()));
        }
        if let Some(ratio) = self.pixel_ratio {
            tokens.push(format!("p{}", ratio.code()));
        }
        for spec in self.watermarks.iter().filter(|w| !w.asset_path.is_empty()) {
            tokens.push(watermark_token(spec));
        }
        for filter in self.filters.iter().filter(|f| !f.code().is_empty()) {
            tokens.push(format!("f{}", filter.code()));
        }
        for name in self.presets.iter().filter(|p| !p.is_empty()) {
            tokens.push(format!("_{}", name));
        }

        tokens
    }
}

impl From<&DirectiveSet> for EncodeOptions {
    fn from(set: &DirectiveSet) -> Self {
        Self {
            resize: set.resize,
            crop: set.crop,
            quality: set.quality,
            gravity: set.gravity,
            background: set.background,
            pixel_ratio: set.pixel_ratio,
            watermarks: set.watermarks.clone(),
            filters: set.filters.clone(),
            presets: set.presets.clone(),
        }
    }
}

/// Encode `path` and `options` into a `directives/path` segment
pub fn encode(path: &str, options: &EncodeOptions) -> String {
    let tokens = options.tokens();
    let directives = if tokens.is_empty() {
        "n".to_string()
    } else {
        tokens.join(",")
    };

    let path = path
        .trim_start_matches('/')
        .split('/')
        .map(escape_component)
        .collect::<Vec<_>>()
        .join("/");

    format!("{}/{}", directives, path)
}

impl DirectiveSet {
    /// Re-encode this set into the URL form it was (or could have been) decoded from
    pub fn encode(&self) -> String {
        encode(&self.path, &EncodeOptions::from(self))
    }
}

fn side(value: Option<u32>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn watermark_token(spec: &WatermarkSpec) -> String {
    let position = match spec.position {
        WatermarkPosition::Named(named) => named.code().to_string(),
        WatermarkPosition::Offset { x, y } => format!("{}x{}", x, y),
    };
    let path = escape_component(&spec.asset_path);

    if spec.size_percent == DEFAULT_WATERMARK_SIZE {
        format!("w{}-{}", position, path)
    } else {
        format!("w{}-{}-{}", position, spec.size_percent, path)
    }
}

// urlencoding leaves '-' alone; it is the watermark field separator
fn escape_component(raw: &str) -> String {
    urlencoding::encode(raw).replace('-', "%2D")
}
