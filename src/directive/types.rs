//! Directive value types
//!
//! Typed forms of the individual directives carried in a URL segment.
//! Each type knows its own wire code so the decoder and encoder agree on
//! a single spelling.

use crate::error::ResizeError;

/// How to reconcile the source aspect ratio with the requested box
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FitMode {
    /// Fit inside the box, preserving aspect ratio (no crop, no padding)
    #[default]
    Contain,
    /// Contain, then pad to exactly the box with the background color
    Fill,
    /// Scale to cover the box, then crop to it
    Crop,
}

impl FitMode {
    /// Sub-flag written right after the `r` tag
    pub fn code(&self) -> &'static str {
        match self {
            FitMode::Contain => "",
            FitMode::Fill => "f",
            FitMode::Crop => "c",
        }
    }
}

/// Region selection for crop-fit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Gravity {
    #[default]
    Center,
    /// Engine-selected salient region
    Smart,
    /// Explicit focal point; accepted and round-tripped, applied as Center
    Focal { x: u32, y: u32 },
}

/// Resize request: fit mode plus at least one target side
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resize {
    pub fit: FitMode,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl Resize {
    pub fn new(fit: FitMode, width: Option<u32>, height: Option<u32>) -> Self {
        Self { fit, width, height }
    }

    /// Whether the directive names at least one side
    pub fn is_sized(&self) -> bool {
        self.width.is_some() || self.height.is_some()
    }
}

/// Source rectangle for the explicit crop directive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl CropRect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Shrink width/height so the rectangle stays inside `source_width`×`source_height`.
    ///
    /// The origin is never moved. An origin outside the source yields a
    /// zero-sized rectangle, which the caller must treat as an error.
    pub fn clamp_to(&self, source_width: u32, source_height: u32) -> CropRect {
        let width = self.width.min(source_width.saturating_sub(self.x));
        let height = self.height.min(source_height.saturating_sub(self.y));
        CropRect::new(self.x, self.y, width, height)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Background color used for padding and alpha flattening
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const WHITE: Rgb = Rgb {
        r: 255,
        g: 255,
        b: 255,
    };

    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse exactly six hex digits (`RRGGBB`, either case)
    pub fn from_hex(hex: &str) -> Result<Self, ResizeError> {
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ResizeError::grammar(format!(
                "background must be 6 hex digits, got '{}'",
                hex
            )));
        }

        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16)
                .map_err(|_| ResizeError::grammar(format!("invalid background '{}'", hex)))
        };

        Ok(Rgb::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }

    pub fn to_hex(&self) -> String {
        format!("{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl Default for Rgb {
    fn default() -> Self {
        Rgb::WHITE
    }
}

/// Anchors supported by the watermark directive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamedPosition {
    North,
    SouthEast,
    SouthWest,
    NorthWest,
    Center,
}

impl NamedPosition {
    pub fn code(&self) -> &'static str {
        match self {
            NamedPosition::North => "n",
            NamedPosition::SouthEast => "se",
            NamedPosition::SouthWest => "sw",
            NamedPosition::NorthWest => "nw",
            NamedPosition::Center => "c",
        }
    }

    pub fn from_code(code: &str) -> Result<Self, ResizeError> {
        match code {
            "n" => Ok(NamedPosition::North),
            "se" => Ok(NamedPosition::SouthEast),
            "sw" => Ok(NamedPosition::SouthWest),
            "nw" => Ok(NamedPosition::NorthWest),
            "c" => Ok(NamedPosition::Center),
            _ => Err(ResizeError::grammar(format!(
                "unsupported watermark position '{}'",
                code
            ))),
        }
    }
}

/// Where a watermark is placed on the working image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatermarkPosition {
    Named(NamedPosition),
    /// Distance of the watermark's bottom-right corner from the image's
    /// bottom-right corner, in unscaled pixels
    Offset { x: u32, y: u32 },
}

impl Default for WatermarkPosition {
    fn default() -> Self {
        WatermarkPosition::Named(NamedPosition::SouthEast)
    }
}

/// One watermark directive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatermarkSpec {
    /// Logical path of the watermark asset (percent-decoded)
    pub asset_path: String,
    pub position: WatermarkPosition,
    /// Size in percent of the asset's natural size; only values below 100 shrink it
    pub size_percent: u32,
}

impl WatermarkSpec {
    pub fn new(asset_path: impl Into<String>) -> Self {
        Self {
            asset_path: asset_path.into(),
            position: WatermarkPosition::default(),
            size_percent: crate::constants::DEFAULT_WATERMARK_SIZE,
        }
    }

    pub fn with_position(mut self, position: WatermarkPosition) -> Self {
        self.position = position;
        self
    }

    pub fn with_size(mut self, size_percent: u32) -> Self {
        self.size_percent = size_percent;
        self
    }
}

/// Post-resize filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterKind {
    Sharpen,
    /// Accepted for compatibility, ignored during execution
    Unknown(String),
}

impl FilterKind {
    pub fn from_code(code: &str) -> Self {
        match code {
            "s" => FilterKind::Sharpen,
            other => FilterKind::Unknown(other.to_string()),
        }
    }

    pub fn code(&self) -> &str {
        match self {
            FilterKind::Sharpen => "s",
            FilterKind::Unknown(code) => code,
        }
    }
}

/// Device pixel ratio
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelRatio {
    One,
    OneAndHalf,
    Two,
    Three,
}

impl PixelRatio {
    pub fn code(&self) -> &'static str {
        match self {
            PixelRatio::One => "1",
            PixelRatio::OneAndHalf => "1.5",
            PixelRatio::Two => "2",
            PixelRatio::Three => "3",
        }
    }

    pub fn from_code(code: &str) -> Result<Self, ResizeError> {
        match code {
            "1" => Ok(PixelRatio::One),
            "1.5" => Ok(PixelRatio::OneAndHalf),
            "2" => Ok(PixelRatio::Two),
            "3" => Ok(PixelRatio::Three),
            _ => Err(ResizeError::grammar(format!(
                "pixel ratio must be 1, 1.5, 2 or 3, got '{}'",
                code
            ))),
        }
    }

    pub fn factor(&self) -> f32 {
        match self {
            PixelRatio::One => 1.0,
            PixelRatio::OneAndHalf => 1.5,
            PixelRatio::Two => 2.0,
            PixelRatio::Three => 3.0,
        }
    }

    /// Scale a pixel length by this ratio, rounding to the nearest pixel
    pub fn scale(&self, value: u32) -> u32 {
        (value as f32 * self.factor()).round() as u32
    }
}
