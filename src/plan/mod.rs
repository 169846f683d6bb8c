//! Transform plan resolution
//!
//! Merges a decoded [`DirectiveSet`] with the presets it references and
//! applies defaults and limits, producing the [`TransformPlan`] the
//! orchestrator executes. Merge order: explicit directives first, then each
//! referenced preset in reference order. Scalars from later sources
//! overwrite earlier ones; watermarks and filters append.

use crate::constants::{
    DEFAULT_MAX_HEIGHT, DEFAULT_MAX_WIDTH, DEFAULT_QUALITY, DEFAULT_WEBP_QUALITY_CORRECTION,
};
use crate::directive::{
    CropRect, DirectiveSet, FilterKind, FitMode, Gravity, PixelRatio, Rgb, WatermarkSpec,
};
use crate::error::ResizeError;
use crate::preset::PresetStore;

/// Resolver knobs taken from the `image` config section
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlanSettings {
    pub default_quality: u8,
    pub webp_quality_correction: i8,
    pub presets_only: bool,
    pub allow_upscale: bool,
    pub max_width: u32,
    pub max_height: u32,
}

impl Default for PlanSettings {
    fn default() -> Self {
        Self {
            default_quality: DEFAULT_QUALITY,
            webp_quality_correction: DEFAULT_WEBP_QUALITY_CORRECTION,
            presets_only: false,
            allow_upscale: false,
            max_width: DEFAULT_MAX_WIDTH,
            max_height: DEFAULT_MAX_HEIGHT,
        }
    }
}

/// Width/height pair where at least one side is present
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetBox {
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl TargetBox {
    pub fn new(width: Option<u32>, height: Option<u32>) -> Self {
        Self { width, height }
    }

    /// Both sides, when both are present
    pub fn both(&self) -> Option<(u32, u32)> {
        self.width.zip(self.height)
    }

    fn scaled(&self, ratio: PixelRatio) -> TargetBox {
        TargetBox {
            width: self.width.map(|w| ratio.scale(w)),
            height: self.height.map(|h| ratio.scale(h)),
        }
    }
}

/// Fully resolved, validated transform for one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformPlan {
    pub source_path: String,
    pub fit_mode: FitMode,
    /// Effective box after pixel ratio scaling
    pub target: Option<TargetBox>,
    pub crop_rect: Option<CropRect>,
    pub gravity: Gravity,
    pub quality: u8,
    pub webp_quality_correction: i8,
    pub background: Rgb,
    pub watermarks: Vec<WatermarkSpec>,
    pub filters: Vec<FilterKind>,
    /// `p1` resolves to `None`
    pub pixel_ratio: Option<PixelRatio>,
    pub upscale_allowed: bool,
    /// Largest output the resize stage may produce, as `(width, height)`
    pub max_size: (u32, u32),
}

impl TransformPlan {
    /// Upscaling is permitted by config or implied by a pixel ratio request
    pub fn may_upscale(&self) -> bool {
        self.upscale_allowed || self.pixel_ratio.is_some()
    }

    /// Quality used when the output is WebP, clamped to the encoder's range
    pub fn webp_quality(&self) -> u8 {
        (self.quality as i16 + self.webp_quality_correction as i16).clamp(1, 100) as u8
    }
}

/// Resolver bound to a preset store and settings
#[derive(Debug, Clone, Default)]
pub struct PlanResolver {
    presets: PresetStore,
    settings: PlanSettings,
}

impl PlanResolver {
    pub fn new(presets: PresetStore, settings: PlanSettings) -> Self {
        Self { presets, settings }
    }

    pub fn resolve(&self, raw: &DirectiveSet) -> Result<TransformPlan, ResizeError> {
        resolve(raw, &self.presets, &self.settings)
    }
}

/// Resolve `raw` against `presets` and `settings`
pub fn resolve(
    raw: &DirectiveSet,
    presets: &PresetStore,
    settings: &PlanSettings,
) -> Result<TransformPlan, ResizeError> {
    if settings.presets_only && !raw.is_preset_only() {
        return Err(ResizeError::grammar(
            "only preset directives are allowed on this service",
        ));
    }

    let mut merged = raw.clone();
    for name in &raw.presets {
        overlay(&mut merged, presets.get(name)?);
    }

    let pixel_ratio = merged.pixel_ratio.filter(|r| *r != PixelRatio::One);
    let requested = merged
        .resize
        .filter(|r| r.is_sized())
        .map(|r| TargetBox::new(r.width, r.height));
    let target = match (requested, pixel_ratio) {
        (Some(requested), Some(ratio)) => Some(requested.scaled(ratio)),
        (requested, _) => requested,
    };

    if let Some(target) = target {
        check_limits(&target, settings)?;
    }

    Ok(TransformPlan {
        source_path: merged.path,
        fit_mode: merged.resize.map(|r| r.fit).unwrap_or_default(),
        target,
        crop_rect: merged.crop,
        gravity: merged.gravity.unwrap_or_default(),
        quality: merged.quality.unwrap_or(settings.default_quality),
        webp_quality_correction: settings.webp_quality_correction,
        background: merged.background.unwrap_or_default(),
        watermarks: merged.watermarks,
        filters: merged.filters,
        pixel_ratio,
        upscale_allowed: settings.allow_upscale,
        max_size: (settings.max_width, settings.max_height),
    })
}

fn overlay(base: &mut DirectiveSet, preset: &DirectiveSet) {
    if preset.resize.is_some() {
        base.resize = preset.resize;
    }
    if preset.crop.is_some() {
        base.crop = preset.crop;
    }
    if preset.quality.is_some() {
        base.quality = preset.quality;
    }
    if preset.gravity.is_some() {
        base.gravity = preset.gravity;
    }
    if preset.background.is_some() {
        base.background = preset.background;
    }
    if preset.pixel_ratio.is_some() {
        base.pixel_ratio = preset.pixel_ratio;
    }
    base.watermarks.extend(preset.watermarks.iter().cloned());
    base.filters.extend(preset.filters.iter().cloned());
}

fn check_limits(target: &TargetBox, settings: &PlanSettings) -> Result<(), ResizeError> {
    if let Some(width) = target.width.filter(|w| *w > settings.max_width) {
        return Err(ResizeError::grammar(format!(
            "width {} exceeds maximum {}",
            width, settings.max_width
        )));
    }
    if let Some(height) = target.height.filter(|h| *h > settings.max_height) {
        return Err(ResizeError::grammar(format!(
            "height {} exceeds maximum {}",
            height, settings.max_height
        )));
    }
    Ok(())
}
