//! Transform orchestration
//!
//! Executes a [`TransformPlan`] against source bytes:
//! decode → crop → resize/fit → filters → watermarks → encode.
//! Asset fetching is async; the pixel work runs on tokio's blocking pool.

pub mod fit;
pub mod format;
pub mod placement;

use crate::directive::{CropRect, FilterKind, Gravity};
use crate::engine::{EncodedImage, ImageEngine, OutputFormat};
use crate::error::ResizeError;
use crate::fetch::AssetFetcher;
use crate::metrics::Metrics;
use crate::plan::{TargetBox, TransformPlan};
use bytes::Bytes;
use fit::FitDecision;
use image::DynamicImage;
use placement::{calculate_position, scaled_dimensions, watermark_scale, Dimensions};
use std::sync::Arc;
use std::time::Instant;

/// Encoded response body plus the headers it implies
#[derive(Debug, Clone)]
pub struct TransformOutput {
    pub data: Vec<u8>,
    pub content_type: &'static str,
    pub format: OutputFormat,
    /// `Vary` header value, set when the format was negotiated
    pub vary: Option<&'static str>,
}

/// Runs plans against the configured engine and asset fetcher
#[derive(Clone)]
pub struct TransformOrchestrator {
    engine: Arc<dyn ImageEngine>,
    fetcher: AssetFetcher,
    metrics: Arc<Metrics>,
    auto_webp: bool,
}

impl TransformOrchestrator {
    pub fn new(
        engine: Arc<dyn ImageEngine>,
        fetcher: AssetFetcher,
        metrics: Arc<Metrics>,
        auto_webp: bool,
    ) -> Self {
        Self {
            engine,
            fetcher,
            metrics,
            auto_webp,
        }
    }

    pub fn fetcher(&self) -> &AssetFetcher {
        &self.fetcher
    }

    /// Fetch the plan's source, transform it and encode for `accept`
    pub async fn execute(
        &self,
        plan: &TransformPlan,
        accept: Option<&str>,
    ) -> Result<TransformOutput, ResizeError> {
        let source = self.fetcher.fetch(&plan.source_path).await?;
        self.transform(plan, source, accept).await
    }

    /// Transform already-fetched source bytes
    ///
    /// Watermark assets are fetched first, in order; any failure fails the
    /// whole request.
    pub async fn transform(
        &self,
        plan: &TransformPlan,
        source: Bytes,
        accept: Option<&str>,
    ) -> Result<TransformOutput, ResizeError> {
        let mut watermarks = Vec::with_capacity(plan.watermarks.len());
        for spec in &plan.watermarks {
            watermarks.push(self.fetcher.fetch(&spec.asset_path).await?);
        }

        let output_format = format::select_format(accept, self.auto_webp);
        let engine = Arc::clone(&self.engine);
        let job_plan = plan.clone();

        let started = Instant::now();
        let encoded = tokio::task::spawn_blocking(move || {
            apply_plan(engine.as_ref(), &job_plan, &source, &watermarks, output_format)
        })
        .await
        .map_err(|e| ResizeError::engine("schedule", e.to_string()))??;
        self.metrics
            .record_transform_duration(started.elapsed().as_secs_f64() * 1000.0);

        tracing::debug!(
            path = %plan.source_path,
            format = encoded.content_type,
            bytes = encoded.data.len(),
            "Transform complete"
        );

        Ok(TransformOutput {
            content_type: encoded.content_type,
            format: encoded.format,
            data: encoded.data,
            vary: self.auto_webp.then(format::vary_header),
        })
    }
}

impl std::fmt::Debug for TransformOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransformOrchestrator")
            .field("fetcher", &self.fetcher)
            .field("auto_webp", &self.auto_webp)
            .finish()
    }
}

/// Run every CPU-bound stage of `plan` synchronously
pub fn apply_plan(
    engine: &dyn ImageEngine,
    plan: &TransformPlan,
    source: &[u8],
    watermarks: &[Bytes],
    output_format: OutputFormat,
) -> Result<EncodedImage, ResizeError> {
    let mut image = engine.decode(source)?;

    if let Some(requested) = plan.crop_rect {
        let rect = requested.clamp_to(image.width(), image.height());
        if rect.is_empty() {
            return Err(ResizeError::engine(
                "crop",
                format!(
                    "crop origin {}x{} lies outside the {}x{} source",
                    requested.x,
                    requested.y,
                    image.width(),
                    image.height()
                ),
            ));
        }
        image = engine.crop(&image, rect)?;
    }

    if let Some(target) = plan.target {
        image = apply_fit(engine, plan, image, target)?;
    }

    for filter in &plan.filters {
        match filter {
            FilterKind::Sharpen => image = engine.sharpen(&image),
            FilterKind::Unknown(code) => {
                tracing::debug!(filter = %code, "Ignoring unknown filter");
            }
        }
    }

    for (spec, data) in plan.watermarks.iter().zip(watermarks) {
        let mut mark = engine.decode(data)?;
        let scale = watermark_scale(spec.size_percent, plan.pixel_ratio);
        if (scale - 1.0).abs() > f32::EPSILON {
            let size = scaled_dimensions(Dimensions::new(mark.width(), mark.height()), scale);
            mark = engine.scale(&mark, size.width, size.height)?;
        }

        let position = calculate_position(
            spec.position,
            Dimensions::new(image.width(), image.height()),
            Dimensions::new(mark.width(), mark.height()),
            plan.pixel_ratio,
        );
        image = engine.composite(&image, &mark, position.x, position.y);
    }

    match output_format {
        OutputFormat::WebP => engine.encode(&image, OutputFormat::WebP, plan.webp_quality()),
        OutputFormat::Jpeg => {
            let flat = engine.flatten(&image, plan.background);
            engine.encode(&flat, OutputFormat::Jpeg, plan.quality)
        }
    }
}

fn apply_fit(
    engine: &dyn ImageEngine,
    plan: &TransformPlan,
    image: DynamicImage,
    target: TargetBox,
) -> Result<DynamicImage, ResizeError> {
    let source = (image.width(), image.height());
    let (decision, fallback) = fit::decide(source, target, plan.fit_mode, plan.may_upscale());

    if decision.exceeds(plan.max_size) {
        let (width, height) = decision.output_size();
        return Err(ResizeError::engine(
            "resize",
            format!(
                "{}x{} source would resize to {}x{}, above the {}x{} limit",
                source.0, source.1, width, height, plan.max_size.0, plan.max_size.1
            ),
        ));
    }

    if fallback {
        tracing::info!(
            path = %plan.source_path,
            source_width = source.0,
            source_height = source.1,
            target_width = ?target.width,
            target_height = ?target.height,
            "Source smaller than crop box, falling back to fill"
        );
    }

    match decision {
        FitDecision::Scale { width, height } => engine.scale(&image, width, height),
        FitDecision::Cover {
            crop_width,
            crop_height,
            box_width,
            box_height,
        } => {
            let region = match plan.gravity {
                Gravity::Smart => engine.smart_crop(&image, crop_width, crop_height)?,
                // Focal points are not applied yet
                Gravity::Center | Gravity::Focal { .. } => {
                    let x = (source.0 - crop_width) / 2;
                    let y = (source.1 - crop_height) / 2;
                    engine.crop(&image, CropRect::new(x, y, crop_width, crop_height))?
                }
            };
            engine.scale(&region, box_width, box_height)
        }
        FitDecision::Embed {
            width,
            height,
            box_width,
            box_height,
        } => {
            let scaled = engine.scale(&image, width, height)?;
            let flat = engine.flatten(&scaled, plan.background);
            engine.embed(&flat, box_width, box_height, plan.background)
        }
    }
}
