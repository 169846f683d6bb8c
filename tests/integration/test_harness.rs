// Test harness: temp asset directories, image fixtures and handler builders

use bytes::Bytes;
use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use shashin::cache::DiskCache;
use shashin::config::Config;
use shashin::engine::RasterEngine;
use shashin::fetch::{AssetFetcher, MemoryObjectStore, RemoteSource};
use shashin::metrics::Metrics;
use shashin::plan::{PlanResolver, PlanSettings};
use shashin::preset::PresetStore;
use shashin::server::{EndpointResponse, IncomingRequest, RequestHandler};
use shashin::transform::TransformOrchestrator;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

pub const BUCKET: &str = "images";

/// Encode a solid-color image
pub fn solid_image(width: u32, height: u32, color: [u8; 4], format: ImageFormat) -> Vec<u8> {
    let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba(color)));
    let image = if format == ImageFormat::Jpeg {
        DynamicImage::ImageRgb8(image.to_rgb8())
    } else {
        image
    };
    let mut buffer = Cursor::new(Vec::new());
    image.write_to(&mut buffer, format).unwrap();
    buffer.into_inner()
}

pub fn jpeg(width: u32, height: u32) -> Vec<u8> {
    solid_image(width, height, [40, 90, 160, 255], ImageFormat::Jpeg)
}

pub fn png(width: u32, height: u32, color: [u8; 4]) -> Vec<u8> {
    solid_image(width, height, color, ImageFormat::Png)
}

pub fn write_asset(dir: &Path, logical_path: &str, data: &[u8]) {
    let path = dir.join(logical_path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).unwrap();
    }
    std::fs::write(path, data).unwrap();
}

/// Handler over a local asset directory, built through the config layer
pub async fn local_handler(assets: &TempDir, extra_yaml: &str) -> RequestHandler {
    let yaml = format!(
        "storage:\n  backend: local\n  base_dir: \"{}\"\n{}",
        assets.path().display(),
        extra_yaml
    );
    let config = Config::from_yaml_with_env(&yaml).unwrap();
    config.validate().unwrap();
    RequestHandler::from_config(&config, Arc::new(Metrics::new()))
        .await
        .unwrap()
}

/// Handler over an in-memory object store with an optional disk cache
pub fn remote_handler(
    store: Arc<MemoryObjectStore>,
    cache_dir: Option<&Path>,
    metrics: Arc<Metrics>,
) -> RequestHandler {
    let source = RemoteSource::new(
        store,
        BUCKET,
        cache_dir.map(DiskCache::new),
        Arc::clone(&metrics),
    );
    let orchestrator = TransformOrchestrator::new(
        Arc::new(RasterEngine::new()),
        AssetFetcher::new(Arc::new(source)),
        Arc::clone(&metrics),
        true,
    );
    RequestHandler::new(
        PlanResolver::new(PresetStore::new(), PlanSettings::default()),
        orchestrator,
        metrics,
    )
}

pub async fn get(handler: &RequestHandler, path: &str) -> EndpointResponse {
    handler.handle(&IncomingRequest::get(path)).await
}

pub fn decode(body: &Bytes) -> DynamicImage {
    image::load_from_memory(body).unwrap()
}
