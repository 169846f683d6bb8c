// End-to-end transform tests over a local asset directory

use super::test_harness::*;
use image::GenericImageView;
use shashin::server::IncomingRequest;
use tempfile::TempDir;

#[tokio::test]
async fn test_contain_resize_preserves_aspect_ratio() {
    let assets = TempDir::new().unwrap();
    write_asset(assets.path(), "photos/cat.jpg", &jpeg(400, 200));
    let handler = local_handler(&assets, "").await;

    let response = get(&handler, "/r100x100/photos/cat.jpg").await;

    assert_eq!(response.status, 200);
    assert_eq!(response.content_type, "image/jpeg");
    assert_eq!(decode(&response.body).dimensions(), (100, 50));
}

#[tokio::test]
async fn test_noop_directive_serves_original_size() {
    let assets = TempDir::new().unwrap();
    write_asset(assets.path(), "a.jpg", &jpeg(64, 48));
    let handler = local_handler(&assets, "").await;

    let response = get(&handler, "/n/a.jpg").await;
    assert_eq!(response.status, 200);
    assert_eq!(decode(&response.body).dimensions(), (64, 48));
}

#[tokio::test]
async fn test_crop_directive_is_clamped() {
    let assets = TempDir::new().unwrap();
    write_asset(assets.path(), "a.jpg", &jpeg(100, 100));
    let handler = local_handler(&assets, "").await;

    let response = get(&handler, "/c90x90x50x50/a.jpg").await;
    assert_eq!(response.status, 200);
    assert_eq!(decode(&response.body).dimensions(), (10, 10));
}

#[tokio::test]
async fn test_crop_fit_falls_back_to_fill_without_upscale() {
    let assets = TempDir::new().unwrap();
    write_asset(assets.path(), "small.jpg", &jpeg(100, 100));
    let handler = local_handler(&assets, "").await;

    let response = get(&handler, "/rc500x500,bff0000/small.jpg").await;
    assert_eq!(response.status, 200);

    let image = decode(&response.body).to_rgb8();
    assert_eq!(image.dimensions(), (500, 500));
    // Padding uses the background color; the source sits in the middle
    let corner = image.get_pixel(10, 10);
    assert!(corner[0] > 200 && corner[2] < 60, "corner {:?}", corner);
    let center = image.get_pixel(250, 250);
    assert!(center[2] > 120, "center {:?}", center);
}

#[tokio::test]
async fn test_crop_fit_upscales_when_allowed() {
    let assets = TempDir::new().unwrap();
    write_asset(assets.path(), "small.jpg", &jpeg(100, 50));
    let handler = local_handler(&assets, "image:\n  allow_upscale: true\n").await;

    let response = get(&handler, "/rc300x300/small.jpg").await;
    assert_eq!(response.status, 200);
    assert_eq!(decode(&response.body).dimensions(), (300, 300));
}

#[tokio::test]
async fn test_fill_pads_to_exact_box() {
    let assets = TempDir::new().unwrap();
    write_asset(assets.path(), "wide.jpg", &jpeg(400, 100));
    let handler = local_handler(&assets, "").await;

    let response = get(&handler, "/rf200x200/wide.jpg").await;
    assert_eq!(response.status, 200);
    assert_eq!(decode(&response.body).dimensions(), (200, 200));
}

#[tokio::test]
async fn test_pixel_ratio_scales_target() {
    let assets = TempDir::new().unwrap();
    write_asset(assets.path(), "a.jpg", &jpeg(100, 100));
    let handler = local_handler(&assets, "").await;

    let response = get(&handler, "/r100x100,p2/a.jpg").await;
    assert_eq!(response.status, 200);
    assert_eq!(decode(&response.body).dimensions(), (200, 200));
}

#[tokio::test]
async fn test_target_above_limit_is_rejected() {
    let assets = TempDir::new().unwrap();
    write_asset(assets.path(), "a.jpg", &jpeg(10, 10));
    let handler = local_handler(&assets, "image:\n  max_width: 500\n").await;

    let response = get(&handler, "/r300,p2/a.jpg").await;
    assert_eq!(response.status, 500);
}

#[tokio::test]
async fn test_watermark_is_composited() {
    let assets = TempDir::new().unwrap();
    write_asset(
        assets.path(),
        "a.jpg",
        &solid_image(100, 100, [0, 0, 0, 255], image::ImageFormat::Jpeg),
    );
    write_asset(assets.path(), "marks/logo.png", &png(20, 20, [255, 255, 255, 255]));
    let handler = local_handler(&assets, "").await;

    let response = get(&handler, "/wnw-marks%2Flogo.png/a.jpg").await;
    assert_eq!(response.status, 200);

    let image = decode(&response.body).to_rgb8();
    assert!(image.get_pixel(5, 5)[0] > 200);
    assert!(image.get_pixel(60, 60)[0] < 60);
}

#[tokio::test]
async fn test_missing_watermark_is_404() {
    let assets = TempDir::new().unwrap();
    write_asset(assets.path(), "a.jpg", &jpeg(10, 10));
    let handler = local_handler(&assets, "").await;

    let response = get(&handler, "/wse-missing.png/a.jpg").await;
    assert_eq!(response.status, 404);
}

#[tokio::test]
async fn test_webp_negotiation_and_vary() {
    let assets = TempDir::new().unwrap();
    write_asset(assets.path(), "a.jpg", &jpeg(32, 32));
    let handler = local_handler(&assets, "").await;

    let webp = handler
        .handle(&IncomingRequest::get("/q90/a.jpg").with_accept("image/avif,image/webp,*/*"))
        .await;
    assert_eq!(webp.status, 200);
    assert_eq!(webp.content_type, "image/webp");
    assert_eq!(webp.header("Vary"), Some("Accept"));
    assert_eq!(&webp.body[0..4], b"RIFF");

    let jpeg_response = handler
        .handle(&IncomingRequest::get("/q90/a.jpg").with_accept("image/jpeg,*/*"))
        .await;
    assert_eq!(jpeg_response.content_type, "image/jpeg");
    assert_eq!(jpeg_response.header("Vary"), Some("Accept"));
}

#[tokio::test]
async fn test_auto_webp_disabled_never_varies() {
    let assets = TempDir::new().unwrap();
    write_asset(assets.path(), "a.jpg", &jpeg(32, 32));
    let handler = local_handler(&assets, "image:\n  auto_webp: false\n").await;

    let response = handler
        .handle(&IncomingRequest::get("/n/a.jpg").with_accept("image/webp"))
        .await;
    assert_eq!(response.content_type, "image/jpeg");
    assert_eq!(response.header("Vary"), None);
}

#[tokio::test]
async fn test_path_traversal_is_404() {
    let assets = TempDir::new().unwrap();
    let handler = local_handler(&assets, "").await;

    let response = get(&handler, "/n/..%2F..%2Fetc%2Fpasswd").await;
    assert_eq!(response.status, 404);
}

#[tokio::test]
async fn test_percent_encoded_source_path() {
    let assets = TempDir::new().unwrap();
    write_asset(assets.path(), "my photos/cat 1.jpg", &jpeg(20, 20));
    let handler = local_handler(&assets, "").await;

    let response = get(&handler, "/r10/my%20photos/cat%201.jpg").await;
    assert_eq!(response.status, 200);
    assert_eq!(decode(&response.body).dimensions(), (10, 10));
}

#[tokio::test]
async fn test_sharpen_and_unknown_filters() {
    let assets = TempDir::new().unwrap();
    write_asset(assets.path(), "a.jpg", &jpeg(20, 20));
    let handler = local_handler(&assets, "").await;

    let response = get(&handler, "/fs,fzz/a.jpg").await;
    assert_eq!(response.status, 200);
}

#[tokio::test]
async fn test_extreme_aspect_ratio_cannot_blow_up_output() {
    let assets = TempDir::new().unwrap();
    write_asset(assets.path(), "strip.jpg", &jpeg(1, 10000));
    let handler = local_handler(&assets, "").await;

    // Width 4096 passes the request check; the derived height would not
    let response = get(&handler, "/r2048,p2/strip.jpg").await;
    assert_eq!(response.status, 500);

    let response = get(&handler, "/rc100x100,p2/strip.jpg").await;
    assert_eq!(response.status, 200);
    assert_eq!(decode(&response.body).dimensions(), (200, 200));
}

#[tokio::test]
async fn test_plus_in_path_is_a_space() {
    let assets = TempDir::new().unwrap();
    write_asset(assets.path(), "my photo.jpg", &jpeg(20, 20));
    let handler = local_handler(&assets, "").await;

    let response = get(&handler, "/n/my+photo.jpg").await;
    assert_eq!(response.status, 200);
}
