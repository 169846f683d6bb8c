// Directive URL codec: public API round trips and wire-format edge cases

use shashin::directive::{
    encode, CropRect, DirectiveSet, EncodeOptions, FilterKind, FitMode, Gravity, NamedPosition,
    PixelRatio, Resize, Rgb, WatermarkPosition, WatermarkSpec,
};

#[test]
fn test_full_option_bundle_round_trips() {
    let options = EncodeOptions::new()
        .resize(FitMode::Crop, Some(300), Some(200))
        .crop(CropRect::new(10, 20, 640, 480))
        .quality(85)
        .gravity(Gravity::Focal { x: 12, y: 34 })
        .background(Rgb::new(0x12, 0xab, 0xef))
        .pixel_ratio(PixelRatio::OneAndHalf)
        .watermark(
            WatermarkSpec::new("brand/logo-dark,v2.png")
                .with_position(WatermarkPosition::Offset { x: 15, y: 25 })
                .with_size(40),
        )
        .watermark(WatermarkSpec::new("corner.png"))
        .filter(FilterKind::Sharpen)
        .preset("thumb");

    let url = encode("photos/2024/cat-1.jpg", &options);
    let decoded = DirectiveSet::decode(&url).unwrap();

    assert_eq!(decoded.path, "photos/2024/cat-1.jpg");
    assert_eq!(
        decoded.resize,
        Some(Resize::new(FitMode::Crop, Some(300), Some(200)))
    );
    assert_eq!(decoded.crop, Some(CropRect::new(10, 20, 640, 480)));
    assert_eq!(decoded.quality, Some(85));
    assert_eq!(decoded.gravity, Some(Gravity::Focal { x: 12, y: 34 }));
    assert_eq!(decoded.background, Some(Rgb::new(0x12, 0xab, 0xef)));
    assert_eq!(decoded.pixel_ratio, Some(PixelRatio::OneAndHalf));
    assert_eq!(decoded.watermarks.len(), 2);
    assert_eq!(decoded.watermarks[0].asset_path, "brand/logo-dark,v2.png");
    assert_eq!(
        decoded.watermarks[0].position,
        WatermarkPosition::Offset { x: 15, y: 25 }
    );
    assert_eq!(decoded.watermarks[0].size_percent, 40);
    assert_eq!(
        decoded.watermarks[1].position,
        WatermarkPosition::Named(NamedPosition::SouthEast)
    );
    assert_eq!(decoded.filters, vec![FilterKind::Sharpen]);
    assert_eq!(decoded.presets, vec!["thumb".to_string()]);

    // Encoding the decoded set reproduces the same URL
    assert_eq!(decoded.encode(), url);
}

#[test]
fn test_empty_options_encode_as_noop() {
    let url = encode("a.jpg", &EncodeOptions::new());
    assert_eq!(url, "n/a.jpg");
    let decoded = DirectiveSet::decode(&url).unwrap();
    assert_eq!(decoded, DirectiveSet {
        path: "a.jpg".to_string(),
        ..Default::default()
    });
}

#[test]
fn test_legacy_watermark_form() {
    let legacy = DirectiveSet::decode("w--h/x.jpg").unwrap();
    let explicit = DirectiveSet::decode("wse-100-h/x.jpg").unwrap();
    assert_eq!(legacy, explicit);
}

#[test]
fn test_quality_out_of_range_is_grammar_error() {
    let err = DirectiveSet::decode("q3/x.jpg").unwrap_err();
    assert_eq!(err.kind(), "grammar");
    assert_eq!(err.to_http_status(), 500);
}

#[test]
fn test_removed_compass_codes_are_rejected() {
    for code in ["ne", "e", "s", "w"] {
        let segment = format!("w{}-logo.png/x.jpg", code);
        assert!(DirectiveSet::decode(&segment).is_err(), "code {}", code);
    }
}

#[test]
fn test_plus_and_space_survive_round_trip() {
    let url = encode("summer+fall/my photo.jpg", &EncodeOptions::new().quality(70));
    assert!(!url.contains(' '));
    let decoded = DirectiveSet::decode(&url).unwrap();
    assert_eq!(decoded.path, "summer+fall/my photo.jpg");

    // Form-encoded spaces from older encoders
    assert_eq!(DirectiveSet::decode("n/my+photo.jpg").unwrap().path, "my photo.jpg");
}
