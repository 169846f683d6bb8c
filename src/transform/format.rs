//! Output format negotiation based on the Accept header
//!
//! Only two outputs exist: WebP when the client advertises it and
//! negotiation is enabled, JPEG otherwise. Wildcards (`image/*`, `*/*`)
//! never select WebP.

use crate::engine::OutputFormat;

/// Parsed Accept header entry
#[derive(Debug, Clone, PartialEq)]
struct MediaPreference {
    media_type: String,
    quality: f32,
}

/// Select the output format for a request
pub fn select_format(accept_header: Option<&str>, auto_webp: bool) -> OutputFormat {
    if !auto_webp {
        return OutputFormat::Jpeg;
    }

    match accept_header {
        Some(accept) if accepts_webp(accept) => OutputFormat::WebP,
        _ => OutputFormat::Jpeg,
    }
}

/// Whether the header lists `image/webp` with a non-zero quality
pub fn accepts_webp(accept: &str) -> bool {
    parse_accept_header(accept)
        .iter()
        .any(|pref| pref.media_type == "image/webp" && pref.quality > 0.0)
}

/// Header value sent when the response depends on negotiation
pub fn vary_header() -> &'static str {
    "Accept"
}

fn parse_accept_header(accept: &str) -> Vec<MediaPreference> {
    let mut preferences = Vec::new();

    for part in accept.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }

        let (media_type, quality) = match part.split_once(';') {
            Some((mt, params)) => (mt.trim(), parse_quality(params)),
            None => (part, 1.0),
        };

        preferences.push(MediaPreference {
            media_type: media_type.to_lowercase(),
            quality,
        });
    }

    preferences
}

/// Parse quality value from parameters (e.g., "q=0.8")
fn parse_quality(params: &str) -> f32 {
    for param in params.split(';') {
        if let Some(q) = param.trim().strip_prefix("q=") {
            if let Ok(quality) = q.trim().parse::<f32>() {
                return quality.clamp(0.0, 1.0);
            }
        }
    }
    1.0
}
