//! Directive segment decoder
//!
//! Single left-to-right pass over the comma-separated tokens. Scalar
//! directives overwrite earlier occurrences; watermark, filter and preset
//! directives accumulate in encounter order.

use super::types::{
    CropRect, FilterKind, FitMode, Gravity, NamedPosition, PixelRatio, Resize, Rgb,
    WatermarkPosition, WatermarkSpec,
};
use super::DirectiveSet;
use crate::constants::{DEFAULT_WATERMARK_SIZE, MAX_QUALITY, MIN_QUALITY};
use crate::error::ResizeError;

const KNOWN_TAGS: [char; 10] = ['r', 'c', 'q', 'g', 'b', 'w', 'f', 'p', '_', 'n'];

impl DirectiveSet {
    /// Decode a full `directives/path` segment
    pub fn decode(segment: &str) -> Result<Self, ResizeError> {
        let segment = segment.trim_start_matches('/');
        let (directives, raw_path) = segment.split_once('/').ok_or_else(|| {
            ResizeError::grammar(format!(
                "expected 'directives/path', got '{}'",
                segment
            ))
        })?;

        let path = percent_decode(raw_path)?;
        let path = path.trim_start_matches('/');
        if path.is_empty() {
            return Err(ResizeError::grammar("source path is empty"));
        }

        let mut set = Self::parse_directives(directives)?;
        set.path = path.to_string();
        Ok(set)
    }

    /// Parse a comma-separated directive list that carries no path
    pub fn parse_directives(directives: &str) -> Result<Self, ResizeError> {
        let mut set = DirectiveSet::default();
        for token in directives.split(',') {
            set.apply_token(token)?;
        }
        Ok(set)
    }

    fn apply_token(&mut self, token: &str) -> Result<(), ResizeError> {
        let tag = token
            .chars()
            .next()
            .ok_or_else(|| ResizeError::grammar("empty directive token"))?;
        let value = &token[tag.len_utf8()..];

        if tag == 'n' {
            if !value.is_empty() {
                return Err(ResizeError::grammar(format!(
                    "'n' takes no value, got '{}'",
                    token
                )));
            }
            return Ok(());
        }
        if !KNOWN_TAGS.contains(&tag) {
            return Err(ResizeError::grammar(format!(
                "unsupported directive '{}'",
                tag
            )));
        }
        if value.is_empty() {
            return Err(ResizeError::grammar(format!(
                "directive '{}' has no value",
                tag
            )));
        }

        match tag {
            'r' => self.resize = Some(parse_resize(value)?),
            'c' => self.crop = Some(parse_crop(value)?),
            'q' => self.quality = Some(parse_quality(value)?),
            'g' => self.gravity = Some(parse_gravity(value)?),
            'b' => self.background = Some(Rgb::from_hex(value)?),
            'w' => self.watermarks.push(parse_watermark(value)?),
            'f' => self.filters.push(FilterKind::from_code(value)),
            'p' => self.pixel_ratio = Some(PixelRatio::from_code(value)?),
            '_' => self.presets.push(value.to_string()),
            other => {
                return Err(ResizeError::grammar(format!(
                    "unsupported directive '{}'",
                    other
                )))
            }
        }
        Ok(())
    }
}

/// Form-style decoding: `+` is a space, `%2B` a literal plus
fn percent_decode(raw: &str) -> Result<String, ResizeError> {
    urlencoding::decode(&raw.replace('+', " "))
        .map(|decoded| decoded.into_owned())
        .map_err(|e| ResizeError::grammar(format!("path is not valid UTF-8: {}", e)))
}

fn parse_resize(value: &str) -> Result<Resize, ResizeError> {
    let (fit, dims) = match value.as_bytes()[0] {
        b'f' => (FitMode::Fill, &value[1..]),
        b'c' => (FitMode::Crop, &value[1..]),
        _ => (FitMode::Contain, value),
    };
    if dims.is_empty() {
        return Err(ResizeError::grammar(format!(
            "directive 'r{}' has no value",
            fit.code()
        )));
    }

    let (width, height) = match dims.split_once('x') {
        Some((w, h)) => (parse_optional_side(w)?, parse_optional_side(h)?),
        None => (Some(parse_side(dims)?), None),
    };

    let resize = Resize::new(fit, width, height);
    if !resize.is_sized() {
        return Err(ResizeError::grammar(
            "resize needs at least a width or a height",
        ));
    }
    Ok(resize)
}

fn parse_side(value: &str) -> Result<u32, ResizeError> {
    match value.parse::<u32>() {
        Ok(side) if side > 0 => Ok(side),
        _ => Err(ResizeError::grammar(format!(
            "resize side must be a positive integer, got '{}'",
            value
        ))),
    }
}

fn parse_optional_side(value: &str) -> Result<Option<u32>, ResizeError> {
    if value.is_empty() {
        return Ok(None);
    }
    parse_side(value).map(Some)
}

fn parse_crop(value: &str) -> Result<CropRect, ResizeError> {
    let parts = value
        .split('x')
        .map(|part| part.parse::<u32>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| {
            ResizeError::grammar(format!("crop values must be integers, got '{}'", value))
        })?;

    match parts.as_slice() {
        [x, y, width, height] => Ok(CropRect::new(*x, *y, *width, *height)),
        _ => Err(ResizeError::grammar(format!(
            "crop needs four values XxYxWxH, got '{}'",
            value
        ))),
    }
}

fn parse_quality(value: &str) -> Result<u8, ResizeError> {
    match value.parse::<u32>() {
        Ok(q) if (MIN_QUALITY as u32..=MAX_QUALITY as u32).contains(&q) => Ok(q as u8),
        _ => Err(ResizeError::grammar(format!(
            "quality must be an integer in [{}, {}], got '{}'",
            MIN_QUALITY, MAX_QUALITY, value
        ))),
    }
}

fn parse_gravity(value: &str) -> Result<Gravity, ResizeError> {
    match value {
        "s" => Ok(Gravity::Smart),
        "c" => Ok(Gravity::Center),
        _ => {
            let point = value.strip_prefix('f').ok_or_else(|| {
                ResizeError::grammar(format!("unsupported gravity '{}'", value))
            })?;
            let (x, y) = parse_pair(point).ok_or_else(|| {
                ResizeError::grammar(format!("focal point must be XxY, got '{}'", point))
            })?;
            Ok(Gravity::Focal { x, y })
        }
    }
}

fn parse_pair(value: &str) -> Option<(u32, u32)> {
    let (x, y) = value.split_once('x')?;
    Some((x.parse().ok()?, y.parse().ok()?))
}

fn parse_watermark(value: &str) -> Result<WatermarkSpec, ResizeError> {
    let fields: Vec<&str> = value.split('-').collect();
    let (position, size, path) = match fields.as_slice() {
        [path] => (None, None, *path),
        [position, path] => (Some(*position), None, *path),
        [position, size, path] => (Some(*position), Some(*size), *path),
        _ => {
            return Err(ResizeError::grammar(format!(
                "watermark takes at most three fields, got '{}'",
                value
            )))
        }
    };

    let asset_path = percent_decode(path)?;
    let asset_path = asset_path.trim_start_matches('/');
    if asset_path.is_empty() {
        return Err(ResizeError::grammar("watermark path is empty"));
    }

    Ok(WatermarkSpec {
        asset_path: asset_path.to_string(),
        position: parse_watermark_position(position.unwrap_or_default())?,
        size_percent: parse_watermark_size(size.unwrap_or_default())?,
    })
}

fn parse_watermark_position(field: &str) -> Result<WatermarkPosition, ResizeError> {
    if field.is_empty() {
        return Ok(WatermarkPosition::default());
    }
    if field.len() > 2 {
        let (x, y) = parse_pair(field).ok_or_else(|| {
            ResizeError::grammar(format!("watermark offset must be XxY, got '{}'", field))
        })?;
        return Ok(WatermarkPosition::Offset { x, y });
    }
    NamedPosition::from_code(field).map(WatermarkPosition::Named)
}

fn parse_watermark_size(field: &str) -> Result<u32, ResizeError> {
    if field.is_empty() {
        return Ok(DEFAULT_WATERMARK_SIZE);
    }
    match field.parse::<u32>() {
        Ok(size) if size > 0 => Ok(size),
        _ => Err(ResizeError::grammar(format!(
            "watermark size must be a positive integer, got '{}'",
            field
        ))),
    }
}
