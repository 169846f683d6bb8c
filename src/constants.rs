// Constants module - centralized default values for configuration
//
// Defaults used by the config layer, the resolver and the HTTP surface.

// =============================================================================
// Server defaults
// =============================================================================

/// Default listen address
pub const DEFAULT_ADDRESS: &str = "0.0.0.0";

/// Default listen port
pub const DEFAULT_PORT: u16 = 8080;

/// Default number of worker threads
pub const DEFAULT_THREADS: usize = 4;

// =============================================================================
// Image defaults
// =============================================================================

/// Default output quality when no `q` directive or preset sets one
pub const DEFAULT_QUALITY: u8 = 80;

/// Lowest quality accepted by the `q` directive
pub const MIN_QUALITY: u8 = 5;

/// Highest quality accepted by the `q` directive
pub const MAX_QUALITY: u8 = 99;

/// Quality adjustment applied when encoding WebP instead of JPEG
pub const DEFAULT_WEBP_QUALITY_CORRECTION: i8 = -2;

/// Maximum effective target width (after pixel ratio scaling)
pub const DEFAULT_MAX_WIDTH: u32 = 4096;

/// Maximum effective target height (after pixel ratio scaling)
pub const DEFAULT_MAX_HEIGHT: u32 = 4096;

/// Default watermark size in percent of its natural size
pub const DEFAULT_WATERMARK_SIZE: u32 = 100;

// =============================================================================
// Cache defaults
// =============================================================================

/// Default disk cache directory
pub const DEFAULT_CACHE_DIR: &str = "/var/cache/shashin";

/// File content marking a key the object store reported as missing
pub const NEGATIVE_ENTRY_SENTINEL: &[u8] = b"\0shashin:no-such-key\0";

// =============================================================================
// Logging defaults
// =============================================================================

/// Default log level filter
pub const DEFAULT_LOG_LEVEL: &str = "info";
