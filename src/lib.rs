// Shashin image transformation service library

pub mod cache;
pub mod config;
pub mod constants;
pub mod directive;
pub mod engine;
pub mod error;
pub mod fetch;
pub mod logging;
pub mod metrics;
pub mod plan;
pub mod preset;
pub mod server;
pub mod transform;
