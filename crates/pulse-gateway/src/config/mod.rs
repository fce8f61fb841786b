//! Gateway config loader (strict parsing).
//!
//! A missing config file is not an error: the server runs on built-in
//! defaults, with `PORT` from the environment applied last.

pub mod schema;

use std::{fs, io, path::Path};

use pulse_core::error::{Result, PulseError};

pub use schema::{CorsSection, GatewayConfig, GatewaySection};

pub const DEFAULT_CONFIG_PATH: &str = "pulse.yaml";

/// Load config from `PULSE_CONFIG` (or `pulse.yaml`), then apply `PORT`.
pub fn load_from_env() -> Result<GatewayConfig> {
    let path = std::env::var("PULSE_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let mut cfg = load_from_file_or_default(&path)?;
    cfg.apply_port_override(std::env::var("PORT").ok().as_deref())?;
    Ok(cfg)
}

pub fn load_from_file_or_default(path: impl AsRef<Path>) -> Result<GatewayConfig> {
    let path = path.as_ref();
    match fs::read_to_string(path) {
        Ok(s) => load_from_str(&s),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            tracing::info!(path = %path.display(), "config file not found, using defaults");
            Ok(GatewayConfig::default())
        }
        Err(e) => Err(PulseError::Internal(format!("read config failed: {e}"))),
    }
}

pub fn load_from_str(s: &str) -> Result<GatewayConfig> {
    let cfg: GatewayConfig = serde_yaml::from_str(s)
        .map_err(|e| PulseError::BadRequest(format!("invalid yaml: {e}")))?;
    cfg.validate()?;
    Ok(cfg)
}
