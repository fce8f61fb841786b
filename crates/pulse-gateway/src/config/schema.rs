use std::net::{IpAddr, SocketAddr};

use serde::Deserialize;
use pulse_core::error::{Result, PulseError};

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    pub version: u32,

    #[serde(default)]
    pub gateway: GatewaySection,

    #[serde(default)]
    pub cors: CorsSection,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            version: 1,
            gateway: GatewaySection::default(),
            cors: CorsSection::default(),
        }
    }
}

impl GatewayConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(PulseError::UnsupportedVersion);
        }

        self.gateway.validate()?;
        self.cors.validate()?;

        Ok(())
    }

    /// `PORT` wins over the file, mirroring how the server is usually deployed.
    pub fn apply_port_override(&mut self, port: Option<&str>) -> Result<()> {
        let Some(raw) = port else { return Ok(()) };
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(());
        }
        self.gateway.port = raw
            .parse::<u16>()
            .map_err(|e| PulseError::BadRequest(format!("PORT must be a valid port number: {e}")))?;
        Ok(())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        let ip: IpAddr = self
            .gateway
            .host
            .parse()
            .map_err(|e| PulseError::BadRequest(format!("gateway.host must be an IP address: {e}")))?;
        Ok(SocketAddr::new(ip, self.gateway.port))
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GatewaySection {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_ping_interval_ms")]
    pub ping_interval_ms: u64,

    #[serde(default = "default_idle_timeout_ms")]
    pub idle_timeout_ms: u64,

    /// Per-connection outbound queue depth. Broadcasts to a full queue are dropped.
    #[serde(default = "default_outbound_queue")]
    pub outbound_queue: usize,
}

impl Default for GatewaySection {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            ping_interval_ms: default_ping_interval_ms(),
            idle_timeout_ms: default_idle_timeout_ms(),
            outbound_queue: default_outbound_queue(),
        }
    }
}

impl GatewaySection {
    pub fn validate(&self) -> Result<()> {
        if !(5000..=120000).contains(&self.ping_interval_ms) {
            return Err(PulseError::BadRequest(
                "gateway.ping_interval_ms must be between 5000 and 120000".into(),
            ));
        }
        if !(10000..=600000).contains(&self.idle_timeout_ms) {
            return Err(PulseError::BadRequest(
                "gateway.idle_timeout_ms must be between 10000 and 600000".into(),
            ));
        }
        if self.idle_timeout_ms <= self.ping_interval_ms {
            return Err(PulseError::BadRequest(
                "gateway.idle_timeout_ms must be greater than ping_interval_ms".into(),
            ));
        }
        if !(1..=65536).contains(&self.outbound_queue) {
            return Err(PulseError::BadRequest(
                "gateway.outbound_queue must be between 1 and 65536".into(),
            ));
        }
        Ok(())
    }
}

fn default_host() -> String {
    "0.0.0.0".into()
}
fn default_port() -> u16 {
    3000
}
fn default_ping_interval_ms() -> u64 {
    20000
}
fn default_idle_timeout_ms() -> u64 {
    60000
}
fn default_outbound_queue() -> usize {
    64
}

/// Cross-origin policy. Origins are always permissive; only methods are tunable.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CorsSection {
    #[serde(default = "default_allow_methods")]
    pub allow_methods: Vec<String>,
}

impl Default for CorsSection {
    fn default() -> Self {
        Self {
            allow_methods: default_allow_methods(),
        }
    }
}

impl CorsSection {
    pub fn validate(&self) -> Result<()> {
        for m in &self.allow_methods {
            axum::http::Method::from_bytes(m.as_bytes())
                .map_err(|_| PulseError::BadRequest(format!("cors.allow_methods: invalid method {m:?}")))?;
        }
        Ok(())
    }

    pub fn methods(&self) -> Vec<axum::http::Method> {
        self.allow_methods
            .iter()
            .filter_map(|m| axum::http::Method::from_bytes(m.as_bytes()).ok())
            .collect()
    }
}

fn default_allow_methods() -> Vec<String> {
    vec!["GET".into(), "POST".into()]
}
