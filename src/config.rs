use anyhow::{Context, Result};
use serde::Deserialize;
use std::{fs, net::IpAddr, net::SocketAddr, path::Path, path::PathBuf};

pub const DEFAULT_MODEL_PATH: &str = "models/fare_model.json";
pub const DEFAULT_PORT: u16 = 8080;

#[derive(Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ServiceConfig {
    pub model_path: PathBuf,
    pub bind_addr: IpAddr,
    pub port: u16,
    /// Log a per-request summary of the encoded vector.
    pub log_pred: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            bind_addr: IpAddr::from([0, 0, 0, 0]),
            port: DEFAULT_PORT,
            log_pred: false,
        }
    }
}

impl ServiceConfig {
    /// JSON config file; missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read config at {}", path.display()))?;
        serde_json::from_str(&data)
            .with_context(|| format!("invalid config JSON in {}", path.display()))
    }

    /// `FARE_CONFIG` names a JSON file; otherwise `MODEL_PATH`, `BIND_ADDR`,
    /// `PORT` and `LOG_PRED` are read individually.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("FARE_CONFIG") {
            return Self::load(path);
        }

        let mut cfg = Self::default();
        if let Some(p) = lookup("MODEL_PATH") {
            cfg.model_path = PathBuf::from(p);
        }
        if let Some(a) = lookup("BIND_ADDR") {
            cfg.bind_addr = a
                .parse()
                .with_context(|| format!("BIND_ADDR is not an IP address: {a}"))?;
        }
        if let Some(p) = lookup("PORT") {
            cfg.port = p
                .parse()
                .with_context(|| format!("PORT is not a valid port: {p}"))?;
        }
        cfg.log_pred = lookup("LOG_PRED").as_deref() == Some("1");
        Ok(cfg)
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_addr, self.port)
    }
}
