use std::time::Duration;

use thiserror::Error;
use url::Url;

use crate::threshold::Threshold;

/// Configuration problems are fatal and detected before any request is
/// dispatched. They never surface mid-run.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("target URL is not set (pass it as an argument or set TARGET_URL)")]
    MissingUrl,
    #[error("invalid target URL {url:?}: {source}")]
    InvalidUrl {
        url: String,
        source: url::ParseError,
    },
    #[error("virtual user count must be greater than zero")]
    ZeroVus,
    #[error("duration must be greater than zero")]
    ZeroDuration,
    #[error("malformed threshold {expr:?}: expected `metric.stat <op> value`, e.g. `http_req_failed.rate<0.01`")]
    MalformedThreshold { expr: String },
    #[error("unknown metric {name:?} in threshold {expr:?}")]
    UnknownMetric { name: String, expr: String },
}

/// Immutable run configuration. Validated on construction; the engine never
/// re-checks any of these fields.
#[derive(Debug, Clone)]
pub struct Config {
    pub url: Url,
    pub vus: usize,
    pub duration: Duration,
    pub timeout: Duration,
    pub expected_status: u16,
    pub thresholds: Vec<Threshold>,
}

impl Config {
    pub fn new(
        url: Option<String>,
        vus: usize,
        duration: Duration,
        timeout: Duration,
        expected_status: u16,
        threshold_exprs: &[String],
    ) -> Result<Self, ConfigError> {
        let raw_url = match url {
            Some(u) if !u.trim().is_empty() => u,
            _ => return Err(ConfigError::MissingUrl),
        };
        let url = Url::parse(&raw_url).map_err(|source| ConfigError::InvalidUrl {
            url: raw_url,
            source,
        })?;

        if vus == 0 {
            return Err(ConfigError::ZeroVus);
        }
        if duration.is_zero() {
            return Err(ConfigError::ZeroDuration);
        }

        let thresholds = threshold_exprs
            .iter()
            .map(|expr| expr.parse())
            .collect::<Result<Vec<Threshold>, ConfigError>>()?;

        Ok(Config {
            url,
            vus,
            duration,
            timeout,
            expected_status,
            thresholds,
        })
    }
}
