// src/config.rs
// =============================================================================
// Runtime configuration for a batch run.
//
// Settings come from three layers, later layers win:
// 1. Built-in defaults (the values the checker has always used)
// 2. An optional TOML file passed with --config
// 3. Command-line flags
//
// Both the file and the flags are read into a `PartialConfig` (every field
// optional), then laid over the defaults.
//
// Example file:
//
//   concurrency = 50
//   retries = 3
//   rate_limit_delay = 0.25
//   ssl_verify = false
// =============================================================================

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

/// Knobs for the probing engine.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Upper bound on simultaneous HTTP requests (size of the HTTP pool)
    pub concurrency: usize,
    /// Retries per stage after the first attempt
    pub retries: u32,
    pub dns_timeout: Duration,
    pub tcp_timeout: Duration,
    pub http_timeout: Duration,
    /// Minimum spacing between HTTP attempts across the whole batch
    pub rate_limit_delay: Duration,
    /// Random extra wait added when the pacing limiter has to wait
    pub jitter_max: Duration,
    /// Random extra wait added to each retry backoff
    pub backoff_jitter: Duration,
    /// Verify TLS certificates on the HTTP stage
    pub ssl_verify: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            concurrency: 30,
            retries: 2,
            dns_timeout: Duration::from_secs(3),
            tcp_timeout: Duration::from_secs(3),
            http_timeout: Duration::from_secs(10),
            rate_limit_delay: Duration::from_millis(100),
            jitter_max: Duration::from_millis(200),
            backoff_jitter: Duration::from_millis(100),
            ssl_verify: true,
        }
    }
}

/// Everything the binary needs: engine knobs plus report options.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Settings {
    pub engine: EngineConfig,
    /// Only show results that aren't `ok` in the report
    pub error_only: bool,
}

/// One configuration layer. Durations are in (fractional) seconds.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PartialConfig {
    pub concurrency: Option<usize>,
    pub retries: Option<u32>,
    pub dns_timeout: Option<f64>,
    pub tcp_timeout: Option<f64>,
    pub http_timeout: Option<f64>,
    pub rate_limit_delay: Option<f64>,
    pub jitter_max: Option<f64>,
    pub backoff_jitter: Option<f64>,
    pub ssl_verify: Option<bool>,
    pub error_only: Option<bool>,
}

impl PartialConfig {
    // Reads a layer from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        toml::from_str(&text)
            .with_context(|| format!("invalid config file {}", path.display()))
    }

    // Lays `other` on top of `self`: any field set in `other` wins
    pub fn merge(self, other: PartialConfig) -> PartialConfig {
        PartialConfig {
            concurrency: other.concurrency.or(self.concurrency),
            retries: other.retries.or(self.retries),
            dns_timeout: other.dns_timeout.or(self.dns_timeout),
            tcp_timeout: other.tcp_timeout.or(self.tcp_timeout),
            http_timeout: other.http_timeout.or(self.http_timeout),
            rate_limit_delay: other.rate_limit_delay.or(self.rate_limit_delay),
            jitter_max: other.jitter_max.or(self.jitter_max),
            backoff_jitter: other.backoff_jitter.or(self.backoff_jitter),
            ssl_verify: other.ssl_verify.or(self.ssl_verify),
            error_only: other.error_only.or(self.error_only),
        }
    }

    // Applies this layer over the defaults and validates the result
    pub fn resolve(self) -> Result<Settings> {
        let defaults = Settings::default();
        let base = defaults.engine;

        let concurrency = self.concurrency.unwrap_or(base.concurrency);
        if concurrency == 0 {
            return Err(anyhow!("concurrency must be at least 1"));
        }

        Ok(Settings {
            engine: EngineConfig {
                concurrency,
                retries: self.retries.unwrap_or(base.retries),
                dns_timeout: seconds("dns_timeout", self.dns_timeout, base.dns_timeout)?,
                tcp_timeout: seconds("tcp_timeout", self.tcp_timeout, base.tcp_timeout)?,
                http_timeout: seconds("http_timeout", self.http_timeout, base.http_timeout)?,
                rate_limit_delay: seconds(
                    "rate_limit_delay",
                    self.rate_limit_delay,
                    base.rate_limit_delay,
                )?,
                jitter_max: seconds("jitter_max", self.jitter_max, base.jitter_max)?,
                backoff_jitter: seconds("backoff_jitter", self.backoff_jitter, base.backoff_jitter)?,
                ssl_verify: self.ssl_verify.unwrap_or(base.ssl_verify),
            },
            error_only: self.error_only.unwrap_or(defaults.error_only),
        })
    }
}

fn seconds(name: &str, value: Option<f64>, default: Duration) -> Result<Duration> {
    match value {
        None => Ok(default),
        Some(secs) => Duration::try_from_secs_f64(secs)
            .map_err(|_| anyhow!("{} must be a non-negative number of seconds, got {}", name, secs)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_when_nothing_set() {
        let settings = PartialConfig::default().resolve().unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.engine.concurrency, 30);
        assert_eq!(settings.engine.retries, 2);
        assert_eq!(settings.engine.http_timeout, Duration::from_secs(10));
        assert!(settings.engine.ssl_verify);
        assert!(!settings.error_only);
    }

    #[test]
    fn test_later_layer_wins() {
        let file = PartialConfig {
            concurrency: Some(5),
            retries: Some(4),
            ..Default::default()
        };
        let flags = PartialConfig {
            retries: Some(1),
            ssl_verify: Some(false),
            ..Default::default()
        };

        let settings = file.merge(flags).resolve().unwrap();
        assert_eq!(settings.engine.concurrency, 5);
        assert_eq!(settings.engine.retries, 1);
        assert!(!settings.engine.ssl_verify);
    }

    #[test]
    fn test_reads_toml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "concurrency = 12").unwrap();
        writeln!(file, "rate_limit_delay = 0.25").unwrap();
        writeln!(file, "error_only = true").unwrap();

        let settings = PartialConfig::from_file(file.path())
            .unwrap()
            .resolve()
            .unwrap();
        assert_eq!(settings.engine.concurrency, 12);
        assert_eq!(settings.engine.rate_limit_delay, Duration::from_millis(250));
        assert!(settings.error_only);
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "chunk_size = 30").unwrap();

        assert!(PartialConfig::from_file(file.path()).is_err());
    }

    #[test]
    fn test_negative_duration_is_rejected() {
        let layer = PartialConfig {
            http_timeout: Some(-1.0),
            ..Default::default()
        };
        assert!(layer.resolve().is_err());
    }

    #[test]
    fn test_zero_concurrency_is_rejected() {
        let layer = PartialConfig {
            concurrency: Some(0),
            ..Default::default()
        };
        assert!(layer.resolve().is_err());
    }
}
