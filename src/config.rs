//! Configuration types.
//!
//! Everything can be built from `MAILSIFT_*` environment variables; the
//! triage settings can also be loaded from a JSON document.

use std::collections::HashMap;
use std::time::Duration;

use secrecy::SecretString;
use serde::Deserialize;

use crate::error::ConfigError;

/// Default remote digest endpoint.
pub const DEFAULT_REMOTE_URL: &str = "https://api.scaledown.ai/v1";

/// How pooled decisions and questions are deduplicated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DedupStrategy {
    /// Hash-set pass; survivors come out in set iteration order.
    #[default]
    Unordered,
    /// Keep the first occurrence, preserving extraction order.
    FirstSeen,
}

impl std::str::FromStr for DedupStrategy {
    type Err = ConfigError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "unordered" => Ok(Self::Unordered),
            "first_seen" | "first-seen" => Ok(Self::FirstSeen),
            other => Err(ConfigError::InvalidValue {
                key: "MAILSIFT_DEDUP".into(),
                message: format!("expected unordered or first_seen, got {other}"),
            }),
        }
    }
}

/// Classifier and scorer settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TriageConfig {
    /// Sender domains the classifier treats as work mail.
    pub work_domains: Vec<String>,
    /// Addresses the classifier treats as personal contacts.
    pub personal_contacts: Vec<String>,
    /// Per-address sender importance overrides (0–100).
    pub vip_senders: HashMap<String, f64>,
    /// Sender domains the scorer treats as internal.
    pub scorer_work_domains: Vec<String>,
    pub dedup: DedupStrategy,
}

impl Default for TriageConfig {
    fn default() -> Self {
        Self {
            work_domains: Vec::new(),
            personal_contacts: Vec::new(),
            vip_senders: HashMap::new(),
            scorer_work_domains: vec!["company.com".into(), "organization.org".into()],
            dedup: DedupStrategy::default(),
        }
    }
}

impl TriageConfig {
    /// Build from environment variables, falling back to defaults.
    ///
    /// - `MAILSIFT_WORK_DOMAINS`: comma-separated domains
    /// - `MAILSIFT_PERSONAL_CONTACTS`: comma-separated addresses
    /// - `MAILSIFT_VIP_SENDERS`: comma-separated `email=score` pairs
    /// - `MAILSIFT_SCORER_WORK_DOMAINS`: replaces the scorer's default domains
    /// - `MAILSIFT_DEDUP`: `unordered` or `first_seen`
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Ok(raw) = std::env::var("MAILSIFT_WORK_DOMAINS") {
            config.work_domains = split_list(&raw);
        }
        if let Ok(raw) = std::env::var("MAILSIFT_PERSONAL_CONTACTS") {
            config.personal_contacts = split_list(&raw);
        }
        if let Ok(raw) = std::env::var("MAILSIFT_SCORER_WORK_DOMAINS") {
            config.scorer_work_domains = split_list(&raw);
        }
        if let Ok(raw) = std::env::var("MAILSIFT_VIP_SENDERS") {
            config.vip_senders = parse_vip_senders(&raw)?;
        }
        if let Ok(raw) = std::env::var("MAILSIFT_DEDUP") {
            config.dedup = raw.parse()?;
        }

        config.normalized()
    }

    /// Parse a JSON document with any of `work_domains`,
    /// `personal_contacts`, `vip_senders`, `scorer_work_domains`, `dedup`.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.normalized()
    }

    /// Read a JSON config file.
    pub fn from_json_file(path: &std::path::Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    fn normalized(mut self) -> Result<Self, ConfigError> {
        for list in [
            &mut self.work_domains,
            &mut self.personal_contacts,
            &mut self.scorer_work_domains,
        ] {
            for entry in list.iter_mut() {
                *entry = entry.trim().to_lowercase();
            }
        }
        self.vip_senders = self
            .vip_senders
            .into_iter()
            .map(|(email, score)| -> Result<(String, f64), ConfigError> {
                let score = finite_score(&email, score)?;
                Ok((email.trim().to_lowercase(), score.clamp(0.0, 100.0)))
            })
            .collect::<Result<_, ConfigError>>()?;
        Ok(self)
    }
}

/// Remote digest service settings.
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    pub base_url: String,
    pub api_key: SecretString,
    /// Timeout for thread compression calls.
    pub timeout: Duration,
    /// Timeout for health probes.
    pub health_timeout: Duration,
}

impl RemoteConfig {
    pub fn new(base_url: impl Into<String>, api_key: SecretString) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            timeout: Duration::from_secs(30),
            health_timeout: Duration::from_secs(5),
        }
    }

    /// Build from environment variables.
    /// Returns `None` if `MAILSIFT_REMOTE_API_KEY` is not set (remote disabled).
    pub fn from_env() -> Option<Self> {
        let api_key = std::env::var("MAILSIFT_REMOTE_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())?;
        let base_url =
            std::env::var("MAILSIFT_REMOTE_URL").unwrap_or_else(|_| DEFAULT_REMOTE_URL.into());

        let mut config = Self::new(base_url, SecretString::from(api_key));
        if let Some(secs) = std::env::var("MAILSIFT_REMOTE_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse().ok())
        {
            config.timeout = Duration::from_secs(secs);
        }
        Some(config)
    }
}

/// HTTP server settings for the binary.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub port: u16,
    /// Synthetic emails to seed at startup (0 disables seeding).
    pub mock_count: usize,
    pub mock_seed: u64,
    /// Run the pipeline over the store on this interval (off when unset).
    pub process_interval: Option<Duration>,
    /// Directory of `.eml` files to load at startup.
    pub eml_dir: Option<std::path::PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8000,
            mock_count: 0,
            mock_seed: 42,
            process_interval: None,
            eml_dir: None,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            port: env_parse("MAILSIFT_PORT").unwrap_or(defaults.port),
            mock_count: env_parse("MAILSIFT_MOCK_COUNT").unwrap_or(defaults.mock_count),
            mock_seed: env_parse("MAILSIFT_MOCK_SEED").unwrap_or(defaults.mock_seed),
            process_interval: env_parse("MAILSIFT_PROCESS_INTERVAL_SECS")
                .filter(|secs: &u64| *secs > 0)
                .map(Duration::from_secs),
            eml_dir: std::env::var_os("MAILSIFT_EML_DIR").map(Into::into),
        }
    }
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.parse().ok())
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn parse_vip_senders(raw: &str) -> Result<HashMap<String, f64>, ConfigError> {
    split_list(raw)
        .into_iter()
        .map(|pair| {
            let (email, score) = pair.split_once('=').ok_or_else(|| ConfigError::InvalidValue {
                key: "MAILSIFT_VIP_SENDERS".into(),
                message: format!("expected email=score, got {pair}"),
            })?;
            let score: f64 = score.trim().parse().map_err(|_| ConfigError::InvalidValue {
                key: "MAILSIFT_VIP_SENDERS".into(),
                message: format!("score for {email} is not a number"),
            })?;
            Ok((email.trim().to_string(), finite_score(email, score)?))
        })
        .collect()
}

fn finite_score(email: &str, score: f64) -> Result<f64, ConfigError> {
    if score.is_finite() {
        Ok(score)
    } else {
        Err(ConfigError::InvalidValue {
            key: "MAILSIFT_VIP_SENDERS".into(),
            message: format!("score for {} must be finite, got {score}", email.trim()),
        })
    }
}
