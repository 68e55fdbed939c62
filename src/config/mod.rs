//! Environment-backed configuration.
//!
//! Every setting has a default. Override with `RISKMAP_*` environment variables.

pub mod error;


pub use error::ConfigError;

use std::env;
use std::net::IpAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::constants::{
    DEFAULT_ATTEMPT_TIMEOUT_SECS, DEFAULT_BACKOFF_BASE, DEFAULT_BACKOFF_UNIT_MS,
    DEFAULT_COLLECTION_NAME, DEFAULT_LLM_MODEL, DEFAULT_MATCH_THRESHOLD, DEFAULT_MAX_ATTEMPTS,
    DEFAULT_MAX_INPUT_LENGTH, DEFAULT_TOP_K,
};

/// Service configuration loaded from environment variables.
///
/// Use [`Config::from_env`] to read `RISKMAP_*` overrides on top of defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port. Default: `8080`.
    pub port: u16,

    /// IP address to bind to. Default: `127.0.0.1`.
    pub bind_addr: IpAddr,

    /// Risk-pattern catalogue (CSV). Default: `./framework_crosswalk.csv`.
    pub catalogue_path: PathBuf,

    /// Qdrant endpoint. When unset the index is held in process.
    pub qdrant_url: Option<String>,

    /// Collection name used for the Qdrant-backed index.
    pub collection_name: String,

    /// Sentence-encoder directory (`config.json`, `model.safetensors`, `tokenizer.json`).
    /// When unset the deterministic stub embedder is used.
    pub embedder_path: Option<PathBuf>,

    /// Generative model name passed to the chat client.
    pub llm_model: String,

    /// Maximum finding length in characters. Default: `10_000`.
    pub max_input_length: usize,

    /// Confident-match distance threshold. Default: `1.4`.
    pub match_threshold: f32,

    /// Neighbours requested per lookup. Default: `1`.
    pub top_k: usize,

    /// Generative attempts per classification. Default: `3`.
    pub max_attempts: u32,

    /// Exponential backoff base. Default: `2`.
    pub backoff_base: u32,

    /// Backoff time unit. Default: one second.
    pub backoff_unit: Duration,

    /// Per-attempt timeout for the generative model. Default: 120 seconds.
    pub attempt_timeout: Duration,

    /// Also ask the model for narrative items when the catalogue matched confidently.
    pub narrative_on_match: bool,
}

/// Default catalogue path used when `RISKMAP_CATALOGUE_PATH` is not set.
pub const DEFAULT_CATALOGUE_PATH: &str = "./framework_crosswalk.csv";

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 8080,
            bind_addr: IpAddr::V4(std::net::Ipv4Addr::new(127, 0, 0, 1)),
            catalogue_path: PathBuf::from(DEFAULT_CATALOGUE_PATH),
            qdrant_url: None,
            collection_name: DEFAULT_COLLECTION_NAME.to_string(),
            embedder_path: None,
            llm_model: DEFAULT_LLM_MODEL.to_string(),
            max_input_length: DEFAULT_MAX_INPUT_LENGTH,
            match_threshold: DEFAULT_MATCH_THRESHOLD,
            top_k: DEFAULT_TOP_K,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            backoff_base: DEFAULT_BACKOFF_BASE,
            backoff_unit: Duration::from_millis(DEFAULT_BACKOFF_UNIT_MS),
            attempt_timeout: Duration::from_secs(DEFAULT_ATTEMPT_TIMEOUT_SECS),
            narrative_on_match: false,
        }
    }
}

impl Config {
    const ENV_PORT: &'static str = "RISKMAP_PORT";
    const ENV_BIND_ADDR: &'static str = "RISKMAP_BIND_ADDR";
    const ENV_CATALOGUE_PATH: &'static str = "RISKMAP_CATALOGUE_PATH";
    const ENV_QDRANT_URL: &'static str = "RISKMAP_QDRANT_URL";
    const ENV_COLLECTION: &'static str = "RISKMAP_COLLECTION";
    const ENV_EMBEDDER_PATH: &'static str = "RISKMAP_EMBEDDER_PATH";
    const ENV_LLM_MODEL: &'static str = "RISKMAP_LLM_MODEL";
    const ENV_MAX_INPUT_LENGTH: &'static str = "RISKMAP_MAX_INPUT_LENGTH";
    const ENV_MATCH_THRESHOLD: &'static str = "RISKMAP_MATCH_THRESHOLD";
    const ENV_TOP_K: &'static str = "RISKMAP_TOP_K";
    const ENV_MAX_ATTEMPTS: &'static str = "RISKMAP_MAX_ATTEMPTS";
    const ENV_BACKOFF_BASE: &'static str = "RISKMAP_BACKOFF_BASE";
    const ENV_BACKOFF_UNIT_MS: &'static str = "RISKMAP_BACKOFF_UNIT_MS";
    const ENV_ATTEMPT_TIMEOUT_SECS: &'static str = "RISKMAP_ATTEMPT_TIMEOUT_SECS";
    const ENV_NARRATIVE_ON_MATCH: &'static str = "RISKMAP_NARRATIVE_ON_MATCH";

    /// Loads configuration from environment variables (falling back to defaults).
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let port = Self::parse_port_from_env(defaults.port)?;
        let bind_addr = Self::parse_bind_addr_from_env(defaults.bind_addr)?;
        let catalogue_path =
            Self::parse_path_from_env(Self::ENV_CATALOGUE_PATH, defaults.catalogue_path);
        let qdrant_url = Self::parse_optional_string_from_env(Self::ENV_QDRANT_URL);
        let collection_name =
            Self::parse_string_from_env(Self::ENV_COLLECTION, defaults.collection_name);
        let embedder_path = Self::parse_optional_path_from_env(Self::ENV_EMBEDDER_PATH);
        let llm_model = Self::parse_string_from_env(Self::ENV_LLM_MODEL, defaults.llm_model);

        let max_input_length =
            Self::parse_from_env(Self::ENV_MAX_INPUT_LENGTH, defaults.max_input_length)?;
        let match_threshold =
            Self::parse_from_env(Self::ENV_MATCH_THRESHOLD, defaults.match_threshold)?;
        let top_k = Self::parse_from_env(Self::ENV_TOP_K, defaults.top_k)?;
        let max_attempts = Self::parse_from_env(Self::ENV_MAX_ATTEMPTS, defaults.max_attempts)?;
        let backoff_base = Self::parse_from_env(Self::ENV_BACKOFF_BASE, defaults.backoff_base)?;
        let backoff_unit = Self::parse_from_env(
            Self::ENV_BACKOFF_UNIT_MS,
            defaults.backoff_unit.as_millis() as u64,
        )
        .map(Duration::from_millis)?;
        let attempt_timeout = Self::parse_from_env(
            Self::ENV_ATTEMPT_TIMEOUT_SECS,
            defaults.attempt_timeout.as_secs(),
        )
        .map(Duration::from_secs)?;
        let narrative_on_match =
            Self::parse_bool_from_env(Self::ENV_NARRATIVE_ON_MATCH, defaults.narrative_on_match);

        Ok(Self {
            port,
            bind_addr,
            catalogue_path,
            qdrant_url,
            collection_name,
            embedder_path,
            llm_model,
            max_input_length,
            match_threshold,
            top_k,
            max_attempts,
            backoff_base,
            backoff_unit,
            attempt_timeout,
            narrative_on_match,
        })
    }

    /// Validates paths and numeric invariants (does not touch the network).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.catalogue_path.exists() {
            return Err(ConfigError::PathNotFound {
                path: self.catalogue_path.clone(),
            });
        }
        if !self.catalogue_path.is_file() {
            return Err(ConfigError::NotAFile {
                path: self.catalogue_path.clone(),
            });
        }

        if let Some(ref path) = self.embedder_path {
            if !path.exists() {
                return Err(ConfigError::PathNotFound { path: path.clone() });
            }
            if !path.is_dir() {
                return Err(ConfigError::NotADirectory { path: path.clone() });
            }
        }

        self.validate_tunables()
    }

    /// Validates the pipeline tunables only.
    pub fn validate_tunables(&self) -> Result<(), ConfigError> {
        if self.max_input_length == 0 {
            return Err(Self::invalid(
                Self::ENV_MAX_INPUT_LENGTH,
                self.max_input_length,
                "must be > 0",
            ));
        }
        if !self.match_threshold.is_finite() || self.match_threshold < 0.0 {
            return Err(Self::invalid(
                Self::ENV_MATCH_THRESHOLD,
                self.match_threshold,
                "must be a finite, non-negative distance",
            ));
        }
        if self.top_k == 0 {
            return Err(Self::invalid(Self::ENV_TOP_K, self.top_k, "must be > 0"));
        }
        if self.max_attempts == 0 {
            return Err(Self::invalid(
                Self::ENV_MAX_ATTEMPTS,
                self.max_attempts,
                "must be > 0",
            ));
        }
        if self.backoff_base == 0 {
            return Err(Self::invalid(
                Self::ENV_BACKOFF_BASE,
                self.backoff_base,
                "must be > 0",
            ));
        }
        if self.attempt_timeout.is_zero() {
            return Err(Self::invalid(
                Self::ENV_ATTEMPT_TIMEOUT_SECS,
                self.attempt_timeout.as_secs(),
                "must be > 0",
            ));
        }
        Ok(())
    }

    /// Returns `"{bind_addr}:{port}"` (useful for logging/binding).
    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.bind_addr, self.port)
    }

    fn invalid(name: &'static str, value: impl ToString, reason: &str) -> ConfigError {
        ConfigError::InvalidValue {
            name,
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }

    fn parse_port_from_env(default: u16) -> Result<u16, ConfigError> {
        match env::var(Self::ENV_PORT) {
            Ok(value) => {
                let port: u16 = value.parse().map_err(|e| ConfigError::PortParseError {
                    value: value.clone(),
                    source: e,
                })?;

                if port == 0 {
                    return Err(ConfigError::InvalidPort { value });
                }

                Ok(port)
            }
            Err(_) => Ok(default),
        }
    }

    fn parse_bind_addr_from_env(default: IpAddr) -> Result<IpAddr, ConfigError> {
        match env::var(Self::ENV_BIND_ADDR) {
            Ok(value) => value
                .parse()
                .map_err(|e| ConfigError::InvalidBindAddr { value, source: e }),
            Err(_) => Ok(default),
        }
    }

    fn parse_path_from_env(var_name: &str, default: PathBuf) -> PathBuf {
        env::var(var_name).map(PathBuf::from).unwrap_or(default)
    }

    fn parse_optional_path_from_env(var_name: &str) -> Option<PathBuf> {
        Self::parse_optional_string_from_env(var_name).map(PathBuf::from)
    }

    fn parse_optional_string_from_env(var_name: &str) -> Option<String> {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn parse_string_from_env(var_name: &str, default: String) -> String {
        env::var(var_name).unwrap_or(default)
    }

    fn parse_from_env<T>(var_name: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        match env::var(var_name) {
            Ok(value) => value
                .trim()
                .parse()
                .map_err(|e: T::Err| ConfigError::InvalidValue {
                    name: var_name,
                    value: value.clone(),
                    reason: e.to_string(),
                }),
            Err(_) => Ok(default),
        }
    }

    fn parse_bool_from_env(var_name: &str, default: bool) -> bool {
        env::var(var_name)
            .map(|s| {
                let s = s.trim().to_ascii_lowercase();
                s == "true" || s == "1" || s == "yes"
            })
            .unwrap_or(default)
    }
}
