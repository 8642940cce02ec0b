//! Configuration management for the reasoning collaborator
//!
//! Values are read through a `ConfigProvider`, usually the environment, and
//! assembled into `ReasoningConfig` for the chat-completions client and
//! `ExtractorConfig` for candidate extraction.

use std::collections::HashMap;
use std::env;
use std::fmt::Debug;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use correlation_engine_rs::heuristics::DEFAULT_DYNAMIC_TOKENS;
use correlation_engine_rs::ExtractorConfig;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Result, ServiceError};

/// Source of raw string settings
pub trait ConfigProvider: Send + Sync {
    /// Raw value for `key`, or a configuration error when it is not set
    fn get_string(&self, key: &str) -> Result<String>;
}

fn missing(key: &str) -> ServiceError {
    ServiceError::configuration(format!("Missing configuration value: {}", key))
}

/// Typed access on top of any `ConfigProvider`
pub trait ConfigProviderExt: ConfigProvider {
    /// Parse the trimmed value with `FromStr`
    fn get_parsed<T>(&self, key: &str) -> Result<T>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        let raw = self.get_string(key)?;
        raw.trim().parse::<T>().map_err(|e| {
            ServiceError::configuration(format!("Cannot parse {} = {:?}: {}", key, raw, e))
        })
    }

    fn get_int(&self, key: &str) -> Result<i64> {
        self.get_parsed(key)
    }

    fn get_float(&self, key: &str) -> Result<f64> {
        self.get_parsed(key)
    }

    /// Accepts true/false, yes/no, on/off and 1/0
    fn get_bool(&self, key: &str) -> Result<bool> {
        let raw = self.get_string(key)?;
        let normalized = raw.trim().to_ascii_lowercase();
        if ["true", "yes", "on", "1"].contains(&normalized.as_str()) {
            Ok(true)
        } else if ["false", "no", "off", "0"].contains(&normalized.as_str()) {
            Ok(false)
        } else {
            Err(ServiceError::configuration(format!("Cannot parse {} = {:?} as a boolean", key, raw)))
        }
    }

    /// Comma-separated values, trimmed, with empty items dropped
    fn get_list(&self, key: &str) -> Result<Vec<String>> {
        let raw = self.get_string(key)?;
        Ok(raw
            .split(',')
            .filter_map(|item| {
                let item = item.trim();
                (!item.is_empty()).then(|| item.to_string())
            })
            .collect())
    }

    fn get_string_or(&self, key: &str, default: &str) -> String {
        self.get_string(key).unwrap_or_else(|_| default.to_string())
    }

    fn get_int_or(&self, key: &str, default: i64) -> i64 {
        self.get_int(key).unwrap_or(default)
    }

    fn get_float_or(&self, key: &str, default: f64) -> f64 {
        self.get_float(key).unwrap_or(default)
    }

    fn get_bool_or(&self, key: &str, default: bool) -> bool {
        self.get_bool(key).unwrap_or(default)
    }
}

impl<T: ConfigProvider + ?Sized> ConfigProviderExt for T {}

/// Reads settings from environment variables
///
/// `openai_api_key` becomes `OPENAI_API_KEY`, or `PREFIX_NAMESPACE_OPENAI_API_KEY`
/// when a prefix and namespace are set.
#[derive(Debug, Clone, Default)]
pub struct EnvConfigProvider {
    prefix: Option<String>,
    namespace: Option<String>,
}

impl EnvConfigProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Environment variable name for a setting key
    pub fn format_key(&self, key: &str) -> String {
        let name: String = key
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
            .collect();

        self.prefix
            .iter()
            .chain(self.namespace.iter())
            .map(String::as_str)
            .chain(std::iter::once(name.as_str()))
            .collect::<Vec<_>>()
            .join("_")
    }
}

impl ConfigProvider for EnvConfigProvider {
    fn get_string(&self, key: &str) -> Result<String> {
        let name = self.format_key(key);
        match env::var(&name) {
            Ok(value) => Ok(value),
            Err(env::VarError::NotPresent) => Err(missing(&name)),
            Err(env::VarError::NotUnicode(_)) => Err(ServiceError::configuration(format!(
                "{} is not valid unicode",
                name
            ))),
        }
    }
}

/// Fixed in-memory settings, used by tests and embedders
#[derive(Debug, Clone, Default)]
pub struct MemoryConfigProvider {
    values: HashMap<String, String>,
}

impl MemoryConfigProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_values(values: HashMap<String, String>) -> Self {
        Self { values }
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl ToString) {
        self.values.insert(key.into(), value.to_string());
    }
}

impl ConfigProvider for MemoryConfigProvider {
    fn get_string(&self, key: &str) -> Result<String> {
        self.values.get(key).cloned().ok_or_else(|| missing(key))
    }
}

/// Chain of providers; the first one that has a key wins
#[derive(Default)]
pub struct CompositeConfigProvider {
    providers: Vec<Box<dyn ConfigProvider>>,
}

impl CompositeConfigProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a provider with lower precedence than those already added
    pub fn add_provider<P: ConfigProvider + 'static>(&mut self, provider: P) {
        self.providers.push(Box::new(provider));
    }
}

impl ConfigProvider for CompositeConfigProvider {
    fn get_string(&self, key: &str) -> Result<String> {
        self.providers
            .iter()
            .find_map(|provider| provider.get_string(key).ok())
            .ok_or_else(|| missing(key))
    }
}

/// Process-wide provider over unprefixed environment variables
pub static DEFAULT_PROVIDER: Lazy<Arc<EnvConfigProvider>> = Lazy::new(|| Arc::new(EnvConfigProvider::new()));

/// Validated settings for one external service
pub trait ServiceConfig: Debug + Send + Sync {
    fn validate(&self) -> Result<()>;

    fn service_name(&self) -> &str;
}

/// Default chat-completions endpoint root
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default model
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Configuration for the chat-completions collaborator
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReasoningConfig {
    /// API key sent as a bearer token
    pub api_key: String,

    /// Base URL (can be changed for proxies or compatible servers)
    pub base_url: String,

    /// Model name
    pub model: String,

    /// Per-request timeout in seconds
    pub timeout_seconds: u64,

    /// Completion token limit
    pub max_tokens: u32,

    /// Sampling temperature
    pub temperature: f32,

    /// Retries after the first attempt for transient errors
    pub max_retries: u32,

    /// First retry delay in milliseconds
    pub initial_retry_delay_ms: u64,

    /// Upper bound on a single retry delay in milliseconds
    pub max_retry_delay_ms: u64,
}

impl Default for ReasoningConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout_seconds: 30,
            max_tokens: 800,
            temperature: 0.0,
            max_retries: 3,
            initial_retry_delay_ms: 2000,
            max_retry_delay_ms: 30_000,
        }
    }
}

impl ReasoningConfig {
    /// Load configuration from a config provider
    pub fn from_provider<P: ConfigProvider + ?Sized>(provider: &P) -> Result<Self> {
        let config = Self::load_unvalidated(provider)?;
        config.validate()?;
        Ok(config)
    }

    /// Read every key from a provider without validating the result
    ///
    /// Absent keys take their defaults, including an empty API key. Present
    /// values that do not parse are errors.
    pub fn load_unvalidated<P: ConfigProvider + ?Sized>(provider: &P) -> Result<Self> {
        let defaults = Self::default();

        Ok(Self {
            api_key: provider.get_string_or("openai_api_key", ""),
            base_url: provider.get_string_or("openai_base_url", DEFAULT_BASE_URL),
            model: provider.get_string_or("openai_model", DEFAULT_MODEL),
            timeout_seconds: non_negative(provider, "openai_timeout_seconds", defaults.timeout_seconds)?,
            max_tokens: non_negative_u32(provider, "openai_max_tokens", defaults.max_tokens)?,
            temperature: match provider.get_string("openai_temperature") {
                Ok(_) => provider.get_float("openai_temperature")? as f32,
                Err(_) => defaults.temperature,
            },
            max_retries: non_negative_u32(provider, "openai_max_retries", defaults.max_retries)?,
            initial_retry_delay_ms: non_negative(
                provider,
                "openai_initial_retry_delay_ms",
                defaults.initial_retry_delay_ms,
            )?,
            max_retry_delay_ms: non_negative(provider, "openai_max_retry_delay_ms", defaults.max_retry_delay_ms)?,
        })
    }

    /// Load configuration from the default provider
    pub fn from_env() -> Result<Self> {
        Self::from_provider(&**DEFAULT_PROVIDER)
    }

    /// Per-request timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    /// Full URL of the chat-completions endpoint
    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }
}

impl ServiceConfig for ReasoningConfig {
    fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(ServiceError::configuration("OpenAI API key is required"));
        }

        let url = Url::parse(&self.base_url)
            .map_err(|e| ServiceError::configuration(format!("Invalid base URL {}: {}", self.base_url, e)))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ServiceError::configuration(format!(
                "Base URL must use http or https: {}",
                self.base_url
            )));
        }

        if self.model.trim().is_empty() {
            return Err(ServiceError::configuration("Model name is required"));
        }

        if self.timeout_seconds == 0 {
            return Err(ServiceError::configuration("Timeout must be greater than zero"));
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ServiceError::configuration(format!(
                "Temperature must be between 0 and 2, got {}",
                self.temperature
            )));
        }

        if self.initial_retry_delay_ms > self.max_retry_delay_ms {
            return Err(ServiceError::configuration(
                "Initial retry delay must not exceed the maximum retry delay",
            ));
        }

        Ok(())
    }

    fn service_name(&self) -> &str {
        "openai"
    }
}

/// Load the candidate extractor configuration from a provider
///
/// Missing keys fall back to the extractor defaults; present but invalid
/// values are errors.
pub fn extractor_config_from_provider<P: ConfigProvider + ?Sized>(provider: &P) -> Result<ExtractorConfig> {
    let defaults = ExtractorConfig::default();

    let dynamic_tokens = match provider.get_list("correlation_dynamic_tokens") {
        Ok(tokens) => tokens,
        Err(_) => DEFAULT_DYNAMIC_TOKENS.iter().map(|t| t.to_string()).collect(),
    };

    let config = ExtractorConfig {
        dynamic_tokens,
        min_value_len: non_negative(provider, "correlation_min_value_len", defaults.min_value_len as u64)? as usize,
        min_alnum_run: non_negative(provider, "correlation_min_alnum_run", defaults.min_alnum_run as u64)? as usize,
        raw_cap: non_negative(provider, "correlation_raw_cap", defaults.raw_cap as u64)? as usize,
        result_cap: non_negative(provider, "correlation_result_cap", defaults.result_cap as u64)? as usize,
    };

    config
        .validate()
        .map_err(|e| ServiceError::configuration(e.to_string()))?;
    Ok(config)
}

// Absent keys take the default; present keys must parse as a non-negative integer.
fn non_negative<P: ConfigProvider + ?Sized>(provider: &P, key: &str, default: u64) -> Result<u64> {
    if provider.get_string(key).is_err() {
        return Ok(default);
    }

    let value = provider.get_int(key)?;
    u64::try_from(value)
        .map_err(|_| ServiceError::configuration(format!("Value for key {} must not be negative: {}", key, value)))
}

fn non_negative_u32<P: ConfigProvider + ?Sized>(provider: &P, key: &str, default: u32) -> Result<u32> {
    let value = non_negative(provider, key, default as u64)?;
    u32::try_from(value)
        .map_err(|_| ServiceError::configuration(format!("Value for key {} is too large: {}", key, value)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_env_key_names() {
        assert_eq!(EnvConfigProvider::new().format_key("openai_api_key"), "OPENAI_API_KEY");
        assert_eq!(EnvConfigProvider::new().format_key("correlation.raw-cap"), "CORRELATION_RAW_CAP");

        let scoped = EnvConfigProvider::new().with_prefix("JTL").with_namespace("CI");
        assert_eq!(scoped.format_key("openai_model"), "JTL_CI_OPENAI_MODEL");
        assert_eq!(EnvConfigProvider::new().with_namespace("CI").format_key("x"), "CI_X");
    }

    #[test]
    fn test_typed_getters() {
        let mut provider = MemoryConfigProvider::new();
        provider.set("cap", " 12 ");
        provider.set("ratio", "0.5");
        provider.set("flag", "Off");
        provider.set("tokens", "nonce, ,ticket,");

        assert_eq!(provider.get_parsed::<usize>("cap").unwrap(), 12);
        assert_eq!(provider.get_float("ratio").unwrap(), 0.5);
        assert!(!provider.get_bool("flag").unwrap());
        assert_eq!(provider.get_list("tokens").unwrap(), vec!["nonce", "ticket"]);
        assert!(provider.get_bool("ratio").is_err());
        assert!(matches!(provider.get_int("missing"), Err(ServiceError::Configuration(_))));
    }

    #[test]
    fn test_non_negative_defaults_only_when_absent() {
        let mut provider = MemoryConfigProvider::new();
        assert_eq!(non_negative(&provider, "n", 7).unwrap(), 7);

        provider.set("n", "3");
        assert_eq!(non_negative(&provider, "n", 7).unwrap(), 3);

        provider.set("n", "-3");
        assert!(non_negative(&provider, "n", 7).is_err());
    }

    #[test]
    fn test_u32_settings_reject_overflow() {
        let mut provider = MemoryConfigProvider::new();
        provider.set("openai_api_key", "sk-test");
        provider.set("openai_max_retries", "4294967296");
        assert!(matches!(
            ReasoningConfig::from_provider(&provider),
            Err(ServiceError::Configuration(_))
        ));

        provider.set("openai_max_retries", "4294967295");
        assert_eq!(ReasoningConfig::from_provider(&provider).unwrap().max_retries, u32::MAX);
    }

    #[test]
    fn test_unvalidated_load_keeps_values_without_api_key() {
        let mut provider = MemoryConfigProvider::new();
        provider.set("openai_base_url", "http://proxy.internal:8080/v1");
        provider.set("openai_model", "local-llm");

        let config = ReasoningConfig::load_unvalidated(&provider).unwrap();
        assert!(config.api_key.is_empty());
        assert_eq!(config.base_url, "http://proxy.internal:8080/v1");
        assert_eq!(config.model, "local-llm");
        assert!(ReasoningConfig::from_provider(&provider).is_err());

        provider.set("openai_temperature", "warm");
        assert!(ReasoningConfig::load_unvalidated(&provider).is_err());
    }
}
