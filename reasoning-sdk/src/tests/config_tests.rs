//! Tests for configuration management functionality
//!
//! These tests verify the providers and the typed configurations loaded
//! through them.

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::env;

    use crate::config::{
        extractor_config_from_provider, CompositeConfigProvider, ConfigProvider, ConfigProviderExt,
        EnvConfigProvider, MemoryConfigProvider, ReasoningConfig, ServiceConfig,
    };
    use crate::error::ServiceError;

    fn provider_with_key() -> MemoryConfigProvider {
        let mut provider = MemoryConfigProvider::new();
        provider.set("openai_api_key", "sk-test-key");
        provider
    }

    #[test]
    fn test_memory_config_provider() {
        let mut provider = MemoryConfigProvider::new();
        provider.set("api_key", "test_key");
        provider.set("timeout", "30");
        provider.set("retry_enabled", "true");
        provider.set("ratio", "0.25");

        assert_eq!(provider.get_string("api_key").unwrap(), "test_key");
        assert_eq!(provider.get_int("timeout").unwrap(), 30);
        assert!(provider.get_bool("retry_enabled").unwrap());
        assert_eq!(provider.get_float("ratio").unwrap(), 0.25);

        assert_eq!(provider.get_string_or("missing", "default"), "default");
        assert_eq!(provider.get_int_or("missing", 60), 60);
        assert!(!provider.get_bool_or("missing", false));

        assert!(provider.get_string("missing").is_err());
        assert!(provider.get_int("api_key").is_err());
    }

    #[test]
    fn test_env_config_provider() {
        env::set_var("JTLTEST_REASONING_API_KEY", "env_test_key");
        env::set_var("JTLTEST_REASONING_MAX_RETRIES", "5");

        let provider = EnvConfigProvider::new()
            .with_prefix("JTLTEST")
            .with_namespace("REASONING");

        assert_eq!(provider.get_string("api_key").unwrap(), "env_test_key");
        assert_eq!(provider.get_int("max-retries").unwrap(), 5);
        assert!(provider.get_string("missing").is_err());

        env::remove_var("JTLTEST_REASONING_API_KEY");
        env::remove_var("JTLTEST_REASONING_MAX_RETRIES");
    }

    #[test]
    fn test_composite_prefers_earlier_providers() {
        let mut overrides = MemoryConfigProvider::new();
        overrides.set("openai_model", "override-model");

        let mut values = HashMap::new();
        values.insert("openai_api_key".to_string(), "sk-base".to_string());
        values.insert("openai_model".to_string(), "base-model".to_string());

        let mut provider = CompositeConfigProvider::new();
        provider.add_provider(overrides);
        provider.add_provider(MemoryConfigProvider::with_values(values));

        let config = ReasoningConfig::from_provider(&provider).unwrap();
        assert_eq!(config.api_key, "sk-base");
        assert_eq!(config.model, "override-model");
    }

    #[test]
    fn test_reasoning_config_requires_api_key() {
        let result = ReasoningConfig::from_provider(&MemoryConfigProvider::new());
        assert!(matches!(result, Err(ServiceError::Configuration(_))));

        let mut blank = MemoryConfigProvider::new();
        blank.set("openai_api_key", "   ");
        assert!(ReasoningConfig::from_provider(&blank).is_err());
    }

    #[test]
    fn test_reasoning_config_overrides() {
        let mut provider = provider_with_key();
        provider.set("openai_base_url", "http://localhost:8080/v1");
        provider.set("openai_model", "local-llm");
        provider.set("openai_timeout_seconds", "10");
        provider.set("openai_max_tokens", "400");
        provider.set("openai_temperature", "0.3");
        provider.set("openai_max_retries", "1");
        provider.set("openai_initial_retry_delay_ms", "100");
        provider.set("openai_max_retry_delay_ms", "1000");

        let config = ReasoningConfig::from_provider(&provider).unwrap();
        assert_eq!(config.base_url, "http://localhost:8080/v1");
        assert_eq!(config.model, "local-llm");
        assert_eq!(config.timeout_seconds, 10);
        assert_eq!(config.max_tokens, 400);
        assert!((config.temperature - 0.3).abs() < f32::EPSILON);
        assert_eq!(config.max_retries, 1);
        assert_eq!(config.initial_retry_delay_ms, 100);
        assert_eq!(config.max_retry_delay_ms, 1000);
        assert_eq!(config.service_name(), "openai");
    }

    #[test]
    fn test_reasoning_config_rejects_bad_values() {
        let mut bad_url = provider_with_key();
        bad_url.set("openai_base_url", "not a url");
        assert!(ReasoningConfig::from_provider(&bad_url).is_err());

        let mut ftp = provider_with_key();
        ftp.set("openai_base_url", "ftp://example.com");
        assert!(ReasoningConfig::from_provider(&ftp).is_err());

        let mut negative = provider_with_key();
        negative.set("openai_max_retries", "-1");
        assert!(ReasoningConfig::from_provider(&negative).is_err());

        let mut garbled = provider_with_key();
        garbled.set("openai_timeout_seconds", "soon");
        assert!(ReasoningConfig::from_provider(&garbled).is_err());

        let mut inverted = provider_with_key();
        inverted.set("openai_initial_retry_delay_ms", "5000");
        inverted.set("openai_max_retry_delay_ms", "1000");
        assert!(ReasoningConfig::from_provider(&inverted).is_err());
    }

    #[test]
    fn test_extractor_config_defaults() {
        let config = extractor_config_from_provider(&MemoryConfigProvider::new()).unwrap();
        assert_eq!(config, correlation_engine_rs::ExtractorConfig::default());
    }

    #[test]
    fn test_extractor_config_overrides_and_validation() {
        let mut provider = MemoryConfigProvider::new();
        provider.set("correlation_dynamic_tokens", "nonce,ticket");
        provider.set("correlation_min_value_len", "4");
        provider.set("correlation_min_alnum_run", "4");
        provider.set("correlation_raw_cap", "20");
        provider.set("correlation_result_cap", "3");

        let config = extractor_config_from_provider(&provider).unwrap();
        assert_eq!(config.dynamic_tokens, vec!["nonce", "ticket"]);
        assert_eq!(config.min_value_len, 4);
        assert_eq!(config.raw_cap, 20);
        assert_eq!(config.result_cap, 3);

        let mut inverted = MemoryConfigProvider::new();
        inverted.set("correlation_raw_cap", "2");
        assert!(extractor_config_from_provider(&inverted).is_err());

        let mut empty_tokens = MemoryConfigProvider::new();
        empty_tokens.set("correlation_dynamic_tokens", " , ");
        assert!(extractor_config_from_provider(&empty_tokens).is_err());
    }
}
