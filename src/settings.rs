//! Typed settings for the logging pipeline, with environment-variable
//! overrides for the fault-analysis service endpoint.
//!
//! File-based configuration loading, CLI parsing, and dependency-injection
//! wiring are out of scope (spec.md §1); this module only defines the typed
//! struct and the override layering a host application composes around it.

use std::{path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};

use crate::event::LogLevel;

/// Root settings for a [`crate::logger::LoggerFactory`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Minimum level a record must meet to be constructed and dispatched.
    pub min_log_level: LogLevel,
    /// Master switch; when false, `Logger::is_enabled` is always false.
    pub logging_enabled: bool,
    /// Gates whether exception-bearing records trigger fault analysis.
    pub fault_service_enabled: bool,
    /// Drain-loop pacing for queued publishers when idle.
    pub polling_delay: Duration,

    /// Deployment-identity attributes injected into every record.
    pub application_id: String,
    pub component_id: String,
    pub deployment_id: String,
    pub environment: String,
    pub version: String,

    /// Serializer options.
    pub write_indented: bool,
    pub default_ignore_condition: IgnoreCondition,
    pub unsafe_relaxed_json_escaping: bool,

    /// File-tier cache root. `None` disables the warm tier.
    pub cache_location: Option<PathBuf>,
    pub enable_caching: bool,

    /// Composed resilience-pipeline configuration for outbound chat calls.
    pub resilient_http_policy: ResilientHttpSettings,

    /// Fault-analysis chat-completion endpoint configuration.
    pub chat: ChatSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            min_log_level: LogLevel::Information,
            logging_enabled: true,
            fault_service_enabled: false,
            polling_delay: Duration::from_millis(100),
            application_id: String::new(),
            component_id: String::new(),
            deployment_id: String::new(),
            environment: String::new(),
            version: String::new(),
            write_indented: false,
            default_ignore_condition: IgnoreCondition::WhenWritingNullOrEmpty,
            unsafe_relaxed_json_escaping: false,
            cache_location: None,
            enable_caching: true,
            resilient_http_policy: ResilientHttpSettings::default(),
            chat: ChatSettings::default(),
        }
    }
}

impl Settings {
    /// Apply the six environment variables spec.md §6 names, overriding any
    /// values already present. Missing variables leave the current value
    /// untouched.
    pub fn apply_env_overrides(mut self) -> Self {
        if let Ok(v) = std::env::var("OPENAI_API_KEY") {
            self.chat.api_key = v;
        }
        if let Ok(v) = std::env::var("OPENAI_API_BASE_ADDRESS") {
            self.chat.base_address = v;
        }
        if let Ok(v) = std::env::var("OPENAI_API_ENDPOINT") {
            self.chat.endpoint = v;
        }
        if let Ok(v) = std::env::var("OPENAI_MODEL") {
            self.chat.model = v;
        }
        // RCASERVICE_* analogously override the same fields when the fault
        // analyzer is fronted by a dedicated RCA gateway rather than the
        // raw chat-completion endpoint.
        if let Ok(v) = std::env::var("RCASERVICE_API_KEY") {
            self.chat.api_key = v;
        }
        if let Ok(v) = std::env::var("RCASERVICE_API_URL") {
            self.chat.base_address = v;
        }
        self
    }
}

/// Null/empty omission policy for the serializer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IgnoreCondition {
    Never,
    WhenWritingNull,
    WhenWritingNullOrEmpty,
}

/// Chat-completion endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatSettings {
    pub api_key: String,
    pub base_address: String,
    pub endpoint: String,
    pub model: String,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_address: "https://api.openai.com".to_string(),
            endpoint: "/v1/chat/completions".to_string(),
            model: "gpt-4o-mini".to_string(),
        }
    }
}

/// Nested resilience-pipeline configuration, one sub-struct per policy.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ResilientHttpSettings {
    pub timeout: TimeoutSettings,
    pub retry: RetrySettings,
    pub circuit_breaker: CircuitBreakerSettings,
    pub bulkhead: BulkheadSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutSettings {
    pub enabled: bool,
    pub duration: Duration,
}

impl Default for TimeoutSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            duration: Duration::from_secs(60),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub enabled: bool,
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Fractional jitter, 0.0–1.0.
    pub jitter: f64,
    pub retryable_status_codes: Vec<u16>,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            enabled: true,
            max_attempts: 3,
            base_delay: Duration::from_millis(200),
            max_delay: Duration::from_secs(10),
            jitter: 0.2,
            retryable_status_codes: vec![408, 429, 500, 502, 503, 504],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CircuitBreakerSettings {
    pub enabled: bool,
    pub consecutive_failure_threshold: u32,
    pub open_cooling_period: Duration,
}

impl Default for CircuitBreakerSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            consecutive_failure_threshold: 5,
            open_cooling_period: Duration::from_secs(30),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BulkheadSettings {
    pub enabled: bool,
    pub max_concurrent: usize,
    pub max_queued: usize,
}

impl Default for BulkheadSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            max_concurrent: 10,
            max_queued: 20,
        }
    }
}
