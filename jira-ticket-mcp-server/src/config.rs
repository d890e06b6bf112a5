//! Configuration management for the JIRA ticket server
//!
//! Handles loading configuration from environment variables, TOML files,
//! and provides sensible defaults for all optional settings. The loaded value
//! is immutable and shared across tool invocations; `validate` is a pure check
//! that every operation runs before touching the network.

use crate::error::{TrackerError, TrackerResult};
use crate::field_mapper::SchemaVariant;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use tracing::{debug, info, warn};

/// Main configuration structure for the JIRA ticket server
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JiraConfig {
    /// JIRA instance URL (required, JIRA_BASE_URL)
    pub base_url: String,

    /// Account email, used as the Basic auth username (required, JIRA_USER_EMAIL)
    pub user_email: String,

    /// Account name/id, used as the default search assignee (required, JIRA_USER_ID)
    pub user_id: String,

    /// API token or personal access token (required, JIRA_API_TOKEN)
    pub api_token: String,

    /// Optional JSESSIONID value sent alongside the token
    pub session_cookie: Option<String>,

    /// How the token is presented to JIRA
    pub auth_scheme: AuthScheme,

    /// Field shapes and REST version used for create/get calls
    pub schema_variant: SchemaVariant,

    /// HTTP request timeout in seconds (default: 30)
    pub request_timeout_seconds: u64,

    /// Upper bound for a single search page (default: 50, max: 200)
    pub max_search_results: u32,

    /// Fail an update when the requested status has no matching transition
    /// (default: false, the update proceeds and reports the miss)
    pub strict_transitions: bool,

    /// Custom field identifiers of the business classifiers
    pub custom_fields: CustomFieldIds,

    /// Values sent when a caller does not override them
    pub defaults: TicketDefaults,
}

/// How credentials are attached to each request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AuthScheme {
    /// `Authorization: Bearer <api_token>`
    #[default]
    Bearer,

    /// `Authorization: Basic base64(user_email:api_token)`
    Basic,
}

/// Custom field ids for the business classifier fields
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CustomFieldIds {
    pub cost_center: String,
    pub flows: String,
    pub tag_types: String,
    pub beat_types: String,
}

impl Default for CustomFieldIds {
    fn default() -> Self {
        Self {
            cost_center: "customfield_19805".to_string(),
            flows: "customfield_20408".to_string(),
            tag_types: "customfield_20411".to_string(),
            beat_types: "customfield_20409".to_string(),
        }
    }
}

/// Tool-level defaults applied when the caller leaves a parameter out
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TicketDefaults {
    pub project_id: String,
    pub issue_type: String,
    pub priority: String,
    pub cost_centers: Vec<String>,
    pub flows: String,
    pub tag_types: String,
    pub beat_types: String,
    pub search_project_key: String,
    pub search_max_results: u32,
    pub resolution: String,
}

impl Default for TicketDefaults {
    fn default() -> Self {
        Self {
            project_id: "31900".to_string(),
            issue_type: "1".to_string(),
            priority: "Medium".to_string(),
            cost_centers: vec!["EDC & Enterprise".to_string()],
            flows: "*".to_string(),
            tag_types: "*".to_string(),
            beat_types: "*".to_string(),
            search_project_key: "FCA".to_string(),
            search_max_results: 5,
            resolution: "Done".to_string(),
        }
    }
}

impl Default for JiraConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            user_email: String::new(),
            user_id: String::new(),
            api_token: String::new(),
            session_cookie: None,
            auth_scheme: AuthScheme::default(),
            schema_variant: SchemaVariant::default(),
            request_timeout_seconds: 30,
            max_search_results: 50,
            strict_transitions: false,
            custom_fields: CustomFieldIds::default(),
            defaults: TicketDefaults::default(),
        }
    }
}

impl JiraConfig {
    /// Load configuration from environment variables, TOML file, and defaults
    /// Priority: env vars > TOML file > defaults
    ///
    /// Missing credentials are not an error here: they are reported by
    /// `validate`, which every operation calls before its first remote call.
    pub fn load() -> Result<Self> {
        let mut config = if let Ok(file_config) =
            Self::load_from_file("config/jira-ticket-config.toml")
        {
            info!("Loaded configuration from TOML file");
            file_config
        } else if let Ok(file_config) = Self::load_from_file("jira-ticket-config.toml") {
            info!("Loaded configuration from TOML file in current directory");
            file_config
        } else {
            debug!("No TOML configuration file found, using defaults and environment variables");
            Self::default()
        };

        config.load_from_env()?;

        if let Err(e) = config.validate() {
            warn!("Configuration incomplete, tool calls will fail until fixed: {}", e);
        }

        Ok(config)
    }

    /// Load configuration from a TOML file
    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;

        Ok(config)
    }

    /// Load configuration from environment variables
    fn load_from_env(&mut self) -> Result<()> {
        if let Ok(url) = env::var("JIRA_BASE_URL") {
            self.base_url = url;
            debug!("Loaded JIRA_BASE_URL from environment");
        }

        if let Ok(email) = env::var("JIRA_USER_EMAIL") {
            self.user_email = email;
        }

        if let Ok(user_id) = env::var("JIRA_USER_ID") {
            self.user_id = user_id;
        }

        if let Ok(token) = env::var("JIRA_API_TOKEN") {
            self.api_token = token;
        }

        if let Ok(cookie) = env::var("JIRA_SESSION_COOKIE") {
            if !cookie.is_empty() {
                self.session_cookie = Some(cookie);
                debug!("Configured session cookie from environment");
            }
        }

        if let Ok(auth_type) = env::var("JIRA_AUTH_TYPE") {
            match auth_type.to_lowercase().as_str() {
                "bearer" | "pat" => self.auth_scheme = AuthScheme::Bearer,
                "basic" => self.auth_scheme = AuthScheme::Basic,
                _ => warn!("Unknown JIRA_AUTH_TYPE: {}, using default", auth_type),
            }
        }

        if let Ok(schema) = env::var("JIRA_API_SCHEMA") {
            match schema.parse::<SchemaVariant>() {
                Ok(variant) => {
                    self.schema_variant = variant;
                    debug!("Using {:?} field schema from environment", variant);
                }
                Err(_) => warn!("Unknown JIRA_API_SCHEMA: {}, using default", schema),
            }
        }

        if let Ok(timeout) = env::var("JIRA_REQUEST_TIMEOUT") {
            let timeout_seconds = timeout
                .parse::<u64>()
                .context("JIRA_REQUEST_TIMEOUT must be a whole number of seconds")?;
            self.request_timeout_seconds = timeout_seconds;
            debug!("Set request timeout to {} seconds from environment", timeout_seconds);
        }

        if let Ok(max_results) = env::var("JIRA_MAX_RESULTS") {
            if let Ok(max) = max_results.parse::<u32>() {
                self.max_search_results = max.min(200);
                debug!(
                    "Set max search results to {} from environment",
                    self.max_search_results
                );
            }
        }

        if let Ok(strict) = env::var("JIRA_STRICT_TRANSITIONS") {
            self.strict_transitions = matches!(strict.to_lowercase().as_str(), "1" | "true" | "yes");
        }

        Ok(())
    }

    /// Validate the configuration
    ///
    /// Pure and repeatable: reports every missing required value at once.
    pub fn validate(&self) -> TrackerResult<()> {
        let required = [
            ("JIRA_BASE_URL", &self.base_url),
            ("JIRA_USER_EMAIL", &self.user_email),
            ("JIRA_API_TOKEN", &self.api_token),
            ("JIRA_USER_ID", &self.user_id),
        ];

        let missing: Vec<&str> = required
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| *name)
            .collect();

        if !missing.is_empty() {
            return Err(TrackerError::config(format!(
                "Missing required environment variables: {}",
                missing.join(", ")
            )));
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(TrackerError::config(format!(
                "JIRA_BASE_URL must start with http:// or https://. Got: {}",
                self.base_url
            )));
        }

        if self.max_search_results == 0 || self.max_search_results > 200 {
            return Err(TrackerError::config(
                "max_search_results must be between 1 and 200",
            ));
        }

        if self.request_timeout_seconds == 0 {
            return Err(TrackerError::config(
                "request_timeout_seconds must be greater than 0",
            ));
        }

        Ok(())
    }

    /// Base URL without a trailing slash
    pub fn api_root(&self) -> &str {
        self.base_url.trim_end_matches('/')
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;

    fn complete_config() -> JiraConfig {
        JiraConfig {
            base_url: "https://jira.example.com".to_string(),
            user_email: "dev@example.com".to_string(),
            user_id: "dev".to_string(),
            api_token: "secret".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_default_config() {
        let config = JiraConfig::default();
        assert_eq!(config.request_timeout_seconds, 30);
        assert_eq!(config.max_search_results, 50);
        assert!(!config.strict_transitions);
        assert_eq!(config.auth_scheme, AuthScheme::Bearer);
        assert_eq!(config.schema_variant, SchemaVariant::Legacy);
        assert_eq!(config.custom_fields.cost_center, "customfield_19805");
        assert_eq!(config.defaults.cost_centers, vec!["EDC & Enterprise"]);
        assert_eq!(config.defaults.search_project_key, "FCA");
    }

    #[test]
    fn test_validation_lists_every_missing_variable() {
        let err = JiraConfig::default().validate().unwrap_err();
        let message = err.to_string();
        assert!(message.contains("JIRA_BASE_URL"));
        assert!(message.contains("JIRA_USER_EMAIL"));
        assert!(message.contains("JIRA_API_TOKEN"));
        assert!(message.contains("JIRA_USER_ID"));
        assert_eq!(err.category(), "configuration");
    }

    #[test]
    fn test_validation_is_repeatable() {
        let config = complete_config();
        assert!(config.validate().is_ok());
        assert!(config.validate().is_ok());

        let mut missing_token = complete_config();
        missing_token.api_token = "  ".to_string();
        let first = missing_token.validate().unwrap_err().to_string();
        let second = missing_token.validate().unwrap_err().to_string();
        assert_eq!(first, second);
        assert!(first.contains("JIRA_API_TOKEN"));
        assert!(!first.contains("JIRA_BASE_URL"));
    }

    #[test]
    fn test_validation_rejects_bad_url() {
        let mut config = complete_config();
        config.base_url = "jira.example.com".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_api_root_trims_trailing_slash() {
        let mut config = complete_config();
        config.base_url = "https://jira.example.com/".to_string();
        assert_eq!(config.api_root(), "https://jira.example.com");
    }

    #[test]
    fn test_toml_overrides_nested_sections() {
        let config: JiraConfig = toml::from_str(
            r#"
            base_url = "https://jira.example.com"
            schema_variant = "current"
            auth_scheme = "basic"

            [custom_fields]
            cost_center = "customfield_1"

            [defaults]
            search_project_key = "OPS"
            "#,
        )
        .unwrap();

        assert_eq!(config.schema_variant, SchemaVariant::Current);
        assert_eq!(config.auth_scheme, AuthScheme::Basic);
        assert_eq!(config.custom_fields.cost_center, "customfield_1");
        assert_eq!(config.custom_fields.flows, "customfield_20408");
        assert_eq!(config.defaults.search_project_key, "OPS");
        assert_eq!(config.defaults.priority, "Medium");
    }

    #[test]
    #[serial]
    fn test_env_var_loading() {
        env::set_var("JIRA_BASE_URL", "https://test.atlassian.net");
        env::set_var("JIRA_USER_EMAIL", "someone@example.com");
        env::set_var("JIRA_API_TOKEN", "test_token");
        env::set_var("JIRA_USER_ID", "someone");
        env::set_var("JIRA_SESSION_COOKIE", "ABC123");
        env::set_var("JIRA_AUTH_TYPE", "basic");
        env::set_var("JIRA_API_SCHEMA", "current");
        env::set_var("JIRA_MAX_RESULTS", "500");

        let mut config = JiraConfig::default();
        config.load_from_env().unwrap();

        assert_eq!(config.base_url, "https://test.atlassian.net");
        assert_eq!(config.user_email, "someone@example.com");
        assert_eq!(config.session_cookie.as_deref(), Some("ABC123"));
        assert_eq!(config.auth_scheme, AuthScheme::Basic);
        assert_eq!(config.schema_variant, SchemaVariant::Current);
        assert_eq!(config.max_search_results, 200);
        assert!(config.validate().is_ok());

        for var in [
            "JIRA_BASE_URL",
            "JIRA_USER_EMAIL",
            "JIRA_API_TOKEN",
            "JIRA_USER_ID",
            "JIRA_SESSION_COOKIE",
            "JIRA_AUTH_TYPE",
            "JIRA_API_SCHEMA",
            "JIRA_MAX_RESULTS",
        ] {
            env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_invalid_timeout_is_rejected() {
        env::set_var("JIRA_REQUEST_TIMEOUT", "soon");
        let mut config = JiraConfig::default();
        assert!(config.load_from_env().is_err());
        env::remove_var("JIRA_REQUEST_TIMEOUT");
    }
}
