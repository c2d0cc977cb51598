use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;

use crate::error::ScribeError;

/// Default system prompt sent to the assistant and stamped on every audit record.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a friendly and helpful assistant for CSKH-StepUpEducation. \
Your responses should be natural, engaging, and conversational. \
Use the knowledge base content to inform your answers, but present the information \
in a smooth, chatbot-like manner. If the knowledge base doesn't contain relevant \
information, politely inform the user.";

/// Default Lark Base (bitable) API root for the audit table.
pub const DEFAULT_AUDIT_BASE_URL: &str = "https://open.larksuite.com/open-apis/bitable/v1";

/// Prefix for environment overrides, e.g. `SCRIBE__AUDIT__BEARER_TOKEN`.
const ENV_PREFIX: &str = "SCRIBE";

#[derive(Debug, Deserialize, Clone, Default)]
pub struct ScribeConfig {
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub assistant: AssistantConfig,
    #[serde(default)]
    pub audit: AuditConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct ServiceConfig {
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AssistantConfig {
    pub api_url: String,
    pub api_key: String,
    pub model: String,
    pub system_prompt: String,
    pub timeout_seconds: u64,
    pub max_retries: usize,
    pub retry_delay_ms: u64,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            api_url: String::new(),
            api_key: String::new(),
            model: "gpt-4o-mini".to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            timeout_seconds: 60,
            max_retries: 2,
            retry_delay_ms: 500,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AuditConfig {
    pub base_url: String,
    pub app_token: String,
    pub table_id: String,
    pub bearer_token: String,
    pub timeout_seconds: u64,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_AUDIT_BASE_URL.to_string(),
            app_token: String::new(),
            table_id: String::new(),
            bearer_token: String::new(),
            timeout_seconds: 30,
        }
    }
}

impl AuditConfig {
    /// Records endpoint of the audit table, fixed for the lifetime of the client.
    pub fn records_url(&self) -> String {
        format!(
            "{}/apps/{}/tables/{}/records",
            self.base_url.trim_end_matches('/'),
            self.app_token,
            self.table_id
        )
    }
}

impl ScribeConfig {
    /// Load from a TOML file (optional) with `SCRIBE__SECTION__KEY` environment overrides.
    pub fn load(path: &str) -> Result<Self, ScribeError> {
        let s = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(Environment::with_prefix(ENV_PREFIX).separator("__"))
            .build()?;
        Ok(s.try_deserialize()?)
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ScribeError> {
        let s = Config::builder()
            .add_source(File::from_str(contents, FileFormat::Toml))
            .build()?;
        Ok(s.try_deserialize()?)
    }

    /// Reject configurations missing any credential or identifier needed before the first chat.
    pub fn validate(&self) -> Result<(), ScribeError> {
        let required = [
            ("assistant.api_url", &self.assistant.api_url),
            ("assistant.api_key", &self.assistant.api_key),
            ("audit.app_token", &self.audit.app_token),
            ("audit.table_id", &self.audit.table_id),
            ("audit.bearer_token", &self.audit.bearer_token),
        ];

        for (key, value) in required {
            if value.trim().is_empty() {
                return Err(ScribeError::MissingConfig(key.to_string()));
            }
        }

        Ok(())
    }
}
