//! Audit side channel: best-effort recording of each exchange to an external table
//!
//! - **AuditSink**: where records go (`append` may fail)
//! - **TableClient**: Lark Base style records endpoint over HTTP
//! - **AuditLogger**: builds the record, ships it once, and reports the outcome.
//!   It never hands an error back to the chat path.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

use crate::config::AuditConfig;
use crate::models::ExchangeRecord;

// ============================================================================
// AuditSink trait
// ============================================================================

/// Destination for exchange records.
#[async_trait]
pub trait AuditSink: Send + Sync {
    /// Append one record. Called at most once per exchange.
    async fn append(&self, record: &ExchangeRecord) -> Result<(), AuditError>;

    /// Sink name for logging.
    fn name(&self) -> &str;
}

// ============================================================================
// Error types
// ============================================================================

#[derive(Error, Debug)]
pub enum AuditError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Table API returned {code}: {body}")]
    Status { code: u16, body: String },

    #[error("Missing credential: {0}")]
    MissingCredential(&'static str),
}

// ============================================================================
// TableClient
// ============================================================================

#[derive(Debug, Serialize)]
struct AppendRecordRequest<'a> {
    fields: &'a ExchangeRecord,
}

/// Appends exchange records to a remote table via an authenticated POST.
#[derive(Debug, Clone)]
pub struct TableClient {
    client: Client,
    records_url: String,
    bearer_token: String,
}

impl TableClient {
    pub fn new(config: &AuditConfig) -> Result<Self, AuditError> {
        if config.app_token.trim().is_empty() {
            return Err(AuditError::MissingCredential("app_token"));
        }
        if config.table_id.trim().is_empty() {
            return Err(AuditError::MissingCredential("table_id"));
        }
        if config.bearer_token.trim().is_empty() {
            return Err(AuditError::MissingCredential("bearer_token"));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            records_url: config.records_url(),
            bearer_token: config.bearer_token.clone(),
        })
    }

    pub fn records_url(&self) -> &str {
        &self.records_url
    }
}

#[async_trait]
impl AuditSink for TableClient {
    async fn append(&self, record: &ExchangeRecord) -> Result<(), AuditError> {
        // `.json()` sets `Content-Type: application/json`
        let response = self
            .client
            .post(&self.records_url)
            .bearer_auth(&self.bearer_token)
            .json(&AppendRecordRequest { fields: record })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuditError::Status {
                code: status.as_u16(),
                body,
            });
        }

        Ok(())
    }

    fn name(&self) -> &str {
        "table"
    }
}

// ============================================================================
// AuditLogger
// ============================================================================

/// Result of one logging attempt. Informational only; callers are free to drop it.
#[derive(Debug)]
pub enum LogOutcome {
    Delivered { chat_id: Uuid },
    Dropped { chat_id: Uuid, reason: AuditError },
}

impl LogOutcome {
    pub fn is_delivered(&self) -> bool {
        matches!(self, LogOutcome::Delivered { .. })
    }

    pub fn chat_id(&self) -> Uuid {
        match self {
            LogOutcome::Delivered { chat_id } | LogOutcome::Dropped { chat_id, .. } => *chat_id,
        }
    }
}

/// Formats exchanges into records and ships each one once, at-most-once.
#[derive(Clone)]
pub struct AuditLogger {
    sink: Arc<dyn AuditSink>,
    system_prompt: String,
}

impl AuditLogger {
    pub fn new(sink: Arc<dyn AuditSink>, system_prompt: impl Into<String>) -> Self {
        Self {
            sink,
            system_prompt: system_prompt.into(),
        }
    }

    /// Record one exchange. Failures are reported here and never propagated.
    pub async fn log(
        &self,
        user_input: &str,
        assistant_response: &str,
        session_id: Uuid,
    ) -> LogOutcome {
        let record = ExchangeRecord::new(
            self.system_prompt.clone(),
            session_id,
            user_input,
            assistant_response,
        );
        let chat_id = record.exchange_id;

        match self.sink.append(&record).await {
            Ok(()) => {
                tracing::info!(
                    conversation_id = %session_id,
                    chat_id = %chat_id,
                    sink = self.sink.name(),
                    "Log entry inserted successfully"
                );
                LogOutcome::Delivered { chat_id }
            }
            Err(e) => {
                tracing::warn!(
                    conversation_id = %session_id,
                    chat_id = %chat_id,
                    sink = self.sink.name(),
                    error = %e,
                    "Failed to write audit log entry, exchange not recorded"
                );
                LogOutcome::Dropped { chat_id, reason: e }
            }
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(base_url: &str) -> AuditConfig {
        AuditConfig {
            base_url: base_url.to_string(),
            app_token: "bascnApp".to_string(),
            table_id: "tblAudit".to_string(),
            bearer_token: "u-token".to_string(),
            timeout_seconds: 5,
        }
    }

    fn table_logger(mock_server: &MockServer) -> AuditLogger {
        let client = TableClient::new(&test_config(&mock_server.uri()))
            .expect("Failed to create client");
        AuditLogger::new(Arc::new(client), "sys")
    }

    #[tokio::test]
    async fn test_log_posts_fields_with_bearer_auth() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/apps/bascnApp/tables/tblAudit/records"))
            .and(header("authorization", "Bearer u-token"))
            .and(header("content-type", "application/json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "code": 0, "msg": "success"
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let session_id = Uuid::new_v4();
        let outcome = table_logger(&mock_server)
            .log("Hello", "Hi there", session_id)
            .await;
        assert!(outcome.is_delivered(), "Expected delivery, got {:?}", outcome);

        let requests = mock_server.received_requests().await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
        let fields = &body["fields"];

        assert_eq!(fields["system_prompt"], "sys");
        assert_eq!(fields["conversation_id"], session_id.to_string());
        assert_eq!(fields["chat_id"], outcome.chat_id().to_string());
        assert_eq!(fields["user_input"], "Hello");
        assert_eq!(fields["assistant_response"], "Hi there");
        let ts = fields["timestamp"].as_str().expect("timestamp should be a string");
        assert!(
            chrono::DateTime::parse_from_rfc3339(ts).is_ok(),
            "timestamp should be ISO-8601, got {}",
            ts
        );
    }

    #[tokio::test]
    async fn test_log_swallows_server_error_without_retry() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let outcome = table_logger(&mock_server)
            .log("Hello", "Hi there", Uuid::new_v4())
            .await;

        match outcome {
            LogOutcome::Dropped {
                reason: AuditError::Status { code, body },
                ..
            } => {
                assert_eq!(code, 500);
                assert_eq!(body, "boom");
            }
            other => panic!("Expected dropped Status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_log_swallows_transport_failure() {
        // Nothing listens on the discard port, so the connection is refused.
        let client = TableClient::new(&test_config("http://127.0.0.1:9")).unwrap();
        let logger = AuditLogger::new(Arc::new(client), "sys");

        let outcome = logger.log("Hello", "Hi there", Uuid::new_v4()).await;

        assert!(matches!(
            outcome,
            LogOutcome::Dropped {
                reason: AuditError::Http(_),
                ..
            }
        ));
    }

    #[test]
    fn test_client_requires_bearer_token() {
        let mut config = test_config("http://localhost");
        config.bearer_token = String::new();

        match TableClient::new(&config) {
            Err(AuditError::MissingCredential(name)) => assert_eq!(name, "bearer_token"),
            other => panic!("Expected MissingCredential, got {:?}", other),
        }
    }

    #[test]
    fn test_client_url_is_precomputed() {
        let client = TableClient::new(&test_config("https://open.example.com/bitable/v1/")).unwrap();
        assert_eq!(
            client.records_url(),
            "https://open.example.com/bitable/v1/apps/bascnApp/tables/tblAudit/records"
        );
    }
}
