use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};
use uuid::Uuid;

/// One prompt/response pair plus its audit metadata, as written to the audit table.
///
/// Serializes to the table's field mapping: the exchange id goes out as `chat_id`
/// and the timestamp as an RFC 3339 UTC string.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExchangeRecord {
    pub system_prompt: String,
    pub conversation_id: Uuid,
    #[serde(rename = "chat_id")]
    pub exchange_id: Uuid,
    #[serde(serialize_with = "serialize_utc")]
    pub timestamp: DateTime<Utc>,
    pub user_input: String,
    pub assistant_response: String,
}

impl ExchangeRecord {
    /// Build a record stamped with a fresh exchange id and the current UTC time.
    pub fn new(
        system_prompt: impl Into<String>,
        conversation_id: Uuid,
        user_input: impl Into<String>,
        assistant_response: impl Into<String>,
    ) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            conversation_id,
            exchange_id: Uuid::new_v4(),
            timestamp: Utc::now(),
            user_input: user_input.into(),
            assistant_response: assistant_response.into(),
        }
    }
}

fn serialize_utc<S: Serializer>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&ts.to_rfc3339_opts(SecondsFormat::Micros, true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_each_record_gets_its_own_exchange_id() {
        let conversation = Uuid::new_v4();
        let a = ExchangeRecord::new("sys", conversation, "q1", "a1");
        let b = ExchangeRecord::new("sys", conversation, "q2", "a2");

        assert_ne!(a.exchange_id, b.exchange_id);
        assert_eq!(a.conversation_id, b.conversation_id);
    }

    #[test]
    fn test_serializes_to_table_field_names() {
        let conversation = Uuid::new_v4();
        let mut record = ExchangeRecord::new("sys", conversation, "Hello", "Hi there");
        record.timestamp = Utc.with_ymd_and_hms(2026, 3, 1, 12, 30, 0).unwrap();

        let value = serde_json::to_value(&record).expect("Should serialize");

        assert_eq!(value["system_prompt"], "sys");
        assert_eq!(value["conversation_id"], conversation.to_string());
        assert_eq!(value["chat_id"], record.exchange_id.to_string());
        assert_eq!(value["timestamp"], "2026-03-01T12:30:00.000000Z");
        assert_eq!(value["user_input"], "Hello");
        assert_eq!(value["assistant_response"], "Hi there");
        assert!(value.get("exchange_id").is_none());
    }
}
