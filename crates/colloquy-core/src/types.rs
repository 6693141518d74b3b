use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// Enums
// =============================================================================

/// The author of a message in a conversation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Inbound message from the client.
    User,
    /// Reply produced by the completion provider (or the fallback path).
    Assistant,
}

impl Role {
    /// Returns the stable string form used in storage and on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    /// Parse the stored string form back into a role.
    pub fn parse(s: &str) -> Option<Role> {
        match s {
            "user" => Some(Role::User),
            "assistant" => Some(Role::Assistant),
            _ => None,
        }
    }
}

// =============================================================================
// Entities
// =============================================================================

/// A conversation container grouping an ordered sequence of messages.
///
/// Thread ids are opaque strings: clients may supply their own id and the
/// first message to an unknown id creates the thread, or the server generates
/// a UUIDv4 string on explicit creation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Thread {
    pub id: String,
    pub title: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One turn in a conversation.
///
/// Messages are append-only; `model` and `usage` are present only on
/// assistant messages produced by a real completion (never on fallback).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub thread_id: String,
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    /// Token/cost accounting from the provider, preserved verbatim.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<serde_json::Value>,
}

// =============================================================================
// Orchestration results
// =============================================================================

/// The assistant half of a completed exchange.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AssistantReply {
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<serde_json::Value>,
}

/// Result of a send-message invocation: one persisted user/assistant pair.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExchangeResult {
    pub thread_id: String,
    pub user_message_id: Uuid,
    pub assistant_message_id: Uuid,
    pub assistant: AssistantReply,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_serde_snake_case() {
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
        assert_eq!(
            serde_json::to_string(&Role::Assistant).unwrap(),
            "\"assistant\""
        );

        let role: Role = serde_json::from_str("\"assistant\"").unwrap();
        assert_eq!(role, Role::Assistant);
    }

    #[test]
    fn test_role_as_str_parse_round_trip() {
        for role in [Role::User, Role::Assistant] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        assert_eq!(Role::parse("system"), None);
        assert_eq!(Role::parse(""), None);
    }

    #[test]
    fn test_message_optional_fields_skipped() {
        let msg = Message {
            id: Uuid::new_v4(),
            thread_id: "t1".to_string(),
            role: Role::User,
            content: "hello".to_string(),
            created_at: Utc::now(),
            model: None,
            usage: None,
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert!(!json.contains("\"model\""));
        assert!(!json.contains("\"usage\""));
    }

    #[test]
    fn test_message_usage_preserved_verbatim() {
        let usage = serde_json::json!({
            "prompt_tokens": 12,
            "completion_tokens": 34,
            "total_tokens": 46,
            "provider_extra": {"cached": true}
        });
        let msg = Message {
            id: Uuid::new_v4(),
            thread_id: "t1".to_string(),
            role: Role::Assistant,
            content: "hi".to_string(),
            created_at: Utc::now(),
            model: Some("gpt-4o-mini".to_string()),
            usage: Some(usage.clone()),
        };
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["usage"], usage);
        assert_eq!(json["model"], "gpt-4o-mini");
    }

    #[test]
    fn test_exchange_result_shape() {
        let result = ExchangeResult {
            thread_id: "T1".to_string(),
            user_message_id: Uuid::new_v4(),
            assistant_message_id: Uuid::new_v4(),
            assistant: AssistantReply {
                content: "hello back".to_string(),
                model: Some("gpt-4o-mini".to_string()),
                usage: None,
            },
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["thread_id"], "T1");
        assert_eq!(json["assistant"]["content"], "hello back");
        assert!(json["assistant"].get("usage").is_none());
    }
}
