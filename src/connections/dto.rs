use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::connections::repo::{ConnectionStatus, ConnectionWithNames};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionAction {
    Accept,
    Decline,
}

/// Request body for responding to a pending request.
#[derive(Debug, Deserialize)]
pub struct ConnectionActionRequest {
    pub action: ConnectionAction,
}

/// Connection row as returned to clients, enriched with both party names.
#[derive(Debug, Serialize)]
pub struct ConnectionView {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub sender_name: String,
    pub receiver_id: Uuid,
    pub receiver_name: String,
    pub status: ConnectionStatus,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<ConnectionWithNames> for ConnectionView {
    fn from(row: ConnectionWithNames) -> Self {
        Self {
            id: row.id,
            sender_id: row.sender_id,
            sender_name: row.sender_name,
            receiver_id: row.receiver_id,
            receiver_name: row.receiver_name,
            status: row.status,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_deserializes_lowercase() {
        let req: ConnectionActionRequest = serde_json::from_str(r#"{"action":"accept"}"#).unwrap();
        assert_eq!(req.action, ConnectionAction::Accept);
        let req: ConnectionActionRequest = serde_json::from_str(r#"{"action":"decline"}"#).unwrap();
        assert_eq!(req.action, ConnectionAction::Decline);
        assert!(serde_json::from_str::<ConnectionActionRequest>(r#"{"action":"block"}"#).is_err());
    }

    #[test]
    fn status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&ConnectionStatus::Pending).unwrap(),
            "\"pending\""
        );
        assert_eq!(
            serde_json::to_string(&ConnectionStatus::Accepted).unwrap(),
            "\"accepted\""
        );
    }
}
