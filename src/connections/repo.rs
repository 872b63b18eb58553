use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "connection_status", rename_all = "lowercase")]
pub enum ConnectionStatus {
    Pending,
    Accepted,
    Declined,
}

/// A directed request row that converges to an undirected relationship
/// once accepted. At most one row exists per unordered pair.
#[derive(Debug, Clone, FromRow)]
pub struct Connection {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub receiver_id: Uuid,
    pub status: ConnectionStatus,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Row joined with both party names for response views.
#[derive(Debug, Clone, FromRow)]
pub struct ConnectionWithNames {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub sender_name: String,
    pub receiver_id: Uuid,
    pub receiver_name: String,
    pub status: ConnectionStatus,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

const JOINED_COLUMNS: &str = "c.id, c.sender_id, su.name AS sender_name, \
     c.receiver_id, ru.name AS receiver_name, c.status, c.created_at, c.updated_at";

const JOINED_FROM: &str = "FROM connections c \
     JOIN users su ON su.id = c.sender_id \
     JOIN users ru ON ru.id = c.receiver_id";

impl Connection {
    /// Insert a pending request. A row already linking the pair in either
    /// direction trips the pair-unique index; callers map that violation.
    pub async fn create(db: &PgPool, sender_id: Uuid, receiver_id: Uuid) -> sqlx::Result<Connection> {
        sqlx::query_as::<_, Connection>(
            "INSERT INTO connections (id, sender_id, receiver_id, status) \
             VALUES ($1, $2, $3, 'pending') \
             RETURNING id, sender_id, receiver_id, status, created_at, updated_at",
        )
        .bind(Uuid::new_v4())
        .bind(sender_id)
        .bind(receiver_id)
        .fetch_one(db)
        .await
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> sqlx::Result<Option<Connection>> {
        sqlx::query_as::<_, Connection>(
            "SELECT id, sender_id, receiver_id, status, created_at, updated_at \
             FROM connections WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(db)
        .await
    }

    /// Apply a response iff the row is still pending and the responder is
    /// its receiver; zero rows affected is the rejection signal for races
    /// and non-participants alike.
    pub async fn respond(
        db: &PgPool,
        id: Uuid,
        receiver_id: Uuid,
        status: ConnectionStatus,
    ) -> sqlx::Result<Option<Connection>> {
        sqlx::query_as::<_, Connection>(
            "UPDATE connections SET status = $3, updated_at = now() \
             WHERE id = $1 AND receiver_id = $2 AND status = 'pending' \
             RETURNING id, sender_id, receiver_id, status, created_at, updated_at",
        )
        .bind(id)
        .bind(receiver_id)
        .bind(status)
        .fetch_optional(db)
        .await
    }

    pub async fn find_with_names(db: &PgPool, id: Uuid) -> sqlx::Result<Option<ConnectionWithNames>> {
        sqlx::query_as::<_, ConnectionWithNames>(&format!(
            "SELECT {JOINED_COLUMNS} {JOINED_FROM} WHERE c.id = $1"
        ))
        .bind(id)
        .fetch_optional(db)
        .await
    }

    /// The single row linking the unordered pair, in any status.
    pub async fn find_between(
        db: &PgPool,
        a: Uuid,
        b: Uuid,
    ) -> sqlx::Result<Option<ConnectionWithNames>> {
        sqlx::query_as::<_, ConnectionWithNames>(&format!(
            "SELECT {JOINED_COLUMNS} {JOINED_FROM} \
             WHERE (c.sender_id = $1 AND c.receiver_id = $2) \
                OR (c.sender_id = $2 AND c.receiver_id = $1)"
        ))
        .bind(a)
        .bind(b)
        .fetch_optional(db)
        .await
    }

    pub async fn list_pending_for_receiver(
        db: &PgPool,
        user_id: Uuid,
    ) -> sqlx::Result<Vec<ConnectionWithNames>> {
        sqlx::query_as::<_, ConnectionWithNames>(&format!(
            "SELECT {JOINED_COLUMNS} {JOINED_FROM} \
             WHERE c.receiver_id = $1 AND c.status = 'pending' \
             ORDER BY c.created_at DESC"
        ))
        .bind(user_id)
        .fetch_all(db)
        .await
    }

    pub async fn list_accepted_for_user(
        db: &PgPool,
        user_id: Uuid,
    ) -> sqlx::Result<Vec<ConnectionWithNames>> {
        sqlx::query_as::<_, ConnectionWithNames>(&format!(
            "SELECT {JOINED_COLUMNS} {JOINED_FROM} \
             WHERE (c.sender_id = $1 OR c.receiver_id = $1) AND c.status = 'accepted' \
             ORDER BY c.updated_at DESC"
        ))
        .bind(user_id)
        .fetch_all(db)
        .await
    }
}
