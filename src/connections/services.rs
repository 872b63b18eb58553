use tracing::{info, warn};
use uuid::Uuid;

use crate::auth::repo_types::User;
use crate::connections::dto::{ConnectionAction, ConnectionView};
use crate::connections::repo::{Connection, ConnectionStatus};
use crate::error::{is_unique_violation, ApiError, ApiResult};
use crate::state::AppState;

/// Role of the acting user relative to a connection row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorRole {
    Receiver,
    Other,
}

/// The whole state machine: only the receiver of a pending request may
/// resolve it, and both outcomes are terminal. Everything else is a
/// rejection, reported as not-found so a non-participant learns nothing.
pub fn transition(
    current: ConnectionStatus,
    actor: ActorRole,
    action: ConnectionAction,
) -> Option<ConnectionStatus> {
    match (current, actor) {
        (ConnectionStatus::Pending, ActorRole::Receiver) => Some(match action {
            ConnectionAction::Accept => ConnectionStatus::Accepted,
            ConnectionAction::Decline => ConnectionStatus::Declined,
        }),
        _ => None,
    }
}

pub async fn request(
    state: &AppState,
    sender_id: Uuid,
    receiver_id: Uuid,
) -> ApiResult<ConnectionView> {
    if sender_id == receiver_id {
        return Err(ApiError::SelfConnection);
    }
    if User::find_by_id(&state.db, receiver_id).await?.is_none() {
        return Err(ApiError::NotFound);
    }

    let row = Connection::create(&state.db, sender_id, receiver_id)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                warn!(%sender_id, %receiver_id, "connection already exists for pair");
                ApiError::AlreadyExists
            } else {
                e.into()
            }
        })?;

    info!(connection_id = %row.id, %sender_id, %receiver_id, "connection requested");
    named_view(state, row.id).await
}

pub async fn respond(
    state: &AppState,
    request_id: Uuid,
    responder_id: Uuid,
    action: ConnectionAction,
) -> ApiResult<ConnectionView> {
    let row = Connection::find_by_id(&state.db, request_id)
        .await?
        .ok_or(ApiError::NotFound)?;

    let role = if row.receiver_id == responder_id {
        ActorRole::Receiver
    } else {
        ActorRole::Other
    };
    let next = transition(row.status, role, action).ok_or(ApiError::NotFound)?;

    // The update re-checks receiver and pending status so a concurrent
    // response loses here rather than double-applying.
    let updated = Connection::respond(&state.db, request_id, responder_id, next)
        .await?
        .ok_or(ApiError::NotFound)?;

    info!(connection_id = %updated.id, status = ?updated.status, "connection request resolved");
    named_view(state, updated.id).await
}

pub async fn list_pending(state: &AppState, user_id: Uuid) -> ApiResult<Vec<ConnectionView>> {
    let rows = Connection::list_pending_for_receiver(&state.db, user_id).await?;
    Ok(rows.into_iter().map(Into::into).collect())
}

pub async fn list_accepted(state: &AppState, user_id: Uuid) -> ApiResult<Vec<ConnectionView>> {
    let rows = Connection::list_accepted_for_user(&state.db, user_id).await?;
    Ok(rows.into_iter().map(Into::into).collect())
}

pub async fn status_between(
    state: &AppState,
    a: Uuid,
    b: Uuid,
) -> ApiResult<Option<ConnectionView>> {
    let row = Connection::find_between(&state.db, a, b).await?;
    Ok(row.map(Into::into))
}

async fn named_view(state: &AppState, id: Uuid) -> ApiResult<ConnectionView> {
    Connection::find_with_names(&state.db, id)
        .await?
        .map(Into::into)
        .ok_or(ApiError::NotFound)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn receiver_resolves_pending() {
        assert_eq!(
            transition(
                ConnectionStatus::Pending,
                ActorRole::Receiver,
                ConnectionAction::Accept
            ),
            Some(ConnectionStatus::Accepted)
        );
        assert_eq!(
            transition(
                ConnectionStatus::Pending,
                ActorRole::Receiver,
                ConnectionAction::Decline
            ),
            Some(ConnectionStatus::Declined)
        );
    }

    #[test]
    fn sender_cannot_resolve_own_request() {
        assert_eq!(
            transition(
                ConnectionStatus::Pending,
                ActorRole::Other,
                ConnectionAction::Accept
            ),
            None
        );
    }

    #[test]
    fn terminal_states_are_final() {
        for status in [ConnectionStatus::Accepted, ConnectionStatus::Declined] {
            for action in [ConnectionAction::Accept, ConnectionAction::Decline] {
                assert_eq!(transition(status, ActorRole::Receiver, action), None);
                assert_eq!(transition(status, ActorRole::Other, action), None);
            }
        }
    }
}
