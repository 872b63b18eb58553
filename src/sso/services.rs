use axum::extract::FromRef;
use tracing::{info, warn};

use crate::auth::jwt::JwtKeys;
use crate::auth::repo_types::User;
use crate::auth::services::normalize_email;
use crate::error::{is_unique_violation, ApiError, ApiResult};
use crate::sso::client::UserInfo;
use crate::state::AppState;

pub const PROVIDER_TAG: &str = "oidc";

pub fn callback_url(public_url: &str) -> String {
    format!("{}/api/v1/auth/sso/callback", public_url)
}

/// Verify the callback, exchange the provider response for an identity,
/// resolve it to a local account and hand back the frontend redirect
/// carrying a fresh session token.
pub async fn complete_login(state: &AppState, code: &str, sso_state: &str) -> ApiResult<String> {
    let client = state.sso.as_ref().ok_or(ApiError::SsoNotConfigured)?;
    let keys = JwtKeys::from_ref(state);

    keys.verify_sso_state(sso_state).map_err(|e| {
        warn!(error = %e, "SSO callback with bad state parameter");
        ApiError::Unauthenticated
    })?;

    let info = client
        .exchange_code(code, &callback_url(&state.config.public_url))
        .await?;
    let user = resolve_or_provision(state, info).await?;

    let token = keys.sign_session(user.id)?;
    info!(user_id = %user.id, "SSO login completed");
    Ok(format!(
        "{}/sso-callback?token={}",
        state.config.frontend_url, token
    ))
}

/// Resolution policy: look up by email, provision when absent. An existing
/// account is reused only when it is already verified or itself federated;
/// an unverified local password account cannot be claimed by a matching
/// SSO login.
async fn resolve_or_provision(state: &AppState, info: UserInfo) -> ApiResult<User> {
    let email = match info.email.as_deref() {
        Some(e) if !e.trim().is_empty() => normalize_email(e),
        _ => return Err(ApiError::MissingUserInfo),
    };

    if let Some(existing) = User::find_by_email(&state.db, &email).await? {
        return link_existing(existing);
    }

    let name = info
        .name
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| display_name_from_email(&email));

    match User::create_federated(&state.db, &email, &name, PROVIDER_TAG).await {
        Ok(user) => {
            info!(user_id = %user.id, "provisioned user from SSO");
            Ok(user)
        }
        // Lost a provisioning race; the winner's row decides linkability.
        Err(e) if is_unique_violation(&e) => {
            let existing = User::find_by_email(&state.db, &email)
                .await?
                .ok_or_else(|| ApiError::Service(anyhow::anyhow!("user vanished after conflict")))?;
            link_existing(existing)
        }
        Err(e) => Err(e.into()),
    }
}

fn link_existing(existing: User) -> ApiResult<User> {
    if existing.is_verified || existing.auth_provider.is_some() {
        Ok(existing)
    } else {
        warn!(user_id = %existing.id, "SSO login matched unverified local account");
        Err(ApiError::AccountNotLinkable)
    }
}

fn display_name_from_email(email: &str) -> String {
    email.split('@').next().unwrap_or(email).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::repo_types::UserType;
    use time::OffsetDateTime;
    use uuid::Uuid;

    fn account(password_hash: Option<&str>, auth_provider: Option<&str>, is_verified: bool) -> User {
        User {
            id: Uuid::new_v4(),
            email: "alice@example.com".into(),
            password_hash: password_hash.map(Into::into),
            name: "Alice".into(),
            user_type: UserType::Individual,
            organization_name: None,
            disability_categories: vec![],
            bio: None,
            location: None,
            avatar_url: None,
            auth_provider: auth_provider.map(Into::into),
            is_verified,
            reset_token: None,
            reset_token_expires_at: None,
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn verified_local_account_is_linkable() {
        let existing = account(Some("$argon2id$hash"), None, true);
        let id = existing.id;
        assert_eq!(link_existing(existing).unwrap().id, id);
    }

    #[test]
    fn federated_account_is_linkable() {
        let existing = account(None, Some(PROVIDER_TAG), false);
        assert!(link_existing(existing).is_ok());
    }

    #[test]
    fn unverified_local_account_is_not_claimable() {
        let existing = account(Some("$argon2id$hash"), None, false);
        let err = link_existing(existing).unwrap_err();
        assert_eq!(err.error_code(), "ACCOUNT_NOT_LINKABLE");
    }

    #[test]
    fn callback_url_under_api_prefix() {
        assert_eq!(
            callback_url("http://localhost:8080"),
            "http://localhost:8080/api/v1/auth/sso/callback"
        );
    }

    #[test]
    fn display_name_falls_back_to_local_part() {
        assert_eq!(display_name_from_email("alice@example.com"), "alice");
        assert_eq!(display_name_from_email("weird"), "weird");
    }
}
