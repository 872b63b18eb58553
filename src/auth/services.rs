use axum::extract::FromRef;
use lazy_static::lazy_static;
use rand::{distributions::Alphanumeric, Rng};
use regex::Regex;
use time::{Duration, OffsetDateTime};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::auth::dto::{
    AuthResponse, LoginRequest, PublicUser, RegisterRequest, UpdateProfileRequest,
};
use crate::auth::jwt::JwtKeys;
use crate::auth::password::{hash_password, verify_password};
use crate::auth::repo::{NewLocalUser, ProfileUpdate};
use crate::auth::repo_types::User;
use crate::error::{is_unique_violation, ApiError, ApiResult};
use crate::state::AppState;

pub const DISABILITY_CATEGORIES: [&str; 7] = [
    "physical",
    "cognitive",
    "invisible",
    "psychiatric",
    "sensory",
    "multiple",
    "prefer_not_to_say",
];

const RESET_TOKEN_LEN: usize = 64;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn validate_categories(categories: &[String]) -> ApiResult<()> {
    for category in categories {
        if !DISABILITY_CATEGORIES.contains(&category.as_str()) {
            return Err(ApiError::Validation(format!(
                "Unknown disability category: {category}"
            )));
        }
    }
    Ok(())
}

fn validate_password(password: &str) -> ApiResult<()> {
    if password.len() < 8 {
        return Err(ApiError::Validation("Password too short".into()));
    }
    Ok(())
}

pub(crate) fn generate_reset_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(RESET_TOKEN_LEN)
        .map(char::from)
        .collect()
}

pub async fn register(state: &AppState, mut payload: RegisterRequest) -> ApiResult<AuthResponse> {
    payload.email = normalize_email(&payload.email);
    if !is_valid_email(&payload.email) {
        return Err(ApiError::Validation("Invalid email".into()));
    }
    validate_password(&payload.password)?;
    validate_categories(&payload.disability_categories)?;

    let hash = hash_password(&payload.password)?;
    let user = User::create_local(
        &state.db,
        NewLocalUser {
            email: &payload.email,
            password_hash: &hash,
            name: &payload.name,
            user_type: payload.user_type,
            organization_name: payload.organization_name.as_deref(),
            disability_categories: &payload.disability_categories,
            bio: payload.bio.as_deref(),
            location: payload.location.as_deref(),
        },
    )
    .await
    .map_err(|e| {
        if is_unique_violation(&e) {
            warn!(email = %payload.email, "email already registered");
            ApiError::DuplicateEmail
        } else {
            e.into()
        }
    })?;

    let token = JwtKeys::from_ref(state).sign_session(user.id)?;
    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok(AuthResponse {
        token,
        user: user.into(),
    })
}

pub async fn login(state: &AppState, mut payload: LoginRequest) -> ApiResult<AuthResponse> {
    payload.email = normalize_email(&payload.email);

    let user = User::find_by_email(&state.db, &payload.email)
        .await?
        .ok_or_else(|| {
            warn!(email = %payload.email, "login unknown email");
            ApiError::InvalidCredentials
        })?;

    // A federated account has no local credential; tell the caller which
    // door to use instead of a generic rejection.
    let Some(hash) = user.local_password_hash() else {
        let provider = user.auth_provider.clone().unwrap_or_else(|| "sso".into());
        warn!(user_id = %user.id, %provider, "password login against federated account");
        return Err(ApiError::FederatedAccountOnly { provider });
    };

    if !verify_password(&payload.password, hash) {
        warn!(user_id = %user.id, "login invalid password");
        return Err(ApiError::InvalidCredentials);
    }

    let token = JwtKeys::from_ref(state).sign_session(user.id)?;
    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(AuthResponse {
        token,
        user: user.into(),
    })
}

pub async fn update_profile(
    state: &AppState,
    user_id: Uuid,
    payload: UpdateProfileRequest,
) -> ApiResult<PublicUser> {
    if let Some(categories) = &payload.disability_categories {
        validate_categories(categories)?;
    }
    let user = User::update_profile(
        &state.db,
        user_id,
        ProfileUpdate {
            name: payload.name,
            bio: payload.bio,
            location: payload.location,
            disability_categories: payload.disability_categories,
            organization_name: payload.organization_name,
            avatar_url: payload.avatar_url,
        },
    )
    .await?
    .ok_or(ApiError::Unauthenticated)?;
    Ok(user.into())
}

/// Issues a reset token if the email matches an account. The outcome is
/// indistinguishable to the caller either way, and mail dispatch is
/// best-effort.
pub async fn request_password_reset(state: &AppState, email: &str) -> ApiResult<()> {
    let email = normalize_email(email);
    let Some(user) = User::find_by_email(&state.db, &email).await? else {
        info!("password reset requested for unknown email");
        return Ok(());
    };

    let token = generate_reset_token();
    let expires_at =
        OffsetDateTime::now_utc() + Duration::minutes(state.config.reset_token_ttl_minutes);
    User::store_reset_token(&state.db, user.id, &token, expires_at).await?;

    if let Err(e) = state.mailer.send_reset_email(&user.email, &token).await {
        error!(error = %e, user_id = %user.id, "reset email dispatch failed");
    }
    Ok(())
}

pub async fn confirm_password_reset(
    state: &AppState,
    token: &str,
    new_password: &str,
) -> ApiResult<()> {
    validate_password(new_password)?;
    let hash = hash_password(new_password)?;
    let user_id = User::redeem_reset_token(&state.db, token, &hash)
        .await?
        .ok_or(ApiError::InvalidOrExpiredToken)?;
    info!(%user_id, "password reset completed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_validation() {
        assert!(is_valid_email("alice@example.com"));
        assert!(is_valid_email("a.b+c@sub.example.org"));
        assert!(!is_valid_email("not-an-email"));
        assert!(!is_valid_email("missing@tld"));
        assert!(!is_valid_email("spaces in@example.com"));
    }

    #[test]
    fn email_normalization() {
        assert_eq!(normalize_email("  Alice@Example.COM "), "alice@example.com");
    }

    #[test]
    fn category_validation() {
        assert!(validate_categories(&["sensory".into(), "multiple".into()]).is_ok());
        let err = validate_categories(&["psychic".into()]).unwrap_err();
        assert_eq!(err.error_code(), "VALIDATION");
    }

    #[test]
    fn reset_tokens_are_long_and_distinct() {
        let a = generate_reset_token();
        let b = generate_reset_token();
        assert_eq!(a.len(), RESET_TOKEN_LEN);
        assert!(a.chars().all(|c| c.is_ascii_alphanumeric()));
        assert_ne!(a, b);
    }
}
