use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::repo_types::{User, UserType};

/// Request body for user registration.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    #[serde(default)]
    pub user_type: UserType,
    pub organization_name: Option<String>,
    #[serde(default)]
    pub disability_categories: Vec<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Request body for the enumeration-safe reset request.
#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

/// Request body for redeeming a reset token.
#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub new_password: String,
}

/// Partial profile update; absent fields are left unchanged.
#[derive(Debug, Deserialize, Default)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub disability_categories: Option<Vec<String>>,
    pub organization_name: Option<String>,
    pub avatar_url: Option<String>,
}

/// Response returned after register, login or SSO completion.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: PublicUser,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}

/// Public part of the user returned to clients. Never carries the password
/// hash or the reset-token fields.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub user_type: UserType,
    pub organization_name: Option<String>,
    pub disability_categories: Vec<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub avatar_url: Option<String>,
    pub auth_provider: Option<String>,
    pub is_verified: bool,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            user_type: user.user_type,
            organization_name: user.organization_name,
            disability_categories: user.disability_categories,
            bio: user.bio,
            location: user.location,
            avatar_url: user.avatar_url,
            auth_provider: user.auth_provider,
            is_verified: user.is_verified,
            created_at: user.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: Uuid::new_v4(),
            email: "alice@example.com".into(),
            password_hash: Some("$argon2id$v=19$secret-digest".into()),
            name: "Alice".into(),
            user_type: UserType::Individual,
            organization_name: None,
            disability_categories: vec!["sensory".into()],
            bio: None,
            location: Some("Berlin".into()),
            avatar_url: None,
            auth_provider: None,
            is_verified: false,
            reset_token: Some("super-secret-reset-token".into()),
            reset_token_expires_at: Some(OffsetDateTime::now_utc()),
            created_at: OffsetDateTime::now_utc(),
        }
    }

    #[test]
    fn public_view_never_exposes_secrets() {
        let json = serde_json::to_string(&PublicUser::from(sample_user())).unwrap();
        assert!(json.contains("alice@example.com"));
        assert!(!json.contains("secret-digest"));
        assert!(!json.contains("super-secret-reset-token"));
        assert!(!json.contains("password"));
        assert!(!json.contains("reset_token"));
    }

    #[test]
    fn user_type_defaults_to_individual() {
        let req: RegisterRequest = serde_json::from_str(
            r#"{"email":"a@b.co","password":"longenough","name":"A"}"#,
        )
        .unwrap();
        assert_eq!(req.user_type, UserType::Individual);
        assert!(req.disability_categories.is_empty());
    }

    #[test]
    fn user_type_deserializes_snake_case() {
        let req: RegisterRequest = serde_json::from_str(
            r#"{"email":"a@b.co","password":"longenough","name":"A","user_type":"service_provider"}"#,
        )
        .unwrap();
        assert_eq!(req.user_type, UserType::ServiceProvider);
    }
}
