use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Flat account-type tag. Authorization beyond this tag is out of scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "user_type", rename_all = "snake_case")]
pub enum UserType {
    Individual,
    ServiceProvider,
    Ngo,
    Caregiver,
}

impl Default for UserType {
    fn default() -> Self {
        Self::Individual
    }
}

/// User record in the database. Deliberately not serializable; the wire
/// view is `PublicUser`, which carries neither the password hash nor the
/// reset-token fields.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub password_hash: Option<String>, // absent for SSO-only accounts
    pub name: String,
    pub user_type: UserType,
    pub organization_name: Option<String>,
    pub disability_categories: Vec<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub avatar_url: Option<String>,
    pub auth_provider: Option<String>, // federation tag, e.g. "oidc"
    pub is_verified: bool,
    pub reset_token: Option<String>,
    pub reset_token_expires_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
}

impl User {
    /// A usable local credential. SSO-provisioned accounts carry no hash;
    /// an empty string is treated the same to keep malformed rows out of
    /// the hasher.
    pub fn local_password_hash(&self) -> Option<&str> {
        self.password_hash.as_deref().filter(|h| !h.is_empty())
    }
}
