use sqlx::PgPool;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::repo_types::{User, UserType};

const USER_COLUMNS: &str = "id, email, password_hash, name, user_type, organization_name, \
     disability_categories, bio, location, avatar_url, auth_provider, is_verified, \
     reset_token, reset_token_expires_at, created_at";

pub struct NewLocalUser<'a> {
    pub email: &'a str,
    pub password_hash: &'a str,
    pub name: &'a str,
    pub user_type: UserType,
    pub organization_name: Option<&'a str>,
    pub disability_categories: &'a [String],
    pub bio: Option<&'a str>,
    pub location: Option<&'a str>,
}

#[derive(Debug, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub disability_categories: Option<Vec<String>>,
    pub organization_name: Option<String>,
    pub avatar_url: Option<String>,
}

impl User {
    pub async fn find_by_email(db: &PgPool, email: &str) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(db)
        .await
    }

    pub async fn find_by_id(db: &PgPool, id: Uuid) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(db)
            .await
    }

    /// Insert a locally-registered user. A duplicate email surfaces as a
    /// unique-constraint violation, not a pre-read.
    pub async fn create_local(db: &PgPool, new: NewLocalUser<'_>) -> sqlx::Result<User> {
        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (id, email, password_hash, name, user_type, organization_name, \
             disability_categories, bio, location) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(new.email)
        .bind(new.password_hash)
        .bind(new.name)
        .bind(new.user_type)
        .bind(new.organization_name)
        .bind(new.disability_categories)
        .bind(new.bio)
        .bind(new.location)
        .fetch_one(db)
        .await
    }

    /// Provision an account from a federated identity: no password hash,
    /// verified, tagged with the provider.
    pub async fn create_federated(
        db: &PgPool,
        email: &str,
        name: &str,
        provider: &str,
    ) -> sqlx::Result<User> {
        sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (id, email, name, auth_provider, is_verified) \
             VALUES ($1, $2, $3, $4, TRUE) \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(email)
        .bind(name)
        .bind(provider)
        .fetch_one(db)
        .await
    }

    /// Partial profile update; absent fields keep their current value.
    pub async fn update_profile(
        db: &PgPool,
        id: Uuid,
        update: ProfileUpdate,
    ) -> sqlx::Result<Option<User>> {
        sqlx::query_as::<_, User>(&format!(
            "UPDATE users SET \
             name = COALESCE($2, name), \
             bio = COALESCE($3, bio), \
             location = COALESCE($4, location), \
             disability_categories = COALESCE($5, disability_categories), \
             organization_name = COALESCE($6, organization_name), \
             avatar_url = COALESCE($7, avatar_url) \
             WHERE id = $1 \
             RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(update.name)
        .bind(update.bio)
        .bind(update.location)
        .bind(update.disability_categories)
        .bind(update.organization_name)
        .bind(update.avatar_url)
        .fetch_optional(db)
        .await
    }

    /// Overwrite the reset token; any previously issued token is void from
    /// this point on.
    pub async fn store_reset_token(
        db: &PgPool,
        id: Uuid,
        token: &str,
        expires_at: OffsetDateTime,
    ) -> sqlx::Result<()> {
        sqlx::query(
            "UPDATE users SET reset_token = $2, reset_token_expires_at = $3 WHERE id = $1",
        )
        .bind(id)
        .bind(token)
        .bind(expires_at)
        .execute(db)
        .await?;
        Ok(())
    }

    /// Single-use redemption: swaps in the new hash and clears both reset
    /// fields in one conditional write. `None` means the token did not
    /// match an unexpired row — including a second redemption of the same
    /// token.
    pub async fn redeem_reset_token(
        db: &PgPool,
        token: &str,
        new_password_hash: &str,
    ) -> sqlx::Result<Option<Uuid>> {
        let row: Option<(Uuid,)> = sqlx::query_as(
            "UPDATE users SET password_hash = $2, reset_token = NULL, reset_token_expires_at = NULL \
             WHERE reset_token = $1 AND reset_token_expires_at > now() \
             RETURNING id",
        )
        .bind(token)
        .bind(new_password_hash)
        .fetch_optional(db)
        .await?;
        Ok(row.map(|(id,)| id))
    }
}
