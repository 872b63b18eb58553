use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, errors::ErrorKind, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use tracing::debug;
use uuid::Uuid;

use crate::{config::JwtConfig, state::AppState};

/// What a signed token asserts: a live session, or the CSRF state of an
/// in-flight SSO round-trip.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TokenKind {
    Session,
    SsoState,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: Uuid,       // user ID (random nonce for sso_state)
    pub iat: usize,      // issued at (unix timestamp)
    pub exp: usize,      // expires at (unix timestamp)
    pub iss: String,     // issuer
    pub aud: String,     // audience
    pub kind: TokenKind, // session or sso_state
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("malformed or invalid token")]
    Invalid,
}

const SSO_STATE_TTL: Duration = Duration::minutes(10);

/// Holds signing and verification keys with config data. Possession of a
/// structurally valid, unexpired, correctly signed session token is the
/// whole proof of identity; there is no server-side session table, and a
/// token cannot be revoked before its expiry.
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    issuer: String,
    audience: String,
    session_ttl: Duration,
}

impl FromRef<AppState> for JwtKeys {
    fn from_ref(state: &AppState) -> Self {
        Self::from_config(&state.config.jwt)
    }
}

impl JwtKeys {
    pub fn from_config(cfg: &JwtConfig) -> Self {
        Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            issuer: cfg.issuer.clone(),
            audience: cfg.audience.clone(),
            session_ttl: Duration::hours(cfg.session_ttl_hours),
        }
    }

    fn sign_with_kind(&self, sub: Uuid, kind: TokenKind, ttl: Duration) -> anyhow::Result<String> {
        let now = OffsetDateTime::now_utc();
        let claims = Claims {
            sub,
            iat: now.unix_timestamp() as usize,
            exp: (now + ttl).unix_timestamp() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            kind,
        };
        let token = encode(&Header::default(), &claims, &self.encoding)?;
        debug!(sub = %sub, kind = ?kind, "token signed");
        Ok(token)
    }

    pub fn sign_session(&self, user_id: Uuid) -> anyhow::Result<String> {
        self.sign_with_kind(user_id, TokenKind::Session, self.session_ttl)
    }

    /// Signed CSRF state for the SSO round-trip; the nonce subject is never
    /// looked up.
    pub fn sign_sso_state(&self) -> anyhow::Result<String> {
        self.sign_with_kind(Uuid::new_v4(), TokenKind::SsoState, SSO_STATE_TTL)
    }

    fn verify(&self, token: &str, expected: TokenKind) -> Result<Claims, TokenError> {
        let mut validation = Validation::default();
        validation.set_audience(std::slice::from_ref(&self.audience));
        validation.set_issuer(std::slice::from_ref(&self.issuer));
        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::ExpiredSignature => TokenError::Expired,
                _ => TokenError::Invalid,
            }
        })?;
        if data.claims.kind != expected {
            return Err(TokenError::Invalid);
        }
        Ok(data.claims)
    }

    pub fn verify_session(&self, token: &str) -> Result<Uuid, TokenError> {
        self.verify(token, TokenKind::Session).map(|c| c.sub)
    }

    pub fn verify_sso_state(&self, token: &str) -> Result<(), TokenError> {
        self.verify(token, TokenKind::SsoState).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::JwtConfig;

    fn make_keys(ttl_hours: i64) -> JwtKeys {
        JwtKeys::from_config(&JwtConfig {
            secret: "test-secret".into(),
            issuer: "test-issuer".into(),
            audience: "test-aud".into(),
            session_ttl_hours: ttl_hours,
        })
    }

    #[tokio::test]
    async fn keys_built_from_app_state() {
        let state = AppState::fake();
        let keys = JwtKeys::from_ref(&state);
        let user_id = Uuid::new_v4();
        let token = keys.sign_session(user_id).expect("sign session");
        assert_eq!(keys.verify_session(&token), Ok(user_id));
    }

    #[test]
    fn sign_and_verify_session_token() {
        let keys = make_keys(24);
        let user_id = Uuid::new_v4();
        let token = keys.sign_session(user_id).expect("sign session");
        assert_eq!(keys.verify_session(&token), Ok(user_id));
    }

    #[test]
    fn verify_reports_expiry_distinctly() {
        // Issued already past its window (beyond the default leeway).
        let keys = make_keys(-1);
        let token = keys.sign_session(Uuid::new_v4()).expect("sign session");
        assert_eq!(keys.verify_session(&token), Err(TokenError::Expired));
    }

    #[test]
    fn verify_rejects_tampered_token() {
        let keys = make_keys(24);
        let mut token = keys.sign_session(Uuid::new_v4()).expect("sign session");
        token.pop();
        token.push('A');
        assert_eq!(keys.verify_session(&token), Err(TokenError::Invalid));
        assert_eq!(
            keys.verify_session("not-even-a-jwt"),
            Err(TokenError::Invalid)
        );
    }

    #[test]
    fn verify_rejects_foreign_secret() {
        let ours = make_keys(24);
        let theirs = JwtKeys::from_config(&JwtConfig {
            secret: "other-secret".into(),
            issuer: "test-issuer".into(),
            audience: "test-aud".into(),
            session_ttl_hours: 24,
        });
        let token = theirs.sign_session(Uuid::new_v4()).expect("sign session");
        assert_eq!(ours.verify_session(&token), Err(TokenError::Invalid));
    }

    #[test]
    fn sso_state_roundtrip_and_kind_confusion() {
        let keys = make_keys(24);
        let state = keys.sign_sso_state().expect("sign state");
        assert_eq!(keys.verify_sso_state(&state), Ok(()));
        // A session token must not pass as SSO state, nor the reverse.
        let session = keys.sign_session(Uuid::new_v4()).expect("sign session");
        assert_eq!(keys.verify_sso_state(&session), Err(TokenError::Invalid));
        assert_eq!(keys.verify_session(&state), Err(TokenError::Invalid));
    }
}
