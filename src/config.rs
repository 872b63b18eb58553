use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub issuer: String,
    pub audience: String,
    pub session_ttl_hours: i64,
}

/// OIDC integration. Present only when all three variables are set;
/// otherwise the SSO endpoints answer with SSO_NOT_CONFIGURED.
#[derive(Debug, Clone, Deserialize)]
pub struct OidcConfig {
    pub issuer_url: String,
    pub client_id: String,
    pub client_secret: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    pub resend_api_key: Option<String>,
    pub mail_from: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    /// Externally reachable base URL of this service (SSO callback target).
    pub public_url: String,
    /// Base URL of the web client (SSO hand-off, reset links).
    pub frontend_url: String,
    pub jwt: JwtConfig,
    pub oidc: Option<OidcConfig>,
    pub mail: MailConfig,
    pub reset_token_ttl_minutes: i64,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET")?,
            issuer: std::env::var("JWT_ISSUER").unwrap_or_else(|_| "prideconnect".into()),
            audience: std::env::var("JWT_AUDIENCE")
                .unwrap_or_else(|_| "prideconnect-users".into()),
            session_ttl_hours: std::env::var("SESSION_TTL_HOURS")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(24),
        };

        let oidc = match (
            std::env::var("OIDC_ISSUER_URL").ok(),
            std::env::var("OIDC_CLIENT_ID").ok(),
            std::env::var("OIDC_CLIENT_SECRET").ok(),
        ) {
            (Some(issuer_url), Some(client_id), Some(client_secret)) => Some(OidcConfig {
                issuer_url,
                client_id,
                client_secret,
            }),
            _ => {
                tracing::warn!("OIDC configuration incomplete; SSO will not be available");
                None
            }
        };

        let mail = MailConfig {
            resend_api_key: std::env::var("RESEND_API_KEY").ok(),
            mail_from: std::env::var("MAIL_FROM")
                .unwrap_or_else(|_| "onboarding@resend.dev".into()),
        };

        Ok(Self {
            database_url,
            public_url: std::env::var("PUBLIC_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| "http://localhost:8080".into()),
            frontend_url: std::env::var("FRONTEND_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| "http://localhost:3000".into()),
            jwt,
            oidc,
            mail,
            reset_token_ttl_minutes: std::env::var("RESET_TOKEN_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse::<i64>().ok())
                .unwrap_or(60),
        })
    }
}
