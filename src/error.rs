use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use tracing::error;

/// JSON body returned for every failed request.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: &'static str,
    pub message: String,
}

/// Expected, user-facing outcomes plus a generic service-failure kind.
///
/// Everything except `Service` is a terminal answer to the caller and is
/// never retried internally. `Service` wraps unexpected store/network
/// failures: logged with context, rendered without internals.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Email already registered")]
    DuplicateEmail,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("This account signs in through {provider}; password login is disabled")]
    FederatedAccountOnly { provider: String },

    #[error("Not authenticated")]
    Unauthenticated,

    #[error("Invalid or expired reset token")]
    InvalidOrExpiredToken,

    #[error("SSO is not configured")]
    SsoNotConfigured,

    #[error("Identity provider did not return an email")]
    MissingUserInfo,

    #[error("An account with this email already exists and cannot be linked automatically")]
    AccountNotLinkable,

    #[error("Cannot connect with yourself")]
    SelfConnection,

    #[error("Connection or request already exists")]
    AlreadyExists,

    #[error("Not found")]
    NotFound,

    #[error("{0}")]
    Validation(String),

    #[error("Service error")]
    Service(anyhow::Error),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::DuplicateEmail | Self::AccountNotLinkable => StatusCode::CONFLICT,
            Self::InvalidCredentials
            | Self::FederatedAccountOnly { .. }
            | Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::InvalidOrExpiredToken
            | Self::SsoNotConfigured
            | Self::MissingUserInfo
            | Self::SelfConnection
            | Self::AlreadyExists
            | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Service(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            Self::DuplicateEmail => "DUPLICATE_EMAIL",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::FederatedAccountOnly { .. } => "FEDERATED_ACCOUNT_ONLY",
            Self::Unauthenticated => "UNAUTHENTICATED",
            Self::InvalidOrExpiredToken => "INVALID_OR_EXPIRED_TOKEN",
            Self::SsoNotConfigured => "SSO_NOT_CONFIGURED",
            Self::MissingUserInfo => "MISSING_USER_INFO",
            Self::AccountNotLinkable => "ACCOUNT_NOT_LINKABLE",
            Self::SelfConnection => "SELF_CONNECTION",
            Self::AlreadyExists => "ALREADY_EXISTS",
            Self::NotFound => "NOT_FOUND",
            Self::Validation(_) => "VALIDATION",
            Self::Service(_) => "SERVICE_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            Self::Service(source) => {
                error!(error = ?source, "unexpected service error");
                "Something went wrong on our side".to_string()
            }
            other => other.to_string(),
        };
        let body = ErrorResponse {
            error: ErrorDetail {
                code: self.error_code(),
                message,
            },
        };
        (status, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        Self::Service(err.into())
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        Self::Service(err.into())
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::Service(err)
    }
}

/// True when the database error is a unique-constraint violation, the
/// signal both duplicate registration and duplicate connection requests
/// rely on instead of a read-then-write.
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(
        err,
        sqlx::Error::Database(db) if db.code().as_deref() == Some("23505")
    )
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_taxonomy() {
        assert_eq!(ApiError::DuplicateEmail.status_code(), StatusCode::CONFLICT);
        assert_eq!(
            ApiError::InvalidCredentials.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::FederatedAccountOnly {
                provider: "oidc".into()
            }
            .status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(ApiError::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::AlreadyExists.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Service(anyhow::anyhow!("boom")).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn federated_error_names_the_provider() {
        let err = ApiError::FederatedAccountOnly {
            provider: "oidc".into(),
        };
        assert!(err.to_string().contains("oidc"));
        assert_eq!(err.error_code(), "FEDERATED_ACCOUNT_ONLY");
    }

    #[test]
    fn service_error_does_not_leak_internals() {
        let response = ApiError::Service(anyhow::anyhow!("connection refused (10.0.0.3:5432)"))
            .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
