use crate::store::StoreError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use std::fmt;

/// Rejection of a user-supplied URL or alias. Nothing is persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    EmptyUrl,
    InvalidFormat,
    SelfReference,
    InternalAddress,
    InvalidAlias,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyUrl => write!(f, "URL cannot be empty"),
            Self::InvalidFormat => {
                write!(f, "Invalid URL format (must be a valid domain or URL)")
            }
            Self::SelfReference => write!(f, "Shortening links to this service is not allowed"),
            Self::InternalAddress => {
                write!(f, "Shortening internal network URLs is prohibited")
            }
            Self::InvalidAlias => {
                write!(f, "Custom alias must be 3-20 alphanumeric characters")
            }
        }
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    Validation(ValidationError),
    AliasConflict,
    Exhausted,
    NotFound,
    Store(StoreError),
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::AliasConflict => write!(f, "Custom alias already in use"),
            Self::Exhausted => write!(f, "Exhausted all retries of generating a unique id"),
            Self::NotFound => write!(f, "Not found"),
            Self::Store(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for ServiceError {}

impl From<ValidationError> for ServiceError {
    fn from(err: ValidationError) -> Self {
        ServiceError::Validation(err)
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        ServiceError::Store(err)
    }
}

impl ServiceError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::AliasConflict => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Exhausted | Self::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match &self {
            Self::Store(err) => {
                tracing::error!("{}", err);
                "Internal server error".to_string()
            }
            Self::Exhausted => "Failed to generate short ID".to_string(),
            _ => self.to_string(),
        };
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_facing_errors_are_bad_requests() {
        assert_eq!(
            ServiceError::from(ValidationError::InvalidAlias).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ServiceError::AliasConflict.status(), StatusCode::BAD_REQUEST);
        assert_eq!(ServiceError::NotFound.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn internal_errors_are_server_errors() {
        assert_eq!(
            ServiceError::from(StoreError::Timeout).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ServiceError::Exhausted.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn alias_conflict_message_differs_from_validation() {
        assert_ne!(
            ServiceError::AliasConflict.to_string(),
            ServiceError::from(ValidationError::InvalidAlias).to_string()
        );
    }
}
