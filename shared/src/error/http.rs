//! HTTP status code mapping for error codes

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    /// Get the appropriate HTTP status code for this error code
    pub fn http_status(&self) -> StatusCode {
        match self {
            Self::Success => StatusCode::OK,

            Self::NotFound | Self::MenuNotFound | Self::WaitlistEntryNotFound => {
                StatusCode::NOT_FOUND
            }

            Self::NotAuthenticated
            | Self::InvalidCredentials
            | Self::TokenExpired
            | Self::TokenInvalid => StatusCode::UNAUTHORIZED,

            Self::PermissionDenied | Self::AdminRequired => StatusCode::FORBIDDEN,

            Self::ConfirmationRequired => StatusCode::PRECONDITION_REQUIRED,

            // 502/503/504: the hosted backend is the failing party
            Self::BackendError => StatusCode::BAD_GATEWAY,
            Self::NetworkError => StatusCode::SERVICE_UNAVAILABLE,
            Self::TimeoutError => StatusCode::GATEWAY_TIMEOUT,

            Self::InternalError | Self::ConfigError | Self::Unknown => {
                StatusCode::INTERNAL_SERVER_ERROR
            }

            // 400 Bad Request (validation)
            Self::ValidationFailed
            | Self::InvalidRequest
            | Self::RequiredField
            | Self::ValueOutOfRange
            | Self::MenuInvalidPrice
            | Self::MenuInvalidCategory
            | Self::MenuInvalidSortOrder
            | Self::WaitlistNameRequired
            | Self::WaitlistInvalidPeopleCount => StatusCode::BAD_REQUEST,
        }
    }
}
