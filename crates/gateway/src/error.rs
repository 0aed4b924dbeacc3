//! HTTP error mapping.
//!
//! Every failure leaves the gateway as `{"detail": "..."}` with a status
//! chosen by kind: bad input is the caller's problem, a missing program is
//! 404, and anything the store could not do is 503.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use epgedit_core::{Error, StoreError};
use epgedit_rules::RuleError;
use epgedit_schedule::CodecError;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub detail: String,
}

/// Errors a handler can return.
#[derive(Debug)]
pub enum ApiError {
    /// Bad input or an impossible rebuild.
    Core(Error),
    /// The storage collaborator failed.
    CollaboratorUnavailable(StoreError),
    /// The stored rule documents do not compile.
    Rules(RuleError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Core(Error::ProgramNotFound { .. }) => StatusCode::NOT_FOUND,
            ApiError::Core(Error::MalformedInput(_) | Error::NegativeFiller { .. }) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::CollaboratorUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Rules(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn detail(&self) -> String {
        match self {
            ApiError::Core(e) => e.to_string(),
            ApiError::CollaboratorUnavailable(e) => format!("Schedule store unavailable: {e}"),
            ApiError::Rules(e) => format!("Rule set could not be loaded: {e}"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = self.detail();
        if status.is_server_error() {
            error!(status = status.as_u16(), detail = %detail, "Request failed");
        } else {
            warn!(status = status.as_u16(), detail = %detail, "Request rejected");
        }
        (status, Json(ErrorResponse { detail })).into_response()
    }
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        ApiError::Core(e)
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        ApiError::CollaboratorUnavailable(e)
    }
}

impl From<RuleError> for ApiError {
    fn from(e: RuleError) -> Self {
        ApiError::Rules(e)
    }
}

impl From<CodecError> for ApiError {
    fn from(e: CodecError) -> Self {
        ApiError::Core(e.into())
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(e: serde_json::Error) -> Self {
        ApiError::Core(e.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_error_kind() {
        assert_eq!(
            ApiError::from(Error::malformed("bad")).status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(Error::NegativeFiller {
                channel_id: "C1".into(),
                program_id: "P1".into(),
                minutes: -2,
            })
            .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::from(Error::ProgramNotFound {
                channel_id: "C1".into(),
                program_id: "P1".into(),
            })
            .status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(StoreError::unavailable("file store", "disk gone")).status(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn not_found_detail_names_channel_and_program() {
        let err = ApiError::from(Error::ProgramNotFound {
            channel_id: "C1".into(),
            program_id: "P9".into(),
        });
        let detail = err.detail();
        assert!(detail.contains("C1"));
        assert!(detail.contains("P9"));
    }
}
