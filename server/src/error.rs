//! Error responses of the HTTP API.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use restshop_codec::CodecError;
use restshop_session::SessionError;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// JSON body of every error response.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ErrorBody {
    pub detail: String,
    pub code: String,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    code: &'static str,
    detail: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, detail: impl Into<String>) -> Self {
        Self {
            status,
            code,
            detail: detail.into(),
        }
    }

    pub fn bad_request(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "invalid_request", detail)
    }

    pub fn internal(detail: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal", detail)
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn code(&self) -> &'static str {
        self.code
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        let (status, code) = match &err {
            SessionError::UnknownPrincipal(_) => (StatusCode::NOT_FOUND, "unknown_principal"),
            SessionError::UnknownSession { .. } => (StatusCode::NOT_FOUND, "unknown_session"),
            SessionError::TimeResolutionNotSet => (StatusCode::BAD_REQUEST, "time_resolution_not_set"),
            SessionError::InvalidRequest(_) => (StatusCode::BAD_REQUEST, "invalid_request"),
            SessionError::UnknownObjectType(_) => (StatusCode::BAD_REQUEST, "unknown_object_type"),
            SessionError::UnknownObject { .. } => (StatusCode::BAD_REQUEST, "unknown_object"),
            SessionError::UnknownAttribute { .. } => (StatusCode::BAD_REQUEST, "unknown_attribute"),
            SessionError::SimulationStarted => (StatusCode::CONFLICT, "simulation_started"),
            SessionError::EngineCommandFailed { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "engine_command_failed")
            }
            SessionError::LogEndpointUnreachable { .. } => {
                (StatusCode::INTERNAL_SERVER_ERROR, "log_endpoint_unreachable")
            }
            SessionError::Codec(codec) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                match codec {
                    CodecError::UnknownAttributeType { .. } => "unknown_attribute_type",
                    CodecError::AttributeDecode { .. } => "attribute_decode",
                    CodecError::AttributeEncode { .. } => "attribute_encode",
                    CodecError::ConnectionEnumeration { .. } => "connection_enumeration",
                    CodecError::Engine(_) => "engine_command_failed",
                },
            ),
        };
        Self::new(status, code, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            warn!(code = self.code, detail = %self.detail, "Request failed");
        } else {
            debug!(code = self.code, detail = %self.detail, "Request rejected");
        }
        let body = ErrorBody {
            detail: self.detail,
            code: self.code.to_string(),
        };
        (self.status, Json(body)).into_response()
    }
}
