//! Gateway response types
//!
//! - `ApiResponse<T>` / `ApiError`: management API envelope `{code, msg, data}`
//! - `ProtocolRejection`: protocol error body returned to a counterpart

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::error::ProtocolError;
use crate::process::{Pids, Side};

// ============================================================================
// Management API envelope
// ============================================================================

/// Unified management API response
///
/// - code: 0 = success, non-zero = error code
/// - msg: short message description
/// - data: payload on success
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub code: i32,
    pub msg: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            code: error_codes::SUCCESS,
            msg: "ok".to_string(),
            data: Some(data),
        }
    }

    pub fn error(code: i32, msg: impl Into<String>) -> ApiResponse<()> {
        ApiResponse {
            code,
            msg: msg.into(),
            data: None,
        }
    }
}

/// Management API error codes
pub mod error_codes {
    pub const SUCCESS: i32 = 0;

    // Caller errors (4xxx)
    pub const INVALID_REQUEST: i32 = 4000;
    pub const IDENTITY_MISMATCH: i32 = 4001;
    pub const MISSING_ATTRIBUTE: i32 = 4002;
    pub const INVALID_KEY: i32 = 4004;
    pub const STATE_CONFLICT: i32 = 4009;

    // Counterpart / internal errors (5xxx)
    pub const STORE_FAILURE: i32 = 5000;
    pub const INTERNAL_ERROR: i32 = 5001;
    pub const INVALID_ACKNOWLEDGMENT: i32 = 5002;
    pub const TRANSPORT_FAILURE: i32 = 5003;
}

#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: i32,
    pub msg: String,
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            code: error_codes::INVALID_REQUEST,
            msg: msg.into(),
        }
    }
}

impl From<ProtocolError> for ApiError {
    fn from(e: ProtocolError) -> Self {
        let code = match &e {
            ProtocolError::InvalidKey { .. } => error_codes::INVALID_KEY,
            ProtocolError::StateConflict { .. } => error_codes::STATE_CONFLICT,
            ProtocolError::IdentityMismatch { .. } => error_codes::IDENTITY_MISMATCH,
            ProtocolError::InvalidRequest(_) => error_codes::INVALID_REQUEST,
            ProtocolError::InvalidAcknowledgment(_) => error_codes::INVALID_ACKNOWLEDGMENT,
            ProtocolError::MissingAttribute(_) => error_codes::MISSING_ATTRIBUTE,
            ProtocolError::Transport(_) => error_codes::TRANSPORT_FAILURE,
            ProtocolError::Store(_) => error_codes::STORE_FAILURE,
            ProtocolError::Internal(_) => error_codes::INTERNAL_ERROR,
        };
        Self {
            status: status_of(&e),
            code,
            msg: e.to_string(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::bad_request(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ApiResponse::<()>::error(self.code, self.msg))).into_response()
    }
}

pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

#[inline]
pub fn ok<T>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse::success(data)))
}

// ============================================================================
// Protocol error body
// ============================================================================

/// `ContractNegotiationError` / `TransferError` body
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorBody {
    #[serde(rename = "@context")]
    pub context: &'static str,
    #[serde(rename = "@type")]
    pub kind: &'static str,
    pub provider_pid: String,
    pub consumer_pid: String,
    pub code: &'static str,
    pub reason: Vec<String>,
}

/// A protocol message rejected by this node
#[derive(Debug)]
pub struct ProtocolRejection {
    pub error_type: &'static str,
    pub pids: Pids,
    pub error: ProtocolError,
}

impl ProtocolRejection {
    pub fn new(error_type: &'static str, pids: Pids, error: ProtocolError) -> Self {
        Self {
            error_type,
            pids,
            error,
        }
    }
}

impl IntoResponse for ProtocolRejection {
    fn into_response(self) -> Response {
        tracing::debug!(
            error_type = self.error_type,
            provider_pid = %self.pids.provider_pid,
            consumer_pid = %self.pids.consumer_pid,
            code = self.error.code(),
            "Rejecting protocol message"
        );
        let body = ErrorBody {
            context: crate::process::DSP_CONTEXT,
            kind: self.error_type,
            provider_pid: self.pids.provider_pid,
            consumer_pid: self.pids.consumer_pid,
            code: self.error.code(),
            reason: vec![self.error.to_string()],
        };
        (status_of(&self.error), Json(body)).into_response()
    }
}

pub type ProtocolResult<T> = Result<Json<T>, ProtocolRejection>;

/// Unwrap a protocol message body, rejecting malformed JSON as INVALID_REQUEST
pub fn message<T>(
    error_type: &'static str,
    payload: Result<Json<T>, JsonRejection>,
) -> Result<T, ProtocolRejection> {
    payload.map(|Json(msg)| msg).map_err(|rejection| {
        ProtocolRejection::new(
            error_type,
            Pids::default(),
            ProtocolError::InvalidRequest(rejection.body_text()),
        )
    })
}

/// The `{pid}` path segment must name the same process as the body
pub fn check_path_pid(
    error_type: &'static str,
    side: Side,
    path_pid: &str,
    pids: &Pids,
) -> Result<(), ProtocolRejection> {
    let body_pid = side.local(pids);
    if path_pid != body_pid {
        return Err(ProtocolRejection::new(
            error_type,
            pids.clone(),
            ProtocolError::mismatch(side.local_field(), path_pid, body_pid),
        ));
    }
    Ok(())
}

fn status_of(e: &ProtocolError) -> StatusCode {
    StatusCode::from_u16(e.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}
