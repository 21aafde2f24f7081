//! The uniform response envelope of the REST API.

use serde::{Deserialize, Serialize};

use kbnav_core::error::AppError;
use kbnav_core::result::AppResult;

/// Status value of a successful envelope.
pub const STATUS_OK: &str = "ok";

/// `{ status: "ok" | "error", data?, msg? }`.
///
/// Anything other than `status == "ok"` is a hard failure, whatever the
/// HTTP status code said.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    /// `"ok"` or `"error"`.
    pub status: String,
    /// Payload of a successful response. A missing field reads as `None`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// Server message, mostly present on errors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub msg: Option<String>,
}

impl<T> ApiEnvelope<T> {
    /// Wrap a successful payload.
    pub fn ok(data: T) -> Self {
        Self {
            status: STATUS_OK.to_string(),
            data: Some(data),
            msg: None,
        }
    }

    /// Build an error envelope.
    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            data: None,
            msg: Some(msg.into()),
        }
    }

    /// Whether the envelope reports success.
    pub fn is_ok(&self) -> bool {
        self.status == STATUS_OK
    }

    /// Unwrap the payload, turning an error envelope into an
    /// [`ErrorKind::ExternalService`](kbnav_core::ErrorKind::ExternalService)
    /// that carries the server message verbatim.
    pub fn into_data(self) -> AppResult<T> {
        if !self.is_ok() {
            let msg = self
                .msg
                .unwrap_or_else(|| format!("Request failed with status '{}'", self.status));
            return Err(AppError::external_service(msg));
        }
        self.data
            .ok_or_else(|| AppError::external_service("Response envelope carried no data"))
    }
}
