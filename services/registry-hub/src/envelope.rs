//! The `{status, message, data}` envelope returned by the API routes.
//!
//! Anticipated failures (bad input, rejected credentials, unknown ids) are
//! reported inside the envelope while the HTTP status stays 200. Callers
//! must look at `status` in the body, not at the transport status.

use std::borrow::Cow;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

pub(crate) const SUCCESS: &str = "success";
pub(crate) const UNAUTHORIZED: &str =
    "You do not have access rights. \nPlease check your username and password.";
pub(crate) const INVALID_URL: &str = "Invalid url. \nPlease check the url.";
pub(crate) const INVALID_BODY: &str = "Invalid request body.";
pub(crate) const REGISTRY_NOT_FOUND: &str = "Registry not found.";
pub(crate) const IMAGE_NOT_FOUND: &str = "Image not found.";
pub(crate) const INVALID_IMAGE: &str = "Invalid image name.";

/// Uniform API response body
#[derive(Debug, Serialize)]
pub struct ApiResult<T> {
    /// Logical status of the operation, independent of the HTTP status
    pub status: u16,

    /// Human readable outcome
    pub message: Cow<'static, str>,

    /// Payload, or an empty object on failure
    pub data: T,
}

/// The empty `{}` payload of a failed operation
#[derive(Debug, Default, Serialize)]
pub struct Empty {}

impl<T> ApiResult<T> {
    /// A successful result carrying `data`
    pub fn success(data: T) -> Self {
        Self {
            status: StatusCode::OK.as_u16(),
            message: Cow::Borrowed(SUCCESS),
            data,
        }
    }
}

impl ApiResult<Empty> {
    /// A logical failure with an empty payload
    pub fn failure(status: StatusCode, message: impl Into<Cow<'static, str>>) -> Self {
        Self {
            status: status.as_u16(),
            message: message.into(),
            data: Empty {},
        }
    }
}

impl<T> IntoResponse for ApiResult<T>
where
    T: Serialize,
{
    fn into_response(self) -> Response {
        (StatusCode::OK, Json(self)).into_response()
    }
}
