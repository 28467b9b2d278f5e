//! The platform API response envelope.
//!
//! Every API answer is `{ "status": <code>, "description": <text> }`. The
//! status is a platform code, not an HTTP status: gate rejections travel
//! with HTTP 200 unless the server is configured otherwise.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

/// Closed set of platform status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
pub enum ApiStatusCode {
    Ok,
    OkDeployStarted,
    OkPartially,
    GenericError,
    CaptainNotInitialized,
    UserNotInitialized,
    NotAuthorized,
    AlreadyExists,
    BadName,
    WrongPassword,
    AuthTokenInvalid,
    VerificationFailed,
    IllegalOperation,
    BuildError,
    IllegalParameter,
    NotFound,
    AuthenticationFailed,
    PasswordBackOff,
}

impl ApiStatusCode {
    pub const fn code(self) -> u16 {
        match self {
            ApiStatusCode::Ok => 100,
            ApiStatusCode::OkDeployStarted => 101,
            ApiStatusCode::OkPartially => 102,
            ApiStatusCode::GenericError => 1000,
            ApiStatusCode::CaptainNotInitialized => 1001,
            ApiStatusCode::UserNotInitialized => 1101,
            ApiStatusCode::NotAuthorized => 1102,
            ApiStatusCode::AlreadyExists => 1103,
            ApiStatusCode::BadName => 1104,
            ApiStatusCode::WrongPassword => 1105,
            ApiStatusCode::AuthTokenInvalid => 1106,
            ApiStatusCode::VerificationFailed => 1107,
            ApiStatusCode::IllegalOperation => 1108,
            ApiStatusCode::BuildError => 1109,
            ApiStatusCode::IllegalParameter => 1110,
            ApiStatusCode::NotFound => 1111,
            ApiStatusCode::AuthenticationFailed => 1112,
            ApiStatusCode::PasswordBackOff => 1113,
        }
    }

    pub fn is_success(self) -> bool {
        self.code() < 1000
    }
}

impl From<ApiStatusCode> for u16 {
    fn from(code: ApiStatusCode) -> Self {
        code.code()
    }
}

/// Returned when a numeric code is not part of the platform set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unknown API status code {0}")]
pub struct UnknownStatusCode(pub u16);

impl TryFrom<u16> for ApiStatusCode {
    type Error = UnknownStatusCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        const ALL: [ApiStatusCode; 18] = [
            ApiStatusCode::Ok,
            ApiStatusCode::OkDeployStarted,
            ApiStatusCode::OkPartially,
            ApiStatusCode::GenericError,
            ApiStatusCode::CaptainNotInitialized,
            ApiStatusCode::UserNotInitialized,
            ApiStatusCode::NotAuthorized,
            ApiStatusCode::AlreadyExists,
            ApiStatusCode::BadName,
            ApiStatusCode::WrongPassword,
            ApiStatusCode::AuthTokenInvalid,
            ApiStatusCode::VerificationFailed,
            ApiStatusCode::IllegalOperation,
            ApiStatusCode::BuildError,
            ApiStatusCode::IllegalParameter,
            ApiStatusCode::NotFound,
            ApiStatusCode::AuthenticationFailed,
            ApiStatusCode::PasswordBackOff,
        ];
        ALL.into_iter()
            .find(|c| c.code() == value)
            .ok_or(UnknownStatusCode(value))
    }
}

/// Response envelope for the versioned API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse {
    pub status: ApiStatusCode,
    pub description: String,
}

impl ApiResponse {
    pub fn new(status: ApiStatusCode, description: impl Into<String>) -> Self {
        Self {
            status,
            description: description.into(),
        }
    }

    /// Render with an explicit HTTP status.
    pub fn with_http_status(self, status: StatusCode) -> Response {
        (status, Json(self)).into_response()
    }
}

impl IntoResponse for ApiResponse {
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_numeric_status() {
        let body = serde_json::to_value(ApiResponse::new(
            ApiStatusCode::GenericError,
            "no namespace",
        ))
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({ "status": 1000, "description": "no namespace" })
        );
    }

    #[test]
    fn rejects_unknown_codes() {
        let err = serde_json::from_str::<ApiResponse>(r#"{"status": 4242, "description": ""}"#);
        assert!(err.is_err());
        assert_eq!(ApiStatusCode::try_from(1001), Ok(ApiStatusCode::CaptainNotInitialized));
        assert_eq!(ApiStatusCode::try_from(4242), Err(UnknownStatusCode(4242)));
    }

    #[test]
    fn success_codes_are_below_one_thousand() {
        assert!(ApiStatusCode::Ok.is_success());
        assert!(ApiStatusCode::OkPartially.is_success());
        assert!(!ApiStatusCode::GenericError.is_success());
    }

    #[test]
    fn default_response_is_http_ok() {
        let response = ApiResponse::new(ApiStatusCode::GenericError, "x").into_response();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
