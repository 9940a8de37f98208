use super::handler::ApiResponse;
use crate::application_port::*;
use std::convert::Infallible;
use thiserror::Error;
use tracing::{error, warn};
use warp::http::header::{self, HeaderValue};
use warp::http::StatusCode;
use warp::{Rejection, Reply, reject};

pub async fn recover_error(
    err: Rejection,
    expose_details: bool,
) -> Result<warp::reply::Response, Infallible> {
    let code = if let Some(code) = err.find::<ApiErrorCode>() {
        code.clone()
    } else if err.is_not_found() {
        ApiErrorCode::NotFound("route not found".to_string())
    } else if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        ApiErrorCode::InvalidInput(format!("invalid request body: {}", e))
    } else if err.find::<reject::PayloadTooLarge>().is_some() {
        ApiErrorCode::PayloadTooLarge
    } else if err.find::<reject::LengthRequired>().is_some() {
        ApiErrorCode::InvalidInput("request body length required".to_string())
    } else if err.find::<reject::UnsupportedMediaType>().is_some() {
        ApiErrorCode::UnsupportedMediaType
    } else if err.find::<reject::InvalidQuery>().is_some() {
        ApiErrorCode::InvalidInput("invalid query string".to_string())
    } else if err.find::<reject::MethodNotAllowed>().is_some() {
        ApiErrorCode::MethodNotAllowed
    } else if let Some(e) = err.find::<warp::cors::CorsForbidden>() {
        ApiErrorCode::Forbidden(e.to_string())
    } else {
        error!("unhandled rejection: {:?}", err);
        ApiErrorCode::InternalError(format!("unhandled rejection: {:?}", err))
    };

    let mut body = ApiResponse::<()>::err(&code);
    if expose_details {
        body.details = code.details();
    }
    let json = warp::reply::json(&body);
    let mut response = warp::reply::with_status(json, code.status()).into_response();

    if let ApiErrorCode::TooManyRequests { retry_after_secs } = code {
        response
            .headers_mut()
            .insert(header::RETRY_AFTER, HeaderValue::from(retry_after_secs));
    }
    Ok(response)
}

#[derive(Debug, Clone, Error)]
pub enum ApiErrorCode {
    #[error("{0}")]
    InvalidInput(String),
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("account inactive, contact the administrator")]
    AccountInactive,
    #[error("access token required")]
    MissingToken,
    #[error("invalid authorization header, expected: Bearer <token>")]
    MalformedAuthorization,
    #[error("invalid token")]
    InvalidToken,
    #[error("token expired")]
    ExpiredToken,
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("too many requests, try again later")]
    TooManyRequests { retry_after_secs: u64 },
    #[error("request body too large")]
    PayloadTooLarge,
    #[error("unsupported media type")]
    UnsupportedMediaType,
    #[error("method not allowed")]
    MethodNotAllowed,
    #[error("internal server error")]
    InternalError(String),
}

impl ApiErrorCode {
    pub fn internal<E: std::fmt::Display>(error: E) -> ApiErrorCode {
        warn!("Internal error: {}", error);
        ApiErrorCode::InternalError(error.to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiErrorCode::InvalidInput(_) => StatusCode::BAD_REQUEST,
            ApiErrorCode::InvalidCredentials
            | ApiErrorCode::AccountInactive
            | ApiErrorCode::MissingToken
            | ApiErrorCode::MalformedAuthorization
            | ApiErrorCode::InvalidToken
            | ApiErrorCode::ExpiredToken => StatusCode::UNAUTHORIZED,
            ApiErrorCode::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiErrorCode::NotFound(_) => StatusCode::NOT_FOUND,
            ApiErrorCode::Conflict(_) => StatusCode::CONFLICT,
            ApiErrorCode::TooManyRequests { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiErrorCode::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiErrorCode::UnsupportedMediaType => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            ApiErrorCode::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiErrorCode::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiErrorCode::InvalidInput(_) => "INVALID_INPUT",
            ApiErrorCode::InvalidCredentials => "INVALID_CREDENTIALS",
            ApiErrorCode::AccountInactive => "ACCOUNT_INACTIVE",
            ApiErrorCode::MissingToken => "TOKEN_MISSING",
            ApiErrorCode::MalformedAuthorization => "TOKEN_MALFORMED",
            ApiErrorCode::InvalidToken => "TOKEN_INVALID",
            ApiErrorCode::ExpiredToken => "TOKEN_EXPIRED",
            ApiErrorCode::Forbidden(_) => "FORBIDDEN",
            ApiErrorCode::NotFound(_) => "NOT_FOUND",
            ApiErrorCode::Conflict(_) => "CONFLICT",
            ApiErrorCode::TooManyRequests { .. } => "RATE_LIMITED",
            ApiErrorCode::PayloadTooLarge => "PAYLOAD_TOO_LARGE",
            ApiErrorCode::UnsupportedMediaType => "UNSUPPORTED_MEDIA_TYPE",
            ApiErrorCode::MethodNotAllowed => "METHOD_NOT_ALLOWED",
            ApiErrorCode::InternalError(_) => "INTERNAL_ERROR",
        }
    }

    /// Diagnostic text, only sent outside production.
    pub fn details(&self) -> Option<String> {
        match self {
            ApiErrorCode::InternalError(details) => Some(details.clone()),
            _ => None,
        }
    }
}

impl reject::Reject for ApiErrorCode {}

impl From<AuthError> for ApiErrorCode {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::Validation(msg) => ApiErrorCode::InvalidInput(msg),
            AuthError::InvalidCredentials => ApiErrorCode::InvalidCredentials,
            AuthError::AccountInactive => ApiErrorCode::AccountInactive,
            AuthError::UserNotFound => ApiErrorCode::NotFound("user not found".to_string()),
            AuthError::TokenInvalid => ApiErrorCode::InvalidToken,
            AuthError::TokenExpired => ApiErrorCode::ExpiredToken,
            AuthError::Store(e) => ApiErrorCode::internal(e),
            AuthError::InternalError(e) => ApiErrorCode::internal(e),
        }
    }
}

impl From<RegistrationError> for ApiErrorCode {
    fn from(error: RegistrationError) -> Self {
        match error {
            RegistrationError::Validation(msg) => ApiErrorCode::InvalidInput(msg),
            e @ (RegistrationError::TaxIdTaken
            | RegistrationError::UserNameTaken
            | RegistrationError::IdInUse { .. }
            | RegistrationError::Conflict) => ApiErrorCode::Conflict(e.to_string()),
            RegistrationError::Store(e) => ApiErrorCode::internal(e),
            RegistrationError::InternalError(e) => ApiErrorCode::internal(e),
        }
    }
}

impl From<LookupError> for ApiErrorCode {
    fn from(error: LookupError) -> Self {
        match error {
            LookupError::Validation(msg) => ApiErrorCode::InvalidInput(msg),
            LookupError::NotFound(msg) => ApiErrorCode::NotFound(msg),
            LookupError::Store(e) => ApiErrorCode::internal(e),
        }
    }
}
