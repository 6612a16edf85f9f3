//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::cache::CacheError;
use crate::cart::{CartError, SessionError};
use crate::content::ContentError;
use crate::shopify::ShopifyError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Shopify API operation failed.
    #[error("Shopify error: {0}")]
    Shopify(#[from] ShopifyError),

    /// Content API operation failed.
    #[error("Content error: {0}")]
    Content(#[from] ContentError),

    /// Cache store operation failed.
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// Session operation failed.
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Request could not be authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

// Cart validation failures are client errors; everything else the workflow
// surfaces keeps its own classification.
impl From<CartError> for AppError {
    fn from(err: CartError) -> Self {
        match err {
            CartError::InvalidInput(msg) => Self::BadRequest(msg),
            CartError::Shopify(e) => Self::Shopify(e),
            CartError::Session(e) => Self::Session(e),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if matches!(
            self,
            Self::Internal(_)
                | Self::Cache(_)
                | Self::Session(_)
                | Self::Content(_)
                | Self::Shopify(_)
        ) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let status = match &self {
            Self::Internal(_) | Self::Cache(_) | Self::Session(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            // Shopify's own rejection of the request is the caller's fault.
            Self::Shopify(ShopifyError::UserError(_)) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Shopify(_) | Self::Content(_) => StatusCode::BAD_GATEWAY,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        };

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Internal(_) | Self::Cache(_) | Self::Session(_) => {
                "Internal server error".to_string()
            }
            // User errors pass through verbatim so the caller can fix the
            // request.
            Self::Shopify(ShopifyError::UserError(msg)) => msg.clone(),
            Self::Shopify(_) | Self::Content(_) => "External service error".to_string(),
            _ => self.to_string(),
        };

        (status, message).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("product-123".to_string());
        assert_eq!(err.to_string(), "Not found: product-123");

        let err = AppError::BadRequest("invalid input".to_string());
        assert_eq!(err.to_string(), "Bad request: invalid input");
    }

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::BadRequest("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_user_errors_are_unprocessable_with_verbatim_message() {
        let err = AppError::Shopify(ShopifyError::UserError(
            "quantity: Exceeds available stock".to_string(),
        ));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn test_invalid_cart_input_maps_to_bad_request() {
        let err: AppError = CartError::InvalidInput("quantity out of range".to_string()).into();
        assert_eq!(get_status(err), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_upstream_failures_are_bad_gateway() {
        let err = AppError::Shopify(ShopifyError::GraphQL(vec![
            crate::shopify::GraphQLError::message("boom"),
        ]));
        assert_eq!(get_status(err), StatusCode::BAD_GATEWAY);
    }
}
