//! API error type rendered as `{"error": message}`.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

use dda_rpc::RpcError;
use dda_wallet::WalletError;

/// Message returned to requests that need an unlocked wallet.
pub const NOT_UNLOCKED: &str = "Not unlocked. Create or restore wallet first.";

#[derive(Debug)]
pub enum ApiError {
    /// 400: the request or the node rejected the operation.
    BadRequest(String),
    /// 401: no live session.
    Unauthorized,
    /// 502: the node could not be reached or answered garbage.
    Upstream(String),
    /// 500: failure on our side.
    Internal(String),
}

impl ApiError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        ApiError::BadRequest(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Upstream(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(m) | ApiError::Upstream(m) | ApiError::Internal(m) => m,
            ApiError::Unauthorized => NOT_UNLOCKED,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.message() }))).into_response()
    }
}

impl From<WalletError> for ApiError {
    fn from(e: WalletError) -> Self {
        match e {
            WalletError::KeyDerivation(_) | WalletError::Signing(_) => {
                ApiError::Internal(e.to_string())
            }
            WalletError::Amount(_) => ApiError::bad_request("Invalid amount"),
            other => ApiError::BadRequest(other.to_string()),
        }
    }
}

impl From<RpcError> for ApiError {
    fn from(e: RpcError) -> Self {
        match e {
            RpcError::Node { .. } => ApiError::BadRequest(e.to_string()),
            other => ApiError::Upstream(other.to_string()),
        }
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use dda_core::AmountError;
    use dda_rpc::ConnectFailure;

    #[test]
    fn statuses() {
        assert_eq!(ApiError::Unauthorized.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ApiError::Unauthorized.message(), NOT_UNLOCKED);
        assert_eq!(ApiError::bad_request("x").status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn rpc_node_error_is_client_error() {
        let e: ApiError = RpcError::Node {
            code: Some(-26),
            message: "TX rejected".into(),
        }
        .into();
        assert_eq!(e.status(), StatusCode::BAD_REQUEST);
        assert_eq!(e.message(), "TX rejected");
    }

    #[test]
    fn rpc_transport_error_is_bad_gateway() {
        let e: ApiError = RpcError::Unreachable(ConnectFailure::Refused).into();
        assert_eq!(e.status(), StatusCode::BAD_GATEWAY);
        assert!(e.message().starts_with("Connection refused"));
        let e: ApiError = RpcError::AuthFailed.into();
        assert_eq!(e.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn wallet_errors() {
        let e: ApiError = WalletError::Amount(AmountError::Negative).into();
        assert_eq!(e.message(), "Invalid amount");
        let e: ApiError = WalletError::InsufficientFunds { have: 1, need: 2 }.into();
        assert_eq!(e.status(), StatusCode::BAD_REQUEST);
        let e: ApiError = WalletError::Signing("boom".into()).into();
        assert_eq!(e.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
