use crate::application::borrowing::BorrowingApplicationError;
use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use super::types::ErrorResponse;

/// API層のエラー型
///
/// アプリケーション層のエラーと、リクエストの抽出に失敗したエラーを
/// 同じエンベロープ形式のHTTPレスポンスにマッピングする。
#[derive(Debug)]
pub enum ApiError {
    Application(BorrowingApplicationError),
    /// ボディ・パス・クエリを解釈できない
    InvalidRequest(String),
}

impl From<BorrowingApplicationError> for ApiError {
    fn from(err: BorrowingApplicationError) -> Self {
        ApiError::Application(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::InvalidRequest(rejection.body_text())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        ApiError::InvalidRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::InvalidRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let err = match self {
            ApiError::Application(err) => err,
            ApiError::InvalidRequest(message) => {
                tracing::debug!(%message, "Rejected malformed request");
                let body = Json(ErrorResponse::new("INVALID_REQUEST", message));
                return (StatusCode::BAD_REQUEST, body).into_response();
            }
        };

        let message = err.to_string();
        let (status, error_type) = match err {
            // 400 Bad Request - 呼び出し側の入力に起因する
            BorrowingApplicationError::MissingId => (StatusCode::BAD_REQUEST, "ID_NOT_PROVIDED"),
            BorrowingApplicationError::BookNotFound(_) => {
                (StatusCode::BAD_REQUEST, "BOOK_NOT_FOUND")
            }
            BorrowingApplicationError::BorrowerNotFound(_) => {
                (StatusCode::BAD_REQUEST, "BORROWER_NOT_FOUND")
            }

            // 500 Internal Server Error - 回復不能な障害
            BorrowingApplicationError::ReturnTargetMissing(id) => {
                tracing::error!(borrowing_id = %id, "Return requested for missing borrowing");
                (StatusCode::INTERNAL_SERVER_ERROR, "RETURN_TARGET_MISSING")
            }
            BorrowingApplicationError::StoreError(ref e) => {
                tracing::error!("Entity store error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "STORE_ERROR")
            }
            BorrowingApplicationError::TransactionError(ref e) => {
                tracing::error!("Transaction error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "TRANSACTION_ERROR")
            }
        };

        let body = Json(ErrorResponse::new(error_type, message));
        (status, body).into_response()
    }
}
