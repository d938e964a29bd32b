use crate::application::borrowing::{
    ServiceDependencies, create_borrowing as execute_create_borrowing,
    delete_borrowing as execute_delete_borrowing, get_borrowing as execute_get_borrowing,
    list_borrowings as execute_list_borrowings, return_borrowing as execute_return_borrowing,
    update_borrowing as execute_update_borrowing,
};
use crate::domain::{
    commands::{DeleteBorrowing, ReturnBorrowing, UpdateBorrowing},
    value_objects::BorrowingId,
};
use axum::{
    Json,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, PathRejection, QueryRejection},
    },
    http::StatusCode,
};
use std::sync::Arc;
use uuid::Uuid;

use super::{
    error::ApiError,
    types::{
        BorrowingDetailsResponse, BorrowingResponse, CreateBorrowingRequest, ListBorrowingsQuery,
        ReturnBorrowingRequest, SuccessResponse, UpdateBorrowingRequest,
    },
};

// ============================================================================
// State
// ============================================================================

/// ハンドラー間で共有されるアプリケーション状態
#[derive(Clone)]
pub struct AppState {
    pub service_deps: ServiceDependencies,
}

type ApiResult<T> = Result<Json<SuccessResponse<T>>, ApiError>;

// ============================================================================
// Query handlers (GET)
// ============================================================================

/// GET /borrowings - 貸出記録の一覧取得
///
/// クエリパラメータ:
/// - status: ステータスでフィルタリング（ACTIVE, RETURNED）（オプション）
///
/// 各記録は書籍（title, description）と利用者（membershipId, name）で補完される。
pub async fn list_borrowings(
    State(state): State<Arc<AppState>>,
    query: Result<Query<ListBorrowingsQuery>, QueryRejection>,
) -> ApiResult<Vec<BorrowingDetailsResponse>> {
    let Query(query) = query?;
    let borrowings = execute_list_borrowings(&state.service_deps, query.to_query()).await?;

    Ok(Json(SuccessResponse::new(
        borrowings
            .into_iter()
            .map(BorrowingDetailsResponse::from)
            .collect(),
    )))
}

/// GET /borrowings/:id - 貸出記録をIDで取得
///
/// 見つからない場合もエラーではなく、dataがnullの成功レスポンスを返す。
pub async fn get_borrowing_by_id(
    State(state): State<Arc<AppState>>,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Option<BorrowingResponse>> {
    let Path(borrowing_id) = path?;
    let borrowing =
        execute_get_borrowing(&state.service_deps, BorrowingId::from_uuid(borrowing_id)).await?;

    Ok(Json(SuccessResponse::new(
        borrowing.map(BorrowingResponse::from),
    )))
}

// ============================================================================
// Command handlers (POST / PUT / DELETE)
// ============================================================================

/// POST /borrowings - 新しい貸出記録を作成
///
/// 書籍と利用者の存在確認、記録の挿入、利用者の貸出履歴への追記を
/// 1つのトランザクションで行う。
pub async fn create_borrowing(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateBorrowingRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SuccessResponse<BorrowingResponse>>), ApiError> {
    let Json(req) = payload?;
    let cmd = req.to_command(chrono::Utc::now());

    let created = execute_create_borrowing(&state.service_deps, cmd).await?;

    Ok((
        StatusCode::CREATED,
        Json(SuccessResponse::new(BorrowingResponse::from(created))),
    ))
}

async fn apply_update(
    state: &AppState,
    borrowing_id: Option<Uuid>,
    req: UpdateBorrowingRequest,
) -> ApiResult<Option<BorrowingResponse>> {
    let cmd = UpdateBorrowing {
        id: borrowing_id.map(BorrowingId::from_uuid),
        patch: req.into(),
        updated_at: chrono::Utc::now(),
    };

    let updated = execute_update_borrowing(&state.service_deps, cmd).await?;

    Ok(Json(SuccessResponse::new(
        updated.map(BorrowingResponse::from),
    )))
}

/// PUT /borrowings/:id - 貸出記録を更新
///
/// borrowDate, dueDateのみ変更可能。
pub async fn update_borrowing(
    State(state): State<Arc<AppState>>,
    path: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<UpdateBorrowingRequest>, JsonRejection>,
) -> ApiResult<Option<BorrowingResponse>> {
    let Path(borrowing_id) = path?;
    let Json(req) = payload?;
    apply_update(&state, Some(borrowing_id), req).await
}

/// PUT /borrowings - IDなしの更新（常に400）
///
/// ボディは読まない。
pub async fn update_borrowing_without_id(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Option<BorrowingResponse>> {
    apply_update(&state, None, UpdateBorrowingRequest::default()).await
}

async fn apply_delete(
    state: &AppState,
    borrowing_id: Option<Uuid>,
) -> ApiResult<Option<BorrowingResponse>> {
    let cmd = DeleteBorrowing {
        id: borrowing_id.map(BorrowingId::from_uuid),
    };

    let deleted = execute_delete_borrowing(&state.service_deps, cmd).await?;

    Ok(Json(SuccessResponse::new(
        deleted.map(BorrowingResponse::from),
    )))
}

/// DELETE /borrowings/:id - 貸出記録を削除
///
/// 利用者の貸出履歴からも同じトランザクションでIDを取り除く。
pub async fn delete_borrowing(
    State(state): State<Arc<AppState>>,
    path: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Option<BorrowingResponse>> {
    let Path(borrowing_id) = path?;
    apply_delete(&state, Some(borrowing_id)).await
}

/// DELETE /borrowings - IDなしの削除（常に400）
pub async fn delete_borrowing_without_id(
    State(state): State<Arc<AppState>>,
) -> ApiResult<Option<BorrowingResponse>> {
    apply_delete(&state, None).await
}

/// POST /borrowings/return - 書籍を返却
///
/// IDはボディで受け取る。記録が存在しない場合は500。
/// ボディが無い、または解釈できない場合はIDの指定なし（400）として扱う。
pub async fn return_borrowing(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ReturnBorrowingRequest>, JsonRejection>,
) -> ApiResult<BorrowingResponse> {
    let req = payload.map(|Json(req)| req).unwrap_or_default();
    let cmd = ReturnBorrowing {
        id: req.borrowing_id(),
        returned_at: chrono::Utc::now(),
    };

    let returned = execute_return_borrowing(&state.service_deps, cmd).await?;

    Ok(Json(SuccessResponse::new(BorrowingResponse::from(returned))))
}
