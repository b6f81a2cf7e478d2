use crate::dto::result_dto::CreateResultPayload;
use crate::error::Result;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use validator::Validate;

/// Students submit results without authentication; the sitting link itself
/// is the credential.
#[axum::debug_handler]
pub async fn create_result(
    State(state): State<AppState>,
    Json(payload): Json<CreateResultPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let result = state.result_service.create_result(payload).await?;
    Ok((StatusCode::CREATED, Json(result)))
}

#[axum::debug_handler]
pub async fn list_results_for_test(
    State(state): State<AppState>,
    Path(test_id): Path<i32>,
) -> Result<impl IntoResponse> {
    let results = state.result_service.list_results_for_test(test_id).await?;
    Ok(Json(results))
}
