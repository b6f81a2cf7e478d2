use crate::dto::test_dto::{CreateTestPayload, GenerateVariationPayload, GetTestQuery};
use crate::error::{Error, Result};
use crate::middleware::auth::Claims;
use crate::services::variation_service::{FallbackPolicy, VariationRequest};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde_json::json;
use validator::Validate;

const MATH_CATEGORY: &str = "Математика";

fn current_user_id(claims: &Claims) -> Result<i32> {
    claims
        .user_id()
        .ok_or_else(|| Error::Unauthorized("Malformed token subject".to_string()))
}

#[axum::debug_handler]
pub async fn list_tests(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse> {
    let user_id = current_user_id(&claims)?;
    let tests = state.test_service.list_tests_for_user(user_id).await?;
    Ok(Json(tests))
}

#[axum::debug_handler]
pub async fn create_test(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateTestPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let user_id = current_user_id(&claims)?;
    let mut test = state.test_service.create_test(payload, user_id).await?;

    // best-effort: a failed classification just leaves the category empty
    if let Some(category) = state
        .classifier
        .classify_test(&test.title, test.description.as_deref(), &[])
        .await
    {
        state.test_service.set_category(test.id, &category).await?;
        test.category = Some(category.chars().take(100).collect());
    }

    Ok((StatusCode::CREATED, Json(test)))
}

/// Fetching a test for a sitting produces a fresh student-only variation of
/// it and returns that variation with its questions. Generation failures
/// degrade per question by carrying the source question over, so the student
/// always receives a complete test.
#[axum::debug_handler]
pub async fn get_test(
    State(state): State<AppState>,
    Path(test_id): Path<i32>,
    Query(_query): Query<GetTestQuery>,
) -> Result<impl IntoResponse> {
    let test = state
        .test_service
        .get_test(test_id)
        .await?
        .ok_or_else(|| Error::NotFound("Test not found".to_string()))?;

    if test.category.as_deref() != Some(MATH_CATEGORY) {
        let question_texts = state.question_service.list_question_texts(test.id).await?;
        if let Some(category) = state
            .classifier
            .classify_test(&test.title, test.description.as_deref(), &question_texts)
            .await
        {
            // only a confident math classification overrides the stored category
            if category == MATH_CATEGORY {
                state.test_service.set_category(test.id, &category).await?;
            }
        }
    }

    let description = format!(
        "{}\n(Автоматически сгенерированный вариант)",
        test.description.clone().unwrap_or_default()
    );
    let request = VariationRequest {
        source_test_id: test.id,
        new_title: Some(format!("{} (Вариант)", test.title)),
        new_description: Some(description),
        user_id: test.user_id,
        student_only: true,
        fallback: FallbackPolicy::CopySource,
    };
    let new_test_id = state.variation_service.create_test_variation(request).await?;

    let variation = state
        .test_service
        .get_test_with_questions(new_test_id)
        .await?;
    Ok(Json(variation))
}

#[axum::debug_handler]
pub async fn delete_test(
    State(state): State<AppState>,
    Path(test_id): Path<i32>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse> {
    let user_id = current_user_id(&claims)?;
    let deleted = state.test_service.delete_test(test_id, user_id).await?;
    if !deleted {
        return Err(Error::NotFound(
            "Test not found or not authorized to delete this test".to_string(),
        ));
    }
    Ok(Json(json!({ "message": "Test deleted successfully" })))
}

/// Author-side batch generation: marks the source test as a template and
/// produces a persistent variation. Questions whose generation fails are
/// skipped, so the variation may end up smaller than the source.
#[axum::debug_handler]
pub async fn generate_variation(
    State(state): State<AppState>,
    Path(test_id): Path<i32>,
    Extension(claims): Extension<Claims>,
    payload: Option<Json<GenerateVariationPayload>>,
) -> Result<impl IntoResponse> {
    let payload = payload.map(|Json(p)| p).unwrap_or_default();
    let user_id = current_user_id(&claims)?;
    let test = state
        .test_service
        .get_test(test_id)
        .await?
        .filter(|t| t.user_id == Some(user_id))
        .ok_or_else(|| {
            Error::NotFound("Test not found or not authorized to access this test".to_string())
        })?;

    state.test_service.mark_template(test.id).await?;

    let request = VariationRequest {
        source_test_id: test.id,
        new_title: payload
            .new_title
            .or_else(|| Some(format!("{} (Варіація)", test.title))),
        new_description: None,
        user_id: Some(user_id),
        student_only: false,
        fallback: FallbackPolicy::SkipQuestion,
    };
    let new_test_id = state.variation_service.create_test_variation(request).await?;

    let variation = state
        .test_service
        .get_test_with_questions(new_test_id)
        .await?;
    Ok(Json(variation))
}
