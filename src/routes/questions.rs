use crate::dto::question_dto::CreateQuestionPayload;
use crate::error::{Error, Result};
use crate::middleware::auth::Claims;
use crate::services::classifier;
use crate::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse, Extension, Json};
use validator::Validate;

const MATH_CATEGORY: &str = "Математика";

#[axum::debug_handler]
pub async fn create_question(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateQuestionPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let user_id = claims
        .user_id()
        .ok_or_else(|| Error::Unauthorized("Malformed token subject".to_string()))?;

    let test = state
        .test_service
        .get_test(payload.test_id)
        .await?
        .ok_or_else(|| Error::NotFound("Test not found".to_string()))?;
    if test.user_id != Some(user_id) {
        return Err(Error::Forbidden(
            "Not authorized to add questions to this test".to_string(),
        ));
    }

    let text_is_math = payload.text.to_lowercase().contains("математик");
    let topic = if test.category.as_deref() == Some(MATH_CATEGORY)
        || (test.category.is_none() && text_is_math)
    {
        Some(classifier::keyword_topic(&payload.text))
    } else {
        None
    };

    let created = state.question_service.create_question(&payload, topic).await?;

    // re-classify the whole test now that its question set changed
    let question_texts = state.question_service.list_question_texts(test.id).await?;
    if !question_texts.is_empty() {
        if let Some(category) = state
            .classifier
            .classify_test(&test.title, test.description.as_deref(), &question_texts)
            .await
        {
            if test.category.as_deref() != Some(category.as_str()) {
                state.test_service.set_category(test.id, &category).await?;
            }
        }
    }

    Ok((StatusCode::CREATED, Json(created)))
}
