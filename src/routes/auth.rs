use crate::dto::auth_dto::{LoginPayload, RegisterPayload, TokenResponse, UserResponse};
use crate::error::{Error, Result};
use crate::middleware::auth::Claims;
use crate::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    Extension, Form, Json,
};
use validator::Validate;

#[axum::debug_handler]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let user = state
        .auth_service
        .register(&payload.username, &payload.password)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(UserResponse {
            id: user.id,
            username: user.username,
        }),
    ))
}

#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    Form(payload): Form<LoginPayload>,
) -> Result<impl IntoResponse> {
    let token = state
        .auth_service
        .login(&payload.username, &payload.password)
        .await?;
    Ok(Json(TokenResponse {
        access_token: token,
        token_type: "bearer".to_string(),
    }))
}

/// Current-user probe for authenticated clients.
#[axum::debug_handler]
pub async fn protected(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse> {
    let user_id = claims
        .user_id()
        .ok_or_else(|| Error::Unauthorized("Malformed token subject".to_string()))?;
    let user = state.auth_service.get_user(user_id).await?;
    Ok(Json(UserResponse {
        id: user.id,
        username: user.username,
    }))
}
