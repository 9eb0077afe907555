use axum::{Json, extract::State, http::StatusCode};

use crate::{
    dto::profile::ContactRequest,
    error::AppResult,
    middleware::{auth::MaybeAuthUser, extract::AppJson},
    models::ContactMessage,
    response::ApiResponse,
    services::profile_service,
    state::AppState,
};

#[utoipa::path(
    post,
    path = "/api/contact",
    request_body = ContactRequest,
    responses(
        (status = 201, description = "Message recorded", body = ApiResponse<ContactMessage>),
        (status = 400, description = "Missing fields"),
    ),
    tag = "Contact"
)]
pub async fn submit_contact(
    State(state): State<AppState>,
    user: MaybeAuthUser,
    AppJson(payload): AppJson<ContactRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<ContactMessage>>)> {
    let resp = profile_service::submit_contact(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}
