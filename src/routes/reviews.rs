use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::get,
};

use crate::{
    dto::reviews::{CreateReviewRequest, ReviewList, ReviewQuery},
    error::AppResult,
    middleware::{
        auth::AuthUser,
        extract::{AppJson, AppQuery},
    },
    models::Review,
    response::ApiResponse,
    services::review_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_reviews).post(create_review))
}

#[utoipa::path(
    get,
    path = "/api/reviews",
    params(
        ("product_id" = Option<uuid::Uuid>, Query, description = "Reviews of a product"),
        ("seller_id" = Option<uuid::Uuid>, Query, description = "Reviews of a seller"),
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
    ),
    responses(
        (status = 200, description = "Reviews, newest first, with the average", body = ApiResponse<ReviewList>),
        (status = 400, description = "Neither or both targets given"),
    ),
    tag = "Reviews"
)]
pub async fn list_reviews(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<ReviewQuery>,
) -> AppResult<Json<ApiResponse<ReviewList>>> {
    Ok(Json(review_service::list_reviews(&state, query).await?))
}

#[utoipa::path(
    post,
    path = "/api/reviews",
    request_body = CreateReviewRequest,
    responses(
        (status = 201, description = "Review created", body = ApiResponse<Review>),
        (status = 400, description = "Invalid review"),
        (status = 404, description = "Unknown product or seller"),
        (status = 409, description = "Already reviewed"),
    ),
    security(("bearer_auth" = [])),
    tag = "Reviews"
)]
pub async fn create_review(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(payload): AppJson<CreateReviewRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Review>>)> {
    let resp = review_service::create_review(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}
