use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{delete, get, post, put},
};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    dto::{
        profile::CustomerProfile,
        saved::{SaveItemRequest, SavedList},
    },
    error::AppResult,
    middleware::{
        auth::AuthUser,
        extract::{AppJson, AppPath},
    },
    models::{CartItem, ProfileKind, ProfileRecord, SavedItem},
    response::ApiResponse,
    services::{profile_service, saved_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/saved", get(list_saved).post(save_for_later))
        .route("/saved/{id}", delete(remove_saved))
        .route("/saved/{id}/cart", post(move_saved_to_cart))
        .route("/profile", get(get_profile))
        .route("/profile/address", put(put_address))
        .route("/profile/payment", put(put_payment))
}

#[utoipa::path(
    get,
    path = "/api/customer/saved",
    responses(
        (status = 200, description = "Saved-for-later items, newest first", body = ApiResponse<SavedList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Customer"
)]
pub async fn list_saved(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<SavedList>>> {
    Ok(Json(saved_service::list_saved(&state, &user).await?))
}

#[utoipa::path(
    post,
    path = "/api/customer/saved",
    request_body = SaveItemRequest,
    responses(
        (status = 201, description = "Saved for later", body = ApiResponse<SavedItem>),
        (status = 404, description = "Product not found"),
        (status = 409, description = "Already saved"),
    ),
    security(("bearer_auth" = [])),
    tag = "Customer"
)]
pub async fn save_for_later(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(payload): AppJson<SaveItemRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<SavedItem>>)> {
    let resp = saved_service::save_for_later(&state, &user, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    delete,
    path = "/api/customer/saved/{id}",
    params(
        ("id" = Uuid, Path, description = "Saved item ID")
    ),
    responses(
        (status = 200, description = "Removed", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "Saved item not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Customer"
)]
pub async fn remove_saved(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<ApiResponse<Value>>> {
    Ok(Json(saved_service::unsave(&state, &user, id).await?))
}

#[utoipa::path(
    post,
    path = "/api/customer/saved/{id}/cart",
    params(
        ("id" = Uuid, Path, description = "Saved item ID")
    ),
    responses(
        (status = 200, description = "Moved into the cart", body = ApiResponse<CartItem>),
        (status = 404, description = "Saved item not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Customer"
)]
pub async fn move_saved_to_cart(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<ApiResponse<CartItem>>> {
    Ok(Json(saved_service::move_to_cart(&state, &user, id).await?))
}

#[utoipa::path(
    get,
    path = "/api/customer/profile",
    responses(
        (status = 200, description = "Account with address and payment records", body = ApiResponse<CustomerProfile>)
    ),
    security(("bearer_auth" = [])),
    tag = "Customer"
)]
pub async fn get_profile(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<CustomerProfile>>> {
    Ok(Json(profile_service::get_profile(&state, &user).await?))
}

#[utoipa::path(
    put,
    path = "/api/customer/profile/address",
    request_body = serde_json::Value,
    responses(
        (status = 200, description = "Address saved", body = ApiResponse<ProfileRecord>),
        (status = 400, description = "Body is not a JSON object"),
    ),
    security(("bearer_auth" = [])),
    tag = "Customer"
)]
pub async fn put_address(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(payload): AppJson<Value>,
) -> AppResult<Json<ApiResponse<ProfileRecord>>> {
    let resp = profile_service::upsert_record(&state, &user, ProfileKind::Address, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/customer/profile/payment",
    request_body = serde_json::Value,
    responses(
        (status = 200, description = "Payment details saved, card number masked", body = ApiResponse<ProfileRecord>),
        (status = 400, description = "Body is not a JSON object"),
    ),
    security(("bearer_auth" = [])),
    tag = "Customer"
)]
pub async fn put_payment(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(payload): AppJson<Value>,
) -> AppResult<Json<ApiResponse<ProfileRecord>>> {
    let resp = profile_service::upsert_record(&state, &user, ProfileKind::Payment, payload).await?;
    Ok(Json(resp))
}
