use axum::{
    Json, Router,
    extract::State,
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::sellers::{SellerDetail, SellerList},
    error::AppResult,
    middleware::extract::{AppPath, AppQuery},
    response::ApiResponse,
    routes::params::SellerQuery,
    services::seller_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_sellers))
        .route("/{id}", get(get_seller))
}

#[utoipa::path(
    get,
    path = "/api/sellers",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("q" = Option<String>, Query, description = "Search shop name and location"),
    ),
    responses(
        (status = 200, description = "Sellers with rating and sales", body = ApiResponse<SellerList>)
    ),
    tag = "Sellers"
)]
pub async fn list_sellers(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<SellerQuery>,
) -> AppResult<Json<ApiResponse<SellerList>>> {
    Ok(Json(seller_service::list_sellers(&state, query).await?))
}

#[utoipa::path(
    get,
    path = "/api/sellers/{id}",
    params(
        ("id" = Uuid, Path, description = "Seller ID")
    ),
    responses(
        (status = 200, description = "Seller profile and products", body = ApiResponse<SellerDetail>),
        (status = 404, description = "Seller not found"),
    ),
    tag = "Sellers"
)]
pub async fn get_seller(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<ApiResponse<SellerDetail>>> {
    Ok(Json(seller_service::get_seller(&state, id).await?))
}
