use axum::{
    Json, Router,
    extract::State,
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::products::{CategoryList, ProductDetail, ProductList, ProductProperties},
    error::AppResult,
    middleware::extract::{AppPath, AppQuery},
    response::ApiResponse,
    routes::params::{FeaturedQuery, ProductQuery},
    services::product_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_products))
        .route("/categories", get(list_categories))
        .route("/featured", get(list_featured))
        .route("/properties", get(list_properties))
        .route("/{id}", get(get_product))
}

#[utoipa::path(
    get,
    path = "/api/products",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("q" = Option<String>, Query, description = "Search in name and description"),
        ("category" = Option<String>, Query, description = "Category, case-insensitive"),
        ("color" = Option<String>, Query, description = "Color, case-insensitive"),
        ("material" = Option<String>, Query, description = "Material, case-insensitive"),
        ("seller_id" = Option<Uuid>, Query, description = "Only this seller's products"),
        ("min_price" = Option<String>, Query, description = "Lowest price"),
        ("max_price" = Option<String>, Query, description = "Highest price"),
        ("sort_by" = Option<String>, Query, description = "created_at, price or name"),
        ("sort_order" = Option<String>, Query, description = "asc or desc"),
    ),
    responses(
        (status = 200, description = "List products", body = ApiResponse<ProductList>)
    ),
    tag = "Products"
)]
pub async fn list_products(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<ProductQuery>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    Ok(Json(product_service::list_products(&state, query).await?))
}

#[utoipa::path(
    get,
    path = "/api/products/{id}",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Product with its seller", body = ApiResponse<ProductDetail>),
        (status = 404, description = "Product not found"),
    ),
    tag = "Products"
)]
pub async fn get_product(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<ApiResponse<ProductDetail>>> {
    Ok(Json(product_service::get_product(&state, id).await?))
}

#[utoipa::path(
    get,
    path = "/api/products/categories",
    responses(
        (status = 200, description = "Distinct categories", body = ApiResponse<CategoryList>)
    ),
    tag = "Products"
)]
pub async fn list_categories(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<CategoryList>>> {
    Ok(Json(product_service::list_categories(&state).await?))
}

#[utoipa::path(
    get,
    path = "/api/products/featured",
    params(
        ("limit" = Option<u64>, Query, description = "How many, default 8, at most 50")
    ),
    responses(
        (status = 200, description = "Newest products", body = ApiResponse<ProductList>)
    ),
    tag = "Products"
)]
pub async fn list_featured(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<FeaturedQuery>,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    Ok(Json(product_service::list_featured(&state, query).await?))
}

#[utoipa::path(
    get,
    path = "/api/products/properties",
    responses(
        (status = 200, description = "Distinct colors and materials", body = ApiResponse<ProductProperties>)
    ),
    tag = "Products"
)]
pub async fn list_properties(
    State(state): State<AppState>,
) -> AppResult<Json<ApiResponse<ProductProperties>>> {
    Ok(Json(product_service::list_properties(&state).await?))
}
