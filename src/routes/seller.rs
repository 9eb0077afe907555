use axum::{
    Json, Router,
    extract::{Multipart, State},
    http::StatusCode,
    routing::{get, put},
};
use uuid::Uuid;

use crate::{
    dto::{
        analytics::SellerAnalytics,
        products::{ProductForm, ProductList},
        seller_orders::{SellerOrder, SellerOrderList, UpdateOrderStatusRequest},
        sellers::SellerProfileForm,
    },
    error::AppResult,
    middleware::{
        auth::AuthUser,
        extract::{AppJson, AppPath},
    },
    models::{Product, Seller},
    response::ApiResponse,
    services::{analytics_service, product_service, seller_order_service, seller_service},
    state::AppState,
    upload::FormData,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/profile", get(get_profile).post(create_profile).put(update_profile))
        .route("/products", get(list_products).post(create_product))
        .route(
            "/products/{id}",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/orders", get(list_orders))
        .route("/orders/{id}", get(get_order).put(update_order_status))
        .route("/orders/{id}/status", put(update_order_status))
        .route("/analytics", get(analytics))
}

#[utoipa::path(
    get,
    path = "/api/seller/profile",
    responses(
        (status = 200, description = "The signed-in seller's profile", body = ApiResponse<Seller>),
        (status = 403, description = "Not a seller account"),
        (status = 404, description = "No profile yet"),
    ),
    security(("bearer_auth" = [])),
    tag = "Seller"
)]
pub async fn get_profile(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<Seller>>> {
    Ok(Json(seller_service::get_profile(&state, &user).await?))
}

#[utoipa::path(
    post,
    path = "/api/seller/profile",
    request_body(content = SellerProfileForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Profile created", body = ApiResponse<Seller>),
        (status = 400, description = "Missing name or shop name"),
        (status = 403, description = "Not a seller account"),
        (status = 409, description = "Profile already exists"),
    ),
    security(("bearer_auth" = [])),
    tag = "Seller"
)]
pub async fn create_profile(
    State(state): State<AppState>,
    user: AuthUser,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<ApiResponse<Seller>>)> {
    let form = FormData::from_multipart(multipart).await?;
    let resp = seller_service::create_profile(&state, &user, form).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    put,
    path = "/api/seller/profile",
    request_body(content = SellerProfileForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Profile updated", body = ApiResponse<Seller>),
        (status = 403, description = "Not a seller account"),
        (status = 404, description = "No profile yet"),
    ),
    security(("bearer_auth" = [])),
    tag = "Seller"
)]
pub async fn update_profile(
    State(state): State<AppState>,
    user: AuthUser,
    multipart: Multipart,
) -> AppResult<Json<ApiResponse<Seller>>> {
    let form = FormData::from_multipart(multipart).await?;
    Ok(Json(seller_service::update_profile(&state, &user, form).await?))
}

#[utoipa::path(
    get,
    path = "/api/seller/products",
    responses(
        (status = 200, description = "The seller's own products", body = ApiResponse<ProductList>),
        (status = 403, description = "Not a seller account"),
    ),
    security(("bearer_auth" = [])),
    tag = "Seller"
)]
pub async fn list_products(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<ProductList>>> {
    Ok(Json(product_service::list_seller_products(&state, &user).await?))
}

#[utoipa::path(
    post,
    path = "/api/seller/products",
    request_body(content = ProductForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Product created", body = ApiResponse<Product>),
        (status = 400, description = "Invalid product fields or image"),
        (status = 403, description = "Not a seller account"),
    ),
    security(("bearer_auth" = [])),
    tag = "Seller"
)]
pub async fn create_product(
    State(state): State<AppState>,
    user: AuthUser,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<ApiResponse<Product>>)> {
    let form = FormData::from_multipart(multipart).await?;
    let resp = product_service::create_product(&state, &user, form).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

#[utoipa::path(
    get,
    path = "/api/seller/products/{id}",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "One of the seller's products", body = ApiResponse<Product>),
        (status = 404, description = "Not found or not owned"),
    ),
    security(("bearer_auth" = [])),
    tag = "Seller"
)]
pub async fn get_product(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<ApiResponse<Product>>> {
    Ok(Json(product_service::get_seller_product(&state, &user, id).await?))
}

#[utoipa::path(
    put,
    path = "/api/seller/products/{id}",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    request_body(content = ProductForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Product updated", body = ApiResponse<Product>),
        (status = 404, description = "Not found or not owned"),
    ),
    security(("bearer_auth" = [])),
    tag = "Seller"
)]
pub async fn update_product(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(id): AppPath<Uuid>,
    multipart: Multipart,
) -> AppResult<Json<ApiResponse<Product>>> {
    let form = FormData::from_multipart(multipart).await?;
    Ok(Json(product_service::update_product(&state, &user, id, form).await?))
}

#[utoipa::path(
    delete,
    path = "/api/seller/products/{id}",
    params(
        ("id" = Uuid, Path, description = "Product ID")
    ),
    responses(
        (status = 200, description = "Product deleted", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "Not found or not owned"),
        (status = 409, description = "Product appears in orders"),
    ),
    security(("bearer_auth" = [])),
    tag = "Seller"
)]
pub async fn delete_product(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    Ok(Json(product_service::delete_product(&state, &user, id).await?))
}

#[utoipa::path(
    get,
    path = "/api/seller/orders",
    responses(
        (status = 200, description = "Orders containing the seller's products, scoped to them", body = ApiResponse<SellerOrderList>),
        (status = 403, description = "Not a seller account"),
    ),
    security(("bearer_auth" = [])),
    tag = "Seller"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<SellerOrderList>>> {
    Ok(Json(seller_order_service::list_seller_orders(&state, &user).await?))
}

#[utoipa::path(
    get,
    path = "/api/seller/orders/{id}",
    params(
        ("id" = Uuid, Path, description = "Order ID")
    ),
    responses(
        (status = 200, description = "The seller's slice of the order", body = ApiResponse<SellerOrder>),
        (status = 404, description = "Order holds none of the seller's products"),
    ),
    security(("bearer_auth" = [])),
    tag = "Seller"
)]
pub async fn get_order(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> AppResult<Json<ApiResponse<SellerOrder>>> {
    Ok(Json(seller_order_service::get_seller_order(&state, &user, id).await?))
}

#[utoipa::path(
    put,
    path = "/api/seller/orders/{id}/status",
    params(
        ("id" = Uuid, Path, description = "Order ID")
    ),
    request_body = UpdateOrderStatusRequest,
    responses(
        (status = 200, description = "Status changed", body = ApiResponse<SellerOrder>),
        (status = 400, description = "Unknown status or disallowed transition"),
        (status = 404, description = "Order holds none of the seller's products"),
        (status = 409, description = "Status changed concurrently"),
    ),
    security(("bearer_auth" = [])),
    tag = "Seller"
)]
pub async fn update_order_status(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<UpdateOrderStatusRequest>,
) -> AppResult<Json<ApiResponse<SellerOrder>>> {
    let resp = seller_order_service::update_order_status(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/seller/analytics",
    responses(
        (status = 200, description = "Sales totals, top products and monthly revenue", body = ApiResponse<SellerAnalytics>),
        (status = 403, description = "Not a seller account"),
    ),
    security(("bearer_auth" = [])),
    tag = "Seller"
)]
pub async fn analytics(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<SellerAnalytics>>> {
    Ok(Json(analytics_service::seller_analytics(&state, &user).await?))
}
