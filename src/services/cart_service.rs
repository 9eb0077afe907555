use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    audit,
    db::DbPool,
    dto::cart::{AddToCartRequest, CartLine, CartList, UpdateCartItemRequest},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{CartItem, Product},
    response::{ApiResponse, Meta},
    state::AppState,
};

#[derive(FromRow)]
struct CartWithProductRow {
    cart_id: Uuid,
    quantity: i32,
    #[sqlx(flatten)]
    product: Product,
}

pub async fn list_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<CartList>> {
    let rows = sqlx::query_as::<_, CartWithProductRow>(
        r#"
        SELECT ci.id AS cart_id, ci.quantity,
               p.id, p.seller_id, p.name, p.description, p.price, p.image_url,
               p.category, p.color, p.material, p.created_at, p.updated_at
        FROM cart_items ci
        JOIN products p ON p.id = ci.product_id
        WHERE ci.user_id = $1
        ORDER BY ci.created_at DESC
        "#,
    )
    .bind(user.user_id)
    .fetch_all(&state.pool)
    .await?;

    let items: Vec<CartLine> = rows
        .into_iter()
        .map(|row| CartLine::new(row.cart_id, row.product, row.quantity))
        .collect();
    let total = items.len() as i64;

    let meta = Meta::new(1, total, total);
    Ok(ApiResponse::success("OK", CartList::new(items), Some(meta)))
}

pub(crate) async fn ensure_product_exists(pool: &DbPool, product_id: Uuid) -> AppResult<()> {
    let product_exist: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM products WHERE id = $1")
        .bind(product_id)
        .fetch_optional(pool)
        .await?;
    match product_exist {
        Some(_) => Ok(()),
        None => Err(AppError::Missing("Product")),
    }
}

/// Inserts the line or increments an existing one in a single statement.
pub(crate) async fn upsert_cart_line<'e, E>(
    executor: E,
    user_id: Uuid,
    product_id: Uuid,
    quantity: i32,
) -> Result<CartItem, sqlx::Error>
where
    E: sqlx::PgExecutor<'e>,
{
    sqlx::query_as::<_, CartItem>(
        r#"
        INSERT INTO cart_items (id, user_id, product_id, quantity)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (user_id, product_id)
        DO UPDATE SET quantity = cart_items.quantity + EXCLUDED.quantity,
                      updated_at = now()
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user_id)
    .bind(product_id)
    .bind(quantity)
    .fetch_one(executor)
    .await
}

pub async fn add_to_cart(
    state: &AppState,
    user: &AuthUser,
    payload: AddToCartRequest,
) -> AppResult<ApiResponse<CartItem>> {
    if payload.quantity < 1 {
        return Err(AppError::bad_request("quantity must be at least 1"));
    }
    ensure_product_exists(&state.pool, payload.product_id).await?;

    let cart_item =
        upsert_cart_line(&state.pool, user.user_id, payload.product_id, payload.quantity).await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "cart_add",
        "cart_items",
        serde_json::json!({ "product_id": payload.product_id, "quantity": payload.quantity }),
    )
    .await;

    Ok(ApiResponse::success("Added to cart", cart_item, None))
}

pub async fn update_quantity(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
    payload: UpdateCartItemRequest,
) -> AppResult<ApiResponse<CartItem>> {
    // zero is not a shortcut for "save for later"
    if payload.quantity < 1 {
        return Err(AppError::bad_request("quantity must be at least 1"));
    }

    let cart_item = sqlx::query_as::<_, CartItem>(
        r#"
        UPDATE cart_items
        SET quantity = $3, updated_at = now()
        WHERE user_id = $1 AND product_id = $2
        RETURNING *
        "#,
    )
    .bind(user.user_id)
    .bind(product_id)
    .bind(payload.quantity)
    .fetch_optional(&state.pool)
    .await?
    .ok_or(AppError::NotFound)?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "cart_update",
        "cart_items",
        serde_json::json!({ "product_id": product_id, "quantity": payload.quantity }),
    )
    .await;

    Ok(ApiResponse::success("Cart updated", cart_item, None))
}

pub async fn remove_from_cart(
    state: &AppState,
    user: &AuthUser,
    product_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = sqlx::query("DELETE FROM cart_items WHERE product_id = $1 AND user_id = $2")
        .bind(product_id)
        .bind(user.user_id)
        .execute(&state.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        &state.pool,
        Some(user.user_id),
        "cart_remove",
        "cart_items",
        serde_json::json!({ "product_id": product_id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Removed from cart",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

/// Empties the cart; saved items live in their own table and are untouched.
pub async fn clear_cart(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = sqlx::query("DELETE FROM cart_items WHERE user_id = $1")
        .bind(user.user_id)
        .execute(&state.pool)
        .await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "cart_clear",
        "cart_items",
        serde_json::json!({ "removed": result.rows_affected() }),
    )
    .await;

    Ok(ApiResponse::success(
        "Cart cleared",
        serde_json::json!({ "removed": result.rows_affected() }),
        Some(Meta::empty()),
    ))
}
