use chrono::{DateTime, Utc};
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    audit,
    dto::saved::{SaveItemRequest, SavedList, SavedProduct},
    entity::saved_items::{Column as SavedCol, Entity as SavedItems},
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{CartItem, Product, SavedItem},
    response::{ApiResponse, Meta},
    services::cart_service::{ensure_product_exists, upsert_cart_line},
    state::AppState,
};

#[derive(FromRow)]
struct SavedWithProductRow {
    saved_id: Uuid,
    saved_at: DateTime<Utc>,
    #[sqlx(flatten)]
    product: Product,
}

pub async fn list_saved(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<SavedList>> {
    let rows = sqlx::query_as::<_, SavedWithProductRow>(
        r#"
        SELECT s.id AS saved_id, s.created_at AS saved_at,
               p.id, p.seller_id, p.name, p.description, p.price, p.image_url,
               p.category, p.color, p.material, p.created_at, p.updated_at
        FROM saved_items s
        JOIN products p ON p.id = s.product_id
        WHERE s.user_id = $1
        ORDER BY s.created_at DESC
        "#,
    )
    .bind(user.user_id)
    .fetch_all(&state.pool)
    .await?;

    let items: Vec<SavedProduct> = rows
        .into_iter()
        .map(|row| SavedProduct {
            id: row.saved_id,
            saved_at: row.saved_at,
            product: row.product,
        })
        .collect();
    let total = items.len() as i64;

    Ok(ApiResponse::success(
        "OK",
        SavedList { items },
        Some(Meta::new(1, total, total)),
    ))
}

pub async fn save_for_later(
    state: &AppState,
    user: &AuthUser,
    payload: SaveItemRequest,
) -> AppResult<ApiResponse<SavedItem>> {
    ensure_product_exists(&state.pool, payload.product_id).await?;

    // the unique (user_id, product_id) constraint decides duplicates
    let saved = sqlx::query_as::<_, SavedItem>(
        r#"
        INSERT INTO saved_items (id, user_id, product_id)
        VALUES ($1, $2, $3)
        ON CONFLICT (user_id, product_id) DO NOTHING
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(user.user_id)
    .bind(payload.product_id)
    .fetch_optional(&state.pool)
    .await?
    .ok_or_else(|| AppError::conflict("Item already saved"))?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "saved_add",
        "saved_items",
        serde_json::json!({ "product_id": payload.product_id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Saved for later",
        saved,
        Some(Meta::empty()),
    ))
}

pub async fn unsave(
    state: &AppState,
    user: &AuthUser,
    saved_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = SavedItems::delete_many()
        .filter(SavedCol::Id.eq(saved_id))
        .filter(SavedCol::UserId.eq(user.user_id))
        .exec(&state.orm)
        .await?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        &state.pool,
        Some(user.user_id),
        "saved_remove",
        "saved_items",
        serde_json::json!({ "saved_id": saved_id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Removed from saved items",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

/// Moves a saved item into the cart (quantity 1) in one transaction.
pub async fn move_to_cart(
    state: &AppState,
    user: &AuthUser,
    saved_id: Uuid,
) -> AppResult<ApiResponse<CartItem>> {
    let mut tx = state.pool.begin().await?;

    let removed: Option<(Uuid,)> = sqlx::query_as(
        "DELETE FROM saved_items WHERE id = $1 AND user_id = $2 RETURNING product_id",
    )
    .bind(saved_id)
    .bind(user.user_id)
    .fetch_optional(&mut *tx)
    .await?;
    let Some((product_id,)) = removed else {
        return Err(AppError::NotFound);
    };

    let cart_item = upsert_cart_line(&mut *tx, user.user_id, product_id, 1).await?;
    tx.commit().await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "saved_move_to_cart",
        "cart_items",
        serde_json::json!({ "saved_id": saved_id, "product_id": product_id }),
    )
    .await;

    Ok(ApiResponse::success("Moved to cart", cart_item, None))
}
