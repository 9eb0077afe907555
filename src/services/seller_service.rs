use std::collections::HashMap;

use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set,
};
use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    audit,
    dto::sellers::{
        NewSellerProfile, PublicSeller, SellerDetail, SellerList, SellerProfileChanges,
    },
    entity::{
        products::{Column as ProdCol, Entity as Products},
        sellers::{ActiveModel as SellerActive, Column as SellerCol, Entity as Sellers, Model as SellerModel},
    },
    error::{AppError, AppResult, orm_conflict_on_unique},
    middleware::auth::{AuthUser, ensure_seller},
    models::Seller,
    response::{ApiResponse, Meta},
    routes::params::SellerQuery,
    services::{contains_pattern, product_from_entity, seller_from_entity},
    state::AppState,
    upload::{self, FormData},
};

/// Seller record of the signed-in seller account.
pub(crate) async fn current_seller(state: &AppState, user: &AuthUser) -> AppResult<SellerModel> {
    ensure_seller(user)?;
    Sellers::find()
        .filter(SellerCol::UserId.eq(user.user_id))
        .one(&state.orm)
        .await?
        .ok_or(AppError::Missing("Seller profile"))
}

pub async fn get_profile(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<Seller>> {
    let seller = current_seller(state, user).await?;
    Ok(ApiResponse::success(
        "Seller profile",
        seller_from_entity(seller),
        Some(Meta::empty()),
    ))
}

pub async fn create_profile(
    state: &AppState,
    user: &AuthUser,
    mut form: FormData,
) -> AppResult<ApiResponse<Seller>> {
    ensure_seller(user)?;
    let input = NewSellerProfile::from_form(&form)?;

    let existing = Sellers::find()
        .filter(SellerCol::UserId.eq(user.user_id))
        .count(&state.orm)
        .await?;
    if existing > 0 {
        return Err(AppError::conflict("Seller profile already exists"));
    }

    let profile_image = match form.take_file("profile_image") {
        Some(file) => Some(upload::store_image(&state.config, "seller", file).await?),
        None => None,
    };

    let seller = SellerActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        name: Set(input.name),
        shop_name: Set(input.shop_name),
        profile_image: Set(profile_image.clone()),
        location: Set(input.location),
        bio: Set(input.bio),
        story: Set(input.story),
        contact: Set(input.contact.unwrap_or_else(|| user.email.clone())),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await
    .map_err(|e| orm_conflict_on_unique(e, "Seller profile already exists"));
    let seller = upload::discard_on_error(&state.config, profile_image.as_deref(), seller).await?;

    tracing::info!(seller_id = %seller.id, shop = %seller.shop_name, "seller profile created");
    audit::record(
        &state.pool,
        Some(user.user_id),
        "seller_profile_create",
        "sellers",
        serde_json::json!({ "seller_id": seller.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Seller profile created",
        seller_from_entity(seller),
        Some(Meta::empty()),
    ))
}

pub async fn update_profile(
    state: &AppState,
    user: &AuthUser,
    mut form: FormData,
) -> AppResult<ApiResponse<Seller>> {
    let existing = current_seller(state, user).await?;
    let changes = SellerProfileChanges::from_form(&form);
    let old_image = existing.profile_image.clone();

    let mut active: SellerActive = existing.into();
    if let Some(name) = changes.name {
        active.name = Set(name);
    }
    if let Some(shop_name) = changes.shop_name {
        active.shop_name = Set(shop_name);
    }
    if let Some(location) = changes.location {
        active.location = Set(Some(location));
    }
    if let Some(bio) = changes.bio {
        active.bio = Set(Some(bio));
    }
    if let Some(story) = changes.story {
        active.story = Set(Some(story));
    }
    if let Some(contact) = changes.contact {
        active.contact = Set(contact);
    }
    let new_image = match form.take_file("profile_image") {
        Some(file) => {
            let url = upload::store_image(&state.config, "seller", file).await?;
            active.profile_image = Set(Some(url.clone()));
            Some(url)
        }
        None => None,
    };
    active.updated_at = Set(chrono::Utc::now().into());

    let updated = active.update(&state.orm).await;
    let seller = upload::discard_on_error(&state.config, new_image.as_deref(), updated).await?;

    if new_image.is_some() {
        if let Some(old) = old_image {
            upload::remove_image(&state.config, &old).await;
        }
    }

    audit::record(
        &state.pool,
        Some(user.user_id),
        "seller_profile_update",
        "sellers",
        serde_json::json!({ "seller_id": seller.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Seller profile updated",
        seller_from_entity(seller),
        Some(Meta::empty()),
    ))
}

#[derive(FromRow)]
struct SellerStatsRow {
    seller_id: Uuid,
    rating: f64,
    review_count: i64,
    sales: i64,
}

#[derive(Debug, Clone, Copy, Default)]
struct SellerStats {
    rating: f64,
    review_count: i64,
    sales: i64,
}

/// Average review rating, review count and units sold per seller.
async fn seller_stats(state: &AppState, ids: &[Uuid]) -> AppResult<HashMap<Uuid, SellerStats>> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = sqlx::query_as::<_, SellerStatsRow>(
        r#"
        SELECT s.id AS seller_id,
               COALESCE((SELECT AVG(r.rating)::float8 FROM reviews r WHERE r.seller_id = s.id), 0) AS rating,
               (SELECT COUNT(*) FROM reviews r WHERE r.seller_id = s.id) AS review_count,
               COALESCE((SELECT SUM(oi.quantity)
                         FROM order_items oi
                         JOIN products p ON p.id = oi.product_id
                         WHERE p.seller_id = s.id), 0)::int8 AS sales
        FROM sellers s
        WHERE s.id = ANY($1)
        "#,
    )
    .bind(ids)
    .fetch_all(&state.pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|row| {
            let stats = SellerStats {
                rating: (row.rating * 10.0).round() / 10.0,
                review_count: row.review_count,
                sales: row.sales,
            };
            (row.seller_id, stats)
        })
        .collect())
}

fn public_seller(model: SellerModel, stats: SellerStats) -> PublicSeller {
    PublicSeller {
        seller: seller_from_entity(model),
        rating: stats.rating,
        review_count: stats.review_count,
        sales: stats.sales,
    }
}

pub async fn list_sellers(
    state: &AppState,
    query: SellerQuery,
) -> AppResult<ApiResponse<SellerList>> {
    let (page, limit, offset) = query.pagination().normalize();

    let mut condition = Condition::all();
    if let Some(search) = query.q.as_ref().map(|s| s.trim()).filter(|s| !s.is_empty()) {
        let pattern = contains_pattern(search);
        condition = condition.add(
            Condition::any()
                .add(Expr::col(SellerCol::ShopName).ilike(pattern.clone()))
                .add(Expr::col(SellerCol::Location).ilike(pattern)),
        );
    }

    let finder = Sellers::find()
        .filter(condition)
        .order_by_asc(SellerCol::ShopName);
    let total = finder.clone().count(&state.orm).await? as i64;
    let sellers = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;

    let ids: Vec<Uuid> = sellers.iter().map(|s| s.id).collect();
    let stats = seller_stats(state, &ids).await?;

    let items = sellers
        .into_iter()
        .map(|s| {
            let st = stats.get(&s.id).copied().unwrap_or_default();
            public_seller(s, st)
        })
        .collect();

    Ok(ApiResponse::success(
        "Sellers",
        SellerList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn get_seller(state: &AppState, id: Uuid) -> AppResult<ApiResponse<SellerDetail>> {
    let seller = Sellers::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::Missing("Seller"))?;

    let products = Products::find()
        .filter(ProdCol::SellerId.eq(seller.id))
        .order_by_desc(ProdCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(product_from_entity)
        .collect();

    let stats = seller_stats(state, &[seller.id])
        .await?
        .get(&seller.id)
        .copied()
        .unwrap_or_default();

    Ok(ApiResponse::success(
        "Seller",
        SellerDetail {
            seller: public_seller(seller, stats),
            products,
        },
        Some(Meta::empty()),
    ))
}
