use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::Expr;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, SqlErr,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::products::{
        CategoryList, NewProduct, ProductChanges, ProductDetail, ProductList, ProductProperties,
    },
    dto::sellers::SellerSummary,
    entity::{
        products::{ActiveModel, Column, Entity as Products, Model as ProductModel},
        sellers::Entity as Sellers,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::Product,
    response::{ApiResponse, Meta},
    routes::params::{FeaturedQuery, ProductQuery, ProductSortBy, SortOrder},
    services::{
        contains_pattern, escape_like, product_from_entity, seller_from_entity,
        seller_service::current_seller,
    },
    state::AppState,
    upload::{self, FormData},
};

pub async fn list_products(
    state: &AppState,
    query: ProductQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all();

    if let Some(search) = query.q.as_ref().map(|s| s.trim()).filter(|s| !s.is_empty()) {
        let pattern = contains_pattern(search);
        condition = condition.add(
            Condition::any()
                .add(Expr::col(Column::Name).ilike(pattern.clone()))
                .add(Expr::col(Column::Description).ilike(pattern)),
        );
    }

    if let Some(category) = query.category.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(Expr::col(Column::Category).ilike(escape_like(category)));
    }

    if let Some(color) = query.color.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(Expr::col(Column::Color).ilike(escape_like(color)));
    }

    if let Some(material) = query.material.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(Expr::col(Column::Material).ilike(escape_like(material)));
    }

    if let Some(seller_id) = query.seller_id {
        condition = condition.add(Column::SellerId.eq(seller_id));
    }

    if let Some(min_price) = query.min_price {
        condition = condition.add(Column::Price.gte(min_price));
    }

    if let Some(max_price) = query.max_price {
        condition = condition.add(Column::Price.lte(max_price));
    }

    let sort_by = query.sort_by.unwrap_or(ProductSortBy::CreatedAt);
    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);
    let sort_col = match sort_by {
        ProductSortBy::CreatedAt => Column::CreatedAt,
        ProductSortBy::Price => Column::Price,
        ProductSortBy::Name => Column::Name,
    };

    let mut finder = Products::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(sort_col),
        SortOrder::Desc => finder.order_by_desc(sort_col),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(product_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Products", ProductList { items }, Some(meta)))
}

pub async fn get_product(state: &AppState, id: Uuid) -> AppResult<ApiResponse<ProductDetail>> {
    let result = Products::find_by_id(id)
        .find_also_related(Sellers)
        .one(&state.orm)
        .await?;
    let (product, seller) = match result {
        Some(found) => found,
        None => return Err(AppError::Missing("Product")),
    };
    let seller = seller.map(|s| SellerSummary::from(&seller_from_entity(s)));
    Ok(ApiResponse::success(
        "Product",
        ProductDetail {
            product: product_from_entity(product),
            seller,
        },
        None,
    ))
}

pub async fn list_categories(state: &AppState) -> AppResult<ApiResponse<CategoryList>> {
    let items: Vec<String> = Products::find()
        .select_only()
        .column(Column::Category)
        .distinct()
        .order_by_asc(Column::Category)
        .into_tuple::<String>()
        .all(&state.orm)
        .await?;
    Ok(ApiResponse::success(
        "Categories",
        CategoryList { items },
        Some(Meta::empty()),
    ))
}

pub async fn list_featured(
    state: &AppState,
    query: FeaturedQuery,
) -> AppResult<ApiResponse<ProductList>> {
    let items = Products::find()
        .order_by_desc(Column::CreatedAt)
        .limit(query.limit())
        .all(&state.orm)
        .await?
        .into_iter()
        .map(product_from_entity)
        .collect();
    Ok(ApiResponse::success(
        "Featured products",
        ProductList { items },
        Some(Meta::empty()),
    ))
}

pub async fn list_properties(state: &AppState) -> AppResult<ApiResponse<ProductProperties>> {
    let colors: Vec<String> = Products::find()
        .select_only()
        .column(Column::Color)
        .filter(Column::Color.is_not_null())
        .distinct()
        .order_by_asc(Column::Color)
        .into_tuple::<String>()
        .all(&state.orm)
        .await?;
    let materials: Vec<String> = Products::find()
        .select_only()
        .column(Column::Material)
        .filter(Column::Material.is_not_null())
        .distinct()
        .order_by_asc(Column::Material)
        .into_tuple::<String>()
        .all(&state.orm)
        .await?;
    Ok(ApiResponse::success(
        "Product properties",
        ProductProperties { colors, materials },
        Some(Meta::empty()),
    ))
}

pub async fn list_seller_products(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<ProductList>> {
    let seller = current_seller(state, user).await?;
    let items: Vec<Product> = Products::find()
        .filter(Column::SellerId.eq(seller.id))
        .order_by_desc(Column::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(product_from_entity)
        .collect();
    let total = items.len() as i64;
    Ok(ApiResponse::success(
        "Products",
        ProductList { items },
        Some(Meta::new(1, total, total)),
    ))
}

/// The product if the signed-in seller owns it; someone else's product is `NotFound`.
async fn owned_product(state: &AppState, user: &AuthUser, id: Uuid) -> AppResult<ProductModel> {
    let seller = current_seller(state, user).await?;
    Products::find()
        .filter(
            Condition::all()
                .add(Column::Id.eq(id))
                .add(Column::SellerId.eq(seller.id)),
        )
        .one(&state.orm)
        .await?
        .ok_or(AppError::Missing("Product"))
}

pub async fn get_seller_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Product>> {
    let product = owned_product(state, user, id).await?;
    Ok(ApiResponse::success(
        "Product",
        product_from_entity(product),
        Some(Meta::empty()),
    ))
}

pub async fn create_product(
    state: &AppState,
    user: &AuthUser,
    mut form: FormData,
) -> AppResult<ApiResponse<Product>> {
    let seller = current_seller(state, user).await?;
    let input = NewProduct::from_form(&form)?;

    // the image is on disk before the row exists
    let image_url = match form.take_file("image") {
        Some(file) => Some(upload::store_image(&state.config, "product", file).await?),
        None => None,
    };

    let active = ActiveModel {
        id: Set(Uuid::new_v4()),
        seller_id: Set(seller.id),
        name: Set(input.name),
        description: Set(input.description),
        price: Set(input.price),
        image_url: Set(image_url.clone()),
        category: Set(input.category),
        color: Set(input.color),
        material: Set(input.material),
        created_at: NotSet,
        updated_at: NotSet,
    };
    let inserted = active.insert(&state.orm).await;
    let product = upload::discard_on_error(&state.config, image_url.as_deref(), inserted).await?;

    tracing::info!(product_id = %product.id, seller_id = %seller.id, "product created");
    audit::record(
        &state.pool,
        Some(user.user_id),
        "product_create",
        "products",
        serde_json::json!({ "product_id": product.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Product created",
        product_from_entity(product),
        Some(Meta::empty()),
    ))
}

pub async fn update_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    mut form: FormData,
) -> AppResult<ApiResponse<Product>> {
    let existing = owned_product(state, user, id).await?;
    let changes = ProductChanges::from_form(&form)?;
    let old_image = existing.image_url.clone();

    let mut active: ActiveModel = existing.into();
    if let Some(name) = changes.name {
        active.name = Set(name);
    }
    if let Some(description) = changes.description {
        active.description = Set(description);
    }
    if let Some(price) = changes.price {
        active.price = Set(price);
    }
    if let Some(category) = changes.category {
        active.category = Set(category);
    }
    if let Some(color) = changes.color {
        active.color = Set(Some(color));
    }
    if let Some(material) = changes.material {
        active.material = Set(Some(material));
    }
    let new_image = match form.take_file("image") {
        Some(file) => {
            let url = upload::store_image(&state.config, "product", file).await?;
            active.image_url = Set(Some(url.clone()));
            Some(url)
        }
        None => None,
    };
    active.updated_at = Set(chrono::Utc::now().into());

    let updated = active.update(&state.orm).await;
    let product = upload::discard_on_error(&state.config, new_image.as_deref(), updated).await?;

    if new_image.is_some() {
        if let Some(old) = old_image {
            upload::remove_image(&state.config, &old).await;
        }
    }

    audit::record(
        &state.pool,
        Some(user.user_id),
        "product_update",
        "products",
        serde_json::json!({ "product_id": product.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Updated",
        product_from_entity(product),
        Some(Meta::empty()),
    ))
}

pub async fn delete_product(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let existing = owned_product(state, user, id).await?;
    let image = existing.image_url.clone();

    let result = Products::delete_by_id(existing.id)
        .exec(&state.orm)
        .await
        .map_err(|err| match err.sql_err() {
            Some(SqlErr::ForeignKeyConstraintViolation(_)) => {
                AppError::conflict("Product has been ordered and cannot be deleted")
            }
            _ => AppError::OrmError(err),
        })?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }
    if let Some(image) = image {
        upload::remove_image(&state.config, &image).await;
    }

    audit::record(
        &state.pool,
        Some(user.user_id),
        "product_delete",
        "products",
        serde_json::json!({ "product_id": id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}
