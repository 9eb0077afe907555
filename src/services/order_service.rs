use std::collections::{HashMap, HashSet};

use rust_decimal::Decimal;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::orders::{OrderList, OrderWithItems, PlaceOrderRequest},
    entity::{
        cart_items::{Column as CartCol, Entity as CartItems},
        order_items::{ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders},
        products::{Column as ProdCol, Entity as Products},
    },
    error::{AppError, AppResult, orm_conflict_on_unique},
    middleware::auth::AuthUser,
    models::{OrderItem, OrderStatus},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    services::{order_from_entity, order_item_from_entity},
    state::AppState,
};

pub fn validate_order_request(payload: &PlaceOrderRequest) -> AppResult<()> {
    if payload.order_number.trim().is_empty() {
        return Err(AppError::bad_request("order_number is required"));
    }
    match payload.shipping_address.as_object() {
        Some(address) if !address.is_empty() => {}
        _ => return Err(AppError::bad_request("shipping_address is required")),
    }
    if let Some(details) = &payload.payment_details {
        if !details.is_object() && !details.is_null() {
            return Err(AppError::bad_request("payment_details must be an object"));
        }
    }
    if payload.items.is_empty() {
        return Err(AppError::bad_request("items must not be empty"));
    }
    if payload.total_amount < Decimal::ZERO {
        return Err(AppError::bad_request("total_amount must not be negative"));
    }
    for item in &payload.items {
        if item.quantity < 1 {
            return Err(AppError::bad_request("item quantity must be at least 1"));
        }
        if item.price < Decimal::ZERO {
            return Err(AppError::bad_request("item price must not be negative"));
        }
    }
    Ok(())
}

/// Creates the order and its items and empties the cart, all or nothing.
/// Line prices are taken from the request as shown at checkout.
pub async fn place_order(
    state: &AppState,
    user: &AuthUser,
    payload: PlaceOrderRequest,
) -> AppResult<ApiResponse<OrderWithItems>> {
    validate_order_request(&payload)?;

    let product_ids: HashSet<Uuid> = payload.items.iter().map(|i| i.product_id).collect();

    let txn = state.orm.begin().await?;

    let products: HashMap<Uuid, String> = Products::find()
        .filter(ProdCol::Id.is_in(product_ids.iter().copied()))
        .all(&txn)
        .await?
        .into_iter()
        .map(|p| (p.id, p.name))
        .collect();
    if products.len() != product_ids.len() {
        return Err(AppError::Missing("Product"));
    }

    let payment_details = payload
        .payment_details
        .filter(|d| d.is_object())
        .unwrap_or_else(|| serde_json::json!({}));

    let order = OrderActive {
        id: Set(Uuid::new_v4()),
        user_id: Set(user.user_id),
        order_number: Set(payload.order_number.trim().to_string()),
        total_amount: Set(payload.total_amount.round_dp(2)),
        shipping_address: Set(payload.shipping_address),
        payment_details: Set(payment_details),
        status: Set(OrderStatus::Pending.to_string()),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await
    .map_err(|e| orm_conflict_on_unique(e, "Order number already exists"))?;

    let mut order_items: Vec<OrderItem> = Vec::with_capacity(payload.items.len());
    for line in &payload.items {
        let item = OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(line.product_id),
            quantity: Set(line.quantity),
            price: Set(line.price.round_dp(2)),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;

        let name = products.get(&item.product_id).cloned();
        order_items.push(order_item_from_entity(item, name));
    }

    // clear cart
    CartItems::delete_many()
        .filter(CartCol::UserId.eq(user.user_id))
        .exec(&txn)
        .await?;

    txn.commit().await?;

    tracing::info!(order_id = %order.id, order_number = %order.order_number, lines = order_items.len(), "order placed");
    audit::record(
        &state.pool,
        Some(user.user_id),
        "order_place",
        "orders",
        serde_json::json!({ "order_id": order.id, "order_number": order.order_number }),
    )
    .await;

    Ok(ApiResponse::success(
        "Order placed",
        OrderWithItems {
            order: order_from_entity(order),
            items: order_items,
        },
        Some(Meta::empty()),
    ))
}

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination().normalize();
    let mut condition = Condition::all().add(OrderCol::UserId.eq(user.user_id));
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        let status = status
            .parse::<OrderStatus>()
            .map_err(AppError::BadRequest)?;
        condition = condition.add(OrderCol::Status.eq(status.as_str()));
    }

    let mut finder = Orders::find().filter(condition);
    finder = match query.sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;

    let mut items_by_order =
        load_order_items(&state.orm, orders.iter().map(|o| o.id).collect()).await?;

    let items = orders
        .into_iter()
        .map(|order| OrderWithItems {
            items: items_by_order.remove(&order.id).unwrap_or_default(),
            order: order_from_entity(order),
        })
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Ok", OrderList { items }, Some(meta)))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::UserId.eq(user.user_id))
                .add(OrderCol::Id.eq(id)),
        )
        .one(&state.orm)
        .await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    let items = load_order_items(&state.orm, vec![order.id])
        .await?
        .remove(&order.id)
        .unwrap_or_default();

    Ok(ApiResponse::success(
        "OK",
        OrderWithItems {
            order: order_from_entity(order),
            items,
        },
        Some(Meta::empty()),
    ))
}

/// Items grouped by order id, each carrying its product name.
async fn load_order_items<C: ConnectionTrait>(
    db: &C,
    order_ids: Vec<Uuid>,
) -> AppResult<HashMap<Uuid, Vec<OrderItem>>> {
    if order_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows = OrderItems::find()
        .filter(OrderItemCol::OrderId.is_in(order_ids))
        .order_by_asc(OrderItemCol::CreatedAt)
        .find_also_related(Products)
        .all(db)
        .await?;

    let mut grouped: HashMap<Uuid, Vec<OrderItem>> = HashMap::new();
    for (item, product) in rows {
        grouped
            .entry(item.order_id)
            .or_default()
            .push(order_item_from_entity(item, product.map(|p| p.name)));
    }
    Ok(grouped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::orders::OrderLineRequest;
    use serde_json::json;

    fn request() -> PlaceOrderRequest {
        PlaceOrderRequest {
            order_number: "HH-1001".into(),
            shipping_address: json!({ "street": "1 Kiln Lane", "city": "Stoke" }),
            total_amount: Decimal::new(2500, 2),
            payment_details: Some(json!({ "method": "card" })),
            items: vec![OrderLineRequest {
                product_id: Uuid::new_v4(),
                quantity: 2,
                price: Decimal::new(1250, 2),
            }],
        }
    }

    #[test]
    fn accepts_a_complete_order() {
        assert!(validate_order_request(&request()).is_ok());
    }

    #[test]
    fn rejects_missing_required_fields() {
        let mut r = request();
        r.order_number = "  ".into();
        assert!(validate_order_request(&r).is_err());

        let mut r = request();
        r.shipping_address = json!({});
        assert!(validate_order_request(&r).is_err());

        let mut r = request();
        r.shipping_address = json!("1 Kiln Lane");
        assert!(validate_order_request(&r).is_err());

        let mut r = request();
        r.items.clear();
        assert!(validate_order_request(&r).is_err());
    }

    #[test]
    fn rejects_bad_lines() {
        let mut r = request();
        r.items[0].quantity = 0;
        assert!(validate_order_request(&r).is_err());

        let mut r = request();
        r.items[0].price = Decimal::new(-1, 0);
        assert!(validate_order_request(&r).is_err());

        let mut r = request();
        r.payment_details = Some(json!([1, 2]));
        assert!(validate_order_request(&r).is_err());
    }
}
