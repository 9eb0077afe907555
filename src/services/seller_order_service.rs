use std::collections::{HashMap, HashSet};

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    audit,
    dto::seller_orders::{
        OrderCustomer, SellerOrder, SellerOrderItem, SellerOrderList, UpdateOrderStatusRequest,
    },
    entity::{
        order_items::{self, Column as OrderItemCol, Entity as OrderItems},
        orders::{self, Column as OrderCol, Entity as Orders},
        products::{Column as ProdCol, Entity as Products},
        users::{self, Column as UserCol, Entity as Users},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_seller},
    models::OrderStatus,
    response::{ApiResponse, Meta},
    services::seller_service::current_seller,
    state::AppState,
};

const GUEST_NAME: &str = "Guest";
const GUEST_EMAIL: &str = "No email provided";

/// First-seen order of ids, duplicates dropped.
pub(crate) fn dedupe_order_ids(hits: impl IntoIterator<Item = Uuid>) -> Vec<Uuid> {
    let mut seen = HashSet::new();
    hits.into_iter().filter(|id| seen.insert(*id)).collect()
}

/// Σ price × quantity over the given lines, rounded to cents.
pub(crate) fn seller_scoped_total<'a>(
    items: impl IntoIterator<Item = &'a order_items::Model>,
) -> Decimal {
    items
        .into_iter()
        .map(|i| i.price * Decimal::from(i.quantity))
        .sum::<Decimal>()
        .round_dp(2)
}

/// Accepts a JSON object, or a string holding one; anything else becomes `{}`.
pub(crate) fn tolerant_object(value: &Value, field: &str, order_id: Uuid) -> Value {
    match value {
        Value::Object(_) => value.clone(),
        Value::String(raw) => match serde_json::from_str::<Value>(raw) {
            Ok(parsed @ Value::Object(_)) => parsed,
            _ => {
                tracing::warn!(%order_id, field, "unparseable order JSON, using {{}}");
                Value::Object(Default::default())
            }
        },
        Value::Null => Value::Object(Default::default()),
        _ => {
            tracing::warn!(%order_id, field, "order JSON is not an object, using {{}}");
            Value::Object(Default::default())
        }
    }
}

fn customer_of(user: Option<&users::Model>) -> OrderCustomer {
    let name = user
        .map(|u| u.name.trim())
        .filter(|n| !n.is_empty())
        .unwrap_or(GUEST_NAME);
    let email = user
        .map(|u| u.email.trim())
        .filter(|e| !e.is_empty())
        .unwrap_or(GUEST_EMAIL);
    OrderCustomer {
        name: name.to_string(),
        email: email.to_string(),
    }
}

/// The seller's slice of one order, or `None` when no line belongs to the seller.
pub(crate) fn seller_order_view(
    order: &orders::Model,
    items: &[order_items::Model],
    seller_products: &HashMap<Uuid, String>,
    customer: Option<&users::Model>,
) -> Option<SellerOrder> {
    let own: Vec<&order_items::Model> = items
        .iter()
        .filter(|i| i.order_id == order.id && seller_products.contains_key(&i.product_id))
        .collect();
    if own.is_empty() {
        return None;
    }

    let total_amount = seller_scoped_total(own.iter().copied());
    let items = own
        .into_iter()
        .map(|i| SellerOrderItem {
            id: i.id,
            product_id: i.product_id,
            product_name: seller_products.get(&i.product_id).cloned(),
            quantity: i.quantity,
            price: i.price,
            line_total: (i.price * Decimal::from(i.quantity)).round_dp(2),
        })
        .collect();

    Some(SellerOrder {
        id: order.id,
        order_number: order.order_number.clone(),
        status: order.status.clone(),
        total_amount,
        customer: customer_of(customer),
        shipping_address: tolerant_object(&order.shipping_address, "shipping_address", order.id),
        payment_details: tolerant_object(&order.payment_details, "payment_details", order.id),
        items,
        created_at: order.created_at.with_timezone(&Utc),
        updated_at: order.updated_at.with_timezone(&Utc),
    })
}

/// Builds the seller views for `order_ids`, keeping their order.
pub(crate) fn aggregate_seller_orders(
    order_ids: &[Uuid],
    orders: &HashMap<Uuid, orders::Model>,
    items: &[order_items::Model],
    seller_products: &HashMap<Uuid, String>,
    customers: &HashMap<Uuid, users::Model>,
) -> Vec<SellerOrder> {
    order_ids
        .iter()
        .filter_map(|id| orders.get(id))
        .filter_map(|order| {
            seller_order_view(order, items, seller_products, customers.get(&order.user_id))
        })
        .collect()
}

async fn seller_product_names(state: &AppState, seller_id: Uuid) -> AppResult<HashMap<Uuid, String>> {
    Ok(Products::find()
        .filter(ProdCol::SellerId.eq(seller_id))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|p| (p.id, p.name))
        .collect())
}

/// Orders, all their items and their customers for the given ids.
async fn load_orders(
    state: &AppState,
    order_ids: &[Uuid],
) -> AppResult<(
    HashMap<Uuid, orders::Model>,
    Vec<order_items::Model>,
    HashMap<Uuid, users::Model>,
)> {
    if order_ids.is_empty() {
        return Ok((HashMap::new(), Vec::new(), HashMap::new()));
    }
    let orders: HashMap<Uuid, orders::Model> = Orders::find()
        .filter(OrderCol::Id.is_in(order_ids.iter().copied()))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|o| (o.id, o))
        .collect();

    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.is_in(order_ids.iter().copied()))
        .order_by_asc(OrderItemCol::CreatedAt)
        .all(&state.orm)
        .await?;

    let user_ids: HashSet<Uuid> = orders.values().map(|o| o.user_id).collect();
    let customers = Users::find()
        .filter(UserCol::Id.is_in(user_ids))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();

    Ok((orders, items, customers))
}

pub async fn list_seller_orders(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<SellerOrderList>> {
    let seller = current_seller(state, user).await?;
    let seller_products = seller_product_names(state, seller.id).await?;
    if seller_products.is_empty() {
        return Ok(ApiResponse::success(
            "Orders",
            SellerOrderList { items: Vec::new() },
            Some(Meta::new(1, 0, 0)),
        ));
    }

    let hits = OrderItems::find()
        .filter(OrderItemCol::ProductId.is_in(seller_products.keys().copied()))
        .find_also_related(Orders)
        .order_by_desc(OrderCol::CreatedAt)
        .all(&state.orm)
        .await?;
    let order_ids = dedupe_order_ids(
        hits.iter()
            .filter(|(_, order)| order.is_some())
            .map(|(item, _)| item.order_id),
    );

    let (orders, items, customers) = load_orders(state, &order_ids).await?;
    let views = aggregate_seller_orders(&order_ids, &orders, &items, &seller_products, &customers);
    let total = views.len() as i64;

    Ok(ApiResponse::success(
        "Orders",
        SellerOrderList { items: views },
        Some(Meta::new(1, total, total)),
    ))
}

async fn seller_order(
    state: &AppState,
    seller_products: &HashMap<Uuid, String>,
    id: Uuid,
) -> AppResult<SellerOrder> {
    let (orders, items, customers) = load_orders(state, &[id]).await?;
    let order = orders.get(&id).ok_or(AppError::NotFound)?;
    // an order with none of the seller's products is not theirs to see
    seller_order_view(order, &items, seller_products, customers.get(&order.user_id))
        .ok_or(AppError::NotFound)
}

pub async fn get_seller_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<SellerOrder>> {
    let seller = current_seller(state, user).await?;
    let seller_products = seller_product_names(state, seller.id).await?;
    let view = seller_order(state, &seller_products, id).await?;
    Ok(ApiResponse::success("Order", view, Some(Meta::empty())))
}

pub async fn update_order_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<SellerOrder>> {
    ensure_seller(user)?;
    let next = payload
        .status
        .trim()
        .parse::<OrderStatus>()
        .map_err(|_| AppError::bad_request("Invalid order status"))?;

    let seller = current_seller(state, user).await?;
    let seller_products = seller_product_names(state, seller.id).await?;
    let view = seller_order(state, &seller_products, id).await?;

    let current = view
        .status
        .parse::<OrderStatus>()
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))?;
    if current == next {
        return Ok(ApiResponse::success("Order unchanged", view, Some(Meta::empty())));
    }
    if !current.can_transition_to(next) {
        return Err(AppError::bad_request(format!(
            "cannot move order from {current} to {next}"
        )));
    }

    // guarded on the status we validated against
    let result = Orders::update_many()
        .col_expr(OrderCol::Status, Expr::value(next.as_str()))
        .col_expr(OrderCol::UpdatedAt, Expr::current_timestamp().into())
        .filter(OrderCol::Id.eq(id))
        .filter(OrderCol::Status.eq(current.as_str()))
        .exec(&state.orm)
        .await?;
    if result.rows_affected == 0 {
        return Err(AppError::conflict("Order status changed concurrently"));
    }

    tracing::info!(order_id = %id, from = %current, to = %next, seller_id = %seller.id, "order status updated");
    audit::record(
        &state.pool,
        Some(user.user_id),
        "order_status_update",
        "orders",
        serde_json::json!({ "order_id": id, "from": current.as_str(), "status": next.as_str() }),
    )
    .await;

    let updated = seller_order(state, &seller_products, id).await?;
    Ok(ApiResponse::success("Order updated", updated, Some(Meta::empty())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn order(id: Uuid, user_id: Uuid, total: i64) -> orders::Model {
        orders::Model {
            id,
            user_id,
            order_number: format!("HH-{}", &id.to_string()[..8]),
            total_amount: Decimal::new(total, 2),
            shipping_address: json!({ "city": "Bath" }),
            payment_details: json!("{\"method\":\"card\"}"),
            status: "pending".into(),
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
        }
    }

    fn item(order_id: Uuid, product_id: Uuid, quantity: i32, cents: i64) -> order_items::Model {
        order_items::Model {
            id: Uuid::new_v4(),
            order_id,
            product_id,
            quantity,
            price: Decimal::new(cents, 2),
            created_at: Utc::now().into(),
        }
    }

    fn user(id: Uuid) -> users::Model {
        users::Model {
            id,
            name: "Alice".into(),
            email: "alice@example.com".into(),
            password_hash: "x".into(),
            role: "CUSTOMER".into(),
            created_at: Utc::now().into(),
        }
    }

    #[test]
    fn dedupe_keeps_first_seen_order() {
        let (a, b, c) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        assert_eq!(dedupe_order_ids([b, a, b, c, a]), vec![b, a, c]);
    }

    #[test]
    fn seller_sees_only_their_lines_and_their_subtotal() {
        let (p1, p2, other) = (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
        let customer_id = Uuid::new_v4();
        let order_id = Uuid::new_v4();
        let o = order(order_id, customer_id, 99_999);
        let items = vec![
            item(order_id, p1, 2, 1050),
            item(order_id, other, 1, 50000),
            item(order_id, p2, 3, 333),
        ];
        let seller_products: HashMap<Uuid, String> =
            [(p1, "Mug".to_string()), (p2, "Bowl".to_string())].into();

        let view = seller_order_view(&o, &items, &seller_products, Some(&user(customer_id)))
            .expect("seller has lines in this order");

        assert_eq!(view.items.len(), 2);
        assert!(view.items.iter().all(|i| i.product_id != other));
        // 2 * 10.50 + 3 * 3.33
        assert_eq!(view.total_amount, Decimal::new(3099, 2));
        assert_ne!(view.total_amount, o.total_amount);
        assert_eq!(view.customer.name, "Alice");
        assert_eq!(view.payment_details, json!({ "method": "card" }));
        assert_eq!(view.items[0].product_name.as_deref(), Some("Mug"));
    }

    #[test]
    fn orders_without_seller_lines_are_hidden() {
        let order_id = Uuid::new_v4();
        let o = order(order_id, Uuid::new_v4(), 100);
        let items = vec![item(order_id, Uuid::new_v4(), 1, 100)];
        let seller_products: HashMap<Uuid, String> = [(Uuid::new_v4(), "Mug".into())].into();
        assert!(seller_order_view(&o, &items, &seller_products, None).is_none());
    }

    #[test]
    fn missing_customer_falls_back_to_guest() {
        let product = Uuid::new_v4();
        let order_id = Uuid::new_v4();
        let mut o = order(order_id, Uuid::new_v4(), 100);
        o.shipping_address = json!("not json at all");
        let items = vec![item(order_id, product, 1, 100)];
        let seller_products: HashMap<Uuid, String> = [(product, "Mug".into())].into();

        let view = seller_order_view(&o, &items, &seller_products, None).unwrap();
        assert_eq!(view.customer.name, "Guest");
        assert_eq!(view.customer.email, "No email provided");
        assert_eq!(view.shipping_address, json!({}));
    }

    #[test]
    fn aggregation_preserves_order_and_skips_unknown_ids() {
        let product = Uuid::new_v4();
        let customer = Uuid::new_v4();
        let (first, second) = (Uuid::new_v4(), Uuid::new_v4());
        let orders: HashMap<Uuid, orders::Model> = [
            (first, order(first, customer, 100)),
            (second, order(second, customer, 200)),
        ]
        .into();
        let items = vec![
            item(second, product, 1, 200),
            item(first, product, 1, 100),
            item(first, product, 4, 100),
        ];
        let seller_products: HashMap<Uuid, String> = [(product, "Mug".into())].into();
        let customers: HashMap<Uuid, users::Model> = [(customer, user(customer))].into();

        let views = aggregate_seller_orders(
            &[second, Uuid::new_v4(), first],
            &orders,
            &items,
            &seller_products,
            &customers,
        );
        assert_eq!(views.iter().map(|v| v.id).collect::<Vec<_>>(), vec![second, first]);
        assert_eq!(views[1].items.len(), 2);
        assert_eq!(views[1].total_amount, Decimal::new(500, 2));
    }
}
