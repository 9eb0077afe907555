use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::Product;

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddToCartRequest {
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCartItemRequest {
    pub quantity: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartLine {
    pub id: Uuid,
    pub product: Product,
    pub quantity: i32,
    pub line_total: Decimal,
}

impl CartLine {
    pub fn new(id: Uuid, product: Product, quantity: i32) -> Self {
        let line_total = (product.price * Decimal::from(quantity)).round_dp(2);
        Self {
            id,
            product,
            quantity,
            line_total,
        }
    }
}

/// Running totals shown next to the cart.
#[derive(Debug, Serialize, ToSchema, PartialEq, Eq)]
pub struct CartSummary {
    pub item_count: i64,
    pub subtotal: Decimal,
}

impl CartSummary {
    pub fn from_lines(lines: &[CartLine]) -> Self {
        let item_count = lines.iter().map(|l| i64::from(l.quantity)).sum();
        let subtotal = lines
            .iter()
            .map(|l| l.product.price * Decimal::from(l.quantity))
            .sum::<Decimal>()
            .round_dp(2);
        Self {
            item_count,
            subtotal,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartList {
    pub items: Vec<CartLine>,
    pub summary: CartSummary,
}

impl CartList {
    pub fn new(items: Vec<CartLine>) -> Self {
        let summary = CartSummary::from_lines(&items);
        Self { items, summary }
    }
}
