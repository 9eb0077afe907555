use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Order, OrderItem};

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct PlaceOrderRequest {
    pub order_number: String,
    #[schema(value_type = Object)]
    pub shipping_address: serde_json::Value,
    pub total_amount: Decimal,
    #[schema(value_type = Option<Object>)]
    pub payment_details: Option<serde_json::Value>,
    pub items: Vec<OrderLineRequest>,
}

/// `price` is the unit price shown to the customer at checkout.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct OrderLineRequest {
    pub product_id: Uuid,
    pub quantity: i32,
    pub price: Decimal,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderWithItems {
    pub order: Order,
    pub items: Vec<OrderItem>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct OrderList {
    pub items: Vec<OrderWithItems>,
}
