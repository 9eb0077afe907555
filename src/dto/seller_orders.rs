use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateOrderStatusRequest {
    pub status: String,
}

#[derive(Debug, Clone, Serialize, ToSchema, PartialEq)]
pub struct OrderCustomer {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Serialize, ToSchema, PartialEq)]
pub struct SellerOrderItem {
    pub id: Uuid,
    pub product_id: Uuid,
    pub product_name: Option<String>,
    pub quantity: i32,
    pub price: Decimal,
    pub line_total: Decimal,
}

/// One seller's slice of an order.
#[derive(Debug, Clone, Serialize, ToSchema, PartialEq)]
pub struct SellerOrder {
    pub id: Uuid,
    pub order_number: String,
    pub status: String,
    /// Seller-scoped subtotal, not the order's overall total.
    pub total_amount: Decimal,
    pub customer: OrderCustomer,
    #[schema(value_type = Object)]
    pub shipping_address: serde_json::Value,
    #[schema(value_type = Object)]
    pub payment_details: serde_json::Value,
    pub items: Vec<SellerOrderItem>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SellerOrderList {
    pub items: Vec<SellerOrder>,
}
