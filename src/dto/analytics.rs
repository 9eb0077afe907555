use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Serialize, ToSchema, PartialEq)]
pub struct SellerAnalytics {
    pub total_sales: Decimal,
    /// Distinct orders containing at least one of the seller's products.
    pub total_orders: i64,
    pub total_items_sold: i64,
    /// Matching order lines; several per order when an order holds several products.
    pub total_line_items: i64,
    pub total_products: i64,
    pub top_products: Vec<TopProduct>,
    pub monthly_revenue: Vec<MonthlyRevenue>,
}

#[derive(Debug, Serialize, ToSchema, PartialEq)]
pub struct TopProduct {
    pub product_id: Uuid,
    pub name: String,
    pub quantity: i64,
    pub revenue: Decimal,
}

#[derive(Debug, Serialize, ToSchema, PartialEq)]
pub struct MonthlyRevenue {
    pub year: i32,
    pub month: String,
    pub revenue: Decimal,
}
