use std::collections::{BTreeMap, HashMap, HashSet};

use chrono::{DateTime, Datelike, Utc};
use rust_decimal::Decimal;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};
use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    dto::analytics::{MonthlyRevenue, SellerAnalytics, TopProduct},
    entity::products::{Column as ProdCol, Entity as Products},
    error::AppResult,
    middleware::auth::AuthUser,
    response::{ApiResponse, Meta},
    services::seller_service::current_seller,
    state::AppState,
};

const TOP_PRODUCTS: usize = 3;

/// One order line for a product of the seller.
#[derive(Debug, Clone, FromRow)]
pub(crate) struct SaleLine {
    pub order_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: i32,
    pub price: Decimal,
    pub ordered_at: DateTime<Utc>,
}

impl SaleLine {
    fn revenue(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

pub(crate) fn compute_analytics(lines: &[SaleLine], total_products: i64) -> SellerAnalytics {
    let total_sales = lines.iter().map(SaleLine::revenue).sum::<Decimal>().round_dp(2);
    let total_orders = lines.iter().map(|l| l.order_id).collect::<HashSet<_>>().len() as i64;
    let total_items_sold = lines.iter().map(|l| i64::from(l.quantity)).sum();

    let mut per_product: HashMap<Uuid, TopProduct> = HashMap::new();
    for line in lines {
        let entry = per_product.entry(line.product_id).or_insert_with(|| TopProduct {
            product_id: line.product_id,
            name: line.product_name.clone(),
            quantity: 0,
            revenue: Decimal::ZERO,
        });
        entry.quantity += i64::from(line.quantity);
        entry.revenue += line.revenue();
    }
    let mut top_products: Vec<TopProduct> = per_product.into_values().collect();
    top_products.sort_by(|a, b| b.quantity.cmp(&a.quantity).then_with(|| a.name.cmp(&b.name)));
    top_products.truncate(TOP_PRODUCTS);
    for product in &mut top_products {
        product.revenue = product.revenue.round_dp(2);
    }

    // keyed by (year, month) so iteration is chronological
    let mut months: BTreeMap<(i32, u32), (DateTime<Utc>, Decimal)> = BTreeMap::new();
    for line in lines {
        let key = (line.ordered_at.year(), line.ordered_at.month());
        months
            .entry(key)
            .or_insert((line.ordered_at, Decimal::ZERO))
            .1 += line.revenue();
    }
    let monthly_revenue = months
        .into_iter()
        .map(|((year, _), (at, revenue))| MonthlyRevenue {
            year,
            month: at.format("%b").to_string(),
            revenue: revenue.round_dp(2),
        })
        .collect();

    SellerAnalytics {
        total_sales,
        total_orders,
        total_items_sold,
        total_line_items: lines.len() as i64,
        total_products,
        top_products,
        monthly_revenue,
    }
}

pub async fn seller_analytics(
    state: &AppState,
    user: &AuthUser,
) -> AppResult<ApiResponse<SellerAnalytics>> {
    let seller = current_seller(state, user).await?;

    let total_products = Products::find()
        .filter(ProdCol::SellerId.eq(seller.id))
        .count(&state.orm)
        .await? as i64;

    let lines = sqlx::query_as::<_, SaleLine>(
        r#"
        SELECT oi.order_id, oi.product_id, p.name AS product_name,
               oi.quantity, oi.price, o.created_at AS ordered_at
        FROM order_items oi
        JOIN orders o ON o.id = oi.order_id
        JOIN products p ON p.id = oi.product_id
        WHERE p.seller_id = $1
        "#,
    )
    .bind(seller.id)
    .fetch_all(&state.pool)
    .await?;

    tracing::debug!(seller_id = %seller.id, lines = lines.len(), "computing seller analytics");
    let analytics = compute_analytics(&lines, total_products);

    Ok(ApiResponse::success(
        "Analytics",
        analytics,
        Some(Meta::empty()),
    ))
}
