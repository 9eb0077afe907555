use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::Product;

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct SaveItemRequest {
    pub product_id: Uuid,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SavedProduct {
    pub id: Uuid,
    pub saved_at: DateTime<Utc>,
    pub product: Product,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SavedList {
    pub items: Vec<SavedProduct>,
}
