use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{models::Review, routes::params::Pagination};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateReviewRequest {
    pub product_id: Option<Uuid>,
    pub seller_id: Option<Uuid>,
    pub rating: i32,
    pub comment: String,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct ReviewQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub product_id: Option<Uuid>,
    pub seller_id: Option<Uuid>,
}

impl ReviewQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page,
            per_page: self.per_page,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ReviewList {
    pub items: Vec<Review>,
    pub average_rating: Option<f64>,
}
