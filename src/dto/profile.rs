use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{ProfileRecord, User};

#[derive(Debug, Serialize, ToSchema)]
pub struct CustomerProfile {
    pub user: User,
    pub address: Option<ProfileRecord>,
    pub payment: Option<ProfileRecord>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ContactRequest {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}
