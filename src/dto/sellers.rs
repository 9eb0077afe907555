use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{Product, Seller},
    upload::FormData,
};

/// Multipart fields accepted by seller profile create/update; documentation only.
#[allow(dead_code)]
#[derive(ToSchema)]
pub struct SellerProfileForm {
    pub name: String,
    pub shop_name: String,
    pub location: Option<String>,
    pub bio: Option<String>,
    pub story: Option<String>,
    pub contact: Option<String>,
    #[schema(value_type = String, format = Binary)]
    pub profile_image: Option<Vec<u8>>,
}

#[derive(Debug, Clone)]
pub struct NewSellerProfile {
    pub name: String,
    pub shop_name: String,
    pub location: Option<String>,
    pub bio: Option<String>,
    pub story: Option<String>,
    pub contact: Option<String>,
}

impl NewSellerProfile {
    pub fn from_form(form: &FormData) -> AppResult<Self> {
        Ok(Self {
            name: form.required("name")?,
            shop_name: form.required("shop_name")?,
            location: form.text("location"),
            bio: form.text("bio"),
            story: form.text("story"),
            contact: form.text("contact"),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct SellerProfileChanges {
    pub name: Option<String>,
    pub shop_name: Option<String>,
    pub location: Option<String>,
    pub bio: Option<String>,
    pub story: Option<String>,
    pub contact: Option<String>,
}

impl SellerProfileChanges {
    pub fn from_form(form: &FormData) -> Self {
        Self {
            name: form.text("name"),
            shop_name: form.text("shop_name"),
            location: form.text("location"),
            bio: form.text("bio"),
            story: form.text("story"),
            contact: form.text("contact"),
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SellerSummary {
    pub id: Uuid,
    pub name: String,
    pub shop_name: String,
    pub location: Option<String>,
    pub profile_image: Option<String>,
}

impl From<&Seller> for SellerSummary {
    fn from(seller: &Seller) -> Self {
        Self {
            id: seller.id,
            name: seller.name.clone(),
            shop_name: seller.shop_name.clone(),
            location: seller.location.clone(),
            profile_image: seller.profile_image.clone(),
        }
    }
}

/// Seller profile with figures derived from reviews and sales.
#[derive(Debug, Serialize, ToSchema)]
pub struct PublicSeller {
    #[serde(flatten)]
    pub seller: Seller,
    pub rating: f64,
    pub review_count: i64,
    pub sales: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SellerList {
    pub items: Vec<PublicSeller>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SellerDetail {
    pub seller: PublicSeller,
    pub products: Vec<Product>,
}
