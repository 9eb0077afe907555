use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    dto::sellers::SellerSummary,
    error::{AppError, AppResult},
    models::Product,
    upload::FormData,
};

/// Multipart fields accepted by product create/update; documentation only.
#[allow(dead_code)]
#[derive(ToSchema)]
pub struct ProductForm {
    pub name: String,
    pub description: String,
    #[schema(value_type = String, example = "24.99")]
    pub price: String,
    pub category: String,
    pub color: Option<String>,
    pub material: Option<String>,
    #[schema(value_type = String, format = Binary)]
    pub image: Option<Vec<u8>>,
}

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub category: String,
    pub color: Option<String>,
    pub material: Option<String>,
}

impl NewProduct {
    pub fn from_form(form: &FormData) -> AppResult<Self> {
        let price = form
            .decimal("price")?
            .ok_or_else(|| AppError::bad_request("price is required"))?;
        Ok(Self {
            name: form.required("name")?,
            description: form.text("description").unwrap_or_default(),
            price: validate_price(price)?,
            category: form.required("category")?,
            color: form.text("color"),
            material: form.text("material"),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct ProductChanges {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub category: Option<String>,
    pub color: Option<String>,
    pub material: Option<String>,
}

impl ProductChanges {
    pub fn from_form(form: &FormData) -> AppResult<Self> {
        Ok(Self {
            name: form.text("name"),
            description: form.text("description"),
            price: form.decimal("price")?.map(validate_price).transpose()?,
            category: form.text("category"),
            color: form.text("color"),
            material: form.text("material"),
        })
    }
}

fn validate_price(price: Decimal) -> AppResult<Decimal> {
    if price <= Decimal::ZERO {
        return Err(AppError::bad_request("price must be greater than 0"));
    }
    Ok(price.round_dp(2))
}

#[derive(Serialize, ToSchema)]
pub struct ProductList {
    pub items: Vec<Product>,
}

#[derive(Serialize, ToSchema)]
pub struct ProductDetail {
    pub product: Product,
    pub seller: Option<SellerSummary>,
}

#[derive(Serialize, ToSchema)]
pub struct CategoryList {
    pub items: Vec<String>,
}

#[derive(Serialize, ToSchema)]
pub struct ProductProperties {
    pub colors: Vec<String>,
    pub materials: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(pairs: &[(&str, &str)]) -> FormData {
        let mut form = FormData::default();
        for (k, v) in pairs {
            form.insert_text(*k, *v);
        }
        form
    }

    #[test]
    fn new_product_requires_name_price_and_category() {
        let ok = NewProduct::from_form(&form(&[
            ("name", "Walnut bowl"),
            ("price", "45.001"),
            ("category", "Woodwork"),
            ("material", "walnut"),
        ]))
        .unwrap();
        assert_eq!(ok.price, Decimal::new(4500, 2));
        assert_eq!(ok.material.as_deref(), Some("walnut"));
        assert!(ok.color.is_none());

        assert!(NewProduct::from_form(&form(&[("name", "x"), ("category", "y")])).is_err());
        assert!(
            NewProduct::from_form(&form(&[("name", "x"), ("price", "0"), ("category", "y")]))
                .is_err()
        );
    }

    #[test]
    fn changes_only_carry_present_fields() {
        let changes = ProductChanges::from_form(&form(&[("price", "9.5"), ("name", " ")])).unwrap();
        assert_eq!(changes.price, Some(Decimal::new(95, 1)));
        assert!(changes.name.is_none());
        assert!(ProductChanges::from_form(&form(&[("price", "-1")])).is_err());
    }
}
