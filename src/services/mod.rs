use chrono::Utc;

use crate::{
    entity::{order_items, orders, products, reviews, sellers},
    models::{Order, OrderItem, Product, Review, Seller},
};

pub mod analytics_service;
pub mod auth_service;
pub mod cart_service;
pub mod order_service;
pub mod product_service;
pub mod profile_service;
pub mod review_service;
pub mod saved_service;
pub mod seller_order_service;
pub mod seller_service;

/// Escapes `\`, `%` and `_` so user text matches literally under (I)LIKE.
pub fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

/// `%text%` with the text itself escaped.
pub fn contains_pattern(input: &str) -> String {
    format!("%{}%", escape_like(input))
}

pub(crate) fn product_from_entity(model: products::Model) -> Product {
    Product {
        id: model.id,
        seller_id: model.seller_id,
        name: model.name,
        description: model.description,
        price: model.price,
        image_url: model.image_url,
        category: model.category,
        color: model.color,
        material: model.material,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

pub(crate) fn seller_from_entity(model: sellers::Model) -> Seller {
    Seller {
        id: model.id,
        user_id: model.user_id,
        name: model.name,
        shop_name: model.shop_name,
        profile_image: model.profile_image,
        location: model.location,
        bio: model.bio,
        story: model.story,
        contact: model.contact,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

pub(crate) fn order_from_entity(model: orders::Model) -> Order {
    Order {
        id: model.id,
        user_id: model.user_id,
        order_number: model.order_number,
        total_amount: model.total_amount,
        shipping_address: model.shipping_address,
        payment_details: model.payment_details,
        status: model.status,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

pub(crate) fn order_item_from_entity(
    model: order_items::Model,
    product_name: Option<String>,
) -> OrderItem {
    OrderItem {
        id: model.id,
        order_id: model.order_id,
        product_id: model.product_id,
        product_name,
        quantity: model.quantity,
        price: model.price,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

pub(crate) fn review_from_entity(model: reviews::Model) -> Review {
    Review {
        id: model.id,
        user_id: model.user_id,
        user_name: model.user_name,
        rating: model.rating,
        comment: model.comment,
        product_id: model.product_id,
        seller_id: model.seller_id,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
