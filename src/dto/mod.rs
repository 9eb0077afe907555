pub mod analytics;
pub mod auth;
pub mod cart;
pub mod orders;
pub mod products;
pub mod profile;
pub mod reviews;
pub mod saved;
pub mod seller_orders;
pub mod sellers;
