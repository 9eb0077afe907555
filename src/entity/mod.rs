pub mod cart_items;
pub mod contact_messages;
pub mod order_items;
pub mod orders;
pub mod products;
pub mod profile_records;
pub mod reviews;
pub mod saved_items;
pub mod sellers;
pub mod users;

pub use cart_items::Entity as CartItems;
pub use contact_messages::Entity as ContactMessages;
pub use order_items::Entity as OrderItems;
pub use orders::Entity as Orders;
pub use products::Entity as Products;
pub use profile_records::Entity as ProfileRecords;
pub use reviews::Entity as Reviews;
pub use saved_items::Entity as SavedItems;
pub use sellers::Entity as Sellers;
pub use users::Entity as Users;
