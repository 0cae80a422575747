pub mod connection;
pub mod products;
pub mod purchases;
pub mod sales;
pub(crate) mod schema;
pub(crate) mod test_utils;

pub use connection::{DbPool, init_store};
pub use products::{NewProduct, Product, create_product, list_products};
pub use purchases::{NewPurchase, Purchase, create_purchase, list_purchases};
pub use sales::{NewSale, Sale, create_sale, delete_sale, list_sales};
