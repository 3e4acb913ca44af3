pub mod role;
pub mod sales_item;
pub mod user;
