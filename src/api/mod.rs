pub mod sales;
pub mod users;
