use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// One sales transaction row.
///
/// `revenue` is the selling price and `profit` is selling minus buying
/// price; neither is scaled by quantity. That per-record convention is
/// what the rest of the product reports against, so it is kept.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct SalesItem {
    pub id: u64,
    #[schema(example = "2023-01-01", format = "date", value_type = Option<String>)]
    pub date: Option<NaiveDate>,
    pub order_number: String,
    pub item_name: String,
    pub selling_price: f64,
    pub quantity: f64,
    pub buying_price: f64,
    pub payment_mode: String,
    pub profit: f64,
    pub revenue: f64,
}

/// Fields accepted when creating a sales item; revenue and profit are
/// always computed server-side.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewSalesItem {
    #[schema(example = "2023-01-01", format = "date", value_type = Option<String>)]
    pub date: Option<NaiveDate>,
    pub order_number: String,
    pub item_name: String,
    pub selling_price: f64,
    pub quantity: f64,
    pub buying_price: f64,
    pub payment_mode: String,
}

impl NewSalesItem {
    pub fn revenue(&self) -> f64 {
        self.selling_price
    }

    pub fn profit(&self) -> f64 {
        self.selling_price - self.buying_price
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn revenue_and_profit_ignore_quantity() {
        let mut item = NewSalesItem {
            date: None,
            order_number: "ORD-1".into(),
            item_name: "Cereal".into(),
            selling_price: 100.0,
            quantity: 4.0,
            buying_price: 60.0,
            payment_mode: "cash".into(),
        };
        assert_eq!(item.revenue(), 100.0);
        assert_eq!(item.profit(), 40.0);

        item.quantity = 250.0;
        assert_eq!(item.revenue(), 100.0);
        assert_eq!(item.profit(), 40.0);
    }
}
