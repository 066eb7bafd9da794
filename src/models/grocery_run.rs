use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;

#[derive(Debug, sqlx::FromRow)]
pub struct GroceryRun {
    pub id: i64,
    pub user_id: i64,
    pub trip_date: NaiveDate,
    pub store_name: Option<String>,
    pub total_cost: Option<Decimal>,
    pub notes: Option<String>,
    pub archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
