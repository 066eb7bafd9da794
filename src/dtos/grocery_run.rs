use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::dtos::double_option;
use crate::models::grocery_run::GroceryRun;

#[derive(Debug, Deserialize)]
pub struct CreateGroceryRunRequest {
    // user_id comes from auth context
    pub trip_date: NaiveDate,
    pub store_name: Option<String>,
    pub total_cost: Option<Decimal>,
    pub notes: Option<String>,
    #[serde(default)]
    pub archived: bool,
}

#[derive(Debug, Default, Deserialize)]
pub struct UpdateGroceryRunRequest {
    pub trip_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "double_option")]
    pub store_name: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    pub total_cost: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "double_option")]
    pub notes: Option<Option<String>>,
    pub archived: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct GroceryRunResponse {
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

impl From<GroceryRun> for GroceryRunResponse {
    fn from(run: GroceryRun) -> Self {
        Self {
            id: run.id,
            user_id: run.user_id,
            trip_date: run.trip_date,
            store_name: run.store_name,
            total_cost: run.total_cost,
            notes: run.notes,
            archived: run.archived,
            created_at: run.created_at,
            updated_at: run.updated_at,
        }
    }
}
