use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::validation::{Checks, Validate};
use crate::error::AppResult;

#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = "Office Supplies")]
    pub description: String,
    #[schema(value_type = String, example = "1250.00")]
    pub amount: Decimal,
    #[schema(value_type = String, format = "date-time", example = "2023-05-12T00:00:00Z")]
    pub date: DateTime<Utc>,
    #[schema(example = 2)]
    pub category_id: u64,
    #[schema(example = 1)]
    pub user_id: u64,
    #[schema(nullable = true)]
    pub notes: Option<String>,
    #[schema(nullable = true)]
    pub receipt: Option<String>,
}

/// Create/replace body. The owning user comes from the access token.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseInput {
    #[schema(example = "Office Supplies")]
    pub description: String,
    #[schema(value_type = String, example = "1250.00")]
    pub amount: Decimal,
    #[serde(deserialize_with = "super::datetime::deserialize")]
    #[schema(value_type = String, example = "2023-05-12")]
    pub date: DateTime<Utc>,
    #[schema(example = 2)]
    pub category_id: u64,
    pub notes: Option<String>,
    pub receipt: Option<String>,
}

impl Validate for ExpenseInput {
    fn validate(&self) -> AppResult<()> {
        Checks::new()
            .required("description", &self.description)
            .money("amount", self.amount)
            .finish()
    }
}
