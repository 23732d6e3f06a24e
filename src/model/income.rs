use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::validation::{Checks, Validate};
use crate::error::AppResult;

#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IncomeRecord {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = "Client A")]
    pub source: String,
    #[schema(value_type = String, example = "15000.00")]
    pub amount: Decimal,
    #[schema(value_type = String, format = "date-time")]
    pub date: DateTime<Utc>,
    #[schema(nullable = true)]
    pub description: Option<String>,
    pub user_id: u64,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct IncomeRecordInput {
    #[schema(example = "Client A")]
    pub source: String,
    #[schema(value_type = String, example = "15000.00")]
    pub amount: Decimal,
    #[serde(deserialize_with = "super::datetime::deserialize")]
    #[schema(value_type = String, example = "2023-04-05")]
    pub date: DateTime<Utc>,
    #[schema(example = "Project completion payment")]
    pub description: Option<String>,
}

impl Validate for IncomeRecordInput {
    fn validate(&self) -> AppResult<()> {
        Checks::new()
            .required("source", &self.source)
            .money("amount", self.amount)
            .finish()
    }
}
