use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

use super::validation::{Checks, Validate};
use crate::error::AppResult;

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema, EnumString, Display, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PayrollStatus {
    #[default]
    Pending,
    Completed,
    Failed,
}

impl TryFrom<String> for PayrollStatus {
    type Error = strum::ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PayrollRecord {
    pub id: u64,
    pub employee_id: u64,
    pub user_id: u64,
    #[schema(value_type = String, format = "date-time")]
    pub pay_period_start: DateTime<Utc>,
    #[schema(value_type = String, format = "date-time")]
    pub pay_period_end: DateTime<Utc>,
    #[schema(value_type = String, example = "7083.33")]
    pub gross_amount: Decimal,
    #[schema(value_type = String, example = "1416.67")]
    pub deductions: Decimal,
    #[schema(value_type = String, example = "5666.66")]
    pub net_amount: Decimal,
    #[schema(value_type = String, format = "date-time")]
    pub processed_on: DateTime<Utc>,
    #[schema(nullable = true)]
    pub notes: Option<String>,
    #[sqlx(try_from = "String")]
    pub status: PayrollStatus,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PayrollRecordInput {
    #[schema(example = 1)]
    pub employee_id: u64,
    #[serde(deserialize_with = "super::datetime::deserialize")]
    #[schema(value_type = String, example = "2023-05-01")]
    pub pay_period_start: DateTime<Utc>,
    #[serde(deserialize_with = "super::datetime::deserialize")]
    #[schema(value_type = String, example = "2023-05-31")]
    pub pay_period_end: DateTime<Utc>,
    #[schema(value_type = String, example = "7083.33")]
    pub gross_amount: Decimal,
    #[schema(value_type = String, example = "1416.67")]
    pub deductions: Decimal,
    #[schema(value_type = String, example = "5666.66")]
    pub net_amount: Decimal,
    #[serde(deserialize_with = "super::datetime::deserialize")]
    #[schema(value_type = String, example = "2023-05-31")]
    pub processed_on: DateTime<Utc>,
    pub notes: Option<String>,
    #[serde(default)]
    pub status: PayrollStatus,
}

impl Validate for PayrollRecordInput {
    fn validate(&self) -> AppResult<()> {
        Checks::new()
            .money("grossAmount", self.gross_amount)
            .money("deductions", self.deductions)
            .money("netAmount", self.net_amount)
            .check(
                self.pay_period_end >= self.pay_period_start,
                "payPeriodEnd",
                "must not be before payPeriodStart",
            )
            .finish()
    }
}
