use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::validation::{Checks, Validate};
use crate::error::AppResult;

#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseCategory {
    #[schema(example = 3)]
    pub id: u64,
    #[schema(example = "Technology")]
    pub name: String,
    #[schema(example = "Software, hardware, and IT services", nullable = true)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseCategoryInput {
    #[schema(example = "Technology")]
    pub name: String,
    #[schema(example = "Software, hardware, and IT services")]
    pub description: Option<String>,
}

impl Validate for ExpenseCategoryInput {
    fn validate(&self) -> AppResult<()> {
        Checks::new().required("name", &self.name).finish()
    }
}
