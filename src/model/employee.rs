use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::validation::{Checks, Validate};
use crate::error::AppResult;

#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(example = json!({
    "id": 1,
    "name": "John Smith",
    "position": "Software Engineer",
    "department": "Engineering",
    "email": "john@plexpay.com",
    "phoneNumber": "555-1234",
    "address": "123 Main St",
    "salary": "85000",
    "dateHired": "2022-03-15T00:00:00Z",
    "isActive": true
}))]
pub struct Employee {
    pub id: u64,
    pub name: String,
    pub position: String,
    pub department: String,
    pub email: String,
    #[schema(nullable = true)]
    pub phone_number: Option<String>,
    #[schema(nullable = true)]
    pub address: Option<String>,
    /// Annual salary
    #[schema(value_type = String)]
    pub salary: Decimal,
    #[schema(value_type = String, format = "date-time")]
    pub date_hired: DateTime<Utc>,
    pub is_active: bool,
}

fn active_by_default() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeInput {
    #[schema(example = "John Smith")]
    pub name: String,
    #[schema(example = "Software Engineer")]
    pub position: String,
    #[schema(example = "Engineering")]
    pub department: String,
    #[schema(example = "john@plexpay.com", format = "email")]
    pub email: String,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    #[schema(value_type = String, example = "85000")]
    pub salary: Decimal,
    #[serde(deserialize_with = "super::datetime::deserialize")]
    #[schema(value_type = String, example = "2022-03-15")]
    pub date_hired: DateTime<Utc>,
    #[serde(default = "active_by_default")]
    pub is_active: bool,
}

impl Validate for EmployeeInput {
    fn validate(&self) -> AppResult<()> {
        Checks::new()
            .required("name", &self.name)
            .required("position", &self.position)
            .required("department", &self.department)
            .email("email", &self.email)
            .money("salary", self.salary)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn employees_are_active_unless_told_otherwise() {
        let input: EmployeeInput = serde_json::from_str(
            r#"{"name":"Jane Doe","position":"Marketing Manager","department":"Marketing",
                "email":"jane@plexpay.com","salary":"75000","dateHired":"2021-11-01"}"#,
        )
        .unwrap();
        assert!(input.is_active);
        assert!(input.validate().is_ok());
    }

    #[test]
    fn blank_department_is_rejected() {
        let input: EmployeeInput = serde_json::from_str(
            r#"{"name":"Jane Doe","position":"Manager","department":" ",
                "email":"jane@plexpay.com","salary":"75000","dateHired":"2021-11-01"}"#,
        )
        .unwrap();
        assert!(input.validate().is_err());
    }
}
