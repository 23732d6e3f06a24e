use crate::error::{AppError, AppResult};
use crate::storage::Storage;

pub mod dashboard;
pub mod employee;
pub mod expense;
pub mod expense_category;
pub mod income;
pub mod payroll;
pub mod report;
pub mod user;

/// Turns a storage miss into `404 {"error": "<entity> not found"}`.
pub(crate) fn found<T>(entity: &'static str, row: Option<T>) -> AppResult<T> {
    row.ok_or(AppError::NotFound(entity))
}

/// Foreign keys in request bodies are checked up front so a dangling id is a
/// field error rather than a database failure.
pub(crate) async fn ensure_category(storage: &dyn Storage, id: u64) -> AppResult<()> {
    match storage.get_expense_category(id).await? {
        Some(_) => Ok(()),
        None => Err(AppError::invalid("categoryId", format!("expense category {id} does not exist"))),
    }
}

pub(crate) async fn ensure_employee(storage: &dyn Storage, id: u64) -> AppResult<()> {
    match storage.get_employee(id).await? {
        Some(_) => Ok(()),
        None => Err(AppError::invalid("employeeId", format!("employee {id} does not exist"))),
    }
}
