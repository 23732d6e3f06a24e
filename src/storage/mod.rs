//! Persistence behind a single trait so handlers never see the backend.
//!
//! `MySqlStorage` is what runs in production. `MemStorage` keeps everything in
//! maps and backs the test suite and `STORAGE=memory` runs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::{
    employee::{Employee, EmployeeInput},
    expense::{Expense, ExpenseInput},
    expense_category::{ExpenseCategory, ExpenseCategoryInput},
    income::{IncomeRecord, IncomeRecordInput},
    payroll::{PayrollRecord, PayrollRecordInput},
    user::{NewUser, User},
};

pub mod memory;
pub mod mysql;

pub use memory::MemStorage;
pub use mysql::MySqlStorage;

#[derive(Debug, Error)]
pub enum StorageError {
    /// The write would break a reference or a uniqueness rule.
    #[error("{0}")]
    Conflict(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
}

pub type StorageResult<T> = Result<T, StorageError>;

/// CRUD per entity. `get_*` and `update_*` return `None` for unknown ids and
/// `delete_*` returns whether a row was removed.
#[async_trait]
pub trait Storage: Send + Sync {
    // Users
    async fn get_user(&self, id: u64) -> StorageResult<Option<User>>;
    async fn get_user_by_username(&self, username: &str) -> StorageResult<Option<User>>;
    async fn list_users(&self) -> StorageResult<Vec<User>>;
    async fn create_user(&self, user: NewUser) -> StorageResult<User>;
    async fn update_user(&self, id: u64, user: NewUser) -> StorageResult<Option<User>>;
    /// Refused with `Conflict` while expenses, payroll or income still point at the user.
    async fn delete_user(&self, id: u64) -> StorageResult<bool>;

    // Expense categories
    async fn get_expense_category(&self, id: u64) -> StorageResult<Option<ExpenseCategory>>;
    async fn list_expense_categories(&self) -> StorageResult<Vec<ExpenseCategory>>;
    async fn create_expense_category(&self, input: ExpenseCategoryInput) -> StorageResult<ExpenseCategory>;
    async fn update_expense_category(
        &self,
        id: u64,
        input: ExpenseCategoryInput,
    ) -> StorageResult<Option<ExpenseCategory>>;
    /// Refused with `Conflict` while expenses still use the category.
    async fn delete_expense_category(&self, id: u64) -> StorageResult<bool>;

    // Expenses
    async fn get_expense(&self, id: u64) -> StorageResult<Option<Expense>>;
    async fn list_expenses(&self) -> StorageResult<Vec<Expense>>;
    async fn create_expense(&self, user_id: u64, input: ExpenseInput) -> StorageResult<Expense>;
    async fn update_expense(&self, id: u64, input: ExpenseInput) -> StorageResult<Option<Expense>>;
    async fn delete_expense(&self, id: u64) -> StorageResult<bool>;

    // Employees
    async fn get_employee(&self, id: u64) -> StorageResult<Option<Employee>>;
    async fn list_employees(&self) -> StorageResult<Vec<Employee>>;
    async fn create_employee(&self, input: EmployeeInput) -> StorageResult<Employee>;
    async fn update_employee(&self, id: u64, input: EmployeeInput) -> StorageResult<Option<Employee>>;
    /// Also removes the employee's payroll records.
    async fn delete_employee(&self, id: u64) -> StorageResult<bool>;

    // Payroll records
    async fn get_payroll_record(&self, id: u64) -> StorageResult<Option<PayrollRecord>>;
    async fn list_payroll_records(&self) -> StorageResult<Vec<PayrollRecord>>;
    async fn create_payroll_record(
        &self,
        user_id: u64,
        input: PayrollRecordInput,
    ) -> StorageResult<PayrollRecord>;
    /// Inserts a whole payroll run. Either every record is stored or none is.
    async fn create_payroll_records(
        &self,
        user_id: u64,
        inputs: Vec<PayrollRecordInput>,
    ) -> StorageResult<Vec<PayrollRecord>>;
    async fn update_payroll_record(
        &self,
        id: u64,
        input: PayrollRecordInput,
    ) -> StorageResult<Option<PayrollRecord>>;
    async fn delete_payroll_record(&self, id: u64) -> StorageResult<bool>;

    // Income records
    async fn get_income_record(&self, id: u64) -> StorageResult<Option<IncomeRecord>>;
    async fn list_income_records(&self) -> StorageResult<Vec<IncomeRecord>>;
    async fn create_income_record(
        &self,
        user_id: u64,
        input: IncomeRecordInput,
    ) -> StorageResult<IncomeRecord>;
    async fn update_income_record(
        &self,
        id: u64,
        input: IncomeRecordInput,
    ) -> StorageResult<Option<IncomeRecord>>;
    async fn delete_income_record(&self, id: u64) -> StorageResult<bool>;

    // Refresh tokens
    /// Also drops tokens that are already revoked or expired.
    async fn store_refresh_token(
        &self,
        user_id: u64,
        jti: &str,
        expires_at: DateTime<Utc>,
    ) -> StorageResult<()>;
    /// Marks the token revoked. Returns its owner if it was still live.
    async fn revoke_refresh_token(&self, jti: &str) -> StorageResult<Option<u64>>;
}
