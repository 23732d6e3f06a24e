pub mod datetime;
pub mod employee;
pub mod expense;
pub mod expense_category;
pub mod income;
pub mod payroll;
pub mod user;
pub mod validation;
