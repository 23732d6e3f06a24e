use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySql, MySqlPool};

use super::{Storage, StorageError, StorageResult};
use crate::model::{
    employee::{Employee, EmployeeInput},
    expense::{Expense, ExpenseInput},
    expense_category::{ExpenseCategory, ExpenseCategoryInput},
    income::{IncomeRecord, IncomeRecordInput},
    payroll::{PayrollRecord, PayrollRecordInput},
    user::{NewUser, User},
};

pub struct MySqlStorage {
    pool: MySqlPool,
}

impl MySqlStorage {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    /// Applies the embedded schema migrations.
    pub async fn migrate(&self) -> StorageResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

/// Turns key violations into `Conflict`, everything else stays a database error.
fn refused(err: sqlx::Error, message: &str) -> StorageError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_foreign_key_violation() || db_err.is_unique_violation() {
            return StorageError::Conflict(message.to_string());
        }
    }
    StorageError::Database(err)
}

/// Returns the new row id. Dropping an uncommitted transaction rolls the
/// insert back.
async fn insert_payroll<'e, E>(executor: E, user_id: u64, input: &PayrollRecordInput) -> StorageResult<u64>
where
    E: sqlx::Executor<'e, Database = MySql>,
{
    let result = sqlx::query(
        r#"
        INSERT INTO payroll_records
        (employee_id, user_id, pay_period_start, pay_period_end, gross_amount,
         deductions, net_amount, processed_on, notes, status)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(input.employee_id)
    .bind(user_id)
    .bind(input.pay_period_start)
    .bind(input.pay_period_end)
    .bind(input.gross_amount)
    .bind(input.deductions)
    .bind(input.net_amount)
    .bind(input.processed_on)
    .bind(&input.notes)
    .bind(input.status.to_string())
    .execute(executor)
    .await
    .map_err(|e| refused(e, "Payroll record references an unknown employee or user"))?;

    Ok(result.last_insert_id())
}

#[async_trait]
impl Storage for MySqlStorage {
    async fn get_user(&self, id: u64) -> StorageResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"SELECT id, username, password, name, email, role FROM users WHERE id = ?"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn get_user_by_username(&self, username: &str) -> StorageResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"SELECT id, username, password, name, email, role FROM users WHERE username = ?"#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn list_users(&self) -> StorageResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            r#"SELECT id, username, password, name, email, role FROM users ORDER BY id"#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    async fn create_user(&self, user: NewUser) -> StorageResult<User> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (username, password, name, email, role)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.role.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| refused(e, "Username already exists"))?;

        let id = result.last_insert_id();
        self.get_user(id)
            .await?
            .ok_or(StorageError::Database(sqlx::Error::RowNotFound))
    }

    async fn update_user(&self, id: u64, user: NewUser) -> StorageResult<Option<User>> {
        sqlx::query(
            r#"
            UPDATE users
            SET username = ?, password = ?, name = ?, email = ?, role = ?
            WHERE id = ?
            "#,
        )
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(&user.name)
        .bind(&user.email)
        .bind(user.role.to_string())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| refused(e, "Username already exists"))?;

        self.get_user(id).await
    }

    async fn delete_user(&self, id: u64) -> StorageResult<bool> {
        let result = sqlx::query(r#"DELETE FROM users WHERE id = ?"#)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| refused(e, "User still owns expense, payroll or income records"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_expense_category(&self, id: u64) -> StorageResult<Option<ExpenseCategory>> {
        let category = sqlx::query_as::<_, ExpenseCategory>(
            r#"SELECT id, name, description FROM expense_categories WHERE id = ?"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(category)
    }

    async fn list_expense_categories(&self) -> StorageResult<Vec<ExpenseCategory>> {
        let categories = sqlx::query_as::<_, ExpenseCategory>(
            r#"SELECT id, name, description FROM expense_categories ORDER BY name ASC"#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(categories)
    }

    async fn create_expense_category(&self, input: ExpenseCategoryInput) -> StorageResult<ExpenseCategory> {
        let result = sqlx::query(r#"INSERT INTO expense_categories (name, description) VALUES (?, ?)"#)
            .bind(&input.name)
            .bind(&input.description)
            .execute(&self.pool)
            .await?;

        self.get_expense_category(result.last_insert_id())
            .await?
            .ok_or(StorageError::Database(sqlx::Error::RowNotFound))
    }

    async fn update_expense_category(
        &self,
        id: u64,
        input: ExpenseCategoryInput,
    ) -> StorageResult<Option<ExpenseCategory>> {
        sqlx::query(r#"UPDATE expense_categories SET name = ?, description = ? WHERE id = ?"#)
            .bind(&input.name)
            .bind(&input.description)
            .bind(id)
            .execute(&self.pool)
            .await?;

        self.get_expense_category(id).await
    }

    async fn delete_expense_category(&self, id: u64) -> StorageResult<bool> {
        let result = sqlx::query(r#"DELETE FROM expense_categories WHERE id = ?"#)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| refused(e, "Expense category is still used by expenses"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_expense(&self, id: u64) -> StorageResult<Option<Expense>> {
        let expense = sqlx::query_as::<_, Expense>(
            r#"
            SELECT id, description, amount, date, category_id, user_id, notes, receipt
            FROM expenses
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(expense)
    }

    async fn list_expenses(&self) -> StorageResult<Vec<Expense>> {
        let expenses = sqlx::query_as::<_, Expense>(
            r#"
            SELECT id, description, amount, date, category_id, user_id, notes, receipt
            FROM expenses
            ORDER BY date DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(expenses)
    }

    async fn create_expense(&self, user_id: u64, input: ExpenseInput) -> StorageResult<Expense> {
        let result = sqlx::query(
            r#"
            INSERT INTO expenses (description, amount, date, category_id, user_id, notes, receipt)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&input.description)
        .bind(input.amount)
        .bind(input.date)
        .bind(input.category_id)
        .bind(user_id)
        .bind(&input.notes)
        .bind(&input.receipt)
        .execute(&self.pool)
        .await
        .map_err(|e| refused(e, "Expense references an unknown category or user"))?;

        self.get_expense(result.last_insert_id())
            .await?
            .ok_or(StorageError::Database(sqlx::Error::RowNotFound))
    }

    async fn update_expense(&self, id: u64, input: ExpenseInput) -> StorageResult<Option<Expense>> {
        sqlx::query(
            r#"
            UPDATE expenses
            SET description = ?, amount = ?, date = ?, category_id = ?, notes = ?, receipt = ?
            WHERE id = ?
            "#,
        )
        .bind(&input.description)
        .bind(input.amount)
        .bind(input.date)
        .bind(input.category_id)
        .bind(&input.notes)
        .bind(&input.receipt)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| refused(e, "Expense references an unknown category"))?;

        self.get_expense(id).await
    }

    async fn delete_expense(&self, id: u64) -> StorageResult<bool> {
        let result = sqlx::query(r#"DELETE FROM expenses WHERE id = ?"#)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_employee(&self, id: u64) -> StorageResult<Option<Employee>> {
        let employee = sqlx::query_as::<_, Employee>(
            r#"
            SELECT id, name, position, department, email, phone_number, address,
                   salary, date_hired, is_active
            FROM employees
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(employee)
    }

    async fn list_employees(&self) -> StorageResult<Vec<Employee>> {
        let employees = sqlx::query_as::<_, Employee>(
            r#"
            SELECT id, name, position, department, email, phone_number, address,
                   salary, date_hired, is_active
            FROM employees
            ORDER BY name ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(employees)
    }

    async fn create_employee(&self, input: EmployeeInput) -> StorageResult<Employee> {
        let result = sqlx::query(
            r#"
            INSERT INTO employees
            (name, position, department, email, phone_number, address, salary, date_hired, is_active)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&input.name)
        .bind(&input.position)
        .bind(&input.department)
        .bind(&input.email)
        .bind(&input.phone_number)
        .bind(&input.address)
        .bind(input.salary)
        .bind(input.date_hired)
        .bind(input.is_active)
        .execute(&self.pool)
        .await?;

        self.get_employee(result.last_insert_id())
            .await?
            .ok_or(StorageError::Database(sqlx::Error::RowNotFound))
    }

    async fn update_employee(&self, id: u64, input: EmployeeInput) -> StorageResult<Option<Employee>> {
        sqlx::query(
            r#"
            UPDATE employees
            SET name = ?, position = ?, department = ?, email = ?, phone_number = ?,
                address = ?, salary = ?, date_hired = ?, is_active = ?
            WHERE id = ?
            "#,
        )
        .bind(&input.name)
        .bind(&input.position)
        .bind(&input.department)
        .bind(&input.email)
        .bind(&input.phone_number)
        .bind(&input.address)
        .bind(input.salary)
        .bind(input.date_hired)
        .bind(input.is_active)
        .bind(id)
        .execute(&self.pool)
        .await?;

        self.get_employee(id).await
    }

    async fn delete_employee(&self, id: u64) -> StorageResult<bool> {
        // payroll_records.employee_id cascades
        let result = sqlx::query(r#"DELETE FROM employees WHERE id = ?"#)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_payroll_record(&self, id: u64) -> StorageResult<Option<PayrollRecord>> {
        let record = sqlx::query_as::<_, PayrollRecord>(
            r#"
            SELECT id, employee_id, user_id, pay_period_start, pay_period_end, gross_amount,
                   deductions, net_amount, processed_on, notes, status
            FROM payroll_records
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    async fn list_payroll_records(&self) -> StorageResult<Vec<PayrollRecord>> {
        let records = sqlx::query_as::<_, PayrollRecord>(
            r#"
            SELECT id, employee_id, user_id, pay_period_start, pay_period_end, gross_amount,
                   deductions, net_amount, processed_on, notes, status
            FROM payroll_records
            ORDER BY processed_on DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }

    async fn create_payroll_record(
        &self,
        user_id: u64,
        input: PayrollRecordInput,
    ) -> StorageResult<PayrollRecord> {
        let id = insert_payroll(&self.pool, user_id, &input).await?;

        self.get_payroll_record(id)
            .await?
            .ok_or(StorageError::Database(sqlx::Error::RowNotFound))
    }

    async fn create_payroll_records(
        &self,
        user_id: u64,
        inputs: Vec<PayrollRecordInput>,
    ) -> StorageResult<Vec<PayrollRecord>> {
        let mut tx = self.pool.begin().await?;
        let mut ids = Vec::with_capacity(inputs.len());
        for input in &inputs {
            ids.push(insert_payroll(&mut *tx, user_id, input).await?);
        }
        tx.commit().await?;

        let mut created = Vec::with_capacity(ids.len());
        for id in ids {
            let record = self
                .get_payroll_record(id)
                .await?
                .ok_or(StorageError::Database(sqlx::Error::RowNotFound))?;
            created.push(record);
        }
        Ok(created)
    }

    async fn update_payroll_record(
        &self,
        id: u64,
        input: PayrollRecordInput,
    ) -> StorageResult<Option<PayrollRecord>> {
        sqlx::query(
            r#"
            UPDATE payroll_records
            SET employee_id = ?, pay_period_start = ?, pay_period_end = ?, gross_amount = ?,
                deductions = ?, net_amount = ?, processed_on = ?, notes = ?, status = ?
            WHERE id = ?
            "#,
        )
        .bind(input.employee_id)
        .bind(input.pay_period_start)
        .bind(input.pay_period_end)
        .bind(input.gross_amount)
        .bind(input.deductions)
        .bind(input.net_amount)
        .bind(input.processed_on)
        .bind(&input.notes)
        .bind(input.status.to_string())
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| refused(e, "Payroll record references an unknown employee"))?;

        self.get_payroll_record(id).await
    }

    async fn delete_payroll_record(&self, id: u64) -> StorageResult<bool> {
        let result = sqlx::query(r#"DELETE FROM payroll_records WHERE id = ?"#)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_income_record(&self, id: u64) -> StorageResult<Option<IncomeRecord>> {
        let record = sqlx::query_as::<_, IncomeRecord>(
            r#"SELECT id, source, amount, date, description, user_id FROM income_records WHERE id = ?"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(record)
    }

    async fn list_income_records(&self) -> StorageResult<Vec<IncomeRecord>> {
        let records = sqlx::query_as::<_, IncomeRecord>(
            r#"
            SELECT id, source, amount, date, description, user_id
            FROM income_records
            ORDER BY date DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }

    async fn create_income_record(
        &self,
        user_id: u64,
        input: IncomeRecordInput,
    ) -> StorageResult<IncomeRecord> {
        let result = sqlx::query(
            r#"
            INSERT INTO income_records (source, amount, date, description, user_id)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&input.source)
        .bind(input.amount)
        .bind(input.date)
        .bind(&input.description)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| refused(e, "Income record references an unknown user"))?;

        self.get_income_record(result.last_insert_id())
            .await?
            .ok_or(StorageError::Database(sqlx::Error::RowNotFound))
    }

    async fn update_income_record(
        &self,
        id: u64,
        input: IncomeRecordInput,
    ) -> StorageResult<Option<IncomeRecord>> {
        sqlx::query(
            r#"
            UPDATE income_records
            SET source = ?, amount = ?, date = ?, description = ?
            WHERE id = ?
            "#,
        )
        .bind(&input.source)
        .bind(input.amount)
        .bind(input.date)
        .bind(&input.description)
        .bind(id)
        .execute(&self.pool)
        .await?;

        self.get_income_record(id).await
    }

    async fn delete_income_record(&self, id: u64) -> StorageResult<bool> {
        let result = sqlx::query(r#"DELETE FROM income_records WHERE id = ?"#)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn store_refresh_token(
        &self,
        user_id: u64,
        jti: &str,
        expires_at: DateTime<Utc>,
    ) -> StorageResult<()> {
        sqlx::query(r#"DELETE FROM refresh_tokens WHERE revoked = TRUE OR expires_at <= UTC_TIMESTAMP()"#)
            .execute(&self.pool)
            .await?;

        sqlx::query(
            r#"
            INSERT INTO refresh_tokens (user_id, jti, expires_at)
            VALUES (?, ?, ?)
            "#,
        )
        .bind(user_id)
        .bind(jti)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn revoke_refresh_token(&self, jti: &str) -> StorageResult<Option<u64>> {
        let revoked = sqlx::query(
            r#"
            UPDATE refresh_tokens
            SET revoked = TRUE
            WHERE jti = ? AND revoked = FALSE AND expires_at > UTC_TIMESTAMP()
            "#,
        )
        .bind(jti)
        .execute(&self.pool)
        .await?;

        if revoked.rows_affected() == 0 {
            return Ok(None);
        }

        let user_id = sqlx::query_scalar::<_, u64>(r#"SELECT user_id FROM refresh_tokens WHERE jti = ?"#)
            .bind(jti)
            .fetch_optional(&self.pool)
            .await?;
        Ok(user_id)
    }
}
