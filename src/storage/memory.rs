use std::collections::{BTreeMap, HashMap};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{Storage, StorageError, StorageResult};
use crate::model::{
    employee::{Employee, EmployeeInput},
    expense::{Expense, ExpenseInput},
    expense_category::{ExpenseCategory, ExpenseCategoryInput},
    income::{IncomeRecord, IncomeRecordInput},
    payroll::{PayrollRecord, PayrollRecordInput},
    user::{NewUser, User},
};

/// Rows keyed by id with a monotonically increasing id counter.
#[derive(Debug)]
struct Table<T> {
    rows: BTreeMap<u64, T>,
    next_id: u64,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            next_id: 1,
        }
    }
}

impl<T: Clone> Table<T> {
    fn insert_with(&mut self, build: impl FnOnce(u64) -> T) -> T {
        let id = self.next_id;
        self.next_id += 1;
        let row = build(id);
        self.rows.insert(id, row.clone());
        row
    }

    fn get(&self, id: u64) -> Option<T> {
        self.rows.get(&id).cloned()
    }

    fn replace_with(&mut self, id: u64, build: impl FnOnce(&T) -> T) -> Option<T> {
        let slot = self.rows.get_mut(&id)?;
        let next = build(slot);
        *slot = next.clone();
        Some(next)
    }

    fn remove(&mut self, id: u64) -> bool {
        self.rows.remove(&id).is_some()
    }

    fn all(&self) -> Vec<T> {
        self.rows.values().cloned().collect()
    }

    fn any(&self, pred: impl Fn(&T) -> bool) -> bool {
        self.rows.values().any(pred)
    }
}

#[derive(Debug, Clone)]
struct RefreshToken {
    user_id: u64,
    expires_at: DateTime<Utc>,
    revoked: bool,
}

#[derive(Debug, Default)]
struct Tables {
    users: Table<User>,
    categories: Table<ExpenseCategory>,
    expenses: Table<Expense>,
    employees: Table<Employee>,
    payroll: Table<PayrollRecord>,
    income: Table<IncomeRecord>,
    refresh_tokens: HashMap<String, RefreshToken>,
}

/// Map-backed storage. List orderings match the MySQL queries.
#[derive(Debug, Default)]
pub struct MemStorage {
    tables: RwLock<Tables>,
}

impl MemStorage {
    pub fn new() -> Self {
        Self::default()
    }

    // No await happens while a guard is held, and every write leaves the maps
    // consistent, so a poisoned lock still holds usable data.
    fn read(&self) -> RwLockReadGuard<'_, Tables> {
        self.tables.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Tables> {
        self.tables.write().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Usernames compare case-insensitively, as under the MySQL collation.
fn username_taken(tables: &Tables, username: &str, except: Option<u64>) -> bool {
    tables
        .users
        .any(|u| u.username.eq_ignore_ascii_case(username) && Some(u.id) != except)
}

fn user_row(id: u64, user: NewUser) -> User {
    User {
        id,
        username: user.username,
        password: user.password_hash,
        name: user.name,
        email: user.email,
        role: user.role,
    }
}

fn expense_row(id: u64, user_id: u64, input: ExpenseInput) -> Expense {
    Expense {
        id,
        description: input.description,
        amount: input.amount,
        date: input.date,
        category_id: input.category_id,
        user_id,
        notes: input.notes,
        receipt: input.receipt,
    }
}

fn employee_row(id: u64, input: EmployeeInput) -> Employee {
    Employee {
        id,
        name: input.name,
        position: input.position,
        department: input.department,
        email: input.email,
        phone_number: input.phone_number,
        address: input.address,
        salary: input.salary,
        date_hired: input.date_hired,
        is_active: input.is_active,
    }
}

fn payroll_row(id: u64, user_id: u64, input: PayrollRecordInput) -> PayrollRecord {
    PayrollRecord {
        id,
        employee_id: input.employee_id,
        user_id,
        pay_period_start: input.pay_period_start,
        pay_period_end: input.pay_period_end,
        gross_amount: input.gross_amount,
        deductions: input.deductions,
        net_amount: input.net_amount,
        processed_on: input.processed_on,
        notes: input.notes,
        status: input.status,
    }
}

fn income_row(id: u64, user_id: u64, input: IncomeRecordInput) -> IncomeRecord {
    IncomeRecord {
        id,
        source: input.source,
        amount: input.amount,
        date: input.date,
        description: input.description,
        user_id,
    }
}

#[async_trait]
impl Storage for MemStorage {
    async fn get_user(&self, id: u64) -> StorageResult<Option<User>> {
        Ok(self.read().users.get(id))
    }

    async fn get_user_by_username(&self, username: &str) -> StorageResult<Option<User>> {
        Ok(self
            .read()
            .users
            .rows
            .values()
            .find(|u| u.username.eq_ignore_ascii_case(username))
            .cloned())
    }

    async fn list_users(&self) -> StorageResult<Vec<User>> {
        Ok(self.read().users.all())
    }

    async fn create_user(&self, user: NewUser) -> StorageResult<User> {
        let mut tables = self.write();
        if username_taken(&tables, &user.username, None) {
            return Err(StorageError::Conflict("Username already exists".into()));
        }
        Ok(tables.users.insert_with(|id| user_row(id, user)))
    }

    async fn update_user(&self, id: u64, user: NewUser) -> StorageResult<Option<User>> {
        let mut tables = self.write();
        if username_taken(&tables, &user.username, Some(id)) {
            return Err(StorageError::Conflict("Username already exists".into()));
        }
        Ok(tables.users.replace_with(id, |_| user_row(id, user)))
    }

    async fn delete_user(&self, id: u64) -> StorageResult<bool> {
        let mut tables = self.write();
        let referenced = tables.expenses.any(|e| e.user_id == id)
            || tables.payroll.any(|p| p.user_id == id)
            || tables.income.any(|i| i.user_id == id);
        if referenced {
            return Err(StorageError::Conflict(
                "User still owns expense, payroll or income records".into(),
            ));
        }
        tables.refresh_tokens.retain(|_, t| t.user_id != id);
        Ok(tables.users.remove(id))
    }

    async fn get_expense_category(&self, id: u64) -> StorageResult<Option<ExpenseCategory>> {
        Ok(self.read().categories.get(id))
    }

    async fn list_expense_categories(&self) -> StorageResult<Vec<ExpenseCategory>> {
        let mut categories = self.read().categories.all();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn create_expense_category(&self, input: ExpenseCategoryInput) -> StorageResult<ExpenseCategory> {
        Ok(self.write().categories.insert_with(|id| ExpenseCategory {
            id,
            name: input.name,
            description: input.description,
        }))
    }

    async fn update_expense_category(
        &self,
        id: u64,
        input: ExpenseCategoryInput,
    ) -> StorageResult<Option<ExpenseCategory>> {
        Ok(self.write().categories.replace_with(id, |_| ExpenseCategory {
            id,
            name: input.name,
            description: input.description,
        }))
    }

    async fn delete_expense_category(&self, id: u64) -> StorageResult<bool> {
        let mut tables = self.write();
        if tables.expenses.any(|e| e.category_id == id) {
            return Err(StorageError::Conflict(
                "Expense category is still used by expenses".into(),
            ));
        }
        Ok(tables.categories.remove(id))
    }

    async fn get_expense(&self, id: u64) -> StorageResult<Option<Expense>> {
        Ok(self.read().expenses.get(id))
    }

    async fn list_expenses(&self) -> StorageResult<Vec<Expense>> {
        let mut expenses = self.read().expenses.all();
        expenses.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(expenses)
    }

    async fn create_expense(&self, user_id: u64, input: ExpenseInput) -> StorageResult<Expense> {
        Ok(self
            .write()
            .expenses
            .insert_with(|id| expense_row(id, user_id, input)))
    }

    async fn update_expense(&self, id: u64, input: ExpenseInput) -> StorageResult<Option<Expense>> {
        Ok(self
            .write()
            .expenses
            .replace_with(id, |old| expense_row(id, old.user_id, input)))
    }

    async fn delete_expense(&self, id: u64) -> StorageResult<bool> {
        Ok(self.write().expenses.remove(id))
    }

    async fn get_employee(&self, id: u64) -> StorageResult<Option<Employee>> {
        Ok(self.read().employees.get(id))
    }

    async fn list_employees(&self) -> StorageResult<Vec<Employee>> {
        let mut employees = self.read().employees.all();
        employees.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(employees)
    }

    async fn create_employee(&self, input: EmployeeInput) -> StorageResult<Employee> {
        Ok(self.write().employees.insert_with(|id| employee_row(id, input)))
    }

    async fn update_employee(&self, id: u64, input: EmployeeInput) -> StorageResult<Option<Employee>> {
        Ok(self
            .write()
            .employees
            .replace_with(id, |_| employee_row(id, input)))
    }

    async fn delete_employee(&self, id: u64) -> StorageResult<bool> {
        let mut tables = self.write();
        let removed = tables.employees.remove(id);
        if removed {
            tables.payroll.rows.retain(|_, p| p.employee_id != id);
        }
        Ok(removed)
    }

    async fn get_payroll_record(&self, id: u64) -> StorageResult<Option<PayrollRecord>> {
        Ok(self.read().payroll.get(id))
    }

    async fn list_payroll_records(&self) -> StorageResult<Vec<PayrollRecord>> {
        let mut records = self.read().payroll.all();
        records.sort_by(|a, b| b.processed_on.cmp(&a.processed_on));
        Ok(records)
    }

    async fn create_payroll_record(
        &self,
        user_id: u64,
        input: PayrollRecordInput,
    ) -> StorageResult<PayrollRecord> {
        Ok(self
            .write()
            .payroll
            .insert_with(|id| payroll_row(id, user_id, input)))
    }

    async fn create_payroll_records(
        &self,
        user_id: u64,
        inputs: Vec<PayrollRecordInput>,
    ) -> StorageResult<Vec<PayrollRecord>> {
        let mut tables = self.write();
        Ok(inputs
            .into_iter()
            .map(|input| tables.payroll.insert_with(|id| payroll_row(id, user_id, input)))
            .collect())
    }

    async fn update_payroll_record(
        &self,
        id: u64,
        input: PayrollRecordInput,
    ) -> StorageResult<Option<PayrollRecord>> {
        Ok(self
            .write()
            .payroll
            .replace_with(id, |old| payroll_row(id, old.user_id, input)))
    }

    async fn delete_payroll_record(&self, id: u64) -> StorageResult<bool> {
        Ok(self.write().payroll.remove(id))
    }

    async fn get_income_record(&self, id: u64) -> StorageResult<Option<IncomeRecord>> {
        Ok(self.read().income.get(id))
    }

    async fn list_income_records(&self) -> StorageResult<Vec<IncomeRecord>> {
        let mut records = self.read().income.all();
        records.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(records)
    }

    async fn create_income_record(
        &self,
        user_id: u64,
        input: IncomeRecordInput,
    ) -> StorageResult<IncomeRecord> {
        Ok(self
            .write()
            .income
            .insert_with(|id| income_row(id, user_id, input)))
    }

    async fn update_income_record(
        &self,
        id: u64,
        input: IncomeRecordInput,
    ) -> StorageResult<Option<IncomeRecord>> {
        Ok(self
            .write()
            .income
            .replace_with(id, |old| income_row(id, old.user_id, input)))
    }

    async fn delete_income_record(&self, id: u64) -> StorageResult<bool> {
        Ok(self.write().income.remove(id))
    }

    async fn store_refresh_token(
        &self,
        user_id: u64,
        jti: &str,
        expires_at: DateTime<Utc>,
    ) -> StorageResult<()> {
        let now = Utc::now();
        let mut tables = self.write();
        tables
            .refresh_tokens
            .retain(|_, t| !t.revoked && t.expires_at > now);
        tables.refresh_tokens.insert(
            jti.to_string(),
            RefreshToken {
                user_id,
                expires_at,
                revoked: false,
            },
        );
        Ok(())
    }

    async fn revoke_refresh_token(&self, jti: &str) -> StorageResult<Option<u64>> {
        let mut tables = self.write();
        let Some(token) = tables.refresh_tokens.get_mut(jti) else {
            return Ok(None);
        };

        let live = !token.revoked && token.expires_at > Utc::now();
        token.revoked = true;
        Ok(live.then_some(token.user_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::payroll::PayrollStatus;
    use crate::model::user::Role;
    use chrono::{Duration, TimeZone};
    use rust_decimal::Decimal;

    fn day(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn new_user(username: &str) -> NewUser {
        NewUser {
            username: username.into(),
            password_hash: "hash".into(),
            name: "Someone".into(),
            email: "someone@plexpay.com".into(),
            role: Role::Staff,
        }
    }

    fn expense(category_id: u64, date: DateTime<Utc>) -> ExpenseInput {
        ExpenseInput {
            description: "Office Supplies".into(),
            amount: Decimal::new(125000, 2),
            date,
            category_id,
            notes: None,
            receipt: None,
        }
    }

    fn employee(name: &str) -> EmployeeInput {
        EmployeeInput {
            name: name.into(),
            position: "Engineer".into(),
            department: "Engineering".into(),
            email: "e@plexpay.com".into(),
            phone_number: None,
            address: None,
            salary: Decimal::new(85000, 0),
            date_hired: day(2022, 3, 15),
            is_active: true,
        }
    }

    fn payroll(employee_id: u64) -> PayrollRecordInput {
        PayrollRecordInput {
            employee_id,
            pay_period_start: day(2023, 5, 1),
            pay_period_end: day(2023, 5, 31),
            gross_amount: Decimal::new(100, 0),
            deductions: Decimal::new(20, 0),
            net_amount: Decimal::new(80, 0),
            processed_on: day(2023, 5, 31),
            notes: None,
            status: PayrollStatus::Pending,
        }
    }

    #[actix_web::test]
    async fn ids_are_assigned_sequentially() {
        let storage = MemStorage::new();
        let a = storage.create_user(new_user("a")).await.unwrap();
        let b = storage.create_user(new_user("b")).await.unwrap();
        assert_eq!((a.id, b.id), (1, 2));
    }

    #[actix_web::test]
    async fn duplicate_usernames_conflict() {
        let storage = MemStorage::new();
        storage.create_user(new_user("admin")).await.unwrap();
        let err = storage.create_user(new_user("admin")).await.unwrap_err();
        assert!(matches!(err, StorageError::Conflict(_)));
    }

    #[actix_web::test]
    async fn delete_then_get_is_none() {
        let storage = MemStorage::new();
        let category = storage
            .create_expense_category(ExpenseCategoryInput {
                name: "Rent".into(),
                description: None,
            })
            .await
            .unwrap();
        let created = storage
            .create_expense(1, expense(category.id, day(2023, 5, 1)))
            .await
            .unwrap();

        assert!(storage.delete_expense(created.id).await.unwrap());
        assert!(storage.get_expense(created.id).await.unwrap().is_none());
        assert!(!storage.delete_expense(created.id).await.unwrap());
    }

    #[actix_web::test]
    async fn update_keeps_the_owner() {
        let storage = MemStorage::new();
        let created = storage.create_expense(4, expense(1, day(2023, 5, 1))).await.unwrap();
        let mut input = expense(1, day(2023, 6, 1));
        input.description = "Printer paper".into();

        let updated = storage.update_expense(created.id, input).await.unwrap().unwrap();
        assert_eq!(updated.user_id, 4);
        assert_eq!(updated.description, "Printer paper");
        assert!(storage.update_expense(99, expense(1, day(2023, 6, 1))).await.unwrap().is_none());
    }

    #[actix_web::test]
    async fn expenses_list_newest_first() {
        let storage = MemStorage::new();
        storage.create_expense(1, expense(1, day(2023, 4, 15))).await.unwrap();
        storage.create_expense(1, expense(1, day(2023, 5, 12))).await.unwrap();
        storage.create_expense(1, expense(1, day(2023, 5, 1))).await.unwrap();

        let dates: Vec<_> = storage
            .list_expenses()
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.date)
            .collect();
        assert_eq!(dates, [day(2023, 5, 12), day(2023, 5, 1), day(2023, 4, 15)]);
    }

    #[actix_web::test]
    async fn category_in_use_cannot_be_deleted() {
        let storage = MemStorage::new();
        let category = storage
            .create_expense_category(ExpenseCategoryInput {
                name: "Technology".into(),
                description: None,
            })
            .await
            .unwrap();
        let spent = storage.create_expense(1, expense(category.id, day(2023, 5, 1))).await.unwrap();

        let err = storage.delete_expense_category(category.id).await.unwrap_err();
        assert!(matches!(err, StorageError::Conflict(_)));

        storage.delete_expense(spent.id).await.unwrap();
        assert!(storage.delete_expense_category(category.id).await.unwrap());
    }

    #[actix_web::test]
    async fn deleting_an_employee_removes_their_payroll() {
        let storage = MemStorage::new();
        let kept = storage.create_employee(employee("Jane Doe")).await.unwrap();
        let gone = storage.create_employee(employee("John Smith")).await.unwrap();
        storage.create_payroll_record(1, payroll(kept.id)).await.unwrap();
        storage.create_payroll_record(1, payroll(gone.id)).await.unwrap();

        assert!(storage.delete_employee(gone.id).await.unwrap());
        let remaining = storage.list_payroll_records().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].employee_id, kept.id);
    }

    #[actix_web::test]
    async fn refresh_tokens_revoke_once() {
        let storage = MemStorage::new();
        let expires = Utc::now() + Duration::hours(1);
        storage.store_refresh_token(3, "jti-1", expires).await.unwrap();

        assert_eq!(storage.revoke_refresh_token("jti-1").await.unwrap(), Some(3));
        assert_eq!(storage.revoke_refresh_token("jti-1").await.unwrap(), None);
        assert_eq!(storage.revoke_refresh_token("unknown").await.unwrap(), None);
    }

    #[actix_web::test]
    async fn expired_refresh_tokens_are_not_live() {
        let storage = MemStorage::new();
        let expired = Utc::now() - Duration::seconds(1);
        storage.store_refresh_token(3, "old", expired).await.unwrap();
        assert_eq!(storage.revoke_refresh_token("old").await.unwrap(), None);
    }

    #[actix_web::test]
    async fn storing_a_token_prunes_dead_ones() {
        let storage = MemStorage::new();
        let live = Utc::now() + Duration::hours(1);
        storage.store_refresh_token(3, "expired", Utc::now() - Duration::seconds(1)).await.unwrap();
        storage.store_refresh_token(3, "rotated", live).await.unwrap();
        storage.revoke_refresh_token("rotated").await.unwrap();
        storage.store_refresh_token(3, "current", live).await.unwrap();

        let tables = storage.read();
        let mut kept: Vec<_> = tables.refresh_tokens.keys().cloned().collect();
        kept.sort();
        assert_eq!(kept, ["current"]);
    }

    #[actix_web::test]
    async fn payroll_batch_is_inserted_together() {
        let storage = MemStorage::new();
        let first = storage.create_employee(employee("Ada")).await.unwrap();
        let second = storage.create_employee(employee("Grace")).await.unwrap();

        let created = storage
            .create_payroll_records(4, vec![payroll(first.id), payroll(second.id)])
            .await
            .unwrap();

        assert_eq!(created.len(), 2);
        assert_ne!(created[0].id, created[1].id);
        assert!(created.iter().all(|r| r.user_id == 4));
        assert_eq!(storage.list_payroll_records().await.unwrap().len(), 2);
    }
}
