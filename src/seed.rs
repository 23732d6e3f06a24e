//! Demo fixtures for a fresh install. Each group is only inserted when absent,
//! so restarting against a populated store changes nothing.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::info;

use crate::{
    auth::password::hash_password,
    finance::payroll::calculate,
    model::{
        datetime::parse_timestamp,
        employee::EmployeeInput,
        expense::ExpenseInput,
        expense_category::ExpenseCategoryInput,
        income::IncomeRecordInput,
        payroll::PayrollStatus,
        user::{NewUser, Role},
    },
    storage::Storage,
};

const CATEGORIES: [(&str, &str); 5] = [
    ("Payroll", "Employee salaries and benefits"),
    ("Operations", "Day-to-day operational expenses"),
    ("Technology", "Software, hardware, and IT services"),
    ("Marketing", "Advertising and promotion"),
    ("Rent", "Office space and utilities"),
];

// name, position, department, email, phone, address, salary, hired
const EMPLOYEES: [(&str, &str, &str, &str, &str, &str, i64, &str); 3] = [
    ("John Smith", "Software Engineer", "Engineering", "john@plexpay.com", "555-1234", "123 Main St", 85_000, "2022-03-15"),
    ("Jane Doe", "Marketing Manager", "Marketing", "jane@plexpay.com", "555-5678", "456 Oak Ave", 75_000, "2021-11-01"),
    ("Robert Johnson", "Financial Analyst", "Finance", "robert@plexpay.com", "555-9012", "789 Pine St", 82_000, "2022-01-10"),
];

// description, amount in cents, date, category, notes
const EXPENSES: [(&str, i64, &str, &str, &str); 5] = [
    ("Office Supplies", 125_000, "2023-05-12", "Operations", "Quarterly office supply restocking"),
    ("Software Subscription", 29_900, "2023-05-01", "Technology", "Monthly software subscription"),
    ("Marketing Campaign", 350_000, "2023-04-28", "Marketing", "Q2 digital marketing campaign"),
    ("Office Rent", 500_000, "2023-05-01", "Rent", "Monthly office rent"),
    ("IT Equipment", 420_000, "2023-04-15", "Technology", "New laptops for engineering team"),
];

// source, amount in cents, date, description
const INCOME: [(&str, i64, &str, &str); 4] = [
    ("Client A", 1_500_000, "2023-04-05", "Project completion payment"),
    ("Client B", 850_000, "2023-05-10", "Monthly retainer"),
    ("Client C", 2_200_000, "2023-05-02", "Service contract"),
    ("Client D", 3_500_000, "2023-04-20", "Product licensing"),
];

fn date(raw: &str) -> Result<DateTime<Utc>> {
    parse_timestamp(raw).with_context(|| format!("invalid seed date `{raw}`"))
}

async fn seed_user(storage: &dyn Storage, username: &str, name: &str, role: Role, password: &str) -> Result<u64> {
    if let Some(existing) = storage.get_user_by_username(username).await? {
        return Ok(existing.id);
    }

    let password_hash = hash_password(password).map_err(|e| anyhow::anyhow!("failed to hash demo password: {e}"))?;
    let user = storage
        .create_user(NewUser {
            username: username.to_string(),
            password_hash,
            name: name.to_string(),
            email: format!("{username}@plexpay.com"),
            role,
        })
        .await?;

    info!(user_id = user.id, username, "Seeded demo user");
    Ok(user.id)
}

pub async fn seed_demo_data(storage: &dyn Storage, demo_password: &str) -> Result<()> {
    let admin_id = seed_user(storage, "admin", "Admin User", Role::Admin, demo_password).await?;
    seed_user(storage, "staff", "Staff User", Role::Staff, demo_password).await?;

    let existing = storage.list_expense_categories().await?;
    for (name, description) in CATEGORIES {
        if !existing.iter().any(|c| c.name == name) {
            storage
                .create_expense_category(ExpenseCategoryInput {
                    name: name.to_string(),
                    description: Some(description.to_string()),
                })
                .await?;
        }
    }

    if storage.list_employees().await?.is_empty() {
        for (name, position, department, email, phone, address, salary, hired) in EMPLOYEES {
            storage
                .create_employee(EmployeeInput {
                    name: name.to_string(),
                    position: position.to_string(),
                    department: department.to_string(),
                    email: email.to_string(),
                    phone_number: Some(phone.to_string()),
                    address: Some(address.to_string()),
                    salary: Decimal::from(salary),
                    date_hired: date(hired)?,
                    is_active: true,
                })
                .await?;
        }
    }

    if storage.list_expenses().await?.is_empty() {
        let categories = storage.list_expense_categories().await?;
        for (description, cents, day, category, notes) in EXPENSES {
            let category_id = categories
                .iter()
                .find(|c| c.name == category)
                .map(|c| c.id)
                .with_context(|| format!("demo category `{category}` is missing"))?;

            storage
                .create_expense(
                    admin_id,
                    ExpenseInput {
                        description: description.to_string(),
                        amount: Decimal::new(cents, 2),
                        date: date(day)?,
                        category_id,
                        notes: Some(notes.to_string()),
                        receipt: None,
                    },
                )
                .await?;
        }
    }

    if storage.list_income_records().await?.is_empty() {
        for (source, cents, day, description) in INCOME {
            storage
                .create_income_record(
                    admin_id,
                    IncomeRecordInput {
                        source: source.to_string(),
                        amount: Decimal::new(cents, 2),
                        date: date(day)?,
                        description: Some(description.to_string()),
                    },
                )
                .await?;
        }
    }

    if storage.list_payroll_records().await?.is_empty() {
        let processed_on = date("2023-05-01")?;
        let periods = [
            ("2023-04-01", "2023-04-30", PayrollStatus::Completed),
            ("2023-05-01", "2023-05-31", PayrollStatus::Pending),
        ];

        for employee in storage.list_employees().await? {
            for (start, end, status) in periods {
                let mut input = calculate(&employee, date(start)?, date(end)?).into_input(processed_on);
                input.status = status;
                storage.create_payroll_record(admin_id, input).await?;
            }
        }
    }

    info!("Demo data ready");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemStorage;

    #[actix_web::test]
    async fn seeding_twice_inserts_once() {
        let storage = MemStorage::default();

        seed_demo_data(&storage, "pw").await.unwrap();
        seed_demo_data(&storage, "pw").await.unwrap();

        assert_eq!(storage.list_users().await.unwrap().len(), 2);
        assert_eq!(storage.list_expense_categories().await.unwrap().len(), 5);
        assert_eq!(storage.list_employees().await.unwrap().len(), 3);
        assert_eq!(storage.list_expenses().await.unwrap().len(), 5);
        assert_eq!(storage.list_income_records().await.unwrap().len(), 4);
        assert_eq!(storage.list_payroll_records().await.unwrap().len(), 6);
    }

    #[actix_web::test]
    async fn may_payroll_is_pending() {
        let storage = MemStorage::default();
        seed_demo_data(&storage, "pw").await.unwrap();

        let pending: Vec<_> = storage
            .list_payroll_records()
            .await
            .unwrap()
            .into_iter()
            .filter(|r| r.status == PayrollStatus::Pending)
            .collect();

        assert_eq!(pending.len(), 3);
        assert!(pending.iter().all(|r| r.net_amount == r.gross_amount - r.deductions));
    }
}
