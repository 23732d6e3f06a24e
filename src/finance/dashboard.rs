use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Datelike, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use utoipa::ToSchema;

use super::{add, sum};
use crate::error::AppResult;
use crate::model::{
    expense::Expense,
    expense_category::ExpenseCategory,
    income::IncomeRecord,
    payroll::{PayrollRecord, PayrollStatus},
};

pub const RECENT_TRANSACTIONS: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Metrics {
    #[schema(value_type = String)]
    pub total_income: Decimal,
    #[schema(value_type = String)]
    pub total_expenses: Decimal,
    /// Always `totalIncome - totalExpenses`
    #[schema(value_type = String)]
    pub current_balance: Decimal,
    #[schema(value_type = String)]
    pub pending_payroll: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Income,
    Expense,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    /// `income-<id>` or `expense-<id>`
    #[schema(example = "expense-4")]
    pub id: String,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub description: String,
    pub category: String,
    #[schema(value_type = String, format = "date-time")]
    pub date: DateTime<Utc>,
    /// Negative for expenses
    #[schema(value_type = String)]
    pub amount: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyTotals {
    /// 1 = January
    pub month: u32,
    #[schema(value_type = String)]
    pub income: Decimal,
    #[schema(value_type = String)]
    pub expenses: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub metrics: Metrics,
    pub recent_transactions: Vec<Transaction>,
    /// Expense totals keyed by category id
    #[schema(value_type = Object, example = json!({"3": "4499.00", "5": "5000.00"}))]
    pub expenses_by_category: BTreeMap<u64, Decimal>,
    pub monthly_data: Vec<MonthlyTotals>,
}

pub fn total_income(income: &[IncomeRecord]) -> AppResult<Decimal> {
    sum(income.iter().map(|r| r.amount))
}

pub fn total_expenses(expenses: &[Expense]) -> AppResult<Decimal> {
    sum(expenses.iter().map(|e| e.amount))
}

pub fn pending_payroll(payroll: &[PayrollRecord]) -> AppResult<Decimal> {
    sum(payroll
        .iter()
        .filter(|r| r.status == PayrollStatus::Pending)
        .map(|r| r.net_amount))
}

pub fn metrics(
    income: &[IncomeRecord],
    expenses: &[Expense],
    payroll: &[PayrollRecord],
) -> AppResult<Metrics> {
    let total_income = total_income(income)?;
    let total_expenses = total_expenses(expenses)?;

    Ok(Metrics {
        total_income,
        total_expenses,
        current_balance: total_income - total_expenses,
        pending_payroll: pending_payroll(payroll)?,
    })
}

/// Twelve entries, January first. Records outside `year` are ignored.
pub fn monthly_series(
    income: &[IncomeRecord],
    expenses: &[Expense],
    year: i32,
) -> AppResult<Vec<MonthlyTotals>> {
    let mut months: Vec<MonthlyTotals> = (1..=12)
        .map(|month| MonthlyTotals {
            month,
            income: Decimal::ZERO,
            expenses: Decimal::ZERO,
        })
        .collect();

    for record in income.iter().filter(|r| r.date.year() == year) {
        let month = &mut months[record.date.month0() as usize];
        month.income = add(month.income, record.amount)?;
    }
    for expense in expenses.iter().filter(|e| e.date.year() == year) {
        let month = &mut months[expense.date.month0() as usize];
        month.expenses = add(month.expenses, expense.amount)?;
    }

    Ok(months)
}

pub fn expenses_by_category(expenses: &[Expense]) -> AppResult<BTreeMap<u64, Decimal>> {
    let mut totals = BTreeMap::new();
    for expense in expenses {
        let total = totals.entry(expense.category_id).or_insert(Decimal::ZERO);
        *total = add(*total, expense.amount)?;
    }
    Ok(totals)
}

/// Income and expenses merged, most recent first.
pub fn recent_transactions(
    income: &[IncomeRecord],
    expenses: &[Expense],
    categories: &[ExpenseCategory],
    limit: usize,
) -> Vec<Transaction> {
    let names: HashMap<u64, &str> = categories.iter().map(|c| (c.id, c.name.as_str())).collect();

    let incomes = income.iter().map(|r| Transaction {
        id: format!("income-{}", r.id),
        kind: TransactionKind::Income,
        description: r.source.clone(),
        category: "Income".to_string(),
        date: r.date,
        amount: r.amount,
    });

    let spent = expenses.iter().map(|e| Transaction {
        id: format!("expense-{}", e.id),
        kind: TransactionKind::Expense,
        description: e.description.clone(),
        category: names.get(&e.category_id).copied().unwrap_or("Unknown").to_string(),
        date: e.date,
        amount: -e.amount,
    });

    let mut transactions: Vec<Transaction> = incomes.chain(spent).collect();
    transactions.sort_by(|a, b| b.date.cmp(&a.date));
    transactions.truncate(limit);
    transactions
}

pub fn build(
    income: &[IncomeRecord],
    expenses: &[Expense],
    payroll: &[PayrollRecord],
    categories: &[ExpenseCategory],
    year: i32,
) -> AppResult<Dashboard> {
    Ok(Dashboard {
        metrics: metrics(income, expenses, payroll)?,
        recent_transactions: recent_transactions(income, expenses, categories, RECENT_TRANSACTIONS),
        expenses_by_category: expenses_by_category(expenses)?,
        monthly_data: monthly_series(income, expenses, year)?,
    })
}
