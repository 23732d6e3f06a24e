use std::collections::{BTreeMap, HashMap};

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use utoipa::ToSchema;

use super::{DateRange, add, in_range, sum};
use crate::error::AppResult;
use crate::model::{
    employee::Employee, expense::Expense, expense_category::ExpenseCategory,
    income::IncomeRecord, payroll::PayrollRecord,
};

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FinancialReport {
    #[schema(value_type = String)]
    pub total_income: Decimal,
    #[schema(value_type = String)]
    pub total_expenses: Decimal,
    #[schema(value_type = String)]
    pub net_profit: Decimal,
    pub income: Vec<IncomeRecord>,
    pub expenses: Vec<Expense>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseLine {
    #[serde(flatten)]
    pub expense: Expense,
    pub category_name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CategoryTotal {
    pub category_id: u64,
    pub category_name: String,
    #[schema(value_type = String)]
    pub total: Decimal,
    pub count: usize,
    /// Share of the report total, 0-100 with two decimals
    #[schema(value_type = String)]
    pub percentage: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseReport {
    pub expenses: Vec<ExpenseLine>,
    pub expenses_by_category: Vec<CategoryTotal>,
    #[schema(value_type = String)]
    pub total_amount: Decimal,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PayrollLine {
    #[serde(flatten)]
    pub record: PayrollRecord,
    pub employee_name: String,
    pub position: String,
    pub department: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentTotal {
    pub department: String,
    #[schema(value_type = String)]
    pub total_gross: Decimal,
    #[schema(value_type = String)]
    pub total_net: Decimal,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PayrollReport {
    pub payroll_records: Vec<PayrollLine>,
    #[schema(value_type = String)]
    pub total_gross_amount: Decimal,
    #[schema(value_type = String)]
    pub total_deductions: Decimal,
    #[schema(value_type = String)]
    pub total_net_amount: Decimal,
    pub payroll_by_department: Vec<DepartmentTotal>,
}

fn percentage(part: Decimal, whole: Decimal) -> Decimal {
    if whole.is_zero() {
        return Decimal::ZERO;
    }
    (part / whole * Decimal::ONE_HUNDRED).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

pub fn financial(
    income: Vec<IncomeRecord>,
    expenses: Vec<Expense>,
    range: Option<&DateRange>,
) -> AppResult<FinancialReport> {
    let income: Vec<IncomeRecord> = income.into_iter().filter(|r| in_range(range, r.date)).collect();
    let expenses: Vec<Expense> = expenses.into_iter().filter(|e| in_range(range, e.date)).collect();

    let total_income = sum(income.iter().map(|r| r.amount))?;
    let total_expenses = sum(expenses.iter().map(|e| e.amount))?;

    Ok(FinancialReport {
        total_income,
        total_expenses,
        net_profit: total_income - total_expenses,
        income,
        expenses,
    })
}

/// Every known category gets a row, including those with nothing spent in
/// the selection.
pub fn expenses(
    expenses: Vec<Expense>,
    categories: &[ExpenseCategory],
    range: Option<&DateRange>,
    category_id: Option<u64>,
) -> AppResult<ExpenseReport> {
    let names: HashMap<u64, &str> = categories.iter().map(|c| (c.id, c.name.as_str())).collect();

    let lines: Vec<ExpenseLine> = expenses
        .into_iter()
        .filter(|e| in_range(range, e.date))
        .filter(|e| category_id.is_none_or(|id| e.category_id == id))
        .map(|expense| ExpenseLine {
            category_name: names.get(&expense.category_id).copied().unwrap_or("Unknown").to_string(),
            expense,
        })
        .collect();

    let total_amount = sum(lines.iter().map(|l| l.expense.amount))?;

    let expenses_by_category = categories
        .iter()
        .map(|category| {
            let mine = lines.iter().filter(|l| l.expense.category_id == category.id);
            let total = sum(mine.clone().map(|l| l.expense.amount))?;
            Ok(CategoryTotal {
                category_id: category.id,
                category_name: category.name.clone(),
                total,
                count: mine.count(),
                percentage: percentage(total, total_amount),
            })
        })
        .collect::<AppResult<_>>()?;

    Ok(ExpenseReport {
        expenses: lines,
        expenses_by_category,
        total_amount,
    })
}

/// Filters on `processedOn`. Records whose employee is gone are reported as
/// "Unknown".
pub fn payroll(
    records: Vec<PayrollRecord>,
    employees: &[Employee],
    range: Option<&DateRange>,
) -> AppResult<PayrollReport> {
    let by_id: HashMap<u64, &Employee> = employees.iter().map(|e| (e.id, e)).collect();

    let lines: Vec<PayrollLine> = records
        .into_iter()
        .filter(|r| in_range(range, r.processed_on))
        .map(|record| {
            let employee = by_id.get(&record.employee_id);
            PayrollLine {
                employee_name: employee.map_or("Unknown", |e| e.name.as_str()).to_string(),
                position: employee.map_or("Unknown", |e| e.position.as_str()).to_string(),
                department: employee.map_or("Unknown", |e| e.department.as_str()).to_string(),
                record,
            }
        })
        .collect();

    let mut departments: BTreeMap<&str, DepartmentTotal> = BTreeMap::new();
    for line in &lines {
        let entry = departments
            .entry(line.department.as_str())
            .or_insert_with(|| DepartmentTotal {
                department: line.department.clone(),
                total_gross: Decimal::ZERO,
                total_net: Decimal::ZERO,
                count: 0,
            });
        entry.total_gross = add(entry.total_gross, line.record.gross_amount)?;
        entry.total_net = add(entry.total_net, line.record.net_amount)?;
        entry.count += 1;
    }
    let payroll_by_department = departments.into_values().collect();

    Ok(PayrollReport {
        total_gross_amount: sum(lines.iter().map(|l| l.record.gross_amount))?,
        total_deductions: sum(lines.iter().map(|l| l.record.deductions))?,
        total_net_amount: sum(lines.iter().map(|l| l.record.net_amount))?,
        payroll_by_department,
        payroll_records: lines,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::payroll::PayrollStatus;
    use chrono::{DateTime, TimeZone, Utc};
    use std::str::FromStr;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn at(m: u32, day: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2023, m, day, 9, 0, 0).unwrap()
    }

    fn category(id: u64, name: &str) -> ExpenseCategory {
        ExpenseCategory {
            id,
            name: name.into(),
            description: None,
        }
    }

    fn expense(id: u64, category_id: u64, amount: &str, date: DateTime<Utc>) -> Expense {
        Expense {
            id,
            description: format!("Expense {id}"),
            amount: d(amount),
            date,
            category_id,
            user_id: 1,
            notes: None,
            receipt: None,
        }
    }

    fn employee(id: u64, name: &str, department: &str) -> Employee {
        Employee {
            id,
            name: name.into(),
            position: "Engineer".into(),
            department: department.into(),
            email: format!("{id}@example.com"),
            phone_number: None,
            address: None,
            salary: d("60000"),
            date_hired: at(1, 1),
            is_active: true,
        }
    }

    fn record(id: u64, employee_id: u64, gross: &str, deductions: &str, processed: DateTime<Utc>) -> PayrollRecord {
        PayrollRecord {
            id,
            employee_id,
            user_id: 1,
            pay_period_start: at(4, 1),
            pay_period_end: at(4, 30),
            gross_amount: d(gross),
            deductions: d(deductions),
            net_amount: d(gross) - d(deductions),
            processed_on: processed,
            notes: None,
            status: PayrollStatus::Completed,
        }
    }

    #[test]
    fn financial_report_filters_both_sides_by_range() {
        let income = vec![IncomeRecord {
            id: 1,
            source: "Client".into(),
            amount: d("15000"),
            date: at(4, 5),
            description: None,
            user_id: 1,
        }];
        let expenses = vec![expense(1, 1, "1250", at(4, 10)), expense(2, 1, "5000", at(5, 1))];
        let range = DateRange::from_query(Some("2023-04-01"), Some("2023-04-30")).unwrap();

        let report = financial(income, expenses, range.as_ref()).unwrap();
        assert_eq!(report.total_expenses, d("1250"));
        assert_eq!(report.net_profit, d("13750"));
        assert_eq!(report.expenses.len(), 1);
    }

    #[test]
    fn expense_report_percentages_and_names() {
        let categories = vec![category(1, "Office"), category(2, "Rent"), category(3, "Travel")];
        let list = vec![
            expense(1, 1, "250", at(5, 1)),
            expense(2, 2, "750", at(5, 2)),
            expense(3, 7, "0", at(5, 3)),
        ];

        let report = expenses(list, &categories, None, None).unwrap();
        assert_eq!(report.total_amount, d("1000"));
        assert_eq!(report.expenses_by_category.len(), 3);
        assert_eq!(report.expenses_by_category[0].percentage, d("25.00"));
        assert_eq!(report.expenses_by_category[1].percentage, d("75.00"));
        assert_eq!(report.expenses_by_category[2].count, 0);
        assert_eq!(report.expenses[2].category_name, "Unknown");
    }

    #[test]
    fn expense_report_category_filter() {
        let categories = vec![category(1, "Office"), category(2, "Rent")];
        let list = vec![expense(1, 1, "250", at(5, 1)), expense(2, 2, "750", at(5, 2))];

        let report = expenses(list, &categories, None, Some(2)).unwrap();
        assert_eq!(report.expenses.len(), 1);
        assert_eq!(report.total_amount, d("750"));
        assert_eq!(report.expenses_by_category[0].total, Decimal::ZERO);
        assert_eq!(report.expenses_by_category[1].percentage, d("100.00"));
    }

    #[test]
    fn empty_expense_report_has_zero_percentages() {
        let report = expenses(Vec::new(), &[category(1, "Office")], None, None).unwrap();
        assert_eq!(report.expenses_by_category[0].percentage, Decimal::ZERO);
    }

    #[test]
    fn payroll_report_groups_by_department() {
        let employees = vec![employee(1, "Ann", "Engineering"), employee(2, "Bob", "Design"), employee(3, "Cy", "Engineering")];
        let records = vec![
            record(1, 1, "5000", "1000", at(4, 30)),
            record(2, 2, "4000", "800", at(4, 30)),
            record(3, 3, "6000", "1200", at(4, 30)),
            record(4, 1, "5000", "1000", at(6, 30)),
        ];
        let range = DateRange::from_query(Some("2023-04-01"), Some("2023-04-30")).unwrap();

        let report = payroll(records, &employees, range.as_ref()).unwrap();
        assert_eq!(report.payroll_records.len(), 3);
        assert_eq!(report.total_gross_amount, d("15000"));
        assert_eq!(report.total_deductions, d("3000"));
        assert_eq!(report.total_net_amount, d("12000"));

        let depts: Vec<&str> = report.payroll_by_department.iter().map(|t| t.department.as_str()).collect();
        assert_eq!(depts, ["Design", "Engineering"]);
        assert_eq!(report.payroll_by_department[1].count, 2);
        assert_eq!(report.payroll_by_department[1].total_net, d("8800"));
    }

    #[test]
    fn payroll_line_for_removed_employee() {
        let report = payroll(vec![record(1, 42, "100", "20", at(4, 1))], &[], None).unwrap();
        assert_eq!(report.payroll_records[0].employee_name, "Unknown");
        assert_eq!(report.payroll_by_department[0].department, "Unknown");
    }
}
