//! Monthly payroll generation: one twelfth of the annual salary, with a flat
//! deduction rate.

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use utoipa::ToSchema;

use crate::model::{
    employee::Employee,
    payroll::{PayrollRecordInput, PayrollStatus},
};

pub fn deduction_rate() -> Decimal {
    Decimal::new(20, 2)
}

fn cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PayrollCalculation {
    pub employee_id: u64,
    pub employee_name: String,
    pub position: String,
    pub department: String,
    #[schema(value_type = String, format = "date-time")]
    pub pay_period_start: DateTime<Utc>,
    #[schema(value_type = String, format = "date-time")]
    pub pay_period_end: DateTime<Utc>,
    #[schema(value_type = String)]
    pub gross_amount: Decimal,
    #[schema(value_type = String)]
    pub deductions: Decimal,
    #[schema(value_type = String)]
    pub net_amount: Decimal,
    pub notes: String,
}

/// e.g. "Salary for May 2023"
pub fn period_note(start: DateTime<Utc>) -> String {
    format!("Salary for {}", start.format("%B %Y"))
}

/// Net is derived from the rounded figures so it always equals
/// `gross - deductions` to the cent.
pub fn calculate(employee: &Employee, start: DateTime<Utc>, end: DateTime<Utc>) -> PayrollCalculation {
    let gross_amount = cents(employee.salary / Decimal::from(12));
    let deductions = cents(gross_amount * deduction_rate());

    PayrollCalculation {
        employee_id: employee.id,
        employee_name: employee.name.clone(),
        position: employee.position.clone(),
        department: employee.department.clone(),
        pay_period_start: start,
        pay_period_end: end,
        gross_amount,
        deductions,
        net_amount: gross_amount - deductions,
        notes: period_note(start),
    }
}

/// Active employees, optionally narrowed to `only`.
pub fn eligible<'a>(employees: &'a [Employee], only: Option<&[u64]>) -> Vec<&'a Employee> {
    employees
        .iter()
        .filter(|e| e.is_active)
        .filter(|e| only.is_none_or(|ids| ids.contains(&e.id)))
        .collect()
}

impl PayrollCalculation {
    pub fn into_input(self, processed_on: DateTime<Utc>) -> PayrollRecordInput {
        PayrollRecordInput {
            employee_id: self.employee_id,
            pay_period_start: self.pay_period_start,
            pay_period_end: self.pay_period_end,
            gross_amount: self.gross_amount,
            deductions: self.deductions,
            net_amount: self.net_amount,
            processed_on,
            notes: Some(self.notes),
            status: PayrollStatus::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::str::FromStr;

    fn d(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn employee(id: u64, salary: &str, is_active: bool) -> Employee {
        Employee {
            id,
            name: format!("Employee {id}"),
            position: "Engineer".into(),
            department: "Engineering".into(),
            email: format!("e{id}@example.com"),
            phone_number: None,
            address: None,
            salary: d(salary),
            date_hired: Utc.with_ymd_and_hms(2022, 1, 10, 0, 0, 0).unwrap(),
            is_active,
        }
    }

    fn may() -> (DateTime<Utc>, DateTime<Utc>) {
        (
            Utc.with_ymd_and_hms(2023, 5, 1, 0, 0, 0).unwrap(),
            Utc.with_ymd_and_hms(2023, 5, 31, 0, 0, 0).unwrap(),
        )
    }

    #[test]
    fn splits_salary_into_a_month_with_deductions() {
        let (start, end) = may();
        let calc = calculate(&employee(1, "85000", true), start, end);

        assert_eq!(calc.gross_amount, d("7083.33"));
        assert_eq!(calc.deductions, d("1416.67"));
        assert_eq!(calc.net_amount, d("5666.66"));
        assert_eq!(calc.net_amount, calc.gross_amount - calc.deductions);
        assert_eq!(calc.notes, "Salary for May 2023");
    }

    #[test]
    fn even_salaries_stay_exact() {
        let (start, end) = may();
        let calc = calculate(&employee(1, "60000", true), start, end);
        assert_eq!(calc.gross_amount, d("5000"));
        assert_eq!(calc.deductions, d("1000"));
        assert_eq!(calc.net_amount, d("4000"));
    }

    #[test]
    fn only_active_and_selected_employees_are_eligible() {
        let staff = vec![employee(1, "1", true), employee(2, "1", false), employee(3, "1", true)];

        let all: Vec<u64> = eligible(&staff, None).iter().map(|e| e.id).collect();
        assert_eq!(all, [1, 3]);

        let picked: Vec<u64> = eligible(&staff, Some(&[2, 3][..])).iter().map(|e| e.id).collect();
        assert_eq!(picked, [3]);
    }

    #[test]
    fn processed_records_start_pending() {
        let (start, end) = may();
        let input = calculate(&employee(4, "48000", true), start, end).into_input(end);
        assert_eq!(input.status, PayrollStatus::Pending);
        assert_eq!(input.employee_id, 4);
        assert_eq!(input.notes.as_deref(), Some("Salary for May 2023"));
    }
}
