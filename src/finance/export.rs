//! CSV renderings of the three reports. Money is written as plain decimals
//! and dates as `YYYY-MM-DD`.

use chrono::{DateTime, Utc};
use csv::Writer;

use super::reports::{ExpenseReport, FinancialReport, PayrollReport};

pub type ExportResult = Result<Vec<u8>, csv::Error>;

fn day(at: &DateTime<Utc>) -> String {
    at.format("%Y-%m-%d").to_string()
}

fn finish(writer: Writer<Vec<u8>>) -> ExportResult {
    writer.into_inner().map_err(|e| csv::Error::from(e.into_error()))
}

pub fn financial_csv(report: &FinancialReport) -> ExportResult {
    let mut wtr = Writer::from_writer(Vec::new());
    wtr.write_record(["Type", "Date", "Description", "Amount"])?;

    for record in &report.income {
        wtr.write_record([
            "Income".to_string(),
            day(&record.date),
            record.source.clone(),
            record.amount.to_string(),
        ])?;
    }
    for expense in &report.expenses {
        wtr.write_record([
            "Expense".to_string(),
            day(&expense.date),
            expense.description.clone(),
            expense.amount.to_string(),
        ])?;
    }

    let totals = [
        ("Total Income", report.total_income),
        ("Total Expenses", report.total_expenses),
        ("Net Profit", report.net_profit),
    ];
    for (label, amount) in totals {
        wtr.write_record([label.to_string(), String::new(), String::new(), amount.to_string()])?;
    }
    finish(wtr)
}

pub fn expenses_csv(report: &ExpenseReport) -> ExportResult {
    let mut wtr = Writer::from_writer(Vec::new());
    wtr.write_record(["ID", "Date", "Description", "Category", "Amount", "Notes"])?;

    for line in &report.expenses {
        let e = &line.expense;
        wtr.write_record([
            e.id.to_string(),
            day(&e.date),
            e.description.clone(),
            line.category_name.clone(),
            e.amount.to_string(),
            e.notes.clone().unwrap_or_default(),
        ])?;
    }

    let total = report.total_amount.to_string();
    wtr.write_record(["", "", "", "Total", total.as_str(), ""])?;
    finish(wtr)
}

pub fn payroll_csv(report: &PayrollReport) -> ExportResult {
    let mut wtr = Writer::from_writer(Vec::new());
    wtr.write_record([
        "ID",
        "Employee",
        "Position",
        "Department",
        "Pay Period Start",
        "Pay Period End",
        "Gross",
        "Deductions",
        "Net",
        "Status",
    ])?;

    for line in &report.payroll_records {
        let r = &line.record;
        wtr.write_record([
            r.id.to_string(),
            line.employee_name.clone(),
            line.position.clone(),
            line.department.clone(),
            day(&r.pay_period_start),
            day(&r.pay_period_end),
            r.gross_amount.to_string(),
            r.deductions.to_string(),
            r.net_amount.to_string(),
            r.status.to_string(),
        ])?;
    }

    let mut totals = vec![String::new(); 10];
    totals[1] = "Total".to_string();
    totals[6] = report.total_gross_amount.to_string();
    totals[7] = report.total_deductions.to_string();
    totals[8] = report.total_net_amount.to_string();
    wtr.write_record(&totals)?;
    finish(wtr)
}
