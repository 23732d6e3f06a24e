use actix_web::{HttpResponse, http::header, web};
use chrono::Utc;
use serde::Deserialize;
use tracing::error;
use utoipa::IntoParams;

use crate::{
    error::{AppError, AppResult},
    finance::{
        DateRange,
        export::{self, ExportResult},
        reports::{self, ExpenseReport, FinancialReport, PayrollReport},
    },
    storage::Storage,
};

/// Filters shared by the report and export routes. The date range only
/// applies when both ends are present.
#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ReportQuery {
    /// `YYYY-MM-DD` or RFC 3339
    pub start_date: Option<String>,
    /// Inclusive; a plain date covers the whole day
    pub end_date: Option<String>,
    /// Expense report only
    pub category_id: Option<u64>,
}

impl ReportQuery {
    fn range(&self) -> AppResult<Option<DateRange>> {
        DateRange::from_query(self.start_date.as_deref(), self.end_date.as_deref())
    }
}

async fn financial(storage: &dyn Storage, query: &ReportQuery) -> AppResult<FinancialReport> {
    let range = query.range()?;
    let income = storage.list_income_records().await?;
    let expenses = storage.list_expenses().await?;
    reports::financial(income, expenses, range.as_ref())
}

async fn expenses(storage: &dyn Storage, query: &ReportQuery) -> AppResult<ExpenseReport> {
    let range = query.range()?;
    let expenses = storage.list_expenses().await?;
    let categories = storage.list_expense_categories().await?;
    reports::expenses(expenses, &categories, range.as_ref(), query.category_id)
}

async fn payroll(storage: &dyn Storage, query: &ReportQuery) -> AppResult<PayrollReport> {
    let range = query.range()?;
    let records = storage.list_payroll_records().await?;
    let employees = storage.list_employees().await?;
    reports::payroll(records, &employees, range.as_ref())
}

fn csv_attachment(kind: &str, rendered: ExportResult) -> AppResult<HttpResponse> {
    let body = rendered.map_err(|e| {
        error!(error = %e, report = kind, "Failed to render CSV export");
        AppError::Internal(format!("failed to render {kind} CSV: {e}"))
    })?;

    let filename = format!("{kind}-report-{}.csv", Utc::now().format("%Y-%m-%d"));

    Ok(HttpResponse::Ok()
        .content_type("text/csv; charset=utf-8")
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{filename}\""),
        ))
        .body(body))
}

#[utoipa::path(
    get,
    path = "/api/reports/financial",
    params(ReportQuery),
    responses(
        (status = 200, body = FinancialReport),
        (status = 400, description = "Unparseable date range")
    ),
    tag = "Report",
    security(("bearer_auth" = []))
)]
pub async fn financial_report(
    storage: web::Data<dyn Storage>,
    query: web::Query<ReportQuery>,
) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(financial(storage.get_ref(), &query).await?))
}

#[utoipa::path(
    get,
    path = "/api/reports/expenses",
    params(ReportQuery),
    responses(
        (status = 200, body = ExpenseReport),
        (status = 400, description = "Unparseable date range")
    ),
    tag = "Report",
    security(("bearer_auth" = []))
)]
pub async fn expense_report(
    storage: web::Data<dyn Storage>,
    query: web::Query<ReportQuery>,
) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(expenses(storage.get_ref(), &query).await?))
}

#[utoipa::path(
    get,
    path = "/api/reports/payroll",
    params(ReportQuery),
    responses(
        (status = 200, body = PayrollReport),
        (status = 400, description = "Unparseable date range")
    ),
    tag = "Report",
    security(("bearer_auth" = []))
)]
pub async fn payroll_report(
    storage: web::Data<dyn Storage>,
    query: web::Query<ReportQuery>,
) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(payroll(storage.get_ref(), &query).await?))
}

#[utoipa::path(
    get,
    path = "/api/reports/financial/export",
    params(ReportQuery),
    responses((status = 200, description = "CSV download", content_type = "text/csv", body = String)),
    tag = "Report",
    security(("bearer_auth" = []))
)]
pub async fn export_financial(
    storage: web::Data<dyn Storage>,
    query: web::Query<ReportQuery>,
) -> AppResult<HttpResponse> {
    let report = financial(storage.get_ref(), &query).await?;
    csv_attachment("financial", export::financial_csv(&report))
}

#[utoipa::path(
    get,
    path = "/api/reports/expenses/export",
    params(ReportQuery),
    responses((status = 200, description = "CSV download", content_type = "text/csv", body = String)),
    tag = "Report",
    security(("bearer_auth" = []))
)]
pub async fn export_expenses(
    storage: web::Data<dyn Storage>,
    query: web::Query<ReportQuery>,
) -> AppResult<HttpResponse> {
    let report = expenses(storage.get_ref(), &query).await?;
    csv_attachment("expenses", export::expenses_csv(&report))
}

#[utoipa::path(
    get,
    path = "/api/reports/payroll/export",
    params(ReportQuery),
    responses((status = 200, description = "CSV download", content_type = "text/csv", body = String)),
    tag = "Report",
    security(("bearer_auth" = []))
)]
pub async fn export_payroll(
    storage: web::Data<dyn Storage>,
    query: web::Query<ReportQuery>,
) -> AppResult<HttpResponse> {
    let report = payroll(storage.get_ref(), &query).await?;
    csv_attachment("payroll", export::payroll_csv(&report))
}
