use actix_web::{HttpResponse, web};
use chrono::{Datelike, Utc};

use crate::{
    error::AppResult,
    finance::dashboard::{self, Dashboard},
    storage::Storage,
};

/// Dashboard
///
/// Headline metrics, the ten latest transactions, spend per category and a
/// month-by-month series for the current year.
#[utoipa::path(
    get,
    path = "/api/dashboard",
    responses((status = 200, body = Dashboard)),
    tag = "Report",
    security(("bearer_auth" = []))
)]
pub async fn get_dashboard(storage: web::Data<dyn Storage>) -> AppResult<HttpResponse> {
    let income = storage.list_income_records().await?;
    let expenses = storage.list_expenses().await?;
    let payroll = storage.list_payroll_records().await?;
    let categories = storage.list_expense_categories().await?;

    let dashboard = dashboard::build(&income, &expenses, &payroll, &categories, Utc::now().year())?;
    Ok(HttpResponse::Ok().json(dashboard))
}
