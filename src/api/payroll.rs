use actix_web::{HttpResponse, web};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{info, warn};
use utoipa::ToSchema;

use super::{ensure_employee, found};
use crate::{
    auth::auth::AuthUser,
    error::{AppError, AppResult},
    finance::payroll::{self as calc, PayrollCalculation},
    model::{
        datetime,
        payroll::{PayrollRecord, PayrollRecordInput},
        validation::{Checks, Validate},
    },
    storage::Storage,
};

/// Body of the preview and process calls.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PayrollRun {
    /// Omit to pay every active employee
    #[schema(example = json!([1, 2]))]
    pub employee_ids: Option<Vec<u64>>,
    #[serde(deserialize_with = "datetime::deserialize")]
    #[schema(value_type = String, format = "date", example = "2023-05-01")]
    pub pay_period_start: DateTime<Utc>,
    #[serde(deserialize_with = "datetime::deserialize")]
    #[schema(value_type = String, format = "date", example = "2023-05-31")]
    pub pay_period_end: DateTime<Utc>,
}

impl Validate for PayrollRun {
    fn validate(&self) -> AppResult<()> {
        Checks::new()
            .check(
                self.pay_period_end >= self.pay_period_start,
                "payPeriodEnd",
                "must not be before payPeriodStart",
            )
            .check(
                self.employee_ids.as_ref().is_none_or(|ids| !ids.is_empty()),
                "employeeIds",
                "must not be empty",
            )
            .finish()
    }
}

fn id_list(ids: &[u64]) -> String {
    ids.iter().map(u64::to_string).collect::<Vec<_>>().join(", ")
}

/// Explicitly selected employees must exist and be active.
async fn calculate_run(storage: &dyn Storage, run: &PayrollRun) -> AppResult<Vec<PayrollCalculation>> {
    let employees = storage.list_employees().await?;

    if let Some(ids) = &run.employee_ids {
        let (mut unknown, mut inactive) = (Vec::new(), Vec::new());
        for id in ids {
            match employees.iter().find(|e| e.id == *id) {
                None => unknown.push(*id),
                Some(e) if !e.is_active => inactive.push(*id),
                Some(_) => {}
            }
        }
        if !unknown.is_empty() {
            return Err(AppError::invalid(
                "employeeIds",
                format!("unknown employee ids: {}", id_list(&unknown)),
            ));
        }
        if !inactive.is_empty() {
            return Err(AppError::invalid(
                "employeeIds",
                format!("inactive employee ids: {}", id_list(&inactive)),
            ));
        }
    }

    Ok(calc::eligible(&employees, run.employee_ids.as_deref())
        .into_iter()
        .map(|e| calc::calculate(e, run.pay_period_start, run.pay_period_end))
        .collect())
}

#[utoipa::path(
    get,
    path = "/api/payroll-records",
    responses((status = 200, description = "All payroll records, latest processed first", body = [PayrollRecord])),
    tag = "Payroll",
    security(("bearer_auth" = []))
)]
pub async fn list_payroll(storage: web::Data<dyn Storage>) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(storage.list_payroll_records().await?))
}

#[utoipa::path(
    get,
    path = "/api/payroll-records/{id}",
    params(("id" = u64, Path, description = "Payroll record id")),
    responses(
        (status = 200, body = PayrollRecord),
        (status = 404, description = "Payroll record not found")
    ),
    tag = "Payroll",
    security(("bearer_auth" = []))
)]
pub async fn get_payroll(storage: web::Data<dyn Storage>, path: web::Path<u64>) -> AppResult<HttpResponse> {
    let record = found("Payroll record", storage.get_payroll_record(path.into_inner()).await?)?;
    Ok(HttpResponse::Ok().json(record))
}

#[utoipa::path(
    post,
    path = "/api/payroll-records",
    request_body = PayrollRecordInput,
    responses(
        (status = 201, description = "Payroll created", body = PayrollRecord),
        (status = 400, description = "Validation failed or unknown employee"),
        (status = 401),
    ),
    tag = "Payroll",
    security(("bearer_auth" = []))
)]
pub async fn create_payroll(
    auth: AuthUser,
    storage: web::Data<dyn Storage>,
    body: web::Json<PayrollRecordInput>,
) -> AppResult<HttpResponse> {
    let input = body.into_inner();
    input.validate()?;
    ensure_employee(storage.get_ref(), input.employee_id).await?;

    let record = storage.create_payroll_record(auth.user_id, input).await?;
    info!(payroll_id = record.id, employee_id = record.employee_id, "Payroll record created");

    Ok(HttpResponse::Created().json(record))
}

#[utoipa::path(
    put,
    path = "/api/payroll-records/{id}",
    params(("id" = u64, Path, description = "Payroll record id")),
    request_body = PayrollRecordInput,
    responses(
        (status = 200, body = PayrollRecord),
        (status = 400, description = "Validation failed or unknown employee"),
        (status = 404, description = "Payroll record not found")
    ),
    tag = "Payroll",
    security(("bearer_auth" = []))
)]
pub async fn update_payroll(
    storage: web::Data<dyn Storage>,
    path: web::Path<u64>,
    body: web::Json<PayrollRecordInput>,
) -> AppResult<HttpResponse> {
    let input = body.into_inner();
    input.validate()?;
    ensure_employee(storage.get_ref(), input.employee_id).await?;

    let record = found("Payroll record", storage.update_payroll_record(path.into_inner(), input).await?)?;
    Ok(HttpResponse::Ok().json(record))
}

#[utoipa::path(
    delete,
    path = "/api/payroll-records/{id}",
    params(("id" = u64, Path, description = "Payroll record id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Payroll record not found")
    ),
    tag = "Payroll",
    security(("bearer_auth" = []))
)]
pub async fn delete_payroll(storage: web::Data<dyn Storage>, path: web::Path<u64>) -> AppResult<HttpResponse> {
    let id = path.into_inner();

    if !storage.delete_payroll_record(id).await? {
        return Err(AppError::NotFound("Payroll record"));
    }

    info!(payroll_id = id, "Payroll record deleted");
    Ok(HttpResponse::NoContent().finish())
}

/// Preview Payroll
///
/// Computes one month of pay for the selected employees without saving it.
#[utoipa::path(
    post,
    path = "/api/payroll-records/preview",
    request_body = PayrollRun,
    responses(
        (status = 200, body = [PayrollCalculation]),
        (status = 400, description = "Invalid period, unknown or inactive employee ids")
    ),
    tag = "Payroll",
    security(("bearer_auth" = []))
)]
pub async fn preview_payroll(storage: web::Data<dyn Storage>, body: web::Json<PayrollRun>) -> AppResult<HttpResponse> {
    body.validate()?;
    let preview = calculate_run(storage.get_ref(), &body).await?;
    Ok(HttpResponse::Ok().json(preview))
}

/// Process Payroll
///
/// Saves the computed records as `pending`.
#[utoipa::path(
    post,
    path = "/api/payroll-records/process",
    request_body = PayrollRun,
    responses(
        (status = 201, body = [PayrollRecord]),
        (status = 400, description = "Invalid period, unknown or inactive employee ids")
    ),
    tag = "Payroll",
    security(("bearer_auth" = []))
)]
pub async fn process_payroll(
    auth: AuthUser,
    storage: web::Data<dyn Storage>,
    body: web::Json<PayrollRun>,
) -> AppResult<HttpResponse> {
    body.validate()?;
    let calculations = calculate_run(storage.get_ref(), &body).await?;

    if calculations.is_empty() {
        warn!(user_id = auth.user_id, username = %auth.username, "Payroll run matched no active employees");
    }

    let processed_on = Utc::now();
    let inputs = calculations
        .into_iter()
        .map(|c| c.into_input(processed_on))
        .collect();
    let created = storage.create_payroll_records(auth.user_id, inputs).await?;

    info!(
        user_id = auth.user_id,
        username = %auth.username,
        records = created.len(),
        period_start = %body.pay_period_start,
        "Payroll processed"
    );

    Ok(HttpResponse::Created().json(created))
}
