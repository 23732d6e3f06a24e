use actix_web::{HttpResponse, web};
use tracing::info;

use super::found;
use crate::{
    auth::auth::AuthUser,
    error::{AppError, AppResult},
    model::{
        income::{IncomeRecord, IncomeRecordInput},
        validation::Validate,
    },
    storage::Storage,
};

#[utoipa::path(
    get,
    path = "/api/income-records",
    responses((status = 200, description = "All income, newest first", body = [IncomeRecord])),
    tag = "Income",
    security(("bearer_auth" = []))
)]
pub async fn list_income(storage: web::Data<dyn Storage>) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(storage.list_income_records().await?))
}

#[utoipa::path(
    get,
    path = "/api/income-records/{id}",
    params(("id" = u64, Path, description = "Income record id")),
    responses(
        (status = 200, body = IncomeRecord),
        (status = 404, description = "Income record not found")
    ),
    tag = "Income",
    security(("bearer_auth" = []))
)]
pub async fn get_income(storage: web::Data<dyn Storage>, path: web::Path<u64>) -> AppResult<HttpResponse> {
    let record = found("Income record", storage.get_income_record(path.into_inner()).await?)?;
    Ok(HttpResponse::Ok().json(record))
}

#[utoipa::path(
    post,
    path = "/api/income-records",
    request_body = IncomeRecordInput,
    responses(
        (status = 201, body = IncomeRecord),
        (status = 400, description = "Validation failed")
    ),
    tag = "Income",
    security(("bearer_auth" = []))
)]
pub async fn create_income(
    auth: AuthUser,
    storage: web::Data<dyn Storage>,
    body: web::Json<IncomeRecordInput>,
) -> AppResult<HttpResponse> {
    let input = body.into_inner();
    input.validate()?;

    let record = storage.create_income_record(auth.user_id, input).await?;
    info!(income_id = record.id, user_id = auth.user_id, username = %auth.username, amount = %record.amount, "Income recorded");

    Ok(HttpResponse::Created().json(record))
}

#[utoipa::path(
    put,
    path = "/api/income-records/{id}",
    params(("id" = u64, Path, description = "Income record id")),
    request_body = IncomeRecordInput,
    responses(
        (status = 200, body = IncomeRecord),
        (status = 400, description = "Validation failed"),
        (status = 404, description = "Income record not found")
    ),
    tag = "Income",
    security(("bearer_auth" = []))
)]
pub async fn update_income(
    storage: web::Data<dyn Storage>,
    path: web::Path<u64>,
    body: web::Json<IncomeRecordInput>,
) -> AppResult<HttpResponse> {
    let input = body.into_inner();
    input.validate()?;

    let record = found("Income record", storage.update_income_record(path.into_inner(), input).await?)?;
    Ok(HttpResponse::Ok().json(record))
}

#[utoipa::path(
    delete,
    path = "/api/income-records/{id}",
    params(("id" = u64, Path, description = "Income record id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Income record not found")
    ),
    tag = "Income",
    security(("bearer_auth" = []))
)]
pub async fn delete_income(storage: web::Data<dyn Storage>, path: web::Path<u64>) -> AppResult<HttpResponse> {
    let id = path.into_inner();

    if !storage.delete_income_record(id).await? {
        return Err(AppError::NotFound("Income record"));
    }

    info!(income_id = id, "Income record deleted");
    Ok(HttpResponse::NoContent().finish())
}
