use actix_web::{HttpResponse, web};
use tracing::info;

use super::{ensure_category, found};
use crate::{
    auth::auth::AuthUser,
    error::{AppError, AppResult},
    model::{
        expense::{Expense, ExpenseInput},
        validation::Validate,
    },
    storage::Storage,
};

#[utoipa::path(
    get,
    path = "/api/expenses",
    responses((status = 200, description = "All expenses, newest first", body = [Expense])),
    tag = "Expense",
    security(("bearer_auth" = []))
)]
pub async fn list_expenses(storage: web::Data<dyn Storage>) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(storage.list_expenses().await?))
}

#[utoipa::path(
    get,
    path = "/api/expenses/{id}",
    params(("id" = u64, Path, description = "Expense id")),
    responses(
        (status = 200, body = Expense),
        (status = 404, description = "Expense not found", body = Object, example = json!({
            "error": "Expense not found"
        }))
    ),
    tag = "Expense",
    security(("bearer_auth" = []))
)]
pub async fn get_expense(storage: web::Data<dyn Storage>, path: web::Path<u64>) -> AppResult<HttpResponse> {
    let expense = found("Expense", storage.get_expense(path.into_inner()).await?)?;
    Ok(HttpResponse::Ok().json(expense))
}

/// Create Expense
///
/// The expense is recorded against the calling user.
#[utoipa::path(
    post,
    path = "/api/expenses",
    request_body = ExpenseInput,
    responses(
        (status = 201, body = Expense),
        (status = 400, description = "Validation failed or unknown category")
    ),
    tag = "Expense",
    security(("bearer_auth" = []))
)]
pub async fn create_expense(
    auth: AuthUser,
    storage: web::Data<dyn Storage>,
    body: web::Json<ExpenseInput>,
) -> AppResult<HttpResponse> {
    let input = body.into_inner();
    input.validate()?;
    ensure_category(storage.get_ref(), input.category_id).await?;

    let expense = storage.create_expense(auth.user_id, input).await?;
    info!(expense_id = expense.id, user_id = auth.user_id, username = %auth.username, amount = %expense.amount, "Expense created");

    Ok(HttpResponse::Created().json(expense))
}

#[utoipa::path(
    put,
    path = "/api/expenses/{id}",
    params(("id" = u64, Path, description = "Expense id")),
    request_body = ExpenseInput,
    responses(
        (status = 200, body = Expense),
        (status = 400, description = "Validation failed or unknown category"),
        (status = 404, description = "Expense not found")
    ),
    tag = "Expense",
    security(("bearer_auth" = []))
)]
pub async fn update_expense(
    storage: web::Data<dyn Storage>,
    path: web::Path<u64>,
    body: web::Json<ExpenseInput>,
) -> AppResult<HttpResponse> {
    let id = path.into_inner();
    let input = body.into_inner();
    input.validate()?;
    ensure_category(storage.get_ref(), input.category_id).await?;

    let expense = found("Expense", storage.update_expense(id, input).await?)?;
    Ok(HttpResponse::Ok().json(expense))
}

#[utoipa::path(
    delete,
    path = "/api/expenses/{id}",
    params(("id" = u64, Path, description = "Expense id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Expense not found")
    ),
    tag = "Expense",
    security(("bearer_auth" = []))
)]
pub async fn delete_expense(storage: web::Data<dyn Storage>, path: web::Path<u64>) -> AppResult<HttpResponse> {
    let id = path.into_inner();

    if !storage.delete_expense(id).await? {
        return Err(AppError::NotFound("Expense"));
    }

    info!(expense_id = id, "Expense deleted");
    Ok(HttpResponse::NoContent().finish())
}
