use actix_web::{HttpResponse, web};
use tracing::info;

use super::found;
use crate::{
    error::{AppError, AppResult},
    model::{
        expense_category::{ExpenseCategory, ExpenseCategoryInput},
        validation::Validate,
    },
    storage::Storage,
};

#[utoipa::path(
    get,
    path = "/api/expense-categories",
    responses((status = 200, description = "All categories, by name", body = [ExpenseCategory])),
    tag = "Expense Category",
    security(("bearer_auth" = []))
)]
pub async fn list_categories(storage: web::Data<dyn Storage>) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(storage.list_expense_categories().await?))
}

#[utoipa::path(
    get,
    path = "/api/expense-categories/{id}",
    params(("id" = u64, Path, description = "Category id")),
    responses(
        (status = 200, body = ExpenseCategory),
        (status = 404, description = "Expense category not found", body = Object, example = json!({
            "error": "Expense category not found"
        }))
    ),
    tag = "Expense Category",
    security(("bearer_auth" = []))
)]
pub async fn get_category(storage: web::Data<dyn Storage>, path: web::Path<u64>) -> AppResult<HttpResponse> {
    let category = found("Expense category", storage.get_expense_category(path.into_inner()).await?)?;
    Ok(HttpResponse::Ok().json(category))
}

#[utoipa::path(
    post,
    path = "/api/expense-categories",
    request_body = ExpenseCategoryInput,
    responses(
        (status = 201, body = ExpenseCategory),
        (status = 400, description = "Validation failed")
    ),
    tag = "Expense Category",
    security(("bearer_auth" = []))
)]
pub async fn create_category(
    storage: web::Data<dyn Storage>,
    body: web::Json<ExpenseCategoryInput>,
) -> AppResult<HttpResponse> {
    let input = body.into_inner();
    input.validate()?;

    let category = storage.create_expense_category(input).await?;
    info!(category_id = category.id, name = %category.name, "Expense category created");

    Ok(HttpResponse::Created().json(category))
}

#[utoipa::path(
    put,
    path = "/api/expense-categories/{id}",
    params(("id" = u64, Path, description = "Category id")),
    request_body = ExpenseCategoryInput,
    responses(
        (status = 200, body = ExpenseCategory),
        (status = 400, description = "Validation failed"),
        (status = 404, description = "Expense category not found")
    ),
    tag = "Expense Category",
    security(("bearer_auth" = []))
)]
pub async fn update_category(
    storage: web::Data<dyn Storage>,
    path: web::Path<u64>,
    body: web::Json<ExpenseCategoryInput>,
) -> AppResult<HttpResponse> {
    let input = body.into_inner();
    input.validate()?;

    let category = found(
        "Expense category",
        storage.update_expense_category(path.into_inner(), input).await?,
    )?;
    Ok(HttpResponse::Ok().json(category))
}

#[utoipa::path(
    delete,
    path = "/api/expense-categories/{id}",
    params(("id" = u64, Path, description = "Category id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Expense category not found"),
        (status = 409, description = "Category still has expenses")
    ),
    tag = "Expense Category",
    security(("bearer_auth" = []))
)]
pub async fn delete_category(storage: web::Data<dyn Storage>, path: web::Path<u64>) -> AppResult<HttpResponse> {
    let id = path.into_inner();

    if !storage.delete_expense_category(id).await? {
        return Err(AppError::NotFound("Expense category"));
    }

    info!(category_id = id, "Expense category deleted");
    Ok(HttpResponse::NoContent().finish())
}
