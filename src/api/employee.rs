use actix_web::{HttpResponse, web};
use tracing::info;

use super::found;
use crate::{
    error::{AppError, AppResult},
    model::{
        employee::{Employee, EmployeeInput},
        validation::Validate,
    },
    storage::Storage,
};

#[utoipa::path(
    get,
    path = "/api/employees",
    responses((status = 200, description = "All employees, by name", body = [Employee])),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn list_employees(storage: web::Data<dyn Storage>) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(storage.list_employees().await?))
}

/// Get Employee by ID
#[utoipa::path(
    get,
    path = "/api/employees/{id}",
    params(("id" = u64, Path, description = "Employee id")),
    responses(
        (status = 200, description = "Employee found", body = Employee),
        (status = 404, description = "Employee not found", body = Object, example = json!({
            "error": "Employee not found"
        }))
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn get_employee(storage: web::Data<dyn Storage>, path: web::Path<u64>) -> AppResult<HttpResponse> {
    let employee = found("Employee", storage.get_employee(path.into_inner()).await?)?;
    Ok(HttpResponse::Ok().json(employee))
}

/// Create Employee
#[utoipa::path(
    post,
    path = "/api/employees",
    request_body = EmployeeInput,
    responses(
        (status = 201, description = "Employee created", body = Employee),
        (status = 400, description = "Validation failed")
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn create_employee(
    storage: web::Data<dyn Storage>,
    body: web::Json<EmployeeInput>,
) -> AppResult<HttpResponse> {
    let input = body.into_inner();
    input.validate()?;

    let employee = storage.create_employee(input).await?;
    info!(employee_id = employee.id, department = %employee.department, "Employee created");

    Ok(HttpResponse::Created().json(employee))
}

/// Update Employee
#[utoipa::path(
    put,
    path = "/api/employees/{id}",
    params(("id" = u64, Path, description = "Employee id")),
    request_body = EmployeeInput,
    responses(
        (status = 200, description = "Employee updated", body = Employee),
        (status = 400, description = "Validation failed"),
        (status = 404, description = "Employee not found")
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn update_employee(
    storage: web::Data<dyn Storage>,
    path: web::Path<u64>,
    body: web::Json<EmployeeInput>,
) -> AppResult<HttpResponse> {
    let input = body.into_inner();
    input.validate()?;

    let employee = found("Employee", storage.update_employee(path.into_inner(), input).await?)?;
    Ok(HttpResponse::Ok().json(employee))
}

/// Delete Employee
///
/// Also removes the employee's payroll records.
#[utoipa::path(
    delete,
    path = "/api/employees/{id}",
    params(("id" = u64, Path, description = "Employee id")),
    responses(
        (status = 204, description = "Successfully deleted"),
        (status = 404, description = "Employee not found")
    ),
    tag = "Employee",
    security(("bearer_auth" = []))
)]
pub async fn delete_employee(storage: web::Data<dyn Storage>, path: web::Path<u64>) -> AppResult<HttpResponse> {
    let employee_id = path.into_inner();

    if !storage.delete_employee(employee_id).await? {
        return Err(AppError::NotFound("Employee"));
    }

    info!(employee_id, "Employee deleted");
    Ok(HttpResponse::NoContent().finish())
}
