//! User management. Every route here is admin-only.

use actix_web::{HttpResponse, web};
use tracing::{debug, info};

use super::found;
use crate::{
    auth::{auth::AuthUser, password::hash_password},
    error::{AppError, AppResult},
    model::{
        user::{NewUser, User, UserInput},
        validation::Validate,
    },
    storage::Storage,
    utils::username_cache::UsernameCache,
};

/// argon2 is deliberately slow; keep it off the async workers.
async fn hash(password: String) -> AppResult<String> {
    web::block(move || hash_password(&password))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
        .map_err(|e| AppError::Internal(format!("failed to hash password: {e}")))
}

fn username_conflict() -> AppError {
    AppError::Conflict("Username already exists".to_string())
}

#[utoipa::path(
    get,
    path = "/api/users",
    responses(
        (status = 200, body = [User]),
        (status = 403, description = "Admin only")
    ),
    tag = "User",
    security(("bearer_auth" = []))
)]
pub async fn list_users(auth: AuthUser, storage: web::Data<dyn Storage>) -> AppResult<HttpResponse> {
    auth.require_admin()?;
    Ok(HttpResponse::Ok().json(storage.list_users().await?))
}

#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(("id" = u64, Path, description = "User id")),
    responses(
        (status = 200, body = User),
        (status = 403, description = "Admin only"),
        (status = 404, description = "User not found")
    ),
    tag = "User",
    security(("bearer_auth" = []))
)]
pub async fn get_user(
    auth: AuthUser,
    storage: web::Data<dyn Storage>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    auth.require_admin()?;
    let user = found("User", storage.get_user(path.into_inner()).await?)?;
    Ok(HttpResponse::Ok().json(user))
}

/// Create User
#[utoipa::path(
    post,
    path = "/api/users",
    request_body = UserInput,
    responses(
        (status = 201, body = User),
        (status = 400, description = "Validation failed"),
        (status = 403, description = "Admin only"),
        (status = 409, description = "Username already exists", body = Object, example = json!({
            "error": "Username already exists"
        }))
    ),
    tag = "User",
    security(("bearer_auth" = []))
)]
pub async fn create_user(
    auth: AuthUser,
    storage: web::Data<dyn Storage>,
    usernames: web::Data<UsernameCache>,
    body: web::Json<UserInput>,
) -> AppResult<HttpResponse> {
    auth.require_admin()?;

    let input = body.into_inner();
    input.validate()?;

    let username = input.username.trim().to_string();
    if usernames.is_taken(&username) {
        debug!(username = %username, "Username rejected by cache");
        return Err(username_conflict());
    }

    let password = input
        .password
        .ok_or_else(|| AppError::invalid("password", "is required"))?;

    let user = storage
        .create_user(NewUser {
            username,
            password_hash: hash(password).await?,
            name: input.name,
            email: input.email,
            role: input.role,
        })
        .await?;

    usernames.mark_taken(&user.username).await;
    info!(user_id = user.id, username = %user.username, role = %user.role, "User created");

    Ok(HttpResponse::Created().json(user))
}

/// Update User
///
/// Omitting `password` keeps the current one.
#[utoipa::path(
    put,
    path = "/api/users/{id}",
    params(("id" = u64, Path, description = "User id")),
    request_body = UserInput,
    responses(
        (status = 200, body = User),
        (status = 400, description = "Validation failed"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "User not found"),
        (status = 409, description = "Username already exists")
    ),
    tag = "User",
    security(("bearer_auth" = []))
)]
pub async fn update_user(
    auth: AuthUser,
    storage: web::Data<dyn Storage>,
    usernames: web::Data<UsernameCache>,
    path: web::Path<u64>,
    body: web::Json<UserInput>,
) -> AppResult<HttpResponse> {
    auth.require_admin()?;

    let id = path.into_inner();
    let input = body.into_inner();
    input.validate()?;

    let current = found("User", storage.get_user(id).await?)?;
    let username = input.username.trim().to_string();
    let renamed = !current.username.eq_ignore_ascii_case(&username);

    if renamed && usernames.is_taken(&username) {
        return Err(username_conflict());
    }

    let password_hash = match input.password {
        Some(password) => hash(password).await?,
        None => current.password,
    };

    let user = found(
        "User",
        storage
            .update_user(
                id,
                NewUser {
                    username,
                    password_hash,
                    name: input.name,
                    email: input.email,
                    role: input.role,
                },
            )
            .await?,
    )?;

    if renamed {
        usernames.release(&current.username).await;
        usernames.mark_taken(&user.username).await;
    }

    Ok(HttpResponse::Ok().json(user))
}

#[utoipa::path(
    delete,
    path = "/api/users/{id}",
    params(("id" = u64, Path, description = "User id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 400, description = "Cannot delete yourself"),
        (status = 403, description = "Admin only"),
        (status = 404, description = "User not found"),
        (status = 409, description = "User still owns records")
    ),
    tag = "User",
    security(("bearer_auth" = []))
)]
pub async fn delete_user(
    auth: AuthUser,
    storage: web::Data<dyn Storage>,
    usernames: web::Data<UsernameCache>,
    path: web::Path<u64>,
) -> AppResult<HttpResponse> {
    auth.require_admin()?;

    let id = path.into_inner();
    if id == auth.user_id {
        return Err(AppError::BadRequest("You cannot delete your own account".to_string()));
    }

    let user = found("User", storage.get_user(id).await?)?;
    if !storage.delete_user(id).await? {
        return Err(AppError::NotFound("User"));
    }

    usernames.release(&user.username).await;
    info!(user_id = id, username = %user.username, "User deleted");

    Ok(HttpResponse::NoContent().finish())
}
