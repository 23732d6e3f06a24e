use crate::{
    auth::{
        auth::AuthUser,
        jwt::{expires_at, generate_access_token, generate_refresh_token, verify_token},
        password::verify_password,
    },
    config::Config,
    error::{AppError, AppResult},
    model::user::User,
    models::{LoginReqDto, LoginResponse, TokenPair, TokenType},
    storage::Storage,
};
use actix_web::{HttpRequest, HttpResponse, web};
use serde_json::json;
use tracing::{debug, error, info, instrument};

fn bearer(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

/// Signs an access/refresh pair and records the refresh token's `jti`.
async fn issue_tokens(user: &User, storage: &dyn Storage, config: &Config) -> AppResult<TokenPair> {
    let access_token = generate_access_token(user, &config.jwt_secret, config.access_token_ttl)
        .map_err(|e| AppError::Internal(format!("failed to sign access token: {e}")))?;

    let (refresh_token, refresh_claims) =
        generate_refresh_token(user, &config.jwt_secret, config.refresh_token_ttl)
            .map_err(|e| AppError::Internal(format!("failed to sign refresh token: {e}")))?;

    debug!(user_id = user.id, jti = %refresh_claims.jti, "Storing refresh token");

    storage
        .store_refresh_token(user.id, &refresh_claims.jti, expires_at(&refresh_claims))
        .await?;

    Ok(TokenPair {
        access_token,
        refresh_token,
    })
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginReqDto,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 400, description = "Missing username or password"),
        (status = 401, description = "Invalid credentials", body = Object, example = json!({
            "error": "Invalid credentials"
        }))
    ),
    tag = "Auth"
)]
#[instrument(
    name = "auth_login",
    skip(storage, config, user),
    fields(username = %user.username)
)]
pub async fn login(
    user: web::Json<LoginReqDto>,
    storage: web::Data<dyn Storage>,
    config: web::Data<Config>,
) -> AppResult<HttpResponse> {
    info!("Login request received");

    if user.username.trim().is_empty() || user.password.is_empty() {
        info!("Validation failed: empty username or password");
        return Err(AppError::BadRequest("Username or password required".to_string()));
    }

    let db_user = match storage.get_user_by_username(user.username.trim()).await? {
        Some(found) => {
            debug!(user_id = found.id, "User found");
            found
        }
        None => {
            info!("Invalid credentials: user not found");
            return Err(AppError::Unauthorized("Invalid credentials".to_string()));
        }
    };

    let password = user.password.clone();
    let stored_hash = db_user.password.clone();
    let matches = web::block(move || verify_password(&password, &stored_hash))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    if !matches {
        info!("Invalid credentials: password mismatch");
        return Err(AppError::Unauthorized("Invalid credentials".to_string()));
    }

    let tokens = issue_tokens(&db_user, storage.get_ref(), &config).await?;

    info!("Login successful");

    Ok(HttpResponse::Ok().json(LoginResponse {
        user: db_user,
        access_token: tokens.access_token,
        refresh_token: tokens.refresh_token,
    }))
}

#[utoipa::path(
    post,
    path = "/api/auth/refresh",
    responses(
        (status = 200, description = "New token pair", body = TokenPair),
        (status = 401, description = "Missing, revoked or expired refresh token")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn refresh_token(
    req: HttpRequest,
    storage: web::Data<dyn Storage>,
    config: web::Data<Config>,
) -> AppResult<HttpResponse> {
    let token = bearer(&req).ok_or_else(|| AppError::Unauthorized("No token".to_string()))?;

    let claims = verify_token(token, &config.jwt_secret)
        .map_err(|_| AppError::Unauthorized("Invalid token".to_string()))?;

    if claims.token_type != TokenType::Refresh {
        return Err(AppError::Unauthorized("Refresh token required".to_string()));
    }

    // revoke first so a replayed token can never mint a second pair
    let user_id = storage
        .revoke_refresh_token(&claims.jti)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Refresh token revoked".to_string()))?;

    let user = storage
        .get_user(user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User no longer exists".to_string()))?;

    let tokens = issue_tokens(&user, storage.get_ref(), &config).await?;
    Ok(HttpResponse::Ok().json(tokens))
}

#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses((status = 204, description = "Refresh token revoked (or nothing to revoke)")),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn logout(
    req: HttpRequest,
    storage: web::Data<dyn Storage>,
    config: web::Data<Config>,
) -> HttpResponse {
    let Some(token) = bearer(&req) else {
        return HttpResponse::NoContent().finish();
    };

    let claims = match verify_token(token, &config.jwt_secret) {
        Ok(c) if c.token_type == TokenType::Refresh => c,
        _ => return HttpResponse::NoContent().finish(),
    };

    // idempotent; logging out twice is not an error
    if let Err(e) = storage.revoke_refresh_token(&claims.jti).await {
        error!(error = %e, jti = %claims.jti, "Failed to revoke refresh token");
    }

    HttpResponse::NoContent().finish()
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "The authenticated user", body = User),
        (status = 401)
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn me(auth: AuthUser, storage: web::Data<dyn Storage>) -> AppResult<HttpResponse> {
    match storage.get_user(auth.user_id).await? {
        Some(user) => Ok(HttpResponse::Ok().json(user)),
        None => Ok(HttpResponse::Unauthorized().json(json!({
            "error": "User no longer exists"
        }))),
    }
}
