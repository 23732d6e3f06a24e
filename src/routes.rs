use crate::{
    api::{dashboard, employee, expense, expense_category, income, payroll, report, user},
    auth::{handlers, middleware::auth_middleware},
    config::Config,
    error::{AppError, FieldError},
    storage::Storage,
    utils::username_cache::UsernameCache,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{HttpResponse, middleware::from_fn, web};
use serde_json::json;
use std::sync::Arc;

fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = (60_000 / u64::from(requests_per_min)).max(1);
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .expect("period and burst are clamped to at least 1");
    Governor::new(&cfg)
}

fn malformed(field: &str, err: impl std::fmt::Display) -> actix_web::Error {
    AppError::Validation(vec![FieldError::new(field, err.to_string())]).into()
}

async fn api_not_found() -> HttpResponse {
    HttpResponse::NotFound().json(json!({ "error": "API endpoint not found" }))
}

/// Registers shared state, extractor error handlers, and every route.
pub fn configure(
    cfg: &mut web::ServiceConfig,
    config: Config,
    storage: Arc<dyn Storage>,
    usernames: UsernameCache,
) {
    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    cfg.app_data(web::Data::new(config))
        .app_data(web::Data::from(storage))
        .app_data(web::Data::new(usernames))
        .app_data(web::JsonConfig::default().error_handler(|err, _| malformed("body", err)))
        .app_data(web::QueryConfig::default().error_handler(|err, _| malformed("query", err)))
        .app_data(web::PathConfig::default().error_handler(|err, _| malformed("id", err)));

    // Public routes, plus `/me` which needs an access token
    cfg.service(
        web::scope("/api/auth")
            .service(
                web::resource("/login")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::login)),
            )
            .service(
                web::resource("/refresh")
                    .wrap(login_limiter.clone())
                    .route(web::post().to(handlers::refresh_token)),
            )
            .service(
                web::resource("/logout")
                    .wrap(login_limiter)
                    .route(web::post().to(handlers::logout)),
            )
            .service(
                web::resource("/me")
                    .wrap(from_fn(auth_middleware))
                    .route(web::get().to(handlers::me)),
            ),
    );

    // Protected routes
    cfg.service(
        web::scope("/api")
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(protected_limiter) // rate limiting
            .service(
                web::scope("/users")
                    .service(
                        web::resource("")
                            .route(web::get().to(user::list_users))
                            .route(web::post().to(user::create_user)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(user::get_user))
                            .route(web::put().to(user::update_user))
                            .route(web::delete().to(user::delete_user)),
                    ),
            )
            .service(
                web::scope("/expense-categories")
                    .service(
                        web::resource("")
                            .route(web::get().to(expense_category::list_categories))
                            .route(web::post().to(expense_category::create_category)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(expense_category::get_category))
                            .route(web::put().to(expense_category::update_category))
                            .route(web::delete().to(expense_category::delete_category)),
                    ),
            )
            .service(
                web::scope("/expenses")
                    .service(
                        web::resource("")
                            .route(web::get().to(expense::list_expenses))
                            .route(web::post().to(expense::create_expense)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(expense::get_expense))
                            .route(web::put().to(expense::update_expense))
                            .route(web::delete().to(expense::delete_expense)),
                    ),
            )
            .service(
                web::scope("/employees")
                    .service(
                        web::resource("")
                            .route(web::get().to(employee::list_employees))
                            .route(web::post().to(employee::create_employee)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(employee::get_employee))
                            .route(web::put().to(employee::update_employee))
                            .route(web::delete().to(employee::delete_employee)),
                    ),
            )
            .service(
                web::scope("/payroll-records")
                    .service(
                        web::resource("")
                            .route(web::get().to(payroll::list_payroll))
                            .route(web::post().to(payroll::create_payroll)),
                    )
                    // before /{id} so they are not taken for ids
                    .service(web::resource("/preview").route(web::post().to(payroll::preview_payroll)))
                    .service(web::resource("/process").route(web::post().to(payroll::process_payroll)))
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(payroll::get_payroll))
                            .route(web::put().to(payroll::update_payroll))
                            .route(web::delete().to(payroll::delete_payroll)),
                    ),
            )
            .service(
                web::scope("/income-records")
                    .service(
                        web::resource("")
                            .route(web::get().to(income::list_income))
                            .route(web::post().to(income::create_income)),
                    )
                    .service(
                        web::resource("/{id}")
                            .route(web::get().to(income::get_income))
                            .route(web::put().to(income::update_income))
                            .route(web::delete().to(income::delete_income)),
                    ),
            )
            .service(web::resource("/dashboard").route(web::get().to(dashboard::get_dashboard)))
            .service(
                web::scope("/reports")
                    .service(web::resource("/financial").route(web::get().to(report::financial_report)))
                    .service(web::resource("/expenses").route(web::get().to(report::expense_report)))
                    .service(web::resource("/payroll").route(web::get().to(report::payroll_report)))
                    .service(
                        web::resource("/financial/export").route(web::get().to(report::export_financial)),
                    )
                    .service(
                        web::resource("/expenses/export").route(web::get().to(report::export_expenses)),
                    )
                    .service(
                        web::resource("/payroll/export").route(web::get().to(report::export_payroll)),
                    ),
            )
            .default_service(web::to(api_not_found)),
    );
}

// LOGIN
//  ├─ access_token (15 min)
//  └─ refresh_token (7 days)

// API REQUEST
//  └─ Authorization: Bearer access_token

// ACCESS EXPIRED
//  └─ POST /api/auth/refresh with refresh_token
//       └─ returns new access_token + refresh_token (old one revoked)
