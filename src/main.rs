use std::sync::Arc;

use actix_web::middleware::{Logger, NormalizePath};
use actix_web::{App, HttpServer};
use anyhow::Context;
use dotenvy::dotenv;
use tracing::{error, info, warn};
use tracing_appender::rolling;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi; // ← needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

use plexpay::{
    config::{Config, StorageKind},
    db::init_db,
    docs::ApiDoc,
    routes,
    seed::seed_demo_data,
    storage::{MemStorage, MySqlStorage, Storage},
    utils::username_cache::UsernameCache,
};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = Config::from_env()?;

    // Rolling daily log, plus stdout
    let file_appender = rolling::daily(&config.log_dir, "plexpay.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().with_target(false))
        .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
        .init();

    info!("Server starting...");

    let storage: Arc<dyn Storage> = match config.storage {
        StorageKind::MySql => {
            let url = config
                .database_url
                .as_deref()
                .context("DATABASE_URL must be set")?;
            let storage = MySqlStorage::new(init_db(url).await?);
            storage.migrate().await.context("Failed to run migrations")?;
            info!("Connected to MySQL, migrations applied");
            Arc::new(storage)
        }
        StorageKind::Memory => {
            warn!("Using in-memory storage; data is lost on restart");
            Arc::new(MemStorage::default())
        }
    };

    if config.seed_demo_data {
        seed_demo_data(storage.as_ref(), &config.demo_password).await?;
    }

    let usernames = UsernameCache::default();
    let warmup_cache = usernames.clone();
    let warmup_storage = storage.clone();
    actix_web::rt::spawn(async move {
        if let Err(e) = warmup_cache.warmup(warmup_storage.as_ref()).await {
            error!(error = %e, "Failed to warm up username cache");
        }
    });

    let server_addr = config.server_addr.clone();
    info!(addr = %server_addr, "Listening");

    HttpServer::new(move || {
        let (config, storage, usernames) = (config.clone(), storage.clone(), usernames.clone());
        App::new()
            .wrap(Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // ← wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .configure(move |cfg| routes::configure(cfg, config, storage, usernames))
    })
    .bind(&server_addr)
    .with_context(|| format!("Failed to bind {server_addr}"))?
    .run()
    .await?;

    Ok(())
}
