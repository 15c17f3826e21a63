use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use anyhow::Context;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use smlekha::app::{self, AppServices, Repositories};
use smlekha::config::{AppConfig, Config, DatabaseConfig};
use smlekha::middleware::{ApiKeyAuth, ApiKeyStore, MySqlApiKeyStore, RateLimiter, RequestId};
use smlekha::modules::health::{DatabaseProbe, ReadinessProbe};

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("smlekha={},actix_web=info,sqlx=warn", config.log_level))
    });

    let registry = tracing_subscriber::registry().with(filter);
    if config.log_json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

fn cors(allowed_origin: Option<&str>) -> Cors {
    match allowed_origin {
        Some(origin) => Cors::default()
            .allowed_origin(origin)
            .allow_any_method()
            .allow_any_header()
            .max_age(3600),
        None => Cors::permissive(),
    }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Configuration validation failed")?;

    init_tracing(&config.app);

    tracing::info!(
        env = config.app.env.as_str(),
        bind = %config.server.bind_address(),
        "Starting smlekha"
    );

    let pool = config
        .database
        .create_pool()
        .await
        .context("Failed to create database pool")?;
    DatabaseConfig::run_migrations(&pool)
        .await
        .context("Failed to run migrations")?;

    tracing::info!(
        max_connections = config.database.max_connections,
        "Database pool initialized"
    );

    let services = AppServices::new(
        &Repositories::mysql(pool.clone()),
        app::ledger_settings(config.app.default_monthly_rent, config.app.payment_due_days),
    );
    let api_keys: Arc<dyn ApiKeyStore> = Arc::new(MySqlApiKeyStore::new(pool.clone()));
    let probe: Arc<dyn ReadinessProbe> = Arc::new(DatabaseProbe::new(pool));
    let rate_limiter = RateLimiter::new(config.security.rate_limit_per_minute);
    let cors_origin = config.security.cors_allowed_origin.clone();

    let bind_address = config.server.bind_address();
    HttpServer::new(move || {
        App::new()
            .wrap(ApiKeyAuth::new(api_keys.clone()))
            .wrap(rate_limiter.clone())
            .wrap(cors(cors_origin.as_deref()))
            .wrap(RequestId)
            .wrap(TracingLogger::default())
            .app_data(web::Data::new(probe.clone()))
            .configure(|cfg| services.register(cfg))
            .configure(app::configure_routes)
    })
    .workers(config.server.workers)
    .bind(&bind_address)?
    .run()
    .await?;

    Ok(())
}
