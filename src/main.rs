use actix_web::{App, HttpServer, middleware::Logger, web};
use chrono::Local;
use env_logger::{Env, Target};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use guide_vrai_backend::{
    AppError,
    config::Config,
    database::{create_pool, run_migrations},
    external::{AiGateway, HttpAiGateway},
    handlers,
    middlewares::{IdentityMiddleware, create_cors},
    services::*,
    store::{SeaOrmSubscriptionStore, SubscriptionStore},
    swagger::swagger_config,
};

/// Source images arrive inline as data URLs.
const JSON_BODY_LIMIT: usize = 10 * 1024 * 1024;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let ts = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");
            let level = record.level().as_str().to_ascii_lowercase();
            let msg_json = serde_json::to_string(&format!("{}", record.args()))
                .unwrap_or_else(|_| "\"<invalid utf8>\"".to_string());
            writeln!(
                buf,
                "{{\"timestamp\":\"{}\",\"level\":\"{}\",\"message\":{},\"target\":\"{}\"}}",
                ts,
                level,
                msg_json,
                record.target(),
            )
        })
        .target(Target::Stdout)
        .init();

    let config = Config::from_toml().expect("Failed to load configuration");

    let pool = create_pool(&config.database)
        .await
        .expect("Failed to create database connection pool");

    run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");

    let pool = Arc::new(pool);
    let store: Arc<dyn SubscriptionStore> = Arc::new(SeaOrmSubscriptionStore::new(pool.clone()));
    let ledger_service = LedgerService::new(store, config.trial.clone())
        .with_store_timeout(Duration::from_secs(config.database.query_timeout_secs));
    let generation_service = GenerationService::new(pool.clone());
    let place_service = PlaceService::new(pool.clone());
    let booking_service = BookingService::new(pool.clone());
    let newsletter_service = NewsletterService::new(pool.clone());

    let gateway: Arc<dyn AiGateway> = Arc::new(
        HttpAiGateway::new(config.ai_gateway.clone()).expect("Failed to build AI gateway client"),
    );
    if !gateway.is_configured() {
        log::warn!("AI_GATEWAY_API_KEY is not configured; chat and image endpoints will fail");
    }
    let gateway = web::Data::from(gateway);
    let billing = web::Data::new(config.billing.clone());

    log::info!(
        "Starting HTTP server at {}:{}",
        config.server.host,
        config.server.port
    );

    HttpServer::new(move || {
        let json_cfg = web::JsonConfig::default()
            .limit(JSON_BODY_LIMIT)
            .error_handler(|err, _req| AppError::ValidationError(err.to_string()).into());

        App::new()
            .wrap(Logger::default())
            .wrap(create_cors())
            .app_data(json_cfg)
            .app_data(web::Data::new(ledger_service.clone()))
            .app_data(web::Data::new(generation_service.clone()))
            .app_data(web::Data::new(place_service.clone()))
            .app_data(web::Data::new(booking_service.clone()))
            .app_data(web::Data::new(newsletter_service.clone()))
            .app_data(gateway.clone())
            .app_data(billing.clone())
            .configure(swagger_config)
            .service(
                web::scope("/api")
                    .wrap(IdentityMiddleware)
                    .configure(handlers::api_config),
            )
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await
}
