use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use std::io;
use std::sync::Arc;

use devboard::auth::AuthSettings;
use devboard::config::Config;
use devboard::db::{self, PgStore, Store};
use devboard::routes;
use devboard::services::catalog::seed_defaults;

fn startup_error(context: &str, err: impl std::fmt::Display) -> io::Error {
    log::error!("{}: {}", context, err);
    io::Error::new(io::ErrorKind::Other, format!("{}: {}", context, err))
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env().map_err(|e| startup_error("Invalid configuration", e))?;

    let pool = db::connect(&config)
        .await
        .map_err(|e| startup_error("Failed to connect to database", e))?;
    db::run_migrations(&pool)
        .await
        .map_err(|e| startup_error("Failed to run migrations", e))?;

    let store: Arc<dyn Store> = Arc::new(PgStore::new(pool));
    seed_defaults(store.as_ref())
        .await
        .map_err(|e| startup_error("Failed to seed catalog", e))?;

    let store = web::Data::from(store);
    let settings = web::Data::new(AuthSettings::from_config(&config));

    log::info!("Starting devboard server at {}", config.server_url());
    HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())
            .wrap(Logger::default())
            .app_data(store.clone())
            .app_data(settings.clone())
            .configure(routes::config)
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await
}
