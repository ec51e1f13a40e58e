use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use tracing_subscriber::EnvFilter;

use crate::config::Settings;
use crate::mongo::MongoStore;
use crate::store::{MemoryStore, Store};

mod auth;
mod balance;
mod config;
mod currency;
mod error;
mod exchange;
mod expense;
mod group;
mod mongo;
mod routes;
mod schemas;
mod share;
mod store;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let settings = Settings::load().map_err(|err| {
        tracing::error!(error = %err, "invalid configuration");
        std::io::Error::new(std::io::ErrorKind::InvalidInput, err)
    })?;

    let store: Arc<dyn Store> = match &settings.database.uri {
        Some(uri) => {
            let store = MongoStore::connect(uri, &settings.database.name)
                .await
                .map_err(|err| {
                    tracing::error!(error = %err, "failed to connect to MongoDB");
                    std::io::Error::new(std::io::ErrorKind::ConnectionRefused, err)
                })?;
            tracing::info!(database = %settings.database.name, "connected to MongoDB");
            Arc::new(store)
        }
        None => {
            tracing::warn!("no database configured, keeping everything in memory");
            Arc::new(MemoryStore::new())
        }
    };

    let bind = (settings.server.host.clone(), settings.server.port);
    tracing::info!(host = %bind.0, port = bind.1, "starting server");

    let store = web::Data::from(store);
    let settings = web::Data::new(settings);
    HttpServer::new(move || {
        App::new()
            .wrap(Cors::permissive())
            .wrap(Logger::default())
            .app_data(store.clone())
            .app_data(settings.clone())
            .configure(routes::configure)
    })
    .bind(bind)?
    .run()
    .await
}
