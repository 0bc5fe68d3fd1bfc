use std::io;
use std::sync::Arc;

use dotenvy::dotenv;
use rental_order_service::config::AppConfig;
use rental_order_service::domain::pricing::PromoCatalog;
use rental_order_service::{
    build_server, create_pool, run_migrations, DieselRentalRepository, OrderService,
    TextInvoiceRenderer,
};

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = AppConfig::from_env().map_err(io::Error::other)?;

    let promos = match &config.promo_catalog_path {
        Some(path) => PromoCatalog::from_path(path).map_err(io::Error::other)?,
        None => PromoCatalog::builtin(),
    };
    log::info!("Loaded {} promo(s)", promos.len());

    let pool = create_pool(&config.database_url, config.pool_size).map_err(io::Error::other)?;
    run_migrations(&pool).map_err(io::Error::other)?;

    let service = OrderService::new(DieselRentalRepository::new(pool), Arc::new(promos));

    log::info!("Starting server at http://{}:{}", config.host, config.port);

    build_server(
        service,
        Arc::new(TextInvoiceRenderer),
        &config.host,
        config.port,
    )?
    .await
}
