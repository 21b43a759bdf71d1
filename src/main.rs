use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use std::io;
use std::sync::Arc;

use todoforge::config::Config;
use todoforge::routes;
use todoforge::state::AppState;
use todoforge::store::PgStore;

fn fatal<E: std::fmt::Display>(context: &'static str) -> impl FnOnce(E) -> io::Error {
    move |err| {
        log::error!("{}: {}", context, err);
        io::Error::new(io::ErrorKind::Other, format!("{}: {}", context, err))
    }
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));

    let config = Config::from_env().map_err(fatal("invalid configuration"))?;
    let store = PgStore::connect(&config.database_url)
        .await
        .map_err(fatal("failed to open the database"))?;
    let state = web::Data::new(AppState::from_config(&config, Arc::new(store)));

    log::info!("Starting todoforge server at {}", config.server_url());
    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(Cors::permissive())
            .wrap(routes::security_headers())
            .wrap(Logger::default())
            .configure(routes::config)
    })
    .bind((config.server_host.as_str(), config.server_port))?
    .run()
    .await
}
