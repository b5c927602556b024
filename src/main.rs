use actix_web::{web, App, HttpServer};
use log::{error, info};
use std::sync::Arc;

use chess_rooms::models::AppState;
use chess_rooms::routes::configure_routes;
use chess_rooms::store::MemoryStore;
use chess_rooms::{Config, Coordinator};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let config = match Config::load() {
        Ok(config) => config,
        Err(e) => {
            // Logger is not up yet
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize logger
    env_logger::init_from_env(env_logger::Env::new().default_filter_or(config.log_filter.as_str()));

    let (host, port) = config.bind_address();
    info!("Starting chess rooms server at http://{}:{}", host, port);
    if config.verify_moves {
        info!("Server-side move verification is on");
    }

    // Sessions and users live in process until a real store is wired in
    let store = Arc::new(MemoryStore::new());
    let coordinator =
        Coordinator::new(store.clone(), store).with_move_verification(config.verify_moves);

    // Create shared application state
    let app_state = web::Data::new(AppState::new(coordinator));
    let static_dir = config.static_dir.clone();

    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .configure(|cfg| configure_routes(cfg, static_dir.clone()))
    })
    .bind((host.as_str(), port))
    .map_err(|e| {
        error!("Cannot bind {}:{}: {}", host, port, e);
        e
    })?
    .run()
    .await
}
