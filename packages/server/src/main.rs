#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Binary entry point: wires the provider registry into the domain
//! services and serves the REST API.

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use waypoint_server::{AppState, handlers};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    log::info!("Building provider clients...");
    let state = web::Data::new(
        AppState::from_registry().expect("Failed to build provider clients from registry"),
    );

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .service(
                web::scope("/api")
                    .route("/health", web::get().to(handlers::health))
                    .route("/geocode/search", web::get().to(handlers::geocode_search))
                    .route("/geocode/reverse", web::get().to(handlers::geocode_reverse))
                    .route("/distance", web::get().to(handlers::distance))
                    .route("/directions", web::post().to(handlers::directions))
                    .route("/matrix", web::post().to(handlers::matrix))
                    .route("/eta", web::post().to(handlers::eta))
                    .route("/snap", web::post().to(handlers::snap))
                    .route(
                        "/serviceability/check",
                        web::post().to(handlers::serviceability_check),
                    ),
            )
    })
    .bind((bind_addr, port))?
    .run()
    .await
}
