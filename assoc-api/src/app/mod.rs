use std::sync::Arc;
use arc_swap::ArcSwap;
use actix_web::{App, HttpServer, middleware, web};
use assoc::{DataLayout, EngineConfig, GeneSearch};

mod error;
pub mod routes;

pub use error::ApiError;

pub struct Config {
    pub data_directory: String,
    pub dataset: String,
    pub host: String,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Option<Config> {
        let data_directory = std::env::var("RESULTS_DATA_DIRECTORY").ok()?;
        let dataset = std::env::var("BROWSER").ok()?;
        let host = std::env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = match std::env::var("PORT") {
            Ok(port) => port.parse().ok()?,
            Err(_) => 8000,
        };
        Some(Config { data_directory, dataset, host, port })
    }
}

/// Read-only state shared by every request handler.
pub struct AppData {
    pub search: Arc<GeneSearch>,
    pub config: Arc<EngineConfig>,
    pub layout: DataLayout,
}

pub async fn server(data: ArcSwap<AppData>, host: &str, port: u16) -> std::io::Result<()> {
    let data = web::Data::new(data);
    HttpServer::new(move || App::new()
        .app_data(data.clone())
        .wrap(middleware::Logger::default())
        .configure(routes))
        .bind((host, port))?
        .run()
        .await
}

pub fn routes(app: &mut web::ServiceConfig) {
    app.service(routes::routes(web::scope("/api")));
}
