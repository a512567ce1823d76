use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use actix_web::{HttpResponse, Scope, web};
use arc_swap::ArcSwap;
use serde::de::DeserializeOwned;

use crate::app::{ApiError, AppData};

pub mod genes;
pub mod results;
pub mod search;

pub fn routes(app: Scope) -> Scope {
    app
        .service(web::resource("search")
            .route(web::get().to(search::read)))
        .service(web::resource("config")
            .route(web::get().to(config)))
        .service(web::resource("results")
            .route(web::get().to(results::read)))
        .service(web::resource("gene/{gene}")
            .route(web::get().to(genes::read)))
        .service(web::resource("gene/{gene}/variants")
            .route(web::get().to(genes::variants)))
        .service(web::resource("gene/{gene}/variants.csv")
            .route(web::get().to(genes::export)))
        .default_service(web::route().to(not_found))
}

async fn config(state: web::Data<ArcSwap<AppData>>) -> HttpResponse {
    let appdata = state.load_full();
    HttpResponse::Ok().json(&*appdata.config)
}

async fn not_found() -> Result<HttpResponse, ApiError> {
    Err(ApiError::NotFound("not found"))
}

/// Missing data files become a 404 with `message`.
pub(crate) fn missing_file_as(message: &'static str) -> impl Fn(assoc::Error) -> ApiError {
    move |e| match e {
        assoc::Error::Io(ref io) if io.kind() == std::io::ErrorKind::NotFound => ApiError::NotFound(message),
        e => ApiError::Engine(e),
    }
}

pub(crate) fn open(path: &Path) -> assoc::Result<BufReader<File>> {
    Ok(BufReader::new(File::open(path)?))
}

pub(crate) async fn read_json<T>(path: PathBuf, not_found: &'static str) -> Result<T, ApiError>
    where T: DeserializeOwned + Send + 'static
{
    let value = web::block(move || -> assoc::Result<T> {
        Ok(serde_json::from_reader(open(&path)?)?)
    }).await?;
    value.map_err(missing_file_as(not_found))
}
