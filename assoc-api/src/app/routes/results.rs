use actix_web::{HttpResponse, web};
use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};

use assoc::{GeneResultsTable, GeneRow, RecordDecoder, ResultsPayload};
use crate::app::{ApiError, AppData};
use super::{missing_file_as, open};

#[derive(Debug, Default, Deserialize)]
pub struct ResultsQuery {
    group: Option<String>,
    search: Option<String>,
    sort: Option<String>,
}

#[derive(Serialize)]
struct ResultsResponse {
    group: String,
    results: Vec<GeneRow>,
}

pub async fn read(
    state: web::Data<ArcSwap<AppData>>,
    query: web::Query<ResultsQuery>,
) -> Result<HttpResponse, ApiError> {
    let appdata = state.load_full();
    let query = query.into_inner();

    let response = web::block(move || -> Result<ResultsResponse, ApiError> {
        let config = &appdata.config;
        let payload = open(&appdata.layout.gene_results(&config.dataset_id))
            .and_then(ResultsPayload::from_reader)
            .map_err(missing_file_as("Results not found"))?;
        let genes = RecordDecoder::new(config).decode_genes(&payload)?;

        let table = GeneResultsTable::new(config, genes);
        let mut state = table.initial_state()?;
        if let Some(group) = &query.group {
            state = table.change_group(state, group)?;
        }
        if let Some(search) = &query.search {
            state = table.change_search(state, search);
        }
        if let Some(sort) = &query.sort {
            state = table.request_sort(state, sort)?;
        }
        Ok(ResultsResponse { group: state.group, results: state.rows })
    }).await??;

    tracing::debug!("{} gene results in {}", response.results.len(), response.group);
    Ok(HttpResponse::Ok().json(response))
}
