use actix_web::{HttpResponse, web};
use arc_swap::ArcSwap;
use serde::Serialize;

use assoc::SearchHit;
use crate::app::{ApiError, AppData};

#[derive(Debug, Serialize)]
struct SearchResponse {
    results: Vec<SearchHit>,
}

/// Exactly one non-empty `q` parameter.
fn single_query(params: &[(String, String)]) -> Result<&str, ApiError> {
    let queries: Vec<&str> = params.iter()
        .filter(|(key, _)| key == "q")
        .map(|(_, value)| value.as_str())
        .collect();
    match queries.as_slice() {
        [] => Err(ApiError::BadRequest("Query required")),
        [query] if query.is_empty() => Err(ApiError::BadRequest("Query required")),
        [query] => Ok(*query),
        _ => Err(ApiError::BadRequest("One query required")),
    }
}

pub async fn read(
    state: web::Data<ArcSwap<AppData>>,
    params: web::Query<Vec<(String, String)>>,
) -> Result<HttpResponse, ApiError> {
    let query = single_query(&params)?;
    let appdata = state.load_full();
    let results = appdata.search.search(query);
    tracing::debug!("search {:?} returned {} hits", query, results.len());
    Ok(HttpResponse::Ok().json(SearchResponse { results }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_single_query() {
        assert_eq!(single_query(&params(&[("q", "pcsk")])).unwrap(), "pcsk");
        assert!(single_query(&params(&[])).is_err());
        assert!(single_query(&params(&[("q", "")])).is_err());
        assert!(single_query(&params(&[("q", "a"), ("q", "b")])).is_err());
    }
}
