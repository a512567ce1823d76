use std::convert::TryFrom;
use std::sync::Arc;
use actix_web::{HttpResponse, web};
use arc_swap::ArcSwap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use assoc::{
    CategorySet, ColumnDefinition, ConsequenceCategory, FilterState, RecordDecoder, SortOrder,
    SortState, TableState, VariantRow, VariantTable, VariantsPayload, export_file_name,
    stream_delimited_text,
};
use crate::app::{ApiError, AppData};
use super::{missing_file_as, open, read_json};

/// Query parameters shared by the variant listing and its export.
#[derive(Debug, Default, Deserialize)]
pub struct VariantsQuery {
    group: Option<String>,
    search: Option<String>,
    /// Comma-separated consequence categories to keep.
    categories: Option<String>,
    /// JSON value for the dataset's custom filter.
    custom: Option<String>,
    sort: Option<String>,
    order: Option<String>,
}

impl VariantsQuery {
    fn filter(&self, base: FilterState) -> Result<FilterState, ApiError> {
        let mut filter = base;
        if let Some(categories) = &self.categories {
            let mut included = CategorySet::none();
            for name in categories.split(',').map(str::trim).filter(|name| !name.is_empty()) {
                let category = ConsequenceCategory::try_from(name)
                    .map_err(|_| ApiError::BadRequest("Unknown consequence category"))?;
                included = included.with(category, true);
            }
            filter = filter.with_categories(included);
        }
        if let Some(search) = &self.search {
            filter = filter.with_search_text(search);
        }
        if let Some(custom) = &self.custom {
            let custom: Value = serde_json::from_str(custom)
                .map_err(|_| ApiError::BadRequest("Custom filter must be JSON"))?;
            filter = filter.with_custom(custom);
        }
        Ok(filter)
    }

    fn sort(&self) -> Result<Option<SortState>, ApiError> {
        let key = match &self.sort {
            Some(key) => key,
            None => return Ok(None),
        };
        let order = match self.order.as_deref() {
            None => SortOrder::Descending,
            Some(order) => SortOrder::try_from(order)
                .map_err(|_| ApiError::BadRequest("Sort order must be asc or desc"))?,
        };
        Ok(Some(SortState::new(key, order)))
    }
}

fn resolve_gene(appdata: &AppData, gene: &str) -> Result<String, ApiError> {
    Ok(appdata.search.resolve(gene)?)
}

/// Decodes a gene's variants and runs them through the table engine.
fn variant_table_state(
    appdata: &AppData,
    gene_id: &str,
    query: &VariantsQuery,
) -> Result<(TableState, Vec<ColumnDefinition>), ApiError> {
    let config = &appdata.config;
    let path = appdata.layout.gene_variants(gene_id, &config.dataset_id)?;
    let payload = open(&path)
        .and_then(VariantsPayload::from_reader)
        .map_err(missing_file_as("Gene not found"))?;
    let variants = RecordDecoder::new(config).decode_variants(&payload)?;

    let table = VariantTable::new(config, variants);
    let mut state = table.initial_state()?;
    if let Some(group) = &query.group {
        state = table.change_group(state, group)?;
    }
    let filter = query.filter(state.filter.clone())?;
    state = table.change_filter(state, filter)?;
    if let Some(sort) = query.sort()? {
        state = table.apply_sort(state, sort)?;
    }
    Ok((state, table.columns().to_vec()))
}

pub async fn read(
    state: web::Data<ArcSwap<AppData>>,
    gene: web::Path<String>,
) -> Result<HttpResponse, ApiError> {
    let appdata = state.load_full();
    let gene_id = resolve_gene(&appdata, &gene)?;
    let reference_genome = appdata.config.reference_genome.clone()
        .ok_or_else(|| ApiError::Internal("dataset has no reference genome".to_string()))?;
    let path = appdata.layout.gene(&gene_id, &reference_genome)?;
    let gene: Value = read_json(path, "Gene not found").await?;
    Ok(HttpResponse::Ok().json(gene))
}

#[derive(Serialize)]
struct VariantsResponse {
    gene_id: String,
    group: String,
    variants: Vec<VariantRow>,
}

async fn load_variants(
    appdata: Arc<AppData>,
    gene: String,
    query: VariantsQuery,
) -> Result<(String, TableState, Vec<ColumnDefinition>), ApiError> {
    let gene_id = resolve_gene(&appdata, &gene)?;
    web::block(move || {
        variant_table_state(&appdata, &gene_id, &query).map(|(state, columns)| (gene_id, state, columns))
    }).await?
}

pub async fn variants(
    state: web::Data<ArcSwap<AppData>>,
    gene: web::Path<String>,
    query: web::Query<VariantsQuery>,
) -> Result<HttpResponse, ApiError> {
    let (gene_id, table_state, _) = load_variants(state.load_full(), gene.into_inner(), query.into_inner()).await?;
    tracing::debug!("{} variants in {} for {}", table_state.rows.len(), table_state.group, gene_id);
    Ok(HttpResponse::Ok().json(VariantsResponse {
        gene_id,
        group: table_state.group,
        variants: table_state.rows,
    }))
}

pub async fn export(
    state: web::Data<ArcSwap<AppData>>,
    gene: web::Path<String>,
    query: web::Query<VariantsQuery>,
) -> Result<HttpResponse, ApiError> {
    let (gene_id, table_state, columns) = load_variants(state.load_full(), gene.into_inner(), query.into_inner()).await?;
    let file_name = export_file_name(
        &format!("{}_{}_variants", table_state.group, gene_id),
        &chrono::Local::now(),
    );
    let stream = stream_delimited_text(table_state.rows, columns);
    Ok(HttpResponse::Ok()
        .content_type("text/csv")
        .insert_header(("Content-Disposition", format!("attachment; filename=\"{}\"", file_name)))
        .streaming(stream))
}
