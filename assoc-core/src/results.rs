use std::sync::Arc;
use crate::{
    ColumnDefinition, Comparator, EngineConfig, Error, GeneResult, GeneRow, Result, SortOrder,
    export::to_delimited_text, gene_table_columns, sorting::sort_rows,
};

/// Lays the selected group's fields over each gene. Genes without a result
/// for the group keep their identifying fields only.
pub fn select_gene_group(genes: &[Arc<GeneResult>], group: &str) -> Vec<GeneRow> {
    genes.iter()
        .map(|gene| GeneRow {
            gene: Arc::clone(gene),
            group_result: gene.group_results.get(group).cloned().unwrap_or_default(),
        })
        .collect()
}

/// Case-insensitive match on gene id, symbol or name.
pub fn filter_gene_rows(rows: Vec<GeneRow>, search_text: &str) -> Vec<GeneRow> {
    let query = search_text.trim().to_uppercase();
    if query.is_empty() {
        return rows;
    }
    rows.into_iter()
        .filter(|row| {
            let gene = &row.gene;
            let matches = |field: Option<&str>| field.map(|f| f.to_uppercase().contains(&query)).unwrap_or(false);
            matches(Some(&gene.gene_id)) || matches(gene.gene_symbol.as_deref()) || matches(gene.gene_name.as_deref())
        })
        .collect()
}

/// Current view of the gene results table.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneTableState {
    pub group: String,
    pub search_text: String,
    pub sort_key: String,
    pub order: SortOrder,
    pub rows: Vec<GeneRow>,
}

/// Per-gene burden test results for one dataset.
pub struct GeneResultsTable<'c> {
    config: &'c EngineConfig,
    genes: Vec<Arc<GeneResult>>,
    columns: Vec<ColumnDefinition>,
}

impl<'c> GeneResultsTable<'c> {
    pub fn new(config: &'c EngineConfig, genes: Vec<GeneResult>) -> GeneResultsTable<'c> {
        GeneResultsTable {
            config,
            genes: genes.into_iter().map(Arc::new).collect(),
            columns: gene_table_columns(&config.gene_result_columns),
        }
    }

    pub fn columns(&self) -> &[ColumnDefinition] {
        &self.columns
    }

    pub fn genes(&self) -> &[Arc<GeneResult>] {
        &self.genes
    }

    /// Genes sort by symbol when the gene column is chosen.
    fn effective_sort_key(key: &str) -> &str {
        if key == "gene_id" { "gene_symbol" } else { key }
    }

    fn comparator(&self, key: &str) -> Comparator {
        match key {
            "gene_id" | "gene_symbol" | "gene_name" => Comparator::Text,
            _ => self.columns.iter()
                .find(|column| column.key == key)
                .map(|column| column.sort_comparator)
                .unwrap_or(Comparator::Numeric),
        }
    }

    fn derive_rows(&self, group: &str, search_text: &str, sort_key: &str, order: SortOrder) -> Vec<GeneRow> {
        let rows = filter_gene_rows(select_gene_group(&self.genes, group), search_text);
        sort_rows(rows, sort_key, self.comparator(sort_key), order)
    }

    fn check_group(&self, group: &str) -> Result<()> {
        if self.config.gene_result_analysis_groups.iter().any(|g| g == group) {
            Ok(())
        } else {
            Err(Error::UnknownGroup(group.to_string()))
        }
    }

    pub fn initial_state(&self) -> Result<GeneTableState> {
        let group = self.config.default_gene_group()
            .ok_or_else(|| Error::UnknownGroup(String::new()))?
            .to_string();
        self.check_group(&group)?;
        let requested = self.config.default_gene_result_sort_key.as_deref().unwrap_or("gene_id");
        let sort_key = Self::effective_sort_key(requested).to_string();
        let rows = self.derive_rows(&group, "", &sort_key, SortOrder::Ascending);
        tracing::debug!("{} gene results in {}", rows.len(), group);
        Ok(GeneTableState { group, search_text: String::new(), sort_key, order: SortOrder::Ascending, rows })
    }

    pub fn change_group(&self, state: GeneTableState, group: &str) -> Result<GeneTableState> {
        self.check_group(group)?;
        let rows = self.derive_rows(group, &state.search_text, &state.sort_key, state.order);
        Ok(GeneTableState { group: group.to_string(), rows, ..state })
    }

    pub fn change_search(&self, state: GeneTableState, search_text: &str) -> GeneTableState {
        let rows = self.derive_rows(&state.group, search_text, &state.sort_key, state.order);
        GeneTableState { search_text: search_text.to_string(), rows, ..state }
    }

    /// Header click: the active column flips, a new column starts ascending.
    pub fn request_sort(&self, state: GeneTableState, key: &str) -> Result<GeneTableState> {
        if !self.columns.iter().any(|column| column.key == key) && key != "gene_symbol" {
            return Err(Error::UnknownColumn(key.to_string()));
        }
        let sort_key = Self::effective_sort_key(key).to_string();
        let order = if sort_key == state.sort_key { state.order.reversed() } else { SortOrder::Ascending };
        let rows = sort_rows(state.rows, &sort_key, self.comparator(&sort_key), order);
        Ok(GeneTableState { sort_key, order, rows, ..state })
    }

    pub fn export_csv(&self, state: &GeneTableState) -> String {
        to_delimited_text(&state.rows, &self.columns)
    }
}
