#![deny(warnings)]
#![allow(dead_code)]

#[macro_use]
extern crate lazy_static;

use std::convert::TryFrom;
use std::fmt;
use serde::{Deserialize, Serialize};

mod error;
mod config;
mod consequences;
mod models;
mod ingest;
mod index;
mod columns;
mod sorting;
mod queries;
mod results;
mod export;

pub use error::{Error, Result};
pub use config::{EngineConfig, Metadata, CustomFilterRule, FlagTest};
pub use consequences::{
    ConsequenceClassifier, ConsequenceDefinition, Classification, TranscriptConsequence,
    ConsequenceGroup, ConsequenceGene, most_severe,
};
pub use models::{Scalar, Fields, Lookup, GroupResult, VariantRecord, VariantRow, GeneResult, GeneRow};
pub use ingest::{
    RecordDecoder, DataLayout, SearchTermsReader, SearchTerms, VariantsPayload, ResultsPayload,
    decode_row, allele_frequency, combined_allele_frequency, gene_data_directory,
};
pub use index::{PrefixTrie, PrefixMatches, SearchMatch, GeneSearch, SearchHit, MAX_SEARCH_RESULTS};
pub use columns::{
    ColumnDefinition, Comparator, RenderStrategy, ExportStrategy, variant_table_columns,
    variant_detail_columns, gene_table_columns,
};
pub use sorting::{sort_rows, compare_null_last};
pub use queries::{
    CategorySet, FilterState, CustomFilter, RuleFilter, SortState, VisibleWindow, TableState,
    VariantTable, TrackVariant, select_group, apply_filter, position_index,
};
pub use results::{GeneResultsTable, GeneTableState, select_gene_group, filter_gene_rows};
pub use export::{CsvExporter, to_delimited_text, format_cell, export_file_name};
#[cfg(feature = "async")]
pub use export::stream_delimited_text;

/// Coarse functional class of a variant's consequence.
#[derive(Debug, Hash, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
pub enum ConsequenceCategory {
    #[serde(rename = "lof")]
    Lof,
    #[serde(rename = "missense")]
    Missense,
    #[serde(rename = "synonymous")]
    Synonymous,
    #[serde(rename = "other")]
    Other,
}

impl ConsequenceCategory {
    pub const ALL: [ConsequenceCategory; 4] = [
        ConsequenceCategory::Lof,
        ConsequenceCategory::Missense,
        ConsequenceCategory::Synonymous,
        ConsequenceCategory::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ConsequenceCategory::Lof => "lof",
            ConsequenceCategory::Missense => "missense",
            ConsequenceCategory::Synonymous => "synonymous",
            ConsequenceCategory::Other => "other",
        }
    }
}

impl Default for ConsequenceCategory {
    fn default() -> Self {
        ConsequenceCategory::Other
    }
}

impl fmt::Display for ConsequenceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ConsequenceCategory {
    type Error = ();

    fn try_from(value: &str) -> std::result::Result<Self, Self::Error> {
        let category = match value {
            "lof" => ConsequenceCategory::Lof,
            "missense" => ConsequenceCategory::Missense,
            "synonymous" => ConsequenceCategory::Synonymous,
            "other" => ConsequenceCategory::Other,
            _ => return Err(()),
        };
        Ok(category)
    }
}

#[derive(Debug, Hash, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub enum SortOrder {
    #[serde(rename = "ascending")]
    Ascending,
    #[serde(rename = "descending")]
    Descending,
}

impl SortOrder {
    pub fn reversed(self) -> SortOrder {
        match self {
            SortOrder::Ascending => SortOrder::Descending,
            SortOrder::Descending => SortOrder::Ascending,
        }
    }
}

impl TryFrom<&str> for SortOrder {
    type Error = ();

    fn try_from(value: &str) -> std::result::Result<Self, Self::Error> {
        match value {
            "asc" | "ascending" => Ok(SortOrder::Ascending),
            "desc" | "descending" => Ok(SortOrder::Descending),
            _ => Err(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_round_trip_names() {
        for category in ConsequenceCategory::ALL.iter() {
            assert_eq!(ConsequenceCategory::try_from(category.as_str()), Ok(*category));
        }
        assert_eq!(ConsequenceCategory::try_from("LOF"), Err(()));
    }

    #[test]
    fn test_sort_order_parse() {
        assert_eq!(SortOrder::try_from("asc"), Ok(SortOrder::Ascending));
        assert_eq!(SortOrder::try_from("descending"), Ok(SortOrder::Descending));
        assert_eq!(SortOrder::Ascending.reversed(), SortOrder::Descending);
    }
}
