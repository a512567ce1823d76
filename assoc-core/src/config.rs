use std::io::Read;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use crate::{ColumnDefinition, ConsequenceClassifier, ConsequenceDefinition, Error, Result};

/// Per-dataset configuration handed to the decoder and the table engines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub dataset_id: String,
    #[serde(default)]
    pub reference_genome: Option<String>,

    #[serde(default)]
    pub gene_result_analysis_groups: Vec<String>,
    #[serde(default)]
    pub gene_group_result_field_names: Vec<String>,
    #[serde(default)]
    pub gene_result_columns: Vec<ColumnDefinition>,
    #[serde(default)]
    pub default_gene_result_analysis_group: Option<String>,
    #[serde(default)]
    pub default_gene_result_sort_key: Option<String>,

    #[serde(default = "default_variant_fields")]
    pub variant_fields: Vec<String>,
    #[serde(default)]
    pub variant_info_field_names: Vec<String>,
    #[serde(default)]
    pub variant_result_analysis_groups: Vec<String>,
    #[serde(default)]
    pub variant_group_result_field_names: Vec<String>,
    #[serde(default)]
    pub variant_result_columns: Vec<ColumnDefinition>,
    #[serde(default)]
    pub default_variant_analysis_group: Option<String>,
    #[serde(default)]
    pub variant_analysis_group_labels: IndexMap<String, String>,
    /// Ordered most to least severe. Falls back to the VEP table when absent.
    #[serde(default)]
    pub variant_consequences: Option<Vec<ConsequenceDefinition>>,
    #[serde(default)]
    pub variant_custom_filter: Vec<CustomFilterRule>,
}

fn default_variant_fields() -> Vec<String> {
    ["variant_id", "pos", "consequence", "hgvsc", "hgvsp", "info", "group_results"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            dataset_id: String::new(),
            reference_genome: None,
            gene_result_analysis_groups: Vec::new(),
            gene_group_result_field_names: Vec::new(),
            gene_result_columns: Vec::new(),
            default_gene_result_analysis_group: None,
            default_gene_result_sort_key: None,
            variant_fields: default_variant_fields(),
            variant_info_field_names: Vec::new(),
            variant_result_analysis_groups: Vec::new(),
            variant_group_result_field_names: Vec::new(),
            variant_result_columns: Vec::new(),
            default_variant_analysis_group: None,
            variant_analysis_group_labels: IndexMap::new(),
            variant_consequences: None,
            variant_custom_filter: Vec::new(),
        }
    }
}

impl EngineConfig {
    pub fn from_reader<R: Read>(reader: R) -> Result<EngineConfig> {
        Ok(serde_json::from_reader(reader)?)
    }

    pub fn classifier(&self) -> ConsequenceClassifier {
        match &self.variant_consequences {
            Some(definitions) => ConsequenceClassifier::new(definitions.clone()),
            None => ConsequenceClassifier::vep(),
        }
    }

    pub fn default_variant_group(&self) -> Option<&str> {
        self.default_variant_analysis_group.as_deref()
            .or_else(|| self.variant_result_analysis_groups.first().map(String::as_str))
    }

    pub fn default_gene_group(&self) -> Option<&str> {
        self.default_gene_result_analysis_group.as_deref()
            .or_else(|| self.gene_result_analysis_groups.first().map(String::as_str))
    }

    pub fn group_label<'a>(&'a self, group: &'a str) -> &'a str {
        self.variant_analysis_group_labels.get(group).map(String::as_str).unwrap_or(group)
    }
}

/// How a custom filter rule tests its field.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlagTest {
    Truthy,
    Positive,
}

impl Default for FlagTest {
    fn default() -> Self {
        FlagTest::Truthy
    }
}

/// When the custom filter value sets `param` to true, keep only rows
/// whose `field` passes `test`.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct CustomFilterRule {
    pub param: String,
    pub field: String,
    #[serde(default)]
    pub test: FlagTest,
}

/// The shared `metadata.json` describing every dataset.
///
/// Top-level keys other than `datasets` act as defaults which each dataset's
/// own object overrides.
#[derive(Debug, Clone, PartialEq)]
pub struct Metadata {
    shared: serde_json::Map<String, Value>,
    datasets: IndexMap<String, Value>,
}

impl Metadata {
    pub fn from_reader<R: Read>(reader: R) -> Result<Metadata> {
        let mut shared: serde_json::Map<String, Value> = serde_json::from_reader(reader)?;
        let datasets = match shared.remove("datasets") {
            Some(Value::Object(datasets)) => datasets.into_iter().collect(),
            Some(_) => return Err(Error::InvalidValue {
                field: "datasets".to_string(),
                reason: "expected an object".to_string(),
            }),
            None => IndexMap::new(),
        };
        Ok(Metadata { shared, datasets })
    }

    pub fn dataset_names(&self) -> impl Iterator<Item=&str> {
        self.datasets.keys().map(String::as_str)
    }

    /// Matches dataset names case-insensitively.
    pub fn resolve_dataset(&self, name: &str) -> Option<&str> {
        self.datasets.keys()
            .find(|dataset| dataset.eq_ignore_ascii_case(name))
            .map(String::as_str)
    }

    pub fn dataset_config(&self, name: &str) -> Result<EngineConfig> {
        let dataset = self.resolve_dataset(name)
            .ok_or_else(|| Error::UnknownDataset(name.to_string()))?;

        let mut merged = self.shared.clone();
        merged.insert("dataset_id".to_string(), Value::String(dataset.to_string()));
        if let Some(Value::Object(overrides)) = self.datasets.get(dataset) {
            for (key, value) in overrides {
                merged.insert(key.clone(), value.clone());
            }
        }
        Ok(serde_json::from_value(Value::Object(merged))?)
    }
}
