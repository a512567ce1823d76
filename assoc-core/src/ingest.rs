use std::io::{BufRead, Read};
use std::path::{Path, PathBuf};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use crate::{
    ConsequenceCategory, ConsequenceClassifier, EngineConfig, Error, Fields, GeneResult,
    GroupResult, Result, Scalar, VariantRecord, index::is_gene_id,
};

/// Names of variant fields that hold nested positional sub-rows.
const INFO_FIELD: &str = "info";
const GROUP_RESULTS_FIELD: &str = "group_results";

/// Fixed layout of a gene result row.
const GENE_RESULT_FIELDS: [&str; 6] = ["gene_id", "gene_symbol", "gene_name", "chrom", "pos", "group_results"];

/// Zips a schema with a positional row.
///
/// A row must have exactly one value per schema entry; anything else is a
/// data-integrity error and is reported rather than padded or truncated.
pub fn decode_row(context: &str, schema: &[String], row: &[Value]) -> Result<Fields> {
    if schema.len() != row.len() {
        return Err(Error::schema_mismatch(context, schema.len(), row.len()));
    }
    Ok(schema.iter().cloned()
        .zip(row.iter().cloned().map(Scalar::from))
        .collect())
}

/// `ac / an`, with null inputs giving null and a zero denominator giving 0.
pub fn allele_frequency(ac: Option<u64>, an: Option<u64>) -> Option<f64> {
    match (ac, an) {
        (Some(_), Some(0)) => Some(0.0),
        (Some(ac), Some(an)) => Some(ac as f64 / an as f64),
        _ => None,
    }
}

/// Allele frequency over cases and controls together.
///
/// Null whenever either side's frequency is null, so the combined figure is
/// never computed from a partial count.
pub fn combined_allele_frequency(result: &GroupResult) -> Option<f64> {
    if result.af_case.is_none() || result.af_ctrl.is_none() {
        return None;
    }
    let ac = result.ac_case? + result.ac_ctrl?;
    let an = result.an_case? + result.an_ctrl?;
    allele_frequency(Some(ac), Some(an))
}

fn take_count(fields: &mut Fields, name: &str, context: &str) -> Result<Option<u64>> {
    match fields.shift_remove(name) {
        None => Ok(None),
        Some(value) => value.as_count().ok_or_else(|| Error::InvalidValue {
            field: format!("{}.{}", context, name),
            reason: format!("expected a non-negative count, found {:?}", value),
        }),
    }
}

fn take_text(value: Scalar) -> Option<String> {
    match value {
        Scalar::Null => None,
        Scalar::Text(s) => Some(s),
        other => Some(other.to_text().into_owned()),
    }
}

fn as_array<'v>(value: &'v Value, context: &str) -> Result<&'v [Value]> {
    match value {
        Value::Array(values) => Ok(values),
        other => Err(Error::InvalidValue {
            field: context.to_string(),
            reason: format!("expected a positional row, found {}", other),
        }),
    }
}

/// Turns positional rows into records using a dataset's field schemas.
#[derive(Debug, Clone)]
pub struct RecordDecoder<'c> {
    config: &'c EngineConfig,
    classifier: ConsequenceClassifier,
}

impl<'c> RecordDecoder<'c> {
    pub fn new(config: &'c EngineConfig) -> RecordDecoder<'c> {
        RecordDecoder { config, classifier: config.classifier() }
    }

    pub fn classifier(&self) -> &ConsequenceClassifier {
        &self.classifier
    }

    fn decode_variant_group_result(&self, group: &str, sub_row: &[Value]) -> Result<GroupResult> {
        let context = format!("group_results.{}", group);
        let mut fields = decode_row(&context, &self.config.variant_group_result_field_names, sub_row)?;

        let ac_case = take_count(&mut fields, "ac_case", &context)?;
        let an_case = take_count(&mut fields, "an_case", &context)?;
        let ac_ctrl = take_count(&mut fields, "ac_ctrl", &context)?;
        let an_ctrl = take_count(&mut fields, "an_ctrl", &context)?;
        for derived in &["af_case", "af_ctrl", "af"] {
            fields.shift_remove(*derived);
        }

        let mut result = GroupResult {
            ac_case,
            an_case,
            ac_ctrl,
            an_ctrl,
            af_case: allele_frequency(ac_case, an_case),
            af_ctrl: allele_frequency(ac_ctrl, an_ctrl),
            af: None,
            extra: fields,
        };
        result.af = combined_allele_frequency(&result);
        Ok(result)
    }

    /// One sub-row per configured group, in configured order. A null
    /// sub-row means the variant has no result for that group.
    fn decode_variant_group_results(&self, value: &Value) -> Result<IndexMap<String, GroupResult>> {
        let groups = &self.config.variant_result_analysis_groups;
        let sub_rows = as_array(value, GROUP_RESULTS_FIELD)?;
        if sub_rows.len() != groups.len() {
            return Err(Error::schema_mismatch(GROUP_RESULTS_FIELD, groups.len(), sub_rows.len()));
        }

        let mut results = IndexMap::with_capacity(groups.len());
        for (group, sub_row) in groups.iter().zip(sub_rows) {
            if sub_row.is_null() {
                continue;
            }
            let sub_row = as_array(sub_row, GROUP_RESULTS_FIELD)?;
            results.insert(group.clone(), self.decode_variant_group_result(group, sub_row)?);
        }
        Ok(results)
    }

    pub fn decode_variant(&self, row: &[Value]) -> Result<VariantRecord> {
        let schema = &self.config.variant_fields;
        if schema.len() != row.len() {
            return Err(Error::schema_mismatch("variant", schema.len(), row.len()));
        }

        let mut info = Fields::new();
        let mut group_results = IndexMap::new();
        let mut top_level = Fields::new();
        for (field, value) in schema.iter().zip(row) {
            match field.as_str() {
                INFO_FIELD => {
                    if !value.is_null() {
                        info = decode_row(INFO_FIELD, &self.config.variant_info_field_names, as_array(value, INFO_FIELD)?)?;
                    }
                }
                GROUP_RESULTS_FIELD => {
                    if !value.is_null() {
                        group_results = self.decode_variant_group_results(value)?;
                    }
                }
                _ => {
                    top_level.insert(field.clone(), Scalar::from(value.clone()));
                }
            }
        }

        let variant_id = top_level.shift_remove("variant_id")
            .and_then(take_text)
            .ok_or_else(|| Error::InvalidValue {
                field: "variant_id".to_string(),
                reason: "missing".to_string(),
            })?;
        let pos = match top_level.shift_remove("pos") {
            Some(Scalar::Int(pos)) if pos >= 0 => pos as u64,
            _ => position_from_variant_id(&variant_id).ok_or_else(|| Error::InvalidValue {
                field: "pos".to_string(),
                reason: format!("no position for {}", variant_id),
            })?,
        };
        let hgvsc = top_level.shift_remove("hgvsc").and_then(take_text);
        let hgvsp = top_level.shift_remove("hgvsp").and_then(take_text);
        let consequence_term = top_level.shift_remove("consequence")
            .and_then(take_text)
            .filter(|term| !term.is_empty());

        let (consequence, consequence_category) = match &consequence_term {
            Some(term) => {
                let classification = self.classifier.classify(term);
                (Some(classification.label.to_string()), classification.category)
            }
            None => (None, ConsequenceCategory::Other),
        };

        Ok(VariantRecord {
            hgvs: hgvsp.clone().or_else(|| hgvsc.clone()),
            variant_id,
            pos,
            consequence_term,
            consequence,
            consequence_category,
            hgvsc,
            hgvsp,
            info,
            group_results,
            extra: top_level,
        })
    }

    pub fn decode_variants(&self, payload: &VariantsPayload) -> Result<Vec<VariantRecord>> {
        let variants = payload.variants.iter()
            .map(|row| self.decode_variant(row))
            .collect::<Result<Vec<_>>>()?;
        tracing::debug!("decoded {} variants for {}", variants.len(), self.config.dataset_id);
        Ok(variants)
    }

    pub fn decode_gene(&self, row: &[Value]) -> Result<GeneResult> {
        if row.len() != GENE_RESULT_FIELDS.len() {
            return Err(Error::schema_mismatch("gene result", GENE_RESULT_FIELDS.len(), row.len()));
        }

        let groups = &self.config.gene_result_analysis_groups;
        let sub_rows = as_array(&row[5], GROUP_RESULTS_FIELD)?;
        if sub_rows.len() != groups.len() {
            return Err(Error::schema_mismatch(GROUP_RESULTS_FIELD, groups.len(), sub_rows.len()));
        }
        let mut group_results = IndexMap::with_capacity(groups.len());
        for (group, sub_row) in groups.iter().zip(sub_rows) {
            if sub_row.is_null() {
                continue;
            }
            let context = format!("group_results.{}", group);
            let fields = decode_row(&context, &self.config.gene_group_result_field_names, as_array(sub_row, &context)?)?;
            group_results.insert(group.clone(), fields);
        }

        let pos = Scalar::from(row[4].clone()).as_count().ok_or_else(|| Error::InvalidValue {
            field: "pos".to_string(),
            reason: format!("expected a non-negative integer position, found {}", row[4]),
        })?;

        let text = |value: &Value| take_text(Scalar::from(value.clone()));
        Ok(GeneResult {
            gene_id: text(&row[0]).ok_or_else(|| Error::InvalidValue {
                field: "gene_id".to_string(),
                reason: "missing".to_string(),
            })?,
            gene_symbol: text(&row[1]),
            gene_name: text(&row[2]),
            chrom: text(&row[3]),
            pos,
            group_results,
        })
    }

    pub fn decode_genes(&self, payload: &ResultsPayload) -> Result<Vec<GeneResult>> {
        let genes = payload.results.iter()
            .map(|row| self.decode_gene(row))
            .collect::<Result<Vec<_>>>()?;
        tracing::debug!("decoded {} gene results for {}", genes.len(), self.config.dataset_id);
        Ok(genes)
    }
}

/// Variant ids look like `chrom-pos-ref-alt`.
fn position_from_variant_id(variant_id: &str) -> Option<u64> {
    variant_id.split('-').nth(1)?.parse().ok()
}

/// Body of a `<gene>_<dataset>_variants.json` file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantsPayload {
    pub variants: Vec<Vec<Value>>,
}

impl VariantsPayload {
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }
}

/// Body of a `results/<dataset>.json` file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultsPayload {
    pub results: Vec<Vec<Value>>,
}

impl ResultsPayload {
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        Ok(serde_json::from_reader(reader)?)
    }
}

/// One line of the search terms file: a gene id and the terms that find it.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct SearchTerms(pub String, pub Vec<String>);

/// Reads newline-delimited `[gene_id, [term, ...]]` lines.
pub struct SearchTermsReader<B> {
    reader: B,
    line: String,
    line_number: usize,
}

impl<B: BufRead> SearchTermsReader<B> {
    pub fn new(reader: B) -> SearchTermsReader<B> {
        SearchTermsReader { reader, line: String::new(), line_number: 0 }
    }
}

impl<B: BufRead> Iterator for SearchTermsReader<B> {
    type Item = Result<SearchTerms>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            self.line.clear();
            match self.reader.read_line(&mut self.line) {
                Ok(0) => return None,
                Ok(_) => self.line_number += 1,
                Err(e) => return Some(Err(e.into())),
            }

            let line = self.line.trim();
            if line.is_empty() {
                continue;
            }
            let parsed = serde_json::from_str(line).map_err(|e| Error::InvalidValue {
                field: format!("search terms line {}", self.line_number),
                reason: e.to_string(),
            });
            return Some(parsed);
        }
    }
}

/// Genes are sharded into `genes/NNN` by the last three digits of their id.
/// Anything other than an `ENSG`/`ENSGR` id is not a gene on disk.
pub fn gene_data_directory(gene_id: &str) -> Result<PathBuf> {
    let not_found = || Error::NotFound { query: gene_id.to_string() };
    if !is_gene_id(gene_id) {
        return Err(not_found());
    }
    let digits = gene_id.trim_start_matches("ENSG").trim_start_matches('R');
    let shard: u64 = digits[digits.len().saturating_sub(3)..].parse().map_err(|_| not_found())?;
    Ok(Path::new("genes").join(format!("{:03}", shard)))
}

/// File layout of a results data directory.
#[derive(Debug, Clone, PartialEq)]
pub struct DataLayout {
    root: PathBuf,
}

impl DataLayout {
    pub fn new(root: impl Into<PathBuf>) -> DataLayout {
        DataLayout { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn metadata(&self) -> PathBuf {
        self.root.join("metadata.json")
    }

    pub fn search_terms(&self) -> PathBuf {
        self.root.join("gene_search_terms.json.txt")
    }

    pub fn gene_results(&self, dataset: &str) -> PathBuf {
        self.root.join("results").join(format!("{}.json", dataset.to_lowercase()))
    }

    pub fn gene(&self, gene_id: &str, reference_genome: &str) -> Result<PathBuf> {
        Ok(self.root.join(gene_data_directory(gene_id)?)
            .join(format!("{}_{}.json", gene_id, reference_genome)))
    }

    pub fn gene_variants(&self, gene_id: &str, dataset: &str) -> Result<PathBuf> {
        Ok(self.root.join(gene_data_directory(gene_id)?)
            .join(format!("{}_{}_variants.json", gene_id, dataset.to_lowercase())))
    }
}
