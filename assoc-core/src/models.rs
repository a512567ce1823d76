use std::borrow::Cow;
use std::cmp::Ordering;
use std::sync::Arc;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use crate::ConsequenceCategory;

/// A single decoded cell value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Json(Value),
}

impl Default for Scalar {
    fn default() -> Self {
        Scalar::Null
    }
}

impl From<Value> for Scalar {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Scalar::Null,
            Value::Bool(b) => Scalar::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Scalar::Int(i),
                None => n.as_f64().map(Scalar::Float).unwrap_or(Scalar::Null),
            },
            Value::String(s) => Scalar::Text(s),
            other => Scalar::Json(other),
        }
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Text(value.to_string())
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Float(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Int(value)
    }
}

impl<T: Into<Scalar>> From<Option<T>> for Scalar {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Scalar::Null)
    }
}

impl Scalar {
    /// Missing values sort last and export as empty cells.
    pub fn is_missing(&self) -> bool {
        match self {
            Scalar::Null => true,
            Scalar::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Int(i) => Some(*i as f64),
            Scalar::Float(f) => Some(*f),
            Scalar::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Scalar::Text(s) => match s.as_str() {
                "Infinity" => Some(f64::INFINITY),
                "-Infinity" => Some(f64::NEG_INFINITY),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Scalar::Null => false,
            Scalar::Bool(b) => *b,
            Scalar::Int(i) => *i != 0,
            Scalar::Float(f) => *f != 0.0 && !f.is_nan(),
            Scalar::Text(s) => !s.is_empty(),
            Scalar::Json(_) => true,
        }
    }

    /// Plain text form: no locale formatting, numbers written the way a
    /// browser would stringify them.
    pub fn to_text(&self) -> Cow<'_, str> {
        match self {
            Scalar::Null => Cow::Borrowed(""),
            Scalar::Bool(true) => Cow::Borrowed("true"),
            Scalar::Bool(false) => Cow::Borrowed("false"),
            Scalar::Int(i) => Cow::Owned(i.to_string()),
            Scalar::Float(f) => Cow::Owned(format_number(*f)),
            Scalar::Text(s) => Cow::Borrowed(s),
            Scalar::Json(v) => Cow::Owned(v.to_string()),
        }
    }

    pub(crate) fn as_count(&self) -> Option<Option<u64>> {
        match self {
            Scalar::Null => Some(None),
            Scalar::Int(i) if *i >= 0 => Some(Some(*i as u64)),
            Scalar::Float(f) if *f >= 0.0 && f.fract() == 0.0 => Some(Some(*f as u64)),
            _ => None,
        }
    }
}

/// Formats a float the way `String(number)` does in a browser.
pub(crate) fn format_number(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }
    let magnitude = value.abs();
    if magnitude >= 1e21 || magnitude < 1e-6 {
        let formatted = format!("{:e}", value);
        match formatted.find('e') {
            Some(idx) if !formatted[idx + 1..].starts_with('-') => {
                format!("{}e+{}", &formatted[..idx], &formatted[idx + 1..])
            }
            _ => formatted,
        }
    } else {
        format!("{}", value)
    }
}

pub type Fields = IndexMap<String, Scalar>;

/// Anything that can produce a value for a dotted column path.
pub trait Lookup {
    fn lookup(&self, path: &str) -> Scalar;
}

impl<T: Lookup + ?Sized> Lookup for &T {
    fn lookup(&self, path: &str) -> Scalar {
        (**self).lookup(path)
    }
}

/// Statistics for one analysis group of a variant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GroupResult {
    pub ac_case: Option<u64>,
    pub an_case: Option<u64>,
    pub ac_ctrl: Option<u64>,
    pub an_ctrl: Option<u64>,
    pub af_case: Option<f64>,
    pub af_ctrl: Option<f64>,
    pub af: Option<f64>,
    #[serde(flatten)]
    pub extra: Fields,
}

impl GroupResult {
    pub fn get(&self, field: &str) -> Scalar {
        let count = |c: Option<u64>| Scalar::from(c.map(|c| c as i64));
        match field {
            "ac_case" => count(self.ac_case),
            "an_case" => count(self.an_case),
            "ac_ctrl" => count(self.ac_ctrl),
            "an_ctrl" => count(self.an_ctrl),
            "af_case" => self.af_case.into(),
            "af_ctrl" => self.af_ctrl.into(),
            "af" => self.af.into(),
            other => self.extra.get(other).cloned().unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VariantRecord {
    pub variant_id: String,
    pub pos: u64,
    /// Raw consequence term as stored.
    pub consequence_term: Option<String>,
    /// Display label for `consequence_term`.
    pub consequence: Option<String>,
    pub consequence_category: ConsequenceCategory,
    pub hgvsc: Option<String>,
    pub hgvsp: Option<String>,
    pub hgvs: Option<String>,
    pub info: Fields,
    pub group_results: IndexMap<String, GroupResult>,
    /// Configured top-level fields without a dedicated slot.
    pub extra: Fields,
}

impl VariantRecord {
    fn lookup_top_level(&self, path: &str) -> Scalar {
        let text = |s: &Option<String>| Scalar::from(s.as_deref());
        match path {
            "variant_id" => Scalar::Text(self.variant_id.clone()),
            "pos" => Scalar::Int(self.pos as i64),
            "consequence" => text(&self.consequence),
            "consequence_term" => text(&self.consequence_term),
            "consequence_category" => Scalar::Text(self.consequence_category.to_string()),
            "hgvsc" => text(&self.hgvsc),
            "hgvsp" => text(&self.hgvsp),
            "hgvs" => text(&self.hgvs),
            other => {
                if let Some(field) = other.strip_prefix("info.") {
                    return self.info.get(field).cloned().unwrap_or_default();
                }
                if let Some(rest) = other.strip_prefix("group_results.") {
                    let mut parts = rest.splitn(2, '.');
                    let group = parts.next().unwrap_or_default();
                    return match (self.group_results.get(group), parts.next()) {
                        (Some(result), Some(field)) => result.get(field),
                        _ => Scalar::Null,
                    };
                }
                self.extra.get(other).cloned().unwrap_or_default()
            }
        }
    }
}

impl Lookup for VariantRecord {
    fn lookup(&self, path: &str) -> Scalar {
        self.lookup_top_level(path)
    }
}

/// A variant viewed through one selected analysis group.
#[derive(Debug, Clone, PartialEq)]
pub struct VariantRow {
    pub variant: Arc<VariantRecord>,
    pub group_result: GroupResult,
}

impl Lookup for VariantRow {
    fn lookup(&self, path: &str) -> Scalar {
        match path.strip_prefix("group_result.") {
            Some(field) => self.group_result.get(field),
            None => self.variant.lookup_top_level(path),
        }
    }
}

impl Serialize for VariantRow {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Flat<'a> {
            #[serde(flatten)]
            variant: &'a VariantRecord,
            group_result: &'a GroupResult,
        }
        Flat { variant: &self.variant, group_result: &self.group_result }.serialize(serializer)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneResult {
    pub gene_id: String,
    pub gene_symbol: Option<String>,
    pub gene_name: Option<String>,
    pub chrom: Option<String>,
    pub pos: Option<u64>,
    pub group_results: IndexMap<String, Fields>,
}

impl GeneResult {
    fn lookup_top_level(&self, path: &str) -> Scalar {
        let text = |s: &Option<String>| Scalar::from(s.as_deref());
        match path {
            "gene_id" => Scalar::Text(self.gene_id.clone()),
            "gene_symbol" => text(&self.gene_symbol),
            "gene_name" => text(&self.gene_name),
            "chrom" => text(&self.chrom),
            "pos" => Scalar::from(self.pos.map(|p| p as i64)),
            _ => Scalar::Null,
        }
    }
}

/// A gene result with the selected group's fields laid over it.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneRow {
    pub gene: Arc<GeneResult>,
    pub group_result: Fields,
}

impl Lookup for GeneRow {
    fn lookup(&self, path: &str) -> Scalar {
        match self.group_result.get(path) {
            Some(value) => value.clone(),
            None => self.gene.lookup_top_level(path),
        }
    }
}

impl Serialize for GeneRow {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(None)?;
        for key in &["gene_id", "gene_symbol", "gene_name", "chrom", "pos"] {
            if !self.group_result.contains_key(*key) {
                map.serialize_entry(key, &self.gene.lookup_top_level(key))?;
            }
        }
        for (key, value) in &self.group_result {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// Order of two numbers that are not NaN.
pub(crate) fn compare_f64(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}
