use std::cmp::Ordering;
use serde::{Deserialize, Serialize};
use crate::models::{compare_f64, format_number};
use crate::Scalar;

/// How two present values of a column compare.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Comparator {
    Numeric,
    Text,
}

impl Default for Comparator {
    fn default() -> Self {
        Comparator::Numeric
    }
}

fn as_number(value: &Scalar) -> Option<f64> {
    value.as_f64().filter(|n| !n.is_nan())
}

impl Comparator {
    /// Whether `value` takes part in ordering. Missing cells never do, and a
    /// numeric column also leaves out cells that are not numbers.
    pub fn ranks(self, value: &Scalar) -> bool {
        match self {
            Comparator::Numeric => as_number(value).is_some(),
            Comparator::Text => !value.is_missing(),
        }
    }

    /// Total order over present values. Under `Numeric`, numbers come before
    /// anything non-numeric, which then orders by its text.
    pub fn compare(self, a: &Scalar, b: &Scalar) -> Ordering {
        match self {
            Comparator::Numeric => match (as_number(a), as_number(b)) {
                (Some(a), Some(b)) => compare_f64(a, b),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Comparator::Text.compare(a, b),
            },
            Comparator::Text => {
                let (a, b) = (a.to_text(), b.to_text());
                a.to_lowercase().cmp(&b.to_lowercase()).then_with(|| a.cmp(&b))
            }
        }
    }
}

/// How a cell is displayed in a table or detail view.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderStrategy {
    Raw,
    Count,
    /// Three significant digits.
    Number,
    Exponential,
    /// Fixed three decimals.
    Decimal,
    YesNo,
    OddsRatio,
}

impl Default for RenderStrategy {
    fn default() -> Self {
        RenderStrategy::Number
    }
}

impl RenderStrategy {
    pub fn render(self, value: &Scalar) -> String {
        if value.is_missing() {
            return String::new();
        }
        match self {
            RenderStrategy::Raw | RenderStrategy::Count => value.to_text().into_owned(),
            RenderStrategy::YesNo => yes_or_blank(value),
            RenderStrategy::Number => match value.as_f64() {
                Some(n) => format_number(round_significant(n)),
                None => value.to_text().into_owned(),
            },
            RenderStrategy::Exponential => match value.as_f64() {
                Some(n) => format_exponential(round_significant(n)),
                None => value.to_text().into_owned(),
            },
            RenderStrategy::Decimal => match value.as_f64() {
                Some(n) => format!("{:.3}", n),
                None => value.to_text().into_owned(),
            },
            RenderStrategy::OddsRatio => match value.as_f64() {
                Some(n) if n.is_infinite() => "∞".to_string(),
                Some(n) if n == 0.0 => "0".to_string(),
                Some(n) => to_precision(n),
                None => value.to_text().into_owned(),
            },
        }
    }
}

/// How a cell is written to an export, before CSV escaping.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportStrategy {
    Raw,
    YesNo,
}

impl Default for ExportStrategy {
    fn default() -> Self {
        ExportStrategy::Raw
    }
}

impl ExportStrategy {
    /// Null for values the export leaves blank.
    pub fn export(self, value: Scalar) -> Scalar {
        match self {
            ExportStrategy::Raw => value,
            ExportStrategy::YesNo if value.is_truthy() => Scalar::Text("yes".to_string()),
            ExportStrategy::YesNo => Scalar::Null,
        }
    }
}

fn yes_or_blank(value: &Scalar) -> String {
    if value.is_truthy() { "yes".to_string() } else { String::new() }
}

/// Rounds to three significant digits.
fn round_significant(value: f64) -> f64 {
    if !value.is_finite() {
        return value;
    }
    format!("{:.2e}", value).parse().unwrap_or(value)
}

/// Shortest exponential form, with an explicit sign on the exponent.
fn format_exponential(value: f64) -> String {
    if value == 0.0 {
        return "0".to_string();
    }
    if !value.is_finite() {
        return format_number(value);
    }
    let formatted = format!("{:e}", value);
    match formatted.split_once('e') {
        Some((mantissa, exponent)) if !exponent.starts_with('-') => format!("{}e+{}", mantissa, exponent),
        _ => formatted,
    }
}

/// Three significant digits, keeping trailing zeros.
fn to_precision(value: f64) -> String {
    if !value.is_finite() {
        return format_number(value);
    }
    let scientific = format!("{:.2e}", value);
    let (mantissa, exponent) = match scientific.split_once('e') {
        Some(parts) => parts,
        None => return scientific,
    };
    let exponent: i32 = exponent.parse().unwrap_or(0);
    if exponent < -6 || exponent >= 3 {
        let sign = if exponent < 0 { "-" } else { "+" };
        format!("{}e{}{}", mantissa, sign, exponent.abs())
    } else {
        format!("{:.*}", (2 - exponent) as usize, value)
    }
}

fn default_min_width() -> u32 {
    65
}

fn default_true() -> bool {
    true
}

/// A table column as plain data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    pub key: String,
    #[serde(default)]
    pub heading: Option<String>,
    #[serde(default)]
    pub tooltip: Option<String>,
    #[serde(default = "default_min_width")]
    pub min_width: u32,
    #[serde(default = "default_true")]
    pub is_sortable: bool,
    #[serde(default)]
    pub sort_key: Option<String>,
    #[serde(default)]
    pub sort_comparator: Comparator,
    #[serde(default)]
    pub render: RenderStrategy,
    #[serde(default)]
    pub render_for_export: ExportStrategy,
    #[serde(default = "default_true")]
    pub show_on_gene_page: bool,
    #[serde(default = "default_true")]
    pub show_on_details: bool,
}

impl ColumnDefinition {
    pub fn new(key: impl Into<String>) -> ColumnDefinition {
        ColumnDefinition {
            key: key.into(),
            heading: None,
            tooltip: None,
            min_width: default_min_width(),
            is_sortable: true,
            sort_key: None,
            sort_comparator: Comparator::default(),
            render: RenderStrategy::default(),
            render_for_export: ExportStrategy::default(),
            show_on_gene_page: true,
            show_on_details: true,
        }
    }

    pub fn with_heading(mut self, heading: &str) -> Self {
        self.heading = Some(heading.to_string());
        self
    }

    pub fn with_tooltip(mut self, tooltip: &str) -> Self {
        self.tooltip = Some(tooltip.to_string());
        self
    }

    pub fn with_min_width(mut self, min_width: u32) -> Self {
        self.min_width = min_width;
        self
    }

    pub fn with_sort_key(mut self, sort_key: &str) -> Self {
        self.sort_key = Some(sort_key.to_string());
        self
    }

    pub fn with_comparator(mut self, comparator: Comparator) -> Self {
        self.sort_comparator = comparator;
        self
    }

    pub fn with_render(mut self, render: RenderStrategy) -> Self {
        self.render = render;
        self
    }

    pub fn with_export(mut self, export: ExportStrategy) -> Self {
        self.render_for_export = export;
        self
    }

    /// Heading, falling back to the key.
    pub fn heading(&self) -> &str {
        self.heading.as_deref().unwrap_or(&self.key)
    }

    /// Field the column sorts on, falling back to the key.
    pub fn sort_key(&self) -> &str {
        self.sort_key.as_deref().unwrap_or(&self.key)
    }
}

fn variant_base_columns() -> Vec<ColumnDefinition> {
    let count = |key: &str, heading: &str, tooltip: &str| {
        ColumnDefinition::new(key)
            .with_heading(heading)
            .with_tooltip(tooltip)
            .with_min_width(75)
            .with_render(RenderStrategy::Raw)
    };
    let frequency = |key: &str, heading: &str, tooltip: &str| {
        ColumnDefinition::new(key)
            .with_heading(heading)
            .with_tooltip(tooltip)
            .with_min_width(80)
            .with_render(RenderStrategy::Exponential)
    };

    vec![
        ColumnDefinition::new("variant_id")
            .with_heading("Variant ID")
            .with_tooltip("Chromosome-position-reference-alternate")
            .with_min_width(130)
            .with_sort_key("pos")
            .with_render(RenderStrategy::Raw),
        ColumnDefinition::new("hgvs")
            .with_heading("HGVSp/c")
            .with_tooltip("HGVS protein (if available) or coding sequence")
            .with_min_width(130)
            .with_comparator(Comparator::Text)
            .with_render(RenderStrategy::Raw),
        ColumnDefinition::new("consequence")
            .with_heading("Consequence")
            .with_tooltip("Predicted functional consequence")
            .with_min_width(180)
            .with_comparator(Comparator::Text)
            .with_render(RenderStrategy::Raw),
        count("group_result.ac_case", "AC Case", "Allele count in cases"),
        count("group_result.an_case", "AN Case", "Allele number in cases"),
        count("group_result.ac_ctrl", "AC Control", "Allele count in controls"),
        count("group_result.an_ctrl", "AN Control", "Allele number in controls"),
        frequency("group_result.af_case", "AF Case", "Allele frequency in cases"),
        frequency("group_result.af_ctrl", "AF Control", "Allele frequency in controls"),
    ]
}

/// Fixed variant columns followed by the dataset's result columns shown on
/// the gene page.
pub fn variant_table_columns(result_columns: &[ColumnDefinition]) -> Vec<ColumnDefinition> {
    let mut columns = variant_base_columns();
    columns.extend(result_columns.iter().filter(|c| c.show_on_gene_page).cloned());
    columns
}

/// Dataset result columns shown on the variant details view.
pub fn variant_detail_columns(result_columns: &[ColumnDefinition]) -> Vec<ColumnDefinition> {
    result_columns.iter().filter(|c| c.show_on_details).cloned().collect()
}

pub fn gene_table_columns(result_columns: &[ColumnDefinition]) -> Vec<ColumnDefinition> {
    let mut columns = vec![
        ColumnDefinition::new("gene_id")
            .with_heading("Gene")
            .with_min_width(100)
            .with_comparator(Comparator::Text)
            .with_render(RenderStrategy::Raw),
        ColumnDefinition::new("gene_name")
            .with_heading("Description")
            .with_min_width(200)
            .with_comparator(Comparator::Text)
            .with_render(RenderStrategy::Raw),
    ];
    columns.extend(result_columns.iter().cloned());
    columns
}
