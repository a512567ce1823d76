use std::sync::Arc;
use std::time::{Duration, Instant};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use crate::{
    ColumnDefinition, ConsequenceCategory, CustomFilterRule, EngineConfig, Error, FlagTest,
    GroupResult, Lookup, Result, SortOrder, VariantRecord, VariantRow,
    export::to_delimited_text, sorting::sort_rows, variant_table_columns,
};

/// Which consequence categories a filter lets through.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct CategorySet {
    pub lof: bool,
    pub missense: bool,
    pub synonymous: bool,
    pub other: bool,
}

impl CategorySet {
    pub fn all() -> CategorySet {
        CategorySet { lof: true, missense: true, synonymous: true, other: true }
    }

    pub fn none() -> CategorySet {
        CategorySet { lof: false, missense: false, synonymous: false, other: false }
    }

    pub fn with(mut self, category: ConsequenceCategory, included: bool) -> CategorySet {
        match category {
            ConsequenceCategory::Lof => self.lof = included,
            ConsequenceCategory::Missense => self.missense = included,
            ConsequenceCategory::Synonymous => self.synonymous = included,
            ConsequenceCategory::Other => self.other = included,
        }
        self
    }

    pub fn contains(&self, category: ConsequenceCategory) -> bool {
        match category {
            ConsequenceCategory::Lof => self.lof,
            ConsequenceCategory::Missense => self.missense,
            ConsequenceCategory::Synonymous => self.synonymous,
            ConsequenceCategory::Other => self.other,
        }
    }

    pub fn is_all(&self) -> bool {
        self.lof && self.missense && self.synonymous && self.other
    }
}

impl Default for CategorySet {
    fn default() -> Self {
        CategorySet::all()
    }
}

/// User-controlled filter. Replaced as a whole, never edited in place.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterState {
    #[serde(default)]
    pub include_categories: CategorySet,
    #[serde(default)]
    pub search_text: String,
    /// Value handed to the dataset's custom filter.
    #[serde(default)]
    pub custom: Value,
}

impl FilterState {
    pub fn with_categories(self, include_categories: CategorySet) -> FilterState {
        FilterState { include_categories, ..self }
    }

    pub fn with_search_text(self, search_text: &str) -> FilterState {
        FilterState { search_text: search_text.to_string(), ..self }
    }

    pub fn with_custom(self, custom: Value) -> FilterState {
        FilterState { custom, ..self }
    }
}

/// A dataset-specific predicate run after the category and text filters.
///
/// Failures are returned to the caller untouched.
pub trait CustomFilter: Send + Sync {
    fn default_value(&self) -> Value {
        Value::Null
    }

    fn apply(&self, rows: Vec<VariantRow>, value: &Value) -> Result<Vec<VariantRow>>;
}

impl<F> CustomFilter for F
    where F: Fn(Vec<VariantRow>, &Value) -> Result<Vec<VariantRow>> + Send + Sync
{
    fn apply(&self, rows: Vec<VariantRow>, value: &Value) -> Result<Vec<VariantRow>> {
        self(rows, value)
    }
}

/// Custom filter built from the dataset's configured flag rules.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleFilter {
    rules: Vec<CustomFilterRule>,
}

impl RuleFilter {
    pub fn new(rules: Vec<CustomFilterRule>) -> RuleFilter {
        RuleFilter { rules }
    }

    /// `None` when the dataset has no custom filter.
    pub fn from_config(config: &EngineConfig) -> Option<RuleFilter> {
        if config.variant_custom_filter.is_empty() {
            None
        } else {
            Some(RuleFilter::new(config.variant_custom_filter.clone()))
        }
    }

    fn passes(rule: &CustomFilterRule, row: &VariantRow) -> bool {
        let value = row.lookup(&rule.field);
        match rule.test {
            FlagTest::Truthy => value.is_truthy(),
            FlagTest::Positive => value.as_f64().map(|n| n > 0.0).unwrap_or(false),
        }
    }
}

impl CustomFilter for RuleFilter {
    fn default_value(&self) -> Value {
        let params: Map<String, Value> = self.rules.iter()
            .map(|rule| (rule.param.clone(), Value::Bool(false)))
            .collect();
        Value::Object(params)
    }

    fn apply(&self, rows: Vec<VariantRow>, value: &Value) -> Result<Vec<VariantRow>> {
        let params = match value {
            Value::Null => return Ok(rows),
            Value::Object(params) => params,
            other => return Err(Error::MalformedFilter(format!("expected an object, found {}", other))),
        };

        let mut active = Vec::new();
        for rule in &self.rules {
            match params.get(&rule.param) {
                None | Some(Value::Null) | Some(Value::Bool(false)) => {}
                Some(Value::Bool(true)) => active.push(rule),
                Some(other) => return Err(Error::MalformedFilter(
                    format!("{} must be true or false, found {}", rule.param, other),
                )),
            }
        }
        if active.is_empty() {
            return Ok(rows);
        }

        Ok(rows.into_iter()
            .filter(|row| active.iter().all(|rule| RuleFilter::passes(rule, row)))
            .collect())
    }
}

/// Views each variant through `group`, dropping variants without a result there.
pub fn select_group(variants: &[Arc<VariantRecord>], group: &str) -> Vec<VariantRow> {
    variants.iter()
        .filter_map(|variant| {
            variant.group_results.get(group).map(|result| VariantRow {
                variant: Arc::clone(variant),
                group_result: result.clone(),
            })
        })
        .collect()
}

fn matches_search(variant: &VariantRecord, query: &str) -> bool {
    let contains = |field: &Option<String>| {
        field.as_deref().map(|s| s.to_lowercase().contains(query)).unwrap_or(false)
    };
    variant.variant_id.to_lowercase().contains(query)
        || contains(&variant.consequence)
        || contains(&variant.hgvsc)
        || contains(&variant.hgvsp)
}

/// Category, then search text, then the custom filter over what remains.
///
/// With every category included and no search text the rows come back as
/// they were passed in.
pub fn apply_filter(
    rows: Vec<VariantRow>,
    filter: &FilterState,
    custom: Option<&dyn CustomFilter>,
) -> Result<Vec<VariantRow>> {
    let mut rows = rows;

    if !filter.include_categories.is_all() {
        let categories = filter.include_categories;
        rows.retain(|row| categories.contains(row.variant.consequence_category));
    }

    if !filter.search_text.is_empty() {
        let query = filter.search_text.to_lowercase();
        rows.retain(|row| matches_search(&row.variant, &query));
    }

    match custom {
        Some(custom) => custom.apply(rows, &filter.custom),
        None => Ok(rows),
    }
}

/// Active sort column and direction.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct SortState {
    pub key: String,
    pub order: SortOrder,
}

impl SortState {
    pub fn new(key: &str, order: SortOrder) -> SortState {
        SortState { key: key.to_string(), order }
    }

    /// Header click: the active column flips, a new column starts descending.
    pub fn toggle(&self, key: &str) -> SortState {
        if key == self.key {
            SortState::new(key, self.order.reversed())
        } else {
            SortState::new(key, SortOrder::Descending)
        }
    }
}

impl Default for SortState {
    fn default() -> Self {
        SortState::new("variant_id", SortOrder::Ascending)
    }
}

/// Row to scroll to for a genomic position, given rows sorted by position.
pub fn position_index(rows: &[VariantRow], position: u64) -> usize {
    match rows.first() {
        None => return 0,
        Some(first) if position < first.variant.pos => return 0,
        _ => {}
    }
    rows.windows(2)
        .position(|pair| pair[0].variant.pos <= position && position <= pair[1].variant.pos)
        .unwrap_or(rows.len() - 1)
}

const WINDOW_THROTTLE: Duration = Duration::from_millis(100);

/// Range of rows currently on screen, updated at most once per 100ms.
///
/// Updates arriving inside the throttle interval are held back; the most
/// recent one is applied by the next update or `flush` after the interval.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct VisibleWindow {
    start: usize,
    stop: usize,
    pending: Option<(usize, usize)>,
    last_update: Option<Instant>,
}

impl Default for VisibleWindow {
    fn default() -> Self {
        VisibleWindow { start: 0, stop: 19, pending: None, last_update: None }
    }
}

impl VisibleWindow {
    /// Inclusive `(start, stop)`.
    pub fn range(&self) -> (usize, usize) {
        (self.start, self.stop)
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    fn ready(&self, now: Instant) -> bool {
        self.last_update
            .map(|last| now.saturating_duration_since(last) >= WINDOW_THROTTLE)
            .unwrap_or(true)
    }

    pub fn update(self, start: usize, stop: usize, now: Instant) -> VisibleWindow {
        if self.ready(now) {
            VisibleWindow { start, stop, pending: None, last_update: Some(now) }
        } else {
            VisibleWindow { pending: Some((start, stop)), ..self }
        }
    }

    pub fn flush(self, now: Instant) -> VisibleWindow {
        match self.pending {
            Some((start, stop)) if self.ready(now) => {
                VisibleWindow { start, stop, pending: None, last_update: Some(now) }
            }
            _ => self,
        }
    }
}

/// Everything a variant table shows, replaced in one step on every change.
#[derive(Debug, Clone, PartialEq)]
pub struct TableState {
    pub group: String,
    pub filter: FilterState,
    pub sort: SortState,
    /// Filtered and sorted rows for `group`.
    pub rows: Vec<VariantRow>,
    pub window: VisibleWindow,
    /// Row last jumped to from the position track.
    pub position_index: usize,
}

/// A variant drawn on a case, control or window track.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackVariant {
    pub variant_id: String,
    pub pos: u64,
    pub consequence_category: ConsequenceCategory,
    pub allele_freq: Option<f64>,
}

impl TrackVariant {
    fn new(row: &VariantRow, allele_freq: Option<f64>) -> TrackVariant {
        TrackVariant {
            variant_id: row.variant.variant_id.clone(),
            pos: row.variant.pos,
            consequence_category: row.variant.consequence_category,
            allele_freq,
        }
    }
}

/// The variants of one gene with their dataset's columns and filters.
pub struct VariantTable<'c> {
    config: &'c EngineConfig,
    variants: Vec<Arc<VariantRecord>>,
    columns: Vec<ColumnDefinition>,
    custom_filter: Option<Box<dyn CustomFilter>>,
}

impl<'c> VariantTable<'c> {
    pub fn new(config: &'c EngineConfig, variants: Vec<VariantRecord>) -> VariantTable<'c> {
        let custom_filter = RuleFilter::from_config(config)
            .map(|filter| Box::new(filter) as Box<dyn CustomFilter>);
        VariantTable {
            config,
            variants: variants.into_iter().map(Arc::new).collect(),
            columns: variant_table_columns(&config.variant_result_columns),
            custom_filter,
        }
    }

    /// Replaces the configured custom filter.
    pub fn with_custom_filter(mut self, filter: Box<dyn CustomFilter>) -> Self {
        self.custom_filter = Some(filter);
        self
    }

    pub fn columns(&self) -> &[ColumnDefinition] {
        &self.columns
    }

    pub fn variants(&self) -> &[Arc<VariantRecord>] {
        &self.variants
    }

    pub fn column(&self, key: &str) -> Result<&ColumnDefinition> {
        self.columns.iter()
            .find(|column| column.key == key)
            .ok_or_else(|| Error::UnknownColumn(key.to_string()))
    }

    fn check_group(&self, group: &str) -> Result<()> {
        if self.config.variant_result_analysis_groups.iter().any(|g| g == group) {
            Ok(())
        } else {
            Err(Error::UnknownGroup(group.to_string()))
        }
    }

    fn sort(&self, rows: Vec<VariantRow>, sort: &SortState) -> Result<Vec<VariantRow>> {
        let column = self.column(&sort.key)?;
        Ok(sort_rows(rows, column.sort_key(), column.sort_comparator, sort.order))
    }

    fn derive_rows(&self, group: &str, filter: &FilterState, sort: &SortState) -> Result<Vec<VariantRow>> {
        let selected = select_group(&self.variants, group);
        let selected_count = selected.len();
        let filtered = apply_filter(selected, filter, self.custom_filter.as_deref())?;
        tracing::debug!("{} of {} variants in {} pass the filter", filtered.len(), selected_count, group);
        self.sort(filtered, sort)
    }

    pub fn initial_state(&self) -> Result<TableState> {
        let group = self.config.default_variant_group()
            .ok_or_else(|| Error::UnknownGroup(String::new()))?
            .to_string();
        self.check_group(&group)?;

        let filter = FilterState {
            custom: self.custom_filter.as_ref().map(|f| f.default_value()).unwrap_or(Value::Null),
            ..FilterState::default()
        };
        let sort = SortState::default();
        let rows = self.derive_rows(&group, &filter, &sort)?;
        Ok(TableState {
            group,
            filter,
            sort,
            rows,
            window: VisibleWindow::default(),
            position_index: 0,
        })
    }

    pub fn change_group(&self, state: TableState, group: &str) -> Result<TableState> {
        self.check_group(group)?;
        let rows = self.derive_rows(group, &state.filter, &state.sort)?;
        Ok(TableState { group: group.to_string(), rows, ..state })
    }

    pub fn change_filter(&self, state: TableState, filter: FilterState) -> Result<TableState> {
        let rows = self.derive_rows(&state.group, &filter, &state.sort)?;
        Ok(TableState { filter, rows, ..state })
    }

    /// Re-sorts the rows already shown; the filter is not re-run.
    pub fn request_sort(&self, state: TableState, key: &str) -> Result<TableState> {
        let sort = state.sort.toggle(key);
        let rows = self.sort(state.rows, &sort)?;
        Ok(TableState { sort, rows, ..state })
    }

    /// Re-sorts the rows already shown by an explicit column and direction.
    pub fn apply_sort(&self, state: TableState, sort: SortState) -> Result<TableState> {
        let rows = self.sort(state.rows, &sort)?;
        Ok(TableState { sort, rows, ..state })
    }

    /// Sorts by position and records the row nearest `position`.
    pub fn click_position(&self, state: TableState, position: u64) -> Result<TableState> {
        let sort = SortState::default();
        let rows = self.sort(state.rows, &sort)?;
        let position_index = position_index(&rows, position);
        Ok(TableState { sort, rows, position_index, ..state })
    }

    pub fn visible_rows_changed(&self, state: TableState, start: usize, stop: usize, now: Instant) -> TableState {
        TableState { window: state.window.update(start, stop, now), ..state }
    }

    /// Rows inside the visible window.
    pub fn visible_rows<'s>(&self, state: &'s TableState) -> &'s [VariantRow] {
        let (start, stop) = state.window.range();
        let start = start.min(state.rows.len());
        let stop = stop.saturating_add(1).min(state.rows.len()).max(start);
        &state.rows[start..stop]
    }

    pub fn case_track(&self, state: &TableState) -> Vec<TrackVariant> {
        state.rows.iter()
            .filter(|row| row.group_result.ac_case.map(|ac| ac > 0).unwrap_or(false))
            .map(|row| TrackVariant::new(row, row.group_result.af_case))
            .collect()
    }

    pub fn control_track(&self, state: &TableState) -> Vec<TrackVariant> {
        state.rows.iter()
            .filter(|row| row.group_result.ac_ctrl.map(|ac| ac > 0).unwrap_or(false))
            .map(|row| TrackVariant::new(row, row.group_result.af_ctrl))
            .collect()
    }

    pub fn window_track(&self, state: &TableState) -> Vec<TrackVariant> {
        self.visible_rows(state).iter()
            .map(|row| TrackVariant::new(row, row.group_result.af))
            .collect()
    }

    pub fn export_csv(&self, state: &TableState) -> String {
        to_delimited_text(&state.rows, &self.columns)
    }

    /// A variant's group results for a details view: the default group
    /// first, the rest ordered by label.
    pub fn detail_group_results<'v>(&self, variant: &'v VariantRecord) -> Vec<(String, &'v GroupResult)> {
        let default_group = self.config.default_variant_group();
        let mut results: Vec<(String, &GroupResult, bool)> = variant.group_results.iter()
            .map(|(group, result)| {
                let label = self.config.group_label(group).to_string();
                (label, result, Some(group.as_str()) == default_group)
            })
            .collect();
        results.sort_by(|a, b| b.2.cmp(&a.2).then_with(|| a.0.cmp(&b.0)));
        results.into_iter().map(|(label, result, _)| (label, result)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Fields, Scalar};
    use indexmap::IndexMap;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn result(ac_case: u64, ac_ctrl: u64, in_analysis: bool) -> GroupResult {
        let mut extra = Fields::new();
        extra.insert("in_analysis".to_string(), Scalar::Bool(in_analysis));
        GroupResult {
            ac_case: Some(ac_case),
            an_case: Some(100),
            ac_ctrl: Some(ac_ctrl),
            an_ctrl: Some(100),
            af_case: Some(ac_case as f64 / 100.0),
            af_ctrl: Some(ac_ctrl as f64 / 100.0),
            af: Some((ac_case + ac_ctrl) as f64 / 200.0),
            extra,
        }
    }

    fn variant(id: &str, pos: u64, category: ConsequenceCategory, consequence: &str, groups: Vec<(&str, GroupResult)>) -> VariantRecord {
        VariantRecord {
            variant_id: id.to_string(),
            pos,
            consequence_term: Some(consequence.replace(' ', "_")),
            consequence: Some(consequence.to_string()),
            consequence_category: category,
            hgvsc: Some(format!("c.{}A>G", pos % 1000)),
            hgvsp: None,
            hgvs: Some(format!("c.{}A>G", pos % 1000)),
            info: Fields::new(),
            group_results: groups.into_iter().map(|(g, r)| (g.to_string(), r)).collect::<IndexMap<_, _>>(),
            extra: Fields::new(),
        }
    }

    lazy_static! {
        static ref CONFIG: EngineConfig = EngineConfig {
            dataset_id: "ASC".to_string(),
            variant_result_analysis_groups: vec!["DN".to_string(), "DBS".to_string()],
            variant_analysis_group_labels: vec![
                ("DN".to_string(), "De novo".to_string()),
                ("DBS".to_string(), "Case control".to_string()),
            ].into_iter().collect(),
            variant_custom_filter: vec![CustomFilterRule {
                param: "onlyInAnalysis".to_string(),
                field: "group_result.in_analysis".to_string(),
                test: FlagTest::Truthy,
            }],
            ..Default::default()
        };
    }

    fn variants() -> Vec<VariantRecord> {
        use ConsequenceCategory::*;
        vec![
            variant("1-300-A-G", 300, Missense, "missense", vec![("DN", result(2, 0, true)), ("DBS", result(1, 1, false))]),
            variant("1-100-C-T", 100, Lof, "stop gained", vec![("DN", result(0, 3, false))]),
            variant("1-200-G-A", 200, Synonymous, "synonymous", vec![("DBS", result(4, 0, true))]),
            variant("1-400-T-C", 400, Lof, "frameshift", vec![("DN", result(5, 1, true))]),
        ]
    }

    fn ids(rows: &[VariantRow]) -> Vec<&str> {
        rows.iter().map(|row| row.variant.variant_id.as_str()).collect()
    }

    #[test]
    fn test_initial_state() {
        let table = VariantTable::new(&CONFIG, variants());
        let state = table.initial_state().unwrap();
        assert_eq!(state.group, "DN");
        assert_eq!(state.sort, SortState::new("variant_id", SortOrder::Ascending));
        assert_eq!(ids(&state.rows), vec!["1-100-C-T", "1-300-A-G", "1-400-T-C"]);
        assert_eq!(state.filter.custom, json!({ "onlyInAnalysis": false }));
        assert_eq!(state.window.range(), (0, 19));
    }

    #[test]
    fn test_category_no_op_returns_input() {
        let rows = select_group(&variants().into_iter().map(Arc::new).collect::<Vec<_>>(), "DN");
        let filtered = apply_filter(rows.clone(), &FilterState::default(), None).unwrap();
        assert_eq!(filtered, rows);
    }

    #[test]
    fn test_category_and_search_filters() {
        let table = VariantTable::new(&CONFIG, variants());
        let state = table.initial_state().unwrap();

        let lof_only = FilterState::default().with_categories(CategorySet::none().with(ConsequenceCategory::Lof, true));
        let state = table.change_filter(state, lof_only).unwrap();
        assert_eq!(ids(&state.rows), vec!["1-100-C-T", "1-400-T-C"]);

        let search = state.filter.clone().with_search_text("FRAME");
        let state = table.change_filter(state, search).unwrap();
        assert_eq!(ids(&state.rows), vec!["1-400-T-C"]);

        let by_hgvs = FilterState::default().with_search_text("c.300");
        let state = table.change_filter(state, by_hgvs).unwrap();
        assert_eq!(ids(&state.rows), vec!["1-300-A-G"]);
    }

    #[test]
    fn test_rule_filter() {
        let table = VariantTable::new(&CONFIG, variants());
        let state = table.initial_state().unwrap();
        let filter = state.filter.clone().with_custom(json!({ "onlyInAnalysis": true }));
        let state = table.change_filter(state, filter).unwrap();
        assert_eq!(ids(&state.rows), vec!["1-300-A-G", "1-400-T-C"]);
    }

    #[test]
    fn test_malformed_custom_filter_propagates() {
        let table = VariantTable::new(&CONFIG, variants());
        let state = table.initial_state().unwrap();
        let filter = state.filter.clone().with_custom(json!({ "onlyInAnalysis": "yes" }));
        match table.change_filter(state, filter) {
            Err(Error::MalformedFilter(_)) => {}
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_injected_custom_filter() {
        let only_first = |rows: Vec<VariantRow>, _: &Value| -> Result<Vec<VariantRow>> {
            Ok(rows.into_iter().take(1).collect())
        };
        let table = VariantTable::new(&CONFIG, variants()).with_custom_filter(Box::new(only_first));
        let state = table.initial_state().unwrap();
        assert_eq!(state.rows.len(), 1);
    }

    #[test]
    fn test_sort_toggles_and_keeps_membership() {
        let table = VariantTable::new(&CONFIG, variants());
        let state = table.initial_state().unwrap();
        let before = {
            let mut ids = ids(&state.rows).into_iter().map(String::from).collect::<Vec<_>>();
            ids.sort();
            ids
        };

        let state = table.request_sort(state, "group_result.ac_case").unwrap();
        assert_eq!(state.sort.order, SortOrder::Descending);
        assert_eq!(ids(&state.rows), vec!["1-400-T-C", "1-300-A-G", "1-100-C-T"]);

        let state = table.request_sort(state, "group_result.ac_case").unwrap();
        assert_eq!(state.sort.order, SortOrder::Ascending);
        assert_eq!(ids(&state.rows), vec!["1-100-C-T", "1-300-A-G", "1-400-T-C"]);

        let state = table.request_sort(state, "consequence").unwrap();
        let mut after = ids(&state.rows).into_iter().map(String::from).collect::<Vec<_>>();
        after.sort();
        assert_eq!(after, before);
    }

    #[test]
    fn test_apply_sort() {
        let table = VariantTable::new(&CONFIG, variants());
        let state = table.initial_state().unwrap();
        let state = table.apply_sort(state, SortState::new("variant_id", SortOrder::Descending)).unwrap();
        assert_eq!(ids(&state.rows), vec!["1-400-T-C", "1-300-A-G", "1-100-C-T"]);
    }

    #[test]
    fn test_unknown_sort_column() {
        let table = VariantTable::new(&CONFIG, variants());
        let state = table.initial_state().unwrap();
        match table.request_sort(state, "nope") {
            Err(Error::UnknownColumn(key)) => assert_eq!(key, "nope"),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_change_group() {
        let table = VariantTable::new(&CONFIG, variants());
        let state = table.initial_state().unwrap();
        let state = table.change_group(state, "DBS").unwrap();
        assert_eq!(ids(&state.rows), vec!["1-200-G-A", "1-300-A-G"]);
        assert!(table.change_group(state, "SWE").is_err());
    }

    #[test]
    fn test_click_position() {
        let table = VariantTable::new(&CONFIG, variants());
        let state = table.initial_state().unwrap();
        let state = table.request_sort(state, "consequence").unwrap();

        let state = table.click_position(state, 350).unwrap();
        assert_eq!(state.sort, SortState::default());
        assert_eq!(state.position_index, 1);

        let state = table.click_position(state, 50).unwrap();
        assert_eq!(state.position_index, 0);
        let state = table.click_position(state, 1000).unwrap();
        assert_eq!(state.position_index, 2);
        assert_eq!(position_index(&[], 10), 0);
    }

    #[test]
    fn test_tracks() {
        let table = VariantTable::new(&CONFIG, variants());
        let state = table.initial_state().unwrap();
        let cases: Vec<String> = table.case_track(&state).into_iter().map(|v| v.variant_id).collect();
        assert_eq!(cases, vec!["1-300-A-G", "1-400-T-C"]);
        let controls = table.control_track(&state);
        assert_eq!(controls.len(), 2);
        assert_eq!(controls[0].allele_freq, Some(0.03));
        assert_eq!(table.window_track(&state).len(), 3);
    }

    #[test]
    fn test_visible_window_throttle() {
        let table = VariantTable::new(&CONFIG, variants());
        let start = Instant::now();
        let state = table.initial_state().unwrap();

        let state = table.visible_rows_changed(state, 1, 2, start);
        assert_eq!(state.window.range(), (1, 2));
        assert_eq!(ids(table.visible_rows(&state)), vec!["1-300-A-G", "1-400-T-C"]);

        let state = table.visible_rows_changed(state, 2, 40, start + Duration::from_millis(50));
        assert_eq!(state.window.range(), (1, 2));
        assert!(state.window.has_pending());

        let window = state.window.flush(start + Duration::from_millis(120));
        assert_eq!(window.range(), (2, 40));
        let state = TableState { window, ..state };
        assert_eq!(ids(table.visible_rows(&state)), vec!["1-400-T-C"]);
    }

    #[test]
    fn test_detail_group_order() {
        let table = VariantTable::new(&CONFIG, variants());
        let records = variants();
        let labels: Vec<String> = table.detail_group_results(&records[0]).into_iter().map(|(label, _)| label).collect();
        assert_eq!(labels, vec!["De novo", "Case control"]);
    }

    #[test]
    fn test_export_csv() {
        let table = VariantTable::new(&CONFIG, variants());
        let state = table.initial_state().unwrap();
        let csv = table.export_csv(&state);
        let mut lines = csv.split("\r\n");
        assert_eq!(
            lines.next(),
            Some("Variant ID,HGVSp/c,Consequence,AC Case,AN Case,AC Control,AN Control,AF Case,AF Control"),
        );
        assert_eq!(lines.next(), Some("1-100-C-T,c.100A>G,stop gained,0,100,3,100,0,0.03"));
        assert_eq!(csv.matches("\r\n").count(), 4);
    }
}
