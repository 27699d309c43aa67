use std::collections::HashMap;

use serde_json::Value;

use super::error::FilterError;

/// Comparison emitted for a single bound parameter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    ILike,
}

impl FilterOp {
    pub fn to_sql(&self) -> &'static str {
        match self {
            FilterOp::Eq => "=",
            FilterOp::ILike => "ILIKE",
        }
    }
}

/// Query parameters recognised by list operations. Anything else is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterKey {
    Make,
    Status,
    UnitColor,
    Category,
    Supplier,
    Role,
    Search,
}

impl FilterKey {
    /// Fixed evaluation order; clause and parameter positions follow it.
    pub const ALL: [FilterKey; 7] = [
        FilterKey::Make,
        FilterKey::Status,
        FilterKey::UnitColor,
        FilterKey::Category,
        FilterKey::Supplier,
        FilterKey::Role,
        FilterKey::Search,
    ];

    pub fn param_name(&self) -> &'static str {
        match self {
            FilterKey::Make => "make",
            FilterKey::Status => "status",
            FilterKey::UnitColor => "unit_color",
            FilterKey::Category => "category",
            FilterKey::Supplier => "supplier",
            FilterKey::Role => "role",
            FilterKey::Search => "search",
        }
    }
}

/// Static description of which filter keys a table answers to.
#[derive(Debug)]
pub struct FilterColumns {
    pub table: &'static str,
    /// Equality filters: key -> column
    pub columns: &'static [(FilterKey, &'static str)],
    /// Columns OR-ed together by the `search` key
    pub search: Option<(&'static str, &'static str)>,
}

impl FilterColumns {
    pub fn column_for(&self, key: FilterKey) -> Option<&'static str> {
        self.columns
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, column)| *column)
    }
}

/// Raw list parameters as received on the query string
#[derive(Debug, Clone, Default)]
pub struct FilterData {
    pub params: HashMap<String, String>,
}

impl FilterData {
    pub fn new(params: HashMap<String, String>) -> Self {
        Self { params }
    }

    /// Value for a recognised key, skipping absent and blank entries
    pub fn value(&self, key: FilterKey) -> Option<&str> {
        self.params
            .get(key.param_name())
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    pub fn limit(&self) -> Result<Option<i64>, FilterError> {
        Self::parse_number(self.params.get("limit"))
            .map_err(|raw| FilterError::InvalidLimit(format!("'{}' is not a number", raw)))
    }

    pub fn offset(&self) -> Result<Option<i64>, FilterError> {
        Self::parse_number(self.params.get("offset"))
            .map_err(|raw| FilterError::InvalidOffset(format!("'{}' is not a number", raw)))
    }

    fn parse_number(raw: Option<&String>) -> Result<Option<i64>, String> {
        match raw.map(|s| s.trim()).filter(|s| !s.is_empty()) {
            None => Ok(None),
            Some(s) => s.parse::<i64>().map(Some).map_err(|_| s.to_string()),
        }
    }
}

impl From<HashMap<String, String>> for FilterData {
    fn from(params: HashMap<String, String>) -> Self {
        Self::new(params)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterWhereInfo {
    pub column: &'static str,
    pub operator: FilterOp,
    pub data: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub enum FilterCondition {
    Field(FilterWhereInfo),
    /// Parenthesised OR group
    AnyOf(Vec<FilterWhereInfo>),
}

/// Descending sort column; lists only ever read newest first
#[derive(Debug, Clone)]
pub struct FilterOrderInfo {
    pub column: &'static str,
}

#[derive(Debug, Clone)]
pub struct SqlResult {
    pub query: String,
    pub params: Vec<Value>,
}
