use serde_json::Value;

use super::error::FilterError;
use super::filter_order::FilterOrder;
use super::filter_where::FilterWhere;
use super::types::{FilterColumns, FilterCondition, FilterData, FilterOrderInfo, SqlResult};

/// Builds one parameterised `SELECT` against a table described by
/// [`FilterColumns`]. Identifiers only ever come from that static map.
pub struct Filter {
    table_name: &'static str,
    columns: &'static FilterColumns,
    conditions: Vec<FilterCondition>,
    id: Option<i64>,
    order_data: Vec<FilterOrderInfo>,
    limit: Option<i64>,
    offset: Option<i64>,
}

impl Filter {
    pub fn new(columns: &'static FilterColumns) -> Result<Self, FilterError> {
        Self::validate_identifier(columns.table)
            .map_err(|_| FilterError::InvalidTableName(columns.table.to_string()))?;
        for (_, column) in columns.columns {
            Self::validate_identifier(column)?;
        }
        if let Some((first, second)) = columns.search {
            Self::validate_identifier(first)?;
            Self::validate_identifier(second)?;
        }
        Ok(Self {
            table_name: columns.table,
            columns,
            conditions: vec![],
            id: None,
            order_data: FilterOrder::newest_first(),
            limit: None,
            offset: None,
        })
    }

    pub fn assign(&mut self, data: &FilterData) -> Result<&mut Self, FilterError> {
        self.conditions = FilterWhere::parse(data, self.columns);
        if let Some(limit) = data.limit()? {
            self.limit(limit, data.offset()?)?;
        } else if let Some(offset) = data.offset()? {
            if offset < 0 { return Err(FilterError::InvalidOffset("Offset must be non-negative".to_string())); }
            self.offset = Some(offset);
        }
        Ok(self)
    }

    /// Primary-key lookup: drops ordering and paging
    pub fn where_id(&mut self, id: i64) -> &mut Self {
        self.id = Some(id);
        self.order_data.clear();
        self.limit = None;
        self.offset = None;
        self
    }

    pub fn limit(&mut self, limit: i64, offset: Option<i64>) -> Result<&mut Self, FilterError> {
        if limit < 0 { return Err(FilterError::InvalidLimit("Limit must be non-negative".to_string())); }
        if let Some(off) = offset { if off < 0 { return Err(FilterError::InvalidOffset("Offset must be non-negative".to_string())); } }

        // Apply max limit from config
        let max_limit = crate::config::CONFIG.filter.max_limit.unwrap_or(i64::MAX);
        let applied_limit = if limit > max_limit {
            if crate::config::CONFIG.filter.debug_logging {
                tracing::warn!("Limit {} exceeds max {}, capping to max", limit, max_limit);
            }
            max_limit
        } else {
            limit
        };

        self.limit = Some(applied_limit);
        self.offset = offset;
        Ok(self)
    }

    pub fn to_sql(&self) -> SqlResult {
        let (where_clause, mut params) = self.build_where();
        let order_clause = FilterOrder::generate(&self.order_data);
        let limit_clause = self.build_limit_clause(&mut params);

        let query = [
            "SELECT *".to_string(),
            format!("FROM \"{}\"", self.table_name),
            format!("WHERE {}", where_clause),
            order_clause,
            limit_clause,
        ].into_iter().filter(|s| !s.is_empty()).collect::<Vec<_>>().join(" ");

        SqlResult { query, params }
    }

    pub fn to_count_sql(&self) -> SqlResult {
        let (where_clause, params) = self.build_where();
        SqlResult {
            query: format!("SELECT COUNT(*) AS count FROM \"{}\" WHERE {}", self.table_name, where_clause),
            params,
        }
    }

    fn build_where(&self) -> (String, Vec<Value>) {
        match self.id {
            Some(id) => ("\"id\" = $1".to_string(), vec![Value::from(id)]),
            None => FilterWhere::generate(&self.conditions, 0),
        }
    }

    fn build_limit_clause(&self, params: &mut Vec<Value>) -> String {
        let mut parts = vec![];
        if let Some(limit) = self.limit {
            params.push(Value::from(limit));
            parts.push(format!("LIMIT ${}", params.len()));
        }
        if let Some(offset) = self.offset {
            params.push(Value::from(offset));
            parts.push(format!("OFFSET ${}", params.len()));
        }
        parts.join(" ")
    }

    fn validate_identifier(name: &str) -> Result<(), FilterError> {
        let mut chars = name.chars();
        let valid_start = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_');
        if !valid_start || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(FilterError::InvalidColumn(format!("Invalid identifier format: {}", name)));
        }
        Ok(())
    }
}
