use serde_json::Value;

use super::types::{FilterColumns, FilterCondition, FilterData, FilterKey, FilterOp, FilterWhereInfo};

pub struct FilterWhere {
    param_values: Vec<Value>,
    param_index: usize,
}

impl FilterWhere {
    pub fn new(starting_param_index: usize) -> Self {
        Self {
            param_values: vec![],
            param_index: starting_param_index,
        }
    }

    /// Turn raw list parameters into conditions, walking the whitelist in
    /// fixed order. Keys the table does not map and blank values are dropped.
    pub fn parse(data: &FilterData, columns: &FilterColumns) -> Vec<FilterCondition> {
        let mut conditions = vec![];
        for key in FilterKey::ALL {
            let Some(value) = data.value(key) else { continue };

            if key == FilterKey::Search {
                if let Some((first, second)) = columns.search {
                    let pattern = Value::String(format!("%{}%", escape_like(value)));
                    conditions.push(FilterCondition::AnyOf(vec![
                        FilterWhereInfo { column: first, operator: FilterOp::ILike, data: pattern.clone() },
                        FilterWhereInfo { column: second, operator: FilterOp::ILike, data: pattern },
                    ]));
                }
                continue;
            }

            if let Some(column) = columns.column_for(key) {
                conditions.push(FilterCondition::Field(FilterWhereInfo {
                    column,
                    operator: FilterOp::Eq,
                    data: Value::String(value.to_string()),
                }));
            }
        }
        conditions
    }

    /// Render `1=1 AND ...` with `$n` placeholders starting after
    /// `starting_param_index`.
    pub fn generate(conditions: &[FilterCondition], starting_param_index: usize) -> (String, Vec<Value>) {
        let mut filter_where = Self::new(starting_param_index);
        let mut clauses = vec!["1=1".to_string()];
        for condition in conditions {
            clauses.push(filter_where.build_sql_condition(condition));
        }
        (clauses.join(" AND "), filter_where.param_values)
    }

    fn build_sql_condition(&mut self, condition: &FilterCondition) -> String {
        match condition {
            FilterCondition::Field(info) => self.build_comparison(info),
            FilterCondition::AnyOf(infos) => {
                let parts: Vec<String> = infos.iter().map(|info| self.build_comparison(info)).collect();
                format!("({})", parts.join(" OR "))
            }
        }
    }

    fn build_comparison(&mut self, info: &FilterWhereInfo) -> String {
        format!("\"{}\" {} {}", info.column, info.operator.to_sql(), self.param(info.data.clone()))
    }

    fn param(&mut self, value: Value) -> String {
        self.param_values.push(value);
        self.param_index += 1;
        format!("${}", self.param_index)
    }
}

/// Escape LIKE metacharacters so user input only ever matches literally
pub fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
