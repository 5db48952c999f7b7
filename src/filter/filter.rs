use serde_json::Value;

use super::error::FilterError;
use super::filter_order::FilterOrder;
use super::filter_where::FilterWhere;
use super::path::validate_field_path;
use super::types::{FilterOp, FilterOrderInfo, FilterWhereInfo, SortDirection, SqlParam, SqlResult};

/// Upper bound of the "starts with" range. Sorts after any character that
/// appears in ordinary text.
pub const PREFIX_RANGE_END: char = '\u{f8ff}';

/// Explicit query specification consumed by every store backend.
///
/// Conditions are a conjunction. At most one sort key is supported, matching
/// what the document store can order by without a composite index.
#[derive(Debug, Clone)]
pub struct Filter {
    collection: String,
    conditions: Vec<FilterWhereInfo>,
    order: Option<FilterOrderInfo>,
    offset: usize,
    limit: Option<usize>,
}

impl Filter {
    pub fn new(collection: impl Into<String>) -> Result<Self, FilterError> {
        let collection = collection.into();
        Self::validate_collection(&collection)?;
        Ok(Self {
            collection,
            conditions: vec![],
            order: None,
            offset: 0,
            limit: None,
        })
    }

    pub fn where_eq(&mut self, field: &str, value: Value) -> Result<&mut Self, FilterError> {
        self.condition(field, FilterOp::Eq, value)
    }

    pub fn where_gte(&mut self, field: &str, value: Value) -> Result<&mut Self, FilterError> {
        self.condition(field, FilterOp::Gte, value)
    }

    pub fn where_lte(&mut self, field: &str, value: Value) -> Result<&mut Self, FilterError> {
        self.condition(field, FilterOp::Lte, value)
    }

    /// `field` lexicographically within `[prefix, prefix + U+F8FF]`.
    pub fn where_prefix(&mut self, field: &str, prefix: &str) -> Result<&mut Self, FilterError> {
        self.where_gte(field, Value::String(prefix.to_string()))?;
        self.where_lte(field, Value::String(format!("{}{}", prefix, PREFIX_RANGE_END)))
    }

    pub fn condition(&mut self, field: &str, operator: FilterOp, data: Value) -> Result<&mut Self, FilterError> {
        validate_field_path(field)?;
        if matches!(data, Value::Array(_) | Value::Object(_)) && operator != FilterOp::Eq {
            return Err(FilterError::InvalidOperatorData(format!(
                "Range comparison on '{}' requires a scalar value",
                field
            )));
        }
        self.conditions.push(FilterWhereInfo { field: field.to_string(), operator, data });
        Ok(self)
    }

    pub fn order(&mut self, field: &str, sort: SortDirection) -> Result<&mut Self, FilterError> {
        validate_field_path(field)?;
        self.order = Some(FilterOrderInfo { field: field.to_string(), sort });
        Ok(self)
    }

    pub fn offset(&mut self, offset: usize) -> &mut Self {
        self.offset = offset;
        self
    }

    pub fn limit(&mut self, limit: usize) -> &mut Self {
        self.limit = Some(limit);
        self
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn conditions(&self) -> &[FilterWhereInfo] {
        &self.conditions
    }

    pub fn order_info(&self) -> Option<&FilterOrderInfo> {
        self.order.as_ref()
    }

    pub fn skip(&self) -> usize {
        self.offset
    }

    pub fn take(&self) -> Option<usize> {
        self.limit
    }

    /// Same conditions, no ordering and no paging. Used for totals.
    pub fn unpaged(&self) -> Self {
        Self {
            collection: self.collection.clone(),
            conditions: self.conditions.clone(),
            order: None,
            offset: 0,
            limit: None,
        }
    }

    pub fn matches(&self, doc: &Value) -> bool {
        FilterWhere::matches(&self.conditions, doc)
    }

    pub fn to_sql(&self) -> SqlResult {
        let (where_clause, where_params) = FilterWhere::generate(&self.conditions, 1);
        let mut params = vec![SqlParam::Text(self.collection.clone())];
        params.extend(where_params);

        let mut query = String::from("SELECT id, data FROM documents WHERE collection = $1");
        if !where_clause.is_empty() {
            query.push_str(" AND ");
            query.push_str(&where_clause);
        }

        let order_clause = FilterOrder::generate(self.order.as_ref());
        if !order_clause.is_empty() {
            query.push(' ');
            query.push_str(&order_clause);
        }

        if let Some(limit) = self.limit {
            params.push(SqlParam::Int(i64::try_from(limit).unwrap_or(i64::MAX)));
            query.push_str(&format!(" LIMIT ${}", params.len()));
        }
        if self.offset > 0 {
            params.push(SqlParam::Int(i64::try_from(self.offset).unwrap_or(i64::MAX)));
            query.push_str(&format!(" OFFSET ${}", params.len()));
        }

        SqlResult { query, params }
    }

    pub fn to_count_sql(&self) -> SqlResult {
        let (where_clause, where_params) = FilterWhere::generate(&self.conditions, 1);
        let mut params = vec![SqlParam::Text(self.collection.clone())];
        params.extend(where_params);

        let query = if where_clause.is_empty() {
            "SELECT COUNT(*) AS count FROM documents WHERE collection = $1".to_string()
        } else {
            format!("SELECT COUNT(*) AS count FROM documents WHERE collection = $1 AND {}", where_clause)
        };
        SqlResult { query, params }
    }

    fn validate_collection(name: &str) -> Result<(), FilterError> {
        let mut chars = name.chars();
        let valid_start = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_');
        if !valid_start || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(FilterError::InvalidCollection(format!("Invalid collection name format: {}", name)));
        }
        Ok(())
    }
}
