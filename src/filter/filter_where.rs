use serde_json::Value;
use std::cmp::Ordering;

use super::filter_order::FilterOrder;
use super::path::{lookup, to_pg_path};
use super::types::{FilterOp, FilterWhereInfo, SqlParam};

pub struct FilterWhere;

impl FilterWhere {
    /// In-memory evaluation of a conjunction of conditions.
    pub fn matches(conditions: &[FilterWhereInfo], doc: &Value) -> bool {
        conditions.iter().all(|condition| Self::matches_one(condition, doc))
    }

    fn matches_one(condition: &FilterWhereInfo, doc: &Value) -> bool {
        let actual = lookup(doc, &condition.field);
        match condition.operator {
            FilterOp::Eq => actual == Some(&condition.data),
            // Range operators only match values of the same JSON type, as a
            // document store range scan would.
            FilterOp::Gte => Self::same_type(actual, &condition.data)
                && FilterOrder::compare(actual, Some(&condition.data)) != Ordering::Less,
            FilterOp::Lte => Self::same_type(actual, &condition.data)
                && FilterOrder::compare(actual, Some(&condition.data)) != Ordering::Greater,
        }
    }

    fn same_type(actual: Option<&Value>, expected: &Value) -> bool {
        matches!(
            (actual, expected),
            (Some(Value::String(_)), Value::String(_))
                | (Some(Value::Number(_)), Value::Number(_))
                | (Some(Value::Bool(_)), Value::Bool(_))
        )
    }

    /// WHERE fragment for the JSONB documents table. `start_index` is the
    /// number of parameters already bound (the collection name is `$1`).
    pub fn generate(conditions: &[FilterWhereInfo], start_index: usize) -> (String, Vec<SqlParam>) {
        let mut clauses = Vec::with_capacity(conditions.len());
        let mut params = Vec::with_capacity(conditions.len());

        for condition in conditions {
            let index = start_index + params.len() + 1;
            let path = to_pg_path(&condition.field);
            let (clause, param) = match (&condition.operator, &condition.data) {
                (FilterOp::Eq, data) => (
                    format!("data #> '{}' = ${}::jsonb", path, index),
                    SqlParam::Json(data.clone()),
                ),
                (op, Value::String(s)) => (
                    format!(
                        "jsonb_typeof(data #> '{path}') = 'string' AND (data #>> '{path}') COLLATE \"C\" {} ${index}::text",
                        Self::comparison(op)
                    ),
                    SqlParam::Text(s.clone()),
                ),
                (op, data) => (
                    format!(
                        "jsonb_typeof(data #> '{path}') = jsonb_typeof(${index}::jsonb) AND data #> '{path}' {} ${index}::jsonb",
                        Self::comparison(op)
                    ),
                    SqlParam::Json(data.clone()),
                ),
            };
            clauses.push(clause);
            params.push(param);
        }

        (clauses.join(" AND "), params)
    }

    fn comparison(op: &FilterOp) -> &'static str {
        match op {
            FilterOp::Eq => "=",
            FilterOp::Gte => ">=",
            FilterOp::Lte => "<=",
        }
    }
}
