use serde_json::Value;
use std::cmp::Ordering;

use super::path::{lookup, to_pg_path};
use super::types::{FilterOrderInfo, SortDirection};

pub struct FilterOrder;

impl FilterOrder {
    /// Total order over JSON values used by the in-memory evaluator.
    ///
    /// Missing/null sorts first, then booleans, numbers, strings, arrays and
    /// objects. Strings compare by bytes, so fixed-width RFC 3339 timestamps
    /// sort chronologically.
    pub fn compare(a: Option<&Value>, b: Option<&Value>) -> Ordering {
        let rank_a = Self::type_rank(a);
        let rank_b = Self::type_rank(b);
        if rank_a != rank_b {
            return rank_a.cmp(&rank_b);
        }
        match (a, b) {
            (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
            (Some(Value::Number(x)), Some(Value::Number(y))) => {
                let x = x.as_f64().unwrap_or(0.0);
                let y = y.as_f64().unwrap_or(0.0);
                x.partial_cmp(&y).unwrap_or(Ordering::Equal)
            }
            (Some(Value::String(x)), Some(Value::String(y))) => x.as_bytes().cmp(y.as_bytes()),
            (Some(Value::Array(x)), Some(Value::Array(y))) => x.len().cmp(&y.len()),
            _ => Ordering::Equal,
        }
    }

    fn type_rank(value: Option<&Value>) -> u8 {
        match value {
            None | Some(Value::Null) => 0,
            Some(Value::Bool(_)) => 1,
            Some(Value::Number(_)) => 2,
            Some(Value::String(_)) => 3,
            Some(Value::Array(_)) => 4,
            Some(Value::Object(_)) => 5,
        }
    }

    /// Compares two documents by the configured sort key.
    pub fn compare_documents(info: &FilterOrderInfo, a: &Value, b: &Value) -> Ordering {
        let ordering = Self::compare(lookup(a, &info.field), lookup(b, &info.field));
        match info.sort {
            SortDirection::Asc => ordering,
            SortDirection::Desc => ordering.reverse(),
        }
    }

    /// ORDER BY clause for the JSONB documents table.
    ///
    /// The first key ranks JSON types the way `compare` does, with missing and
    /// null lowest. Numbers then sort numerically and scalars by their text
    /// under the "C" collation. Arrays and objects order by their text, which
    /// the in-memory evaluator does not reproduce.
    pub fn generate(info: Option<&FilterOrderInfo>) -> String {
        let Some(info) = info else { return String::new() };
        let path = to_pg_path(&info.field);
        let dir = info.sort.to_sql();
        let nulls = match info.sort {
            SortDirection::Asc => "NULLS FIRST",
            SortDirection::Desc => "NULLS LAST",
        };
        format!(
            "ORDER BY CASE jsonb_typeof(data #> '{path}') WHEN 'boolean' THEN 1 WHEN 'number' THEN 2 \
             WHEN 'string' THEN 3 WHEN 'array' THEN 4 WHEN 'object' THEN 5 ELSE 0 END {dir}, \
             CASE WHEN jsonb_typeof(data #> '{path}') = 'number' THEN (data #>> '{path}')::numeric END {dir} {nulls}, \
             (data #>> '{path}') COLLATE \"C\" {dir} {nulls}, id ASC"
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numbers_compare_numerically() {
        assert_eq!(FilterOrder::compare(Some(&json!(9)), Some(&json!(10))), Ordering::Less);
        assert_eq!(FilterOrder::compare(Some(&json!(2.5)), Some(&json!(2))), Ordering::Greater);
    }

    #[test]
    fn missing_sorts_before_everything() {
        assert_eq!(FilterOrder::compare(None, Some(&json!(0))), Ordering::Less);
        assert_eq!(FilterOrder::compare(Some(&Value::Null), Some(&json!(""))), Ordering::Less);
        assert_eq!(FilterOrder::compare(None, None), Ordering::Equal);
    }

    #[test]
    fn descending_reverses_document_order() {
        let info = FilterOrderInfo { field: "stats.points".to_string(), sort: SortDirection::Desc };
        let low = json!({ "stats": { "points": 5 } });
        let high = json!({ "stats": { "points": 50 } });
        assert_eq!(FilterOrder::compare_documents(&info, &high, &low), Ordering::Less);
    }

    #[test]
    fn generates_typed_order_clause() {
        let info = FilterOrderInfo { field: "startDate".to_string(), sort: SortDirection::Asc };
        let sql = FilterOrder::generate(Some(&info));
        assert!(sql.starts_with("ORDER BY CASE jsonb_typeof(data #> '{startDate}') WHEN 'boolean' THEN 1"));
        assert!(sql.contains("ELSE 0 END ASC,"));
        assert!(sql.contains("::numeric END ASC NULLS FIRST,"));
        assert!(sql.contains("COLLATE \"C\" ASC NULLS FIRST, id ASC"));
        assert!(FilterOrder::generate(None).is_empty());
    }

    #[test]
    fn descending_clause_puts_missing_values_last() {
        let info = FilterOrderInfo { field: "stats.points".to_string(), sort: SortDirection::Desc };
        let sql = FilterOrder::generate(Some(&info));
        assert!(sql.contains("ELSE 0 END DESC,"));
        assert!(sql.contains("::numeric END DESC NULLS LAST,"));
        assert!(sql.contains("COLLATE \"C\" DESC NULLS LAST, id ASC"));
        assert!(!sql.contains("NULLS FIRST"));
    }
}
