//! Transition gating predicates.
//!
//! A [`Condition`] is a `{field, operator, value}` triple evaluated against
//! the current record data. Conditions gate which transitions are visible
//! and eligible; they carry no side effects. The operator set is a closed
//! enum rather than string dispatch, so an unknown operator is a
//! deserialization error instead of a silent `false`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;

/// Comparison applied between a record field and the configured value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionOperator {
    Eq,
    Neq,
    Gt,
    Gte,
    Lt,
    Lte,
    In,
    NotIn,
}

impl fmt::Display for ConditionOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            Self::Eq => "==",
            Self::Neq => "!=",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::In => "in",
            Self::NotIn => "not in",
        };
        f.write_str(symbol)
    }
}

/// Lookup capability for record field values.
///
/// Implementations resolve dotted paths (`"owner.id"`) into nested objects
/// where the backing data supports it.
pub trait FieldValues {
    /// Resolve a field path to its current value, if present.
    fn field_value(&self, field: &str) -> Option<Value>;
}

impl FieldValues for HashMap<String, Value> {
    fn field_value(&self, field: &str) -> Option<Value> {
        lookup_path(|key| self.get(key), field)
    }
}

impl FieldValues for Map<String, Value> {
    fn field_value(&self, field: &str) -> Option<Value> {
        lookup_path(|key| self.get(key), field)
    }
}

fn lookup_path<'a, F>(root_get: F, path: &str) -> Option<Value>
where
    F: Fn(&str) -> Option<&'a Value>,
{
    let mut segments = path.split('.');
    let first = segments.next()?;
    let mut current = root_get(first)?;
    for segment in segments {
        current = current.as_object()?.get(segment)?;
    }
    Some(current.clone())
}

/// A single `{field, operator, value}` predicate.
///
/// # Example
///
/// ```rust
/// use trellis::condition::{Condition, ConditionOperator};
/// use serde_json::{json, Map};
///
/// let condition = Condition::new("amount", ConditionOperator::Gte, json!(1000));
///
/// let mut record = Map::new();
/// record.insert("amount".to_string(), json!(2500));
/// assert!(condition.evaluate(&record));
///
/// record.insert("amount".to_string(), json!(10));
/// assert!(!condition.evaluate(&record));
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub field: String,
    pub operator: ConditionOperator,
    pub value: Value,
}

impl Condition {
    pub fn new(field: impl Into<String>, operator: ConditionOperator, value: Value) -> Self {
        Self {
            field: field.into(),
            operator,
            value,
        }
    }

    /// Evaluate this predicate against record data.
    ///
    /// A missing field reads as JSON `null`. Ordering comparisons are
    /// defined for number/number and string/string pairs only; any other
    /// pairing evaluates to `false`.
    pub fn evaluate(&self, values: &impl FieldValues) -> bool {
        let actual = values.field_value(&self.field).unwrap_or(Value::Null);

        match self.operator {
            ConditionOperator::Eq => json_eq(&actual, &self.value),
            ConditionOperator::Neq => !json_eq(&actual, &self.value),
            ConditionOperator::Gt => {
                matches!(json_cmp(&actual, &self.value), Some(Ordering::Greater))
            }
            ConditionOperator::Gte => matches!(
                json_cmp(&actual, &self.value),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            ConditionOperator::Lt => {
                matches!(json_cmp(&actual, &self.value), Some(Ordering::Less))
            }
            ConditionOperator::Lte => matches!(
                json_cmp(&actual, &self.value),
                Some(Ordering::Less | Ordering::Equal)
            ),
            ConditionOperator::In => json_contains(&self.value, &actual),
            ConditionOperator::NotIn => !json_contains(&self.value, &actual),
        }
    }

    /// Human-readable form used in diagnostics ("amount >= 1000").
    pub fn describe(&self) -> String {
        format!("{} {} {}", self.field, self.operator, self.value)
    }
}

/// Evaluate a condition list with AND semantics. An empty list passes.
pub fn evaluate_all(conditions: &[Condition], values: &impl FieldValues) -> bool {
    conditions.iter().all(|condition| condition.evaluate(values))
}

/// Describe every condition in the list that does not hold.
///
/// Diagnostics collect all failures at once rather than stopping at the
/// first, so a caller can report the complete picture.
pub fn failed_conditions(conditions: &[Condition], values: &impl FieldValues) -> Vec<String> {
    conditions
        .iter()
        .filter(|condition| !condition.evaluate(values))
        .map(Condition::describe)
        .collect()
}

/// Equality with numeric cross-type tolerance (`1` equals `1.0`).
fn json_eq(a: &Value, b: &Value) -> bool {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

fn json_cmp(a: &Value, b: &Value) -> Option<Ordering> {
    if let (Some(x), Some(y)) = (a.as_f64(), b.as_f64()) {
        return x.partial_cmp(&y);
    }
    if let (Some(x), Some(y)) = (a.as_str(), b.as_str()) {
        return Some(x.cmp(y));
    }
    None
}

/// Membership test: `haystack` must be an array containing `needle`.
fn json_contains(haystack: &Value, needle: &Value) -> bool {
    haystack
        .as_array()
        .is_some_and(|items| items.iter().any(|item| json_eq(item, needle)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(entries: &[(&str, Value)]) -> Map<String, Value> {
        entries
            .iter()
            .map(|(key, value)| (key.to_string(), value.clone()))
            .collect()
    }

    #[test]
    fn eq_matches_identical_values() {
        let condition = Condition::new("status", ConditionOperator::Eq, json!("open"));
        assert!(condition.evaluate(&record(&[("status", json!("open"))])));
        assert!(!condition.evaluate(&record(&[("status", json!("closed"))])));
    }

    #[test]
    fn eq_tolerates_numeric_types() {
        let condition = Condition::new("count", ConditionOperator::Eq, json!(3));
        assert!(condition.evaluate(&record(&[("count", json!(3.0))])));
    }

    #[test]
    fn missing_field_reads_as_null() {
        let eq_null = Condition::new("ghost", ConditionOperator::Eq, Value::Null);
        assert!(eq_null.evaluate(&record(&[])));

        let gt = Condition::new("ghost", ConditionOperator::Gt, json!(1));
        assert!(!gt.evaluate(&record(&[])));
    }

    #[test]
    fn ordering_operators_compare_numbers() {
        let data = record(&[("amount", json!(1000))]);
        assert!(Condition::new("amount", ConditionOperator::Gte, json!(1000)).evaluate(&data));
        assert!(!Condition::new("amount", ConditionOperator::Gt, json!(1000)).evaluate(&data));
        assert!(Condition::new("amount", ConditionOperator::Lt, json!(2000)).evaluate(&data));
        assert!(Condition::new("amount", ConditionOperator::Lte, json!(1000)).evaluate(&data));
    }

    #[test]
    fn ordering_operators_compare_strings() {
        let data = record(&[("tier", json!("b"))]);
        assert!(Condition::new("tier", ConditionOperator::Gt, json!("a")).evaluate(&data));
        assert!(Condition::new("tier", ConditionOperator::Lt, json!("c")).evaluate(&data));
    }

    #[test]
    fn ordering_on_mixed_types_is_false() {
        let data = record(&[("amount", json!("high"))]);
        assert!(!Condition::new("amount", ConditionOperator::Gt, json!(1)).evaluate(&data));
        assert!(!Condition::new("amount", ConditionOperator::Lte, json!(1)).evaluate(&data));
    }

    #[test]
    fn in_checks_array_membership() {
        let condition = Condition::new(
            "stage",
            ConditionOperator::In,
            json!(["qualified", "won"]),
        );
        assert!(condition.evaluate(&record(&[("stage", json!("won"))])));
        assert!(!condition.evaluate(&record(&[("stage", json!("lost"))])));
    }

    #[test]
    fn not_in_is_the_complement() {
        let condition = Condition::new(
            "stage",
            ConditionOperator::NotIn,
            json!(["qualified", "won"]),
        );
        assert!(condition.evaluate(&record(&[("stage", json!("lost"))])));
        assert!(!condition.evaluate(&record(&[("stage", json!("won"))])));
    }

    #[test]
    fn in_with_non_array_value_is_false() {
        let condition = Condition::new("stage", ConditionOperator::In, json!("won"));
        assert!(!condition.evaluate(&record(&[("stage", json!("won"))])));
    }

    #[test]
    fn dotted_paths_reach_nested_objects() {
        let data = record(&[("owner", json!({"id": 7, "team": {"name": "emea"}}))]);
        let condition = Condition::new("owner.team.name", ConditionOperator::Eq, json!("emea"));
        assert!(condition.evaluate(&data));

        let missing = Condition::new("owner.team.region", ConditionOperator::Eq, json!("emea"));
        assert!(!missing.evaluate(&data));
    }

    #[test]
    fn empty_condition_list_passes() {
        assert!(evaluate_all(&[], &record(&[])));
    }

    #[test]
    fn failed_conditions_reports_every_failure() {
        let conditions = vec![
            Condition::new("amount", ConditionOperator::Gte, json!(1000)),
            Condition::new("status", ConditionOperator::Eq, json!("open")),
        ];
        let data = record(&[("amount", json!(10)), ("status", json!("closed"))]);

        let failures = failed_conditions(&conditions, &data);
        assert_eq!(failures.len(), 2);
        assert_eq!(failures[0], "amount >= 1000");
        assert_eq!(failures[1], "status == \"open\"");
    }

    #[test]
    fn operator_round_trips_through_serde() {
        let json = serde_json::to_string(&ConditionOperator::NotIn).unwrap();
        assert_eq!(json, "\"not_in\"");
        let back: ConditionOperator = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ConditionOperator::NotIn);
    }
}
