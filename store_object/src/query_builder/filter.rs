//! Query filters
//!
//! A `QueryFilter` describes a predicate over an entity's JSON form. Field
//! names may use dots to reach nested objects (`customer.city`).

use crate::errors::FilterError;
use serde_json::Value;
use std::cmp::Ordering;

/// Query condition operators
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOperator {
    Eq,           // =
    Ne,           // !=
    Gt,           // >
    Gte,          // >=
    Lt,           // <
    Lte,          // <=
    Like,         // LIKE
    ILike,        // ILIKE (case insensitive)
    In,           // IN
    NotIn,        // NOT IN
    IsNull,       // IS NULL
    IsNotNull,    // IS NOT NULL
    ArrayOverlap, // && (array overlap)
}

/// Single filter condition
#[derive(Debug, Clone, PartialEq)]
pub struct QueryCondition {
    pub field: String,
    pub operator: QueryOperator,
    pub value: Option<Value>, // None for IS NULL/IS NOT NULL
}

/// Logical operators for combining conditions
#[derive(Debug, Clone, PartialEq)]
pub enum LogicalOperator {
    And,
    Or,
}

/// Query filter that can be nested
#[derive(Debug, Clone, PartialEq)]
pub enum QueryFilter {
    Condition(QueryCondition),
    Group {
        operator: LogicalOperator,
        filters: Vec<QueryFilter>,
    },
}

impl QueryFilter {
    /// Create a simple condition
    pub fn condition(field: &str, operator: QueryOperator, value: Option<Value>) -> Self {
        Self::Condition(QueryCondition {
            field: field.to_string(),
            operator,
            value,
        })
    }

    /// Create AND group
    pub fn and(filters: Vec<QueryFilter>) -> Self {
        Self::Group {
            operator: LogicalOperator::And,
            filters,
        }
    }

    /// Create OR group
    pub fn or(filters: Vec<QueryFilter>) -> Self {
        Self::Group {
            operator: LogicalOperator::Or,
            filters,
        }
    }

    /// Equal condition
    pub fn eq(field: &str, value: Value) -> Self {
        Self::condition(field, QueryOperator::Eq, Some(value))
    }

    /// Not equal condition
    pub fn ne(field: &str, value: Value) -> Self {
        Self::condition(field, QueryOperator::Ne, Some(value))
    }

    /// Greater than condition
    pub fn gt(field: &str, value: Value) -> Self {
        Self::condition(field, QueryOperator::Gt, Some(value))
    }

    /// Greater than or equal condition
    pub fn gte(field: &str, value: Value) -> Self {
        Self::condition(field, QueryOperator::Gte, Some(value))
    }

    /// Less than condition
    pub fn lt(field: &str, value: Value) -> Self {
        Self::condition(field, QueryOperator::Lt, Some(value))
    }

    /// Less than or equal condition
    pub fn lte(field: &str, value: Value) -> Self {
        Self::condition(field, QueryOperator::Lte, Some(value))
    }

    /// LIKE condition (`%` any run, `_` one character)
    pub fn like(field: &str, pattern: &str) -> Self {
        Self::condition(
            field,
            QueryOperator::Like,
            Some(Value::String(pattern.to_string())),
        )
    }

    /// ILIKE condition (case insensitive)
    pub fn ilike(field: &str, pattern: &str) -> Self {
        Self::condition(
            field,
            QueryOperator::ILike,
            Some(Value::String(pattern.to_string())),
        )
    }

    /// IN condition
    pub fn in_values(field: &str, values: Vec<Value>) -> Self {
        Self::condition(field, QueryOperator::In, Some(Value::Array(values)))
    }

    /// NOT IN condition
    pub fn not_in_values(field: &str, values: Vec<Value>) -> Self {
        Self::condition(field, QueryOperator::NotIn, Some(Value::Array(values)))
    }

    /// IS NULL condition
    pub fn is_null(field: &str) -> Self {
        Self::condition(field, QueryOperator::IsNull, None)
    }

    /// IS NOT NULL condition
    pub fn is_not_null(field: &str) -> Self {
        Self::condition(field, QueryOperator::IsNotNull, None)
    }

    /// Array field shares at least one element with `values`
    pub fn overlaps(field: &str, values: Vec<Value>) -> Self {
        Self::condition(field, QueryOperator::ArrayOverlap, Some(Value::Array(values)))
    }

    /// Check that every condition carries the operand its operator needs
    pub fn validate(&self) -> Result<(), FilterError> {
        match self {
            QueryFilter::Condition(condition) => condition.validate(),
            QueryFilter::Group { filters, .. } => filters.iter().try_for_each(Self::validate),
        }
    }

    /// Evaluate against a JSON record. An empty AND group matches
    /// everything, an empty OR group matches nothing.
    pub fn evaluate(&self, record: &Value) -> bool {
        match self {
            QueryFilter::Condition(condition) => condition.evaluate(record),
            QueryFilter::Group {
                operator: LogicalOperator::And,
                filters,
            } => filters.iter().all(|f| f.evaluate(record)),
            QueryFilter::Group {
                operator: LogicalOperator::Or,
                filters,
            } => filters.iter().any(|f| f.evaluate(record)),
        }
    }
}

impl QueryCondition {
    fn validate(&self) -> Result<(), FilterError> {
        if self.field.is_empty() {
            return Err(FilterError::EmptyField);
        }

        let operator = || format!("{:?}", self.operator);
        match (&self.operator, &self.value) {
            (QueryOperator::IsNull | QueryOperator::IsNotNull, _) => Ok(()),
            // `Eq`/`Ne` without a value mean IS NULL / IS NOT NULL
            (QueryOperator::Eq | QueryOperator::Ne, _) => Ok(()),
            (
                QueryOperator::In | QueryOperator::NotIn | QueryOperator::ArrayOverlap,
                Some(Value::Array(_)),
            ) => Ok(()),
            (QueryOperator::In | QueryOperator::NotIn | QueryOperator::ArrayOverlap, _) => {
                Err(FilterError::ExpectedArray {
                    field: self.field.clone(),
                    operator: operator(),
                })
            }
            (QueryOperator::Like | QueryOperator::ILike, Some(Value::String(_))) => Ok(()),
            (QueryOperator::Like | QueryOperator::ILike, _) => Err(FilterError::ExpectedString {
                field: self.field.clone(),
                operator: operator(),
            }),
            (_, Some(_)) => Ok(()),
            (_, None) => Err(FilterError::MissingValue {
                field: self.field.clone(),
                operator: operator(),
            }),
        }
    }

    fn evaluate(&self, record: &Value) -> bool {
        let field = lookup_field(record, &self.field).filter(|v| !v.is_null());

        match (&self.operator, field, &self.value) {
            (QueryOperator::IsNull, field, _) | (QueryOperator::Eq, field, None) => field.is_none(),
            (QueryOperator::IsNotNull, field, _) | (QueryOperator::Ne, field, None) => {
                field.is_some()
            }
            (_, None, _) => false,
            (_, Some(_), None) => false,
            (QueryOperator::Eq, Some(left), Some(right)) => values_equal(left, right),
            (QueryOperator::Ne, Some(left), Some(right)) => !values_equal(left, right),
            (QueryOperator::Gt, Some(left), Some(right)) => {
                compare_values(left, right) == Some(Ordering::Greater)
            }
            (QueryOperator::Gte, Some(left), Some(right)) => matches!(
                compare_values(left, right),
                Some(Ordering::Greater | Ordering::Equal)
            ),
            (QueryOperator::Lt, Some(left), Some(right)) => {
                compare_values(left, right) == Some(Ordering::Less)
            }
            (QueryOperator::Lte, Some(left), Some(right)) => matches!(
                compare_values(left, right),
                Some(Ordering::Less | Ordering::Equal)
            ),
            (QueryOperator::Like, Some(Value::String(text)), Some(Value::String(pattern))) => {
                like_match(text, pattern)
            }
            (QueryOperator::ILike, Some(Value::String(text)), Some(Value::String(pattern))) => {
                like_match(&text.to_lowercase(), &pattern.to_lowercase())
            }
            (QueryOperator::Like | QueryOperator::ILike, _, _) => false,
            (QueryOperator::In, Some(left), Some(Value::Array(values))) => {
                values.iter().any(|v| values_equal(left, v))
            }
            (QueryOperator::NotIn, Some(left), Some(Value::Array(values))) => {
                !values.iter().any(|v| values_equal(left, v))
            }
            (QueryOperator::ArrayOverlap, Some(Value::Array(items)), Some(Value::Array(values))) => {
                items
                    .iter()
                    .any(|item| values.iter().any(|v| values_equal(item, v)))
            }
            (QueryOperator::In | QueryOperator::NotIn | QueryOperator::ArrayOverlap, _, _) => {
                false
            }
        }
    }
}

/// Resolve a dotted field path inside a JSON object
fn lookup_field<'a>(record: &'a Value, field: &str) -> Option<&'a Value> {
    field
        .split('.')
        .try_fold(record, |current, segment| current.get(segment))
}

/// Numbers compare numerically so `1` equals `1.0`
fn values_equal(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => match (a.as_f64(), b.as_f64()) {
            (Some(a), Some(b)) => a == b,
            _ => a == b,
        },
        _ => left == right,
    }
}

fn compare_values(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

/// SQL LIKE semantics: `%` matches any run, `_` exactly one character
fn like_match(text: &str, pattern: &str) -> bool {
    let text: Vec<char> = text.chars().collect();
    let pattern: Vec<char> = pattern.chars().collect();

    let (mut t, mut p) = (0, 0);
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        if p < pattern.len() && (pattern[p] == '_' || pattern[p] == text[t]) {
            t += 1;
            p += 1;
        } else if p < pattern.len() && pattern[p] == '%' {
            backtrack = Some((p, t));
            p += 1;
        } else if let Some((star_p, star_t)) = backtrack {
            p = star_p + 1;
            t = star_t + 1;
            backtrack = Some((star_p, star_t + 1));
        } else {
            return false;
        }
    }

    pattern[p..].iter().all(|c| *c == '%')
}
