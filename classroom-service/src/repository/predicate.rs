//! Predicate trees for filtering repository queries
//!
//! A [`Predicate`] is an immutable boolean expression over column references.
//! Entity composers build one per request (an AND of groups, each group usually
//! an OR of substring matches or a single equality) and the SQL realization
//! only happens when a query is executed.
//!
//! Column references are `&'static str` so that identifiers always come from
//! code, never from request input. Values are always bound as parameters.
//!
//! # Example
//!
//! ```rust
//! use classroom_service::repository::{FilterCondition, Predicate};
//!
//! let search = Predicate::any_contains(&["assignment.title", "assignment.content"], "alge");
//! let predicate = Predicate::and([
//!     search,
//!     Predicate::from(FilterCondition::eq("student.id", 7_i64)),
//! ]);
//! assert!(!predicate.is_always());
//! ```

use std::fmt;

use sqlx::{QueryBuilder, Sqlite};

/// Comparison operators for filter conditions
///
/// ```rust
/// use classroom_service::repository::FilterOperator;
///
/// assert_eq!(format!("{}", FilterOperator::Equal), "=");
/// assert_eq!(format!("{}", FilterOperator::Contains), "CONTAINS");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOperator {
    /// Equal to (=)
    Equal,
    /// Case-insensitive substring match
    Contains,
}

impl fmt::Display for FilterOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equal => write!(f, "="),
            Self::Contains => write!(f, "CONTAINS"),
        }
    }
}

/// A value that can be used in filter conditions
#[derive(Debug, Clone, PartialEq)]
pub enum FilterValue {
    /// String value
    String(String),
    /// 64-bit integer value
    Integer(i64),
}

impl From<&str> for FilterValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<String> for FilterValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for FilterValue {
    fn from(n: i64) -> Self {
        Self::Integer(n)
    }
}

/// A single comparison against one column
#[derive(Debug, Clone, PartialEq)]
pub struct FilterCondition {
    /// Qualified column reference, e.g. `student.email`
    pub field: &'static str,
    /// The comparison operator
    pub operator: FilterOperator,
    /// The value to compare against
    pub value: FilterValue,
}

impl FilterCondition {
    /// Create a new filter condition
    pub fn new(field: &'static str, operator: FilterOperator, value: FilterValue) -> Self {
        Self {
            field,
            operator,
            value,
        }
    }

    /// `field = value`
    pub fn eq(field: &'static str, value: impl Into<FilterValue>) -> Self {
        Self::new(field, FilterOperator::Equal, value.into())
    }

    /// Case-insensitive substring match of `needle` inside `field`
    pub fn contains(field: &'static str, needle: impl Into<String>) -> Self {
        Self::new(field, FilterOperator::Contains, FilterValue::String(needle.into()))
    }

    fn push_sql(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        match (self.operator, &self.value) {
            (FilterOperator::Equal, FilterValue::String(s)) => {
                qb.push(self.field).push(" = ").push_bind(s.clone());
            }
            (FilterOperator::Equal, FilterValue::Integer(n)) => {
                qb.push(self.field).push(" = ").push_bind(*n);
            }
            (FilterOperator::Contains, value) => {
                let needle = match value {
                    FilterValue::String(s) => s.clone(),
                    FilterValue::Integer(n) => n.to_string(),
                };
                qb.push("LOWER(")
                    .push(self.field)
                    .push(") LIKE LOWER(")
                    .push_bind(format!("%{}%", escape_like(&needle)))
                    .push(") ESCAPE '\\'");
            }
        }
    }
}

/// Escape LIKE wildcards so user text matches literally under `ESCAPE '\'`
pub fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for ch in input.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

/// Immutable boolean expression over column references
///
/// An empty `And` is vacuously true and an empty `Or` is vacuously false.
/// The constructors [`Predicate::and`] and [`Predicate::or`] flatten nested
/// groups of the same kind and drop vacuous members, so absent filters leave
/// no trace in the generated SQL.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// All members must hold
    And(Vec<Predicate>),
    /// At least one member must hold
    Or(Vec<Predicate>),
    /// A single column comparison
    Condition(FilterCondition),
}

impl Predicate {
    /// The predicate that matches every row
    pub fn always() -> Self {
        Self::And(Vec::new())
    }

    /// Conjunction of `members`
    pub fn and(members: impl IntoIterator<Item = Predicate>) -> Self {
        let mut flat = Vec::new();
        for member in members {
            match member {
                Self::And(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        Self::collapse(flat, Self::And)
    }

    /// Disjunction of `members`
    pub fn or(members: impl IntoIterator<Item = Predicate>) -> Self {
        let mut flat = Vec::new();
        for member in members {
            match member {
                Self::Or(inner) => flat.extend(inner),
                other => flat.push(other),
            }
        }
        Self::collapse(flat, Self::Or)
    }

    /// Case-insensitive substring match of `needle` across any of `fields`
    pub fn any_contains(fields: &[&'static str], needle: &str) -> Self {
        Self::or(
            fields
                .iter()
                .map(|&field| Self::Condition(FilterCondition::contains(field, needle))),
        )
    }

    /// Whether this predicate places no constraint on the rows
    pub fn is_always(&self) -> bool {
        matches!(self, Self::And(members) if members.is_empty())
    }

    fn collapse(mut members: Vec<Predicate>, group: fn(Vec<Predicate>) -> Predicate) -> Self {
        if members.len() == 1 {
            if let Some(only) = members.pop() {
                return only;
            }
        }
        group(members)
    }

    /// Append this predicate as SQL to `qb`
    pub fn push_sql(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        match self {
            Self::Condition(condition) => condition.push_sql(qb),
            Self::And(members) if members.is_empty() => {
                qb.push("1 = 1");
            }
            Self::Or(members) if members.is_empty() => {
                qb.push("1 = 0");
            }
            Self::And(members) => push_group(qb, members, " AND "),
            Self::Or(members) => push_group(qb, members, " OR "),
        }
    }

    /// Append ` WHERE <predicate>` to `qb`, or nothing when unconstrained
    pub fn push_where(&self, qb: &mut QueryBuilder<'_, Sqlite>) {
        if self.is_always() {
            return;
        }
        qb.push(" WHERE ");
        self.push_sql(qb);
    }
}

fn push_group(qb: &mut QueryBuilder<'_, Sqlite>, members: &[Predicate], joiner: &str) {
    qb.push("(");
    for (index, member) in members.iter().enumerate() {
        if index > 0 {
            qb.push(joiner);
        }
        member.push_sql(qb);
    }
    qb.push(")");
}

impl From<FilterCondition> for Predicate {
    fn from(condition: FilterCondition) -> Self {
        Self::Condition(condition)
    }
}
