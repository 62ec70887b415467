//! Conjunctive filter predicate over the `movies` table.
//!
//! Each present criterion becomes one SQL fragment that references a
//! positional placeholder (`$1`, `$2`, ...) and one bound value. User input
//! never appears in fragment text.

use movies_core::filter::FilterCriteria;
use movies_core::movie::canonical_genre;
use sqlx::postgres::PgArguments;
use sqlx::query::{QueryAs, QueryScalar};
use sqlx::Postgres;

/// Typed value bound to one placeholder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindValue {
    Int(i32),
    Text(String),
}

/// One `fragment` / `value` pair of the predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Condition {
    pub fragment: String,
    pub value: BindValue,
}

/// Ordered list of conditions combined with `AND`.
///
/// An empty predicate is the universal (unfiltered) condition.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Predicate {
    conditions: Vec<Condition>,
}

impl Predicate {
    /// Build the predicate for already-validated criteria.
    ///
    /// Condition order is fixed: title, genre, year.
    pub fn from_criteria(criteria: &FilterCriteria) -> Self {
        let mut predicate = Self::default();

        if let Some(ref title) = criteria.title {
            let idx = predicate.next_bind_index();
            predicate.push(
                format!("title ILIKE ${idx}"),
                BindValue::Text(format!("%{}%", escape_like(title))),
            );
        }

        if let Some(ref genre) = criteria.genre {
            let idx = predicate.next_bind_index();
            predicate.push(
                format!("genres @> ARRAY[${idx}::TEXT]"),
                BindValue::Text(canonical_genre(genre).to_string()),
            );
        }

        if let Some(year) = criteria.year {
            let idx = predicate.next_bind_index();
            predicate.push(format!("year = ${idx}"), BindValue::Int(year));
        }

        predicate
    }

    fn push(&mut self, fragment: String, value: BindValue) {
        self.conditions.push(Condition { fragment, value });
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// Placeholder index available for binds appended after the predicate.
    pub fn next_bind_index(&self) -> usize {
        self.conditions.len() + 1
    }

    /// `WHERE a AND b ...`, or an empty string when unfiltered.
    pub fn where_clause(&self) -> String {
        if self.conditions.is_empty() {
            return String::new();
        }
        let fragments: Vec<&str> = self
            .conditions
            .iter()
            .map(|c| c.fragment.as_str())
            .collect();
        format!("WHERE {}", fragments.join(" AND "))
    }

    /// Bind every condition value, in order, to a `QueryAs`.
    pub fn bind_query_as<'q, O>(
        &'q self,
        mut q: QueryAs<'q, Postgres, O, PgArguments>,
    ) -> QueryAs<'q, Postgres, O, PgArguments> {
        for condition in &self.conditions {
            q = match &condition.value {
                BindValue::Int(v) => q.bind(*v),
                BindValue::Text(v) => q.bind(v.as_str()),
            };
        }
        q
    }

    /// Bind every condition value, in order, to a `QueryScalar`.
    pub fn bind_query_scalar<'q, O>(
        &'q self,
        mut q: QueryScalar<'q, Postgres, O, PgArguments>,
    ) -> QueryScalar<'q, Postgres, O, PgArguments> {
        for condition in &self.conditions {
            q = match &condition.value {
                BindValue::Int(v) => q.bind(*v),
                BindValue::Text(v) => q.bind(v.as_str()),
            };
        }
        q
    }
}

/// Escape `LIKE` metacharacters so the value matches literally.
///
/// PostgreSQL's default `LIKE` escape character is the backslash.
pub fn escape_like(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
