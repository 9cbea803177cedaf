//! Filter criteria and pagination for repository queries.

use rusqlite::types::Value;

use crate::error::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Eq,
    Gt,
    Ge,
    Lt,
    Le,
}

impl Op {
    fn as_sql(self) -> &'static str {
        match self {
            Op::Eq => "=",
            Op::Gt => ">",
            Op::Ge => ">=",
            Op::Lt => "<",
            Op::Le => "<=",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Clause {
    Compare(String, Op, Value),
    In(String, Vec<Value>),
    IsNull(String),
    NotNull(String),
}

impl Clause {
    fn column(&self) -> &str {
        match self {
            Clause::Compare(c, _, _)
            | Clause::In(c, _)
            | Clause::IsNull(c)
            | Clause::NotNull(c) => c,
        }
    }
}

/// Conjunction of column predicates.
///
/// ```
/// use entity_store::Criteria;
///
/// let open_deals = Criteria::new()
///     .eq("signed", true)
///     .gt("remaining_amount", 0_i64);
/// assert!(!open_deals.is_empty());
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Criteria {
    clauses: Vec<Clause>,
}

impl Criteria {
    pub fn new() -> Self {
        Self::default()
    }

    fn compare(mut self, column: &str, op: Op, value: Value) -> Self {
        self.clauses.push(Clause::Compare(column.to_owned(), op, value));
        self
    }

    pub fn eq(self, column: &str, value: impl Into<Value>) -> Self {
        self.compare(column, Op::Eq, value.into())
    }

    pub fn gt(self, column: &str, value: impl Into<Value>) -> Self {
        self.compare(column, Op::Gt, value.into())
    }

    pub fn ge(self, column: &str, value: impl Into<Value>) -> Self {
        self.compare(column, Op::Ge, value.into())
    }

    pub fn lt(self, column: &str, value: impl Into<Value>) -> Self {
        self.compare(column, Op::Lt, value.into())
    }

    pub fn le(self, column: &str, value: impl Into<Value>) -> Self {
        self.compare(column, Op::Le, value.into())
    }

    /// `column` equals one of `values`. An empty list matches nothing.
    pub fn is_in<V: Into<Value>>(
        mut self,
        column: &str,
        values: impl IntoIterator<Item = V>,
    ) -> Self {
        let values = values.into_iter().map(Into::into).collect();
        self.clauses.push(Clause::In(column.to_owned(), values));
        self
    }

    pub fn is_null(mut self, column: &str) -> Self {
        self.clauses.push(Clause::IsNull(column.to_owned()));
        self
    }

    pub fn not_null(mut self, column: &str) -> Self {
        self.clauses.push(Clause::NotNull(column.to_owned()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.clauses.is_empty()
    }

    /// Render a `WHERE` clause (empty when there are no predicates) and the
    /// values bound to its placeholders. Columns outside `columns` are rejected.
    pub(crate) fn to_sql(
        &self,
        entity: &'static str,
        columns: &[&str],
    ) -> Result<(String, Vec<Value>), StoreError> {
        if self.clauses.is_empty() {
            return Ok((String::new(), Vec::new()));
        }

        let mut parts = Vec::with_capacity(self.clauses.len());
        let mut values = Vec::new();
        for clause in &self.clauses {
            let column = clause.column();
            if column != "id" && !columns.contains(&column) {
                return Err(StoreError::UnknownColumn {
                    entity,
                    column: column.to_owned(),
                });
            }
            match clause {
                Clause::Compare(_, op, value) => {
                    values.push(value.clone());
                    parts.push(format!("{column} {} ?{}", op.as_sql(), values.len()));
                }
                Clause::In(_, members) => {
                    let mut placeholders = Vec::with_capacity(members.len());
                    for member in members {
                        values.push(member.clone());
                        placeholders.push(format!("?{}", values.len()));
                    }
                    parts.push(format!("{column} IN ({})", placeholders.join(", ")));
                }
                Clause::IsNull(_) => parts.push(format!("{column} IS NULL")),
                Clause::NotNull(_) => parts.push(format!("{column} IS NOT NULL")),
            }
        }
        Ok((format!(" WHERE {}", parts.join(" AND ")), values))
    }
}

/// Slice of an ordered result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    /// `None` means no upper bound.
    pub limit: Option<u64>,
    pub offset: u64,
}

impl Page {
    pub fn new(limit: u64, offset: u64) -> Self {
        Self {
            limit: Some(limit),
            offset,
        }
    }

    pub fn all() -> Self {
        Self {
            limit: None,
            offset: 0,
        }
    }

    pub(crate) fn to_sql(self) -> String {
        // SQLite reads a negative LIMIT as "no limit".
        let limit = self.limit.map_or(-1, |l| i64::try_from(l).unwrap_or(i64::MAX));
        let offset = i64::try_from(self.offset).unwrap_or(i64::MAX);
        format!(" LIMIT {limit} OFFSET {offset}")
    }
}

impl Default for Page {
    fn default() -> Self {
        Self::all()
    }
}
