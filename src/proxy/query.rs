use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use std::fmt::Write as _;

/// Bytes left untouched when encoding a filter value, matching what browsers
/// leave alone in a URI component.
const COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Asc,
    Desc,
}

impl Direction {
    fn as_str(self) -> &'static str {
        match self {
            Direction::Asc => "asc",
            Direction::Desc => "desc",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Clause {
    Select(Vec<&'static str>),
    Equals {
        column: &'static str,
        value: String,
    },
    /// Array column contains the single value
    ArrayContains {
        column: &'static str,
        value: String,
    },
    OrderBy {
        column: &'static str,
        direction: Direction,
    },
}

/// A read query against one PostgREST table. Clauses render in insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostgrestQuery {
    table: &'static str,
    clauses: Vec<Clause>,
}

impl PostgrestQuery {
    pub fn table(table: &'static str) -> Self {
        Self {
            table,
            clauses: Vec::new(),
        }
    }

    pub fn select(mut self, columns: &[&'static str]) -> Self {
        self.clauses.push(Clause::Select(columns.to_vec()));
        self
    }

    pub fn eq(mut self, column: &'static str, value: impl Into<String>) -> Self {
        self.clauses.push(Clause::Equals {
            column,
            value: value.into(),
        });
        self
    }

    pub fn contains(mut self, column: &'static str, value: impl Into<String>) -> Self {
        self.clauses.push(Clause::ArrayContains {
            column,
            value: value.into(),
        });
        self
    }

    pub fn order(mut self, column: &'static str, direction: Direction) -> Self {
        self.clauses.push(Clause::OrderBy { column, direction });
        self
    }

    /// Adds an equality clause only when a value is present
    pub fn eq_opt(self, column: &'static str, value: Option<&str>) -> Self {
        match value {
            Some(value) => self.eq(column, value),
            None => self,
        }
    }

    /// Adds an array-contains clause only when a value is present
    pub fn contains_opt(self, column: &'static str, value: Option<&str>) -> Self {
        match value {
            Some(value) => self.contains(column, value),
            None => self,
        }
    }

    pub fn table_name(&self) -> &'static str {
        self.table
    }

    pub fn clauses(&self) -> &[Clause] {
        &self.clauses
    }

    /// Render the query string, including the leading `?`
    pub fn render(&self) -> String {
        let mut out = String::new();
        for (i, clause) in self.clauses.iter().enumerate() {
            out.push(if i == 0 { '?' } else { '&' });
            // Writing into a String cannot fail.
            let _ = match clause {
                Clause::Select(columns) => write!(out, "select={}", columns.join(",")),
                Clause::Equals { column, value } => write!(out, "{column}=eq.{}", encode(value)),
                Clause::ArrayContains { column, value } => {
                    write!(out, "{column}=cs.{{{}}}", encode(value))
                }
                Clause::OrderBy { column, direction } => {
                    write!(out, "order={column}.{}", direction.as_str())
                }
            };
        }
        out
    }
}

fn encode(value: &str) -> String {
    utf8_percent_encode(value, COMPONENT).to_string()
}
