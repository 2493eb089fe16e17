//! Column assignments for INSERT ... SET and UPDATE ... SET.

use crate::ident::{self, Ident};
use crate::value::{is_numeric, Value};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::fmt;

/// Right-hand side of an assignment.
#[derive(Debug, Clone, PartialEq)]
pub enum Assign {
    /// Raw SQL expression, spliced as-is (`married+1`, `NOW()`, `?`).
    Expr(String),
    /// Literal value, rendered as an SQL literal.
    Value(Value),
}

impl Assign {
    pub fn expr(sql: impl Into<String>) -> Self {
        Assign::Expr(sql.into())
    }

    /// A bare `?` bound by the driver at execute time.
    pub fn bind() -> Self {
        Assign::Expr("?".to_string())
    }
}

impl fmt::Display for Assign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Assign::Expr(sql) => f.write_str(sql),
            Assign::Value(v) => f.write_str(&v.to_literal()),
        }
    }
}

macro_rules! assign_from_value {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Assign {
                fn from(v: $ty) -> Self {
                    Assign::Value(v.into())
                }
            }
        )*
    };
}

assign_from_value!(Value, bool, i32, i64, u32, f64, &str, String);

/// One `<set name="...">expr</set>` style definition entry.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SetDef {
    pub name: String,
    /// Raw SQL expression.
    pub value: String,
}

/// Input accepted by [`Assignments::add`].
#[derive(Debug, Clone)]
pub enum AssignSource {
    Pairs(Vec<(String, Assign)>),
    Descriptor(Vec<SetDef>),
}

impl<K: Into<String>, V: Into<Assign>> From<Vec<(K, V)>> for AssignSource {
    fn from(pairs: Vec<(K, V)>) -> Self {
        AssignSource::Pairs(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl<K: Into<String>, V: Into<Assign>, const N: usize> From<[(K, V); N]> for AssignSource {
    fn from(pairs: [(K, V); N]) -> Self {
        AssignSource::Pairs(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

impl From<Vec<SetDef>> for AssignSource {
    fn from(defs: Vec<SetDef>) -> Self {
        AssignSource::Descriptor(defs)
    }
}

impl From<&[SetDef]> for AssignSource {
    fn from(defs: &[SetDef]) -> Self {
        AssignSource::Descriptor(defs.to_vec())
    }
}

/// Ordered `column → expression` map with a standing protection filter.
///
/// Protected columns are dropped when added, so call [`protect`](Self::protect)
/// before [`add`](Self::add).
///
/// ```
/// use sqlchain::Assignments;
///
/// let mut set = Assignments::new();
/// set.protect(["id"]).add([("id", 5), ("age", 30)]);
/// assert_eq!(set.to_string(), "`age`=30");
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Assignments {
    entries: Vec<(String, Assign)>,
    protected: BTreeSet<String>,
}

impl Assignments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Protect columns from later `add` calls. Each item may itself be a
    /// comma/space separated list.
    pub fn protect<I, S>(&mut self, names: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for list in names {
            for name in ident::split_names(list.as_ref()) {
                self.protected.insert(name.to_string());
            }
        }
        self
    }

    pub fn is_protected(&self, column: &str) -> bool {
        self.protected.contains(column)
    }

    pub fn add(&mut self, source: impl Into<AssignSource>) -> &mut Self {
        match source.into() {
            AssignSource::Pairs(pairs) => {
                for (column, value) in pairs {
                    self.insert(column, value);
                }
            }
            AssignSource::Descriptor(defs) => {
                for def in defs {
                    self.insert(def.name, Assign::Expr(def.value));
                }
            }
        }
        self
    }

    /// Set one column; protected, empty or numeric names are ignored.
    pub fn set(&mut self, column: impl Into<String>, value: impl Into<Assign>) -> &mut Self {
        self.insert(column.into(), value.into());
        self
    }

    fn insert(&mut self, column: String, value: Assign) {
        let column = column.trim().to_string();
        if column.is_empty() || is_numeric(&column) || self.protected.contains(&column) {
            return;
        }
        match self.entries.iter_mut().find(|(c, _)| *c == column) {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((column, value)),
        }
    }

    pub fn get(&self, column: &str) -> Option<&Assign> {
        self.entries
            .iter()
            .find(|(c, _)| c == column)
            .map(|(_, v)| v)
    }

    pub fn remove(&mut self, column: &str) -> Option<Assign> {
        let idx = self.entries.iter().position(|(c, _)| c == column)?;
        Some(self.entries.remove(idx).1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Assign)> {
        self.entries.iter().map(|(c, v)| (c.as_str(), v))
    }
}

impl fmt::Display for Assignments {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (column, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}={value}", Ident::parse(column))?;
        }
        Ok(())
    }
}
