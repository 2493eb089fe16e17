//! JOIN clauses bound to a foreign-key link.

use crate::error::{ChainError, ChainResult};
use crate::fields::{FieldDef, FieldSource, Fields};
use crate::ident::Ident;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Join flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinKind {
    #[default]
    Inner,
    Left,
    Right,
    Full,
    Cross,
}

impl JoinKind {
    pub fn as_str(self) -> &'static str {
        match self {
            JoinKind::Inner => "INNER",
            JoinKind::Left => "LEFT",
            JoinKind::Right => "RIGHT",
            JoinKind::Full => "FULL",
            JoinKind::Cross => "CROSS",
        }
    }
}

impl fmt::Display for JoinKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JoinKind {
    type Err = ChainError;

    fn from_str(s: &str) -> ChainResult<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "" | "INNER" => Ok(JoinKind::Inner),
            "LEFT" => Ok(JoinKind::Left),
            "RIGHT" => Ok(JoinKind::Right),
            "FULL" => Ok(JoinKind::Full),
            "CROSS" => Ok(JoinKind::Cross),
            other => Err(ChainError::validation(format!("unknown join type: {other}"))),
        }
    }
}

/// A table as declared in a model definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TableRef {
    pub name: String,
    #[serde(default)]
    pub primary: String,
    #[serde(default)]
    pub fields: Vec<FieldDef>,
}

impl TableRef {
    pub fn new(name: impl Into<String>, primary: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            primary: primary.into(),
            fields: Vec::new(),
        }
    }

    pub fn with_fields(mut self, fields: Vec<FieldDef>) -> Self {
        self.fields = fields;
        self
    }
}

/// One `<KIND> JOIN` clause.
///
/// ```
/// use sqlchain::{Join, JoinKind, TableRef};
///
/// let join = Join::new(JoinKind::Left, &TableRef::new("groups", "id"), "g");
/// assert_eq!(
///     join.render("users.group"),
///     "LEFT JOIN `groups` AS `g` ON `g`.`id`=`users`.`group`"
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Join {
    kind: JoinKind,
    table: String,
    primary: String,
    alias: String,
    fields: Fields,
}

impl Join {
    /// The caller supplies the alias (see [`Query::link`](crate::Query::link)
    /// for the generated `joinN` names).
    pub fn new(kind: JoinKind, table: &TableRef, alias: impl Into<String>) -> Self {
        let alias = alias.into();
        let fields = Fields::with_prefix(table.fields.as_slice(), &alias);
        Self {
            kind,
            table: table.name.clone(),
            primary: table.primary.clone(),
            alias,
            fields,
        }
    }

    pub fn kind(&self) -> JoinKind {
        self.kind
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    /// Table and primary key are both known.
    pub fn is_complete(&self) -> bool {
        !self.table.is_empty() && !self.primary.is_empty()
    }

    /// Render against `link` (a `table.column` reference); empty text when
    /// table, primary key or link is missing.
    pub fn render(&self, link: &str) -> String {
        let link = Ident::parse(link);
        if !self.is_complete() || link.is_empty() {
            return String::new();
        }
        format!(
            "{} JOIN {} AS {} ON {}={link}",
            self.kind,
            Ident::parse(&self.table),
            Ident::parse(&self.alias),
            Ident::qualified(&self.alias, &self.primary),
        )
    }

    /// Add fields selected from the joined table, prefixed with the alias.
    pub fn fields(&mut self, extra: impl Into<FieldSource>) -> &Fields {
        let alias = self.alias.clone();
        self.fields.add(extra, Some(&alias))
    }

    pub fn projection(&self) -> &Fields {
        &self.fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn renders_quoted_link_segments() {
        let join = Join::new(JoinKind::Inner, &TableRef::new("orders", "id"), "o");
        assert_eq!(
            join.render("`items`.order_id"),
            "INNER JOIN `orders` AS `o` ON `o`.`id`=`items`.`order_id`"
        );
    }

    #[test]
    fn incomplete_join_renders_empty() {
        let no_primary = Join::new(JoinKind::Left, &TableRef::new("orders", ""), "o");
        assert_eq!(no_primary.render("a.b"), "");
        assert!(!no_primary.is_complete());

        let ok = Join::new(JoinKind::Left, &TableRef::new("orders", "id"), "o");
        assert_eq!(ok.render(""), "");
    }

    #[test]
    fn table_fields_are_prefixed_with_alias() {
        let table = TableRef::new("groups", "id").with_fields(vec![
            FieldDef::new("title"),
            FieldDef::new("secret").hidden(),
        ]);
        let mut join = Join::new(JoinKind::Left, &table, "join0");
        assert_eq!(join.projection().to_string(), "`join0`.`title`");
        let fields = join.fields("rank");
        assert_eq!(fields.to_string(), "`join0`.`title`,`join0`.`rank`");
    }

    #[test]
    fn kind_parsing() {
        assert_eq!("left".parse::<JoinKind>().unwrap(), JoinKind::Left);
        assert_eq!("".parse::<JoinKind>().unwrap(), JoinKind::Inner);
        assert!("sideways".parse::<JoinKind>().is_err());
    }
}
