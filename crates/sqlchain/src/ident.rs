//! Back-tick identifier handling.
//!
//! [`Ident`] represents a table/column reference, supporting dotted notation.
//! Each segment is quoted independently, so `users.id` renders as
//! `` `users`.`id` `` and an existing quote such as `` `users`.id `` is
//! normalized to the same text. A `*` segment stays bare (`` `u`.* ``).
//!
//! # Example
//! ```
//! use sqlchain::Ident;
//!
//! assert_eq!(Ident::parse("shop.orders").to_string(), "`shop`.`orders`");
//! assert_eq!(Ident::parse("`u`.*").to_string(), "`u`.*");
//! ```

use regex::Regex;
use std::fmt;
use std::sync::LazyLock;

static LIST_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[,\s]+").expect("valid list separator pattern"));

/// A dotted SQL identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ident {
    pub parts: Vec<String>,
}

impl Ident {
    /// Parse a (possibly dotted, possibly back-ticked) identifier.
    ///
    /// Back-ticks are stripped; empty segments are dropped.
    pub fn parse(s: &str) -> Self {
        let parts = s
            .split('.')
            .map(|part| part.trim().replace('`', ""))
            .filter(|part| !part.is_empty())
            .collect();
        Self { parts }
    }

    /// Build `prefix.name`, each side parsed independently.
    pub fn qualified(prefix: &str, name: &str) -> Self {
        let mut ident = Self::parse(prefix);
        ident.parts.extend(Self::parse(name).parts);
        ident
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// The last segment (column name for `table.column`).
    pub fn name(&self) -> Option<&str> {
        self.parts.last().map(String::as_str)
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, part) in self.parts.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            if part == "*" {
                f.write_str("*")?;
            } else {
                write!(f, "`{part}`")?;
            }
        }
        Ok(())
    }
}

/// Quote a (possibly dotted) identifier.
pub fn quote(name: &str) -> String {
    Ident::parse(name).to_string()
}

/// Whether `s` is a plain column name: `[A-Za-z_][A-Za-z0-9_$]*`.
///
/// Plain names get quoted and prefixed in projection lists; anything else is
/// treated as a literal SQL expression.
pub fn is_plain_name(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c == '$' || c.is_ascii_alphanumeric())
}

/// Split a name list on commas and whitespace (`"id, created_at"`).
pub fn split_names(list: &str) -> impl Iterator<Item = &str> {
    LIST_SEPARATOR.split(list).filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quotes_each_segment() {
        assert_eq!(quote("users"), "`users`");
        assert_eq!(quote("users.id"), "`users`.`id`");
        assert_eq!(quote("`users`.id"), "`users`.`id`");
        assert_eq!(quote("u.*"), "`u`.*");
    }

    #[test]
    fn qualified_joins_prefix() {
        assert_eq!(Ident::qualified("join0", "name").to_string(), "`join0`.`name`");
        assert_eq!(Ident::qualified("", "name").to_string(), "`name`");
        assert_eq!(Ident::parse("a.b").name(), Some("b"));
    }

    #[test]
    fn name_lists_split_on_commas_and_spaces() {
        let names: Vec<_> = split_names(" id, created_at  owner,").collect();
        assert_eq!(names, ["id", "created_at", "owner"]);
    }

    #[test]
    fn plain_name_detection() {
        assert!(is_plain_name("price"));
        assert!(is_plain_name("_x$1"));
        assert!(!is_plain_name("1abc"));
        assert!(!is_plain_name("count(*)"));
        assert!(!is_plain_name("a.b"));
        assert!(!is_plain_name(""));
    }
}
