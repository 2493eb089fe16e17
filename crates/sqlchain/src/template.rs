//! Placeholder template expansion.
//!
//! Templates mix two levels of parameterization:
//!
//! | token | argument            | output                                   |
//! |-------|---------------------|------------------------------------------|
//! | `?n`  | text                | back-tick quoted identifier              |
//! | `?p`  | text or [`Fragment`]| spliced verbatim (fragment values kept)  |
//! | `?u`  | [`Assignments`]     | `` `col`=expr,... ``                     |
//! | `?s`  | value or text       | quoted SQL literal                       |
//! | `?i`  | integer             | integer literal                          |
//! | `?a`  | list of values      | comma-joined literals (`NULL` when empty)|
//! | `?`   | optional value      | passed through; a value joins `params`   |
//!
//! Bare `?` arguments are all-or-nothing: either the argument list covers only
//! the builder tokens and the driver values arrive later, or it covers every
//! placeholder and each bare `?` value lands in [`Fragment::params`] in textual
//! order.
//!
//! # Example
//! ```
//! use sqlchain::template::parse;
//!
//! let frag = parse("SELECT * FROM ?n WHERE ?n = ?", vec!["users".into(), "id".into()])?;
//! assert_eq!(frag.sql, "SELECT * FROM `users` WHERE `id` = ?");
//! # Ok::<(), sqlchain::ChainError>(())
//! ```

use crate::assign::Assignments;
use crate::error::{ChainError, ChainResult};
use crate::ident;
use crate::value::Value;
use std::fmt;

/// Rendered SQL text plus the values the driver binds to its bare `?`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Fragment {
    pub sql: String,
    pub params: Vec<Value>,
}

impl Fragment {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    pub fn with_params(sql: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }

    /// Append raw SQL (no parameters).
    pub fn push(&mut self, sql: &str) -> &mut Self {
        self.sql.push_str(sql);
        self
    }

    /// Append another fragment, keeping its values in textual order.
    pub fn push_fragment(&mut self, other: &Fragment) -> &mut Self {
        self.sql.push_str(&other.sql);
        self.params.extend(other.params.iter().cloned());
        self
    }

    /// Append a bare `?` and its value.
    pub fn push_bind(&mut self, value: impl Into<Value>) -> &mut Self {
        self.sql.push('?');
        self.params.push(value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.sql.trim().is_empty()
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.sql)
    }
}

impl From<&str> for Fragment {
    fn from(sql: &str) -> Self {
        Fragment::new(sql)
    }
}

impl From<String> for Fragment {
    fn from(sql: String) -> Self {
        Fragment::new(sql)
    }
}

/// A positional template argument.
#[derive(Debug, Clone)]
pub enum Arg {
    Text(String),
    Sql(Fragment),
    Set(Assignments),
    Value(Value),
    List(Vec<Value>),
}

impl Arg {
    fn kind(&self) -> &'static str {
        match self {
            Arg::Text(_) => "text",
            Arg::Sql(_) => "fragment",
            Arg::Set(_) => "assignment set",
            Arg::Value(_) => "value",
            Arg::List(_) => "list",
        }
    }
}

impl From<&str> for Arg {
    fn from(v: &str) -> Self {
        Arg::Text(v.to_string())
    }
}

impl From<String> for Arg {
    fn from(v: String) -> Self {
        Arg::Text(v)
    }
}

impl From<&String> for Arg {
    fn from(v: &String) -> Self {
        Arg::Text(v.clone())
    }
}

impl From<Fragment> for Arg {
    fn from(v: Fragment) -> Self {
        Arg::Sql(v)
    }
}

impl From<Assignments> for Arg {
    fn from(v: Assignments) -> Self {
        Arg::Set(v)
    }
}

impl From<Value> for Arg {
    fn from(v: Value) -> Self {
        Arg::Value(v)
    }
}

impl From<i64> for Arg {
    fn from(v: i64) -> Self {
        Arg::Value(Value::Int(v))
    }
}

impl From<Vec<Value>> for Arg {
    fn from(v: Vec<Value>) -> Self {
        Arg::List(v)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Token {
    Name,
    Splice,
    Update,
    Str,
    Int,
    Array,
}

impl Token {
    fn from_char(c: char) -> Option<Self> {
        match c {
            'n' => Some(Token::Name),
            'p' => Some(Token::Splice),
            'u' => Some(Token::Update),
            's' => Some(Token::Str),
            'i' => Some(Token::Int),
            'a' => Some(Token::Array),
            _ => None,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Token::Name => "?n",
            Token::Splice => "?p",
            Token::Update => "?u",
            Token::Str => "?s",
            Token::Int => "?i",
            Token::Array => "?a",
        }
    }
}

enum Piece<'a> {
    Raw(&'a str),
    Token(Token),
    Bind,
}

fn split(template: &str) -> Vec<Piece<'_>> {
    let mut pieces = Vec::new();
    let mut last = 0;
    let bytes = template.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'?' {
            if let Some(token) = bytes.get(i + 1).and_then(|&b| Token::from_char(b as char)) {
                if last < i {
                    pieces.push(Piece::Raw(&template[last..i]));
                }
                pieces.push(Piece::Token(token));
                i += 2;
                last = i;
                continue;
            }
            if last < i {
                pieces.push(Piece::Raw(&template[last..i]));
            }
            pieces.push(Piece::Bind);
            last = i + 1;
        }
        i += 1;
    }
    if last < template.len() {
        pieces.push(Piece::Raw(&template[last..]));
    }
    pieces
}

/// Count the builder-level tokens (`?n`, `?p`, ...) in a template.
pub fn placeholder_count(template: &str) -> usize {
    split(template)
        .iter()
        .filter(|p| matches!(p, Piece::Token(_)))
        .count()
}

/// Expand `template` with positional `args`.
///
/// Every builder-level token consumes exactly one argument. Bare `?` consumes
/// one only when `args` also covers the bare placeholders; that argument must
/// be a value and is appended to [`Fragment::params`]. A count mismatch or an
/// argument of the wrong kind is a [`ChainError::Template`] and no SQL is
/// produced.
pub fn parse(template: &str, args: Vec<Arg>) -> ChainResult<Fragment> {
    let pieces = split(template);
    let expected = pieces
        .iter()
        .filter(|p| matches!(p, Piece::Token(_)))
        .count();
    let binds = pieces.iter().filter(|p| matches!(p, Piece::Bind)).count();
    let bind_inline = binds > 0 && args.len() == expected + binds;
    if expected != args.len() && !bind_inline {
        return Err(ChainError::template(format!(
            "Number of args ({}) doesn't match number of placeholders ({expected}) in [{template}]",
            args.len()
        )));
    }

    let mut out = Fragment::default();
    let mut args = args.into_iter();
    for piece in pieces {
        let token = match piece {
            Piece::Raw(text) => {
                out.push(text);
                continue;
            }
            Piece::Bind if !bind_inline => {
                out.push("?");
                continue;
            }
            Piece::Bind => {
                match args.next() {
                    Some(Arg::Value(value)) => out.push_bind(value),
                    Some(other) => {
                        return Err(ChainError::template(format!(
                            "? cannot take a {} argument in [{template}]",
                            other.kind()
                        )));
                    }
                    None => {
                        return Err(ChainError::template(format!(
                            "Missing argument for ? in [{template}]"
                        )));
                    }
                };
                continue;
            }
            Piece::Token(token) => token,
        };
        let Some(arg) = args.next() else {
            return Err(ChainError::template(format!(
                "Missing argument for {} in [{template}]",
                token.as_str()
            )));
        };
        expand(token, arg, &mut out, template)?;
    }
    Ok(out)
}

fn expand(token: Token, arg: Arg, out: &mut Fragment, template: &str) -> ChainResult<()> {
    let mismatch = |arg: &Arg| {
        ChainError::template(format!(
            "{} cannot take a {} argument in [{template}]",
            token.as_str(),
            arg.kind()
        ))
    };

    match (token, arg) {
        (Token::Name, Arg::Text(name)) => {
            out.push(&ident::quote(&name));
        }
        (Token::Splice, Arg::Text(raw)) => {
            out.push(&raw);
        }
        (Token::Splice, Arg::Sql(fragment)) => {
            out.push_fragment(&fragment);
        }
        (Token::Update, Arg::Set(set)) => {
            out.push(&set.to_string());
        }
        (Token::Str, Arg::Text(text)) => {
            out.push(&Value::Text(text).to_literal());
        }
        (Token::Str, Arg::Value(value)) => {
            out.push(&value.to_literal());
        }
        (Token::Int, Arg::Value(value)) => match value {
            Value::Null => {
                out.push("NULL");
            }
            other => {
                let Some(i) = other.as_i64() else {
                    return Err(mismatch(&Arg::Value(other)));
                };
                out.push(&i.to_string());
            }
        },
        (Token::Int, Arg::Text(text)) => {
            let Ok(i) = text.trim().parse::<i64>() else {
                return Err(ChainError::template(format!(
                    "?i expects an integer, got '{text}' in [{template}]"
                )));
            };
            out.push(&i.to_string());
        }
        (Token::Array, Arg::List(values)) => {
            if values.is_empty() {
                out.push("NULL");
            } else {
                let joined = values
                    .iter()
                    .map(Value::to_literal)
                    .collect::<Vec<_>>()
                    .join(",");
                out.push(&joined);
            }
        }
        (_, arg) => return Err(mismatch(&arg)),
    }
    Ok(())
}
