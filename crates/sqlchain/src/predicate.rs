//! Nested boolean predicates for WHERE and HAVING.
//!
//! A [`Predicate`] is a tree of AND/OR groups over condition text. The glue
//! defaults to `OR`; every nested list flips it, so a list of lists reads as
//! "any of these combinations":
//!
//! ```
//! use sqlchain::{Predicate, PredicateSource};
//!
//! let p = Predicate::from(vec!["a=1", "b=2"]);
//! assert_eq!(p.to_string(), "(a=1 OR b=2)");
//!
//! let nested = Predicate::from(PredicateSource::list(vec![vec!["a=1", "b=2"].into()]));
//! assert_eq!(nested.to_string(), "((a=1 AND b=2))");
//! ```
//!
//! Conditions built with [`Predicate::compare`] carry their values for the
//! driver instead of inlining them.

use crate::error::{ChainError, ChainResult};
use crate::ident::Ident;
use crate::template::Fragment;
use crate::value::Value;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;

/// Boolean connective of a predicate group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Glue {
    And,
    #[default]
    Or,
}

impl Glue {
    pub fn complement(self) -> Self {
        match self {
            Glue::And => Glue::Or,
            Glue::Or => Glue::And,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Glue::And => "AND",
            Glue::Or => "OR",
        }
    }
}

impl fmt::Display for Glue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Glue {
    type Err = ChainError;

    fn from_str(s: &str) -> ChainResult<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "AND" => Ok(Glue::And),
            "OR" => Ok(Glue::Or),
            other => Err(ChainError::validation(format!("unknown glue: {other}"))),
        }
    }
}

/// Predicate tree as written in a model definition.
///
/// In TOML: a string, a list (which flips the glue), or a
/// `{ type = "and", items = [...] }` group with its own glue.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum PredicateDef {
    Text(String),
    List(Vec<PredicateDef>),
    Group {
        #[serde(default, rename = "type")]
        glue: Option<String>,
        items: Vec<PredicateDef>,
    },
}

impl PredicateDef {
    /// Reject group `type`s other than `and`/`or`, at any depth.
    pub fn check(&self) -> ChainResult<()> {
        match self {
            PredicateDef::Text(_) => Ok(()),
            PredicateDef::List(items) => items.iter().try_for_each(PredicateDef::check),
            PredicateDef::Group { glue, items } => {
                if let Some(glue) = glue {
                    glue.parse::<Glue>().map_err(|_| {
                        ChainError::definition(format!("unknown predicate type: {glue}"))
                    })?;
                }
                items.iter().try_for_each(PredicateDef::check)
            }
        }
    }

    /// Group glue; an absent or unrecognized `type` means `OR`.
    fn glue(glue: &Option<String>) -> Glue {
        glue.as_deref()
            .and_then(|g| g.parse().ok())
            .unwrap_or_default()
    }
}

/// Input accepted by [`Predicate::new`].
#[derive(Debug, Clone)]
pub enum PredicateSource {
    /// Condition text, used verbatim.
    Text(String),
    /// Condition text with `?` placeholders and their values.
    Bound(Fragment),
    /// Children; nested lists use the complement glue.
    List(Vec<PredicateSource>),
    Descriptor(PredicateDef),
}

impl PredicateSource {
    pub fn list(items: Vec<PredicateSource>) -> Self {
        PredicateSource::List(items)
    }
}

impl From<&str> for PredicateSource {
    fn from(v: &str) -> Self {
        PredicateSource::Text(v.to_string())
    }
}

impl From<String> for PredicateSource {
    fn from(v: String) -> Self {
        PredicateSource::Text(v)
    }
}

impl From<Fragment> for PredicateSource {
    fn from(v: Fragment) -> Self {
        PredicateSource::Bound(v)
    }
}

impl From<Vec<&str>> for PredicateSource {
    fn from(v: Vec<&str>) -> Self {
        PredicateSource::List(v.into_iter().map(Into::into).collect())
    }
}

impl<const N: usize> From<[&str; N]> for PredicateSource {
    fn from(v: [&str; N]) -> Self {
        PredicateSource::List(v.into_iter().map(Into::into).collect())
    }
}

impl From<Vec<PredicateSource>> for PredicateSource {
    fn from(v: Vec<PredicateSource>) -> Self {
        PredicateSource::List(v)
    }
}

impl From<PredicateDef> for PredicateSource {
    fn from(v: PredicateDef) -> Self {
        PredicateSource::Descriptor(v)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Leaf(Fragment),
    Group { glue: Glue, children: Vec<Node> },
}

impl Node {
    fn from_source(source: PredicateSource, parent: Glue) -> Option<Node> {
        match source {
            PredicateSource::Text(text) => Some(Node::Leaf(Fragment::new(text.trim()))),
            PredicateSource::Bound(fragment) => Some(Node::Leaf(fragment)),
            PredicateSource::List(items) => {
                let glue = parent.complement();
                Some(Node::Group {
                    glue,
                    children: items
                        .into_iter()
                        .filter_map(|item| Node::from_source(item, glue))
                        .collect(),
                })
            }
            PredicateSource::Descriptor(def) => Node::from_def(def, parent),
        }
    }

    fn from_def(def: PredicateDef, parent: Glue) -> Option<Node> {
        match def {
            PredicateDef::Text(text) => Some(Node::Leaf(Fragment::new(text.trim()))),
            PredicateDef::List(items) => Node::from_source(
                PredicateSource::List(items.into_iter().map(Into::into).collect()),
                parent,
            ),
            PredicateDef::Group { glue, mut items } => match items.len() {
                0 => None,
                1 => Node::from_def(items.remove(0), parent),
                _ => {
                    let glue = PredicateDef::glue(&glue);
                    Some(Node::Group {
                        glue,
                        children: items
                            .into_iter()
                            .filter_map(|item| Node::from_def(item, glue))
                            .collect(),
                    })
                }
            },
        }
    }

    fn render(&self) -> Fragment {
        self.render_grouped().0
    }

    /// Rendered fragment, and whether it is enclosed in parentheses.
    fn render_grouped(&self) -> (Fragment, bool) {
        match self {
            Node::Leaf(fragment) => (fragment.clone(), false),
            Node::Group { glue, children } => {
                let parts: Vec<(Fragment, bool)> = children
                    .iter()
                    .map(|c| (c.render(), matches!(c, Node::Group { .. })))
                    .filter(|(f, _)| !f.is_empty())
                    .collect();
                let mut out = Fragment::default();
                let grouped = match parts.as_slice() {
                    [] => false,
                    [(only, is_group)] => {
                        if *is_group {
                            out.push("(").push_fragment(only).push(")");
                        } else {
                            out.push_fragment(only);
                        }
                        *is_group
                    }
                    many => {
                        let sep = format!(" {glue} ");
                        out.push("(");
                        for (i, (part, _)) in many.iter().enumerate() {
                            if i > 0 {
                                out.push(&sep);
                            }
                            out.push_fragment(part);
                        }
                        out.push(")");
                        true
                    }
                };
                (out, grouped)
            }
        }
    }
}

/// A WHERE/HAVING predicate tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    root: Node,
}

impl Predicate {
    /// Build a predicate; `glue` defaults to `OR`.
    pub fn new(source: impl Into<PredicateSource>, glue: Option<Glue>) -> Self {
        let glue = glue.unwrap_or_default();
        let children = match source.into() {
            PredicateSource::List(items) => items
                .into_iter()
                .filter_map(|item| Node::from_source(item, glue))
                .collect(),
            PredicateSource::Descriptor(PredicateDef::Group { glue: own, items }) => {
                let glue = PredicateDef::glue(&own);
                return Self {
                    root: Node::Group {
                        glue,
                        children: items
                            .into_iter()
                            .filter_map(|item| Node::from_def(item, glue))
                            .collect(),
                    },
                };
            }
            PredicateSource::Descriptor(PredicateDef::List(items)) => items
                .into_iter()
                .filter_map(|item| Node::from_def(item, glue))
                .collect(),
            other => Node::from_source(other, glue).into_iter().collect(),
        };
        Self {
            root: Node::Group { glue, children },
        }
    }

    /// `` `column` <op> ? `` with `value` bound by the driver.
    ///
    /// A `NULL` value with `=`/`!=`/`<>` becomes `IS [NOT] NULL`.
    pub fn compare(column: &str, op: &str, value: impl Into<Value>) -> Self {
        let column = Ident::parse(column);
        let op = op.trim().to_ascii_uppercase();
        let value = value.into();
        let fragment = match (op.as_str(), &value) {
            ("=", Value::Null) => Fragment::new(format!("{column} IS NULL")),
            ("!=" | "<>", Value::Null) => Fragment::new(format!("{column} IS NOT NULL")),
            _ => Fragment::with_params(format!("{column} {op} ?"), vec![value]),
        };
        Self::new(fragment, None)
    }

    /// Rendered text plus bound values in textual order.
    pub fn render(&self) -> Fragment {
        self.root.render()
    }

    pub fn is_empty(&self) -> bool {
        self.render().is_empty()
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render().sql)
    }
}

macro_rules! predicate_from_source {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Predicate {
                fn from(source: $ty) -> Self {
                    Predicate::new(source, None)
                }
            }
        )*
    };
}

predicate_from_source!(
    &str,
    String,
    Fragment,
    Vec<&str>,
    Vec<PredicateSource>,
    PredicateSource,
    PredicateDef,
);

impl<const N: usize> From<[&str; N]> for Predicate {
    fn from(source: [&str; N]) -> Self {
        Predicate::new(source, None)
    }
}

/// AND-combine several predicates, skipping empty ones.
///
/// With more than one operand, any that is not already a parenthesized group
/// is wrapped so its own `OR` cannot bind across the `AND`.
pub(crate) fn conjunction(predicates: &[Predicate]) -> Fragment {
    let parts: Vec<(Fragment, bool)> = predicates
        .iter()
        .map(|p| p.root.render_grouped())
        .filter(|(f, _)| !f.is_empty())
        .collect();
    let wrap = parts.len() > 1;

    let mut out = Fragment::default();
    for (i, (rendered, grouped)) in parts.iter().enumerate() {
        if i > 0 {
            out.push(" AND ");
        }
        if wrap && !grouped {
            out.push("(").push_fragment(rendered).push(")");
        } else {
            out.push_fragment(rendered);
        }
    }
    out
}
