//! Projection lists for SELECT statements.
//!
//! [`Fields`] accepts three notations, all normalized to the same entries:
//!
//! - text: `"id, price AS theprice, max(term) AS `maxterm`"`
//! - a list of `(alias, expression)` pairs
//! - field definitions ([`FieldDef`]) as loaded from a model file, which can
//!   additionally mark fields hidden, protected or linked to another model
//!
//! Plain column names are back-tick quoted and, when a prefix is given,
//! qualified with it. Everything else is kept as literal SQL.

use crate::ident::{self, Ident};
use regex::Regex;
use serde::Deserialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::LazyLock;

static INLINE_ALIAS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)^(.+)\s+AS\s+(\S+)$").expect("valid inline alias pattern")
});

/// A field definition from a model's table.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct FieldDef {
    /// Name the field is selected as.
    pub name: String,
    /// Column or expression; empty means the column is `name` itself.
    #[serde(default)]
    pub expr: String,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub protected: bool,
    /// Model this field references (a foreign key).
    #[serde(default)]
    pub link: Option<String>,
}

impl FieldDef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn expr(mut self, expr: impl Into<String>) -> Self {
        self.expr = expr.into();
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn protected(mut self) -> Self {
        self.protected = true;
        self
    }

    pub fn link(mut self, model: impl Into<String>) -> Self {
        self.link = Some(model.into());
        self
    }
}

/// Input accepted by [`Fields::add`].
#[derive(Debug, Clone)]
pub enum FieldSource {
    /// Comma separated entries, each optionally `<expr> AS <alias>`.
    Text(String),
    /// `(alias, expression)` pairs; `None` aliases are positional.
    List(Vec<(Option<String>, String)>),
    Descriptor(Vec<FieldDef>),
}

impl From<&str> for FieldSource {
    fn from(v: &str) -> Self {
        FieldSource::Text(v.to_string())
    }
}

impl From<String> for FieldSource {
    fn from(v: String) -> Self {
        FieldSource::Text(v)
    }
}

impl From<&String> for FieldSource {
    fn from(v: &String) -> Self {
        FieldSource::Text(v.clone())
    }
}

impl From<Vec<&str>> for FieldSource {
    fn from(v: Vec<&str>) -> Self {
        FieldSource::List(v.into_iter().map(|e| (None, e.to_string())).collect())
    }
}

impl<const N: usize> From<[&str; N]> for FieldSource {
    fn from(v: [&str; N]) -> Self {
        FieldSource::List(v.into_iter().map(|e| (None, e.to_string())).collect())
    }
}

impl<const N: usize> From<[(&str, &str); N]> for FieldSource {
    fn from(v: [(&str, &str); N]) -> Self {
        FieldSource::List(
            v.into_iter()
                .map(|(alias, expr)| (Some(alias.to_string()), expr.to_string()))
                .collect(),
        )
    }
}

impl From<Vec<(Option<String>, String)>> for FieldSource {
    fn from(v: Vec<(Option<String>, String)>) -> Self {
        FieldSource::List(v)
    }
}

impl From<Vec<FieldDef>> for FieldSource {
    fn from(v: Vec<FieldDef>) -> Self {
        FieldSource::Descriptor(v)
    }
}

impl From<&[FieldDef]> for FieldSource {
    fn from(v: &[FieldDef]) -> Self {
        FieldSource::Descriptor(v.to_vec())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Alias {
    name: String,
    quoted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Field {
    alias: Option<Alias>,
    /// Rendered expression (already quoted/prefixed when plain).
    expr: String,
    /// Unquoted input name, used for hiding positional entries.
    source: String,
}

impl Field {
    fn lookup_name(&self) -> &str {
        self.alias.as_ref().map_or(&self.source, |a| &a.name)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.alias {
            None => f.write_str(&self.expr),
            Some(Alias { name, quoted: true }) => write!(f, "{} AS `{name}`", self.expr),
            Some(Alias { name, quoted: false }) => write!(f, "{} AS {name}", self.expr),
        }
    }
}

/// Ordered, aliasable, filterable projection list.
///
/// ```
/// use sqlchain::Fields;
///
/// let fields = Fields::from("id, price AS theprice");
/// assert_eq!(fields.to_string(), "`id`,`price` AS theprice");
/// assert_eq!(Fields::new().to_string(), "*");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fields {
    entries: Vec<Field>,
    hidden: BTreeSet<String>,
    protected: BTreeSet<String>,
    linked: BTreeMap<String, String>,
}

impl Fields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a set with every plain name qualified by `prefix`.
    pub fn with_prefix(source: impl Into<FieldSource>, prefix: &str) -> Self {
        let mut fields = Self::new();
        fields.add(source, Some(prefix));
        fields
    }

    pub fn add(&mut self, source: impl Into<FieldSource>, prefix: Option<&str>) -> &mut Self {
        match source.into() {
            FieldSource::Text(text) => {
                for entry in text.split(',') {
                    self.add_entry(None, entry, prefix);
                }
            }
            FieldSource::List(pairs) => {
                for (alias, expr) in pairs {
                    self.add_entry(alias.as_deref(), &expr, prefix);
                }
            }
            FieldSource::Descriptor(defs) => {
                for def in defs {
                    self.add_def(def, prefix);
                }
            }
        }
        self
    }

    fn add_entry(&mut self, alias: Option<&str>, entry: &str, prefix: Option<&str>) {
        let entry = entry.trim();
        if entry.is_empty() {
            return;
        }

        let (expr, alias) = match INLINE_ALIAS.captures(entry) {
            Some(caps) => {
                let raw = caps[2].to_string();
                let alias = Alias {
                    quoted: raw.starts_with('`'),
                    name: raw.replace('`', ""),
                };
                (caps[1].trim().to_string(), Some(alias))
            }
            None => (
                entry.to_string(),
                alias.map(|a| Alias {
                    name: a.replace('`', ""),
                    quoted: true,
                }),
            ),
        };

        let source = expr.replace('`', "");
        let hidden_name = alias.as_ref().map_or(source.as_str(), |a| a.name.as_str());
        if self.hidden.contains(hidden_name) || self.hidden.contains(&source) {
            return;
        }

        let field = Field {
            alias,
            expr: render_expr(&expr, prefix),
            source,
        };
        self.push(field);
    }

    fn add_def(&mut self, def: FieldDef, prefix: Option<&str>) {
        let name = def.name.replace('`', "");
        if name.is_empty() {
            return;
        }
        if def.protected {
            self.protected.insert(name.clone());
        }
        if let Some(link) = def.link.filter(|l| !l.is_empty()) {
            self.linked.insert(name.clone(), link);
        }
        if def.hidden {
            self.hidden.insert(name.clone());
        } else if self.hidden.contains(&name) {
            return;
        }

        let column = if def.expr.trim().is_empty() {
            name.clone()
        } else {
            def.expr.trim().to_string()
        };
        let alias = (column.replace('`', "") != name).then(|| Alias {
            name: name.clone(),
            quoted: true,
        });
        let field = Field {
            alias,
            expr: render_expr(&column, prefix),
            source: name,
        };
        self.push(field);
    }

    fn push(&mut self, field: Field) {
        if field.alias.is_some() {
            if let Some(existing) = self
                .entries
                .iter_mut()
                .find(|e| e.alias.is_some() && e.lookup_name() == field.lookup_name())
            {
                *existing = field;
                return;
            }
        }
        self.entries.push(field);
    }

    /// Hide names from rendering. Entries stay available via [`get`](Self::get).
    pub fn hide<I, S>(&mut self, names: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for list in names {
            for name in ident::split_names(list.as_ref()) {
                self.hidden.insert(name.replace('`', ""));
            }
        }
        self
    }

    pub fn is_hidden(&self, name: &str) -> bool {
        self.hidden.contains(name)
    }

    /// Model referenced by the field named `alias`, if declared.
    pub fn linked(&self, alias: &str) -> Option<&str> {
        self.linked.get(alias).map(String::as_str)
    }

    /// Names marked protected (excluded from assignment contexts).
    pub fn protected(&self) -> impl Iterator<Item = &str> {
        self.protected.iter().map(String::as_str)
    }

    /// Rendered expression of a field by alias (hidden fields included).
    pub fn get(&self, alias: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.lookup_name() == alias)
            .map(|e| e.expr.as_str())
    }

    /// Append every visible entry of `other`.
    pub fn merge(&mut self, other: &Fields) -> &mut Self {
        for field in other.visible() {
            self.push(field.clone());
        }
        self
    }

    /// Remove every entry that `other` would contribute on [`merge`](Self::merge).
    pub fn retract(&mut self, other: &Fields) -> &mut Self {
        let gone: Vec<&Field> = other.visible().collect();
        self.entries.retain(|e| !gone.contains(&e));
        self
    }

    fn visible(&self) -> impl Iterator<Item = &Field> {
        self.entries.iter().filter(|e| {
            !self.hidden.contains(e.lookup_name()) && !self.hidden.contains(&e.source)
        })
    }

    /// Visible entries as `(alias, expression)`.
    pub fn iter(&self) -> impl Iterator<Item = (Option<&str>, &str)> {
        self.visible()
            .map(|e| (e.alias.as_ref().map(|a| a.name.as_str()), e.expr.as_str()))
    }

    pub fn len(&self) -> usize {
        self.visible().count()
    }

    pub fn is_empty(&self) -> bool {
        self.visible().next().is_none()
    }
}

fn render_expr(expr: &str, prefix: Option<&str>) -> String {
    let bare = expr.trim_matches('`');
    if !ident::is_plain_name(bare) {
        return expr.to_string();
    }
    match prefix.filter(|p| !p.is_empty()) {
        Some(prefix) => Ident::qualified(prefix, bare).to_string(),
        None => ident::quote(bare),
    }
}

impl fmt::Display for Fields {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut any = false;
        for field in self.visible() {
            if any {
                f.write_str(",")?;
            }
            write!(f, "{field}")?;
            any = true;
        }
        if !any {
            f.write_str("*")?;
        }
        Ok(())
    }
}

impl From<&str> for Fields {
    fn from(v: &str) -> Self {
        let mut fields = Self::new();
        fields.add(v, None);
        fields
    }
}

impl From<FieldSource> for Fields {
    fn from(v: FieldSource) -> Self {
        let mut fields = Self::new();
        fields.add(v, None);
        fields
    }
}
