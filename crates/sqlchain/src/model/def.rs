use crate::assign::SetDef;
use crate::error::{ChainError, ChainResult};
use crate::fields::FieldDef;
use crate::join::TableRef;
use crate::pager::Paginator;
use crate::predicate::PredicateDef;
use serde::Deserialize;
use std::path::Path;

/// A model definition file.
///
/// ```toml
/// name = "users"
/// include = ["groups"]
///
/// [table]
/// name = "site_users"
/// primary = "id"
///
/// [[table.fields]]
/// name = "id"
///
/// [[table.fields]]
/// name = "group"
/// link = "groups"
///
/// [[sql]]
/// name = "active"
/// type = "select"
/// table = "users"
/// where = ["active = 1"]
/// order = ["-id"]
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ModelDef {
    pub name: String,
    /// Models loaded along with this one.
    #[serde(default)]
    pub include: Vec<String>,
    #[serde(default)]
    pub table: Option<TableRef>,
    #[serde(default, rename = "sql")]
    pub requests: Vec<RequestDef>,
}

impl ModelDef {
    pub fn from_toml(source: &str) -> ChainResult<Self> {
        let def: ModelDef = toml::from_str(source)?;
        def.validated()
    }

    pub fn load(path: impl AsRef<Path>) -> ChainResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ChainError::definition(format!("failed to read {}: {e}", path.display()))
        })?;
        let def: ModelDef = toml::from_str(&raw).map_err(|e| {
            ChainError::definition(format!("failed to parse {}: {e}", path.display()))
        })?;
        def.validated()
    }

    fn validated(self) -> ChainResult<Self> {
        if self.name.trim().is_empty() {
            return Err(ChainError::definition("model name must not be empty"));
        }
        if let Some(req) = self.requests.iter().find(|r| r.table.trim().is_empty()) {
            return Err(ChainError::definition(format!(
                "request {}.{} has no table",
                self.name, req.name
            )));
        }
        for req in &self.requests {
            for def in req.where_.iter().chain(req.having.iter()) {
                if let Err(ChainError::Definition(msg)) = def.check() {
                    return Err(ChainError::definition(format!(
                        "request {}.{}: {msg}",
                        self.name, req.name
                    )));
                }
            }
        }
        Ok(self)
    }

    pub fn request(&self, name: &str) -> Option<&RequestDef> {
        self.requests.iter().find(|r| r.name == name)
    }
}

/// Statement kind of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StatementType {
    Insert,
    Delete,
    Update,
    Select,
}

/// A named request (`[[sql]]`) inside a model.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RequestDef {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: StatementType,
    /// Model whose table is used; its name is the statement alias.
    pub table: String,
    #[serde(default)]
    pub fields: Vec<FieldDef>,
    #[serde(default)]
    pub set: Vec<SetDef>,
    #[serde(default, rename = "where")]
    pub where_: Option<PredicateDef>,
    #[serde(default)]
    pub having: Option<PredicateDef>,
    #[serde(default)]
    pub order: Vec<String>,
    #[serde(default)]
    pub link: Vec<LinkDef>,
    #[serde(default)]
    pub pager: Option<Paginator>,
}

/// Join a linked field's model into a select request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LinkDef {
    /// Field name carrying the link.
    pub name: String,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldDef>,
}
