//! Declarative models: named tables and requests resolved into [`Query`]
//! calls.
//!
//! A request is addressed as `"model.request"` (looked up in that model) or
//! `"request"` (first match across models, in registration order).

mod def;

#[cfg(test)]
mod tests;

pub use def::{LinkDef, ModelDef, RequestDef, StatementType};

use crate::config::BuilderConfig;
use crate::driver::Driver;
use crate::error::{ChainError, ChainResult};
use crate::fields::Fields;
use crate::join::{JoinKind, TableRef};
use crate::predicate::Predicate;
use crate::query::Query;
use crate::value::Value;
use std::path::Path;

/// Registry of loaded model definitions.
#[derive(Debug, Clone, Default)]
pub struct ModelRegistry {
    models: Vec<ModelDef>,
    comments: Vec<String>,
    config: BuilderConfig,
}

impl ModelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configuration handed to every query built by [`request`](Self::request).
    pub fn with_config(mut self, config: BuilderConfig) -> Self {
        self.config = config;
        self
    }

    /// Register a model once, then its includes (found through
    /// [`Driver::find_model`]). Missing includes are recorded as comments.
    pub fn add<D: Driver>(&mut self, def: ModelDef, driver: &D) -> &mut Self {
        if self.model(&def.name).is_some() {
            return self;
        }
        tracing::debug!(target: "sqlchain.sql", model = %def.name, "registering model");
        let includes = def.include.clone();
        self.models.push(def);

        for include in includes {
            if self.model(&include).is_some() {
                continue;
            }
            let Some(path) = driver.find_model(&format!("{include}.toml")) else {
                self.comment(format!("Model not found: {include}"));
                continue;
            };
            match ModelDef::load(&path) {
                Ok(def) => {
                    self.add(def, driver);
                }
                Err(e) => self.comment(format!("Model not loaded: {include}: {e}")),
            }
        }
        self
    }

    /// Parse and register one definition file.
    pub fn load_file<D: Driver>(
        &mut self,
        path: impl AsRef<Path>,
        driver: &D,
    ) -> ChainResult<&mut Self> {
        let def = ModelDef::load(path)?;
        Ok(self.add(def, driver))
    }

    /// Register every `*.toml` file in `dir`, in file name order.
    pub fn load_dir<D: Driver>(&mut self, dir: impl AsRef<Path>, driver: &D) -> ChainResult<usize> {
        let dir = dir.as_ref();
        let mut paths = std::fs::read_dir(dir)
            .map_err(|e| {
                ChainError::definition(format!("failed to read {}: {e}", dir.display()))
            })?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().is_some_and(|ext| ext == "toml"))
            .collect::<Vec<_>>();
        paths.sort();

        let before = self.models.len();
        for path in paths {
            self.load_file(&path, driver)?;
        }
        Ok(self.models.len() - before)
    }

    fn comment(&mut self, text: String) {
        tracing::debug!(target: "sqlchain.sql", comment = %text);
        self.comments.push(text);
    }

    /// Notes from loading (missing includes).
    pub fn comments(&self) -> &[String] {
        &self.comments
    }

    pub fn model(&self, name: &str) -> Option<&ModelDef> {
        self.models.iter().find(|m| m.name == name)
    }

    pub fn models(&self) -> impl Iterator<Item = &ModelDef> {
        self.models.iter()
    }

    /// Every request as `model.request`.
    pub fn requests(&self) -> Vec<String> {
        self.models
            .iter()
            .flat_map(|m| m.requests.iter().map(move |r| format!("{}.{}", m.name, r.name)))
            .collect()
    }

    /// Table declared by `model`.
    pub fn use_table(&self, model: &str) -> Option<&TableRef> {
        self.model(model)?.table.as_ref()
    }

    /// Resolve `"model.request"` or `"request"`.
    pub fn find_request(&self, name: &str) -> ChainResult<&RequestDef> {
        match name.split_once('.') {
            Some((model, request)) => {
                let def = self
                    .model(model)
                    .ok_or_else(|| ChainError::not_found(format!("Model not found: {model}")))?;
                def.request(request)
                    .ok_or_else(|| ChainError::not_found(format!("Request not found: {name}")))
            }
            None => self
                .models
                .iter()
                .find_map(|m| m.request(name))
                .ok_or_else(|| ChainError::not_found(format!("Request not found: {name}"))),
        }
    }

    /// Build and run a named request. `params` bind to bare `?`.
    pub fn request<'d, D: Driver>(
        &self,
        driver: &'d D,
        name: &str,
        params: Vec<Value>,
    ) -> ChainResult<Query<'d, D>> {
        let req = self.find_request(name)?;
        let alias = req.table.as_str();
        let table = self
            .use_table(alias)
            .filter(|t| !t.name.is_empty())
            .ok_or_else(|| ChainError::not_found(format!("No table for model: {alias}")))?;

        let mut q = Query::aliased(driver, table.name.as_str(), alias).with_config(self.config.clone());
        let table_fields = Fields::with_prefix(table.fields.as_slice(), alias);
        q.protect(table_fields.protected());

        match req.kind {
            StatementType::Insert => {
                q.bind(params).insert(req.set.as_slice())?;
            }
            StatementType::Delete => {
                apply_where(&mut q, req);
                q.bind(params).delete()?;
            }
            StatementType::Update => {
                apply_where(&mut q, req);
                q.bind(params).update(req.set.as_slice())?;
            }
            StatementType::Select => {
                let fields = if req.fields.is_empty() {
                    table_fields.clone()
                } else {
                    Fields::with_prefix(req.fields.as_slice(), alias)
                };
                q.set_fields(fields);
                self.apply_links(&mut q, req, &table_fields)?;
                apply_where(&mut q, req);
                if let Some(having) = &req.having {
                    q.having_pred(Predicate::from(having.clone()));
                }
                q.order(&req.order);
                if let Some(pager) = req.pager {
                    q.set_paginator(pager);
                }
                q.execute(params)?;
            }
        }
        Ok(q)
    }

    fn apply_links<D: Driver>(
        &self,
        q: &mut Query<'_, D>,
        req: &RequestDef,
        table_fields: &Fields,
    ) -> ChainResult<()> {
        let alias = req.table.as_str();
        for link in &req.link {
            let linked = q
                .fields_ref()
                .linked(&link.name)
                .or_else(|| table_fields.linked(&link.name))
                .map(str::to_string);
            let Some(linked) = linked else {
                continue;
            };
            let kind = match link.kind.parse::<JoinKind>() {
                Ok(kind) => kind,
                Err(e) => return Err(q.fail(e)),
            };
            let link_ref = format!("{alias}.{}", link.name);
            let join_alias = link.alias.as_deref().unwrap_or(&link.name);
            match self.use_table(&linked) {
                Some(joined) => {
                    let fields = if link.fields.is_empty() {
                        joined.fields.as_slice()
                    } else {
                        link.fields.as_slice()
                    };
                    q.join(
                        kind,
                        &link_ref,
                        &joined.name,
                        &joined.primary,
                        Some(join_alias),
                        fields,
                    );
                }
                None => {
                    q.link(kind, &link_ref, None, Some(join_alias), false)?;
                }
            }
        }
        Ok(())
    }
}

fn apply_where<D: Driver>(q: &mut Query<'_, D>, req: &RequestDef) {
    if let Some(where_) = &req.where_ {
        q.where_pred(Predicate::from(where_.clone()));
    }
}
