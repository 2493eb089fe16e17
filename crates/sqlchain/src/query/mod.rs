//! Fluent statement builder bound to one table and one driver.
//!
//! ```
//! use sqlchain::{DryRunDriver, Query};
//!
//! let driver = DryRunDriver::new();
//! let mut q = Query::table(&driver, "users");
//! q.where_cmp("age", ">", 18).order(["-age"]).limit(5).select()?;
//!
//! assert_eq!(
//!     q.executed(),
//!     ["SELECT * FROM `users` WHERE `age` > ? ORDER BY age DESC LIMIT 5"]
//! );
//! assert!(q.errors().is_empty());
//! # Ok::<(), sqlchain::ChainError>(())
//! ```
//!
//! Clause methods (`where_`, `order`, `limit`, `link`, ...) accumulate state
//! and return `&mut Self`. Verbs (`select`, `insert`, `update`, `delete`,
//! `associate`, `execute`) run a statement and return
//! `ChainResult<&mut Self>`; a failed verb also appends its error to
//! [`Query::errors`], which is never cleared implicitly.

mod records;


pub use records::{Records, Tree};

use crate::assign::{AssignSource, Assignments};
use crate::config::BuilderConfig;
use crate::driver::{Driver, Outcome};
use crate::error::{ChainError, ChainResult};
use crate::fields::{FieldSource, Fields};
use crate::ident;
use crate::join::{Join, JoinKind, TableRef};
use crate::log;
use crate::log::StatementKind;
use crate::pager::Paginator;
use crate::predicate::{self, Glue, Predicate, PredicateSource};
use crate::template::{self, Arg, Fragment};
use crate::value::{Row, Value};
use regex::Regex;
use serde::Serialize;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::LazyLock;

static ORDER_TERM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([+-]?)(\S+)$").expect("valid order term pattern"));

/// Sort direction of an ORDER BY term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

type RowFilter<'d> = Box<dyn FnMut(&mut Row) -> bool + 'd>;

struct Compiled<S> {
    stmt: S,
    sql: String,
    params: Vec<Value>,
}

#[derive(Serialize)]
struct Snapshot<'a> {
    error: Vec<String>,
    comment: &'a [String],
    lastid: u64,
    affected: u64,
    paginator: &'a Paginator,
    result: &'a Records,
}

/// Statement builder session. See the [module docs](self).
pub struct Query<'d, D: Driver> {
    driver: &'d D,
    config: BuilderConfig,
    table: String,
    alias: String,
    fields: Fields,
    protected: BTreeSet<String>,
    /// Link, join, and the fields it contributed to the projection.
    joins: Vec<(String, Join, Fields)>,
    wheres: Vec<Predicate>,
    havings: Vec<Predicate>,
    orders: Vec<(String, Direction)>,
    paginator: Paginator,
    group_keys: Vec<String>,
    filter: Option<RowFilter<'d>>,
    bound: Vec<Value>,
    prepared: Vec<Fragment>,
    ready: Option<Compiled<D::Statement>>,
    records: Records,
    errors: Vec<ChainError>,
    comments: Vec<String>,
    affected: u64,
    last_id: u64,
    executed: Vec<String>,
    join_counter: usize,
}

impl<D: Driver> fmt::Debug for Query<'_, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("table", &self.table)
            .field("alias", &self.alias)
            .field("fields", &self.fields.to_string())
            .field("joins", &self.joins.len())
            .field("paginator", &self.paginator)
            .field("compiled", &self.ready.is_some())
            .field("errors", &self.errors)
            .finish_non_exhaustive()
    }
}

impl<'d, D: Driver> Query<'d, D> {
    /// Start a query on `table`.
    pub fn table(driver: &'d D, table: impl Into<String>) -> Self {
        let table = table.into();
        Self::aliased(driver, table.clone(), table)
    }

    /// Start a query on `table`, referred to as `alias` in the statement.
    pub fn aliased(driver: &'d D, table: impl Into<String>, alias: impl Into<String>) -> Self {
        let table = table.into();
        let alias = alias.into();
        let alias = if alias.is_empty() { table.clone() } else { alias };
        Self {
            driver,
            config: BuilderConfig::default(),
            table,
            alias,
            fields: Fields::new(),
            protected: BTreeSet::new(),
            joins: Vec::new(),
            wheres: Vec::new(),
            havings: Vec::new(),
            orders: Vec::new(),
            paginator: Paginator::default(),
            group_keys: Vec::new(),
            filter: None,
            bound: Vec::new(),
            prepared: Vec::new(),
            ready: None,
            records: Records::default(),
            errors: Vec::new(),
            comments: Vec::new(),
            affected: 0,
            last_id: 0,
            executed: Vec::new(),
            join_counter: 0,
        }
    }

    /// A query without a table, for [`prepare`](Self::prepare) +
    /// [`execute`](Self::execute).
    pub fn raw(driver: &'d D) -> Self {
        Self::table(driver, "")
    }

    pub fn with_config(mut self, config: BuilderConfig) -> Self {
        self.config = config;
        self
    }

    // ── Accessors ──

    pub fn table_name(&self) -> &str {
        &self.table
    }

    pub fn alias(&self) -> &str {
        &self.alias
    }

    pub fn config(&self) -> &BuilderConfig {
        &self.config
    }

    /// Every error logged so far, oldest first.
    pub fn errors(&self) -> &[ChainError] {
        &self.errors
    }

    pub fn last_error(&self) -> Option<&ChainError> {
        self.errors.last()
    }

    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn clear_errors(&mut self) -> &mut Self {
        self.errors.clear();
        self
    }

    /// Notes recorded by the last verb (skipped joins, missing includes).
    pub fn comments(&self) -> &[String] {
        &self.comments
    }

    pub fn affected(&self) -> u64 {
        self.affected
    }

    pub fn last_id(&self) -> u64 {
        self.last_id
    }

    pub fn paginator(&self) -> &Paginator {
        &self.paginator
    }

    pub fn fields_ref(&self) -> &Fields {
        &self.fields
    }

    pub fn records(&self) -> &Records {
        &self.records
    }

    pub fn rows(&self) -> &[Row] {
        self.records.rows()
    }

    pub fn into_records(self) -> Records {
        self.records
    }

    /// SQL of every statement run through this builder, oldest first.
    pub fn executed(&self) -> &[String] {
        &self.executed
    }

    /// Whether a compiled statement is cached for [`execute`](Self::execute).
    pub fn is_compiled(&self) -> bool {
        self.ready.is_some()
    }

    /// State snapshot: errors, comments, last id, affected, paginator, result.
    pub fn to_json(&self) -> serde_json::Value {
        let snapshot = Snapshot {
            error: self.errors.iter().map(ToString::to_string).collect(),
            comment: &self.comments,
            lastid: self.last_id,
            affected: self.affected,
            paginator: &self.paginator,
            result: &self.records,
        };
        serde_json::to_value(snapshot).unwrap_or(serde_json::Value::Null)
    }

    // ── Clause mutators ──

    fn invalidate(&mut self) {
        self.ready = None;
    }

    /// Add to the projection.
    pub fn fields(&mut self, source: impl Into<FieldSource>) -> &mut Self {
        self.invalidate();
        self.fields.add(source, None);
        self
    }

    /// Replace the projection.
    pub fn set_fields(&mut self, fields: Fields) -> &mut Self {
        self.invalidate();
        self.fields = fields;
        self
    }

    /// Columns that INSERT/UPDATE must never set.
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

    /// Values bound to bare `?` placeholders of the next statement, after
    /// values carried by conditions.
    pub fn bind(&mut self, params: Vec<Value>) -> &mut Self {
        self.invalidate();
        self.bound = params;
        self
    }

    pub fn paginate(&mut self, size: u64) -> &mut Self {
        self.invalidate();
        self.paginator.size = size;
        self
    }

    /// Paginate with the configured default page size.
    pub fn paginate_default(&mut self) -> &mut Self {
        let size = self.config.default_page_size;
        self.paginate(size)
    }

    pub fn page(&mut self, page: u64) -> &mut Self {
        self.invalidate();
        self.paginator.page = page;
        self
    }

    pub fn start(&mut self, start: u64) -> &mut Self {
        self.invalidate();
        self.paginator.start = start;
        self
    }

    pub fn limit(&mut self, limit: u64) -> &mut Self {
        self.invalidate();
        self.paginator.limit = limit;
        self
    }

    pub fn set_paginator(&mut self, paginator: Paginator) -> &mut Self {
        self.invalidate();
        self.paginator = paginator;
        self
    }

    /// Add a WHERE predicate (glue `OR`). Several predicates are AND-ed.
    pub fn where_(&mut self, source: impl Into<PredicateSource>) -> &mut Self {
        self.where_pred(Predicate::new(source, None))
    }

    pub fn where_with(&mut self, source: impl Into<PredicateSource>, glue: Glue) -> &mut Self {
        self.where_pred(Predicate::new(source, Some(glue)))
    }

    /// `` `column` <op> ? `` with a bound value.
    pub fn where_cmp(&mut self, column: &str, op: &str, value: impl Into<Value>) -> &mut Self {
        self.where_pred(Predicate::compare(column, op, value))
    }

    pub fn where_pred(&mut self, predicate: Predicate) -> &mut Self {
        self.invalidate();
        self.wheres.push(predicate);
        self
    }

    pub fn having(&mut self, source: impl Into<PredicateSource>) -> &mut Self {
        self.having_pred(Predicate::new(source, None))
    }

    pub fn having_with(&mut self, source: impl Into<PredicateSource>, glue: Glue) -> &mut Self {
        self.having_pred(Predicate::new(source, Some(glue)))
    }

    pub fn having_pred(&mut self, predicate: Predicate) -> &mut Self {
        self.invalidate();
        self.havings.push(predicate);
        self
    }

    /// Add ORDER BY terms: `"name"`, `"-age"` (descending), `"+id, -created"`.
    ///
    /// A repeated column keeps its position and takes the new direction.
    pub fn order<I, S>(&mut self, terms: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.invalidate();
        for list in terms {
            for term in ident::split_names(list.as_ref()) {
                let Some(caps) = ORDER_TERM.captures(term) else {
                    continue;
                };
                let name = caps[2].to_string();
                if name == "+" || name == "-" {
                    continue;
                }
                let direction = if &caps[1] == "-" {
                    Direction::Desc
                } else {
                    Direction::Asc
                };
                match self.orders.iter_mut().find(|(n, _)| *n == name) {
                    Some((_, dir)) => *dir = direction,
                    None => self.orders.push((name, direction)),
                }
            }
        }
        self
    }

    /// Group SELECT results by these columns (see [`Records::Keyed`]).
    pub fn group_keys<I, S>(&mut self, keys: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.group_keys = keys
            .into_iter()
            .flat_map(|k| {
                ident::split_names(k.as_ref())
                    .map(str::to_string)
                    .collect::<Vec<_>>()
            })
            .collect();
        self
    }

    /// Post-fetch row filter. Returning `false` drops the row; the closure may
    /// rewrite rows in place.
    pub fn filter(&mut self, f: impl FnMut(&mut Row) -> bool + 'd) -> &mut Self {
        self.filter = Some(Box::new(f));
        self
    }

    fn next_alias(&mut self) -> String {
        let alias = format!("join{}", self.join_counter);
        self.join_counter += 1;
        alias
    }

    /// Join a declared table on `link` (a `table.column` reference).
    ///
    /// With `pull_fields` the table's fields join the projection. A missing
    /// table is an error ("No model for join ...").
    pub fn link(
        &mut self,
        kind: JoinKind,
        link: &str,
        table: Option<&TableRef>,
        alias: Option<&str>,
        pull_fields: bool,
    ) -> ChainResult<&mut Self> {
        self.invalidate();
        let Some(table) = table.filter(|t| !t.name.is_empty()) else {
            return Err(self.fail(ChainError::validation(format!("No model for join {link}"))));
        };
        let alias = match alias.filter(|a| !a.is_empty()) {
            Some(alias) => alias.to_string(),
            None => self.next_alias(),
        };
        let join = Join::new(kind, table, alias);
        let pulled = if pull_fields {
            join.projection().clone()
        } else {
            Fields::new()
        };
        self.put_join(link, join, pulled);
        Ok(self)
    }

    /// Join `table` (primary key `primary`) on `link`, selecting `fields`
    /// from it.
    pub fn join(
        &mut self,
        kind: JoinKind,
        link: &str,
        table: &str,
        primary: &str,
        alias: Option<&str>,
        fields: impl Into<FieldSource>,
    ) -> &mut Self {
        self.invalidate();
        let alias = match alias.filter(|a| !a.is_empty()) {
            Some(alias) => alias.to_string(),
            None => self.next_alias(),
        };
        let mut join = Join::new(kind, &TableRef::new(table, primary), alias);
        let pulled = join.fields(fields).clone();
        self.put_join(link, join, pulled);
        self
    }

    /// A second join on the same link replaces the first, along with the
    /// fields it pulled into the projection.
    fn put_join(&mut self, link: &str, join: Join, pulled: Fields) {
        let previous = self.joins.iter().position(|(l, _, _)| l == link);
        if let Some(i) = previous {
            self.fields.retract(&self.joins[i].2);
        }
        self.fields.merge(&pulled);
        match previous {
            Some(i) => self.joins[i] = (link.to_string(), join, pulled),
            None => self.joins.push((link.to_string(), join, pulled)),
        }
    }

    // ── Rendering ──

    /// JOIN / WHERE / HAVING / ORDER BY / LIMIT, with a leading space.
    fn clauses(&self, skip_limit: bool) -> ChainResult<Fragment> {
        let mut out = Fragment::default();

        for (link, join, _) in &self.joins {
            let rendered = join.render(link);
            if rendered.is_empty() {
                if self.config.strict_joins {
                    return Err(ChainError::validation(format!(
                        "Incomplete join on {link}: table and primary key are required"
                    )));
                }
                continue;
            }
            out.push(" ").push(&rendered);
        }

        let wheres = predicate::conjunction(&self.wheres);
        if !wheres.is_empty() {
            out.push(" WHERE ").push_fragment(&wheres);
        }

        let havings = predicate::conjunction(&self.havings);
        if !havings.is_empty() {
            out.push(" HAVING ").push_fragment(&havings);
        }

        if !self.orders.is_empty() {
            let terms = self
                .orders
                .iter()
                .map(|(name, dir)| match dir {
                    Direction::Asc => name.clone(),
                    Direction::Desc => format!("{name} DESC"),
                })
                .collect::<Vec<_>>()
                .join(", ");
            out.push(" ORDER BY ").push(&terms);
        }

        if !skip_limit {
            let limit = self.paginator.to_string();
            if !limit.is_empty() {
                out.push(" ").push(&limit);
            }
        }

        Ok(out)
    }

    fn table_arg(&self) -> ChainResult<Arg> {
        if ident::Ident::parse(&self.table).is_empty() {
            return Err(ChainError::validation("No table for statement"));
        }
        Ok(Arg::from(&self.table))
    }

    fn alias_arg(&self) -> Arg {
        if self.alias == self.table {
            Arg::Text(String::new())
        } else {
            Arg::Text(format!(" AS {}", ident::quote(&self.alias)))
        }
    }

    /// The SELECT this builder would run, without running it.
    pub fn to_sql(&self) -> ChainResult<Fragment> {
        template::parse(
            "SELECT ?p FROM ?n?p?p",
            vec![
                self.fields.to_string().into(),
                self.table_arg()?,
                self.alias_arg(),
                self.clauses(false)?.into(),
            ],
        )
    }

    fn assignments(&self, source: AssignSource) -> ChainResult<Assignments> {
        let mut set = Assignments::new();
        set.protect(self.protected.iter())
            .protect(self.fields.protected())
            .add(source);
        if set.is_empty() {
            return Err(ChainError::validation(format!(
                "Nothing to set for {}",
                ident::quote(&self.table)
            )));
        }
        Ok(set)
    }

    fn with_bound(&self, mut fragment: Fragment) -> Fragment {
        fragment.params.extend(self.bound.iter().cloned());
        fragment
    }

    // ── Verbs ──

    fn init(&mut self, keep_prepared: bool) {
        self.records = Records::default();
        self.affected = 0;
        self.last_id = 0;
        self.comments.clear();
        if !keep_prepared {
            self.ready = None;
            self.prepared.clear();
        }
        if !self.config.strict_joins {
            let skipped: Vec<String> = self
                .joins
                .iter()
                .filter(|(link, join, _)| join.render(link).is_empty())
                .map(|(link, _, _)| format!("Join on {link} skipped: incomplete"))
                .collect();
            for note in skipped {
                self.comment(note);
            }
        }
    }

    pub(crate) fn comment(&mut self, text: impl Into<String>) {
        let text = text.into();
        log::comment(&text);
        self.comments.push(text);
    }

    pub(crate) fn fail(&mut self, err: ChainError) -> ChainError {
        log::error(&err, &self.table);
        self.errors.push(err.clone());
        err
    }

    fn fetch(&mut self, fragment: &Fragment) -> ChainResult<Vec<Row>> {
        log::statement(&fragment.sql, fragment.params.len(), self.config.max_sql_log_length);
        self.executed.push(fragment.sql.clone());
        self.driver.query(&fragment.sql, &fragment.params)
    }

    fn modify(&mut self, fragment: &Fragment) -> ChainResult<u64> {
        log::statement(&fragment.sql, fragment.params.len(), self.config.max_sql_log_length);
        self.executed.push(fragment.sql.clone());
        self.driver.execute(&fragment.sql, &fragment.params)
    }

    fn store_rows(&mut self, rows: Vec<Row>) {
        let rows: Vec<Row> = match self.filter.as_mut() {
            Some(filter) => rows
                .into_iter()
                .filter_map(|mut row| filter(&mut row).then_some(row))
                .collect(),
            None => rows,
        };
        self.affected = rows.len() as u64;
        self.records = if self.group_keys.is_empty() {
            Records::Rows(rows)
        } else {
            Records::Keyed(records::key_rows(rows, &self.group_keys))
        };
    }

    fn finish<T>(&mut self, result: ChainResult<T>) -> ChainResult<T> {
        result.map_err(|e| self.fail(e))
    }

    /// SELECT with the current projection and clauses.
    pub fn select(&mut self) -> ChainResult<&mut Self> {
        self.init(false);
        let result = self.to_sql().and_then(|frag| {
            let frag = self.with_bound(frag);
            self.fetch(&frag)
        });
        let rows = self.finish(result)?;
        self.store_rows(rows);
        Ok(self)
    }

    /// SELECT page `page` of the current pagination.
    pub fn select_page(&mut self, page: u64) -> ChainResult<&mut Self> {
        self.page(page);
        self.select()
    }

    /// Add `fields` to the projection, then SELECT.
    pub fn select_fields(&mut self, fields: impl Into<FieldSource>) -> ChainResult<&mut Self> {
        self.fields(fields);
        self.select()
    }

    /// `SELECT key, value` as a key → value map.
    pub fn associate(&mut self, key: &str, value: &str) -> ChainResult<&mut Self> {
        self.init(false);
        let result = self
            .table_arg()
            .and_then(|table| {
                template::parse(
                    "SELECT ?n, ?n FROM ?n?p?p",
                    vec![
                        key.into(),
                        value.into(),
                        table,
                        self.alias_arg(),
                        self.clauses(false)?.into(),
                    ],
                )
            })
            .and_then(|frag| {
                let frag = self.with_bound(frag);
                self.fetch(&frag)
            });
        let rows = self.finish(result)?;
        let pairs = records::pair_rows(&rows);
        self.affected = pairs.len() as u64;
        self.records = Records::Pairs(pairs);
        Ok(self)
    }

    /// `SELECT count(field)` over the current clauses, ignoring pagination.
    ///
    /// Returns 0 on failure; the error is logged.
    pub fn count(&mut self, field: &str) -> u64 {
        let field = if field.trim().is_empty() { "*" } else { field };
        let result = self
            .table_arg()
            .and_then(|table| {
                template::parse(
                    "SELECT count(?p) AS `count` FROM ?n?p?p",
                    vec![field.into(), table, self.alias_arg(), self.clauses(true)?.into()],
                )
            })
            .and_then(|frag| {
                let frag = self.with_bound(frag);
                self.fetch(&frag)
            });
        match self.finish(result) {
            Ok(rows) => rows
                .first()
                .and_then(|row| row.get("count").or_else(|| row.get_index(0)))
                .and_then(Value::as_i64)
                .map_or(0, |n| n.max(0) as u64),
            Err(_) => 0,
        }
    }

    /// `INSERT INTO table SET ...`; records affected rows and the new id.
    pub fn insert(&mut self, source: impl Into<AssignSource>) -> ChainResult<&mut Self> {
        self.init(false);
        let result = self
            .table_arg()
            .and_then(|table| {
                let set = self.assignments(source.into())?;
                template::parse("INSERT INTO ?n SET ?u", vec![table, set.into()])
            })
            .and_then(|frag| {
                let frag = self.with_bound(frag);
                self.modify(&frag)
            });
        self.affected = self.finish(result)?;
        self.last_id = self.driver.last_insert_id();
        Ok(self)
    }

    /// `UPDATE table SET ...` with the current clauses.
    pub fn update(&mut self, source: impl Into<AssignSource>) -> ChainResult<&mut Self> {
        self.init(false);
        let result = self
            .table_arg()
            .and_then(|table| {
                let set = self.assignments(source.into())?;
                template::parse(
                    "UPDATE ?n?p SET ?u?p",
                    vec![table, self.alias_arg(), set.into(), self.clauses(false)?.into()],
                )
            })
            .and_then(|frag| {
                let frag = self.with_bound(frag);
                self.modify(&frag)
            });
        self.affected = self.finish(result)?;
        Ok(self)
    }

    /// `DELETE FROM table` with the current clauses.
    pub fn delete(&mut self) -> ChainResult<&mut Self> {
        self.init(false);
        let result = self
            .table_arg()
            .and_then(|table| {
                template::parse("DELETE FROM ?n?p", vec![table, self.clauses(false)?.into()])
            })
            .and_then(|frag| {
                let frag = self.with_bound(frag);
                self.modify(&frag)
            });
        self.affected = self.finish(result)?;
        Ok(self)
    }

    /// Append a raw statement part written in the placeholder notation.
    ///
    /// Parts are joined with a space when the statement is compiled by
    /// [`execute`](Self::execute).
    pub fn prepare(&mut self, sql: &str, args: Vec<Arg>) -> ChainResult<&mut Self> {
        self.invalidate();
        let result = template::parse(sql, args);
        let fragment = self.finish(result)?;
        self.prepared.push(fragment);
        Ok(self)
    }

    /// Alias for [`prepare`](Self::prepare).
    pub fn raw_sql(&mut self, sql: &str, args: Vec<Arg>) -> ChainResult<&mut Self> {
        self.prepare(sql, args)
    }

    fn compile(&mut self) -> ChainResult<()> {
        let fragment = if self.prepared.is_empty() {
            self.to_sql()?
        } else {
            let mut joined = Fragment::default();
            for (i, part) in self.prepared.iter().enumerate() {
                if i > 0 {
                    joined.push(" ");
                }
                joined.push_fragment(part);
            }
            joined
        };
        let fragment = self.with_bound(fragment);
        let stmt = self.driver.prepare(&fragment.sql)?;
        self.ready = Some(Compiled {
            stmt,
            sql: fragment.sql,
            params: fragment.params,
        });
        Ok(())
    }

    /// Run the prepared parts (or, without any, the clause-built SELECT).
    ///
    /// The compiled statement is cached until a clause changes, so repeated
    /// calls only rebind `params`. A failed call keeps the cache.
    pub fn execute(&mut self, params: Vec<Value>) -> ChainResult<&mut Self> {
        self.init(true);

        let hit = self.ready.is_some();
        log::cache(hit, &self.table);
        if !hit {
            let result = self.compile();
            self.finish(result)?;
        }
        let Some(compiled) = self.ready.as_ref() else {
            return Err(self.fail(ChainError::validation("Statement was not compiled")));
        };

        let mut all = compiled.params.clone();
        all.extend(params);
        let sql = compiled.sql.clone();
        log::statement(&sql, all.len(), self.config.max_sql_log_length);
        let result = self.driver.run(&compiled.stmt, &all);
        self.executed.push(sql.clone());

        match self.finish(result)? {
            Outcome::Rows(rows) => self.store_rows(rows),
            Outcome::Affected(n) => self.affected = n,
        }
        if StatementKind::from_sql(&sql) == StatementKind::Insert {
            self.last_id = self.driver.last_insert_id();
        }
        Ok(self)
    }
}
