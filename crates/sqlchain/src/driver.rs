//! The database driver seam.
//!
//! sqlchain renders SQL; a [`Driver`] runs it. Implement the trait for your
//! connection type (interior mutability is expected for state such as the
//! last insert id, since every method takes `&self`).

use crate::error::ChainResult;
use crate::log::StatementKind;
use crate::value::{Row, Value};
use std::cell::{Cell, RefCell};
use std::path::PathBuf;

/// Result of running a compiled statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Rows(Vec<Row>),
    Affected(u64),
}

impl Outcome {
    /// Row count for result sets, affected rows otherwise.
    pub fn affected(&self) -> u64 {
        match self {
            Outcome::Rows(rows) => rows.len() as u64,
            Outcome::Affected(n) => *n,
        }
    }

    pub fn into_rows(self) -> Vec<Row> {
        match self {
            Outcome::Rows(rows) => rows,
            Outcome::Affected(_) => Vec::new(),
        }
    }
}

/// Synchronous driver interface.
///
/// Values in `params` bind to the bare `?` placeholders of `sql`, in order.
/// Failures are reported as [`ChainError::Driver`](crate::ChainError::Driver)
/// carrying the driver's message.
pub trait Driver {
    /// Compiled statement handle.
    type Statement;

    /// Run a row-returning statement.
    fn query(&self, sql: &str, params: &[Value]) -> ChainResult<Vec<Row>>;

    /// Run a statement and return the affected row count.
    fn execute(&self, sql: &str, params: &[Value]) -> ChainResult<u64>;

    /// Id generated by the most recent INSERT.
    fn last_insert_id(&self) -> u64;

    /// Compile a statement for repeated execution.
    fn prepare(&self, sql: &str) -> ChainResult<Self::Statement>;

    /// Execute a compiled statement with fresh parameters.
    fn run(&self, stmt: &Self::Statement, params: &[Value]) -> ChainResult<Outcome>;

    /// Locate a model definition file by file name.
    fn find_model(&self, file_name: &str) -> Option<PathBuf> {
        let _ = file_name;
        None
    }
}

impl<D: Driver + ?Sized> Driver for &D {
    type Statement = D::Statement;

    fn query(&self, sql: &str, params: &[Value]) -> ChainResult<Vec<Row>> {
        (**self).query(sql, params)
    }

    fn execute(&self, sql: &str, params: &[Value]) -> ChainResult<u64> {
        (**self).execute(sql, params)
    }

    fn last_insert_id(&self) -> u64 {
        (**self).last_insert_id()
    }

    fn prepare(&self, sql: &str) -> ChainResult<Self::Statement> {
        (**self).prepare(sql)
    }

    fn run(&self, stmt: &Self::Statement, params: &[Value]) -> ChainResult<Outcome> {
        (**self).run(stmt, params)
    }

    fn find_model(&self, file_name: &str) -> Option<PathBuf> {
        (**self).find_model(file_name)
    }
}

/// One statement seen by a [`DryRunDriver`].
#[derive(Debug, Clone, PartialEq)]
pub struct Recorded {
    pub sql: String,
    pub params: Vec<Value>,
}

/// A driver that records statements instead of running them.
///
/// SELECTs return no rows, everything else affects zero rows. Models are
/// looked up in an optional directory.
#[derive(Debug, Default)]
pub struct DryRunDriver {
    models_dir: Option<PathBuf>,
    log: RefCell<Vec<Recorded>>,
    prepared: Cell<usize>,
}

impl DryRunDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_models_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.models_dir = Some(dir.into());
        self
    }

    /// Statements run so far, oldest first.
    pub fn recorded(&self) -> Vec<Recorded> {
        self.log.borrow().clone()
    }

    /// Number of `prepare` calls.
    pub fn prepare_count(&self) -> usize {
        self.prepared.get()
    }

    fn record(&self, sql: &str, params: &[Value]) {
        self.log.borrow_mut().push(Recorded {
            sql: sql.to_string(),
            params: params.to_vec(),
        });
    }
}

impl Driver for DryRunDriver {
    type Statement = String;

    fn query(&self, sql: &str, params: &[Value]) -> ChainResult<Vec<Row>> {
        self.record(sql, params);
        Ok(Vec::new())
    }

    fn execute(&self, sql: &str, params: &[Value]) -> ChainResult<u64> {
        self.record(sql, params);
        Ok(0)
    }

    fn last_insert_id(&self) -> u64 {
        0
    }

    fn prepare(&self, sql: &str) -> ChainResult<String> {
        self.prepared.set(self.prepared.get() + 1);
        Ok(sql.to_string())
    }

    fn run(&self, stmt: &String, params: &[Value]) -> ChainResult<Outcome> {
        self.record(stmt, params);
        if StatementKind::from_sql(stmt).returns_rows() {
            Ok(Outcome::Rows(Vec::new()))
        } else {
            Ok(Outcome::Affected(0))
        }
    }

    fn find_model(&self, file_name: &str) -> Option<PathBuf> {
        let path = self.models_dir.as_ref()?.join(file_name);
        path.is_file().then_some(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dry_run_records_statements() {
        let driver = DryRunDriver::new();
        let stmt = driver.prepare("SELECT * FROM `t` WHERE `a` = ?").unwrap();
        let outcome = driver.run(&stmt, &[Value::Int(1)]).unwrap();
        assert_eq!(outcome, Outcome::Rows(Vec::new()));
        driver.execute("DELETE FROM `t`", &[]).unwrap();

        let recorded = driver.recorded();
        assert_eq!(recorded.len(), 2);
        assert_eq!(recorded[0].params, vec![Value::Int(1)]);
        assert_eq!(recorded[1].sql, "DELETE FROM `t`");
        assert_eq!(driver.prepare_count(), 1);
    }

    #[test]
    fn outcome_affected_counts_rows() {
        let rows = Outcome::Rows(vec![Row::new().with("a", 1), Row::new().with("a", 2)]);
        assert_eq!(rows.affected(), 2);
        assert_eq!(Outcome::Affected(7).affected(), 7);
    }

    #[test]
    fn find_model_without_directory() {
        assert_eq!(DryRunDriver::new().find_model("users.toml"), None);
    }
}
