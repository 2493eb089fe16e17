#![allow(dead_code)]

use sqlchain::{ChainError, ChainResult, Driver, Outcome, Row, StatementKind, Value};
use std::cell::{Cell, RefCell};
use std::path::PathBuf;

/// Driver answering selects with canned rows keyed by a SQL fragment.
#[derive(Default)]
pub struct ScriptedDriver {
    answers: Vec<(String, Vec<Row>)>,
    fail_on: Option<String>,
    pub calls: RefCell<Vec<(String, Vec<Value>)>>,
    pub prepares: Cell<usize>,
    next_id: Cell<u64>,
}

impl ScriptedDriver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rows returned by any select whose SQL contains `needle`.
    pub fn answer(mut self, needle: &str, rows: Vec<Row>) -> Self {
        self.answers.push((needle.to_string(), rows));
        self
    }

    /// Fail every statement whose SQL contains `needle`.
    pub fn fail_on(mut self, needle: &str) -> Self {
        self.fail_on = Some(needle.to_string());
        self
    }

    pub fn sql(&self) -> Vec<String> {
        self.calls.borrow().iter().map(|(s, _)| s.clone()).collect()
    }

    pub fn last_params(&self) -> Vec<Value> {
        self.calls
            .borrow()
            .last()
            .map(|(_, p)| p.clone())
            .unwrap_or_default()
    }

    fn record(&self, sql: &str, params: &[Value]) -> ChainResult<()> {
        self.calls
            .borrow_mut()
            .push((sql.to_string(), params.to_vec()));
        match &self.fail_on {
            Some(needle) if sql.contains(needle.as_str()) => {
                Err(ChainError::driver(format!("near \"{needle}\": syntax error")))
            }
            _ => Ok(()),
        }
    }

    fn rows_for(&self, sql: &str) -> Vec<Row> {
        self.answers
            .iter()
            .find(|(needle, _)| sql.contains(needle.as_str()))
            .map(|(_, rows)| rows.clone())
            .unwrap_or_default()
    }
}

impl Driver for ScriptedDriver {
    type Statement = String;

    fn query(&self, sql: &str, params: &[Value]) -> ChainResult<Vec<Row>> {
        self.record(sql, params)?;
        Ok(self.rows_for(sql))
    }

    fn execute(&self, sql: &str, params: &[Value]) -> ChainResult<u64> {
        self.record(sql, params)?;
        if StatementKind::from_sql(sql) == StatementKind::Insert {
            self.next_id.set(self.next_id.get() + 1);
        }
        Ok(1)
    }

    fn last_insert_id(&self) -> u64 {
        self.next_id.get()
    }

    fn prepare(&self, sql: &str) -> ChainResult<String> {
        self.prepares.set(self.prepares.get() + 1);
        Ok(sql.to_string())
    }

    fn run(&self, stmt: &String, params: &[Value]) -> ChainResult<Outcome> {
        if StatementKind::from_sql(stmt).returns_rows() {
            self.query(stmt, params).map(Outcome::Rows)
        } else {
            self.execute(stmt, params).map(Outcome::Affected)
        }
    }

    fn find_model(&self, file_name: &str) -> Option<PathBuf> {
        let path = models_dir().join(file_name);
        path.is_file().then_some(path)
    }
}

pub fn models_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/models")
}

pub fn user(id: i64, name: &str, city: &str) -> Row {
    Row::new()
        .with("id", id)
        .with("name", name)
        .with("city", city)
}
