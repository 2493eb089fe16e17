//! `tracing` events for executed statements and builder errors.
//!
//! All events use the `sqlchain.sql` target, so they can be filtered with
//! e.g. `RUST_LOG=sqlchain.sql=debug`.

use crate::error::ChainError;

/// The kind of SQL statement being run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Select,
    Insert,
    Update,
    Delete,
    Other,
}

impl StatementKind {
    /// Detect the statement kind from SQL text.
    pub fn from_sql(sql: &str) -> Self {
        fn strip_sql_prefix(sql: &str) -> &str {
            let mut s = sql;
            loop {
                let before = s;
                s = s.trim_start();
                if s.starts_with("--") || s.starts_with('#') {
                    match s.find('\n') {
                        Some(pos) => {
                            s = &s[pos + 1..];
                            continue;
                        }
                        None => return "",
                    }
                }
                if s.starts_with("/*") {
                    match s.find("*/") {
                        Some(pos) => {
                            s = &s[pos + 2..];
                            continue;
                        }
                        None => return "",
                    }
                }
                if let Some(rest) = s.strip_prefix('(') {
                    s = rest;
                    continue;
                }
                if s == before {
                    break;
                }
            }
            s
        }

        fn starts_with_keyword(s: &str, keyword: &str) -> bool {
            s.get(0..keyword.len())
                .is_some_and(|prefix| prefix.eq_ignore_ascii_case(keyword))
        }

        let trimmed = strip_sql_prefix(sql);
        if ["SELECT", "WITH", "SHOW", "DESCRIBE", "EXPLAIN"]
            .iter()
            .any(|kw| starts_with_keyword(trimmed, kw))
        {
            StatementKind::Select
        } else if starts_with_keyword(trimmed, "INSERT") || starts_with_keyword(trimmed, "REPLACE")
        {
            StatementKind::Insert
        } else if starts_with_keyword(trimmed, "UPDATE") {
            StatementKind::Update
        } else if starts_with_keyword(trimmed, "DELETE") {
            StatementKind::Delete
        } else {
            StatementKind::Other
        }
    }

    /// Whether the statement yields rows.
    pub fn returns_rows(self) -> bool {
        matches!(self, StatementKind::Select)
    }
}

fn truncate_sql_bytes(sql: &str, max_bytes: usize) -> &str {
    if sql.len() <= max_bytes {
        return sql;
    }
    let mut end = max_bytes;
    while end > 0 && !sql.is_char_boundary(end) {
        end -= 1;
    }
    &sql[..end]
}

/// Truncate long SQL for display. `None` means no truncation.
pub fn truncate_sql(sql: &str, max: Option<usize>) -> String {
    match max {
        Some(max) if sql.len() > max => format!("{}...", truncate_sql_bytes(sql, max)),
        _ => sql.to_string(),
    }
}

pub(crate) fn statement(sql: &str, param_count: usize, max_sql_length: Option<usize>) {
    let kind = StatementKind::from_sql(sql);
    let sql = truncate_sql(sql, max_sql_length);
    tracing::debug!(
        target: "sqlchain.sql",
        kind = ?kind,
        param_count,
        sql = %sql,
        "executing statement"
    );
}

pub(crate) fn cache(hit: bool, table: &str) {
    tracing::debug!(target: "sqlchain.sql", hit, table, "compiled statement cache");
}

pub(crate) fn error(err: &ChainError, table: &str) {
    tracing::warn!(target: "sqlchain.sql", table, error = %err, "query failed");
}

pub(crate) fn comment(text: &str) {
    tracing::debug!(target: "sqlchain.sql", comment = text);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statement_kind_detection() {
        assert_eq!(
            StatementKind::from_sql("SELECT * FROM users"),
            StatementKind::Select
        );
        assert_eq!(
            StatementKind::from_sql("  /* tag */ select 1"),
            StatementKind::Select
        );
        assert_eq!(
            StatementKind::from_sql("-- note\nINSERT INTO `t` SET `a`=1"),
            StatementKind::Insert
        );
        assert_eq!(
            StatementKind::from_sql("(SELECT 1) UNION (SELECT 2)"),
            StatementKind::Select
        );
        assert_eq!(
            StatementKind::from_sql("UPDATE `t` SET `a`=1"),
            StatementKind::Update
        );
        assert_eq!(
            StatementKind::from_sql("DELETE FROM `t`"),
            StatementKind::Delete
        );
        assert_eq!(
            StatementKind::from_sql("CREATE TABLE t (id INT)"),
            StatementKind::Other
        );
    }

    #[test]
    fn truncation() {
        assert_eq!(truncate_sql("SELECT * FROM users", Some(10)), "SELECT * F...");
        assert_eq!(truncate_sql("SELECT 1", Some(10)), "SELECT 1");
        assert_eq!(truncate_sql("SELECT 1", None), "SELECT 1");
        assert_eq!(truncate_sql("é", Some(1)), "...");
    }
}
