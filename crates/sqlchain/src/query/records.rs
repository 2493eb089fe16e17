use crate::value::{Row, Value};
use serde::Serialize;
use std::collections::BTreeMap;

/// Rows keyed by one or more column values.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Tree {
    Row(Row),
    Branch(BTreeMap<String, Tree>),
}

impl Tree {
    fn count(&self) -> usize {
        match self {
            Tree::Row(_) => 1,
            Tree::Branch(children) => children.values().map(Tree::count).sum(),
        }
    }
}

/// The result set of the last verb.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Records {
    Rows(Vec<Row>),
    /// Rows grouped by [`Query::group_keys`](crate::Query::group_keys).
    Keyed(BTreeMap<String, Tree>),
    /// Key/value pairs from [`Query::associate`](crate::Query::associate).
    Pairs(BTreeMap<String, Value>),
}

impl Default for Records {
    fn default() -> Self {
        Records::Rows(Vec::new())
    }
}

impl Records {
    /// Number of rows (or pairs) held.
    pub fn len(&self) -> usize {
        match self {
            Records::Rows(rows) => rows.len(),
            Records::Keyed(tree) => tree.values().map(Tree::count).sum(),
            Records::Pairs(pairs) => pairs.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Flat rows; empty for keyed or paired results.
    pub fn rows(&self) -> &[Row] {
        match self {
            Records::Rows(rows) => rows,
            _ => &[],
        }
    }

    /// Follow a key path through a keyed result.
    pub fn get_path(&self, path: &[&str]) -> Option<&Row> {
        let Records::Keyed(root) = self else {
            return None;
        };
        let (first, rest) = path.split_first()?;
        let mut node = root.get(*first)?;
        for key in rest {
            match node {
                Tree::Branch(children) => node = children.get(*key)?,
                Tree::Row(_) => return None,
            }
        }
        match node {
            Tree::Row(row) => Some(row),
            Tree::Branch(_) => None,
        }
    }

    /// Value for a key in an associated result.
    pub fn pair(&self, key: &str) -> Option<&Value> {
        match self {
            Records::Pairs(pairs) => pairs.get(key),
            _ => None,
        }
    }
}

/// Nest rows under the values of `keys`; later rows win on equal paths.
pub(crate) fn key_rows(rows: Vec<Row>, keys: &[String]) -> BTreeMap<String, Tree> {
    let mut root = BTreeMap::new();
    for row in rows {
        insert_keyed(&mut root, keys, row);
    }
    root
}

fn insert_keyed(level: &mut BTreeMap<String, Tree>, keys: &[String], row: Row) {
    let Some((key, rest)) = keys.split_first() else {
        return;
    };
    let value = row.get(key).map(Value::to_string).unwrap_or_default();
    if rest.is_empty() {
        level.insert(value, Tree::Row(row));
        return;
    }
    let entry = level
        .entry(value)
        .or_insert_with(|| Tree::Branch(BTreeMap::new()));
    if let Tree::Row(_) = entry {
        *entry = Tree::Branch(BTreeMap::new());
    }
    if let Tree::Branch(children) = entry {
        insert_keyed(children, rest, row);
    }
}

/// First column → second column.
pub(crate) fn pair_rows(rows: &[Row]) -> BTreeMap<String, Value> {
    rows.iter()
        .filter_map(|row| {
            let key = row.get_index(0)?.to_string();
            let value = row.get_index(1).cloned().unwrap_or_default();
            Some((key, value))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(id: i64, group: &str, kind: &str) -> Row {
        Row::new().with("id", id).with("grp", group).with("kind", kind)
    }

    #[test]
    fn single_key_indexes_rows() {
        let keyed = key_rows(vec![row(1, "a", "x"), row(2, "b", "y")], &["id".to_string()]);
        let records = Records::Keyed(keyed);
        assert_eq!(records.len(), 2);
        assert_eq!(records.get_path(&["2"]), Some(&row(2, "b", "y")));
    }

    #[test]
    fn multiple_keys_nest() {
        let keys = ["grp".to_string(), "kind".to_string()];
        let keyed = key_rows(
            vec![row(1, "a", "x"), row(2, "a", "y"), row(3, "a", "x")],
            &keys,
        );
        let records = Records::Keyed(keyed);
        assert_eq!(records.len(), 2);
        assert_eq!(records.get_path(&["a", "x"]), Some(&row(3, "a", "x")));
        assert_eq!(records.get_path(&["a"]), None);
    }

    #[test]
    fn pairs_use_first_two_columns() {
        let rows = vec![
            Row::new().with("term", "cat").with("meaning", "paka"),
            Row::new().with("term", "dog").with("meaning", "mbwa"),
        ];
        let records = Records::Pairs(pair_rows(&rows));
        assert_eq!(records.pair("dog"), Some(&Value::from("mbwa")));
        assert!(records.rows().is_empty());
    }

    #[test]
    fn serializes_untagged() {
        let records = Records::Pairs(pair_rows(&[Row::new().with("k", "a").with("v", 1)]));
        assert_eq!(serde_json::to_string(&records).unwrap(), r#"{"a":1}"#);
    }
}
