use super::*;
use crate::driver::DryRunDriver;
use crate::pager::Paginator;
use crate::predicate::PredicateDef;
use std::path::PathBuf;
use std::time::{SystemTime, UNIX_EPOCH};

const USERS: &str = r#"
name = "users"
include = ["groups"]

[table]
name = "site_users"
primary = "id"

[[table.fields]]
name = "id"
protected = true

[[table.fields]]
name = "name"

[[table.fields]]
name = "group_id"
link = "groups"

[[sql]]
name = "active"
type = "select"
table = "users"
where = ["active = 1"]
order = ["-id"]
pager = { size = 10, page = 2 }

[[sql.link]]
name = "group_id"
alias = "grp"
type = "left"

[[sql]]
name = "create"
type = "insert"
table = "users"

[[sql.set]]
name = "id"
value = "?"

[[sql.set]]
name = "name"
value = "?"

[[sql]]
name = "rename"
type = "update"
table = "users"
where = "id = ?"
set = [{ name = "name", value = "?" }]

[[sql]]
name = "purge"
type = "delete"
table = "users"
where = { type = "and", items = ["active = 0", "name = ?"] }
"#;

const GROUPS: &str = r#"
name = "groups"

[table]
name = "site_groups"
primary = "id"

[[table.fields]]
name = "title"

[[table.fields]]
name = "secret"
hidden = true

[[sql]]
name = "titles"
type = "select"
table = "groups"
fields = [{ name = "label", expr = "title" }]
"#;

fn make_temp_dir() -> PathBuf {
    let nonce = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("time")
        .as_nanos();
    let dir = std::env::temp_dir().join(format!("sqlchain-model-test-{nonce}"));
    std::fs::create_dir_all(&dir).expect("mkdir");
    dir
}

fn registry(driver: &DryRunDriver) -> ModelRegistry {
    let mut registry = ModelRegistry::new();
    registry
        .add(ModelDef::from_toml(GROUPS).unwrap(), driver)
        .add(ModelDef::from_toml(USERS).unwrap(), driver);
    registry
}

#[test]
fn parses_model_definition() {
    let def = ModelDef::from_toml(USERS).unwrap();
    assert_eq!(def.name, "users");
    assert_eq!(def.include, ["groups"]);

    let table = def.table.as_ref().unwrap();
    assert_eq!(table.name, "site_users");
    assert_eq!(table.fields.len(), 3);
    assert_eq!(table.fields[2].link.as_deref(), Some("groups"));

    let active = def.request("active").unwrap();
    assert_eq!(active.kind, StatementType::Select);
    assert_eq!(
        active.where_,
        Some(PredicateDef::List(vec![PredicateDef::Text("active = 1".into())]))
    );
    assert_eq!(
        active.pager,
        Some(Paginator {
            size: 10,
            page: 2,
            ..Paginator::default()
        })
    );
    assert_eq!(active.link[0].kind, "left");

    let create = def.request("create").unwrap();
    assert_eq!(create.kind, StatementType::Insert);
    assert_eq!(create.set.len(), 2);
}

#[test]
fn rejects_invalid_definitions() {
    let err = ModelDef::from_toml("name = \"\"").unwrap_err();
    assert!(err.to_string().contains("model name must not be empty"));

    let err = ModelDef::from_toml("name = \"x\"\n[[sql]]\nname = \"q\"\ntype = \"merge\"\ntable = \"x\"")
        .unwrap_err();
    assert!(matches!(err, ChainError::Definition(_)));

    let err = ModelDef::from_toml("name = \"x\"\n[[sql]]\nname = \"q\"\ntype = \"select\"\ntable = \"\"")
        .unwrap_err();
    assert!(err.to_string().contains("request x.q has no table"));

    let err = ModelDef::from_toml(
        "name = \"x\"\n[[sql]]\nname = \"q\"\ntype = \"select\"\ntable = \"x\"\n\
         where = { type = \"xor\", items = [\"a = 1\", \"b = 2\"] }",
    )
    .unwrap_err();
    assert_eq!(
        err,
        ChainError::definition("request x.q: unknown predicate type: xor")
    );
}

#[test]
fn select_request_resolves_links_into_joins() {
    let driver = DryRunDriver::new();
    let registry = registry(&driver);

    let q = registry.request(&driver, "users.active", vec![]).unwrap();
    assert!(q.is_ok());
    assert_eq!(
        q.executed(),
        [
            "SELECT `users`.`id`,`users`.`name`,`users`.`group_id`,`grp`.`title` \
             FROM `site_users` AS `users` \
             LEFT JOIN `site_groups` AS `grp` ON `grp`.`id`=`users`.`group_id` \
             WHERE active = 1 ORDER BY id DESC LIMIT 10 OFFSET 10"
        ]
    );
    assert_eq!(driver.prepare_count(), 1);
}

#[test]
fn select_request_uses_its_own_fields() {
    let driver = DryRunDriver::new();
    let registry = registry(&driver);

    let q = registry.request(&driver, "titles", vec![]).unwrap();
    assert_eq!(
        q.executed(),
        ["SELECT `groups`.`title` AS `label` FROM `site_groups` AS `groups`"]
    );
}

#[test]
fn insert_request_skips_protected_columns() {
    let driver = DryRunDriver::new();
    let registry = registry(&driver);

    registry
        .request(&driver, "users.create", vec!["bob".into()])
        .unwrap();
    let recorded = driver.recorded();
    assert_eq!(recorded[0].sql, "INSERT INTO `site_users` SET `name`=?");
    assert_eq!(recorded[0].params, vec![Value::from("bob")]);
}

#[test]
fn update_and_delete_requests_apply_where() {
    let driver = DryRunDriver::new();
    let registry = registry(&driver);

    registry
        .request(&driver, "rename", vec!["alice".into(), 7.into()])
        .unwrap();
    registry
        .request(&driver, "users.purge", vec!["bob".into()])
        .unwrap();

    let recorded = driver.recorded();
    assert_eq!(
        recorded[0].sql,
        "UPDATE `site_users` AS `users` SET `name`=? WHERE id = ?"
    );
    assert_eq!(recorded[0].params, vec![Value::from("alice"), Value::Int(7)]);
    assert_eq!(
        recorded[1].sql,
        "DELETE FROM `site_users` WHERE (active = 0 AND name = ?)"
    );
}

#[test]
fn unknown_requests_are_not_found() {
    let driver = DryRunDriver::new();
    let registry = registry(&driver);

    let err = registry.request(&driver, "users.nope", vec![]).err().unwrap();
    assert!(err.is_not_found());
    assert_eq!(err.to_string(), "Not found: Request not found: users.nope");

    let err = registry.request(&driver, "ghosts.list", vec![]).err().unwrap();
    assert_eq!(err.to_string(), "Not found: Model not found: ghosts");

    assert!(registry.find_request("nope").unwrap_err().is_not_found());
}

#[test]
fn request_on_model_without_table_is_not_found() {
    let driver = DryRunDriver::new();
    let mut registry = ModelRegistry::new();
    let def = ModelDef::from_toml(
        "name = \"reports\"\n[[sql]]\nname = \"all\"\ntype = \"select\"\ntable = \"reports\"",
    )
    .unwrap();
    registry.add(def, &driver);

    let err = registry.request(&driver, "reports.all", vec![]).err().unwrap();
    assert_eq!(err, ChainError::not_found("No table for model: reports"));
}

#[test]
fn link_to_unknown_model_fails() {
    let driver = DryRunDriver::new();
    let mut registry = ModelRegistry::new();
    registry.add(ModelDef::from_toml(USERS).unwrap(), &driver);

    let err = registry.request(&driver, "users.active", vec![]).err().unwrap();
    assert_eq!(
        err,
        ChainError::validation("No model for join users.group_id")
    );
    assert_eq!(registry.comments(), ["Model not found: groups"]);
}

#[test]
fn includes_load_through_driver_models_dir() {
    let dir = make_temp_dir();
    std::fs::write(dir.join("groups.toml"), GROUPS).unwrap();
    let driver = DryRunDriver::new().with_models_dir(&dir);

    let mut registry = ModelRegistry::new();
    registry.add(ModelDef::from_toml(USERS).unwrap(), &driver);

    assert!(registry.comments().is_empty());
    assert_eq!(
        registry.models().map(|m| m.name.as_str()).collect::<Vec<_>>(),
        ["users", "groups"]
    );
    assert_eq!(registry.use_table("groups").unwrap().name, "site_groups");

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn load_dir_registers_toml_files_in_name_order() {
    let dir = make_temp_dir();
    std::fs::write(dir.join("b_users.toml"), USERS).unwrap();
    std::fs::write(dir.join("a_groups.toml"), GROUPS).unwrap();
    std::fs::write(dir.join("notes.txt"), "not a model").unwrap();
    let driver = DryRunDriver::new();

    let mut registry = ModelRegistry::new();
    let added = registry.load_dir(&dir, &driver).unwrap();
    assert_eq!(added, 2);
    assert_eq!(
        registry.requests(),
        [
            "groups.titles",
            "users.active",
            "users.create",
            "users.rename",
            "users.purge"
        ]
    );
    // groups was already registered when users asked for it
    assert!(registry.comments().is_empty());

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn registry_config_reaches_queries() {
    let driver = DryRunDriver::new();
    let mut registry = ModelRegistry::new().with_config(BuilderConfig::default().no_truncate());
    registry.add(ModelDef::from_toml(GROUPS).unwrap(), &driver);

    let q = registry.request(&driver, "groups.titles", vec![]).unwrap();
    assert_eq!(q.config().max_sql_log_length, None);
}
