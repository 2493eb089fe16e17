use crate::cli::{RenderArgs, RequestsArgs, Source};
use crate::config::ProjectConfig;
use serde::Serialize;
use sqlchain::{DryRunDriver, ModelRegistry, Recorded, Value};
use std::fmt::Write as _;

#[derive(Serialize)]
struct Statement<'a> {
    sql: &'a str,
    params: &'a [Value],
}

#[derive(Serialize)]
struct Report<'a> {
    request: &'a str,
    statements: Vec<Statement<'a>>,
    comments: &'a [String],
}

fn load(source: &Source) -> anyhow::Result<(ModelRegistry, DryRunDriver)> {
    let project = if source.config.exists() {
        ProjectConfig::load(source.config.clone())?
    } else if source.models.is_some() {
        ProjectConfig::fallback()
    } else {
        anyhow::bail!(
            "failed to load config {}; provide --models or create the file",
            source.config.display()
        );
    };

    let models = match &source.models {
        Some(dir) => dir.clone(),
        None => project.models_dir(),
    };
    let driver = DryRunDriver::new().with_models_dir(&models);
    let mut registry = ModelRegistry::new().with_config(project.file.builder.clone());
    registry
        .load_dir(&models, &driver)
        .map_err(|e| anyhow::anyhow!("failed to load models from {}: {e}", models.display()))?;
    Ok((registry, driver))
}

pub fn run(args: RenderArgs) -> anyhow::Result<()> {
    print!("{}", render(&args)?);
    Ok(())
}

fn render(args: &RenderArgs) -> anyhow::Result<String> {
    let (registry, driver) = load(&args.source)?;
    let params = args.params.iter().map(|p| Value::parse_lenient(p)).collect();

    let q = registry
        .request(&driver, &args.request, params)
        .map_err(|e| anyhow::anyhow!("{}: {e}", args.request))?;

    let mut comments = registry.comments().to_vec();
    comments.extend(q.comments().iter().cloned());
    let recorded = driver.recorded();

    if args.json {
        let report = Report {
            request: &args.request,
            statements: recorded
                .iter()
                .map(|r| Statement {
                    sql: &r.sql,
                    params: &r.params,
                })
                .collect(),
            comments: &comments,
        };
        return Ok(format!("{}\n", serde_json::to_string_pretty(&report)?));
    }

    format_plain(&recorded, &comments)
}

fn format_plain(recorded: &[Recorded], comments: &[String]) -> anyhow::Result<String> {
    let mut out = String::new();
    for comment in comments {
        writeln!(out, "-- {comment}")?;
    }
    for statement in recorded {
        writeln!(out, "{};", statement.sql)?;
        if !statement.params.is_empty() {
            writeln!(out, "-- params: {}", serde_json::to_string(&statement.params)?)?;
        }
    }
    Ok(out)
}

pub fn list(args: RequestsArgs) -> anyhow::Result<()> {
    let (registry, _driver) = load(&args.source)?;
    for comment in registry.comments() {
        eprintln!("warning: {comment}");
    }
    for name in registry.requests() {
        println!("{name}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    const POSTS: &str = r#"
name = "posts"

[table]
name = "blog_posts"
primary = "id"

[[table.fields]]
name = "id"

[[table.fields]]
name = "title"

[[sql]]
name = "by_author"
type = "select"
table = "posts"
where = "author = ?"
pager = { limit = 20 }

[[sql]]
name = "retitle"
type = "update"
table = "posts"
where = "id = ?"
set = [{ name = "title", value = "?" }]
"#;

    fn make_temp_dir() -> PathBuf {
        let nonce = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time")
            .as_nanos();
        let dir = std::env::temp_dir().join(format!("sqlchain-cli-test-{nonce}"));
        std::fs::create_dir_all(&dir).expect("mkdir");
        std::fs::write(dir.join("posts.toml"), POSTS).expect("write model");
        dir
    }

    fn render_args(dir: &PathBuf, request: &str, params: &[&str], json: bool) -> RenderArgs {
        RenderArgs {
            source: Source {
                config: dir.join("missing.toml"),
                models: Some(dir.clone()),
            },
            request: request.to_string(),
            params: params.iter().map(|p| p.to_string()).collect(),
            json,
        }
    }

    #[test]
    fn renders_select_with_params() {
        let dir = make_temp_dir();
        let out = render(&render_args(&dir, "posts.by_author", &["ann"], false)).unwrap();
        assert_eq!(
            out,
            "SELECT `posts`.`id`,`posts`.`title` FROM `blog_posts` AS `posts` \
             WHERE author = ? LIMIT 20;\n-- params: [\"ann\"]\n"
        );
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn renders_json_report() {
        let dir = make_temp_dir();
        let out = render(&render_args(&dir, "retitle", &["Hello", "7"], true)).unwrap();
        let report: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(report["request"], "retitle");
        assert_eq!(
            report["statements"][0]["sql"],
            "UPDATE `blog_posts` AS `posts` SET `title`=? WHERE id = ?"
        );
        assert_eq!(report["statements"][0]["params"], serde_json::json!(["Hello", 7]));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn reads_models_dir_from_config() {
        let dir = make_temp_dir();
        let models = dir.join("defs");
        std::fs::create_dir_all(&models).unwrap();
        std::fs::rename(dir.join("posts.toml"), models.join("posts.toml")).unwrap();
        std::fs::write(dir.join("sqlchain.toml"), "version = \"1\"\nmodels = \"defs\"\n").unwrap();

        let args = RenderArgs {
            source: Source {
                config: dir.join("sqlchain.toml"),
                models: None,
            },
            request: "posts.by_author".to_string(),
            params: vec!["ann".to_string()],
            json: false,
        };
        assert!(render(&args).unwrap().starts_with("SELECT"));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn unknown_request_names_the_request() {
        let dir = make_temp_dir();
        let err = render(&render_args(&dir, "posts.nope", &[], false)).unwrap_err();
        assert_eq!(
            err.to_string(),
            "posts.nope: Not found: Request not found: posts.nope"
        );
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn missing_config_without_models_fails() {
        let source = Source {
            config: PathBuf::from("/nonexistent/sqlchain.toml"),
            models: None,
        };
        let err = load(&source).err().unwrap();
        assert!(err.to_string().contains("provide --models"));
    }
}
