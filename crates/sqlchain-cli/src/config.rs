use serde::Deserialize;
use sqlchain::BuilderConfig;
use std::path::{Path, PathBuf};

/// A loaded `sqlchain.toml`.
///
/// ```toml
/// version = "1"
/// models = "${APP_ROOT}/models"
///
/// [builder]
/// strict_joins = false
/// max_sql_log_length = 500
/// ```
#[derive(Debug, Clone)]
pub struct ProjectConfig {
    pub config_dir: PathBuf,
    pub file: ConfigFile,
}

impl ProjectConfig {
    pub fn load(config_path: PathBuf) -> anyhow::Result<Self> {
        let config_dir = config_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf();

        let raw = std::fs::read_to_string(&config_path).map_err(|e| {
            anyhow::anyhow!(
                "failed to read config file {}: {e}",
                config_path.display()
            )
        })?;

        let file = ConfigFile::parse(&raw).map_err(|e| {
            anyhow::anyhow!(
                "failed to parse config file {}: {e:#}",
                config_path.display()
            )
        })?;

        Ok(Self { config_dir, file })
    }

    /// Defaults used when no config file exists.
    pub fn fallback() -> Self {
        Self {
            config_dir: PathBuf::from("."),
            file: ConfigFile::default(),
        }
    }

    pub fn resolve_path(&self, p: impl AsRef<Path>) -> PathBuf {
        let p = p.as_ref();
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.config_dir.join(p)
        }
    }

    pub fn models_dir(&self) -> PathBuf {
        self.resolve_path(&self.file.models)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,

    #[serde(default = "default_models")]
    pub models: String,

    #[serde(default)]
    pub builder: BuilderConfig,
}

fn default_models() -> String {
    "models".to_string()
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            version: "1".to_string(),
            models: default_models(),
            builder: BuilderConfig::default(),
        }
    }
}

impl ConfigFile {
    fn parse(raw: &str) -> anyhow::Result<Self> {
        let mut file: ConfigFile = toml::from_str(raw)?;
        file.models = expand_env_vars(&file.models)?;
        file.validate()?;
        Ok(file)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.version.trim() != "1" {
            anyhow::bail!("unsupported config version: {}", self.version);
        }
        if self.models.trim().is_empty() {
            anyhow::bail!("models must not be empty");
        }
        Ok(())
    }
}

fn expand_env_vars(input: &str) -> anyhow::Result<String> {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' || chars.peek() != Some(&'{') {
            out.push(c);
            continue;
        }
        chars.next();

        let mut key = String::new();
        let mut closed = false;
        for ch in chars.by_ref() {
            if ch == '}' {
                closed = true;
                break;
            }
            key.push(ch);
        }

        if !closed {
            anyhow::bail!("unterminated env var reference: ${{{key}");
        }
        if key.is_empty() {
            anyhow::bail!("invalid env var reference: ${{}}");
        }
        let v = std::env::var(&key)
            .map_err(|_| anyhow::anyhow!("missing env var for config expansion: {key}"))?;
        out.push_str(&v);
    }

    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_builder_table() {
        let file = ConfigFile::parse(
            "version = \"1\"\nmodels = \"defs\"\n[builder]\nstrict_joins = false\ndefault_page_size = 25\n",
        )
        .unwrap();
        assert_eq!(file.models, "defs");
        assert!(!file.builder.strict_joins);
        assert_eq!(file.builder.default_page_size, 25);
        assert_eq!(file.builder.max_sql_log_length, Some(200));
    }

    #[test]
    fn defaults_models_dir() {
        let file = ConfigFile::parse("version = \"1\"").unwrap();
        assert_eq!(file.models, "models");
        assert!(file.builder.strict_joins);
    }

    #[test]
    fn rejects_unknown_version() {
        let err = ConfigFile::parse("version = \"2\"").unwrap_err();
        assert_eq!(err.to_string(), "unsupported config version: 2");
    }

    #[test]
    fn expands_env_references() {
        let path = std::env::var("PATH").unwrap_or_default();
        assert_eq!(expand_env_vars("${PATH}/x").unwrap(), format!("{path}/x"));
        assert_eq!(expand_env_vars("plain $dir").unwrap(), "plain $dir");
        assert!(expand_env_vars("${").is_err());
        assert!(expand_env_vars("${}").is_err());
        assert!(expand_env_vars("${SQLCHAIN_SURELY_UNSET_VAR}").is_err());
    }

    #[test]
    fn resolves_relative_to_config_dir() {
        let project = ProjectConfig {
            config_dir: PathBuf::from("/srv/app"),
            file: ConfigFile::default(),
        };
        assert_eq!(project.models_dir(), PathBuf::from("/srv/app/models"));
        assert_eq!(project.resolve_path("/abs"), PathBuf::from("/abs"));
    }
}
