use serde::Deserialize;

/// Behaviour knobs for [`Query`](crate::Query).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BuilderConfig {
    /// Fail statements that contain a join without table or primary key.
    /// When off, such joins are skipped and a comment is recorded.
    pub strict_joins: bool,
    /// Page size used by [`Query::paginate_default`](crate::Query::paginate_default).
    pub default_page_size: u64,
    /// Truncate logged SQL (in bytes). `None` means no truncation.
    pub max_sql_log_length: Option<usize>,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            strict_joins: true,
            default_page_size: 10,
            max_sql_log_length: Some(200),
        }
    }
}

impl BuilderConfig {
    /// Create a new configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn strict_joins(mut self, strict: bool) -> Self {
        self.strict_joins = strict;
        self
    }

    pub fn default_page_size(mut self, size: u64) -> Self {
        self.default_page_size = size;
        self
    }

    /// Set maximum SQL length to log.
    pub fn max_sql_log_length(mut self, len: usize) -> Self {
        self.max_sql_log_length = Some(len);
        self
    }

    /// Disable SQL truncation in logs.
    pub fn no_truncate(mut self) -> Self {
        self.max_sql_log_length = None;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_strict() {
        let config = BuilderConfig::default();
        assert!(config.strict_joins);
        assert_eq!(config.default_page_size, 10);
        assert_eq!(config.max_sql_log_length, Some(200));
    }

    #[test]
    fn deserializes_partial_tables() {
        let config: BuilderConfig = toml::from_str("strict_joins = false").unwrap();
        assert_eq!(config, BuilderConfig::new().strict_joins(false));
    }
}
