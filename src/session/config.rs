use crate::error::{Result, StructureError};
use crate::logger::{log, LogSeverity::Info};
use crate::structure::Offset;
use serde::Deserialize;
use std::path::PathBuf;

pub const CONFIG_PATH_ENV: &str = "STRUCTURE_EDITOR_CONFIG";
pub const AUTHOR_ENV: &str = "STRUCTURE_EDITOR_AUTHOR";
pub const SOURCE_ENV: &str = "STRUCTURE_EDITOR_SOURCE";

pub const DEFAULT_AUTHOR: &str = "SliceThePi";

/// Starting state of an editor session.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Author stamped on saved structures.
    pub author: String,
    /// Directory structures are loaded from and saved to.
    pub source: PathBuf,
    pub origin: [i32; 3],
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            author: DEFAULT_AUTHOR.to_owned(),
            source: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            origin: [0, 0, 0],
        }
    }
}

impl SessionConfig {
    /// Defaults, then the JSON file named by `STRUCTURE_EDITOR_CONFIG`, then
    /// the author and source environment overrides.
    pub async fn load() -> Result<Self> {
        let config = match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => {
                let text = tokio::fs::read_to_string(&path).await?;
                log(format!("Read configuration from {}", path), Info);
                SessionConfig::from_json(&text)?
            }
            Err(_) => SessionConfig::default(),
        };
        Ok(config.with_overrides(|name| std::env::var(name).ok()))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text)
            .map_err(|e| StructureError::MalformedValue(format!("configuration: {}", e)))
    }

    pub fn with_overrides<F: Fn(&str) -> Option<String>>(mut self, lookup: F) -> Self {
        if let Some(author) = lookup(AUTHOR_ENV).filter(|value| !value.is_empty()) {
            self.author = author;
        }
        if let Some(source) = lookup(SOURCE_ENV).filter(|value| !value.is_empty()) {
            self.source = PathBuf::from(source);
        }
        self
    }

    pub fn origin(&self) -> Offset {
        Offset::from(self.origin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.author, DEFAULT_AUTHOR);
        assert_eq!(config.origin(), Offset::ZERO);
    }

    #[test]
    fn test_from_json_fills_missing_fields() {
        let config = SessionConfig::from_json(r#"{"author": "Builder", "origin": [1, 2, 3]}"#)
            .unwrap();
        assert_eq!(config.author, "Builder");
        assert_eq!(config.origin(), Offset::new(1, 2, 3));
        assert_eq!(config.source, SessionConfig::default().source);

        assert_matches!(
            SessionConfig::from_json(r#"{"origin": "up"}"#),
            Err(StructureError::MalformedValue(_))
        );
    }

    #[test]
    fn test_overrides_win_over_file() {
        let config = SessionConfig::from_json(r#"{"author": "Builder"}"#)
            .unwrap()
            .with_overrides(|name| match name {
                AUTHOR_ENV => Some("Override".to_owned()),
                SOURCE_ENV => Some("/srv/structures".to_owned()),
                _ => None,
            });
        assert_eq!(config.author, "Override");
        assert_eq!(config.source, PathBuf::from("/srv/structures"));
    }

    #[test]
    fn test_empty_overrides_are_ignored() {
        let config = SessionConfig::default().with_overrides(|_| Some(String::new()));
        assert_eq!(config, SessionConfig::default());
    }
}
