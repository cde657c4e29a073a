//! Environment-driven configuration.

use secrecy::SecretString;
use services::services::dashboard::DatabaseIds;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing configuration: {0} environment variable not set")]
    MissingVar(&'static str),
}

/// Server configuration: the integration token plus one identifier per
/// remote database.
#[derive(Clone, Debug)]
pub struct DashboardConfig {
    pub notion_token: SecretString,
    pub projects_db: String,
    pub improvements_db: String,
    pub notes_db: String,
    pub tasks_db: String,
    pub photos_db: String,
    pub host: String,
    pub port: u16,
}

impl DashboardConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Lookup-injected variant; lets tests exercise the error paths
    /// without touching the process environment.
    pub fn from_lookup(
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let require = |key: &'static str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::MissingVar(key))
        };

        Ok(Self {
            notion_token: SecretString::from(require("NOTION_TOKEN")?),
            projects_db: require("NOTION_PROJECTS_DB")?,
            improvements_db: require("NOTION_IMPROVEMENTS_DB")?,
            notes_db: require("NOTION_NOTES_DB")?,
            tasks_db: require("NOTION_TASKS_DB")?,
            photos_db: require("NOTION_PHOTOS_DB")?,
            host: lookup("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: lookup("PORT").and_then(|p| p.parse().ok()).unwrap_or(3000),
        })
    }

    pub fn database_ids(&self) -> DatabaseIds {
        DatabaseIds {
            projects: self.projects_db.clone(),
            improvements: self.improvements_db.clone(),
            notes: self.notes_db.clone(),
            tasks: self.tasks_db.clone(),
            photos: self.photos_db.clone(),
        }
    }
}
