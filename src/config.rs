use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{CleanupError, Result};

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub people: PeopleConfig,
    pub auth: AuthConfig,
    pub limits: LimitsConfig,
    pub export: ExportConfig,
    pub database: DatabaseConfig,
    pub rules: RulesConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PeopleConfig {
    pub base_url: String,
    pub page_size: u32,
    pub timeout_secs: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub token_path: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LimitsConfig {
    pub list_calls_per_minute: u32,
    pub delete_calls_per_minute: u32,
    pub initial_backoff_secs: u64,
    pub max_retries: u32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ExportConfig {
    pub output_dir: String,
    pub keep_file: String,
    pub delete_file: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub path: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RulesConfig {
    pub order: Vec<String>,
}

impl Config {
    /// Load `path` (optional) layered under `CONTACT_CLEANUP__*` environment variables.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        dotenv::dotenv().ok();

        let config = Self::builder()?
            .add_source(config::File::with_name(path).required(false))
            .add_source(
                config::Environment::with_prefix("CONTACT_CLEANUP")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("rules.order")
                    .try_parsing(true),
            )
            .build()?;

        let config: Config = config.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Built-in defaults only, no file or environment.
    pub fn defaults() -> anyhow::Result<Self> {
        Ok(Self::builder()?.build()?.try_deserialize()?)
    }

    fn builder() -> anyhow::Result<config::ConfigBuilder<config::builder::DefaultState>> {
        Ok(config::Config::builder()
            .set_default("people.base_url", "https://people.googleapis.com")?
            .set_default("people.page_size", 2000)?
            .set_default("people.timeout_secs", 30)?
            .set_default("auth.token_path", "token.json")?
            .set_default("limits.list_calls_per_minute", 90)?
            .set_default("limits.delete_calls_per_minute", 90)?
            .set_default("limits.initial_backoff_secs", 2)?
            .set_default("limits.max_retries", 6)?
            .set_default("export.output_dir", ".")?
            .set_default("export.keep_file", "skipped_contacts.csv")?
            .set_default("export.delete_file", "to_delete_contacts.csv")?
            .set_default("database.path", "contact_cleanup.db")?
            .set_default(
                "rules.order",
                vec!["phone_number_has_label", "multiple_phone_numbers", "multiple_labels"],
            )?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.limits.list_calls_per_minute == 0 || self.limits.delete_calls_per_minute == 0 {
            return Err(CleanupError::Config(
                "calls per minute must be greater than zero".to_string(),
            ));
        }
        if self.people.page_size == 0 {
            return Err(CleanupError::Config("page size must be greater than zero".to_string()));
        }
        if self.people.timeout_secs == 0 {
            return Err(CleanupError::Config("request timeout must be greater than zero".to_string()));
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.people.timeout_secs)
    }

    pub fn initial_backoff(&self) -> Duration {
        Duration::from_secs(self.limits.initial_backoff_secs)
    }

    pub fn keep_path(&self) -> PathBuf {
        PathBuf::from(&self.export.output_dir).join(&self.export.keep_file)
    }

    pub fn delete_path(&self) -> PathBuf {
        PathBuf::from(&self.export.output_dir).join(&self.export.delete_file)
    }
}
