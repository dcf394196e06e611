//! Handles settings for the admin tool.
//!
//! Values come from an optional `settings.toml` in the working directory,
//! then from `HOUSEHOLD__*` environment variables (`HOUSEHOLD__DATABASE__URL`,
//! `HOUSEHOLD__APP__LEVEL`, `HOUSEHOLD__APP__TIMEZONE`).
use config::{Config, ConfigError, Environment, File, builder::DefaultState};
use serde::Deserialize;

pub const DEFAULT_DATABASE_URL: &str = "sqlite:./household.db?mode=rwc";

#[derive(Debug, Deserialize)]
pub struct Database {
    pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct App {
    pub level: String,
    pub timezone: String,
}

#[derive(Debug, Deserialize)]
pub struct Settings {
    pub database: Database,
    pub app: App,
}

fn with_defaults(
    builder: config::ConfigBuilder<DefaultState>,
) -> Result<config::ConfigBuilder<DefaultState>, ConfigError> {
    builder
        .set_default("database.url", DEFAULT_DATABASE_URL)?
        .set_default("app.level", "info")?
        .set_default("app.timezone", "America/Sao_Paulo")
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let settings = with_defaults(Config::builder())?
            .add_source(File::with_name("settings").required(false))
            .add_source(Environment::with_prefix("HOUSEHOLD").separator("__"))
            .build()?;

        settings.try_deserialize()
    }
}
