use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use prosweet_core::caldav::DEFAULT_TIMEOUT;
use prosweet_core::{CalDavConfig, Credentials, UpdateStrategy};
use serde::Deserialize;

pub const PASSWORD_ENV: &str = "PROSWEET_PASSWORD";

/// Contents of `config.toml`. Every key is optional; flags fill the gaps.
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub base_url: Option<String>,
    pub username: Option<String>,
    pub calendar_id: Option<String>,
    pub timeout_secs: Option<u64>,
    pub update_strategy: Option<UpdateStrategy>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum StrategyArg {
    InPlace,
    DeleteAndRecreate,
}

impl From<StrategyArg> for UpdateStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::InPlace => UpdateStrategy::InPlace,
            StrategyArg::DeleteAndRecreate => UpdateStrategy::DeleteAndRecreate,
        }
    }
}

/// Connection flags, overriding the config file.
#[derive(Debug, Default, Args)]
pub struct ConnectionArgs {
    /// Config file (defaults to ~/.config/prosweet/config.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// CalDAV server root, e.g. https://dav.example.com/calendars
    #[arg(long)]
    pub base_url: Option<String>,

    #[arg(long)]
    pub username: Option<String>,

    #[arg(long)]
    pub calendar_id: Option<String>,

    /// Request timeout in seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    #[arg(long, value_enum)]
    pub update_strategy: Option<StrategyArg>,
}

/// Everything needed to reach the calendar, except the password.
#[derive(Debug)]
pub struct Settings {
    pub caldav: CalDavConfig,
    pub username: String,
}

/// Get the config file path (~/.config/prosweet/config.toml)
pub fn config_path() -> Result<PathBuf> {
    let dir = dirs::config_dir()
        .context("Could not determine config directory")?
        .join("prosweet");
    Ok(dir.join("config.toml"))
}

/// Load a config file. A missing file is an empty config.
pub fn load_from(path: &Path) -> Result<FileConfig> {
    if !path.exists() {
        return Ok(FileConfig::default());
    }

    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file at {}", path.display()))?;

    toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config file at {}", path.display()))
}

impl ConnectionArgs {
    /// Read the config file these flags point at and merge the flags over it.
    pub fn load(&self) -> Result<Settings> {
        let path = match &self.config {
            Some(path) => path.clone(),
            None => config_path()?,
        };
        let file = load_from(&path)?;
        self.resolve(file, &path)
    }

    fn resolve(&self, file: FileConfig, path: &Path) -> Result<Settings> {
        let missing = |key: &str, flag: &str| {
            anyhow::anyhow!(
                "No {} configured.\n\n\
                Set `{}` in {} or pass {}",
                key,
                key,
                path.display(),
                flag
            )
        };

        let base_url = self
            .base_url
            .clone()
            .or(file.base_url)
            .ok_or_else(|| missing("base_url", "--base-url"))?;
        let username = self
            .username
            .clone()
            .or(file.username)
            .ok_or_else(|| missing("username", "--username"))?;
        let calendar_id = self
            .calendar_id
            .clone()
            .or(file.calendar_id)
            .ok_or_else(|| missing("calendar_id", "--calendar-id"))?;

        let timeout = self
            .timeout_secs
            .or(file.timeout_secs)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_TIMEOUT);
        if timeout.is_zero() {
            anyhow::bail!("timeout_secs must be greater than zero");
        }

        let update_strategy = self
            .update_strategy
            .map(UpdateStrategy::from)
            .or(file.update_strategy)
            .unwrap_or_default();

        let caldav = CalDavConfig::new(base_url, calendar_id)
            .with_timeout(timeout)
            .with_update_strategy(update_strategy);

        Ok(Settings { caldav, username })
    }
}

impl Settings {
    /// Credentials for this user, taking the password from the environment or
    /// prompting for it.
    pub fn credentials(&self) -> Result<Credentials> {
        let password = match std::env::var(PASSWORD_ENV) {
            Ok(password) if !password.is_empty() => password,
            _ => rpassword::prompt_password(format!("Password for {}: ", self.username))
                .context("Failed to read password")?,
        };
        Ok(Credentials::new(self.username.clone(), password))
    }
}
