use std::collections::HashMap;
use std::path::PathBuf;

use directories::ProjectDirs;
use serde::Deserialize;

use pullpo::error::{PullpoError, Result};
use pullpo::instance::{self, DEFAULT_HOST};
use pullpo::pagination::PER_PAGE;
use pullpo::HttpTransport;

#[derive(Deserialize, Default, Debug)]
pub struct HostConfig {
    pub token: Option<String>,
}

#[derive(Deserialize, Default, Debug)]
pub struct Config {
    /// Token used when no host-specific one is configured.
    pub token: Option<String>,
    pub default_host: Option<String>,
    pub per_page: Option<u32>,
    #[serde(default)]
    pub hosts: HashMap<String, HostConfig>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            return Ok(Config::default());
        }

        let contents = std::fs::read_to_string(&config_path).map_err(|e| PullpoError::ConfigRead {
            path: config_path.clone(),
            source: e,
        })?;

        toml::from_str(&contents).map_err(|e| PullpoError::ConfigParse {
            path: config_path,
            source: e,
        })
    }

    pub fn config_path() -> Result<PathBuf> {
        ProjectDirs::from("", "", "pullpo")
            .map(|dirs| dirs.config_dir().join("config.toml"))
            .ok_or(PullpoError::NoConfigDir)
    }

    /// Host to talk to: explicit argument, then `GH_HOST`, then the config
    /// file, then the public host.
    pub fn resolve_host(&self, explicit: Option<&str>) -> String {
        self.resolve_host_with(explicit, |k| std::env::var(k).ok())
    }

    fn resolve_host_with(&self, explicit: Option<&str>, env: impl Fn(&str) -> Option<String>) -> String {
        let host = explicit
            .map(String::from)
            .or_else(|| env("GH_HOST"))
            .or_else(|| self.default_host.clone())
            .unwrap_or_else(|| DEFAULT_HOST.to_string());
        instance::normalize_hostname(&host)
    }

    /// Token for `host`, with environment variables taking precedence over
    /// the config file.
    pub fn token(&self, host: &str) -> Result<String> {
        self.token_with(host, |k| std::env::var(k).ok())
    }

    fn token_with(&self, host: &str, env: impl Fn(&str) -> Option<String>) -> Result<String> {
        let host = instance::normalize_hostname(host);
        let env_keys: &[&str] = if instance::is_enterprise(&host) {
            &["GH_ENTERPRISE_TOKEN", "GITHUB_ENTERPRISE_TOKEN"]
        } else {
            &["GH_TOKEN", "GITHUB_TOKEN"]
        };

        env_keys
            .iter()
            .find_map(|k| env(k).filter(|v| !v.is_empty()))
            .or_else(|| {
                self.hosts
                    .iter()
                    .find(|(name, _)| instance::normalize_hostname(name) == host)
                    .and_then(|(_, h)| h.token.clone())
            })
            .or_else(|| self.token.clone())
            .ok_or(PullpoError::MissingToken(host))
    }

    pub fn per_page(&self) -> u32 {
        self.per_page.unwrap_or(PER_PAGE).clamp(1, PER_PAGE)
    }

    /// HTTP transport carrying the token for `host`.
    pub fn transport(&self, host: &str) -> Result<HttpTransport> {
        Ok(HttpTransport::new().with_token(host, self.token(host)?))
    }
}
