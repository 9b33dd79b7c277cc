use std::net::{IpAddr, Ipv4Addr};
use std::path::{Path, PathBuf};

use anyhow::Context;
use directories_next::ProjectDirs;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Prefix for the share links shown on paste pages.
    pub base_url: String,
    #[serde(default = "default_address")]
    pub address: IpAddr,
    pub port: u16,
    pub store: Store,
    #[serde(default)]
    pub database: Option<Database>,
    pub limits: Limits,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Database {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Store {
    pub kind: StoreKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    Database,
    /// Process-local, lost on restart.
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Limits {
    pub max_upload_size: usize,
    /// Password key derivations allowed to run at once.
    #[serde(default = "default_kdf_workers")]
    pub kdf_workers: usize,
}

fn default_address() -> IpAddr {
    IpAddr::V4(Ipv4Addr::LOCALHOST)
}

fn default_kdf_workers() -> usize {
    std::thread::available_parallelism()
        .map(usize::from)
        .unwrap_or(1)
}

impl Config {
    /// Read the config from `path`, or from the platform config directory.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let path = match path {
            Some(path) => path.to_owned(),
            None => default_path()?,
        };

        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn parse(text: &str) -> anyhow::Result<Self> {
        let config: Config = toml::from_str(text).context("failed to deserialize config")?;

        if config.store.kind == StoreKind::Database && config.database.is_none() {
            anyhow::bail!("store kind is 'database' but no [database] section is set");
        }
        if config.limits.kdf_workers == 0 {
            anyhow::bail!("limits.kdf_workers must be at least 1");
        }

        Ok(config)
    }
}

fn default_path() -> anyhow::Result<PathBuf> {
    let dirs = ProjectDirs::from("", "", "pastebox")
        .context("could not determine the config directory")?;
    Ok(dirs.config_dir().join("config.toml"))
}
