use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Error, Result};

pub const DB_FILE: &str = "vinculo.db";
pub const CONFIG_FILE: &str = "vinculo.toml";
pub const ADMIN_TOKEN_FILE: &str = ".admin_token";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
}

/// Optional overrides read from `<data_dir>/vinculo.toml`.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
}

impl FileConfig {
    /// Reads the config file if present. A missing file yields the defaults.
    pub fn read(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(path)?;
        toml::from_str(&raw).map_err(|e| Error::Config(format!("{}: {e}", path.display())))
    }
}

impl ServerConfig {
    /// Builds the config for `data_dir`: defaults, then the config file, then
    /// explicit overrides.
    pub fn load(data_dir: PathBuf, host: Option<String>, port: Option<u16>) -> Result<Self> {
        let file = FileConfig::read(&data_dir.join(CONFIG_FILE))?;
        let defaults = Self::default();

        Ok(Self {
            host: host.or(file.host).unwrap_or(defaults.host),
            port: port.or(file.port).unwrap_or(defaults.port),
            data_dir,
        })
    }

    pub fn socket_addr(&self) -> std::result::Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }

    #[must_use]
    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(DB_FILE)
    }

    #[must_use]
    pub fn admin_token_path(&self) -> PathBuf {
        self.data_dir.join(ADMIN_TOKEN_FILE)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            data_dir: PathBuf::from("./data"),
        }
    }
}
