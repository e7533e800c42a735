use serde::{Deserialize, Serialize};
use std::{
    net::{Ipv4Addr, SocketAddr},
    path::{Path, PathBuf},
};

pub const DEFAULT_PORT: u16 = 8100;
pub const DEFAULT_FIRMWARE_PATH: &str = "net_restart.ino.d32.bin";
pub const DEFAULT_TARGET_VERSION: &str = "0.03";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,

    // Firmware served to every device not on the target version
    pub firmware_path: PathBuf,
    pub target_version: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_PORT)),
            firmware_path: PathBuf::from(DEFAULT_FIRMWARE_PATH),
            target_version: DEFAULT_TARGET_VERSION.to_string(),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let mut config = Self::default();

        if let Ok(addr) = std::env::var("ESP_OTA_BIND_ADDR") {
            config.bind_addr = addr.parse()?;
        }

        if let Ok(path) = std::env::var("ESP_OTA_FIRMWARE_PATH") {
            config.firmware_path = PathBuf::from(path);
        }

        if let Ok(version) = std::env::var("ESP_OTA_TARGET_VERSION") {
            config.target_version = version;
        }

        Ok(config)
    }

    pub fn from_toml(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: ServerConfig = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.firmware_path.as_os_str().is_empty() {
            anyhow::bail!("firmware_path must be set");
        }

        if self.firmware_path.file_name().is_none() {
            anyhow::bail!(
                "firmware_path must name a file: {}",
                self.firmware_path.display()
            );
        }

        if self.target_version.is_empty() {
            anyhow::bail!("target_version must not be empty");
        }

        Ok(())
    }
}
