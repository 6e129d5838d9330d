use std::{
    net::{IpAddr, SocketAddr},
    path::{Path, PathBuf},
};

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// Looked up as `./sensorlog.{toml,json,yaml,ron,...}` when no path is given
pub const CONFIG_FILE_STEM: &str = "sensorlog";
/// `SENSORLOG_DATA_DIR`, `SENSORLOG_BIND_ADDR`
pub const ENV_PREFIX: &str = "SENSORLOG";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ServerConfig {
    pub bind_addr: IpAddr,
    /// where the `<sensor>.dat` files live
    pub data_dir: PathBuf,
}

impl ServerConfig {
    /// defaults < config file < environment
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let file = match path {
            Some(path) => File::from(path).required(true),
            None => File::with_name(CONFIG_FILE_STEM).required(false),
        };

        Config::builder()
            .set_default("bind_addr", "0.0.0.0")?
            .set_default("data_dir", ".")?
            .add_source(file)
            .add_source(Environment::with_prefix(ENV_PREFIX))
            .build()?
            .try_deserialize()
    }

    pub fn listen_addr(&self, port: u16) -> SocketAddr {
        SocketAddr::new(self.bind_addr, port)
    }
}
