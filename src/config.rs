use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use crate::error::ConfigError;

/// Server settings.
///
/// Built from defaults, then an optional TOML file named by `CHESS_CONFIG`,
/// then the `HOST`, `PORT`, `STATIC_DIR` and `VERIFY_MOVES` environment
/// variables.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub static_dir: PathBuf,
    pub log_filter: String,
    pub verify_moves: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            host: "127.0.0.1".to_string(),
            port: 8080,
            static_dir: PathBuf::from("./static"),
            log_filter: "info".to_string(),
            verify_moves: false,
        }
    }
}

impl Config {
    pub fn load() -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = std::env::vars().collect();
        Config::from_vars(&vars)
    }

    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Config, ConfigError> {
        let mut config = match vars.get("CHESS_CONFIG") {
            Some(path) => {
                let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
                    path: path.clone(),
                    source,
                })?;
                Config::from_toml(&contents)?
            }
            None => Config::default(),
        };

        if let Some(host) = vars.get("HOST") {
            config.host = host.clone();
        }
        if let Some(port) = vars.get("PORT") {
            config.port = port.parse().map_err(|_| ConfigError::InvalidValue {
                key: "PORT",
                value: port.clone(),
            })?;
        }
        if let Some(dir) = vars.get("STATIC_DIR") {
            config.static_dir = PathBuf::from(dir);
        }
        if let Some(flag) = vars.get("VERIFY_MOVES") {
            config.verify_moves = match flag.as_str() {
                "1" | "true" | "yes" => true,
                "0" | "false" | "no" => false,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        key: "VERIFY_MOVES",
                        value: flag.clone(),
                    })
                }
            };
        }
        Ok(config)
    }

    pub fn from_toml(contents: &str) -> Result<Config, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn bind_address(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }
}
