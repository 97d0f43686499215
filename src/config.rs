use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::env;

use crate::crud_framework::crud_config::DEFAULT_PAGE_SIZE;
use crate::infrastructure::chunked_upload::DEFAULT_CHUNK_SIZE;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub list: ListSettings,
    pub upload: UploadSettings,
    pub roles: RoleSettings,
    pub seed: SeedSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListSettings {
    pub page_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadSettings {
    pub chunk_size: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleSettings {
    pub cache_capacity: usize,
    /// Roles held by the console user
    pub granted: BTreeSet<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedSettings {
    pub penalties: usize,
    pub tickets: usize,
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|value| value.trim().parse().ok())
        .unwrap_or(default)
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let granted = env::var("CONSOLE_ROLES")
            .unwrap_or_else(|_| "admin".to_string())
            .split(',')
            .map(str::trim)
            .filter(|role| !role.is_empty())
            .map(str::to_string)
            .collect();

        let config = Self {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
                port: env_or("SERVER_PORT", 3000),
            },
            list: ListSettings {
                page_size: env_or("LIST_PAGE_SIZE", DEFAULT_PAGE_SIZE),
            },
            upload: UploadSettings {
                chunk_size: env_or("UPLOAD_CHUNK_SIZE", DEFAULT_CHUNK_SIZE),
            },
            roles: RoleSettings {
                cache_capacity: env_or("ROLE_CACHE_CAPACITY", 64),
                granted,
            },
            seed: SeedSettings {
                penalties: env_or("SEED_PENALTIES", 45),
                tickets: env_or("SEED_TICKETS", 30),
            },
        };

        if config.list.page_size == 0 {
            anyhow::bail!("LIST_PAGE_SIZE must be greater than 0");
        }
        if config.upload.chunk_size == 0 {
            anyhow::bail!("UPLOAD_CHUNK_SIZE must be greater than 0");
        }
        Ok(config)
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 3000,
            },
            list: ListSettings {
                page_size: DEFAULT_PAGE_SIZE,
            },
            upload: UploadSettings {
                chunk_size: DEFAULT_CHUNK_SIZE,
            },
            roles: RoleSettings {
                cache_capacity: 64,
                granted: ["admin".to_string()].into_iter().collect(),
            },
            seed: SeedSettings {
                penalties: 45,
                tickets: 30,
            },
        }
    }
}
