//! Configuration module
//!
//! Everything is read from the environment (optionally seeded from a `.env`
//! file). Whitelists that are unset or empty deny every client.

use std::env;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

use crate::policy::{OperationKind, Whitelist};

const SERVER_PORT: u16 = 9898;
const LISTEN_ADDRESS: &str = "127.0.0.1";
const MAX_CONNECTIONS: u32 = 20;
const CONNECTION_TIMEOUT_SECS: u64 = 30;
const TRUSTED_PROXY_COUNT: usize = 0;

/// Which store implementation backs the lifecycle services
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgres" | "postgresql" | "cockroachdb" => Ok(StoreBackend::Postgres),
            "memory" => Ok(StoreBackend::Memory),
            _ => Err(anyhow::anyhow!("Invalid store backend: {}", s)),
        }
    }
}

impl Display for StoreBackend {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            StoreBackend::Postgres => write!(f, "postgres"),
            StoreBackend::Memory => write!(f, "memory"),
        }
    }
}

/// Per-operation client IP whitelists
#[derive(Debug, Clone, Default)]
pub struct WhitelistConfig {
    pub list_all: Whitelist,
    pub soft_delete: Whitelist,
    pub hard_delete: Whitelist,
    pub recover_undo: Whitelist,
}

impl WhitelistConfig {
    pub fn from_env() -> Self {
        let read = |operation: OperationKind| {
            Whitelist::parse(&env::var(operation.whitelist_env_var()).unwrap_or_default())
        };

        Self {
            list_all: read(OperationKind::ListAll),
            soft_delete: read(OperationKind::SoftDelete),
            hard_delete: read(OperationKind::HardDelete),
            recover_undo: read(OperationKind::RecoverUndo),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Config {
    pub listen_address: String,
    pub server_port: u16,
    pub cors_origins: Vec<String>,
    pub environment: String,
    pub store_backend: StoreBackend,
    pub database_url: Option<String>,
    pub db_max_connections: u32,
    pub db_timeout_seconds: u64,
    pub trusted_proxy_count: usize,
    pub whitelists: WhitelistConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();

        let environment = env::var("ENVIRONMENT")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string());

        let cors_origins_str = env::var("CORS_ORIGINS").unwrap_or_else(|_| "*".to_string());
        let is_production =
            environment.to_lowercase() == "production" || environment.to_lowercase() == "prod";
        if is_production && cors_origins_str.trim() == "*" {
            return Err(anyhow::anyhow!(
                "CORS_ORIGINS cannot be '*' in production. Please specify explicit origins."
            ));
        }

        let cors_origins: Vec<String> = cors_origins_str
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let store_backend = env::var("STORE_BACKEND")
            .unwrap_or_else(|_| StoreBackend::Postgres.to_string())
            .parse()?;

        Ok(Self {
            listen_address: env::var("LISTEN_ADDRESS")
                .unwrap_or_else(|_| LISTEN_ADDRESS.to_string()),
            server_port: env::var("PORT")
                .unwrap_or_else(|_| SERVER_PORT.to_string())
                .parse()
                .map_err(|_| anyhow::anyhow!("PORT must be a valid number"))?,
            cors_origins,
            environment,
            store_backend,
            database_url: env::var("DATABASE_URL").ok().filter(|s| !s.trim().is_empty()),
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| MAX_CONNECTIONS.to_string())
                .parse()
                .unwrap_or(MAX_CONNECTIONS),
            db_timeout_seconds: env::var("DB_TIMEOUT_SECONDS")
                .unwrap_or_else(|_| CONNECTION_TIMEOUT_SECS.to_string())
                .parse()
                .unwrap_or(CONNECTION_TIMEOUT_SECS),
            trusted_proxy_count: env::var("TRUSTED_PROXY_COUNT")
                .unwrap_or_else(|_| TRUSTED_PROXY_COUNT.to_string())
                .parse()
                .unwrap_or(TRUSTED_PROXY_COUNT),
            whitelists: WhitelistConfig::from_env(),
        })
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if self.store_backend == StoreBackend::Postgres {
            match self.database_url.as_deref() {
                None => {
                    return Err(anyhow::anyhow!(
                        "DATABASE_URL must be set when STORE_BACKEND is postgres"
                    ))
                }
                Some(url) if !(url.starts_with("postgresql://") || url.starts_with("postgres://")) => {
                    return Err(anyhow::anyhow!(
                        "DATABASE_URL must be a valid PostgreSQL connection string"
                    ))
                }
                Some(_) => {}
            }
        }

        if self.is_production() && self.store_backend == StoreBackend::Memory {
            return Err(anyhow::anyhow!(
                "STORE_BACKEND=memory is not allowed in production"
            ));
        }

        if self.db_max_connections == 0 {
            return Err(anyhow::anyhow!("DB_MAX_CONNECTIONS must be greater than 0"));
        }

        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.environment.to_lowercase().eq("production")
            || self.environment.to_lowercase().eq("prod")
    }

    pub fn database_url(&self) -> Option<&str> {
        self.database_url.as_deref()
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.listen_address, self.server_port)
    }
}
