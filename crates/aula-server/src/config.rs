use std::net::{IpAddr, SocketAddr};

use clap::Parser;

use aula_core::PeriodActivationPolicy;
use aula_db::DbConfig;
use aula_store::StoreConfig;

#[derive(Debug, Clone, Parser)]
pub struct ServerConfig {
    /// Address to listen on
    #[arg(long, env = "AULA_BIND", default_value = "0.0.0.0")]
    pub bind: IpAddr,

    #[arg(long, env = "AULA_PORT", default_value = "8000")]
    pub port: u16,

    /// `postgres://…` selects Postgres; anything else uses SQLite
    #[arg(long, env = "AULA_DATABASE_URL")]
    pub database_url: Option<String>,

    /// SQLite database file (defaults to the data directory)
    #[arg(long, env = "AULA_SQLITE_PATH")]
    pub sqlite_path: Option<String>,

    /// What activating a period does while another one is active:
    /// auto-deactivate or exclusive-lock
    #[arg(long, env = "AULA_PERIOD_POLICY", default_value = "auto-deactivate")]
    pub period_policy: PeriodActivationPolicy,

    /// Lifetime of login tokens, in minutes
    #[arg(long, env = "AULA_TOKEN_TTL_MINUTES", default_value = "480")]
    pub token_ttl_minutes: i64,

    /// Comma-separated allowed origins; empty allows any origin
    #[arg(long, env = "AULA_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Vec<String>,

    /// Externally reachable base URL, used in file links
    #[arg(long, env = "AULA_PUBLIC_URL")]
    pub public_url: Option<String>,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind, self.port)
    }

    pub fn db_config(&self) -> DbConfig {
        DbConfig {
            database_url: self.database_url.clone(),
            sqlite_path: self.sqlite_path.clone(),
        }
    }

    /// Storage settings come from the environment; the public URL flag wins
    /// over `AULA_PUBLIC_URL`.
    pub fn store_config(&self) -> StoreConfig {
        let mut config = StoreConfig::from_env();
        if let Some(url) = &self.public_url {
            config.public_base_url = Some(url.trim_end_matches('/').to_string());
        }
        if config.public_base_url.is_none() {
            config.public_base_url = Some(format!("http://localhost:{}", self.port));
        }
        config
    }
}
