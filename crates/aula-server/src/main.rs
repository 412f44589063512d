use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use aula_core::user::CreateUser;
use aula_core::Role;
use aula_server::config::ServerConfig;
use aula_server::InnerAppState;
use aula_service::AcademicService;

#[derive(Parser)]
#[command(name = "aula-server", about = "Academic management API")]
struct Cli {
    #[command(flatten)]
    config: ServerConfig,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a user directly in the database (bootstraps the first
    /// administrator)
    CreateUser {
        #[arg(long)]
        national_id: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        full_name: String,
        /// docente, coordinador or rector
        #[arg(long, value_parser = parse_role)]
        role: Role,
        #[arg(long, env = "AULA_NEW_USER_PASSWORD")]
        password: String,
        #[arg(long)]
        site_id: Option<i64>,
    },
}

fn parse_role(s: &str) -> Result<Role, String> {
    Role::parse_str(s).ok_or_else(|| format!("unknown role '{s}' (docente, coordinador, rector)"))
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = cli.config;

    let db = aula_db::open(&config.db_config()).await?;
    let store = aula_store::create_store(&config.store_config())?;
    let service = AcademicService::new(db, store)
        .with_period_policy(config.period_policy)
        .with_token_ttl_minutes(config.token_ttl_minutes);

    match cli.command {
        Some(Commands::CreateUser {
            national_id,
            email,
            full_name,
            role,
            password,
            site_id,
        }) => {
            let user = service
                .bootstrap_user(&CreateUser {
                    email,
                    full_name,
                    national_id,
                    password,
                    role,
                    active: true,
                    phone: None,
                    site_id,
                })
                .await?;
            eprintln!("Created user {} ({}, id {})", user.full_name, user.role, user.id);
        }
        None => {
            if service.user_count().await? == 0 {
                warn!("no users exist yet; create one with `aula-server create-user`");
            }
            if !service.store().is_configured() {
                warn!(
                    backend = service.store().backend_name(),
                    "file storage is not configured; uploads will be rejected"
                );
            }

            let addr = config.socket_addr();
            let listener = TcpListener::bind(addr).await?;
            info!(
                %addr,
                storage = service.store().backend_name(),
                period_policy = %service.period_policy(),
                "aula-server listening"
            );

            let state = Arc::new(InnerAppState { service });
            aula_server::serve(listener, state, &config.cors_origins).await?;
        }
    }

    Ok(())
}
