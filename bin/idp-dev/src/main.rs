//! Identity Provider Development Tool
//!
//! Wires the identity domain core to MongoDB for local development:
//! - index initialisation
//! - dev data seeding (one user, one client per protocol)
//! - expired authorization code purge
//! - store statistics

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use idp_config::{AppConfig, ConfigLoader};
use idp_core::store::{
    initialize_indexes, MongoAuthorizationCodeRepository, MongoClientRepository,
    MongoUserRepository,
};
use idp_core::{
    Argon2Config, Argon2PasswordHasher, AuthService, AuthServiceConfig, AuthorizationCodeService,
    ClientRepository, ClientService, ClientType, DevDataSeeder, PageRequest, PasswordPolicy,
    UserRepository,
};

/// Identity provider development tool
#[derive(Parser, Debug)]
#[command(name = "idp-dev")]
#[command(about = "Identity provider development tool")]
struct Args {
    /// Path to a TOML config file
    #[arg(long, short, env = "IDP_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create indexes, then seed dev data when enabled (default)
    Init,
    /// Seed dev data regardless of configuration
    Seed,
    /// Delete expired authorization codes
    PurgeCodes,
    /// Print store totals and the newest clients
    Stats,
    /// Print an example configuration file
    ExampleConfig,
}

fn argon2_config(config: &AppConfig) -> Argon2Config {
    let settings = &config.auth.argon2;
    Argon2Config {
        memory_cost: settings.memory_cost,
        time_cost: settings.time_cost,
        parallelism: settings.parallelism,
        output_len: settings.output_len,
    }
}

fn auth_service_config(config: &AppConfig) -> AuthServiceConfig {
    let password = &config.auth.password;
    let mut policy = PasswordPolicy::lenient();
    policy.min_length = password.min_length;
    policy.max_length = password.max_length;
    policy.require_uppercase = password.require_uppercase;
    policy.require_lowercase = password.require_lowercase;
    policy.require_digit = password.require_digit;
    policy.require_special = password.require_special;
    if password.require_special {
        policy.special_chars = PasswordPolicy::default().special_chars;
    }

    AuthServiceConfig {
        reveal_inactive_accounts: config.auth.reveal_inactive_accounts,
        password_policy: policy,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let command = args.command.unwrap_or(Command::Init);

    if let Command::ExampleConfig = command {
        print!("{}", AppConfig::example_toml());
        return Ok(());
    }

    idp_common::init_logging("idp-dev");

    let loader = match args.config {
        Some(path) => ConfigLoader::with_path(path),
        None => ConfigLoader::new(),
    };
    let config = loader.load().context("Failed to load configuration")?;

    if !config.auth.reveal_inactive_accounts {
        info!("Inactive accounts are reported as unknown users");
    }

    info!(database = %config.mongodb.database, "Connecting to MongoDB");
    let mongo = mongodb::Client::with_uri_str(&config.mongodb.uri)
        .await
        .context("Failed to connect to MongoDB")?;
    let db = mongo.database(&config.mongodb.database);

    let users: Arc<dyn UserRepository> = Arc::new(MongoUserRepository::new(&db));
    let clients: Arc<dyn ClientRepository> = Arc::new(MongoClientRepository::new(&db));
    let hasher = Arc::new(
        Argon2PasswordHasher::new(argon2_config(&config)).context("Invalid Argon2 settings")?,
    );

    let auth = AuthService::with_config(users.clone(), hasher, auth_service_config(&config));
    let client_service =
        ClientService::new(clients.clone()).with_secret_bytes(config.auth.client_secret_bytes);

    match command {
        Command::Init => {
            initialize_indexes(&db).await.context("Failed to create indexes")?;
            if config.seed_dev_data {
                if !config.dev_mode {
                    warn!("seed_dev_data is enabled outside dev_mode");
                }
                DevDataSeeder::new(&auth, &client_service).seed().await?;
            }
        }
        Command::Seed => {
            DevDataSeeder::new(&auth, &client_service).seed().await?;
        }
        Command::PurgeCodes => {
            let codes = AuthorizationCodeService::new(Arc::new(
                MongoAuthorizationCodeRepository::new(&db),
            ))
            .with_ttl(chrono::Duration::seconds(
                config.auth.authorization_code_ttl_secs as i64,
            ));
            let removed = codes.purge_expired().await?;
            info!(removed, "Expired authorization codes purged");
        }
        Command::Stats => {
            info!(users = users.count().await?, clients = clients.count().await?, "Store totals");
            for client_type in ClientType::ALL {
                let count = client_service.list_by_type(client_type).await?.len();
                info!(protocol = %client_type, count, "Clients by protocol");
            }

            let page = PageRequest::new(0, config.pagination.default_limit as u64)
                .clamped(config.pagination.max_limit as u64);
            for client in client_service.list(page).await?.items {
                info!(
                    client_id = %client.client_id(),
                    protocol = %client.client_type(),
                    active = client.is_active(),
                    redirect_uris = client.redirect_uris().len(),
                    "Client"
                );
            }
        }
        Command::ExampleConfig => {}
    }

    Ok(())
}
