//! # wasatext-admin
//!
//! Operator tool for a WASAText database: apply migrations, probe the
//! store, issue keys and inspect a user's conversation list. Settings come
//! from the same `WASATEXT_*` environment variables as the service.

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;
use wasatext_service::{AsyncConversationService, ConversationService, ServiceConfig};

#[derive(Parser)]
#[command(name = "wasatext-admin", version, about = "WASAText database administration")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Open the database, applying pending migrations, and print the schema version.
    Migrate,
    /// Check that the database answers.
    Ping,
    /// Log in (creating the user if needed) and print the identity as JSON.
    Login {
        username: String,
    },
    /// Print the conversation list of the key's owner as JSON.
    Chats {
        #[arg(long)]
        key: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,wasatext_service=debug")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = ServiceConfig::from_env();
    info!(?config, "Loaded configuration");

    let service = ConversationService::open(&config).context("opening database")?;
    info!(path = %service.database().path().display(), "Database ready");
    let handle = AsyncConversationService::new(service);

    match cli.command {
        Command::Migrate => {
            let version = handle
                .inner()
                .database()
                .schema_version()
                .context("reading schema version")?;
            println!("schema version {version}");
        }
        Command::Ping => {
            handle.run(|svc| svc.ping()).await.context("ping failed")?;
            println!("ok");
        }
        Command::Login { username } => {
            let outcome = handle.login(username).await.context("login failed")?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        Command::Chats { key } => {
            let chats = handle
                .my_conversations(key)
                .await
                .context("listing conversations")?;
            println!("{}", serde_json::to_string_pretty(&chats)?);
        }
    }

    Ok(())
}
