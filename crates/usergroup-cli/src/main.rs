//! `usergroup` command-line client.
//!
//! Logs in against the administration backend, keeps the session in a
//! JSON file between invocations and drives the user/group endpoints.

mod commands;
mod file_store;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use usergroup_sdk::{ClientConfig, SessionManager};

use crate::file_store::FileSessionStore;

#[derive(Parser, Debug)]
#[command(name = "usergroup")]
#[command(author, version, about = "User/group administration client", long_about = None)]
pub struct Cli {
    /// Backend base URL (overrides USERGROUP_BACKEND_URL)
    #[arg(long, global = true)]
    pub backend_url: Option<String>,

    /// Session file (default: <config dir>/usergroup-cli/session.json)
    #[arg(long, global = true)]
    pub session_file: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Log in and store the session
    Login {
        /// Account login
        #[arg(short, long)]
        username: String,
        /// Plain password; only its SHA-256 is sent
        #[arg(short, long)]
        password: String,
    },
    /// Show local validity and ask the backend about the token
    Status,
    /// Print the identity of the stored session
    Whoami,
    /// Log out and forget the session
    Logout,
    /// Manage users
    Users {
        #[command(subcommand)]
        action: UserAction,
    },
    /// Manage groups
    Groups {
        #[command(subcommand)]
        action: GroupAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum UserAction {
    /// List all users
    List,
    /// Show one user
    Get { id: i64 },
    /// Create a user
    Create(NewUserArgs),
    /// Lock or unlock an account
    Lock {
        id: i64,
        /// Unlock instead
        #[arg(long)]
        unlock: bool,
    },
    /// Delete a user
    Delete { id: i64 },
}

#[derive(Args, Debug)]
pub struct NewUserArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub email: String,
    #[arg(long)]
    pub username: String,
    /// Initial password; only its SHA-256 is sent
    #[arg(long)]
    pub password: String,
    #[arg(long)]
    pub external_id: Option<String>,
    /// Grant administration rights
    #[arg(long)]
    pub admin: bool,
}

#[derive(Subcommand, Debug)]
pub enum GroupAction {
    /// List all groups
    List,
    /// Show one group
    Get { id: i64 },
    /// Create a group
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        comment: Option<String>,
    },
    /// Mark a group inactive
    Deactivate {
        id: i64,
        #[arg(long)]
        reason: String,
    },
    /// Delete a group
    Delete { id: i64 },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = ClientConfig::from_env()?;
    if let Some(url) = cli.backend_url {
        config.backend_url = url;
        config.validate()?;
    }

    let store = match cli.session_file {
        Some(path) => FileSessionStore::new(&config.app, path),
        None => FileSessionStore::in_config_dir(&config.app),
    };
    let session = SessionManager::from_config(store, &config);

    commands::run(&session, &config, cli.command).await
}
