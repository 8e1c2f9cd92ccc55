use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::bail;
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;

use vinculo::auth::provision_user;
use vinculo::config::{ADMIN_TOKEN_FILE, DB_FILE, ServerConfig};
use vinculo::matching;
use vinculo::server::{AppState, create_router};
use vinculo::store::{SqliteStore, Store};
use vinculo::types::Role;

const NOT_INITIALIZED: &str =
    "Server not initialized. Run 'vinculo admin init' first to create the database and admin token.";

#[cfg(unix)]
fn set_restrictive_permissions(path: &Path) {
    use std::os::unix::fs::PermissionsExt;
    if let Err(e) = fs::set_permissions(path, fs::Permissions::from_mode(0o600)) {
        tracing::warn!("Failed to set permissions on {}: {e}", path.display());
    }
}

#[derive(Parser)]
#[command(name = "vinculo")]
#[command(about = "Matchmaking between industry challenges and university research capacities", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Administrative commands
    Admin {
        #[command(subcommand)]
        command: AdminCommands,
    },

    /// Start the server
    Serve {
        /// Host to bind to (overrides vinculo.toml)
        #[arg(long)]
        host: Option<String>,

        /// Port to bind to (overrides vinculo.toml)
        #[arg(long, short)]
        port: Option<u16>,

        /// Data directory for the database and config file
        #[arg(long, default_value = "./data")]
        data_dir: PathBuf,
    },
}

#[derive(Subcommand)]
enum AdminCommands {
    /// Initialize the server (create database and admin token)
    Init {
        /// Data directory for the database and config file
        #[arg(long, default_value = "./data")]
        data_dir: PathBuf,

        /// Skip interactive prompts
        #[arg(long)]
        non_interactive: bool,
    },

    /// Manage users
    User {
        #[command(subcommand)]
        command: UserCommands,
    },

    /// Inspect or flip the match system toggle
    Matches {
        #[command(subcommand)]
        command: MatchesCommands,
    },
}

#[derive(Subcommand)]
enum UserCommands {
    /// Create a user and print its token
    Add {
        #[arg(long, default_value = "./data")]
        data_dir: PathBuf,

        /// One of externo, unsa or admin
        #[arg(long)]
        role: Role,

        /// Display name shown to the other party
        #[arg(long)]
        name: String,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum MatchesCommands {
    /// Show whether the match system is enabled
    Status {
        #[arg(long, default_value = "./data")]
        data_dir: PathBuf,
    },
    /// Enable match requests and chat
    Enable {
        #[arg(long, default_value = "./data")]
        data_dir: PathBuf,
    },
    /// Disable match requests and chat
    Disable {
        #[arg(long, default_value = "./data")]
        data_dir: PathBuf,
    },
}

/// Opens the store of an initialized data directory.
fn open_store(data_dir: &Path) -> anyhow::Result<SqliteStore> {
    let db_path = data_dir.join(DB_FILE);
    if !db_path.exists() {
        bail!(NOT_INITIALIZED);
    }

    let store = SqliteStore::new(&db_path)?;
    if !store.has_admin_user()? {
        bail!(NOT_INITIALIZED);
    }
    Ok(store)
}

fn run_init(data_dir: &Path, non_interactive: bool) -> anyhow::Result<()> {
    fs::create_dir_all(data_dir)?;

    let store = SqliteStore::new(data_dir.join(DB_FILE))?;
    store.initialize()?;

    let token_file = data_dir.join(ADMIN_TOKEN_FILE);

    if store.has_admin_user()? {
        bail!(
            "Server already initialized. Admin token exists at: {}",
            token_file.display()
        );
    }

    let (_admin, raw_token) = provision_user(&store, Role::Admin, "Administrator")?;
    fs::write(&token_file, &raw_token)?;

    #[cfg(unix)]
    set_restrictive_permissions(&token_file);

    println!();
    println!("========================================");
    println!("Admin token (save this, it won't be shown again):");
    println!();
    println!("  {raw_token}");
    println!();
    println!("Token also written to: {}", token_file.display());
    println!("========================================");
    println!();

    if !non_interactive {
        enable_matches_prompt(&store)?;
    }

    Ok(())
}

fn enable_matches_prompt(store: &SqliteStore) -> anyhow::Result<()> {
    let enable = inquire::Confirm::new("Enable the match system now?")
        .with_default(false)
        .with_help_message("Match requests and chat stay unavailable until enabled")
        .prompt()?;

    if enable {
        matching::set_system_enabled(store, true)?;
        println!("Match system enabled.");
    } else {
        println!("Match system left disabled. Run 'vinculo admin matches enable' later.");
    }

    Ok(())
}

fn run_user_add(data_dir: &Path, role: Role, name: &str, as_json: bool) -> anyhow::Result<()> {
    let store = open_store(data_dir)?;
    let (user, raw_token) = provision_user(&store, role, name)?;

    if as_json {
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({ "user": user, "token": raw_token }))?
        );
        return Ok(());
    }

    println!();
    println!("========================================");
    println!("Created {} user '{}' ({})", user.role, user.display_name, user.id);
    println!();
    println!("  {raw_token}");
    println!();
    println!("========================================");
    println!();

    Ok(())
}

fn run_matches(command: MatchesCommands) -> anyhow::Result<()> {
    let (data_dir, target) = match command {
        MatchesCommands::Status { data_dir } => (data_dir, None),
        MatchesCommands::Enable { data_dir } => (data_dir, Some(true)),
        MatchesCommands::Disable { data_dir } => (data_dir, Some(false)),
    };

    let store = open_store(&data_dir)?;
    if let Some(enabled) = target {
        matching::set_system_enabled(&store, enabled)?;
    }

    let enabled = matching::get_system_enabled(&store)?;
    println!(
        "Match system is {}",
        if enabled { "enabled" } else { "disabled" }
    );

    Ok(())
}

async fn run_serve(
    data_dir: PathBuf,
    host: Option<String>,
    port: Option<u16>,
) -> anyhow::Result<()> {
    let config = ServerConfig::load(data_dir, host, port)?;

    let token_file = config.admin_token_path();
    if !token_file.exists() {
        bail!(NOT_INITIALIZED);
    }

    let store = open_store(&config.data_dir)?;
    store.initialize()?;

    info!("Admin token available at {}", token_file.display());
    info!(
        "Match system is {}",
        if store.get_matches_enabled()? {
            "enabled"
        } else {
            "disabled"
        }
    );

    let state = Arc::new(AppState::new(Arc::new(store)));

    let app = create_router(state);
    let addr = config.socket_addr()?;

    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr so that `--json` output stays machine-readable.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("vinculo=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Admin { command } => match command {
            AdminCommands::Init {
                data_dir,
                non_interactive,
            } => run_init(&data_dir, non_interactive)?,
            AdminCommands::User {
                command:
                    UserCommands::Add {
                        data_dir,
                        role,
                        name,
                        json,
                    },
            } => run_user_add(&data_dir, role, &name, json)?,
            AdminCommands::Matches { command } => run_matches(command)?,
        },
        Commands::Serve {
            host,
            port,
            data_dir,
        } => run_serve(data_dir, host, port).await?,
    }

    Ok(())
}
