use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use orgsync_application::AppContext;
use orgsync_infrastructure::{ConfigService, OrgSyncPaths};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(name = "orgsync")]
#[command(about = "orgsync - manage your organizations from the command line", long_about = None)]
struct Cli {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use this directory instead of the default config directory
    #[arg(long, global = true, value_name = "DIR")]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in with email and password
    Login {
        #[arg(long)]
        email: String,
        /// Read from stdin when omitted
        #[arg(long)]
        password: Option<String>,
    },
    /// Create a new account
    Register {
        #[arg(long)]
        email: String,
        /// Read from stdin when omitted
        #[arg(long)]
        password: Option<String>,
    },
    /// Sign out and forget the stored session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// List organizations
    List {
        /// Only show organizations whose name or description contains this text
        #[arg(long)]
        filter: Option<String>,
    },
    /// Search organizations on the server
    Search { query: String },
    /// Create an organization
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: String,
    },
    /// Edit an organization
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, conflicts_with = "inactive")]
        active: bool,
        #[arg(long)]
        inactive: bool,
    },
    /// Flip an organization between active and inactive
    Toggle { id: String },
    /// Delete an organization
    Delete { id: String },
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let paths = OrgSyncPaths::new(cli.config_dir);
    let config = ConfigService::new(&paths)
        .and_then(|service| service.get_config())
        .context("Failed to load configuration")?;
    tracing::debug!("[orgsync] Using API at {}", config.api.base_url);

    let app = AppContext::start_from_config(&config, &paths)
        .await
        .context("Failed to start orgsync")?;

    let result = run(&app, cli.command).await;
    app.shutdown().await;
    result
}

async fn run(app: &AppContext, command: Commands) -> Result<()> {
    match command {
        Commands::Login { email, password } => {
            commands::auth::login(app, &email, password).await
        }
        Commands::Register { email, password } => {
            commands::auth::register(app, &email, password).await
        }
        Commands::Logout => commands::auth::logout(app).await,
        Commands::Whoami => commands::auth::whoami(app),
        Commands::List { filter } => commands::organizations::list(app, filter.as_deref()).await,
        Commands::Search { query } => commands::organizations::search(app, &query).await,
        Commands::Create { name, description } => {
            commands::organizations::create(app, name, description).await
        }
        Commands::Update {
            id,
            name,
            description,
            active,
            inactive,
        } => {
            let is_active = match (active, inactive) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            };
            commands::organizations::update(app, &id, name, description, is_active).await
        }
        Commands::Toggle { id } => commands::organizations::toggle(app, &id).await,
        Commands::Delete { id } => commands::organizations::delete(app, &id).await,
    }
}
