//! CLI entry and dispatch.

use anyhow::{Context, Result};
use clap::Parser;
use entrydesk_core::api::{ApiClient, EntryStatus};
use entrydesk_core::config;
use entrydesk_core::logging;
use entrydesk_core::session::Session;

mod commands;

#[derive(Parser)]
#[command(name = "entrydesk")]
#[command(version)]
#[command(about = "Client for the entries approval API")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Override the API base URL (default: ENTRYDESK_BASE_URL, then config)
    #[arg(long, global = true, value_name = "URL")]
    base_url: Option<String>,
}

#[derive(clap::Subcommand)]
enum Commands {
    /// Create an account
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "ENTRYDESK_PASSWORD", hide_env_values = true)]
        password: String,
        /// Defaults to --password
        #[arg(long)]
        password_confirmation: Option<String>,
    },

    /// Log in and cache the session token
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "ENTRYDESK_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Log out (always clears the cached token)
    Logout,

    /// Show the cached user
    Whoami,

    /// Work with entries
    Entries {
        #[command(subcommand)]
        command: EntryCommands,
    },

    /// Inspect the client route table
    Routes {
        #[command(subcommand)]
        command: RouteCommands,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(clap::Subcommand)]
enum EntryCommands {
    /// List entries
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,
        /// Only entries with this status (pending, approved, rejected)
        #[arg(long)]
        status: Option<EntryStatus>,
        /// Start date filter, passed through to the server
        #[arg(long)]
        from: Option<String>,
        /// End date filter, passed through to the server
        #[arg(long)]
        to: Option<String>,
    },
    /// List entry categories
    Categories,
    /// Show entry statistics
    Stats,
    /// Create an entry
    Create {
        #[arg(long)]
        category: String,
        /// Extra fields as key=value (value parsed as JSON when possible)
        #[arg(long = "field", value_name = "KEY=VALUE")]
        fields: Vec<String>,
    },
    /// Change an entry's status
    Status {
        #[arg(value_name = "ENTRY_ID")]
        id: u64,
        #[arg(value_name = "STATUS")]
        status: EntryStatus,
    },
    /// Delete an entry
    Delete {
        #[arg(value_name = "ENTRY_ID")]
        id: u64,
    },
}

#[derive(clap::Subcommand)]
enum RouteCommands {
    /// List all routes
    List,
    /// Show which view a path renders
    Resolve {
        #[arg(value_name = "PATH")]
        path: String,
    },
}

#[derive(clap::Subcommand)]
enum ConfigCommands {
    /// Show the path to the config file
    Path,
    /// Initialize a default config file (if not present)
    Init,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    logging::init();

    let rt = tokio::runtime::Runtime::new().context("create tokio runtime")?;

    rt.block_on(async move { dispatch(cli).await })
}

async fn dispatch(cli: Cli) -> Result<()> {
    let Cli { command, base_url } = cli;

    match command {
        Commands::Register {
            name,
            email,
            password,
            password_confirmation,
        } => {
            let api = client(base_url.as_deref())?;
            commands::auth::register(&api, name, email, password, password_confirmation).await
        }
        Commands::Login { email, password } => {
            let api = client(base_url.as_deref())?;
            commands::auth::login(&api, email, password).await
        }
        Commands::Logout => {
            let api = client(base_url.as_deref())?;
            commands::auth::logout(&api).await;
            Ok(())
        }
        Commands::Whoami => commands::auth::whoami(&session()?),

        Commands::Entries { command } => {
            let api = client(base_url.as_deref())?;
            match command {
                EntryCommands::List {
                    page,
                    status,
                    from,
                    to,
                } => commands::entries::list(&api, page, status, from, to).await,
                EntryCommands::Categories => commands::entries::categories(&api).await,
                EntryCommands::Stats => commands::entries::stats(&api).await,
                EntryCommands::Create { category, fields } => {
                    commands::entries::create(&api, category, &fields).await
                }
                EntryCommands::Status { id, status } => {
                    commands::entries::set_status(&api, id, status).await
                }
                EntryCommands::Delete { id } => commands::entries::delete(&api, id).await,
            }
        }

        Commands::Routes { command } => match command {
            RouteCommands::List => {
                commands::routes::list();
                Ok(())
            }
            RouteCommands::Resolve { path } => commands::routes::resolve(&path),
        },

        Commands::Config { command } => match command {
            ConfigCommands::Path => {
                commands::config::path();
                Ok(())
            }
            ConfigCommands::Init => commands::config::init(),
        },
    }
}

fn session() -> Result<Session> {
    let config = config::Config::load().context("load config")?;
    Session::from_config(&config.session).context("open session")
}

fn client(base_url_override: Option<&str>) -> Result<ApiClient> {
    let config = config::Config::load().context("load config")?;
    let base_url = match base_url_override {
        Some(url) => url.trim().to_string(),
        None => config.resolve_base_url()?,
    };
    let session = Session::from_config(&config.session).context("open session")?;
    Ok(ApiClient::new(&base_url, session)?)
}
