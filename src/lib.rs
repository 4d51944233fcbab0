pub mod cli;
pub mod clients;
pub mod config;
pub mod constants;
pub mod db;
pub mod entities;
pub mod models;
pub mod rate_limit;
pub mod services;
pub mod state;
pub mod storage;
pub mod validation;

use std::any::Any;

use clap::{CommandFactory, Parser};
use cli::{BookmarkCommands, Cli, Commands, HistoryCommands, StatsCommands};
pub use config::Config;
use state::SharedState;
use tracing::error;
use tracing_subscriber::EnvFilter;

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if matches!(cli.command, Some(Commands::Init)) {
        if Config::create_default_if_missing()? {
            println!("✓ Config file created. Edit config.toml and run again.");
        } else {
            println!("config.toml already exists.");
        }
        return Ok(());
    }

    let config = Config::load()?;
    config.validate()?;

    init_logging(&config);
    install_panic_hook();

    let Some(command) = cli.command else {
        Cli::command().print_help()?;
        return Ok(());
    };

    let state = SharedState::new(config).await?;
    dispatch(&state, command).await
}

fn init_logging(config: &Config) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    let registry = tracing_subscriber::registry().with(env_filter);

    if config.general.log_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Routes panics through tracing before the default hook prints them.
fn install_panic_hook() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let location = info
            .location()
            .map_or_else(String::new, |l| format!(" at {}:{}", l.file(), l.line()));
        error!("Panic{}: {}", location, panic_message(info.payload()));
        default_hook(info);
    }));
}

async fn dispatch(state: &SharedState, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Search { query, local } => cli::cmd_search(state, &query.join(" "), local).await,

        Commands::Catalog { category } => cli::cmd_catalog(state, category).await,

        Commands::Info { id } => cli::cmd_info(state, &id).await,

        Commands::Safety { cid } => cli::cmd_safety(state, cid).await,

        Commands::History { command } => match command.unwrap_or(HistoryCommands::List) {
            HistoryCommands::List => cli::cmd_history_list(state).await,
            HistoryCommands::Remove { query } => {
                cli::cmd_history_remove(state, &query.join(" ")).await
            }
            HistoryCommands::Clear => cli::cmd_history_clear(state).await,
        },

        Commands::Bookmark { command } => match command.unwrap_or(BookmarkCommands::List) {
            BookmarkCommands::List => cli::cmd_bookmark_list(state).await,
            BookmarkCommands::Add { query } => cli::cmd_bookmark_add(state, &query.join(" ")).await,
            BookmarkCommands::Remove { id } => cli::cmd_bookmark_remove(state, &id).await,
            BookmarkCommands::Toggle { id } => cli::cmd_bookmark_toggle(state, &id).await,
            BookmarkCommands::Clear => cli::cmd_bookmark_clear(state).await,
        },

        Commands::Chat {
            message,
            chemical,
            history,
            clear,
        } => {
            if clear {
                cli::cmd_chat_clear(state).await
            } else if history {
                cli::cmd_chat_history(state).await
            } else {
                cli::cmd_chat(state, &message.join(" "), chemical.as_deref()).await
            }
        }

        Commands::Stats { command } => match command.unwrap_or(StatsCommands::Show) {
            StatsCommands::Show => cli::cmd_stats_show(state).await,
            StatsCommands::Reset => cli::cmd_stats_reset(state).await,
        },

        Commands::Login { username, password } => cli::cmd_login(state, &username, password).await,

        Commands::Signup {
            name,
            email,
            password,
        } => cli::cmd_signup(state, &name, &email, password).await,

        Commands::Logout => cli::cmd_logout(state).await,

        Commands::Whoami => cli::cmd_whoami(state).await,

        Commands::ForgotPassword { email } => cli::cmd_forgot_password(state, &email).await,

        Commands::Shell => cli::cmd_shell(state).await,

        Commands::Init => Ok(()),
    }
}
