use clap::Parser;
use eyre::Result;

use portal::cli::args::{NotificationsCommands, PostsCommands, PreferencesCommands};
use portal::cli::{Cli, Commands};
use portal::commands::{
    Command,
    auth::{LoginCommand, LogoutCommand, WhoamiCommand},
    chat::ChatCommand,
    imagine::ImagineCommand,
    notifications::{NotificationsAction, NotificationsCommand},
    posts::{PostsAction, PostsCommand},
    preferences::{PreferencesAction, PreferencesCommand},
    watch::WatchCommand,
};
use portal_core::AppState;
use tracing::debug;

#[tokio::main]
async fn main() -> Result<()> {
    // Install color-eyre for better error reports
    color_eyre::install()?;

    let cli = Cli::parse();

    // Load .env file if it exists
    portal::cli::config::load_env()?;

    // Initialize tracing (level configured via RUST_LOG env var)
    portal_core::utils::tracing::init_tracing()?;

    let config = portal::cli::config::client_config(cli.api_url.as_deref())?;
    debug!(target: "portal::main", api = %config.api_base_url, "Configuration resolved");
    let state = AppState::load(config)?;

    let command = into_command(cli.command);
    command.execute(&state).await
}

fn into_command(command: Commands) -> Box<dyn Command + Send + Sync> {
    match command {
        Commands::Login { username, password } => Box::new(LoginCommand { username, password }),
        Commands::Logout => Box::new(LogoutCommand),
        Commands::Whoami => Box::new(WhoamiCommand),
        Commands::Posts { action } => Box::new(PostsCommand {
            action: match action {
                PostsCommands::List {
                    search,
                    category,
                    tag,
                    featured,
                    page,
                    size,
                    sort,
                    order,
                } => PostsAction::list(search, category, tag, featured, page, size, sort, order),
                PostsCommands::Mine { status, page } => PostsAction::Mine { status, page },
                PostsCommands::Show { post } => PostsAction::Show { post },
                PostsCommands::Create {
                    title,
                    file,
                    category,
                    tags,
                    draft,
                } => PostsAction::Create {
                    title,
                    file,
                    category,
                    tags,
                    draft,
                },
                PostsCommands::Delete { id } => PostsAction::Delete { id },
            },
        }),
        Commands::Notifications { action } => Box::new(NotificationsCommand {
            action: match action {
                NotificationsCommands::List { unread, page } => NotificationsAction::List {
                    unread_only: unread,
                    page,
                },
                NotificationsCommands::Read { ids } => NotificationsAction::Read { ids },
                NotificationsCommands::Cleanup { days } => NotificationsAction::Cleanup { days },
            },
        }),
        Commands::Imagine {
            prompt,
            negative,
            size,
            count,
            save,
        } => Box::new(ImagineCommand {
            prompt,
            negative,
            size,
            count,
            save,
        }),
        Commands::Chat { message } => Box::new(ChatCommand { message }),
        Commands::Watch => Box::new(WatchCommand),
        Commands::Preferences { action } => Box::new(PreferencesCommand {
            action: match action {
                PreferencesCommands::Show => PreferencesAction::Show,
                PreferencesCommands::Set {
                    theme,
                    locale,
                    sidebar_collapsed,
                } => PreferencesAction::Set {
                    theme,
                    locale,
                    sidebar_collapsed,
                },
                PreferencesCommands::Reset => PreferencesAction::Reset,
            },
        }),
    }
}
