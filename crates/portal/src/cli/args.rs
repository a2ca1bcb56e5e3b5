use clap::{Parser, Subcommand};
use portal_core::ai::ImageSize;
use portal_core::services::posts::{PostSort, PostStatus, SortOrder};
use portal_core::store::{Locale, Theme};
use std::path::PathBuf;

/// Command-line client for the portal blogging and forum platform.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// API base URL (overrides config.toml and PORTAL_API_BASE_URL)
    #[arg(long, global = true, value_name = "URL")]
    pub api_url: Option<String>,

    /// Subcommands
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Log in and keep the session for later commands
    Login {
        /// Account name
        #[arg(short, long)]
        username: String,
        /// Password; prompted for when omitted
        #[arg(long, env = "PORTAL_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// End the current session
    Logout,
    /// Show the logged-in account
    Whoami,
    /// Browse and manage posts
    Posts {
        #[command(subcommand)]
        action: PostsCommands,
    },
    /// Read and clear notifications
    Notifications {
        #[command(subcommand)]
        action: NotificationsCommands,
    },
    /// Generate images from a text prompt
    Imagine {
        /// What to draw
        prompt: String,
        /// What to keep out of the picture
        #[arg(long)]
        negative: Option<String>,
        /// square, portrait or landscape
        #[arg(long, default_value = "square")]
        size: ImageSize,
        /// Number of images (1-4)
        #[arg(short = 'n', long, default_value_t = 1)]
        count: u8,
        /// Copy the results into the site's uploads
        #[arg(long)]
        save: bool,
    },
    /// Chat with the assistant. Without a message, starts an interactive session.
    Chat {
        /// Single message to send
        message: Option<String>,
    },
    /// Follow the live notification channel until interrupted
    Watch,
    /// Manage local display preferences
    Preferences {
        #[command(subcommand)]
        action: PreferencesCommands,
    },
}

#[derive(Subcommand, Clone, Debug)]
pub enum PostsCommands {
    /// List published posts
    List {
        /// Full-text search
        #[arg(short, long)]
        search: Option<String>,
        #[arg(long)]
        category: Option<i64>,
        #[arg(long)]
        tag: Option<i64>,
        /// Only featured posts
        #[arg(long)]
        featured: bool,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 20)]
        size: u32,
        /// created_at, updated_at, view_count or like_count
        #[arg(long)]
        sort: Option<PostSort>,
        /// asc or desc
        #[arg(long)]
        order: Option<SortOrder>,
    },
    /// List your own posts, drafts included
    Mine {
        /// draft, published or archived
        #[arg(long)]
        status: Option<PostStatus>,
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Print a post by id or slug
    Show { post: String },
    /// Publish a post from a plain-text file (stdin when omitted)
    Create {
        #[arg(short, long)]
        title: String,
        #[arg(short, long)]
        file: Option<PathBuf>,
        #[arg(long)]
        category: Option<i64>,
        /// Tag id (repeatable)
        #[arg(long = "tag")]
        tags: Vec<i64>,
        /// Save as draft instead of publishing
        #[arg(long)]
        draft: bool,
    },
    /// Delete one of your posts
    Delete { id: i64 },
}

#[derive(Subcommand, Clone, Debug)]
pub enum NotificationsCommands {
    /// List notifications
    List {
        /// Only unread notifications
        #[arg(long)]
        unread: bool,
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Mark notifications read; all of them when no id is given
    Read { ids: Vec<i64> },
    /// Delete notifications older than the given number of days
    Cleanup {
        #[arg(long, default_value_t = 30)]
        days: u32,
    },
}

#[derive(Subcommand, Clone, Debug)]
pub enum PreferencesCommands {
    /// Show the stored preferences and the resolved configuration
    Show,
    /// Change one or more preferences
    Set {
        /// dark or light
        #[arg(long)]
        theme: Option<Theme>,
        /// zh or en
        #[arg(long)]
        locale: Option<Locale>,
        #[arg(long)]
        sidebar_collapsed: Option<bool>,
    },
    /// Restore the defaults
    Reset,
}
