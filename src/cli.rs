use clap::{Parser, Subcommand};

/// Tidings: alerts, update announcements and notifications for the story client
#[derive(Parser)]
#[command(name = "tidings", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the update detector and unread-count poll until Ctrl-C
    Watch,

    /// Run a single update check and print the resulting alerts
    Status,

    /// Open the notification dropdown and print the merged feed
    Feed,

    /// Mark one activity notification as read
    Read { notification_id: i64 },

    /// Mark every notification as read
    ReadAll,

    /// Inspect the seen-release registry
    Seen {
        #[command(subcommand)]
        command: SeenCommands,
    },

    /// Raise an announcement by hand, outside the polling cadence
    Trigger {
        #[command(subcommand)]
        command: TriggerCommands,
    },
}

#[derive(Subcommand)]
pub enum SeenCommands {
    /// List recorded release ids
    List,
    /// Check whether a release id has been announced
    Check { release_id: String },
    /// Record a release id without announcing it
    Mark { release_id: String },
}

#[derive(Subcommand)]
pub enum TriggerCommands {
    /// Show the maintenance warning
    Maintenance {
        #[arg(long)]
        message: Option<String>,
    },
    /// Announce a release (once per id)
    Release {
        #[arg(long)]
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        notes: String,
    },
}
