use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Overrides;

#[derive(Debug, Parser)]
#[command(
    name = "clipfind",
    version,
    about = "Look up clipboard subjects in read-only file catalogs"
)]
pub struct Cli {
    /// Config file, or the directory holding clipfind.toml.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Default log filter when CLIPFIND_LOG is unset.
    #[arg(long, global = true, default_value = "info", value_name = "LEVEL")]
    pub log_level: String,

    #[arg(long, global = true, overrides_with = "no_notifications")]
    pub notifications: bool,
    #[arg(long, global = true, overrides_with = "notifications")]
    pub no_notifications: bool,

    #[arg(long, global = true, overrides_with = "no_sound_notifications")]
    pub sound_notifications: bool,
    #[arg(long, global = true, overrides_with = "sound_notifications")]
    pub no_sound_notifications: bool,

    #[arg(long, global = true, overrides_with = "no_terminal_output")]
    pub terminal_output: bool,
    #[arg(long, global = true, overrides_with = "terminal_output")]
    pub no_terminal_output: bool,

    /// Fetch the parent directory of each match.
    #[arg(long, global = true, overrides_with = "no_parent_directories")]
    pub parent_directories: bool,
    #[arg(long, global = true, overrides_with = "parent_directories")]
    pub no_parent_directories: bool,

    /// Notification program, e.g. notify-send.
    #[arg(long, global = true, value_name = "PROVIDER")]
    pub notification_provider: Option<String>,

    /// Sound program, e.g. paplay.
    #[arg(long, global = true, value_name = "PROVIDER")]
    pub sound_provider: Option<String>,

    /// Rows requested per catalog; 0 means no limit.
    #[arg(long, global = true, value_name = "N")]
    pub max_results: Option<u32>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand, PartialEq, Eq)]
pub enum Command {
    /// Poll the system clipboard and look up every new subject (default).
    Watch,
    /// Treat each stdin line as one clipboard event.
    Pipe,
    /// Run a single lookup and print the results.
    Query {
        /// Print JSON lines instead of text.
        #[arg(long)]
        json: bool,
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// Print the search token extracted from the text.
    Extract {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    /// Connect every configured catalog and report its status.
    Catalogs,
}

impl Cli {
    pub fn overrides(&self) -> Overrides {
        Overrides {
            notifications: flag_pair(self.notifications, self.no_notifications),
            sound_notifications: flag_pair(self.sound_notifications, self.no_sound_notifications),
            terminal_output: flag_pair(self.terminal_output, self.no_terminal_output),
            parent_directories: flag_pair(self.parent_directories, self.no_parent_directories),
            notification_provider: self.notification_provider.clone(),
            sound_provider: self.sound_provider.clone(),
            max_results: self.max_results,
        }
    }

    pub fn selected_command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Watch)
    }
}

fn flag_pair(yes: bool, no: bool) -> Option<bool> {
    match (yes, no) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}
