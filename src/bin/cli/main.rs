mod app;
mod commands;
mod render;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use flashdrill_lib::catalog::{Account, Mode, NewWordSet, Owner};
use flashdrill_lib::flashcards::SessionFilters;

#[derive(Parser)]
#[command(name = "flashdrill-cli", about = "Flash vocabulary drills with spaced repetition", version)]
struct Cli {
    /// Use a specific data directory (default: platform data dir)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, default_value = "plain")]
    format: OutputFormat,

    /// Disable ANSI colors
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Plain,
    Json,
}

/// Which sets a session draws from
#[derive(Args, Clone, Debug)]
pub struct FilterArgs {
    /// Leave out sets below this priority (0-3)
    #[arg(long, default_value = "3")]
    min_priority: u8,
    /// Only this mode (chunk, collocation, sentence, cvc)
    #[arg(long)]
    mode: Option<Mode>,
    /// Only this owner (child, parent, shared)
    #[arg(long)]
    owner: Option<Owner>,
    /// Comma-separated priorities for importance-weighted selection
    #[arg(long, value_delimiter = ',')]
    importance: Vec<u8>,
}

impl FilterArgs {
    pub fn to_filters(&self) -> SessionFilters {
        SessionFilters {
            min_priority: self.min_priority,
            mode: self.mode,
            owner: self.owner,
            importance: self.importance.clone(),
        }
    }
}

#[derive(Subcommand)]
enum Command {
    /// Run an interactive study session
    Study {
        #[command(flatten)]
        filters: FilterArgs,
        /// Seconds each set stays on screen (overrides config)
        #[arg(long)]
        flash_time: Option<u32>,
    },

    /// Print the next session queue without studying
    Queue {
        #[command(flatten)]
        filters: FilterArgs,
    },

    /// Browse and edit word sets
    #[command(subcommand)]
    Sets(SetsCommand),

    /// Daily totals from session records
    Stats {
        /// Account to report on (default: current)
        #[arg(long)]
        account: Option<Account>,
        /// Only this mode
        #[arg(long)]
        mode: Option<Mode>,
    },

    /// Export session records as CSV
    Export {
        /// Account to export (default: current)
        #[arg(long)]
        account: Option<Account>,
        /// Output file (default: stdout)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Show or switch the active account
    #[command(subcommand)]
    Account(AccountCommand),

    /// Pull every bucket from the shared store
    Sync,

    /// Show or create the config file
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand)]
enum SetsCommand {
    /// List sets with their review state
    List {
        /// Only this mode
        #[arg(long)]
        mode: Option<Mode>,
    },

    /// Add a custom set
    Add {
        /// Mode of the set
        #[arg(long)]
        mode: Mode,
        /// Owner of the set
        #[arg(long, default_value = "child")]
        owner: Owner,
        /// Display label
        #[arg(long, default_value = "")]
        label: String,
        /// Optional note
        #[arg(long)]
        note: Option<String>,
        /// Priority (0-3)
        #[arg(long, default_value = "2")]
        priority: u8,
        /// Items, at least two
        #[arg(required = true)]
        items: Vec<String>,
    },

    /// Delete a set
    Delete {
        /// Set id
        id: String,
    },

    /// Change the priority of a set
    Priority {
        /// Set id
        id: String,
        /// New priority (0-3)
        priority: u8,
    },

    /// Drop every seed priority override
    ResetPriorities,
}

#[derive(Subcommand)]
enum AccountCommand {
    /// Show the active account and sync status
    Show,

    /// Switch to another account
    Switch {
        /// child or parent
        account: Account,
    },

    /// Forget the review state of the active account
    ResetReview,

    /// Delete every session record of an account
    ResetRecords {
        /// child or parent
        account: Account,
    },
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print the effective configuration
    Show,

    /// Write a default config file if none exists
    Init,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let use_color = !cli.no_color && atty_check();
    let data_dir = cli.data_dir.as_deref();

    match cli.command {
        Command::Study { filters, flash_time } => {
            let app = app::App::open(data_dir).await?;
            commands::study::run(&app, &filters.to_filters(), flash_time, use_color).await?;
        }
        Command::Queue { filters } => {
            let app = app::App::open(data_dir).await?;
            commands::queue::run(&app, &filters.to_filters(), &cli.format, use_color)?;
        }
        Command::Sets(subcmd) => {
            let app = app::App::open(data_dir).await?;
            match subcmd {
                SetsCommand::List { mode } => {
                    commands::sets::run_list(&app, mode, &cli.format, use_color)?;
                }
                SetsCommand::Add { mode, owner, label, note, priority, items } => {
                    let input = NewWordSet { mode, owner, label, note, priority, items };
                    commands::sets::run_add(&app, input, &cli.format).await?;
                }
                SetsCommand::Delete { id } => {
                    commands::sets::run_delete(&app, &id).await?;
                }
                SetsCommand::Priority { id, priority } => {
                    commands::sets::run_priority(&app, &id, priority).await?;
                }
                SetsCommand::ResetPriorities => {
                    commands::sets::run_reset_priorities(&app).await?;
                }
            }
        }
        Command::Stats { account, mode } => {
            let app = app::App::open(data_dir).await?;
            commands::stats::run(&app, account, mode, &cli.format, use_color)?;
        }
        Command::Export { account, output } => {
            let app = app::App::open(data_dir).await?;
            commands::export::run(&app, account, output.as_deref())?;
        }
        Command::Account(subcmd) => {
            let app = app::App::open(data_dir).await?;
            match subcmd {
                AccountCommand::Show => commands::account::run_show(&app, &cli.format, use_color)?,
                AccountCommand::Switch { account } => commands::account::run_switch(&app, account)?,
                AccountCommand::ResetReview => commands::account::run_reset_review(&app).await?,
                AccountCommand::ResetRecords { account } => {
                    commands::account::run_reset_records(&app, account).await?
                }
            }
        }
        Command::Sync => {
            let app = app::App::open_without_pull(data_dir)?;
            commands::sync::run(&app, &cli.format, use_color).await?;
        }
        Command::Config(subcmd) => match subcmd {
            ConfigCommand::Show => commands::config::run_show(data_dir, &cli.format)?,
            ConfigCommand::Init => commands::config::run_init(data_dir)?,
        },
    }

    Ok(())
}

/// Check if stdout is a terminal (for color support)
fn atty_check() -> bool {
    use std::io::IsTerminal;
    std::io::stdout().is_terminal()
}
