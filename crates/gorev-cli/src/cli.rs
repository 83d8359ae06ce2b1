//! Command-line arguments.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use gorev_core::{Order, Priority, SortMode, TaskStatus};

#[derive(Parser, Debug)]
#[command(name = "gorev", version, about = "Identity-number checks and a per-user task list")]
pub struct Cli {
    /// Config file (YAML, or JSON with a .json extension)
    #[arg(short, long, global = true, env = "GOREV_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory holding stored state; overrides the config file
    #[arg(long, global = true, env = "GOREV_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check identity numbers; exits with 1 if any is invalid
    Validate {
        #[arg(required = true)]
        ids: Vec<String>,

        /// Print why an invalid number was rejected
        #[arg(long)]
        explain: bool,
    },

    /// Complete nine leading digits into a valid identity number
    Generate { prefix: String },

    #[command(flatten)]
    Session(SessionCommand),
}

/// Commands that open the stored session.
#[derive(Subcommand, Debug)]
pub enum SessionCommand {
    /// Register a new user and log in
    Register { identity_number: String, name: String },

    /// Log in with an identity number
    Login { identity_number: String },

    /// Log out
    Logout,

    /// Show the logged-in user
    Whoami,

    /// List registered users (admins only)
    Users {
        #[arg(long)]
        json: bool,
    },

    /// Manage tasks
    #[command(subcommand)]
    Task(TaskCommand),
}

#[derive(Subcommand, Debug)]
pub enum TaskCommand {
    /// Create a task
    Add {
        title: String,

        #[arg(short, long, default_value = "")]
        description: String,

        #[arg(short, long, default_value = "medium")]
        priority: Priority,

        /// User id to assign the task to (admins only)
        #[arg(long)]
        assignee: Option<String>,
    },

    /// List visible tasks
    List(ListArgs),

    /// Change fields of a task
    Update {
        task_id: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        priority: Option<Priority>,

        #[arg(long)]
        status: Option<TaskStatus>,
    },

    /// Flip a task between incomplete and complete
    Toggle { task_id: String },

    /// Delete a task
    Delete { task_id: String },
}

#[derive(Args, Debug)]
pub struct ListArgs {
    /// Only tasks whose title contains this text
    #[arg(short, long)]
    pub search: Option<String>,

    #[arg(long, value_enum, default_value_t = SortArg::Default)]
    pub sort: SortArg,

    /// Priority direction when sorting by priority
    #[arg(long, value_enum, default_value_t = OrderArg::Asc)]
    pub order: OrderArg,

    /// Only my own tasks, even for admins
    #[arg(long)]
    pub mine: bool,

    #[arg(long)]
    pub json: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortArg {
    Default,
    Date,
    Priority,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderArg {
    Asc,
    Desc,
}

impl ListArgs {
    pub fn sort_mode(&self) -> SortMode {
        match self.sort {
            SortArg::Default => SortMode::Default,
            SortArg::Date => SortMode::Date,
            SortArg::Priority => SortMode::Priority(match self.order {
                OrderArg::Asc => Order::Asc,
                OrderArg::Desc => Order::Desc,
            }),
        }
    }
}
