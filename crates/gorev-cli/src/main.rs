//! `gorev` command-line front end.
//!
//! ```bash
//! gorev validate 10000000146 12345678910 --explain
//! gorev register 12345678950 "Ayşe Yılmaz"
//! gorev task add "Renew passport" --priority high
//! gorev task list --sort priority --order desc
//! ```

mod cli;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::Parser;
use gorev_core::{
    validate_identity_number, Config, FileStore, IdentityNumber, NewTask, Task, TaskManager,
    TaskQuery, TaskUpdate, User,
};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cli::{Cli, Command, ListArgs, SessionCommand, TaskCommand};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr so stdout stays parseable.
fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn load_config(path: Option<&Path>, data_dir: Option<PathBuf>) -> Result<Config> {
    let mut config = match path {
        Some(path) => Config::from_file(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(dir) = data_dir {
        config.storage.data_dir = dir;
    }
    tracing::debug!(data_dir = %config.storage.data_dir.display(), "Using config");
    Ok(config)
}

fn run(cli: Cli) -> Result<ExitCode> {
    let Cli {
        config,
        data_dir,
        command,
        ..
    } = cli;

    match command {
        Command::Validate { ids, explain } => Ok(validate(&ids, explain)),
        Command::Generate { prefix } => {
            let id = IdentityNumber::complete(&prefix)
                .with_context(|| format!("{prefix:?} is not nine digits starting with 1-9"))?;
            println!("{id}");
            Ok(ExitCode::SUCCESS)
        }
        Command::Session(command) => {
            let config = load_config(config.as_deref(), data_dir)?;
            let store = FileStore::new(&config.storage.data_dir);
            let mut manager =
                TaskManager::from_config(store, &config).context("opening task storage")?;
            run_session(&mut manager, command)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn run_session(manager: &mut TaskManager<FileStore>, command: SessionCommand) -> Result<()> {
    match command {
        SessionCommand::Register {
            identity_number,
            name,
        } => {
            let user = manager.register(&identity_number, &name)?;
            println!("Registered and logged in as {} ({})", user.name, user.id);
        }
        SessionCommand::Login { identity_number } => {
            let user = manager.login(&identity_number)?;
            println!("Logged in as {}", user.name);
        }
        SessionCommand::Logout => {
            manager.logout()?;
            println!("Logged out");
        }
        SessionCommand::Whoami => match manager.current_user() {
            Some(user) => print_user(user),
            None => bail!("not logged in"),
        },
        SessionCommand::Users { json } => {
            match manager.current_user() {
                Some(user) if user.is_admin => {}
                Some(_) => bail!("only admins can list users"),
                None => bail!("not logged in"),
            }
            let users = manager.users()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&users)?);
            } else {
                users.iter().for_each(print_user);
            }
        }
        SessionCommand::Task(command) => run_task(manager, command)?,
    }
    Ok(())
}

fn run_task(manager: &mut TaskManager<FileStore>, command: TaskCommand) -> Result<()> {
    match command {
        TaskCommand::Add {
            title,
            description,
            priority,
            assignee,
        } => {
            let mut new = NewTask::new(title)
                .description(description)
                .priority(priority);
            new.assignee = assignee;
            let task = manager.add_task(new)?;
            println!("{}", task.id);
        }
        TaskCommand::List(args) => list_tasks(manager, &args)?,
        TaskCommand::Update {
            task_id,
            title,
            description,
            priority,
            status,
        } => {
            let update = TaskUpdate {
                title,
                description,
                status,
                priority,
            };
            if update.is_empty() {
                bail!("nothing to update; pass at least one of --title, --description, --priority, --status");
            }
            print_task(manager.update_task(&task_id, update)?);
        }
        TaskCommand::Toggle { task_id } => print_task(manager.toggle_task_status(&task_id)?),
        TaskCommand::Delete { task_id } => {
            let removed = manager.delete_task(&task_id)?;
            println!("Deleted {}", removed.id);
        }
    }
    Ok(())
}

fn list_tasks(manager: &TaskManager<FileStore>, args: &ListArgs) -> Result<()> {
    if !manager.is_authenticated() {
        bail!("not logged in");
    }

    let visible = if args.mine {
        manager.user_tasks()
    } else {
        manager.all_tasks()
    };

    let mut query = TaskQuery::new().sort(args.sort_mode());
    if let Some(term) = &args.search {
        query = query.search(term.clone());
    }
    let tasks = query.apply(visible);

    if args.json {
        println!("{}", serde_json::to_string_pretty(&tasks)?);
    } else if tasks.is_empty() {
        println!("No tasks");
    } else {
        tasks.into_iter().for_each(print_task);
    }
    Ok(())
}

fn validate(ids: &[String], explain: bool) -> ExitCode {
    let mut all_valid = true;

    for id in ids {
        if validate_identity_number(id) {
            println!("{id}\tvalid");
            continue;
        }
        all_valid = false;
        match IdentityNumber::parse(id) {
            Err(reason) if explain => println!("{id}\tinvalid\t{reason}"),
            _ => println!("{id}\tinvalid"),
        }
    }

    if all_valid {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn print_user(user: &User) {
    let role = if user.is_admin { "admin" } else { "user" };
    println!("{}\t{}\t{}\t{}", user.id, user.identity_number, user.name, role);
}

fn print_task(task: &Task) {
    let mark = match task.status {
        gorev_core::TaskStatus::Complete => "[x]",
        gorev_core::TaskStatus::Incomplete => "[ ]",
    };
    println!(
        "{} {}\t{}\t{}\t{}\t{}",
        mark,
        task.id,
        task.priority,
        task.title,
        task.user_name,
        task.updated_at.format("%Y-%m-%d %H:%M")
    );
}
