use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod account;
mod auth;
mod config;
mod llm;
mod prompt;
mod session;
mod state;
mod todos;

use todos::ListFilter;

#[derive(Parser, Debug)]
#[command(
    name = "jotter",
    version,
    long_version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("JOTTER_BUILD_SHA"), ")"),
    about = "Personal todo list with natural-language task entry"
)]
struct Cli {
    /// More log output (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an account (password is prompted)
    Register {
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        username: String,
    },

    /// Log in (password is prompted)
    Login {
        #[arg(long)]
        username: String,
    },

    /// Forget the current login
    Logout,

    /// Show the logged-in user
    Whoami,

    /// Add a todo from free text, e.g. `jotter add pay rent by friday`
    Add {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,

        /// Store the text as typed (no model call)
        #[arg(long, default_value_t = false)]
        raw: bool,
    },

    /// List your todos
    List {
        #[arg(long, value_enum, default_value_t = ListFilter::All)]
        show: ListFilter,
    },

    /// Mark a todo done
    Done { id: u64 },

    /// Mark a todo not done
    Undone { id: u64 },

    /// Replace a todo's text (re-normalized unless --raw)
    Edit {
        id: u64,

        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,

        #[arg(long, default_value_t = false)]
        raw: bool,
    },

    /// Delete a todo
    Delete { id: u64 },

    /// Show how free text would be normalized, without storing it
    Normalize {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,

        /// Reference date (YYYY-MM-DD) instead of today
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Configuration file commands
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },

    /// Store model provider credentials
    Auth {
        #[command(subcommand)]
        command: AuthCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write ~/.jotter/config.toml with defaults (if missing)
    Init,

    /// Print the effective configuration
    Show,
}

#[derive(Subcommand, Debug)]
enum AuthCommand {
    /// Paste an Anthropic API key into ~/.jotter/auth.json
    PasteAnthropicToken,

    /// Paste an OpenAI API key into ~/.jotter/auth.json
    PasteOpenaiApiKey,
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let cfg = config::load_config()?;
    tracing::debug!(command = ?cli.command, "dispatch");

    match cli.command {
        Command::Register {
            first_name,
            last_name,
            email,
            username,
        } => account::register(account::Registration {
            first_name,
            last_name,
            email,
            username,
        })?,
        Command::Login { username } => account::login(&username)?,
        Command::Logout => account::logout()?,
        Command::Whoami => account::whoami()?,

        Command::Add { text, raw } => todos::add(&cfg, &text.join(" "), raw)?,
        Command::List { show } => todos::list(show)?,
        Command::Done { id } => todos::set_done(id, true)?,
        Command::Undone { id } => todos::set_done(id, false)?,
        Command::Edit { id, text, raw } => todos::edit(&cfg, id, &text.join(" "), raw)?,
        Command::Delete { id } => todos::delete(id)?,
        Command::Normalize { text, date } => todos::preview(&cfg, &text.join(" "), date)?,

        Command::Config { command } => match command {
            ConfigCommand::Init => {
                let (p, written) = config::init_config()?;
                if written {
                    println!("Wrote {}", p.display());
                } else {
                    println!("Config already exists: {}", p.display());
                }
            }
            ConfigCommand::Show => {
                let s = toml::to_string_pretty(&cfg).context("serialize config")?;
                println!("# {}\n{}", config::config_path()?.display(), s);
            }
        },

        Command::Auth { command } => {
            let p = match command {
                AuthCommand::PasteAnthropicToken => auth::anthropic_paste_token()?,
                AuthCommand::PasteOpenaiApiKey => auth::openai_paste_api_key()?,
            };
            println!("Saved to {}", p.display());
        }
    }

    Ok(())
}
