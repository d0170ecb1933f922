//! Binary entry point. Startup is: read configuration, start logging,
//! replace-load the dataset into the store, then hand control to the terminal
//! UI until the operator exits. A dataset that cannot be loaded is fatal.
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::terminal;
use health_kiosk::{hash_password, logging, run_app, AdminGate, App, Config, RecordStore};
use tracing::info;

#[derive(Debug, Parser)]
#[command(name = "health-kiosk", version, about = "HSE health centre information kiosk")]
struct Cli {
    /// Configuration file (defaults to the per-user config directory).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// CSV dataset to load at startup.
    #[arg(long)]
    dataset: Option<PathBuf>,

    /// SQLite database file.
    #[arg(long)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the value for `admin.password_sha256`.
    ///
    /// The password is read from the first line of stdin. When stdin is a
    /// terminal, input is not echoed.
    HashPassword {
        #[arg(long, default_value = "")]
        salt: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(Command::HashPassword { salt }) = &cli.command {
        return print_password_hash(salt);
    }

    let mut config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;
    if let Some(dataset) = cli.dataset {
        config.dataset_path = dataset;
    }
    if let Some(db) = cli.db {
        config.db_path = db;
    }

    logging::init_logging(&config.log.level, &config.log.file)?;

    let store = RecordStore::from_config(&config)?;
    store
        .load(&config.dataset_path)
        .context("cannot start without the health centre dataset")?;

    let gate = AdminGate::from_config(&config.admin);
    if !gate.is_configured() {
        info!("no admin credential configured; admin mode disabled");
    }

    let mut app = App::new(store, gate, config.inactivity_timeout());
    let result = run_app(&mut app);
    info!("kiosk shut down");
    result
}

fn print_password_hash(salt: &str) -> Result<()> {
    let stdin = io::stdin();
    let password = if stdin.is_terminal() {
        eprint!("Password: ");
        io::stderr().flush()?;
        read_password_hidden()?
    } else {
        let mut line = String::new();
        stdin
            .lock()
            .read_line(&mut line)
            .context("failed to read password from stdin")?;
        line.trim_end_matches(['\r', '\n']).to_string()
    };
    println!("{}", hash_password(salt, &password));
    Ok(())
}

/// Read one line in raw mode so the typed password is never echoed.
fn read_password_hidden() -> Result<String> {
    terminal::enable_raw_mode().context("failed to enable raw mode")?;
    let result = collect_password(event::read);
    terminal::disable_raw_mode().context("failed to disable raw mode")?;
    eprintln!();
    result
}

fn collect_password(mut next_event: impl FnMut() -> io::Result<Event>) -> Result<String> {
    let mut password = String::new();
    loop {
        if let Event::Key(key) = next_event()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match key.code {
                KeyCode::Enter => return Ok(password),
                KeyCode::Backspace => {
                    password.pop();
                }
                KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                    bail!("cancelled");
                }
                KeyCode::Char(ch) => password.push(ch),
                _ => {}
            }
        }
    }
}
