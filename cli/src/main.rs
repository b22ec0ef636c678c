use anyhow::Context;
use chrono::NaiveDateTime;
use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{Verbosity, WarnLevel};
use std::path::PathBuf;

mod app;
mod config;

/// A fortune cookie a day, cracked from the terminal.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Settings file, defaults to lucky-charm.toml in the data directory
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Save document, overrides the settings file
    #[arg(long, global = true)]
    save: Option<PathBuf>,

    /// Fortune catalog JSON, overrides the bundled one
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    /// Display language (en, es), detected from LANG when unset
    #[arg(long, global = true)]
    locale: Option<String>,

    /// Pretend the local time is this instant, e.g. 2024-01-01T09:59:59
    #[arg(long, global = true, value_parser = parse_local_time)]
    now: Option<NaiveDateTime>,

    #[command(flatten)]
    verbosity: Verbosity<WarnLevel>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show whether today's cookie is waiting
    Status,
    /// Crack today's cookie and read the fortune
    Crack,
    /// List past fortunes, newest first
    History,
    /// Show or change preferences
    Settings {
        #[arg(long)]
        sound: Option<Toggle>,
        #[arg(long)]
        haptics: Option<Toggle>,
        #[arg(long)]
        tutorial_seen: bool,
    },
    /// Show the next daily reminder
    Remind,
    /// Show what sharing the latest fortune would send
    Share,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Toggle {
    On,
    Off,
}

impl From<Toggle> for bool {
    fn from(toggle: Toggle) -> Self {
        toggle == Toggle::On
    }
}

fn parse_local_time(text: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    text.parse()
}

fn init_logging(verbosity: &Verbosity<WarnLevel>) {
    use log::LevelFilter as Log;
    use tracing_subscriber::filter::LevelFilter;

    let level = match verbosity.log_level_filter() {
        Log::Off => LevelFilter::OFF,
        Log::Error => LevelFilter::ERROR,
        Log::Warn => LevelFilter::WARN,
        Log::Info => LevelFilter::INFO,
        Log::Debug => LevelFilter::DEBUG,
        Log::Trace => LevelFilter::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.verbosity);
    log::debug!("Application started");

    let options = app::Options {
        config: cli.config,
        save: cli.save,
        catalog: cli.catalog,
        locale: cli.locale,
        now: cli.now,
    };
    let mut app = app::App::build(options).context("Could not start")?;

    let output = match cli.command {
        Command::Status => app.status()?,
        Command::Crack => app.crack()?,
        Command::History => app.history()?,
        Command::Settings {
            sound,
            haptics,
            tutorial_seen,
        } => app.settings(sound.map(bool::from), haptics.map(bool::from), tutorial_seen)?,
        Command::Remind => app.remind()?,
        Command::Share => app.share()?,
    };
    print!("{output}");
    Ok(())
}
