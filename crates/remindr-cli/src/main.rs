use clap::Parser;
use owo_colors::{OwoColorize, Style};
use remindr_core::error::CoreError;
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;
mod config;
mod parser;
mod timezone;
mod views;

fn main() {
    let cli = cli::Cli::parse();
    init_tracing(cli.verbose);

    let config = match config::Config::new() {
        Ok(config) => config,
        Err(e) => {
            let error_style = Style::new().red().bold();
            eprintln!("{} Invalid configuration: {}", "Error:".style(error_style), e);
            std::process::exit(1);
        }
    };
    debug!(?config, "configuration loaded");

    let result = match cli.command {
        cli::Commands::Compile(command) => commands::compile::compile_reminder(command, &config),
        cli::Commands::Next(command) => commands::next::next_occurrences(command, &config),
        cli::Commands::Extract(command) => commands::extract::extract_reminder(command, &config),
        cli::Commands::List(command) => commands::list::list_schedules(command, &config),
    };

    if let Err(e) = result {
        handle_error(e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn handle_error(err: anyhow::Error) {
    let error_style = Style::new().red().bold();
    let core_error = err.chain().find_map(|cause| cause.downcast_ref::<CoreError>());

    match core_error {
        Some(CoreError::InvalidLocalTime(s)) => {
            eprintln!("{} {:#}", "Error:".style(error_style), err);
            eprintln!(
                "  {} falls in a daylight-saving gap; pick a time outside {}",
                s.yellow(),
                "the skipped hour".bold()
            );
        }
        Some(CoreError::MalformedExpression(s)) => {
            eprintln!("{} Malformed schedule expression: {}", "Error:".style(error_style), s);
            eprintln!(
                "  Expected {}, {} or {}",
                "at(YYYY-MM-DDTHH:MM:SS)".yellow(),
                "rate(<n> <unit>)".yellow(),
                "cron(<min> <hour> <dom> <month> <dow> <year>)".yellow()
            );
        }
        Some(CoreError::UnsatisfiableSchedule(s)) => {
            eprintln!("{} Schedule can never fire: {}", "Error:".style(error_style), s.yellow());
        }
        _ => eprintln!("{} {:#}", "Error:".style(error_style), err),
    }
}
