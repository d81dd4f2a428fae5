use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Compile reminder schedules into AWS-style schedule expressions and preview
/// when they fire
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Show debug logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Compile a reminder into a schedule expression
    Compile(CompileCommand),
    /// Show the upcoming fire times of a schedule expression
    Next(NextCommand),
    /// Validate and compile a payload from the reminder extractor
    Extract(ExtractCommand),
    /// Preview a file of stored schedule expressions, one per line
    List(ListCommand),
}

#[derive(Parser, Debug, Clone)]
pub struct CompileCommand {
    /// Start date (dd-mm-yyyy, or a phrase such as 'tomorrow' or 'next friday')
    #[arg(short, long, default_value = "today")]
    pub date: String,

    /// Time of day (e.g., '11:00 AM', '18:30')
    #[arg(short, long)]
    pub time: Option<String>,

    /// Timezone the date and time are given in (IANA format, e.g., 'Asia/Kolkata')
    #[arg(long)]
    pub timezone: Option<String>,

    /// Repeat every N hours
    #[arg(long, group = "repeat", value_name = "N")]
    pub every_hours: Option<u32>,

    /// Repeat every N days
    #[arg(long, group = "repeat", value_name = "N")]
    pub every_days: Option<u32>,

    /// Repeat every N weeks
    #[arg(long, group = "repeat", value_name = "N")]
    pub every_weeks: Option<u32>,

    /// Repeat weekly on these days (mon,tue,wed,thu,fri,sat,sun)
    #[arg(long, group = "repeat", value_delimiter = ',', num_args = 1..)]
    pub on: Vec<String>,

    /// Repeat monthly, on the start date's day unless --days is given
    #[arg(long, group = "repeat")]
    pub monthly: bool,

    /// Days of the month for --monthly (e.g., '1,15')
    #[arg(long, requires = "monthly", value_delimiter = ',', num_args = 1..)]
    pub days: Vec<u32>,

    /// Repeat every year on the start date
    #[arg(long, group = "repeat")]
    pub yearly: bool,

    /// What to be reminded of, used in the confirmation message
    #[arg(long)]
    pub task: Option<String>,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct NextCommand {
    /// A schedule expression, e.g. 'cron(30 5 ? * 2,4 *)'
    pub expression: String,

    /// Number of occurrences to show
    #[arg(short = 'n', long)]
    pub count: Option<usize>,

    /// Start after this instant (RFC 3339, or a phrase such as 'tomorrow')
    #[arg(long)]
    pub from: Option<String>,

    /// Timezone for the local time column
    #[arg(long)]
    pub timezone: Option<String>,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct ExtractCommand {
    /// Path to the JSON payload, or '-' for stdin
    pub file: String,

    /// Timezone the payload's date and time are given in
    #[arg(long)]
    pub timezone: Option<String>,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug, Clone)]
pub struct ListCommand {
    /// File with one schedule expression per line ('#' starts a comment)
    pub file: PathBuf,

    /// Occurrences to show per expression
    #[arg(short = 'n', long)]
    pub count: Option<usize>,

    /// Start after this instant (RFC 3339, or a phrase such as 'tomorrow')
    #[arg(long)]
    pub from: Option<String>,

    /// Timezone for displayed times
    #[arg(long)]
    pub timezone: Option<String>,
}
