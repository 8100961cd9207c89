//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::report::ExportLocale;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Trello Reports - board analytics and public board proxy
///
/// Fetch a Trello board and summarize it: cards per list and per owner,
/// a list-by-owner heatmap, monthly activity, a 14-day trend, a weekly
/// digest, and JSON/CSV exports. The `serve` command runs the proxy that
/// lets public dashboards read a board without exposing credentials.
///
/// Examples:
///   trello-reports serve --bind 127.0.0.1:3000
///   trello-reports report --board CUUp9Mv3 --format summary
///   trello-reports report --query "boardId=CUUp9Mv3&mode=public&access=devtoken" --proxy-url https://reports.example.com
///   trello-reports report --board CUUp9Mv3 --label lb-bug --due-to 2024-03-31 --format csv
///   trello-reports --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Path to configuration file
    ///
    /// If not specified, looks for .trello-reports.toml in the current directory
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Generate a default .trello-reports.toml configuration file
    #[arg(long)]
    pub init_config: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the board proxy (`GET /api/board`)
    Serve(ServeArgs),

    /// Fetch a board and produce a report
    Report(ReportArgs),
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct ServeArgs {
    /// Address to listen on (default from config, else 0.0.0.0:3000)
    #[arg(long, value_name = "ADDR")]
    pub bind: Option<String>,
}

#[derive(clap::Args, Debug, Clone, Default)]
pub struct ReportArgs {
    /// Board id (short link or full id)
    #[arg(short, long, value_name = "ID")]
    pub board: Option<String>,

    /// Dashboard query string or URL
    ///
    /// Accepts boardId, mode, access, manager, reportName, logo, logoSize
    /// and logoMaxW. Explicit flags override values found here.
    #[arg(long, value_name = "QS")]
    pub query: Option<String>,

    /// Board proxy origin used in public mode
    #[arg(long, value_name = "URL", env = "TRELLO_REPORTS_PROXY_URL")]
    pub proxy_url: Option<String>,

    /// Access token for the board proxy
    #[arg(long, value_name = "TOKEN")]
    pub access: Option<String>,

    /// Only cards in this list (repeatable)
    #[arg(long = "list", value_name = "ID")]
    pub lists: Vec<String>,

    /// Only cards carrying this label (repeatable)
    #[arg(long = "label", value_name = "ID")]
    pub labels: Vec<String>,

    /// Only cards assigned to this member (repeatable)
    #[arg(long = "member", value_name = "ID")]
    pub members: Vec<String>,

    /// Earliest due date, inclusive (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub due_from: Option<String>,

    /// Latest due date, inclusive through end of day (YYYY-MM-DD)
    #[arg(long, value_name = "DATE")]
    pub due_to: Option<String>,

    /// Output format
    #[arg(long, default_value = "summary", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Show the activity series cumulatively
    #[arg(long)]
    pub cumulative: bool,

    /// Custom report name
    #[arg(long, value_name = "NAME")]
    pub report_name: Option<String>,

    /// Digest recipient; prints a mailto: link with the digest
    #[arg(long, value_name = "EMAIL")]
    pub manager: Option<String>,

    /// CSV header language
    #[arg(long, value_name = "LOCALE")]
    pub locale: Option<Locale>,

    /// Output file path
    ///
    /// Defaults to stdout for summary and digest, and to
    /// trello-report-<millis>.<ext> for json and csv.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// Output format for the report command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown dashboard (default)
    #[default]
    Summary,
    /// Weekly digest text
    Digest,
    /// Filtered cards as JSON
    Json,
    /// Filtered cards as CSV
    Csv,
}

/// CSV header language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Locale {
    English,
    Portuguese,
}

impl From<Locale> for ExportLocale {
    fn from(locale: Locale) -> Self {
        match locale {
            Locale::English => ExportLocale::English,
            Locale::Portuguese => ExportLocale::Portuguese,
        }
    }
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        // Skip validation for --init-config
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        match self.command {
            None => Err("A command is required: serve or report".to_string()),
            Some(Command::Serve(_)) => Ok(()),
            Some(Command::Report(ref report)) => {
                if let Some(ref proxy) = report.proxy_url {
                    if !proxy.starts_with("http://") && !proxy.starts_with("https://") {
                        return Err("Proxy URL must start with 'http://' or 'https://'".to_string());
                    }
                }
                if report.board.as_deref().is_some_and(|b| b.trim().is_empty()) {
                    return Err("Board id must not be empty".to_string());
                }
                Ok(())
            }
        }
    }

    /// Returns the log level based on verbosity settings.
    ///
    /// `config_verbose` is `[general] verbose` from the config file; the
    /// `--quiet` flag still wins over it.
    pub fn log_level(&self, config_verbose: bool) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose || config_verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }
}
