//! Trello Reports - board analytics and public board proxy
//!
//! `serve` runs the `/api/board` proxy; `report` fetches one board and
//! writes a Markdown summary, a weekly digest, or a JSON/CSV export.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Any error (bad arguments, config, fetch or write failure)

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use indicatif::{ProgressBar, ProgressStyle};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};
use trello_reports::analysis::{Dashboard, DashboardOptions, SeriesMode};
use trello_reports::cli::{Args, Command, OutputFormat, ReportArgs};
use trello_reports::config::{Config, CONFIG_FILE};
use trello_reports::filter::{filter_cards, FilterState};
use trello_reports::params::{parse_date, DashboardParams, DEFAULT_LOGO, DEFAULT_LOGO_MAX_WIDTH};
use trello_reports::report::{
    digest_title, export_filename, export_records, generate_markdown_report, mailto_link, to_csv,
    to_json, weekly_digest, ExportFormat, ReportHeader,
};
use trello_reports::server::{self, ProxyState};
use trello_reports::source::{load_snapshot, Source, TrelloApi};

#[tokio::main]
async fn main() -> Result<()> {
    // Parse command-line arguments
    let args = Args::parse_args();

    // Validate arguments
    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    // Config is read first so `[general] verbose` can raise the log level
    let loaded = load_config(&args);
    let config_verbose = loaded
        .as_ref()
        .is_ok_and(|(config, _)| config.general.verbose);
    init_logging(&args, config_verbose);

    info!("Trello Reports v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    let result = match loaded {
        Ok((config, origin)) => {
            origin.log();
            match args.command {
                Some(Command::Serve(_)) => run_serve(&args, &config).await,
                Some(Command::Report(ref report)) => run_report(&args, &config, report).await,
                None => Ok(()),
            }
        }
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        error!("Command failed: {:#}", e);
        eprintln!("\n❌ Error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Handle --init-config: generate a default .trello-reports.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE);

    if path.exists() {
        eprintln!(
            "⚠️  {} already exists. Remove it first or edit it manually.",
            CONFIG_FILE
        );
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content).with_context(|| format!("Failed to write {}", CONFIG_FILE))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE);
    println!("   Keep TRELLO_KEY and TRELLO_TOKEN in the environment rather than the file.");
    Ok(())
}

/// Initialize logging based on verbosity settings.
///
/// The proxy honours `RUST_LOG` when set.
fn init_logging(args: &Args, config_verbose: bool) {
    let level = args.log_level(config_verbose);

    let installed = if matches!(args.command, Some(Command::Serve(_))) {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(level.to_string()));
        let subscriber = FmtSubscriber::builder()
            .with_env_filter(filter)
            .with_target(false)
            .with_thread_ids(false)
            .compact()
            .finish();
        tracing::subscriber::set_global_default(subscriber)
    } else {
        let subscriber = FmtSubscriber::builder()
            .with_max_level(level)
            .with_target(false)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .compact()
            .finish();
        tracing::subscriber::set_global_default(subscriber)
    };

    if let Err(e) = installed {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Where the configuration came from. Logged once logging is up.
enum ConfigOrigin {
    Explicit(PathBuf),
    DefaultFile,
    Defaults,
    Unreadable(anyhow::Error),
}

impl ConfigOrigin {
    fn log(&self) {
        match self {
            ConfigOrigin::Explicit(path) => info!("Loaded config from: {}", path.display()),
            ConfigOrigin::DefaultFile => info!("Loaded default config from {}", CONFIG_FILE),
            ConfigOrigin::Defaults => debug!("No config file found, using defaults"),
            ConfigOrigin::Unreadable(e) => warn!("Failed to load config: {:#}", e),
        }
    }
}

/// Load configuration from file or use defaults, then apply the
/// environment and CLI overrides.
fn load_config(args: &Args) -> Result<(Config, ConfigOrigin)> {
    let (mut config, origin) = if let Some(ref config_path) = args.config {
        (
            Config::load(config_path)?,
            ConfigOrigin::Explicit(config_path.clone()),
        )
    } else {
        match Config::load_default() {
            Ok(Some(config)) => (config, ConfigOrigin::DefaultFile),
            Ok(None) => (Config::default(), ConfigOrigin::Defaults),
            Err(e) => (Config::default(), ConfigOrigin::Unreadable(e)),
        }
    };

    config.apply_env();
    config.merge_with_args(args);
    Ok((config, origin))
}

/// Run the board proxy until Ctrl-C.
async fn run_serve(args: &Args, config: &Config) -> Result<()> {

    let credentials = config.trello.credentials();
    if credentials.is_none() {
        warn!("TRELLO_KEY or TRELLO_TOKEN not configured; board requests will fail");
    }
    if config.server.access_token.is_empty() {
        warn!("No access token configured; the proxy accepts every request");
    }

    let api = TrelloApi::new(config.trello.api_base.clone(), credentials);
    let state = ProxyState::new(
        api,
        Some(config.server.access_token.clone()),
        &config.server.cache_control,
    )?;

    let addr: SocketAddr = config
        .server
        .bind
        .parse()
        .with_context(|| format!("Invalid bind address: {}", config.server.bind))?;

    if !args.quiet {
        println!("🚀 Board proxy on http://{}/api/board", addr);
    }
    server::serve(state, addr).await
}

/// Everything a report run needs, resolved from flags, the query string
/// and the config file.
#[derive(Debug)]
struct ReportPlan {
    board_id: String,
    public_mode: bool,
    access: Option<String>,
    report_name: Option<String>,
    manager: Option<String>,
    header_logo: String,
    logo_size: u32,
    logo_max_width: u32,
    filter: FilterState,
    series_mode: SeriesMode,
    output: Option<PathBuf>,
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

/// Merge flags over the query string over the config file.
fn plan_report(report: &ReportArgs, config: &Config) -> Result<ReportPlan> {
    let params = report
        .query
        .as_deref()
        .map(DashboardParams::parse)
        .unwrap_or_default();

    let board_id = report
        .board
        .as_deref()
        .and_then(non_empty)
        .or_else(|| params.board_id.clone())
        .context("No board id: pass --board or boardId in --query")?;

    let due_from = report
        .due_from
        .as_deref()
        .map(|v| parse_date("--due-from", v))
        .transpose()?;
    let due_to = report
        .due_to
        .as_deref()
        .map(|v| parse_date("--due-to", v))
        .transpose()?;

    let filter = FilterState::new()
        .with_lists(&report.lists)
        .with_labels(&report.labels)
        .with_members(&report.members)
        .with_due(due_from, due_to);

    Ok(ReportPlan {
        public_mode: params.public_mode() || report.board.is_some(),
        board_id,
        access: report.access.clone().or_else(|| params.access.clone()),
        report_name: report
            .report_name
            .clone()
            .or_else(|| params.report_name.clone())
            .or_else(|| non_empty(&config.report.title)),
        manager: report
            .manager
            .clone()
            .or_else(|| params.manager.clone())
            .or_else(|| non_empty(&config.report.manager_email)),
        header_logo: if params.logo != DEFAULT_LOGO {
            params.logo.clone()
        } else {
            config.report.logo.clone()
        },
        logo_size: params.logo_size.unwrap_or(config.report.logo_size),
        logo_max_width: if params.logo_max_width != DEFAULT_LOGO_MAX_WIDTH {
            params.logo_max_width
        } else {
            config.report.logo_max_width
        },
        filter,
        series_mode: if report.cumulative {
            SeriesMode::Cumulative
        } else {
            SeriesMode::Monthly
        },
        output: non_empty(&config.general.output).map(PathBuf::from),
    })
}

/// Fetch a board and produce the requested report.
async fn run_report(args: &Args, config: &Config, report: &ReportArgs) -> Result<()> {
    let start_time = Instant::now();
    let plan = plan_report(report, config)?;
    debug!("Report plan: {:?}", plan);

    let api = TrelloApi::new(config.trello.api_base.clone(), config.trello.credentials());
    let source = Source::select(
        plan.public_mode,
        non_empty(&config.report.proxy_url).as_deref(),
        plan.access.clone(),
        api,
    );
    if plan.public_mode && matches!(source, Source::Direct(_)) {
        debug!("No proxy URL configured; reading the Trello API directly");
    }

    let spinner = if args.quiet {
        None
    } else {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(style);
        }
        pb.set_message(format!(
            "Fetching board {} from the {}...",
            plan.board_id,
            source.describe()
        ));
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    };

    let loaded = load_snapshot(&source, &plan.board_id).await;
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }
    let snapshot =
        loaded.with_context(|| format!("Failed to load board {}", plan.board_id))?;

    let now = Utc::now();
    let dashboard = Dashboard::compute(
        &snapshot,
        &plan.filter,
        DashboardOptions {
            now,
            series_mode: plan.series_mode,
        },
    );
    let cards = filter_cards(&snapshot.cards, &plan.filter);
    let title = digest_title(plan.report_name.as_deref(), snapshot.board_name.as_deref());

    let written = match report.format {
        OutputFormat::Summary => {
            let header = ReportHeader {
                title: title.clone(),
                board_url: snapshot.board_url.clone(),
                logo_url: non_empty(&plan.header_logo),
                logo_size: plan.logo_size,
                logo_max_width: plan.logo_max_width,
            };
            let markdown = generate_markdown_report(&header, &snapshot, &dashboard);
            emit(plan.output.as_deref(), &markdown)?
        }
        OutputFormat::Digest => {
            let digest = weekly_digest(&snapshot, &cards, &title, now);
            let written = emit(plan.output.as_deref(), &digest)?;
            if let Some(ref manager) = plan.manager {
                println!("\n📧 {}", mailto_link(manager, &title, &digest));
            }
            written
        }
        OutputFormat::Json | OutputFormat::Csv => {
            let format = if report.format == OutputFormat::Json {
                ExportFormat::Json
            } else {
                ExportFormat::Csv
            };
            let records = export_records(&snapshot, &cards);
            let content = match format {
                ExportFormat::Json => to_json(&records)?,
                ExportFormat::Csv => to_csv(&records, config.report.export_locale)?,
            };
            let path = plan
                .output
                .clone()
                .unwrap_or_else(|| PathBuf::from(export_filename(format, now)));
            write_file(&path, &content)?;
            Some(path)
        }
    };

    if let Some(path) = written {
        if !args.quiet {
            print_summary(&dashboard, start_time, now);
            println!("\n✅ Report saved to: {}", path.display());
        }
    }

    Ok(())
}

/// Write to `path`, or print to stdout when none is given.
fn emit(path: Option<&Path>, content: &str) -> Result<Option<PathBuf>> {
    match path {
        Some(path) => {
            write_file(path, content)?;
            Ok(Some(path.to_path_buf()))
        }
        None => {
            println!("{}", content);
            Ok(None)
        }
    }
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write report to {}", path.display()))?;
    info!("Wrote {} bytes to {}", content.len(), path.display());
    Ok(())
}

fn print_summary(dashboard: &Dashboard, start_time: Instant, now: DateTime<Utc>) {
    println!("\n📊 Board Summary:");
    println!(
        "   Cards: {} total | {} unassigned | {} matching filters",
        dashboard.kpis.total_cards, dashboard.kpis.unassigned_cards, dashboard.matched_cards
    );
    println!(
        "   Lists: {} | Members: {}",
        dashboard.kpis.lists, dashboard.kpis.members
    );
    if let Some(top) = dashboard.lists.first() {
        println!("   Busiest list: {} ({})", top.name, top.count);
    }
    println!(
        "   Generated {} in {:.1}s",
        now.format("%Y-%m-%d %H:%M UTC"),
        start_time.elapsed().as_secs_f64()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn report_args(flags: &[&str]) -> ReportArgs {
        let mut full = vec!["trello-reports", "report"];
        full.extend_from_slice(flags);
        match Args::parse_from(full).command {
            Some(Command::Report(report)) => report,
            _ => panic!("expected report command"),
        }
    }

    #[test]
    fn test_flags_override_query() {
        let report = report_args(&[
            "--query",
            "boardId=from-query&access=q-token&reportName=Query+Name&logoSize=30",
            "--board",
            "from-flag",
            "--report-name",
            "Flag Name",
        ]);
        let plan = plan_report(&report, &Config::default()).unwrap();

        assert_eq!(plan.board_id, "from-flag");
        assert_eq!(plan.access.as_deref(), Some("q-token"));
        assert_eq!(plan.report_name.as_deref(), Some("Flag Name"));
        assert_eq!(plan.logo_size, 30);
        assert!(plan.public_mode);
    }

    #[test]
    fn test_query_overrides_config() {
        let mut config = Config::default();
        config.report.title = "Config Name".into();
        config.report.manager_email = "config@example.com".into();
        config.report.logo_max_width = 180;

        let report = report_args(&["--query", "boardId=b1&manager=lead%40example.com"]);
        let plan = plan_report(&report, &config).unwrap();

        assert_eq!(plan.report_name.as_deref(), Some("Config Name"));
        assert_eq!(plan.manager.as_deref(), Some("lead@example.com"));
        assert_eq!(plan.logo_max_width, 180);
        assert_eq!(plan.output, None);
    }

    #[test]
    fn test_filters_from_flags() {
        let report = report_args(&[
            "--board",
            "b1",
            "--member",
            "m-ada",
            "--due-from",
            "2024-03-01",
            "--cumulative",
        ]);
        let plan = plan_report(&report, &Config::default()).unwrap();
        assert_eq!(plan.filter.active_count(), 2);
        assert_eq!(plan.series_mode, SeriesMode::Cumulative);
    }

    #[test]
    fn test_plan_errors() {
        let missing = report_args(&["--query", "mode=public"]);
        assert!(plan_report(&missing, &Config::default()).is_err());

        let bad_date = report_args(&["--board", "b1", "--due-to", "tomorrow"]);
        let err = plan_report(&bad_date, &Config::default()).unwrap_err();
        assert!(err.to_string().contains("--due-to"));
    }

    #[test]
    fn test_config_file_verbose_reaches_log_level() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reports.toml");
        std::fs::write(&path, "[general]\nverbose = true\n").unwrap();

        let args = Args::parse_from(["trello-reports", "--config", path.to_str().unwrap(), "serve"]);
        let (config, origin) = load_config(&args).unwrap();
        assert!(matches!(origin, ConfigOrigin::Explicit(_)));
        assert!(config.general.verbose);
        assert_eq!(args.log_level(config.general.verbose), tracing::Level::DEBUG);
    }

    #[test]
    fn test_emit_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("digest.txt");
        let written = emit(Some(&path), "Weekly digest").unwrap();
        assert_eq!(written.as_deref(), Some(path.as_path()));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "Weekly digest");
    }
}
