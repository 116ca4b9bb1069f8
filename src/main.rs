// Only compile UI module when TUI feature is enabled
#[cfg(feature = "tui")]
mod ui;

use anyhow::{Context, Result};
use bill_dashboard::preferences;
use bill_dashboard::source::{DEFAULT_BASE_URL, DEFAULT_TIMEOUT_SECS};
use bill_dashboard::{
    ApiClient, BillFilters, BillStatus, ClientConfig, Dashboard, SortDirection, SortField,
    SortSpec,
};
use clap::{Args, Parser, Subcommand};
use std::fs::{self, OpenOptions};
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

const LOG_FILENAME: &str = "bill-dashboard.log";

#[derive(Debug, Parser)]
#[command(name = "bill-dashboard", version, about = "Virginia legislative bills dashboard")]
struct Cli {
    /// More output per occurrence (warn, info, debug, trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Base URL of the bills API
    #[arg(long, env = "BILLS_API_URL", default_value = DEFAULT_BASE_URL, global = true)]
    api_url: String,

    /// Request timeout in seconds
    #[arg(long, default_value_t = DEFAULT_TIMEOUT_SECS, global = true)]
    timeout: u64,

    /// Bills per page
    #[arg(long, global = true)]
    page_size: Option<NonZeroUsize>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand)]
enum Command {
    /// Interactive dashboard (default)
    Tui,

    /// Print one page of bills
    List {
        #[command(flatten)]
        view: ViewArgs,

        #[arg(long, default_value_t = 1)]
        page: usize,
    },

    /// Write the filtered, sorted bills to a CSV file
    Export {
        #[command(flatten)]
        view: ViewArgs,

        /// Directory for virginia-bills-<date>.csv
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },
}

#[derive(Debug, Clone, Default, Args)]
struct ViewArgs {
    /// Case-insensitive match on bill id, description or patron
    #[arg(long)]
    search: Option<String>,

    /// Only these statuses (repeatable)
    #[arg(long)]
    status: Vec<BillStatus>,

    #[arg(long)]
    new_only: bool,

    /// billId, patronName, status or createdAt
    #[arg(long)]
    sort: Option<SortField>,

    #[arg(long)]
    direction: Option<SortDirection>,
}

impl ViewArgs {
    fn apply(&self, dashboard: &mut Dashboard) {
        let default = SortSpec::default();
        dashboard.set_filters(BillFilters {
            search: self.search.clone().unwrap_or_default(),
            statuses: self.status.clone(),
            show_new_only: self.new_only,
        });
        dashboard.set_sort(SortSpec {
            field: self.sort.unwrap_or(default.field),
            direction: self.direction.unwrap_or(default.direction),
        });
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let command = cli.command.clone().unwrap_or(Command::Tui);

    // The alternate screen owns stdout/stderr while the TUI runs
    let log_target = match command {
        Command::Tui => match preferences::default_cache_dir() {
            Some(dir) => LogTarget::File(dir.join(LOG_FILENAME)),
            None => LogTarget::Off,
        },
        _ => LogTarget::Stderr,
    };
    setup_logging(cli.verbose, log_target)?;

    let client = ApiClient::new(ClientConfig {
        base_url: cli.api_url.clone(),
        timeout: Duration::from_secs(cli.timeout),
    })?;

    let mut dashboard = Dashboard::default();
    if let Some(size) = cli.page_size {
        dashboard = dashboard.with_page_size(size);
    }

    match command {
        Command::Tui => run_ui_mode(dashboard, client),
        Command::List { view, page } => {
            dashboard
                .load_from(&client)
                .with_context(|| format!("could not load bills from {}", cli.api_url))?;
            view.apply(&mut dashboard);
            dashboard.set_current_page(page);
            print_page(&dashboard);
            Ok(())
        }
        Command::Export { view, out_dir } => {
            dashboard
                .load_from(&client)
                .with_context(|| format!("could not load bills from {}", cli.api_url))?;
            view.apply(&mut dashboard);
            let path = dashboard.export_csv(&out_dir)?;
            println!("{}", path.display());
            Ok(())
        }
    }
}

enum LogTarget {
    Stderr,
    File(PathBuf),
    Off,
}

fn setup_logging(verbosity: u8, target: LogTarget) -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let level = match verbosity {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    let filter = tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into());

    let (stderr_layer, file_layer) = match target {
        LogTarget::Stderr => (
            Some(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr),
            ),
            None,
        ),
        LogTarget::File(path) => {
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(&path)
                .with_context(|| format!("could not open log file {}", path.display()))?;
            (
                None,
                Some(
                    tracing_subscriber::fmt::layer()
                        .with_ansi(false)
                        .with_target(false)
                        .with_writer(Mutex::new(file)),
                ),
            )
        }
        LogTarget::Off => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();
    Ok(())
}

fn print_page(dashboard: &Dashboard) {
    let page = dashboard.page();

    println!(
        "{:<12} {:<13} {:<11} {:<24} {}",
        "Bill ID", "Status", "Introduced", "Patron", "Description"
    );
    println!("{}", "━".repeat(100));
    for bill in &page.bills {
        println!(
            "{:<12} {:<13} {:<11} {:<24} {}",
            format!("{}{}", bill.bill_id, if bill.is_new { "*" } else { "" }),
            bill.status.label(),
            bill.created_at.format("%Y-%m-%d"),
            truncate(&bill.patron_name, 24),
            truncate(&bill.description, 60),
        );
    }
    println!(
        "\nPage {} of {} ({} bills)",
        page.current_page,
        page.total_pages.max(1),
        page.total_bills
    );
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

#[cfg(feature = "tui")]
fn run_ui_mode(mut dashboard: Dashboard, client: ApiClient) -> Result<()> {
    use bill_dashboard::Preferences;

    // A failed first load still opens the dashboard, with a retry banner
    if let Err(err) = dashboard.load_from(&client) {
        tracing::warn!(error = %err, "starting without bills");
    }

    let config_dir = preferences::default_config_dir();
    let prefs = match &config_dir {
        Some(dir) => Preferences::load(dir).unwrap_or_else(|err| {
            tracing::warn!(error = %err, "ignoring unreadable preferences");
            Preferences::default()
        }),
        None => Preferences::default(),
    };
    let export_dir = std::env::current_dir().context("could not resolve export directory")?;

    let mut app = ui::App::new(dashboard, Box::new(client), prefs, config_dir, export_dir);
    ui::run_ui(&mut app)?;

    Ok(())
}

#[cfg(not(feature = "tui"))]
fn run_ui_mode(_dashboard: Dashboard, _client: ApiClient) -> Result<()> {
    anyhow::bail!("built without the `tui` feature; use `list` or `export`")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_tui() {
        let cli = Cli::try_parse_from(["bill-dashboard"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.timeout, DEFAULT_TIMEOUT_SECS);
        assert_eq!(cli.verbose, 0);
    }

    #[test]
    fn test_list_arguments() {
        let cli = Cli::try_parse_from([
            "bill-dashboard",
            "-vv",
            "--api-url",
            "http://bills.example:8000",
            "list",
            "--status",
            "passed",
            "--status",
            "carried-over",
            "--sort",
            "patron",
            "--direction",
            "desc",
            "--page",
            "2",
        ])
        .unwrap();

        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.api_url, "http://bills.example:8000");
        match cli.command {
            Some(Command::List { view, page }) => {
                assert_eq!(page, 2);
                assert_eq!(view.status, vec![BillStatus::Passed, BillStatus::CarriedOver]);
                assert_eq!(view.sort, Some(SortField::PatronName));
                assert_eq!(view.direction, Some(SortDirection::Desc));
            }
            other => panic!("expected list, got {:?}", other),
        }
    }

    #[test]
    fn test_rejects_unknown_status_and_zero_page_size() {
        assert!(Cli::try_parse_from(["bill-dashboard", "list", "--status", "enacted"]).is_err());
        assert!(Cli::try_parse_from(["bill-dashboard", "--page-size", "0"]).is_err());
    }

    #[test]
    fn test_view_args_apply() {
        let mut dashboard = Dashboard::default();
        let view = ViewArgs {
            search: Some("HB".to_string()),
            sort: Some(SortField::BillId),
            ..Default::default()
        };
        view.apply(&mut dashboard);

        assert_eq!(dashboard.filters().search, "HB");
        assert_eq!(dashboard.sort().field, SortField::BillId);
        assert_eq!(dashboard.sort().direction, SortDirection::Desc);
    }
}
