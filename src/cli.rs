//! Command-line front end.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::bridge::CommandBridge;
use crate::outreach::{OutreachCoordinator, SpreadsheetStore};
use crate::sheet::{CompanyTracker, SqliteSheet};
use crate::state::{load_config, resolve_workbook_path};
use crate::types::Config;
use crate::util::atomic_write_str;

pub const USAGE: &str = "\
Usage: outreach [--config PATH] [--workbook PATH] <command>

Commands:
  init                 write the base headers to the workbook
  add <id> <name>      add a company row
  list                 show companies, status and people count
  run [--report PATH]  send connection requests for every pending company
  reset <id>           clear a company's status and comments

Options:
  --config PATH        config file (default ~/.outreach/config.json)
  --workbook PATH      workbook file (default ~/.outreach/workbook.sqlite3)
  -h, --help           show this help
";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Init,
    Add { id: String, name: String },
    List,
    Run { report: Option<PathBuf> },
    Reset { id: String },
    Help,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cli {
    pub config: Option<PathBuf>,
    pub workbook: Option<PathBuf>,
    pub command: Command,
}

/// Parse arguments, program name excluded.
pub fn parse_args<I>(args: I) -> Result<Cli, String>
where
    I: IntoIterator<Item = String>,
{
    let mut config = None;
    let mut workbook = None;
    let mut report = None;
    let mut positional: Vec<String> = Vec::new();

    let mut args = args.into_iter();
    while let Some(a) = args.next() {
        match a.as_str() {
            "--config" => {
                config = Some(PathBuf::from(args.next().ok_or("Missing value for --config")?));
            }
            "--workbook" => {
                workbook = Some(PathBuf::from(
                    args.next().ok_or("Missing value for --workbook")?,
                ));
            }
            "--report" => {
                report = Some(PathBuf::from(args.next().ok_or("Missing value for --report")?));
            }
            "-h" | "--help" => {
                return Ok(Cli {
                    config,
                    workbook,
                    command: Command::Help,
                })
            }
            flag if flag.starts_with("--") => return Err(format!("Unknown arg: {}", flag)),
            _ => positional.push(a),
        }
    }

    let mut positional = positional.into_iter();
    let name = positional.next().ok_or("Missing command")?;
    let command = match name.as_str() {
        "init" => Command::Init,
        "list" => Command::List,
        "run" => Command::Run { report: report.take() },
        "add" => {
            let id = positional.next().ok_or("Missing company id")?;
            let rest: Vec<String> = positional.by_ref().collect();
            if rest.is_empty() {
                return Err("Missing company name".to_string());
            }
            Command::Add {
                id,
                name: rest.join(" "),
            }
        }
        "reset" => Command::Reset {
            id: positional.next().ok_or("Missing company id")?,
        },
        other => return Err(format!("Unknown command: {}", other)),
    };

    if let Some(extra) = positional.next() {
        return Err(format!("Unexpected argument: {}", extra));
    }
    if report.is_some() {
        return Err("--report only applies to run".to_string());
    }

    Ok(Cli {
        config,
        workbook,
        command,
    })
}

/// Run a parsed command. Returns the text to print.
pub async fn execute(cli: Cli) -> Result<String, String> {
    if cli.command == Command::Help {
        return Ok(USAGE.to_string());
    }

    let config = load_config(cli.config.as_deref())?;
    let workbook = resolve_workbook_path(cli.workbook.as_deref(), &config)?;
    log::debug!("Using workbook {}", workbook.display());

    match cli.command {
        Command::Help => Ok(USAGE.to_string()),
        Command::Init => {
            let tracker = open_tracker(&workbook, true)?;
            let written = tracker
                .initialize_headers()
                .await
                .map_err(|e| e.to_string())?;
            Ok(if written {
                format!("Initialized {}\n", workbook.display())
            } else {
                format!("{} already has headers\n", workbook.display())
            })
        }
        Command::Add { id, name } => {
            let tracker = open_tracker(&workbook, true)?;
            let row = tracker.add_company(&id, &name).map_err(|e| e.to_string())?;
            Ok(format!("Added {} ({}) at row {}\n", id, name, row))
        }
        Command::List => {
            let tracker = open_tracker(&workbook, false)?;
            let companies = tracker.get_all_companies().map_err(|e| e.to_string())?;
            let mut out = String::new();
            for company in companies {
                let status = company.status.as_cell();
                out.push_str(&format!(
                    "{}\t{}\t{}\t{} people\n",
                    company.id,
                    company.name,
                    if status.is_empty() { "-" } else { status.as_str() },
                    company.people.len()
                ));
            }
            Ok(out)
        }
        Command::Reset { id } => {
            let tracker = open_tracker(&workbook, false)?;
            tracker.reset_company(&id).map_err(|e| e.to_string())?;
            Ok(format!("Reset {}\n", id))
        }
        Command::Run { report } => run(&config, &workbook, report.as_deref()).await,
    }
}

fn open_tracker(workbook: &Path, create: bool) -> Result<CompanyTracker<SqliteSheet>, String> {
    let sheet = if create {
        SqliteSheet::open(workbook)
    } else {
        SqliteSheet::open_existing(workbook)
    }
    .map_err(|e| e.to_string())?;
    Ok(CompanyTracker::new(sheet))
}

async fn run(
    config: &Config,
    workbook: &Path,
    report_path: Option<&Path>,
) -> Result<String, String> {
    let tracker = Arc::new(open_tracker(workbook, false)?);
    tracker
        .initialize_headers()
        .await
        .map_err(|e| e.to_string())?;

    let bridge = Arc::new(CommandBridge::from_config(config).map_err(|e| e.to_string())?);
    let coordinator = OutreachCoordinator::new(config, tracker, bridge.clone(), bridge);
    let report = coordinator.run_all().await.map_err(|e| e.to_string())?;

    if let Some(path) = report_path {
        atomic_write_str(path, &report.to_json()?)?;
        log::info!("Wrote run report to {}", path.display());
    }

    let mut out = String::new();
    for outcome in report.outcomes.iter().filter(|o| !o.is_skipped()) {
        out.push_str(&format!(
            "{}: {} connection requests sent\n",
            outcome.company_id, outcome.sent
        ));
    }
    Ok(out)
}
