#![forbid(unsafe_code)]

mod analyze;
mod output;

use analyze::AnalyzeArgs;
use anyhow::Context;
use chrono::Utc;
use clap::Parser;
use jirastat_core::timing;
use std::env;
use std::io;
use std::path::PathBuf;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "jirastat: daily status snapshots and IN/OUT flow from JIRA issue history",
    long_about = None,
    after_help = "EXAMPLES:\n    # Status report from ./output.json\n    jirastat\n\n    # Priority report from another export\n    jirastat export.json priority\n\n    # Trace every event, snapshot match, and classified transition\n    jirastat export.json status --debug"
)]
struct Cli {
    /// Issue export, JSON with the changelog expanded.
    #[arg(default_value = "output.json")]
    input: PathBuf,

    /// Field id to report on (`status`, `priority`, `customfield_10010`, ...).
    #[arg(default_value = "status")]
    field: String,

    /// Enable per-event debug tracing.
    #[arg(short, long, alias = "debug")]
    verbose: bool,
}

impl Cli {
    fn analyze_args(&self) -> AnalyzeArgs {
        AnalyzeArgs {
            input: self.input.clone(),
            field: self.field.clone(),
        }
    }
}

fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "jirastat=debug,info"
    } else {
        "jirastat=info,warn"
    }
}

fn init_tracing(verbose: bool) {
    let filter = EnvFilter::try_from_env("JIRASTAT_LOG").unwrap_or_else(|_| {
        EnvFilter::new(default_filter(verbose || env::var("DEBUG").is_ok()))
    });

    let format = env::var("JIRASTAT_LOG_FORMAT").unwrap_or_else(|_| "compact".to_string());

    let registry = tracing_subscriber::registry().with(filter);

    match format.as_str() {
        "json" => {
            registry
                .with(fmt::layer().json().with_ansi(false).with_writer(io::stderr))
                .init();
        }
        _ => {
            registry
                .with(fmt::layer().compact().with_writer(io::stderr))
                .init();
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let timing_enabled = timing::timing_enabled_from_env();
    timing::set_timing_enabled(timing_enabled);
    timing::clear_timings();

    if cli.verbose {
        debug!("Verbose mode enabled");
    }

    let project_root = env::current_dir().context("failed to resolve working directory")?;
    let output = output::resolve_output_mode();
    let today = Utc::now().date_naive();

    let command_result = analyze::run_analyze(&cli.analyze_args(), output, &project_root, today);

    if timing_enabled {
        let report = timing::collect_report();
        if report.is_empty() {
            eprintln!("timing report: no samples recorded");
        } else {
            eprintln!("timing report:");
            eprintln!("{}", report.display_table());
            eprintln!("timing report (json):");
            eprintln!("{}", serde_json::to_string_pretty(&report.to_json())?);
        }
    }

    command_result
}
