//! `courier` emails bulk delivery volunteers the instructions for their stops.

use std::process::ExitCode;
use std::sync::Arc;

use chrono::NaiveDate;
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use courier_common::config::AppConfig;
use courier_common::types::GroupingMode;
use courier_engine::dispatch::{DispatchPlan, DispatchReport, Dispatcher};
use courier_engine::renderer::Renderer;
use courier_notifier::SendGridTransport;
use courier_store::AirtableStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    /// Units come from the route registry
    Route,
    /// Units are ticket clusters
    Cluster,
}

impl From<Mode> for GroupingMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Route => GroupingMode::Route,
            Mode::Cluster => GroupingMode::Cluster,
        }
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "courier",
    about = "Email bulk delivery volunteers the instructions for their assigned stops",
    version
)]
struct Cli {
    /// Delivery date (YYYY-MM-DD)
    #[arg(long, env = "COURIER_DELIVERY_DATE")]
    delivery_date: NaiveDate,

    /// Only process the route (or cluster) with this name
    #[arg(long)]
    route: Option<String>,

    /// How tickets are grouped into delivery units
    #[arg(long, value_enum, default_value_t = Mode::Route)]
    mode: Mode,

    /// Print rendered emails instead of sending them
    #[arg(long)]
    dry_run: bool,
}

impl Cli {
    fn plan(&self) -> DispatchPlan {
        DispatchPlan {
            delivery_date: self.delivery_date,
            unit_name: self.route.clone(),
            mode: self.mode.into(),
            dry_run: self.dry_run,
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("courier=info,courier_engine=info,courier_store=info,courier_notifier=info")
        }))
        .with_writer(std::io::stderr)
        .json()
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env()?;

    let store = AirtableStore::new(&config)?;
    let mut dispatcher = Dispatcher::new(Arc::new(store), Renderer::from_config(&config));
    if !cli.dry_run {
        dispatcher = dispatcher.with_transport(Arc::new(SendGridTransport::from_config(&config)?));
    }

    let report = match dispatcher.run(&cli.plan()).await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!(error = %e, "Dispatch run failed");
            return Err(e.into());
        }
    };

    if report.dry_run {
        print_documents(&report)?;
    }
    Ok(summarize(&report))
}

fn print_documents(report: &DispatchReport) -> anyhow::Result<()> {
    for document in &report.documents {
        println!("{}", serde_json::to_string_pretty(document)?);
    }
    Ok(())
}

fn summarize(report: &DispatchReport) -> ExitCode {
    for failure in &report.failed_units {
        tracing::warn!(unit = %failure.unit, error = %failure.error, "No notification for unit");
    }
    for failure in &report.failed_sends {
        tracing::warn!(unit = %failure.unit, recipients = ?failure.recipients, "Notification not delivered");
    }

    tracing::info!(
        rendered = report.documents.len(),
        sent = report.sent,
        failed_units = report.failed_units.len(),
        skipped_units = report.skipped_units.len(),
        failed_sends = report.failed_sends.len(),
        dry_run = report.dry_run,
        "Done"
    );

    if report.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
