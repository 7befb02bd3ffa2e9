use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use dashboard_core::{
    DashboardOptions, ErrorArea, HttpDispatchBackend, Orchestrator, RasterPresenter,
    SimulationPoller,
};
use shared::domain::GridBounds;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod console;

use config::{load_settings, Settings};
use console::{parse_command, Command, HELP};

const SNAPSHOT_CELL_PX: u32 = 24;

#[derive(Parser, Debug)]
#[command(about = "Headless dispatch dashboard driven from the terminal")]
struct Args {
    #[arg(long, default_value = "dashboard.toml")]
    config: PathBuf,
    #[arg(long)]
    server_url: Option<String>,
    #[arg(long)]
    grid_width: Option<u32>,
    #[arg(long)]
    grid_height: Option<u32>,
    #[arg(long)]
    poll_interval_ms: Option<u64>,
    #[arg(long)]
    snapshot_dir: Option<PathBuf>,
    /// Do not advance the simulation automatically.
    #[arg(long)]
    no_poll: bool,
}

impl Args {
    fn apply(&self, settings: &mut Settings) {
        if let Some(v) = &self.server_url {
            settings.server_url = v.clone();
        }
        if let Some(v) = self.grid_width {
            settings.grid_width = v;
        }
        if let Some(v) = self.grid_height {
            settings.grid_height = v;
        }
        if let Some(v) = self.poll_interval_ms {
            settings.poll_interval_ms = v;
        }
        if let Some(v) = &self.snapshot_dir {
            settings.snapshot_dir = Some(v.clone());
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut settings = load_settings(&args.config);
    args.apply(&mut settings);

    let filter =
        EnvFilter::try_new(&settings.log_filter).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
    settings.validate()?;

    let bounds = GridBounds::new(settings.grid_width, settings.grid_height);
    let backend = Arc::new(
        HttpDispatchBackend::new(&settings.server_url)
            .with_context(|| format!("invalid server url '{}'", settings.server_url))?,
    );
    let presenter = Arc::new(RasterPresenter::new(bounds, SNAPSHOT_CELL_PX));
    let orchestrator = Orchestrator::new(
        backend,
        presenter.clone(),
        DashboardOptions {
            bounds,
            default_heuristic: settings.default_heuristic.clone(),
            default_strategy: settings.default_strategy.clone(),
        },
    );

    info!(
        server_url = %settings.server_url,
        width = bounds.width,
        height = bounds.height,
        "dashboard starting"
    );
    orchestrator.initialize().await;

    let poller = SimulationPoller::new(Duration::from_millis(settings.poll_interval_ms));
    if !args.no_poll {
        poller.start(orchestrator.clone());
    }

    println!("{HELP}");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line.context("failed to read stdin")?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            break;
        };

        match parse_command(&line) {
            Ok(None) => {}
            Ok(Some(Command::Event(event))) => orchestrator.handle(event).await,
            Ok(Some(Command::Snapshot)) => save_snapshots(&presenter, &settings),
            Ok(Some(Command::Status)) => print_status(&orchestrator, &presenter),
            Ok(Some(Command::Help)) => println!("{HELP}"),
            Ok(Some(Command::Quit)) => break,
            Err(err) => println!("{err:#}"),
        }
    }

    poller.stop();
    info!("dashboard stopped");
    Ok(())
}

fn save_snapshots(presenter: &RasterPresenter, settings: &Settings) {
    let Some(dir) = &settings.snapshot_dir else {
        println!("snapshot_dir is not configured");
        return;
    };
    match presenter.save_snapshots(dir) {
        Ok(paths) => {
            for path in paths {
                println!("wrote {}", path.display());
            }
        }
        Err(err) => warn!("failed to save snapshots: {err}"),
    }
}

fn print_status(orchestrator: &Orchestrator, presenter: &RasterPresenter) {
    let planner = orchestrator.planner();
    let restaurant = planner
        .restaurant()
        .map(|restaurant| restaurant.id.to_string())
        .unwrap_or_else(|| "-".to_string());
    println!(
        "planner: {:?} restaurant={restaurant} stops={}",
        planner.state(),
        planner.stops().len()
    );
    if let Some(metrics) = presenter.metrics() {
        println!(
            "route: distance={} visited={} time={}ms path={}",
            metrics.total_distance, metrics.visited_nodes, metrics.time_ms, metrics.path_text
        );
    }

    let live = orchestrator
        .live_restaurant()
        .map(|restaurant| restaurant.id.to_string())
        .unwrap_or_else(|| "-".to_string());
    let (active, delivered) = presenter.order_panels();
    println!(
        "live: restaurant={live} active={} delivered={}",
        active.len(),
        delivered.len()
    );
    for order in &active {
        let courier = order
            .assigned_courier_id
            .as_ref()
            .map(|id| id.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {} {:?} at ({}, {}) courier={courier}",
            order.id, order.status, order.x, order.y
        );
    }

    for area in [ErrorArea::Planner, ErrorArea::Live, ErrorArea::LiveStatus] {
        if let Some(text) = presenter.error_text(area) {
            println!("{area}: {text}");
        }
    }
}
