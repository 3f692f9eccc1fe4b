mod backend;
mod live;
mod map;
mod panel;
mod web;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

use crate::backend::HttpBackend;
use crate::live::LiveView;
use crate::map::Scene;
use crate::web::Config;

#[derive(Parser)]
#[command(name = "fleet-map")]
#[command(about = "Live vehicle tracking map")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the live view web service
    Serve {
        #[arg(short, long, default_value = "fleet-map.yaml")]
        config: String,
    },
    /// Refresh once against the backend and print the track table
    Snapshot {
        #[arg(short, long, default_value = "fleet-map.yaml")]
        config: String,
        /// Comma-separated vehicle ids
        #[arg(long, value_delimiter = ',')]
        vehicles: Vec<String>,
        /// Points per vehicle
        #[arg(long)]
        limit: Option<String>,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { config } => serve(&config).await,
        Commands::Snapshot {
            config,
            vehicles,
            limit,
        } => snapshot(&config, vehicles, limit).await,
    }
}

fn load_config(path: &str) -> Option<Config> {
    match Config::from_file(path) {
        Ok(config) => Some(config),
        Err(e) => {
            eprintln!("Error loading config {}: {}", path, e);
            None
        }
    }
}

async fn serve(path: &str) -> ExitCode {
    let Some(config) = load_config(path) else {
        return ExitCode::FAILURE;
    };

    match web::run_server(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Server error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn snapshot(path: &str, vehicles: Vec<String>, limit: Option<String>) -> ExitCode {
    let Some(config) = load_config(path) else {
        return ExitCode::FAILURE;
    };

    let backend = match HttpBackend::new(&config.backend.base_url, config.backend.timeout) {
        Ok(b) => b,
        Err(e) => {
            eprintln!("Error creating backend client: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let initial = config.live.initial_view;
    let view = LiveView::new(
        backend,
        Scene::new(initial.center(), initial.zoom),
        config.live.settings(),
    );

    view.load_vehicles().await;
    view.select(vehicles);
    if let Some(limit) = limit {
        view.set_track_limit(limit);
    }
    let report = view.refresh_all(true).await;

    let snapshot = view.snapshot();
    println!("{}", snapshot.status);
    println!("{}", snapshot.track_info);
    for row in &snapshot.rows {
        println!(
            "  {}  #{}  {}  {}  {}",
            row.vehicle_id,
            row.index,
            row.display_time(),
            row.latitude_fixed(),
            row.longitude_fixed()
        );
    }

    let scene = view.with_map(|map| map.snapshot());
    println!(
        "{} layers, center {:.5},{:.5} zoom {}",
        scene.layers.len(),
        scene.view.center.lat,
        scene.view.center.lon,
        scene.view.zoom
    );

    if report.latest == live::RefreshOutcome::Failed {
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
