use std::{fs::OpenOptions, path::{Path, PathBuf}, sync::Mutex, time::Duration};

use anyhow::Context;
use clap::{Parser, Subcommand};
use ride_recorder::gpx_source::ReplaySource;
use ride_tracker_lib::{
    clock::SystemClock,
    configuration::Configuration,
    insights::{GeminiInsights, InsightProvider},
    map_path::{self, RenderMode},
    recorder::RecorderEvent,
    route_list::RouteList,
    service::{RecorderService, ServiceEvent},
    trip::{Trip, TripStatus},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "ride_recorder")]
#[command(about = "Record club rides and browse the club's routes", long_about = None)]
struct Cli {
    /// Configuration file with `key = value` lines
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a GPX track as a live position feed and record it as a trip
    Record {
        gpx_file: PathBuf,
        /// Replay speed multiplier
        #[arg(long, default_value_t = 1.0)]
        speed: f64,
        /// Print the recorded trip as JSON
        #[arg(long)]
        json: bool,
        /// Print the map path of the recorded trip as GeoJSON
        #[arg(long)]
        geojson: bool,
    },
    /// List the club's routes
    Routes {
        /// Only routes with this status (planejada, concluída, ativa)
        #[arg(long)]
        status: Option<String>,
        /// Only routes not yet completed
        #[arg(long)]
        open: bool,
    },
    /// Put a route back on the plan and show the open routes
    Plan { route_id: String },
    /// Safety tips and a scenic highlight for a route
    Insights {
        /// Route title or id
        route: String,
        #[arg(long)]
        location: Option<String>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Configuration::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => Configuration::default(),
    };

    init_logging(config.log_file.as_deref())?;

    match cli.command {
        Commands::Record { gpx_file, speed, json, geojson } => record(&config, &gpx_file, speed, json, geojson).await,
        Commands::Routes { status, open } => list_routes(status.as_deref(), open),
        Commands::Plan { route_id } => plan_route(&route_id),
        Commands::Insights { route, location } => insights(&config, &route, location.as_deref()).await,
    }
}

fn init_logging(log_file: Option<&Path>) -> anyhow::Result<()> {
    let file_layer = match log_file {
        Some(path) => {
            if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
                std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
            }
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("opening log file {}", path.display()))?;
            Some(tracing_subscriber::fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| format!("{}=info,ride_tracker_lib=info", env!("CARGO_CRATE_NAME")).into())
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();

    Ok(())
}

async fn record(config: &Configuration, gpx_file: &Path, speed: f64, json: bool, geojson: bool) -> anyhow::Result<()> {
    let source = ReplaySource::from_file(gpx_file, speed)?;
    let replay_time = source.replay_duration();

    let (service, handle, mut events) = RecorderService::new(
        source,
        SystemClock,
        config.policy(),
        RouteList::with_iconic_routes(),
        config.tick_interval,
    );
    let service = tokio::spawn(service.run());

    let printer = tokio::spawn(async move {
        let mut recorded = None;
        while let Some(event) = events.recv().await {
            match event {
                ServiceEvent::Notice(notice) => {
                    eprintln!("{}", notice.notice());
                    if let RecorderEvent::Stopped(Some(receipt)) = notice {
                        eprintln!("{}: {} pontos, {}, {}", receipt.title, receipt.sample_count, receipt.distance, receipt.duration);
                        recorded = Some(receipt.trip_id);
                    }
                }
                ServiceEvent::Progress(progress) => {
                    eprintln!("Tempo {} | Km {} | Checkpoints {}", progress.elapsed, progress.distance, progress.samples);
                }
            }
        }
        recorded
    });

    handle.start()?;
    tracing::info!("Replaying {} at {}x, about {:?}", gpx_file.display(), speed, replay_time);

    tokio::select! {
        _ = tokio::time::sleep(replay_time.saturating_add(Duration::from_secs(1))) => {}
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupted, stopping the recording");
        }
    }

    handle.stop()?;
    handle.shutdown()?;

    let routes = service.await.context("recorder service panicked")?;
    let recorded = printer.await.context("event printer panicked")?;

    let Some(trip) = recorded.as_deref().and_then(|id| routes.get(id)) else {
        tracing::warn!("Nothing was recorded");
        return Ok(());
    };

    if json {
        println!("{}", serde_json::to_string_pretty(trip)?);
    }
    if geojson {
        if let Some(collection) = map_path::render(&trip.points, RenderMode::DisplayOnly) {
            println!("{}", collection);
        }
    }
    if !json && !geojson {
        print_routes(routes.iter());
        println!("Geodesic length: {:.2} km", trip.geodesic_km());
    }

    Ok(())
}

fn list_routes(status: Option<&str>, open: bool) -> anyhow::Result<()> {
    let routes = RouteList::with_iconic_routes();

    match status {
        Some(label) => {
            let status = TripStatus::parse(label).with_context(|| format!("unknown status {label}"))?;
            print_routes(routes.by_status(status));
        }
        None if open => print_routes(routes.open_routes()),
        None => print_routes(routes.iter()),
    }

    Ok(())
}

fn plan_route(route_id: &str) -> anyhow::Result<()> {
    let mut routes = RouteList::with_iconic_routes();
    let route = routes.plan(route_id)?;
    println!("{} is planned", route.title);
    print_routes(routes.open_routes());
    Ok(())
}

async fn insights(config: &Configuration, route: &str, location: Option<&str>) -> anyhow::Result<()> {
    let routes = RouteList::with_iconic_routes();
    let name = routes.get(route)
        .or_else(|| routes.find_by_title(route))
        .map(|trip| trip.title.clone())
        .unwrap_or_else(|| route.to_string());
    let location = location.unwrap_or(&config.insights_location);

    let provider = GeminiInsights::from_env(config.insights_model.clone());
    let insights = provider.route_insights(&name, location).await;

    println!("{name}");
    for tip in &insights.safety_tips {
        println!("  - {tip}");
    }
    println!("  \"{}\"", insights.scenic_highlight);
    Ok(())
}

fn print_routes<'a>(routes: impl Iterator<Item = &'a Trip>) {
    for route in routes {
        println!(
            "{:<36}  {:<10} {:<9} {:>9}  {}{}",
            route.id,
            route.status.label(),
            route.difficulty.label(),
            route.distance,
            route.title,
            if route.is_official { " (oficial)" } else { "" }
        );
    }
}
