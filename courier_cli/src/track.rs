use std::{path::PathBuf, sync::Arc, time::Duration};

use clap::Args;
use comfy_table::Table;
use courier_providers::provider::{GeocodeProvider, RouteProvider};
use courier_tracking::{
    navigator::{Navigator, RefetchPolicy},
    session::TrackingSession,
    sink::PositionSink,
    source::ReplaySource,
    tracking::AcquisitionMode,
};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{info, warn};

use crate::{
    config::{Config, provider_client},
    file_utils::read_positions,
    parsers,
};

#[derive(Args)]
pub struct TrackArgs {
    /// Recorded drive to replay, a JSON array of positions
    #[arg(short, long)]
    positions: PathBuf,

    /// Time between two acquisitions (e.g. "2s", "500ms")
    #[arg(short, long, value_parser = parsers::parse_interval, default_value = "2s")]
    interval: Duration,

    /// Follow the source instead of polling, with `interval` as the minimum
    /// time between two delivered positions
    #[arg(long)]
    watch: bool,

    /// Minimum movement between two delivered positions in watch mode
    #[arg(long, default_value_t = 10.0)]
    min_distance: f64,

    /// Address to route to
    #[arg(long)]
    destination: Option<String>,

    /// Refetch the route once the driver is this many meters off its start
    #[arg(long)]
    drift: Option<f64>,

    #[arg(long, default_value = "nominatim")]
    geocoder: GeocodeProvider,

    /// google, osrm, crow or crow:<speed_kmh>
    #[arg(long, default_value = "crow")]
    router: RouteProvider,

    #[arg(long)]
    backend_url: Option<String>,

    #[arg(long)]
    trip_id: Option<String>,

    #[arg(long)]
    driver_id: Option<String>,

    #[arg(long)]
    ws_url: Option<String>,
}

impl TrackArgs {
    fn config(&self, mut config: Config) -> Config {
        if self.backend_url.is_some() {
            config.backend_url = self.backend_url.clone();
        }
        if self.trip_id.is_some() {
            config.trip_id = self.trip_id.clone();
        }
        if self.driver_id.is_some() {
            config.driver_id = self.driver_id.clone();
        }
        if self.ws_url.is_some() {
            config.ws_url = self.ws_url.clone();
        }
        config
    }

    fn mode(&self) -> AcquisitionMode {
        if self.watch {
            AcquisitionMode::Watch {
                min_interval: self.interval,
                min_distance_meters: self.min_distance,
            }
        } else {
            AcquisitionMode::Poll {
                interval: self.interval,
            }
        }
    }

    fn policy(&self) -> RefetchPolicy {
        match self.drift {
            Some(threshold_meters) => RefetchPolicy::OnDrift { threshold_meters },
            None => RefetchPolicy::OnDestinationChange,
        }
    }
}

fn sinks(config: &Config) -> anyhow::Result<Vec<PositionSink>> {
    let mut sinks = Vec::new();

    if let (Some(backend_url), Some(trip_id)) = (&config.backend_url, &config.trip_id) {
        sinks.push(PositionSink::trip_location(backend_url, trip_id)?);
    }
    if let (Some(backend_url), Some(driver_id)) = (&config.backend_url, &config.driver_id) {
        sinks.push(PositionSink::driver_location(backend_url, driver_id)?);
    }
    if let (Some(ws_url), Some(driver_id)) = (&config.ws_url, &config.driver_id) {
        sinks.push(PositionSink::websocket(ws_url.clone(), driver_id.clone()));
    }

    Ok(sinks)
}

pub async fn run(args: TrackArgs) -> anyhow::Result<()> {
    let config = args.config(Config::from_env());
    let positions = read_positions(&args.positions)?;
    info!(
        "Replaying {} positions from {:?}",
        positions.len(),
        args.positions
    );

    let providers = Arc::new(provider_client(args.geocoder, args.router)?);
    let navigator = Navigator::new(providers.clone(), providers, args.policy());

    let bar = ProgressBar::new(positions.len() as u64);
    bar.set_style(ProgressStyle::default_bar().template("[{bar:40}] {pos}/{len} {msg}")?);

    let mut session = TrackingSession::new(Arc::new(ReplaySource::new(positions)), args.mode())
        .with_navigator(navigator);
    for sink in sinks(&config)? {
        info!("Sending positions to {}", sink.describe());
        session = session.with_sink(sink);
    }

    if let Some(destination) = &args.destination
        && let Err(err) = session.set_destination(destination).await
    {
        warn!("Destination {:?} unavailable: {}", destination, err);
    }

    let mut updates = session.subscribe();
    let progress_bar = bar.clone();
    let progress = tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let state = *updates.borrow_and_update();
            if let Some(state) = state {
                progress_bar.inc(1);
                progress_bar.set_message(format!(
                    "{} heading {:.0}°",
                    state.position.coordinate, state.heading_degrees
                ));
            }
        }
    });

    session.start().await?;
    session.finished().await;
    progress.abort();
    bar.finish_and_clear();

    print_summary(&session).await;

    Ok(())
}

async fn print_summary(session: &TrackingSession) {
    let mut table = Table::new();
    table.set_header(vec!["", "value"]);

    let Some(state) = session.latest() else {
        info!("No position was acquired");
        return;
    };

    table.add_row(vec![
        "position".to_string(),
        state.position.coordinate.to_string(),
    ]);
    table.add_row(vec![
        "heading".to_string(),
        format!("{:.0}°", state.heading_degrees),
    ]);
    table.add_row(vec![
        "captured at".to_string(),
        state.position.captured_at.to_string(),
    ]);

    if let Some(navigator) = session.navigator() {
        let navigator = navigator.lock().await;
        let origin = state.position.coordinate;

        if let Some(destination) = navigator.destination() {
            table.add_row(vec!["destination".to_string(), destination.to_string()]);
        }
        if let Some(km) = navigator.straight_line_km(&origin) {
            table.add_row(vec!["straight line".to_string(), format!("{km:.2} km")]);
        }
        if let Some(meters) = navigator.distance_meters() {
            table.add_row(vec!["route distance".to_string(), format!("{meters:.0} m")]);
        }
        if let Some(seconds) = navigator.eta_seconds() {
            table.add_row(vec!["eta".to_string(), format!("{:.1} min", seconds / 60.0)]);
        }
        if let Some(meters) = navigator.remaining_distance_meters(&origin) {
            table.add_row(vec!["remaining".to_string(), format!("{meters:.0} m")]);
        }
        if let Some(notice) = navigator.notice() {
            table.add_row(vec!["notice".to_string(), format!("{notice:?}")]);
        }
    }

    println!("{table}");
}
