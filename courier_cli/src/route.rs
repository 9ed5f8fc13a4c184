use clap::Args;
use comfy_table::Table;
use courier_geo::{coordinate::Coordinate, distance::haversine_distance_km};
use courier_providers::provider::{GeocodeProvider, RouteProvider};
use courier_tracking::backend::BackendClient;
use tracing::info;

use crate::{
    config::{Config, provider_client},
    parsers,
};

#[derive(Args)]
pub struct RouteArgs {
    /// Origin as LAT,LNG
    #[arg(long, value_parser = parsers::parse_coordinate)]
    from: Coordinate,

    /// Destination address
    #[arg(long, conflicts_with = "dispatch", required_unless_present = "dispatch")]
    to: Option<String>,

    /// Route to the location of this dispatch
    #[arg(long)]
    dispatch: Option<String>,

    #[arg(long, default_value = "nominatim")]
    geocoder: GeocodeProvider,

    /// google, osrm, crow or crow:<speed_kmh>
    #[arg(long, default_value = "crow")]
    router: RouteProvider,

    #[arg(long)]
    backend_url: Option<String>,
}

async fn destination_address(args: &RouteArgs) -> anyhow::Result<String> {
    if let Some(address) = &args.to {
        return Ok(address.clone());
    }

    let mut config = Config::from_env();
    if args.backend_url.is_some() {
        config.backend_url = args.backend_url.clone();
    }

    let dispatch_id = args
        .dispatch
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("--to or --dispatch is required"))?;
    let backend = BackendClient::new(config.require_backend_url()?)?;
    let dispatch = backend.dispatch(dispatch_id).await?;

    dispatch
        .location
        .filter(|location| !location.trim().is_empty())
        .ok_or_else(|| anyhow::anyhow!("dispatch {dispatch_id} has no location"))
}

pub async fn run(args: RouteArgs) -> anyhow::Result<()> {
    let providers = provider_client(args.geocoder, args.router)?;
    let address = destination_address(&args).await?;

    info!("Geocoding {:?} with {:?}", address, providers.geocode_provider());
    let destination = providers.geocode_address(&address).await?;

    info!("Routing with {:?}", providers.route_provider());
    let route = providers.route(args.from, destination).await?;

    let mut table = Table::new();
    table.set_header(vec!["", "value"]);
    table.add_row(vec![
        "destination".to_string(),
        format!("{address} ({})", destination.rounded(5)),
    ]);
    table.add_row(vec![
        "straight line".to_string(),
        format!("{:.2} km", haversine_distance_km(&args.from, &destination)),
    ]);
    table.add_row(vec![
        "distance".to_string(),
        format!("{:.0} m", route.distance_meters),
    ]);
    table.add_row(vec![
        "duration".to_string(),
        format!("{:.1} min", route.duration_seconds / 60.0),
    ]);
    table.add_row(vec![
        "points".to_string(),
        route.polyline.len().to_string(),
    ]);

    println!("{table}");

    Ok(())
}
