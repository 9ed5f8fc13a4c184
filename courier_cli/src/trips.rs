use clap::Args;
use comfy_table::Table;
use courier_tracking::{backend::BackendClient, trip_feed::Trip};
use tracing::info;

use crate::config::{Config, DRIVER_ID_ENV_VAR};

#[derive(Args)]
pub struct TripsArgs {
    /// Defaults to COURIER_DRIVER_ID
    #[arg(long)]
    driver_id: Option<String>,

    #[arg(long)]
    backend_url: Option<String>,
}

pub async fn run(args: TripsArgs) -> anyhow::Result<()> {
    let mut config = Config::from_env();
    if args.backend_url.is_some() {
        config.backend_url = args.backend_url;
    }
    if args.driver_id.is_some() {
        config.driver_id = args.driver_id;
    }

    let driver_id = config
        .driver_id
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("{DRIVER_ID_ENV_VAR} or --driver-id is required"))?;
    let backend = BackendClient::new(config.require_backend_url()?)?;

    let trips = backend.driver_trips(driver_id).await?;
    info!("Driver {} has {} trip(s)", driver_id, trips.len());

    print_trips(&trips);

    Ok(())
}

fn print_trips(trips: &[Trip]) {
    let mut table = Table::new();
    table.set_header(vec!["trip", "status", "destination", "last position"]);

    for trip in trips {
        table.add_row(vec![
            trip.id.to_string(),
            trip.status.clone().unwrap_or_default(),
            trip.destination.clone().unwrap_or_default(),
            trip.coordinate()
                .map(|coordinate| coordinate.rounded(5).to_string())
                .unwrap_or_default(),
        ]);
    }

    println!("{table}");
}
