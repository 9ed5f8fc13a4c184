use clap::Args;
use comfy_table::Table;
use courier_tracking::trip_feed::{TripBoard, TripFeed, trip_stream_url};
use tracing::info;

use crate::config::Config;

#[derive(Args)]
pub struct FeedArgs {
    /// Event stream to follow, defaults to the backend's trip stream
    #[arg(long)]
    url: Option<String>,
}

pub async fn run(args: FeedArgs) -> anyhow::Result<()> {
    let url = match args.url {
        Some(url) => url,
        None => trip_stream_url(Config::from_env().require_backend_url()?),
    };

    let feed = TripFeed::new(url)?;
    let board = feed
        .follow(|board| {
            info!(
                "{} trip(s) on the road, {} on the map",
                board.len(),
                board.markers().count()
            )
        })
        .await?;

    print_board(&board);

    Ok(())
}

fn print_board(board: &TripBoard) {
    let mut table = Table::new();
    table.set_header(vec!["trip", "driver", "status", "destination", "position"]);

    for trip in board.trips() {
        table.add_row(vec![
            trip.id.to_string(),
            trip.driver_id
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default(),
            trip.status.clone().unwrap_or_default(),
            trip.destination.clone().unwrap_or_default(),
            trip.coordinate()
                .map(|coordinate| coordinate.to_string())
                .unwrap_or_default(),
        ]);
    }

    println!("{table}");
}
