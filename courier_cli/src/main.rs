use clap::{Parser, Subcommand};

use mimalloc::MiMalloc;

use crate::{
    feed::FeedArgs, polyline::PolylineSubcommands, route::RouteArgs, track::TrackArgs,
    trips::TripsArgs,
};

mod config;
mod feed;
mod file_utils;
mod parsers;
mod polyline;
mod route;
mod track;
mod trips;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

#[derive(Parser)]
#[clap(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Replays a recorded drive through a tracking session
    Track {
        #[command(flatten)]
        args: TrackArgs,
    },
    /// Geocodes a destination and routes to it once
    Route {
        #[command(flatten)]
        args: RouteArgs,
    },
    /// Follows the live trip feed
    Feed {
        #[command(flatten)]
        args: FeedArgs,
    },
    /// Lists a driver's trips from the backend
    Trips {
        #[command(flatten)]
        args: TripsArgs,
    },
    #[command(visible_alias = "p")]
    Polyline {
        #[command(subcommand)]
        commands: PolylineSubcommands,
    },
}

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    dotenvy::from_filename("./.env.local").ok();

    let cli = Cli::parse();
    tracing_subscriber::fmt()
        .with_max_level(if cli.debug {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .init();

    match cli.command {
        Some(Commands::Track { args }) => track::run(args).await?,
        Some(Commands::Route { args }) => route::run(args).await?,
        Some(Commands::Feed { args }) => feed::run(args).await?,
        Some(Commands::Trips { args }) => trips::run(args).await?,
        Some(Commands::Polyline { commands }) => polyline::run(commands)?,
        None => {
            // Handle no command provided
        }
    }

    Ok(())
}
