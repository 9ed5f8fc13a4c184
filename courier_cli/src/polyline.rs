use clap::Subcommand;
use courier_geo::{
    coordinate::Coordinate,
    geometry::polyline_length_meters,
    polyline::{decode_polyline, encode_polyline},
};

use crate::parsers;

#[derive(Subcommand)]
pub enum PolylineSubcommands {
    /// Prints the coordinates of an encoded polyline
    Decode { encoded: String },

    /// Encodes coordinates given as LAT,LNG
    Encode {
        #[arg(value_parser = parsers::parse_coordinate, required = true)]
        coordinates: Vec<Coordinate>,
    },
}

pub fn run(command: PolylineSubcommands) -> anyhow::Result<()> {
    match command {
        PolylineSubcommands::Decode { encoded } => {
            let coordinates = decode_polyline(&encoded)?;
            for coordinate in &coordinates {
                println!("{coordinate}");
            }
            println!(
                "{} points, {:.0} m",
                coordinates.len(),
                polyline_length_meters(&coordinates)
            );
        }
        PolylineSubcommands::Encode { coordinates } => {
            println!("{}", encode_polyline(&coordinates));
        }
    }

    Ok(())
}
