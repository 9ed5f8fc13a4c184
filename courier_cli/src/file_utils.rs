use std::{fs::File, io::BufReader, path::Path};

use courier_geo::tracked_position::TrackedPosition;

/// Reads a recorded drive: a JSON array of positions in capture order.
pub fn read_positions(path: &Path) -> Result<Vec<TrackedPosition>, anyhow::Error> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut positions: Vec<TrackedPosition> = serde_json::from_reader(reader)?;

    positions.sort_by_key(|position| position.captured_at);

    Ok(positions)
}

#[cfg(test)]
mod tests {
    use std::env;

    use super::*;

    #[test]
    fn test_read_positions() {
        let current_dir = env::current_dir().unwrap();
        let positions =
            read_positions(&current_dir.join("tests/fixtures/positions.json")).unwrap();

        assert_eq!(positions.len(), 4);
        assert_eq!(positions[0].accuracy_meters, Some(6.0));
        assert_eq!(positions[3].heading_degrees, Some(145.0));
        assert!(
            positions
                .windows(2)
                .all(|pair| pair[0].captured_at < pair[1].captured_at)
        );
    }

    #[test]
    fn test_missing_file() {
        assert!(read_positions(Path::new("tests/fixtures/nope.json")).is_err());
    }
}
