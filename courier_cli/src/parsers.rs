use std::time::Duration;

use courier_geo::coordinate::Coordinate;
use jiff::SpanRelativeTo;

pub fn parse_duration(input: &str) -> Result<jiff::SignedDuration, String> {
    if let Ok(duration) = input.parse::<jiff::SignedDuration>() {
        return Ok(duration);
    }

    if let Ok(duration) = input
        .parse::<jiff::Span>()
        .and_then(|span| span.to_duration(SpanRelativeTo::days_are_24_hours()))
    {
        return Ok(duration);
    }

    if let Ok(seconds) = input.parse::<i64>() {
        return Ok(jiff::SignedDuration::from_secs(seconds.abs()));
    }

    Err(String::from("Invalid duration"))
}

/// Durations such as `2s`, `500ms` or `PT1M`, never negative.
pub fn parse_interval(input: &str) -> Result<Duration, String> {
    let duration = parse_duration(input)?;
    Duration::try_from(duration).map_err(|_| String::from("Interval must not be negative"))
}

/// `LAT,LNG` in degrees.
pub fn parse_coordinate(input: &str) -> Result<Coordinate, String> {
    let (latitude, longitude) = input
        .split_once(',')
        .ok_or_else(|| String::from("Expected LAT,LNG"))?;

    let latitude = latitude
        .trim()
        .parse::<f64>()
        .map_err(|_| format!("Invalid latitude {latitude:?}"))?;
    let longitude = longitude
        .trim()
        .parse::<f64>()
        .map_err(|_| format!("Invalid longitude {longitude:?}"))?;

    Coordinate::new(latitude, longitude).map_err(|err| err.to_string())
}
