//! Encoded polyline codec, the format used by Google directions
//! (`overview_polyline.points`) and OSRM (`geometries=polyline`).
//!
//! Every value is a delta against the previous point, zig-zag encoded and
//! written as 5-bit groups offset by 63, with `0x20` marking a continuation.

use thiserror::Error;

use crate::coordinate::Coordinate;

const PRECISION: f64 = 1e5;
const CHUNK_MASK: u32 = 0x1f;
const CONTINUATION_BIT: u32 = 0x20;
const ASCII_OFFSET: u8 = 63;

#[derive(Debug, Error, PartialEq)]
pub enum PolylineError {
    #[error("invalid character {character:?} at position {position}")]
    InvalidCharacter { position: usize, character: char },

    #[error("polyline ends in the middle of a value")]
    Truncated,

    #[error("value at position {0} does not fit in 32 bits")]
    Overflow(usize),

    #[error("decoded point {0} is not a valid coordinate")]
    InvalidCoordinate(usize),
}

pub fn decode_polyline(encoded: &str) -> Result<Vec<Coordinate>, PolylineError> {
    let bytes = encoded.as_bytes();
    let mut index = 0;
    let mut latitude: i64 = 0;
    let mut longitude: i64 = 0;
    let mut coordinates = Vec::with_capacity(bytes.len() / 4);

    while index < bytes.len() {
        latitude += i64::from(decode_value(bytes, &mut index)?);
        longitude += i64::from(decode_value(bytes, &mut index)?);

        let coordinate = Coordinate::new(latitude as f64 / PRECISION, longitude as f64 / PRECISION)
            .map_err(|_| PolylineError::InvalidCoordinate(coordinates.len()))?;
        coordinates.push(coordinate);
    }

    Ok(coordinates)
}

fn decode_value(bytes: &[u8], index: &mut usize) -> Result<i32, PolylineError> {
    let start = *index;
    let mut result: u32 = 0;
    let mut shift: u32 = 0;

    loop {
        let Some(&byte) = bytes.get(*index) else {
            return Err(PolylineError::Truncated);
        };

        if !(ASCII_OFFSET..=126).contains(&byte) {
            return Err(PolylineError::InvalidCharacter {
                position: *index,
                character: byte as char,
            });
        }

        if shift >= 32 {
            return Err(PolylineError::Overflow(start));
        }

        *index += 1;
        let chunk = u32::from(byte - ASCII_OFFSET);
        result |= (chunk & CHUNK_MASK) << shift;
        shift += 5;

        if chunk & CONTINUATION_BIT == 0 {
            break;
        }
    }

    let value = if result & 1 == 1 {
        !(result >> 1)
    } else {
        result >> 1
    };

    Ok(value as i32)
}

pub fn encode_polyline(coordinates: &[Coordinate]) -> String {
    let mut encoded = String::with_capacity(coordinates.len() * 8);
    let mut previous_latitude: i64 = 0;
    let mut previous_longitude: i64 = 0;

    for coordinate in coordinates {
        let latitude = (coordinate.latitude() * PRECISION).round() as i64;
        let longitude = (coordinate.longitude() * PRECISION).round() as i64;

        encode_value(latitude - previous_latitude, &mut encoded);
        encode_value(longitude - previous_longitude, &mut encoded);

        previous_latitude = latitude;
        previous_longitude = longitude;
    }

    encoded
}

fn encode_value(value: i64, encoded: &mut String) {
    let mut value = if value < 0 { !(value << 1) } else { value << 1 };

    while value >= i64::from(CONTINUATION_BIT) {
        let chunk = (CONTINUATION_BIT as i64 | (value & CHUNK_MASK as i64)) as u8;
        encoded.push(char::from(chunk + ASCII_OFFSET));
        value >>= 5;
    }

    encoded.push(char::from(value as u8 + ASCII_OFFSET));
}
