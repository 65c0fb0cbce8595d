//! # Synthetic data
//!
//! Plausible stops and vehicles generated around a center. This is the last
//! resort of the aggregation chain: it has no external dependencies and always
//! returns data. Callers supply the random source.

use rand::Rng;

use crate::geocoder::DEFAULT_CENTER;
use crate::model::{Coordinate, Mode, Stop, Vehicle};

/// Number of stops produced by [`stops`].
pub const STOP_COUNT: usize = 30;

/// Vehicles produced when there are no stops to place them near.
pub const FALLBACK_VEHICLE_COUNT: usize = 10;

const MIN_VEHICLES: usize = 3;
const MAX_VEHICLES: usize = 12;
const ROUTE_COUNT: usize = 10;

// Half-widths of the jitter boxes, in degrees.
const STOP_JITTER: f64 = 0.04;
const VEHICLE_JITTER: f64 = 0.001_25;
const FALLBACK_JITTER: f64 = 0.002_5;
const FALLBACK_GRID: f64 = 0.01;

/// Generate [`STOP_COUNT`] stops scattered within ±0.04° of `center`, named
/// `"<city> Stop 1"` onwards.
pub fn stops(city: &str, center: Coordinate, rng: &mut impl Rng) -> Vec<Stop> {
    (0..STOP_COUNT)
        .map(|i| Stop {
            id: format!("mock-stop-{i}"),
            name: format!("{city} Stop {}", i + 1),
            location: center.offset(jitter(rng, STOP_JITTER), jitter(rng, STOP_JITTER)),
        })
        .collect()
}

/// Place vehicles near a deterministic stride of `stops`.
///
/// Produces `clamp(stops.len() / 3, 3, 12)` vehicles. With no stops, falls
/// back to vehicles around [`DEFAULT_CENTER`].
///
/// The stride seed is the city length in Unicode scalar values, not UTF-16
/// units, so names with astral-plane characters pick different stops.
pub fn vehicles(city: &str, mode: Mode, stops: &[Stop], rng: &mut impl Rng) -> Vec<Vehicle> {
    if stops.is_empty() {
        return vehicles_without_stops(city, mode, rng);
    }

    let seed = stride_seed(city);
    let count = (stops.len() / 3).clamp(MIN_VEHICLES, MAX_VEHICLES);

    (0..count)
        .map(|i| {
            let stop = &stops[(i * 3 + seed) % stops.len()];
            let location =
                stop.location.offset(jitter(rng, VEHICLE_JITTER), jitter(rng, VEHICLE_JITTER));
            vehicle(mode, i, location, rng)
        })
        .collect()
}

fn vehicles_without_stops(city: &str, mode: Mode, rng: &mut impl Rng) -> Vec<Vehicle> {
    let seed = city.chars().count();

    (0..FALLBACK_VEHICLE_COUNT)
        .map(|i| {
            let row = grid_step((i + seed) % 7, 3);
            let col = grid_step((i + seed) % 5, 2);
            let location = DEFAULT_CENTER.offset(
                row * FALLBACK_GRID + jitter(rng, FALLBACK_JITTER),
                col * FALLBACK_GRID + jitter(rng, FALLBACK_JITTER),
            );
            vehicle(mode, i, location, rng)
        })
        .collect()
}

fn vehicle(mode: Mode, index: usize, location: Coordinate, rng: &mut impl Rng) -> Vehicle {
    Vehicle {
        id: format!("veh-{mode}-{index}"),
        location,
        bearing: rng.gen_range(0..360),
        speed: f64::from(rng.gen_range(0_u8..=30)),
        route: format!("R{}", index % ROUTE_COUNT + 1),
        delay_seconds: rng.gen_range(-60..=60),
    }
}

// Uniform in [-half_width, half_width).
fn jitter(rng: &mut impl Rng, half_width: f64) -> f64 {
    (rng.r#gen::<f64>() - 0.5) * 2.0 * half_width
}

// City length in chars drives the stop stride; an empty name behaves like a
// 5-letter one.
fn stride_seed(city: &str) -> usize {
    match city.chars().count() {
        0 => 5,
        n => n,
    }
}

// Signed distance of `cell` from `middle` on a small grid.
fn grid_step(cell: usize, middle: usize) -> f64 {
    let cell = u32::try_from(cell).unwrap_or(0);
    let middle = u32::try_from(middle).unwrap_or(0);
    f64::from(cell) - f64::from(middle)
}
