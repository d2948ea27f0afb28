//! Synthetic labeled point sets for tests and benchmarks.
//!
//! All generators are deterministic for a given seed. Coordinates are
//! planar; wrap the points in [`Labeling::planar`](crate::Labeling::planar).
//!
//! # Example
//!
//! ```rust
//! use meetup::Labeling;
//! use meetup::synthetic::blob_cluster;
//!
//! let mut points = blob_cluster("a", 10.0, 10.0, 10, 0.02, 0, 42);
//! points.extend(blob_cluster("b", 10.0, 10.0, 200, 0.02, 1, 43));
//! let labeling = Labeling::planar(points);
//! assert_eq!(labeling.occupancy()[&1], 200);
//! ```

use std::f64::consts::PI;

use geo::Coord;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::{Label, Point};

fn user_id(prefix: &str, i: usize) -> String {
    format!("{}-{}", prefix, i)
}

/// Standard normal sample via the Box-Muller transform.
fn gaussian(rng: &mut StdRng) -> f64 {
    let u1: f64 = rng.gen_range(0.0001..1.0);
    let u2: f64 = rng.r#gen();
    (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
}

/// Isotropic Gaussian blob of `count` points around a centre.
pub fn blob_cluster(
    prefix: &str,
    center_x: f64,
    center_y: f64,
    count: usize,
    std_dev: f64,
    label: Label,
    seed: u64,
) -> Vec<Point> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|i| {
            let x = center_x + std_dev * gaussian(&mut rng);
            let y = center_y + std_dev * gaussian(&mut rng);
            Point::new(user_id(prefix, i), Coord { x, y }, label)
        })
        .collect()
}

/// `count` points evenly spaced on a circle.
pub fn circle_cluster(
    prefix: &str,
    center_x: f64,
    center_y: f64,
    radius: f64,
    count: usize,
    label: Label,
) -> Vec<Point> {
    (0..count)
        .map(|i| {
            let alpha = 2.0 * PI * i as f64 / count as f64;
            let position = Coord {
                x: center_x + radius * alpha.sin(),
                y: center_y + radius * alpha.cos(),
            };
            Point::new(user_id(prefix, i), position, label)
        })
        .collect()
}

/// The four corners of an axis-aligned square.
pub fn square_cluster(prefix: &str, center_x: f64, center_y: f64, side: f64, label: Label) -> Vec<Point> {
    let half = side / 2.0;
    [
        (center_x - half, center_y - half),
        (center_x + half, center_y - half),
        (center_x + half, center_y + half),
        (center_x - half, center_y + half),
    ]
    .into_iter()
    .enumerate()
    .map(|(i, (x, y))| Point::new(user_id(prefix, i), Coord { x, y }, label))
    .collect()
}
