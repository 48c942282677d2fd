//! Module for loading, generating and representing TSP city sets.
//!
//! City files hold one city per line as two integers separated by two spaces
//! (`x  y`). The distance matrix is built once from the cities and shared
//! read-only by the evolutionary engine.

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use thiserror::Error;

/// Smallest city set the solver accepts.
pub const MIN_CITIES: usize = 3;

/// Upper bound (exclusive) for randomly generated coordinates.
const RANDOM_COORD_LIMIT: i32 = 1000;

#[derive(Debug, Error)]
pub enum InstanceError {
    #[error("cannot access city file: {0}")]
    Io(#[from] std::io::Error),
    #[error("city list has {found} cities, at least {min} are required", min = MIN_CITIES)]
    TooFewCities { found: usize },
    #[error("distance matrix row {row} has {len} entries, expected {expected}")]
    NonSquareMatrix {
        row: usize,
        len: usize,
        expected: usize,
    },
}

/// A city with integer coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct City {
    pub x: i32,
    pub y: i32,
}

impl City {
    pub fn new(x: i32, y: i32) -> Self {
        City { x, y }
    }

    /// Euclidean distance to another city
    pub fn distance_to(&self, other: &City) -> f64 {
        let dx = self.x as f64 - other.x as f64;
        let dy = self.y as f64 - other.y as f64;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Symmetric matrix of pairwise city distances with a zero diagonal.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    rows: Vec<Vec<f64>>,
}

impl DistanceMatrix {
    /// Compute the Euclidean distance matrix of a city list
    pub fn from_cities(cities: &[City]) -> Self {
        let n = cities.len();
        let mut rows = vec![vec![0.0; n]; n];

        for i in 0..n {
            for j in 0..n {
                if i != j {
                    rows[i][j] = cities[i].distance_to(&cities[j]);
                }
            }
        }

        DistanceMatrix { rows }
    }

    /// Wrap a precomputed matrix. Only the shape is checked.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self, InstanceError> {
        let expected = rows.len();
        if let Some((row, r)) = rows.iter().enumerate().find(|(_, r)| r.len() != expected) {
            return Err(InstanceError::NonSquareMatrix {
                row,
                len: r.len(),
                expected,
            });
        }
        Ok(DistanceMatrix { rows })
    }

    /// Number of cities covered by the matrix
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    #[inline]
    pub fn distance(&self, i: usize, j: usize) -> f64 {
        self.rows[i][j]
    }

    /// Length of the closed tour, returning from the last city to the tour's first city
    pub fn tour_length(&self, tour: &[usize]) -> f64 {
        if tour.len() < 2 {
            return 0.0;
        }

        let mut length = 0.0;
        for pair in tour.windows(2) {
            length += self.distance(pair[0], pair[1]);
        }

        length += self.distance(tour[tour.len() - 1], tour[0]);

        length
    }
}

/// A named set of cities together with their distance matrix
#[derive(Debug, Clone)]
pub struct TspInstance {
    /// Name of the instance (file stem or generator description)
    pub name: String,
    pub cities: Vec<City>,
    pub distance_matrix: DistanceMatrix,
}

impl TspInstance {
    /// Build an instance from a city list. The list must hold at least three cities.
    pub fn new(name: impl Into<String>, cities: Vec<City>) -> Result<Self, InstanceError> {
        if cities.len() < MIN_CITIES {
            return Err(InstanceError::TooFewCities {
                found: cities.len(),
            });
        }
        let distance_matrix = DistanceMatrix::from_cities(&cities);
        Ok(TspInstance {
            name: name.into(),
            cities,
            distance_matrix,
        })
    }

    /// Parse a city file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, InstanceError> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let cities = parse_cities(BufReader::new(file))?;

        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "cities".to_string());

        log::info!("Loaded {} cities from {:?}", cities.len(), path);
        Self::new(name, cities)
    }

    /// Generate `count` cities uniformly in [0, 1000) x [0, 1000)
    pub fn random(count: usize, seed: u64) -> Result<Self, InstanceError> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let cities = (0..count)
            .map(|_| {
                City::new(
                    rng.gen_range(0..RANDOM_COORD_LIMIT),
                    rng.gen_range(0..RANDOM_COORD_LIMIT),
                )
            })
            .collect();
        Self::new(format!("random-{}-seed{}", count, seed), cities)
    }

    /// Write the city list in the same `x  y` format it is read in
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), InstanceError> {
        let file = File::create(path.as_ref())?;
        write_cities(BufWriter::new(file), &self.cities)?;
        log::info!("Saved {} cities to {:?}", self.cities.len(), path.as_ref());
        Ok(())
    }

    /// Number of cities
    pub fn dimension(&self) -> usize {
        self.cities.len()
    }

    /// Get statistics about the instance
    pub fn statistics(&self) -> InstanceStatistics {
        let n = self.dimension();
        let mut distances: Vec<f64> = Vec::with_capacity(n * (n - 1) / 2);
        for i in 0..n {
            for j in i + 1..n {
                distances.push(self.distance_matrix.distance(i, j));
            }
        }

        let avg_distance = distances.iter().sum::<f64>() / distances.len().max(1) as f64;
        let min_distance = distances.iter().cloned().fold(f64::INFINITY, f64::min);
        let max_distance = distances.iter().cloned().fold(0.0, f64::max);

        InstanceStatistics {
            name: self.name.clone(),
            dimension: n,
            min_x: self.cities.iter().map(|c| c.x).min().unwrap_or(0),
            max_x: self.cities.iter().map(|c| c.x).max().unwrap_or(0),
            min_y: self.cities.iter().map(|c| c.y).min().unwrap_or(0),
            max_y: self.cities.iter().map(|c| c.y).max().unwrap_or(0),
            avg_distance,
            min_distance,
            max_distance,
        }
    }
}

/// Read cities from `x  y` lines, skipping lines that do not hold two integers.
pub fn parse_cities<R: BufRead>(reader: R) -> Result<Vec<City>, InstanceError> {
    let mut cities = Vec::new();

    for line in reader.lines() {
        let line = line?;
        let mut parts = line.trim().split("  ");
        let (Some(x), Some(y)) = (parts.next(), parts.next()) else {
            continue;
        };
        match (x.trim().parse::<i32>(), y.trim().parse::<i32>()) {
            (Ok(x), Ok(y)) => cities.push(City::new(x, y)),
            _ => log::debug!("Skipping malformed city line {:?}", line),
        }
    }

    if cities.len() < MIN_CITIES {
        return Err(InstanceError::TooFewCities {
            found: cities.len(),
        });
    }

    Ok(cities)
}

pub fn write_cities<W: Write>(mut writer: W, cities: &[City]) -> std::io::Result<()> {
    for city in cities {
        writeln!(writer, "{}  {}", city.x, city.y)?;
    }
    writer.flush()
}

/// Statistics about a city set
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceStatistics {
    pub name: String,
    pub dimension: usize,
    pub min_x: i32,
    pub max_x: i32,
    pub min_y: i32,
    pub max_y: i32,
    pub avg_distance: f64,
    pub min_distance: f64,
    pub max_distance: f64,
}

impl std::fmt::Display for InstanceStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Instance: {}", self.name)?;
        writeln!(f, "  Cities: {}", self.dimension)?;
        writeln!(
            f,
            "  Bounds: x [{}, {}], y [{}, {}]",
            self.min_x, self.max_x, self.min_y, self.max_y
        )?;
        writeln!(f, "  Avg distance: {:.2}", self.avg_distance)?;
        writeln!(f, "  Min distance: {:.2}", self.min_distance)?;
        writeln!(f, "  Max distance: {:.2}", self.max_distance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn unit_square() -> Vec<City> {
        vec![
            City::new(0, 0),
            City::new(1, 0),
            City::new(1, 1),
            City::new(0, 1),
        ]
    }

    #[test]
    fn test_distance_calculation() {
        let matrix = DistanceMatrix::from_cities(&[City::new(0, 0), City::new(3, 4)]);

        assert!((matrix.distance(0, 1) - 5.0).abs() < 1e-10);
        assert!((matrix.distance(1, 0) - 5.0).abs() < 1e-10);
        assert_eq!(matrix.distance(0, 0), 0.0);
    }

    #[test]
    fn test_distance_with_extreme_coordinates() {
        let text = "2000000000  0\n-2000000000  0\n0  0\n";
        let cities = parse_cities(Cursor::new(text)).unwrap();
        let matrix = DistanceMatrix::from_cities(&cities);

        assert!((matrix.distance(0, 1) - 4.0e9).abs() < 1.0);
        let corners = [City::new(i32::MIN, i32::MIN), City::new(i32::MAX, i32::MAX)];
        let diagonal = (u32::MAX as f64) * 2f64.sqrt();
        assert!((corners[0].distance_to(&corners[1]) - diagonal).abs() < 1.0);
    }

    #[test]
    fn test_matrix_is_symmetric() {
        let instance = TspInstance::random(12, 7).unwrap();
        let m = &instance.distance_matrix;
        for i in 0..m.len() {
            assert_eq!(m.distance(i, i), 0.0);
            for j in 0..m.len() {
                assert_eq!(m.distance(i, j), m.distance(j, i));
            }
        }
    }

    #[test]
    fn test_unit_square_perimeter() {
        let matrix = DistanceMatrix::from_cities(&unit_square());
        assert!((matrix.tour_length(&[0, 1, 2, 3]) - 4.0).abs() < 1e-10);
    }

    #[test]
    fn test_tour_closes_on_its_own_first_city() {
        let matrix = DistanceMatrix::from_cities(&unit_square());
        // 2 -> 3 -> 0 -> 1 -> back to 2 is the same square
        assert!((matrix.tour_length(&[2, 3, 0, 1]) - 4.0).abs() < 1e-10);
        // crossing tour: 0 -> 2 -> 1 -> 3 -> 0
        let crossing = 2.0 * 2f64.sqrt() + 2.0;
        assert!((matrix.tour_length(&[0, 2, 1, 3]) - crossing).abs() < 1e-10);
    }

    #[test]
    fn test_from_rows_rejects_ragged_matrix() {
        let err = DistanceMatrix::from_rows(vec![vec![0.0, 1.0], vec![1.0]]).unwrap_err();
        assert!(matches!(err, InstanceError::NonSquareMatrix { row: 1, .. }));
    }

    #[test]
    fn test_parse_cities_skips_malformed_lines() {
        let text = "0  0\nnot a city\n10  0\n5 5\n10  10\n";
        let cities = parse_cities(Cursor::new(text)).unwrap();
        assert_eq!(
            cities,
            vec![City::new(0, 0), City::new(10, 0), City::new(10, 10)]
        );
    }

    #[test]
    fn test_parse_cities_rejects_short_list() {
        let err = parse_cities(Cursor::new("1  2\n3  4\n")).unwrap_err();
        assert!(matches!(err, InstanceError::TooFewCities { found: 2 }));
    }

    #[test]
    fn test_write_then_parse() {
        let cities = unit_square();
        let mut buffer = Vec::new();
        write_cities(&mut buffer, &cities).unwrap();
        assert_eq!(String::from_utf8(buffer.clone()).unwrap().lines().next(), Some("0  0"));
        assert_eq!(parse_cities(Cursor::new(buffer)).unwrap(), cities);
    }

    #[test]
    fn test_random_instance_is_seeded() {
        let a = TspInstance::random(20, 3).unwrap();
        let b = TspInstance::random(20, 3).unwrap();
        assert_eq!(a.cities, b.cities);
        assert!(a
            .cities
            .iter()
            .all(|c| (0..RANDOM_COORD_LIMIT).contains(&c.x) && (0..RANDOM_COORD_LIMIT).contains(&c.y)));
    }

    #[test]
    fn test_random_rejects_too_few() {
        assert!(matches!(
            TspInstance::random(2, 1),
            Err(InstanceError::TooFewCities { found: 2 })
        ));
    }
}
