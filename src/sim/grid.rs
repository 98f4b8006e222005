//! ASCII occupancy grid for simulation
//!
//! Maps are small enough at test scale to be written inline: one string per
//! row, `#` for an obstacle, anything else free. Row 0 sits at y = 0 and
//! rows grow toward +Y; columns grow toward +X.

use crate::error::{Error, Result};

/// Occupancy grid with fixed cell size
#[derive(Debug, Clone)]
pub struct GridMap {
    width: usize,
    height: usize,
    resolution: f32,
    cells: Vec<bool>,
}

impl GridMap {
    /// Build a map from ASCII rows.
    ///
    /// All rows must have the same length. `resolution` is meters per cell.
    pub fn from_ascii(rows: &[&str], resolution: f32) -> Result<Self> {
        if rows.is_empty() || rows[0].is_empty() {
            return Err(Error::InvalidParameter("map must not be empty".to_string()));
        }
        if resolution <= 0.0 {
            return Err(Error::InvalidParameter(format!(
                "map resolution must be positive, got {resolution}"
            )));
        }

        let width = rows[0].len();
        let height = rows.len();
        let mut cells = Vec::with_capacity(width * height);

        for row in rows {
            if row.len() != width {
                return Err(Error::InvalidParameter(format!(
                    "ragged map row: expected {} cells, got {}",
                    width,
                    row.len()
                )));
            }
            cells.extend(row.bytes().map(|b| b == b'#'));
        }

        Ok(Self {
            width,
            height,
            resolution,
            cells,
        })
    }

    /// Map width in meters
    pub fn width_m(&self) -> f32 {
        self.width as f32 * self.resolution
    }

    /// Map height in meters
    pub fn height_m(&self) -> f32 {
        self.height as f32 * self.resolution
    }

    /// Cell size in meters
    pub fn resolution(&self) -> f32 {
        self.resolution
    }

    /// True when the position holds an obstacle. Out of bounds counts as
    /// occupied, so the world edge behaves like a wall.
    pub fn is_occupied(&self, x: f32, y: f32) -> bool {
        if x < 0.0 || y < 0.0 {
            return true;
        }
        let col = (x / self.resolution) as usize;
        let row = (y / self.resolution) as usize;
        if col >= self.width || row >= self.height {
            return true;
        }
        self.cells[row * self.width + col]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn walled_room() -> GridMap {
        GridMap::from_ascii(
            &[
                "##########",
                "#........#",
                "#........#",
                "#...##...#",
                "#........#",
                "##########",
            ],
            0.1,
        )
        .unwrap()
    }

    #[test]
    fn test_occupancy_lookup() {
        let map = walled_room();
        assert!(map.is_occupied(0.05, 0.05)); // wall corner
        assert!(!map.is_occupied(0.15, 0.15)); // interior
        assert!(map.is_occupied(0.45, 0.35)); // inner block
        assert!((map.width_m() - 1.0).abs() < 1e-6);
        assert!((map.height_m() - 0.6).abs() < 1e-6);
    }

    #[test]
    fn test_out_of_bounds_is_occupied() {
        let map = walled_room();
        assert!(map.is_occupied(-0.1, 0.2));
        assert!(map.is_occupied(0.2, -0.1));
        assert!(map.is_occupied(5.0, 0.2));
        assert!(map.is_occupied(0.2, 5.0));
    }

    #[test]
    fn test_rejects_bad_maps() {
        assert!(GridMap::from_ascii(&[], 0.1).is_err());
        assert!(GridMap::from_ascii(&["###", "##"], 0.1).is_err());
        assert!(GridMap::from_ascii(&["###"], 0.0).is_err());
    }
}
