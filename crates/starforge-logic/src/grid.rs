//! Planet mining grids.
//!
//! Each resource gets its own uniform noise field, box-blurred so deposits
//! cluster, then thresholded by a per-planet-type spawn rate. Surviving
//! cells are rescaled into `[MIN_AMOUNT, MAX_AMOUNT]`.

use crate::resources::ResourceKind;
use rand::Rng;
use serde::{Deserialize, Serialize};

pub const MIN_AMOUNT: f64 = 10.0;
pub const MAX_AMOUNT: f64 = 1000.0;

/// Grid cells per unit of planet size along each axis.
pub const CELLS_PER_SIZE: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlanetType {
    Terrestrial,
    GasGiant,
    Ice,
    Desert,
}

impl PlanetType {
    pub const ALL: [PlanetType; 4] = [Self::Terrestrial, Self::GasGiant, Self::Ice, Self::Desert];

    /// Spawn-rate threshold per resource. A smoothed value must reach this
    /// for the cell to hold the resource; 0.0 means every cell does.
    pub fn spawn_rate(self, resource: ResourceKind) -> f64 {
        let (iron, copper, fuel, soil) = match self {
            Self::Terrestrial => (0.3, 0.2, 0.1, 0.5),
            Self::GasGiant => (0.4, 0.3, 0.6, 0.0),
            Self::Ice => (0.2, 0.15, 0.4, 0.1),
            Self::Desert => (0.5, 0.4, 0.3, 0.1),
        };
        match resource {
            ResourceKind::Iron => iron,
            ResourceKind::Copper => copper,
            ResourceKind::Fuel => fuel,
            ResourceKind::Soil => soil,
        }
    }
}

/// One generated cell with its optional deposits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CellDeposits {
    pub x: u32,
    pub y: u32,
    pub iron: Option<f64>,
    pub copper: Option<f64>,
    pub fuel: Option<f64>,
    pub soil: Option<f64>,
}

impl CellDeposits {
    pub fn get(&self, kind: ResourceKind) -> Option<f64> {
        match kind {
            ResourceKind::Iron => self.iron,
            ResourceKind::Copper => self.copper,
            ResourceKind::Fuel => self.fuel,
            ResourceKind::Soil => self.soil,
        }
    }

    fn set(&mut self, kind: ResourceKind, amount: Option<f64>) {
        match kind {
            ResourceKind::Iron => self.iron = amount,
            ResourceKind::Copper => self.copper = amount,
            ResourceKind::Fuel => self.fuel = amount,
            ResourceKind::Soil => self.soil = amount,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GridLayout {
    pub dimension: u32,
    /// Row-major, `dimension * dimension` entries.
    pub cells: Vec<CellDeposits>,
}

pub fn grid_dimension(planet_size: u32) -> u32 {
    planet_size * CELLS_PER_SIZE
}

/// Blur kernel radius for a grid of the given dimension.
pub fn kernel_radius(dimension: u32) -> u32 {
    (dimension / 10 + 1).min(5) / 2
}

/// Map a smoothed noise value to a deposit amount, or `None` below threshold.
pub fn deposit_amount(value: f64, threshold: f64) -> Option<f64> {
    if value < threshold {
        return None;
    }
    if threshold >= 1.0 {
        return Some(MIN_AMOUNT);
    }
    let scaled = MIN_AMOUNT + (value - threshold) / (1.0 - threshold) * (MAX_AMOUNT - MIN_AMOUNT);
    Some(scaled.clamp(MIN_AMOUNT, MAX_AMOUNT))
}

pub fn generate_grid(planet_size: u32, planet_type: PlanetType, rng: &mut impl Rng) -> GridLayout {
    let dimension = grid_dimension(planet_size);
    let n = dimension as usize;
    let mut cells: Vec<CellDeposits> = (0..n * n)
        .map(|i| CellDeposits {
            x: (i % n) as u32,
            y: (i / n) as u32,
            ..Default::default()
        })
        .collect();

    let radius = kernel_radius(dimension) as usize;
    for kind in ResourceKind::ALL {
        let noise: Vec<f64> = (0..n * n).map(|_| rng.gen::<f64>()).collect();
        let smoothed = box_blur(&noise, n, radius);
        let threshold = planet_type.spawn_rate(kind);
        for (cell, value) in cells.iter_mut().zip(smoothed) {
            cell.set(kind, deposit_amount(value, threshold));
        }
    }

    GridLayout { dimension, cells }
}

/// Average each cell with its in-bounds neighbors within `radius`.
fn box_blur(field: &[f64], n: usize, radius: usize) -> Vec<f64> {
    let mut out = vec![0.0; field.len()];
    for y in 0..n {
        let y0 = y.saturating_sub(radius);
        let y1 = (y + radius).min(n - 1);
        for x in 0..n {
            let x0 = x.saturating_sub(radius);
            let x1 = (x + radius).min(n - 1);
            let mut sum = 0.0;
            let mut count = 0usize;
            for yy in y0..=y1 {
                for xx in x0..=x1 {
                    sum += field[yy * n + xx];
                    count += 1;
                }
            }
            out[y * n + x] = sum / count as f64;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_kernel_radius() {
        assert_eq!(kernel_radius(60), 2); // min(5, 7) / 2
        assert_eq!(kernel_radius(160), 2);
        assert_eq!(kernel_radius(5), 0);
        assert_eq!(kernel_radius(25), 1); // min(5, 3) / 2
    }

    #[test]
    fn test_deposit_amount_bounds() {
        assert_eq!(deposit_amount(0.29, 0.3), None);
        assert_eq!(deposit_amount(0.3, 0.3), Some(MIN_AMOUNT));
        assert_eq!(deposit_amount(1.0, 0.3), Some(MAX_AMOUNT));
        let mid = deposit_amount(0.65, 0.3).unwrap();
        assert!((mid - 505.0).abs() < 1e-6);
    }

    #[test]
    fn test_zero_rate_fills_every_cell() {
        let grid = generate_grid(3, PlanetType::GasGiant, &mut StdRng::seed_from_u64(5));
        assert!(grid.cells.iter().all(|c| c.soil.is_some()));
    }

    #[test]
    fn test_blur_of_constant_is_constant() {
        let field = vec![0.4; 16];
        let out = box_blur(&field, 4, 1);
        assert!(out.iter().all(|v| (v - 0.4).abs() < 1e-12));
    }

    #[test]
    fn test_cell_coordinates_row_major() {
        let grid = generate_grid(3, PlanetType::Ice, &mut StdRng::seed_from_u64(1));
        assert_eq!(grid.cells.len(), 60 * 60);
        assert_eq!((grid.cells[61].x, grid.cells[61].y), (1, 1));
    }
}
