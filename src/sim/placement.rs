//! Spawn placement
//!
//! The generator never computes geometry; it asks a [`PlacementService`] for
//! free cells and hands one to each token.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::MAX_GRID_LINES;

/// Visible world area, centred on the origin
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Supplies spawn coordinates that never overlap
pub trait PlacementService {
    /// Every free cell of a `cell_size` grid over `viewport`, skipping cells
    /// within `margin_cells` of an edge. Coordinates are distinct.
    fn allocate(&self, viewport: Viewport, cell_size: f32, margin_cells: u32) -> Vec<Vec2>;
}

/// Regular grid starting from the truncated left and bottom edges
#[derive(Debug, Clone, Copy, Default)]
pub struct GridPlacement;

impl GridPlacement {
    /// Grid lines along one axis of half-extent `half`
    fn axis(half: f32, cell_size: f32, margin: f32) -> Vec<f32> {
        let start = (-half).trunc();
        // `start >= -half`, so no line past this index can land inside
        let last = (((half - start) / cell_size).ceil() as u32).min(MAX_GRID_LINES);
        let mut coords = Vec::new();
        for i in 0..=last {
            let c = start + i as f32 * cell_size;
            if c > half {
                break;
            }
            // Too close to the edge
            if (half - c.abs()).abs() < margin {
                continue;
            }
            coords.push(c);
        }
        coords
    }
}

impl PlacementService for GridPlacement {
    fn allocate(&self, viewport: Viewport, cell_size: f32, margin_cells: u32) -> Vec<Vec2> {
        let positive = |v: f32| v.is_finite() && v > 0.0;
        if !positive(cell_size) || !positive(viewport.width) || !positive(viewport.height) {
            return Vec::new();
        }

        let margin = cell_size * margin_cells as f32;
        let xs = Self::axis(viewport.width / 2.0, cell_size, margin);
        let ys = Self::axis(viewport.height / 2.0, cell_size, margin);

        let mut cells = Vec::with_capacity(xs.len() * ys.len());
        for &x in &xs {
            for &y in &ys {
                cells.push(Vec2::new(x, y));
            }
        }
        cells
    }
}
