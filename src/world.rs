use serde::{Deserialize, Serialize};

use crate::{
    common::{WorldCell, WORLD_EMPTY},
    error::{ModelError, Result},
};

pub const DEFAULT_WORLD_SIZE: usize = 16;

/// A sparse rectangular grid of nametable references composing a larger
/// traversable map. Cells hold a nametable index or `WORLD_EMPTY` (0xFF).
#[derive(Clone, Serialize, Deserialize)]
pub struct WorldGrid {
    #[serde(default = "default_world_size")]
    pub width: usize,
    #[serde(default = "default_world_size")]
    pub height: usize,
    #[serde(default)]
    pub data: Vec<WorldCell>,
}

fn default_world_size() -> usize {
    DEFAULT_WORLD_SIZE
}

impl Default for WorldGrid {
    fn default() -> Self {
        WorldGrid {
            width: DEFAULT_WORLD_SIZE,
            height: DEFAULT_WORLD_SIZE,
            data: vec![WORLD_EMPTY; DEFAULT_WORLD_SIZE * DEFAULT_WORLD_SIZE],
        }
    }
}

impl WorldGrid {
    pub fn new(width: usize, height: usize) -> Self {
        WorldGrid {
            width,
            height,
            data: vec![WORLD_EMPTY; width * height],
        }
    }

    fn cell_index(&self, gx: usize, gy: usize) -> Result<usize> {
        if gx >= self.width || gy >= self.height {
            return Err(ModelError::Range {
                kind: "world cell",
                x: gx as i32,
                y: gy as i32,
                width: self.width,
                height: self.height,
            });
        }
        if self.data.len() != self.width * self.height {
            return Err(ModelError::Shape {
                kind: "world data",
                expected: self.width * self.height,
                found: self.data.len(),
            });
        }
        Ok(gy * self.width + gx)
    }

    pub fn at(&self, gx: usize, gy: usize) -> Result<WorldCell> {
        let idx = self.cell_index(gx, gy)?;
        Ok(self.data[idx])
    }

    pub fn place_at(&mut self, gx: usize, gy: usize, cell: WorldCell) -> Result<()> {
        let idx = self.cell_index(gx, gy)?;
        self.data[idx] = cell;
        Ok(())
    }

    /// Resizes the grid, keeping values at coordinates that exist in both
    /// the old and new bounds and filling new cells with the empty sentinel.
    /// The buffer and dimensions swap together, so no half-resized state is
    /// ever observable.
    pub fn resize(&mut self, new_width: usize, new_height: usize) {
        if new_width == self.width && new_height == self.height {
            return;
        }
        let mut new_data = vec![WORLD_EMPTY; new_width * new_height];
        for gy in 0..self.height.min(new_height) {
            for gx in 0..self.width.min(new_width) {
                new_data[gy * new_width + gx] = self.data[gy * self.width + gx];
            }
        }
        self.width = new_width;
        self.height = new_height;
        self.data = new_data;
    }
}
