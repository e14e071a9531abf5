use serde::{Deserialize, Serialize};

use crate::{
    attr,
    common::{
        MetatileIdx, PaletteSel, TileIdx, ATTR_BYTES, EMPTY_METATILE, META_CELLS, META_HEIGHT,
        META_WIDTH, NAMETABLE_HEIGHT, NAMETABLE_TILES, NAMETABLE_WIDTH,
    },
    error::{ModelError, Result},
};

pub fn default_data() -> Vec<u8> {
    vec![0; NAMETABLE_TILES]
}

pub fn default_attrs() -> Vec<u8> {
    vec![0; ATTR_BYTES]
}

pub fn default_metatile_grid() -> Vec<MetatileIdx> {
    vec![EMPTY_METATILE; META_CELLS]
}

/// One renderable screen's worth of tile data: a 32x30 grid of tile indices
/// plus its 64-byte attribute table.
///
/// `metatile_grid` records which metatile (if any) last stamped each 2x2
/// region. It exists only to drive edit propagation and provenance queries;
/// `data`/`attrs` are the authoritative graphics data.
#[derive(Clone, Serialize, Deserialize)]
pub struct Nametable {
    pub name: String,
    #[serde(default = "default_data")]
    pub data: Vec<u8>,
    #[serde(default = "default_attrs")]
    pub attrs: Vec<u8>,
    #[serde(default = "default_metatile_grid")]
    pub metatile_grid: Vec<MetatileIdx>,
}

impl Nametable {
    pub fn new(name: &str) -> Self {
        Nametable {
            name: name.to_string(),
            data: default_data(),
            attrs: default_attrs(),
            metatile_grid: default_metatile_grid(),
        }
    }

    fn tile_index(&self, tx: usize, ty: usize) -> Result<usize> {
        if tx >= NAMETABLE_WIDTH || ty >= NAMETABLE_HEIGHT {
            return Err(ModelError::Range {
                kind: "tile",
                x: tx as i32,
                y: ty as i32,
                width: NAMETABLE_WIDTH,
                height: NAMETABLE_HEIGHT,
            });
        }
        if self.data.len() != NAMETABLE_TILES {
            return Err(ModelError::Shape {
                kind: "nametable data",
                expected: NAMETABLE_TILES,
                found: self.data.len(),
            });
        }
        Ok(ty * NAMETABLE_WIDTH + tx)
    }

    pub fn tile(&self, tx: usize, ty: usize) -> Result<TileIdx> {
        let idx = self.tile_index(tx, ty)?;
        Ok(self.data[idx])
    }

    /// Writes one tile index. A direct edit inside a stamped 2x2 region
    /// breaks the region's link to its metatile.
    pub fn set_tile(&mut self, tx: usize, ty: usize, tile: TileIdx) -> Result<()> {
        let idx = self.tile_index(tx, ty)?;
        self.data[idx] = tile;
        self.clear_provenance_at(tx / 2, ty / 2);
        Ok(())
    }

    pub fn selector(&self, tx: usize, ty: usize) -> Result<PaletteSel> {
        attr::selector(&self.attrs, tx, ty)
    }

    /// Writes the selector for the 2x2 quadrant containing (tx, ty), and
    /// breaks that quadrant's link to its metatile.
    pub fn set_selector(&mut self, tx: usize, ty: usize, value: PaletteSel) -> Result<()> {
        attr::set_selector(&mut self.attrs, tx, ty, value)?;
        self.clear_provenance_at(tx / 2, ty / 2);
        Ok(())
    }

    fn meta_index(&self, mx: usize, my: usize) -> Result<usize> {
        if mx >= META_WIDTH || my >= META_HEIGHT {
            return Err(ModelError::Range {
                kind: "metatile cell",
                x: mx as i32,
                y: my as i32,
                width: META_WIDTH,
                height: META_HEIGHT,
            });
        }
        if self.metatile_grid.len() != META_CELLS {
            return Err(ModelError::Shape {
                kind: "metatile grid",
                expected: META_CELLS,
                found: self.metatile_grid.len(),
            });
        }
        Ok(my * META_WIDTH + mx)
    }

    /// Which metatile last stamped the 2x2 region (mx, my), or -1.
    pub fn provenance(&self, mx: usize, my: usize) -> Result<MetatileIdx> {
        let idx = self.meta_index(mx, my)?;
        Ok(self.metatile_grid[idx])
    }

    pub fn set_provenance(&mut self, mx: usize, my: usize, value: MetatileIdx) -> Result<()> {
        let idx = self.meta_index(mx, my)?;
        self.metatile_grid[idx] = value;
        Ok(())
    }

    fn clear_provenance_at(&mut self, mx: usize, my: usize) {
        if let Some(cell) = self.metatile_grid.get_mut(my * META_WIDTH + mx) {
            *cell = EMPTY_METATILE;
        }
    }
}
