use serde::{Deserialize, Serialize};

use crate::{
    common::{MetatileIdx, EMPTY_METATILE, META_CELLS, META_HEIGHT, META_WIDTH},
    error::{ModelError, Result},
};

pub fn default_screen_data() -> Vec<MetatileIdx> {
    vec![EMPTY_METATILE; META_CELLS]
}

/// A coarser composition unit: a 16x15 grid of metatile references. Holds no
/// tile or attribute data of its own; each cell resolves to 4 tiles plus one
/// selector through the metatile list at consumption time.
#[derive(Clone, Serialize, Deserialize)]
pub struct Screen {
    pub name: String,
    #[serde(default = "default_screen_data")]
    pub data: Vec<MetatileIdx>,
}

impl Screen {
    pub fn new(name: &str) -> Self {
        Screen {
            name: name.to_string(),
            data: default_screen_data(),
        }
    }

    fn cell_index(&self, mx: usize, my: usize) -> Result<usize> {
        if mx >= META_WIDTH || my >= META_HEIGHT {
            return Err(ModelError::Range {
                kind: "screen cell",
                x: mx as i32,
                y: my as i32,
                width: META_WIDTH,
                height: META_HEIGHT,
            });
        }
        if self.data.len() != META_CELLS {
            return Err(ModelError::Shape {
                kind: "screen data",
                expected: META_CELLS,
                found: self.data.len(),
            });
        }
        Ok(my * META_WIDTH + mx)
    }

    pub fn cell(&self, mx: usize, my: usize) -> Result<MetatileIdx> {
        let idx = self.cell_index(mx, my)?;
        Ok(self.data[idx])
    }

    /// Pure index write; no tile data is touched.
    pub fn set_cell(&mut self, mx: usize, my: usize, metatile: MetatileIdx) -> Result<()> {
        let idx = self.cell_index(mx, my)?;
        self.data[idx] = metatile;
        Ok(())
    }
}
