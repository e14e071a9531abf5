use serde::{Deserialize, Serialize};

use crate::{
    common::{
        SystemColor, BG_SUBPALETTES, SUBPALETTE_COUNT, SUBPALETTE_SIZE, SYSTEM_COLOR_MASK,
    },
    error::{ModelError, Result},
};

/// The fixed 64-entry system color table, as RGB hex strings. Immutable
/// reference data; subpalettes store indices into this table.
pub const SYSTEM_COLORS: [&str; 64] = [
    "545454", "001e74", "081090", "300088", "440064", "5c0030", "540400", "3c1800",
    "202a00", "083a00", "004000", "003c00", "00323c", "000000", "000000", "000000",
    "989698", "084cc4", "3032ec", "5c1ee4", "8814b0", "a01464", "982220", "783c00",
    "545a00", "287200", "087c00", "007628", "006678", "000000", "000000", "000000",
    "eceeec", "4c9aec", "787cec", "b062ec", "e454ec", "ec58b4", "ec6a64", "d48820",
    "a0aa00", "74c400", "4cd020", "38cc6c", "38b4cc", "3c3c3c", "000000", "000000",
    "ececec", "a8ccec", "bcbcec", "d4b2ec", "ecaeec", "ecaed4", "ecb4b0", "e4c490",
    "ccd278", "b4de78", "a8e290", "98e2b4", "a0d6e4", "a0a2a0", "000000", "000000",
];

/// Canonical subpalette names: 4 background then 4 sprite.
pub const SUBPALETTE_NAMES: [&str; SUBPALETTE_COUNT] =
    ["BG0", "BG1", "BG2", "BG3", "SP0", "SP1", "SP2", "SP3"];

pub const DEFAULT_COLORS: [SystemColor; SUBPALETTE_SIZE] = [0x0F, 0x00, 0x10, 0x20];

/// Four system-color indices selecting colors for one rendering context.
#[derive(Clone, Serialize, Deserialize)]
pub struct Subpalette {
    pub name: String,
    #[serde(default = "default_colors")]
    pub colors: [SystemColor; SUBPALETTE_SIZE],
}

fn default_colors() -> [SystemColor; SUBPALETTE_SIZE] {
    DEFAULT_COLORS
}

impl Subpalette {
    pub fn new(name: &str) -> Self {
        Subpalette {
            name: name.to_string(),
            colors: DEFAULT_COLORS,
        }
    }
}

/// The 8 subpalettes of a bundle: BG0-BG3 then SP0-SP3.
///
/// Slot 0 of the background subpalettes is the shared universal background
/// color: writing it through any of BG0-BG3 writes all four. Sprite
/// subpalettes are independent.
#[derive(Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubpaletteSet {
    pub palettes: Vec<Subpalette>,
}

impl Default for SubpaletteSet {
    fn default() -> Self {
        SubpaletteSet {
            palettes: SUBPALETTE_NAMES.iter().map(|n| Subpalette::new(n)).collect(),
        }
    }
}

impl SubpaletteSet {
    pub fn new() -> Self {
        Self::default()
    }

    fn check_slot(&self, subpalette: usize, slot: usize) -> Result<()> {
        if subpalette >= self.palettes.len() {
            return Err(ModelError::Index {
                kind: "subpalette",
                index: subpalette,
                len: self.palettes.len(),
            });
        }
        if slot >= SUBPALETTE_SIZE {
            return Err(ModelError::Index {
                kind: "color slot",
                index: slot,
                len: SUBPALETTE_SIZE,
            });
        }
        Ok(())
    }

    /// Reads a color, masked to 6 bits. Stray high bits can appear in loaded
    /// data; the value space is fixed, so masking beats failing.
    pub fn color(&self, subpalette: usize, slot: usize) -> Result<SystemColor> {
        self.check_slot(subpalette, slot)?;
        Ok(self.palettes[subpalette].colors[slot] & SYSTEM_COLOR_MASK)
    }

    pub fn set_color(&mut self, subpalette: usize, slot: usize, color: SystemColor) -> Result<()> {
        self.check_slot(subpalette, slot)?;
        if subpalette < BG_SUBPALETTES && slot == 0 {
            // Shared background color rule:
            for i in 0..BG_SUBPALETTES.min(self.palettes.len()) {
                self.palettes[i].colors[0] = color;
            }
        } else {
            self.palettes[subpalette].colors[slot] = color;
        }
        Ok(())
    }
}
