use serde::{Deserialize, Serialize};

use crate::{
    attr,
    common::{
        MetatileIdx, PaletteSel, TileIdx, ATTR_BYTES, META_CELLS, META_HEIGHT, META_WIDTH,
        NAMETABLE_TILES, NAMETABLE_WIDTH,
    },
    error::{ModelError, Result},
    nametable::Nametable,
};

/// A named, reusable 2x2-tile stamp with one subpalette selector.
///
/// `tiles` order is top-left, top-right, bottom-left, bottom-right. Edits to
/// a placed definition are pushed out to every stamped cell via
/// `AssetBundle::propagate_metatile`.
#[derive(Clone, Serialize, Deserialize)]
pub struct Metatile {
    pub name: String,
    #[serde(default)]
    pub tiles: [TileIdx; 4],
    #[serde(default)]
    pub attr: PaletteSel,
}

impl Metatile {
    pub fn new(name: &str) -> Self {
        Metatile {
            name: name.to_string(),
            tiles: [0; 4],
            attr: 0,
        }
    }
}

/// Stamps `metatile` onto the 2x2 region (mx, my) of a nametable: four tile
/// writes plus one selector write (a metatile occupies exactly one attribute
/// quadrant), then records `index` as the region's provenance.
///
/// Writes bypass `Nametable::set_tile`/`set_selector` since those treat a
/// write as a manual edit and would clear the provenance being recorded.
pub fn stamp(
    nt: &mut Nametable,
    mx: usize,
    my: usize,
    metatile: &Metatile,
    index: MetatileIdx,
) -> Result<()> {
    if mx >= META_WIDTH || my >= META_HEIGHT {
        return Err(ModelError::Range {
            kind: "metatile cell",
            x: mx as i32,
            y: my as i32,
            width: META_WIDTH,
            height: META_HEIGHT,
        });
    }
    // Shape checks up front, so a malformed nametable is never half-stamped:
    if nt.data.len() != NAMETABLE_TILES {
        return Err(ModelError::Shape {
            kind: "nametable data",
            expected: NAMETABLE_TILES,
            found: nt.data.len(),
        });
    }
    if nt.attrs.len() != ATTR_BYTES {
        return Err(ModelError::Shape {
            kind: "attribute table",
            expected: ATTR_BYTES,
            found: nt.attrs.len(),
        });
    }
    if nt.metatile_grid.len() != META_CELLS {
        return Err(ModelError::Shape {
            kind: "metatile grid",
            expected: META_CELLS,
            found: nt.metatile_grid.len(),
        });
    }
    let tx = mx * 2;
    let ty = my * 2;
    for (i, &tile) in metatile.tiles.iter().enumerate() {
        let dx = i % 2;
        let dy = i / 2;
        nt.data[(ty + dy) * NAMETABLE_WIDTH + tx + dx] = tile;
    }
    attr::set_selector(&mut nt.attrs, tx, ty, metatile.attr)?;
    nt.set_provenance(mx, my, index)?;
    Ok(())
}
