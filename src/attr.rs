//! Attribute table addressing.
//!
//! The 32x30 tile grid is partitioned into an 8x8 grid of 4x4-tile blocks,
//! one attribute byte each. Within a byte, the 2x2-tile sub-quadrants own
//! two bits apiece:
//!   - bits 0,1: top-left 2x2 block
//!   - bits 2,3: top-right
//!   - bits 4,5: bottom-left
//!   - bits 6,7: bottom-right
//!
//! Palette selection is never finer than 2x2 tiles; every selector read and
//! write in the crate goes through these two functions so the block/shift
//! math exists exactly once.

use crate::{
    common::{PaletteSel, ATTR_BYTES, NAMETABLE_HEIGHT, NAMETABLE_WIDTH},
    error::{ModelError, Result},
};

fn attr_pos(tx: usize, ty: usize) -> Result<(usize, u32)> {
    if tx >= NAMETABLE_WIDTH || ty >= NAMETABLE_HEIGHT {
        return Err(ModelError::Range {
            kind: "tile",
            x: tx as i32,
            y: ty as i32,
            width: NAMETABLE_WIDTH,
            height: NAMETABLE_HEIGHT,
        });
    }
    let block = (ty / 4) * 8 + tx / 4;
    let mut shift = 0;
    if tx % 4 >= 2 {
        shift += 2;
    }
    if ty % 4 >= 2 {
        shift += 4;
    }
    Ok((block, shift))
}

fn check_shape(attrs: &[u8]) -> Result<()> {
    if attrs.len() != ATTR_BYTES {
        return Err(ModelError::Shape {
            kind: "attribute table",
            expected: ATTR_BYTES,
            found: attrs.len(),
        });
    }
    Ok(())
}

/// Returns the 2-bit subpalette selector covering tile (tx, ty).
pub fn selector(attrs: &[u8], tx: usize, ty: usize) -> Result<PaletteSel> {
    check_shape(attrs)?;
    let (block, shift) = attr_pos(tx, ty)?;
    Ok((attrs[block] >> shift) & 0x03)
}

/// Writes the selector for the 2x2 quadrant containing tile (tx, ty).
pub fn set_selector(attrs: &mut [u8], tx: usize, ty: usize, value: PaletteSel) -> Result<()> {
    check_shape(attrs)?;
    let (block, shift) = attr_pos(tx, ty)?;
    attrs[block] = (attrs[block] & !(0x03 << shift)) | ((value & 0x03) << shift);
    Ok(())
}
