//! The (de)serialization surface called by the persistence collaborator.
//!
//! Pure: bytes in, bundle out. Actually reading or writing storage is the
//! caller's job. Loading tolerates legacy and partial records; `normalize`
//! repairs every shape problem locally instead of failing the load, so
//! consumers never see a partially-shaped bundle.

use anyhow::{Context, Result};
use hashbrown::HashMap;
use json_pretty_compact::PrettyCompactFormatter;
use log::warn;
use serde::Serialize;
use serde_json::Serializer;

use crate::{
    bundle::AssetBundle,
    common::{
        ATTR_BYTES, BANK_BYTES, EMPTY_METATILE, META_CELLS, NAMETABLE_TILES, WORLD_EMPTY,
    },
    nametable::{default_attrs, default_metatile_grid},
    palette::{Subpalette, SUBPALETTE_NAMES},
    screen::default_screen_data,
};

/// Serializes a bundle to pretty-compact JSON bytes.
pub fn to_json(bundle: &AssetBundle) -> Result<Vec<u8>> {
    let formatter = PrettyCompactFormatter::new();
    let mut bytes = vec![];
    let mut ser = Serializer::with_formatter(&mut bytes, formatter);
    bundle
        .serialize(&mut ser)
        .context("serializing asset bundle")?;
    Ok(bytes)
}

/// Deserializes and normalizes a bundle from JSON bytes.
pub fn from_json(bytes: &[u8]) -> Result<AssetBundle> {
    let mut bundle: AssetBundle =
        serde_json::from_slice(bytes).context("deserializing asset bundle")?;
    normalize(&mut bundle);
    Ok(bundle)
}

/// Repairs a freshly-deserialized bundle into canonical shape: fixed-length
/// arrays resized, the 8 canonical subpalettes ensured, dangling references
/// cleared to their sentinels. Runs once at the load boundary so the rest of
/// the crate never re-checks field existence.
pub fn normalize(bundle: &mut AssetBundle) {
    if bundle.tile_bank.data.len() != BANK_BYTES {
        warn!(
            "Tile bank has {} bytes, expected {}; resizing",
            bundle.tile_bank.data.len(),
            BANK_BYTES
        );
        bundle.tile_bank.data.resize(BANK_BYTES, 0);
    }

    normalize_palettes(bundle);

    for nt in &mut bundle.nametables {
        if nt.data.len() != NAMETABLE_TILES {
            warn!(
                "Nametable {}: data length {}, expected {}; resizing",
                nt.name,
                nt.data.len(),
                NAMETABLE_TILES
            );
            nt.data.resize(NAMETABLE_TILES, 0);
        }
        if nt.attrs.len() != ATTR_BYTES {
            warn!(
                "Nametable {}: attribute table length {}, expected {}; rebuilding",
                nt.name,
                nt.attrs.len(),
                ATTR_BYTES
            );
            nt.attrs = default_attrs();
        }
        if nt.metatile_grid.len() != META_CELLS {
            warn!(
                "Nametable {}: metatile grid length {}, expected {}; rebuilding",
                nt.name,
                nt.metatile_grid.len(),
                META_CELLS
            );
            nt.metatile_grid = default_metatile_grid();
        }
    }

    for screen in &mut bundle.screens {
        if screen.data.len() != META_CELLS {
            warn!(
                "Screen {}: data length {}, expected {}; rebuilding",
                screen.name,
                screen.data.len(),
                META_CELLS
            );
            screen.data = default_screen_data();
        }
    }

    let world_cells = bundle.world.width * bundle.world.height;
    if bundle.world.data.len() != world_cells {
        warn!(
            "World data length {} does not match {}x{}; resizing",
            bundle.world.data.len(),
            bundle.world.width,
            bundle.world.height
        );
        bundle.world.data.resize(world_cells, WORLD_EMPTY);
    }

    clear_dangling_references(bundle);
}

// Ensures the canonical BG0-BG3/SP0-SP3 subpalettes, in order, keeping the
// colors of any that were present. Extra entries are dropped.
fn normalize_palettes(bundle: &mut AssetBundle) {
    let existing: Vec<Subpalette> = bundle.palettes.palettes.drain(..).collect();
    let mut by_name: HashMap<&str, &Subpalette> =
        existing.iter().map(|p| (p.name.as_str(), p)).collect();
    if existing.len() > SUBPALETTE_NAMES.len() {
        warn!(
            "Subpalette set has {} entries; keeping the canonical {}",
            existing.len(),
            SUBPALETTE_NAMES.len()
        );
    }
    bundle.palettes.palettes = SUBPALETTE_NAMES
        .iter()
        .map(|&name| match by_name.remove(name) {
            Some(found) => found.clone(),
            None => Subpalette::new(name),
        })
        .collect();
}

fn clear_dangling_references(bundle: &mut AssetBundle) {
    let meta_len = bundle.metatiles.len() as i16;
    let mut cleared = 0usize;
    for nt in &mut bundle.nametables {
        for cell in &mut nt.metatile_grid {
            if *cell != EMPTY_METATILE && (*cell < 0 || *cell >= meta_len) {
                *cell = EMPTY_METATILE;
                cleared += 1;
            }
        }
    }
    for screen in &mut bundle.screens {
        for cell in &mut screen.data {
            if *cell != EMPTY_METATILE && (*cell < 0 || *cell >= meta_len) {
                *cell = EMPTY_METATILE;
                cleared += 1;
            }
        }
    }
    let nt_len = bundle.nametables.len();
    for cell in &mut bundle.world.data {
        if *cell != WORLD_EMPTY && *cell as usize >= nt_len {
            *cell = WORLD_EMPTY;
            cleared += 1;
        }
    }
    if cleared > 0 {
        warn!("Cleared {} dangling references", cleared);
    }
}
