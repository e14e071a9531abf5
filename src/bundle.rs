use hashbrown::HashMap;
use itertools::Itertools;
use log::info;
use serde::{Deserialize, Serialize};

use crate::{
    common::{
        MetatileIdx, ATTR_BYTES, BANK_BYTES, EMPTY_METATILE, META_CELLS, META_WIDTH,
        NAMETABLE_TILES, SUBPALETTE_COUNT, WORLD_EMPTY,
    },
    error::{ModelError, Result},
    metatile::{self, Metatile},
    nametable::Nametable,
    palette::SubpaletteSet,
    screen::Screen,
    tile::TileBank,
    world::WorldGrid,
};

/// The unit of persistence and the compiler's input: one project's worth of
/// graphics assets. Editors receive a `&mut AssetBundle` handle; nothing in
/// the crate reaches for ambient state.
///
/// Nametables, screens and the world grid hold indices into the tile bank
/// and metatile list, never copies. Single-writer: callers embedding this in
/// a server must serialize mutations per bundle themselves.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct AssetBundle {
    #[serde(default)]
    pub tile_bank: TileBank,
    #[serde(default)]
    pub palettes: SubpaletteSet,
    #[serde(default)]
    pub nametables: Vec<Nametable>,
    #[serde(default)]
    pub metatiles: Vec<Metatile>,
    #[serde(default)]
    pub screens: Vec<Screen>,
    #[serde(default)]
    pub world: WorldGrid,
}

impl AssetBundle {
    /// A new project: empty bank, the 8 canonical subpalettes, no
    /// nametables/metatiles/screens, default-sized empty world.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_nametable(&mut self) -> usize {
        let name = format!("Nametable {}", self.nametables.len());
        self.nametables.push(Nametable::new(&name));
        self.nametables.len() - 1
    }

    pub fn add_metatile(&mut self) -> usize {
        let name = format!("Meta {}", self.metatiles.len());
        self.metatiles.push(Metatile::new(&name));
        self.metatiles.len() - 1
    }

    pub fn add_screen(&mut self) -> usize {
        let name = format!("Screen {}", self.screens.len());
        self.screens.push(Screen::new(&name));
        self.screens.len() - 1
    }

    fn check_nametable(&self, index: usize) -> Result<()> {
        if index >= self.nametables.len() {
            return Err(ModelError::Index {
                kind: "nametable",
                index,
                len: self.nametables.len(),
            });
        }
        Ok(())
    }

    fn check_metatile(&self, index: usize) -> Result<()> {
        if index >= self.metatiles.len() {
            return Err(ModelError::Index {
                kind: "metatile",
                index,
                len: self.metatiles.len(),
            });
        }
        Ok(())
    }

    /// Stamps metatile `metatile_index` onto region (mx, my) of nametable
    /// `nt`, recording provenance for later propagation.
    pub fn stamp_metatile(
        &mut self,
        nt: usize,
        mx: usize,
        my: usize,
        metatile_index: usize,
    ) -> Result<()> {
        self.check_nametable(nt)?;
        self.check_metatile(metatile_index)?;
        let meta = self.metatiles[metatile_index].clone();
        metatile::stamp(
            &mut self.nametables[nt],
            mx,
            my,
            &meta,
            metatile_index as MetatileIdx,
        )
    }

    /// Re-stamps every nametable region whose provenance is
    /// `metatile_index`, pushing an edited definition out to its instances.
    /// Regions with other or no provenance are untouched. Runs to completion
    /// before returning; user-paced, so the O(nametables x 240) scan is
    /// acceptable.
    pub fn propagate_metatile(&mut self, metatile_index: usize) -> Result<()> {
        self.check_metatile(metatile_index)?;
        let meta = self.metatiles[metatile_index].clone();
        let target = metatile_index as MetatileIdx;
        let mut restamped = 0usize;
        for nt in &mut self.nametables {
            for i in 0..nt.metatile_grid.len().min(META_CELLS) {
                if nt.metatile_grid[i] == target {
                    metatile::stamp(nt, i % META_WIDTH, i / META_WIDTH, &meta, target)?;
                    restamped += 1;
                }
            }
        }
        info!(
            "Propagated metatile {} ({}) to {} cells",
            metatile_index, meta.name, restamped
        );
        Ok(())
    }

    /// Removes a metatile definition and reindexes every reference to keep
    /// the remaining indices contiguous: cells equal to the deleted index
    /// become empty, greater cells shift down by one. Covers both nametable
    /// provenance grids and screen data.
    pub fn delete_metatile(&mut self, metatile_index: usize) -> Result<Metatile> {
        self.check_metatile(metatile_index)?;
        let removed = self.metatiles.remove(metatile_index);
        let deleted = metatile_index as MetatileIdx;
        info!("Deleting metatile {} ({})", metatile_index, removed.name);
        let fix = |cell: &mut MetatileIdx| {
            if *cell == deleted {
                *cell = EMPTY_METATILE;
            } else if *cell > deleted {
                *cell -= 1;
            }
        };
        for nt in &mut self.nametables {
            nt.metatile_grid.iter_mut().for_each(fix);
        }
        for screen in &mut self.screens {
            screen.data.iter_mut().for_each(fix);
        }
        Ok(removed)
    }

    /// Removes a nametable and reindexes world cells the same way metatile
    /// deletion reindexes provenance.
    pub fn delete_nametable(&mut self, index: usize) -> Result<Nametable> {
        self.check_nametable(index)?;
        let removed = self.nametables.remove(index);
        info!("Deleting nametable {} ({})", index, removed.name);
        let deleted = index as u8;
        for cell in &mut self.world.data {
            if *cell == WORLD_EMPTY {
                continue;
            }
            if *cell == deleted {
                *cell = WORLD_EMPTY;
            } else if *cell > deleted {
                *cell -= 1;
            }
        }
        Ok(removed)
    }

    /// Removes a screen. Nothing references screens by index, so no
    /// reindex pass is needed.
    pub fn delete_screen(&mut self, index: usize) -> Result<Screen> {
        if index >= self.screens.len() {
            return Err(ModelError::Index {
                kind: "screen",
                index,
                len: self.screens.len(),
            });
        }
        let removed = self.screens.remove(index);
        info!("Deleting screen {} ({})", index, removed.name);
        Ok(removed)
    }

    /// Name -> index lookup over the nametable list, for callers that
    /// address nametables by name (pickers, the compiler's symbol binding).
    pub fn nametable_index_by_name(&self) -> HashMap<&str, usize> {
        self.nametables
            .iter()
            .enumerate()
            .map(|(i, nt)| (nt.name.as_str(), i))
            .collect()
    }

    /// Reports shape mismatches and dangling cross-references without
    /// mutating anything. A loaded bundle that went through
    /// `persist::normalize` reports nothing.
    pub fn validate(&self) -> Vec<ModelError> {
        let mut errors = vec![];
        if self.tile_bank.data.len() != BANK_BYTES {
            errors.push(ModelError::Shape {
                kind: "tile bank",
                expected: BANK_BYTES,
                found: self.tile_bank.data.len(),
            });
        }
        if self.palettes.palettes.len() != SUBPALETTE_COUNT {
            errors.push(ModelError::Shape {
                kind: "subpalette set",
                expected: SUBPALETTE_COUNT,
                found: self.palettes.palettes.len(),
            });
        }
        let meta_len = self.metatiles.len();
        let bad_meta = |c: MetatileIdx| c != EMPTY_METATILE && (c < 0 || c as usize >= meta_len);
        for nt in &self.nametables {
            if nt.data.len() != NAMETABLE_TILES {
                errors.push(ModelError::Shape {
                    kind: "nametable data",
                    expected: NAMETABLE_TILES,
                    found: nt.data.len(),
                });
            }
            if nt.attrs.len() != ATTR_BYTES {
                errors.push(ModelError::Shape {
                    kind: "attribute table",
                    expected: ATTR_BYTES,
                    found: nt.attrs.len(),
                });
            }
            if nt.metatile_grid.len() != META_CELLS {
                errors.push(ModelError::Shape {
                    kind: "metatile grid",
                    expected: META_CELLS,
                    found: nt.metatile_grid.len(),
                });
            }
            for pos in nt.metatile_grid.iter().positions(|&c| bad_meta(c)) {
                errors.push(ModelError::Index {
                    kind: "metatile reference",
                    index: nt.metatile_grid[pos].unsigned_abs() as usize,
                    len: meta_len,
                });
            }
        }
        for screen in &self.screens {
            if screen.data.len() != META_CELLS {
                errors.push(ModelError::Shape {
                    kind: "screen data",
                    expected: META_CELLS,
                    found: screen.data.len(),
                });
            }
            for pos in screen.data.iter().positions(|&c| bad_meta(c)) {
                errors.push(ModelError::Index {
                    kind: "metatile reference",
                    index: screen.data[pos].unsigned_abs() as usize,
                    len: meta_len,
                });
            }
        }
        if self.world.data.len() != self.world.width * self.world.height {
            errors.push(ModelError::Shape {
                kind: "world data",
                expected: self.world.width * self.world.height,
                found: self.world.data.len(),
            });
        }
        let nt_len = self.nametables.len();
        for pos in self
            .world
            .data
            .iter()
            .positions(|&c| c != WORLD_EMPTY && c as usize >= nt_len)
        {
            errors.push(ModelError::Index {
                kind: "nametable reference",
                index: self.world.data[pos] as usize,
                len: nt_len,
            });
        }
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::META_HEIGHT;

    fn bundle_with_metatiles(n: usize) -> AssetBundle {
        let mut bundle = AssetBundle::new();
        bundle.add_nametable();
        for i in 0..n {
            let idx = bundle.add_metatile();
            bundle.metatiles[idx].tiles = [i as u8; 4];
            bundle.metatiles[idx].attr = (i % 4) as u8;
        }
        bundle
    }

    #[test]
    fn stamp_then_read_back() {
        let mut bundle = bundle_with_metatiles(2);
        bundle.metatiles[1].tiles = [10, 11, 12, 13];
        bundle.metatiles[1].attr = 3;
        bundle.stamp_metatile(0, 4, 6, 1).unwrap();
        let nt = &bundle.nametables[0];
        assert_eq!(nt.tile(8, 12).unwrap(), 10);
        assert_eq!(nt.tile(9, 12).unwrap(), 11);
        assert_eq!(nt.tile(8, 13).unwrap(), 12);
        assert_eq!(nt.tile(9, 13).unwrap(), 13);
        assert_eq!(nt.selector(8, 12).unwrap(), 3);
        assert_eq!(nt.provenance(4, 6).unwrap(), 1);
    }

    #[test]
    fn propagate_updates_only_provenance_matches() {
        let mut bundle = bundle_with_metatiles(2);
        bundle.stamp_metatile(0, 0, 0, 0).unwrap();
        bundle.stamp_metatile(0, 1, 0, 1).unwrap();
        // Hand-placed tiles with no provenance:
        bundle.nametables[0].set_tile(20, 20, 99).unwrap();

        bundle.metatiles[1].attr = 2;
        bundle.metatiles[1].tiles = [7, 7, 7, 7];
        bundle.propagate_metatile(1).unwrap();

        let nt = &bundle.nametables[0];
        assert_eq!(nt.tile(2, 0).unwrap(), 7);
        assert_eq!(nt.selector(2, 0).unwrap(), 2);
        // Metatile 0's cell and the hand edit are untouched:
        assert_eq!(nt.tile(0, 0).unwrap(), 0);
        assert_eq!(nt.selector(0, 0).unwrap(), 0);
        assert_eq!(nt.tile(20, 20).unwrap(), 99);
    }

    #[test]
    fn hand_edit_breaks_propagation_link() {
        let mut bundle = bundle_with_metatiles(1);
        bundle.stamp_metatile(0, 3, 3, 0).unwrap();
        bundle.nametables[0].set_tile(6, 6, 55).unwrap();

        bundle.metatiles[0].tiles = [9, 9, 9, 9];
        bundle.propagate_metatile(0).unwrap();
        // The edited region no longer follows the definition:
        assert_eq!(bundle.nametables[0].tile(6, 6).unwrap(), 55);
        assert_eq!(bundle.nametables[0].tile(7, 6).unwrap(), 0);
    }

    #[test]
    fn delete_metatile_reindexes_references() {
        let mut bundle = bundle_with_metatiles(4);
        bundle.add_screen();
        for (cell, idx) in [(0usize, 0i16), (1, 1), (2, 2), (3, 3)] {
            bundle.nametables[0].metatile_grid[cell] = idx;
            bundle.screens[0].data[cell] = idx;
        }
        bundle.delete_metatile(1).unwrap();
        assert_eq!(bundle.metatiles.len(), 3);
        let grid = &bundle.nametables[0].metatile_grid;
        assert_eq!(grid[0], 0);
        assert_eq!(grid[1], EMPTY_METATILE);
        assert_eq!(grid[2], 1);
        assert_eq!(grid[3], 2);
        assert_eq!(&bundle.screens[0].data[0..4], &[0, EMPTY_METATILE, 1, 2]);
    }

    #[test]
    fn delete_nametable_reindexes_world() {
        let mut bundle = AssetBundle::new();
        for _ in 0..3 {
            bundle.add_nametable();
        }
        bundle.world.place_at(0, 0, 0).unwrap();
        bundle.world.place_at(1, 0, 1).unwrap();
        bundle.world.place_at(2, 0, 2).unwrap();
        bundle.delete_nametable(1).unwrap();
        assert_eq!(bundle.world.at(0, 0).unwrap(), 0);
        assert_eq!(bundle.world.at(1, 0).unwrap(), WORLD_EMPTY);
        assert_eq!(bundle.world.at(2, 0).unwrap(), 1);
        assert_eq!(bundle.world.at(3, 0).unwrap(), WORLD_EMPTY);
    }

    #[test]
    fn stamp_rejects_bad_indices() {
        let mut bundle = bundle_with_metatiles(1);
        assert!(matches!(
            bundle.stamp_metatile(1, 0, 0, 0),
            Err(ModelError::Index { .. })
        ));
        assert!(matches!(
            bundle.stamp_metatile(0, 0, 0, 1),
            Err(ModelError::Index { .. })
        ));
        assert!(matches!(
            bundle.stamp_metatile(0, 0, META_HEIGHT, 0),
            Err(ModelError::Range { .. })
        ));
    }

    #[test]
    fn validate_reports_dangling_references() {
        let mut bundle = bundle_with_metatiles(1);
        bundle.add_screen();
        bundle.screens[0].data[5] = 9;
        bundle.world.data[0] = 4;
        let errors = bundle.validate();
        assert!(errors.contains(&ModelError::Index {
            kind: "metatile reference",
            index: 9,
            len: 1,
        }));
        assert!(errors.contains(&ModelError::Index {
            kind: "nametable reference",
            index: 4,
            len: 1,
        }));
    }

    #[test]
    fn validate_clean_bundle_is_empty() {
        let mut bundle = bundle_with_metatiles(3);
        bundle.add_screen();
        bundle.stamp_metatile(0, 2, 2, 2).unwrap();
        assert!(bundle.validate().is_empty());
    }

    #[test]
    fn nametable_name_lookup() {
        let mut bundle = AssetBundle::new();
        bundle.add_nametable();
        bundle.add_nametable();
        let map = bundle.nametable_index_by_name();
        assert_eq!(map["Nametable 0"], 0);
        assert_eq!(map["Nametable 1"], 1);
    }
}
