use famitile::common::{EMPTY_METATILE, WORLD_EMPTY};
use famitile::persist;
use famitile::tile::Flip;
use famitile::AssetBundle;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

// One editing session end to end: draw tiles, define and place metatiles,
// edit a definition, delete one, compose the world, save and reload.
#[test]
fn editing_session_roundtrip() {
    init_logging();
    let mut bundle = AssetBundle::new();

    // Draw a checker pattern into tile 1, then mirror it.
    for y in 0..8 {
        for x in 0..8 {
            if (x + y) % 2 == 0 {
                bundle.tile_bank.set_pixel(1, x, y, 3).unwrap();
            }
        }
    }
    bundle.tile_bank.flip(1, Flip::Horizontal).unwrap();
    assert_eq!(bundle.tile_bank.get_pixel(1, 0, 0).unwrap(), 0);
    assert_eq!(bundle.tile_bank.get_pixel(1, 1, 0).unwrap(), 3);

    // Universal background color:
    bundle.palettes.set_color(2, 0, 0x0F).unwrap();
    for i in 0..4 {
        assert_eq!(bundle.palettes.color(i, 0).unwrap(), 0x0F);
    }

    // Define four metatiles and stamp them around two nametables.
    bundle.add_nametable();
    bundle.add_nametable();
    for i in 0..4 {
        let m = bundle.add_metatile();
        bundle.metatiles[m].tiles = [i as u8 + 1; 4];
        bundle.metatiles[m].attr = i as u8;
    }
    bundle.stamp_metatile(0, 0, 0, 0).unwrap();
    bundle.stamp_metatile(0, 1, 0, 1).unwrap();
    bundle.stamp_metatile(1, 2, 2, 2).unwrap();
    bundle.stamp_metatile(1, 3, 3, 3).unwrap();

    // Edit metatile 2's definition and push it to its instances.
    bundle.metatiles[2].attr = 3;
    bundle.metatiles[2].tiles = [9, 9, 9, 9];
    bundle.propagate_metatile(2).unwrap();
    assert_eq!(bundle.nametables[1].tile(4, 4).unwrap(), 9);
    assert_eq!(bundle.nametables[1].selector(4, 4).unwrap(), 3);
    // The other nametable's stamps are untouched:
    assert_eq!(bundle.nametables[0].tile(0, 0).unwrap(), 1);

    // Delete metatile 1: instance cells empty out, higher indices shift.
    bundle.delete_metatile(1).unwrap();
    assert_eq!(bundle.nametables[0].provenance(0, 0).unwrap(), 0);
    assert_eq!(bundle.nametables[0].provenance(1, 0).unwrap(), EMPTY_METATILE);
    assert_eq!(bundle.nametables[1].provenance(2, 2).unwrap(), 1);
    assert_eq!(bundle.nametables[1].provenance(3, 3).unwrap(), 2);
    // Propagation still follows the shifted index:
    bundle.metatiles[1].tiles = [5, 5, 5, 5];
    bundle.propagate_metatile(1).unwrap();
    assert_eq!(bundle.nametables[1].tile(4, 4).unwrap(), 5);

    // Compose the world and shrink it.
    bundle.world.place_at(0, 0, 0).unwrap();
    bundle.world.place_at(5, 5, 1).unwrap();
    bundle.world.resize(4, 4);
    assert_eq!(bundle.world.at(0, 0).unwrap(), 0);
    assert!(bundle.world.at(5, 5).is_err());

    // Save, reload, and make sure nothing drifted.
    let bytes = persist::to_json(&bundle).unwrap();
    let loaded = persist::from_json(&bytes).unwrap();
    assert!(loaded.validate().is_empty());
    assert_eq!(loaded.nametables[1].tile(4, 4).unwrap(), 5);
    assert_eq!(loaded.nametables[0].provenance(1, 0).unwrap(), EMPTY_METATILE);
    assert_eq!(loaded.world.at(0, 0).unwrap(), 0);
    assert_eq!(loaded.palettes.color(0, 0).unwrap(), 0x0F);
}

// A bundle saved by an older editor build: no screens, no world, no
// attribute tables, palettes under their old ad hoc names.
#[test]
fn legacy_bundle_upgrade() {
    init_logging();
    let json = br#"{
        "tile_bank": [],
        "palettes": [
            {"name": "BG0", "colors": [13, 22, 38, 48]},
            {"name": "Main", "colors": [15, 1, 2, 3]}
        ],
        "nametables": [
            {"name": "Overworld", "data": []},
            {"name": "Cave"}
        ],
        "metatiles": [{"name": "Rock"}]
    }"#;
    let bundle = persist::from_json(json).unwrap();
    assert!(bundle.validate().is_empty());

    assert_eq!(bundle.palettes.palettes.len(), 8);
    assert_eq!(bundle.palettes.color(0, 1).unwrap(), 22);
    // The ad hoc "Main" palette is gone; SP3 got defaults.
    assert_eq!(bundle.palettes.palettes[7].name, "SP3");

    assert_eq!(bundle.nametables.len(), 2);
    assert_eq!(bundle.nametables[0].selector(31, 29).unwrap(), 0);
    assert_eq!(bundle.nametables[1].provenance(0, 0).unwrap(), EMPTY_METATILE);

    assert_eq!(bundle.metatiles[0].tiles, [0, 0, 0, 0]);
    assert!(bundle.screens.is_empty());
    assert_eq!(bundle.world.at(15, 15).unwrap(), WORLD_EMPTY);
}

// Screens resolve through the metatile list only at consumption time, so a
// cell may briefly dangle mid-edit; deletion reindexes it, load clears it.
#[test]
fn screen_references_survive_deletion() {
    init_logging();
    let mut bundle = AssetBundle::new();
    for _ in 0..3 {
        bundle.add_metatile();
    }
    let s = bundle.add_screen();
    bundle.screens[s].set_cell(0, 0, 0).unwrap();
    bundle.screens[s].set_cell(1, 0, 1).unwrap();
    bundle.screens[s].set_cell(2, 0, 2).unwrap();

    bundle.delete_metatile(0).unwrap();
    assert_eq!(bundle.screens[s].cell(0, 0).unwrap(), EMPTY_METATILE);
    assert_eq!(bundle.screens[s].cell(1, 0).unwrap(), 0);
    assert_eq!(bundle.screens[s].cell(2, 0).unwrap(), 1);
    assert!(bundle.validate().is_empty());
}
