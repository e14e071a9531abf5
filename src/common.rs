pub type TileIdx = u8; // Index into the 256-tile bank
pub type PaletteSel = u8; // 2-bit subpalette selector (0-3)
pub type SystemColor = u8; // Index into the 64-entry system color table
pub type MetatileIdx = i16; // Index into the metatile list, -1 = empty
pub type WorldCell = u8; // Index into the nametable list, 0xFF = empty

pub const TILE_SIZE: usize = 8; // Tile width/height in pixels
pub const TILE_BYTES: usize = 16; // Two 8-byte bitplanes per tile
pub const BANK_TILES: usize = 256;
pub const BANK_BYTES: usize = BANK_TILES * TILE_BYTES;

pub const NAMETABLE_WIDTH: usize = 32; // Tiles per row
pub const NAMETABLE_HEIGHT: usize = 30; // Tile rows
pub const NAMETABLE_TILES: usize = NAMETABLE_WIDTH * NAMETABLE_HEIGHT;
pub const ATTR_BYTES: usize = 64; // 8x8 grid of 4x4-tile blocks

pub const META_WIDTH: usize = 16; // Metatile columns per nametable/screen
pub const META_HEIGHT: usize = 15; // Metatile rows per nametable/screen
pub const META_CELLS: usize = META_WIDTH * META_HEIGHT;

pub const SUBPALETTE_COUNT: usize = 8; // 4 background + 4 sprite
pub const BG_SUBPALETTES: usize = 4;
pub const SUBPALETTE_SIZE: usize = 4;
pub const SYSTEM_COLOR_MASK: u8 = 0x3F;

pub const EMPTY_METATILE: MetatileIdx = -1;
pub const WORLD_EMPTY: WorldCell = 0xFF;
