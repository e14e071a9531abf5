use thiserror::Error;

/// Error type for model operations.
///
/// Single-cell operations fail with `Index` or `Range` rather than clamping;
/// the editors are expected to have validated interactively. `Shape` is
/// reported by validation and repaired (not raised) by the load path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModelError {
    /// Collection index out of bounds (tile, subpalette, nametable, metatile, screen)
    #[error("{kind} index {index} out of bounds (len {len})")]
    Index {
        kind: &'static str,
        index: usize,
        len: usize,
    },
    /// Coordinate outside a fixed grid
    #[error("{kind} coordinate ({x}, {y}) outside {width}x{height}")]
    Range {
        kind: &'static str,
        x: i32,
        y: i32,
        width: usize,
        height: usize,
    },
    /// A fixed-length array has the wrong length
    #[error("{kind} has length {found}, expected {expected}")]
    Shape {
        kind: &'static str,
        expected: usize,
        found: usize,
    },
}

pub type Result<T> = std::result::Result<T, ModelError>;
