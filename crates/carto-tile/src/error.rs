/// Errors produced when constructing tile coordinates.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TileIdError {
    #[error("zoom level {z} exceeds the maximum of {max}")]
    ZoomTooLarge { z: u8, max: u8 },

    #[error("tile {x}/{y} is out of range at zoom {z}")]
    OutOfRange { z: u8, x: u32, y: u32 },

    #[error("overscaled zoom {overscaled_z} is below canonical zoom {z}")]
    OverscaledBelowCanonical { overscaled_z: u8, z: u8 },
}
