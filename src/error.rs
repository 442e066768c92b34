//! Typed failures for the load and carve operations.
//!
//! Everything that can go wrong is reported from the operation that
//! detects it; the energy and solver internals assume pre-validated
//! input and never fail.

use std::fmt::Display;
use std::path::Path;

use failure::Fail;

/// Ceiling on `width * height` for a loadable image: half the
/// maximum signed 32-bit value, leaving headroom for the solver's
/// index arithmetic.
pub const MAX_PIXELS: u64 = (i32::max_value() as u64) / 2;

#[derive(Debug, Fail)]
pub enum CarveError {
    /// The file is malformed, unsupported, or unreadable.
    #[fail(display = "failed to decode {}: {}", path, reason)]
    Decode { path: String, reason: String },

    /// Carving needs at least two pixels on each axis.
    #[fail(
        display = "image is too small to carve ({}x{}); both sides must be at least 2 pixels",
        width, height
    )]
    TooSmall { width: u32, height: u32 },

    /// The pixel count would overflow the solver's index space.
    #[fail(
        display = "image is too large ({}x{} exceeds the limit of {} pixels)",
        width, height, limit
    )]
    TooLarge { width: u32, height: u32, limit: u64 },

    /// The requested target size cannot be carved to.
    #[fail(
        display = "cannot carve to {}x{}; both target dimensions must be at least 1",
        width, height
    )]
    InvalidCarveRequest { width: u32, height: u32 },
}

impl CarveError {
    pub(crate) fn decode(path: &Path, reason: impl Display) -> Self {
        CarveError::Decode {
            path: path.display().to_string(),
            reason: reason.to_string(),
        }
    }
}
