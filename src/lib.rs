//! Content-aware image shrinking.
//!
//! Instead of scaling an image down uniformly, this crate removes
//! "seams": connected paths of the least visually important pixels,
//! one per row or column.  Salient content keeps its proportions; the
//! boring parts between things quietly disappear.
//!
//! The usual entry point is [`CarveSession`], which owns the loaded
//! image and its carved derivative.  The pieces underneath, the
//! energy map and the [`SeamSolver`], are public for callers that
//! bring their own pixels.

mod ternary;

pub mod decode;
pub mod energy;
pub mod error;
pub mod grid;
pub mod notify;
pub mod pixelbuffer;
pub mod session;
pub mod solver;

pub use crate::error::CarveError;
pub use crate::grid::Orientation;
pub use crate::notify::SessionObserver;
pub use crate::pixelbuffer::{PixelBuffer, Px};
pub use crate::session::CarveSession;
pub use crate::solver::SeamSolver;
