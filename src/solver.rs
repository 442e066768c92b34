// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The seam removal engine.
//!
//! One dynamic program serves both carve directions.  The solver
//! walks "virtual rows" (the seam-length axis) and shortens "virtual
//! columns"; `Orientation` maps those coordinates onto the buffer, so
//! removing a column and removing a row are the same code under a
//! transposition.
//!
//! Removing a seam does not move pixel data.  A virtual index map
//! records, per virtual coordinate, which DP cell currently lives
//! there; pulling a seam out shifts one row segment of that map left
//! by a slot.  After each removal only the diagonal band of cells
//! whose cheapest path could have crossed the seam is re-solved; the
//! rest of the table keeps its costs and back-pointers.  When the
//! requested number of seams is out, a single compaction pass walks
//! the map once and writes the surviving pixels and energies into
//! their final positions.
//!
//! Tie-breaking is fixed in two places.  Among predecessor offsets,
//! straight up is tested first, then left, then right, and a
//! candidate must strictly improve to win, so equal-cost paths keep
//! the seam vertical.  Among last-row endpoints, the scan runs left
//! to right and replaces only on strict improvement, so the leftmost
//! minimum wins.

use log::debug;

use crate::grid::{Grid, Orientation};
use crate::pixelbuffer::PixelBuffer;

/// Per-cell state of the dynamic program, kept contiguous so the
/// forward pass stays cache-friendly.  `source` is the pixel's flat
/// offset in the image buffer and never changes while seams come out;
/// `parent` is the virtual-column delta (-1, 0, +1) to the
/// predecessor the cheapest path arrived through.
#[derive(Debug, Default, Copy, Clone)]
struct SeamCell {
    energy: f32,
    total: f32,
    source: u32,
    parent: i8,
}

/// Removes minimum-cost seams from an image along either axis.
///
/// The working tables live on the solver and are reused from call to
/// call, so a session that carves repeatedly settles on the largest
/// allocation it has needed and stops growing.
#[derive(Debug, Default)]
pub struct SeamSolver {
    /// DP cells in their initial identity layout; never reordered.
    cells: Vec<SeamCell>,
    /// (virtual column, virtual row) -> index into `cells`.
    map: Grid<u32>,
    /// Virtual-column index of the most recently extracted seam, one
    /// entry per virtual row.
    seam: Vec<usize>,
}

impl SeamSolver {
    pub fn new() -> Self {
        SeamSolver::default()
    }

    /// Remove `count` lowest-total-energy seams along `orientation`,
    /// compacting the image buffer and shrinking the carved dimension
    /// when done.  `count == 0` is a no-op.  The caller is
    /// responsible for keeping `count` below the current length of
    /// the axis being shortened; energies must already be computed.
    pub fn carve(&mut self, image: &mut PixelBuffer, orientation: Orientation, count: u32) {
        if count == 0 {
            return;
        }
        let (vrows, mut vcols) = orientation.virtual_dims(image.width(), image.height());
        debug_assert!((count as usize) < vcols);
        debug!(
            "removing {} seam(s) along {:?} from {}x{}",
            count,
            orientation,
            image.width(),
            image.height()
        );

        self.prepare(image, orientation, vrows, vcols);
        self.solve_full(vrows, vcols);

        let mut remaining = count as usize;
        loop {
            self.extract_seam(vrows, vcols);
            self.remove_seam(vrows, vcols);
            vcols -= 1;
            remaining -= 1;
            if remaining == 0 {
                break;
            }
            self.resolve_band(vrows, vcols);
        }

        self.compact(image, orientation, vrows, vcols);
    }

    #[inline]
    fn cell(&self, vrow: usize, vcol: usize) -> &SeamCell {
        &self.cells[self.map[(vcol, vrow)] as usize]
    }

    #[inline]
    fn cell_mut(&mut self, vrow: usize, vcol: usize) -> &mut SeamCell {
        let index = self.map[(vcol, vrow)] as usize;
        &mut self.cells[index]
    }

    /// Rebuild the index map as the identity and load each cell's
    /// energy and buffer offset from the image.
    fn prepare(&mut self, image: &PixelBuffer, orientation: Orientation, vrows: usize, vcols: usize) {
        let stride = image.stride() as usize;
        let energy = image.energy();

        self.map.reset(vcols, vrows);
        self.cells.clear();
        self.cells.reserve(vrows * vcols);
        for vrow in 0..vrows {
            for vcol in 0..vcols {
                let source = orientation.offset(stride, vrow, vcol);
                self.map[(vcol, vrow)] = self.cells.len() as u32;
                self.cells.push(SeamCell {
                    energy: energy[source],
                    total: 0.0,
                    source: source as u32,
                    parent: 0,
                });
            }
        }
    }

    /// One full forward pass over every cell.
    fn solve_full(&mut self, vrows: usize, vcols: usize) {
        for vcol in 0..vcols {
            let cell = self.cell_mut(0, vcol);
            cell.total = cell.energy;
            cell.parent = 0;
        }
        for vrow in 1..vrows {
            for vcol in 0..vcols {
                self.relax(vrow, vcol, vcols);
            }
        }
    }

    /// Recompute one cell's cost from the row above.  Offsets are
    /// tested straight-up first, then left, then right; only a strict
    /// improvement replaces the candidate.
    fn relax(&mut self, vrow: usize, vcol: usize, vcols: usize) {
        let mut best = self.cell(vrow - 1, vcol).total;
        let mut parent = 0i8;
        if vcol > 0 {
            let total = self.cell(vrow - 1, vcol - 1).total;
            if total < best {
                best = total;
                parent = -1;
            }
        }
        if vcol + 1 < vcols {
            let total = self.cell(vrow - 1, vcol + 1).total;
            if total < best {
                best = total;
                parent = 1;
            }
        }
        let cell = self.cell_mut(vrow, vcol);
        cell.total = cell.energy + best;
        cell.parent = parent;
    }

    /// Find the cheapest endpoint in the last virtual row and walk
    /// the back-pointers up to recover the whole seam.
    fn extract_seam(&mut self, vrows: usize, vcols: usize) {
        let last = vrows - 1;
        let mut best = 0;
        for vcol in 1..vcols {
            if self.cell(last, vcol).total < self.cell(last, best).total {
                best = vcol;
            }
        }

        self.seam.clear();
        self.seam.resize(vrows, 0);
        let mut vcol = best;
        for vrow in (0..vrows).rev() {
            self.seam[vrow] = vcol;
            vcol = (vcol as isize + isize::from(self.cell(vrow, vcol).parent)) as usize;
        }
    }

    /// Pull the extracted seam out of the index map.  Entries to the
    /// right of the seam shift left one slot, within their own row
    /// only; no pixel data moves.
    fn remove_seam(&mut self, vrows: usize, vcols: usize) {
        for vrow in 0..vrows {
            for vcol in self.seam[vrow]..vcols - 1 {
                let moved = self.map[(vcol + 1, vrow)];
                self.map[(vcol, vrow)] = moved;
            }
        }
    }

    /// Re-solve the diagonal band around the removed seam: at
    /// distance `d` rows from the top, columns `seam[d] - d ..=
    /// seam[d] + d`, clipped to the current bounds.  Costs and
    /// back-pointers outside the band still stand.
    fn resolve_band(&mut self, vrows: usize, vcols: usize) {
        for vrow in 0..vrows {
            let s = self.seam[vrow];
            let lo = s.saturating_sub(vrow);
            let hi = (s + vrow).min(vcols - 1);
            for vcol in lo..=hi {
                if vrow == 0 {
                    let cell = self.cell_mut(0, vcol);
                    cell.total = cell.energy;
                    cell.parent = 0;
                } else {
                    self.relax(vrow, vcol, vcols);
                }
            }
        }
    }

    /// Flush the index map into the image: copy every surviving pixel
    /// and energy entry to its compacted position and shrink the
    /// carved dimension.  Destination and source always share a
    /// virtual row and the source never precedes the destination, so
    /// nothing is read after being overwritten.
    fn compact(
        &self,
        image: &mut PixelBuffer,
        orientation: Orientation,
        vrows: usize,
        vcols: usize,
    ) {
        let stride = image.stride() as usize;
        {
            let pixels = image.pixels_mut();
            for vrow in 0..vrows {
                for vcol in 0..vcols {
                    let src = self.cell(vrow, vcol).source as usize;
                    let dst = orientation.offset(stride, vrow, vcol);
                    pixels[dst] = pixels[src];
                }
            }
        }
        {
            let energy = image.energy_mut();
            for vrow in 0..vrows {
                for vcol in 0..vcols {
                    let src = self.cell(vrow, vcol).source as usize;
                    let dst = orientation.offset(stride, vrow, vcol);
                    energy[dst] = energy[src];
                }
            }
        }
        image.shrink(orientation, vcols as u32);
    }
}
