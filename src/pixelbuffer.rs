// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Pixel and energy storage for one image.
//!
//! A `PixelBuffer` holds the decoded pixels of an image together with
//! the per-pixel energy plane the solver consumes.  The two buffers
//! share one layout: row-major, with a row stride that is fixed at
//! the width the image had when it was filled.  Carving shrinks the
//! logical `width`/`height` but never touches the stride, so no data
//! outside the removed seams has to move between carves; the slots
//! past `width` are scratch space, not image content.
//!
//! Allocations only ever grow.  Refilling or assigning a buffer
//! reuses whatever capacity is already there, so a session that
//! carves repeatedly settles on the largest size it has seen and
//! stops allocating.

use crate::cq;
use crate::grid::Orientation;

/// One pixel: 8-bit RGB, no alpha.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct Px {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Px {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Px { r, g, b }
    }
}

#[derive(Debug, Default, Clone)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    stride: u32,
    pixels: Vec<Px>,
    energy: Vec<f32>,
}

impl PixelBuffer {
    /// An empty, invalid buffer.  Becomes valid on the first `fill`.
    pub fn new() -> Self {
        PixelBuffer::default()
    }

    /// True if the buffer has dimensions and data.
    pub fn is_valid(&self) -> bool {
        self.width > 0 && self.height > 0 && !self.pixels.is_empty()
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Pixel slots per buffer row.  Fixed at fill time; stays put
    /// while `width` shrinks during carving.
    pub fn stride(&self) -> u32 {
        self.stride
    }

    /// Flat offset of a logical pixel coordinate.
    #[inline]
    pub fn offset(&self, x: u32, y: u32) -> usize {
        debug_assert!(x < self.stride && y < self.height);
        y as usize * self.stride as usize + x as usize
    }

    pub fn px(&self, x: u32, y: u32) -> Px {
        self.pixels[self.offset(x, y)]
    }

    pub fn set_px(&mut self, x: u32, y: u32, p: Px) {
        let index = self.offset(x, y);
        self.pixels[index] = p;
    }

    pub fn energy_at(&self, x: u32, y: u32) -> f32 {
        self.energy[self.offset(x, y)]
    }

    pub fn pixels(&self) -> &[Px] {
        &self.pixels
    }

    pub(crate) fn pixels_mut(&mut self) -> &mut [Px] {
        &mut self.pixels
    }

    pub fn energy(&self) -> &[f32] {
        &self.energy
    }

    pub(crate) fn energy_mut(&mut self) -> &mut [f32] {
        &mut self.energy
    }

    /// Replace the contents with a freshly decoded frame of packed
    /// RGB rows.  `bottom_up` flips the row order while copying, so
    /// the buffer always ends up top-to-bottom.  Existing capacity is
    /// reused; the energy plane is resized alongside and zeroed.
    pub fn fill(&mut self, width: u32, height: u32, rgb: &[u8], bottom_up: bool) {
        let row_bytes = width as usize * 3;
        debug_assert_eq!(rgb.len(), row_bytes * height as usize);

        self.width = width;
        self.height = height;
        self.stride = width;

        let len = width as usize * height as usize;
        self.pixels.clear();
        self.pixels.resize(len, Px::default());
        self.energy.clear();
        self.energy.resize(len, 0.0);

        for y in 0..height {
            let src_row = cq!(bottom_up, height - 1 - y, y) as usize;
            let src = &rgb[src_row * row_bytes..src_row * row_bytes + row_bytes];
            let dst_base = self.offset(0, y);
            for x in 0..width as usize {
                self.pixels[dst_base + x] = Px::new(src[3 * x], src[3 * x + 1], src[3 * x + 2]);
            }
        }
    }

    /// Deep copy from another buffer, reusing this buffer's
    /// allocations when they are large enough.
    pub fn assign_from(&mut self, src: &PixelBuffer) {
        self.width = src.width;
        self.height = src.height;
        self.stride = src.stride;
        self.pixels.clone_from(&src.pixels);
        self.energy.clone_from(&src.energy);
    }

    /// Shorten the axis a carve just compacted.
    pub(crate) fn shrink(&mut self, orientation: Orientation, minor: u32) {
        match orientation {
            Orientation::Columns => self.width = minor,
            Orientation::Rows => self.height = minor,
        }
    }

    /// The logical image as packed RGB rows (no stride padding),
    /// ready for an encoder.
    pub fn packed_rgb(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.width as usize * self.height as usize * 3);
        for y in 0..self.height {
            for x in 0..self.width {
                let p = self.px(x, y);
                out.push(p.r);
                out.push(p.g);
                out.push(p.b);
            }
        }
        out
    }
}
