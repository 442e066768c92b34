// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Calculate the energy of an image.
//!
//! Energy approximates how visually important a pixel is, so the
//! solver knows what is cheap to remove.  The pipeline: decode each
//! channel from 8-bit sRGB to linear light, take the Rec.709 luma,
//! re-encode that to sRGB so differences are perceptually uniform,
//! then sum the absolute luma gradients along both axes.  Interior
//! pixels use central differences; border pixels double the single
//! available one-sided difference so edges are not systematically
//! cheaper than the interior.
//!
//! The finished map is normalized by its maximum, so every entry
//! lands in [0, 1] and the highest-contrast pixel is exactly 1.0.  A
//! perfectly flat image has no maximum to divide by and keeps all
//! zeroes.

use itertools::iproduct;
use num_traits::clamp;

use crate::cq;
use crate::grid::Orientation;
use crate::pixelbuffer::{PixelBuffer, Px};

fn srgb_to_linear(c: f32) -> f32 {
    cq!(c <= 0.04045, c / 12.92, ((c + 0.055) / 1.055).powf(2.4))
}

fn linear_to_srgb(c: f32) -> f32 {
    cq!(c <= 0.003_130_8, c * 12.92, 1.055 * c.powf(1.0 / 2.4) - 0.055)
}

/// Perceptual luma of one pixel: linearize, weight per Rec.709,
/// re-encode.  Black maps to 0.0 and white to 1.0.
fn luma(p: Px) -> f32 {
    let y = 0.2126 * srgb_to_linear(f32::from(p.r) / 255.0)
        + 0.7152 * srgb_to_linear(f32::from(p.g) / 255.0)
        + 0.0722 * srgb_to_linear(f32::from(p.b) / 255.0);
    linear_to_srgb(y)
}

/// Compute the energy of every pixel in the image, writing the
/// normalized result into the image's energy plane.
pub fn compute_energy(image: &mut PixelBuffer) {
    let (width, height) = (image.width(), image.height());
    debug_assert!(width > 1 && height > 1);
    let (mw, mh) = (width - 1, height - 1);
    let stride = image.stride() as usize;
    let at = |x: u32, y: u32| Orientation::Columns.offset(stride, y as usize, x as usize);

    // Luma plane first, in the same stride layout as the pixels, so
    // the gradient pass below only ever reads one flat buffer.
    let mut lumas = vec![0.0f32; image.energy().len()];
    for (y, x) in iproduct!(0..height, 0..width) {
        lumas[at(x, y)] = luma(image.px(x, y));
    }
    let l = |x: u32, y: u32| lumas[at(x, y)];

    let energy = image.energy_mut();
    let mut max = 0.0f32;
    for (y, x) in iproduct!(0..height, 0..width) {
        // The border cases double the one-sided difference; the
        // interior takes the centered pair at twice the neighbor
        // distance.  Corners combine both border rules.
        let dx = cq!(
            x == 0,
            2.0 * (l(1, y) - l(0, y)).abs(),
            cq!(
                x == mw,
                2.0 * (l(mw, y) - l(mw - 1, y)).abs(),
                (l(x + 1, y) - l(x - 1, y)).abs()
            )
        );
        let dy = cq!(
            y == 0,
            2.0 * (l(x, 1) - l(x, 0)).abs(),
            cq!(
                y == mh,
                2.0 * (l(x, mh) - l(x, mh - 1)).abs(),
                (l(x, y + 1) - l(x, y - 1)).abs()
            )
        );
        let e = dx + dy;
        max = cq!(e > max, e, max);
        energy[at(x, y)] = e;
    }

    // A flat image has max == 0; dividing would poison the plane with
    // NaNs, so it keeps its zeroes.
    if max > 0.0 {
        for (y, x) in iproduct!(0..height, 0..width) {
            energy[at(x, y)] /= max;
        }
    }
}

/// Render the energy plane as packed 8-bit grayscale rows, for
/// inspecting what the solver considers expensive.
pub fn energy_to_gray(image: &PixelBuffer) -> Vec<u8> {
    let mut out = Vec::with_capacity(image.width() as usize * image.height() as usize);
    for (y, x) in iproduct!(0..image.height(), 0..image.width()) {
        let scaled = (image.energy_at(x, y) * 255.0).round() as i32;
        out.push(clamp(scaled, 0, 255) as u8);
    }
    out
}
