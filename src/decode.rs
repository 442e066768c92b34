// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! The decoder boundary.
//!
//! The carving core does not care where pixels come from; it asks a
//! `Decoder` for a packed RGB-24 frame and a row order, and
//! normalizes bottom-up frames itself.  The stock implementation
//! rides on the `image` codec registry; tests substitute their own.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::CarveError;

/// Row order of a decoded frame.  Some codecs hand back the bottom
/// scanline first; the session flips those while copying.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum RowOrder {
    TopDown,
    BottomUp,
}

/// A decoded RGB-24 frame: packed rows, 3 bytes per pixel, no
/// padding.
#[derive(Debug, Clone)]
pub struct Decoded {
    pub width: u32,
    pub height: u32,
    pub order: RowOrder,
    pub rgb: Vec<u8>,
}

pub trait Decoder {
    /// Cheap format check.  Must not decode pixel data.
    fn probe(&self, path: &Path) -> bool;

    /// Decode the whole file.
    fn decode(&self, path: &Path) -> Result<Decoded, CarveError>;
}

/// Decoder backed by the `image` crate.  Probing sniffs the file's
/// magic bytes first and only falls back to the extension when the
/// signature is unrecognized, the same order the original codec
/// registry tried.
#[derive(Debug, Default)]
pub struct ImageDecoder;

impl Decoder for ImageDecoder {
    fn probe(&self, path: &Path) -> bool {
        let mut head = [0u8; 32];
        if let Ok(mut file) = File::open(path) {
            if let Ok(n) = file.read(&mut head) {
                if image::guess_format(&head[..n]).is_ok() {
                    return true;
                }
            }
        }
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) => match ext.to_ascii_lowercase().as_str() {
                "png" | "jpg" | "jpeg" | "bmp" | "gif" | "ico" | "tga" | "tif" | "tiff"
                | "pnm" | "pbm" | "pgm" | "ppm" | "webp" => true,
                _ => false,
            },
            None => false,
        }
    }

    fn decode(&self, path: &Path) -> Result<Decoded, CarveError> {
        let dynimg = image::open(path).map_err(|e| CarveError::decode(path, e))?;
        let rgb = dynimg.to_rgb();
        let (width, height) = (rgb.width(), rgb.height());
        Ok(Decoded {
            width,
            height,
            order: RowOrder::TopDown,
            rgb: rgb.into_raw(),
        })
    }
}
