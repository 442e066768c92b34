// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Image ownership and carve orchestration.
//!
//! A `CarveSession` owns two images: `original`, replaced wholesale
//! by each successful load and never touched otherwise, and `active`,
//! derived from the original by seam removal.  While nothing has been
//! carved the original doubles as the active image.  Carving only
//! ever shrinks the active image; a request that would grow either
//! dimension starts over from a fresh copy of the original and carves
//! down from there.  Re-carving from scratch costs a little but can
//! never disagree with what an "undo" would have produced.
//!
//! All work happens synchronously on the caller's thread: a load or a
//! carve runs to completion before returning, and listeners hear
//! about it only after it has succeeded.

use std::path::Path;
use std::rc::Rc;

use log::{debug, info};

use crate::cq;
use crate::decode::{Decoder, ImageDecoder, RowOrder};
use crate::energy::compute_energy;
use crate::error::{CarveError, MAX_PIXELS};
use crate::grid::Orientation;
use crate::notify::{Observable, SessionObserver};
use crate::pixelbuffer::PixelBuffer;
use crate::solver::SeamSolver;

pub struct CarveSession {
    original: PixelBuffer,
    active: PixelBuffer,
    seam_modified: bool,
    solver: SeamSolver,
    decoder: Box<dyn Decoder>,
    observers: Observable<dyn SessionObserver>,
}

impl CarveSession {
    pub fn new() -> Self {
        CarveSession::with_decoder(Box::new(ImageDecoder))
    }

    pub fn with_decoder(decoder: Box<dyn Decoder>) -> Self {
        CarveSession {
            original: PixelBuffer::new(),
            active: PixelBuffer::new(),
            seam_modified: false,
            solver: SeamSolver::new(),
            decoder,
            observers: Observable::new(),
        }
    }

    pub fn register_observer(&mut self, observer: Rc<dyn SessionObserver>) {
        self.observers.register(observer);
    }

    pub fn unregister_observer(&mut self, observer: &Rc<dyn SessionObserver>) {
        self.observers.unregister(observer);
    }

    /// True if the file looks like an image we can load.  Asks the
    /// decoder for a format sniff; no pixel data is read.
    pub fn accepts(&self, path: &Path) -> bool {
        self.decoder.probe(path)
    }

    /// Decode `path` into the original slot, compute its energy, and
    /// tell the listeners.  On failure the previous images, carved or
    /// not, stay exactly as they were and no event fires.
    pub fn load(&mut self, path: &Path) -> Result<(), CarveError> {
        let decoded = self.decoder.decode(path)?;
        if decoded.width <= 1 || decoded.height <= 1 {
            return Err(CarveError::TooSmall {
                width: decoded.width,
                height: decoded.height,
            });
        }
        if u64::from(decoded.width) * u64::from(decoded.height) > MAX_PIXELS {
            return Err(CarveError::TooLarge {
                width: decoded.width,
                height: decoded.height,
                limit: MAX_PIXELS,
            });
        }

        self.original.fill(
            decoded.width,
            decoded.height,
            &decoded.rgb,
            decoded.order == RowOrder::BottomUp,
        );
        compute_energy(&mut self.original);
        self.seam_modified = false;

        info!(
            "loaded {} ({}x{})",
            path.display(),
            decoded.width,
            decoded.height
        );
        self.observers.notify(|o| o.on_image_change());
        Ok(())
    }

    /// The image to display: the carved one when a carve is in
    /// effect, the original otherwise.
    pub fn active_image(&self) -> &PixelBuffer {
        cq!(self.seam_modified, &self.active, &self.original)
    }

    /// The image as loaded, untouched by carving.
    pub fn original_image(&self) -> &PixelBuffer {
        &self.original
    }

    pub fn is_seam_modified(&self) -> bool {
        self.seam_modified
    }

    /// Carve the active image to exactly `target_width` x
    /// `target_height`, columns first, then rows.  Targets beyond the
    /// original's size are clamped to it, so an oversized request
    /// degenerates to restoring the original.  If either target
    /// exceeds the current active size, carving restarts from a fresh
    /// copy of the original.  A request for the size the active image
    /// already has changes nothing and notifies no one.
    pub fn carve_to(&mut self, target_width: u32, target_height: u32) -> Result<(), CarveError> {
        if target_width == 0 || target_height == 0 || !self.original.is_valid() {
            return Err(CarveError::InvalidCarveRequest {
                width: target_width,
                height: target_height,
            });
        }
        let width = target_width.min(self.original.width());
        let height = target_height.min(self.original.height());

        {
            let active = self.active_image();
            if active.width() == width && active.height() == height {
                return Ok(());
            }
        }

        if !self.seam_modified || width > self.active.width() || height > self.active.height() {
            self.active.assign_from(&self.original);
            self.seam_modified = true;
        }

        let columns = self.active.width() - width;
        let rows = self.active.height() - height;
        debug!(
            "carving to {}x{}: {} column seam(s), {} row seam(s)",
            width, height, columns, rows
        );
        self.solver
            .carve(&mut self.active, Orientation::Columns, columns);
        self.solver.carve(&mut self.active, Orientation::Rows, rows);

        self.observers.notify(|o| o.on_image_seamed());
        Ok(())
    }
}

impl Default for CarveSession {
    fn default() -> Self {
        CarveSession::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::Decoded;
    use crate::pixelbuffer::Px;
    use std::cell::{Cell, RefCell};

    #[derive(Default)]
    struct StubState {
        width: Cell<u32>,
        height: Cell<u32>,
        bottom_up: Cell<bool>,
        fail: Cell<bool>,
        rgb: RefCell<Vec<u8>>,
    }

    struct StubDecoder(Rc<StubState>);

    impl Decoder for StubDecoder {
        fn probe(&self, _path: &Path) -> bool {
            !self.0.fail.get()
        }

        fn decode(&self, path: &Path) -> Result<Decoded, CarveError> {
            if self.0.fail.get() {
                return Err(CarveError::decode(path, "stub refused"));
            }
            Ok(Decoded {
                width: self.0.width.get(),
                height: self.0.height.get(),
                order: cq!(self.0.bottom_up.get(), RowOrder::BottomUp, RowOrder::TopDown),
                rgb: self.0.rgb.borrow().clone(),
            })
        }
    }

    fn rgb_of(width: u32, height: u32, pick: impl Fn(u32, u32) -> Px) -> Vec<u8> {
        let mut rgb = Vec::new();
        for y in 0..height {
            for x in 0..width {
                let p = pick(x, y);
                rgb.extend_from_slice(&[p.r, p.g, p.b]);
            }
        }
        rgb
    }

    fn noise(x: u32, y: u32) -> Px {
        let v = ((x * 31 + y * 47) % 239) as u8;
        Px::new(v, v.wrapping_mul(5), v.wrapping_add(17))
    }

    fn stub_session(width: u32, height: u32, pick: impl Fn(u32, u32) -> Px) -> (CarveSession, Rc<StubState>) {
        let state = Rc::new(StubState::default());
        state.width.set(width);
        state.height.set(height);
        *state.rgb.borrow_mut() = rgb_of(width, height, pick);
        let session = CarveSession::with_decoder(Box::new(StubDecoder(state.clone())));
        (session, state)
    }

    #[derive(Default)]
    struct Counter {
        changes: Cell<u32>,
        seams: Cell<u32>,
    }

    impl SessionObserver for Counter {
        fn on_image_change(&self) {
            self.changes.set(self.changes.get() + 1);
        }

        fn on_image_seamed(&self) {
            self.seams.set(self.seams.get() + 1);
        }
    }

    #[test]
    fn accepts_delegates_to_the_decoder_probe() {
        let (session, state) = stub_session(2, 2, noise);
        assert!(session.accepts(Path::new("anything")));
        state.fail.set(true);
        assert!(!session.accepts(Path::new("anything")));
    }

    #[test]
    fn load_rejects_slivers_but_takes_two_by_two() {
        let (mut session, state) = stub_session(1, 5, noise);
        match session.load(Path::new("sliver")) {
            Err(CarveError::TooSmall { width: 1, height: 5 }) => {}
            other => panic!("expected TooSmall, got {:?}", other),
        }

        state.width.set(5);
        state.height.set(1);
        *state.rgb.borrow_mut() = rgb_of(5, 1, noise);
        assert!(match session.load(Path::new("sliver")) {
            Err(CarveError::TooSmall { .. }) => true,
            _ => false,
        });

        state.width.set(2);
        state.height.set(2);
        *state.rgb.borrow_mut() = rgb_of(2, 2, noise);
        assert!(session.load(Path::new("tiny")).is_ok());
        assert!(session.original_image().is_valid());
    }

    #[test]
    fn load_rejects_an_oversized_pixel_count() {
        // Dimensions are validated before any pixels are copied, so
        // the stub does not need to fabricate six gigabytes of data.
        let state = Rc::new(StubState::default());
        state.width.set(65_536);
        state.height.set(32_768);
        let mut session = CarveSession::with_decoder(Box::new(StubDecoder(state)));
        match session.load(Path::new("huge")) {
            Err(CarveError::TooLarge { limit, .. }) => assert_eq!(limit, MAX_PIXELS),
            other => panic!("expected TooLarge, got {:?}", other),
        }
    }

    #[test]
    fn failed_load_keeps_the_previous_image_and_fires_nothing() {
        let (mut session, state) = stub_session(4, 4, noise);
        let counter = Rc::new(Counter::default());
        session.register_observer(counter.clone());

        session.load(Path::new("first")).unwrap();
        assert_eq!(counter.changes.get(), 1);
        let before = session.original_image().packed_rgb();

        state.fail.set(true);
        assert!(session.load(Path::new("second")).is_err());
        assert_eq!(counter.changes.get(), 1);
        assert_eq!(session.original_image().packed_rgb(), before);
        assert_eq!(session.active_image().width(), 4);
    }

    #[test]
    fn bottom_up_frames_are_flipped_at_load() {
        let (mut session, state) = stub_session(2, 2, |x, y| Px::new((10 * y + x) as u8, 0, 0));
        state.bottom_up.set(true);
        session.load(Path::new("flipped")).unwrap();
        // Source row 1 must land on top.
        assert_eq!(session.original_image().px(0, 0), Px::new(10, 0, 0));
        assert_eq!(session.original_image().px(1, 1), Px::new(1, 0, 0));
    }

    #[test]
    fn carve_to_reaches_the_exact_target() {
        let (mut session, _) = stub_session(6, 5, noise);
        let counter = Rc::new(Counter::default());
        session.register_observer(counter.clone());
        session.load(Path::new("img")).unwrap();

        session.carve_to(4, 3).unwrap();
        assert!(session.is_seam_modified());
        assert_eq!(session.active_image().width(), 4);
        assert_eq!(session.active_image().height(), 3);
        // The original is untouched.
        assert_eq!(session.original_image().width(), 6);
        assert_eq!(session.original_image().height(), 5);
        assert_eq!(counter.seams.get(), 1);
    }

    #[test]
    fn repeating_a_carve_is_a_silent_no_op() {
        let (mut session, _) = stub_session(6, 5, noise);
        let counter = Rc::new(Counter::default());
        session.register_observer(counter.clone());
        session.load(Path::new("img")).unwrap();

        session.carve_to(4, 3).unwrap();
        let first = session.active_image().packed_rgb();
        session.carve_to(4, 3).unwrap();
        assert_eq!(session.active_image().packed_rgb(), first);
        assert_eq!(counter.seams.get(), 1);
    }

    #[test]
    fn growing_re_derives_from_the_original() {
        let (mut session, _) = stub_session(5, 4, noise);
        session.load(Path::new("img")).unwrap();
        session.carve_to(2, 3).unwrap();
        session.carve_to(3, 3).unwrap();
        let grown_then_carved = session.active_image().packed_rgb();

        let (mut fresh, _) = stub_session(5, 4, noise);
        fresh.load(Path::new("img")).unwrap();
        fresh.carve_to(3, 3).unwrap();
        assert_eq!(fresh.active_image().packed_rgb(), grown_then_carved);
    }

    #[test]
    fn an_oversized_target_restores_the_original() {
        let (mut session, _) = stub_session(5, 4, noise);
        session.load(Path::new("img")).unwrap();
        session.carve_to(3, 3).unwrap();
        session.carve_to(99, 99).unwrap();
        assert!(session.is_seam_modified());
        assert_eq!(session.active_image().width(), 5);
        assert_eq!(session.active_image().height(), 4);
        assert_eq!(
            session.active_image().packed_rgb(),
            session.original_image().packed_rgb()
        );
    }

    #[test]
    fn carving_an_empty_session_is_invalid() {
        let (mut session, _) = stub_session(4, 4, noise);
        assert!(match session.carve_to(2, 2) {
            Err(CarveError::InvalidCarveRequest { .. }) => true,
            _ => false,
        });
    }

    #[test]
    fn a_zero_target_is_invalid_and_fires_nothing() {
        let (mut session, _) = stub_session(4, 4, noise);
        let counter = Rc::new(Counter::default());
        session.register_observer(counter.clone());
        session.load(Path::new("img")).unwrap();
        assert!(session.carve_to(0, 3).is_err());
        assert!(session.carve_to(3, 0).is_err());
        assert_eq!(counter.seams.get(), 0);
    }

    #[test]
    fn unregistered_observers_hear_nothing_more() {
        let (mut session, _) = stub_session(4, 4, noise);
        let counter = Rc::new(Counter::default());
        let handle: Rc<dyn SessionObserver> = counter.clone();
        session.register_observer(handle.clone());

        session.load(Path::new("img")).unwrap();
        assert_eq!(counter.changes.get(), 1);

        session.unregister_observer(&handle);
        session.load(Path::new("img")).unwrap();
        assert_eq!(counter.changes.get(), 1);
    }
}
