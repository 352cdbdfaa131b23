use std::cell::Cell;
use std::rc::Rc;

use eframe::egui::{Vec2, vec2};

/// Shared, live canvas size.
///
/// Clones observe the same size. Forces keep a clone and read the size at
/// tick time, so a resize is seen without rebuilding them.
#[derive(Clone, Debug, Default)]
pub struct Viewport {
    size: Rc<Cell<Option<Vec2>>>,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        let viewport = Self::default();
        viewport.set_size(width, height);
        viewport
    }

    /// A viewport with no render target attached yet.
    pub fn detached() -> Self {
        Self::default()
    }

    pub fn set_size(&self, width: f32, height: f32) {
        self.size.set(Some(vec2(width, height)));
    }

    /// Marks the render target as gone; ticks are skipped until a size is set.
    pub fn detach(&self) {
        self.size.set(None);
    }

    /// Current size, or `None` when detached or without area.
    pub fn size(&self) -> Option<Vec2> {
        self.size.get().filter(|size| {
            size.x.is_finite() && size.y.is_finite() && size.x > 0.0 && size.y > 0.0
        })
    }

    pub fn center(&self) -> Option<Vec2> {
        self.size().map(|size| size * 0.5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_live_size() {
        let viewport = Viewport::new(400.0, 300.0);
        let observer = viewport.clone();

        viewport.set_size(800.0, 600.0);
        assert_eq!(observer.size(), Some(vec2(800.0, 600.0)));
        assert_eq!(observer.center(), Some(vec2(400.0, 300.0)));
    }

    #[test]
    fn degenerate_or_detached_sizes_read_as_missing() {
        let viewport = Viewport::new(0.0, 300.0);
        assert_eq!(viewport.size(), None);

        viewport.set_size(f32::NAN, 10.0);
        assert_eq!(viewport.size(), None);

        viewport.set_size(10.0, 10.0);
        viewport.detach();
        assert_eq!(viewport.size(), None);
        assert_eq!(Viewport::detached().center(), None);
    }
}
