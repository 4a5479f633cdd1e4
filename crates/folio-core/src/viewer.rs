use crate::tree::ImageEntry;
use serde::Serialize;

pub const MIN_SCALE: f32 = 0.5;
pub const MAX_SCALE: f32 = 5.0;

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ZoomState {
    pub scale: f32,
    pub offset_x: f32,
    pub offset_y: f32,
}

impl Default for ZoomState {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset_x: 0.0,
            offset_y: 0.0,
        }
    }
}

/// State of the click-to-zoom overlay. One viewer is shared by every image
/// of a page, so at most one image is open at a time and page scrolling is
/// locked exactly while it is open.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ImageViewer {
    current: Option<ImageEntry>,
    zoom: ZoomState,
}

impl ImageViewer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shows `image`, replacing whatever was open. Returns the replaced image.
    pub fn open(&mut self, image: ImageEntry) -> Option<ImageEntry> {
        self.zoom = ZoomState::default();
        self.current.replace(image)
    }

    /// Returns false when nothing was open.
    pub fn close(&mut self) -> bool {
        self.zoom = ZoomState::default();
        self.current.take().is_some()
    }

    pub fn is_open(&self) -> bool {
        self.current.is_some()
    }

    pub fn scroll_locked(&self) -> bool {
        self.is_open()
    }

    pub fn current(&self) -> Option<&ImageEntry> {
        self.current.as_ref()
    }

    pub fn zoom(&self) -> ZoomState {
        self.zoom
    }

    /// Multiplies the scale by `factor`, clamped to `MIN_SCALE..=MAX_SCALE`.
    /// Ignored while closed or for non-positive factors.
    pub fn zoom_by(&mut self, factor: f32) {
        if !self.is_open() || factor <= 0.0 || !factor.is_finite() {
            return;
        }
        self.zoom.scale = (self.zoom.scale * factor).clamp(MIN_SCALE, MAX_SCALE);
        if self.zoom.scale <= 1.0 {
            self.zoom.offset_x = 0.0;
            self.zoom.offset_y = 0.0;
        }
    }

    /// Pans a magnified image. Ignored while closed or at scale 1 or below.
    pub fn pan_by(&mut self, dx: f32, dy: f32) {
        if !self.is_open() || self.zoom.scale <= 1.0 {
            return;
        }
        self.zoom.offset_x += dx;
        self.zoom.offset_y += dy;
    }

    pub fn reset(&mut self) {
        self.zoom = ZoomState::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(index: usize) -> ImageEntry {
        ImageEntry {
            index,
            src: format!("/img/{}.png", index),
            alt: String::new(),
        }
    }

    #[test]
    fn opening_locks_scroll_and_closing_restores_it() {
        let mut viewer = ImageViewer::new();
        assert!(!viewer.scroll_locked());
        viewer.open(entry(0));
        assert!(viewer.is_open());
        assert!(viewer.scroll_locked());
        assert!(viewer.close());
        assert!(!viewer.scroll_locked());
        assert!(!viewer.close());
    }

    #[test]
    fn second_open_replaces_the_first() {
        let mut viewer = ImageViewer::new();
        viewer.open(entry(0));
        viewer.zoom_by(2.0);
        let replaced = viewer.open(entry(1));
        assert_eq!(replaced, Some(entry(0)));
        assert_eq!(viewer.current(), Some(&entry(1)));
        assert_eq!(viewer.zoom(), ZoomState::default());
    }

    #[test]
    fn zoom_is_clamped() {
        let mut viewer = ImageViewer::new();
        viewer.open(entry(0));
        viewer.zoom_by(100.0);
        assert_eq!(viewer.zoom().scale, MAX_SCALE);
        viewer.zoom_by(0.0001);
        assert_eq!(viewer.zoom().scale, MIN_SCALE);
        viewer.zoom_by(-1.0);
        assert_eq!(viewer.zoom().scale, MIN_SCALE);
    }

    #[test]
    fn pan_requires_magnification() {
        let mut viewer = ImageViewer::new();
        viewer.open(entry(0));
        viewer.pan_by(10.0, 10.0);
        assert_eq!(viewer.zoom().offset_x, 0.0);
        viewer.zoom_by(2.0);
        viewer.pan_by(10.0, -5.0);
        assert_eq!(viewer.zoom().offset_x, 10.0);
        assert_eq!(viewer.zoom().offset_y, -5.0);
        viewer.reset();
        assert_eq!(viewer.zoom(), ZoomState::default());
    }

    #[test]
    fn closed_viewer_ignores_gestures() {
        let mut viewer = ImageViewer::new();
        viewer.zoom_by(2.0);
        viewer.pan_by(1.0, 1.0);
        assert_eq!(viewer.zoom(), ZoomState::default());
    }
}
