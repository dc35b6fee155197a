//! Frame Registry (§3 "Frame", §4 component 5) and the scoped handle
//! wrappers that replace the ad-hoc cleanup of the original `X11Frame`
//! (§9 "raw server-side handles... map to scoped handle wrappers").

use std::collections::HashMap;
use x11::xft::{XftColor, XftDraw, XftFont};
use x11::xlib::{Display, Window, GC};

use crate::geometry::Rect;
use crate::strut::Strut;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonKind {
    Close,
    Maximize,
    Minimize,
}

/// One titlebar button (§3 "Button"). Recreated on every titlebar width
/// change, so it deliberately carries no heavyweight resources beyond its
/// own draw handle.
pub struct Button {
    pub kind: ButtonKind,
    pub window: Window,
    pub rect: Rect,
    pub colour: u64,
    pub draw: *mut XftDraw,
}

impl Button {
    /// Frees the button's draw handle and destroys its window. Safe to call
    /// on a button that failed partway through construction, matching the
    /// frame destruction contract in §4.5.
    pub fn destroy(&mut self, display: *mut Display) {
        if display.is_null() {
            return;
        }
        unsafe {
            if !self.draw.is_null() {
                x11::xft::XftDrawDestroy(self.draw);
                self.draw = std::ptr::null_mut();
            }
            if self.window != 0 {
                x11::xlib::XDestroyWindow(display, self.window);
                self.window = 0;
            }
        }
    }
}

/// One decorated (or dock-form) client (§3 "Frame").
pub struct Frame {
    pub client: Window,
    pub outer: Window,
    pub titlebar: Window,
    pub gc: GC,
    pub font: *mut XftFont,
    pub draw: *mut XftDraw,
    pub text_colour: XftColor,
    pub buttons: Vec<Button>,
    pub icon: Option<IconPixmap>,
    pub rect: Rect,
    pub saved_rect: Rect,
    pub fullscreen: bool,
    pub floating: bool,
    pub is_dock: bool,
    pub strut: Strut,
    pub titlebar_height: u32,
}

pub struct IconPixmap {
    pub pixmap: x11::xlib::Pixmap,
    pub width: u32,
    pub height: u32,
}

impl Frame {
    /// Destroys every server-side resource the frame owns. Must be safe to
    /// call repeatedly and on a partially-constructed frame (§4.5, §5).
    pub fn destroy(&mut self, display: *mut Display) {
        for button in self.buttons.iter_mut() {
            button.destroy(display);
        }
        self.buttons.clear();

        if display.is_null() {
            self.icon = None;
            return;
        }

        unsafe {
            if let Some(icon) = self.icon.take() {
                x11::xlib::XFreePixmap(display, icon.pixmap);
            }

            if !self.draw.is_null() {
                x11::xft::XftDrawDestroy(self.draw);
                self.draw = std::ptr::null_mut();
            }
            if !self.font.is_null() {
                x11::xft::XftFontClose(display, self.font);
                self.font = std::ptr::null_mut();
            }
            if self.gc as usize != 0 {
                x11::xlib::XFreeGC(display, self.gc);
            }

            if !self.is_dock {
                if self.titlebar != 0 {
                    x11::xlib::XDestroyWindow(display, self.titlebar);
                }
                if self.outer != 0 {
                    // The server unparents the client back to the root automatically.
                    x11::xlib::XDestroyWindow(display, self.outer);
                }
            }
        }
    }

    /// Every server window ID this frame should resolve back to itself, for
    /// the Frame Registry invariant in §8.
    pub fn owned_windows(&self) -> Vec<Window> {
        let mut windows = vec![self.outer, self.titlebar, self.client];
        windows.extend(self.buttons.iter().map(|b| b.window));
        windows
    }
}

/// Maps every server window ID a `Frame` owns back to that same frame
/// (§3 "Frame Registry"). Frames are stored by their outer window, the
/// stable key used for geometry and lifecycle operations.
#[derive(Default)]
pub struct FrameRegistry {
    frames: HashMap<Window, Frame>,
    lookup: HashMap<Window, Window>, // any owned window -> frame.outer
}

impl FrameRegistry {
    pub fn new() -> Self {
        FrameRegistry { frames: HashMap::new(), lookup: HashMap::new() }
    }

    pub fn insert(&mut self, frame: Frame) {
        let key = frame.outer;
        for w in frame.owned_windows() {
            self.lookup.insert(w, key);
        }
        self.frames.insert(key, frame);
    }

    /// Re-registers a frame's buttons after a rebuild (§4.5 "Recreated on
    /// every titlebar width change").
    pub fn reindex_buttons(&mut self, outer: Window) {
        if let Some(frame) = self.frames.get(&outer) {
            for b in &frame.buttons {
                self.lookup.insert(b.window, outer);
            }
        }
    }

    pub fn find_by_any(&self, window: Window) -> Option<&Frame> {
        self.lookup.get(&window).and_then(|outer| self.frames.get(outer))
    }

    pub fn find_by_any_mut(&mut self, window: Window) -> Option<&mut Frame> {
        let outer = *self.lookup.get(&window)?;
        self.frames.get_mut(&outer)
    }

    pub fn get(&self, outer: Window) -> Option<&Frame> {
        self.frames.get(&outer)
    }

    pub fn get_mut(&mut self, outer: Window) -> Option<&mut Frame> {
        self.frames.get_mut(&outer)
    }

    /// Removes a frame and every window it owns from the lookup table, then
    /// destroys its server-side resources (§4.5 "Remove every owned server
    /// window ID from the Frame Registry first").
    pub fn remove_and_destroy(&mut self, display: *mut Display, outer: Window) {
        if let Some(mut frame) = self.frames.remove(&outer) {
            for w in frame.owned_windows() {
                self.lookup.remove(&w);
            }
            frame.destroy(display);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Frame> {
        self.frames.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Frame> {
        self.frames.values_mut()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bare_frame(outer: Window, client: Window) -> Frame {
        Frame {
            client,
            outer,
            titlebar: outer + 1,
            gc: std::ptr::null_mut(),
            font: std::ptr::null_mut(),
            draw: std::ptr::null_mut(),
            text_colour: unsafe { std::mem::zeroed() },
            buttons: Vec::new(),
            icon: None,
            rect: Rect::new(0, 0, 100, 100),
            saved_rect: Rect::new(0, 0, 100, 100),
            fullscreen: false,
            floating: false,
            is_dock: false,
            strut: Strut::default(),
            titlebar_height: 24,
        }
    }

    #[test]
    fn registry_resolves_every_owned_window_to_same_frame() {
        let mut registry = FrameRegistry::new();
        registry.insert(bare_frame(10, 12));
        assert_eq!(registry.find_by_any(10).unwrap().outer, 10);
        assert_eq!(registry.find_by_any(11).unwrap().outer, 10); // titlebar
        assert_eq!(registry.find_by_any(12).unwrap().outer, 10); // client
    }

    #[test]
    fn removing_a_frame_drops_every_lookup_entry() {
        let mut registry = FrameRegistry::new();
        registry.insert(bare_frame(10, 12));
        registry.remove_and_destroy(std::ptr::null_mut(), 10);
        assert!(registry.find_by_any(10).is_none());
        assert!(registry.find_by_any(11).is_none());
        assert!(registry.find_by_any(12).is_none());
    }
}
