//! Input & Interaction (§4.7): pointer-driven focus, drag, resize and
//! button activation. The edge/clamp arithmetic lives in `geometry`; this
//! module only tracks the cooperative state machine and dispatches the
//! resulting X calls.

use x11::xlib::Window;

use crate::geometry::Rect;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interaction {
    Idle,
    Dragging { frame: Window, start_root_x: i32, start_root_y: i32, start_x: i32, start_y: i32 },
    Resizing { frame: Window, start_root_x: i32, start_root_y: i32, start_rect: Rect, mask: u8 },
}

impl Default for Interaction {
    fn default() -> Self {
        Interaction::Idle
    }
}

/// Tracks the single cooperative pointer state machine described in §4.9
/// ("Idle -> Dragging", "Idle -> Resizing", both exiting on release).
#[derive(Default)]
pub struct InputState {
    pub interaction: Interaction,
}

impl InputState {
    pub fn begin_drag(&mut self, frame: Window, root_x: i32, root_y: i32, frame_x: i32, frame_y: i32) {
        self.interaction = Interaction::Dragging {
            frame,
            start_root_x: root_x,
            start_root_y: root_y,
            start_x: frame_x,
            start_y: frame_y,
        };
    }

    pub fn begin_resize(&mut self, frame: Window, root_x: i32, root_y: i32, start_rect: Rect, mask: u8) {
        self.interaction = Interaction::Resizing {
            frame,
            start_root_x: root_x,
            start_root_y: root_y,
            start_rect,
            mask,
        };
    }

    pub fn end(&mut self) {
        self.interaction = Interaction::Idle;
    }

    pub fn is_active(&self) -> bool {
        !matches!(self.interaction, Interaction::Idle)
    }

    /// Drops interaction state referring to a frame that no longer exists
    /// (§5 "Cancellation": detected on the next motion, aborted silently).
    pub fn abort_if_target(&mut self, frame: Window) {
        let stale = match self.interaction {
            Interaction::Dragging { frame: f, .. } => f == frame,
            Interaction::Resizing { frame: f, .. } => f == frame,
            Interaction::Idle => false,
        };
        if stale {
            self.end();
        }
    }
}

/// A pointer cursor shape chosen from the edge mask under the pointer while
/// idle (§4.7 "pick a cursor based on the edge mask").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorShape {
    Normal,
    Horizontal,
    Vertical,
    NwSe,
    NeSw,
}

pub fn cursor_for_edge_mask(mask: u8) -> CursorShape {
    use crate::geometry::{EDGE_BOTTOM, EDGE_LEFT, EDGE_RIGHT, EDGE_TOP};
    match mask {
        m if m == EDGE_LEFT | EDGE_TOP || m == EDGE_RIGHT | EDGE_BOTTOM => CursorShape::NwSe,
        m if m == EDGE_RIGHT | EDGE_TOP || m == EDGE_LEFT | EDGE_BOTTOM => CursorShape::NeSw,
        m if m == EDGE_LEFT || m == EDGE_RIGHT => CursorShape::Horizontal,
        m if m == EDGE_TOP || m == EDGE_BOTTOM => CursorShape::Vertical,
        0 => CursorShape::Normal,
        _ => CursorShape::Normal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{EDGE_LEFT, EDGE_RIGHT, EDGE_TOP, EDGE_BOTTOM};

    #[test]
    fn drag_then_release_returns_to_idle() {
        let mut state = InputState::default();
        state.begin_drag(1, 0, 0, 10, 10);
        assert!(state.is_active());
        state.end();
        assert!(!state.is_active());
    }

    #[test]
    fn abort_only_clears_matching_target() {
        let mut state = InputState::default();
        state.begin_drag(1, 0, 0, 10, 10);
        state.abort_if_target(2);
        assert!(state.is_active());
        state.abort_if_target(1);
        assert!(!state.is_active());
    }

    #[test]
    fn corner_masks_pick_diagonal_cursors() {
        assert_eq!(cursor_for_edge_mask(EDGE_LEFT | EDGE_TOP), CursorShape::NwSe);
        assert_eq!(cursor_for_edge_mask(EDGE_RIGHT | EDGE_TOP), CursorShape::NeSw);
        assert_eq!(cursor_for_edge_mask(EDGE_LEFT), CursorShape::Horizontal);
        assert_eq!(cursor_for_edge_mask(EDGE_TOP | EDGE_BOTTOM), CursorShape::Normal);
    }
}
