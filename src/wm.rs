//! The top-level `Rdwm` window manager: owns every component and runs the
//! cooperative event dispatcher (§4.2, §5).

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use x11::xlib::{Window, XEvent, XNextEvent, XPending};

use crate::client::ClientTable;
use crate::config::Config;
use crate::decorator::Decorator;
use crate::display::DisplaySession;
use crate::error::WmError;
use crate::frame::FrameRegistry;
use crate::geometry::{Rect, ReservedArea, TilingParams};
use crate::input::InputState;
use crate::monitor::MonitorRegistry;

/// Guards against re-entrant shutdown; set once `run` exits normally.
static SHUTTING_DOWN: AtomicBool = AtomicBool::new(false);

pub struct Rdwm {
    pub session: DisplaySession,
    pub config: Config,
    pub decorator: Decorator,
    pub clients: ClientTable,
    pub frames: FrameRegistry,
    pub monitors: MonitorRegistry,
    pub workspace: usize,
    pub tiling_enabled: HashMap<usize, bool>,
    pub manual_strut: ReservedArea,
    pub reserved: ReservedArea,
    pub input: InputState,
    pub active: Option<Window>,
    pub shell_app_id: String,
    pub tiling_params: TilingParams,
    windows_changed: bool,
    monitors_changed: bool,
}

impl Rdwm {
    /// Instantiates the session and every component, failing fast on the
    /// two conditions §4.1/§7 call fatal.
    pub fn init() -> Result<Self, WmError> {
        let config = Config::get_config();
        let session = DisplaySession::open()?;
        let monitors = session.monitors();
        let decorator = Decorator::new(&config);
        let tiling_params = TilingParams {
            master_count: config.master_count(),
            master_fraction: config.master_fraction(),
            gap: config.gap(),
        };

        Ok(Rdwm {
            session,
            shell_app_id: config.shell_app_id(),
            config,
            decorator,
            clients: ClientTable::new(),
            frames: FrameRegistry::new(),
            monitors,
            workspace: 0,
            tiling_enabled: HashMap::new(),
            manual_strut: ReservedArea::default(),
            reserved: ReservedArea::default(),
            input: InputState::default(),
            active: None,
            tiling_params,
            windows_changed: false,
            monitors_changed: false,
        })
    }

    /// Begins the main event loop: drains every pending event whenever the
    /// server descriptor is readable (§4.2, §5).
    pub fn run(&mut self) {
        unsafe {
            x11::xlib::XSync(self.session.display, false as libc::c_int);
        }
        loop {
            if SHUTTING_DOWN.load(Ordering::SeqCst) {
                return;
            }
            self.drain_events();
        }
    }

    fn drain_events(&mut self) {
        unsafe {
            // Block for the next event, then drain everything else already queued.
            let mut event: XEvent = std::mem::zeroed();
            XNextEvent(self.session.display, &mut event);
            self.dispatch(&mut event);
            while XPending(self.session.display) > 0 {
                XNextEvent(self.session.display, &mut event);
                self.dispatch(&mut event);
            }
        }
        self.flush_notifications();
    }

    #[allow(non_upper_case_globals)]
    fn dispatch(&mut self, event: &mut XEvent) {
        use x11::xlib::*;
        unsafe {
            trace!("Dispatching event: {:?}", event.get_type());
            match event.get_type() {
                MapRequest => self.on_map_request(&event.map_request),
                UnmapNotify => self.on_unmap_notify(&event.unmap),
                DestroyNotify => self.on_destroy_notify(&event.destroy_window),
                ConfigureRequest => self.on_configure_request(&event.configure_request),
                ButtonPress => self.on_button_press(&event.button),
                ButtonRelease => self.on_button_release(&event.button),
                MotionNotify => self.on_motion_notify(&event.motion),
                PropertyNotify => self.on_property_notify(&event.property),
                Expose => self.on_expose(&event.expose),
                _ => {
                    if event.get_type() == self.session.randr_event_base
                        || event.get_type() == self.session.randr_event_base + 1
                    {
                        self.on_randr_event();
                    } else {
                        trace!("Unhandled event type: {:?}", event.get_type());
                    }
                }
            }
        }
    }

    fn on_expose(&mut self, event: &x11::xlib::XExposeEvent) {
        if event.count != 0 {
            return;
        }
        if let Some(frame) = self.frames.find_by_any(event.window) {
            let outer = frame.outer;
            self.repaint_titlebar(outer);
        }
    }

    fn on_randr_event(&mut self) {
        let snapshot = MonitorRegistry::enumerate(self.session.display);
        if self.monitors.refresh(snapshot) {
            self.monitors_changed = true;
            self.retile();
        }
    }

    pub(crate) fn repaint_titlebar(&mut self, outer: Window) {
        let title = self.clients.iter().find(|c| c.frame == Some(outer)).map(|c| c.title.clone()).unwrap_or_default();
        if let Some(frame) = self.frames.get(outer) {
            self.decorator.paint_titlebar(self.session.display, frame, &title);
        }
    }

    pub(crate) fn mark_windows_changed(&mut self) {
        self.windows_changed = true;
    }

    pub(crate) fn mark_monitors_changed(&mut self) {
        self.monitors_changed = true;
    }

    /// Fires the edge-triggered shell notifications at most once per drain
    /// (§5 "Ordering").
    fn flush_notifications(&mut self) {
        if self.windows_changed {
            debug!("window list changed");
            self.windows_changed = false;
        }
        if self.monitors_changed {
            debug!("monitor list changed");
            self.monitors_changed = false;
        }
    }

    /// Recomputes placement for every frame on the current workspace
    /// (§4.8). Floating frames are left untouched; tiled frames are laid
    /// out by the master/stack algorithm over the active monitor's work
    /// area.
    pub fn retile(&mut self) {
        let monitor_rect = self
            .monitors
            .primary()
            .map(|m| m.rect)
            .unwrap_or(Rect::new(0, 0, 1920, 1080));
        let work_area = monitor_rect.shrink(&self.reserved);

        let tiling_on = *self.tiling_enabled.get(&self.workspace).unwrap_or(&false);

        let frames = &self.frames;
        let mut outers: Vec<Window> = self
            .clients
            .on_workspace(self.workspace)
            .filter_map(|c| {
                let outer = c.frame?;
                let floating = frames.get(outer).map(|f| f.floating).unwrap_or(false);
                if c.is_tileable(floating) {
                    Some(outer)
                } else {
                    None
                }
            })
            .collect();

        if !tiling_on {
            // Restore standard decoration on exit from tiling (§4.8).
            for outer in outers.drain(..) {
                if let Some(frame) = self.frames.get_mut(outer) {
                    if frame.titlebar_height != crate::decorator::TITLE_HEIGHT {
                        frame.titlebar_height = crate::decorator::TITLE_HEIGHT;
                        self.reflow_client_area(outer);
                    }
                }
            }
            return;
        }

        outers.sort_by_key(|outer| {
            let r = self.frames.get(*outer).map(|f| f.rect).unwrap_or(Rect::new(0, 0, 0, 0));
            (r.x, r.y)
        });

        let rects = crate::geometry::tile(work_area, outers.len(), &self.tiling_params);

        for (outer, rect) in outers.into_iter().zip(rects.into_iter()) {
            if let Some(frame) = self.frames.get_mut(outer) {
                frame.titlebar_height = crate::decorator::TILING_TITLE_HEIGHT;
                frame.rect = rect;
            }
            self.apply_frame_geometry(outer, rect);
            self.reflow_client_area(outer);
        }
    }

    pub(crate) fn apply_frame_geometry(&mut self, outer: Window, rect: Rect) {
        unsafe {
            x11::xlib::XMoveResizeWindow(self.session.display, outer, rect.x, rect.y, rect.w.max(1), rect.h.max(1));
        }
    }

    /// Resizes the titlebar and client sub-windows to match the frame's
    /// current rect and titlebar height (shared by tiling, resize and
    /// fullscreen toggle).
    pub(crate) fn reflow_client_area(&mut self, outer: Window) {
        let (client, titlebar, rect, title_h, is_dock) = match self.frames.get(outer) {
            Some(f) => (f.client, f.titlebar, f.rect, f.titlebar_height, f.is_dock),
            None => return,
        };
        if is_dock {
            return;
        }
        unsafe {
            if titlebar != 0 {
                x11::xlib::XMoveResizeWindow(self.session.display, titlebar, 0, 0, rect.w.max(1), title_h);
            }
            let client_h = rect.h.saturating_sub(title_h).max(1);
            x11::xlib::XMoveResizeWindow(self.session.display, client, 0, title_h as i32, rect.w.max(1), client_h);
        }
        self.rebuild_buttons(outer);
        self.repaint_titlebar(outer);
    }

    pub(crate) fn rebuild_buttons(&mut self, outer: Window) {
        let (titlebar, width, is_dock) = match self.frames.get(outer) {
            Some(f) => (f.titlebar, f.rect.w, f.is_dock),
            None => return,
        };
        if is_dock || titlebar == 0 {
            return;
        }
        if let Some(frame) = self.frames.get_mut(outer) {
            for button in frame.buttons.drain(..) {
                let mut b = button;
                b.destroy(self.session.display);
            }
        }
        let buttons = self.decorator.create_buttons(self.session.display, titlebar, width);
        if let Some(frame) = self.frames.get_mut(outer) {
            frame.buttons = buttons;
        }
        self.frames.reindex_buttons(outer);
    }
}

impl Rdwm {
    /// Press state machine entry point (§4.7): a press on a button fires
    /// immediately, a press on the resize border begins resizing, a press
    /// on the titlebar begins dragging, and any other press on a managed
    /// window just raises and focuses it.
    fn on_button_press(&mut self, event: &x11::xlib::XButtonEvent) {
        let outer = match self.frames.find_by_any(event.window).map(|f| f.outer) {
            Some(o) => o,
            None => return,
        };
        if self.frames.get(outer).map(|f| f.is_dock).unwrap_or(true) {
            return;
        }

        if let Some(client_window) = self.client_window_for(outer) {
            self.activate(client_window);
        }

        if let Some(button_kind) = self.frames.get(outer).and_then(|f| {
            f.buttons.iter().find(|b| b.window == event.window).map(|b| b.kind)
        }) {
            self.fire_button(outer, button_kind);
            return;
        }

        let frame = match self.frames.get(outer) {
            Some(f) => f,
            None => return,
        };
        if event.window == frame.titlebar {
            self.input.begin_drag(outer, event.x_root, event.y_root, frame.rect.x, frame.rect.y);
            return;
        }
        if event.window == outer {
            let mask = crate::geometry::edge_mask(
                event.x,
                event.y,
                frame.rect.w,
                frame.rect.h,
                crate::decorator::RESIZE_BORDER,
            );
            if mask != 0 {
                self.input.begin_resize(outer, event.x_root, event.y_root, frame.rect, mask);
            }
        }
    }

    fn on_motion_notify(&mut self, event: &x11::xlib::XMotionEvent) {
        match self.input.interaction {
            crate::input::Interaction::Dragging { frame, start_root_x, start_root_y, start_x, start_y } => {
                let dx = event.x_root - start_root_x;
                let dy = event.y_root - start_root_y;
                let new_x = start_x + dx;
                let new_y = start_y + dy;
                if let Some(f) = self.frames.get_mut(frame) {
                    f.rect.x = new_x;
                    f.rect.y = new_y;
                }
                unsafe {
                    x11::xlib::XMoveWindow(self.session.display, frame, new_x, new_y);
                }
            }
            crate::input::Interaction::Resizing { frame, start_root_x, start_root_y, start_rect, mask } => {
                let dx = event.x_root - start_root_x;
                let dy = event.y_root - start_root_y;
                let title_h = self.frames.get(frame).map(|f| f.titlebar_height).unwrap_or(0);
                let rect = crate::geometry::apply_resize_delta(start_rect, mask, dx, dy, title_h);
                if let Some(f) = self.frames.get_mut(frame) {
                    f.rect = rect;
                }
                self.apply_frame_geometry(frame, rect);
                self.reflow_client_area(frame);
            }
            crate::input::Interaction::Idle => {
                self.update_idle_cursor(event);
            }
        }
    }

    fn on_button_release(&mut self, _event: &x11::xlib::XButtonEvent) {
        self.input.end();
    }

    /// Shows the matching resize cursor over an outer frame's border zone
    /// while idle (§4.7 "pick a cursor based on the edge mask").
    fn update_idle_cursor(&mut self, event: &x11::xlib::XMotionEvent) {
        let frame = match self.frames.find_by_any(event.window) {
            Some(f) if !f.is_dock && event.window == f.outer => f,
            _ => return,
        };
        let mask = crate::geometry::edge_mask(
            event.x,
            event.y,
            frame.rect.w,
            frame.rect.h,
            crate::decorator::RESIZE_BORDER,
        );
        let cursor = match crate::input::cursor_for_edge_mask(mask) {
            crate::input::CursorShape::Normal => self.session.cursors.normal,
            crate::input::CursorShape::Horizontal => self.session.cursors.horizontal,
            crate::input::CursorShape::Vertical => self.session.cursors.vertical,
            crate::input::CursorShape::NwSe => self.session.cursors.nw_se,
            crate::input::CursorShape::NeSw => self.session.cursors.ne_sw,
        };
        unsafe {
            x11::xlib::XDefineCursor(self.session.display, event.window, cursor);
        }
    }

    fn client_window_for(&self, outer: Window) -> Option<Window> {
        self.clients.iter().find(|c| c.frame == Some(outer)).map(|c| c.window)
    }

    fn fire_button(&mut self, outer: Window, kind: crate::frame::ButtonKind) {
        let client_window = match self.client_window_for(outer) {
            Some(w) => w,
            None => return,
        };
        match kind {
            crate::frame::ButtonKind::Close => {
                self.close(client_window);
            }
            crate::frame::ButtonKind::Maximize => {
                self.toggle_fullscreen(client_window);
            }
            crate::frame::ButtonKind::Minimize => {
                self.minimize(client_window);
            }
        }
    }
}

impl Drop for Rdwm {
    /// Closes every frame before the display session itself tears down
    /// (§4.1 "Shutdown closes all frames, frees cursors, closes the
    /// connection").
    fn drop(&mut self) {
        let outers: Vec<Window> = self.frames.iter().map(|f| f.outer).collect();
        for outer in outers {
            self.frames.remove_and_destroy(self.session.display, outer);
        }
        SHUTTING_DOWN.store(true, Ordering::SeqCst);
        info!("Rdwm shut down");
    }
}
