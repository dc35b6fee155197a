//! Client Admission / Protocol Adapter (§4.6): turns raw X11 events and
//! properties into `Client`/`Frame` state, and carries out the handful of
//! operations the shell and input layers trigger (close, minimize, activate,
//! fullscreen toggle).

use libc::{c_int, c_long, c_uchar};
use x11::xlib::{
    AnyPropertyType, ClientMessage, ClientMessageData, CurrentTime, NoEventMask,
    RevertToPointerRoot, Window, XClientMessageEvent, XConfigureRequestEvent,
    XConfigureWindow, XDestroyWindowEvent, XEvent, XFetchName, XFree,
    XGetClassHint, XGetWindowProperty, XIconifyWindow, XMapRequestEvent, XPropertyEvent,
    XRaiseWindow, XSendEvent, XSetInputFocus, XSizeHints, XUnmapEvent,
};

use crate::client::{Client, ClientFlags, ClientState};
use crate::geometry::{Rect, ReservedArea};
use crate::shell::{self, Command, CommandResult, WindowRecord};
use crate::strut::{self, Strut};
use crate::wm::Rdwm;

const DEFAULT_CLIENT_WIDTH: u32 = 800;
const DEFAULT_CLIENT_HEIGHT: u32 = 600;

impl Rdwm {
    /// Runs the admission flow against a freshly mapped top-level window
    /// (§4.6 "MapRequest"). Steps follow the numbering used throughout this module's docs.
    pub(crate) fn on_map_request(&mut self, event: &XMapRequestEvent) {
        let window = event.window;

        // 1. override-redirect windows manage themselves; just map them.
        let attrs = unsafe {
            let mut attrs = std::mem::zeroed();
            x11::xlib::XGetWindowAttributes(self.session.display, window, &mut attrs);
            attrs
        };
        if attrs.override_redirect != 0 {
            unsafe { x11::xlib::XMapWindow(self.session.display, window) };
            return;
        }

        if self.clients.contains(window) {
            return;
        }

        // 2. allocate the Client record.
        let mut client = Client::new(window, self.workspace);
        client.title = self.read_wm_name(window);
        client.icon_name = self.read_wm_icon_name(window);
        client.app_id = self.read_wm_class(window);

        // 4. the shell's own top-levels are admitted but never decorated.
        if client.app_id.eq_ignore_ascii_case(&self.shell_app_id) {
            client.flags |= ClientFlags::UNDECORATED;
            self.clients.insert(client);
            unsafe { x11::xlib::XMapWindow(self.session.display, window) };
            self.mark_windows_changed();
            return;
        }

        let (w, h) = self.read_requested_size(window, attrs.width as u32, attrs.height as u32);

        // 5. dock classification.
        let strut = self.read_strut(window);
        if self.is_dock_window(window, &strut) {
            client.flags |= ClientFlags::DOCK;
            let fallback = Rect::new(attrs.x, attrs.y, w, h);
            let rect = self.dock_rect_for(&strut).unwrap_or(fallback);
            let frame = self.decorator.create_dock_frame(window, rect, strut);
            let outer = frame.outer;
            self.frames.insert(frame);
            client.frame = Some(outer);
            self.clients.insert(client);
            self.recompute_struts();
            unsafe { x11::xlib::XMapWindow(self.session.display, window) };
            self.mark_windows_changed();
            self.retile();
            return;
        }

        // 6. ordinary top-level: build a decorated frame at the default placement.
        let content = Rect::new(100, 100, w, h);
        let frame = self.decorator.create_frame(self.session.display, self.session.root, window, content);
        let outer = frame.outer;
        client.frame = Some(outer);

        let raw_icon = self.read_icon_words(window);
        let icon = self.decorator.load_icon(self.session.display, frame.titlebar, &raw_icon);

        self.frames.insert(frame);
        let floating = self.is_fixed_size_window(window);
        if let Some(f) = self.frames.get_mut(outer) {
            f.icon = icon;
            f.floating = floating;
        }
        let buttons = self.decorator.create_buttons(self.session.display, self.frames.get(outer).unwrap().titlebar, content.w);
        if let Some(f) = self.frames.get_mut(outer) {
            f.buttons = buttons;
        }
        self.frames.reindex_buttons(outer);

        self.clients.insert(client);
        self.active = Some(window);
        unsafe {
            x11::xlib::XSetInputFocus(self.session.display, window, RevertToPointerRoot, CurrentTime);
        }

        // 7. notify and retile.
        self.repaint_titlebar(outer);
        self.mark_windows_changed();
        self.retile();
    }

    /// Passes the requested geometry straight through to `XConfigureWindow`
    /// (§4.6 "ConfigureRequest"): there is no independent placement policy
    /// for unmanaged or floating geometry changes, only the tiler overrides it.
    pub(crate) fn on_configure_request(&mut self, event: &XConfigureRequestEvent) {
        let mut changes: x11::xlib::XWindowChanges = unsafe { std::mem::zeroed() };
        changes.x = event.x;
        changes.y = event.y;
        changes.width = event.width;
        changes.height = event.height;
        changes.border_width = event.border_width;
        changes.sibling = event.above;
        changes.stack_mode = event.detail;

        unsafe {
            XConfigureWindow(self.session.display, event.window, event.value_mask as libc::c_uint, &mut changes);
        }

        if let Some(frame) = self.frames.find_by_any_mut(event.window) {
            if frame.client == event.window && !frame.is_dock {
                frame.rect.w = event.width.max(1) as u32;
                frame.rect.h = (event.height + crate::decorator::TITLE_HEIGHT as c_int).max(1) as u32;
            }
        }
    }

    pub(crate) fn on_unmap_notify(&mut self, event: &XUnmapEvent) {
        self.withdraw_client(event.window);
    }

    pub(crate) fn on_destroy_notify(&mut self, event: &XDestroyWindowEvent) {
        self.withdraw_client(event.window);
    }

    fn withdraw_client(&mut self, window: Window) {
        let removed = self.clients.remove(window);
        if let Some(client) = removed {
            if let Some(outer) = client.frame {
                self.input.abort_if_target(outer);
                self.frames.remove_and_destroy(self.session.display, outer);
                if client.is_dock() {
                    self.recompute_struts();
                }
            }
            if self.active == Some(window) {
                self.active = None;
            }
            self.mark_windows_changed();
            self.retile();
        }
    }

    pub(crate) fn on_property_notify(&mut self, event: &XPropertyEvent) {
        if !self.clients.contains(event.window) {
            return;
        }
        if event.atom == self.session.atoms.wm_name {
            let title = self.read_wm_name(event.window);
            if let Some(client) = self.clients.get_mut(event.window) {
                client.title = title;
            }
            if let Some(outer) = self.clients.get(event.window).and_then(|c| c.frame) {
                self.repaint_titlebar(outer);
            }
            self.mark_windows_changed();
        } else if event.atom == self.session.atoms.net_wm_strut_partial {
            let strut = self.read_strut(event.window);
            if let Some(outer) = self.clients.get(event.window).and_then(|c| c.frame) {
                if let Some(frame) = self.frames.get_mut(outer) {
                    frame.strut = strut;
                }
            }
            self.recompute_struts();
            self.retile();
        } else if event.atom == self.session.atoms.wm_icon_name {
            let icon_name = self.read_wm_icon_name(event.window);
            if let Some(client) = self.clients.get_mut(event.window) {
                client.icon_name = icon_name;
            }
            self.mark_windows_changed();
        } else if event.atom == self.session.atoms.wm_class {
            // §4.6 step 3: WM_CLASS.res_class feeds app_id, which the shell's
            // self-window filter (shell.rs) keys off of.
            let app_id = self.read_wm_class(event.window);
            if let Some(client) = self.clients.get_mut(event.window) {
                client.app_id = app_id;
            }
            self.mark_windows_changed();
        } else if event.atom == self.session.atoms.net_wm_window_type {
            // Re-run dock classification (§4.4): a window can gain or lose
            // the dock type atom after admission.
            let strut = self.read_strut(event.window);
            let is_dock = self.is_dock_window(event.window, &strut);
            if let Some(client) = self.clients.get_mut(event.window) {
                if is_dock {
                    client.flags |= ClientFlags::DOCK;
                } else {
                    client.flags -= ClientFlags::DOCK;
                }
            }
            if let Some(outer) = self.clients.get(event.window).and_then(|c| c.frame) {
                if let Some(frame) = self.frames.get_mut(outer) {
                    frame.is_dock = is_dock;
                    frame.strut = strut;
                }
            }
            self.recompute_struts();
            self.mark_windows_changed();
            self.retile();
        }
    }

    // -- shell-facing operations (§4.6, §6) -----------------------------

    /// Sends the `WM_DELETE_WINDOW` client message if the client advertises
    /// it, otherwise leaves the window alone (§4.6 "close").
    pub fn close(&mut self, window: Window) -> bool {
        if !self.supports_delete(window) {
            return false;
        }
        let mut data = ClientMessageData::new();
        data.set_long(0, self.session.atoms.wm_delete_window as c_long);
        data.set_long(1, CurrentTime as c_long);

        let mut event = XClientMessageEvent {
            type_: ClientMessage,
            serial: 0,
            send_event: 1,
            display: self.session.display,
            window,
            message_type: self.session.atoms.wm_protocols,
            format: 32,
            data,
        };
        unsafe {
            XSendEvent(
                self.session.display,
                window,
                0,
                NoEventMask,
                &mut event as *mut XClientMessageEvent as *mut XEvent,
            );
        }
        true
    }

    /// Unmaps the frame and marks the client minimized (§4.6 "minimize").
    pub fn minimize(&mut self, window: Window) -> bool {
        let outer = match self.clients.get(window).and_then(|c| c.frame) {
            Some(o) => o,
            None => return false,
        };
        unsafe {
            XIconifyWindow(self.session.display, window, x11::xlib::XDefaultScreen(self.session.display));
            x11::xlib::XUnmapWindow(self.session.display, outer);
        }
        if let Some(client) = self.clients.get_mut(window) {
            client.state = ClientState::Minimized;
        }
        if self.active == Some(window) {
            self.active = None;
        }
        self.mark_windows_changed();
        self.retile();
        true
    }

    /// Raises and focuses a client, remapping it first if it was minimized
    /// (§4.6 "activate").
    pub fn activate(&mut self, window: Window) -> bool {
        let outer = match self.clients.get(window).and_then(|c| c.frame) {
            Some(o) => o,
            None => return false,
        };
        let was_minimized = self.clients.get(window).map(|c| c.state == ClientState::Minimized).unwrap_or(false);
        unsafe {
            if was_minimized {
                x11::xlib::XMapWindow(self.session.display, outer);
            }
            XRaiseWindow(self.session.display, outer);
            XSetInputFocus(self.session.display, window, RevertToPointerRoot, CurrentTime);
        }
        if let Some(client) = self.clients.get_mut(window) {
            if client.state == ClientState::Minimized {
                client.state = ClientState::Normal;
            }
        }
        self.active = Some(window);
        self.mark_windows_changed();
        true
    }

    /// Toggles fullscreen: saves the current rect on entry, restores it on
    /// exit, and ignores reserved struts while fullscreen (§4.6, §3 "Frame").
    pub fn toggle_fullscreen(&mut self, window: Window) -> bool {
        let outer = match self.clients.get(window).and_then(|c| c.frame) {
            Some(o) => o,
            None => return false,
        };
        let monitor_rect = self.monitors.primary().map(|m| m.rect).unwrap_or(Rect::new(0, 0, 1920, 1080));

        let now_fullscreen = match self.frames.get_mut(outer) {
            Some(frame) => {
                if frame.fullscreen {
                    frame.rect = frame.saved_rect;
                    frame.fullscreen = false;
                    frame.titlebar_height = crate::decorator::TITLE_HEIGHT;
                } else {
                    frame.saved_rect = frame.rect;
                    frame.rect = monitor_rect;
                    frame.fullscreen = true;
                    frame.titlebar_height = crate::decorator::TITLE_HEIGHT;
                }
                frame.fullscreen
            }
            None => return false,
        };

        if let Some(client) = self.clients.get_mut(window) {
            if now_fullscreen {
                client.flags |= ClientFlags::FULLSCREEN;
            } else {
                client.flags -= ClientFlags::FULLSCREEN;
            }
        }

        let rect = self.frames.get(outer).unwrap().rect;
        self.apply_frame_geometry(outer, rect);
        self.reflow_client_area(outer);
        true
    }

    /// Dispatches one shell command (§6), returning `Rejected` only for the
    /// window-targeted variants when the target is no longer tracked.
    pub fn handle_command(&mut self, cmd: Command) -> CommandResult {
        match cmd {
            Command::ListWindows | Command::ListMonitors => CommandResult::Ok,
            Command::Activate(window) => {
                let tracked = self.clients.contains(window);
                let ok = tracked && self.activate(window);
                self.result_of(ok)
            }
            Command::Close(window) => {
                let tracked = self.clients.contains(window);
                let ok = tracked && self.close(window);
                self.result_of(ok)
            }
            Command::Minimize(window) => {
                let tracked = self.clients.contains(window);
                let ok = tracked && self.minimize(window);
                self.result_of(ok)
            }
            Command::ToggleTiling => {
                let current = *self.tiling_enabled.get(&self.workspace).unwrap_or(&false);
                self.tiling_enabled.insert(self.workspace, !current);
                self.retile();
                CommandResult::Ok
            }
            Command::SetManualStrut { top, bottom, left, right } => {
                self.manual_strut = ReservedArea { top, bottom, left, right };
                self.recompute_struts();
                self.retile();
                CommandResult::Ok
            }
            Command::SetWorkspace(workspace) => {
                self.workspace = workspace;
                self.retile();
                CommandResult::Ok
            }
        }
    }

    fn result_of(&self, ok: bool) -> CommandResult {
        if ok {
            CommandResult::Ok
        } else {
            CommandResult::Rejected
        }
    }

    /// Renders the read-only window list the shell observes (§4.9, §6).
    pub fn list_windows(&self) -> Vec<WindowRecord> {
        shell::window_list(&self.clients, self.active, &self.shell_app_id)
    }

    /// Renders the read-only monitor list the shell observes (§4.9, §6).
    pub fn list_monitors(&self) -> Vec<crate::monitor::Monitor> {
        shell::monitor_list(&self.monitors)
    }

    // -- property readers -------------------------------------------------

    fn read_wm_name(&self, window: Window) -> String {
        unsafe {
            let mut name_ptr: *mut i8 = std::ptr::null_mut();
            let status = XFetchName(self.session.display, window, &mut name_ptr);
            if status != 0 && !name_ptr.is_null() {
                let s = std::ffi::CStr::from_ptr(name_ptr).to_string_lossy().into_owned();
                XFree(name_ptr as *mut libc::c_void);
                s
            } else {
                String::new()
            }
        }
    }

    fn read_wm_icon_name(&self, window: Window) -> String {
        unsafe {
            let mut name_ptr: *mut i8 = std::ptr::null_mut();
            let status = x11::xlib::XGetIconName(self.session.display, window, &mut name_ptr);
            if status != 0 && !name_ptr.is_null() {
                let s = std::ffi::CStr::from_ptr(name_ptr).to_string_lossy().into_owned();
                XFree(name_ptr as *mut libc::c_void);
                s
            } else {
                String::new()
            }
        }
    }

    fn read_wm_class(&self, window: Window) -> String {
        unsafe {
            let mut class_hint: x11::xlib::XClassHint = std::mem::zeroed();
            let status = XGetClassHint(self.session.display, window, &mut class_hint);
            if status != 0 {
                let app_id = if !class_hint.res_class.is_null() {
                    std::ffi::CStr::from_ptr(class_hint.res_class).to_string_lossy().into_owned()
                } else {
                    String::new()
                };
                if !class_hint.res_name.is_null() {
                    XFree(class_hint.res_name as *mut libc::c_void);
                }
                if !class_hint.res_class.is_null() {
                    XFree(class_hint.res_class as *mut libc::c_void);
                }
                app_id
            } else {
                String::new()
            }
        }
    }

    /// §4.6 step 6: `WM_NORMAL_HINTS` if provided, else the window's current
    /// attributes, else a fixed 800x600 default.
    fn read_requested_size(&self, window: Window, attr_w: u32, attr_h: u32) -> (u32, u32) {
        unsafe {
            let mut hints: XSizeHints = std::mem::zeroed();
            let mut supplied: c_long = 0;
            let ok = x11::xlib::XGetWMNormalHints(self.session.display, window, &mut hints, &mut supplied);
            if ok != 0 && hints.width > 0 && hints.height > 0 {
                return (hints.width as u32, hints.height as u32);
            }
        }
        if attr_w > 0 && attr_h > 0 {
            (attr_w, attr_h)
        } else {
            (DEFAULT_CLIENT_WIDTH, DEFAULT_CLIENT_HEIGHT)
        }
    }

    /// A window whose `WM_NORMAL_HINTS` pin min size to max size (a dialog
    /// or fixed-size utility window) starts out of the tiling grid (§3
    /// "Frame... floating-vs-tiled flag").
    fn is_fixed_size_window(&self, window: Window) -> bool {
        unsafe {
            let mut hints: XSizeHints = std::mem::zeroed();
            let mut supplied: c_long = 0;
            let ok = x11::xlib::XGetWMNormalHints(self.session.display, window, &mut hints, &mut supplied);
            if ok == 0 {
                return false;
            }
            let has_both = hints.flags & (x11::xlib::PMinSize | x11::xlib::PMaxSize)
                == (x11::xlib::PMinSize | x11::xlib::PMaxSize);
            has_both
                && hints.min_width > 0
                && hints.min_width == hints.max_width
                && hints.min_height == hints.max_height
        }
    }

    /// A window is a Dock if it carries the dock type atom, or if it
    /// advertises a non-zero strut without one (a window can reserve
    /// screen space without naming itself `_NET_WM_WINDOW_TYPE_DOCK`).
    fn is_dock_window(&self, window: Window, strut: &Strut) -> bool {
        let words = self.read_cardinal_property(window, self.session.atoms.net_wm_window_type);
        let has_dock_type = words.iter().any(|&w| w as x11::xlib::Atom == self.session.atoms.net_wm_window_type_dock);
        has_dock_type || !strut.is_zero()
    }

    fn read_strut(&self, window: Window) -> Strut {
        let words = self.read_cardinal_property(window, self.session.atoms.net_wm_strut_partial);
        Strut::from_cardinals(&words)
    }

    fn read_icon_words(&self, window: Window) -> Vec<u32> {
        self.read_cardinal_property(window, self.session.atoms.net_wm_icon)
    }

    fn read_cardinal_property(&self, window: Window, atom: x11::xlib::Atom) -> Vec<u32> {
        unsafe {
            let mut actual_type = 0;
            let mut actual_format = 0;
            let mut nitems: libc::c_ulong = 0;
            let mut bytes_after: libc::c_ulong = 0;
            let mut data: *mut c_uchar = std::ptr::null_mut();

            let status = XGetWindowProperty(
                self.session.display,
                window,
                atom,
                0,
                i64::MAX as c_long,
                0,
                AnyPropertyType as u64,
                &mut actual_type,
                &mut actual_format,
                &mut nitems,
                &mut bytes_after,
                &mut data,
            );

            if status != 0 || data.is_null() || nitems == 0 {
                return Vec::new();
            }

            let slice = std::slice::from_raw_parts(data as *const u32, nitems as usize);
            let words = slice.to_vec();
            XFree(data as *mut libc::c_void);
            words
        }
    }

    fn supports_delete(&self, window: Window) -> bool {
        unsafe {
            let mut protocols: *mut x11::xlib::Atom = std::ptr::null_mut();
            let mut count: c_int = 0;
            let ok = x11::xlib::XGetWMProtocols(self.session.display, window, &mut protocols, &mut count);
            if ok == 0 || protocols.is_null() {
                return false;
            }
            let slice = std::slice::from_raw_parts(protocols, count as usize);
            let supports = slice.iter().any(|&a| a == self.session.atoms.wm_delete_window);
            XFree(protocols as *mut libc::c_void);
            supports
        }
    }

    fn dock_rect_for(&self, strut: &Strut) -> Option<Rect> {
        let monitor_rect = self.monitors.primary().map(|m| m.rect)?;
        strut::dock_rect(monitor_rect, strut, &self.reserved)
    }

    /// Recomputes the global reserved area from every mapped dock's strut
    /// plus the manual reservation, then applies it (§4.4).
    pub(crate) fn recompute_struts(&mut self) {
        let docks: Vec<Strut> = self
            .frames
            .iter()
            .filter(|f| f.is_dock)
            .map(|f| f.strut)
            .collect();
        self.reserved = strut::reserved_area(&docks, self.manual_strut);
    }
}
