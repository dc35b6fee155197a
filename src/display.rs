//! Display Session (§4.1): opens the server connection, claims substructure
//! redirection, wires up RandR, and hands back the pieces the rest of Rdwm
//! needs (root window, atoms, cursors, server fd).

use lazy_static::lazy_static;
use libc::c_int;
use std::sync::Mutex;
use x11::xlib::{
    Cursor, Display, PropertyChangeMask, SubstructureNotifyMask, SubstructureRedirectMask,
    XCloseDisplay, XCreateFontCursor, XDefaultRootWindow, XFreeCursor, XOpenDisplay, XSelectInput,
    XSetErrorHandler, XSync,
};
use x11::xrandr::{XRRQueryExtension, XRRSelectInput};

// The `x11` crate version pinned by Cargo.toml does not expose a `cursorfont`
// module. These are the standard X11 cursorfont.h glyph indices (fixed by
// the X protocol and unchanged across X11 versions), reproduced here so the
// lookup is still by name rather than magic number.
const XC_LEFT_PTR: libc::c_uint = 68;
const XC_SB_H_DOUBLE_ARROW: libc::c_uint = 108;
const XC_SB_V_DOUBLE_ARROW: libc::c_uint = 116;
const XC_TOP_LEFT_CORNER: libc::c_uint = 134;
const XC_TOP_RIGHT_CORNER: libc::c_uint = 136;

use crate::atoms::Atoms;
use crate::error::WmError;
use crate::monitor::MonitorRegistry;

lazy_static! {
    /// Set from inside the X error handler callback, which runs outside
    /// normal control flow and therefore cannot simply return a `Result`
    /// (§5 concurrency model).
    static ref WM_DETECTED: Mutex<bool> = Mutex::new(false);
}

#[derive(Debug, Clone, Copy)]
pub struct Cursors {
    pub normal: Cursor,
    pub horizontal: Cursor,
    pub vertical: Cursor,
    pub nw_se: Cursor,
    pub ne_sw: Cursor,
}

pub struct DisplaySession {
    pub display: *mut Display,
    pub root: x11::xlib::Window,
    pub atoms: Atoms,
    pub cursors: Cursors,
    pub randr_event_base: c_int,
}

impl DisplaySession {
    /// Opens the display, claims substructure redirection on the root
    /// window, and sets up RandR and cursors. Returns `AnotherWmRunning` if
    /// another client already holds the selection (§4.1, §7).
    pub fn open() -> Result<Self, WmError> {
        let display = unsafe { XOpenDisplay(std::ptr::null()) };
        if display.is_null() {
            return Err(WmError::DisplayOpenFailed);
        }

        let root = unsafe { XDefaultRootWindow(display) };

        *WM_DETECTED.lock().unwrap() = false;
        unsafe {
            XSetErrorHandler(Some(Self::on_wm_detected));
            XSelectInput(
                display,
                root,
                SubstructureRedirectMask | SubstructureNotifyMask | PropertyChangeMask,
            );
            XSync(display, false as c_int);
        }

        if *WM_DETECTED.lock().unwrap() {
            unsafe { XCloseDisplay(display) };
            return Err(WmError::AnotherWmRunning);
        }

        let atoms = Atoms::intern(display);

        let mut randr_event_base = 0;
        let mut randr_error_base = 0;
        let has_randr =
            unsafe { XRRQueryExtension(display, &mut randr_event_base, &mut randr_error_base) } != 0;
        if has_randr {
            unsafe {
                XRRSelectInput(display, root, MonitorRegistry::randr_event_mask());
            }
        } else {
            warn!("RandR extension not available; monitor tracking will use a single default monitor");
        }

        let cursors = Self::create_cursors(display)?;

        info!("Display session opened: display={:?} root={:?}", display, root);

        Ok(DisplaySession { display, root, atoms, cursors, randr_event_base })
    }

    fn create_cursors(display: *mut Display) -> Result<Cursors, WmError> {
        let cursor = |shape: u32, name: &'static str| -> Result<Cursor, WmError> {
            let c = unsafe { XCreateFontCursor(display, shape) };
            if c == 0 {
                Err(WmError::CursorCreateFailed(name))
            } else {
                Ok(c)
            }
        };

        Ok(Cursors {
            normal: cursor(XC_LEFT_PTR, "normal")?,
            horizontal: cursor(XC_SB_H_DOUBLE_ARROW, "horizontal")?,
            vertical: cursor(XC_SB_V_DOUBLE_ARROW, "vertical")?,
            nw_se: cursor(XC_TOP_LEFT_CORNER, "nw-se")?,
            ne_sw: cursor(XC_TOP_RIGHT_CORNER, "ne-sw")?,
        })
    }

    pub fn monitors(&self) -> MonitorRegistry {
        let mut registry = MonitorRegistry::default();
        registry.refresh(MonitorRegistry::enumerate(self.display));
        registry
    }

    /// The server's socket descriptor, to be handed to the outer event loop
    /// (§4.1, §5 "the only asynchronous source").
    pub fn connection_fd(&self) -> c_int {
        unsafe { x11::xlib::XConnectionNumber(self.display) }
    }

    unsafe extern "C" fn on_wm_detected(_display: *mut Display, event: *mut x11::xlib::XErrorEvent) -> c_int {
        error!("Another window manager is already running (error_code={})", (*event).error_code);
        *WM_DETECTED.lock().unwrap() = true;
        0
    }
}

impl Drop for DisplaySession {
    /// Closes all frames is the caller's responsibility (it owns the
    /// `FrameRegistry`); this only frees what the session itself created.
    fn drop(&mut self) {
        unsafe {
            XFreeCursor(self.display, self.cursors.normal);
            XFreeCursor(self.display, self.cursors.horizontal);
            XFreeCursor(self.display, self.cursors.vertical);
            XFreeCursor(self.display, self.cursors.nw_se);
            XFreeCursor(self.display, self.cursors.ne_sw);
            XCloseDisplay(self.display);
        }
        info!("Display session closed");
    }
}
