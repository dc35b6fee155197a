//! Interned `_NET_WM_*` and `WM_*` atoms, resolved once against the display
//! connection at startup rather than re-interned on every property read.

use libc::c_int;
use x11::xlib::{Atom, Display, XInternAtom};

#[derive(Debug, Clone, Copy)]
pub struct Atoms {
    pub wm_name: Atom,
    pub wm_icon_name: Atom,
    pub wm_class: Atom,
    pub wm_protocols: Atom,
    pub wm_delete_window: Atom,
    pub net_wm_window_type: Atom,
    pub net_wm_window_type_dock: Atom,
    pub net_wm_strut_partial: Atom,
    pub net_wm_icon: Atom,
}

impl Atoms {
    pub fn intern(display: *mut Display) -> Self {
        let atom = |name: &str| -> Atom {
            let cname = std::ffi::CString::new(name).unwrap();
            unsafe { XInternAtom(display, cname.as_ptr(), false as c_int) }
        };

        Atoms {
            wm_name: atom("WM_NAME"),
            wm_icon_name: atom("WM_ICON_NAME"),
            wm_class: atom("WM_CLASS"),
            wm_protocols: atom("WM_PROTOCOLS"),
            wm_delete_window: atom("WM_DELETE_WINDOW"),
            net_wm_window_type: atom("_NET_WM_WINDOW_TYPE"),
            net_wm_window_type_dock: atom("_NET_WM_WINDOW_TYPE_DOCK"),
            net_wm_strut_partial: atom("_NET_WM_STRUT_PARTIAL"),
            net_wm_icon: atom("_NET_WM_ICON"),
        }
    }
}
