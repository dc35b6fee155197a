//! Monitor Registry (§4.3): RandR output enumeration with a single-monitor
//! fallback, published as an immutable snapshot.

use libc::c_int;
use x11::xlib::{Display, XDefaultScreen, XDisplayHeight, XDisplayWidth, XRootWindow};
use x11::xrandr::{
    RRCrtc, RROutput, XRRCrtcInfo, XRRFreeCrtcInfo, XRRFreeOutputInfo, XRRFreeScreenResources,
    XRRGetCrtcInfo, XRRGetOutputInfo, XRRGetOutputPrimary, XRRGetScreenResourcesCurrent,
    XRROutputInfo, RR_Connected,
};

use crate::geometry::Rect;

#[derive(Debug, Clone, PartialEq)]
pub struct Monitor {
    pub name: String,
    pub rect: Rect,
    pub primary: bool,
}

/// An immutable snapshot of the currently connected monitors (§3 "Monitor").
#[derive(Debug, Clone, Default)]
pub struct MonitorRegistry {
    monitors: Vec<Monitor>,
}

impl MonitorRegistry {
    pub fn monitors(&self) -> &[Monitor] {
        &self.monitors
    }

    pub fn primary(&self) -> Option<&Monitor> {
        self.monitors.iter().find(|m| m.primary).or_else(|| self.monitors.first())
    }

    /// Replaces the snapshot atomically and returns whether anything changed,
    /// so the caller can decide whether to emit a "monitors changed" event.
    pub fn refresh(&mut self, monitors: Vec<Monitor>) -> bool {
        let changed = self.monitors != monitors;
        self.monitors = monitors;
        changed
    }

    /// Enumerates connected RandR outputs with an attached CRTC. Falls back
    /// to a single monitor covering the default screen when RandR is
    /// unavailable or reports nothing (§4.3).
    pub fn enumerate(display: *mut Display) -> Vec<Monitor> {
        let screen = unsafe { XDefaultScreen(display) };
        let root = unsafe { XRootWindow(display, screen) };
        let fallback = || {
            vec![Monitor {
                name: "default".to_string(),
                rect: Rect::new(
                    0,
                    0,
                    unsafe { XDisplayWidth(display, screen) } as u32,
                    unsafe { XDisplayHeight(display, screen) } as u32,
                ),
                primary: true,
            }]
        };

        let resources = unsafe { XRRGetScreenResourcesCurrent(display, root) };
        if resources.is_null() {
            warn!("RandR unavailable, falling back to single default monitor");
            return fallback();
        }

        let mut monitors = Vec::new();
        let mut output_ids: Vec<RROutput> = Vec::new();
        let noutput = unsafe { (*resources).noutput } as usize;
        let outputs = unsafe { (*resources).outputs };

        for i in 0..noutput {
            let output = unsafe { *outputs.add(i) };
            let info: *mut XRROutputInfo = unsafe { XRRGetOutputInfo(display, resources, output) };
            if info.is_null() {
                continue;
            }
            let connection = unsafe { (*info).connection };
            let crtc: RRCrtc = unsafe { (*info).crtc };
            if connection as i32 == RR_Connected as i32 && crtc != 0 {
                let crtc_info: *mut XRRCrtcInfo = unsafe { XRRGetCrtcInfo(display, resources, crtc) };
                if !crtc_info.is_null() {
                    let name = unsafe {
                        std::ffi::CStr::from_ptr((*info).name)
                            .to_string_lossy()
                            .into_owned()
                    };
                    let rect = unsafe {
                        Rect::new(
                            (*crtc_info).x as i32,
                            (*crtc_info).y as i32,
                            (*crtc_info).width as u32,
                            (*crtc_info).height as u32,
                        )
                    };
                    monitors.push(Monitor { name, rect, primary: false });
                    output_ids.push(output);
                    unsafe { XRRFreeCrtcInfo(crtc_info) };
                }
            }
            unsafe { XRRFreeOutputInfo(info) };
        }
        unsafe { XRRFreeScreenResources(resources) };

        if monitors.is_empty() {
            return fallback();
        }

        // The primary output is whichever RandR reports via XRRGetOutputPrimary;
        // default to the first enumerated monitor if its id doesn't match any
        // connected output (e.g. no primary has been set).
        let primary_output = unsafe { XRRGetOutputPrimary(display, root) };
        match output_ids.iter().position(|&id| id == primary_output) {
            Some(idx) => monitors[idx].primary = true,
            None => {
                if let Some(first) = monitors.first_mut() {
                    first.primary = true;
                }
            }
        }

        monitors
    }

    pub const fn randr_event_mask() -> c_int {
        x11::xrandr::RRScreenChangeNotifyMask as c_int
            | x11::xrandr::RRCrtcChangeNotifyMask as c_int
            | x11::xrandr::RROutputChangeNotifyMask as c_int
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refresh_reports_change_on_first_snapshot() {
        let mut registry = MonitorRegistry::default();
        let changed = registry.refresh(vec![Monitor {
            name: "eDP-1".into(),
            rect: Rect::new(0, 0, 1920, 1080),
            primary: true,
        }]);
        assert!(changed);
    }

    #[test]
    fn refresh_is_idempotent_for_identical_snapshot() {
        let mut registry = MonitorRegistry::default();
        let snapshot = vec![Monitor { name: "eDP-1".into(), rect: Rect::new(0, 0, 1920, 1080), primary: true }];
        registry.refresh(snapshot.clone());
        let changed = registry.refresh(snapshot);
        assert!(!changed);
    }

    #[test]
    fn primary_falls_back_to_first_monitor() {
        let mut registry = MonitorRegistry::default();
        registry.refresh(vec![
            Monitor { name: "a".into(), rect: Rect::new(0, 0, 100, 100), primary: false },
            Monitor { name: "b".into(), rect: Rect::new(100, 0, 100, 100), primary: false },
        ]);
        assert_eq!(registry.primary().unwrap().name, "a");
    }
}
