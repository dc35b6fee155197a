//! Decorator (§4.5): frame construction/destruction, icon loading, titlebar
//! gradient painting, title text and button pictograms.

use libc::{c_int, c_uint, c_ulong};
use std::ffi::CString;
use x11::xft::{XftColor, XftColorAllocName, XftDrawCreate, XftDrawStringUtf8, XftFont, XftFontOpenName};
use x11::xlib::{
    CWBackPixel, CWBorderPixel, CWEventMask, Display, ExposureMask, Window,
    XCreateGC, XCreateSimpleWindow, XCreateImage, XDefaultColormap, XDefaultScreen,
    XDefaultVisual, XFillRectangle, XMapWindow, XPutImage, XReparentWindow,
    XSetForeground, XSetWindowAttributes, ZPixmap,
};

use crate::config::Config;
use crate::frame::{Button, ButtonKind, Frame, IconPixmap};
use crate::geometry::Rect;
use crate::icon::{self, IconRecord};
use crate::strut::Strut;
use crate::theme::{lerp_colour, Theme};

pub const BORDER_WIDTH: u32 = 2;
pub const TITLE_HEIGHT: u32 = 24;
pub const TILING_TITLE_HEIGHT: u32 = 2;
pub const BUTTON_SIZE: u32 = 16;
pub const BUTTON_SPACING: u32 = 4;
pub const RESIZE_BORDER: i32 = 5;

const ICON_SIZE: u32 = 16;
const FONT_PREFERENCE_CHAIN: &[&str] = &["Noto Sans:size=10", "DejaVu Sans:size=10", "sans-10"];

pub struct Decorator {
    pub theme: Theme,
}

impl Decorator {
    pub fn new(config: &Config) -> Self {
        Decorator { theme: config.theme() }
    }

    /// Builds a fully decorated frame around `client` (§4.5 "Frame
    /// construction"). `content` is the client's content rectangle, not
    /// including the titlebar.
    pub fn create_frame(&self, display: *mut Display, root: Window, client: Window, content: Rect) -> Frame {
        let screen = unsafe { XDefaultScreen(display) };
        let visual = unsafe { XDefaultVisual(display, screen) };
        let colormap = unsafe { XDefaultColormap(display, screen) };

        let outer_h = content.h + TITLE_HEIGHT;

        let mut attrs: XSetWindowAttributes = unsafe { std::mem::zeroed() };
        attrs.background_pixel = self.theme.secondary as c_ulong;
        attrs.border_pixel = self.theme.accent as c_ulong;
        attrs.event_mask = x11::xlib::SubstructureRedirectMask
            | x11::xlib::SubstructureNotifyMask
            | x11::xlib::ButtonPressMask
            | x11::xlib::ButtonReleaseMask
            | x11::xlib::PointerMotionMask
            | ExposureMask;

        let outer = unsafe {
            x11::xlib::XCreateWindow(
                display,
                root,
                content.x,
                content.y,
                content.w,
                outer_h,
                BORDER_WIDTH,
                x11::xlib::CopyFromParent as c_int,
                x11::xlib::CopyFromParent as c_uint,
                visual,
                CWBackPixel | CWBorderPixel | CWEventMask,
                &mut attrs,
            )
        };

        let titlebar = unsafe {
            XCreateSimpleWindow(
                display,
                outer,
                0,
                0,
                content.w,
                TITLE_HEIGHT,
                0,
                self.theme.secondary as c_ulong,
                self.theme.secondary as c_ulong,
            )
        };
        unsafe {
            x11::xlib::XSelectInput(display, titlebar, ExposureMask | x11::xlib::ButtonPressMask);
        }

        let gc = unsafe { XCreateGC(display, outer, 0, std::ptr::null_mut()) };

        let font = open_font(display, screen);
        let draw = unsafe { XftDrawCreate(display, titlebar, visual, colormap) };
        let text_colour = alloc_colour(display, screen, colormap, self.theme.text as u32);

        unsafe {
            XReparentWindow(display, client, outer, 0, TITLE_HEIGHT as c_int);
            XMapWindow(display, titlebar);
            XMapWindow(display, outer);
            XMapWindow(display, client);
        }

        Frame {
            client,
            outer,
            titlebar,
            gc,
            font,
            draw,
            text_colour,
            buttons: Vec::new(),
            icon: None,
            rect: Rect::new(content.x, content.y, content.w, outer_h),
            saved_rect: Rect::new(content.x, content.y, content.w, outer_h),
            fullscreen: false,
            floating: false,
            is_dock: false,
            strut: Strut::default(),
            titlebar_height: TITLE_HEIGHT,
        }
    }

    /// Builds the "dock form" frame described in §4.6 step 5: no titlebar,
    /// `frame.outer` aliased to the client window itself.
    pub fn create_dock_frame(&self, client: Window, rect: Rect, strut: Strut) -> Frame {
        Frame {
            client,
            outer: client,
            titlebar: 0,
            gc: std::ptr::null_mut(),
            font: std::ptr::null_mut(),
            draw: std::ptr::null_mut(),
            text_colour: unsafe { std::mem::zeroed() },
            buttons: Vec::new(),
            icon: None,
            rect,
            saved_rect: rect,
            fullscreen: false,
            floating: false,
            is_dock: true,
            strut,
            titlebar_height: 0,
        }
    }

    /// Reads and decodes `_NET_WM_ICON`, scales it to 16x16 premultiplied
    /// against the titlebar background, and stores it as a pixmap (§4.5).
    pub fn load_icon(&self, display: *mut Display, drawable: Window, raw_words: &[u32]) -> Option<IconPixmap> {
        let records = icon::parse_records(raw_words);
        let record: &IconRecord = icon::pick_icon(&records, ICON_SIZE)?;
        let scaled = icon::scale_nearest_premultiplied(record, ICON_SIZE, ICON_SIZE, self.theme.secondary as u32);

        let screen = unsafe { XDefaultScreen(display) };
        let depth = unsafe { x11::xlib::XDefaultDepth(display, screen) };
        let visual = unsafe { XDefaultVisual(display, screen) };

        let mut data: Vec<u32> = scaled;
        let image = unsafe {
            XCreateImage(
                display,
                visual,
                depth as c_uint,
                ZPixmap,
                0,
                data.as_mut_ptr() as *mut i8,
                ICON_SIZE,
                ICON_SIZE,
                32,
                0,
            )
        };
        if image.is_null() {
            warn!("Failed to create icon image, frame will have no icon");
            return None;
        }

        let pixmap = unsafe {
            x11::xlib::XCreatePixmap(display, drawable, ICON_SIZE, ICON_SIZE, depth as c_uint)
        };
        let gc = unsafe { XCreateGC(display, drawable, 0, std::ptr::null_mut()) };
        unsafe {
            XPutImage(display, pixmap, gc, image, 0, 0, 0, 0, ICON_SIZE, ICON_SIZE);
            x11::xlib::XFreeGC(display, gc);
            // XftDrawDestroy / XDestroyImage would free `data`; since we built
            // the XImage from a Vec we own, drop the wrapper without letting
            // Xlib free non-malloc'd memory.
            (*image).data = std::ptr::null_mut();
            x11::xlib::XDestroyImage(image);
        }

        Some(IconPixmap { pixmap, width: ICON_SIZE, height: ICON_SIZE })
    }

    /// Paints the titlebar gradient, icon, title text, in that order, then
    /// redraws the buttons on top (§4.5 "Titlebar paint").
    pub fn paint_titlebar(&self, display: *mut Display, frame: &Frame, title: &str) {
        if frame.is_dock || frame.titlebar == 0 {
            return;
        }
        let width = frame.rect.w;
        let height = frame.titlebar_height;
        if height == 0 {
            return;
        }

        self.paint_gradient(display, frame.gc, frame.titlebar, width, height);

        let mut text_x = 8i32;
        if let Some(icon) = &frame.icon {
            unsafe {
                x11::xlib::XCopyArea(
                    display,
                    icon.pixmap,
                    frame.titlebar,
                    frame.gc,
                    0,
                    0,
                    icon.width,
                    icon.height,
                    text_x,
                    ((height.saturating_sub(icon.height)) / 2) as c_int,
                );
            }
            text_x += icon.width as i32 + 6;
        }

        if !frame.draw.is_null() && !frame.font.is_null() {
            let reserved_right = (frame.buttons.len() as u32) * (BUTTON_SIZE + BUTTON_SPACING) + BUTTON_SPACING;
            let available = width.saturating_sub(reserved_right);
            let x = if self.theme.title_align_left {
                text_x
            } else {
                let text_w = estimate_text_width(title);
                let centred = (available as i32 - text_w) / 2;
                centred.max(text_x)
            };
            let cstr = CString::new(title).unwrap_or_else(|_| CString::new("").unwrap());
            unsafe {
                XftDrawStringUtf8(
                    frame.draw,
                    &frame.text_colour,
                    frame.font,
                    x,
                    (height as i32 + 10) / 2 + 4,
                    cstr.as_ptr() as *const u8,
                    cstr.as_bytes().len() as c_int,
                );
            }
        }

        for button in &frame.buttons {
            self.paint_button(display, frame.gc, button);
        }
    }

    fn paint_gradient(&self, display: *mut Display, gc: x11::xlib::GC, titlebar: Window, width: u32, height: u32) {
        let strips = (width / 2).max(1);
        for i in 0..strips {
            let t = i as f64 / strips.max(1) as f64;
            let colour = lerp_colour(self.theme.title_bar_left, self.theme.title_bar_right, t);
            unsafe {
                XSetForeground(display, gc, colour as c_ulong);
                XFillRectangle(display, titlebar, gc, (i * 2) as c_int, 0, 2, height);
            }
        }
    }

    /// Lays out and creates the three titlebar buttons, right-to-left:
    /// Close, Maximize, Minimize (§4.5 "Buttons").
    pub fn create_buttons(&self, display: *mut Display, titlebar: Window, titlebar_width: u32) -> Vec<Button> {
        let mut buttons = Vec::with_capacity(3);
        let specs = [
            (ButtonKind::Close, 0xcc3333u64),
            (ButtonKind::Maximize, 0x33cc33u64),
            (ButtonKind::Minimize, 0xcccc33u64),
        ];

        for (i, (kind, colour)) in specs.into_iter().enumerate() {
            let x = titlebar_width as i32
                - ((i as u32 + 1) * (BUTTON_SIZE + BUTTON_SPACING)) as i32;
            let y = ((TITLE_HEIGHT - BUTTON_SIZE) / 2) as i32;
            let window = unsafe {
                XCreateSimpleWindow(
                    display,
                    titlebar,
                    x,
                    y,
                    BUTTON_SIZE,
                    BUTTON_SIZE,
                    0,
                    *colour as c_ulong,
                    *colour as c_ulong,
                )
            };
            unsafe {
                x11::xlib::XSelectInput(display, window, x11::xlib::ButtonPressMask | ExposureMask);
                XMapWindow(display, window);
            }
            buttons.push(Button {
                kind: *kind,
                window,
                rect: Rect::new(x, y, BUTTON_SIZE, BUTTON_SIZE),
                colour: *colour,
                draw: std::ptr::null_mut(),
            });
        }
        buttons
    }

    fn paint_button(&self, display: *mut Display, gc: x11::xlib::GC, button: &Button) {
        unsafe {
            XSetForeground(display, gc, 0x000000);
        }
        let s = BUTTON_SIZE as c_int;
        match button.kind {
            ButtonKind::Close => unsafe {
                x11::xlib::XDrawLine(display, button.window, gc, 3, 3, s - 3, s - 3);
                x11::xlib::XDrawLine(display, button.window, gc, s - 3, 3, 3, s - 3);
            },
            ButtonKind::Maximize => unsafe {
                x11::xlib::XDrawRectangle(display, button.window, gc, 3, 3, (s - 6) as c_uint, (s - 6) as c_uint);
            },
            ButtonKind::Minimize => unsafe {
                x11::xlib::XDrawLine(display, button.window, gc, 3, s - 4, s - 3, s - 4);
            },
        }
    }
}

fn open_font(display: *mut Display, screen: c_int) -> *mut XftFont {
    for name in FONT_PREFERENCE_CHAIN {
        let cname = CString::new(*name).unwrap();
        let font = unsafe { XftFontOpenName(display, screen, cname.as_ptr()) };
        if !font.is_null() {
            return font;
        }
        warn!("Font '{}' unavailable, trying next in preference chain", name);
    }
    warn!("No font in the preference chain could be opened; titles will not render");
    std::ptr::null_mut()
}

fn alloc_colour(display: *mut Display, screen: c_int, colormap: x11::xlib::Colormap, rgb: u32) -> XftColor {
    let spec = format!("#{:06x}", rgb & 0xffffff);
    let cname = CString::new(spec).unwrap();
    let mut colour: XftColor = unsafe { std::mem::zeroed() };
    let visual = unsafe { XDefaultVisual(display, screen) };
    unsafe {
        XftColorAllocName(display, visual, colormap, cname.as_ptr(), &mut colour);
    }
    colour
}

/// A rough text-width estimate used only to choose centring, since the Xft
/// glyph-extent query needs a live display; good enough because the title
/// is re-centred whenever the titlebar itself changes width.
fn estimate_text_width(title: &str) -> i32 {
    (title.chars().count() as i32) * 7
}

#[cfg(test)]
mod tests {
    use super::estimate_text_width;

    #[test]
    fn text_width_scales_with_character_count() {
        assert!(estimate_text_width("hello") < estimate_text_width("hello world"));
    }
}
