//! The theme palette this core consumes (§6 "Theme interface").
//!
//! Computing a palette from a wallpaper is an external collaborator's job
//! (§1); this module only models the values that collaborator hands us, with
//! the same literal defaults the original `ThemeManager` ships.

use serde::{Deserialize, Serialize};

pub type XColour = u64;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct Theme {
    pub primary: XColour,
    pub secondary: XColour,
    pub tertiary: XColour,
    pub accent: XColour,
    pub neutral: XColour,
    pub brightest: XColour,
    pub title_bar_left: XColour,
    pub title_bar_right: XColour,
    pub text: XColour,
    pub title_align_left: bool,
}

impl Default for Theme {
    fn default() -> Self {
        Theme {
            primary: 0x3a3a3a,
            secondary: 0x2a2a2a,
            tertiary: 0x1a1a1a,
            accent: 0x4a90e2,
            neutral: 0x808080,
            brightest: 0xffffff,
            title_bar_left: 0x3a3a3a,
            title_bar_right: 0x1a1a1a,
            text: 0xffffff,
            title_align_left: false,
        }
    }
}

/// Linearly interpolates channel-by-channel between two `0xRRGGBB` colours.
pub fn lerp_colour(from: XColour, to: XColour, t: f64) -> XColour {
    let t = t.clamp(0.0, 1.0);
    let chan = |c: XColour, shift: u32| ((c >> shift) & 0xff) as f64;
    let mix = |a: f64, b: f64| (a + (b - a) * t).round() as u64;

    let r = mix(chan(from, 16), chan(to, 16));
    let g = mix(chan(from, 8), chan(to, 8));
    let b = mix(chan(from, 0), chan(to, 0));
    (r << 16) | (g << 8) | b
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lerp_at_zero_is_source() {
        assert_eq!(lerp_colour(0x000000, 0xffffff, 0.0), 0x000000);
    }

    #[test]
    fn lerp_at_one_is_target() {
        assert_eq!(lerp_colour(0x000000, 0xffffff, 1.0), 0xffffff);
    }

    #[test]
    fn lerp_midpoint_averages_channels() {
        let mid = lerp_colour(0x000000, 0x646464, 0.5);
        assert_eq!(mid, 0x323232);
    }
}
