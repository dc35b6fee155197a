#![allow(unused_imports)]
use crate::theme::Theme;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::PathBuf;

const XDG_SUFFIX: &str = "rdwm/config.toml";
const ETC_FALLBACK: &str = "/etc/rdwm/config.toml";

/// Registers tiling, border and theme preferences read from `config.toml`.
/// Operations and data are mostly opaque to Rdwm proper, which is mainly just to _respond_ to events
/// by messaging appropriate handlers and handle any window-related book-keeping.
///
/// Every field is optional: a missing or malformed section falls back to the
/// built-in default for that section rather than failing configuration load
/// outright (§7 "resource allocation" tolerance).
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Config {
    pub windows: Option<ArrangementSettings>,
    pub borders: Option<BorderSettings>,
    pub theme: Option<Theme>,
    pub shell: Option<ShellSettings>,
}

/// `[windows]` section: tiling layout parameters (§3 "Workspace tiling state").
#[derive(Debug, Serialize, Deserialize)]
pub struct ArrangementSettings {
    pub master_count: Option<usize>,
    pub master_fraction: Option<f64>,
    pub gap: Option<u32>,
}

/// `[borders]` section: outer frame and titlebar decoration sizes (§4.5).
#[derive(Debug, Serialize, Deserialize)]
pub struct BorderSettings {
    pub border_width: Option<u32>,
    pub titlebar_height: Option<u32>,
    pub button_size: Option<u32>,
    pub button_spacing: Option<u32>,
    pub resize_border: Option<u32>,
}

/// `[shell]` section: self-identification so the shell's own windows are
/// never decorated or listed (§4.6 step 4, §4.9).
#[derive(Debug, Serialize, Deserialize)]
pub struct ShellSettings {
    pub app_id: Option<String>,
}

impl Config {
    /// Produces an Rdwm configuration from either:
    /// 1. `$XDG_CONFIG_HOME/rdwm/config.toml` (or `~/.config/rdwm/config.toml`);
    /// 2. `/etc/rdwm/config.toml`;
    /// 3. Application default values ('sensible' defaults), if neither exists.
    ///
    /// A well-formed file with an invalid section is logged and that section
    /// is dropped rather than aborting configuration load.
    pub fn get_config() -> Self {
        for path in Self::candidate_paths() {
            if let Some(config) = Self::try_load(&path) {
                debug!("Loaded configuration from {:#?}", path);
                return config;
            }
        }
        info!("No configuration file found, using built-in defaults");
        Config::default()
    }

    fn candidate_paths() -> Vec<PathBuf> {
        let mut paths = Vec::new();
        if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
            paths.push(PathBuf::from(xdg).join("rdwm/config.toml"));
        } else if let Ok(home) = std::env::var("HOME") {
            paths.push(PathBuf::from(home).join(".config").join(XDG_SUFFIX));
        }
        paths.push(PathBuf::from(ETC_FALLBACK));
        paths
    }

    fn try_load(path: &PathBuf) -> Option<Config> {
        let mut file = File::open(path).ok()?;
        let mut contents = String::new();
        file.read_to_string(&mut contents).ok()?;
        match toml::from_str(&contents) {
            Ok(config) => Some(config),
            Err(e) => {
                warn!("Malformed configuration at {:#?}: {}", path, e);
                None
            }
        }
    }

    pub fn master_count(&self) -> usize {
        self.windows.as_ref().and_then(|w| w.master_count).unwrap_or(1)
    }

    pub fn master_fraction(&self) -> f64 {
        self.windows.as_ref().and_then(|w| w.master_fraction).unwrap_or(0.55)
    }

    pub fn gap(&self) -> u32 {
        self.windows.as_ref().and_then(|w| w.gap).unwrap_or(10)
    }

    pub fn theme(&self) -> Theme {
        self.theme.unwrap_or_default()
    }

    pub fn shell_app_id(&self) -> String {
        self.shell
            .as_ref()
            .and_then(|s| s.app_id.clone())
            .unwrap_or_else(|| "rdwm-shell".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sensible_when_no_file_present() {
        let config = Config::default();
        assert_eq!(config.master_count(), 1);
        assert_eq!(config.gap(), 10);
    }

    #[test]
    fn round_trips_through_toml() {
        let config = Config {
            windows: Some(ArrangementSettings { master_count: Some(2), master_fraction: Some(0.6), gap: Some(8) }),
            borders: None,
            theme: None,
            shell: Some(ShellSettings { app_id: Some("my-shell".into()) }),
        };
        let text = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed.master_count(), 2);
        assert_eq!(parsed.shell_app_id(), "my-shell");
    }
}
