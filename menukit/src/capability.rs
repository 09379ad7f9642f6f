//! Optional platform capabilities.
//!
//! Every capability has a "not available" default, so a missing native feature turns into a
//! missing icon or a disabled action instead of an error. The provider for the current
//! target is picked at compile time by [`platform_capabilities`].

use std::rc::Rc;

use crate::cache::Icon;
use crate::colour::Rgb;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Platform {
    Linux,
    MacOs,
    Windows,
    Other,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(target_os = "linux") {
            Platform::Linux
        } else if cfg!(target_os = "macos") {
            Platform::MacOs
        } else if cfg!(target_os = "windows") {
            Platform::Windows
        } else {
            Platform::Other
        }
    }

    /// Hide signals arrive unreliably (or before selection is delivered), so menus are
    /// not torn down on hide.
    pub fn hide_is_unreliable(self) -> bool {
        self == Platform::MacOs
    }

    /// Some Linux shells never send "about to show" for a menu with no items.
    pub fn needs_show_placeholder(self) -> bool {
        self == Platform::Linux
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "linux" => Some(Platform::Linux),
            "macos" | "osx" | "mac" => Some(Platform::MacOs),
            "windows" | "win" => Some(Platform::Windows),
            "other" => Some(Platform::Other),
            _ => None,
        }
    }
}

pub trait Capabilities {
    /// Native icon for files with this (lower-case, dot-less) extension.
    fn file_icon(&self, _extension: &str) -> Option<Icon> {
        None
    }

    /// Whether the desktop uses a dark theme; picks light-on-dark variants of status icons.
    fn dark_mode(&self) -> bool {
        false
    }

    /// Modal colour picker. `None` when cancelled or unsupported.
    fn pick_colour(&self, _initial: Option<Rgb>, _custom: &[Rgb]) -> Option<Rgb> {
        None
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoCapabilities;

impl Capabilities for NoCapabilities {}

/// Desktop hints available from the environment on Linux sessions.
#[derive(Debug, Default, Clone, Copy)]
pub struct LinuxCapabilities;

impl Capabilities for LinuxCapabilities {
    fn dark_mode(&self) -> bool {
        theme_is_dark(&std::env::var("GTK_THEME").unwrap_or_default())
    }
}

/// `GTK_THEME` values name a variant after a colon, e.g. `Adwaita:dark`.
fn theme_is_dark(theme: &str) -> bool {
    theme
        .rsplit_once(':')
        .is_some_and(|(_, variant)| variant.trim().eq_ignore_ascii_case("dark"))
}

#[cfg(target_os = "linux")]
pub fn platform_capabilities() -> Rc<dyn Capabilities> {
    Rc::new(LinuxCapabilities)
}

#[cfg(not(target_os = "linux"))]
pub fn platform_capabilities() -> Rc<dyn Capabilities> {
    Rc::new(NoCapabilities)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_quirks() {
        assert!(Platform::MacOs.hide_is_unreliable());
        assert!(!Platform::Linux.hide_is_unreliable());
        assert!(Platform::Linux.needs_show_placeholder());
        assert!(!Platform::Windows.needs_show_placeholder());
    }

    #[test]
    fn parse_platform_names() {
        assert_eq!(Platform::parse("OSX"), Some(Platform::MacOs));
        assert_eq!(Platform::parse(" linux "), Some(Platform::Linux));
        assert_eq!(Platform::parse("beos"), None);
    }

    #[test]
    fn default_capabilities_are_absent() {
        let caps = NoCapabilities;
        assert!(caps.file_icon("txt").is_none());
        assert!(!caps.dark_mode());
        assert!(caps.pick_colour(None, &[]).is_none());
    }

    #[test]
    fn gtk_theme_variant_decides_dark_mode() {
        assert!(theme_is_dark("Adwaita:dark"));
        assert!(theme_is_dark("Breeze:DARK"));
        assert!(!theme_is_dark("Adwaita"));
        assert!(!theme_is_dark("Adwaita-dark"));
        assert!(!theme_is_dark(""));
    }
}
