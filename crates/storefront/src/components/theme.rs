//! UI palette.
//!
//! One set of templates serves every palette; the theme only supplies the
//! colors written into the page's CSS custom properties.

use std::fmt;
use std::str::FromStr;

/// Color theme for the web UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Theme {
    #[default]
    Amber,
    Rose,
}

/// Concrete colors for a [`Theme`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    /// Navbar and primary buttons.
    pub primary: &'static str,
    /// Hover and heading color.
    pub primary_dark: &'static str,
    /// Badges and highlights.
    pub accent: &'static str,
    /// Tint behind items already in the bag.
    pub surface: &'static str,
    /// Text on primary backgrounds.
    pub on_primary: &'static str,
}

impl Theme {
    pub const ALL: [Self; 2] = [Self::Amber, Self::Rose];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Amber => "amber",
            Self::Rose => "rose",
        }
    }

    #[must_use]
    pub const fn palette(self) -> Palette {
        match self {
            Self::Amber => Palette {
                primary: "#78350f",
                primary_dark: "#451a03",
                accent: "#d97706",
                surface: "#fffbeb",
                on_primary: "#fffbeb",
            },
            Self::Rose => Palette {
                primary: "#9f1239",
                primary_dark: "#4c0519",
                accent: "#e11d48",
                surface: "#fff1f2",
                on_primary: "#fff1f2",
            },
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "amber" => Ok(Self::Amber),
            "rose" => Ok(Self::Rose),
            other => Err(format!("unknown theme '{other}' (expected amber or rose)")),
        }
    }
}
