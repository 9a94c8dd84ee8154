//! Boss bar color catalog.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Color of the bar as rendered by the client.
///
/// Serialized as its snake_case name; [`BarColor::code`] gives the numeric
/// value used on the game protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BarColor {
    #[default]
    Pink,
    Blue,
    Red,
    Green,
    Yellow,
    Purple,
    RebeccaPurple,
    White,
}

impl BarColor {
    /// Every color a bar may take, in protocol code order.
    pub const ALL: [BarColor; 8] = [
        Self::Pink,
        Self::Blue,
        Self::Red,
        Self::Green,
        Self::Yellow,
        Self::Purple,
        Self::RebeccaPurple,
        Self::White,
    ];

    /// Returns all available colors.
    pub fn all() -> &'static [BarColor] {
        &Self::ALL
    }

    /// Numeric protocol code.
    pub fn code(&self) -> u32 {
        match self {
            Self::Pink => 0,
            Self::Blue => 1,
            Self::Red => 2,
            Self::Green => 3,
            Self::Yellow => 4,
            Self::Purple => 5,
            Self::RebeccaPurple => 6,
            Self::White => 7,
        }
    }

    /// Looks a color up by protocol code.
    pub fn from_code(code: u32) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.code() == code)
    }

    /// Parses a color name, accepting `snake_case`, `kebab-case` and upper case.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().replace('-', "_").as_str() {
            "pink" => Some(Self::Pink),
            "blue" => Some(Self::Blue),
            "red" => Some(Self::Red),
            "green" => Some(Self::Green),
            "yellow" => Some(Self::Yellow),
            "purple" => Some(Self::Purple),
            "rebecca_purple" | "rebeccapurple" => Some(Self::RebeccaPurple),
            "white" => Some(Self::White),
            _ => None,
        }
    }

    /// Returns the canonical lowercase name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Pink => "pink",
            Self::Blue => "blue",
            Self::Red => "red",
            Self::Green => "green",
            Self::Yellow => "yellow",
            Self::Purple => "purple",
            Self::RebeccaPurple => "rebecca_purple",
            Self::White => "white",
        }
    }
}

impl fmt::Display for BarColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
