//! Boss event subtypes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Subtype carried by a boss event message.
///
/// The server originates show/hide/update events. Clients may only send
/// [`BossEventType::RegisterPlayer`] and [`BossEventType::UnregisterPlayer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BossEventType {
    Show,
    RegisterPlayer,
    Hide,
    UnregisterPlayer,
    HealthPercent,
    Title,
    Properties,
    Texture,
    Query,
}

impl BossEventType {
    /// Numeric code on the game protocol.
    pub fn code(&self) -> u32 {
        match self {
            Self::Show => 0,
            Self::RegisterPlayer => 1,
            Self::Hide => 2,
            Self::UnregisterPlayer => 3,
            Self::HealthPercent => 4,
            Self::Title => 5,
            Self::Properties => 6,
            Self::Texture => 7,
            Self::Query => 8,
        }
    }

    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(Self::Show),
            1 => Some(Self::RegisterPlayer),
            2 => Some(Self::Hide),
            3 => Some(Self::UnregisterPlayer),
            4 => Some(Self::HealthPercent),
            5 => Some(Self::Title),
            6 => Some(Self::Properties),
            7 => Some(Self::Texture),
            8 => Some(Self::Query),
            _ => None,
        }
    }

    /// Returns true for the subtypes a client may legitimately send.
    pub fn is_client_originated(&self) -> bool {
        matches!(self, Self::RegisterPlayer | Self::UnregisterPlayer)
    }
}

impl fmt::Display for BossEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Show => "show",
            Self::RegisterPlayer => "register_player",
            Self::Hide => "hide",
            Self::UnregisterPlayer => "unregister_player",
            Self::HealthPercent => "health_percent",
            Self::Title => "title",
            Self::Properties => "properties",
            Self::Texture => "texture",
            Self::Query => "query",
        };
        write!(f, "{name}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_round_trip() {
        for code in 0..=8 {
            let event = BossEventType::from_code(code).unwrap();
            assert_eq!(event.code(), code);
        }
        assert_eq!(BossEventType::from_code(9), None);
    }

    #[test]
    fn test_client_originated() {
        assert!(BossEventType::RegisterPlayer.is_client_originated());
        assert!(BossEventType::UnregisterPlayer.is_client_originated());
        assert!(!BossEventType::Show.is_client_originated());
        assert!(!BossEventType::Title.is_client_originated());
    }

    #[test]
    fn test_serde_name_matches_display() {
        let json = serde_json::to_string(&BossEventType::HealthPercent).unwrap();
        assert_eq!(json, format!("\"{}\"", BossEventType::HealthPercent));
    }
}
