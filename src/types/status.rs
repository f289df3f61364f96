//! Enumerations carried as raw integers in the graphics record
//!
//! The simulator writes these as plain `i32` values. Unrecognised values are
//! preserved as the `Unknown` variant rather than rejected, since a newer
//! simulator build may add codes.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Game status reported in `acpmf_graphics`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AcStatus {
    #[default]
    Off,
    Replay,
    Live,
    Pause,
    Unknown,
}

impl AcStatus {
    pub fn from_raw(raw: i32) -> Self {
        match raw {
            0 => AcStatus::Off,
            1 => AcStatus::Replay,
            2 => AcStatus::Live,
            3 => AcStatus::Pause,
            _ => AcStatus::Unknown,
        }
    }

    pub fn is_live(self) -> bool {
        self == AcStatus::Live
    }

    pub fn label(self) -> &'static str {
        match self {
            AcStatus::Off => "AC_OFF",
            AcStatus::Replay => "AC_REPLAY",
            AcStatus::Live => "AC_LIVE",
            AcStatus::Pause => "AC_PAUSE",
            AcStatus::Unknown => "AC_UNKNOWN",
        }
    }
}

impl fmt::Display for AcStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Session type reported in `acpmf_graphics`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionType {
    #[default]
    Unknown,
    Practice,
    Qualify,
    Race,
    Hotlap,
    TimeAttack,
    Drift,
    Drag,
}

impl SessionType {
    pub fn from_raw(raw: i32) -> Self {
        match raw {
            0 => SessionType::Practice,
            1 => SessionType::Qualify,
            2 => SessionType::Race,
            3 => SessionType::Hotlap,
            4 => SessionType::TimeAttack,
            5 => SessionType::Drift,
            6 => SessionType::Drag,
            _ => SessionType::Unknown,
        }
    }

    /// Label written to the `session_type` output field.
    pub fn label(self) -> &'static str {
        match self {
            SessionType::Practice => "Practice",
            SessionType::Qualify => "Qualifying",
            SessionType::Race => "Race",
            SessionType::Hotlap => "Hotlap",
            SessionType::TimeAttack => "TimeAttack",
            SessionType::Drift => "Drift",
            SessionType::Drag => "Drag",
            SessionType::Unknown => "Unknown",
        }
    }
}

impl fmt::Display for SessionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Flag currently shown to the player.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FlagType {
    #[default]
    None,
    Blue,
    Yellow,
    Black,
    White,
    Checkered,
    Penalty,
}

impl FlagType {
    pub fn from_raw(raw: i32) -> Self {
        match raw {
            1 => FlagType::Blue,
            2 => FlagType::Yellow,
            3 => FlagType::Black,
            4 => FlagType::White,
            5 => FlagType::Checkered,
            6 => FlagType::Penalty,
            _ => FlagType::None,
        }
    }

    /// Label written to the `flag_type` output field.
    pub fn label(self) -> &'static str {
        match self {
            FlagType::None => "No_flag",
            FlagType::Blue => "Blue_flag",
            FlagType::Yellow => "Yellow_flag",
            FlagType::Black => "Black_flag",
            FlagType::White => "White_flag",
            FlagType::Checkered => "Checkered_flag",
            FlagType::Penalty => "Penalty_flag",
        }
    }
}

impl fmt::Display for FlagType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn status_codes_map_to_variants() {
        assert_eq!(AcStatus::from_raw(0), AcStatus::Off);
        assert_eq!(AcStatus::from_raw(1), AcStatus::Replay);
        assert_eq!(AcStatus::from_raw(2), AcStatus::Live);
        assert_eq!(AcStatus::from_raw(3), AcStatus::Pause);
        assert_eq!(AcStatus::from_raw(42), AcStatus::Unknown);
        assert!(AcStatus::Live.is_live());
        assert!(!AcStatus::Pause.is_live());
    }

    #[test]
    fn session_labels() {
        assert_eq!(SessionType::from_raw(-1).label(), "Unknown");
        assert_eq!(SessionType::from_raw(1).label(), "Qualifying");
        assert_eq!(SessionType::from_raw(4).label(), "TimeAttack");
        assert_eq!(SessionType::from_raw(6), SessionType::Drag);
    }

    #[test]
    fn flag_labels() {
        assert_eq!(FlagType::from_raw(0).label(), "No_flag");
        assert_eq!(FlagType::from_raw(3).label(), "Black_flag");
        assert_eq!(FlagType::from_raw(5).label(), "Checkered_flag");
        assert_eq!(FlagType::from_raw(-7), FlagType::None);
    }

    proptest! {
        #[test]
        fn any_raw_status_decodes(raw in any::<i32>()) {
            let status = AcStatus::from_raw(raw);
            prop_assert_eq!(status.is_live(), raw == 2);
        }
    }
}
