//! Break tiers.
//!
//! A tier pairs an active-time interval with the break it earns. The
//! default ladder is a short stretch every 20 minutes and a long walk
//! every hour; configurations may define any number of tiers.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier for a configured tier.
pub type TierId = Uuid;

/// Display color tag for a tier. Rendering is up to the front end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TierColor {
    Yellow,
    Red,
    Blue,
    Green,
    Orange,
    Purple,
    Teal,
    Pink,
}

impl TierColor {
    pub fn as_str(self) -> &'static str {
        match self {
            TierColor::Yellow => "yellow",
            TierColor::Red => "red",
            TierColor::Blue => "blue",
            TierColor::Green => "green",
            TierColor::Orange => "orange",
            TierColor::Purple => "purple",
            TierColor::Teal => "teal",
            TierColor::Pink => "pink",
        }
    }
}

impl std::fmt::Display for TierColor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TierColor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "yellow" => Ok(TierColor::Yellow),
            "red" => Ok(TierColor::Red),
            "blue" => Ok(TierColor::Blue),
            "green" => Ok(TierColor::Green),
            "orange" => Ok(TierColor::Orange),
            "purple" => Ok(TierColor::Purple),
            "teal" => Ok(TierColor::Teal),
            "pink" => Ok(TierColor::Pink),
            other => Err(format!("unknown color: {other}")),
        }
    }
}

/// Which overlay layout a break uses. Opaque to the core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScreenType {
    Short,
    Long,
}

impl ScreenType {
    pub fn as_str(self) -> &'static str {
        match self {
            ScreenType::Short => "short",
            ScreenType::Long => "long",
        }
    }
}

impl std::fmt::Display for ScreenType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ScreenType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "short" => Ok(ScreenType::Short),
            "long" => Ok(ScreenType::Long),
            other => Err(format!("unknown screen type: {other}")),
        }
    }
}

/// One break tier: how much continuous active time accrues before a
/// break of this length is due.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tier {
    pub id: TierId,
    pub name: String,
    pub color: TierColor,
    /// Seconds of active input time before this tier's break triggers.
    pub active_interval_secs: u64,
    /// Seconds the break lasts.
    pub break_duration_secs: u64,
    pub screen_type: ScreenType,
}

impl Tier {
    pub fn new(
        name: impl Into<String>,
        color: TierColor,
        active_interval_secs: u64,
        break_duration_secs: u64,
        screen_type: ScreenType,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            color,
            active_interval_secs,
            break_duration_secs,
            screen_type,
        }
    }

    /// 20 minutes of activity, 15 second stretch.
    pub fn default_short() -> Self {
        Self::new("Stretch", TierColor::Yellow, 20 * 60, 15, ScreenType::Short)
    }

    /// 60 minutes of activity, 5 minute walk.
    pub fn default_long() -> Self {
        Self::new("Walk", TierColor::Red, 60 * 60, 5 * 60, ScreenType::Long)
    }

    pub fn active_interval_ms(&self) -> u64 {
        self.active_interval_secs * 1000
    }

    pub fn break_duration_ms(&self) -> u64 {
        self.break_duration_secs * 1000
    }
}
