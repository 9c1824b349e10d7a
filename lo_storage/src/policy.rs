//! ABOUTME: Debug-level decision table for which artifacts an iteration writes
//! ABOUTME: Color only on motion; auxiliaries never, on motion, or always

use crate::ArtifactRole;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How many debug artifacts to persist
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "DebugLevelRepr", into = "u8")]
pub enum DebugLevel {
    /// Level 0: only the color frame on motion
    #[default]
    Off,
    /// Level 1: auxiliaries alongside the color frame on motion
    OnMotion,
    /// Level 2: auxiliaries every iteration, for threshold tuning
    Always,
}

impl DebugLevel {
    pub fn as_u8(self) -> u8 {
        match self {
            DebugLevel::Off => 0,
            DebugLevel::OnMotion => 1,
            DebugLevel::Always => 2,
        }
    }
}

impl From<DebugLevel> for u8 {
    fn from(level: DebugLevel) -> Self {
        level.as_u8()
    }
}

impl TryFrom<u8> for DebugLevel {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(DebugLevel::Off),
            1 => Ok(DebugLevel::OnMotion),
            2 => Ok(DebugLevel::Always),
            other => Err(format!("debug level must be 0, 1 or 2, got {}", other)),
        }
    }
}

impl FromStr for DebugLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "0" | "off" => Ok(DebugLevel::Off),
            "1" | "on_motion" | "on-motion" => Ok(DebugLevel::OnMotion),
            "2" | "always" => Ok(DebugLevel::Always),
            other => Err(format!("unknown debug level '{}'", other)),
        }
    }
}

impl fmt::Display for DebugLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DebugLevel::Off => "off",
            DebugLevel::OnMotion => "on_motion",
            DebugLevel::Always => "always",
        };
        write!(f, "{}", name)
    }
}

/// Accepts either the numeric level or its name
#[derive(Deserialize)]
#[serde(untagged)]
enum DebugLevelRepr {
    Number(u8),
    Name(String),
}

impl TryFrom<DebugLevelRepr> for DebugLevel {
    type Error = String;

    fn try_from(repr: DebugLevelRepr) -> Result<Self, Self::Error> {
        match repr {
            DebugLevelRepr::Number(n) => DebugLevel::try_from(n),
            DebugLevelRepr::Name(name) => name.parse(),
        }
    }
}

/// Decides, per iteration, which artifact roles get written
#[derive(Debug, Clone, Copy)]
pub struct PersistencePolicy {
    level: DebugLevel,
}

impl PersistencePolicy {
    pub fn new(level: DebugLevel) -> Self {
        Self { level }
    }

    pub fn level(&self) -> DebugLevel {
        self.level
    }

    /// Roles to write for an iteration with the given verdict, color first
    pub fn plan(&self, motion: bool) -> Vec<ArtifactRole> {
        let mut roles = Vec::with_capacity(ArtifactRole::ALL.len());
        if motion {
            roles.push(ArtifactRole::Color);
        }

        let auxiliaries = match self.level {
            DebugLevel::Off => false,
            DebugLevel::OnMotion => motion,
            DebugLevel::Always => true,
        };
        if auxiliaries {
            roles.extend_from_slice(&ArtifactRole::AUXILIARY);
        }
        roles
    }
}
