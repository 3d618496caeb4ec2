//! Shift lifecycle status.

use serde::{Deserialize, Serialize};

/// Lifecycle status of a shift.
///
/// `Available -> Booked` happens only through a successful booking,
/// `Booked -> Available` only through a cancellation. `Completed` is set
/// outside this system and never left.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ShiftStatus {
    #[default]
    Available,
    Booked,
    Completed,
}

impl ShiftStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [Self; 3] = [Self::Available, Self::Booked, Self::Completed];

    /// Whether the shift can still be claimed.
    #[must_use]
    pub const fn is_available(self) -> bool {
        matches!(self, Self::Available)
    }

    /// Whether no further transitions are possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl std::fmt::Display for ShiftStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Available => write!(f, "Available"),
            Self::Booked => write!(f, "Booked"),
            Self::Completed => write!(f, "Completed"),
        }
    }
}

impl std::str::FromStr for ShiftStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "available" => Ok(Self::Available),
            "booked" => Ok(Self::Booked),
            "completed" => Ok(Self::Completed),
            _ => Err(format!("invalid shift status: {s}")),
        }
    }
}
