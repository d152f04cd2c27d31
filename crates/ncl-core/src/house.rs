//! The story's great houses.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::NclError;

/// A story faction. Consequences are tagged with the houses they affect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum House {
    /// The crown house.
    Valdris,
    /// Merchant house of the river delta.
    Ashmere,
    /// Warrior house of the northern marches.
    Korvath,
    /// Scholar house of the old forests.
    Sylvenne,
    /// Shadow house of the southern ports.
    Thornwick,
}

impl House {
    /// All houses in declaration order.
    pub const ALL: [House; 5] = [
        House::Valdris,
        House::Ashmere,
        House::Korvath,
        House::Sylvenne,
        House::Thornwick,
    ];

    /// Display name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Valdris => "Valdris",
            Self::Ashmere => "Ashmere",
            Self::Korvath => "Korvath",
            Self::Sylvenne => "Sylvenne",
            Self::Thornwick => "Thornwick",
        }
    }
}

impl fmt::Display for House {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for House {
    type Err = NclError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        House::ALL
            .into_iter()
            .find(|h| h.name().eq_ignore_ascii_case(trimmed))
            .ok_or_else(|| NclError::InvalidInput(format!("unknown house: {trimmed}")))
    }
}

/// Join house names with ", ", or "The realm" when none are given.
pub fn join_houses(houses: &[House]) -> String {
    if houses.is_empty() {
        return "The realm".to_string();
    }
    houses
        .iter()
        .map(|h| h.name())
        .collect::<Vec<_>>()
        .join(", ")
}
