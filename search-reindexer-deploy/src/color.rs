//! The blue/green color tag.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One of the two rotating index slots for an alias.
///
/// At any instant one color is active (receiving queries) and the opposite
/// color is the staging target for the next deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeployColor {
    Blue,
    Green,
}

impl DeployColor {
    /// The opposite slot.
    pub fn opposite(self) -> Self {
        match self {
            DeployColor::Blue => DeployColor::Green,
            DeployColor::Green => DeployColor::Blue,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            DeployColor::Blue => "blue",
            DeployColor::Green => "green",
        }
    }

    /// Extract the color tag from an index name.
    ///
    /// Matches the `_blue_` / `_green_` substring; names without a tag have
    /// no color.
    pub fn from_index_name(name: &str) -> Option<Self> {
        if name.contains("_blue_") {
            Some(DeployColor::Blue)
        } else if name.contains("_green_") {
            Some(DeployColor::Green)
        } else {
            None
        }
    }
}

impl fmt::Display for DeployColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
