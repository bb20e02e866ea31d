//! Shared domain models.

mod chart;
mod player;

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub use chart::{Chart, ChartChanges, ChartStatus, NewChart, Treatment};
pub use player::{NewPlayer, Player, PlayerChanges};

/// Store-assigned identifier of a player row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(String);

/// Store-assigned identifier of a chart row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChartId(String);

macro_rules! string_id {
    ($name:ident) => {
        impl $name {
            /// Wrap a raw identifier.
            pub fn new(raw: impl Into<String>) -> Self {
                Self(raw.into())
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(raw: &str) -> Self {
                Self::new(raw)
            }
        }
    };
}

string_id!(PlayerId);
string_id!(ChartId);

/// Identity of whoever performs a write.
///
/// There is no authentication yet, so every deployment runs as a single
/// configured actor. [`ActorId::placeholder`] is the nil UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActorId(Uuid);

impl ActorId {
    /// Wrap a concrete actor UUID.
    pub fn new(id: Uuid) -> Self {
        Self(id)
    }

    /// The unauthenticated stand-in identity.
    pub fn placeholder() -> Self {
        Self(Uuid::nil())
    }

    /// True for the unauthenticated stand-in identity.
    pub fn is_placeholder(&self) -> bool {
        self.0.is_nil()
    }
}

impl Default for ActorId {
    fn default() -> Self {
        Self::placeholder()
    }
}

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}
