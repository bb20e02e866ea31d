//! Addressable screens and their path form.

use std::{fmt, str::FromStr};

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::models::{ChartId, PlayerId};

static PLAYER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^/players/([^/?]+)$").expect("invalid player route regex"));
static NEW_CHART_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^/charts/new(?:\?playerId=([^&]*))?$").expect("invalid new chart route regex")
});
static CHART_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^/charts/([^/?]+)$").expect("invalid chart route regex"));

/// Path did not name any screen.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown route: {0}")]
pub struct RouteError(pub String);

/// A screen of the application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// Landing menu.
    Home,
    /// Player roster.
    Players,
    /// One player and their charts.
    Player(PlayerId),
    /// Chart creation, optionally for a preselected player.
    NewChart {
        /// Player picked up front.
        player_id: Option<PlayerId>,
    },
    /// One chart.
    Chart(ChartId),
}

impl Route {
    /// Parse a path such as `/players/abc` or `/charts/new?playerId=abc`.
    pub fn parse(path: &str) -> Result<Self, RouteError> {
        let trimmed = path.trim();
        let normalized = match trimmed.strip_suffix('/') {
            Some(rest) if !rest.is_empty() => rest,
            _ => trimmed,
        };

        match normalized {
            "" | "/" => return Ok(Self::Home),
            "/players" => return Ok(Self::Players),
            _ => {}
        }

        // checked before CHART_RE so "new" is never taken as an id
        if let Some(caps) = NEW_CHART_RE.captures(normalized) {
            let player_id = caps
                .get(1)
                .map(|m| m.as_str())
                .filter(|raw| !raw.is_empty())
                .map(PlayerId::new);
            return Ok(Self::NewChart { player_id });
        }
        if let Some(caps) = PLAYER_RE.captures(normalized) {
            return Ok(Self::Player(PlayerId::new(&caps[1])));
        }
        if let Some(caps) = CHART_RE.captures(normalized) {
            return Ok(Self::Chart(ChartId::new(&caps[1])));
        }
        Err(RouteError(path.to_string()))
    }
}

impl FromStr for Route {
    type Err = RouteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Home => f.write_str("/"),
            Self::Players => f.write_str("/players"),
            Self::Player(id) => write!(f, "/players/{id}"),
            Self::NewChart { player_id: None } => f.write_str("/charts/new"),
            Self::NewChart {
                player_id: Some(id),
            } => write!(f, "/charts/new?playerId={id}"),
            Self::Chart(id) => write!(f, "/charts/{id}"),
        }
    }
}
