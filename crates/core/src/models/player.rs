use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ActorId, PlayerId};
use crate::store::Record;

/// A registered player, as stored in the `players` collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Store-assigned identifier.
    pub id: PlayerId,
    /// Store-assigned creation time.
    pub created_at: DateTime<Utc>,
    /// Actor that registered the player.
    pub user_id: ActorId,
    /// Display name; never empty.
    pub name: String,
    /// Team affiliation, `None` when not entered.
    pub team: Option<String>,
    /// Jersey number kept as free text, `None` when not entered.
    pub number: Option<String>,
}

impl Player {
    /// Label combining name, jersey number and team, e.g. `Yamada Taro (7) - Tigers`.
    pub fn display_name(&self) -> String {
        let mut label = self.name.clone();
        if let Some(number) = self.number.as_deref() {
            label.push_str(&format!(" ({number})"));
        }
        if let Some(team) = self.team.as_deref() {
            label.push_str(&format!(" - {team}"));
        }
        label
    }
}

impl Record for Player {
    const COLLECTION: &'static str = "players";
    type Id = PlayerId;
    type Insert = NewPlayer;
    type Update = PlayerChanges;

    fn id(&self) -> &PlayerId {
        &self.id
    }
}

/// Insert payload for a player. Optional fields serialize as `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewPlayer {
    /// Actor performing the registration.
    pub user_id: ActorId,
    /// Display name.
    pub name: String,
    /// Team affiliation.
    pub team: Option<String>,
    /// Jersey number.
    pub number: Option<String>,
}

/// Full replacement of a player's editable fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerChanges {
    /// Display name.
    pub name: String,
    /// Team affiliation.
    pub team: Option<String>,
    /// Jersey number.
    pub number: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn display_name_skips_missing_parts() {
        let mut player = Player {
            id: PlayerId::new("p1"),
            created_at: Utc::now(),
            user_id: ActorId::placeholder(),
            name: "Yamada Taro".to_string(),
            team: None,
            number: Some("7".to_string()),
        };
        assert_eq!(player.display_name(), "Yamada Taro (7)");

        player.team = Some("Tigers".to_string());
        player.number = None;
        assert_eq!(player.display_name(), "Yamada Taro - Tigers");
    }

    #[test]
    fn insert_payload_keeps_explicit_nulls() -> anyhow::Result<()> {
        let payload = NewPlayer {
            user_id: ActorId::placeholder(),
            name: "Sato".to_string(),
            team: None,
            number: None,
        };
        let value = serde_json::to_value(&payload)?;
        assert_eq!(value["team"], json!(null));
        assert_eq!(value["number"], json!(null));
        assert_eq!(
            value["user_id"],
            json!("00000000-0000-0000-0000-000000000000")
        );
        Ok(())
    }
}
