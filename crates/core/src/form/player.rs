use super::{normalize_text, RecordForm, RequiredField, ValidationFailure};
use crate::models::{ActorId, NewPlayer, Player, PlayerChanges};

/// Text fields of the player form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayerField {
    /// Display name (required).
    Name,
    /// Team affiliation.
    Team,
    /// Jersey number.
    Number,
}

impl PlayerField {
    /// Fields in form order.
    pub const ALL: [Self; 3] = [Self::Name, Self::Team, Self::Number];

    /// Form label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Name => "Name *",
            Self::Team => "Team",
            Self::Number => "Number",
        }
    }
}

/// Draft of a player registration or edit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerForm {
    name: String,
    team: String,
    number: String,
}

impl PlayerForm {
    /// Blank registration form.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current text of `field`.
    pub fn get(&self, field: PlayerField) -> &str {
        match field {
            PlayerField::Name => &self.name,
            PlayerField::Team => &self.team,
            PlayerField::Number => &self.number,
        }
    }

    /// Draft with `field` replaced by `value`.
    #[must_use]
    pub fn set_field(&self, field: PlayerField, value: impl Into<String>) -> Self {
        let mut next = self.clone();
        let slot = match field {
            PlayerField::Name => &mut next.name,
            PlayerField::Team => &mut next.team,
            PlayerField::Number => &mut next.number,
        };
        *slot = value.into();
        next
    }
}

impl RecordForm for PlayerForm {
    type Record = Player;

    fn from_record(record: &Player) -> Self {
        Self {
            name: record.name.clone(),
            team: record.team.clone().unwrap_or_default(),
            number: record.number.clone().unwrap_or_default(),
        }
    }

    fn missing_fields(&self) -> Vec<RequiredField> {
        if self.name.trim().is_empty() {
            vec![RequiredField::Name]
        } else {
            Vec::new()
        }
    }

    fn to_changes(&self) -> Result<PlayerChanges, ValidationFailure> {
        ValidationFailure::check(self.missing_fields())?;
        Ok(PlayerChanges {
            name: self.name.trim().to_string(),
            team: normalize_text(&self.team),
            number: normalize_text(&self.number),
        })
    }

    fn to_insert(&self, actor: ActorId) -> Result<NewPlayer, ValidationFailure> {
        let changes = self.to_changes()?;
        Ok(NewPlayer {
            user_id: actor,
            name: changes.name,
            team: changes.team,
            number: changes.number,
        })
    }
}
