use chrono::NaiveDate;

use super::{normalize_text, RecordForm, RequiredField, ValidationFailure};
use crate::models::{ActorId, Chart, ChartChanges, ChartStatus, NewChart, PlayerId, Treatment};

/// Text fields of the chart form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChartField {
    /// Session date, `YYYY-MM-DD` (required).
    Date,
    /// S section.
    Subjective,
    /// O section.
    Objective,
    /// A section.
    Assessment,
    /// P section.
    Plan,
}

impl ChartField {
    /// Form label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Date => "Date *",
            Self::Subjective => "S (subjective)",
            Self::Objective => "O (objective)",
            Self::Assessment => "A (assessment)",
            Self::Plan => "P (plan)",
        }
    }
}

/// Draft of a chart, with the treatments kept as an ordered set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartForm {
    date: String,
    player_id: Option<PlayerId>,
    status: Option<ChartStatus>,
    subjective: String,
    objective: String,
    assessment: String,
    plan_text: String,
    treatments: Vec<Treatment>,
}

impl ChartForm {
    /// Create-form defaults: `today`, the first status, nothing else filled.
    pub fn new(today: NaiveDate, player_id: Option<PlayerId>) -> Self {
        Self {
            date: today.format("%Y-%m-%d").to_string(),
            player_id,
            status: Some(ChartStatus::default()),
            subjective: String::new(),
            objective: String::new(),
            assessment: String::new(),
            plan_text: String::new(),
            treatments: Vec::new(),
        }
    }

    /// Current text of `field`.
    pub fn get(&self, field: ChartField) -> &str {
        match field {
            ChartField::Date => &self.date,
            ChartField::Subjective => &self.subjective,
            ChartField::Objective => &self.objective,
            ChartField::Assessment => &self.assessment,
            ChartField::Plan => &self.plan_text,
        }
    }

    /// Selected player.
    pub fn player_id(&self) -> Option<&PlayerId> {
        self.player_id.as_ref()
    }

    /// Selected status.
    pub fn status(&self) -> Option<ChartStatus> {
        self.status
    }

    /// Selected treatments in the order they were ticked.
    pub fn treatments(&self) -> &[Treatment] {
        &self.treatments
    }

    /// True when `tag` is ticked.
    pub fn has_treatment(&self, tag: Treatment) -> bool {
        self.treatments.contains(&tag)
    }

    /// Draft with `field` replaced by `value`.
    #[must_use]
    pub fn set_field(&self, field: ChartField, value: impl Into<String>) -> Self {
        let mut next = self.clone();
        let slot = match field {
            ChartField::Date => &mut next.date,
            ChartField::Subjective => &mut next.subjective,
            ChartField::Objective => &mut next.objective,
            ChartField::Assessment => &mut next.assessment,
            ChartField::Plan => &mut next.plan_text,
        };
        *slot = value.into();
        next
    }

    /// Draft with the status replaced.
    #[must_use]
    pub fn with_status(&self, status: Option<ChartStatus>) -> Self {
        Self {
            status,
            ..self.clone()
        }
    }

    /// Draft with the owning player replaced.
    #[must_use]
    pub fn with_player(&self, player_id: Option<PlayerId>) -> Self {
        Self {
            player_id,
            ..self.clone()
        }
    }

    /// Draft with `tag` removed if ticked, appended otherwise.
    #[must_use]
    pub fn toggle_treatment(&self, tag: Treatment) -> Self {
        let mut next = self.clone();
        if let Some(index) = next.treatments.iter().position(|t| *t == tag) {
            next.treatments.remove(index);
        } else {
            next.treatments.push(tag);
        }
        next
    }

    fn required_missing(&self) -> Vec<RequiredField> {
        let mut missing = Vec::new();
        if self.date.trim().is_empty() {
            missing.push(RequiredField::Date);
        }
        if self.status.is_none() {
            missing.push(RequiredField::Status);
        }
        missing
    }

    fn normalized_treatments(&self) -> Option<Vec<Treatment>> {
        if self.treatments.is_empty() {
            None
        } else {
            Some(self.treatments.clone())
        }
    }
}

impl RecordForm for ChartForm {
    type Record = Chart;

    fn from_record(record: &Chart) -> Self {
        Self {
            date: record.date.format("%Y-%m-%d").to_string(),
            player_id: Some(record.player_id.clone()),
            status: Some(record.status),
            subjective: record.subjective.clone().unwrap_or_default(),
            objective: record.objective.clone().unwrap_or_default(),
            assessment: record.assessment.clone().unwrap_or_default(),
            plan_text: record.plan_text.clone().unwrap_or_default(),
            treatments: record.treatment_tags().to_vec(),
        }
    }

    /// Date and status; a new chart additionally needs a player, see [`RecordForm::to_insert`].
    fn missing_fields(&self) -> Vec<RequiredField> {
        self.required_missing()
    }

    fn to_changes(&self) -> Result<ChartChanges, ValidationFailure> {
        ValidationFailure::check(self.required_missing())?;
        let Some(status) = self.status else {
            return Err(ValidationFailure::new(vec![RequiredField::Status]));
        };
        Ok(ChartChanges {
            date: self.date.trim().to_string(),
            status,
            subjective: normalize_text(&self.subjective),
            objective: normalize_text(&self.objective),
            assessment: normalize_text(&self.assessment),
            plan_text: normalize_text(&self.plan_text),
            treatments: self.normalized_treatments(),
        })
    }

    fn to_insert(&self, actor: ActorId) -> Result<NewChart, ValidationFailure> {
        let mut missing = self.required_missing();
        if self.player_id.is_none() {
            missing.push(RequiredField::Player);
        }
        ValidationFailure::check(missing)?;

        let changes = self.to_changes()?;
        let Some(player_id) = self.player_id.clone() else {
            return Err(ValidationFailure::new(vec![RequiredField::Player]));
        };
        Ok(NewChart {
            date: changes.date,
            player_id,
            user_id: actor,
            status: changes.status,
            subjective: changes.subjective,
            objective: changes.objective,
            assessment: changes.assessment,
            plan_text: changes.plan_text,
            treatments: changes.treatments,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn may_first() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    fn tag_strategy() -> impl Strategy<Value = Treatment> {
        (0..Treatment::ALL.len()).prop_map(|index| Treatment::ALL[index])
    }

    #[test]
    fn defaults_use_today_and_first_status() {
        let form = ChartForm::new(may_first(), None);
        assert_eq!(form.get(ChartField::Date), "2024-05-01");
        assert_eq!(form.status(), Some(ChartStatus::FullParticipation));
        assert!(form.treatments().is_empty());
        assert!(form.player_id().is_none());
    }

    #[test]
    fn toggle_adds_then_removes_preserving_order() {
        let form = ChartForm::new(may_first(), None)
            .toggle_treatment(Treatment::Taping)
            .toggle_treatment(Treatment::Icing);
        assert_eq!(form.treatments(), &[Treatment::Taping, Treatment::Icing]);

        let form = form.toggle_treatment(Treatment::Taping);
        assert_eq!(form.treatments(), &[Treatment::Icing]);
        assert!(!form.has_treatment(Treatment::Taping));
    }

    #[test]
    fn empty_values_normalize_to_null() {
        let form = ChartForm::new(may_first(), Some(PlayerId::new("p1")))
            .set_field(ChartField::Subjective, "   ")
            .set_field(ChartField::Plan, " stretch daily ");
        let payload = form.to_insert(ActorId::placeholder()).unwrap();
        assert_eq!(payload.subjective, None);
        assert_eq!(payload.objective, None);
        assert_eq!(payload.assessment, None);
        assert_eq!(payload.plan_text.as_deref(), Some("stretch daily"));
        assert_eq!(payload.treatments, None);
    }

    #[test]
    fn validation_fails_exactly_when_a_required_field_is_empty() {
        let base = ChartForm::new(may_first(), Some(PlayerId::new("p1")));
        for clear_date in [false, true] {
            for clear_status in [false, true] {
                let mut form = base.clone();
                if clear_date {
                    form = form.set_field(ChartField::Date, " ");
                }
                if clear_status {
                    form = form.with_status(None);
                }

                let mut expected = Vec::new();
                if clear_date {
                    expected.push(RequiredField::Date);
                }
                if clear_status {
                    expected.push(RequiredField::Status);
                }

                match form.to_changes() {
                    Ok(_) => assert!(expected.is_empty()),
                    Err(failure) => assert_eq!(failure.missing, expected),
                }
                assert_eq!(form.missing_fields(), expected);
            }
        }
    }

    #[test]
    fn new_chart_requires_a_player() {
        let form = ChartForm::new(may_first(), None).with_status(None);
        let failure = form.to_insert(ActorId::placeholder()).unwrap_err();
        assert_eq!(
            failure.missing,
            vec![RequiredField::Status, RequiredField::Player]
        );
        assert!(form
            .with_status(Some(ChartStatus::Observation))
            .to_changes()
            .is_ok());
    }

    #[test]
    fn malformed_date_is_left_to_the_store() {
        let form = ChartForm::new(may_first(), None).set_field(ChartField::Date, "next tuesday");
        assert_eq!(form.to_changes().unwrap().date, "next tuesday");
    }

    proptest! {
        #[test]
        fn double_toggle_restores_membership(
            sequence in proptest::collection::vec(tag_strategy(), 0..16),
            tag in tag_strategy(),
        ) {
            let form = sequence
                .iter()
                .fold(ChartForm::new(may_first(), None), |form, t| form.toggle_treatment(*t));
            let twice = form.toggle_treatment(tag).toggle_treatment(tag);
            for candidate in Treatment::ALL {
                prop_assert_eq!(form.has_treatment(candidate), twice.has_treatment(candidate));
            }
        }

        #[test]
        fn treatments_never_duplicate_or_serialize_empty(
            sequence in proptest::collection::vec(tag_strategy(), 0..24),
        ) {
            let form = sequence
                .iter()
                .fold(ChartForm::new(may_first(), None), |form, t| form.toggle_treatment(*t));
            let mut seen = form.treatments().to_vec();
            seen.sort_by_key(|t| t.label());
            seen.dedup();
            prop_assert_eq!(seen.len(), form.treatments().len());

            let changes = form.to_changes().unwrap();
            prop_assert!(changes.treatments.map_or(true, |tags| !tags.is_empty()));
        }

        #[test]
        fn optional_text_never_serializes_empty(text in "[ \\ta-z]{0,6}") {
            let form = ChartForm::new(may_first(), None)
                .set_field(ChartField::Subjective, text.clone())
                .set_field(ChartField::Objective, text.clone())
                .set_field(ChartField::Assessment, text.clone())
                .set_field(ChartField::Plan, text);
            let changes = form.to_changes().unwrap();
            let texts = [
                changes.subjective,
                changes.objective,
                changes.assessment,
                changes.plan_text,
            ];
            for value in texts {
                prop_assert!(value.map_or(true, |v| !v.is_empty()));
            }
        }
    }
}
