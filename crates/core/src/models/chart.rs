use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::{ActorId, ChartId, PlayerId};
use crate::store::Record;

/// How far a player took part in the session.
///
/// Serialized with the labels the `charts` table stores; the English variant
/// names are accepted on read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChartStatus {
    /// Trained with the full squad.
    #[serde(rename = "完全合流", alias = "FullParticipation")]
    FullParticipation,
    /// Joined part of the session.
    #[serde(rename = "一部参加", alias = "PartialParticipation")]
    PartialParticipation,
    /// Followed a separate programme.
    #[serde(rename = "別メニュー", alias = "AlternateProgram")]
    AlternateProgram,
    /// Watched only.
    #[serde(rename = "見学", alias = "Observation")]
    Observation,
}

impl ChartStatus {
    /// Every status in presentation order.
    pub const ALL: [Self; 4] = [
        Self::FullParticipation,
        Self::PartialParticipation,
        Self::AlternateProgram,
        Self::Observation,
    ];

    /// Stored label.
    pub fn label(self) -> &'static str {
        match self {
            Self::FullParticipation => "完全合流",
            Self::PartialParticipation => "一部参加",
            Self::AlternateProgram => "別メニュー",
            Self::Observation => "見学",
        }
    }

    /// Variant name.
    pub fn name(self) -> &'static str {
        match self {
            Self::FullParticipation => "FullParticipation",
            Self::PartialParticipation => "PartialParticipation",
            Self::AlternateProgram => "AlternateProgram",
            Self::Observation => "Observation",
        }
    }

    /// Status after `self` in [`ChartStatus::ALL`], wrapping around.
    pub fn cycle(self, delta: isize) -> Self {
        cycle(&Self::ALL, self, delta)
    }
}

impl Default for ChartStatus {
    fn default() -> Self {
        Self::ALL[0]
    }
}

impl fmt::Display for ChartStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Care action applied during a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Treatment {
    /// Icing.
    #[serde(rename = "アイシング", alias = "Icing")]
    Icing,
    /// Taping.
    #[serde(rename = "テーピング", alias = "Taping")]
    Taping,
    /// Massage.
    #[serde(rename = "マッサージ", alias = "Massage")]
    Massage,
    /// Stretching guidance.
    #[serde(rename = "ストレッチ指導", alias = "StretchingGuidance")]
    StretchingGuidance,
    /// Strength training guidance.
    #[serde(rename = "筋力トレーニング指導", alias = "StrengthTrainingGuidance")]
    StrengthTrainingGuidance,
    /// Range of motion training.
    #[serde(rename = "可動域訓練", alias = "RangeOfMotionTraining")]
    RangeOfMotionTraining,
    /// Electrical stimulation therapy.
    #[serde(rename = "電気療法", alias = "ElectricalTherapy")]
    ElectricalTherapy,
    /// Ultrasound therapy.
    #[serde(rename = "超音波療法", alias = "UltrasoundTherapy")]
    UltrasoundTherapy,
}

impl Treatment {
    /// Every treatment in presentation order.
    pub const ALL: [Self; 8] = [
        Self::Icing,
        Self::Taping,
        Self::Massage,
        Self::StretchingGuidance,
        Self::StrengthTrainingGuidance,
        Self::RangeOfMotionTraining,
        Self::ElectricalTherapy,
        Self::UltrasoundTherapy,
    ];

    /// Stored label.
    pub fn label(self) -> &'static str {
        match self {
            Self::Icing => "アイシング",
            Self::Taping => "テーピング",
            Self::Massage => "マッサージ",
            Self::StretchingGuidance => "ストレッチ指導",
            Self::StrengthTrainingGuidance => "筋力トレーニング指導",
            Self::RangeOfMotionTraining => "可動域訓練",
            Self::ElectricalTherapy => "電気療法",
            Self::UltrasoundTherapy => "超音波療法",
        }
    }
}

impl fmt::Display for Treatment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

fn cycle<T: Copy + PartialEq>(all: &[T], current: T, delta: isize) -> T {
    let len = all.len() as isize;
    let index = all.iter().position(|value| *value == current).unwrap_or(0) as isize;
    all[(index + delta).rem_euclid(len) as usize]
}

/// A SOAP treatment note, as stored in the `charts` collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chart {
    /// Store-assigned identifier.
    pub id: ChartId,
    /// Store-assigned creation time.
    pub created_at: DateTime<Utc>,
    /// Session date.
    pub date: NaiveDate,
    /// Owning player; fixed at creation.
    pub player_id: PlayerId,
    /// Actor that wrote the chart.
    pub user_id: ActorId,
    /// Participation status.
    pub status: ChartStatus,
    /// S: symptoms reported by the player.
    pub subjective: Option<String>,
    /// O: trainer's findings.
    pub objective: Option<String>,
    /// A: assessment.
    pub assessment: Option<String>,
    /// P: rehabilitation and guidance plan.
    pub plan_text: Option<String>,
    /// Treatments applied; `None` rather than empty.
    pub treatments: Option<Vec<Treatment>>,
}

impl Chart {
    /// Applied treatments, empty when none were recorded.
    pub fn treatment_tags(&self) -> &[Treatment] {
        self.treatments.as_deref().unwrap_or(&[])
    }

    /// The four SOAP sections that carry text, labelled for display.
    pub fn soap_sections(&self) -> Vec<(&'static str, &str)> {
        [
            ("S (subjective)", self.subjective.as_deref()),
            ("O (objective)", self.objective.as_deref()),
            ("A (assessment)", self.assessment.as_deref()),
            ("P (plan)", self.plan_text.as_deref()),
        ]
        .into_iter()
        .filter_map(|(label, text)| text.map(|text| (label, text)))
        .collect()
    }
}

impl Record for Chart {
    const COLLECTION: &'static str = "charts";
    type Id = ChartId;
    type Insert = NewChart;
    type Update = ChartChanges;

    fn id(&self) -> &ChartId {
        &self.id
    }
}

/// Insert payload for a chart. Empty optional fields serialize as `null`.
///
/// `date` is passed through as entered; the store decides whether it is a
/// valid calendar date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewChart {
    /// Session date, `YYYY-MM-DD`.
    pub date: String,
    /// Owning player.
    pub player_id: PlayerId,
    /// Actor writing the chart.
    pub user_id: ActorId,
    /// Participation status.
    pub status: ChartStatus,
    /// S section.
    pub subjective: Option<String>,
    /// O section.
    pub objective: Option<String>,
    /// A section.
    pub assessment: Option<String>,
    /// P section.
    pub plan_text: Option<String>,
    /// Applied treatments; never an empty list.
    pub treatments: Option<Vec<Treatment>>,
}

/// Replacement of a chart's editable fields. The owning player is not editable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartChanges {
    /// Session date, `YYYY-MM-DD`.
    pub date: String,
    /// Participation status.
    pub status: ChartStatus,
    /// S section.
    pub subjective: Option<String>,
    /// O section.
    pub objective: Option<String>,
    /// A section.
    pub assessment: Option<String>,
    /// P section.
    pub plan_text: Option<String>,
    /// Applied treatments; never an empty list.
    pub treatments: Option<Vec<Treatment>>,
}
