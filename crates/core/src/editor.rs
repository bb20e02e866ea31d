//! View/edit mode handling for existing records and submit flow for new ones.

use tracing::{error, info, warn};

use crate::{
    error::SubmitError,
    form::RecordForm,
    models::ActorId,
    store::{Record, RemoteStore},
};

/// Proof that a write succeeded and the view showing it is now stale.
///
/// Hand it to [`Page::reload`](crate::page::Page::reload) so the page
/// re-issues its load instead of patching local state.
#[must_use = "a successful write invalidates the loaded view; reload it"]
#[derive(Debug)]
pub struct Invalidated {
    _private: (),
}

impl Invalidated {
    pub(crate) fn new() -> Self {
        Self { _private: () }
    }
}

/// Presentation mode of an existing record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode<F> {
    /// Read-only presentation of the loaded record.
    Viewing,
    /// Draft being edited.
    Editing(F),
}

/// Toggles an existing record between viewing and editing.
#[derive(Debug, Clone)]
pub struct ModeController<F> {
    mode: Mode<F>,
}

impl<F: RecordForm> Default for ModeController<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F: RecordForm> ModeController<F> {
    /// Controller in [`Mode::Viewing`].
    pub fn new() -> Self {
        Self {
            mode: Mode::Viewing,
        }
    }

    /// Current mode.
    pub fn mode(&self) -> &Mode<F> {
        &self.mode
    }

    /// True while a draft is open.
    pub fn is_editing(&self) -> bool {
        matches!(self.mode, Mode::Editing(_))
    }

    /// Open draft, if editing.
    pub fn draft(&self) -> Option<&F> {
        match &self.mode {
            Mode::Editing(draft) => Some(draft),
            Mode::Viewing => None,
        }
    }

    /// Seed a draft from `record`. Ignored when a draft is already open.
    pub fn start_edit(&mut self, record: &F::Record) {
        if let Mode::Viewing = self.mode {
            self.mode = Mode::Editing(F::from_record(record));
        }
    }

    /// Replace the open draft with `change(draft)`.
    pub fn edit(&mut self, change: impl FnOnce(&F) -> F) {
        if let Mode::Editing(draft) = &mut self.mode {
            *draft = change(draft);
        }
    }

    /// Discard the draft without touching the store.
    pub fn cancel(&mut self) {
        self.mode = Mode::Viewing;
    }

    /// Validate and write the draft as an update of `id`.
    ///
    /// On success the controller returns to [`Mode::Viewing`]. On any failure
    /// it stays in [`Mode::Editing`] with the draft unchanged.
    pub async fn submit<S: RemoteStore>(
        &mut self,
        store: &S,
        id: &<F::Record as Record>::Id,
    ) -> Result<Invalidated, SubmitError> {
        let Mode::Editing(draft) = &self.mode else {
            return Err(SubmitError::NotEditing);
        };
        let collection = F::Record::COLLECTION;
        let changes = draft.to_changes().map_err(|failure| {
            warn!(collection, %id, %failure, "update blocked by validation");
            failure
        })?;

        if let Err(err) = store.update::<F::Record>(id, &changes).await {
            error!(collection, %id, ?err, "update failed");
            return Err(err.into());
        }

        info!(collection, %id, "record updated");
        self.mode = Mode::Viewing;
        Ok(Invalidated::new())
    }
}

/// Create pages skip the viewing state and start straight from a draft.
#[derive(Debug, Clone)]
pub struct CreateForm<F> {
    draft: F,
}

impl<F: RecordForm> CreateForm<F> {
    /// Start from `draft`, usually the form's defaults.
    pub fn new(draft: F) -> Self {
        Self { draft }
    }

    /// Current draft.
    pub fn draft(&self) -> &F {
        &self.draft
    }

    /// Replace the draft with `change(draft)`.
    pub fn edit(&mut self, change: impl FnOnce(&F) -> F) {
        self.draft = change(&self.draft);
    }

    /// Validate and insert the draft on behalf of `actor`.
    ///
    /// The draft is kept on failure so the user can correct and retry.
    pub async fn submit<S: RemoteStore>(
        &mut self,
        store: &S,
        actor: ActorId,
    ) -> Result<(F::Record, Invalidated), SubmitError> {
        let collection = F::Record::COLLECTION;
        let payload = self.draft.to_insert(actor).map_err(|failure| {
            warn!(collection, %failure, "insert blocked by validation");
            failure
        })?;

        match store.insert::<F::Record>(&payload).await {
            Ok(record) => {
                info!(collection, id = %record.id(), %actor, "record created");
                Ok((record, Invalidated::new()))
            }
            Err(err) => {
                error!(collection, ?err, "insert failed");
                Err(err.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::GENERIC_FAILURE,
        form::{ChartField, ChartForm, PlayerField, PlayerForm, RequiredField},
        models::{Chart, ChartStatus, Player, Treatment},
        store::MemoryStore,
    };
    use chrono::NaiveDate;

    async fn seed_player(store: &MemoryStore, name: &str) -> anyhow::Result<Player> {
        let mut create = CreateForm::new(PlayerForm::new().set_field(PlayerField::Name, name));
        let (player, _) = create.submit(store, ActorId::placeholder()).await?;
        Ok(player)
    }

    async fn seed_chart(store: &MemoryStore, player: &Player) -> anyhow::Result<Chart> {
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let mut create = CreateForm::new(ChartForm::new(date, Some(player.id.clone())));
        let (chart, _) = create.submit(store, ActorId::placeholder()).await?;
        Ok(chart)
    }

    #[tokio::test]
    async fn submit_then_reload_returns_submitted_draft() -> anyhow::Result<()> {
        let store = MemoryStore::new();
        let player = seed_player(&store, "Yamada Taro").await?;
        let chart = seed_chart(&store, &player).await?;

        let mut editor = ModeController::<ChartForm>::new();
        editor.start_edit(&chart);
        editor.edit(|draft| {
            draft
                .set_field(ChartField::Date, "2024-05-03")
                .set_field(ChartField::Assessment, "mild sprain")
                .with_status(Some(ChartStatus::PartialParticipation))
                .toggle_treatment(Treatment::Icing)
        });
        let expected = editor.draft().cloned().unwrap();

        let _invalidated = editor.submit(&store, &chart.id).await?;
        assert_eq!(editor.mode(), &Mode::Viewing);

        let reloaded: Chart = store.get_by_id(&chart.id).await?;
        assert_eq!(ChartForm::from_record(&reloaded), expected);
        assert_eq!(reloaded.player_id, player.id);
        assert_eq!(reloaded.created_at, chart.created_at);
        Ok(())
    }

    #[tokio::test]
    async fn validation_failure_keeps_draft_and_skips_store() -> anyhow::Result<()> {
        let store = MemoryStore::new();
        let player = seed_player(&store, "Sato").await?;

        let mut editor = ModeController::<PlayerForm>::new();
        editor.start_edit(&player);
        editor.edit(|draft| draft.set_field(PlayerField::Name, "  "));
        store.set_unavailable("players", true);

        let err = editor.submit(&store, &player.id).await.unwrap_err();
        match err {
            SubmitError::Validation(failure) => {
                assert_eq!(failure.missing, vec![RequiredField::Name])
            }
            other => panic!("expected validation failure, got {other:?}"),
        }
        assert!(editor.is_editing());
        assert_eq!(editor.draft().unwrap().get(PlayerField::Name), "  ");
        Ok(())
    }

    #[tokio::test]
    async fn store_failure_stays_in_editing() -> anyhow::Result<()> {
        let store = MemoryStore::new();
        let player = seed_player(&store, "Sato").await?;

        let mut editor = ModeController::<PlayerForm>::new();
        editor.start_edit(&player);
        editor.edit(|draft| draft.set_field(PlayerField::Team, "Tigers"));
        store.delete::<Player>(&player.id).await?;

        let err = editor.submit(&store, &player.id).await.unwrap_err();
        assert_eq!(err.user_message(), GENERIC_FAILURE);
        assert_eq!(editor.draft().unwrap().get(PlayerField::Team), "Tigers");
        Ok(())
    }

    #[tokio::test]
    async fn cancel_discards_draft() -> anyhow::Result<()> {
        let store = MemoryStore::new();
        let player = seed_player(&store, "Sato").await?;

        let mut editor = ModeController::<PlayerForm>::new();
        editor.start_edit(&player);
        editor.edit(|draft| draft.set_field(PlayerField::Name, "Changed"));
        editor.cancel();
        assert_eq!(editor.mode(), &Mode::Viewing);
        assert!(matches!(
            editor.submit(&store, &player.id).await,
            Err(SubmitError::NotEditing)
        ));

        let stored: Player = store.get_by_id(&player.id).await?;
        assert_eq!(stored.name, "Sato");
        Ok(())
    }

    #[tokio::test]
    async fn create_keeps_draft_when_store_rejects() -> anyhow::Result<()> {
        let store = MemoryStore::new();
        store.set_unavailable("players", true);
        let mut create =
            CreateForm::new(PlayerForm::new().set_field(PlayerField::Name, "Yamada Taro"));
        let err = create.submit(&store, ActorId::placeholder()).await.unwrap_err();
        assert!(matches!(err, SubmitError::Store(_)));
        assert_eq!(create.draft().get(PlayerField::Name), "Yamada Taro");
        Ok(())
    }
}
