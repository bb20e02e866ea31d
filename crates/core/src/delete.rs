//! Confirmation-gated deletion.

use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::{
    editor::Invalidated,
    error::StoreError,
    models::{Chart, Player},
    page::{Page, PageQuery},
    store::{ListQuery, Record, RemoteStore},
};

/// Synchronous yes/no gate shown before a destructive action.
pub trait Confirm {
    /// Ask `prompt`; `true` means go ahead.
    fn confirm(&mut self, prompt: &str) -> bool;
}

impl<F: FnMut(&str) -> bool> Confirm for F {
    fn confirm(&mut self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// Records that can be removed through [`request_delete`].
#[async_trait]
pub trait Deletable: Record {
    /// Question put to the user.
    const PROMPT: &'static str;

    /// Rows that still reference `id` and would be orphaned.
    async fn dependents<S: RemoteStore>(_store: &S, _id: &Self::Id) -> Result<usize, StoreError> {
        Ok(0)
    }
}

#[async_trait]
impl Deletable for Player {
    const PROMPT: &'static str = "Delete this player?";

    async fn dependents<S: RemoteStore>(store: &S, id: &Self::Id) -> Result<usize, StoreError> {
        let charts: Vec<Chart> = store.list(&ListQuery::all().eq("player_id", id)).await?;
        Ok(charts.len())
    }
}

#[async_trait]
impl Deletable for Chart {
    const PROMPT: &'static str = "Delete this chart?";
}

/// Result of a delete request.
#[derive(Debug)]
pub enum DeleteOutcome {
    /// The user said no; nothing was sent.
    Declined,
    /// Row removed and the page reloaded.
    Deleted,
    /// Refused because other rows still reference the target.
    Blocked {
        /// Number of referencing rows.
        dependents: usize,
    },
    /// The store failed; the page keeps its current data.
    Failed(StoreError),
}

/// Confirm, delete `id`, then reload `page`.
pub async fn request_delete<R, S, Q, C>(
    store: &S,
    confirm: &mut C,
    id: &R::Id,
    page: &mut Page<Q>,
) -> DeleteOutcome
where
    R: Deletable,
    S: RemoteStore,
    Q: PageQuery,
    C: Confirm + ?Sized,
{
    if !confirm.confirm(R::PROMPT) {
        return DeleteOutcome::Declined;
    }

    let collection = R::COLLECTION;
    match R::dependents(store, id).await {
        Ok(0) => {}
        Ok(dependents) => {
            warn!(collection, %id, dependents, "delete blocked by referencing rows");
            return DeleteOutcome::Blocked { dependents };
        }
        Err(err) => {
            error!(collection, %id, ?err, "dependent check failed");
            return DeleteOutcome::Failed(err);
        }
    }

    if let Err(err) = store.delete::<R>(id).await {
        error!(collection, %id, ?err, "delete failed");
        return DeleteOutcome::Failed(err);
    }
    info!(collection, %id, "record deleted");
    page.reload(store, Invalidated::new()).await;
    DeleteOutcome::Deleted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        editor::CreateForm,
        form::{ChartForm, PlayerField, PlayerForm},
        models::ActorId,
        page::{LoadState, PlayerCharts, PlayerRoster},
        store::MemoryStore,
    };
    use chrono::NaiveDate;

    async fn player(store: &MemoryStore, name: &str) -> anyhow::Result<Player> {
        let (player, _) = CreateForm::new(PlayerForm::new().set_field(PlayerField::Name, name))
            .submit(store, ActorId::placeholder())
            .await?;
        Ok(player)
    }

    fn roster_ids(page: &Page<PlayerRoster>) -> Vec<String> {
        page.ready()
            .map(|players| players.iter().map(|p| p.id.to_string()).collect())
            .unwrap_or_default()
    }

    #[tokio::test]
    async fn confirmed_delete_removes_row_and_reloads() -> anyhow::Result<()> {
        let store = MemoryStore::new();
        let abe = player(&store, "Abe").await?;
        let mori = player(&store, "Mori").await?;
        let mut page = Page::new(PlayerRoster);
        page.load(&store).await;

        let mut asked = Vec::new();
        let mut confirm = |prompt: &str| {
            asked.push(prompt.to_string());
            true
        };
        let outcome =
            request_delete::<Player, _, _, _>(&store, &mut confirm, &abe.id, &mut page).await;
        assert!(matches!(outcome, DeleteOutcome::Deleted));
        assert_eq!(asked, vec![Player::PROMPT.to_string()]);
        assert_eq!(roster_ids(&page), vec![mori.id.to_string()]);
        Ok(())
    }

    #[tokio::test]
    async fn declined_delete_changes_nothing() -> anyhow::Result<()> {
        let store = MemoryStore::new();
        let abe = player(&store, "Abe").await?;
        let mut page = Page::new(PlayerRoster);
        page.load(&store).await;
        store.set_unavailable("players", true);

        let mut answer = |_: &str| false;
        let outcome =
            request_delete::<Player, _, _, _>(&store, &mut answer, &abe.id, &mut page).await;
        assert!(matches!(outcome, DeleteOutcome::Declined));
        assert_eq!(roster_ids(&page), vec![abe.id.to_string()]);

        store.set_unavailable("players", false);
        page.load(&store).await;
        assert_eq!(roster_ids(&page), vec![abe.id.to_string()]);
        Ok(())
    }

    #[tokio::test]
    async fn player_with_charts_is_not_deleted() -> anyhow::Result<()> {
        let store = MemoryStore::new();
        let abe = player(&store, "Abe").await?;
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let (_chart, _stale) = CreateForm::new(ChartForm::new(date, Some(abe.id.clone())))
            .submit(&store, ActorId::placeholder())
            .await?;
        let mut page = Page::new(PlayerRoster);
        page.load(&store).await;

        let mut answer = |_: &str| true;
        let outcome =
            request_delete::<Player, _, _, _>(&store, &mut answer, &abe.id, &mut page).await;
        assert!(matches!(outcome, DeleteOutcome::Blocked { dependents: 1 }));
        assert_eq!(store.row_count("players"), 1);
        Ok(())
    }

    #[tokio::test]
    async fn failed_delete_leaves_page_untouched() -> anyhow::Result<()> {
        let store = MemoryStore::new();
        let abe = player(&store, "Abe").await?;
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let (chart, _) = CreateForm::new(ChartForm::new(date, Some(abe.id.clone())))
            .submit(&store, ActorId::placeholder())
            .await?;
        let mut page = Page::new(PlayerCharts {
            player_id: abe.id.clone(),
        });
        page.load(&store).await;
        let before = page.state().clone();
        store.set_unavailable("charts", true);

        let mut answer = |_: &str| true;
        let outcome =
            request_delete::<Chart, _, _, _>(&store, &mut answer, &chart.id, &mut page).await;
        assert!(matches!(outcome, DeleteOutcome::Failed(_)));
        assert_eq!(page.state(), &before);
        assert!(matches!(page.state(), LoadState::Ready(charts) if charts.len() == 1));

        store.set_unavailable("charts", false);
        let outcome =
            request_delete::<Chart, _, _, _>(&store, &mut answer, &chart.id, &mut page).await;
        assert!(matches!(outcome, DeleteOutcome::Deleted));
        assert_eq!(page.state(), &LoadState::Ready(Vec::new()));
        Ok(())
    }
}
