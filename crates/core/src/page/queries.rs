use async_trait::async_trait;

use super::{LoadFailure, PageQuery};
use crate::{
    models::{Chart, ChartId, Player, PlayerId},
    store::{ListQuery, RemoteStore},
};

/// Every player, ordered by name.
#[derive(Debug, Clone, Default)]
pub struct PlayerRoster;

#[async_trait]
impl PageQuery for PlayerRoster {
    type Output = Vec<Player>;

    fn describe(&self) -> String {
        "players".to_string()
    }

    async fn fetch<S: RemoteStore>(&self, store: &S) -> Result<Vec<Player>, LoadFailure> {
        Ok(store.list(&ListQuery::all().ascending("name")).await?)
    }
}

/// Charts of one player, most recent session first.
#[derive(Debug, Clone)]
pub struct PlayerCharts {
    /// Player whose charts are listed.
    pub player_id: PlayerId,
}

impl PlayerCharts {
    fn list_query(player_id: &PlayerId) -> ListQuery {
        ListQuery::all().eq("player_id", player_id).descending("date")
    }
}

#[async_trait]
impl PageQuery for PlayerCharts {
    type Output = Vec<Chart>;

    fn describe(&self) -> String {
        format!("charts of player {}", self.player_id)
    }

    async fn fetch<S: RemoteStore>(&self, store: &S) -> Result<Vec<Chart>, LoadFailure> {
        Ok(store.list(&Self::list_query(&self.player_id)).await?)
    }
}

/// A player together with their chart history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerWithCharts {
    /// The player.
    pub player: Player,
    /// Their charts, newest first.
    pub charts: Vec<Chart>,
}

/// Player detail page.
#[derive(Debug, Clone)]
pub struct PlayerDetail {
    /// Player shown.
    pub player_id: PlayerId,
}

#[async_trait]
impl PageQuery for PlayerDetail {
    type Output = PlayerWithCharts;

    fn describe(&self) -> String {
        format!("player {}", self.player_id)
    }

    async fn fetch<S: RemoteStore>(&self, store: &S) -> Result<PlayerWithCharts, LoadFailure> {
        let player: Player = store
            .get_by_id(&self.player_id)
            .await
            .map_err(LoadFailure::primary)?;
        let charts = store
            .list(&PlayerCharts::list_query(&self.player_id))
            .await?;
        Ok(PlayerWithCharts { player, charts })
    }
}

/// A chart together with the player it belongs to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartWithPlayer {
    /// The chart.
    pub chart: Chart,
    /// Its owning player.
    pub player: Player,
}

/// Chart detail page.
#[derive(Debug, Clone)]
pub struct ChartDetail {
    /// Chart shown.
    pub chart_id: ChartId,
}

#[async_trait]
impl PageQuery for ChartDetail {
    type Output = ChartWithPlayer;

    fn describe(&self) -> String {
        format!("chart {}", self.chart_id)
    }

    /// A missing chart is `NotFound`; a missing owner is an ordinary failure.
    async fn fetch<S: RemoteStore>(&self, store: &S) -> Result<ChartWithPlayer, LoadFailure> {
        let chart: Chart = store
            .get_by_id(&self.chart_id)
            .await
            .map_err(LoadFailure::primary)?;
        let player: Player = store.get_by_id(&chart.player_id).await?;
        Ok(ChartWithPlayer { chart, player })
    }
}
