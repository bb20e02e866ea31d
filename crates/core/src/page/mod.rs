//! List and detail page loading.

mod queries;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::{
    editor::Invalidated,
    error::{StoreError, GENERIC_FAILURE},
    store::RemoteStore,
};

pub use queries::{
    ChartDetail, ChartWithPlayer, PlayerCharts, PlayerDetail, PlayerRoster, PlayerWithCharts,
};

/// Why a page could not be loaded.
#[derive(Debug, Error)]
pub enum LoadFailure {
    /// The record the page is about does not exist.
    #[error("record not found")]
    NotFound,
    /// Any other failure, including a missing dependent record.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl LoadFailure {
    /// Classify a failure of the page's primary fetch.
    pub fn primary(err: StoreError) -> Self {
        if err.is_not_found() {
            Self::NotFound
        } else {
            Self::Store(err)
        }
    }
}

/// Loading lifecycle of one page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState<T> {
    /// Fetch in flight.
    Loading,
    /// Data available; an empty collection is still `Ready`.
    Ready(T),
    /// The requested record does not exist.
    NotFound,
    /// The fetch failed; carries a user-facing message.
    Errored(String),
}

/// What a page fetches when it is entered.
#[async_trait]
pub trait PageQuery: Send + Sync {
    /// Loaded data.
    type Output: Send;

    /// Short name used in logs.
    fn describe(&self) -> String;

    /// Issue the page's store requests.
    async fn fetch<S: RemoteStore>(&self, store: &S) -> Result<Self::Output, LoadFailure>;
}

/// A page bound to a query, tracking its load state.
pub struct Page<Q: PageQuery> {
    query: Q,
    state: LoadState<Q::Output>,
}

impl<Q: PageQuery> Page<Q> {
    /// Page in the `Loading` state; call [`Page::load`] to fetch.
    pub fn new(query: Q) -> Self {
        Self {
            query,
            state: LoadState::Loading,
        }
    }

    /// Query this page runs.
    pub fn query(&self) -> &Q {
        &self.query
    }

    /// Current state.
    pub fn state(&self) -> &LoadState<Q::Output> {
        &self.state
    }

    /// Loaded data, when ready.
    pub fn ready(&self) -> Option<&Q::Output> {
        match &self.state {
            LoadState::Ready(data) => Some(data),
            _ => None,
        }
    }

    /// Run the query and settle into `Ready`, `NotFound` or `Errored`.
    pub async fn load<S: RemoteStore>(&mut self, store: &S) {
        self.state = LoadState::Loading;
        let page = self.query.describe();
        self.state = match self.query.fetch(store).await {
            Ok(data) => {
                info!(%page, "page loaded");
                LoadState::Ready(data)
            }
            Err(LoadFailure::NotFound) => {
                warn!(%page, "page record not found");
                LoadState::NotFound
            }
            Err(LoadFailure::Store(err)) => {
                error!(%page, ?err, "page load failed");
                LoadState::Errored(GENERIC_FAILURE.to_string())
            }
        };
    }

    /// Re-run the load after a write made the current data stale.
    pub async fn reload<S: RemoteStore>(&mut self, store: &S, _stale: Invalidated) {
        self.load(store).await;
    }
}
