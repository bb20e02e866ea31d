#![warn(clippy::all, missing_docs)]

//! Core domain logic for Trainer's Log.
//!
//! This crate hosts the player and chart models, configuration handling,
//! the remote store client, and the form, page and delete controllers
//! used by the terminal UI and any future frontends.

pub mod config;
pub mod delete;
pub mod editor;
pub mod error;
pub mod form;
pub mod models;
pub mod page;
pub mod route;
pub mod store;

pub use crate::config::AppConfig;
pub use editor::{CreateForm, Invalidated, Mode, ModeController};
pub use error::{StoreError, SubmitError};
pub use form::{ChartField, ChartForm, PlayerField, PlayerForm, RecordForm, ValidationFailure};
pub use models::{
    ActorId, Chart, ChartId, ChartStatus, NewChart, NewPlayer, Player, PlayerId, Treatment,
};
pub use page::{LoadFailure, LoadState, Page, PageQuery};
pub use route::Route;
pub use store::{ListQuery, MemoryStore, Record, RemoteStore, RestStore};
