use std::{io, thread, time::Duration};

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use trainers_log_core::{
    delete::{request_delete, DeleteOutcome},
    error::GENERIC_FAILURE,
    ActorId, Chart, LoadState, Player, RemoteStore, Route,
};

use crate::{
    screens::{Action, Command, DeleteTarget, PlayerDraft, Screen},
    ui::Theme,
};

const TICK_RATE: Duration = Duration::from_millis(250);
const UNKNOWN_PLAYER: &str = "That player is not on the roster; choose one";

enum AppEvent {
    Input(Event),
    Tick,
}

pub(crate) struct UiState {
    pub status: String,
    pub busy: bool,
    should_quit: bool,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            status: "Ready".to_string(),
            busy: false,
            should_quit: false,
        }
    }
}

impl UiState {
    fn set_status(&mut self, status: String) {
        self.status = status;
    }
}

/// Terminal frontend over any [`RemoteStore`].
pub struct TrainersLogApp<S> {
    store: S,
    actor: ActorId,
    pub(crate) screen: Screen,
    pub(crate) state: UiState,
    pub(crate) theme: Theme,
    pending: Option<Command>,
}

impl<S: RemoteStore> TrainersLogApp<S> {
    pub fn new(store: S, actor: ActorId, route: Route) -> Self {
        let mut app = Self {
            store,
            actor,
            screen: Screen::Home { cursor: 0 },
            state: UiState::default(),
            theme: Theme::default(),
            pending: None,
        };
        app.navigate(route);
        app
    }

    pub async fn run(&mut self) -> Result<()> {
        let mut stdout = io::stdout();
        enable_raw_mode().context("failed to enter raw mode")?;
        execute!(stdout, EnterAlternateScreen).context("failed to enter alternate screen")?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).context("failed to create terminal")?;
        terminal.hide_cursor()?;
        terminal.clear()?;

        let (event_tx, mut event_rx) = mpsc::channel::<AppEvent>(128);
        spawn_input_thread(event_tx);

        let outcome = self.event_loop(&mut terminal, &mut event_rx).await;
        restore_terminal(&mut terminal)?;
        outcome
    }

    async fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
        event_rx: &mut mpsc::Receiver<AppEvent>,
    ) -> Result<()> {
        loop {
            terminal.draw(|frame| self.draw(frame))?;
            if self.state.should_quit {
                break;
            }

            // input stays queued in the channel until the round-trip settles
            if let Some(command) = self.pending.take() {
                self.state.busy = true;
                terminal.draw(|frame| self.draw(frame))?;
                self.execute(command).await;
                self.state.busy = false;
                continue;
            }

            let maybe_event = event_rx.recv().await;
            if !self.process_app_event(maybe_event) {
                break;
            }
        }
        Ok(())
    }

    fn process_app_event(&mut self, maybe_event: Option<AppEvent>) -> bool {
        match maybe_event {
            Some(AppEvent::Input(Event::Key(key))) => {
                if key.kind == KeyEventKind::Press {
                    self.handle_key(key);
                }
                true
            }
            Some(AppEvent::Input(_)) | Some(AppEvent::Tick) => true,
            None => false,
        }
    }

    pub(crate) fn handle_key(&mut self, key: KeyEvent) {
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.state.should_quit = true;
            return;
        }
        let action = self.screen.handle_key(key);
        self.apply(action);
    }

    fn apply(&mut self, action: Action) {
        match action {
            Action::None => {}
            Action::Quit => self.state.should_quit = true,
            Action::Go(route) => self.navigate(route),
            Action::Run(command) => self.pending = Some(command),
            Action::Status(message) => self.state.set_status(message),
        }
    }

    fn navigate(&mut self, route: Route) {
        debug!(%route, "navigate");
        self.screen = Screen::open(route, today());
        if !matches!(self.screen, Screen::Home { .. }) {
            self.pending = Some(Command::Load);
        }
    }

    pub(crate) fn route(&self) -> Route {
        self.screen.route()
    }

    async fn execute(&mut self, command: Command) {
        match command {
            Command::Load => self.load_screen().await,
            Command::SubmitPlayer => self.submit_player().await,
            Command::SubmitNewChart => self.submit_new_chart().await,
            Command::SubmitChartEdit => self.submit_chart_edit().await,
            Command::Delete { target, confirmed } => self.delete(target, confirmed).await,
        }
    }

    async fn load_screen(&mut self) {
        let problem = match &mut self.screen {
            Screen::Home { .. } => None,
            Screen::Players(view) => {
                view.page.load(&self.store).await;
                view.clamp();
                load_problem(view.page.state())
            }
            Screen::Player(view) => {
                view.page.load(&self.store).await;
                view.clamp();
                load_problem(view.page.state())
            }
            Screen::NewChart(view) => {
                view.roster.load(&self.store).await;
                if view.drop_unknown_player() {
                    warn!("preselected player is not on the roster");
                    Some(UNKNOWN_PLAYER.to_string())
                } else {
                    load_problem(view.roster.state())
                }
            }
            Screen::Chart(view) => {
                view.page.load(&self.store).await;
                load_problem(view.page.state())
            }
        };
        if let Some(message) = problem {
            self.state.set_status(message);
        }
    }

    async fn submit_player(&mut self) {
        let Screen::Players(view) = &mut self.screen else {
            return;
        };
        let Some(modal) = view.modal.as_mut() else {
            return;
        };
        let result = match &mut modal.draft {
            PlayerDraft::Create(create) => create
                .submit(&self.store, self.actor)
                .await
                .map(|(player, stale)| (format!("Registered {}", player.name), stale)),
            PlayerDraft::Edit { id, editor } => {
                let id = id.clone();
                editor
                    .submit(&self.store, &id)
                    .await
                    .map(|stale| ("Player updated".to_string(), stale))
            }
        };
        match result {
            Ok((message, stale)) => {
                view.modal = None;
                view.page.reload(&self.store, stale).await;
                view.clamp();
                self.state.set_status(message);
            }
            Err(err) => self.state.set_status(err.user_message()),
        }
    }

    async fn submit_new_chart(&mut self) {
        let Screen::NewChart(view) = &mut self.screen else {
            return;
        };
        if view.form.draft().player_id().is_some() && !view.player_on_roster() {
            warn!("new chart refused: player is not on the roster");
            self.state.set_status(UNKNOWN_PLAYER.to_string());
            return;
        }
        match view.form.submit(&self.store, self.actor).await {
            // the player page is loaded fresh on arrival
            Ok((chart, _stale)) => {
                self.state.set_status(format!("Chart for {} saved", chart.date));
                self.navigate(Route::Player(chart.player_id));
            }
            Err(err) => self.state.set_status(err.user_message()),
        }
    }

    async fn submit_chart_edit(&mut self) {
        let Screen::Chart(view) = &mut self.screen else {
            return;
        };
        let chart_id = view.page.query().chart_id.clone();
        match view.editor.submit(&self.store, &chart_id).await {
            Ok(stale) => {
                view.page.reload(&self.store, stale).await;
                let message = load_problem(view.page.state())
                    .unwrap_or_else(|| "Chart updated".to_string());
                self.state.set_status(message);
            }
            Err(err) => self.state.set_status(err.user_message()),
        }
    }

    async fn delete(&mut self, target: DeleteTarget, confirmed: bool) {
        let mut answer = |_: &str| confirmed;
        let outcome = match (&target, &mut self.screen) {
            (DeleteTarget::Player(id), Screen::Players(view)) => {
                let outcome =
                    request_delete::<Player, _, _, _>(&self.store, &mut answer, id, &mut view.page)
                        .await;
                view.clamp();
                outcome
            }
            (DeleteTarget::Chart(id), Screen::Player(view)) => {
                let outcome =
                    request_delete::<Chart, _, _, _>(&self.store, &mut answer, id, &mut view.page)
                        .await;
                view.clamp();
                outcome
            }
            _ => return,
        };

        let noun = target.noun();
        let message = match outcome {
            DeleteOutcome::Declined => format!("Kept the {noun}"),
            DeleteOutcome::Deleted => format!("Deleted the {noun}"),
            DeleteOutcome::Blocked { dependents } => {
                info!(dependents, "player delete refused");
                format!("This player still has {dependents} chart(s); delete those first")
            }
            DeleteOutcome::Failed(_) => GENERIC_FAILURE.to_string(),
        };
        self.state.set_status(message);
    }
}

fn today() -> NaiveDate {
    Local::now().date_naive()
}

fn load_problem<T>(state: &LoadState<T>) -> Option<String> {
    match state {
        LoadState::NotFound => Some("That record does not exist".to_string()),
        LoadState::Errored(message) => Some(format!("{message} (r to retry)")),
        LoadState::Loading | LoadState::Ready(_) => None,
    }
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode().context("failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("failed to leave alternate screen")?;
    terminal.show_cursor()?;
    Ok(())
}

fn spawn_input_thread(sender: mpsc::Sender<AppEvent>) {
    thread::spawn(move || loop {
        match event::poll(TICK_RATE) {
            Ok(true) => match event::read() {
                Ok(evt) => {
                    if sender.blocking_send(AppEvent::Input(evt)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            },
            Ok(false) => {
                if sender.blocking_send(AppEvent::Tick).is_err() {
                    break;
                }
            }
            Err(_) => break,
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use trainers_log_core::{
        ChartForm, CreateForm, MemoryStore, PlayerField, PlayerForm, PlayerId, Treatment,
    };

    fn press(app: &mut TrainersLogApp<MemoryStore>, code: KeyCode) {
        app.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn type_text(app: &mut TrainersLogApp<MemoryStore>, text: &str) {
        for ch in text.chars() {
            press(app, KeyCode::Char(ch));
        }
    }

    fn ctrl_s(app: &mut TrainersLogApp<MemoryStore>) {
        app.handle_key(KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL));
    }

    fn open_at(store: MemoryStore, route: Route) -> TrainersLogApp<MemoryStore> {
        TrainersLogApp::new(store, ActorId::placeholder(), route)
    }

    fn roster_app(store: MemoryStore) -> TrainersLogApp<MemoryStore> {
        open_at(store, Route::Players)
    }

    async fn settle(app: &mut TrainersLogApp<MemoryStore>) {
        while let Some(command) = app.pending.take() {
            app.execute(command).await;
        }
    }

    async fn seed_player(store: &MemoryStore, name: &str) -> anyhow::Result<Player> {
        let (player, _) = CreateForm::new(PlayerForm::new().set_field(PlayerField::Name, name))
            .submit(store, ActorId::placeholder())
            .await?;
        Ok(player)
    }

    fn roster_names(app: &TrainersLogApp<MemoryStore>) -> Vec<String> {
        match &app.screen {
            Screen::Players(view) => view
                .page
                .ready()
                .map(|players| players.iter().map(|p| p.name.clone()).collect())
                .unwrap_or_default(),
            _ => Vec::new(),
        }
    }

    #[tokio::test]
    async fn register_player_from_roster() {
        let mut app = roster_app(MemoryStore::new());
        settle(&mut app).await;
        assert!(roster_names(&app).is_empty());

        press(&mut app, KeyCode::Char('a'));
        type_text(&mut app, "Yamada Taro");
        press(&mut app, KeyCode::Tab);
        press(&mut app, KeyCode::Tab);
        type_text(&mut app, "7");
        ctrl_s(&mut app);
        settle(&mut app).await;

        assert_eq!(roster_names(&app), vec!["Yamada Taro".to_string()]);
        assert_eq!(app.state.status, "Registered Yamada Taro");
        let Screen::Players(view) = &app.screen else {
            panic!("expected the roster");
        };
        assert!(view.modal.is_none());
        let player = view.selected().unwrap();
        assert_eq!(player.team, None);
        assert_eq!(player.number.as_deref(), Some("7"));
    }

    #[tokio::test]
    async fn blank_name_keeps_modal_open() {
        let mut app = roster_app(MemoryStore::new());
        settle(&mut app).await;
        press(&mut app, KeyCode::Char('a'));
        ctrl_s(&mut app);
        settle(&mut app).await;

        assert_eq!(app.state.status, "missing required field: name");
        let Screen::Players(view) = &app.screen else {
            panic!("expected the roster");
        };
        assert!(view.modal.is_some());
    }

    #[tokio::test]
    async fn declined_delete_keeps_player() -> anyhow::Result<()> {
        let store = MemoryStore::new();
        seed_player(&store, "Sato").await?;
        let mut app = TrainersLogApp::new(store, ActorId::placeholder(), Route::Players);
        settle(&mut app).await;

        press(&mut app, KeyCode::Char('d'));
        press(&mut app, KeyCode::Char('n'));
        settle(&mut app).await;
        assert_eq!(app.state.status, "Kept the player");
        assert_eq!(roster_names(&app), vec!["Sato".to_string()]);

        press(&mut app, KeyCode::Char('d'));
        press(&mut app, KeyCode::Char('y'));
        settle(&mut app).await;
        assert_eq!(app.state.status, "Deleted the player");
        assert!(roster_names(&app).is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn new_chart_lands_on_player_page() -> anyhow::Result<()> {
        let store = MemoryStore::new();
        let player = seed_player(&store, "Sato").await?;
        let route = Route::NewChart {
            player_id: Some(player.id.clone()),
        };
        let mut app = TrainersLogApp::new(store, ActorId::placeholder(), route);
        settle(&mut app).await;

        // focus starts on the date; move to the first treatment row
        for _ in 0..6 {
            press(&mut app, KeyCode::Down);
        }
        press(&mut app, KeyCode::Char(' '));
        ctrl_s(&mut app);
        settle(&mut app).await;

        assert_eq!(app.route(), Route::Player(player.id.clone()));
        let Screen::Player(view) = &app.screen else {
            panic!("expected the player page");
        };
        let detail = view.page.ready().expect("player page should load");
        assert_eq!(detail.charts.len(), 1);
        assert_eq!(detail.charts[0].treatment_tags(), &[Treatment::ALL[0]]);
        Ok(())
    }

    #[tokio::test]
    async fn chart_edit_round_trips_through_the_store() -> anyhow::Result<()> {
        let store = MemoryStore::new();
        let player = seed_player(&store, "Sato").await?;
        let date = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let (chart, _) = CreateForm::new(ChartForm::new(date, Some(player.id.clone())))
            .submit(&store, ActorId::placeholder())
            .await?;

        let mut app = open_at(store, Route::Chart(chart.id.clone()));
        settle(&mut app).await;
        press(&mut app, KeyCode::Char('e'));
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Down);
        type_text(&mut app, "knee pain");
        ctrl_s(&mut app);
        settle(&mut app).await;

        assert_eq!(app.state.status, "Chart updated");
        let Screen::Chart(view) = &app.screen else {
            panic!("expected the chart page");
        };
        assert!(!view.editor.is_editing());
        let detail = view.page.ready().expect("chart should reload");
        assert_eq!(detail.chart.subjective.as_deref(), Some("knee pain"));
        Ok(())
    }

    #[tokio::test]
    async fn store_outage_reports_generic_failure() {
        let store = MemoryStore::new();
        store.set_unavailable("players", true);
        let mut app = TrainersLogApp::new(store, ActorId::placeholder(), Route::Players);
        settle(&mut app).await;
        assert_eq!(app.state.status, format!("{GENERIC_FAILURE} (r to retry)"));
        let Screen::Players(view) = &app.screen else {
            panic!("expected the roster");
        };
        assert!(matches!(view.page.state(), LoadState::Errored(_)));

        app.store.set_unavailable("players", false);
        press(&mut app, KeyCode::Char('r'));
        settle(&mut app).await;
        assert!(roster_names(&app).is_empty());
        let Screen::Players(view) = &app.screen else {
            panic!("expected the roster");
        };
        assert_eq!(view.page.state(), &LoadState::Ready(Vec::new()));
    }

    #[tokio::test]
    async fn unknown_preselected_player_never_gets_a_chart() {
        let route = Route::NewChart {
            player_id: Some(PlayerId::new("bogus")),
        };
        let mut app = open_at(MemoryStore::new(), route);
        settle(&mut app).await;
        assert_eq!(app.state.status, UNKNOWN_PLAYER);

        ctrl_s(&mut app);
        settle(&mut app).await;
        assert_eq!(app.store.row_count("charts"), 0);
        assert_eq!(app.route(), Route::NewChart { player_id: None });
        assert_eq!(app.state.status, "missing required field: player");
    }

    #[tokio::test]
    async fn chart_refused_while_roster_is_unavailable() {
        let store = MemoryStore::new();
        store.set_unavailable("players", true);
        let route = Route::NewChart {
            player_id: Some(PlayerId::new("p1")),
        };
        let mut app = open_at(store, route);
        settle(&mut app).await;

        ctrl_s(&mut app);
        settle(&mut app).await;
        assert_eq!(app.store.row_count("charts"), 0);
        assert_eq!(app.state.status, UNKNOWN_PLAYER);
    }
}
