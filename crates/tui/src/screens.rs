use chrono::NaiveDate;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use trainers_log_core::{
    delete::Deletable,
    page::{ChartDetail, PlayerDetail, PlayerRoster},
    Chart, ChartField, ChartForm, ChartId, CreateForm, LoadState, ModeController, Page, Player,
    PlayerField, PlayerForm, PlayerId, Route, Treatment,
};

/// What a key press asks the application to do.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Action {
    None,
    Quit,
    Go(Route),
    Run(Command),
    Status(String),
}

/// Store round-trip queued by the input handler. At most one is pending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Command {
    Load,
    SubmitPlayer,
    SubmitNewChart,
    SubmitChartEdit,
    Delete {
        target: DeleteTarget,
        confirmed: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum DeleteTarget {
    Player(PlayerId),
    Chart(ChartId),
}

impl DeleteTarget {
    pub(crate) fn noun(&self) -> &'static str {
        match self {
            Self::Player(_) => "player",
            Self::Chart(_) => "chart",
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct ConfirmPrompt {
    pub prompt: &'static str,
    pub target: DeleteTarget,
}

impl ConfirmPrompt {
    fn player(id: PlayerId) -> Self {
        Self {
            prompt: Player::PROMPT,
            target: DeleteTarget::Player(id),
        }
    }

    fn chart(id: ChartId) -> Self {
        Self {
            prompt: Chart::PROMPT,
            target: DeleteTarget::Chart(id),
        }
    }

    fn answer(&self, key: KeyEvent) -> Option<bool> {
        match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') => Some(true),
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => Some(false),
            _ => None,
        }
    }
}

/// Resolve an open prompt; any other key is swallowed while it is shown.
fn answer_prompt(slot: &mut Option<ConfirmPrompt>, key: KeyEvent) -> Action {
    let Some(prompt) = slot.as_ref() else {
        return Action::None;
    };
    let Some(confirmed) = prompt.answer(key) else {
        return Action::None;
    };
    let target = prompt.target.clone();
    *slot = None;
    Action::Run(Command::Delete { target, confirmed })
}

pub(crate) const HOME_ITEMS: [&str; 4] = ["Players", "New chart", "Chart lookup", "Quit"];

pub(crate) enum Screen {
    Home { cursor: usize },
    Players(PlayersView),
    Player(PlayerView),
    NewChart(NewChartView),
    Chart(ChartView),
}

impl Screen {
    pub(crate) fn open(route: Route, today: NaiveDate) -> Self {
        match route {
            Route::Home => Self::Home { cursor: 0 },
            Route::Players => Self::Players(PlayersView::new()),
            Route::Player(player_id) => Self::Player(PlayerView::new(player_id)),
            Route::NewChart { player_id } => Self::NewChart(NewChartView::new(today, player_id)),
            Route::Chart(chart_id) => Self::Chart(ChartView::new(chart_id)),
        }
    }

    pub(crate) fn route(&self) -> Route {
        match self {
            Self::Home { .. } => Route::Home,
            Self::Players(_) => Route::Players,
            Self::Player(view) => Route::Player(view.page.query().player_id.clone()),
            Self::NewChart(view) => Route::NewChart {
                player_id: view.initial_player.clone(),
            },
            Self::Chart(view) => Route::Chart(view.page.query().chart_id.clone()),
        }
    }

    pub(crate) fn handle_key(&mut self, key: KeyEvent) -> Action {
        match self {
            Self::Home { cursor } => home_key(cursor, key),
            Self::Players(view) => view.handle_key(key),
            Self::Player(view) => view.handle_key(key),
            Self::NewChart(view) => view.handle_key(key),
            Self::Chart(view) => view.handle_key(key),
        }
    }
}

fn home_key(cursor: &mut usize, key: KeyEvent) -> Action {
    match key.code {
        KeyCode::Up | KeyCode::Char('k') => {
            *cursor = step(*cursor, HOME_ITEMS.len(), -1);
            Action::None
        }
        KeyCode::Down | KeyCode::Char('j') => {
            *cursor = step(*cursor, HOME_ITEMS.len(), 1);
            Action::None
        }
        KeyCode::Enter => match *cursor {
            0 | 2 => Action::Go(Route::Players),
            1 => Action::Go(Route::NewChart { player_id: None }),
            _ => Action::Quit,
        },
        KeyCode::Char('q') | KeyCode::Esc => Action::Quit,
        _ => Action::None,
    }
}

fn step(index: usize, len: usize, delta: isize) -> usize {
    if len == 0 {
        return 0;
    }
    (index as isize + delta).rem_euclid(len as isize) as usize
}

fn clamp_cursor(cursor: &mut usize, len: usize) {
    *cursor = (*cursor).min(len.saturating_sub(1));
}

fn is_ctrl(key: &KeyEvent, ch: char) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char(ch)
}

fn typed_char(key: &KeyEvent) -> Option<char> {
    match key.code {
        KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => Some(ch),
        _ => None,
    }
}

fn push_char(text: &str, ch: char) -> String {
    let mut next = text.to_string();
    next.push(ch);
    next
}

fn pop_char(text: &str) -> String {
    let mut next = text.to_string();
    next.pop();
    next
}

pub(crate) enum PlayerDraft {
    Create(CreateForm<PlayerForm>),
    Edit {
        id: PlayerId,
        editor: ModeController<PlayerForm>,
    },
}

pub(crate) struct PlayerModal {
    pub draft: PlayerDraft,
    pub focus: usize,
}

impl PlayerModal {
    fn create() -> Self {
        Self {
            draft: PlayerDraft::Create(CreateForm::new(PlayerForm::new())),
            focus: 0,
        }
    }

    fn edit_existing(player: &Player) -> Self {
        let mut editor = ModeController::new();
        editor.start_edit(player);
        Self {
            draft: PlayerDraft::Edit {
                id: player.id.clone(),
                editor,
            },
            focus: 0,
        }
    }

    pub(crate) fn title(&self) -> &'static str {
        match self.draft {
            PlayerDraft::Create(_) => "Register player",
            PlayerDraft::Edit { .. } => "Edit player",
        }
    }

    pub(crate) fn form(&self) -> Option<&PlayerForm> {
        match &self.draft {
            PlayerDraft::Create(create) => Some(create.draft()),
            PlayerDraft::Edit { editor, .. } => editor.draft(),
        }
    }

    pub(crate) fn field(&self) -> PlayerField {
        PlayerField::ALL[self.focus.min(PlayerField::ALL.len() - 1)]
    }

    fn update(&mut self, change: impl FnOnce(&PlayerForm) -> PlayerForm) {
        match &mut self.draft {
            PlayerDraft::Create(create) => create.edit(change),
            PlayerDraft::Edit { editor, .. } => editor.edit(change),
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> Option<Action> {
        if is_ctrl(&key, 's') {
            return Some(Action::Run(Command::SubmitPlayer));
        }
        let field = self.field();
        match key.code {
            KeyCode::Esc => return None,
            KeyCode::Enter if self.focus + 1 == PlayerField::ALL.len() => {
                return Some(Action::Run(Command::SubmitPlayer));
            }
            KeyCode::Enter | KeyCode::Tab | KeyCode::Down => {
                self.focus = step(self.focus, PlayerField::ALL.len(), 1);
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.focus = step(self.focus, PlayerField::ALL.len(), -1);
            }
            KeyCode::Backspace => {
                self.update(|form| form.set_field(field, pop_char(form.get(field))));
            }
            _ => {
                if let Some(ch) = typed_char(&key) {
                    self.update(|form| form.set_field(field, push_char(form.get(field), ch)));
                }
            }
        }
        Some(Action::None)
    }
}

pub(crate) struct PlayersView {
    pub page: Page<PlayerRoster>,
    pub cursor: usize,
    pub modal: Option<PlayerModal>,
    pub confirm: Option<ConfirmPrompt>,
}

impl PlayersView {
    fn new() -> Self {
        Self {
            page: Page::new(PlayerRoster),
            cursor: 0,
            modal: None,
            confirm: None,
        }
    }

    pub(crate) fn selected(&self) -> Option<&Player> {
        self.page.ready().and_then(|players| players.get(self.cursor))
    }

    pub(crate) fn clamp(&mut self) {
        let len = self.page.ready().map_or(0, Vec::len);
        clamp_cursor(&mut self.cursor, len);
    }

    fn handle_key(&mut self, key: KeyEvent) -> Action {
        if self.confirm.is_some() {
            return answer_prompt(&mut self.confirm, key);
        }
        if let Some(modal) = self.modal.as_mut() {
            return match modal.handle_key(key) {
                Some(action) => action,
                None => {
                    self.modal = None;
                    Action::Status("Edit cancelled".to_string())
                }
            };
        }

        let len = self.page.ready().map_or(0, Vec::len);
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.cursor = self.cursor.saturating_sub(1);
                Action::None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.cursor = (self.cursor + 1).min(len.saturating_sub(1));
                Action::None
            }
            KeyCode::Enter => match self.selected() {
                Some(player) => Action::Go(Route::Player(player.id.clone())),
                None => Action::None,
            },
            KeyCode::Char('a') => {
                self.modal = Some(PlayerModal::create());
                Action::None
            }
            KeyCode::Char('e') => {
                if let Some(player) = self.selected() {
                    let modal = PlayerModal::edit_existing(player);
                    self.modal = Some(modal);
                }
                Action::None
            }
            KeyCode::Char('d') => {
                if let Some(player) = self.selected() {
                    let prompt = ConfirmPrompt::player(player.id.clone());
                    self.confirm = Some(prompt);
                }
                Action::None
            }
            KeyCode::Char('r') => Action::Run(Command::Load),
            KeyCode::Esc => Action::Go(Route::Home),
            KeyCode::Char('q') => Action::Quit,
            _ => Action::None,
        }
    }
}

pub(crate) struct PlayerView {
    pub page: Page<PlayerDetail>,
    pub cursor: usize,
    pub confirm: Option<ConfirmPrompt>,
}

impl PlayerView {
    fn new(player_id: PlayerId) -> Self {
        Self {
            page: Page::new(PlayerDetail { player_id }),
            cursor: 0,
            confirm: None,
        }
    }

    pub(crate) fn selected(&self) -> Option<&Chart> {
        self.page
            .ready()
            .and_then(|detail| detail.charts.get(self.cursor))
    }

    pub(crate) fn clamp(&mut self) {
        let len = self.page.ready().map_or(0, |detail| detail.charts.len());
        clamp_cursor(&mut self.cursor, len);
    }

    fn handle_key(&mut self, key: KeyEvent) -> Action {
        if self.confirm.is_some() {
            return answer_prompt(&mut self.confirm, key);
        }

        let len = self.page.ready().map_or(0, |detail| detail.charts.len());
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                self.cursor = self.cursor.saturating_sub(1);
                Action::None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.cursor = (self.cursor + 1).min(len.saturating_sub(1));
                Action::None
            }
            KeyCode::Enter => match self.selected() {
                Some(chart) => Action::Go(Route::Chart(chart.id.clone())),
                None => Action::None,
            },
            KeyCode::Char('n') => Action::Go(Route::NewChart {
                player_id: Some(self.page.query().player_id.clone()),
            }),
            KeyCode::Char('d') => {
                if let Some(chart) = self.selected() {
                    let prompt = ConfirmPrompt::chart(chart.id.clone());
                    self.confirm = Some(prompt);
                }
                Action::None
            }
            KeyCode::Char('r') => Action::Run(Command::Load),
            KeyCode::Esc => Action::Go(Route::Players),
            KeyCode::Char('q') => Action::Quit,
            _ => Action::None,
        }
    }
}

/// One focusable row of the chart form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ChartSlot {
    Player,
    Status,
    Text(ChartField),
    Treatment(Treatment),
}

pub(crate) fn chart_slots(with_player: bool) -> Vec<ChartSlot> {
    let mut slots = Vec::with_capacity(15);
    if with_player {
        slots.push(ChartSlot::Player);
    }
    slots.push(ChartSlot::Text(ChartField::Date));
    slots.push(ChartSlot::Status);
    slots.extend(
        [
            ChartField::Subjective,
            ChartField::Objective,
            ChartField::Assessment,
            ChartField::Plan,
        ]
        .into_iter()
        .map(ChartSlot::Text),
    );
    slots.extend(Treatment::ALL.into_iter().map(ChartSlot::Treatment));
    slots
}

/// Edit `draft` for a key pressed on `slot`; `None` when the key changes nothing.
pub(crate) fn chart_key_edit(
    draft: &ChartForm,
    slot: ChartSlot,
    key: &KeyEvent,
    roster: &[Player],
) -> Option<ChartForm> {
    match slot {
        ChartSlot::Text(ChartField::Date) if key.code == KeyCode::Enter => None,
        ChartSlot::Text(field) => match key.code {
            KeyCode::Backspace => Some(draft.set_field(field, pop_char(draft.get(field)))),
            KeyCode::Enter => Some(draft.set_field(field, push_char(draft.get(field), '\n'))),
            _ => typed_char(key).map(|ch| draft.set_field(field, push_char(draft.get(field), ch))),
        },
        ChartSlot::Status => {
            let delta = match key.code {
                KeyCode::Left => -1,
                KeyCode::Right | KeyCode::Char(' ') => 1,
                _ => return None,
            };
            let next = match draft.status() {
                Some(status) => status.cycle(delta),
                None => Default::default(),
            };
            Some(draft.with_status(Some(next)))
        }
        ChartSlot::Treatment(tag) => match key.code {
            KeyCode::Char(' ') | KeyCode::Enter => Some(draft.toggle_treatment(tag)),
            _ => None,
        },
        ChartSlot::Player => {
            let delta = match key.code {
                KeyCode::Left => -1,
                KeyCode::Right | KeyCode::Char(' ') => 1,
                _ => return None,
            };
            if roster.is_empty() {
                return None;
            }
            let current = draft
                .player_id()
                .and_then(|id| roster.iter().position(|player| &player.id == id));
            let index = match current {
                Some(index) => step(index, roster.len(), delta),
                None if delta < 0 => roster.len() - 1,
                None => 0,
            };
            Some(draft.with_player(Some(roster[index].id.clone())))
        }
    }
}

pub(crate) struct NewChartView {
    pub roster: Page<PlayerRoster>,
    pub form: CreateForm<ChartForm>,
    pub focus: usize,
    pub initial_player: Option<PlayerId>,
}

impl NewChartView {
    fn new(today: NaiveDate, player_id: Option<PlayerId>) -> Self {
        Self {
            roster: Page::new(PlayerRoster),
            form: CreateForm::new(ChartForm::new(today, player_id.clone())),
            // start on the date when the player is already chosen
            focus: usize::from(player_id.is_some()),
            initial_player: player_id,
        }
    }

    pub(crate) fn slots(&self) -> Vec<ChartSlot> {
        chart_slots(true)
    }

    /// Whether the draft's player is on the loaded roster.
    pub(crate) fn player_on_roster(&self) -> bool {
        match (self.form.draft().player_id(), self.roster.ready()) {
            (Some(id), Some(players)) => players.iter().any(|player| &player.id == id),
            _ => false,
        }
    }

    /// Clears a preselected player the roster does not know. Returns true
    /// when one was cleared.
    pub(crate) fn drop_unknown_player(&mut self) -> bool {
        if self.roster.ready().is_none()
            || self.form.draft().player_id().is_none()
            || self.player_on_roster()
        {
            return false;
        }
        self.form.edit(|draft| draft.with_player(None));
        self.initial_player = None;
        self.focus = 0;
        true
    }

    fn handle_key(&mut self, key: KeyEvent) -> Action {
        if is_ctrl(&key, 's') {
            return Action::Run(Command::SubmitNewChart);
        }
        let slots = self.slots();
        match key.code {
            KeyCode::Esc => {
                return match &self.initial_player {
                    Some(player_id) => Action::Go(Route::Player(player_id.clone())),
                    None => Action::Go(Route::Home),
                }
            }
            KeyCode::Tab | KeyCode::Down => {
                self.focus = step(self.focus, slots.len(), 1);
                return Action::None;
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.focus = step(self.focus, slots.len(), -1);
                return Action::None;
            }
            _ => {}
        }

        let roster = self.roster.ready().map(Vec::as_slice).unwrap_or(&[]);
        if let Some(next) = chart_key_edit(self.form.draft(), slots[self.focus], &key, roster) {
            self.form.edit(move |_| next);
        }
        Action::None
    }
}

pub(crate) struct ChartView {
    pub page: Page<ChartDetail>,
    pub editor: ModeController<ChartForm>,
    pub focus: usize,
}

impl ChartView {
    fn new(chart_id: ChartId) -> Self {
        Self {
            page: Page::new(ChartDetail { chart_id }),
            editor: ModeController::new(),
            focus: 0,
        }
    }

    pub(crate) fn slots(&self) -> Vec<ChartSlot> {
        chart_slots(false)
    }

    fn handle_key(&mut self, key: KeyEvent) -> Action {
        if self.editor.is_editing() {
            return self.handle_edit_key(key);
        }
        match key.code {
            KeyCode::Char('e') => match self.page.state() {
                LoadState::Ready(detail) => {
                    self.editor.start_edit(&detail.chart);
                    self.focus = 0;
                    Action::None
                }
                _ => Action::None,
            },
            KeyCode::Char('r') => Action::Run(Command::Load),
            KeyCode::Esc => match self.page.ready() {
                Some(detail) => Action::Go(Route::Player(detail.chart.player_id.clone())),
                None => Action::Go(Route::Players),
            },
            KeyCode::Char('q') => Action::Quit,
            _ => Action::None,
        }
    }

    fn handle_edit_key(&mut self, key: KeyEvent) -> Action {
        if is_ctrl(&key, 's') {
            return Action::Run(Command::SubmitChartEdit);
        }
        let slots = self.slots();
        match key.code {
            KeyCode::Esc => {
                self.editor.cancel();
                return Action::Status("Edit cancelled".to_string());
            }
            KeyCode::Tab | KeyCode::Down => {
                self.focus = step(self.focus, slots.len(), 1);
                return Action::None;
            }
            KeyCode::BackTab | KeyCode::Up => {
                self.focus = step(self.focus, slots.len(), -1);
                return Action::None;
            }
            _ => {}
        }

        let next = self
            .editor
            .draft()
            .and_then(|draft| chart_key_edit(draft, slots[self.focus], &key, &[]));
        if let Some(next) = next {
            self.editor.edit(move |_| next);
        }
        Action::None
    }
}
