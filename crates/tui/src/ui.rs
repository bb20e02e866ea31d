use std::cmp;

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};
use trainers_log_core::{
    page::{ChartWithPlayer, PlayerWithCharts},
    Chart, ChartForm, LoadState, Player, PlayerField, RemoteStore,
};

use crate::{
    app::TrainersLogApp,
    screens::{
        ChartSlot, ChartView, ConfirmPrompt, NewChartView, PlayerModal, PlayerView, PlayersView,
        Screen, HOME_ITEMS,
    },
};

#[derive(Debug, Clone)]
pub(crate) struct Theme {
    primary_fg: Color,
    accent: Color,
    muted: Color,
    selection_bg: Color,
    success: Color,
    warning: Color,
    danger: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            primary_fg: Color::White,
            accent: Color::Cyan,
            muted: Color::DarkGray,
            selection_bg: Color::DarkGray,
            success: Color::Green,
            warning: Color::Yellow,
            danger: Color::Red,
        }
    }
}

impl<S: RemoteStore> TrainersLogApp<S> {
    pub(crate) fn draw(&self, frame: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(5),
                Constraint::Length(4),
            ])
            .split(frame.size());

        self.render_header(frame, chunks[0]);
        match &self.screen {
            Screen::Home { cursor } => self.draw_home(frame, chunks[1], *cursor),
            Screen::Players(view) => self.draw_players(frame, chunks[1], view),
            Screen::Player(view) => self.draw_player(frame, chunks[1], view),
            Screen::NewChart(view) => self.draw_new_chart(frame, chunks[1], view),
            Screen::Chart(view) => self.draw_chart(frame, chunks[1], view),
        }
        self.render_status(frame, chunks[2]);

        let prompt = match &self.screen {
            Screen::Players(view) => view.confirm.as_ref(),
            Screen::Player(view) => view.confirm.as_ref(),
            _ => None,
        };
        if let Some(prompt) = prompt {
            self.render_confirm(frame, prompt);
        }
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let line = Line::from(vec![
            Span::styled(
                "Trainer's Log",
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("  {}", self.route()),
                Style::default().fg(self.theme.muted),
            ),
        ]);
        let header = Paragraph::new(line).block(Block::default().borders(Borders::ALL));
        frame.render_widget(header, area);
    }

    fn draw_home(&self, frame: &mut Frame, area: Rect, cursor: usize) {
        let menu_height = (HOME_ITEMS.len() as u16)
            .saturating_mul(2)
            .saturating_add(2)
            .min(area.height);
        let menu_area = centered_rect(30.min(area.width.max(1)), menu_height, area);

        let lines: Vec<Line> = HOME_ITEMS
            .iter()
            .enumerate()
            .map(|(idx, item)| {
                if idx == cursor {
                    Line::from(Span::styled(
                        format!("▶ {item}"),
                        Style::default()
                            .fg(self.theme.accent)
                            .add_modifier(Modifier::BOLD),
                    ))
                } else {
                    Line::from(Span::styled(
                        format!("  {item}"),
                        Style::default().fg(self.theme.primary_fg),
                    ))
                }
            })
            .collect();

        let menu = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Menu"))
            .alignment(Alignment::Center);
        frame.render_widget(menu, menu_area);
    }

    fn draw_players(&self, frame: &mut Frame, area: Rect, view: &PlayersView) {
        let players = match view.page.state() {
            LoadState::Ready(players) => players,
            other => return self.render_placeholder(frame, area, "Players", other),
        };

        if players.is_empty() {
            let empty = Paragraph::new("No players registered yet. Press a to add one.")
                .style(Style::default().fg(self.theme.muted))
                .block(Block::default().borders(Borders::ALL).title("Players"));
            frame.render_widget(empty, area);
        } else {
            let items: Vec<ListItem> = players
                .iter()
                .enumerate()
                .map(|(idx, player)| self.player_item(player, idx == view.cursor))
                .collect();
            let mut list_state = ListState::default();
            list_state.select(Some(view.cursor));
            let list = List::new(items)
                .block(Block::default().borders(Borders::ALL).title("Players"))
                .highlight_style(Style::default().bg(self.theme.selection_bg));
            frame.render_stateful_widget(list, area, &mut list_state);
        }

        if let Some(modal) = &view.modal {
            self.render_player_modal(frame, modal);
        }
    }

    fn player_item(&self, player: &Player, selected: bool) -> ListItem<'static> {
        let marker = if selected {
            Span::styled(
                "▶ ",
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD),
            )
        } else {
            Span::raw("  ")
        };
        let mut line = vec![
            marker,
            Span::styled(
                player.name.clone(),
                Style::default()
                    .fg(self.theme.primary_fg)
                    .add_modifier(Modifier::BOLD),
            ),
        ];
        if let Some(number) = &player.number {
            line.push(Span::raw(format!(" #{number}")));
        }
        if let Some(team) = &player.team {
            line.push(Span::styled(
                format!(" · {team}"),
                Style::default().fg(self.theme.muted),
            ));
        }
        ListItem::new(Line::from(line))
    }

    fn render_player_modal(&self, frame: &mut Frame, modal: &PlayerModal) {
        let frame_area = frame.size();
        let width = cmp::max(cmp::min(60_u16, frame_area.width.saturating_sub(4)), 24);
        let area = centered_rect(width, 8, frame_area);
        frame.render_widget(Clear, area);

        let Some(form) = modal.form() else {
            return;
        };
        let focused = modal.field();
        let mut lines: Vec<Line> = PlayerField::ALL
            .into_iter()
            .map(|field| self.text_row(field.label(), form.get(field), field == focused))
            .collect();
        lines.push(Line::from(""));
        lines.push(key_hints(&[("Ctrl-S", "save"), ("Tab", "next field"), ("Esc", "cancel")]));

        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title(modal.title()))
            .wrap(Wrap { trim: false });
        frame.render_widget(paragraph, area);
    }

    fn draw_player(&self, frame: &mut Frame, area: Rect, view: &PlayerView) {
        let detail: &PlayerWithCharts = match view.page.state() {
            LoadState::Ready(detail) => detail,
            other => return self.render_placeholder(frame, area, "Player", other),
        };

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(3)])
            .split(area);

        let player = &detail.player;
        let info = Paragraph::new(vec![
            Line::from(Span::styled(
                player.name.clone(),
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD),
            )),
            Line::from(format!(
                "Team: {}   Number: {}",
                player.team.as_deref().unwrap_or("-"),
                player.number.as_deref().unwrap_or("-"),
            )),
        ])
        .block(Block::default().borders(Borders::ALL).title("Player"));
        frame.render_widget(info, chunks[0]);

        let title = format!("Charts ({})", detail.charts.len());
        if detail.charts.is_empty() {
            let empty = Paragraph::new("No charts yet. Press n to record one.")
                .style(Style::default().fg(self.theme.muted))
                .block(Block::default().borders(Borders::ALL).title(title));
            frame.render_widget(empty, chunks[1]);
            return;
        }

        let items: Vec<ListItem> = detail
            .charts
            .iter()
            .enumerate()
            .map(|(idx, chart)| self.chart_item(chart, idx == view.cursor))
            .collect();
        let mut list_state = ListState::default();
        list_state.select(Some(view.cursor));
        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title(title))
            .highlight_style(Style::default().bg(self.theme.selection_bg));
        frame.render_stateful_widget(list, chunks[1], &mut list_state);
    }

    fn chart_item(&self, chart: &Chart, selected: bool) -> ListItem<'static> {
        let marker = if selected { "▶ " } else { "  " };
        let mut line = vec![
            Span::styled(marker, Style::default().fg(self.theme.accent)),
            Span::styled(
                chart.date.to_string(),
                Style::default().add_modifier(Modifier::BOLD),
            ),
            Span::styled(
                format!("  {}", chart.status),
                Style::default().fg(self.theme.success),
            ),
        ];
        let tags = chart.treatment_tags();
        if !tags.is_empty() {
            let labels: Vec<&str> = tags.iter().map(|tag| tag.label()).collect();
            line.push(Span::styled(
                format!("  [{}]", labels.join(", ")),
                Style::default().fg(self.theme.warning),
            ));
        }
        if let Some(subjective) = &chart.subjective {
            line.push(Span::styled(
                format!("  {}", preview(subjective)),
                Style::default().fg(self.theme.muted),
            ));
        }
        ListItem::new(Line::from(line))
    }

    fn draw_new_chart(&self, frame: &mut Frame, area: Rect, view: &NewChartView) {
        let roster = view.roster.ready().map(Vec::as_slice);
        let lines = self.chart_form_lines(view.form.draft(), &view.slots(), view.focus, roster);
        let form = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("New chart"))
            .wrap(Wrap { trim: false });
        frame.render_widget(form, area);
    }

    fn draw_chart(&self, frame: &mut Frame, area: Rect, view: &ChartView) {
        let detail: &ChartWithPlayer = match view.page.state() {
            LoadState::Ready(detail) => detail,
            other => return self.render_placeholder(frame, area, "Chart", other),
        };

        if let Some(draft) = view.editor.draft() {
            let mut lines = vec![
                Line::from(format!("Player: {}", detail.player.display_name())),
                Line::from(""),
            ];
            lines.extend(self.chart_form_lines(draft, &view.slots(), view.focus, None));
            let form = Paragraph::new(lines)
                .block(Block::default().borders(Borders::ALL).title("Edit chart"))
                .wrap(Wrap { trim: false });
            frame.render_widget(form, area);
            return;
        }

        let chart = &detail.chart;
        let label = Style::default()
            .fg(self.theme.accent)
            .add_modifier(Modifier::BOLD);
        let mut lines = vec![
            Line::from(vec![
                Span::styled("Player  ", label),
                Span::raw(detail.player.display_name()),
            ]),
            Line::from(vec![
                Span::styled("Date    ", label),
                Span::raw(chart.date.to_string()),
            ]),
            Line::from(vec![
                Span::styled("Status  ", label),
                Span::raw(chart.status.to_string()),
            ]),
        ];
        for (section, text) in chart.soap_sections() {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(section, label)));
            lines.extend(text.lines().map(|row| Line::from(row.to_string())));
        }
        let tags = chart.treatment_tags();
        if !tags.is_empty() {
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled("Treatments", label)));
            let spans: Vec<Span> = tags
                .iter()
                .map(|tag| {
                    Span::styled(
                        format!(" {} ", tag.label()),
                        Style::default().fg(self.theme.warning),
                    )
                })
                .collect();
            lines.push(Line::from(spans));
        }

        let paragraph = Paragraph::new(lines)
            .block(Block::default().borders(Borders::ALL).title("Chart"))
            .wrap(Wrap { trim: false });
        frame.render_widget(paragraph, area);
    }

    fn chart_form_lines(
        &self,
        form: &ChartForm,
        slots: &[ChartSlot],
        focus: usize,
        roster: Option<&[Player]>,
    ) -> Vec<Line<'static>> {
        slots
            .iter()
            .enumerate()
            .map(|(idx, slot)| {
                let focused = idx == focus;
                match *slot {
                    ChartSlot::Player => {
                        let value = match (form.player_id(), roster) {
                            (_, None) => "(loading players)".to_string(),
                            (None, Some(_)) => "(choose with ←/→)".to_string(),
                            (Some(id), Some(players)) => players
                                .iter()
                                .find(|player| &player.id == id)
                                .map(Player::display_name)
                                .unwrap_or_else(|| id.to_string()),
                        };
                        self.choice_row("Player *", value, focused)
                    }
                    ChartSlot::Status => {
                        let value = form
                            .status()
                            .map(|status| format!("{} ({})", status.label(), status.name()))
                            .unwrap_or_else(|| "-".to_string());
                        self.choice_row("Status *", value, focused)
                    }
                    ChartSlot::Text(field) => {
                        self.text_row(field.label(), form.get(field), focused)
                    }
                    ChartSlot::Treatment(tag) => {
                        let mark = if form.has_treatment(tag) { "[x]" } else { "[ ]" };
                        self.choice_row("", format!("{mark} {}", tag.label()), focused)
                    }
                }
            })
            .collect()
    }

    fn focus_marker(&self, focused: bool) -> Span<'static> {
        if focused {
            Span::styled(
                "▶ ",
                Style::default()
                    .fg(self.theme.accent)
                    .add_modifier(Modifier::BOLD),
            )
        } else {
            Span::raw("  ")
        }
    }

    fn text_row(&self, label: &str, value: &str, focused: bool) -> Line<'static> {
        let mut spans = vec![
            self.focus_marker(focused),
            Span::styled(format!("{label:<16}"), Style::default().fg(self.theme.muted)),
            Span::raw(value.to_string()),
        ];
        if focused {
            spans.push(Span::styled("_", Style::default().fg(self.theme.accent)));
        }
        Line::from(spans)
    }

    fn choice_row(&self, label: &str, value: String, focused: bool) -> Line<'static> {
        let style = if focused {
            Style::default().fg(self.theme.accent)
        } else {
            Style::default().fg(self.theme.primary_fg)
        };
        Line::from(vec![
            self.focus_marker(focused),
            Span::styled(format!("{label:<16}"), Style::default().fg(self.theme.muted)),
            Span::styled(value, style),
        ])
    }

    fn render_placeholder<T>(
        &self,
        frame: &mut Frame,
        area: Rect,
        title: &str,
        state: &LoadState<T>,
    ) {
        let (message, color) = match state {
            LoadState::Loading => ("Loading…".to_string(), self.theme.muted),
            LoadState::NotFound => ("Not found.".to_string(), self.theme.warning),
            LoadState::Errored(message) => (message.clone(), self.theme.danger),
            LoadState::Ready(_) => (String::new(), self.theme.primary_fg),
        };
        let paragraph = Paragraph::new(message)
            .style(Style::default().fg(color))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title(title.to_string()));
        frame.render_widget(paragraph, area);
    }

    fn render_confirm(&self, frame: &mut Frame, prompt: &ConfirmPrompt) {
        let area = centered_rect(44, 5, frame.size());
        frame.render_widget(Clear, area);
        let paragraph = Paragraph::new(vec![
            Line::from(prompt.prompt),
            Line::from(""),
            key_hints(&[("y", "delete"), ("n", "keep")]),
        ])
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(self.theme.danger))
                .title("Confirm"),
        );
        frame.render_widget(paragraph, area);
    }

    fn render_status(&self, frame: &mut Frame, area: Rect) {
        let block = Block::default().borders(Borders::ALL).title("Status");
        let primary = if self.state.busy {
            Line::from(Span::styled(
                "Working…",
                Style::default().fg(self.theme.warning),
            ))
        } else {
            Line::from(self.state.status.clone())
        };
        let paragraph = Paragraph::new(vec![primary, self.hints()])
            .block(block)
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn hints(&self) -> Line<'static> {
        match &self.screen {
            Screen::Home { .. } => {
                key_hints(&[("↑/↓", "move"), ("Enter", "open"), ("q", "quit")])
            }
            Screen::Players(view) if view.modal.is_some() => Line::from(""),
            Screen::Players(_) => key_hints(&[
                ("Enter", "open"),
                ("a", "add"),
                ("e", "edit"),
                ("d", "delete"),
                ("r", "reload"),
                ("Esc", "back"),
            ]),
            Screen::Player(_) => key_hints(&[
                ("Enter", "open chart"),
                ("n", "new chart"),
                ("d", "delete chart"),
                ("Esc", "back"),
            ]),
            Screen::NewChart(_) => key_hints(&[
                ("Tab", "next"),
                ("←/→", "choose"),
                ("Space", "toggle"),
                ("Ctrl-S", "save"),
                ("Esc", "back"),
            ]),
            Screen::Chart(view) if view.editor.is_editing() => key_hints(&[
                ("Tab", "next"),
                ("←/→", "status"),
                ("Space", "toggle"),
                ("Ctrl-S", "save"),
                ("Esc", "cancel"),
            ]),
            Screen::Chart(_) => key_hints(&[("e", "edit"), ("r", "reload"), ("Esc", "back")]),
        }
    }
}

fn key_hints(pairs: &[(&'static str, &'static str)]) -> Line<'static> {
    let mut spans = Vec::with_capacity(pairs.len() * 2);
    for (key, action) in pairs {
        spans.push(Span::styled(
            *key,
            Style::default().add_modifier(Modifier::BOLD),
        ));
        spans.push(Span::raw(format!(" {action}  ")));
    }
    Line::from(spans)
}

const PREVIEW_CHARS: usize = 100;

/// One-line excerpt of a narrative for list rows.
fn preview(text: &str) -> String {
    let flat: String = text
        .chars()
        .map(|ch| if ch == '\n' { ' ' } else { ch })
        .collect();
    if flat.chars().count() > PREVIEW_CHARS {
        let head: String = flat.chars().take(PREVIEW_CHARS).collect();
        format!("{head}...")
    } else {
        flat
    }
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}
