pub mod state;

pub use state::{COMMIT_KEY, LookupState, Mode};

use crate::core::config::LookupConfig;
use crate::core::effect::Effect;
use crate::core::record::{Candidate, EntityType};
use crate::error::Result;
use crate::runtime::event::TimerEvent;
use crate::task::SourceCompletion;
use crate::terminal::{CursorPos, KeyCode, KeyEvent};
use crate::ui::span::{Span, SpanLine};
use crate::ui::spinner::Spinner;
use crate::ui::style::{Color, Style};
use crate::widgets::base::WidgetBase;
use crate::widgets::inputs::TextInput;
use crate::widgets::traits::{
    DrawOutput, Drawable, InteractionResult, Interactive, RenderContext,
};

const MAX_VISIBLE_ROWS: usize = 8;
const QUERY_INDENT: &str = "  ";

/// Interactive lookup field: a debounced search box with a result dropdown
/// that collapses into a removable pill once a record is selected.
pub struct LookupField {
    base: WidgetBase,
    state: LookupState,
    query: TextInput,
    highlighted: usize,
    spinner: Spinner,
}

impl LookupField {
    pub fn new(id: impl Into<String>, config: LookupConfig) -> Self {
        let id = id.into();
        let query = TextInput::new(format!("{id}.query"), config.label.clone())
            .with_placeholder(config.placeholder.clone());
        Self {
            base: WidgetBase::new(id, config.label.clone()),
            state: LookupState::new(config),
            query,
            highlighted: 0,
            spinner: Spinner::default(),
        }
    }

    pub fn state(&self) -> &LookupState {
        &self.state
    }

    pub fn query(&self) -> &str {
        self.query.value()
    }

    pub fn highlighted(&self) -> Option<&Candidate> {
        self.state.candidates().get(self.highlighted)
    }

    pub fn mount(&mut self) -> Vec<Effect> {
        let effects = self.state.mount();
        self.after_update();
        effects
    }

    pub fn on_timer(&mut self, event: TimerEvent) -> Vec<Effect> {
        let effects = self.state.on_timer(event);
        self.after_update();
        effects
    }

    pub fn apply_completion(&mut self, completion: SourceCompletion) -> Vec<Effect> {
        let effects = self.state.apply_completion(completion);
        self.after_update();
        effects
    }

    pub fn set_entity_type(&mut self, entity_type: impl Into<EntityType>) -> Vec<Effect> {
        let effects = self.state.set_entity_type(entity_type);
        self.after_update();
        effects
    }

    pub fn pick(&mut self, record_id: &str) -> Result<Vec<Effect>> {
        let effects = self.state.pick(record_id)?;
        self.after_update();
        Ok(effects)
    }

    pub fn remove(&mut self) -> Vec<Effect> {
        let effects = self.state.remove();
        self.after_update();
        effects
    }

    pub fn persist_selection(&mut self) -> Result<Vec<Effect>> {
        self.state.persist_selection()
    }

    pub fn teardown(&mut self) -> Vec<Effect> {
        self.state.teardown()
    }

    fn after_update(&mut self) {
        // Selecting or removing clears the raw input; the editor follows.
        if self.state.raw_input().is_empty() && !self.query.value().is_empty() {
            self.query.clear();
        }
        let count = self.state.candidates().len();
        self.highlighted = if count == 0 {
            0
        } else {
            self.highlighted.min(count - 1)
        };
    }

    fn move_highlight(&mut self, down: bool) -> InteractionResult {
        if self.state.open_results() {
            return InteractionResult::handled();
        }
        let count = self.state.candidates().len();
        if count == 0 {
            return InteractionResult::ignored();
        }
        self.highlighted = if down {
            (self.highlighted + 1) % count
        } else {
            (self.highlighted + count - 1) % count
        };
        InteractionResult::handled()
    }

    fn pick_highlighted(&mut self) -> InteractionResult {
        if !self.state.results_open() {
            return InteractionResult::ignored();
        }
        let Some(record_id) = self.highlighted().map(|candidate| candidate.id.to_string()) else {
            return InteractionResult::ignored();
        };
        match self.pick(&record_id) {
            Ok(effects) => InteractionResult::with_effects(effects),
            Err(err) => {
                tracing::warn!(record_id = %record_id, error = %err, "pick rejected");
                InteractionResult::ignored()
            }
        }
    }

    fn on_selected_key(&mut self, key: KeyEvent) -> InteractionResult {
        match key.code {
            KeyCode::Backspace | KeyCode::Delete => {
                InteractionResult::with_effects(self.remove())
            }
            KeyCode::Enter if self.state.can_persist() => match self.persist_selection() {
                Ok(effects) => InteractionResult::with_effects(effects),
                Err(err) => {
                    tracing::warn!(error = %err, "persist rejected");
                    InteractionResult::ignored()
                }
            },
            _ => InteractionResult::ignored(),
        }
    }

    fn on_searching_key(&mut self, key: KeyEvent) -> InteractionResult {
        match key.code {
            KeyCode::Up => self.move_highlight(false),
            KeyCode::Down => self.move_highlight(true),
            KeyCode::Enter => self.pick_highlighted(),
            KeyCode::Esc => {
                if self.state.close_results() {
                    InteractionResult::handled()
                } else {
                    InteractionResult::ignored()
                }
            }
            _ => {
                let before = self.query.value().to_string();
                let result = self.query.on_key(key);
                if self.query.value() == before {
                    return result;
                }
                self.highlighted = 0;
                let effects = self.state.on_key_input(self.query.value());
                let mut merged = result;
                merged.merge(InteractionResult::with_effects(effects));
                merged
            }
        }
    }

    fn label_line(&self, focused: bool) -> SpanLine {
        let mut style = Style::new().bold();
        if focused {
            style = style.color(Color::Cyan);
        }
        vec![
            Span::styled(format!("{} ", self.base.focus_marker(focused)), style),
            Span::styled(self.base.label().to_string(), style),
        ]
    }

    fn query_line(&self, ctx: &RenderContext) -> SpanLine {
        let mut line = vec![Span::new(QUERY_INDENT)];
        line.extend(self.query.draw(ctx).lines.into_iter().flatten());
        if self.state.is_search_loading() {
            line.push(Span::new(" "));
            line.push(self.spinner.span());
        }
        line
    }

    fn result_lines(&self) -> Vec<SpanLine> {
        if !self.state.results_open() {
            return Vec::new();
        }
        let candidates = self.state.candidates();
        if candidates.is_empty() {
            if self.state.has_records() || self.state.is_search_loading() {
                return Vec::new();
            }
            return vec![vec![
                Span::new(QUERY_INDENT),
                Span::styled("No records found", Style::muted()),
            ]];
        }

        let start = (self.highlighted + 1).saturating_sub(MAX_VISIBLE_ROWS);
        let title_field = self.state.config().title_field.as_str();
        candidates
            .iter()
            .enumerate()
            .skip(start)
            .take(MAX_VISIBLE_ROWS)
            .map(|(idx, candidate)| {
                let active = idx == self.highlighted;
                let (marker, title_style) = if active {
                    ("❯ ", Style::new().color(Color::Cyan).bold())
                } else {
                    ("  ", Style::default())
                };
                let mut line = vec![
                    Span::new(QUERY_INDENT),
                    Span::styled(marker, title_style),
                    Span::styled(candidate.title(title_field).to_string(), title_style),
                ];
                let secondary = secondary_fields(candidate, title_field);
                if !secondary.is_empty() {
                    line.push(Span::styled(format!("  {secondary}"), Style::muted()));
                }
                line
            })
            .collect()
    }

    fn pill_lines(&self, selected: &Candidate) -> Vec<SpanLine> {
        let title = selected.title(self.state.config().title_field.as_str());
        let pill = vec![
            Span::new(QUERY_INDENT),
            Span::styled(
                format!("[{}]", icon_tag(&self.state.config().icon_name)),
                Style::new().color(Color::Blue),
            ),
            Span::new(" "),
            Span::styled(title.to_string(), Style::new().bold()),
            Span::styled(" ×", Style::muted()),
        ];
        let mut lines = vec![pill];
        if self.state.can_persist() {
            lines.push(vec![
                Span::new(QUERY_INDENT),
                Span::styled("[ Link record ]", Style::new().color(Color::Green)),
            ]);
        }
        lines
    }
}

impl Drawable for LookupField {
    fn id(&self) -> &str {
        self.base.id()
    }

    fn label(&self) -> &str {
        self.base.label()
    }

    fn draw(&self, ctx: &RenderContext) -> DrawOutput {
        let focused = self.base.is_focused(ctx);
        let mut lines = vec![self.label_line(focused)];
        match (self.state.mode(), self.state.selection()) {
            (Mode::Selected, Some(selected)) => lines.extend(self.pill_lines(selected)),
            _ => {
                lines.push(self.query_line(ctx));
                lines.extend(self.result_lines());
            }
        }
        DrawOutput { lines }
    }
}

impl Interactive for LookupField {
    fn on_key(&mut self, key: KeyEvent) -> InteractionResult {
        if self.state.is_torn_down() {
            return InteractionResult::ignored();
        }
        match self.state.mode() {
            Mode::Selected => self.on_selected_key(key),
            Mode::Searching => self.on_searching_key(key),
        }
    }

    fn on_focus(&mut self) -> InteractionResult {
        if self.state.open_results() {
            return InteractionResult::handled();
        }
        InteractionResult::ignored()
    }

    fn on_blur(&mut self) -> InteractionResult {
        if self.state.close_results() {
            return InteractionResult::handled();
        }
        InteractionResult::ignored()
    }

    fn on_tick(&mut self) -> InteractionResult {
        if self.spinner.tick(self.state.is_search_loading()) {
            return InteractionResult::handled();
        }
        InteractionResult::ignored()
    }

    fn cursor_pos(&self) -> Option<CursorPos> {
        if !self.state.mode().search_box_visible() {
            return None;
        }
        let inner = self.query.cursor_pos()?;
        Some(CursorPos {
            col: inner.col + QUERY_INDENT.len() as u16,
            row: 1,
        })
    }
}

/// `standard:account` renders as `account`.
fn icon_tag(icon_name: &str) -> &str {
    icon_name
        .split_once(':')
        .map(|(_, tag)| tag)
        .unwrap_or(icon_name)
}

fn secondary_fields(candidate: &Candidate, title_field: &str) -> String {
    let title_key = if candidate.field(title_field).is_some() {
        Some(title_field)
    } else {
        candidate.display_fields.keys().next().map(String::as_str)
    };
    candidate
        .display_fields
        .iter()
        .filter(|(key, value)| Some(key.as_str()) != title_key && !value.is_empty())
        .map(|(_, value)| value.as_str())
        .collect::<Vec<_>>()
        .join(" · ")
}
