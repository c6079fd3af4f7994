use crate::runtime::event::{Toast, ToastVariant};
use crate::terminal::{CursorPos, TerminalSize};
use crate::ui::span::{Span, SpanLine};
use crate::ui::style::{Color, Style};
use crate::widgets::lookup::{LookupField, Mode};
use crate::widgets::traits::{Drawable, Interactive, RenderContext};

#[derive(Debug, Default, Clone)]
pub struct RenderFrame {
    pub lines: Vec<SpanLine>,
    pub cursor: Option<CursorPos>,
}

pub struct Renderer;

impl Renderer {
    pub fn render(
        field: &LookupField,
        toast: Option<&Toast>,
        terminal_size: TerminalSize,
    ) -> RenderFrame {
        let mut frame = RenderFrame::default();
        let ctx = RenderContext {
            focused_id: Some(field.id().to_string()),
            terminal_size,
        };

        let title_style = Style::new().color(Color::Cyan);
        frame.lines.push(vec![Span::styled(
            format!("Lookup [{}]", field.state().entity_type()),
            title_style,
        )]);
        let row_offset: u16 = 1;

        let out = field.draw(&ctx);
        if let Some(local_cursor) = field.cursor_pos() {
            frame.cursor = Some(CursorPos {
                col: local_cursor.col,
                row: row_offset.saturating_add(local_cursor.row),
            });
        }
        frame.lines.extend(out.lines);

        if let Some(failure) = field.state().last_failure() {
            frame.lines.push(vec![Span::styled(
                format!("{} failed: {}", failure.kind, failure.message),
                Style::new().color(Color::Red),
            )]);
        }

        if let Some(toast) = toast {
            frame.lines.push(Vec::new());
            frame.lines.push(toast_line(toast));
        }

        frame.lines.push(Vec::new());
        frame.lines.push(vec![Span::styled(hint(field), Style::muted())]);
        frame
    }
}

fn toast_line(toast: &Toast) -> SpanLine {
    let color = match toast.variant {
        ToastVariant::Success => Color::Green,
        ToastVariant::Error => Color::Red,
    };
    vec![
        Span::styled(format!("{}: ", toast.title), Style::new().color(color).bold()),
        Span::styled(toast.message.clone(), Style::new().color(color)),
    ]
}

fn hint(field: &LookupField) -> &'static str {
    match field.state().mode() {
        Mode::Searching => "type to search · ↑/↓ move · enter select · esc close · ctrl+c quit",
        Mode::Selected if field.state().can_persist() => {
            "enter link record · backspace remove · ctrl+c quit"
        }
        Mode::Selected => "backspace remove · ctrl+c quit",
    }
}

#[cfg(test)]
mod tests {
    use super::Renderer;
    use crate::core::config::LookupConfig;
    use crate::runtime::event::Toast;
    use crate::terminal::TerminalSize;
    use crate::ui::span::line_text;
    use crate::widgets::lookup::LookupField;

    const SIZE: TerminalSize = TerminalSize {
        width: 80,
        height: 24,
    };

    #[test]
    fn cursor_lands_on_query_line() {
        let field = LookupField::new("account", LookupConfig::default());
        let frame = Renderer::render(&field, None, SIZE);
        let cursor = frame.cursor.map(|pos| (pos.col, pos.row));
        assert_eq!(cursor, Some((2, 2)));
        assert_eq!(line_text(&frame.lines[0]), "Lookup [Account]");
    }

    #[test]
    fn toast_is_rendered_below_the_field() {
        let field = LookupField::new("account", LookupConfig::default());
        let toast = Toast::error("Error", "Error saving record");
        let frame = Renderer::render(&field, Some(&toast), SIZE);
        assert!(
            frame
                .lines
                .iter()
                .any(|line| line_text(line) == "Error: Error saving record")
        );
    }
}
