use crate::ui::span::Span;
use crate::ui::style::{Color, Style};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpinnerStyle {
    #[default]
    Braille,
    Line,
}

const BRAILLE: &[char] = &['⣾', '⣽', '⣻', '⢿', '⡿', '⣟', '⣯', '⣷'];
const LINE: &[char] = &['|', '/', '-', '\\'];

/// Loading indicator shown next to the query while a search is pending.
#[derive(Debug, Clone, Default)]
pub struct Spinner {
    frame: usize,
    style: SpinnerStyle,
}

impl Spinner {
    pub fn new(style: SpinnerStyle) -> Self {
        Self { frame: 0, style }
    }

    /// Advances only while `active`; rewinds otherwise so the next load
    /// starts from the first frame.
    pub fn tick(&mut self, active: bool) -> bool {
        if !active {
            self.frame = 0;
            return false;
        }
        self.frame = (self.frame + 1) % self.frames().len();
        true
    }

    pub fn glyph(&self) -> char {
        let frames = self.frames();
        frames[self.frame % frames.len()]
    }

    pub fn span(&self) -> Span {
        Span::styled(self.glyph().to_string(), Style::new().color(Color::Cyan))
    }

    fn frames(&self) -> &'static [char] {
        match self.style {
            SpinnerStyle::Braille => BRAILLE,
            SpinnerStyle::Line => LINE,
        }
    }
}
