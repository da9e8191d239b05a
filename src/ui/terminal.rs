//! ratatui adapter for [`VisibleOutput`].
//!
//! Lines are wrapped here rather than by `Paragraph` so the total height is
//! known exactly and the view can be pinned to the newest unit.

use ratatui::layout::Alignment as LineAlignment;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use unicode_width::UnicodeWidthChar;

use crate::ui::render::{Alignment, Icon, UnitBody, VisibleOutput, VisibleUnit};

const TAB_WIDTH: usize = 4;

/// Replace control characters so message text can never drive the terminal.
/// Newlines survive; tabs become spaces.
pub fn sanitize_for_terminal(text: &str) -> String {
    let mut clean = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '\n' => clean.push('\n'),
            '\t' => clean.extend(std::iter::repeat_n(' ', TAB_WIDTH)),
            // C0 controls map onto the Control Pictures block.
            c if (c as u32) < 0x20 => {
                clean.push(char::from_u32(0x2400 + c as u32).unwrap_or('\u{fffd}'));
            }
            '\u{7f}' => clean.push('\u{2421}'),
            c if c.is_control() => clean.push('\u{fffd}'),
            c => clean.push(c),
        }
    }
    clean
}

/// Break `text` into rows no wider than `max_width` columns.
pub fn wrap_text(text: &str, max_width: usize) -> Vec<String> {
    let max_width = max_width.max(1);
    let mut rows = Vec::new();

    for logical in text.split('\n') {
        let mut row = String::new();
        let mut row_width = 0;
        for ch in logical.chars() {
            let width = ch.width().unwrap_or(0);
            if row_width + width > max_width && !row.is_empty() {
                rows.push(std::mem::take(&mut row));
                row_width = 0;
            }
            row.push(ch);
            row_width += width;
        }
        rows.push(row);
    }
    rows
}

#[derive(Debug, Clone, Copy)]
pub struct TranscriptStyle {
    pub bot_label: Style,
    pub user_label: Style,
    pub assistant_text: Style,
    pub user_text: Style,
    pub time: Style,
}

impl Default for TranscriptStyle {
    fn default() -> Self {
        Self {
            bot_label: Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
            user_label: Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
            assistant_text: Style::default().fg(Color::Gray),
            user_text: Style::default().fg(Color::Cyan),
            time: Style::default().fg(Color::DarkGray),
        }
    }
}

fn icon_label(icon: Icon) -> &'static str {
    match icon {
        Icon::Bot => "◆ abz",
        Icon::User => "you ●",
    }
}

fn unit_lines(unit: &VisibleUnit, width: u16, style: &TranscriptStyle) -> Vec<Line<'static>> {
    let (align, text_style) = match unit.alignment {
        Alignment::Start => (LineAlignment::Left, style.assistant_text),
        Alignment::End => (LineAlignment::Right, style.user_text),
    };
    let label = match unit.icon {
        Icon::Bot => Span::styled(icon_label(unit.icon), style.bot_label),
        Icon::User => Span::styled(icon_label(unit.icon), style.user_label),
    };

    // The icon sits on the outer edge, the time toward the middle.
    let header = match (&unit.time, unit.alignment) {
        (Some(time), Alignment::Start) => {
            vec![label, Span::raw("  "), Span::styled(time.clone(), style.time)]
        }
        (Some(time), Alignment::End) => {
            vec![Span::styled(time.clone(), style.time), Span::raw("  "), label]
        }
        (None, _) => vec![label],
    };

    let mut lines = vec![Line::from(header).alignment(align)];
    match &unit.body {
        UnitBody::Text(text) => {
            // Bubbles take at most 80% of the row.
            let bubble_width = (usize::from(width) * 4 / 5).max(1);
            for row in wrap_text(&sanitize_for_terminal(text), bubble_width) {
                lines.push(Line::from(Span::styled(row, text_style)).alignment(align));
            }
        }
        UnitBody::Typing => {
            lines.push(Line::from(Span::styled("● ● ●", style.bot_label)).alignment(align));
        }
    }
    lines
}

/// All transcript rows for a view `width` columns wide, with a blank row
/// between units.
pub fn to_lines(output: &VisibleOutput, width: u16, style: &TranscriptStyle) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for (index, unit) in output.units.iter().enumerate() {
        if index > 0 {
            lines.push(Line::default());
        }
        lines.extend(unit_lines(unit, width, style));
    }
    lines
}

/// Scroll offset that shows the last `height` rows.
pub fn scroll_offset(total_rows: usize, height: u16, scroll_to_end: bool) -> u16 {
    if !scroll_to_end {
        return 0;
    }
    let offset = total_rows.saturating_sub(usize::from(height));
    u16::try_from(offset).unwrap_or(u16::MAX)
}
