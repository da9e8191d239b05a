//! Widgets owned by the chat loop: the composer, the settings overlay and the
//! frame layout around the transcript.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};
use tui_textarea::TextArea;

use crate::core::orchestrator::ChatState;
use crate::ui::render::Renderer;
use crate::ui::terminal::{scroll_offset, to_lines, TranscriptStyle};

const COMPOSER_MAX_ROWS: u16 = 6;
const HINT: &str = "Enter send · Alt+Enter new line · Ctrl+S settings · Ctrl+C quit";

fn new_composer() -> TextArea<'static> {
    let mut composer = TextArea::default();
    composer.set_cursor_line_style(Style::default());
    composer.set_placeholder_text("Enter a directive...");
    composer
}

fn new_credential_input(value: Option<&str>) -> TextArea<'static> {
    let mut input = match value {
        Some(value) => TextArea::new(vec![value.to_string()]),
        None => TextArea::default(),
    };
    input.set_cursor_line_style(Style::default());
    input.set_mask_char('•');
    input.set_placeholder_text("sk-or-...");
    input.move_cursor(tui_textarea::CursorMove::End);
    input
}

pub struct ChatView {
    pub composer: TextArea<'static>,
    pub credential_input: TextArea<'static>,
    /// Last credential storage failure, shown until the overlay closes.
    pub error: Option<String>,
    style: TranscriptStyle,
}

impl ChatView {
    pub fn new() -> Self {
        Self {
            composer: new_composer(),
            credential_input: new_credential_input(None),
            error: None,
            style: TranscriptStyle::default(),
        }
    }

    pub fn composer_text(&self) -> String {
        self.composer.lines().join("\n")
    }

    pub fn reset_composer(&mut self) {
        self.composer = new_composer();
    }

    pub fn prefill_credential(&mut self, value: Option<&str>) {
        self.credential_input = new_credential_input(value);
    }

    pub fn credential_text(&self) -> String {
        self.credential_input.lines().join("")
    }
}

impl Default for ChatView {
    fn default() -> Self {
        Self::new()
    }
}

fn centered_rect(percent_x: u16, height: u16, area: Rect) -> Rect {
    let width = area.width * percent_x / 100;
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn status_line<'a>(state: &'a ChatState, view: &'a ChatView) -> Line<'a> {
    if state.loading() {
        Line::from(Span::styled(
            "Waiting for response...",
            Style::default().fg(Color::Yellow),
        ))
    } else if let Some(error) = &view.error {
        Line::from(Span::styled(error.as_str(), Style::default().fg(Color::Red)))
    } else if let Some(notice) = state.notice() {
        Line::from(Span::styled(notice, Style::default().fg(Color::Green)))
    } else {
        Line::from(Span::styled(HINT, Style::default().fg(Color::DarkGray)))
    }
}

pub fn draw(
    frame: &mut Frame,
    state: &ChatState,
    view: &mut ChatView,
    renderer: &impl Renderer,
    title: &str,
) {
    let composer_rows = u16::try_from(view.composer.lines().len())
        .unwrap_or(COMPOSER_MAX_ROWS)
        .clamp(1, COMPOSER_MAX_ROWS);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(0),
            Constraint::Length(1),
            Constraint::Length(composer_rows + 2), // +2 for borders
        ])
        .split(frame.area());

    frame.render_widget(
        Paragraph::new(Span::styled(
            title,
            Style::default().add_modifier(Modifier::BOLD),
        )),
        chunks[0],
    );

    let output = renderer.render(state);
    let lines = to_lines(&output, chunks[1].width, &view.style);
    let offset = scroll_offset(lines.len(), chunks[1].height, output.scroll_to_end);
    frame.render_widget(Paragraph::new(lines).scroll((offset, 0)), chunks[1]);

    frame.render_widget(Paragraph::new(status_line(state, view)), chunks[2]);

    // Input looks disabled while a request is pending.
    let border = if state.loading() {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default().fg(Color::Cyan)
    };
    view.composer.set_block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border)
            .title("Type your message"),
    );
    frame.render_widget(&view.composer, chunks[3]);

    if state.settings_open() {
        draw_settings(frame, view);
    }
}

fn draw_settings(frame: &mut Frame, view: &mut ChatView) {
    let area = centered_rect(60, 7, frame.area());
    frame.render_widget(Clear, area);

    let outer = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title("Settings");
    let inner = outer.inner(area);
    frame.render_widget(outer, area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(1),
            Constraint::Min(0),
        ])
        .split(inner);

    view.credential_input.set_block(
        Block::default()
            .borders(Borders::ALL)
            .title("OpenRouter API key"),
    );
    frame.render_widget(&view.credential_input, rows[0]);
    frame.render_widget(
        Paragraph::new(Span::styled(
            "Enter save · Esc close",
            Style::default().fg(Color::DarkGray),
        )),
        rows[1],
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn composer_text_joins_rows() {
        let mut view = ChatView::new();
        view.composer.insert_str("first");
        view.composer.insert_newline();
        view.composer.insert_str("second");
        assert_eq!(view.composer_text(), "first\nsecond");

        view.reset_composer();
        assert_eq!(view.composer_text(), "");
    }

    #[test]
    fn credential_prefill_round_trips() {
        let mut view = ChatView::new();
        view.prefill_credential(Some("sk-or-123"));
        assert_eq!(view.credential_text(), "sk-or-123");
        view.prefill_credential(None);
        assert_eq!(view.credential_text(), "");
    }

    #[test]
    fn centered_rect_stays_inside_area() {
        let area = Rect::new(0, 0, 100, 5);
        let rect = centered_rect(60, 7, area);
        assert_eq!(rect.width, 60);
        assert_eq!(rect.height, 5);
        assert_eq!(rect.x, 20);
    }
}
