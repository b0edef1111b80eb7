//! UI rendering module for lingolah
//!
//! This module contains all the rendering logic for the terminal user interface,
//! using the ratatui library for TUI components.

pub mod help_overlay;
pub mod markdown;
pub mod term_detail;
pub mod term_list;

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::app::App;

pub use help_overlay::render as render_help_overlay;
pub use term_detail::render as render_term_detail;
pub use term_list::{render_tabs, render_terms};

/// Renders the whole screen for the current application state
pub fn render(frame: &mut Frame, app: &mut App) {
    let area = frame.area();

    // Header, category tabs, body, footer
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Length(3),
            Constraint::Min(5),
            Constraint::Length(1),
        ])
        .split(area);

    render_header(frame, chunks[0]);
    render_tabs(frame, app, chunks[1]);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(30), Constraint::Percentage(70)])
        .split(chunks[2]);

    render_terms(frame, app, body[0]);
    render_term_detail(frame, app, body[1]);
    render_footer(frame, app, chunks[3]);

    if app.show_help {
        render_help_overlay(frame);
    }
}

fn render_header(frame: &mut Frame, area: Rect) {
    let lines = vec![
        Line::from(Span::styled(
            "Lingo-Lah!",
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            "Your Local Lingo Guide!",
            Style::default().fg(Color::Gray),
        )),
    ];

    frame.render_widget(Paragraph::new(lines).alignment(Alignment::Center), area);
}

/// Renders the status line, falling back to key hints
fn render_footer(frame: &mut Frame, app: &App, area: Rect) {
    let line = if let Some(status) = &app.status {
        Line::from(Span::styled(
            status.clone(),
            Style::default().fg(Color::Yellow),
        ))
    } else if let Some(term) = app.cache().pending_term() {
        Line::from(Span::styled(
            format!("Fetching '{}'...", term),
            Style::default().fg(Color::Yellow),
        ))
    } else {
        Line::from(Span::styled(
            "←/→ category  ↑/↓ term  Enter explain  ? help  q quit",
            Style::default().fg(Color::DarkGray),
        ))
    };

    frame.render_widget(Paragraph::new(line), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use ratatui::{backend::TestBackend, Terminal};

    use crate::cache::FetchPolicy;
    use crate::fetch::{FetchConfig, FetchCoordinator};
    use crate::glossary::Glossary;
    use crate::provider::{ScriptedProvider, ScriptedResponse};

    fn create_test_app(provider: ScriptedProvider) -> App {
        let fetcher = FetchCoordinator::new(Arc::new(provider), FetchConfig::default());
        App::new(Glossary::builtin(), FetchPolicy::SessionExclusive, fetcher)
    }

    fn render_to_string(app: &mut App) -> String {
        let backend = TestBackend::new(100, 30);
        let mut terminal = Terminal::new(backend).unwrap();

        terminal.draw(|frame| render(frame, app)).unwrap();

        let buffer = terminal.backend().buffer();
        buffer.content().iter().map(|cell| cell.symbol()).collect()
    }

    #[tokio::test]
    async fn test_full_screen_renders() {
        let mut app = create_test_app(ScriptedProvider::new());

        let content = render_to_string(&mut app);

        assert!(content.contains("Lingo-Lah!"));
        assert!(content.contains("Everyday Conversation"));
        assert!(content.contains("Lah"));
        assert!(content.contains("Select a term"));
        assert!(content.contains("? help"));
    }

    #[tokio::test]
    async fn test_footer_shows_pending_fetch() {
        let provider = ScriptedProvider::new().with_response("Lah", ScriptedResponse::Stall);
        let mut app = create_test_app(provider);

        app.select_term("Lah");

        let content = render_to_string(&mut app);

        assert!(content.contains("Fetching 'Lah'..."));
    }

    #[tokio::test]
    async fn test_help_overlay_shown() {
        let mut app = create_test_app(ScriptedProvider::new());
        app.show_help = true;

        let content = render_to_string(&mut app);

        assert!(content.contains("Keyboard Shortcuts"));
    }
}
