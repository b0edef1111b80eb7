//! Explanation pane rendering
//!
//! Renders the detail pane for the active term: the cached explanation, the
//! text streamed so far while a fetch runs, or the last failure.

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use super::markdown::render_markdown;
use crate::app::App;
use crate::cache::{ExplanationRecord, FailureKind, FetchFailure};

/// Cursor shown after streamed text
const STREAM_CURSOR: &str = "▌";

/// Renders the explanation pane
///
/// # Arguments
/// * `frame` - The ratatui frame to render into
/// * `app` - The application state
/// * `area` - The pane area
///
/// Clamps `app.detail_scroll_offset` to the wrapped content height.
pub fn render(frame: &mut Frame, app: &mut App, area: Rect) {
    let Some((term, record)) = app.active_record() else {
        render_placeholder(frame, area);
        return;
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(Span::styled(
            format!(" Details for: {} ", term),
            Style::default()
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
        ));

    let lines = match (&record, &app.last_failure) {
        (ExplanationRecord::Ready(explanation), _) => {
            let mut lines = render_markdown(&explanation.text);
            lines.push(Line::from(""));
            lines.push(Line::from(Span::styled(
                format!(
                    "Fetched {}",
                    explanation
                        .fetched_at
                        .with_timezone(&chrono::Local)
                        .format("%H:%M")
                ),
                Style::default().fg(Color::DarkGray),
            )));
            lines
        }
        (ExplanationRecord::Pending { streamed }, _) if streamed.is_empty() => {
            vec![Line::from(Span::styled(
                "Fetching explanation...",
                Style::default().fg(Color::Yellow),
            ))]
        }
        (ExplanationRecord::Pending { streamed }, _) => {
            let mut lines = render_markdown(streamed);
            let cursor = Span::styled(STREAM_CURSOR, Style::default().fg(Color::Yellow));
            if streamed.ends_with('\n') || lines.is_empty() {
                lines.push(Line::from(cursor));
            } else if let Some(last) = lines.last_mut() {
                last.spans.push(cursor);
            }
            lines
        }
        (_, Some(failure)) => failure_lines(failure),
        (ExplanationRecord::Absent | ExplanationRecord::Failed(_), None) => {
            vec![Line::from(Span::styled(
                "Press Enter to fetch an explanation.",
                Style::default().fg(Color::DarkGray),
            ))]
        }
    };

    let inner_area = block.inner(area);
    let paragraph = Paragraph::new(lines).wrap(Wrap { trim: false });

    // Scroll is counted in wrapped rows, not source lines
    let content_height =
        u16::try_from(paragraph.line_count(inner_area.width)).unwrap_or(u16::MAX);
    let max_scroll = content_height.saturating_sub(inner_area.height);
    if app.detail_scroll_offset > max_scroll {
        app.detail_scroll_offset = max_scroll;
    }

    let paragraph = paragraph
        .block(block)
        .scroll((app.detail_scroll_offset, 0));

    frame.render_widget(paragraph, area);
}

/// Renders the pane before any term has been selected
fn render_placeholder(frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Details ");

    let paragraph = Paragraph::new(vec![
        Line::from("Select a term to see what it means."),
        Line::from(""),
        Line::from(Span::styled(
            "Use ↑/↓ to choose and Enter to explain.",
            Style::default().fg(Color::DarkGray),
        )),
    ])
    .block(block)
    .wrap(Wrap { trim: true });

    frame.render_widget(paragraph, area);
}

fn failure_lines(failure: &FetchFailure) -> Vec<Line<'static>> {
    let hint = match failure.kind {
        FailureKind::Configuration => "Set GEMINI_API_KEY and restart.",
        FailureKind::Provider | FailureKind::Timeout => "Press Enter to try again.",
    };

    vec![
        Line::from(Span::styled(
            "Could not fetch explanation",
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            failure.to_string(),
            Style::default().fg(Color::Red),
        )),
        Line::from(""),
        Line::from(Span::styled(hint, Style::default().fg(Color::DarkGray))),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use ratatui::{backend::TestBackend, Terminal};

    use crate::cache::FetchPolicy;
    use crate::fetch::{FetchConfig, FetchCoordinator};
    use crate::glossary::{Category, Glossary};
    use crate::provider::{ScriptedProvider, ScriptedResponse};

    fn create_test_app(provider: ScriptedProvider) -> App {
        let glossary = Glossary::from_categories(vec![Category::new("Fillers", ["Lah", "Meh"])]);
        let fetcher = FetchCoordinator::new(Arc::new(provider), FetchConfig::default());
        App::new(glossary, FetchPolicy::SessionExclusive, fetcher)
    }

    fn render_to_string(app: &mut App) -> String {
        let backend = TestBackend::new(70, 24);
        let mut terminal = Terminal::new(backend).unwrap();

        terminal
            .draw(|frame| {
                let area = frame.area();
                render(frame, app, area);
            })
            .unwrap();

        let buffer = terminal.backend().buffer();
        buffer.content().iter().map(|cell| cell.symbol()).collect()
    }

    #[tokio::test]
    async fn test_placeholder_before_selection() {
        let mut app = create_test_app(ScriptedProvider::new());

        let content = render_to_string(&mut app);

        assert!(content.contains("Select a term"));
    }

    #[tokio::test]
    async fn test_ready_explanation_is_rendered() {
        let provider = ScriptedProvider::new().with_response(
            "Lah",
            ScriptedResponse::Atomic("### Meaning\nA **filler** word.".to_string()),
        );
        let mut app = create_test_app(provider);

        app.select_term("Lah");
        app.settle_fetches().await;

        let content = render_to_string(&mut app);

        assert!(content.contains("Details for: Lah"));
        assert!(content.contains("Meaning"));
        assert!(!content.contains("###"));
        assert!(content.contains("A filler word."));
    }

    #[tokio::test]
    async fn test_pending_without_text_shows_progress() {
        let provider = ScriptedProvider::new().with_response("Meh", ScriptedResponse::Stall);
        let mut app = create_test_app(provider);

        app.select_term("Meh");

        let content = render_to_string(&mut app);

        assert!(content.contains("Details for: Meh"));
        assert!(content.contains("Fetching explanation..."));
    }

    #[tokio::test]
    async fn test_failure_is_rendered_with_hint() {
        let mut app = create_test_app(ScriptedProvider::new().with_response(
            "Lah",
            ScriptedResponse::MissingApiKey,
        ));

        app.select_term("Lah");
        app.settle_fetches().await;

        let content = render_to_string(&mut app);

        assert!(content.contains("Could not fetch explanation"));
        assert!(content.contains("configuration error"));
        assert!(content.contains("GEMINI_API_KEY"));
    }

    #[tokio::test]
    async fn test_scroll_offset_hides_top_lines() {
        let provider = ScriptedProvider::new().with_response(
            "Lah",
            ScriptedResponse::Atomic("first line\nsecond line\nthird line".to_string()),
        );
        let mut app = create_test_app(provider);
        app.select_term("Lah");
        app.settle_fetches().await;

        app.detail_scroll_offset = 1;
        let content = render_to_string(&mut app);

        assert!(!content.contains("first line"));
        assert!(content.contains("second line"));
    }

    #[tokio::test]
    async fn test_scroll_reaches_end_of_wrapped_explanation() {
        let paragraph = "word ".repeat(120);
        let mut text = String::from("### Meaning\n");
        for _ in 0..5 {
            text.push_str(&paragraph);
            text.push('\n');
        }
        text.push_str("3. LAST EXAMPLE SENTENCE");

        let provider =
            ScriptedProvider::new().with_response("Lah", ScriptedResponse::Atomic(text));
        let mut app = create_test_app(provider);
        app.select_term("Lah");
        app.settle_fetches().await;

        let content = render_to_string(&mut app);
        assert!(!content.contains("LAST EXAMPLE SENTENCE"));

        for _ in 0..40 {
            app.scroll_down();
        }
        let content = render_to_string(&mut app);

        assert!(
            content.contains("LAST EXAMPLE SENTENCE"),
            "Scrolling to the limit should reveal the final line"
        );

        // The offset is clamped, so one page up moves the view immediately
        let clamped = app.detail_scroll_offset;
        assert!(clamped > 22, "Offset should count wrapped rows: {}", clamped);
        app.scroll_up();
        assert_eq!(app.detail_scroll_offset, clamped - 5);
    }
}
