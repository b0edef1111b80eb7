//! Category tabs and term list rendering
//!
//! Shows one tab per category and the terms of the active category, marking
//! terms whose explanation is cached or still being fetched.

use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Tabs, Wrap},
    Frame,
};

use crate::app::App;
use crate::cache::ExplanationRecord;

/// Renders the category tabs
pub fn render_tabs(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(" Categories ");

    if app.glossary.is_empty() {
        let message = Paragraph::new("No lingo categories found")
            .style(Style::default().fg(Color::DarkGray))
            .block(block);
        frame.render_widget(message, area);
        return;
    }

    let titles: Vec<Line> = app
        .glossary
        .categories()
        .iter()
        .map(|c| Line::from(c.name.clone()))
        .collect();

    let tabs = Tabs::new(titles)
        .block(block)
        .select(app.selected_category)
        .style(Style::default().fg(Color::Gray))
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
        .divider("|");

    frame.render_widget(tabs, area);
}

/// Renders the term list of the active category
pub fn render_terms(frame: &mut Frame, app: &App, area: Rect) {
    let title = app
        .current_category()
        .map(|c| format!(" {} ", c.name))
        .unwrap_or_else(|| " Terms ".to_string());
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(title);

    let terms = app.current_terms();
    if terms.is_empty() {
        let message = Paragraph::new("No terms listed in this category yet.")
            .style(Style::default().fg(Color::DarkGray))
            .wrap(Wrap { trim: true })
            .block(block);
        frame.render_widget(message, area);
        return;
    }

    let items: Vec<ListItem> = terms
        .iter()
        .map(|term| {
            let record = app.cache().lookup(term);
            let is_active = app.active_term.as_deref() == Some(term.as_str());
            ListItem::new(term_line(term, &record, is_active))
        })
        .collect();

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().bg(Color::DarkGray))
        .highlight_symbol("> ");

    let mut state = ListState::default().with_selected(Some(app.selected_term));
    frame.render_stateful_widget(list, area, &mut state);
}

/// Builds a list line with a cache status marker
fn term_line(term: &str, record: &ExplanationRecord, is_active: bool) -> Line<'static> {
    let (marker, marker_color) = match record {
        ExplanationRecord::Ready(_) => ("✓", Color::Green),
        ExplanationRecord::Pending { .. } => ("…", Color::Yellow),
        ExplanationRecord::Absent | ExplanationRecord::Failed(_) => (" ", Color::Reset),
    };

    let term_style = if is_active {
        Style::default().add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };

    Line::from(vec![
        Span::styled(term.to_string(), term_style),
        Span::raw(" "),
        Span::styled(marker, Style::default().fg(marker_color)),
    ])
}
