//! Minimal Markdown styling for explanation text
//!
//! Explanations come back as a small Markdown subset: `###` headings,
//! numbered examples, bullets and `**bold**` runs. Everything else is shown
//! as plain text.

use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};

/// Heading colour
const HEADING: Color = Color::Cyan;
/// Colour of list markers
const MARKER: Color = Color::Yellow;

/// Converts explanation text into styled lines
pub fn render_markdown(text: &str) -> Vec<Line<'static>> {
    text.lines().map(render_line).collect()
}

fn render_line(line: &str) -> Line<'static> {
    let trimmed = line.trim_start();

    if let Some(heading) = strip_heading(trimmed) {
        return Line::from(Span::styled(
            heading.to_string(),
            Style::default().fg(HEADING).add_modifier(Modifier::BOLD),
        ));
    }

    if let Some((number, rest)) = split_numbered(trimmed) {
        let mut spans = vec![Span::styled(
            format!("{}. ", number),
            Style::default().fg(MARKER),
        )];
        spans.extend(inline_spans(rest));
        return Line::from(spans);
    }

    if let Some(rest) = trimmed
        .strip_prefix("* ")
        .or_else(|| trimmed.strip_prefix("- "))
    {
        let mut spans = vec![Span::styled("  • ", Style::default().fg(MARKER))];
        spans.extend(inline_spans(rest));
        return Line::from(spans);
    }

    Line::from(inline_spans(line))
}

/// Returns the heading text if the line is an ATX heading
fn strip_heading(line: &str) -> Option<&str> {
    let hashes = line.chars().take_while(|c| *c == '#').count();
    if hashes == 0 || hashes > 6 {
        return None;
    }
    line[hashes..].strip_prefix(' ').map(str::trim)
}

/// Splits `12. text` into its number and the remaining text
fn split_numbered(line: &str) -> Option<(&str, &str)> {
    let digits = line.chars().take_while(char::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let rest = line[digits..].strip_prefix(". ")?;
    Some((&line[..digits], rest))
}

/// Splits text on `**` markers, toggling bold for each enclosed run
///
/// An unmatched trailing marker is kept as literal text.
fn inline_spans(text: &str) -> Vec<Span<'static>> {
    let parts: Vec<&str> = text.split("**").collect();
    let balanced = parts.len() % 2 == 1;
    let mut spans = Vec::with_capacity(parts.len());

    for (i, part) in parts.iter().enumerate() {
        let is_last = i == parts.len() - 1;
        if !balanced && is_last {
            spans.push(Span::raw(format!("**{}", part)));
            continue;
        }
        if part.is_empty() {
            continue;
        }
        if i % 2 == 1 {
            spans.push(Span::styled(
                part.to_string(),
                Style::default().add_modifier(Modifier::BOLD),
            ));
        } else {
            spans.push(Span::raw(part.to_string()));
        }
    }

    spans
}
