use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
};
use crate::app::{App, Focus, Popup};

const HELP_TEXT: &str = "\
F1 / Ctrl-H   This help message
Ctrl-F        Find text in the response
Ctrl-N        Find next
Ctrl-G        Submit prompt
Ctrl-Alt-V    Toggle voice playback
Ctrl-Alt-C    Copy first code block
Ctrl-E        Export response to HTML
Ctrl-L        View log
Ctrl-K        Clear prompt and response
Ctrl-O        Edit options
Ctrl-Q        Quit
Tab           Switch between prompt and response";

/// Parse a line with **bold** markdown into styled spans
fn parse_markdown_line(text: &str) -> Line<'static> {
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut rest = text;

    while let Some(open) = rest.find("**") {
        let after_open = &rest[open + 2..];
        match after_open.find("**") {
            Some(close) if close > 0 => {
                if open > 0 {
                    spans.push(Span::raw(rest[..open].to_string()));
                }
                spans.push(Span::styled(
                    after_open[..close].to_string(),
                    Style::default().add_modifier(Modifier::BOLD),
                ));
                rest = &after_open[close + 2..];
            }
            // No closing **, treat as literal
            _ => break,
        }
    }

    if !rest.is_empty() {
        spans.push(Span::raw(rest.to_string()));
    }

    Line::from(spans)
}

/// Split the response into lines, marking the current search match.
fn response_lines(text: &str, highlight: Option<(usize, usize)>) -> Vec<Line<'static>> {
    let match_style = Style::default().bg(Color::Yellow).fg(Color::Black);
    let mut lines = Vec::new();
    let mut in_code = false;
    let mut line_start = 0;

    for raw in text.split('\n') {
        let line_end = line_start + raw.len();
        let fence = raw.starts_with("```");
        if fence {
            in_code = !in_code;
        }

        let line = match highlight {
            Some((start, end)) if start < line_end.max(line_start + 1) && end > line_start => {
                let s = start.max(line_start) - line_start;
                let e = end.min(line_end) - line_start;
                let mut spans = Vec::new();
                if s > 0 {
                    spans.push(Span::raw(raw[..s].to_string()));
                }
                spans.push(Span::styled(raw[s..e].to_string(), match_style));
                if e < raw.len() {
                    spans.push(Span::raw(raw[e..].to_string()));
                }
                Line::from(spans)
            }
            _ if fence => Line::styled(raw.to_string(), Style::default().fg(Color::DarkGray)),
            _ if in_code => Line::styled(raw.to_string(), Style::default().fg(Color::Green)),
            _ if raw.starts_with('#') => Line::styled(
                raw.to_string(),
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
            ),
            _ => parse_markdown_line(raw),
        };

        lines.push(line);
        line_start = line_end + 1;
    }

    lines
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    // Main layout: header, prompt, response, footer
    let [header_area, prompt_area, response_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(7),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_prompt(app, frame, prompt_area);
    render_response(app, frame, response_area);
    render_footer(app, frame, footer_area);

    match &app.popup {
        Some(Popup::Notice { title, text }) => render_notice(frame, area, title, text),
        Some(Popup::Help) => render_notice(frame, area, "Command Keys", HELP_TEXT),
        Some(Popup::ConfirmClear) => render_notice(
            frame,
            area,
            "Confirm Clear",
            "Do you want to clear PROMPT and RESPONSE areas? (y/n)",
        ),
        Some(Popup::Find { input, cursor }) => render_find(frame, area, input, *cursor),
        None => {}
    }
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let voice_indicator = if app.playback.is_on() {
        format!(" [voice: {}]", app.config.voice)
    } else {
        String::new()
    };

    let title = Line::from(vec![
        Span::styled(" aichat ", Style::default().fg(Color::Cyan).bold()),
        Span::styled(format!("OpenAI {}", app.config.model), Style::default().fg(Color::White)),
        Span::styled(voice_indicator, Style::default().fg(Color::Yellow)),
        Span::raw(" "),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

fn render_prompt(app: &App, frame: &mut Frame, area: Rect) {
    let focused = app.focus == Focus::Prompt && app.popup.is_none();
    let border_color = if focused { Color::Cyan } else { Color::DarkGray };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Prompt ");

    let text = if app.prompt_input.is_empty() && !focused {
        Text::from(Span::styled(
            "Enter prompt here, Ctrl-G to submit",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        Text::from(app.prompt_input.as_str())
    };

    let inner = block.inner(area);

    // Cursor row/column within the (unwrapped) prompt text
    let before: String = app.prompt_input.chars().take(app.prompt_cursor).collect();
    let row = before.matches('\n').count() as u16;
    let col = before.rsplit('\n').next().map(|l| l.chars().count()).unwrap_or(0) as u16;
    let scroll = row.saturating_sub(inner.height.saturating_sub(1));

    let prompt = Paragraph::new(text).block(block).scroll((scroll, 0));
    frame.render_widget(prompt, area);

    if focused {
        let x = inner.x + col.min(inner.width.saturating_sub(1));
        let y = inner.y + (row - scroll).min(inner.height.saturating_sub(1));
        frame.set_cursor_position((x, y));
    }
}

fn render_response(app: &mut App, frame: &mut Frame, area: Rect) {
    let focused = app.focus == Focus::Response && app.popup.is_none();
    let border_color = if focused { Color::Cyan } else { Color::DarkGray };

    // Store dimensions for scroll calculations (inner size minus borders)
    app.response_height = area.height.saturating_sub(2);
    app.response_width = area.width.saturating_sub(2);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Response ");

    let text = if app.query_loading {
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        Text::from(Span::styled(
            format!("Thinking {}", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        ))
    } else {
        Text::from(response_lines(&app.response, app.highlight))
    };

    let response = Paragraph::new(text)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.response_scroll, 0));
    frame.render_widget(response, area);
}

/// Key/label pairs for the footer. F1 leads since many terminals deliver
/// Ctrl-H as Backspace.
fn footer_hints(logging: bool, busy: bool) -> Vec<(&'static str, &'static str)> {
    if busy {
        return vec![("^Q", "quit")];
    }

    let mut hints = vec![
        ("F1", "help"),
        ("^G", "submit"),
        ("^F", "find"),
        ("^N", "next"),
        ("^E", "export"),
    ];
    if logging {
        hints.push(("^L", "log"));
    }
    hints.push(("^Q", "quit"));
    hints
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let (mode_text, mode_style) = match app.focus {
        Focus::Prompt => (" PROMPT ", Style::default().bg(Color::Yellow).fg(Color::Black)),
        Focus::Response => (" RESPONSE ", Style::default().bg(Color::Blue).fg(Color::White)),
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let hints = footer_hints(app.config.logging, app.is_busy())
        .into_iter()
        .flat_map(|(key, label)| {
            [
                Span::styled(format!(" {} ", key), key_style),
                Span::styled(format!(" {} ", label), label_style),
            ]
        });

    let footer_content = Line::from(
        vec![
            Span::styled(mode_text, mode_style),
            Span::styled(" ", label_style),
        ]
        .into_iter()
        .chain(hints)
        .collect::<Vec<_>>(),
    );

    let footer = Paragraph::new(footer_content).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}

fn centered_popup(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width.saturating_sub(4));
    let height = height.min(area.height.saturating_sub(2));
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width, height)
}

fn render_notice(frame: &mut Frame, area: Rect, title: &str, text: &str) {
    let width = text
        .lines()
        .map(|l| l.chars().count())
        .max()
        .unwrap_or(0)
        .clamp(30, 76) as u16
        + 4;
    let height = text.lines().count().max(1) as u16 + 4;
    let popup_area = centered_popup(area, width, height);

    // Clear the area behind the popup
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(format!(" {} ", title));

    let body = Paragraph::new(format!("{}\n", text))
        .block(block)
        .wrap(Wrap { trim: false });
    frame.render_widget(body, popup_area);

    let hint_area = Rect::new(
        popup_area.x + 2,
        popup_area.y + popup_area.height.saturating_sub(2),
        popup_area.width.saturating_sub(4),
        1,
    );
    frame.render_widget(
        Paragraph::new("Enter/Esc to close").style(Style::default().fg(Color::DarkGray)),
        hint_area,
    );
}

fn render_find(frame: &mut Frame, area: Rect, input: &str, cursor: usize) {
    let popup_area = centered_popup(area, 50, 5);
    frame.render_widget(Clear, popup_area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow))
        .title(" Find ");

    let inner = block.inner(popup_area);
    frame.render_widget(block, popup_area);

    let instructions = Paragraph::new("Enter text to search:")
        .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(instructions, Rect::new(inner.x, inner.y, inner.width, 1));

    let input_area = Rect::new(inner.x, inner.y + 2, inner.width, 1);
    frame.render_widget(
        Paragraph::new(input.to_string()).style(Style::default().fg(Color::Cyan)),
        input_area,
    );

    let cursor_x = cursor.min(input_area.width as usize) as u16;
    frame.set_cursor_position((input_area.x + cursor_x, input_area.y));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat(line: &Line) -> String {
        line.spans.iter().map(|s| s.content.as_ref()).collect()
    }

    #[test]
    fn test_bold_markdown_becomes_styled_span() {
        let line = parse_markdown_line("a **bold** word");
        assert_eq!(line.spans.len(), 3);
        assert_eq!(line.spans[1].content, "bold");
        assert!(line.spans[1].style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn test_unclosed_bold_is_literal() {
        let line = parse_markdown_line("2 ** 3");
        assert_eq!(flat(&line), "2 ** 3");
    }

    #[test]
    fn test_highlight_spans_only_the_match() {
        let lines = response_lines("one\nthe cat sat", Some((8, 11)));
        assert_eq!(lines.len(), 2);
        assert_eq!(flat(&lines[0]), "one");
        assert_eq!(lines[1].spans.len(), 3);
        assert_eq!(lines[1].spans[1].content, "cat");
        assert_eq!(lines[1].spans[1].style.bg, Some(Color::Yellow));
    }

    #[test]
    fn test_footer_leads_with_f1_help() {
        let hints = footer_hints(false, false);
        assert_eq!(hints[0], ("F1", "help"));
        assert!(!hints.iter().any(|(key, _)| *key == "^L"));
        assert!(footer_hints(true, false).contains(&("^L", "log")));
    }

    #[test]
    fn test_footer_only_offers_quit_while_busy() {
        assert_eq!(footer_hints(true, true), vec![("^Q", "quit")]);
    }
}
