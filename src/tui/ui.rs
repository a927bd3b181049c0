use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, EditField, View};
use crate::worker::badge_text;

/// Badge background, fixed neutral gray.
const BADGE_COLOR: Color = Color::DarkGray;

pub fn draw(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Min(0),    // List or edit form
            Constraint::Length(1), // Status line
        ])
        .split(frame.area());

    render_header(frame, app, chunks[0]);

    match app.view {
        View::List => render_article_list(frame, app, chunks[1]),
        View::Edit => render_edit_form(frame, app, chunks[1]),
    }

    render_status(frame, app, chunks[2]);

    if app.show_help {
        render_help(frame);
    }
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let title = format!(" Article Shelf [{}] ", app.filter.label());

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let dot_color = if app.connected {
        Color::Green
    } else {
        Color::Red
    };

    let mut spans = vec![
        Span::styled("● ", Style::default().fg(dot_color)),
        Span::styled(
            app.connection_message.clone(),
            Style::default().fg(Color::White),
        ),
        Span::raw(format!(
            "  |  {} today, {} this week",
            app.stats.today, app.stats.week
        )),
    ];

    let badge = badge_text(app.stats.total);
    if !badge.is_empty() {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            format!(" {badge} "),
            Style::default().bg(BADGE_COLOR).fg(Color::White),
        ));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), inner);
}

fn render_article_list(frame: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .articles
        .iter()
        .map(|article| {
            let style = if article.is_deleted {
                Style::default().fg(Color::DarkGray)
            } else {
                Style::default().fg(Color::White)
            };

            let mut spans = vec![Span::styled(article.display_title().to_string(), style)];
            if article.is_deleted {
                spans.push(Span::styled(
                    " (deleted)",
                    Style::default().fg(Color::Red),
                ));
            }

            let preview = article.preview();
            if !preview.is_empty() {
                spans.push(Span::styled(
                    format!("  {}", preview.replace('\n', " ")),
                    Style::default().fg(Color::DarkGray),
                ));
            }

            spans.push(Span::styled(
                format!("  {}", article.created_at.format("%Y-%m-%d %H:%M")),
                Style::default().fg(Color::Blue),
            ));
            if article.updated_at != article.created_at {
                spans.push(Span::styled(
                    format!("  (edited {})", article.updated_at.format("%m-%d %H:%M")),
                    Style::default().fg(Color::Blue),
                ));
            }

            ListItem::new(Line::from(spans))
        })
        .collect();

    let title = format!(" Articles (page {}) ", app.page);
    let list = List::new(items)
        .block(Block::default().title(title).borders(Borders::ALL))
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    let mut state = ListState::default();
    if !app.articles.is_empty() {
        state.select(Some(app.selected_index));
    }

    frame.render_stateful_widget(list, area, &mut state);
}

fn render_edit_form(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Created/updated line
            Constraint::Length(3), // Title
            Constraint::Length(3), // URL
            Constraint::Length(3), // Priority
            Constraint::Min(0),    // Content
        ])
        .split(area);

    if let Some(article) = &app.current {
        let mut meta = format!(
            " Created {}  •  Updated {}",
            article.created_at.format("%Y-%m-%d %H:%M"),
            article.updated_at.format("%Y-%m-%d %H:%M")
        );
        if article.is_deleted {
            meta.push_str("  •  Deleted");
        }
        frame.render_widget(
            Paragraph::new(meta).style(Style::default().fg(Color::DarkGray)),
            chunks[0],
        );
    }

    render_field(
        frame,
        chunks[1],
        " Title ",
        &app.form.title,
        app.form.focus == EditField::Title,
    );
    render_field(
        frame,
        chunks[2],
        " URL ",
        &app.form.url,
        app.form.focus == EditField::Url,
    );
    render_field(
        frame,
        chunks[3],
        " Priority (space to change) ",
        app.form.priority.label(),
        app.form.focus == EditField::Priority,
    );
    render_field(
        frame,
        chunks[4],
        " Content ",
        &app.form.content,
        app.form.focus == EditField::Content,
    );
}

fn render_field(frame: &mut Frame, area: Rect, title: &str, value: &str, focused: bool) {
    let border_style = if focused {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(border_style);

    let text = if focused {
        format!("{value}_")
    } else {
        value.to_string()
    };

    let paragraph = Paragraph::new(text).block(block).wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn render_status(frame: &mut Frame, app: &App, area: Rect) {
    let (text, style) = if let Some(banner) = &app.banner {
        let color = if banner.is_error {
            Color::Red
        } else {
            Color::Green
        };
        (banner.message.clone(), Style::default().fg(color))
    } else {
        let hints = match app.view {
            View::List => {
                "j/k:nav  Enter:edit  r:refresh  f:filter  x:deleted  n/p:page  ?:help  q:quit"
            }
            View::Edit => {
                "Tab:field  Ctrl-S:save  Ctrl-D:delete/restore  Esc:back"
            }
        };
        (hints.to_string(), Style::default().fg(Color::DarkGray))
    };

    frame.render_widget(Paragraph::new(text).style(style), area);
}

fn render_help(frame: &mut Frame) {
    let area = centered_rect(50, 60, frame.area());

    let help_text = vec![
        "",
        " List view:",
        "   j / ↓    Move down",
        "   k / ↑    Move up",
        "   Enter    Open article",
        "   r        Refresh from the store",
        "   f        Cycle time filter (all/today/week)",
        "   x        Show or hide deleted articles",
        "   n / p    Next / previous page",
        "   o        Open source URL in browser",
        "",
        " Edit view:",
        "   Tab      Next field",
        "   Space    Cycle priority (when focused)",
        "   Ctrl-S   Save",
        "   Ctrl-D   Delete or restore",
        "   Esc      Back to list",
        "",
        " General:",
        "   ?        Toggle this help",
        "   q        Quit",
        "",
        " Press any key to close",
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let paragraph = Paragraph::new(help_text.join("\n"))
        .block(block)
        .style(Style::default().fg(Color::White));

    frame.render_widget(ratatui::widgets::Clear, area);
    frame.render_widget(paragraph, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
