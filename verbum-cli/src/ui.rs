//! Terminal UI rendering

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
    Frame,
};

use verbum_core::{
    selection::clamp_menu, Annotation, AnnotationKind, App, ContentState, Direction as Step, Focus,
    HighlightColor, LibraryState, MenuOption, Mode, Point, Size, Testament, Verse,
};

// Catppuccin Mocha colors
const BASE: Color = Color::Rgb(30, 30, 46);
const SURFACE0: Color = Color::Rgb(49, 50, 68);
const SURFACE1: Color = Color::Rgb(69, 71, 90);
const TEXT: Color = Color::Rgb(205, 214, 244);
const SUBTEXT0: Color = Color::Rgb(166, 173, 200);
const RED: Color = Color::Rgb(243, 139, 168);
const YELLOW: Color = Color::Rgb(249, 226, 175);
const GREEN: Color = Color::Rgb(166, 227, 161);
const BLUE: Color = Color::Rgb(137, 180, 250);
const MAUVE: Color = Color::Rgb(203, 166, 247);
const TEAL: Color = Color::Rgb(148, 226, 213);

const SIDEBAR_WIDTH: u16 = 26;
const ANNOTATION_PANEL_WIDTH: u16 = 36;
const MENU_WIDTH: u16 = 30;
const SEARCH_RESULTS_HEIGHT: u16 = 9;

pub fn draw(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Title bar
            Constraint::Min(0),    // Main content
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    draw_title_bar(frame, app, chunks[0]);
    draw_main_area(frame, app, chunks[1]);
    draw_status_bar(frame, app, chunks[2]);

    // Draw popups/overlays
    match app.mode {
        Mode::Search => draw_search(frame, app, chunks[1]),
        Mode::Help => draw_help(frame),
        _ => {}
    }
}

fn draw_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let title = match app.mode {
        Mode::Search => format!(" Search: {}_", app.session.search.input),
        _ => {
            let nav = &app.session.navigation;
            if nav.selected_book().is_some() && nav.total_chapters() > 0 {
                let prev = if nav.can_step(Step::Prev) { "<" } else { " " };
                let next = if nav.can_step(Step::Next) { ">" } else { " " };
                format!(
                    " Verbum - {} {}[{}/{}]{}",
                    app.title(),
                    prev,
                    nav.selected_chapter(),
                    nav.total_chapters(),
                    next
                )
            } else {
                format!(" Verbum - {}", app.title())
            }
        }
    };

    let title_bar = Paragraph::new(title).style(Style::default().fg(TEXT).bg(SURFACE0));
    frame.render_widget(title_bar, area);
}

fn draw_main_area(frame: &mut Frame, app: &App, area: Rect) {
    let panels = &app.session.panels;
    let mut constraints = Vec::new();
    if panels.sidebar_open() {
        constraints.push(Constraint::Length(SIDEBAR_WIDTH));
    }
    constraints.push(Constraint::Min(0));
    if panels.annotation_panel_open() {
        constraints.push(Constraint::Length(ANNOTATION_PANEL_WIDTH));
    }

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(constraints)
        .split(area);

    let mut index = 0;
    if panels.sidebar_open() {
        draw_sidebar(frame, app, chunks[index]);
        index += 1;
    }
    let reader = chunks[index];
    draw_reader(frame, app, reader);
    if panels.annotation_panel_open() {
        draw_annotation_panel(frame, app, chunks[index + 1]);
    }

    if matches!(app.mode, Mode::Menu | Mode::NoteInput) {
        draw_menu(frame, app, reader);
    }
}

fn border_style(app: &App, focus: Focus) -> Style {
    if app.focus == focus {
        Style::default().fg(BLUE)
    } else {
        Style::default().fg(SUBTEXT0)
    }
}

fn draw_sidebar(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(app, Focus::Sidebar))
        .title("Books");

    let library = match &app.session.library {
        LibraryState::Loading => {
            let text = Paragraph::new("Loading books...").style(Style::default().fg(SUBTEXT0));
            frame.render_widget(text.block(block), area);
            return;
        }
        LibraryState::Failed(message) => {
            let text = Paragraph::new(message.as_str())
                .style(Style::default().fg(RED))
                .wrap(Wrap { trim: true });
            frame.render_widget(text.block(block), area);
            return;
        }
        LibraryState::Ready(library) => library,
    };

    let current = app.session.navigation.selected_book().map(|b| b.id);
    let mut items: Vec<ListItem> = Vec::new();
    let mut flat_index = 0;
    let mut cursor_row = 0;
    for testament in Testament::all() {
        let books = library.filtered(*testament, "");
        if books.is_empty() {
            continue;
        }
        items.push(ListItem::new(Span::styled(
            testament.as_str(),
            Style::default().fg(MAUVE).add_modifier(Modifier::BOLD),
        )));
        for book in books {
            let selected = flat_index == app.book_cursor;
            if selected {
                cursor_row = items.len();
            }
            let marker = if selected { ">" } else { " " };
            let mut style = Style::default().fg(TEXT);
            if Some(book.id) == current {
                style = style.fg(TEAL).add_modifier(Modifier::BOLD);
            }
            if selected && app.focus == Focus::Sidebar {
                style = style.bg(SURFACE1);
            }
            items.push(ListItem::new(format!("{marker} {}", book.name)).style(style));
            flat_index += 1;
        }
    }

    let visible = area.height.saturating_sub(2) as usize;
    let skip = cursor_row.saturating_sub(visible.saturating_sub(1));
    let list = List::new(items.into_iter().skip(skip).collect::<Vec<_>>()).block(block);
    frame.render_widget(list, area);
}

fn draw_reader(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(app, Focus::Reader))
        .title(app.title());
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let chapter = match &app.session.content {
        ContentState::Empty => {
            let hint = Paragraph::new("Select a book from the sidebar (b to toggle it)")
                .style(Style::default().fg(SUBTEXT0));
            frame.render_widget(hint, inner);
            return;
        }
        ContentState::Loading { chapter, .. } => {
            let text = format!("Loading chapter {chapter}...");
            frame.render_widget(
                Paragraph::new(text).style(Style::default().fg(SUBTEXT0)),
                inner,
            );
            return;
        }
        ContentState::Failed { message } => {
            let lines = vec![
                Line::from(Span::styled(message.as_str(), Style::default().fg(RED))),
                Line::from(""),
                Line::from(Span::styled(
                    "Press r to retry",
                    Style::default().fg(SUBTEXT0),
                )),
            ];
            frame.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), inner);
            return;
        }
        ContentState::Ready(chapter) => chapter,
    };

    let width = inner.width.max(1) as usize;
    let mut lines: Vec<Line> = Vec::new();
    let mut cursor_top = 0;
    let mut cursor_bottom = 0;
    let mut rows = 0;
    for (index, verse) in chapter.verses.iter().enumerate() {
        let line = verse_line(app, verse, index == app.verse_cursor);
        let height = line.width().div_ceil(width).max(1);
        if index == app.verse_cursor {
            cursor_top = rows;
            cursor_bottom = rows + height;
        }
        rows += height;
        lines.push(line);
    }

    let visible = inner.height as usize;
    // Keep the cursor verse in view, top edge first
    let scroll = cursor_bottom.saturating_sub(visible).min(cursor_top);

    let paragraph = Paragraph::new(lines)
        .scroll((scroll as u16, 0))
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, inner);
}

fn verse_line<'a>(app: &App, verse: &'a Verse, under_cursor: bool) -> Line<'a> {
    let store = &app.session.annotations;
    let mut spans = vec![Span::styled(
        format!("{:>3} ", verse.verse_num),
        Style::default().fg(SUBTEXT0),
    )];

    let mut style = Style::default().fg(TEXT);
    if let Some(color) = store.highlight_for(verse.id) {
        style = style.fg(BASE).bg(highlight_color(color));
    }
    if under_cursor && app.focus == Focus::Reader {
        style = style.add_modifier(Modifier::BOLD | Modifier::UNDERLINED);
    }
    if app.session.focused_verse == Some(verse.verse_num) {
        style = style.add_modifier(Modifier::ITALIC);
    }
    spans.push(Span::styled(verse.text.as_str(), style));

    if store.is_bookmarked(verse.id) {
        spans.push(Span::styled(" *", Style::default().fg(YELLOW)));
    }
    if !store.notes_for(verse.id).is_empty() {
        spans.push(Span::styled(" [note]", Style::default().fg(GREEN)));
    }
    Line::from(spans)
}

fn draw_annotation_panel(frame: &mut Frame, app: &App, area: Rect) {
    let stats = app.session.annotations.stats();
    let filter = app.annotation_filter.map_or("all", |k| k.as_str());
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style(app, Focus::Annotations))
        .title(format!("Annotations ({}) [{filter}]", stats.total));

    let annotations = app.visible_annotations();
    if annotations.is_empty() {
        let text = Paragraph::new("No annotations in this chapter")
            .style(Style::default().fg(SUBTEXT0))
            .wrap(Wrap { trim: true });
        frame.render_widget(text.block(block), area);
        return;
    }

    let items: Vec<ListItem> = annotations
        .iter()
        .enumerate()
        .map(|(i, ann)| annotation_item(app, ann, i == app.annotation_cursor))
        .collect();

    let visible = (area.height.saturating_sub(2) / 2) as usize;
    let skip = app
        .annotation_cursor
        .saturating_sub(visible.saturating_sub(1));
    let list = List::new(items.into_iter().skip(skip).collect::<Vec<_>>()).block(block);
    frame.render_widget(list, area);
}

fn annotation_item<'a>(app: &App, ann: &'a Annotation, selected: bool) -> ListItem<'a> {
    let marker = if selected { ">" } else { " " };
    let reference = ann
        .verse_reference
        .clone()
        .or_else(|| {
            app.session
                .chapter()
                .and_then(|c| c.verse_by_id(ann.verse_id).map(|v| c.reference(v)))
        })
        .unwrap_or_else(|| format!("verse {}", ann.verse_id));

    let kind_style = match ann.color {
        Some(color) => Style::default().fg(BASE).bg(highlight_color(color)),
        None => Style::default().fg(TEAL),
    };
    let label = match (ann.kind, ann.color) {
        (AnnotationKind::Highlight, Some(color)) => color.label().to_string(),
        (kind, _) => kind.as_str().to_string(),
    };

    let detail: String = ann
        .note()
        .or(ann.verse_text.as_deref())
        .unwrap_or("")
        .chars()
        .take(ANNOTATION_PANEL_WIDTH as usize - 6)
        .collect();

    let base = if selected && app.focus == Focus::Annotations {
        Style::default().fg(TEXT).bg(SURFACE1)
    } else {
        Style::default().fg(TEXT)
    };

    ListItem::new(vec![
        Line::from(vec![
            Span::styled(format!("{marker} "), base),
            Span::styled(format!(" {label} "), kind_style),
            Span::styled(format!(" {reference}"), base),
        ]),
        Line::from(Span::styled(format!("   {detail}"), base.fg(SUBTEXT0))),
    ])
}

fn draw_menu(frame: &mut Frame, app: &App, reader: Rect) {
    let Some(menu) = app.session.selection.menu() else {
        return;
    };

    let options = menu.options.len() as u16;
    let extra = match (app.mode, &menu.error) {
        (Mode::NoteInput, Some(_)) => 4,
        (Mode::NoteInput, None) | (_, Some(_)) => 2,
        _ => 0,
    };
    let height = options + 2 + extra;

    // Anchor just below the verse under the cursor, kept on screen
    let row = menu.selection.anchor.y.saturating_add(1);
    let anchor = Point {
        x: i32::from(reader.x) + 4,
        y: i32::from(reader.y) + 1 + row,
    };
    let area = frame.area();
    let pos = clamp_menu(
        anchor,
        Size {
            width: u32::from(MENU_WIDTH),
            height: u32::from(height),
        },
        Size {
            width: u32::from(area.width),
            height: u32::from(area.height),
        },
    );
    let rect = Rect::new(
        pos.x.max(0) as u16,
        pos.y.max(0) as u16,
        MENU_WIDTH.min(area.width),
        height.min(area.height),
    );
    frame.render_widget(Clear, rect);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(MAUVE))
        .title("Annotate (1-6, j/k, Enter)");

    let mut lines: Vec<Line> = menu
        .options
        .iter()
        .enumerate()
        .map(|(i, option)| {
            let selected = i == menu.selected;
            let marker = if selected { ">" } else { " " };
            let row_style = if selected {
                Style::default().fg(TEXT).bg(SURFACE1)
            } else {
                Style::default().fg(TEXT)
            };
            let swatch = match option {
                MenuOption::Highlight(color) => {
                    Span::styled("  ", Style::default().bg(highlight_color(*color)))
                }
                MenuOption::Note => Span::styled("  ", Style::default().fg(GREEN)),
                MenuOption::Bookmark => Span::styled(" *", Style::default().fg(YELLOW)),
            };
            Line::from(vec![
                Span::styled(format!("{marker} "), row_style),
                swatch,
                Span::styled(format!(" {}", option.label()), row_style),
            ])
        })
        .collect();

    if app.mode == Mode::NoteInput {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("{}_", menu.note_draft),
            Style::default().fg(GREEN),
        )));
    }
    if let Some(error) = &menu.error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            error.as_str(),
            Style::default().fg(RED),
        )));
    }

    frame.render_widget(Paragraph::new(lines).block(block), rect);
}

fn draw_search(frame: &mut Frame, app: &App, main: Rect) {
    let search = &app.session.search;
    let width = main.width.min(60);
    let area = Rect::new(
        main.x + main.width.saturating_sub(width) / 2,
        main.y,
        width,
        SEARCH_RESULTS_HEIGHT.min(main.height),
    );
    frame.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(GREEN))
        .title("Results (Tab next, Enter open)");

    if search.results.is_empty() {
        let text = if search.in_flight {
            "Searching..."
        } else if search.input.trim().chars().count() < 2 {
            "Type a reference (John 3:16) or words"
        } else {
            "No results"
        };
        let hint = Paragraph::new(text).style(Style::default().fg(SUBTEXT0));
        frame.render_widget(hint.block(block), area);
        return;
    }

    let items: Vec<ListItem> = search
        .results
        .iter()
        .enumerate()
        .map(|(i, hit)| {
            let selected = i == app.search_cursor;
            let style = if selected {
                Style::default().fg(TEXT).bg(SURFACE1)
            } else {
                Style::default().fg(TEXT)
            };
            let snippet: String = hit.snippet.chars().take(width as usize).collect();
            ListItem::new(vec![
                Line::from(Span::styled(hit.label.as_str(), style.fg(TEAL))),
                Line::from(Span::styled(format!("  {snippet}"), style.fg(SUBTEXT0))),
            ])
        })
        .collect();
    frame.render_widget(List::new(items).block(block), area);
}

fn draw_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let mode_str = match app.mode {
        Mode::Normal => "NORMAL",
        Mode::Menu => "ANNOTATE",
        Mode::NoteInput => "NOTE",
        Mode::Search => "SEARCH",
        Mode::Help => "HELP",
    };

    let status = app.session.status_message.as_deref().unwrap_or("");

    let help_hint = "j/k move | h/l chapter | v annotate | / search | ? help";

    let status_text = format!(
        " {} | {}",
        mode_str,
        if status.is_empty() { help_hint } else { status },
    );

    let status_bar =
        Paragraph::new(status_text).style(Style::default().fg(SUBTEXT0).bg(SURFACE0));

    frame.render_widget(status_bar, area);
}

fn draw_help(frame: &mut Frame) {
    let area = centered_rect(60, 22, frame.area());
    frame.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(BLUE))
        .title("Help (press any key to close)");

    let heading = Style::default().fg(MAUVE).add_modifier(Modifier::BOLD);
    let help_text = vec![
        Line::from(Span::styled("Reading", heading)),
        Line::from("  j/k      Move down/up"),
        Line::from("  g/G      First/last verse"),
        Line::from("  h/l      Previous/next chapter"),
        Line::from("  Enter    Open book, annotate verse, jump to annotation"),
        Line::from("  /        Quick search (reference or words)"),
        Line::from("  r        Retry a failed load"),
        Line::from(""),
        Line::from(Span::styled("Panels", heading)),
        Line::from("  Tab      Cycle focus"),
        Line::from("  b / a    Toggle books / annotations"),
        Line::from("  drag     Swipe from an edge to open, across to close"),
        Line::from(""),
        Line::from(Span::styled("Annotations", heading)),
        Line::from("  v        Annotate verse under cursor"),
        Line::from("  1-6      Highlight color in the menu"),
        Line::from("  d / c    Delete / recolor selected annotation"),
        Line::from("  f        Filter by kind"),
        Line::from(""),
        Line::from(Span::styled("Press any key to close", Style::default().fg(SUBTEXT0))),
    ];

    let paragraph = Paragraph::new(help_text).block(block);
    frame.render_widget(paragraph, area);
}

fn highlight_color(color: HighlightColor) -> Color {
    let (r, g, b) = color.rgb();
    Color::Rgb(r, g, b)
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + (area.width.saturating_sub(width)) / 2;
    let y = area.y + (area.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(area.width), height.min(area.height))
}
