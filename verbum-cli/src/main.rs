//! Verbum CLI - Terminal Bible reader with highlights and notes

mod io;
mod ui;

use std::fs::{self, OpenOptions};
use std::io::stdout;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind,
        KeyModifiers, MouseButton, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::prelude::*;
use tokio::sync::mpsc::UnboundedReceiver;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use verbum_client::HttpContentClient;
use verbum_core::{
    App, Direction, Effect, Focus, Mode, Point, ReaderConfig, Size, ViewportObserver,
};

use io::{Outcome, Worker};

/// Pixels per terminal cell, used to express the terminal as a viewport
const CELL_WIDTH_PX: u32 = 10;
const CELL_HEIGHT_PX: u32 = 20;

const TICK: Duration = Duration::from_millis(50);

#[derive(Parser, Debug)]
#[command(name = "verbum", version, about = "Read the Bible in your terminal")]
struct Args {
    /// API server root, overriding the config file
    #[arg(long, value_name = "URL")]
    api_url: Option<String>,

    /// Config file (default: <config dir>/verbum/config.toml)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Book to open on start, by id or name
    #[arg(long, value_name = "BOOK")]
    book: Option<String>,

    /// Chapter to open with --book
    #[arg(long, requires = "book", default_value_t = 1)]
    chapter: u32,
}

/// The terminal seen as a viewport in pixels
struct TerminalViewport {
    cols: u16,
    rows: u16,
}

impl ViewportObserver for TerminalViewport {
    fn viewport(&self) -> Size {
        Size {
            width: u32::from(self.cols) * CELL_WIDTH_PX,
            height: u32::from(self.rows) * CELL_HEIGHT_PX,
        }
    }
}

fn cell_to_point(column: u16, row: u16) -> Point {
    Point {
        x: i32::from(column) * CELL_WIDTH_PX as i32,
        y: i32::from(row) * CELL_HEIGHT_PX as i32,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing();

    let config = match &args.config {
        Some(path) => ReaderConfig::load_from(path),
        None => ReaderConfig::load(),
    }
    .context("Failed to load config")?;
    let base_url = args
        .api_url
        .clone()
        .unwrap_or_else(|| config.base_url().to_string());
    let client = HttpContentClient::new(&base_url, config.timeout())
        .with_context(|| format!("Invalid API URL: {base_url}"))?;
    tracing::info!(%base_url, "starting reader");

    let (worker, rx) = Worker::new(client);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let area = terminal.size()?;
    let viewport = TerminalViewport {
        cols: area.width,
        rows: area.height,
    };
    let mut app = App::new(&viewport, config.gesture_config());
    app.set_status(&format!("Connecting to {base_url}"));
    worker.fetch_books();

    let start = args.book.clone().map(|book| (book, args.chapter));
    let res = run_app(&mut terminal, &mut app, &worker, rx, start);

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(e) = res {
        tracing::error!(error = %e, "reader exited with error");
        eprintln!("Error: {e}");
    }

    Ok(())
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    worker: &Worker<HttpContentClient>,
    mut rx: UnboundedReceiver<Outcome>,
    mut start: Option<(String, u32)>,
) -> Result<()> {
    while app.running {
        while let Ok(outcome) = rx.try_recv() {
            let books_loaded = matches!(outcome, Outcome::Books(_));
            io::apply(app, outcome);
            if books_loaded {
                if let Some((book, chapter)) = start.take() {
                    if let Some(effect) = open_start(app, &book, chapter) {
                        worker.perform(effect);
                    }
                }
            }
        }

        terminal.draw(|f| ui::draw(f, app))?;

        if !event::poll(TICK)? {
            continue;
        }
        let effect = match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                // Clear status on any key
                app.clear_status();
                match app.mode {
                    Mode::Normal => handle_normal_mode(app, key.code, key.modifiers),
                    Mode::Menu => handle_menu(app, key.code),
                    Mode::NoteInput => handle_note_input(app, key.code),
                    Mode::Search => handle_search(app, key.code),
                    Mode::Help => {
                        app.mode = Mode::Normal;
                        None
                    }
                }
            }
            Event::Mouse(mouse) => {
                match mouse.kind {
                    MouseEventKind::Down(MouseButton::Left) => {
                        app.pointer_down(cell_to_point(mouse.column, mouse.row));
                    }
                    MouseEventKind::Up(MouseButton::Left) => {
                        app.pointer_up(cell_to_point(mouse.column, mouse.row));
                    }
                    _ => {}
                }
                None
            }
            Event::Resize(cols, rows) => {
                app.resize(&TerminalViewport { cols, rows });
                None
            }
            _ => None,
        };

        if let Some(effect) = effect {
            worker.perform(effect);
        }
    }
    Ok(())
}

/// Honor `--book`/`--chapter` once the library is known
fn open_start(app: &mut App, query: &str, chapter: u32) -> Option<Effect> {
    let Some(book) = app.session.library().and_then(|l| l.resolve(query)).cloned() else {
        app.set_status(&format!("Book {query} not found"));
        return None;
    };
    let ticket = app.session.jump_to_reference(book, chapter, None)?;
    app.focus = Focus::Reader;
    Some(Effect::Load(ticket))
}

fn handle_normal_mode(app: &mut App, code: KeyCode, modifiers: KeyModifiers) -> Option<Effect> {
    match code {
        KeyCode::Char('q') => app.running = false,
        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => app.running = false,
        KeyCode::Char('?') => app.mode = Mode::Help,

        // Navigation
        KeyCode::Char('j') | KeyCode::Down => app.move_down(),
        KeyCode::Char('k') | KeyCode::Up => app.move_up(),
        KeyCode::Char('g') => app.move_to_top(),
        KeyCode::Char('G') => app.move_to_bottom(),
        KeyCode::Char('l') | KeyCode::Char('n') | KeyCode::Right => {
            return app.change_chapter(Direction::Next)
        }
        KeyCode::Char('h') | KeyCode::Char('p') | KeyCode::Left => {
            return app.change_chapter(Direction::Prev)
        }
        KeyCode::Enter => return app.activate(),
        KeyCode::Char('r') => return app.retry(),

        // Panels
        KeyCode::Tab => app.toggle_focus(),
        KeyCode::Char('b') => app.toggle_sidebar(),
        KeyCode::Char('a') => app.toggle_annotation_panel(),

        // Annotations
        KeyCode::Char('v') => {
            app.open_menu_on_cursor();
        }
        KeyCode::Char('d') if app.focus == Focus::Annotations => {
            return app.delete_selected_annotation()
        }
        KeyCode::Char('c') if app.focus == Focus::Annotations => {
            return app.recolor_selected_annotation()
        }
        KeyCode::Char('f') => app.cycle_annotation_filter(),

        // Search
        KeyCode::Char('/') => app.start_search(),

        _ => {}
    }
    None
}

fn handle_menu(app: &mut App, code: KeyCode) -> Option<Effect> {
    match code {
        KeyCode::Esc => app.cancel_menu(),
        KeyCode::Char('j') | KeyCode::Down | KeyCode::Right | KeyCode::Tab => app.menu_next(),
        KeyCode::Char('k') | KeyCode::Up | KeyCode::Left | KeyCode::BackTab => app.menu_prev(),
        KeyCode::Enter => return app.menu_confirm(),
        // Quick select
        KeyCode::Char(c @ '1'..='6') => {
            let position = c.to_digit(10).map_or(0, |d| d as usize);
            return app.menu_pick_color(position);
        }
        _ => {}
    }
    None
}

fn handle_note_input(app: &mut App, code: KeyCode) -> Option<Effect> {
    match code {
        KeyCode::Esc => app.cancel_menu(),
        KeyCode::Enter => return app.menu_confirm(),
        KeyCode::Backspace => app.note_pop(),
        KeyCode::Char(c) => app.note_push(c),
        _ => {}
    }
    None
}

fn handle_search(app: &mut App, code: KeyCode) -> Option<Effect> {
    match code {
        KeyCode::Esc => app.cancel_search(),
        KeyCode::Enter => return app.search_confirm(),
        KeyCode::Down | KeyCode::Tab => app.search_next(),
        KeyCode::Backspace => return app.search_pop(),
        KeyCode::Char(c) => return app.search_push(c),
        _ => {}
    }
    None
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let Some((log_path, file)) = open_log_file() else {
        // Writing to stderr would corrupt the TUI
        tracing_subscriber::registry().with(env_filter).init();
        return;
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
        .with(env_filter)
        .init();
    tracing::info!(path = %log_path.display(), "Logging initialized");
}

fn open_log_file() -> Option<(PathBuf, fs::File)> {
    let dir = dirs::data_local_dir()
        .or_else(dirs::data_dir)
        .unwrap_or_else(std::env::temp_dir)
        .join("verbum");
    fs::create_dir_all(&dir).ok()?;
    let path = dir.join("verbum.log");
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .ok()?;
    Some((path, file))
}
