use crate::model::{
    Annotation, AnnotationId, AnnotationKind, AnnotationPatch, Book, HighlightColor,
    NewAnnotation, Testament,
};
use crate::navigation::{Direction, ReloadTicket};
use crate::panels::{GestureConfig, Point, ViewportObserver};
use crate::selection::MenuOption;
use crate::session::{ReadingSession, SearchTicket};

/// Application mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Normal,
    /// Annotation type/color picker open
    Menu,
    /// Typing note text for the open menu
    NoteInput,
    Search,
    Help,
}

/// Focus area
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Sidebar,
    Reader,
    Annotations,
}

/// Backend work requested by a user action. The front end performs it and
/// feeds the result back into [`ReadingSession`].
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Load(ReloadTicket),
    Search(SearchTicket),
    Create(NewAnnotation),
    Update(AnnotationId, AnnotationPatch),
    /// Already removed locally; restore on failure
    Delete(Annotation),
}

/// Platform-agnostic application state
pub struct App {
    pub session: ReadingSession,
    pub mode: Mode,
    pub focus: Focus,
    pub running: bool,

    pub verse_cursor: usize,
    pub book_cursor: usize,
    pub annotation_cursor: usize,

    // Annotation panel listing
    pub annotation_filter: Option<AnnotationKind>,
    pub annotation_search: String,

    pub search_cursor: usize,
}

impl App {
    pub fn new(observer: &impl ViewportObserver, gestures: GestureConfig) -> Self {
        Self {
            session: ReadingSession::new(observer, gestures),
            mode: Mode::Normal,
            focus: Focus::Sidebar,
            running: true,
            verse_cursor: 0,
            book_cursor: 0,
            annotation_cursor: 0,
            annotation_filter: None,
            annotation_search: String::new(),
            search_cursor: 0,
        }
    }

    /// Books in sidebar order: Old Testament, then New
    pub fn sidebar_books(&self) -> Vec<&Book> {
        match self.session.library() {
            Some(library) => Testament::all()
                .iter()
                .flat_map(|t| library.filtered(*t, ""))
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn visible_annotations(&self) -> Vec<&Annotation> {
        self.session
            .annotations
            .filter(&self.annotation_search, self.annotation_filter)
    }

    pub fn selected_annotation(&self) -> Option<&Annotation> {
        self.visible_annotations()
            .get(self.annotation_cursor)
            .copied()
    }

    fn verse_count(&self) -> usize {
        self.session.chapter().map_or(0, |c| c.verses.len())
    }

    // Cursor movement

    pub fn move_down(&mut self) {
        match self.focus {
            Focus::Sidebar => {
                let len = self.sidebar_books().len();
                if self.book_cursor + 1 < len {
                    self.book_cursor += 1;
                }
            }
            Focus::Reader => {
                if self.verse_cursor + 1 < self.verse_count() {
                    self.verse_cursor += 1;
                }
            }
            Focus::Annotations => {
                let count = self.visible_annotations().len();
                if count > 0 {
                    self.annotation_cursor = (self.annotation_cursor + 1) % count;
                }
            }
        }
    }

    pub fn move_up(&mut self) {
        match self.focus {
            Focus::Sidebar => self.book_cursor = self.book_cursor.saturating_sub(1),
            Focus::Reader => self.verse_cursor = self.verse_cursor.saturating_sub(1),
            Focus::Annotations => {
                let count = self.visible_annotations().len();
                if count > 0 {
                    self.annotation_cursor = if self.annotation_cursor == 0 {
                        count - 1
                    } else {
                        self.annotation_cursor - 1
                    };
                }
            }
        }
    }

    pub fn move_to_top(&mut self) {
        self.verse_cursor = 0;
    }

    pub fn move_to_bottom(&mut self) {
        self.verse_cursor = self.verse_count().saturating_sub(1);
    }

    /// Cycle focus through the visible panes
    pub fn toggle_focus(&mut self) {
        let panels = &self.session.panels;
        let order = [Focus::Sidebar, Focus::Reader, Focus::Annotations];
        let start = order.iter().position(|f| *f == self.focus).unwrap_or(0);
        for step in 1..=order.len() {
            let candidate = order[(start + step) % order.len()];
            let visible = match candidate {
                Focus::Sidebar => panels.sidebar_open(),
                Focus::Reader => true,
                Focus::Annotations => panels.annotation_panel_open(),
            };
            if visible {
                self.focus = candidate;
                return;
            }
        }
    }

    pub fn toggle_sidebar(&mut self) {
        self.session.panels.toggle_sidebar();
        self.fix_focus();
    }

    pub fn toggle_annotation_panel(&mut self) {
        self.session.panels.toggle_annotation_panel();
        self.fix_focus();
    }

    /// Never leave focus on a hidden pane
    pub fn fix_focus(&mut self) {
        let panels = &self.session.panels;
        let hidden = match self.focus {
            Focus::Sidebar => !panels.sidebar_open(),
            Focus::Annotations => !panels.annotation_panel_open(),
            Focus::Reader => false,
        };
        if hidden {
            self.focus = Focus::Reader;
        }
    }

    // Navigation

    /// Enter on the focused pane
    pub fn activate(&mut self) -> Option<Effect> {
        match self.focus {
            Focus::Sidebar => {
                let book = self.sidebar_books().get(self.book_cursor).map(|b| (*b).clone())?;
                let ticket = self.session.select_book(book);
                self.verse_cursor = 0;
                self.focus = Focus::Reader;
                Some(Effect::Load(ticket))
            }
            Focus::Reader => {
                self.open_menu_on_cursor();
                None
            }
            Focus::Annotations => {
                let verse_id = self.selected_annotation()?.verse_id;
                let index = self
                    .session
                    .chapter()?
                    .verses
                    .iter()
                    .position(|v| v.id == verse_id)?;
                self.verse_cursor = index;
                self.focus = Focus::Reader;
                None
            }
        }
    }

    pub fn change_chapter(&mut self, direction: Direction) -> Option<Effect> {
        let ticket = self.session.change_chapter(direction)?;
        self.verse_cursor = 0;
        Some(Effect::Load(ticket))
    }

    pub fn retry(&mut self) -> Option<Effect> {
        self.session.retry().map(Effect::Load)
    }

    /// Move the verse cursor to the session's focused verse, once loaded
    pub fn sync_focus(&mut self) {
        let target = self
            .session
            .focused_verse
            .and_then(|n| self.session.chapter().and_then(|c| c.index_of(n)));
        if let Some(index) = target {
            self.verse_cursor = index;
            self.focus = Focus::Reader;
        }
        self.verse_cursor = self.verse_cursor.min(self.verse_count().saturating_sub(1));
        let count = self.visible_annotations().len();
        self.annotation_cursor = self.annotation_cursor.min(count.saturating_sub(1));
    }

    // Annotation workflow

    /// Whole-verse selection of the verse under the cursor
    pub fn open_menu_on_cursor(&mut self) -> bool {
        let Some(verse) = self
            .session
            .chapter()
            .and_then(|c| c.verses.get(self.verse_cursor))
            .cloned()
        else {
            return false;
        };
        let anchor = Point {
            x: 0,
            y: self.verse_cursor as i32,
        };
        if self.session.selection.tap_verse(&verse, anchor) {
            self.mode = Mode::Menu;
            true
        } else {
            false
        }
    }

    pub fn menu_next(&mut self) {
        if let Some(menu) = self.session.selection.menu_mut() {
            menu.select_next();
        }
    }

    pub fn menu_prev(&mut self) {
        if let Some(menu) = self.session.selection.menu_mut() {
            menu.select_prev();
        }
    }

    /// Enter in the picker. Notes first collect text.
    pub fn menu_confirm(&mut self) -> Option<Effect> {
        let current = self.session.selection.menu()?.current();
        if current == MenuOption::Note && self.mode == Mode::Menu {
            self.mode = Mode::NoteInput;
            return None;
        }
        self.commit_menu()
    }

    /// Quick-pick a palette color by its 1-based position
    pub fn menu_pick_color(&mut self, position: usize) -> Option<Effect> {
        let color = *HighlightColor::all().get(position.checked_sub(1)?)?;
        if let Some(menu) = self.session.selection.menu_mut() {
            menu.select(MenuOption::Highlight(color));
        }
        self.commit_menu()
    }

    fn commit_menu(&mut self) -> Option<Effect> {
        match self.session.commit_selection() {
            Ok(new) => {
                self.mode = Mode::Normal;
                Some(Effect::Create(new))
            }
            // Error is shown on the still-open menu
            Err(_) => None,
        }
    }

    pub fn note_push(&mut self, c: char) {
        if let Some(menu) = self.session.selection.menu_mut() {
            menu.note_draft.push(c);
            menu.error = None;
        }
    }

    pub fn note_pop(&mut self) {
        if let Some(menu) = self.session.selection.menu_mut() {
            menu.note_draft.pop();
        }
    }

    pub fn cancel_menu(&mut self) {
        self.session.selection.cancel();
        self.mode = Mode::Normal;
    }

    pub fn delete_selected_annotation(&mut self) -> Option<Effect> {
        let id = self.selected_annotation()?.id;
        match self.session.begin_delete(id) {
            Ok(removed) => {
                let count = self.visible_annotations().len();
                if self.annotation_cursor >= count && count > 0 {
                    self.annotation_cursor = count - 1;
                }
                Some(Effect::Delete(removed))
            }
            Err(err) => {
                self.session.set_status(&err.to_string());
                None
            }
        }
    }

    /// Move the selected highlight to the next palette color
    pub fn recolor_selected_annotation(&mut self) -> Option<Effect> {
        let annotation = self.selected_annotation()?;
        let palette = HighlightColor::all();
        let next = match annotation.color {
            Some(color) => {
                let i = palette.iter().position(|c| *c == color).unwrap_or(0);
                palette[(i + 1) % palette.len()]
            }
            None => palette[0],
        };
        let id = annotation.id;
        let patch = AnnotationPatch::recolor(next);
        match self.session.begin_update(id, &patch) {
            Ok(_) => Some(Effect::Update(id, patch)),
            Err(err) => {
                self.session.set_status(&err.to_string());
                None
            }
        }
    }

    /// Cycle the annotation panel filter: all, highlights, notes, bookmarks
    pub fn cycle_annotation_filter(&mut self) {
        let kinds = AnnotationKind::all();
        self.annotation_filter = match self.annotation_filter {
            None => Some(kinds[0]),
            Some(kind) => {
                let i = kinds.iter().position(|k| *k == kind).unwrap_or(0);
                kinds.get(i + 1).copied()
            }
        };
        self.annotation_cursor = 0;
    }

    // Search

    pub fn start_search(&mut self) {
        self.mode = Mode::Search;
        self.search_cursor = 0;
        self.session.search_input("");
    }

    pub fn search_push(&mut self, c: char) -> Option<Effect> {
        let mut input = self.session.search.input.clone();
        input.push(c);
        self.search_cursor = 0;
        self.session.search_input(&input).map(Effect::Search)
    }

    pub fn search_pop(&mut self) -> Option<Effect> {
        let mut input = self.session.search.input.clone();
        input.pop();
        self.search_cursor = 0;
        self.session.search_input(&input).map(Effect::Search)
    }

    pub fn search_next(&mut self) {
        let count = self.session.search.results.len();
        if count > 0 {
            self.search_cursor = (self.search_cursor + 1) % count;
        }
    }

    /// Open the highlighted search result
    pub fn search_confirm(&mut self) -> Option<Effect> {
        let hit = self.session.search.results.get(self.search_cursor)?.clone();
        self.mode = Mode::Normal;
        match self.session.open_search_hit(&hit) {
            Ok(Some(ticket)) => Some(Effect::Load(ticket)),
            Ok(None) => {
                self.sync_focus();
                None
            }
            Err(err) => {
                self.session.set_status(&err.to_string());
                None
            }
        }
    }

    pub fn cancel_search(&mut self) {
        self.session.search_input("");
        self.mode = Mode::Normal;
    }

    // Viewport and gestures

    /// A resize mid-gesture abandons the gesture
    pub fn resize(&mut self, observer: &impl ViewportObserver) {
        self.session.panels.touch_cancel();
        if self.session.panels.sync_viewport(observer) {
            self.fix_focus();
        }
    }

    pub fn pointer_down(&mut self, at: Point) {
        self.session.panels.touch_start(at);
    }

    pub fn pointer_up(&mut self, at: Point) {
        if self.session.panels.touch_end(at).is_some() {
            self.fix_focus();
        }
    }

    /// Set status message
    pub fn set_status(&mut self, msg: &str) {
        self.session.set_status(msg);
    }

    /// Clear status message
    pub fn clear_status(&mut self) {
        self.session.clear_status();
    }

    /// Get title for display
    pub fn title(&self) -> String {
        self.session.title()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::ReadingLoad;
    use crate::model::{Book, BookId, Chapter, Verse, VerseId};
    use crate::panels::{Point, Size};

    fn app() -> App {
        let mut app = App::new(
            &Size {
                width: 1280,
                height: 800,
            },
            GestureConfig::default(),
        );
        app.session.apply_books(Ok(vec![
            Book::new(40, "Matthew", Testament::New, 28),
            Book::new(1, "Genesis", Testament::Old, 50),
        ]));
        app
    }

    fn load(app: &mut App, ticket: ReloadTicket) {
        let verses = (1..=3)
            .map(|n| Verse {
                id: VerseId(u64::from(n)),
                chapter_number: ticket.chapter,
                verse_num: n,
                text: format!("verse {n}"),
            })
            .collect();
        app.session.apply_load(ReadingLoad {
            ticket,
            chapter: Ok(Chapter {
                book_id: ticket.book_id,
                book_name: "Genesis".into(),
                number: ticket.chapter,
                total_chapters: 50,
                verses,
            }),
            annotations: Ok(Vec::new()),
        });
        app.sync_focus();
    }

    #[test]
    fn test_sidebar_lists_old_testament_first() {
        let app = app();
        let ids: Vec<_> = app.sidebar_books().iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![BookId(1), BookId(40)]);
    }

    #[test]
    fn test_activate_book_then_annotate_verse() {
        let mut app = app();
        let Some(Effect::Load(ticket)) = app.activate() else {
            panic!("expected a load");
        };
        assert_eq!(ticket.book_id, BookId(1));
        load(&mut app, ticket);

        app.focus = Focus::Reader;
        app.move_down();
        assert!(app.activate().is_none());
        assert_eq!(app.mode, Mode::Menu);

        let Some(Effect::Create(new)) = app.menu_pick_color(2) else {
            panic!("expected a create");
        };
        assert_eq!(new.verse_id, VerseId(2));
        assert_eq!(new.color, Some(HighlightColor::Green));
        assert_eq!(app.mode, Mode::Normal);
    }

    #[test]
    fn test_note_needs_text_before_commit() {
        let mut app = app();
        let Some(Effect::Load(ticket)) = app.activate() else {
            panic!("expected a load");
        };
        load(&mut app, ticket);
        app.open_menu_on_cursor();
        if let Some(menu) = app.session.selection.menu_mut() {
            menu.select(MenuOption::Note);
        }

        assert!(app.menu_confirm().is_none());
        assert_eq!(app.mode, Mode::NoteInput);
        assert!(app.menu_confirm().is_none());
        assert!(app.session.selection.menu().unwrap().error.is_some());

        for c in "Let there be light".chars() {
            app.note_push(c);
        }
        assert!(matches!(app.menu_confirm(), Some(Effect::Create(_))));
        assert!(app.session.selection.is_idle());
    }

    #[test]
    fn test_chapter_keys_respect_bounds() {
        let mut app = app();
        let Some(Effect::Load(ticket)) = app.activate() else {
            panic!("expected a load");
        };
        load(&mut app, ticket);

        assert!(app.change_chapter(Direction::Prev).is_none());
        assert!(matches!(
            app.change_chapter(Direction::Next),
            Some(Effect::Load(ReloadTicket { chapter: 2, .. }))
        ));
    }

    #[test]
    fn test_focus_skips_hidden_panes() {
        let mut app = app();
        assert_eq!(app.focus, Focus::Sidebar);
        app.toggle_focus();
        assert_eq!(app.focus, Focus::Reader);
        // Annotation panel closed: wraps back to the sidebar
        app.toggle_focus();
        assert_eq!(app.focus, Focus::Sidebar);

        app.resize(&Size {
            width: 600,
            height: 800,
        });
        assert_eq!(app.focus, Focus::Reader);
    }

    #[test]
    fn test_resize_mid_gesture_drops_the_swipe() {
        let mut app = app();
        app.resize(&Size {
            width: 500,
            height: 800,
        });
        assert!(!app.session.panels.sidebar_open());

        app.pointer_down(Point { x: 10, y: 300 });
        app.resize(&Size {
            width: 520,
            height: 800,
        });
        app.pointer_up(Point { x: 120, y: 310 });
        assert!(!app.session.panels.sidebar_open());

        app.pointer_down(Point { x: 10, y: 300 });
        app.pointer_up(Point { x: 120, y: 310 });
        assert!(app.session.panels.sidebar_open());
    }
}
